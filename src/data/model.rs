use std::collections::{BTreeMap, HashSet};
use std::fmt;

use thiserror::Error;

/// Columns every sample sheet must carry, in reporting order.
pub const REQUIRED_COLUMNS: [&str; 3] = ["sample_id", "condition", "replicate"];

/// Optional technical batch column.
pub const BATCH_COLUMN: &str = "batch";

// ---------------------------------------------------------------------------
// MetadataValue – a single cell of the sample sheet
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value mirroring common Pandas dtypes.
#[derive(Debug, Clone, PartialEq)]
pub enum MetadataValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataValue::String(s) => write!(f, "{s}"),
            MetadataValue::Integer(i) => write!(f, "{i}"),
            MetadataValue::Float(v) => write!(f, "{v}"),
            MetadataValue::Bool(b) => write!(f, "{b}"),
            MetadataValue::Null => write!(f, "<null>"),
        }
    }
}

impl MetadataValue {
    /// Type a raw text cell: empty → `Null`, then integer, float, bool, string.
    pub fn guess(s: &str) -> Self {
        if s.is_empty() {
            return MetadataValue::Null;
        }
        if let Ok(i) = s.parse::<i64>() {
            return MetadataValue::Integer(i);
        }
        if let Ok(f) = s.parse::<f64>() {
            return MetadataValue::Float(f);
        }
        if s == "true" || s == "false" {
            return MetadataValue::Bool(s == "true");
        }
        MetadataValue::String(s.to_string())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, MetadataValue::Null)
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Schema problems that reject a sample sheet before any output is produced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),
}

// ---------------------------------------------------------------------------
// SampleRecord – one row of the sample sheet
// ---------------------------------------------------------------------------

/// A single sequenced sample.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleRecord {
    pub sample_id: String,
    /// Experimental group label; a missing cell is kept as `<null>`.
    pub condition: String,
    /// Integer or free-text replicate label.
    pub replicate: MetadataValue,
    /// `None` when the sheet has no batch column or the cell is empty.
    pub batch: Option<String>,
    /// Every other column: column_name → value.
    pub extra: BTreeMap<String, MetadataValue>,
}

// ---------------------------------------------------------------------------
// SampleTable – the complete loaded sheet
// ---------------------------------------------------------------------------

/// The validated sample sheet. Built once, never mutated.
#[derive(Debug, Clone)]
pub struct SampleTable {
    /// All samples in file order.
    pub samples: Vec<SampleRecord>,
    /// Column names in source order.
    pub column_names: Vec<String>,
    /// Whether the source carried a `batch` column.
    pub has_batch: bool,
}

impl SampleTable {
    /// Validate the schema and build typed records from generic rows.
    ///
    /// `rows` map column name → cell; a column absent from a row reads as
    /// `Null`. Fails when any of [`REQUIRED_COLUMNS`] is not in `column_names`.
    pub fn from_rows(
        column_names: Vec<String>,
        rows: Vec<BTreeMap<String, MetadataValue>>,
    ) -> Result<Self, ValidationError> {
        let missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .filter(|req| !column_names.iter().any(|c| c == *req))
            .map(|req| req.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(ValidationError::MissingColumns(missing));
        }

        let has_batch = column_names.iter().any(|c| c == BATCH_COLUMN);

        let samples: Vec<SampleRecord> = rows
            .into_iter()
            .map(|mut row| {
                let mut take = |col: &str| row.remove(col).unwrap_or(MetadataValue::Null);
                let sample_id = take("sample_id").to_string();
                let condition = take("condition").to_string();
                let replicate = take("replicate");
                let batch = Some(take(BATCH_COLUMN))
                    .filter(|v| !v.is_null())
                    .map(|v| v.to_string());
                SampleRecord {
                    sample_id,
                    condition,
                    replicate,
                    batch,
                    extra: row,
                }
            })
            .collect();

        let mut seen = HashSet::new();
        for sample in &samples {
            if !seen.insert(sample.sample_id.as_str()) {
                log::warn!("duplicate sample_id '{}'", sample.sample_id);
            }
        }

        Ok(SampleTable {
            samples,
            column_names,
            has_batch,
        })
    }

    /// Distinct condition labels in order of first appearance.
    pub fn conditions(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.samples
            .iter()
            .map(|s| s.condition.as_str())
            .filter(|c| seen.insert(*c))
            .collect()
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}
