use std::collections::HashSet;
use std::fmt;

use super::histogram::ConditionCounts;
use super::model::SampleTable;

/// Batch tally for the summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchCount {
    /// Distinct batch labels; empty cells count as one label.
    Distinct(usize),
    /// The sheet has no `batch` column.
    NotSpecified,
}

impl fmt::Display for BatchCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatchCount::Distinct(n) => write!(f, "{n}"),
            BatchCount::NotSpecified => write!(f, "Not specified"),
        }
    }
}

/// End-of-run figures printed to the console.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QcSummary {
    pub total_samples: usize,
    pub conditions: usize,
    pub batches: BatchCount,
}

pub fn summarize(table: &SampleTable, counts: &ConditionCounts) -> QcSummary {
    let batches = if table.has_batch {
        let distinct: HashSet<Option<&str>> = table
            .samples
            .iter()
            .map(|s| s.batch.as_deref())
            .collect();
        BatchCount::Distinct(distinct.len())
    } else {
        BatchCount::NotSpecified
    };

    QcSummary {
        total_samples: table.len(),
        conditions: counts.len(),
        batches,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::histogram::build_condition_histogram;
    use crate::data::model::MetadataValue;
    use std::collections::BTreeMap;

    fn table(with_batch: bool, batches: &[&str]) -> SampleTable {
        let mut columns: Vec<String> = ["sample_id", "condition", "replicate"]
            .iter()
            .map(|c| c.to_string())
            .collect();
        if with_batch {
            columns.push("batch".into());
        }
        let rows = batches
            .iter()
            .enumerate()
            .map(|(i, b)| {
                let mut row = BTreeMap::from([
                    ("sample_id".to_string(), MetadataValue::String(format!("S{i}"))),
                    ("condition".to_string(), MetadataValue::String("treated".into())),
                    ("replicate".to_string(), MetadataValue::Integer(i as i64)),
                ]);
                if with_batch {
                    row.insert("batch".to_string(), MetadataValue::guess(b));
                }
                row
            })
            .collect();
        SampleTable::from_rows(columns, rows).unwrap()
    }

    #[test]
    fn distinct_batches_are_counted() {
        let t = table(true, &["B1", "B2", "B3", "B1", "B2", "B3"]);
        let summary = summarize(&t, &build_condition_histogram(&t));
        assert_eq!(summary.batches, BatchCount::Distinct(3));
        assert_eq!(summary.total_samples, 6);
        assert_eq!(summary.conditions, 1);
    }

    #[test]
    fn empty_batch_cells_count_as_one_label() {
        let t = table(true, &["B1", "", "B1", ""]);
        let summary = summarize(&t, &build_condition_histogram(&t));
        assert_eq!(summary.batches, BatchCount::Distinct(2));
    }

    #[test]
    fn absent_batch_column_is_not_specified() {
        let t = table(false, &["", "", ""]);
        let summary = summarize(&t, &build_condition_histogram(&t));
        assert_eq!(summary.batches, BatchCount::NotSpecified);
        assert_eq!(summary.batches.to_string(), "Not specified");
    }
}
