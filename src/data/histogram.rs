use std::collections::HashMap;

use super::model::SampleTable;

// ---------------------------------------------------------------------------
// ConditionCounts – samples per condition
// ---------------------------------------------------------------------------

/// Sample counts per condition, ordered by descending count.
///
/// Ties keep the order in which the conditions first appear in the table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConditionCounts {
    entries: Vec<(String, usize)>,
}

impl ConditionCounts {
    /// `(condition, count)` pairs in display order.
    pub fn entries(&self) -> &[(String, usize)] {
        &self.entries
    }

    /// Count for one condition, `None` if it never occurs.
    pub fn get(&self, condition: &str) -> Option<usize> {
        self.entries
            .iter()
            .find(|(c, _)| c == condition)
            .map(|(_, n)| *n)
    }

    /// Number of distinct conditions.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum over all conditions; equals the table's row count.
    pub fn total(&self) -> usize {
        self.entries.iter().map(|(_, n)| n).sum()
    }

    /// Largest single count, 0 when empty.
    pub fn max_count(&self) -> usize {
        self.entries.iter().map(|(_, n)| *n).max().unwrap_or(0)
    }
}

/// Count samples grouped by condition.
pub fn build_condition_histogram(table: &SampleTable) -> ConditionCounts {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut entries: Vec<(String, usize)> = Vec::new();

    for sample in &table.samples {
        match index.get(sample.condition.as_str()) {
            Some(&slot) => entries[slot].1 += 1,
            None => {
                index.insert(sample.condition.as_str(), entries.len());
                entries.push((sample.condition.clone(), 1));
            }
        }
    }

    // Stable sort keeps first-appearance order among equal counts.
    entries.sort_by(|a, b| b.1.cmp(&a.1));
    ConditionCounts { entries }
}
