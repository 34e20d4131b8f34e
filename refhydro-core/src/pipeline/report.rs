use std::fmt;

use crate::TopologyWarning;

/// Audit trail of one stage: named counts in insertion order plus the
/// non-fatal anomalies met
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StageReport {
    pub stage: String,
    pub counts: Vec<(&'static str, usize)>,
    pub warnings: Vec<TopologyWarning>,
}

impl StageReport {
    pub fn new(stage: impl Into<String>) -> Self {
        Self {
            stage: stage.into(),
            ..Self::default()
        }
    }

    /// Sets a count, adding to it when the name is already present
    pub fn add(&mut self, name: &'static str, count: usize) {
        match self.counts.iter_mut().find(|(n, _)| *n == name) {
            Some((_, value)) => *value += count,
            None => self.counts.push((name, count)),
        }
    }

    pub fn count(&self, name: &str) -> Option<usize> {
        self.counts
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, value)| *value)
    }

    pub fn warn(&mut self, warnings: impl IntoIterator<Item = TopologyWarning>) {
        self.warnings.extend(warnings);
    }

    /// Folds another stage's report into this one
    pub fn merge(&mut self, other: StageReport) {
        for (name, count) in other.counts {
            self.add(name, count);
        }
        self.warnings.extend(other.warnings);
    }
}

impl fmt::Display for StageReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}:", self.stage)?;
        for (name, count) in &self.counts {
            writeln!(f, "  {name:<24} {count}")?;
        }
        if !self.warnings.is_empty() {
            writeln!(f, "  {:<24} {}", "warnings", self.warnings.len())?;
            for warning in &self.warnings {
                writeln!(f, "    - {warning}")?;
            }
        }
        Ok(())
    }
}
