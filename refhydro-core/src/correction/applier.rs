use std::fmt;

use hashbrown::{HashMap, HashSet};
use log::{debug, info, warn};

use crate::{
    Error, TopologyWarning,
    model::{Layer, LayerEdit, LineFeature},
};

/// Typed corrective edit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorrectionOp {
    /// Insert correction features whose identifier is absent from the target
    AddMissing,
    /// Flip the vertex order of matching target features
    ReverseDirection,
    /// `AddMissing` followed by `ReverseDirection` over all identifiers
    AddAndReverse,
    /// Replace the vertices of matching target features
    ReplaceGeometry,
    /// Remove matching target features
    Delete,
}

impl fmt::Display for CorrectionOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CorrectionOp::AddMissing => "add missing",
            CorrectionOp::ReverseDirection => "reverse direction",
            CorrectionOp::AddAndReverse => "add and reverse",
            CorrectionOp::ReplaceGeometry => "replace geometry",
            CorrectionOp::Delete => "delete",
        };
        f.write_str(name)
    }
}

/// Correction features with duplicate geometries collapsed, plus the
/// ordered set of their identifiers.
#[derive(Debug, Clone, Default)]
pub struct CorrectionSet {
    features: Vec<LineFeature>,
    ids: Vec<String>,
    duplicates_collapsed: usize,
}

impl CorrectionSet {
    /// Validates a correction layer and collapses identical geometries to
    /// their first occurrence.
    pub fn from_layer(layer: &Layer) -> Result<Self, Error> {
        if let Some(feature) = layer.iter().find(|f| f.cleabs.trim().is_empty()) {
            return Err(Error::Load {
                layer: layer.name().to_string(),
                reason: format!("feature {:?} has an empty cleabs", feature.fid),
            });
        }
        let (features, duplicates_collapsed) =
            crate::network::remove_duplicate_geometries(layer.features().to_vec());
        let ids = {
            let mut seen = HashSet::new();
            features
                .iter()
                .filter(|f| seen.insert(f.cleabs.as_str()))
                .map(|f| f.cleabs.clone())
                .collect()
        };
        Ok(Self {
            features,
            ids,
            duplicates_collapsed,
        })
    }

    /// Identifier-only set, e.g. a hand-maintained list. Only usable
    /// with operations that do not need correction geometries.
    pub fn from_ids(ids: impl IntoIterator<Item = String>) -> Self {
        let mut seen = HashSet::new();
        let ids = ids
            .into_iter()
            .filter(|id| seen.insert(id.clone()))
            .collect();
        Self {
            features: Vec::new(),
            ids,
            duplicates_collapsed: 0,
        }
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn features(&self) -> &[LineFeature] {
        &self.features
    }

    pub fn duplicates_collapsed(&self) -> usize {
        self.duplicates_collapsed
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    fn id_set(&self) -> HashSet<&str> {
        self.ids.iter().map(String::as_str).collect()
    }

    fn require_geometries(&self, op: CorrectionOp) -> Result<(), Error> {
        if self.features.is_empty() && !self.ids.is_empty() {
            return Err(Error::InvalidData(format!(
                "'{op}' needs correction geometries, got identifiers only"
            )));
        }
        Ok(())
    }
}

/// Audit trail of one correction run
#[derive(Debug, Clone, PartialEq)]
pub struct CorrectionReport {
    pub op: CorrectionOp,
    pub added: usize,
    pub reversed: usize,
    pub replaced: usize,
    pub removed: usize,
    pub duplicates_collapsed: usize,
    /// Identifiers skipped by `AddMissing` because the target already has
    /// them; these need a manual check
    pub already_present: Vec<String>,
    pub warnings: Vec<TopologyWarning>,
}

impl CorrectionReport {
    fn new(op: CorrectionOp, set: &CorrectionSet) -> Self {
        let mut warnings = Vec::new();
        if set.duplicates_collapsed > 0 {
            warnings.push(TopologyWarning::DuplicateGeometries {
                count: set.duplicates_collapsed,
            });
        }
        Self {
            op,
            added: 0,
            reversed: 0,
            replaced: 0,
            removed: 0,
            duplicates_collapsed: set.duplicates_collapsed,
            already_present: Vec::new(),
            warnings,
        }
    }
}

/// Applies correction sets onto a working layer
#[derive(Debug, Clone, Copy, Default)]
pub struct CorrectionApplier;

impl CorrectionApplier {
    /// Validates `corrections` and applies `op` to `target` atomically.
    pub fn apply(
        &self,
        target: &mut Layer,
        corrections: &Layer,
        op: CorrectionOp,
    ) -> Result<CorrectionReport, Error> {
        let set = CorrectionSet::from_layer(corrections)?;
        self.apply_set(target, &set, op)
    }

    /// Applies an already validated correction set.
    pub fn apply_set(
        &self,
        target: &mut Layer,
        set: &CorrectionSet,
        op: CorrectionOp,
    ) -> Result<CorrectionReport, Error> {
        match op {
            CorrectionOp::AddMissing
            | CorrectionOp::AddAndReverse
            | CorrectionOp::ReplaceGeometry => set.require_geometries(op)?,
            CorrectionOp::ReverseDirection | CorrectionOp::Delete => {}
        }

        let mut report = CorrectionReport::new(op, set);
        target.edit(|tx| {
            match op {
                CorrectionOp::AddMissing => add_missing(tx, set, &mut report),
                CorrectionOp::ReverseDirection => reverse_direction(tx, set, &mut report),
                CorrectionOp::AddAndReverse => {
                    add_missing(tx, set, &mut report);
                    reverse_direction(tx, set, &mut report);
                }
                CorrectionOp::ReplaceGeometry => replace_geometry(tx, set, &mut report),
                CorrectionOp::Delete => delete(tx, set, &mut report),
            }
            Ok(())
        })?;

        info!(
            "Correction '{op}' on {}: {} added, {} reversed, {} replaced, {} removed",
            target.name(),
            report.added,
            report.reversed,
            report.replaced,
            report.removed
        );
        Ok(report)
    }
}

fn add_missing(tx: &mut LayerEdit<'_>, set: &CorrectionSet, report: &mut CorrectionReport) {
    let present: HashSet<String> = tx.features().iter().map(|f| f.cleabs.clone()).collect();
    let mut added: HashSet<&str> = HashSet::new();

    for feature in set.features() {
        let id = feature.cleabs.as_str();
        if present.contains(id) {
            if !report.already_present.iter().any(|p| p == id) {
                report.already_present.push(id.to_string());
            }
            continue;
        }
        if !added.insert(id) {
            continue;
        }
        tx.add_feature(feature.clone());
        debug!("{id} line added");
        report.added += 1;
    }

    if !report.already_present.is_empty() {
        warn!(
            "Features id to check, already in the layer to fix: {:?}",
            report.already_present
        );
    }
}

fn reverse_direction(tx: &mut LayerEdit<'_>, set: &CorrectionSet, report: &mut CorrectionReport) {
    let ids = set.id_set();
    let mut matched = HashSet::new();
    for feature in tx.features_mut() {
        if ids.contains(feature.cleabs.as_str()) {
            feature.reverse();
            matched.insert(feature.cleabs.clone());
            debug!("{} line direction inversed", feature.cleabs);
            report.reversed += 1;
        }
    }
    report_unmatched(set, &matched, report);
}

fn replace_geometry(tx: &mut LayerEdit<'_>, set: &CorrectionSet, report: &mut CorrectionReport) {
    let mut replacements: HashMap<&str, &LineFeature> = HashMap::new();
    for feature in set.features() {
        replacements.entry(feature.cleabs.as_str()).or_insert(feature);
    }
    let mut matched = HashSet::new();
    for feature in tx.features_mut() {
        if let Some(source) = replacements.get(feature.cleabs.as_str()) {
            feature.geometry = source.geometry.clone();
            matched.insert(feature.cleabs.clone());
            debug!("{} line modified", feature.cleabs);
            report.replaced += 1;
        }
    }
    report_unmatched(set, &matched, report);
}

fn delete(tx: &mut LayerEdit<'_>, set: &CorrectionSet, report: &mut CorrectionReport) {
    let ids = set.id_set();
    report.removed = tx.remove_where(|f| ids.contains(f.cleabs.as_str()));
}

fn report_unmatched(set: &CorrectionSet, matched: &HashSet<String>, report: &mut CorrectionReport) {
    for id in set.ids() {
        if !matched.contains(id) {
            warn!("Correction {id} matches no feature of the target layer");
            report
                .warnings
                .push(TopologyWarning::UnmatchedCorrection { cleabs: id.clone() });
        }
    }
}
