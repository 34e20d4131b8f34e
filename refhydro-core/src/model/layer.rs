//! Feature collections with scoped edit transactions

use hashbrown::HashSet;
use log::debug;

use super::LineFeature;
use crate::Error;

/// Owned collection of line features, the unit loaded from and saved to
/// a layer store.
#[derive(Debug, Clone)]
pub struct Layer {
    name: String,
    features: Vec<LineFeature>,
    next_fid: u64,
}

impl Layer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            features: Vec::new(),
            next_fid: 1,
        }
    }

    /// Builds a layer, keeping existing feature ids and assigning fresh
    /// ones where missing.
    pub fn from_features(name: impl Into<String>, features: Vec<LineFeature>) -> Self {
        let mut layer = Self::new(name);
        layer.next_fid = features
            .iter()
            .filter_map(|f| f.fid)
            .max()
            .map_or(1, |max| max + 1);
        for mut feature in features {
            if feature.fid.is_none() {
                feature.fid = Some(layer.take_fid());
            }
            layer.features.push(feature);
        }
        layer
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn features(&self) -> &[LineFeature] {
        &self.features
    }

    pub fn into_features(self) -> Vec<LineFeature> {
        self.features
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LineFeature> {
        self.features.iter()
    }

    /// Identifiers present in the layer
    pub fn ids(&self) -> HashSet<&str> {
        self.features.iter().map(|f| f.cleabs.as_str()).collect()
    }

    pub fn contains_id(&self, cleabs: &str) -> bool {
        self.features.iter().any(|f| f.cleabs == cleabs)
    }

    pub fn get(&self, cleabs: &str) -> Option<&LineFeature> {
        self.features.iter().find(|f| f.cleabs == cleabs)
    }

    fn take_fid(&mut self) -> u64 {
        let fid = self.next_fid;
        self.next_fid += 1;
        fid
    }

    /// Starts an edit session. Changes are staged and only become
    /// visible once [`LayerEdit::commit`] is called; dropping the session
    /// discards them.
    pub fn begin(&mut self) -> LayerEdit<'_> {
        let staged = self.features.clone();
        let next_fid = self.next_fid;
        LayerEdit {
            layer: self,
            staged,
            next_fid,
        }
    }

    /// Runs `f` inside an edit session, committing when it returns `Ok`
    /// and rolling back when it returns `Err`.
    pub fn edit<T, F>(&mut self, f: F) -> Result<T, Error>
    where
        F: FnOnce(&mut LayerEdit<'_>) -> Result<T, Error>,
    {
        let mut session = self.begin();
        match f(&mut session) {
            Ok(value) => {
                session.commit();
                Ok(value)
            }
            Err(e) => {
                session.rollback();
                Err(e)
            }
        }
    }
}

impl Default for Layer {
    fn default() -> Self {
        Self::new(String::new())
    }
}

impl<'a> IntoIterator for &'a Layer {
    type Item = &'a LineFeature;
    type IntoIter = std::slice::Iter<'a, LineFeature>;

    fn into_iter(self) -> Self::IntoIter {
        self.features.iter()
    }
}

/// Staged modifications of a [`Layer`]
pub struct LayerEdit<'a> {
    layer: &'a mut Layer,
    staged: Vec<LineFeature>,
    next_fid: u64,
}

impl LayerEdit<'_> {
    pub fn features(&self) -> &[LineFeature] {
        &self.staged
    }

    pub fn features_mut(&mut self) -> &mut [LineFeature] {
        &mut self.staged
    }

    /// Inserts a copy with a fresh local id; source ids may collide
    /// across layers so the incoming one is never reused.
    pub fn add_feature(&mut self, mut feature: LineFeature) -> u64 {
        let fid = self.next_fid;
        self.next_fid += 1;
        feature.fid = Some(fid);
        self.staged.push(feature);
        fid
    }

    /// Removes every staged feature matching `predicate`, returning how
    /// many were removed.
    pub fn remove_where<P>(&mut self, mut predicate: P) -> usize
    where
        P: FnMut(&LineFeature) -> bool,
    {
        let before = self.staged.len();
        self.staged.retain(|f| !predicate(f));
        before - self.staged.len()
    }

    pub fn commit(self) {
        debug!(
            "Committing {} features to layer '{}'",
            self.staged.len(),
            self.layer.name
        );
        self.layer.features = self.staged;
        self.layer.next_fid = self.next_fid;
    }

    pub fn rollback(self) {
        debug!("Rolling back edits on layer '{}'", self.layer.name);
    }
}
