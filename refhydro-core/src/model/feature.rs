//! Line features and their attribute records

use std::collections::BTreeMap;

use geo::{Coord, LineString, Point};
use serde_json::Value as JsonValue;

/// Attribute record of a feature, ordered by field name
pub type Attributes = BTreeMap<String, AttributeValue>;

/// Name of the field holding the stable source identifier
pub const CLEABS_FIELD: &str = "cleabs";
/// Name of the field holding the watercourse classification
pub const NATURE_FIELD: &str = "nature";

#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    Null,
    Bool(bool),
    Int(i64),
    Real(f64),
    Text(String),
}

impl AttributeValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttributeValue::Int(i) => Some(*i as f64),
            AttributeValue::Real(r) => Some(*r),
            _ => None,
        }
    }
}

impl From<&JsonValue> for AttributeValue {
    fn from(value: &JsonValue) -> Self {
        match value {
            JsonValue::Null => AttributeValue::Null,
            JsonValue::Bool(b) => AttributeValue::Bool(*b),
            JsonValue::Number(n) => n
                .as_i64()
                .map(AttributeValue::Int)
                .or_else(|| n.as_f64().map(AttributeValue::Real))
                .unwrap_or(AttributeValue::Null),
            JsonValue::String(s) => AttributeValue::Text(s.clone()),
            other => AttributeValue::Text(other.to_string()),
        }
    }
}

impl From<&AttributeValue> for JsonValue {
    fn from(value: &AttributeValue) -> Self {
        match value {
            AttributeValue::Null => JsonValue::Null,
            AttributeValue::Bool(b) => JsonValue::Bool(*b),
            AttributeValue::Int(i) => JsonValue::from(*i),
            AttributeValue::Real(r) => JsonValue::from(*r),
            AttributeValue::Text(s) => JsonValue::String(s.clone()),
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::Text(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::Text(value)
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        AttributeValue::Int(value)
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        AttributeValue::Real(value)
    }
}

/// A stream centerline: polyline, stable identifier and attributes.
///
/// Features are cloned when they move between collections, so editing a
/// copy never touches the source.
#[derive(Debug, Clone, PartialEq)]
pub struct LineFeature {
    /// Local feature id inside the owning layer, assigned on insertion
    pub fid: Option<u64>,
    /// Stable identifier from the source catalog
    pub cleabs: String,
    /// Vertices in flow direction
    pub geometry: LineString<f64>,
    pub attributes: Attributes,
}

impl LineFeature {
    pub fn new(cleabs: impl Into<String>, geometry: LineString<f64>) -> Self {
        Self {
            fid: None,
            cleabs: cleabs.into(),
            geometry,
            attributes: Attributes::new(),
        }
    }

    #[must_use]
    pub fn with_attribute(mut self, name: &str, value: impl Into<AttributeValue>) -> Self {
        self.attributes.insert(name.to_string(), value.into());
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes.get(name)
    }

    pub fn set_attribute(&mut self, name: &str, value: impl Into<AttributeValue>) {
        self.attributes.insert(name.to_string(), value.into());
    }

    /// Watercourse classification (`Canal`, `Conduit forcé`, ...)
    pub fn nature(&self) -> Option<&str> {
        self.attribute(NATURE_FIELD).and_then(AttributeValue::as_str)
    }

    pub fn length(&self) -> crate::Length {
        planar_length(&self.geometry)
    }

    pub fn first_coord(&self) -> Option<Coord<f64>> {
        self.geometry.0.first().copied()
    }

    pub fn last_coord(&self) -> Option<Coord<f64>> {
        self.geometry.0.last().copied()
    }

    /// Fewer than two vertices: no direction, no endpoints
    pub fn is_degenerate(&self) -> bool {
        self.geometry.0.len() < 2
    }

    /// Flips the flow direction in place
    pub fn reverse(&mut self) {
        self.geometry.0.reverse();
    }

    /// Bit pattern of the vertex sequence, equal only for identical
    /// geometries. Signed zeros share one pattern.
    pub(crate) fn geometry_key(&self) -> Vec<(u64, u64)> {
        fn bits(value: f64) -> u64 {
            if value == 0.0 { 0.0_f64.to_bits() } else { value.to_bits() }
        }
        self.geometry
            .0
            .iter()
            .map(|c| (bits(c.x), bits(c.y)))
            .collect()
    }
}

/// Sum of the segment lengths of `line`, in layer units
pub(crate) fn planar_length(line: &LineString<f64>) -> crate::Length {
    line.lines().map(|segment| segment.dx().hypot(segment.dy())).sum()
}

/// Network node exported for diagnostics
#[derive(Debug, Clone, PartialEq)]
pub struct NodeRecord {
    pub gid: usize,
    pub geometry: Point<f64>,
    pub in_degree: usize,
    pub out_degree: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::line_string;

    #[test]
    fn reverse_flips_endpoints() {
        let mut f = LineFeature::new("A", line_string![(x: 0.0, y: 0.0), (x: 3.0, y: 4.0)]);
        f.reverse();
        assert_eq!(f.first_coord(), Some(Coord { x: 3.0, y: 4.0 }));
        assert_eq!(f.last_coord(), Some(Coord { x: 0.0, y: 0.0 }));
        assert!((f.length() - 5.0).abs() < 1e-9);
    }

    #[test]
    fn clone_is_independent() {
        let source = LineFeature::new("A", line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0)])
            .with_attribute(NATURE_FIELD, "Canal");
        let mut copy = source.clone();
        copy.reverse();
        copy.set_attribute(NATURE_FIELD, "Ecoulement naturel");
        assert_eq!(source.nature(), Some("Canal"));
        assert_eq!(source.first_coord(), Some(Coord { x: 0.0, y: 0.0 }));
    }

    #[test]
    fn json_attribute_conversion() {
        let value = serde_json::json!(12);
        assert_eq!(AttributeValue::from(&value), AttributeValue::Int(12));
        let value = serde_json::json!(1.5);
        assert_eq!(AttributeValue::from(&value), AttributeValue::Real(1.5));
        let back = JsonValue::from(&AttributeValue::Text("x".into()));
        assert_eq!(back, serde_json::json!("x"));
    }
}
