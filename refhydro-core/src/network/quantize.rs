use geo::{BoundingRect, Coord, Rect};

use crate::model::NodeKey;

/// Snaps coordinates onto a grid spanning the layer extent, so endpoints
/// that differ only by floating point noise share a key.
///
/// The grid has `quantization` steps along each axis of the extent; an
/// axis of zero width is treated as one unit wide.
#[derive(Debug, Clone, Copy)]
pub struct Quantizer {
    origin: Coord<f64>,
    scale_x: f64,
    scale_y: f64,
    quantization: f64,
}

impl Quantizer {
    pub fn new(extent: Option<Rect<f64>>, quantization: f64) -> Self {
        let (origin, width, height) = match extent {
            Some(rect) => (rect.min(), rect.width(), rect.height()),
            None => (Coord { x: 0.0, y: 0.0 }, 1.0, 1.0),
        };
        let kx = if width > 0.0 { width } else { 1.0 };
        let ky = if height > 0.0 { height } else { 1.0 };
        Self {
            origin,
            scale_x: quantization / kx,
            scale_y: quantization / ky,
            quantization,
        }
    }

    /// Quantizer over the combined extent of `lines`
    pub fn for_lines<'a>(
        lines: impl IntoIterator<Item = &'a geo::LineString<f64>>,
        quantization: f64,
    ) -> Self {
        let extent = lines
            .into_iter()
            .filter_map(|line| line.bounding_rect())
            .reduce(|a, b| {
                Rect::new(
                    Coord {
                        x: a.min().x.min(b.min().x),
                        y: a.min().y.min(b.min().y),
                    },
                    Coord {
                        x: a.max().x.max(b.max().x),
                        y: a.max().y.max(b.max().y),
                    },
                )
            });
        Self::new(extent, quantization)
    }

    pub fn quantization(&self) -> f64 {
        self.quantization
    }

    #[allow(clippy::cast_possible_truncation)]
    pub fn key(&self, coord: Coord<f64>) -> NodeKey {
        NodeKey {
            x: ((coord.x - self.origin.x) * self.scale_x).round() as i64,
            y: ((coord.y - self.origin.y) * self.scale_y).round() as i64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::line_string;

    #[test]
    fn noise_below_grid_step_shares_key() {
        let lines = [line_string![(x: 0.0, y: 0.0), (x: 1000.0, y: 1000.0)]];
        let q = Quantizer::for_lines(lines.iter(), 1e8);
        let a = q.key(Coord { x: 500.0, y: 250.0 });
        let b = q.key(Coord {
            x: 500.0 + 1e-9,
            y: 250.0 - 1e-9,
        });
        assert_eq!(a, b);
        let c = q.key(Coord { x: 500.001, y: 250.0 });
        assert_ne!(a, c);
    }

    #[test]
    fn degenerate_extent_uses_unit_width() {
        let lines = [line_string![(x: 5.0, y: 0.0), (x: 5.0, y: 10.0)]];
        let q = Quantizer::for_lines(lines.iter(), 100.0);
        assert_eq!(q.key(Coord { x: 5.0, y: 10.0 }), NodeKey { x: 0, y: 100 });
    }
}
