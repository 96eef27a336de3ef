use serde::{Deserialize, Serialize};

/// Lon/lat bounding box as `(min_x, min_y, max_x, max_y)`.
pub type Bounds = (f64, f64, f64, f64);

/// The GeoJSON document returned by `GET /generate_geojson_timestamp`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection {
    #[serde(default)]
    pub features: Vec<Feature>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    pub geometry: Geometry,
    pub properties: FeatureProperties,
}

/// Geometry kinds the dispersion backend emits. Positions are `[lon, lat]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Point { coordinates: [f64; 2] },
    Polygon { coordinates: Vec<Vec<[f64; 2]>> },
    MultiPolygon { coordinates: Vec<Vec<Vec<[f64; 2]>>> },
}

/// Per-feature properties, discriminated by the `type` property every
/// feature carries. `value`/`h2s_kg_h` may be absent on the wire; readers
/// treat absence as zero / not-available rather than faulting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum FeatureProperties {
    #[serde(rename = "concentration_cell")]
    ConcentrationCell {
        #[serde(default)]
        value: Option<f64>,
        #[serde(default)]
        timestamp: Option<String>,
    },
    #[serde(rename = "point_source")]
    PointSource {
        #[serde(default)]
        h2s_kg_h: Option<f64>,
    },
    #[serde(rename = "cadastre_source")]
    CadastreSource {
        #[serde(default)]
        h2s_kg_h: Option<f64>,
    },
    #[serde(other)]
    Unknown,
}

/// Layer-filter discriminant for [`FeatureProperties`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeatureKind {
    ConcentrationCell,
    PointSource,
    CadastreSource,
    Unknown,
}

impl FeatureProperties {
    pub fn kind(&self) -> FeatureKind {
        match self {
            FeatureProperties::ConcentrationCell { .. } => FeatureKind::ConcentrationCell,
            FeatureProperties::PointSource { .. } => FeatureKind::PointSource,
            FeatureProperties::CadastreSource { .. } => FeatureKind::CadastreSource,
            FeatureProperties::Unknown => FeatureKind::Unknown,
        }
    }

    /// Concentration value of a cell; absent values read as 0.
    pub fn concentration(&self) -> f64 {
        match self {
            FeatureProperties::ConcentrationCell { value, .. } => value.unwrap_or(0.0),
            _ => 0.0,
        }
    }

    /// Emission rate of a source feature, if present.
    pub fn h2s_kg_h(&self) -> Option<f64> {
        match self {
            FeatureProperties::PointSource { h2s_kg_h }
            | FeatureProperties::CadastreSource { h2s_kg_h } => *h2s_kg_h,
            _ => None,
        }
    }
}

fn accumulate(bounds: &mut Bounds, pos: [f64; 2]) {
    bounds.0 = bounds.0.min(pos[0]);
    bounds.1 = bounds.1.min(pos[1]);
    bounds.2 = bounds.2.max(pos[0]);
    bounds.3 = bounds.3.max(pos[1]);
}

impl Geometry {
    /// First position of the geometry. Feeds the coordinate-order diagnostic.
    pub fn sample_position(&self) -> Option<[f64; 2]> {
        match self {
            Geometry::Point { coordinates } => Some(*coordinates),
            Geometry::Polygon { coordinates } => {
                coordinates.first().and_then(|ring| ring.first()).copied()
            }
            Geometry::MultiPolygon { coordinates } => coordinates
                .first()
                .and_then(|poly| poly.first())
                .and_then(|ring| ring.first())
                .copied(),
        }
    }

    /// Lon/lat bounding box, or `None` for empty coordinate arrays.
    pub fn bounds(&self) -> Option<Bounds> {
        let mut bounds = (f64::MAX, f64::MAX, f64::MIN, f64::MIN);
        let mut seen = false;
        match self {
            Geometry::Point { coordinates } => {
                accumulate(&mut bounds, *coordinates);
                seen = true;
            }
            Geometry::Polygon { coordinates } => {
                for ring in coordinates {
                    for pos in ring {
                        accumulate(&mut bounds, *pos);
                        seen = true;
                    }
                }
            }
            Geometry::MultiPolygon { coordinates } => {
                for poly in coordinates {
                    for ring in poly {
                        for pos in ring {
                            accumulate(&mut bounds, *pos);
                            seen = true;
                        }
                    }
                }
            }
        }
        seen.then_some(bounds)
    }
}

impl Feature {
    pub fn bounds(&self) -> Option<Bounds> {
        self.geometry.bounds()
    }
}

impl FeatureCollection {
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Bounding box of the first feature. Best-effort fit-view input, not a
    /// bound over the whole collection.
    pub fn lead_bounds(&self) -> Option<Bounds> {
        self.features.first().and_then(Feature::bounds)
    }
}

/// Heuristic for coordinates delivered as `[lat, lon]`: a leading ordinate
/// beyond ±90 cannot be a latitude while the trailing one still fits.
/// Diagnostic only; callers log and carry on.
pub fn looks_latlon_swapped(pos: [f64; 2]) -> bool {
    pos[0].abs() > 90.0 && pos[1].abs() <= 90.0
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[[58.094, 56.124], [58.094, 56.125], [58.095, 56.125], [58.094, 56.124]]]
                },
                "properties": {"type": "concentration_cell", "value": 5.0, "timestamp": "2024-01-01T00:00"}
            },
            {
                "type": "Feature",
                "geometry": {"type": "Point", "coordinates": [58.1, 56.2]},
                "properties": {"type": "point_source", "h2s_kg_h": 1.5}
            },
            {
                "type": "Feature",
                "geometry": {"type": "Point", "coordinates": [58.3, 56.4]},
                "properties": {"type": "cadastre_source"}
            }
        ]
    }"#;

    #[test]
    fn parses_all_feature_kinds() {
        let fc: FeatureCollection = serde_json::from_str(SAMPLE).unwrap();
        assert_eq!(fc.features.len(), 3);
        assert_eq!(fc.features[0].properties.kind(), FeatureKind::ConcentrationCell);
        assert_eq!(fc.features[1].properties.kind(), FeatureKind::PointSource);
        assert_eq!(fc.features[2].properties.kind(), FeatureKind::CadastreSource);
    }

    #[test]
    fn unknown_property_type_is_tolerated() {
        let feature: Feature = serde_json::from_str(
            r#"{
                "geometry": {"type": "Point", "coordinates": [0.0, 0.0]},
                "properties": {"type": "wind_arrow", "speed": 3.0}
            }"#,
        )
        .unwrap();
        assert_eq!(feature.properties.kind(), FeatureKind::Unknown);
    }

    #[test]
    fn absent_value_reads_as_zero() {
        let props: FeatureProperties =
            serde_json::from_str(r#"{"type": "concentration_cell"}"#).unwrap();
        assert_eq!(props.concentration(), 0.0);
    }

    #[test]
    fn absent_emission_reads_as_none() {
        let fc: FeatureCollection = serde_json::from_str(SAMPLE).unwrap();
        assert_eq!(fc.features[1].properties.h2s_kg_h(), Some(1.5));
        assert_eq!(fc.features[2].properties.h2s_kg_h(), None);
    }

    #[test]
    fn point_bounds_degenerate_to_the_point() {
        let geometry = Geometry::Point {
            coordinates: [58.1, 56.2],
        };
        assert_eq!(geometry.bounds(), Some((58.1, 56.2, 58.1, 56.2)));
    }

    #[test]
    fn polygon_bounds_span_all_rings() {
        let fc: FeatureCollection = serde_json::from_str(SAMPLE).unwrap();
        let bounds = fc.lead_bounds().unwrap();
        assert_eq!(bounds, (58.094, 56.124, 58.095, 56.125));
    }

    #[test]
    fn multipolygon_bounds_span_all_polygons() {
        let geometry = Geometry::MultiPolygon {
            coordinates: vec![
                vec![vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]]],
                vec![vec![[3.0, 3.0], [4.0, 3.0], [4.0, 5.0], [3.0, 3.0]]],
            ],
        };
        assert_eq!(geometry.bounds(), Some((0.0, 0.0, 4.0, 5.0)));
    }

    #[test]
    fn empty_polygon_has_no_bounds() {
        let geometry = Geometry::Polygon {
            coordinates: Vec::new(),
        };
        assert_eq!(geometry.bounds(), None);
        assert_eq!(geometry.sample_position(), None);
    }

    #[test]
    fn lead_bounds_uses_only_the_first_feature() {
        let fc: FeatureCollection = serde_json::from_str(SAMPLE).unwrap();
        let bounds = fc.lead_bounds().unwrap();
        // The point sources at 58.1..58.3 lie outside the first feature's box.
        assert!(bounds.2 < 58.1);
    }

    #[test]
    fn swapped_coordinate_heuristic() {
        assert!(looks_latlon_swapped([120.0, 56.0]));
        assert!(!looks_latlon_swapped([56.0, 120.0]));
        assert!(!looks_latlon_swapped([58.0, 56.0]));
    }
}
