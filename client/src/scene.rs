use std::collections::HashMap;

use plume_shared::{FeatureCollection, FeatureKind};

use crate::style;

pub const CONCENTRATION_SOURCE: &str = "concentration";
pub const BASEMAP_LAYER: &str = "basemap";
pub const FILL_LAYER: &str = "concentration-fills";
pub const POINT_LAYER: &str = "point-sources";
pub const CADASTRE_LAYER: &str = "cadastre-sources";

#[derive(Debug, Clone, PartialEq)]
pub struct CircleStyle {
    pub radius: f64,
    pub color: &'static str,
    pub stroke_width: f64,
    pub stroke_color: &'static str,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LayerKind {
    /// Raster tile backdrop; not backed by a geometry source.
    Basemap,
    /// Polygon fill color-ramped by the feature's concentration value.
    Fill,
    Circle(CircleStyle),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    pub id: &'static str,
    pub kind: LayerKind,
    /// Geometry source this layer draws from; `None` for the basemap.
    pub source: Option<&'static str>,
    /// Only features of this kind are drawn and hit-tested.
    pub filter: Option<FeatureKind>,
}

/// The renderer's scene: named geometry sources plus an ordered layer stack
/// (index 0 draws first, last draws on top).
pub struct MapScene {
    sources: HashMap<&'static str, FeatureCollection>,
    layers: Vec<Layer>,
}

impl Default for MapScene {
    fn default() -> Self {
        Self::new()
    }
}

impl MapScene {
    pub fn new() -> Self {
        Self {
            sources: HashMap::new(),
            layers: vec![Layer {
                id: BASEMAP_LAYER,
                kind: LayerKind::Basemap,
                source: None,
                filter: None,
            }],
        }
    }

    /// Register a geometry source, or update an existing one in place.
    /// Layers referencing it are untouched either way.
    pub fn set_source(&mut self, id: &'static str, data: FeatureCollection) {
        self.sources.insert(id, data);
    }

    pub fn source(&self, id: &str) -> Option<&FeatureCollection> {
        self.sources.get(id)
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    pub fn has_layer(&self, id: &str) -> bool {
        self.layers.iter().any(|layer| layer.id == id)
    }

    pub fn add_layer_if_absent(&mut self, layer: Layer) -> bool {
        if self.has_layer(layer.id) {
            return false;
        }
        self.layers.push(layer);
        true
    }

    /// Layers in draw order.
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Layers drawing from a geometry source (excludes the basemap).
    pub fn vector_layer_count(&self) -> usize {
        self.layers.iter().filter(|l| l.source.is_some()).count()
    }

    /// Move a layer directly beneath the first layer whose id satisfies the
    /// predicate; with no match the layer goes to the top of the stack.
    pub fn move_layer_below(&mut self, id: &str, predicate: impl Fn(&str) -> bool) {
        let Some(from) = self.layers.iter().position(|layer| layer.id == id) else {
            return;
        };
        let layer = self.layers.remove(from);
        let target = self.layers.iter().position(|other| predicate(other.id));
        match target {
            Some(index) => self.layers.insert(index, layer),
            None => self.layers.push(layer),
        }
    }

    /// Install the dispersion layer set for a geometry payload. Idempotent:
    /// repeated calls refresh the source data in place and leave the layer
    /// stack unchanged.
    pub fn install_dispersion_layers(&mut self, data: FeatureCollection) {
        self.set_source(CONCENTRATION_SOURCE, data);

        let added = self.add_layer_if_absent(Layer {
            id: FILL_LAYER,
            kind: LayerKind::Fill,
            source: Some(CONCENTRATION_SOURCE),
            filter: Some(FeatureKind::ConcentrationCell),
        });
        self.add_layer_if_absent(Layer {
            id: POINT_LAYER,
            kind: LayerKind::Circle(CircleStyle {
                radius: style::SOURCE_RADIUS_PX,
                color: style::POINT_SOURCE_COLOR,
                stroke_width: style::SOURCE_STROKE_PX,
                stroke_color: style::SOURCE_STROKE_COLOR,
            }),
            source: Some(CONCENTRATION_SOURCE),
            filter: Some(FeatureKind::PointSource),
        });
        self.add_layer_if_absent(Layer {
            id: CADASTRE_LAYER,
            kind: LayerKind::Circle(CircleStyle {
                radius: style::SOURCE_RADIUS_PX,
                color: style::CADASTRE_SOURCE_COLOR,
                stroke_width: style::SOURCE_STROKE_PX,
                stroke_color: style::SOURCE_STROKE_COLOR,
            }),
            source: Some(CONCENTRATION_SOURCE),
            filter: Some(FeatureKind::CadastreSource),
        });

        if added {
            // Tuck the fill under water/land styling when the basemap exposes
            // such layers; raster basemaps don't, so it rides on top.
            self.move_layer_below(FILL_LAYER, |id| {
                id.contains("water") || id.contains("land")
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plume_shared::{Feature, FeatureProperties, Geometry};

    fn cell(value: f64) -> Feature {
        Feature {
            geometry: Geometry::Polygon {
                coordinates: vec![vec![
                    [0.0, 0.0],
                    [1.0, 0.0],
                    [1.0, 1.0],
                    [0.0, 0.0],
                ]],
            },
            properties: FeatureProperties::ConcentrationCell {
                value: Some(value),
                timestamp: None,
            },
        }
    }

    fn collection(values: &[f64]) -> FeatureCollection {
        FeatureCollection {
            features: values.iter().copied().map(cell).collect(),
        }
    }

    #[test]
    fn install_is_idempotent() {
        let mut scene = MapScene::new();
        scene.install_dispersion_layers(collection(&[1.0]));
        scene.install_dispersion_layers(collection(&[1.0]));

        assert_eq!(scene.source_count(), 1);
        assert_eq!(scene.vector_layer_count(), 3);
    }

    #[test]
    fn reinstall_updates_source_data_in_place() {
        let mut scene = MapScene::new();
        scene.install_dispersion_layers(collection(&[1.0]));
        let ids_before: Vec<&str> = scene.layers().iter().map(|l| l.id).collect();

        scene.install_dispersion_layers(collection(&[2.0, 3.0]));
        let ids_after: Vec<&str> = scene.layers().iter().map(|l| l.id).collect();

        assert_eq!(ids_before, ids_after);
        assert_eq!(
            scene.source(CONCENTRATION_SOURCE).unwrap().features.len(),
            2
        );
    }

    #[test]
    fn fill_moves_to_top_without_water_or_land_layers() {
        let mut scene = MapScene::new();
        scene.install_dispersion_layers(collection(&[1.0]));
        assert_eq!(scene.layers().last().unwrap().id, FILL_LAYER);
    }

    #[test]
    fn fill_tucks_beneath_a_water_layer() {
        let mut scene = MapScene::new();
        scene.add_layer_if_absent(Layer {
            id: "osm-water-shading",
            kind: LayerKind::Basemap,
            source: None,
            filter: None,
        });
        scene.install_dispersion_layers(collection(&[1.0]));

        let ids: Vec<&str> = scene.layers().iter().map(|l| l.id).collect();
        let fill = ids.iter().position(|id| *id == FILL_LAYER).unwrap();
        let water = ids.iter().position(|id| *id == "osm-water-shading").unwrap();
        assert_eq!(fill + 1, water);
    }

    #[test]
    fn add_layer_if_absent_rejects_duplicates() {
        let mut scene = MapScene::new();
        assert!(!scene.add_layer_if_absent(Layer {
            id: BASEMAP_LAYER,
            kind: LayerKind::Basemap,
            source: None,
            filter: None,
        }));
    }
}
