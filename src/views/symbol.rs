// src/views/symbol.rs
//
// Render-ready symbol description for one entity.
// A category is a stack of layers drawn bottom to top.

use serde::Serialize;

use crate::models::MapEntity;

pub const GLOW_SPREAD: f64 = 5.0;
pub const BACKGROUND_SCALE: f64 = 3.0;
pub const BACKGROUND_OPACITY: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HighlightColor {
    Yellow,
    Green,
    Blue,
    Red,
}

impl HighlightColor {
    /// Unknown names fall back to yellow.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "green" => HighlightColor::Green,
            "blue" => HighlightColor::Blue,
            "red" => HighlightColor::Red,
            _ => HighlightColor::Yellow,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            HighlightColor::Yellow => "yellow",
            HighlightColor::Green => "green",
            HighlightColor::Blue => "blue",
            HighlightColor::Red => "red",
        }
    }

    pub fn hex(self) -> &'static str {
        match self {
            HighlightColor::Yellow => "#ffff00",
            HighlightColor::Green => "#00ff00",
            HighlightColor::Blue => "#0000ff",
            HighlightColor::Red => "#ff0000",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "layer", rename_all = "snake_case")]
pub enum SymbolLayer {
    Glow { color: HighlightColor, spread: f64 },
    Background { image: String, size: f64, opacity: f64 },
    Icon { image: String, size: f64, angle: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SymbolCategory {
    pub entity_id: String,
    pub label: String,
    pub size: f64,
    pub opacity: f64,
    pub layers: Vec<SymbolLayer>,
}

impl SymbolCategory {
    pub fn build(entity: &MapEntity) -> Self {
        let mut size = entity.size();
        let mut layers = Vec::with_capacity(3);

        if let Some(color) = entity.highlight() {
            layers.push(SymbolLayer::Glow {
                color,
                spread: GLOW_SPREAD,
            });
        }

        if let Some(image) = entity.background() {
            layers.push(SymbolLayer::Background {
                image: image.to_string(),
                size: entity.size() * BACKGROUND_SCALE,
                opacity: BACKGROUND_OPACITY,
            });
            size = entity.size() * BACKGROUND_SCALE;
        }

        layers.push(SymbolLayer::Icon {
            image: entity.icon().to_string(),
            size: entity.size(),
            angle: entity.angle(),
        });

        SymbolCategory {
            entity_id: entity.id().to_string(),
            label: entity.name().to_string(),
            size,
            opacity: entity.opacity(),
            layers,
        }
    }

    pub fn icon(&self) -> Option<&str> {
        self.layers.iter().find_map(|layer| match layer {
            SymbolLayer::Icon { image, .. } => Some(image.as_str()),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GeoPosition;

    fn entity() -> MapEntity {
        MapEntity::new("tru1", "tru1", "truck.svg", GeoPosition::new(45.0, 5.0, 0.0))
    }

    #[test]
    fn test_plain_icon() {
        let category = SymbolCategory::build(&entity());
        assert_eq!(category.layers.len(), 1);
        assert_eq!(category.size, 5.0);
        assert_eq!(category.icon(), Some("truck.svg"));
    }

    #[test]
    fn test_layer_order_with_highlight_and_background() {
        let mut e = entity();
        e.set_highlight(Some(HighlightColor::Red), true);
        e.set_background(Some("halo.png".to_string()), true);
        e.set_angle(90.0, true);

        let category = SymbolCategory::build(&e);
        assert_eq!(category.size, 15.0);
        assert!(matches!(
            category.layers[0],
            SymbolLayer::Glow { color: HighlightColor::Red, .. }
        ));
        assert_eq!(
            category.layers[1],
            SymbolLayer::Background {
                image: "halo.png".to_string(),
                size: 15.0,
                opacity: 0.5
            }
        );
        assert_eq!(
            category.layers[2],
            SymbolLayer::Icon {
                image: "truck.svg".to_string(),
                size: 5.0,
                angle: 90.0
            }
        );
    }

    #[test]
    fn test_highlight_fallback() {
        assert_eq!(HighlightColor::from_name("Blue"), HighlightColor::Blue);
        assert_eq!(HighlightColor::from_name("purple"), HighlightColor::Yellow);
        assert_eq!(HighlightColor::from_name(""), HighlightColor::Yellow);
    }
}
