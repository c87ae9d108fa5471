// src/views/label.rs
//
// On-screen text attached to an entity.

use serde::Serialize;

use crate::models::MapEntity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct DisplayOptions {
    pub show_name: bool,
    pub show_position: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Label {
    pub visible: bool,
    pub text: String,
}

impl Label {
    pub fn hidden() -> Self {
        Label::default()
    }

    /// Labels of loaded entities are always hidden.
    pub fn build(entity: &MapEntity, options: DisplayOptions, suppressed: bool) -> Self {
        if suppressed {
            return Label::hidden();
        }
        let text = describe(entity, options);
        if text.is_empty() {
            return Label::hidden();
        }
        Label {
            visible: true,
            text,
        }
    }
}

/// Name, position and annotations, one per line, in that order.
pub fn describe(entity: &MapEntity, options: DisplayOptions) -> String {
    let mut lines: Vec<String> = Vec::new();
    if options.show_name {
        lines.push(entity.name().to_string());
    }
    if options.show_position {
        let p = entity.position();
        lines.push(format!("Position: {:.4}, {:.4}, {}", p.lat, p.lon, p.alt));
    }
    lines.extend(entity.texts().iter().cloned());
    lines.join("\n")
}
