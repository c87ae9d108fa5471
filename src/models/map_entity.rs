// src/models/map_entity.rs
//
// A graphical entity on the map and its mutable visual state.
// Mutators take the refresh flag they contribute; flags only ever
// go from false to true until the matching refresh clears them.

use serde::Serialize;

use crate::models::GeoPosition;
use crate::views::{DisplayOptions, HighlightColor, Label, SymbolCategory};

pub const DEFAULT_SIZE: f64 = 5.0;
pub const DEFAULT_OPACITY: f64 = 1.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapEntity {
    id: String,
    name: String,
    icon: String,
    default_icon: String,
    size: f64,
    opacity: f64,
    angle: f64,
    highlight: Option<HighlightColor>,
    background: Option<String>,
    position: GeoPosition,
    default_position: GeoPosition,
    texts: Vec<String>,

    needs_category_refresh: bool,
    needs_label_refresh: bool,

    #[serde(skip)]
    category: Option<SymbolCategory>,
    #[serde(skip)]
    label: Label,
}

impl MapEntity {
    pub fn new(id: &str, name: &str, icon: &str, position: GeoPosition) -> Self {
        let mut entity = MapEntity {
            id: id.to_string(),
            name: name.to_string(),
            icon: icon.to_string(),
            default_icon: icon.to_string(),
            size: DEFAULT_SIZE,
            opacity: DEFAULT_OPACITY,
            angle: 0.0,
            highlight: None,
            background: None,
            position,
            default_position: position,
            texts: Vec::new(),
            needs_category_refresh: false,
            needs_label_refresh: false,
            category: None,
            label: Label::hidden(),
        };
        entity.category = Some(SymbolCategory::build(&entity));
        entity
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn icon(&self) -> &str {
        &self.icon
    }

    pub fn size(&self) -> f64 {
        self.size
    }

    pub fn opacity(&self) -> f64 {
        self.opacity
    }

    pub fn angle(&self) -> f64 {
        self.angle
    }

    pub fn highlight(&self) -> Option<HighlightColor> {
        self.highlight
    }

    pub fn background(&self) -> Option<&str> {
        self.background.as_deref()
    }

    pub fn position(&self) -> GeoPosition {
        self.position
    }

    pub fn default_position(&self) -> GeoPosition {
        self.default_position
    }

    pub fn texts(&self) -> &[String] {
        &self.texts
    }

    pub fn needs_category_refresh(&self) -> bool {
        self.needs_category_refresh
    }

    pub fn needs_label_refresh(&self) -> bool {
        self.needs_label_refresh
    }

    pub fn mark_category(&mut self, value: bool) {
        self.needs_category_refresh = self.needs_category_refresh || value;
    }

    pub fn mark_label(&mut self, value: bool) {
        self.needs_label_refresh = self.needs_label_refresh || value;
    }

    /************************* Mutators ********************/

    pub fn move_to(&mut self, position: GeoPosition) {
        self.position = position;
        self.mark_label(true);
    }

    /// Copy another entity's position.
    pub fn move_to_entity(&mut self, other: &MapEntity) {
        self.move_to(other.position);
    }

    pub fn set_size(&mut self, value: f64, refresh: bool) {
        self.size = value;
        self.mark_category(refresh);
    }

    pub fn set_opacity(&mut self, value: f64, refresh: bool) {
        self.opacity = value;
        self.mark_category(refresh);
    }

    pub fn set_angle(&mut self, value: f64, refresh: bool) {
        self.angle = value;
        self.mark_category(refresh);
    }

    pub fn set_icon(&mut self, icon: &str, refresh: bool) {
        self.icon = icon.to_string();
        self.mark_category(refresh);
    }

    pub fn set_highlight(&mut self, color: Option<HighlightColor>, refresh: bool) {
        self.highlight = color;
        self.mark_category(refresh);
    }

    pub fn set_background(&mut self, image: Option<String>, refresh: bool) {
        self.background = image;
        self.mark_category(refresh);
    }

    pub fn append_text(&mut self, text: &str) {
        self.texts.push(text.to_string());
        self.mark_label(true);
    }

    pub fn reset_text(&mut self) {
        if !self.texts.is_empty() {
            self.texts.clear();
            self.mark_label(true);
        }
    }

    /************************* Resets ********************/

    pub fn reset_icon(&mut self) {
        let icon = self.default_icon.clone();
        self.set_icon(&icon, true);
    }

    pub fn reset_highlight(&mut self) {
        self.set_highlight(None, true);
    }

    pub fn reset_background(&mut self) {
        self.set_background(None, true);
    }

    /// Everything back to its initial value, both flags raised.
    pub fn reset(&mut self) {
        self.reset_icon();
        self.move_to(self.default_position);
        self.set_size(DEFAULT_SIZE, true);
        self.reset_text();
        self.set_angle(0.0, true);
        self.set_opacity(DEFAULT_OPACITY, true);
        self.reset_highlight();
        self.reset_background();
        self.label = Label::hidden();
        self.mark_label(true);
    }

    /************************* Derived views ********************/

    pub fn refresh_category(&mut self) -> &SymbolCategory {
        self.needs_category_refresh = false;
        let category = SymbolCategory::build(self);
        self.category.insert(category)
    }

    pub fn refresh_label(&mut self, options: DisplayOptions, suppressed: bool) -> &Label {
        self.needs_label_refresh = false;
        self.label = Label::build(self, options, suppressed);
        &self.label
    }

    pub fn category(&self) -> Option<&SymbolCategory> {
        self.category.as_ref()
    }

    pub fn label(&self) -> &Label {
        &self.label
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn truck() -> MapEntity {
        MapEntity::new("tru1", "tru1", "truck.svg", GeoPosition::new(45.0, 5.0, 0.0))
    }

    #[test]
    fn test_defaults() {
        let e = truck();
        assert_eq!(e.size(), DEFAULT_SIZE);
        assert_eq!(e.opacity(), 1.0);
        assert_eq!(e.angle(), 0.0);
        assert!(e.highlight().is_none());
        assert!(!e.needs_category_refresh());
        assert!(!e.needs_label_refresh());
        assert!(e.category().is_some());
    }

    #[test]
    fn test_latch_is_sticky() {
        let mut e = truck();
        e.set_size(8.0, true);
        e.set_size(9.0, false);
        assert!(e.needs_category_refresh());
        assert_eq!(e.size(), 9.0);

        e.refresh_category();
        assert!(!e.needs_category_refresh());
        e.set_opacity(0.2, false);
        assert!(!e.needs_category_refresh());
    }

    #[test]
    fn test_reset_text_only_latches_when_non_empty() {
        let mut e = truck();
        e.reset_text();
        assert!(!e.needs_label_refresh());
        e.append_text("hi");
        e.refresh_label(DisplayOptions::default(), false);
        e.reset_text();
        assert!(e.needs_label_refresh());
        assert!(e.texts().is_empty());
    }

    #[test]
    fn test_reset_restores_defaults() {
        let mut e = truck();
        e.move_to(GeoPosition::new(46.0, 6.0, 100.0));
        e.set_icon("boat.svg", true);
        e.set_size(20.0, true);
        e.set_angle(45.0, true);
        e.set_opacity(0.3, true);
        e.set_highlight(Some(HighlightColor::Green), true);
        e.set_background(Some("bg.png".to_string()), true);
        e.append_text("note");

        e.reset();
        let mut fresh = truck();
        fresh.mark_category(true);
        fresh.mark_label(true);
        assert_eq!(e, fresh);
    }

    #[test]
    fn test_move_to_entity_latches_label() {
        let mut e = truck();
        let depot = MapEntity::new("pos2", "pos2", "depot.svg", GeoPosition::new(46.0, 6.0, 12.0));
        e.move_to_entity(&depot);
        assert_eq!(e.position(), depot.position());
        assert_eq!(e.default_position(), GeoPosition::new(45.0, 5.0, 0.0));
        assert!(e.needs_label_refresh());
    }

    #[test]
    fn test_refresh_category_reflects_state() {
        let mut e = truck();
        e.set_icon("boat.svg", true);
        assert_eq!(e.category().and_then(|c| c.icon()), Some("truck.svg"));
        assert_eq!(e.refresh_category().icon(), Some("boat.svg"));
    }
}
