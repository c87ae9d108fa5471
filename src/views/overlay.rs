// src/views/overlay.rs
//
// Transient drawings on top of the entities: arrows for the current tick
// and the movement traces accumulated since playback started.

use serde::Serialize;

use crate::models::GeoPosition;
use crate::utilities::color::{trace_color, Rgb};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Arrow {
    pub from: String,
    pub to: String,
}

impl Arrow {
    fn same_pair(&self, a: &str, b: &str) -> bool {
        (self.from == a && self.to == b) || (self.from == b && self.to == a)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TraceSegment {
    pub entity_id: String,
    pub from: GeoPosition,
    pub to: GeoPosition,
    pub color: Rgb,
}

#[derive(Debug, Clone, Default)]
pub struct Overlay {
    arrows: Vec<Arrow>,
    traces: Vec<TraceSegment>,
}

impl Overlay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false when the unordered pair is already drawn this tick.
    pub fn add_arrow(&mut self, from: &str, to: &str) -> bool {
        if self.arrows.iter().any(|a| a.same_pair(from, to)) {
            return false;
        }
        self.arrows.push(Arrow {
            from: from.to_string(),
            to: to.to_string(),
        });
        true
    }

    pub fn clear_arrows(&mut self) {
        self.arrows.clear();
    }

    pub fn arrows(&self) -> &[Arrow] {
        &self.arrows
    }

    pub fn add_trace(&mut self, entity_id: &str, from: GeoPosition, to: GeoPosition) {
        if from == to {
            return;
        }
        self.traces.push(TraceSegment {
            entity_id: entity_id.to_string(),
            from,
            to,
            color: trace_color(entity_id),
        });
    }

    pub fn traces(&self) -> &[TraceSegment] {
        &self.traces
    }

    pub fn clear(&mut self) {
        self.arrows.clear();
        self.traces.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arrow_dedup_is_unordered() {
        let mut overlay = Overlay::new();
        assert!(overlay.add_arrow("a", "b"));
        assert!(!overlay.add_arrow("b", "a"));
        assert!(!overlay.add_arrow("a", "b"));
        assert!(overlay.add_arrow("a", "c"));
        assert_eq!(overlay.arrows().len(), 2);

        overlay.clear_arrows();
        assert!(overlay.arrows().is_empty());
        assert!(overlay.add_arrow("b", "a"));
    }

    #[test]
    fn test_traces_skip_zero_length() {
        let mut overlay = Overlay::new();
        let p = GeoPosition::new(1.0, 1.0, 0.0);
        overlay.add_trace("tru1", p, p);
        overlay.add_trace("tru1", p, GeoPosition::new(2.0, 1.0, 0.0));
        assert_eq!(overlay.traces().len(), 1);
        assert_eq!(overlay.traces()[0].color, trace_color("tru1"));

        overlay.clear();
        assert!(overlay.traces().is_empty());
    }
}
