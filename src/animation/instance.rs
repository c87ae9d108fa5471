// src/animation/instance.rs
//
// A compiled, absolutely timed animation. Instances never change after
// compilation; whatever an animation captures while running lives in
// its AnimationState.

use serde::Serialize;

use crate::animation::AnimationKind;
use crate::views::HighlightColor;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind")]
pub enum Effect {
    #[serde(rename = "move")]
    Move {
        lat_from: Option<f64>,
        lon_from: Option<f64>,
        alti_from: Option<f64>,
        lat_to: f64,
        lon_to: f64,
        alti_to: Option<f64>,
    },
    /// Toward the secondary entity, stopping `distance` metres short of it.
    #[serde(rename = "move_to")]
    MoveTo { distance: Option<f64> },
    #[serde(rename = "text")]
    AddText { text: String },
    #[serde(rename = "arrow")]
    Arrow,
    #[serde(rename = "around")]
    Around { distance: f64, angle: f64 },
    #[serde(rename = "image")]
    ChangeIcon { image: String },
    #[serde(rename = "background")]
    Background { image: String },
    #[serde(rename = "size")]
    Size { size: f64 },
    #[serde(rename = "opacity")]
    Opacity { opacity: f64 },
    #[serde(rename = "rotate")]
    Rotate { angle: f64 },
    #[serde(rename = "highlight")]
    Highlight { color: HighlightColor },
    #[serde(rename = "load")]
    Load,
    #[serde(rename = "unload")]
    Unload,
}

impl Effect {
    pub fn kind(&self) -> AnimationKind {
        match self {
            Effect::Move { .. } => AnimationKind::Move,
            Effect::MoveTo { .. } => AnimationKind::MoveTo,
            Effect::AddText { .. } => AnimationKind::AddText,
            Effect::Arrow => AnimationKind::Arrow,
            Effect::Around { .. } => AnimationKind::Around,
            Effect::ChangeIcon { .. } => AnimationKind::ChangeIcon,
            Effect::Background { .. } => AnimationKind::Background,
            Effect::Size { .. } => AnimationKind::Size,
            Effect::Opacity { .. } => AnimationKind::Opacity,
            Effect::Rotate { .. } => AnimationKind::Rotate,
            Effect::Highlight { .. } => AnimationKind::Highlight,
            Effect::Load => AnimationKind::Load,
            Effect::Unload => AnimationKind::Unload,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnimationInstance {
    pub start: u32,
    pub end: u32,
    pub entity_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_id2: Option<String>,
    /// Annotation appended to the target on every successful tick.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(flatten)]
    pub effect: Effect,
}

impl AnimationInstance {
    pub fn kind(&self) -> AnimationKind {
        self.effect.kind()
    }

    pub fn priority(&self) -> u8 {
        self.kind().priority()
    }

    pub fn is_active_at(&self, tick: u32) -> bool {
        self.start <= tick && tick <= self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load() -> AnimationInstance {
        AnimationInstance {
            start: 0,
            end: 5,
            entity_id: "tru1".to_string(),
            entity_id2: Some("obj1".to_string()),
            text: None,
            effect: Effect::Load,
        }
    }

    #[test]
    fn test_activity_window_is_inclusive() {
        let anim = load();
        assert!(anim.is_active_at(0));
        assert!(anim.is_active_at(5));
        assert!(!anim.is_active_at(6));
    }

    #[test]
    fn test_effect_kind_matches_tag() {
        assert_eq!(load().kind(), AnimationKind::Load);
        assert_eq!(load().priority(), 0);
        let size = Effect::Size { size: 2.0 };
        assert_eq!(size.kind().tag(), "size");
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(load()).unwrap();
        assert_eq!(json["kind"], "load");
        assert_eq!(json["entity_id"], "tru1");
        assert_eq!(json["entity_id2"], "obj1");
        assert!(json.get("text").is_none());
    }
}
