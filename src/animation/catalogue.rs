// src/animation/catalogue.rs
//
// The closed set of animation kinds a scenario can use.
// Tags are the external vocabulary of scenario files.

use serde::Serialize;
use std::fmt;

use crate::errors::UnknownKindError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnimationKind {
    Move,
    MoveTo,
    AddText,
    Arrow,
    Around,
    ChangeIcon,
    Background,
    Size,
    Opacity,
    Rotate,
    Highlight,
    Load,
    Unload,
}

impl AnimationKind {
    pub const ALL: [AnimationKind; 13] = [
        AnimationKind::Move,
        AnimationKind::MoveTo,
        AnimationKind::AddText,
        AnimationKind::Arrow,
        AnimationKind::Around,
        AnimationKind::ChangeIcon,
        AnimationKind::Background,
        AnimationKind::Size,
        AnimationKind::Opacity,
        AnimationKind::Rotate,
        AnimationKind::Highlight,
        AnimationKind::Load,
        AnimationKind::Unload,
    ];

    pub fn from_tag(tag: &str) -> Result<Self, UnknownKindError> {
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.tag() == tag)
            .ok_or_else(|| UnknownKindError(tag.to_string()))
    }

    pub fn tag(self) -> &'static str {
        match self {
            AnimationKind::Move => "move",
            AnimationKind::MoveTo => "move_to",
            AnimationKind::AddText => "text",
            AnimationKind::Arrow => "arrow",
            AnimationKind::Around => "around",
            AnimationKind::ChangeIcon => "image",
            AnimationKind::Background => "background",
            AnimationKind::Size => "size",
            AnimationKind::Opacity => "opacity",
            AnimationKind::Rotate => "rotate",
            AnimationKind::Highlight => "highlight",
            AnimationKind::Load => "load",
            AnimationKind::Unload => "unload",
        }
    }

    /// Attribute names, as written in scenario files, that must be present.
    pub fn required_attributes(self) -> &'static [&'static str] {
        match self {
            AnimationKind::Move => &["var_object", "lat_to", "lon_to"],
            AnimationKind::MoveTo => &["var_object_to_move", "var_object_destination"],
            AnimationKind::AddText => &["var_object", "text"],
            AnimationKind::Arrow => &["var_object_start", "var_object_end"],
            AnimationKind::Around => &[
                "var_object_who_move",
                "var_object_center",
                "distance",
                "angle",
            ],
            AnimationKind::ChangeIcon | AnimationKind::Background => &["var_object", "path_image"],
            AnimationKind::Size => &["var_object", "size"],
            AnimationKind::Opacity => &["var_object", "opacity"],
            AnimationKind::Rotate => &["var_object", "angle"],
            AnimationKind::Highlight => &["var_object", "color"],
            AnimationKind::Load => &["var_object_who_load", "var_object_loaded"],
            AnimationKind::Unload => &["var_object_who_unload", "var_object_unloaded"],
        }
    }

    pub fn optional_attributes(self) -> &'static [&'static str] {
        match self {
            AnimationKind::Move => &["lat_from", "lon_from", "alti_from", "alti_to", "text"],
            AnimationKind::MoveTo => &["distance", "text"],
            AnimationKind::AddText => &[],
            _ => &["text"],
        }
    }

    /// Map a scenario attribute name to the key the compiler reads.
    /// Names without a mapping are returned unchanged.
    pub fn resolve_symbolic_name(self, name: &str) -> &str {
        let mapped = match (self, name) {
            (_, "var_object") => "entity_id",
            (_, "path_image") => "image",
            (AnimationKind::MoveTo, "var_object_to_move") => "entity_id",
            (AnimationKind::MoveTo, "var_object_destination") => "entity_id2",
            (AnimationKind::Arrow, "var_object_start") => "entity_id",
            (AnimationKind::Arrow, "var_object_end") => "entity_id2",
            (AnimationKind::Around, "var_object_who_move") => "entity_id",
            (AnimationKind::Around, "var_object_center") => "entity_id2",
            (AnimationKind::Load, "var_object_who_load") => "entity_id",
            (AnimationKind::Load, "var_object_loaded") => "entity_id2",
            (AnimationKind::Unload, "var_object_who_unload") => "entity_id",
            (AnimationKind::Unload, "var_object_unloaded") => "entity_id2",
            _ => return name,
        };
        mapped
    }

    /// Execution order inside one tick, lower first.
    pub fn priority(self) -> u8 {
        match self {
            AnimationKind::Load => 0,
            AnimationKind::Unload => 6,
            _ => 3,
        }
    }

    /// Kinds that act on a pair of entities.
    pub fn is_binary(self) -> bool {
        matches!(
            self,
            AnimationKind::MoveTo
                | AnimationKind::Arrow
                | AnimationKind::Around
                | AnimationKind::Load
                | AnimationKind::Unload
        )
    }
}

impl fmt::Display for AnimationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}
