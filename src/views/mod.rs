// src/views/mod.rs

pub mod label;
pub mod overlay;
pub mod symbol;

pub use label::{DisplayOptions, Label};
pub use overlay::{Arrow, Overlay, TraceSegment};
pub use symbol::{HighlightColor, SymbolCategory, SymbolLayer};
