pub mod apply;
pub mod catalogue;
pub mod instance;

pub use apply::{apply, AnimationState, TickContext};
pub use catalogue::AnimationKind;
pub use instance::{AnimationInstance, Effect};
