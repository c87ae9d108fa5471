pub mod geometry;
pub mod map_entity;
pub mod plan_model;
pub mod registry;

pub use geometry::GeoPosition;
pub use map_entity::MapEntity;
pub use plan_model::{GroundFact, Parameter, PlanModel, PlanStep, TypedObject};
pub use registry::EntityRegistry;
