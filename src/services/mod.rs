pub mod compiler;
pub mod pddl;
pub mod template;

pub use compiler::{CompiledScenario, PlanCompiler};
pub use template::{generate_template, write_template};
