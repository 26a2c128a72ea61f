//! Domain records shared by the pipeline, the store and the boundary.

pub mod profile;
pub mod recommendation;
pub mod task;

pub use profile::{IndustryProfile, Location, Output};
pub use recommendation::{Converter, MatchRecommendation};
pub use task::{Task, TaskStatus, TaskType, TransitionError};
