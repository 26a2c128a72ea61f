//! Candidate selection and scoring of waste-to-input matches.

pub mod engine;
pub mod score;

pub use engine::{MatchEngine, MatchRunSummary, FALLBACK_REASONING};
pub use score::{compute_score, planar_distance};
