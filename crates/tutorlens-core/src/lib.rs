//! Core tutoring pipeline: prompt text, response normalization, and the
//! primary/fallback solve loop.

pub mod config;
pub mod locale;
pub mod normalize;
pub mod prompt;
pub mod solver;

pub use normalize::{Analysis, NormalizeError, Quiz};
pub use prompt::Language;
pub use solver::{SolveError, Solver};
