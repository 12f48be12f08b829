//! Decision Lab core: deterministic scenario catalogs, weekly unlock
//! scheduling, rubric scoring and guided play sessions.
//!
//! Nothing here reads the clock or touches storage directly. Callers pass
//! `now` in and supply a [`curriculum::CurriculumRepository`].

pub mod config;
pub mod context;
pub mod curriculum;
pub mod feedback;
pub mod rng;
pub mod rubric;
pub mod scenario;
pub mod schedule;
pub mod session;

pub use config::CurriculumConfig;
pub use curriculum::{load_or_generate, CurriculumRepository, CurriculumYear, KeyValueStore};
pub use rubric::{Justification, Rubric, ScoreResult};
pub use scenario::Scenario;
pub use session::Session;
