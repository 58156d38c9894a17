//! adaptest-core: Grading, level classification, and recommendation engine.
//!
//! This crate defines the data model, the pure assessment components, the
//! collaborator traits a host implements, and the engine that ties them
//! together at the host boundary.

pub mod bank;
pub mod engine;
pub mod error;
pub mod grader;
pub mod level;
pub mod model;
pub mod parser;
pub mod profile;
pub mod recommend;
pub mod retest;
pub mod scoring;
pub mod session;
pub mod traits;

pub use error::AssessmentError;
