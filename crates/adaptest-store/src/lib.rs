//! adaptest-store: Reference stores and configuration.
//!
//! Implements the adaptest-core persistence traits in memory, provides
//! deterministic clocks and id generators for tests and demos, and loads
//! engine configuration from TOML files and the environment.

pub mod config;
pub mod memory;
pub mod mock;

pub use config::{load_config, load_config_from, AdaptestConfig};
pub use memory::{MemoryLevelLog, MemoryRecommendationStore, MemorySessionStore, MemoryStores};
pub use mock::{ManualClock, SequentialIds};
