pub mod applicants;
pub mod cards;
pub mod config;
pub mod context;
pub mod dlq;
pub mod domain;
pub mod engine;
pub mod ingestion;
pub mod insights;
pub mod poster;
pub mod sinks;
pub mod store;
pub mod workflow;

pub use config::CoreConfig;
pub use context::Context;
pub use engine::Engine;
pub use store::MemoryStore;
