pub mod classifier;
pub mod collector;
pub mod executor;
pub mod field_types;
pub mod handlers;
pub mod orchestrator;
pub mod platform;
pub mod resolver;
pub mod watcher;
