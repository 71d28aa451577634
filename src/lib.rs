pub mod buffers;
pub mod config;
pub mod context;
pub mod core;
pub mod engine;
pub mod filters;
pub mod hal;
pub mod labeling;
pub mod observability;
pub mod resilience;
pub mod storage;

pub use config::{AppConfig, ConfigManager};
pub use context::{CollectionContext, ContextError};
