// src/services/mod.rs
//
// Shared services used across the domain modules: settings, AI providers,
// object storage, monitoring

pub mod ai;
pub mod encryption;
pub mod monitoring;
pub mod settings;
pub mod storage;

// Re-export commonly used types for convenience
pub use ai::AIService;
pub use settings::SettingsService;
pub use storage::StorageService;
