// Library crate for the SmartScore entries API
// This file exposes the public API for integration tests

pub mod entries;
pub mod shared;

// Re-export commonly used types for easier access in tests
pub use entries::{ApiRequest, EntryRepository, EntryService, InMemoryEntryRepository};
pub use shared::{AppError, AppState};
