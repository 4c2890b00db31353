// Public API - what other modules can use
pub use handlers::{dispatch, health};
pub use repository::{EntryRepository, InMemoryEntryRepository, MongoEntryRepository};
pub use service::EntryService;
pub use types::ApiRequest;

// Internal modules
pub mod codec;
mod handlers;
pub mod models;
pub mod repository;
pub mod service;
pub mod types;
