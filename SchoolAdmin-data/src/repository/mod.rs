// Repository module structure
pub mod errors;
mod in_memory;
mod resource;
#[cfg(feature = "http")]
mod http;

// Re-export commonly used types
pub use errors::RepositoryError;
pub use in_memory::{InMemoryResourceStore, DEFAULT_STATUS_FIELD};
pub use resource::ResourceRepositoryTrait;
#[cfg(feature = "http")]
pub use http::{HttpResourceRepository, CHANGE_STATUS_SEGMENT};

// Mock transport generated for downstream tests
#[cfg(feature = "mock")]
pub use resource::MockResourceRepositoryTrait;
