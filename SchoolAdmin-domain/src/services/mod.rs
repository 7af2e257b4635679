pub mod address;
pub mod debounce;
pub mod pagination;
pub mod query;
pub mod resource_client;

// Domain services
// Query-driven resource clients and the helpers screens build on them.

// Re-export the client surface
pub use address::{AddressBook, AddressError, AddressLevel, AddressSelection, AddressService, StoredNode};
pub use debounce::{DebouncedSearch, Debouncer, DEFAULT_SEARCH_DEBOUNCE};
pub use pagination::{Page, Pagination};
pub use query::{Query, DEFAULT_ITEMS_PER_PAGE, PAGE_SIZE_OPTIONS};
pub use resource_client::{
    map_repo_error, ClientError, ClientPhase, ListFailurePolicy, MutationPolicy,
    PaginatedResourceClient,
};
