// SchoolAdmin Domain
// This crate contains the resources and client logic for the SchoolAdmin back office

// Services that implement client logic
pub mod services;

// Domain entities
pub mod entities;

// Re-export the transport layer from school_admin_data for convenience
pub use school_admin_data::repository;

// Testing utilities - only available in tests or with the mock feature
#[cfg(any(test, feature = "mock"))]
pub mod testing;
