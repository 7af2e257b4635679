// SchoolAdmin Data
// This crate handles the wire format of the REST backend and the transports that speak it

// Backend connection settings
pub mod config;

// Transports for resource collections
pub mod repository;

// Wire envelopes and request parameters
pub mod models;
