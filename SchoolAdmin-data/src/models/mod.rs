// Wire models shared by every transport
pub mod envelope;
pub mod params;

pub use envelope::{ItemResponse, ListResponse, MetaLink, PageLinks, PageMeta};
pub use params::{ListParams, StatusChangeRequest};
