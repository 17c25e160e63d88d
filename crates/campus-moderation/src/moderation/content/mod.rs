//! Content registry: discussions, comments, and teacher reviews under one tagged union.

pub mod domain;
pub mod registry;
pub mod repository;

pub use domain::{
    feed_order, ContentDetails, ContentFilter, ContentId, ContentItem, ContentKind, ContentStatus,
    NewContent, ReviewDetails, StatusChange,
};
pub use registry::ContentRegistry;
pub use repository::ContentRepository;
