//! Embedding index: lesson reading, offline build, and the persisted store

pub mod builder;
pub mod documents;
pub mod store;

pub use builder::IndexBuilder;
pub use documents::{read_lessons, Document};
pub use store::{ChunkMetadata, IndexStore};
