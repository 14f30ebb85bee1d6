//! Canvas view of a relationship tree, kept in sync with a [`GraphStore`].

mod component;
mod config;
mod decoration;
mod drag;
mod highlight;
mod image;
mod labels;
mod layout;
mod render;
mod scene;
mod state;
mod store;
mod types;
mod vocabulary;

pub use component::RelationshipGraphCanvas;
pub use config::GraphViewConfig;
pub use store::{GraphStore, MemoryStore, StoreError};
pub use types::{
	PersonId, PersonRecord, RelationshipCategory, RelationshipRecord, Sex, Snapshot, TreeId,
};
