//! High-level operations.
//!
//! This module contains the implementation of slink commands.

pub mod link;
pub mod shared_store;
pub mod unlink;

pub use link::{link_project, load_manifest, LinkReport};
pub use shared_store::{resolve_shared_store, SharedStoreOutcome, StoreError};
pub use unlink::{publish_project, unlink_project, UnlinkReport};
