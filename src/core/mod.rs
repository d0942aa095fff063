//! Core data structures for slink.
//!
//! This module contains the foundational types used throughout slink:
//! - Portable path values (segment lists that render per host)
//! - Package manifests and their link descriptors
//! - The dependency comparator guarding shared stores

pub mod compare;
pub mod manifest;
pub mod path;

pub use compare::{compare, DependencyComparison, Mismatch};
pub use manifest::{
    GroupMember, LinkGroup, ManifestError, PackageManifest, SourceLink, MANIFEST_FILE,
};
pub use path::{PathError, PortablePath};
