//! slink - sibling project source linking for node trees
//!
//! This crate provides the core library functionality for slink:
//! portable path modelling, package.json link descriptors, shared
//! `node_modules` store resolution, and the link/unlink pipelines.

pub mod core;
pub mod ops;
pub mod util;

pub use crate::core::{compare::DependencyComparison, manifest::PackageManifest, path::PortablePath};

pub use ops::{link_project, publish_project, unlink_project};
pub use util::context::GlobalContext;
pub use util::fs::LinkFs;
