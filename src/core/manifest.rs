//! package.json parsing and link-descriptor schema.
//!
//! Only the fields slink consumes are modeled; everything else in a
//! package.json is ignored. The slink-specific fields are:
//!
//! - `dependencySrcSLinks`: per-project source links,
//! - `dependencySLinkGroups`: grouped links under `node_modules/<group>`,
//! - `sharedNodeModuleProjectSLinkEnvVar`: env vars naming a shared-store
//!   project root, in priority order,
//! - `sharedNodeModuleProjectSLinks`: sibling project names to search for,
//!   in priority order.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use thiserror::Error;

use crate::core::path::{PathError, PortablePath};

/// The manifest file name, fixed by the npm ecosystem.
pub const MANIFEST_FILE: &str = "package.json";

/// Error in the slink-specific manifest fields.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("no {MANIFEST_FILE} found in `{dir}`")]
    NotFound { dir: PathBuf },

    #[error("link group `{group}`: member `{project}` has no modulePath")]
    MissingModulePath { group: String, project: String },

    #[error("invalid path in manifest: {0}")]
    InvalidPath(#[from] PathError),
}

/// The parsed package.json, reduced to the fields slink reads.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PackageManifest {
    pub name: Option<String>,
    pub version: Option<String>,

    pub dependencies: BTreeMap<String, String>,

    #[serde(rename = "devDependencies")]
    pub dev_dependencies: BTreeMap<String, String>,

    #[serde(rename = "dependencySrcSLinks")]
    dependency_src_slinks: Vec<RawSourceLink>,

    #[serde(rename = "dependencySLinkGroups")]
    dependency_slink_groups: Vec<RawLinkGroup>,

    #[serde(rename = "sharedNodeModuleProjectSLinkEnvVar")]
    shared_store_env_vars: Vec<String>,

    #[serde(rename = "sharedNodeModuleProjectSLinks")]
    shared_store_projects: Vec<String>,
}

/// Raw source-link entry as declared in package.json.
#[derive(Debug, Clone, Deserialize)]
struct RawSourceLink {
    project: String,

    #[serde(rename = "srcPath")]
    src_path: Option<String>,

    #[serde(rename = "destPath")]
    dest_path: Option<String>,
}

/// Raw link-group entry as declared in package.json.
#[derive(Debug, Clone, Deserialize)]
struct RawLinkGroup {
    group: String,

    #[serde(default)]
    projects: Vec<RawGroupMember>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawGroupMember {
    project: String,

    #[serde(rename = "modulePath")]
    module_path: Option<String>,
}

/// A resolved source link: where the link lives and what it points to, both
/// relative to the working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLink {
    /// Link name, always `<project>@slink`.
    pub name: String,

    /// Directory the link is created in, relative to the working directory.
    pub link_dir: PortablePath,

    /// Link target, relative to `link_dir`.
    pub target: PortablePath,
}

impl SourceLink {
    fn from_raw(raw: &RawSourceLink) -> Result<Self, ManifestError> {
        let link_dir = match &raw.dest_path {
            Some(dest) => PortablePath::parse(dest, true)?,
            None => PortablePath::from_segments(["src"], true, false)?,
        };

        // `../../<project>` then the declared source path (default `src`).
        // srcPath values conventionally carry a leading slash; parsing them
        // as relative paths strips it.
        let mut segments = vec!["..".to_string(), "..".to_string(), raw.project.clone()];
        match &raw.src_path {
            Some(src) => {
                segments.extend(PortablePath::parse(src, true)?.segments().iter().cloned())
            }
            None => segments.push("src".to_string()),
        }
        let target = PortablePath::from_segments(segments, true, false)?;

        Ok(SourceLink {
            name: format!("{}@slink", raw.project),
            link_dir,
            target,
        })
    }
}

/// A resolved link group: one directory under `node_modules` holding one
/// link per member project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkGroup {
    pub group: String,
    pub members: Vec<GroupMember>,
}

/// One member of a link group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupMember {
    pub project: String,

    /// Link name inside the group directory.
    pub module_path: String,

    /// Link target, relative to the group directory.
    pub target: PortablePath,
}

impl LinkGroup {
    fn from_raw(raw: &RawLinkGroup) -> Result<Self, ManifestError> {
        let members = raw
            .projects
            .iter()
            .map(|member| {
                let module_path =
                    member
                        .module_path
                        .clone()
                        .ok_or_else(|| ManifestError::MissingModulePath {
                            group: raw.group.clone(),
                            project: member.project.clone(),
                        })?;

                let target = PortablePath::from_segments(
                    ["..", "..", "..", member.project.as_str(), "src"],
                    true,
                    false,
                )?;

                Ok(GroupMember {
                    project: member.project.clone(),
                    module_path,
                    target,
                })
            })
            .collect::<Result<Vec<_>, ManifestError>>()?;

        Ok(LinkGroup {
            group: raw.group.clone(),
            members,
        })
    }

    /// The group's containing directory, relative to the working directory.
    pub fn container_dir(&self) -> Result<PortablePath, ManifestError> {
        Ok(PortablePath::from_segments(
            ["node_modules", self.group.as_str()],
            true,
            false,
        )?)
    }
}

impl PackageManifest {
    /// Parse manifest content.
    pub fn parse(content: &str, path: &Path) -> Result<Self> {
        serde_json::from_str(content)
            .with_context(|| format!("failed to parse {}", path.display()))
    }

    /// Declared source links, resolved to descriptors.
    pub fn source_links(&self) -> Result<Vec<SourceLink>, ManifestError> {
        self.dependency_src_slinks
            .iter()
            .map(SourceLink::from_raw)
            .collect()
    }

    /// Declared link groups, resolved to descriptors.
    ///
    /// A group member without a modulePath is a configuration error; the
    /// manifest is malformed and nothing should be linked from it.
    pub fn link_groups(&self) -> Result<Vec<LinkGroup>, ManifestError> {
        self.dependency_slink_groups
            .iter()
            .map(LinkGroup::from_raw)
            .collect()
    }

    /// Env-var names for the shared-store strategy, in priority order.
    pub fn shared_store_env_vars(&self) -> &[String] {
        &self.shared_store_env_vars
    }

    /// Sibling project names for the shared-store search, in priority order.
    pub fn shared_store_projects(&self) -> &[String] {
        &self.shared_store_projects
    }

    /// dependencies ∪ devDependencies, devDependencies winning ties.
    pub fn merged_dependencies(&self) -> BTreeMap<String, String> {
        let mut merged = self.dependencies.clone();
        merged.extend(
            self.dev_dependencies
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );
        merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(content: &str) -> PackageManifest {
        PackageManifest::parse(content, Path::new("package.json")).unwrap()
    }

    #[test]
    fn test_parse_ignores_unknown_fields() {
        let manifest = parse(
            r#"{
                "name": "app",
                "version": "1.2.3",
                "scripts": { "build": "tsc" },
                "main": "dist/index.js"
            }"#,
        );
        assert_eq!(manifest.name.as_deref(), Some("app"));
        assert_eq!(manifest.version.as_deref(), Some("1.2.3"));
        assert!(manifest.source_links().unwrap().is_empty());
    }

    #[test]
    fn test_source_link_defaults() {
        let manifest = parse(r#"{ "dependencySrcSLinks": [ { "project": "core" } ] }"#);
        let links = manifest.source_links().unwrap();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].name, "core@slink");
        assert_eq!(links[0].link_dir.segments(), ["src"]);
        assert_eq!(links[0].target.segments(), ["..", "..", "core", "src"]);
    }

    #[test]
    fn test_source_link_explicit_paths() {
        let manifest = parse(
            r#"{
                "dependencySrcSLinks": [
                    { "project": "core", "srcPath": "/lib", "destPath": "/vendor" }
                ]
            }"#,
        );
        let links = manifest.source_links().unwrap();
        assert_eq!(links[0].link_dir.segments(), ["vendor"]);
        assert_eq!(links[0].target.segments(), ["..", "..", "core", "lib"]);
    }

    #[test]
    fn test_link_group() {
        let manifest = parse(
            r#"{
                "dependencySLinkGroups": [
                    { "group": "@adligo",
                      "projects": [ { "project": "i_io", "modulePath": "i_io@slink" } ] }
                ]
            }"#,
        );
        let groups = manifest.link_groups().unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(
            groups[0].container_dir().unwrap().segments(),
            ["node_modules", "@adligo"]
        );
        let member = &groups[0].members[0];
        assert_eq!(member.module_path, "i_io@slink");
        assert_eq!(member.target.segments(), ["..", "..", "..", "i_io", "src"]);
    }

    #[test]
    fn test_group_member_without_module_path_fails() {
        let manifest = parse(
            r#"{
                "dependencySLinkGroups": [
                    { "group": "@adligo", "projects": [ { "project": "i_io" } ] }
                ]
            }"#,
        );
        let err = manifest.link_groups().unwrap_err();
        assert!(matches!(err, ManifestError::MissingModulePath { .. }));
    }

    #[test]
    fn test_shared_store_declarations() {
        let manifest = parse(
            r#"{
                "sharedNodeModuleProjectSLinkEnvVar": ["SLINK_SHARE", "SLINK_SHARE_2"],
                "sharedNodeModuleProjectSLinks": ["tests4ts", "i_tests4ts"]
            }"#,
        );
        assert_eq!(manifest.shared_store_env_vars().len(), 2);
        assert_eq!(manifest.shared_store_projects()[0], "tests4ts");
    }

    #[test]
    fn test_merged_dependencies_dev_wins() {
        let manifest = parse(
            r#"{
                "dependencies": { "x": "1.0.0", "y": "2.0.0" },
                "devDependencies": { "x": "1.1.0" }
            }"#,
        );
        let merged = manifest.merged_dependencies();
        assert_eq!(merged.get("x").map(String::as_str), Some("1.1.0"));
        assert_eq!(merged.get("y").map(String::as_str), Some("2.0.0"));
    }
}
