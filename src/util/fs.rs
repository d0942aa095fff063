//! Filesystem capability for link operations.
//!
//! All orchestration code works with [`PortablePath`] values; they are
//! translated to native strings only here, at the moment they cross into
//! `std::fs` or a subprocess.
//!
//! Existence probes default to native calls. Probing through the shell
//! is available behind [`ProbeMode::Shell`] (`--shell-probe`) for
//! POSIX-emulation layers on Windows where native symlink detection
//! misbehaves. In either mode the contract is
//! the same: existence is a boolean and a failed probe means "does not
//! exist".

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::core::path::PortablePath;
use crate::util::context::GlobalContext;
use crate::util::process::ProcessBuilder;

/// Sentinel printed by the shell probe when the path exists.
const PROBE_YES: &str = "YES-EXISTS";
/// Sentinel printed by the shell probe when the path does not exist.
const PROBE_NO: &str = "NO-NOT-EXISTS";

/// How existence checks are performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProbeMode {
    /// `std::fs` metadata calls.
    #[default]
    Native,
    /// Legacy mode: run a conditional through the shell and parse a
    /// sentinel token out of the combined output.
    Shell,
}

/// Link-creation failure that native error reporting cannot surface.
#[derive(Debug, Error)]
pub enum FsError {
    #[error(
        "created link `{path}` but it does not exist; junction creation can fail silently \
         without sufficient permissions, retry from an elevated shell"
    )]
    LinkVerificationFailed { path: String },
}

/// Filesystem operations used by the link orchestrator.
#[derive(Debug, Clone)]
pub struct LinkFs {
    probe: ProbeMode,
    windows_host: bool,
    bash: bool,
}

impl LinkFs {
    pub fn new(ctx: &GlobalContext) -> Self {
        LinkFs {
            probe: ctx.probe(),
            windows_host: ctx.windows_host(),
            bash: ctx.is_bash(),
        }
    }

    /// Render a path in the host's native notation.
    pub fn native(&self, path: &PortablePath) -> PathBuf {
        PathBuf::from(path.to_native_string(self.windows_host))
    }

    /// Resolve `path` against `in_dir` when it is relative.
    fn resolved(&self, path: &PortablePath, in_dir: &PortablePath) -> PortablePath {
        if path.is_relative() {
            PortablePath::resolve_relative(in_dir, path)
        } else {
            path.clone()
        }
    }

    /// Whether `path` exists. Broken symlinks count as existing; a failed
    /// probe does not.
    pub fn exists(&self, path: &PortablePath) -> bool {
        match self.probe {
            ProbeMode::Native => fs::symlink_metadata(self.native(path)).is_ok(),
            ProbeMode::Shell => self.shell_exists(path),
        }
    }

    /// Whether `path`, resolved against `in_dir`, exists.
    pub fn exists_in(&self, path: &PortablePath, in_dir: &PortablePath) -> bool {
        self.exists(&self.resolved(path, in_dir))
    }

    /// Whether `path` is a symlink (or junction).
    pub fn is_symlink(&self, path: &PortablePath) -> bool {
        fs::symlink_metadata(self.native(path))
            .map(|meta| meta.file_type().is_symlink())
            .unwrap_or(false)
    }

    /// Read a symlink's stored target.
    pub fn read_link(&self, path: &PortablePath) -> Result<PortablePath> {
        let native = self.native(path);
        let target = fs::read_link(&native)
            .with_context(|| format!("failed to read link `{}`", native.display()))?;
        parse_link_target(&target.to_string_lossy())
            .with_context(|| format!("unusable link target for `{}`", native.display()))
    }

    /// Read the target of the link named by `path` resolved against `parent`.
    pub fn read_link_in(&self, path: &PortablePath, parent: &PortablePath) -> Result<PortablePath> {
        self.read_link(&self.resolved(path, parent))
    }

    /// Create one directory inside `in_dir`.
    pub fn mkdir(&self, name: &str, in_dir: &PortablePath) -> Result<()> {
        let path = self.native(&in_dir.child(name)?);
        fs::create_dir(&path)
            .with_context(|| format!("failed to create directory `{}`", path.display()))
    }

    /// Create each missing segment of `dirs` under `in_dir`, returning the
    /// final directory.
    pub fn mkdir_tree(&self, dirs: &PortablePath, in_dir: &PortablePath) -> Result<PortablePath> {
        let mut current = in_dir.clone();
        for segment in dirs.segments() {
            let next = current.child(segment)?;
            if !self.exists(&next) {
                self.mkdir(segment, &current)?;
            }
            current = next;
        }
        Ok(current)
    }

    /// Remove `path` (resolved against `in_dir`) recursively. A no-op when
    /// the target does not exist. A symlink is removed as a link, never by
    /// traversing into its target.
    pub fn remove(&self, path: &PortablePath, in_dir: &PortablePath) -> Result<()> {
        let native = self.native(&self.resolved(path, in_dir));
        let meta = match fs::symlink_metadata(&native) {
            Ok(meta) => meta,
            Err(_) => return Ok(()),
        };

        let result = if meta.file_type().is_symlink() {
            remove_link(&native)
        } else if meta.is_dir() {
            fs::remove_dir_all(&native)
        } else {
            fs::remove_file(&native)
        };

        result.with_context(|| format!("failed to remove `{}`", native.display()))
    }

    /// Create a link named `name` in `in_dir` pointing at `target`.
    ///
    /// POSIX hosts get a symbolic link whose stored target is exactly the
    /// serialized `target` (the `ln -sT` contract). Windows hosts get an
    /// NTFS junction, which needs no elevation but can fail without an
    /// error, so creation is verified by re-probing the link path.
    pub fn create_symlink(
        &self,
        name: &str,
        target: &PortablePath,
        in_dir: &PortablePath,
    ) -> Result<()> {
        let link = in_dir.child(name)?;

        if self.windows_host {
            self.create_junction(name, target, in_dir)?;
        } else {
            let link_native = self.native(&link);
            posix_symlink(&self.native(target), &link_native).with_context(|| {
                format!(
                    "failed to link `{}` -> `{}`",
                    link_native.display(),
                    target
                )
            })?;
        }

        if !self.exists(&link) {
            return Err(FsError::LinkVerificationFailed {
                path: link.to_string(),
            }
            .into());
        }
        Ok(())
    }

    fn create_junction(&self, name: &str, target: &PortablePath, in_dir: &PortablePath) -> Result<()> {
        // mklink is a cmd builtin; exit status is unreliable for junctions,
        // so success is judged by the verification probe afterwards.
        let _ = ProcessBuilder::new("mklink")
            .args(["/J", name, &target.to_windows_string()])
            .shell("C:\\Windows\\system32\\cmd")
            .cwd(self.native(in_dir))
            .exec()?;
        Ok(())
    }

    /// Read a file to string.
    pub fn read_to_string(&self, path: &PortablePath) -> Result<String> {
        let native = self.native(path);
        fs::read_to_string(&native)
            .with_context(|| format!("failed to read file `{}`", native.display()))
    }

    /// Read and deserialize a JSON file.
    pub fn read_json<T: DeserializeOwned>(&self, path: &PortablePath) -> Result<T> {
        let content = self.read_to_string(path)?;
        serde_json::from_str(&content).with_context(|| format!("failed to parse `{path}`"))
    }

    /// Copy a file.
    pub fn copy_file(&self, src: &PortablePath, dest: &PortablePath) -> Result<()> {
        let (src, dest) = (self.native(src), self.native(dest));
        fs::copy(&src, &dest).with_context(|| {
            format!("failed to copy `{}` to `{}`", src.display(), dest.display())
        })?;
        Ok(())
    }

    /// Entry names of a directory, sorted.
    pub fn list_dir(&self, path: &PortablePath) -> Result<Vec<String>> {
        let native = self.native(path);
        let mut names = fs::read_dir(&native)
            .with_context(|| format!("failed to read directory `{}`", native.display()))?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .collect::<Vec<_>>();
        names.sort();
        Ok(names)
    }

    fn shell_exists(&self, path: &PortablePath) -> bool {
        let result = if self.windows_host && !self.bash {
            let native = path.to_windows_string();
            ProcessBuilder::new(format!(
                "if exist {native} (echo {PROBE_YES}) else (echo {PROBE_NO})"
            ))
            .shell("C:\\Windows\\system32\\cmd")
            .exec()
        } else {
            let posix = path.to_posix_string();
            ProcessBuilder::new("sh")
                .arg("-c")
                .arg(format!(
                    "if [ -e {posix} ] || [ -L {posix} ]; then echo {PROBE_YES}; else echo {PROBE_NO}; fi"
                ))
                .exec()
        };

        match result {
            Ok(output) => {
                let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
                combined.push_str(&String::from_utf8_lossy(&output.stderr));
                combined.contains(PROBE_YES)
            }
            // A probe that cannot run conservatively means "not found".
            Err(error) => {
                tracing::warn!("shell probe for `{path}` failed: {error:#}");
                false
            }
        }
    }
}

#[cfg(unix)]
fn posix_symlink(target: &Path, link: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn posix_symlink(target: &Path, link: &Path) -> std::io::Result<()> {
    std::os::windows::fs::symlink_dir(target, link)
}

#[cfg(unix)]
fn remove_link(path: &Path) -> std::io::Result<()> {
    fs::remove_file(path)
}

#[cfg(windows)]
fn remove_link(path: &Path) -> std::io::Result<()> {
    // Directory junctions and dir-symlinks unlink as directories.
    fs::remove_dir(path).or_else(|_| fs::remove_file(path))
}

/// Parse a target string read back from a link; relative targets have no
/// leading separator or drive prefix.
fn parse_link_target(raw: &str) -> Result<PortablePath> {
    let absolute = raw.starts_with('/')
        || raw.starts_with('\\')
        || raw.chars().nth(1) == Some(':');
    Ok(PortablePath::parse(raw, !absolute)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn pp(path: &Path) -> PortablePath {
        PortablePath::parse(&path.to_string_lossy(), false).unwrap()
    }

    fn test_fs() -> LinkFs {
        LinkFs {
            probe: ProbeMode::Native,
            windows_host: cfg!(windows),
            bash: false,
        }
    }

    #[test]
    fn test_exists_and_mkdir_tree() {
        let tmp = TempDir::new().unwrap();
        let root = pp(tmp.path());
        let fs_cap = test_fs();

        assert!(fs_cap.exists(&root));
        assert!(!fs_cap.exists(&root.child("missing").unwrap()));

        let dirs = PortablePath::parse("node_modules/@adligo", true).unwrap();
        let created = fs_cap.mkdir_tree(&dirs, &root).unwrap();
        assert_eq!(created.file_name(), Some("@adligo"));
        assert!(fs_cap.exists(&created));

        // Re-running skips the existing segments.
        let again = fs_cap.mkdir_tree(&dirs, &root).unwrap();
        assert_eq!(again, created);
    }

    #[test]
    fn test_remove_is_noop_for_missing_target() {
        let tmp = TempDir::new().unwrap();
        let fs_cap = test_fs();
        let name = PortablePath::parse("nothing-here", true).unwrap();
        fs_cap.remove(&name, &pp(tmp.path())).unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_create_read_remove() {
        let tmp = TempDir::new().unwrap();
        let root = pp(tmp.path());
        let fs_cap = test_fs();

        std::fs::create_dir(tmp.path().join("core")).unwrap();
        let target = root.child("core").unwrap();

        fs_cap.create_symlink("core@slink", &target, &root).unwrap();
        let link = root.child("core@slink").unwrap();
        assert!(fs_cap.exists(&link));
        assert!(fs_cap.is_symlink(&link));
        assert_eq!(fs_cap.read_link(&link).unwrap(), target);

        fs_cap
            .remove(&PortablePath::parse("core@slink", true).unwrap(), &root)
            .unwrap();
        assert!(!fs_cap.exists(&link));
        // The target directory is untouched.
        assert!(fs_cap.exists(&target));
    }

    #[cfg(unix)]
    #[test]
    fn test_remove_symlink_does_not_traverse_target() {
        let tmp = TempDir::new().unwrap();
        let root = pp(tmp.path());
        let fs_cap = test_fs();

        std::fs::create_dir(tmp.path().join("store")).unwrap();
        std::fs::write(tmp.path().join("store/kept.txt"), "kept").unwrap();

        let target = root.child("store").unwrap();
        fs_cap.create_symlink("node_modules", &target, &root).unwrap();
        fs_cap
            .remove(&PortablePath::parse("node_modules", true).unwrap(), &root)
            .unwrap();

        assert!(tmp.path().join("store/kept.txt").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_broken_symlink_counts_as_existing() {
        let tmp = TempDir::new().unwrap();
        let root = pp(tmp.path());
        let fs_cap = test_fs();

        std::os::unix::fs::symlink(tmp.path().join("gone"), tmp.path().join("dangling")).unwrap();
        assert!(fs_cap.exists(&root.child("dangling").unwrap()));
    }

    #[cfg(unix)]
    #[test]
    fn test_shell_probe_mode() {
        let tmp = TempDir::new().unwrap();
        let root = pp(tmp.path());
        let fs_cap = LinkFs {
            probe: ProbeMode::Shell,
            windows_host: false,
            bash: true,
        };

        assert!(fs_cap.exists(&root));
        assert!(!fs_cap.exists(&root.child("missing").unwrap()));
    }

    #[test]
    fn test_read_json() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("package.json"), r#"{"name":"app"}"#).unwrap();

        let fs_cap = test_fs();
        let manifest: crate::core::manifest::PackageManifest = fs_cap
            .read_json(&pp(tmp.path()).child("package.json").unwrap())
            .unwrap();
        assert_eq!(manifest.name.as_deref(), Some("app"));
    }

    #[test]
    fn test_list_dir_sorted() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("b.txt"), "").unwrap();
        std::fs::write(tmp.path().join("a.txt"), "").unwrap();

        let names = test_fs().list_dir(&pp(tmp.path())).unwrap();
        assert_eq!(names, ["a.txt", "b.txt"]);
    }

    #[test]
    fn test_copy_file() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("src.txt"), "data").unwrap();

        let root = pp(tmp.path());
        test_fs()
            .copy_file(
                &root.child("src.txt").unwrap(),
                &root.child("dest.txt").unwrap(),
            )
            .unwrap();
        assert_eq!(
            std::fs::read_to_string(tmp.path().join("dest.txt")).unwrap(),
            "data"
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_read_link_in_resolves_against_parent() {
        let tmp = TempDir::new().unwrap();
        let root = pp(tmp.path());
        let fs_cap = test_fs();

        std::fs::create_dir(tmp.path().join("core")).unwrap();
        let target = root.child("core").unwrap();
        fs_cap.create_symlink("core@slink", &target, &root).unwrap();

        let name = PortablePath::parse("core@slink", true).unwrap();
        assert_eq!(fs_cap.read_link_in(&name, &root).unwrap(), target);
    }

    #[test]
    fn test_parse_link_target_relative_and_absolute() {
        assert!(!parse_link_target("/home/dev/core").unwrap().is_relative());
        assert!(parse_link_target("../../core/src").unwrap().is_relative());
        assert!(!parse_link_target("C:\\work\\core").unwrap().is_relative());
    }
}
