//! Global context for slink operations.
//!
//! One immutable value built at startup and passed by reference to every
//! component, instead of mutable process-global flags. It carries the
//! resolved working directory, the tool's own install directory (so a run
//! never links inside its own installation), and the platform/shell facts
//! the filesystem capability branches on.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use crate::core::path::PortablePath;
use crate::util::fs::ProbeMode;

/// Global context containing configuration and paths.
#[derive(Debug, Clone)]
pub struct GlobalContext {
    /// Resolved working directory (always absolute).
    cwd: PortablePath,

    /// Directory the slink binary lives in, when determinable.
    home: Option<PortablePath>,

    /// Whether to use verbose output.
    verbose: bool,

    /// Whether to use colors in output.
    color: bool,

    /// How existence probes are performed.
    probe: ProbeMode,

    /// Whether native path strings use Windows notation.
    windows_host: bool,

    /// Whether the user's login shell is a bash variant (Git-Bash on
    /// Windows changes which probe commands are available).
    bash: bool,
}

impl GlobalContext {
    /// Create a context with an optional working-directory override.
    /// Without an override the directory comes from the environment,
    /// `$PWD` when set and the process cwd otherwise. This is the entry
    /// point the command layer uses.
    pub fn from_dir_override(dir: Option<&str>) -> Result<Self> {
        let cwd = resolve_working_dir(dir)?;
        Self::with_cwd(cwd)
    }

    /// Create a context for a specific working directory.
    pub fn with_cwd(cwd: PortablePath) -> Result<Self> {
        Ok(GlobalContext {
            cwd,
            home: install_dir(),
            verbose: false,
            color: true,
            probe: ProbeMode::Native,
            windows_host: cfg!(windows),
            bash: shell_is_bash(),
        })
    }

    /// Set verbose mode.
    pub fn set_verbose(&mut self, verbose: bool) {
        self.verbose = verbose;
    }

    /// Set color output.
    pub fn set_color(&mut self, color: bool) {
        self.color = color;
    }

    /// Set the existence-probe mode.
    pub fn set_probe(&mut self, probe: ProbeMode) {
        self.probe = probe;
    }

    /// Override the host notation; only tests need this.
    pub fn set_windows_host(&mut self, windows_host: bool) {
        self.windows_host = windows_host;
    }

    /// Get the working directory.
    pub fn cwd(&self) -> &PortablePath {
        &self.cwd
    }

    /// Working directory as a native std path.
    pub fn cwd_native(&self) -> PathBuf {
        PathBuf::from(self.cwd.to_native_string(self.windows_host))
    }

    /// The slink installation directory, when determinable.
    pub fn home(&self) -> Option<&PortablePath> {
        self.home.as_ref()
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    pub fn color(&self) -> bool {
        self.color
    }

    pub fn probe(&self) -> ProbeMode {
        self.probe
    }

    pub fn windows_host(&self) -> bool {
        self.windows_host
    }

    pub fn is_bash(&self) -> bool {
        self.bash
    }

    /// Refuse to operate inside slink's own installation directory.
    ///
    /// Linking there would tear out the tool's own dependency tree while it
    /// runs; it only happens when the shell's cwd leaks from the install
    /// location, so the fix is an explicit `--dir`.
    pub fn ensure_not_install_dir(&self) -> Result<()> {
        if let Some(home) = &self.home {
            if home == &self.cwd {
                bail!(
                    "the working directory `{}` is the slink installation directory; \
                     pass the project directory with --dir",
                    self.cwd
                );
            }
        }
        Ok(())
    }
}

/// Resolve the working directory: explicit override, then `$PWD`, then the
/// process current directory.
fn resolve_working_dir(dir_override: Option<&str>) -> Result<PortablePath> {
    if let Some(dir) = dir_override {
        return PortablePath::parse(dir, false)
            .with_context(|| format!("invalid --dir value `{dir}`"));
    }

    if let Ok(pwd) = std::env::var("PWD") {
        if !pwd.is_empty() {
            return PortablePath::parse(&pwd, false)
                .with_context(|| format!("invalid $PWD value `{pwd}`"));
        }
    }

    let cwd = std::env::current_dir().context("failed to get current directory")?;
    PortablePath::parse(&cwd.to_string_lossy(), false)
        .with_context(|| format!("cannot use working directory `{}`", cwd.display()))
}

fn install_dir() -> Option<PortablePath> {
    let exe = std::env::current_exe().ok()?;
    let dir = exe.parent()?;
    PortablePath::parse(&dir.to_string_lossy(), false).ok()
}

fn shell_is_bash() -> bool {
    std::env::var("SHELL")
        .map(|shell| shell.to_lowercase().contains("bash"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx_at(segments: &[&str]) -> GlobalContext {
        let cwd = PortablePath::from_segments(segments.iter().copied(), false, false).unwrap();
        GlobalContext::with_cwd(cwd).unwrap()
    }

    #[test]
    fn test_dir_override_wins() {
        let ctx = GlobalContext::from_dir_override(Some("/home/dev/app")).unwrap();
        assert_eq!(ctx.cwd().segments(), ["home", "dev", "app"]);
    }

    #[test]
    fn test_dir_override_rejects_spaces() {
        assert!(GlobalContext::from_dir_override(Some("/home/my dir")).is_err());
    }

    #[test]
    fn test_install_dir_guard() {
        let mut ctx = ctx_at(&["opt", "slink"]);
        ctx.home = Some(ctx.cwd.clone());
        assert!(ctx.ensure_not_install_dir().is_err());

        let other = ctx_at(&["home", "dev", "app"]);
        assert!(other.ensure_not_install_dir().is_ok());
    }

    #[test]
    fn test_cwd_native_notation() {
        let mut ctx = ctx_at(&["c", "work", "app"]);
        ctx.set_windows_host(false);
        assert_eq!(ctx.cwd_native(), PathBuf::from("/c/work/app"));
        ctx.set_windows_host(true);
        assert_eq!(ctx.cwd_native(), PathBuf::from("C:\\work\\app"));
    }
}
