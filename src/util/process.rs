//! Subprocess execution.
//!
//! Every filesystem mutation slink cannot express natively (legacy shell
//! probes, Windows junction creation, npm install-on-demand) goes through
//! [`ProcessBuilder`]. Execution is synchronous; a command runs to
//! completion before the next statement executes.

use std::collections::HashMap;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use anyhow::{bail, Context, Result};

/// Builder for subprocess execution.
#[derive(Debug, Clone)]
pub struct ProcessBuilder {
    program: String,
    args: Vec<String>,
    env: HashMap<String, String>,
    cwd: Option<PathBuf>,
    shell: Option<PathBuf>,
}

impl ProcessBuilder {
    /// Create a new process builder for the given program.
    pub fn new(program: impl Into<String>) -> Self {
        ProcessBuilder {
            program: program.into(),
            args: Vec::new(),
            env: HashMap::new(),
            cwd: None,
            shell: None,
        }
    }

    /// Add a single argument.
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_string_lossy().into_owned());
        self
    }

    /// Add multiple arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args.extend(
            args.into_iter()
                .map(|s| s.as_ref().to_string_lossy().into_owned()),
        );
        self
    }

    /// Set an environment variable.
    pub fn env(mut self, key: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        self.env
            .insert(key.as_ref().to_string(), value.as_ref().to_string());
        self
    }

    /// Set the working directory.
    pub fn cwd(mut self, cwd: impl AsRef<Path>) -> Self {
        self.cwd = Some(cwd.as_ref().to_path_buf());
        self
    }

    /// Run the command through the given shell (`sh -c` / `cmd /C`) instead
    /// of spawning the program directly. Junction creation on Windows needs
    /// cmd.exe even when the user's login shell is a POSIX emulation.
    pub fn shell(mut self, shell: impl AsRef<Path>) -> Self {
        self.shell = Some(shell.as_ref().to_path_buf());
        self
    }

    /// Get the program name.
    pub fn get_program(&self) -> &str {
        &self.program
    }

    /// Get the arguments.
    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    fn build_command(&self) -> Command {
        let mut cmd = match &self.shell {
            Some(shell) => {
                let mut cmd = Command::new(shell);
                let flag = if is_cmd_exe(shell) { "/C" } else { "-c" };
                cmd.arg(flag).arg(self.display_command());
                cmd
            }
            None => {
                let mut cmd = Command::new(&self.program);
                cmd.args(&self.args);
                cmd
            }
        };

        for (key, value) in &self.env {
            cmd.env(key, value);
        }

        if let Some(ref cwd) = self.cwd {
            cmd.current_dir(cwd);
        }

        cmd
    }

    /// Execute and capture stdout/stderr.
    pub fn exec(&self) -> Result<Output> {
        let mut cmd = self.build_command();
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        tracing::debug!("running `{}`", self.display_command());

        let output = cmd
            .output()
            .with_context(|| format!("failed to spawn `{}`", self.program))?;

        tracing::debug!(
            "`{}` exited with {:?}",
            self.display_command(),
            output.status.code()
        );

        Ok(output)
    }

    /// Execute and require success.
    pub fn exec_and_check(&self) -> Result<Output> {
        let output = self.exec()?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!(
                "`{}` failed with exit code {:?}\n{}",
                self.display_command(),
                output.status.code(),
                stderr
            );
        }
        Ok(output)
    }

    /// Display the command for logs and error messages.
    pub fn display_command(&self) -> String {
        let mut parts = vec![self.program.clone()];
        parts.extend(self.args.iter().cloned());
        parts.join(" ")
    }
}

// Shell paths arrive in Windows notation even on POSIX hosts (Git-Bash
// passing `C:\...\cmd.exe`), so the name is split out by hand instead of
// through `Path`, whose separator handling is host-dependent.
fn is_cmd_exe(shell: &Path) -> bool {
    let raw = shell.to_string_lossy();
    let name = raw.rsplit(['/', '\\']).next().unwrap_or(raw.as_ref());
    let stem = name.rsplit_once('.').map_or(name, |(stem, _)| stem);
    stem.eq_ignore_ascii_case("cmd")
}

/// Find an executable in PATH.
pub fn find_executable(name: &str) -> Option<PathBuf> {
    which::which(name).ok()
}

/// Find the npm entry point, for install-on-demand in sibling projects.
pub fn find_npm() -> Option<PathBuf> {
    for candidate in &["npm", "npm.cmd"] {
        if let Some(path) = find_executable(candidate) {
            return Some(path);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exec_captures_stdout() {
        let output = ProcessBuilder::new("echo").arg("hello").exec().unwrap();
        assert!(output.status.success());
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.contains("hello"));
    }

    #[test]
    fn test_spawn_failure_is_an_error() {
        let result = ProcessBuilder::new("slink-no-such-program-xyz").exec();
        assert!(result.is_err());
    }

    #[test]
    fn test_display_command() {
        let pb = ProcessBuilder::new("ln").args(["-s", "-T", "/a/b", "core@slink"]);
        assert_eq!(pb.display_command(), "ln -s -T /a/b core@slink");
    }

    #[cfg(unix)]
    #[test]
    fn test_shell_wrapper() {
        let output = ProcessBuilder::new("echo")
            .arg("wrapped")
            .shell("/bin/sh")
            .exec()
            .unwrap();
        assert!(String::from_utf8_lossy(&output.stdout).contains("wrapped"));
    }

    #[test]
    fn test_is_cmd_exe() {
        // Windows notation must be recognized regardless of the host.
        assert!(is_cmd_exe(Path::new("C:\\Windows\\system32\\cmd.exe")));
        assert!(is_cmd_exe(Path::new("C:/Windows/system32/cmd.exe")));
        assert!(is_cmd_exe(Path::new("cmd")));
        assert!(is_cmd_exe(Path::new("CMD.EXE")));
        assert!(!is_cmd_exe(Path::new("/bin/sh")));
        assert!(!is_cmd_exe(Path::new("/usr/bin/cmdline-tool")));
    }
}
