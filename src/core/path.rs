//! Platform-neutral path values.
//!
//! A [`PortablePath`] is an immutable list of segments plus two flags:
//! relative-vs-absolute and Windows-vs-POSIX notation. It can be parsed from
//! any of the three notations in the wild (`/home/dev`, `C:\Users\dev`, and
//! the Git-Bash hybrid `C:/Users/dev`) and serialized back to whichever form
//! the host needs. The segment list itself carries no separators, so a path
//! parsed from one notation can always be rendered in the other.
//!
//! Spaces are rejected outright: the links this tool creates have to survive
//! shells that do not uniformly quote arguments.

use std::fmt;

use thiserror::Error;

/// Error constructing or navigating a [`PortablePath`].
#[derive(Debug, Error)]
pub enum PathError {
    #[error("spaces are not allowed in paths: `{path}`")]
    SpacesNotAllowed { path: String },

    #[error("invalid path segment `{segment}`")]
    InvalidSegment { segment: String },

    #[error("a relative path needs at least one segment")]
    EmptyRelative,

    #[error("absolute Windows paths start with a single drive letter, got `{segment}`")]
    InvalidDrive { segment: String },

    #[error("`{path}` has no parent")]
    NoParent { path: String },
}

/// An immutable, platform-neutral filesystem path.
///
/// Invariants, enforced on every construction:
/// - no segment is empty, whitespace-only, or contains a separator or space;
/// - a relative path has at least one segment (zero segments means "no
///   path", not "current directory");
/// - an absolute POSIX path may have zero segments (the root `/`);
/// - an absolute Windows path starts with a one-character drive letter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortablePath {
    segments: Vec<String>,
    relative: bool,
    windows: bool,
}

impl PortablePath {
    /// Build a path from pre-split segments.
    pub fn from_segments<I, S>(segments: I, relative: bool, windows: bool) -> Result<Self, PathError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();

        for segment in &segments {
            validate_segment(segment)?;
        }

        if relative && segments.is_empty() {
            return Err(PathError::EmptyRelative);
        }

        if windows && !relative {
            match segments.first() {
                Some(drive) if drive.chars().count() == 1 => {}
                Some(other) => {
                    return Err(PathError::InvalidDrive {
                        segment: other.clone(),
                    })
                }
                None => {
                    return Err(PathError::InvalidDrive {
                        segment: String::new(),
                    })
                }
            }
        }

        Ok(PortablePath {
            segments,
            relative,
            windows,
        })
    }

    /// Parse a path string in POSIX, Windows, or Git-Bash hybrid notation.
    ///
    /// Windows drive notation is detected by a `:` at index 1; the drive
    /// letter becomes segment 0 and scanning resumes past the separator.
    /// Both `\` and `/` split segments, so all three notations parse to the
    /// same segment list.
    pub fn parse(raw: &str, relative: bool) -> Result<Self, PathError> {
        let chars: Vec<char> = raw.chars().collect();
        let mut segments = Vec::new();
        let mut windows = false;
        let mut start = 0;

        if chars.len() >= 2 && chars[1] == ':' {
            segments.push(chars[0].to_string());
            windows = true;
            start = 3;
        }

        let mut current = String::new();
        for &c in chars.iter().skip(start) {
            match c {
                '\\' | '/' => {
                    if !current.is_empty() {
                        segments.push(std::mem::take(&mut current));
                    }
                }
                ' ' => {
                    return Err(PathError::SpacesNotAllowed {
                        path: raw.to_string(),
                    })
                }
                _ => current.push(c),
            }
        }
        if !current.is_empty() {
            segments.push(current);
        }

        Self::from_segments(segments, relative, windows)
    }

    /// Serialize in POSIX notation (`/a/b` or `a/b`).
    pub fn to_posix_string(&self) -> String {
        let joined = self.segments.join("/");
        if self.relative {
            joined
        } else {
            format!("/{joined}")
        }
    }

    /// Serialize in Windows notation.
    ///
    /// A one-character first segment is treated as a drive letter and
    /// rendered upper-cased with `:\`; a longer first segment is an ordinary
    /// directory name and gets a bare `\` (the form a relative Windows path
    /// takes).
    pub fn to_windows_string(&self) -> String {
        let mut out = String::new();
        for (i, segment) in self.segments.iter().enumerate() {
            if i == 0 {
                if segment.chars().count() == 1 {
                    out.push_str(&segment.to_uppercase());
                    out.push_str(":\\");
                } else {
                    out.push_str(segment);
                    out.push('\\');
                }
            } else {
                if i > 1 {
                    out.push('\\');
                }
                out.push_str(segment);
            }
        }
        out
    }

    /// Serialize for the given host platform, regardless of the notation the
    /// path was parsed from.
    pub fn to_native_string(&self, windows_host: bool) -> String {
        if windows_host {
            self.to_windows_string()
        } else {
            self.to_posix_string()
        }
    }

    /// Resolve `relative` against `base`.
    ///
    /// Every `..` segment anywhere in `relative` strips one segment off the
    /// end of `base`; the remaining segments are appended in order. A literal
    /// directory named `..` cannot exist under the segment invariants, so
    /// scanning the whole list rather than a prefix is safe. The result is
    /// absolute.
    pub fn resolve_relative(base: &PortablePath, relative: &PortablePath) -> PortablePath {
        let ups = relative.segments.iter().filter(|s| *s == "..").count();
        let keep = base.segments.len().saturating_sub(ups);

        let mut segments: Vec<String> = base.segments[..keep].to_vec();
        segments.extend(relative.segments.iter().filter(|s| *s != "..").cloned());

        PortablePath {
            segments,
            relative: false,
            windows: base.windows,
        }
    }

    /// Append one segment, returning a new path.
    pub fn child(&self, segment: &str) -> Result<PortablePath, PathError> {
        validate_segment(segment)?;
        let mut segments = self.segments.clone();
        segments.push(segment.to_string());
        Ok(PortablePath {
            segments,
            relative: self.relative,
            windows: self.windows,
        })
    }

    /// Drop the last segment, returning a new path.
    ///
    /// Fails for paths with fewer than two segments; the root has no parent
    /// and a single-segment path's parent would be the empty relative path.
    pub fn parent(&self) -> Result<PortablePath, PathError> {
        if self.segments.len() < 2 {
            return Err(PathError::NoParent {
                path: self.to_posix_string(),
            });
        }
        Ok(PortablePath {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
            relative: self.relative,
            windows: self.windows,
        })
    }

    /// The last segment, if any.
    pub fn file_name(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_relative(&self) -> bool {
        self.relative
    }

    pub fn is_windows(&self) -> bool {
        self.windows
    }
}

impl fmt::Display for PortablePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_posix_string())
    }
}

fn validate_segment(segment: &str) -> Result<(), PathError> {
    if segment.trim().is_empty()
        || segment.contains('/')
        || segment.contains('\\')
        || segment.contains(' ')
    {
        return Err(PathError::InvalidSegment {
            segment: segment.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn abs(segments: &[&str]) -> PortablePath {
        PortablePath::from_segments(segments.iter().copied(), false, false).unwrap()
    }

    fn rel(segments: &[&str]) -> PortablePath {
        PortablePath::from_segments(segments.iter().copied(), true, false).unwrap()
    }

    #[test]
    fn test_parse_posix_absolute() {
        let path = PortablePath::parse("/home/dev/app", false).unwrap();
        assert_eq!(path.segments(), ["home", "dev", "app"]);
        assert!(!path.is_relative());
        assert!(!path.is_windows());
    }

    #[test]
    fn test_parse_windows_drive() {
        let path = PortablePath::parse("C:\\Users\\me", false).unwrap();
        assert_eq!(path.segments(), ["C", "Users", "me"]);
        assert!(path.is_windows());
        assert_eq!(path.to_windows_string(), "C:\\Users\\me");
    }

    #[test]
    fn test_parse_gitbash_hybrid() {
        let path = PortablePath::parse("C:/Users/me", false).unwrap();
        assert_eq!(path.segments(), ["C", "Users", "me"]);
        assert!(path.is_windows());
    }

    #[test]
    fn test_parse_rejects_spaces() {
        let err = PortablePath::parse("/a b/c", false).unwrap_err();
        assert!(matches!(err, PathError::SpacesNotAllowed { .. }));
    }

    #[test]
    fn test_parse_relative() {
        let path = PortablePath::parse("../../core/src", true).unwrap();
        assert_eq!(path.segments(), ["..", "..", "core", "src"]);
        assert!(path.is_relative());
    }

    #[test]
    fn test_empty_relative_is_invalid() {
        assert!(matches!(
            PortablePath::parse("", true),
            Err(PathError::EmptyRelative)
        ));
    }

    #[test]
    fn test_posix_root_has_no_segments() {
        let root = PortablePath::parse("/", false).unwrap();
        assert!(root.segments().is_empty());
        assert_eq!(root.to_posix_string(), "/");
    }

    #[test]
    fn test_windows_absolute_requires_drive_letter() {
        let err = PortablePath::from_segments(["Users", "me"], false, true).unwrap_err();
        assert!(matches!(err, PathError::InvalidDrive { .. }));
    }

    #[test]
    fn test_segment_with_separator_rejected() {
        let err = PortablePath::from_segments(["a/b"], true, false).unwrap_err();
        assert!(matches!(err, PathError::InvalidSegment { .. }));
    }

    #[test]
    fn test_posix_round_trip() {
        let path = abs(&["home", "dev", "app"]);
        let reparsed = PortablePath::parse(&path.to_posix_string(), false).unwrap();
        assert_eq!(reparsed.segments(), path.segments());
        assert_eq!(reparsed.is_relative(), path.is_relative());
    }

    #[test]
    fn test_windows_round_trip() {
        let path = rel(&["node_modules", "core"]);
        let reparsed = PortablePath::parse(&path.to_windows_string(), true).unwrap();
        assert_eq!(reparsed.segments(), path.segments());
        assert_eq!(reparsed.is_relative(), path.is_relative());
    }

    #[test]
    fn test_to_windows_single_relative_segment() {
        assert_eq!(rel(&["src"]).to_windows_string(), "src\\");
    }

    #[test]
    fn test_to_native_dispatch() {
        let path = abs(&["c", "tmp"]);
        assert_eq!(path.to_native_string(false), "/c/tmp");
        assert_eq!(path.to_native_string(true), "C:\\tmp");
    }

    #[test]
    fn test_resolve_relative_with_parent_segments() {
        let base = abs(&["a", "b", "c"]);
        let relative = rel(&["..", "..", "x", "y"]);
        let resolved = PortablePath::resolve_relative(&base, &relative);
        assert_eq!(resolved.segments(), ["a", "x", "y"]);
        assert!(!resolved.is_relative());
    }

    #[test]
    fn test_resolve_relative_plain_append() {
        let resolved = PortablePath::resolve_relative(&abs(&["a"]), &rel(&["x"]));
        assert_eq!(resolved.segments(), ["a", "x"]);
    }

    #[test]
    fn test_child_and_parent() {
        let path = abs(&["home", "dev"]).child("app").unwrap();
        assert_eq!(path.segments(), ["home", "dev", "app"]);

        let parent = path.parent().unwrap();
        assert_eq!(parent.segments(), ["home", "dev"]);
    }

    #[test]
    fn test_parent_of_short_path_fails() {
        let path = abs(&["home"]);
        assert!(matches!(path.parent(), Err(PathError::NoParent { .. })));
    }

    #[test]
    fn test_child_validates_segment() {
        assert!(abs(&["home"]).child("a b").is_err());
        assert!(abs(&["home"]).child("a/b").is_err());
    }

    #[test]
    fn test_display_is_posix() {
        assert_eq!(abs(&["home", "dev"]).to_string(), "/home/dev");
        assert_eq!(rel(&["src"]).to_string(), "src");
    }
}
