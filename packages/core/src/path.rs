//! Incremental navigation over slash-delimited parameter paths.

use std::fmt;

/// Separator between path segments.
pub const SEPARATOR: char = '/';

/// Errors related to path parsing and navigation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    /// The path string itself is malformed.
    #[error("invalid path '{path}': {message}")]
    InvalidPath { path: String, message: String },

    /// The consumed segment is not the one the caller expected.
    #[error("path segment '{found}' at position {position} does not match expected '{expected}'")]
    Mismatch {
        expected: String,
        found: String,
        position: usize,
    },

    /// Every segment has already been consumed.
    #[error("no more segments in path (expected '{expected}' at position {position})")]
    Exhausted { expected: String, position: usize },
}

/// A cursor over the segments of a parameter path.
///
/// The path is validated once, at construction: it must be non-empty, must
/// not start or end with `/`, and must not contain empty segments. Segments
/// are then consumed front to back with [`navigate_through`] (checking each
/// name against the tree shape the caller expects) or [`next_segment`]
/// (when the shape is not known in advance). The cursor never moves back.
///
/// [`navigate_through`]: PathNavigator::navigate_through
/// [`next_segment`]: PathNavigator::next_segment
///
/// # Examples
///
/// ```rust
/// use paramfs_core::PathNavigator;
///
/// let mut nav = PathNavigator::new("audio/mixer/gain");
/// assert!(nav.is_valid());
///
/// nav.navigate_through("audio").unwrap();
/// assert_eq!(nav.next_segment(), Some("mixer"));
/// assert_eq!(nav.current_path(), "gain");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PathNavigator {
    path: String,
    segments: Vec<String>,
    cursor: usize,
    valid: bool,
}

impl PathNavigator {
    /// Split and validate `path`.
    ///
    /// An invalid path yields a navigator with no segments whose
    /// [`is_valid`](Self::is_valid) is false; use [`parse`](Self::parse) to
    /// get the reason instead.
    pub fn new(path: &str) -> Self {
        match Self::parse(path) {
            Ok(nav) => nav,
            Err(_) => Self {
                path: path.to_string(),
                segments: Vec::new(),
                cursor: 0,
                valid: false,
            },
        }
    }

    /// Split and validate `path`, reporting why it is malformed.
    pub fn parse(path: &str) -> Result<Self, PathError> {
        Self::check_format(path)?;

        Ok(Self {
            path: path.to_string(),
            segments: path.split(SEPARATOR).map(str::to_string).collect(),
            cursor: 0,
            valid: true,
        })
    }

    fn check_format(path: &str) -> Result<(), PathError> {
        let invalid = |message: &str| PathError::InvalidPath {
            path: path.to_string(),
            message: message.to_string(),
        };

        if path.is_empty() {
            return Err(invalid("empty path"));
        }
        if path.starts_with(SEPARATOR) {
            return Err(invalid("leading separator"));
        }
        if path.ends_with(SEPARATOR) {
            return Err(invalid("trailing separator"));
        }
        if let Some(position) = path.split(SEPARATOR).position(str::is_empty) {
            return Err(invalid(&format!("empty segment at position {}", position)));
        }
        Ok(())
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// The path this navigator was built from.
    pub fn as_str(&self) -> &str {
        &self.path
    }

    /// Index of the next segment to be consumed.
    pub fn position(&self) -> usize {
        self.cursor
    }

    /// Total number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// True once every segment has been consumed.
    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.segments.len()
    }

    /// Consume the next segment, requiring it to equal `expected`.
    pub fn navigate_through(&mut self, expected: &str) -> Result<(), PathError> {
        if !self.valid {
            return Err(PathError::InvalidPath {
                path: self.path.clone(),
                message: "cannot navigate an invalid path".to_string(),
            });
        }

        let position = self.cursor;
        let found = self.next_segment().ok_or_else(|| PathError::Exhausted {
            expected: expected.to_string(),
            position,
        })?;

        if found != expected {
            return Err(PathError::Mismatch {
                expected: expected.to_string(),
                found: found.to_string(),
                position,
            });
        }
        Ok(())
    }

    /// Consume and return the next segment, or `None` once exhausted.
    pub fn next_segment(&mut self) -> Option<&str> {
        let segment = self.segments.get(self.cursor)?;
        self.cursor += 1;
        Some(segment.as_str())
    }

    /// The segments not yet consumed, joined by `/`.
    pub fn current_path(&self) -> String {
        self.segments[self.cursor.min(self.segments.len())..].join("/")
    }

    /// The segments already consumed, joined by `/`.
    pub fn consumed_path(&self) -> String {
        self.segments[..self.cursor.min(self.segments.len())].join("/")
    }
}

impl fmt::Display for PathNavigator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}
