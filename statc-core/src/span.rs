//! Source locations attached to every AST and MIR node.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single point in a source file. `included_from` chains through
/// `#include`-style expansion so diagnostics can show the full path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Location {
    pub file: String,
    pub line: usize,
    pub col: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub included_from: Option<Box<Location>>,
}

impl Location {
    pub fn new(file: impl Into<String>, line: usize, col: usize) -> Self {
        Location {
            file: file.into(),
            line,
            col,
            included_from: None,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}', line {}, column {}", self.file, self.line, self.col)?;
        if let Some(from) = &self.included_from {
            write!(f, ", included from\n{}", from)?;
        }
        Ok(())
    }
}

/// A half-open source region, `begin` inclusive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Span {
    pub begin: Location,
    pub end: Location,
}

impl Span {
    pub fn new(begin: Location, end: Location) -> Self {
        Span { begin, end }
    }

    /// A span with no file attached, for synthesized nodes.
    pub fn dummy() -> Self {
        Span::default()
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.begin.line == self.end.line {
            write!(
                f,
                "{}, columns {}-{}",
                self.begin, self.begin.col, self.end.col
            )
        } else {
            write!(f, "{} to line {}, column {}", self.begin, self.end.line, self.end.col)
        }
    }
}
