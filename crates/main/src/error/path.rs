//! Path segment types for error context tracking.

use alloc::{string::String, vec::Vec};
use core::fmt;

/// A segment in a traversal path.
///
/// Segments are collected from the outermost scope inwards, so the first
/// segment is always the top-level property being visited.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// A named property.
    Field(String),
    /// An array element index.
    Element(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Field(name) => write!(f, "field '{name}'"),
            PathSegment::Element(idx) => write!(f, "element {idx}"),
        }
    }
}

/// A full traversal path, e.g. `servers.primary.ports[2]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Path {
    segments: Vec<PathSegment>,
}

impl Path {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, segment: PathSegment) {
        self.segments.push(segment);
    }

    #[must_use]
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Joins the segments with `separator` between named fields. Element
    /// indices are always rendered as `[i]` suffixes.
    #[must_use]
    pub fn join(&self, separator: &str) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                PathSegment::Field(name) => {
                    if !out.is_empty() {
                        out.push_str(separator);
                    }
                    out.push_str(name);
                }
                PathSegment::Element(idx) => {
                    out.push('[');
                    out.push_str(&idx.to_string());
                    out.push(']');
                }
            }
        }
        out
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.join("."))
    }
}

impl FromIterator<PathSegment> for Path {
    fn from_iter<I: IntoIterator<Item = PathSegment>>(iter: I) -> Self {
        Self {
            segments: iter.into_iter().collect(),
        }
    }
}
