use std::fmt;

/// A traversal from a root table through zero or more reference hops to a
/// terminal field, e.g. `mother/name`.
///
/// Paths are the key for both join deduplication and output field naming.
/// The `/`-joined encoding is injective (segments are column names, which
/// can't contain `/`) and reversible by splitting, so callers can
/// reconstruct nested result structure from field names alone.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Path(Vec<String>);

impl Path {
    pub fn new<S: Into<String>>(segments: impl IntoIterator<Item = S>) -> Path {
        Path(segments.into_iter().map(Into::into).collect())
    }

    /// Parse a `/`-joined path string.
    pub fn parse(s: &str) -> Path {
        Path(s.split('/').map(|s| s.to_string()).collect())
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Last segment; the field the path retrieves.
    pub fn terminal(&self) -> &str {
        self.0.last().map(|s| s.as_str()).unwrap_or("")
    }

    /// Path up to, but excluding, the terminal segment. `None` for paths of
    /// length one or less.
    pub fn parent(&self) -> Option<Path> {
        if self.0.len() < 2 {
            return None;
        }
        Some(Path(self.0[..self.0.len() - 1].to_vec()))
    }

    /// Leading sub-path of `len` segments.
    pub fn prefix(&self, len: usize) -> Path {
        Path(self.0[..len].to_vec())
    }

    /// Alias of the joined table instance this path's terminal field lives
    /// on: the root name for single-segment paths, otherwise
    /// `root/seg_0/…/seg_{n-2}`.
    pub fn join_alias(&self, root: &str) -> String {
        match self.parent() {
            None => root.to_string(),
            Some(parent) => format!("{}/{}", root, parent),
        }
    }

    /// Output alias of the retrieved field: every segment `/`-joined.
    pub fn field_alias(&self) -> String {
        self.0.join("/")
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("/"))
    }
}

impl From<&str> for Path {
    fn from(s: &str) -> Path {
        Path::parse(s)
    }
}

impl From<String> for Path {
    fn from(s: String) -> Path {
        Path::parse(&s)
    }
}

impl<const N: usize> From<[&str; N]> for Path {
    fn from(segments: [&str; N]) -> Path {
        Path::new(segments)
    }
}
