//! Structural addresses into a value, used to attribute conversion errors.
//!
//! A [`Path`] is a pure description: it never borrows the value it points
//! into. Renders as `[0].name["key"]`.

use std::fmt;

use smallvec::SmallVec;

/// One step from a value into one of its parts.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathStep {
    /// Position in a list, set, or tuple.
    Index(usize),
    /// Key of a map entry.
    Key(String),
    /// Attribute of an object.
    Attr(String),
}

impl fmt::Display for PathStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(i) => write!(f, "[{i}]"),
            Self::Key(k) => write!(f, "[{k:?}]"),
            Self::Attr(name) => write!(f, ".{name}"),
        }
    }
}

/// Ordered sequence of [`PathStep`]s, outermost first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Path {
    steps: SmallVec<[PathStep; 4]>,
}

impl Path {
    /// The empty path, addressing the value itself.
    pub fn root() -> Self {
        Self::default()
    }

    pub fn steps(&self) -> &[PathStep] {
        &self.steps
    }

    pub fn is_root(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Appends a step, returning the extended path.
    pub fn join(mut self, step: PathStep) -> Self {
        self.steps.push(step);
        self
    }

    pub fn index(self, i: usize) -> Self {
        self.join(PathStep::Index(i))
    }

    pub fn key(self, key: impl Into<String>) -> Self {
        self.join(PathStep::Key(key.into()))
    }

    pub fn attr(self, name: impl Into<String>) -> Self {
        self.join(PathStep::Attr(name.into()))
    }

    /// Inserts `step` in front, making the path relative to an enclosing value.
    pub(crate) fn prepend(&mut self, step: PathStep) {
        self.steps.insert(0, step);
    }

    /// Inserts all of `outer` in front of this path.
    pub(crate) fn rebase(&mut self, outer: &Path) {
        self.steps.insert_many(0, outer.steps.iter().cloned());
    }
}

impl FromIterator<PathStep> for Path {
    fn from_iter<I: IntoIterator<Item = PathStep>>(iter: I) -> Self {
        Self {
            steps: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for step in &self.steps {
            write!(f, "{step}")?;
        }
        Ok(())
    }
}
