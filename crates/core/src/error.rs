//! Policy error model.

use thiserror::Error;

/// Result type used by the gate and the evaluator.
pub type PolicyResult<T> = Result<T, PolicyError>;

/// Which registry a lookup was made against.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum EntryKind {
    Activity,
    Assertion,
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::Activity => "activity",
            EntryKind::Assertion => "assertion",
        }
    }
}

impl core::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A path did not resolve to a registered function.
///
/// This is a configuration bug, not an authorization outcome.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{kind} `{path}` not found")]
pub struct NotFoundError {
    pub kind: EntryKind,
    pub path: String,
}

impl NotFoundError {
    pub fn activity(path: impl Into<String>) -> Self {
        Self {
            kind: EntryKind::Activity,
            path: path.into(),
        }
    }

    pub fn assertion(path: impl Into<String>) -> Self {
        Self {
            kind: EntryKind::Assertion,
            path: path.into(),
        }
    }
}

/// An `AND`/`OR` combination was given no children.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq, Default)]
#[error("empty sequence")]
pub struct EmptySequence;

/// A tree in array form (`[name, ...rest]`) could not be read.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NodeError {
    #[error("assertion node must be a non-empty array")]
    Empty,

    #[error("assertion node name must be a string, got {0}")]
    InvalidName(String),

    #[error("child of `{operator}` must be an assertion node, got {found}")]
    InvalidChild { operator: String, found: String },
}

/// Registration failed while building the engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("{kind} path is empty")]
    EmptyPath { kind: EntryKind },

    #[error("{kind} path `{path}` contains an empty segment")]
    EmptySegment { kind: EntryKind, path: String },

    #[error("{kind} path `{path}` passes through `{segment}`, which is already a {kind}")]
    NotANamespace {
        kind: EntryKind,
        path: String,
        segment: String,
    },

    #[error("{kind} path `{path}` is already a namespace")]
    NamespaceOccupied { kind: EntryKind, path: String },
}

/// Terminal failure of a gate or evaluator call.
#[derive(Debug, Error)]
pub enum PolicyError {
    /// The context carries no identity.
    #[error("not authenticated")]
    NotAuthenticated,

    /// A leaf assertion failed; the reason is whatever it produced.
    #[error("not authorized: {0}")]
    NotAuthorized(#[source] anyhow::Error),

    #[error(transparent)]
    NotFound(#[from] NotFoundError),

    #[error("malformed assertion tree: {0}")]
    EmptySequence(#[from] EmptySequence),
}

impl PolicyError {
    pub fn not_authorized(reason: impl Into<anyhow::Error>) -> Self {
        Self::NotAuthorized(reason.into())
    }

    pub fn is_not_authenticated(&self) -> bool {
        matches!(self, Self::NotAuthenticated)
    }

    pub fn is_not_authorized(&self) -> bool {
        matches!(self, Self::NotAuthorized(_))
    }

    /// Raised by a broken registry or tree rather than by the data being checked.
    pub fn is_configuration_error(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::EmptySequence(_))
    }

    /// The reason reported by the failing leaf, if any.
    pub fn reason(&self) -> Option<&anyhow::Error> {
        match self {
            Self::NotAuthorized(reason) => Some(reason),
            _ => None,
        }
    }
}

impl From<NodeError> for PolicyError {
    fn from(value: NodeError) -> Self {
        Self::NotAuthorized(value.into())
    }
}
