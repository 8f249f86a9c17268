//! `warden-core` — data model for activity/assertion policy evaluation.
//!
//! This crate contains **pure** types (no async, no IO). Evaluation lives in
//! `warden-engine`.

pub mod context;
pub mod error;
pub mod node;

pub use context::{Context, ContextSource, is_truthy};
pub use error::{
    EmptySequence, EntryKind, NodeError, NotFoundError, PolicyError, PolicyResult, RegistryError,
};
pub use node::{AssertionNode, Operator};
