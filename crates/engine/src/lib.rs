//! `warden-engine` — activity gate and assertion-tree evaluator.
//!
//! An [`Engine`] maps a named activity plus a per-call [`Context`] to an
//! [`AssertionNode`] tree and evaluates it. Leaves are integrator-supplied
//! [`Assertion`]s that may do arbitrary async work; `AND`/`OR` nodes are
//! checked strictly in order and short-circuit.
//!
//! This crate knows nothing about HTTP; see [`guard`] for the adaptor hook.

pub mod assertion;
pub mod config;
pub mod decision;
pub mod engine;
pub mod evaluator;
pub mod guard;
pub mod registry;
pub mod series;

pub use assertion::{Activity, Assertion, SyncAssertion};
pub use config::EngineConfig;
pub use decision::{Decision, DecisionOutcome, EvaluationId};
pub use engine::{Engine, EngineBuilder};
pub use evaluator::Evaluator;
pub use guard::{GuardHandlers, RequestGuard};
pub use registry::Registry;
pub use series::{all_series, any_series};

pub use warden_core::{
    AssertionNode, Context, ContextSource, EmptySequence, EntryKind, NodeError, NotFoundError,
    Operator, PolicyError, PolicyResult, RegistryError,
};
