//! Recursive assertion-tree evaluation.

use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use tracing::{debug, warn};

use warden_core::{AssertionNode, NotFoundError, PolicyError, PolicyResult};

use crate::assertion::Assertion;
use crate::registry::Registry;
use crate::series::{all_series, any_series};

/// Walks an [`AssertionNode`] against an assertion registry.
///
/// Holds no state between calls. `All`/`Any` nodes go through the series
/// combinators, so children are checked one at a time and evaluation stops
/// as soon as the outcome is known. Recursion depth equals tree depth.
#[derive(Clone, Copy)]
pub struct Evaluator<'r> {
    assertions: &'r Registry<Arc<dyn Assertion>>,
}

impl<'r> Evaluator<'r> {
    pub fn new(assertions: &'r Registry<Arc<dyn Assertion>>) -> Self {
        Self { assertions }
    }

    pub fn evaluate<'a>(&'a self, node: &'a AssertionNode) -> BoxFuture<'a, PolicyResult<()>> {
        async move {
            match node {
                AssertionNode::Assert { name, args } => self.invoke(name, args).await,
                AssertionNode::All(children) => {
                    all_series(children, move |child| self.evaluate(child)).await
                }
                AssertionNode::Any(children) => {
                    any_series(children, move |child| self.evaluate(child)).await
                }
            }
        }
        .boxed()
    }

    async fn invoke(&self, name: &str, args: &[serde_json::Value]) -> PolicyResult<()> {
        let assertion = self.assertions.resolve(name).inspect_err(|err| {
            warn!(error = %err, "assertion tree references an unregistered assertion");
        })?;

        debug!(assertion = name, args = args.len(), "checking assertion");
        assertion.check(args).await.map_err(|reason| {
            debug!(assertion = name, reason = %reason, "assertion failed");
            PolicyError::NotAuthorized(reason)
        })
    }

    /// Check that every leaf of `node` names a registered assertion.
    pub fn validate(&self, node: &AssertionNode) -> Result<(), NotFoundError> {
        node.leaf_names()
            .into_iter()
            .try_for_each(|name| self.assertions.resolve(name).map(|_| ()))
    }
}
