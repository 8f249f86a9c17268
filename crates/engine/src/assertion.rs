//! Integrator plug-in contracts.

use std::future::Future;

use async_trait::async_trait;
use serde_json::Value;

use warden_core::{AssertionNode, Context};

/// A named, possibly asynchronous check (e.g. a database lookup).
///
/// `Ok(())` passes. `Err(reason)` fails and the reason is surfaced verbatim
/// as [`warden_core::PolicyError::NotAuthorized`]. Implementations that need a
/// timeout or retries must add them themselves.
#[async_trait]
pub trait Assertion: Send + Sync {
    async fn check(&self, args: &[Value]) -> anyhow::Result<()>;
}

/// Async closures and `async fn`s taking the owned argument list.
#[async_trait]
impl<F, Fut> Assertion for F
where
    F: Fn(Vec<Value>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    async fn check(&self, args: &[Value]) -> anyhow::Result<()> {
        (self)(args.to_vec()).await
    }
}

/// Adapts a synchronous predicate into an [`Assertion`].
pub struct SyncAssertion<F>(F);

impl<F> SyncAssertion<F>
where
    F: Fn(&[Value]) -> anyhow::Result<()> + Send + Sync,
{
    pub fn new(check: F) -> Self {
        Self(check)
    }
}

#[async_trait]
impl<F> Assertion for SyncAssertion<F>
where
    F: Fn(&[Value]) -> anyhow::Result<()> + Send + Sync,
{
    async fn check(&self, args: &[Value]) -> anyhow::Result<()> {
        (self.0)(args)
    }
}

/// Maps a context to the assertion tree that decides the activity.
///
/// Activities are pure and synchronous; all async work happens in assertions.
pub trait Activity: Send + Sync {
    fn assertions(&self, context: &Context) -> AssertionNode;
}

impl<F> Activity for F
where
    F: Fn(&Context) -> AssertionNode + Send + Sync,
{
    fn assertions(&self, context: &Context) -> AssertionNode {
        self(context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn positive(args: Vec<Value>) -> anyhow::Result<()> {
        match args.first().and_then(Value::as_i64) {
            Some(n) if n > 0 => Ok(()),
            other => anyhow::bail!("expected a positive number, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn async_fn_is_an_assertion() {
        let assertion: &dyn Assertion = &positive;
        assert!(assertion.check(&[json!(3)]).await.is_ok());
        assert!(assertion.check(&[json!(-1)]).await.is_err());
    }

    #[tokio::test]
    async fn sync_predicate_is_an_assertion() {
        let assertion = SyncAssertion::new(|args: &[Value]| {
            anyhow::ensure!(args.len() == 2, "expected two arguments");
            Ok(())
        });
        assert!(assertion.check(&[json!(1), json!(2)]).await.is_ok());
        let err = assertion.check(&[]).await.unwrap_err();
        assert_eq!(err.to_string(), "expected two arguments");
    }

    #[test]
    fn closure_is_an_activity() {
        let activity = |ctx: &Context| {
            AssertionNode::assert("owner", [ctx.get("user").cloned().unwrap_or(Value::Null)])
        };
        let node = activity.assertions(&Context::new().with("user", "alice"));
        assert_eq!(node, AssertionNode::assert("owner", ["alice"]));
    }
}
