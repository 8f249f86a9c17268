//! The activity gate.
//!
//! `Engine` answers "may this context perform this activity?":
//!
//! 1. resolve the context (once),
//! 2. fail with `NotAuthenticated` if it carries no identity,
//! 3. pass if no activity was named,
//! 4. otherwise resolve the activity, build its assertion tree, and evaluate it.
//!
//! Authentication is always checked before any registry lookup.

use std::sync::Arc;

use futures::future::join_all;
use serde_json::Value;
use tracing::{Instrument, debug, info_span, warn};

use warden_core::{
    AssertionNode, Context, ContextSource, EntryKind, NotFoundError, Operator, PolicyError,
    PolicyResult, RegistryError,
};

use crate::assertion::{Activity, Assertion, SyncAssertion};
use crate::config::EngineConfig;
use crate::decision::{Decision, EvaluationId};
use crate::evaluator::Evaluator;
use crate::registry::Registry;

/// Immutable policy engine.
///
/// Built once via [`Engine::builder`] and shared (usually behind an `Arc`).
/// Distinct calls share no mutable state.
pub struct Engine {
    config: EngineConfig,
    activities: Registry<Arc<dyn Activity>>,
    assertions: Registry<Arc<dyn Assertion>>,
}

impl core::fmt::Debug for Engine {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("activities", &self.activities.paths())
            .field("assertions", &self.assertions.paths())
            .finish()
    }
}

impl Engine {
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn activities(&self) -> &Registry<Arc<dyn Activity>> {
        &self.activities
    }

    pub fn assertions(&self) -> &Registry<Arc<dyn Assertion>> {
        &self.assertions
    }

    pub fn resolve_activity(&self, path: &str) -> Result<&Arc<dyn Activity>, NotFoundError> {
        self.activities.resolve(path)
    }

    pub fn resolve_assertion(&self, path: &str) -> Result<&Arc<dyn Assertion>, NotFoundError> {
        self.assertions.resolve(path)
    }

    pub fn evaluator(&self) -> Evaluator<'_> {
        Evaluator::new(&self.assertions)
    }

    /// Evaluate an assertion tree directly (no authentication step).
    pub async fn evaluate(&self, node: &AssertionNode) -> PolicyResult<()> {
        self.evaluator().evaluate(node).await
    }

    /// Evaluate a tree given in array form (`["AND", ["owner", 1], ...]`).
    pub async fn evaluate_value(&self, tree: Value) -> PolicyResult<()> {
        let node = AssertionNode::try_from(tree)?;
        self.evaluate(&node).await
    }

    /// Check that every leaf of `node` names a registered assertion.
    pub fn validate(&self, node: &AssertionNode) -> Result<(), NotFoundError> {
        self.evaluator().validate(node)
    }

    /// Decide whether `context` may perform `activity`.
    ///
    /// With `activity` absent or empty, only authentication is required.
    pub async fn can_perform(
        &self,
        activity: Option<&str>,
        context: impl ContextSource,
    ) -> PolicyResult<()> {
        let context = context.resolve();
        self.run(EvaluationId::new(), activity, &context).await
    }

    /// Boolean form of [`Engine::can_perform`]; the failure reason is discarded.
    pub async fn is_permitted(&self, activity: Option<&str>, context: impl ContextSource) -> bool {
        self.can_perform(activity, context).await.is_ok()
    }

    /// [`Engine::can_perform`] plus an auditable record of the outcome.
    pub async fn decide(&self, activity: Option<&str>, context: impl ContextSource) -> Decision {
        let context = context.resolve();
        let evaluation_id = EvaluationId::new();
        let result = self.run(evaluation_id, activity, &context).await;
        Decision::from_result(evaluation_id, activity, &result)
    }

    /// The subsequence of `activities` the context may perform, in input order.
    ///
    /// The context is resolved once. Activities are evaluated concurrently and
    /// independently of each other.
    pub async fn permitted_activities<S>(
        &self,
        activities: &[S],
        context: impl ContextSource,
    ) -> Vec<String>
    where
        S: AsRef<str>,
    {
        let context = context.resolve();
        let context = &context;

        let checks = activities.iter().map(move |name| async move {
            let name = name.as_ref();
            self.run(EvaluationId::new(), Some(name), context)
                .await
                .ok()
                .map(|()| name.to_string())
        });

        join_all(checks).await.into_iter().flatten().collect()
    }

    async fn run(
        &self,
        evaluation_id: EvaluationId,
        activity: Option<&str>,
        context: &Context,
    ) -> PolicyResult<()> {
        let span = info_span!(
            "can_perform",
            evaluation_id = %evaluation_id,
            activity = activity.unwrap_or_default()
        );

        async {
            let result = self.gate(activity, context).await;
            match &result {
                Ok(()) => debug!("permitted"),
                Err(err) if err.is_configuration_error() => warn!(error = %err, "policy misconfigured"),
                Err(err) => debug!(error = %err, "denied"),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn gate(&self, activity: Option<&str>, context: &Context) -> PolicyResult<()> {
        if !context.is_authenticated(&self.config.identity_field) {
            return Err(PolicyError::NotAuthenticated);
        }

        let Some(name) = activity.filter(|name| !name.is_empty()) else {
            return Ok(());
        };

        let tree = self.resolve_activity(name)?.assertions(context);
        self.evaluate(&tree).await
    }
}

/// Collects configuration and integrator registrations for an [`Engine`].
///
/// Registrations are applied in order when [`EngineBuilder::build`] runs, so a
/// later registration under the same path replaces an earlier one.
#[derive(Default)]
pub struct EngineBuilder {
    config: EngineConfig,
    activities: Vec<(String, Arc<dyn Activity>)>,
    assertions: Vec<(String, Arc<dyn Assertion>)>,
}

impl EngineBuilder {
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn identity_field(mut self, field: impl Into<String>) -> Self {
        self.config.identity_field = field.into();
        self
    }

    pub fn delimiter(mut self, delimiter: char) -> Self {
        self.config.delimiter = delimiter;
        self
    }

    pub fn activity<A>(mut self, path: impl Into<String>, activity: A) -> Self
    where
        A: Activity + 'static,
    {
        self.activities.push((path.into(), Arc::new(activity)));
        self
    }

    pub fn assertion<A>(mut self, path: impl Into<String>, assertion: A) -> Self
    where
        A: Assertion + 'static,
    {
        self.assertions.push((path.into(), Arc::new(assertion)));
        self
    }

    /// Register a synchronous predicate as an assertion.
    pub fn sync_assertion<F>(self, path: impl Into<String>, check: F) -> Self
    where
        F: Fn(&[Value]) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.assertion(path, SyncAssertion::new(check))
    }

    pub fn build(self) -> Result<Engine, RegistryError> {
        let delimiter = self.config.delimiter;

        let mut activities = Registry::new(EntryKind::Activity, delimiter);
        for (path, activity) in self.activities {
            activities.insert(&path, activity)?;
        }

        let mut assertions = Registry::new(EntryKind::Assertion, delimiter);
        for (path, assertion) in self.assertions {
            if Operator::from_keyword(&path).is_some() {
                warn!(
                    assertion = %path,
                    "assertion name is an operator keyword; array-form trees cannot reach it"
                );
            }
            assertions.insert(&path, assertion)?;
        }

        debug!(
            activities = activities.len(),
            assertions = assertions.len(),
            identity_field = %self.config.identity_field,
            "policy engine built"
        );

        Ok(Engine {
            config: self.config,
            activities,
            assertions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn owner(args: Vec<Value>) -> anyhow::Result<()> {
        anyhow::ensure!(args.first() == args.get(1), "not the owner");
        Ok(())
    }

    fn engine() -> Engine {
        Engine::builder()
            .assertion("owner", owner)
            .sync_assertion("never", |_: &[Value]| anyhow::bail!("never"))
            .activity("orders:cancel", |ctx: &Context| {
                AssertionNode::assert(
                    "owner",
                    [
                        ctx.get("user").cloned().unwrap_or_default(),
                        ctx.get("order_owner").cloned().unwrap_or_default(),
                    ],
                )
            })
            .activity("orders:purge", |_: &Context| {
                AssertionNode::assert("never", Vec::<Value>::new())
            })
            .build()
            .unwrap()
    }

    fn alice() -> Context {
        Context::new().with("user", "alice").with("order_owner", "alice")
    }

    #[tokio::test]
    async fn unauthenticated_context_fails_before_lookup() {
        let engine = engine();
        for activity in [None, Some("orders:cancel"), Some("does:not:exist")] {
            let err = engine.can_perform(activity, Context::new()).await.unwrap_err();
            assert!(err.is_not_authenticated(), "{activity:?}: {err}");
        }
    }

    #[tokio::test]
    async fn no_activity_only_requires_identity() {
        let engine = engine();
        assert!(engine.can_perform(None, alice()).await.is_ok());
        assert!(engine.can_perform(Some(""), alice()).await.is_ok());
    }

    #[tokio::test]
    async fn activity_tree_decides() {
        let engine = engine();
        assert!(engine.can_perform(Some("orders:cancel"), alice()).await.is_ok());

        let bob = alice().with("user", "bob");
        let err = engine.can_perform(Some("orders:cancel"), bob).await.unwrap_err();
        assert_eq!(err.reason().unwrap().to_string(), "not the owner");
    }

    #[tokio::test]
    async fn unknown_activity_is_not_found() {
        let err = engine()
            .can_perform(Some("orders:refund"), alice())
            .await
            .unwrap_err();
        assert!(matches!(err, PolicyError::NotFound(ref e) if *e == NotFoundError::activity("orders:refund")));
    }

    #[tokio::test]
    async fn lazy_context_is_resolved() {
        let engine = engine();
        assert!(engine.is_permitted(Some("orders:cancel"), alice).await);
        assert!(!engine.is_permitted(Some("orders:purge"), alice).await);
    }

    #[tokio::test]
    async fn identity_field_is_configurable() {
        let engine = Engine::builder().identity_field("principal").build().unwrap();
        assert!(!engine.is_permitted(None, alice()).await);
        assert!(engine.is_permitted(None, Context::new().with("principal", 1)).await);
    }

    #[tokio::test]
    async fn permitted_activities_keeps_input_order() {
        let engine = engine();
        let permitted = engine
            .permitted_activities(
                &["orders:cancel", "orders:purge", "orders:cancel", "nope"],
                alice(),
            )
            .await;
        assert_eq!(permitted, vec!["orders:cancel", "orders:cancel"]);
    }

    #[tokio::test]
    async fn decide_records_outcome() {
        let engine = engine();
        let decision = engine.decide(Some("orders:purge"), alice()).await;
        assert!(!decision.is_permitted());
        assert_eq!(decision.activity.as_deref(), Some("orders:purge"));
        assert_eq!(decision.reason.as_deref(), Some("not authorized: never"));
    }

    #[tokio::test]
    async fn evaluate_value_reads_array_form() {
        let engine = engine();
        assert!(engine.evaluate_value(json!(["OR", ["never"], ["owner", 1, 1]])).await.is_ok());
        assert!(engine.evaluate_value(json!([])).await.unwrap_err().is_not_authorized());
    }

    #[test]
    fn conflicting_registration_fails_build() {
        let result = Engine::builder()
            .activity("a", |_: &Context| AssertionNode::all([]))
            .activity("a:b", |_: &Context| AssertionNode::all([]))
            .build();
        assert!(matches!(result, Err(RegistryError::NotANamespace { .. })));
    }

    #[test]
    fn later_registration_wins() {
        let engine = Engine::builder()
            .sync_assertion("x", |_: &[Value]| anyhow::bail!("first"))
            .sync_assertion("x", |_: &[Value]| Ok(()))
            .build()
            .unwrap();
        assert_eq!(engine.assertions().len(), 1);
        let result = futures::executor::block_on(
            engine.evaluate(&AssertionNode::assert("x", Vec::<Value>::new())),
        );
        assert!(result.is_ok());
    }
}
