//! Request-pipeline adaptor.
//!
//! Intentionally decoupled from HTTP: a [`RequestGuard`] works with any
//! request type. It derives a context from the request, asks the engine,
//! and either lets the pipeline continue or hands the request to the
//! matching failure handler.

use std::sync::Arc;

use warden_core::{Context, PolicyError};

use crate::engine::Engine;

/// Failure handlers supplied by the integrator.
pub trait GuardHandlers<R>: Send + Sync {
    /// What the pipeline produces instead of continuing (e.g. a response).
    type Output;

    /// The derived context carries no identity.
    fn on_not_authenticated(&self, request: &R) -> Self::Output;

    /// Any other failure: a failing assertion or a misconfigured policy.
    fn on_not_authorized(&self, request: &R, error: PolicyError) -> Self::Output;
}

type Extractor<R> = Box<dyn Fn(&R) -> Context + Send + Sync>;

/// Guards one activity (or plain authentication) for requests of type `R`.
pub struct RequestGuard<R, H> {
    engine: Arc<Engine>,
    activity: Option<String>,
    extract: Extractor<R>,
    handlers: H,
}

impl<R, H> RequestGuard<R, H>
where
    H: GuardHandlers<R>,
{
    /// Require an authenticated context only.
    pub fn authenticated<E>(engine: Arc<Engine>, extract: E, handlers: H) -> Self
    where
        E: Fn(&R) -> Context + Send + Sync + 'static,
    {
        Self {
            engine,
            activity: None,
            extract: Box::new(extract),
            handlers,
        }
    }

    /// Require `activity` to be permitted.
    pub fn for_activity<E>(
        engine: Arc<Engine>,
        activity: impl Into<String>,
        extract: E,
        handlers: H,
    ) -> Self
    where
        E: Fn(&R) -> Context + Send + Sync + 'static,
    {
        Self {
            engine,
            activity: Some(activity.into()),
            extract: Box::new(extract),
            handlers,
        }
    }

    pub fn activity(&self) -> Option<&str> {
        self.activity.as_deref()
    }

    /// `Ok(())` means "continue the pipeline".
    pub async fn check(&self, request: &R) -> Result<(), H::Output> {
        let context = (self.extract)(request);
        match self.engine.can_perform(self.activity(), context).await {
            Ok(()) => Ok(()),
            Err(PolicyError::NotAuthenticated) => Err(self.handlers.on_not_authenticated(request)),
            Err(err) => Err(self.handlers.on_not_authorized(request, err)),
        }
    }
}
