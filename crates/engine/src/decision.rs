//! Auditable record of a gate decision.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use warden_core::{PolicyError, PolicyResult};

/// Correlates the logs of one gate invocation.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EvaluationId(Uuid);

impl EvaluationId {
    /// Uses UUIDv7 so ids sort by creation time.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for EvaluationId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for EvaluationId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl From<Uuid> for EvaluationId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionOutcome {
    Permitted,
    NotAuthenticated,
    NotAuthorized,
    /// Unknown activity/assertion or an empty `AND`/`OR`.
    ConfigurationError,
}

/// Why an activity was (or was not) permitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub evaluation_id: EvaluationId,
    /// `None` when only authentication was checked.
    pub activity: Option<String>,
    pub outcome: DecisionOutcome,
    /// Failure message, including the leaf assertion's reason.
    pub reason: Option<String>,
    pub decided_at: DateTime<Utc>,
}

impl Decision {
    pub fn from_result(
        evaluation_id: EvaluationId,
        activity: Option<&str>,
        result: &PolicyResult<()>,
    ) -> Self {
        let (outcome, reason) = match result {
            Ok(()) => (DecisionOutcome::Permitted, None),
            Err(err) => (outcome_of(err), Some(err.to_string())),
        };

        Self {
            evaluation_id,
            activity: activity.map(str::to_string),
            outcome,
            reason,
            decided_at: Utc::now(),
        }
    }

    pub fn is_permitted(&self) -> bool {
        self.outcome == DecisionOutcome::Permitted
    }
}

fn outcome_of(err: &PolicyError) -> DecisionOutcome {
    match err {
        PolicyError::NotAuthenticated => DecisionOutcome::NotAuthenticated,
        PolicyError::NotAuthorized(_) => DecisionOutcome::NotAuthorized,
        PolicyError::NotFound(_) | PolicyError::EmptySequence(_) => {
            DecisionOutcome::ConfigurationError
        }
    }
}
