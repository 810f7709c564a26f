//! Evaluation outcomes

#![allow(dead_code)]

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::EvaluationError;

/// Result of evaluating one expression
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum EvaluationOutcome {
    Success { value: Value },
    Failure { diagnostic: Vec<String> },
}

impl EvaluationOutcome {
    pub fn success(value: Value) -> Self {
        EvaluationOutcome::Success { value }
    }

    pub fn failure<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        EvaluationOutcome::Failure {
            diagnostic: lines.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, EvaluationOutcome::Success { .. })
    }
}

impl From<EvaluationError> for EvaluationOutcome {
    fn from(err: EvaluationError) -> Self {
        EvaluationOutcome::Failure {
            diagnostic: err.into_diagnostic(),
        }
    }
}
