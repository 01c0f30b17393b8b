//! Plan artifacts and the plan-generation workflow state.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::serde_helpers::lenient_timestamp;

fn default_downloadable() -> bool {
    true
}

/// A generated itinerary document attached to a room.
///
/// `downloadable == false` means the server-enforced download window has
/// expired; such artifacts are shown but never requested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanArtifact {
    pub id: i64,
    pub file_name: String,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default = "default_downloadable")]
    pub downloadable: bool,
    #[serde(default)]
    pub download_url: Option<String>,
}

/// State of the asynchronous plan-generation workflow for a room.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanWorkflowState {
    #[default]
    Idle,
    Generating,
    Ready,
    Error,
    TimedOut,
}

impl PlanWorkflowState {
    /// Terminal states are only left by the next trigger phrase.
    pub fn is_resolved(self) -> bool {
        matches!(
            self,
            PlanWorkflowState::Ready | PlanWorkflowState::Error | PlanWorkflowState::TimedOut
        )
    }
}

impl fmt::Display for PlanWorkflowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanWorkflowState::Idle => write!(f, "idle"),
            PlanWorkflowState::Generating => write!(f, "generating"),
            PlanWorkflowState::Ready => write!(f, "ready"),
            PlanWorkflowState::Error => write!(f, "error"),
            PlanWorkflowState::TimedOut => write!(f, "timed_out"),
        }
    }
}

impl FromStr for PlanWorkflowState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "idle" => Ok(PlanWorkflowState::Idle),
            "generating" => Ok(PlanWorkflowState::Generating),
            "ready" => Ok(PlanWorkflowState::Ready),
            "error" => Ok(PlanWorkflowState::Error),
            "timed_out" | "timedout" => Ok(PlanWorkflowState::TimedOut),
            other => Err(format!("invalid plan workflow state: '{other}'")),
        }
    }
}

/// Why a plan notice is being shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanNoticeKind {
    /// The planner reported an error.
    Error,
    /// No resolution arrived within the configured window.
    TimedOut,
}

/// A time-limited inline notice surfaced by the plan workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanNotice {
    pub kind: PlanNoticeKind,
    pub text: String,
}
