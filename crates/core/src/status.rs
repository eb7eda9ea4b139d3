//! Test-request lifecycle statuses and the legal transition graph.
//!
//! ```text
//! CREATED -> INITIATED -> LAB_TEST_IN_PROGRESS -> LAB_TEST_COMPLETED
//!         -> ASSIGNED_FOR_CONSULTATION -> COMPLETED
//! ```
//!
//! The graph is a straight line. Every status has at most one successor and
//! nothing may be skipped or revisited.

use crate::error::{WorkflowError, WorkflowResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle status of a test request, in lifecycle order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestStatus {
    Created,
    Initiated,
    LabTestInProgress,
    LabTestCompleted,
    AssignedForConsultation,
    Completed,
}

impl RequestStatus {
    pub const ALL: [RequestStatus; 6] = [
        Self::Created,
        Self::Initiated,
        Self::LabTestInProgress,
        Self::LabTestCompleted,
        Self::AssignedForConsultation,
        Self::Completed,
    ];

    /// The single status this one may advance to, if any.
    pub fn next(self) -> Option<RequestStatus> {
        match self {
            Self::Created => Some(Self::Initiated),
            Self::Initiated => Some(Self::LabTestInProgress),
            Self::LabTestInProgress => Some(Self::LabTestCompleted),
            Self::LabTestCompleted => Some(Self::AssignedForConsultation),
            Self::AssignedForConsultation => Some(Self::Completed),
            Self::Completed => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        self.next().is_none()
    }

    /// Whether a doctor is attached to requests in this status.
    pub fn carries_assignment(self) -> bool {
        matches!(self, Self::AssignedForConsultation | Self::Completed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Created => "CREATED",
            Self::Initiated => "INITIATED",
            Self::LabTestInProgress => "LAB_TEST_IN_PROGRESS",
            Self::LabTestCompleted => "LAB_TEST_COMPLETED",
            Self::AssignedForConsultation => "ASSIGNED_FOR_CONSULTATION",
            Self::Completed => "COMPLETED",
        }
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestStatus {
    type Err = WorkflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| WorkflowError::validation("status", format!("unknown status '{s}'")))
    }
}

/// Whether `from -> to` is an edge of the transition graph.
pub fn is_valid_transition(from: RequestStatus, to: RequestStatus) -> bool {
    from.next() == Some(to)
}

/// Like [`is_valid_transition`] but yields [`WorkflowError::IllegalTransition`].
pub fn ensure_transition(from: RequestStatus, to: RequestStatus) -> WorkflowResult<()> {
    if is_valid_transition(from, to) {
        Ok(())
    } else {
        Err(WorkflowError::IllegalTransition { from, to })
    }
}
