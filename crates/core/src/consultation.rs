//! Consultation payloads and results.

use crate::error::{WorkflowError, WorkflowResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use testreq_types::{ActorId, NonEmptyText, RequestId, TextError};

/// Outcome a doctor suggests when closing a consultation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Outcome {
    Negative,
    NoIssues,
    HomeQuarantine,
    Admit,
}

impl Outcome {
    pub const ALL: [Outcome; 4] = [
        Self::Negative,
        Self::NoIssues,
        Self::HomeQuarantine,
        Self::Admit,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Negative => "NEGATIVE",
            Self::NoIssues => "NO_ISSUES",
            Self::HomeQuarantine => "HOME_QUARANTINE",
            Self::Admit => "ADMIT",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Outcome {
    type Err = WorkflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|o| o.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                let allowed: Vec<&str> = Self::ALL.iter().map(|o| o.as_str()).collect();
                WorkflowError::validation(
                    "suggestion",
                    format!("'{wanted}' is not one of {}", allowed.join(", ")),
                )
            })
    }
}

/// Raw consultation payload as received from a caller. Nothing here has been checked yet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateConsultationRequest {
    #[serde(default)]
    pub comments: Option<String>,
    #[serde(default)]
    pub suggestion: Option<String>,
}

/// A consultation payload that passed structural validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidConsultation {
    pub comments: NonEmptyText,
    pub suggestion: Outcome,
}

impl CreateConsultationRequest {
    pub fn new(comments: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self {
            comments: Some(comments.into()),
            suggestion: Some(suggestion.into()),
        }
    }

    /// Check the payload field by field. The first failing field is reported.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Validation`] naming `comments` or `suggestion`.
    pub fn validate(&self, max_comment_len: usize) -> WorkflowResult<ValidConsultation> {
        let comments = self
            .comments
            .as_deref()
            .ok_or_else(|| WorkflowError::validation("comments", "is required"))?;
        let comments = NonEmptyText::bounded(comments, max_comment_len).map_err(|e| match e {
            TextError::Empty => WorkflowError::validation("comments", "must not be empty"),
            TextError::TooLong { max } => {
                WorkflowError::validation("comments", format!("must be at most {max} characters"))
            }
        })?;

        let suggestion = self
            .suggestion
            .as_deref()
            .ok_or_else(|| WorkflowError::validation("suggestion", "is required"))?
            .parse::<Outcome>()?;

        Ok(ValidConsultation {
            comments,
            suggestion,
        })
    }
}

/// The doctor's terminal judgment on a test request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsultationResult {
    pub request_id: RequestId,
    pub doctor: ActorId,
    pub comments: NonEmptyText,
    pub suggestion: Outcome,
    pub recorded_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field_of(err: WorkflowError) -> String {
        match err {
            WorkflowError::Validation { field, .. } => field,
            other => panic!("expected Validation error, got {other:?}"),
        }
    }

    #[test]
    fn accepts_well_formed_payload() {
        let valid = CreateConsultationRequest::new(" stable ", "negative")
            .validate(100)
            .unwrap();
        assert_eq!(valid.comments.as_str(), "stable");
        assert_eq!(valid.suggestion, Outcome::Negative);
    }

    #[test]
    fn blank_or_missing_comments_are_rejected() {
        let blank = CreateConsultationRequest::new("   ", "ADMIT");
        assert_eq!(field_of(blank.validate(100).unwrap_err()), "comments");

        let missing = CreateConsultationRequest {
            comments: None,
            suggestion: Some("ADMIT".into()),
        };
        assert_eq!(field_of(missing.validate(100).unwrap_err()), "comments");
    }

    #[test]
    fn overlong_comments_are_rejected() {
        let req = CreateConsultationRequest::new("x".repeat(11), "ADMIT");
        match req.validate(10).unwrap_err() {
            WorkflowError::Validation { field, message } => {
                assert_eq!(field, "comments");
                assert!(message.contains("10"));
            }
            other => panic!("expected Validation error, got {other:?}"),
        }
    }

    #[test]
    fn unknown_suggestion_is_rejected() {
        let req = CreateConsultationRequest::new("stable", "MAYBE");
        assert_eq!(field_of(req.validate(100).unwrap_err()), "suggestion");

        let missing = CreateConsultationRequest {
            comments: Some("stable".into()),
            suggestion: None,
        };
        assert_eq!(field_of(missing.validate(100).unwrap_err()), "suggestion");
    }
}
