//! Credential validator.
//!
//! Compares a submitted name and date of birth against the configured
//! allow-list. Failure messages never reveal which names are allowed.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

pub const BOTH_INCORRECT: &str = "Both name and date of birth are incorrect";
pub const NAME_INCORRECT: &str = "Name is incorrect";
pub const DOB_INCORRECT: &str = "Date of birth is incorrect";

/// Lower-cases, trims and collapses internal whitespace to single spaces.
pub fn normalize_name(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Name and date of birth as submitted, after name normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub name: String,
    pub dob: String,
}

impl Credential {
    pub fn new(name: &str, dob: &str) -> Self {
        Self {
            name: normalize_name(name),
            dob: dob.to_string(),
        }
    }

    /// Key under which the outcome for this credential is cached.
    pub fn cache_key(&self) -> String {
        format!("{}_{}", self.name, self.dob)
    }
}

/// Result of checking a credential.
///
/// Serializes to `{"success": true}` or `{"success": false, "message": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "OutcomeBody", try_from = "OutcomeBody")]
pub enum ValidationOutcome {
    Success,
    Failure(String),
}

impl ValidationOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ValidationOutcome::Success)
    }
}

#[derive(Serialize, Deserialize)]
struct OutcomeBody {
    success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

impl From<ValidationOutcome> for OutcomeBody {
    fn from(outcome: ValidationOutcome) -> Self {
        match outcome {
            ValidationOutcome::Success => OutcomeBody {
                success: true,
                message: None,
            },
            ValidationOutcome::Failure(message) => OutcomeBody {
                success: false,
                message: Some(message),
            },
        }
    }
}

impl TryFrom<OutcomeBody> for ValidationOutcome {
    type Error = String;

    fn try_from(body: OutcomeBody) -> Result<Self, Self::Error> {
        match (body.success, body.message) {
            (true, _) => Ok(ValidationOutcome::Success),
            (false, Some(message)) => Ok(ValidationOutcome::Failure(message)),
            (false, None) => Err("failure outcome without message".to_string()),
        }
    }
}

/// Checks credentials against a fixed allow-list and date of birth.
#[derive(Debug, Clone)]
pub struct CredentialValidator {
    allowed_names: HashSet<String>,
    expected_dob: String,
}

impl CredentialValidator {
    /// Builds a validator; allow-list entries are normalized on the way in.
    pub fn new<I, S>(allowed_names: I, expected_dob: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            allowed_names: allowed_names
                .into_iter()
                .map(|name| normalize_name(name.as_ref()))
                .filter(|name| !name.is_empty())
                .collect(),
            expected_dob: expected_dob.into(),
        }
    }

    pub fn validate(&self, credential: &Credential) -> ValidationOutcome {
        let name_ok = self.allowed_names.contains(&credential.name);
        let dob_ok = credential.dob == self.expected_dob;

        match (name_ok, dob_ok) {
            (true, true) => ValidationOutcome::Success,
            (false, false) => ValidationOutcome::Failure(BOTH_INCORRECT.to_string()),
            (false, true) => ValidationOutcome::Failure(NAME_INCORRECT.to_string()),
            (true, false) => ValidationOutcome::Failure(DOB_INCORRECT.to_string()),
        }
    }

    /// Number of distinct allowed names.
    pub fn allowed_count(&self) -> usize {
        self.allowed_names.len()
    }
}
