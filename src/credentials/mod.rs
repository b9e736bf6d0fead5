//! Credentials Module
//!
//! The static name / date-of-birth check that gates the letter.

mod validator;

pub use validator::{
    normalize_name, Credential, CredentialValidator, ValidationOutcome, BOTH_INCORRECT,
    DOB_INCORRECT, NAME_INCORRECT,
};
