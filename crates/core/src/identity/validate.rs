//! Allow-list checks for author emails and ignore globs.
//!
//! Both checks are all-or-nothing: the first value outside the common pattern
//! rejects the whole batch, and the error carries that value.

use std::sync::LazyLock;

use regex_lite::Regex;

use crate::errors::ValidationError;

const COMMON_EMAIL_REGEX: &str =
    r"^([a-zA-Z0-9_\-\.\+]+)@([a-zA-Z0-9_\-\.]+)\.([a-zA-Z]{2,5})$";
const COMMON_GLOB_REGEX: &str = r"^[-a-zA-Z0-9 _/\\*!{}\[\]!(),:.]*$";

static COMMON_EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(COMMON_EMAIL_REGEX).expect("email pattern is valid"));
static COMMON_GLOB: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(COMMON_GLOB_REGEX).expect("glob pattern is valid"));

/// Whether a single email uses the common pattern.
pub fn is_common_email(email: &str) -> bool {
    COMMON_EMAIL.is_match(email)
}

/// Whether a single glob uses only the common glob characters.
pub fn is_common_glob(glob: &str) -> bool {
    COMMON_GLOB.is_match(glob)
}

/// Check that every entry of `emails` uses a commonly seen email pattern.
pub fn validate_emails<S: AsRef<str>>(emails: &[S]) -> Result<(), ValidationError> {
    match emails.iter().find(|e| !is_common_email(e.as_ref())) {
        Some(bad) => Err(ValidationError::UncommonEmail(bad.as_ref().to_string())),
        None => Ok(()),
    }
}

/// Check that every entry of `globs` uses only commonly seen glob characters.
pub fn validate_globs<S: AsRef<str>>(globs: &[S]) -> Result<(), ValidationError> {
    match globs.iter().find(|g| !is_common_glob(g.as_ref())) {
        Some(bad) => Err(ValidationError::UncommonGlob(bad.as_ref().to_string())),
        None => Ok(()),
    }
}
