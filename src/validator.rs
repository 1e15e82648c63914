use crate::error::{BuildError, ConfigurationError};
use tracing::error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub location: String,
    pub kind: String,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(location: impl Into<String>, kind: impl Into<String>, message: impl Into<String>) -> Self {
        ValidationIssue {
            location: location.into(),
            kind: kind.into(),
            message: message.into(),
        }
    }
}

impl From<&ConfigurationError> for ValidationIssue {
    fn from(err: &ConfigurationError) -> Self {
        ValidationIssue::new(err.location(), err.kind(), err.to_string())
    }
}

pub fn print_issues(issues: &[ValidationIssue]) {
    error!(
        issue_count = issues.len(),
        "Component declarations failed validation"
    );
    for issue in issues {
        error!(
            location = %issue.location,
            kind = %issue.kind,
            "{}",
            issue.message
        );
    }
}

/// Report every collected error and refuse to continue if there is any
pub fn fail_if_issues(errors: Vec<ConfigurationError>) -> Result<(), BuildError> {
    if errors.is_empty() {
        return Ok(());
    }
    let err = BuildError { errors };
    print_issues(&err.issues());
    Err(err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_issues_passes() {
        assert!(fail_if_issues(Vec::new()).is_ok());
    }

    #[test]
    fn test_issues_are_returned() {
        let err = fail_if_issues(vec![ConfigurationError::UnknownArgument {
            method: "Api.post".into(),
            argument: "body".into(),
        }])
        .unwrap_err();
        let issues = err.issues();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].location, "Api.post");
        assert_eq!(issues[0].kind, "unknown_argument");
    }
}
