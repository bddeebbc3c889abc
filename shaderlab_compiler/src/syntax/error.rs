//! Content parser errors
//!
//! The recoverable ones are collected on the compile context and parsing
//! resumes at the next `;`. Everything else aborts the parse.

use crate::config::compile_time::content::MAX_COLLECTED_ERRORS;
use crate::logging::codes;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CompilationError {
    #[error("Unknown {state} property '{name}'")]
    UnknownProperty { state: String, name: String },

    #[error("'{member}' is not a member of {enum_type}")]
    UnknownEnumMember { enum_type: String, member: String },

    #[error("Unknown engine enum type '{name}'")]
    UnknownEnumType { name: String },

    #[error("{entry} is already assigned in this pass")]
    DuplicateEntryPoint { entry: String },

    #[error("Undeclared variable '{name}'")]
    UndeclaredVariable { name: String },

    #[error("Variable '{name}' cannot be used as {expected}")]
    InvalidVariableType { name: String, expected: String },

    #[error("{property} expects a {expected} value, found {found}")]
    ValueTypeMismatch {
        property: String,
        expected: String,
        found: String,
    },

    #[error("Invalid index for {property}: {reason}")]
    InvalidPropertyIndex { property: String, reason: String },

    #[error("Expected {expected}, found {found}")]
    UnexpectedToken { expected: String, found: String },

    #[error("Too many errors ({MAX_COLLECTED_ERRORS}), aborting")]
    TooManyErrors,
}

impl CompilationError {
    pub fn unexpected(expected: &str, found: impl std::fmt::Display) -> Self {
        Self::UnexpectedToken {
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }

    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::UnknownProperty { .. }
                | Self::UnknownEnumMember { .. }
                | Self::UnknownEnumType { .. }
                | Self::UndeclaredVariable { .. }
                | Self::InvalidVariableType { .. }
                | Self::ValueTypeMismatch { .. }
                | Self::InvalidPropertyIndex { .. }
        )
    }

    pub fn error_code(&self) -> crate::logging::Code {
        use codes::compilation::*;
        match self {
            Self::UnknownProperty { .. } => UNKNOWN_PROPERTY,
            Self::UnknownEnumMember { .. } => UNKNOWN_ENUM_MEMBER,
            Self::UnknownEnumType { .. } => UNKNOWN_ENUM_TYPE,
            Self::DuplicateEntryPoint { .. } => DUPLICATE_ENTRY_POINT,
            Self::UndeclaredVariable { .. } => UNDECLARED_VARIABLE,
            Self::InvalidVariableType { .. } => INVALID_VARIABLE_TYPE,
            Self::ValueTypeMismatch { .. } => VALUE_TYPE_MISMATCH,
            Self::InvalidPropertyIndex { .. } => INVALID_PROPERTY_INDEX,
            Self::UnexpectedToken { .. } => UNEXPECTED_TOKEN,
            Self::TooManyErrors => TOO_MANY_ERRORS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverability_matches_code_registry() {
        let errors = [
            CompilationError::UndeclaredVariable {
                name: "q".to_string(),
            },
            CompilationError::DuplicateEntryPoint {
                entry: "VertexShader".to_string(),
            },
            CompilationError::unexpected("'{'", ";"),
            CompilationError::TooManyErrors,
        ];
        for error in errors {
            assert_eq!(
                error.is_recoverable(),
                codes::is_recoverable(error.error_code().as_str()),
                "{}",
                error
            );
        }
    }
}
