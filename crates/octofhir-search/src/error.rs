//! Errors raised while compiling a search query.
//!
//! Every failure is a client error: the query is malformed or names
//! something the registry does not know. Nothing is retried or recovered.

use std::fmt;

use thiserror::Error;

use crate::parameters::{SearchModifier, SearchParameterType, SearchPrefix};

/// Machine-readable categorization of a [`SearchError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    UnknownResourceType,
    UnknownSearchParameter,
    ChainRequiresReference,
    UnsupportedTargetType,
    UnknownModifier,
    InvalidModifierForType,
    InvalidComparatorForType,
    MalformedModifierSyntax,
    MultiValueWithComparator,
    InvalidMissingLiteral,
    InvalidSearchValue,
    ChainTooDeep,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UnknownResourceType => "unknown_resource_type",
            Self::UnknownSearchParameter => "unknown_search_parameter",
            Self::ChainRequiresReference => "chain_requires_reference",
            Self::UnsupportedTargetType => "unsupported_target_type",
            Self::UnknownModifier => "unknown_modifier",
            Self::InvalidModifierForType => "invalid_modifier_for_type",
            Self::InvalidComparatorForType => "invalid_comparator_for_type",
            Self::MalformedModifierSyntax => "malformed_modifier_syntax",
            Self::MultiValueWithComparator => "multi_value_with_comparator",
            Self::InvalidMissingLiteral => "invalid_missing_literal",
            Self::InvalidSearchValue => "invalid_search_value",
            Self::ChainTooDeep => "chain_too_deep",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Invalid search operation.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SearchError {
    #[error("Unknown resource type: {0}")]
    UnknownResourceType(String),

    #[error("Unknown search parameter '{parameter}' on {resource_type}")]
    UnknownSearchParameter {
        parameter: String,
        resource_type: String,
    },

    #[error("Parameter '{parameter}' on {resource_type} is not a reference and cannot be chained")]
    ChainRequiresReference {
        parameter: String,
        resource_type: String,
    },

    #[error("Reference parameter '{parameter}' does not support target type {target}")]
    UnsupportedTargetType { parameter: String, target: String },

    #[error("No target of reference parameter '{parameter}' supports chained parameter '{chained}'")]
    NoChainTarget { parameter: String, chained: String },

    #[error("Unknown modifier ':{modifier}'")]
    UnknownModifier { modifier: String },

    #[error("Modifier ':{modifier}' is not valid for {param_type} parameter '{parameter}'")]
    InvalidModifierForType {
        modifier: SearchModifier,
        param_type: SearchParameterType,
        parameter: String,
    },

    #[error("Comparator '{prefix}' is not valid for {param_type} parameter '{parameter}'")]
    InvalidComparatorForType {
        prefix: SearchPrefix,
        param_type: SearchParameterType,
        parameter: String,
    },

    #[error("Malformed parameter key '{key}': {reason}")]
    MalformedModifierSyntax { key: String, reason: String },

    #[error("Comparator '{prefix}' cannot be combined with multiple values for '{parameter}'")]
    MultiValueWithComparator {
        parameter: String,
        prefix: SearchPrefix,
    },

    #[error("Value '{value}' for '{parameter}:missing' must be 'true' or 'false'")]
    InvalidMissingLiteral { parameter: String, value: String },

    #[error("Invalid value for '{parameter}': {message}")]
    InvalidSearchValue { parameter: String, message: String },

    #[error("Chained key '{key}' exceeds the maximum chain depth of {max_depth}")]
    ChainTooDeep { key: String, max_depth: usize },
}

impl SearchError {
    pub fn unknown_parameter(parameter: impl Into<String>, resource_type: impl Into<String>) -> Self {
        Self::UnknownSearchParameter {
            parameter: parameter.into(),
            resource_type: resource_type.into(),
        }
    }

    pub fn invalid_value(parameter: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidSearchValue {
            parameter: parameter.into(),
            message: message.into(),
        }
    }

    pub fn malformed_key(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedModifierSyntax {
            key: key.into(),
            reason: reason.into(),
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            Self::UnknownResourceType(_) => ErrorCode::UnknownResourceType,
            Self::UnknownSearchParameter { .. } => ErrorCode::UnknownSearchParameter,
            Self::ChainRequiresReference { .. } => ErrorCode::ChainRequiresReference,
            Self::UnsupportedTargetType { .. } | Self::NoChainTarget { .. } => {
                ErrorCode::UnsupportedTargetType
            }
            Self::UnknownModifier { .. } => ErrorCode::UnknownModifier,
            Self::InvalidModifierForType { .. } => ErrorCode::InvalidModifierForType,
            Self::InvalidComparatorForType { .. } => ErrorCode::InvalidComparatorForType,
            Self::MalformedModifierSyntax { .. } => ErrorCode::MalformedModifierSyntax,
            Self::MultiValueWithComparator { .. } => ErrorCode::MultiValueWithComparator,
            Self::InvalidMissingLiteral { .. } => ErrorCode::InvalidMissingLiteral,
            Self::InvalidSearchValue { .. } => ErrorCode::InvalidSearchValue,
            Self::ChainTooDeep { .. } => ErrorCode::ChainTooDeep,
        }
    }

    /// Whether the error should map to a 400-class response.
    pub fn is_client_error(&self) -> bool {
        true
    }
}
