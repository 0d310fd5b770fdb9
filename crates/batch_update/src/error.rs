use crate::handle::HandleError;
use std::fmt;

/// Failure while applying one descriptor key to one element.
///
/// These never escape the applier; they are logged and counted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ApplyError {
    /// The value has the wrong shape for the operation the key names.
    InvalidValue { key: String, expected: &'static str },
    /// No rule accepts the value (non-primitive with no matching member).
    UnsupportedValue { key: String, kind: &'static str },
    /// The host rejected the mutation.
    Handle { key: String, source: HandleError },
}

impl ApplyError {
    pub fn key(&self) -> &str {
        match self {
            ApplyError::InvalidValue { key, .. }
            | ApplyError::UnsupportedValue { key, .. }
            | ApplyError::Handle { key, .. } => key,
        }
    }
}

impl fmt::Display for ApplyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApplyError::InvalidValue { key, expected } => {
                write!(f, "'{key}': expected {expected}")
            }
            ApplyError::UnsupportedValue { key, kind } => {
                write!(f, "'{key}': no handler accepts a {kind} value")
            }
            ApplyError::Handle { key, source } => write!(f, "'{key}': {source}"),
        }
    }
}

impl std::error::Error for ApplyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ApplyError::Handle { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// The inputs of a collection update are unusable as a whole.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum StructuralInputError {
    MissingCollection,
    DescriptorNotObject,
    MissingApplyFn,
}

impl fmt::Display for StructuralInputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StructuralInputError::MissingCollection => f.write_str("no collection supplied"),
            StructuralInputError::DescriptorNotObject => {
                f.write_str("update descriptor must be a map")
            }
            StructuralInputError::MissingApplyFn => f.write_str("no apply function supplied"),
        }
    }
}

impl std::error::Error for StructuralInputError {}
