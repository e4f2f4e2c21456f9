use std::fmt;

use crate::overlap::UnknownOverlapMode;

/// Raised only under `UnknownPolicy::Reject`; the default policy degrades
/// to a warning instead.
#[derive(Debug, Clone, PartialEq)]
pub enum CompileError {
    UnknownTimePeriod(String),
    UnknownRegion(String),
    UnknownOverlap(UnknownOverlapMode),
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileError::UnknownTimePeriod(name) => write!(f, "unknown time period: {name}"),
            CompileError::UnknownRegion(name) => write!(f, "unknown region: {name}"),
            CompileError::UnknownOverlap(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for CompileError {}

impl From<UnknownOverlapMode> for CompileError {
    fn from(e: UnknownOverlapMode) -> Self {
        CompileError::UnknownOverlap(e)
    }
}

#[derive(Debug)]
pub enum ParamsError {
    Json(serde_json::Error),
    NoObject,
}

impl fmt::Display for ParamsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamsError::Json(e) => write!(f, "invalid parameter JSON: {e}"),
            ParamsError::NoObject => write!(f, "no JSON object found in response"),
        }
    }
}

impl std::error::Error for ParamsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ParamsError::Json(e) => Some(e),
            ParamsError::NoObject => None,
        }
    }
}

impl From<serde_json::Error> for ParamsError {
    fn from(e: serde_json::Error) -> Self {
        ParamsError::Json(e)
    }
}
