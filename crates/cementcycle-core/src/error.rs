use thiserror::Error;

/// Errors raised by the scoring engine.
///
/// Scoring is total over its inputs apart from location lookup: unknown
/// materials and grades fall back to catalog defaults, unknown cities do not.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ScoringError {
    #[error("Unknown location '{name}' (known: {known})")]
    UnknownLocation { name: String, known: String },
}
