use thiserror::Error;

/// Result alias for `hegemony`.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by network construction, detection and aggregation.
#[derive(Debug, Error)]
pub enum Error {
    /// Input was empty.
    #[error("empty input provided")]
    EmptyInput,

    /// Invalid parameter value.
    #[error("invalid parameter '{name}': {message}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Error message.
        message: String,
    },

    /// A centrality kind or detection algorithm that does not exist.
    #[error("unimplemented {kind} method '{name}'")]
    Unimplemented {
        /// What was being resolved ("centrality", "community detection").
        kind: &'static str,
        /// The requested name.
        name: String,
    },

    /// A measure evaluated on a graph it is not defined for.
    #[error("{measure} is undefined: {reason}")]
    UndefinedMeasure {
        /// Measure name.
        measure: &'static str,
        /// Why it cannot be computed.
        reason: &'static str,
    },

    /// Iterative method did not converge within its iteration limit.
    #[error("did not converge after {iterations} iterations")]
    ConvergenceFailure {
        /// Number of iterations attempted.
        iterations: usize,
    },

    /// A country outside the analysis vocabulary.
    #[error("country '{0}' is not in the vocabulary")]
    UnknownCountry(String),

    /// A computation produced NaN or infinity.
    #[error("non-finite value in {what}")]
    NonFiniteValue {
        /// Where the value appeared.
        what: &'static str,
    },

    /// Filesystem failure.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Malformed CSV input or output failure.
    #[error(transparent)]
    Csv(#[from] csv::Error),

    /// Malformed JSON input or output failure.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn invalid(name: &'static str, message: impl Into<String>) -> Self {
        Error::InvalidParameter {
            name,
            message: message.into(),
        }
    }

    /// Whether this error concerns configuration rather than data.
    ///
    /// Configuration errors abort a run regardless of the failure policy.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::InvalidParameter { .. } | Error::Unimplemented { .. }
        )
    }
}
