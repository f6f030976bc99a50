use thiserror::Error;

/// Errors raised by the search engines.
///
/// Depth or deadline exhaustion is normal termination and never shows up
/// here.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SearchError {
    /// The root state cannot be searched (terminal, or no legal actions).
    #[error("Invalid search start: {0}")]
    InvalidSearchStart(&'static str),

    /// The MCTS root finished its budget without a single child.
    #[error("Search space is empty: root has no children")]
    EmptySearchSpace,

    /// `expand` returned no outcomes, or probabilities that are not a
    /// distribution.
    #[error("Malformed stochastic expansion: {outcomes} outcomes with total probability {total}")]
    MalformedStochasticExpansion { outcomes: usize, total: f64 },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Convenience Result type for search operations.
pub type Result<T> = std::result::Result<T, SearchError>;
