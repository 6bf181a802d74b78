use thiserror::Error;

/// Outcome of a pipeline stage that did not produce a result.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    /// The cancellation flag was observed between two work chunks.
    #[error("pipeline run was cancelled")]
    Cancelled,
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("degenerate input: {0}")]
    DegenerateInput(String),
    /// A pixel still belongs to a deleted facet and no live orthogonal
    /// neighbour was available to absorb it.
    #[error("facet {facet} left pixel ({x}, {y}) without a live owner")]
    InconsistentState { facet: usize, x: usize, y: usize },
    #[error("image buffer error: {0}")]
    Image(String),
}

impl PipelineError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }
}
