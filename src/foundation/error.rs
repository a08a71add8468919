/// Result alias used throughout the crate.
pub type ShapeResult<T> = Result<T, ShapeError>;

/// Errors surfaced by loading, evaluating or rendering a scene graph.
#[derive(thiserror::Error, Debug)]
pub enum ShapeError {
    /// Malformed attribute program: unknown opcode, stack or constant underflow.
    ///
    /// Always fatal for the frame being rendered.
    #[error("dsl error: {0}")]
    Dsl(String),

    /// A value had the wrong shape for the operation applied to it.
    #[error("evaluation error: {0}")]
    Evaluation(String),

    /// The scene document could not be turned into a graph.
    #[error("document error: {0}")]
    Document(String),

    /// A renderer rejected a draw call.
    #[error("render error: {0}")]
    Render(String),

    /// Anything else (I/O, image encoding, ...).
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ShapeError {
    /// Build a [`ShapeError::Dsl`].
    pub fn dsl(msg: impl Into<String>) -> Self {
        Self::Dsl(msg.into())
    }

    /// Build a [`ShapeError::Evaluation`].
    pub fn evaluation(msg: impl Into<String>) -> Self {
        Self::Evaluation(msg.into())
    }

    /// Build a [`ShapeError::Document`].
    pub fn document(msg: impl Into<String>) -> Self {
        Self::Document(msg.into())
    }

    /// Build a [`ShapeError::Render`].
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Prefix the message with the node/attribute the error came from.
    ///
    /// Only message-carrying variants are rewritten; `Other` is returned untouched.
    pub fn at(self, location: impl std::fmt::Display) -> Self {
        match self {
            Self::Dsl(m) => Self::Dsl(format!("{location}: {m}")),
            Self::Evaluation(m) => Self::Evaluation(format!("{location}: {m}")),
            Self::Document(m) => Self::Document(format!("{location}: {m}")),
            Self::Render(m) => Self::Render(format!("{location}: {m}")),
            other @ Self::Other(_) => other,
        }
    }

    /// Return `true` for errors raised by the attribute language itself.
    pub fn is_dsl(&self) -> bool {
        matches!(self, Self::Dsl(_))
    }
}
