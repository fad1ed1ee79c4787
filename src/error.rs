//! Error types for template compilation and rendering.

use std::path::PathBuf;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by the compiler, the cache gate and the evaluator.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A directive name passed to [`Compiler::directive`] violates the
    /// `name` / `name::sub` naming pattern. Raised at registration time.
    ///
    /// [`Compiler::directive`]: crate::Compiler::directive
    #[error(
        "the directive name [{name}] is not valid; directive names must only contain alphanumeric characters and underscores"
    )]
    InvalidDirectiveName { name: String },

    /// A component tag could not be resolved to a registered class or an
    /// anonymous component view. Raised at compile time for static tags and
    /// at render time for dynamic components.
    #[error("unable to locate a class or view for component [{tag}]")]
    UnresolvedComponent { tag: String },

    /// A view name could not be resolved to a template file.
    #[error("view [{name}] not found")]
    ViewNotFound { name: String },

    /// A `check('name', ...)` call referenced a condition that was never
    /// registered.
    #[error("unknown condition [{name}]")]
    UnknownCondition { name: String },

    /// The compiled artifact or an expression inside it failed to parse.
    #[error("syntax error: {message}")]
    Syntax { message: String },

    /// A fault raised while evaluating a compiled artifact.
    #[error("{message}")]
    Eval { message: String },

    /// A runtime fault augmented with the innermost in-flight template path.
    #[error("{source} (view: {view})")]
    View {
        view: PathBuf,
        #[source]
        source: Box<Error>,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Builds a syntax error from anything displayable.
    pub(crate) fn syntax(message: impl Into<String>) -> Self {
        Error::Syntax {
            message: message.into(),
        }
    }

    /// Builds an evaluation error from anything displayable.
    pub(crate) fn eval(message: impl Into<String>) -> Self {
        Error::Eval {
            message: message.into(),
        }
    }
}
