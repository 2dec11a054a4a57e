use thiserror::Error;

/// Failure while folding the Markdown event stream into a syntax tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MarkdownParseError {
    #[error("mismatched end of element: expected {expected}, found {found}")]
    MismatchedEnd { expected: String, found: String },

    #[error("end of {0} without a matching start")]
    UnexpectedEnd(String),

    #[error("{0} element(s) still open at end of input")]
    Unclosed(usize),
}
