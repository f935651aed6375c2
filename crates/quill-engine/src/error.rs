use thiserror::Error;

use crate::backend::BackendError;

/// Which transform stack an operation targeted.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum StackKind {
    Modelview,
    Projection,
}

impl std::fmt::Display for StackKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StackKind::Modelview => f.write_str("modelview"),
            StackKind::Projection => f.write_str("projection"),
        }
    }
}

/// Errors surfaced by the journal and its stacks.
///
/// Logic errors (`StackUnderflow`) leave state untouched and are also logged.
/// Resource errors abort the current operation.
#[derive(Debug, Error)]
pub enum QuillError {
    #[error("{stack} stack underflow: pop without matching push")]
    StackUnderflow { stack: StackKind },

    #[error("out of memory growing the vertex buffer by {words} words")]
    OutOfMemory { words: usize },

    #[error(transparent)]
    Backend(#[from] BackendError),
}

pub type Result<T, E = QuillError> = std::result::Result<T, E>;
