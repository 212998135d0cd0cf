use crate::position::Position;
use crate::todo::TodoId;

/// Why an edit could not be applied. A failed edit leaves the buffer as it
/// was.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EditError {
    #[error("no todo item with id {0}; the document may have changed since discovery")]
    InvalidTarget(TodoId),
    #[error("position {0} is outside the document")]
    OutOfBounds(Position),
    #[error("row {0} is outside the document")]
    RowOutOfBounds(usize),
    #[error("{0}")]
    Rejected(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransactionError {
    /// Operations before `index` stay applied; later ones never ran.
    #[error("transaction operation #{index} failed: {source}")]
    OperationFailed {
        index: usize,
        #[source]
        source: EditError,
    },
}

impl TransactionError {
    /// The edit error behind the failure.
    pub fn edit_error(&self) -> &EditError {
        match self {
            TransactionError::OperationFailed { source, .. } => source,
        }
    }
}

impl From<TransactionError> for EditError {
    fn from(e: TransactionError) -> Self {
        match e {
            TransactionError::OperationFailed { source, .. } => source,
        }
    }
}
