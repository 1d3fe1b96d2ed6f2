use std::fmt;

use serde::Serialize;

/// Lifecycle position of one file in a batch.
///
/// ```text
/// Discovered → SchemaExplored → Validated → Preprocessed → Exported → Done
///                                   └──────→ Rejected
/// any non-terminal state ──────────────────→ Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileState {
    /// Listed as an input
    Discovered,
    /// Schema report produced
    SchemaExplored,
    /// Validation report produced
    Validated,
    /// Cleaned tables produced
    Preprocessed,
    /// Refused after validation
    Rejected,
    /// Artifacts written
    Exported,
    /// Finished successfully
    Done,
    /// Aborted by an error or cancellation
    Failed,
}

impl FileState {
    /// Whether no further transition is possible
    pub fn is_terminal(self) -> bool {
        matches!(self, FileState::Done | FileState::Failed | FileState::Rejected)
    }

    /// Whether moving from `self` to `next` is a legal step
    pub fn can_transition_to(self, next: FileState) -> bool {
        use FileState::*;
        match (self, next) {
            (from, Failed) => !from.is_terminal(),
            (Discovered, SchemaExplored)
            | (SchemaExplored, Validated)
            | (Validated, Preprocessed)
            | (Validated, Rejected)
            | (Preprocessed, Exported)
            | (Exported, Done) => true,
            _ => false,
        }
    }
}

impl fmt::Display for FileState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FileState::Discovered => "discovered",
            FileState::SchemaExplored => "schema_explored",
            FileState::Validated => "validated",
            FileState::Preprocessed => "preprocessed",
            FileState::Rejected => "rejected",
            FileState::Exported => "exported",
            FileState::Done => "done",
            FileState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Stable reason code of a rejected or failed file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// Corrupt, truncated or unsupported container
    Unreadable,
    /// Time, position or pressure variable absent
    MissingMandatoryFields,
    /// Latitude or longitude outside the configured bounds
    InvalidPosition,
    /// A category the pipeline does not turn into profile tables (trajectory files)
    UnsupportedFileType,
    /// The batch was cancelled before the file finished
    Cancelled,
    /// The preprocessor returned an error
    PreprocessError,
    /// Writing the artifacts failed
    WriteFailed,
    /// Another input of the batch already claims the same result directory
    DuplicateOutput,
    /// A worker panicked while processing the file
    InternalError,
}

impl FailureReason {
    /// Snake-case code
    pub fn code(self) -> &'static str {
        match self {
            FailureReason::Unreadable => "unreadable",
            FailureReason::MissingMandatoryFields => "missing_mandatory_fields",
            FailureReason::InvalidPosition => "invalid_position",
            FailureReason::UnsupportedFileType => "unsupported_file_type",
            FailureReason::Cancelled => "cancelled",
            FailureReason::PreprocessError => "preprocess_error",
            FailureReason::WriteFailed => "write_failed",
            FailureReason::DuplicateOutput => "duplicate_output",
            FailureReason::InternalError => "internal_error",
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Final outcome of one file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileStatus {
    /// All artifacts written
    Done,
    /// Refused on validation grounds
    Rejected {
        /// Reason code
        reason: FailureReason,
        /// Human-readable explanation
        detail: String,
    },
    /// Aborted by an error
    Failed {
        /// Reason code
        reason: FailureReason,
        /// Human-readable explanation
        detail: String,
    },
}

impl FileStatus {
    /// Reason code, `None` for [`FileStatus::Done`]
    pub fn reason(&self) -> Option<FailureReason> {
        match self {
            FileStatus::Done => None,
            FileStatus::Rejected { reason, .. } | FileStatus::Failed { reason, .. } => Some(*reason),
        }
    }

    /// Whether the file finished successfully
    pub fn is_done(&self) -> bool {
        matches!(self, FileStatus::Done)
    }

    /// Whether the file was rejected
    pub fn is_rejected(&self) -> bool {
        matches!(self, FileStatus::Rejected { .. })
    }

    /// Whether the file failed
    pub fn is_failed(&self) -> bool {
        matches!(self, FileStatus::Failed { .. })
    }
}

impl fmt::Display for FileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileStatus::Done => f.write_str("done"),
            FileStatus::Rejected { reason, detail } => write!(f, "rejected ({}): {}", reason, detail),
            FileStatus::Failed { reason, detail } => write!(f, "failed ({}): {}", reason, detail),
        }
    }
}

/// Ordered record of the states a file went through
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct StateHistory {
    states: Vec<FileState>,
}

impl Default for StateHistory {
    fn default() -> Self {
        Self {
            states: vec![FileState::Discovered],
        }
    }
}

impl StateHistory {
    /// Current state
    pub fn current(&self) -> FileState {
        self.states.last().copied().unwrap_or(FileState::Discovered)
    }

    /// Every state in order, starting with [`FileState::Discovered`]
    pub fn states(&self) -> &[FileState] {
        &self.states
    }

    /// Move to `next`, returning `false` (and staying put) on an illegal step
    pub fn advance(&mut self, next: FileState) -> bool {
        if self.current().can_transition_to(next) {
            self.states.push(next);
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path_transitions() {
        let mut history = StateHistory::default();
        for next in [
            FileState::SchemaExplored,
            FileState::Validated,
            FileState::Preprocessed,
            FileState::Exported,
            FileState::Done,
        ] {
            assert!(history.advance(next), "{} -> {}", history.current(), next);
        }
        assert!(history.current().is_terminal());
        assert_eq!(history.states().len(), 6);
    }

    #[test]
    fn test_illegal_transitions() {
        assert!(!FileState::Discovered.can_transition_to(FileState::Validated));
        assert!(!FileState::SchemaExplored.can_transition_to(FileState::Rejected));
        assert!(!FileState::Preprocessed.can_transition_to(FileState::Rejected));
        assert!(!FileState::Done.can_transition_to(FileState::Failed));
        assert!(!FileState::Rejected.can_transition_to(FileState::Exported));
        assert!(FileState::Exported.can_transition_to(FileState::Failed));

        let mut history = StateHistory::default();
        assert!(!history.advance(FileState::Exported));
        assert_eq!(history.current(), FileState::Discovered);
    }

    #[test]
    fn test_status_serialization() {
        let status = FileStatus::Rejected {
            reason: FailureReason::InvalidPosition,
            detail: "longitude 200 out of range".to_string(),
        };
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["status"], "rejected");
        assert_eq!(json["reason"], "invalid_position");
        assert_eq!(serde_json::to_value(FileStatus::Done).unwrap()["status"], "done");
    }
}
