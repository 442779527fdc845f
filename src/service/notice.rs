use crate::error::NoteError;
use serde::{Deserialize, Serialize};

/// User-facing actions that can produce a notice.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    SaveNote,
    LoadNote,
    DeleteNote,
    ListNotes,
    UpdateRecord,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

/// A short, transient message for the user (toast/snackbar).
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }

    /// Notice for an action's outcome. Successful reads are silent.
    pub fn for_outcome<T>(action: Action, outcome: &Result<T, NoteError>) -> Option<Self> {
        match outcome {
            Ok(_) => match action {
                Action::SaveNote => Some(Self::info("Note saved successfully")),
                Action::DeleteNote => Some(Self::info("Note deleted successfully")),
                Action::LoadNote | Action::ListNotes | Action::UpdateRecord => None,
            },
            Err(e) => Some(Self::for_error(action, e)),
        }
    }

    pub fn for_error(action: Action, e: &NoteError) -> Self {
        match e {
            // Precondition messages are already phrased for the user.
            NoteError::Validation(msg) => Self::error(msg.clone()),
            NoteError::Unauthenticated => Self::error(e.to_string()),
            _ => {
                let verb = match action {
                    Action::SaveNote => "saving note",
                    Action::LoadNote => "loading note",
                    Action::DeleteNote => "deleting note",
                    Action::ListNotes => "loading notes",
                    Action::UpdateRecord => "updating record",
                };
                Self::error(format!("Error {verb}: {e}"))
            }
        }
    }
}
