// src/workflow/archive.rs
//
// Only one unarchived working set exists at a time; archiving snapshots all
// of it, so the controller never needs to know which run it belongs to.

use tracing::info;

use crate::error::{DeskError, DeskResult};
use crate::models::MessageResp;

pub const NOTHING_TO_ARCHIVE: &str = "There are no payroll results to archive.";
pub const ARCHIVE_FAILED: &str = "Failed to archive payroll run.";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ArchiveState {
    #[default]
    Closed,
    Naming { run_name: String },
    Archiving { run_name: String },
}

#[derive(Debug, Default)]
pub struct ArchiveController {
    state: ArchiveState,
}

impl ArchiveController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &ArchiveState {
        &self.state
    }

    pub fn is_open(&self) -> bool {
        !matches!(self.state, ArchiveState::Closed)
    }

    /// Confirm is disabled while a submission is in flight.
    pub fn confirm_enabled(&self) -> bool {
        matches!(self.state, ArchiveState::Naming { .. })
    }

    pub fn open(&mut self, working_set_len: usize) -> DeskResult<()> {
        if working_set_len == 0 {
            return Err(DeskError::validation(NOTHING_TO_ARCHIVE));
        }
        if let ArchiveState::Closed = self.state {
            self.state = ArchiveState::Naming { run_name: String::new() };
        }
        Ok(())
    }

    pub fn set_name(&mut self, name: &str) -> DeskResult<()> {
        match &mut self.state {
            ArchiveState::Naming { run_name } => {
                *run_name = name.to_string();
                Ok(())
            }
            ArchiveState::Archiving { .. } => Err(DeskError::Busy("archive in progress")),
            ArchiveState::Closed => Err(DeskError::validation("The archive dialog is not open.")),
        }
    }

    pub fn cancel(&mut self) -> DeskResult<()> {
        match self.state {
            ArchiveState::Archiving { .. } => Err(DeskError::Busy("archive in progress")),
            _ => {
                self.state = ArchiveState::Closed;
                Ok(())
            }
        }
    }

    /// `naming -> archiving`. Returns the name to submit.
    pub fn begin_confirm(&mut self, working_set_len: usize) -> DeskResult<String> {
        let run_name = match &self.state {
            ArchiveState::Naming { run_name } => run_name.clone(),
            ArchiveState::Archiving { .. } => return Err(DeskError::Busy("archive in progress")),
            ArchiveState::Closed => {
                return Err(DeskError::validation("The archive dialog is not open."))
            }
        };
        if working_set_len == 0 {
            return Err(DeskError::validation(NOTHING_TO_ARCHIVE));
        }
        self.state = ArchiveState::Archiving { run_name: run_name.clone() };
        Ok(run_name)
    }

    /// `archiving -> closed` on success, back to `naming` (same name) on failure.
    pub fn finish(&mut self, outcome: DeskResult<MessageResp>) -> DeskResult<String> {
        let run_name = match std::mem::take(&mut self.state) {
            ArchiveState::Archiving { run_name } => run_name,
            other => {
                self.state = other;
                return Err(DeskError::validation("No archive submission is in flight."));
            }
        };
        match outcome {
            Ok(resp) => {
                info!(%run_name, "working set archived");
                Ok(resp.message)
            }
            Err(e) => {
                self.state = ArchiveState::Naming { run_name };
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_working_set_cannot_open() {
        let mut c = ArchiveController::new();
        let err = c.open(0).unwrap_err();
        assert_eq!(err.user_message(""), NOTHING_TO_ARCHIVE);
        assert_eq!(c.state(), &ArchiveState::Closed);
        assert!(!c.is_open());
    }

    #[test]
    fn cancel_closes_the_dialog_while_naming() {
        let mut c = ArchiveController::new();
        c.open(3).unwrap();
        assert!(c.is_open());
        c.set_name("Draft").unwrap();
        c.cancel().unwrap();
        assert!(!c.is_open());
        assert!(c.set_name("Late").unwrap_err().is_validation());
    }

    #[test]
    fn double_confirm_is_refused() {
        let mut c = ArchiveController::new();
        c.open(2).unwrap();
        c.set_name("June 2025").unwrap();
        assert_eq!(c.begin_confirm(2).unwrap(), "June 2025");
        assert!(!c.confirm_enabled());
        assert!(matches!(c.begin_confirm(2), Err(DeskError::Busy(_))));
        assert!(matches!(c.cancel(), Err(DeskError::Busy(_))));
        assert!(c.is_open());
    }

    #[test]
    fn failure_reopens_with_same_name() {
        let mut c = ArchiveController::new();
        c.open(1).unwrap();
        c.set_name("July").unwrap();
        c.begin_confirm(1).unwrap();
        let err = c
            .finish(Err(DeskError::Service { status: 500, message: None }))
            .unwrap_err();
        assert_eq!(err.user_message(ARCHIVE_FAILED), ARCHIVE_FAILED);
        assert_eq!(c.state(), &ArchiveState::Naming { run_name: "July".into() });
        assert!(c.confirm_enabled());
    }

    #[test]
    fn success_closes_and_returns_server_message() {
        let mut c = ArchiveController::new();
        c.open(1).unwrap();
        c.begin_confirm(1).unwrap();
        let msg = c.finish(Ok(MessageResp { message: "Archived.".into() })).unwrap();
        assert_eq!(msg, "Archived.");
        assert_eq!(c.state(), &ArchiveState::Closed);
    }

    #[test]
    fn confirm_rechecks_emptiness() {
        let mut c = ArchiveController::new();
        c.open(1).unwrap();
        assert!(c.begin_confirm(0).unwrap_err().is_validation());
        assert!(c.confirm_enabled());
    }
}
