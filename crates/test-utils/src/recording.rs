use grainflow::dag::Executable;
use grainflow::errors::{GrainflowError, Result};

/// Context for [`RecordingAction`]: the ids of every action that ran.
#[derive(Debug, Default)]
pub struct ActionLog {
    pub executed: Vec<String>,
}

/// An action that only records itself, or fails when asked to.
#[derive(Debug, Clone)]
pub struct RecordingAction {
    id: String,
    fail: bool,
}

impl RecordingAction {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            fail: false,
        }
    }

    pub fn failing(id: &str) -> Self {
        Self {
            id: id.to_string(),
            fail: true,
        }
    }
}

impl Executable<ActionLog> for RecordingAction {
    fn id(&self) -> &str {
        &self.id
    }

    fn execute(&self, ctx: &mut ActionLog) -> Result<()> {
        if self.fail {
            return Err(GrainflowError::InvalidTransition(format!(
                "action '{}' failed on purpose",
                self.id
            )));
        }
        ctx.executed.push(self.id.clone());
        Ok(())
    }
}
