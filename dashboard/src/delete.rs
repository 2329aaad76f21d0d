use crate::session::Dashboard;
use crate::state::StateUpdate;

pub const DELETE_PROMPT: &str = "Delete all logs? This cannot be undone.";

/// Yes/no prompt shown before anything destructive happens.
pub trait Confirm {
    fn confirm(&self, prompt: &str) -> bool;
}

impl<F> Confirm for F
where
    F: Fn(&str) -> bool,
{
    fn confirm(&self, prompt: &str) -> bool {
        self(prompt)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    Declined,
    /// Logged; the collection is unchanged.
    Failed,
}

impl Dashboard {
    /// Deletes every log on the service once `confirm` agrees, then empties
    /// the collection and goes back to the first page.
    pub async fn delete_all(&self, confirm: &impl Confirm) -> DeleteOutcome {
        if !confirm.confirm(DELETE_PROMPT) {
            return DeleteOutcome::Declined;
        }

        match self.service.delete_logs(self.delete_token.as_deref()).await {
            Ok(()) => {
                self.apply(StateUpdate::Cleared).await;
                tracing::info!("all logs deleted");
                DeleteOutcome::Deleted
            }
            Err(err) => {
                tracing::error!("failed to delete logs: {err}");
                DeleteOutcome::Failed
            }
        }
    }
}
