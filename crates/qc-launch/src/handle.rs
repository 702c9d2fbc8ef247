use qc_core::ActivityLog;
use tokio::sync::mpsc;
use tracing::debug;

use crate::errors::{LaunchError, Result};
use crate::events::LaunchEvent;

const EVENT_BUFFER: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaunchOutcome {
    pub exit_code: Option<i32>,
}

impl LaunchOutcome {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Receiving side of a running launch
///
/// Events arrive in the order the launcher produced them and end with
/// [`LaunchEvent::Exited`]. Every event is mirrored to the activity log
/// when one is attached.
#[derive(Debug)]
pub struct LaunchHandle {
    events: mpsc::Receiver<LaunchEvent>,
    activity: Option<ActivityLog>,
    exit_code: Option<Option<i32>>,
}

impl LaunchHandle {
    /// A handle and the sender a launcher feeds it through
    pub fn channel() -> (mpsc::Sender<LaunchEvent>, Self) {
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        let handle = Self {
            events: rx,
            activity: None,
            exit_code: None,
        };
        (tx, handle)
    }

    pub fn with_activity_log(mut self, activity: ActivityLog) -> Self {
        self.activity = Some(activity);
        self
    }

    /// Next event, `None` once the launcher has finished reporting
    pub async fn next_event(&mut self) -> Option<LaunchEvent> {
        if self.exit_code.is_some() {
            return None;
        }

        let event = self.events.recv().await?;
        debug!(?event, "launch event");

        if let Some(activity) = &self.activity {
            activity.append(&event.describe()).await;
        }
        if let LaunchEvent::Exited { code } = event {
            self.exit_code = Some(code);
        }

        Some(event)
    }

    /// Drain the remaining events and return how the game ended
    pub async fn wait(mut self) -> Result<LaunchOutcome> {
        while self.next_event().await.is_some() {}

        self.exit_code
            .map(|exit_code| LaunchOutcome { exit_code })
            .ok_or(LaunchError::ProcessLost)
    }
}
