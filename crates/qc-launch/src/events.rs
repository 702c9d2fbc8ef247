/// Something the game launcher reported
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchEvent {
    /// Diagnostic output (stderr of the launcher process)
    Debug(String),
    /// Game output
    Data(String),
    /// Download or verification progress
    Progress {
        category: String,
        task: u64,
        total: u64,
    },
    /// The process ended; `None` when it was killed by a signal
    Exited { code: Option<i32> },
}

impl LaunchEvent {
    /// Parse one stdout line; `progress <category> <task> <total>` becomes
    /// [`LaunchEvent::Progress`], anything else is [`LaunchEvent::Data`].
    pub fn from_stdout_line(line: String) -> Self {
        match parse_progress(&line) {
            Some(progress) => progress,
            None => Self::Data(line),
        }
    }

    /// Rounded completion percentage of a progress event
    pub fn percent(&self) -> Option<u64> {
        match self {
            Self::Progress { task, total, .. } if *total > 0 => {
                // Counts come from an external process; widen so huge values cannot overflow
                let task = u128::from((*task).min(*total));
                let total = u128::from(*total);
                Some(((task * 100 + total / 2) / total) as u64)
            }
            _ => None,
        }
    }

    /// One-line description for the activity log
    pub fn describe(&self) -> String {
        match self {
            Self::Debug(message) | Self::Data(message) => message.clone(),
            Self::Progress { category, .. } => format!(
                "Downloading: {} - {}%",
                category,
                self.percent().unwrap_or(0)
            ),
            Self::Exited { code: Some(code) } => format!("Game closed (code: {})", code),
            Self::Exited { code: None } => "Game closed (terminated by signal)".to_string(),
        }
    }
}

fn parse_progress(line: &str) -> Option<LaunchEvent> {
    let mut parts = line.split_whitespace();
    if parts.next()? != "progress" {
        return None;
    }

    let category = parts.next()?.to_string();
    let task = parts.next()?.parse().ok()?;
    let total = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }

    Some(LaunchEvent::Progress {
        category,
        task,
        total,
    })
}
