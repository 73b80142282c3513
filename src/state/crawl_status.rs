/// Crawl session status definitions
///
/// A session moves `Created -> Running -> {Completed | Stopped | Failed}`.
/// A session stopped before it ever ran goes straight from `Created` to
/// `Stopped`. The three end states are terminal.
use serde::{Deserialize, Serialize};
use std::fmt;

/// Represents the lifecycle state of a crawl session
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CrawlStatus {
    // ===== Active States =====
    /// Queue and tree allocated, workers not yet started
    Created,

    /// Workers and discovery producer running
    Running,

    // ===== Terminal States =====
    /// Discovery finished on its own and every worker drained the queue
    Completed,

    /// A stop was requested; the tree holds whatever was inserted until then
    Stopped,

    /// Discovery failed; the tree holds whatever was inserted until then
    Failed(String),
}

impl CrawlStatus {
    /// Returns true if this is a terminal state (the session will not change again)
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Created | Self::Running)
    }

    /// Returns true if the session may still insert into its tree
    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }

    /// Returns true if moving from this state to `next` is a legal transition
    pub fn can_transition_to(&self, next: &CrawlStatus) -> bool {
        match (self, next) {
            (Self::Created, Self::Running) | (Self::Created, Self::Stopped) => true,
            (Self::Running, next) => next.is_terminal(),
            _ => false,
        }
    }

    /// Short lowercase name, without any failure detail
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Stopped => "stopped",
            Self::Failed(_) => "failed",
        }
    }
}

impl fmt::Display for CrawlStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Failed(reason) => write!(f, "failed: {}", reason),
            other => write!(f, "{}", other.as_str()),
        }
    }
}
