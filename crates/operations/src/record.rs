use std::time::Instant;
use tokio_util::sync::CancellationToken;

/// The single record kept per operation key. A missing entry means no analysis.
#[derive(Debug, Clone)]
pub enum OperationRecord {
    Running {
        progress: String,
        cancel: CancellationToken,
        generation: u64,
        started_at: Instant,
    },
    Completed {
        result: String,
    },
    Failed {
        message: String,
    },
    Cancelled {
        note: String,
    },
}

impl OperationRecord {
    pub fn state_name(&self) -> &'static str {
        match self {
            Self::Running { .. } => "running",
            Self::Completed { .. } => "completed",
            Self::Failed { .. } => "failed",
            Self::Cancelled { .. } => "cancelled",
        }
    }
}

/// Record counts per state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OperationSnapshot {
    pub running: usize,
    pub completed: usize,
    pub failed: usize,
    pub cancelled: usize,
}
