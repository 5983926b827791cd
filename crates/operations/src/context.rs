use crate::error::OperationError;
use crate::manager::SharedRegistry;
use crate::record::OperationRecord;
use repolens_protocol::OperationKey;
use tokio_util::sync::CancellationToken;

/// Handle given to a unit of work: progress reporting and the cancellation signal.
///
/// Progress writes are dropped once the run has been superseded, so a slow
/// cancelled run can never overwrite the record of a newer one.
#[derive(Clone)]
pub struct OperationContext {
    key: OperationKey,
    generation: u64,
    cancel: CancellationToken,
    registry: SharedRegistry,
}

impl OperationContext {
    pub(crate) fn new(
        key: OperationKey,
        generation: u64,
        cancel: CancellationToken,
        registry: SharedRegistry,
    ) -> Self {
        Self {
            key,
            generation,
            cancel,
            registry,
        }
    }

    pub fn key(&self) -> &OperationKey {
        &self.key
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// `Err(Cancelled)` once cancellation was requested
    pub fn check_cancelled(&self) -> Result<(), OperationError> {
        if self.cancel.is_cancelled() {
            Err(OperationError::Cancelled)
        } else {
            Ok(())
        }
    }

    pub async fn set_progress(&self, text: impl Into<String>) {
        let text = text.into();
        let mut registry = self.registry.lock().await;
        match registry.records.get_mut(&self.key) {
            Some(OperationRecord::Running {
                progress,
                generation,
                ..
            }) if *generation == self.generation => {
                log::debug!("{}: {}", self.key, text);
                *progress = text;
            }
            _ => log::debug!("Ignoring progress for superseded run of {}", self.key),
        }
    }

    pub(crate) async fn settle(&self, outcome: &Result<String, OperationError>) {
        let mut registry = self.registry.lock().await;
        registry.settle(&self.key, self.generation, outcome);
    }
}

impl std::fmt::Debug for OperationContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperationContext")
            .field("key", &self.key)
            .field("generation", &self.generation)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish()
    }
}
