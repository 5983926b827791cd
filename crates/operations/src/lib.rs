//! Analysis lifecycle for keyed, long-running operations.
//!
//! One record per [`OperationKey`](repolens_protocol::OperationKey): a run is
//! either active, or ended as completed, failed or cancelled. Callers get the
//! result inline when the work finishes within the synchronous window, and a
//! `started` response otherwise while the same task keeps running.
//!
//! ```no_run
//! use repolens_operations::{OperationContext, OperationError, OperationManager};
//! use repolens_protocol::OperationKey;
//! use std::time::Duration;
//!
//! # async fn demo() {
//! let manager = OperationManager::new(Duration::from_secs(25));
//! let key = OperationKey::new("https://github.com/acme/tool", None);
//! let response = manager
//!     .submit(key.clone(), |ctx: OperationContext| async move {
//!         ctx.set_progress("Cloning repository").await;
//!         ctx.check_cancelled()?;
//!         Ok::<_, OperationError>("summary".to_string())
//!     })
//!     .await;
//! println!("{}", response.status());
//! # }
//! ```

mod context;
mod error;
mod manager;
mod record;

pub use context::OperationContext;
pub use error::OperationError;
pub use manager::{OperationManager, CANCELLED_NOTE, DEFAULT_SYNC_TIMEOUT, INITIAL_PROGRESS};
pub use record::{OperationRecord, OperationSnapshot};
