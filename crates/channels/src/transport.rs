use {
    async_trait::async_trait,
    rollcall_checks::{StatusHandle, StatusView},
    rollcall_common::ScopeId,
};

use crate::error::Result;

/// Delivery of status messages to a chat platform.
///
/// Implementations render the view (text plus any `Ready` / `Not Ready`
/// controls in [`StatusView::affordances`]) the way their platform allows.
#[async_trait]
pub trait StatusTransport: Send + Sync {
    /// Post a new status message in `scope`.
    async fn send_status(&self, scope: ScopeId, view: &StatusView) -> Result<StatusHandle>;

    /// Replace the content of a status message posted earlier.
    async fn edit_status(&self, handle: StatusHandle, view: &StatusView) -> Result<()>;

    async fn delete_status(&self, handle: StatusHandle) -> Result<()>;
}
