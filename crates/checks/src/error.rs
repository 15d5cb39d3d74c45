/// Crate-wide result type for ready-check operations.
pub type Result<T> = std::result::Result<T, CheckError>;

/// Failures of the ready-check core.
///
/// All of these are recoverable: callers turn them into denial messages for
/// the user who issued the command.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CheckError {
    /// Activation with neither a positive count nor a non-empty member set.
    #[error("a ready check needs a positive count or at least one participant")]
    InvalidTarget,

    /// `activate` was called on a check that already has a target.
    #[error("ready check is already activated")]
    AlreadyActivated,

    /// The scope already has a live check.
    #[error("a ready check is already active here")]
    AlreadyActive,

    /// The scope has no live check.
    #[error("no ready check is active here")]
    NoActiveCheck,

    /// Someone other than the requester tried to cancel.
    #[error("only the creator of a ready check can cancel it")]
    NotRequester,
}
