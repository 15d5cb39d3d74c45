//! Ready-check state machine.
//!
//! A [`ReadyCheck`] tracks who must acknowledge readiness, who already has,
//! and whether the check is satisfied. [`StatusView`] renders it as text and
//! [`CheckRegistry`] keeps at most one live check per audience scope.
//!
//! Nothing here performs I/O; delivering the rendered view and resolving the
//! audience are left to the caller.

pub mod check;
pub mod error;
pub mod registry;
pub mod view;

pub use {
    check::{
        Phase, ReadyCheck, ReadyStatus, Remaining, StatusHandle, Target, TargetMode,
        UnreadyStatus,
    },
    error::{CheckError, Result},
    registry::CheckRegistry,
    view::{Affordance, STATUS_TITLE, StatusView, remainder_summary},
};
