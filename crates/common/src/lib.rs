//! Identity types and error plumbing shared by the rollcall crates.

pub mod error;
pub mod types;

pub use {
    error::{Error, FromMessage, Result},
    types::{ParticipantId, ScopeId},
};
