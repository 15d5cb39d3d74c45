use crate::error::{CheckError, Result};

/// Who a check waits for, decided once when the audience is resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target<U> {
    /// Any `n` distinct participants.
    Count(usize),
    /// Exactly these participants. Repeats are collapsed, first occurrence
    /// wins the display position.
    Enumerated(Vec<U>),
}

/// Which kind of target an activated check carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetMode {
    Count,
    Enumerated,
}

/// Lifecycle position of a check.
///
/// Cancellation is not a phase of the check itself: a cancelled check is
/// simply removed from its registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Uninitialized,
    Activated,
    Satisfied,
}

/// Outcome of [`ReadyCheck::mark_ready`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadyStatus {
    /// The participant was added; `satisfied` is recomputed after the add.
    Accepted { satisfied: bool },
    /// The participant had already readied. Nothing changed.
    AlreadyReadied,
    /// The participant is not needed by this check. Nothing changed.
    NotRequired,
}

/// Outcome of [`ReadyCheck::mark_unready`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnreadyStatus {
    Accepted,
    /// The participant never readied. Nothing changed.
    NotReadied,
}

/// What a check is still waiting for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Remaining<'a, U> {
    Count(usize),
    /// Required members without an acknowledgement, in target order.
    Members(Vec<&'a U>),
}

impl<U> Remaining<'_, U> {
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Count(n) => *n,
            Self::Members(members) => members.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Opaque reference to the status message delivered for a check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StatusHandle {
    pub channel_id: u64,
    pub message_id: u64,
}

#[derive(Debug, Clone)]
enum Requirement<U> {
    Count(usize),
    Members(Vec<U>),
}

/// A single ready check.
#[derive(Debug, Clone)]
pub struct ReadyCheck<U> {
    requester: U,
    requirement: Option<Requirement<U>>,
    acknowledged: Vec<U>,
    status_handle: Option<StatusHandle>,
}

impl<U: Clone + PartialEq> ReadyCheck<U> {
    /// Create an uninitialized check owned by `requester`.
    pub fn new(requester: U) -> Self {
        Self {
            requester,
            requirement: None,
            acknowledged: Vec::new(),
            status_handle: None,
        }
    }

    /// Fix the target of this check. Only the first successful call counts;
    /// a failed call leaves the check untouched.
    pub fn activate(&mut self, target: Target<U>) -> Result<()> {
        if self.requirement.is_some() {
            return Err(CheckError::AlreadyActivated);
        }
        let requirement = match target {
            Target::Count(0) => return Err(CheckError::InvalidTarget),
            Target::Count(n) => Requirement::Count(n),
            Target::Enumerated(list) => {
                let mut members: Vec<U> = Vec::with_capacity(list.len());
                for member in list {
                    if !members.contains(&member) {
                        members.push(member);
                    }
                }
                if members.is_empty() {
                    return Err(CheckError::InvalidTarget);
                }
                Requirement::Members(members)
            },
        };
        self.requirement = Some(requirement);
        Ok(())
    }

    pub fn requester(&self) -> &U {
        &self.requester
    }

    pub fn target_mode(&self) -> Option<TargetMode> {
        self.requirement.as_ref().map(|r| match r {
            Requirement::Count(_) => TargetMode::Count,
            Requirement::Members(_) => TargetMode::Enumerated,
        })
    }

    /// Number of acknowledgements needed for satisfaction (0 before
    /// activation).
    pub fn required_count(&self) -> usize {
        match &self.requirement {
            None => 0,
            Some(Requirement::Count(n)) => *n,
            Some(Requirement::Members(members)) => members.len(),
        }
    }

    /// The enumerated target set; empty in Count mode.
    pub fn required_members(&self) -> &[U] {
        match &self.requirement {
            Some(Requirement::Members(members)) => members,
            _ => &[],
        }
    }

    /// Participants who readied, in the order they did so.
    pub fn acknowledged(&self) -> &[U] {
        &self.acknowledged
    }

    pub fn has_readied(&self, participant: &U) -> bool {
        self.acknowledged.contains(participant)
    }

    /// Whether `participant` may ready up right now.
    pub fn is_required(&self, participant: &U) -> bool {
        match &self.requirement {
            None => false,
            Some(Requirement::Count(n)) => self.acknowledged.len() < *n,
            Some(Requirement::Members(members)) => members.contains(participant),
        }
    }

    pub fn mark_ready(&mut self, participant: U) -> ReadyStatus {
        if self.has_readied(&participant) {
            return ReadyStatus::AlreadyReadied;
        }
        if !self.is_required(&participant) {
            return ReadyStatus::NotRequired;
        }
        self.acknowledged.push(participant);
        ReadyStatus::Accepted {
            satisfied: self.is_satisfied(),
        }
    }

    pub fn mark_unready(&mut self, participant: &U) -> UnreadyStatus {
        match self.acknowledged.iter().position(|p| p == participant) {
            Some(index) => {
                self.acknowledged.remove(index);
                UnreadyStatus::Accepted
            },
            None => UnreadyStatus::NotReadied,
        }
    }

    /// Recomputed from membership every time, never from cached counters.
    pub fn is_satisfied(&self) -> bool {
        match &self.requirement {
            None => false,
            Some(Requirement::Count(n)) => self.acknowledged.len() == *n,
            Some(Requirement::Members(members)) => {
                members.iter().all(|member| self.acknowledged.contains(member))
            },
        }
    }

    pub fn remaining(&self) -> Remaining<'_, U> {
        match &self.requirement {
            None => Remaining::Count(0),
            Some(Requirement::Count(n)) => {
                Remaining::Count(n.saturating_sub(self.acknowledged.len()))
            },
            Some(Requirement::Members(members)) => Remaining::Members(
                members
                    .iter()
                    .filter(|member| !self.acknowledged.contains(member))
                    .collect(),
            ),
        }
    }

    pub fn remaining_count(&self) -> usize {
        self.remaining().len()
    }

    pub fn phase(&self) -> Phase {
        if self.requirement.is_none() {
            Phase::Uninitialized
        } else if self.is_satisfied() {
            Phase::Satisfied
        } else {
            Phase::Activated
        }
    }

    pub fn status_handle(&self) -> Option<StatusHandle> {
        self.status_handle
    }

    /// Remember where the status message was delivered. The handle is set
    /// once; later calls are ignored and return `false`.
    pub fn set_status_handle(&mut self, handle: StatusHandle) -> bool {
        if self.status_handle.is_some() {
            return false;
        }
        self.status_handle = Some(handle);
        true
    }
}
