use std::fmt;

use crate::check::{ReadyCheck, Remaining};

/// Title line of every status message.
pub const STATUS_TITLE: &str = ":white_check_mark: Ready Check Started! :white_check_mark:";

/// Interactive control offered alongside an unsatisfied status message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Affordance {
    Ready,
    Unready,
}

impl Affordance {
    /// Identifier echoed back by the platform when the control is used.
    #[must_use]
    pub const fn custom_id(self) -> &'static str {
        match self {
            Self::Ready => "ready",
            Self::Unready => "unready",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Ready => "Ready",
            Self::Unready => "Not Ready",
        }
    }
}

/// Rendered snapshot of a check.
///
/// Rendering the same check twice yields equal views.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusView {
    pub ready_count: usize,
    pub required_count: usize,
    /// Acknowledged participants in the order they readied.
    pub ready: Vec<String>,
    /// Participants still missing, only for enumerated checks.
    pub not_ready: Option<Vec<String>>,
    /// Empty once the check is satisfied.
    pub affordances: Vec<Affordance>,
    pub satisfied: bool,
}

impl StatusView {
    pub fn render<U: Clone + PartialEq + fmt::Display>(check: &ReadyCheck<U>) -> Self {
        let satisfied = check.is_satisfied();
        let not_ready = match check.remaining() {
            Remaining::Members(members) => {
                Some(members.iter().map(ToString::to_string).collect())
            },
            Remaining::Count(_) => None,
        };
        Self {
            ready_count: check.acknowledged().len(),
            required_count: check.required_count(),
            ready: check.acknowledged().iter().map(ToString::to_string).collect(),
            not_ready,
            affordances: if satisfied {
                Vec::new()
            } else {
                vec![Affordance::Ready, Affordance::Unready]
            },
            satisfied,
        }
    }

    #[must_use]
    pub fn header(&self) -> String {
        format!("{}/{} Ready!", self.ready_count, self.required_count)
    }
}

impl fmt::Display for StatusView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{STATUS_TITLE}\n\n{}", self.header())?;
        write!(f, "\n\nReady:\n{}", self.ready.join("\n"))?;
        if let Some(not_ready) = &self.not_ready {
            write!(f, "\n\nNot Ready:\n{}", not_ready.join("\n"))?;
        }
        writeln!(f)
    }
}

/// Who or how many still need to ready, for short replies.
///
/// Enumerated checks list the missing members; count checks say
/// `"2 users"`.
pub fn remainder_summary<U: Clone + PartialEq + fmt::Display>(check: &ReadyCheck<U>) -> String {
    match check.remaining() {
        Remaining::Members(members) => members
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", "),
        Remaining::Count(n) => format!("{n} user{}", plural(n)),
    }
}

fn plural(n: usize) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, crate::check::Target, rollcall_common::ParticipantId};

    fn user(id: u64) -> ParticipantId {
        ParticipantId::new(id)
    }

    #[test]
    fn count_view_has_no_not_ready_section() {
        let mut check = ReadyCheck::new(user(1));
        check.activate(Target::Count(3)).unwrap();
        check.mark_ready(user(5));

        let view = StatusView::render(&check);
        assert_eq!(view.header(), "1/3 Ready!");
        assert_eq!(view.not_ready, None);
        assert_eq!(
            view.to_string(),
            format!("{STATUS_TITLE}\n\n1/3 Ready!\n\nReady:\n<@5>\n")
        );
    }

    #[test]
    fn enumerated_view_lists_missing_members_in_target_order() {
        let mut check = ReadyCheck::new(user(1));
        check
            .activate(Target::Enumerated(vec![user(2), user(3), user(4)]))
            .unwrap();
        check.mark_ready(user(3));

        let view = StatusView::render(&check);
        assert_eq!(view.ready, vec!["<@3>"]);
        assert_eq!(view.not_ready, Some(vec!["<@2>".into(), "<@4>".into()]));
        assert_eq!(
            view.to_string(),
            format!("{STATUS_TITLE}\n\n1/3 Ready!\n\nReady:\n<@3>\n\nNot Ready:\n<@2>\n<@4>\n")
        );
    }

    #[test]
    fn affordances_disappear_once_satisfied() {
        let mut check = ReadyCheck::new(user(1));
        check.activate(Target::Count(1)).unwrap();
        assert_eq!(
            StatusView::render(&check).affordances,
            vec![Affordance::Ready, Affordance::Unready]
        );

        check.mark_ready(user(2));
        let view = StatusView::render(&check);
        assert!(view.satisfied);
        assert!(view.affordances.is_empty());
    }

    #[test]
    fn rendering_is_repeatable() {
        let mut check = ReadyCheck::new(user(1));
        check.activate(Target::Enumerated(vec![user(2), user(3)])).unwrap();
        check.mark_ready(user(2));
        assert_eq!(StatusView::render(&check), StatusView::render(&check));
    }

    #[test]
    fn remainder_summary_pluralises_counts() {
        let mut check = ReadyCheck::new(user(1));
        check.activate(Target::Count(2)).unwrap();
        assert_eq!(remainder_summary(&check), "2 users");
        check.mark_ready(user(2));
        assert_eq!(remainder_summary(&check), "1 user");
    }

    #[test]
    fn remainder_summary_joins_members() {
        let mut check = ReadyCheck::new(user(1));
        check
            .activate(Target::Enumerated(vec![user(2), user(3), user(4)]))
            .unwrap();
        check.mark_ready(user(3));
        assert_eq!(remainder_summary(&check), "<@2>, <@4>");
    }

    #[test]
    fn affordance_ids_match_button_commands() {
        assert_eq!(Affordance::Ready.custom_id(), "ready");
        assert_eq!(Affordance::Unready.custom_id(), "unready");
        assert_eq!(Affordance::Unready.label(), "Not Ready");
    }
}
