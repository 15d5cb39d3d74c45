//! Turning command input into a check target.
//!
//! The chat integration gathers the raw pieces (option values, who is in the
//! requester's voice channel, which users are bots) and these helpers decide
//! the [`Target`] once, so the state machine never has to sniff its input.

use std::str::FromStr;

use {rollcall_checks::Target, rollcall_common::ParticipantId};

use crate::commands::{CHANNEL_TARGET, COUNT_TARGET, MENTION_TARGET};

/// How the requester picked the audience of a new check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetType {
    /// Wait for any `n` users.
    Count,
    /// Wait for the users mentioned in the command.
    Mentions,
    /// Wait for everyone in the requester's voice channel.
    Channel,
}

impl FromStr for TargetType {
    type Err = AudienceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            COUNT_TARGET => Ok(Self::Count),
            MENTION_TARGET => Ok(Self::Mentions),
            CHANNEL_TARGET => Ok(Self::Channel),
            _ => Err(AudienceError::NoTargetType),
        }
    }
}

/// A member of a resolved roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    pub id: ParticipantId,
    pub bot: bool,
}

/// Why no target could be resolved. The messages are shown to the
/// requester as-is.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AudienceError {
    #[error("Pick a ready check type: `count`, `mentions` or `channel`.")]
    NoTargetType,

    #[error(
        "Sorry, I can only wait for one or more users with a `count` check. Try creating \
         your check with a count of at least 1.\nIf you'd like to wait for specific users rather \
         than a number, use `/check mentions`"
    )]
    InvalidCount,

    #[error(
        "Sorry, I can't use global tags like `everyone` or `here`. Try picking individual users \
         instead."
    )]
    GlobalMention,

    #[error(
        "You'll need to select some users to create a `mentions` check. Keep in mind I \
         can't wait for bots or roles.\nIf you'd like to wait for a number of users rather than \
         specific users, use `/check count`"
    )]
    NoMentionsProvided,

    #[error("Sorry, you must be in a voice channel to use this ready check type.")]
    EmptyVoiceChannel,
}

/// Parse the raw `type` option.
pub fn parse_target_type(raw: Option<&str>) -> Result<TargetType, AudienceError> {
    raw.ok_or(AudienceError::NoTargetType)?.parse()
}

/// A positive headcount.
pub fn resolve_count(count: Option<i64>) -> Result<Target<ParticipantId>, AudienceError> {
    count
        .and_then(|n| usize::try_from(n).ok())
        .filter(|n| *n >= 1)
        .map(Target::Count)
        .ok_or(AudienceError::InvalidCount)
}

/// Extract user mentions (`<@id>` / `<@!id>`) from free text, in order of
/// appearance. Role and channel mentions are skipped.
pub fn parse_user_mentions(raw: &str) -> Vec<ParticipantId> {
    let mut found = Vec::new();
    let mut rest = raw;
    while let Some(start) = rest.find("<@") {
        let after = &rest[start..];
        let Some(end) = after.find('>') else {
            break;
        };
        match after[..=end].parse::<ParticipantId>() {
            Ok(id) => {
                found.push(id);
                rest = &after[end + 1..];
            },
            // Role mention or stray `<@`; resume right after it.
            Err(_) => rest = &after[2..],
        }
    }
    found
}

/// Users mentioned in the `mentions` option, minus bots.
///
/// `@everyone` and `@here` are refused outright so a check never pings a
/// whole server.
pub fn resolve_mentions(
    raw: Option<&str>,
    is_bot: impl Fn(ParticipantId) -> bool,
) -> Result<Target<ParticipantId>, AudienceError> {
    let raw = raw.unwrap_or_default();
    if raw.contains("@everyone") || raw.contains("@here") {
        return Err(AudienceError::GlobalMention);
    }
    humans(
        parse_user_mentions(raw)
            .into_iter()
            .map(|id| Candidate { id, bot: is_bot(id) }),
    )
    .ok_or(AudienceError::NoMentionsProvided)
}

/// Everyone in the requester's voice channel, minus bots. `None` means the
/// requester is not in a voice channel.
pub fn resolve_voice(
    roster: Option<Vec<Candidate>>,
) -> Result<Target<ParticipantId>, AudienceError> {
    roster
        .and_then(humans)
        .ok_or(AudienceError::EmptyVoiceChannel)
}

fn humans(candidates: impl IntoIterator<Item = Candidate>) -> Option<Target<ParticipantId>> {
    let mut ids: Vec<ParticipantId> = Vec::new();
    for candidate in candidates {
        if !candidate.bot && !ids.contains(&candidate.id) {
            ids.push(candidate.id);
        }
    }
    (!ids.is_empty()).then_some(Target::Enumerated(ids))
}

#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest};

    fn id(n: u64) -> ParticipantId {
        ParticipantId::new(n)
    }

    #[rstest]
    #[case("count", TargetType::Count)]
    #[case("mentions", TargetType::Mentions)]
    #[case(" Channel ", TargetType::Channel)]
    fn target_types_parse(#[case] raw: &str, #[case] expected: TargetType) {
        assert_eq!(parse_target_type(Some(raw)), Ok(expected));
    }

    #[test]
    fn missing_or_unknown_target_type() {
        assert_eq!(parse_target_type(None), Err(AudienceError::NoTargetType));
        assert_eq!(parse_target_type(Some("role")), Err(AudienceError::NoTargetType));
    }

    #[rstest]
    #[case(None)]
    #[case(Some(0))]
    #[case(Some(-3))]
    fn counts_below_one_are_invalid(#[case] count: Option<i64>) {
        assert_eq!(resolve_count(count), Err(AudienceError::InvalidCount));
    }

    #[test]
    fn positive_count_resolves() {
        assert_eq!(resolve_count(Some(4)), Ok(Target::Count(4)));
    }

    #[test]
    fn mentions_are_parsed_in_order_skipping_roles() {
        let parsed = parse_user_mentions("<@3> and <@!1> but not <@&99> or <#5>, <@2>");
        assert_eq!(parsed, vec![id(3), id(1), id(2)]);
    }

    #[test]
    fn stray_marker_does_not_hide_later_mentions() {
        assert_eq!(parse_user_mentions("<@nope <@5>"), vec![id(5)]);
    }

    #[test]
    fn unterminated_mention_is_ignored() {
        assert_eq!(parse_user_mentions("<@1> <@2"), vec![id(1)]);
    }

    #[test]
    fn mentions_drop_bots_and_repeats() {
        let target = resolve_mentions(Some("<@1> <@2> <@1> <@3>"), |u| u == id(2));
        assert_eq!(target, Ok(Target::Enumerated(vec![id(1), id(3)])));
    }

    #[rstest]
    #[case("@everyone get in here")]
    #[case("<@1> @here")]
    fn global_mentions_are_refused(#[case] raw: &str) {
        assert_eq!(
            resolve_mentions(Some(raw), |_| false),
            Err(AudienceError::GlobalMention)
        );
    }

    #[rstest]
    #[case(None)]
    #[case(Some("nobody"))]
    #[case(Some("<@7>"))]
    fn no_human_mentions(#[case] raw: Option<&str>) {
        assert_eq!(
            resolve_mentions(raw, |u| u == id(7)),
            Err(AudienceError::NoMentionsProvided)
        );
    }

    #[test]
    fn voice_roster_keeps_humans() {
        let roster = vec![
            Candidate { id: id(1), bot: false },
            Candidate { id: id(2), bot: true },
            Candidate { id: id(3), bot: false },
        ];
        assert_eq!(
            resolve_voice(Some(roster)),
            Ok(Target::Enumerated(vec![id(1), id(3)]))
        );
    }

    #[test]
    fn not_in_voice_or_only_bots() {
        assert_eq!(resolve_voice(None), Err(AudienceError::EmptyVoiceChannel));
        assert_eq!(
            resolve_voice(Some(vec![Candidate { id: id(9), bot: true }])),
            Err(AudienceError::EmptyVoiceChannel)
        );
    }

    #[test]
    fn invalid_count_message_suggests_mentions() {
        let msg = AudienceError::InvalidCount.to_string();
        assert!(msg.contains("`/check mentions`"), "{msg}");
    }
}
