//! Audience lookup for `/check` from command options and the cache.

use {
    rollcall_channels::{
        AudienceError, TargetType,
        audience::{self, Candidate},
        commands::{COUNT_TARGET, MENTION_TARGET, TYPE_OPTION},
    },
    rollcall_checks::Target,
    rollcall_common::ParticipantId,
    serenity::all::{
        ChannelId, CommandDataOption, CommandDataOptionValue, CommandInteraction, Context, GuildId,
        UserId,
    },
};

/// Raw options of a `/check` invocation.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CheckOptions {
    pub target_type: Option<String>,
    pub count: Option<i64>,
    pub mentions: Option<String>,
}

impl CheckOptions {
    pub fn from_options(options: &[CommandDataOption]) -> Self {
        let mut parsed = Self::default();
        for option in options {
            match (option.name.as_str(), &option.value) {
                (TYPE_OPTION, CommandDataOptionValue::String(value)) => {
                    parsed.target_type = Some(value.clone());
                },
                (COUNT_TARGET, CommandDataOptionValue::Integer(value)) => {
                    parsed.count = Some(*value);
                },
                (MENTION_TARGET, CommandDataOptionValue::String(value)) => {
                    parsed.mentions = Some(value.clone());
                },
                _ => {},
            }
        }
        parsed
    }
}

/// Decide who a new check waits for.
pub fn resolve_target(
    ctx: &Context,
    command: &CommandInteraction,
) -> Result<Target<ParticipantId>, AudienceError> {
    let options = CheckOptions::from_options(&command.data.options);
    match audience::parse_target_type(options.target_type.as_deref())? {
        TargetType::Count => audience::resolve_count(options.count),
        TargetType::Mentions => audience::resolve_mentions(options.mentions.as_deref(), |id| {
            is_bot(ctx, command, UserId::new(id.get()))
        }),
        TargetType::Channel => audience::resolve_voice(
            command
                .guild_id
                .and_then(|guild_id| voice_roster(ctx, guild_id, command.user.id)),
        ),
    }
}

/// Unknown users count as humans.
fn is_bot(ctx: &Context, command: &CommandInteraction, user_id: UserId) -> bool {
    if let Some(user) = command.data.resolved.users.get(&user_id) {
        return user.bot;
    }
    ctx.cache.user(user_id).is_some_and(|user| user.bot)
}

fn voice_roster(ctx: &Context, guild_id: GuildId, requester: UserId) -> Option<Vec<Candidate>> {
    // Copy out of the cache before touching it again.
    let states: Vec<(UserId, Option<ChannelId>, Option<bool>)> = {
        let guild = ctx.cache.guild(guild_id)?;
        guild
            .voice_states
            .values()
            .map(|state| {
                (
                    state.user_id,
                    state.channel_id,
                    state.member.as_ref().map(|member| member.user.bot),
                )
            })
            .collect()
    };
    let states = states.into_iter().map(|(user_id, channel_id, bot)| {
        let bot = bot.unwrap_or_else(|| ctx.cache.user(user_id).is_some_and(|user| user.bot));
        (user_id, channel_id, bot)
    });
    roster_of(states, requester)
}

/// Everyone sharing the requester's voice channel, requester included.
/// `None` when the requester is not connected.
fn roster_of(
    states: impl IntoIterator<Item = (UserId, Option<ChannelId>, bool)>,
    requester: UserId,
) -> Option<Vec<Candidate>> {
    let states: Vec<_> = states.into_iter().collect();
    let channel = states
        .iter()
        .find(|(user_id, ..)| *user_id == requester)
        .and_then(|(_, channel_id, _)| *channel_id)?;
    let mut roster: Vec<Candidate> = states
        .into_iter()
        .filter(|(_, channel_id, _)| *channel_id == Some(channel))
        .map(|(user_id, _, bot)| Candidate {
            id: ParticipantId::new(user_id.get()),
            bot,
        })
        .collect();
    roster.sort_by_key(|candidate| candidate.id);
    Some(roster)
}
