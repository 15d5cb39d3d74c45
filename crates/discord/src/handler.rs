//! Discord event handler for serenity.
//!
//! Turns slash commands and button presses into invocations of the shared
//! [`CheckService`] and answers each interaction exactly once.

use std::sync::Arc;

use {
    rollcall_channels::{
        Action, CheckService, CommandKind, Error as ChannelError, Invocation, Reply,
        ReplyWatchdog,
    },
    rollcall_common::{ParticipantId, ScopeId},
    serenity::{
        all::{
            ActivityData, ChannelId, Command, CommandInteraction, ComponentInteraction, Context,
            CreateInteractionResponse, CreateInteractionResponseMessage, EventHandler,
            GatewayIntents, GuildId, Interaction, Ready, User,
        },
        async_trait,
    },
    tracing::{debug, info, warn},
};

use crate::{audience, commands::create_commands, config::DiscordConfig};

/// Handler for Discord gateway events.
pub struct ReadyCheckHandler {
    config: DiscordConfig,
    service: Arc<CheckService>,
    watchdog: ReplyWatchdog,
}

impl ReadyCheckHandler {
    pub fn new(config: DiscordConfig, service: Arc<CheckService>, watchdog: ReplyWatchdog) -> Self {
        Self {
            config,
            service,
            watchdog,
        }
    }

    /// Gateway intents the bot needs: guilds for the cache and voice states
    /// for `channel` checks.
    pub fn intents() -> GatewayIntents {
        GatewayIntents::GUILDS | GatewayIntents::GUILD_VOICE_STATES
    }

    async fn register_commands(&self, ctx: &Context) {
        let commands = create_commands();
        let count = commands.len();
        let result = match self.config.guild_id {
            Some(guild_id) => GuildId::new(guild_id)
                .set_commands(&ctx.http, commands)
                .await
                .map(|_| ()),
            None => Command::set_global_commands(&ctx.http, commands)
                .await
                .map(|_| ()),
        };
        match result {
            Ok(()) => info!(count, guild_id = ?self.config.guild_id, "slash commands registered"),
            Err(e) => warn!(error = %e, "failed to register slash commands"),
        }
    }

    /// Run the invocation under the watchdog.
    async fn answer(&self, invocation: Result<Invocation, ChannelError>) -> Reply {
        let invocation = match invocation {
            Ok(invocation) => invocation,
            Err(e) => {
                debug!(error = %e, "interaction rejected");
                return e.into_reply();
            },
        };
        let service = Arc::clone(&self.service);
        self.watchdog
            .respond_within(async move { service.dispatch(invocation).await })
            .await
    }

    async fn on_command(&self, ctx: Context, command: CommandInteraction) {
        debug!(
            command = %command.data.name,
            channel_id = command.channel_id.get(),
            user_id = command.user.id.get(),
            "slash command received"
        );
        let reply = self.answer(command_invocation(&ctx, &command)).await;
        if let Err(e) = command.create_response(&ctx.http, response(reply)).await {
            warn!(error = %e, command = %command.data.name, "failed to answer command");
        }
    }

    async fn on_component(&self, ctx: Context, component: ComponentInteraction) {
        debug!(
            custom_id = %component.data.custom_id,
            channel_id = component.channel_id.get(),
            user_id = component.user.id.get(),
            "button pressed"
        );
        let invocation = button_invocation(
            &component.data.custom_id,
            component.channel_id,
            &component.user,
        );
        let reply = self.answer(invocation).await;
        if let Err(e) = component.create_response(&ctx.http, response(reply)).await {
            warn!(error = %e, custom_id = %component.data.custom_id, "failed to answer button");
        }
    }
}

#[async_trait]
impl EventHandler for ReadyCheckHandler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!(
            bot_name = %ready.user.name,
            guilds = ready.guilds.len(),
            "discord bot ready"
        );

        if !self.config.activity.is_empty() {
            ctx.set_activity(Some(ActivityData::playing(self.config.activity.clone())));
        }

        if self.config.register_commands {
            self.register_commands(&ctx).await;
        }
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        match interaction {
            Interaction::Command(command) => self.on_command(ctx, command).await,
            Interaction::Component(component) => self.on_component(ctx, component).await,
            other => debug!(kind = ?other.kind(), "ignoring interaction"),
        }
    }

    async fn cache_ready(&self, _ctx: Context, guilds: Vec<GuildId>) {
        debug!(guild_count = guilds.len(), "discord cache ready");
    }
}

fn participant(user: &User) -> ParticipantId {
    ParticipantId::new(user.id.get())
}

fn scope(channel_id: ChannelId) -> ScopeId {
    ScopeId::new(channel_id.get())
}

fn command_invocation(
    ctx: &Context,
    command: &CommandInteraction,
) -> Result<Invocation, ChannelError> {
    let action = match command.data.name.parse::<CommandKind>()? {
        CommandKind::Check => Action::Create(audience::resolve_target(ctx, command)?),
        CommandKind::Cancel => Action::Cancel,
        CommandKind::Ready => Action::Ready,
        CommandKind::Unready => Action::Unready,
        CommandKind::Status => Action::Status,
        CommandKind::Help => Action::Help,
    };
    Ok(Invocation {
        scope: scope(command.channel_id),
        user: participant(&command.user),
        action,
    })
}

/// Only the buttons on status messages are accepted.
fn button_invocation(
    custom_id: &str,
    channel_id: ChannelId,
    user: &User,
) -> Result<Invocation, ChannelError> {
    let action = match custom_id.parse::<CommandKind>()? {
        CommandKind::Ready => Action::Ready,
        CommandKind::Unready => Action::Unready,
        _ => return Err(ChannelError::unknown_command(custom_id)),
    };
    Ok(Invocation {
        scope: scope(channel_id),
        user: participant(user),
        action,
    })
}

fn response(reply: Reply) -> CreateInteractionResponse {
    CreateInteractionResponse::Message(
        CreateInteractionResponseMessage::new()
            .content(reply.content)
            .ephemeral(reply.ephemeral),
    )
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest};

    fn user(id: u64) -> User {
        let mut user = User::default();
        user.id = serenity::all::UserId::new(id);
        user
    }

    #[rstest]
    #[case("ready", Action::Ready)]
    #[case("unready", Action::Unready)]
    fn status_buttons_map_to_actions(#[case] custom_id: &str, #[case] action: Action) {
        let invocation = button_invocation(custom_id, ChannelId::new(5), &user(9)).unwrap();
        assert_eq!(invocation, Invocation {
            scope: ScopeId::new(5),
            user: ParticipantId::new(9),
            action,
        });
    }

    #[rstest]
    #[case("check")]
    #[case("cancel")]
    #[case("self_destruct")]
    fn other_buttons_are_rejected(#[case] custom_id: &str) {
        let err = button_invocation(custom_id, ChannelId::new(5), &user(9)).unwrap_err();
        assert!(matches!(err, ChannelError::UnknownCommand { .. }));
    }

    #[test]
    fn ephemeral_replies_set_the_flag() {
        let json = serde_json::to_value(response(Reply::ephemeral("psst"))).unwrap();
        // 4 = channel message with source, 64 = ephemeral
        assert_eq!(json["type"], 4);
        assert_eq!(json["data"]["content"], "psst");
        assert_eq!(json["data"]["flags"], 64);
    }

    #[test]
    fn public_replies_have_no_flags() {
        let json = serde_json::to_value(response(Reply::public("hi"))).unwrap();
        assert_eq!(json["data"]["content"], "hi");
        assert!(json["data"].get("flags").is_none_or(|f| f == 0));
    }

    #[test]
    fn intents_cover_voice_states() {
        let intents = ReadyCheckHandler::intents();
        assert!(intents.contains(GatewayIntents::GUILD_VOICE_STATES));
        assert!(!intents.contains(GatewayIntents::MESSAGE_CONTENT));
    }
}
