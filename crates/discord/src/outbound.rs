use std::sync::Arc;

use {
    async_trait::async_trait,
    rollcall_channels::{Error as ChannelError, Result, StatusTransport},
    rollcall_checks::{Affordance, StatusHandle, StatusView},
    rollcall_common::ScopeId,
    serenity::all::{
        ButtonStyle, ChannelId, CreateActionRow, CreateButton, CreateMessage, EditMessage, Http,
        MessageId,
    },
    tracing::debug,
};

/// Posts and maintains status messages through the Discord REST API.
pub struct DiscordTransport {
    http: Arc<Http>,
}

impl DiscordTransport {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl StatusTransport for DiscordTransport {
    async fn send_status(&self, scope: ScopeId, view: &StatusView) -> Result<StatusHandle> {
        let message = CreateMessage::new()
            .content(view.to_string())
            .components(components(view));
        let sent = ChannelId::new(scope.get())
            .send_message(&self.http, message)
            .await
            .map_err(|e| ChannelError::external("failed to send status message", e))?;
        debug!(channel_id = scope.get(), message_id = sent.id.get(), "status message sent");
        Ok(StatusHandle {
            channel_id: sent.channel_id.get(),
            message_id: sent.id.get(),
        })
    }

    async fn edit_status(&self, handle: StatusHandle, view: &StatusView) -> Result<()> {
        let edit = EditMessage::new()
            .content(view.to_string())
            .components(components(view));
        ChannelId::new(handle.channel_id)
            .edit_message(&self.http, MessageId::new(handle.message_id), edit)
            .await
            .map_err(|e| ChannelError::external("failed to edit status message", e))?;
        Ok(())
    }

    async fn delete_status(&self, handle: StatusHandle) -> Result<()> {
        ChannelId::new(handle.channel_id)
            .delete_message(&self.http, MessageId::new(handle.message_id))
            .await
            .map_err(|e| ChannelError::external("failed to delete status message", e))
    }
}

/// Button row for the view; empty once nothing is left to press.
fn components(view: &StatusView) -> Vec<CreateActionRow> {
    if view.affordances.is_empty() {
        return Vec::new();
    }
    vec![CreateActionRow::Buttons(
        view.affordances.iter().copied().map(button).collect(),
    )]
}

fn button(affordance: Affordance) -> CreateButton {
    let style = match affordance {
        Affordance::Ready => ButtonStyle::Success,
        Affordance::Unready => ButtonStyle::Danger,
    };
    CreateButton::new(affordance.custom_id())
        .label(affordance.label())
        .style(style)
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        rollcall_checks::{ReadyCheck, Target},
        rollcall_common::ParticipantId,
    };

    fn view(satisfied: bool) -> StatusView {
        let mut check = ReadyCheck::new(ParticipantId::new(1));
        check.activate(Target::Count(1)).unwrap();
        if satisfied {
            check.mark_ready(ParticipantId::new(2));
        }
        StatusView::render(&check)
    }

    #[test]
    fn open_check_gets_ready_and_not_ready_buttons() {
        let rows = serde_json::to_value(components(&view(false))).unwrap();
        let buttons = rows[0]["components"].as_array().unwrap();
        assert_eq!(buttons.len(), 2);
        assert_eq!(buttons[0]["custom_id"], "ready");
        assert_eq!(buttons[0]["label"], "Ready");
        // 3 = success (green), 4 = danger (red)
        assert_eq!(buttons[0]["style"], 3);
        assert_eq!(buttons[1]["custom_id"], "unready");
        assert_eq!(buttons[1]["label"], "Not Ready");
        assert_eq!(buttons[1]["style"], 4);
    }

    #[test]
    fn satisfied_check_has_no_buttons() {
        assert!(components(&view(true)).is_empty());
    }
}
