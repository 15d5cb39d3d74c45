use std::{collections::HashMap, sync::Arc};

use {
    rollcall_checks::{
        CheckError, CheckRegistry, ReadyCheck, ReadyStatus, StatusHandle, StatusView, Target,
        UnreadyStatus, remainder_summary,
    },
    rollcall_common::{ParticipantId, ScopeId},
    tokio::sync::{Mutex, OwnedMutexGuard},
    tracing::{debug, info, warn},
};

use crate::{commands::help_text, error::Result, reply::Reply, transport::StatusTransport};

type Check = ReadyCheck<ParticipantId>;

/// A status message edit computed under the registry lock and sent after it
/// is released.
type Update = Option<(StatusHandle, StatusView)>;

/// What a user asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Start a check; the audience is already resolved.
    Create(Target<ParticipantId>),
    Cancel,
    Ready,
    Unready,
    Status,
    Help,
}

/// One inbound command or button press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub scope: ScopeId,
    pub user: ParticipantId,
    pub action: Action,
}

/// Runs ready checks for every scope the bot is present in.
///
/// Mutating events take their scope's turn first, so two presses of `Ready`
/// in the same scope are applied and published one after the other. The
/// registry lock is only held to read or change state, never across a
/// transport call, so a slow status edit in one scope does not hold up any
/// other scope.
pub struct CheckService {
    registry: Mutex<CheckRegistry<ScopeId, ParticipantId>>,
    turns: Mutex<HashMap<ScopeId, Arc<Mutex<()>>>>,
    transport: Arc<dyn StatusTransport>,
}

impl CheckService {
    pub fn new(transport: Arc<dyn StatusTransport>) -> Self {
        Self {
            registry: Mutex::new(CheckRegistry::new()),
            turns: Mutex::new(HashMap::new()),
            transport,
        }
    }

    /// Handle an invocation, turning every failure into a denial reply.
    pub async fn dispatch(&self, invocation: Invocation) -> Reply {
        let Invocation {
            scope,
            user,
            action,
        } = invocation;
        debug!(scope = %scope, user = user.get(), ?action, "dispatching");

        let result = match action {
            Action::Create(target) => self.create(scope, user, target).await,
            Action::Cancel => self.cancel(scope, user).await,
            Action::Ready => self.ready(scope, user).await,
            Action::Unready => self.unready(scope, user).await,
            Action::Status => self.status(scope).await,
            Action::Help => Ok(Reply::ephemeral(help_text())),
        };

        result.unwrap_or_else(|e| {
            debug!(scope = %scope, user = user.get(), error = %e, "command denied");
            e.into_reply()
        })
    }

    pub async fn create(
        &self,
        scope: ScopeId,
        requester: ParticipantId,
        target: Target<ParticipantId>,
    ) -> Result<Reply> {
        let _turn = self.turn(scope).await;
        if self.registry.lock().await.contains(&scope) {
            return Err(CheckError::AlreadyActive.into());
        }

        let mut check = Check::new(requester);
        check.activate(target)?;

        // Nothing is registered unless the status message made it out.
        let handle = self
            .transport
            .send_status(scope, &StatusView::render(&check))
            .await?;
        check.set_status_handle(handle);

        let summary = remainder_summary(&check);
        self.registry.lock().await.put(scope, check)?;
        info!(
            scope = %scope,
            requester = requester.get(),
            message_id = handle.message_id,
            "ready check created"
        );
        Ok(Reply::ephemeral(format!(
            "Ready check created! Waiting on {summary}."
        )))
    }

    /// Only the requester may cancel.
    pub async fn cancel(&self, scope: ScopeId, user: ParticipantId) -> Result<Reply> {
        let _turn = self.turn(scope).await;
        let check = {
            let mut registry = self.registry.lock().await;
            let check = registry.get(&scope).ok_or(CheckError::NoActiveCheck)?;
            if *check.requester() != user {
                return Err(CheckError::NotRequester.into());
            }
            registry.remove(&scope).ok_or(CheckError::NoActiveCheck)?
        };

        if let Some(handle) = check.status_handle()
            && let Err(e) = self.transport.delete_status(handle).await
        {
            warn!(
                scope = %scope,
                message_id = handle.message_id,
                error = %e,
                "failed to delete status message"
            );
        }
        info!(scope = %scope, user = user.get(), "ready check cancelled");
        Ok(Reply::public(format!("Ready check cancelled by {user}.")))
    }

    pub async fn ready(&self, scope: ScopeId, participant: ParticipantId) -> Result<Reply> {
        let _turn = self.turn(scope).await;
        let (status, update, remaining, requester) = {
            let mut registry = self.registry.lock().await;
            let check = registry.get_mut(&scope).ok_or(CheckError::NoActiveCheck)?;
            let status = check.mark_ready(participant);
            let update = match status {
                ReadyStatus::Accepted { .. } => snapshot(check),
                _ => None,
            };
            let remaining = check.remaining_count();
            let requester = *check.requester();
            if status == (ReadyStatus::Accepted { satisfied: true }) {
                registry.remove(&scope);
            }
            (status, update, remaining, requester)
        };

        match status {
            ReadyStatus::AlreadyReadied => Ok(Reply::ephemeral("You've already readied!")),
            ReadyStatus::NotRequired => {
                Ok(Reply::ephemeral("You don't need to ready in this check!"))
            },
            ReadyStatus::Accepted { satisfied: false } => {
                self.publish(scope, update).await;
                Ok(Reply::ephemeral(format!("You've readied! {remaining} left.")))
            },
            ReadyStatus::Accepted { satisfied: true } => {
                self.publish(scope, update).await;
                info!(scope = %scope, requester = requester.get(), "ready check complete");
                Ok(Reply::public(format!(
                    "Check complete! Ready to go, {requester}!"
                )))
            },
        }
    }

    pub async fn unready(&self, scope: ScopeId, participant: ParticipantId) -> Result<Reply> {
        let _turn = self.turn(scope).await;
        let (status, update, remaining) = {
            let mut registry = self.registry.lock().await;
            let check = registry.get_mut(&scope).ok_or(CheckError::NoActiveCheck)?;
            let status = check.mark_unready(&participant);
            let update = match status {
                UnreadyStatus::Accepted => snapshot(check),
                UnreadyStatus::NotReadied => None,
            };
            (status, update, check.remaining_count())
        };

        match status {
            UnreadyStatus::NotReadied => Ok(Reply::ephemeral(
                "You haven't readied yet, no need to unready!",
            )),
            UnreadyStatus::Accepted => {
                self.publish(scope, update).await;
                Ok(Reply::ephemeral(format!(
                    "You've un-readied! {remaining} left."
                )))
            },
        }
    }

    /// The rendered check plus who is still missing, for the caller only.
    ///
    /// Reads committed state and does not wait for the scope's turn.
    pub async fn status(&self, scope: ScopeId) -> Result<Reply> {
        let registry = self.registry.lock().await;
        let check = registry.get(&scope).ok_or(CheckError::NoActiveCheck)?;
        Ok(Reply::ephemeral(format!(
            "{}\nStill waiting on {}.",
            StatusView::render(check),
            remainder_summary(check)
        )))
    }

    /// Number of scopes with a live check.
    pub async fn active_checks(&self) -> usize {
        self.registry.lock().await.len()
    }

    /// Wait until no other event is being handled in `scope`.
    async fn turn(&self, scope: ScopeId) -> OwnedMutexGuard<()> {
        let lane = {
            let mut turns = self.turns.lock().await;
            Arc::clone(turns.entry(scope).or_default())
        };
        lane.lock_owned().await
    }

    /// Push a computed view to the status message. Failures are logged and
    /// the state change stands.
    async fn publish(&self, scope: ScopeId, update: Update) {
        let Some((handle, view)) = update else {
            return;
        };
        if let Err(e) = self.transport.edit_status(handle, &view).await {
            warn!(
                scope = %scope,
                message_id = handle.message_id,
                error = %e,
                "failed to update status message"
            );
        }
    }
}

fn snapshot(check: &Check) -> Update {
    check
        .status_handle()
        .map(|handle| (handle, StatusView::render(check)))
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::error::Error,
        async_trait::async_trait,
        rollcall_checks::Affordance,
        std::{io, sync::Mutex as StdMutex, time::Duration},
        tokio::sync::Notify,
    };

    #[derive(Debug, Clone, PartialEq)]
    enum Sent {
        Status(ScopeId, StatusView),
        Edit(StatusHandle, StatusView),
        Delete(StatusHandle),
    }

    #[derive(Default)]
    struct RecordingTransport {
        log: StdMutex<Vec<Sent>>,
        fail_edits: bool,
    }

    impl RecordingTransport {
        fn failing_edits() -> Self {
            Self {
                fail_edits: true,
                ..Self::default()
            }
        }

        fn log(&self) -> Vec<Sent> {
            self.log.lock().unwrap().clone()
        }

        fn last_edit(&self) -> Option<StatusView> {
            self.log().into_iter().rev().find_map(|s| match s {
                Sent::Edit(_, view) => Some(view),
                _ => None,
            })
        }
    }

    #[async_trait]
    impl StatusTransport for RecordingTransport {
        async fn send_status(&self, scope: ScopeId, view: &StatusView) -> Result<StatusHandle> {
            let mut log = self.log.lock().unwrap();
            log.push(Sent::Status(scope, view.clone()));
            Ok(StatusHandle {
                channel_id: scope.get(),
                message_id: log.len() as u64,
            })
        }

        async fn edit_status(&self, handle: StatusHandle, view: &StatusView) -> Result<()> {
            self.log.lock().unwrap().push(Sent::Edit(handle, view.clone()));
            if self.fail_edits {
                return Err(Error::external("edit", io::Error::other("gone")));
            }
            Ok(())
        }

        async fn delete_status(&self, handle: StatusHandle) -> Result<()> {
            self.log.lock().unwrap().push(Sent::Delete(handle));
            Err(Error::external("delete", io::Error::other("missing permission")))
        }
    }

    struct DownTransport;

    #[async_trait]
    impl StatusTransport for DownTransport {
        async fn send_status(&self, _: ScopeId, _: &StatusView) -> Result<StatusHandle> {
            Err(Error::external("send", io::Error::other("offline")))
        }

        async fn edit_status(&self, _: StatusHandle, _: &StatusView) -> Result<()> {
            Ok(())
        }

        async fn delete_status(&self, _: StatusHandle) -> Result<()> {
            Ok(())
        }
    }

    /// Edits in `stalled` block until `release` is notified.
    struct StallingTransport {
        stalled: ScopeId,
        edit_started: Notify,
        release: Notify,
        sent: StdMutex<u64>,
    }

    impl StallingTransport {
        fn new(stalled: ScopeId) -> Self {
            Self {
                stalled,
                edit_started: Notify::new(),
                release: Notify::new(),
                sent: StdMutex::new(0),
            }
        }
    }

    #[async_trait]
    impl StatusTransport for StallingTransport {
        async fn send_status(&self, scope: ScopeId, _: &StatusView) -> Result<StatusHandle> {
            let mut sent = self.sent.lock().unwrap();
            *sent += 1;
            Ok(StatusHandle {
                channel_id: scope.get(),
                message_id: *sent,
            })
        }

        async fn edit_status(&self, handle: StatusHandle, _: &StatusView) -> Result<()> {
            if handle.channel_id == self.stalled.get() {
                self.edit_started.notify_one();
                self.release.notified().await;
            }
            Ok(())
        }

        async fn delete_status(&self, _: StatusHandle) -> Result<()> {
            Ok(())
        }
    }

    const SCOPE: ScopeId = ScopeId::new(10);

    fn user(id: u64) -> ParticipantId {
        ParticipantId::new(id)
    }

    fn service() -> (Arc<RecordingTransport>, CheckService) {
        let transport = Arc::new(RecordingTransport::default());
        (transport.clone(), CheckService::new(transport))
    }

    fn invoke(user_id: u64, action: Action) -> Invocation {
        Invocation {
            scope: SCOPE,
            user: user(user_id),
            action,
        }
    }

    #[tokio::test]
    async fn create_posts_status_and_waits() {
        let (transport, svc) = service();
        let reply = svc
            .dispatch(invoke(1, Action::Create(Target::Count(2))))
            .await;
        assert_eq!(reply, Reply::ephemeral("Ready check created! Waiting on 2 users."));
        assert_eq!(svc.active_checks().await, 1);

        let log = transport.log();
        let [Sent::Status(scope, view)] = log.as_slice() else {
            panic!("expected one status message, got {log:?}");
        };
        assert_eq!(*scope, SCOPE);
        assert_eq!(view.header(), "0/2 Ready!");
        assert_eq!(view.affordances, vec![Affordance::Ready, Affordance::Unready]);
    }

    #[tokio::test]
    async fn second_create_in_scope_is_denied() {
        let (_, svc) = service();
        svc.dispatch(invoke(1, Action::Create(Target::Count(1)))).await;
        let reply = svc
            .dispatch(invoke(2, Action::Create(Target::Count(3))))
            .await;
        assert!(reply.ephemeral);
        assert!(reply.content.starts_with("There's already a ready check"));
        assert_eq!(svc.active_checks().await, 1);
    }

    #[tokio::test]
    async fn empty_target_is_denied_without_posting() {
        let (transport, svc) = service();
        let reply = svc
            .dispatch(invoke(1, Action::Create(Target::Enumerated(vec![]))))
            .await;
        assert!(reply.ephemeral);
        assert!(transport.log().is_empty());
        assert_eq!(svc.active_checks().await, 0);
    }

    #[tokio::test]
    async fn failed_send_registers_nothing() {
        let svc = CheckService::new(Arc::new(DownTransport));
        let reply = svc
            .dispatch(invoke(1, Action::Create(Target::Count(1))))
            .await;
        assert!(reply.content.starts_with("Sorry, something went wrong"));
        assert_eq!(svc.active_checks().await, 0);
    }

    #[tokio::test]
    async fn enumerated_check_runs_to_completion() {
        let (transport, svc) = service();
        let reply = svc
            .dispatch(invoke(
                1,
                Action::Create(Target::Enumerated(vec![user(2), user(3)])),
            ))
            .await;
        assert_eq!(reply.content, "Ready check created! Waiting on <@2>, <@3>.");

        let reply = svc.dispatch(invoke(4, Action::Ready)).await;
        assert_eq!(reply, Reply::ephemeral("You don't need to ready in this check!"));

        let reply = svc.dispatch(invoke(3, Action::Ready)).await;
        assert_eq!(reply, Reply::ephemeral("You've readied! 1 left."));
        let view = transport.last_edit().unwrap();
        assert_eq!(view.ready, vec!["<@3>"]);
        assert_eq!(view.not_ready, Some(vec!["<@2>".to_string()]));

        let reply = svc.dispatch(invoke(3, Action::Ready)).await;
        assert_eq!(reply, Reply::ephemeral("You've already readied!"));

        let reply = svc.dispatch(invoke(2, Action::Ready)).await;
        assert_eq!(reply, Reply::public("Check complete! Ready to go, <@1>!"));
        let view = transport.last_edit().unwrap();
        assert!(view.satisfied);
        assert!(view.affordances.is_empty());
        assert_eq!(svc.active_checks().await, 0);
    }

    #[tokio::test]
    async fn unready_round_trip() {
        let (_, svc) = service();
        svc.dispatch(invoke(1, Action::Create(Target::Count(2)))).await;

        let reply = svc.dispatch(invoke(5, Action::Unready)).await;
        assert_eq!(
            reply,
            Reply::ephemeral("You haven't readied yet, no need to unready!")
        );

        svc.dispatch(invoke(5, Action::Ready)).await;
        let reply = svc.dispatch(invoke(5, Action::Unready)).await;
        assert_eq!(reply, Reply::ephemeral("You've un-readied! 2 left."));
    }

    #[tokio::test]
    async fn commands_without_a_check_are_denied() {
        let (_, svc) = service();
        for action in [Action::Ready, Action::Unready, Action::Status, Action::Cancel] {
            let reply = svc.dispatch(invoke(1, action)).await;
            assert!(reply.ephemeral);
            assert!(
                reply.content.starts_with("There's no ready check running"),
                "{}",
                reply.content
            );
        }
    }

    #[tokio::test]
    async fn only_the_requester_can_cancel() {
        let (transport, svc) = service();
        svc.dispatch(invoke(1, Action::Create(Target::Count(2)))).await;

        let reply = svc.dispatch(invoke(2, Action::Cancel)).await;
        assert_eq!(
            reply.content,
            "Only the person who created this ready check can cancel it."
        );
        assert_eq!(svc.active_checks().await, 1);

        // The delete fails in this transport; the cancel still goes through.
        let reply = svc.dispatch(invoke(1, Action::Cancel)).await;
        assert_eq!(reply, Reply::public("Ready check cancelled by <@1>."));
        assert_eq!(svc.active_checks().await, 0);
        assert!(matches!(transport.log().last(), Some(Sent::Delete(_))));

        let reply = svc
            .dispatch(invoke(2, Action::Create(Target::Count(1))))
            .await;
        assert!(reply.content.starts_with("Ready check created!"));
    }

    #[tokio::test]
    async fn status_shows_view_and_remainder() {
        let (_, svc) = service();
        svc.dispatch(invoke(1, Action::Create(Target::Count(3)))).await;
        svc.dispatch(invoke(7, Action::Ready)).await;

        let reply = svc.dispatch(invoke(9, Action::Status)).await;
        assert!(reply.ephemeral);
        assert!(reply.content.contains("1/3 Ready!"), "{}", reply.content);
        assert!(reply.content.contains("<@7>"));
        assert!(reply.content.ends_with("Still waiting on 2 users."));
    }

    #[tokio::test]
    async fn failed_edit_keeps_the_ready() {
        let transport = Arc::new(RecordingTransport::failing_edits());
        let svc = CheckService::new(transport.clone());
        svc.dispatch(invoke(1, Action::Create(Target::Count(2)))).await;

        let reply = svc.dispatch(invoke(2, Action::Ready)).await;
        assert_eq!(reply, Reply::ephemeral("You've readied! 1 left."));
        let reply = svc.dispatch(invoke(2, Action::Ready)).await;
        assert_eq!(reply, Reply::ephemeral("You've already readied!"));
    }

    #[tokio::test]
    async fn help_needs_no_check() {
        let (_, svc) = service();
        let reply = svc.dispatch(invoke(1, Action::Help)).await;
        assert_eq!(reply, Reply::ephemeral(help_text()));
    }

    #[tokio::test]
    async fn scopes_are_independent() {
        let (_, svc) = service();
        svc.create(SCOPE, user(1), Target::Count(1)).await.unwrap();
        svc.create(ScopeId::new(11), user(1), Target::Count(1))
            .await
            .unwrap();
        assert_eq!(svc.active_checks().await, 2);

        let reply = svc.ready(ScopeId::new(11), user(2)).await.unwrap();
        assert!(!reply.ephemeral);
        assert_eq!(svc.active_checks().await, 1);
    }

    #[tokio::test]
    async fn stalled_edit_does_not_hold_up_other_scopes() {
        let slow = ScopeId::new(1);
        let fast = ScopeId::new(2);
        let transport = Arc::new(StallingTransport::new(slow));
        let svc = Arc::new(CheckService::new(transport.clone()));
        svc.create(slow, user(1), Target::Count(5)).await.unwrap();
        svc.create(fast, user(1), Target::Count(5)).await.unwrap();

        let stuck = tokio::spawn({
            let svc = Arc::clone(&svc);
            async move { svc.ready(slow, user(7)).await }
        });
        transport.edit_started.notified().await;

        let reply = tokio::time::timeout(Duration::from_secs(1), svc.ready(fast, user(7)))
            .await
            .expect("other scope was blocked")
            .unwrap();
        assert_eq!(reply, Reply::ephemeral("You've readied! 4 left."));

        // The ready in the stalled scope is already committed.
        let reply = svc.status(slow).await.unwrap();
        assert!(reply.content.contains("1/5 Ready!"), "{}", reply.content);

        // Later events in the stalled scope wait their turn.
        let queued = tokio::time::timeout(Duration::from_millis(50), svc.ready(slow, user(8)));
        assert!(queued.await.is_err());

        transport.release.notify_one();
        let reply = stuck.await.unwrap().unwrap();
        assert_eq!(reply, Reply::ephemeral("You've readied! 4 left."));
    }
}
