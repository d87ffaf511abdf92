// ── Per-target single-slot mailboxes ──
//
// At most one call per target is in flight. While it runs, the newest
// intent waits in a single slot; anything it displaces is resolved as
// superseded without ever reaching the processor.

use dashmap::DashMap;
use tokio::sync::oneshot;
use tracing::debug;

use super::CommandOutcome;
use super::executor::Intent;
use crate::error::CoreError;
use crate::model::Target;
use crate::store::Revision;

pub(crate) type Reply = oneshot::Sender<Result<CommandOutcome, CoreError>>;

/// An intent waiting for (or holding) its target's turn.
pub(crate) struct Pending {
    pub(crate) intent: Intent,
    /// Optimistic revision for device intents.
    pub(crate) revision: Option<Revision>,
    pub(crate) reply: Reply,
}

#[derive(Default)]
struct Mailbox {
    busy: bool,
    slot: Option<Pending>,
}

#[derive(Default)]
pub(crate) struct Mailboxes {
    inner: DashMap<Target, Mailbox>,
}

impl Mailboxes {
    /// Post `pending` to its target. Returns it back when the target was
    /// idle and the caller must start a worker for it.
    pub(crate) fn post(&self, target: Target, pending: Pending) -> Option<Pending> {
        let mut mailbox = self.inner.entry(target).or_default();
        if !mailbox.busy {
            mailbox.busy = true;
            return Some(pending);
        }
        if let Some(displaced) = mailbox.slot.replace(pending) {
            debug!(to = %target, "queued command superseded");
            let _ = displaced.reply.send(Ok(CommandOutcome::Superseded));
        }
        None
    }

    /// Take the queued intent after a call completes, or mark the target
    /// idle when there is none.
    pub(crate) fn next(&self, target: &Target) -> Option<Pending> {
        {
            let mut mailbox = self.inner.get_mut(target)?;
            if let Some(pending) = mailbox.slot.take() {
                return Some(pending);
            }
            mailbox.busy = false;
        }
        self.inner
            .remove_if(target, |_, m| !m.busy && m.slot.is_none());
        None
    }

    pub(crate) fn is_busy(&self, target: &Target) -> bool {
        self.inner.get(target).is_some_and(|m| m.busy)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::SceneId;

    fn pending(scene: u32) -> (Pending, oneshot::Receiver<Result<CommandOutcome, CoreError>>) {
        let (reply, rx) = oneshot::channel();
        (
            Pending {
                intent: Intent::RecallScene(SceneId(scene)),
                revision: None,
                reply,
            },
            rx,
        )
    }

    #[test]
    fn newer_intent_displaces_queued_one() {
        let boxes = Mailboxes::default();
        let target = Target::Scene(SceneId(1));

        let (first, _first_rx) = pending(1);
        assert!(boxes.post(target, first).is_some());

        let (second, mut second_rx) = pending(1);
        assert!(boxes.post(target, second).is_none());
        let (third, _third_rx) = pending(1);
        assert!(boxes.post(target, third).is_none());

        assert!(matches!(
            second_rx.try_recv().unwrap(),
            Ok(CommandOutcome::Superseded)
        ));
        assert!(boxes.next(&target).is_some());
        assert!(boxes.next(&target).is_none());
        assert!(!boxes.is_busy(&target));
    }
}
