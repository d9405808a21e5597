use crate::{
    game::GameState,
    store::{
        KeyValueStore,
        StateStore,
    },
};
use std::time::Duration;
use tracing::{
    debug,
    info,
};

pub const NOTIFICATION_TTL: Duration = Duration::from_millis(3000);

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Notification {
    pub title: &'static str,
    pub description: &'static str,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum NotificationKind {
    AttemptedReached,
    SecondChanceReached,
    GameOverReached,
    Win,
    Loss,
}

impl NotificationKind {
    /// State-entry message for `state`; `initial` has none.
    pub fn for_state(state: GameState) -> Option<Self> {
        match state {
            GameState::Initial => None,
            GameState::Attempted => Some(NotificationKind::AttemptedReached),
            GameState::SecondChance => Some(NotificationKind::SecondChanceReached),
            GameState::GameOver => Some(NotificationKind::GameOverReached),
        }
    }

    pub fn message(self) -> Notification {
        match self {
            NotificationKind::AttemptedReached => Notification {
                title: "Nice Try. Already Played",
                description: "You already made your choice. Try refreshing a few times for another chance",
            },
            NotificationKind::SecondChanceReached => Notification {
                title: "One Last Chance",
                description: "You're persistent. Choose wisely this time",
            },
            NotificationKind::GameOverReached => Notification {
                title: "Game Over. You Lost Twice",
                description: "No more chances available. Visit the destination directly",
            },
            NotificationKind::Win => Notification {
                title: "Success! You Chose Wisely",
                description: "Redirecting you to your next step...",
            },
            NotificationKind::Loss => Notification {
                title: "Oops, Wrong Choice",
                description: "That path was not meant for you. Enjoy the music!",
            },
        }
    }
}

/// Where the session stands as far as notifications are concerned.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Phase {
    Loading,
    Ready(GameState),
}

/// Decides whether entering a state deserves its one-time notification.
#[derive(Clone, Copy, Debug, Default)]
pub struct NotificationGate;

impl NotificationGate {
    /// Pure decision: the state to announce, if any.
    pub fn evaluate(phase: Phase, last_notified: Option<GameState>) -> Option<GameState> {
        let Phase::Ready(state) = phase else {
            return None;
        };
        NotificationKind::for_state(state)?;
        (last_notified != Some(state)).then_some(state)
    }

    /// Evaluates against the persisted `lastNotifiedState` and records the
    /// announcement so later loads in the same state stay quiet.
    pub fn observe<S: KeyValueStore>(
        &self,
        store: &mut StateStore<S>,
        phase: Phase,
    ) -> Option<Notification> {
        let last = store.last_notified();
        let Some(state) = Self::evaluate(phase, last) else {
            debug!(?phase, ?last, "state notification suppressed");
            return None;
        };
        store.set_last_notified(state);
        info!(%state, "state notification raised");
        NotificationKind::for_state(state).map(NotificationKind::message)
    }
}

/// The notification currently on screen and the id its dismissal is keyed on.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ActiveNotification {
    pub id: u64,
    pub notification: Notification,
    pub shown_at: Duration,
}

impl ActiveNotification {
    pub fn expires_at(&self) -> Duration {
        self.shown_at.saturating_add(NOTIFICATION_TTL)
    }
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]
    use super::*;
    use crate::store::InMemoryStore;

    #[test]
    fn evaluate__loading_suppresses_everything() {
        for last in [None, Some(GameState::Attempted)] {
            assert_eq!(NotificationGate::evaluate(Phase::Loading, last), None);
        }
    }

    #[test]
    fn evaluate__initial_never_notifies() {
        assert_eq!(
            NotificationGate::evaluate(Phase::Ready(GameState::Initial), None),
            None
        );
    }

    #[test]
    fn evaluate__announces_only_new_states() {
        let ready = Phase::Ready(GameState::SecondChance);
        assert_eq!(
            NotificationGate::evaluate(ready, Some(GameState::Attempted)),
            Some(GameState::SecondChance)
        );
        assert_eq!(
            NotificationGate::evaluate(ready, Some(GameState::SecondChance)),
            None
        );
    }

    #[test]
    fn observe__persists_and_then_suppresses() {
        // given
        let mut store = StateStore::new(InMemoryStore::new());
        let gate = NotificationGate;
        let phase = Phase::Ready(GameState::GameOver);

        // when
        let first = gate.observe(&mut store, phase);
        let second = gate.observe(&mut store, phase);

        // then
        assert_eq!(first, Some(NotificationKind::GameOverReached.message()));
        assert_eq!(second, None);
        assert_eq!(store.last_notified(), Some(GameState::GameOver));
    }
}
