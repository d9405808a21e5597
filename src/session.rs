//! One page load's worth of game: resolves the record on load, takes choices,
//! and runs the delayed effects those choices schedule.

use crate::{
    dispatch::{
        Launcher,
        OutcomeDispatcher,
        Targets,
    },
    game::{
        ADVANCE_DELAY,
        Advance,
        ChoiceOutcome,
        DISTRACTION_DELAY,
        GameState,
        Side,
        WIN_REDIRECT_DELAY,
        apply_choice,
        resolve_on_load,
    },
    notification::{
        ActiveNotification,
        Notification,
        NotificationGate,
        NotificationKind,
        NOTIFICATION_TTL,
        Phase,
    },
    outcome::OutcomeAssigner,
    schedule::{
        Clock,
        Timeline,
    },
    store::{
        KeyValueStore,
        StateStore,
    },
};
use rand::Rng;
use std::time::Duration;
use tracing::{
    debug,
    info,
};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Effect {
    Dismiss(u64),
    Redirect,
    LaunchDistraction,
    Advance(Advance),
}

#[derive(Debug)]
pub struct Session<S, L, C> {
    store: StateStore<S>,
    dispatcher: OutcomeDispatcher<L>,
    clock: C,
    gate: NotificationGate,
    timeline: Timeline<Effect>,
    winner: Side,
    state: GameState,
    loaded: bool,
    notification: Option<ActiveNotification>,
    next_notification_id: u64,
    viewport: Option<(u16, u16)>,
    departed: bool,
}

impl<S, L, C> Session<S, L, C>
where
    S: KeyValueStore,
    L: Launcher,
    C: Clock,
{
    /// A page load: assigns the winner if needed, applies the load rules,
    /// persists what changed and raises the state notification if it is due.
    pub fn load<R: Rng + ?Sized>(
        store: S,
        dispatcher: OutcomeDispatcher<L>,
        clock: C,
        rng: &mut R,
    ) -> Self {
        let mut store = StateStore::new(store);
        let winner = OutcomeAssigner::new(&mut *rng).resolve(&mut store);
        let mut session = Self {
            store,
            dispatcher,
            clock,
            gate: NotificationGate,
            timeline: Timeline::new(),
            winner,
            state: GameState::Initial,
            loaded: false,
            notification: None,
            next_notification_id: 0,
            viewport: None,
            departed: false,
        };
        session.resolve_progress();
        session
    }

    /// A new page load against the same store. Whatever the old session still
    /// had scheduled is dropped with it.
    pub fn reload<R: Rng + ?Sized>(self, clock: C, rng: &mut R) -> Self {
        debug!(pending = self.timeline.len(), "reloading; pending effects dropped");
        let viewport = self.viewport;
        let mut session = Self::load(self.store.into_inner(), self.dispatcher, clock, rng);
        session.viewport = viewport;
        session
    }

    fn resolve_progress(&mut self) {
        let stored = self.store.stored_progress();
        let progress = resolve_on_load(stored);

        if progress.refresh_count != stored.refresh_count {
            self.store.set_refresh_count(progress.refresh_count);
        }
        if stored.state != Some(progress.state) {
            self.store.set_game_state(progress.state);
        }
        if progress.second_chance_granted && !stored.second_chance_granted {
            self.store.grant_second_chance();
            info!(refreshes = progress.refresh_count, "second chance granted");
        }

        self.state = progress.state;
        self.loaded = true;
        info!(
            state = %self.state,
            refresh_count = progress.refresh_count,
            "session loaded"
        );
        let now = self.clock.now();
        self.announce_state(now);
    }

    pub fn phase(&self) -> Phase {
        if self.loaded {
            Phase::Ready(self.state)
        } else {
            Phase::Loading
        }
    }

    fn announce_state(&mut self, at: Duration) {
        let phase = self.phase();
        if let Some(notification) = self.gate.observe(&mut self.store, phase) {
            self.show(at, notification);
        }
    }

    fn show(&mut self, at: Duration, notification: Notification) {
        let id = self.next_notification_id;
        self.next_notification_id += 1;
        self.notification = Some(ActiveNotification {
            id,
            notification,
            shown_at: at,
        });
        self.timeline
            .schedule(at, NOTIFICATION_TTL, Effect::Dismiss(id));
    }

    /// The visitor picked a card.
    pub fn choose(&mut self, pick: Side) -> Option<ChoiceOutcome> {
        if self.departed {
            debug!(%pick, "choice after departure ignored");
            return None;
        }
        let now = self.clock.now();
        let outcome = apply_choice(self.state, self.winner, pick);
        info!(%pick, state = %self.state, ?outcome, "choice made");

        match outcome {
            ChoiceOutcome::GameOver => {
                self.show(now, NotificationKind::GameOverReached.message());
            }
            ChoiceOutcome::AlreadyPlayed => {
                self.show(now, NotificationKind::AttemptedReached.message());
            }
            ChoiceOutcome::Win => {
                self.show(now, NotificationKind::Win.message());
                self.timeline
                    .schedule(now, WIN_REDIRECT_DELAY, Effect::Redirect);
            }
            ChoiceOutcome::Loss(advance) => {
                self.show(now, NotificationKind::Loss.message());
                self.timeline
                    .schedule(now, DISTRACTION_DELAY, Effect::LaunchDistraction);
                self.timeline
                    .schedule(now, ADVANCE_DELAY, Effect::Advance(advance));
            }
        }
        Some(outcome)
    }

    /// Runs every effect that has fallen due, including ones scheduled by
    /// effects run in this same call. Returns how many ran.
    pub fn tick(&mut self) -> usize {
        let now = self.clock.now();
        let mut ran = 0;
        loop {
            let due = self.timeline.drain_due(now);
            if due.is_empty() || self.departed {
                break;
            }
            for (at, effect) in due {
                if self.departed {
                    break;
                }
                self.run(at, effect);
                ran += 1;
            }
        }
        ran
    }

    fn run(&mut self, at: Duration, effect: Effect) {
        match effect {
            Effect::Dismiss(id) => {
                if self.notification.is_some_and(|active| active.id == id) {
                    self.notification = None;
                }
            }
            Effect::Redirect => {
                self.dispatcher.redirect();
                self.departed = true;
                debug!(dropped = self.timeline.len(), "departed");
                self.timeline = Timeline::new();
            }
            Effect::LaunchDistraction => {
                self.dispatcher.launch_distraction(self.viewport);
            }
            Effect::Advance(advance) => self.advance(at, advance),
        }
    }

    fn advance(&mut self, at: Duration, advance: Advance) {
        if advance.to < self.state {
            debug!(from = %self.state, to = %advance.to, "stale advance skipped");
            return;
        }
        let from = self.state;
        self.state = advance.to;
        self.store.set_game_state(advance.to);
        if let Some(baseline) = advance.refresh_baseline {
            self.store.set_refresh_count(baseline);
        }
        info!(%from, to = %advance.to, "game state advanced");
        self.announce_state(at);
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn is_interactive(&self) -> bool {
        self.state.is_interactive()
    }

    pub fn winner(&self) -> Side {
        self.winner
    }

    pub fn notification(&self) -> Option<&Notification> {
        self.notification
            .as_ref()
            .map(|active| &active.notification)
    }

    pub fn active_notification(&self) -> Option<&ActiveNotification> {
        self.notification.as_ref()
    }

    pub fn departed(&self) -> bool {
        self.departed
    }

    pub fn pending_effects(&self) -> usize {
        self.timeline.len()
    }

    pub fn next_wakeup(&self) -> Option<Duration> {
        self.timeline.next_due()
    }

    pub fn set_viewport(&mut self, viewport: Option<(u16, u16)>) {
        self.viewport = viewport;
    }

    pub fn store(&self) -> &StateStore<S> {
        &self.store
    }

    pub fn targets(&self) -> &Targets {
        self.dispatcher.targets()
    }
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]
    use super::*;
    use crate::test_helpers::TestContext;

    #[test]
    fn load__fresh_record_starts_initial_without_notification() {
        // given
        let mut ctx = TestContext::new();

        // when
        let session = ctx.load();

        // then
        assert_eq!(session.state(), GameState::Initial);
        assert_eq!(session.phase(), Phase::Ready(GameState::Initial));
        assert!(session.notification().is_none());
        let record = session.store().record();
        assert_eq!(record.winning_choice, Some(session.winner()));
        assert_eq!(record.game_state, Some(GameState::Initial));
        assert_eq!(record.refresh_count, 0);
    }

    #[test]
    fn choose__rejection_replaces_current_notification() {
        // given
        let mut ctx = TestContext::with_record(Side::Left, Some(GameState::GameOver));
        let mut session = ctx.load();
        let first = session.active_notification().copied().unwrap();

        // when
        ctx.clock.advance_ms(1000);
        session.choose(Side::Right);
        ctx.advance(&mut session, 2000);

        // then
        let current = session.active_notification().copied().unwrap();
        assert_ne!(current.id, first.id);
        assert_eq!(current.notification.title, "Game Over. You Lost Twice");
        assert_eq!(current.expires_at(), Duration::from_millis(4000));
    }

    #[test]
    fn notification__dismisses_after_exactly_three_seconds() {
        // given
        let mut ctx = TestContext::with_record(Side::Left, Some(GameState::GameOver));
        let mut session = ctx.load();
        assert!(session.notification().is_some());

        // when
        ctx.advance(&mut session, 2999);
        let before = session.notification().copied();
        ctx.advance(&mut session, 1);

        // then
        assert!(before.is_some());
        assert!(session.notification().is_none());
        assert_eq!(session.store().game_state(), Some(GameState::GameOver));
    }

    #[test]
    fn redirect__drops_the_remaining_schedule() {
        // given
        let mut ctx = TestContext::with_record(Side::Left, Some(GameState::Initial));
        let mut session = ctx.load();
        session.choose(Side::Right);
        ctx.clock.advance_ms(100);
        session.choose(Side::Left);

        // when
        ctx.advance(&mut session, 2500);

        // then
        assert!(session.departed());
        assert_eq!(session.pending_effects(), 0);
        assert_eq!(ctx.launcher.navigations(), 1);
        assert_eq!(ctx.launcher.windows(), 1);
        assert_eq!(session.store().game_state(), Some(GameState::Initial));
        assert_eq!(session.choose(Side::Left), None);
    }

    #[test]
    fn advance__announces_the_entered_state_once() {
        // given
        let mut ctx = TestContext::with_record(Side::Left, Some(GameState::SecondChance));
        let mut session = ctx.load();
        ctx.advance(&mut session, 3000);
        assert!(session.notification().is_none());

        // when
        session.choose(Side::Right);
        ctx.advance(&mut session, 3000);

        // then
        let announced = session.active_notification().copied().unwrap();
        assert_eq!(announced.notification.title, "Game Over. You Lost Twice");
        assert_eq!(announced.shown_at, Duration::from_millis(6000));
        assert_eq!(session.store().last_notified(), Some(GameState::GameOver));
        assert!(ctx.load().notification().is_none());
    }
}
