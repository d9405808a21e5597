use crate::{
    game::Side,
    store::{
        KeyValueStore,
        StateStore,
    },
};
use rand::Rng;
use tracing::info;

/// Draws the winning side once per record. The draw is only persisted when the
/// store has no winner yet, so every later call returns the original.
#[derive(Debug)]
pub struct OutcomeAssigner<R> {
    rng: R,
}

impl<R: Rng> OutcomeAssigner<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    pub fn resolve<S: KeyValueStore>(&mut self, store: &mut StateStore<S>) -> Side {
        if let Some(existing) = store.winning_choice() {
            return existing;
        }
        let candidate: Side = self.rng.random();
        let winner = store.assign_winner_if_absent(candidate);
        info!(%winner, "winning choice assigned");
        winner
    }
}
