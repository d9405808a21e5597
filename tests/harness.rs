#![allow(non_snake_case)]
use card_gate::{
    GameState,
    Session,
    Side,
    dispatch::OutcomeDispatcher,
    game::ChoiceOutcome,
    notification::NotificationKind,
    store::{
        KeyValueStore,
        LAST_NOTIFIED_KEY,
        WINNING_CHOICE_KEY,
    },
    test_helpers::*,
};
use rand::{
    SeedableRng,
    rngs::StdRng,
};

fn title(session: &TestSession) -> Option<&'static str> {
    session.notification().map(|n| n.title)
}

#[test]
fn fresh_record__losing_choice_opens_distraction_then_settles_attempted() {
    // given
    let mut ctx = TestContext::with_record(Side::Left, None);
    let mut session = ctx.load();
    assert_eq!(session.state(), GameState::Initial);

    // when
    let outcome = session.choose(Side::Right);

    // then
    assert!(matches!(outcome, Some(ChoiceOutcome::Loss(_))));
    assert_eq!(title(&session), Some("Oops, Wrong Choice"));

    ctx.advance(&mut session, 1499);
    assert_eq!(ctx.launcher.windows(), 0);
    ctx.advance(&mut session, 1);
    assert_eq!(ctx.launcher.windows(), 1);
    assert_eq!(session.state(), GameState::Initial);

    ctx.advance(&mut session, 1500);
    assert_eq!(session.state(), GameState::Attempted);
    let record = session.store().record();
    assert_eq!(record.game_state, Some(GameState::Attempted));
    assert_eq!(record.refresh_count, 1);
    assert_eq!(title(&session), Some("Nice Try. Already Played"));
    assert_eq!(ctx.launcher.navigations(), 0);
}

#[test]
fn attempted__third_load_grants_second_chance_once() {
    // given
    let mut ctx = TestContext::with_record(Side::Left, None);
    let mut session = ctx.load();
    session.choose(Side::Right);
    ctx.advance(&mut session, 3000);
    assert_eq!(session.store().refresh_count(), 1);

    // when / then
    let second = ctx.load();
    assert_eq!(second.state(), GameState::Attempted);
    assert_eq!(second.store().refresh_count(), 2);
    assert_eq!(title(&second), None);

    let third = ctx.load();
    assert_eq!(third.state(), GameState::SecondChance);
    assert_eq!(third.store().refresh_count(), 3);
    assert!(third.store().second_chance_granted());
    assert_eq!(title(&third), Some("One Last Chance"));
    assert!(third.is_interactive());

    let fourth = ctx.load();
    assert_eq!(fourth.state(), GameState::SecondChance);
    assert_eq!(fourth.store().refresh_count(), 3);
    assert_eq!(title(&fourth), None);
}

#[test]
fn second_chance__winning_choice_redirects_after_delay() {
    // given
    let mut ctx = TestContext::with_record(Side::Left, Some(GameState::SecondChance));
    let mut session = ctx.load();

    // when
    let outcome = session.choose(Side::Left);

    // then
    assert_eq!(outcome, Some(ChoiceOutcome::Win));
    assert_eq!(title(&session), Some("Success! You Chose Wisely"));
    ctx.advance(&mut session, 2499);
    assert_eq!(ctx.launcher.navigations(), 0);
    ctx.advance(&mut session, 1);
    assert_eq!(ctx.launcher.navigations(), 1);
    assert_eq!(
        ctx.launcher.events(),
        vec![LaunchEvent::Navigate(default_targets().destination)]
    );
    assert!(session.departed());
    assert_eq!(session.store().game_state(), Some(GameState::SecondChance));
}

#[test]
fn second_chance__losing_choice_ends_the_game() {
    // given
    let mut ctx = TestContext::with_record(Side::Left, Some(GameState::SecondChance));
    let mut session = ctx.load();

    // when
    session.choose(Side::Right);
    ctx.advance(&mut session, 3000);

    // then
    assert_eq!(session.state(), GameState::GameOver);
    assert_eq!(session.store().game_state(), Some(GameState::GameOver));
    assert_eq!(session.store().refresh_count(), 3);
    assert_eq!(title(&session), Some("Game Over. You Lost Twice"));
    assert!(!session.is_interactive());

    for pick in Side::ALL {
        ctx.advance(&mut session, 5000);
        assert_eq!(session.choose(pick), Some(ChoiceOutcome::GameOver));
        assert_eq!(title(&session), Some("Game Over. You Lost Twice"));
    }
    ctx.advance(&mut session, 5000);
    assert_eq!(ctx.launcher.navigations(), 0);
    assert_eq!(ctx.launcher.windows(), 1);
}

#[test]
fn game_over__reloads_stay_quiet_and_unchanged() {
    // given
    let mut ctx = TestContext::with_record(Side::Right, Some(GameState::GameOver));
    ctx.store
        .set(LAST_NOTIFIED_KEY, GameState::GameOver.as_str())
        .unwrap();

    // when
    let sessions: Vec<_> = (0..5).map(|_| ctx.load()).collect();

    // then
    for session in &sessions {
        assert_eq!(session.state(), GameState::GameOver);
        assert_eq!(title(session), None);
        assert_eq!(session.store().refresh_count(), 3);
    }
}

#[test]
fn game_over__clicks_only_notify() {
    // given
    let mut ctx = TestContext::with_record(Side::Right, Some(GameState::GameOver));
    let mut session = ctx.load();

    // when
    for _ in 0..4 {
        session.choose(Side::Right);
        ctx.advance(&mut session, 100);
    }

    // then
    assert!(ctx.launcher.events().is_empty());
    assert_eq!(session.store().game_state(), Some(GameState::GameOver));
    assert_eq!(
        session.notification().copied(),
        Some(NotificationKind::GameOverReached.message())
    );
}

#[test]
fn attempted__clicks_repeat_the_already_played_message() {
    // given
    let mut ctx = TestContext::with_record(Side::Left, Some(GameState::Attempted));
    let mut session = ctx.load();
    ctx.advance(&mut session, 3000);
    assert_eq!(title(&session), None);

    // when
    let outcome = session.choose(Side::Left);

    // then
    assert_eq!(outcome, Some(ChoiceOutcome::AlreadyPlayed));
    assert_eq!(title(&session), Some("Nice Try. Already Played"));
    assert_eq!(session.pending_effects(), 1);
}

#[test]
fn winner__survives_every_reload() {
    // given
    let mut ctx = TestContext::new();
    let first = ctx.load().winner();

    // when
    let later: Vec<Side> = (0..10).map(|_| ctx.load().winner()).collect();

    // then
    assert!(later.iter().all(|winner| *winner == first));
    assert_eq!(
        ctx.store.get(WINNING_CHOICE_KEY).unwrap().as_deref(),
        Some(first.as_str())
    );
}

#[test]
fn reload__drops_effects_scheduled_by_the_old_page() {
    // given
    let mut ctx = TestContext::with_record(Side::Left, None);
    let mut session = ctx.load();
    session.choose(Side::Right);
    ctx.advance(&mut session, 1000);

    // when
    let mut session = session.reload(ctx.clock.clone(), &mut StdRng::seed_from_u64(9));
    ctx.advance(&mut session, 5000);

    // then
    assert_eq!(ctx.launcher.windows(), 0);
    assert_eq!(session.state(), GameState::Initial);
    assert_eq!(session.pending_effects(), 0);
}

#[test]
fn blocked_launcher__loss_still_advances_silently() {
    // given
    let mut ctx = TestContext::with_record(Side::Left, None);
    ctx.launcher = RecordingLauncher::blocked();
    let mut session = ctx.load();

    // when
    session.choose(Side::Right);
    ctx.advance(&mut session, 3000);

    // then
    assert_eq!(ctx.launcher.attempts(), 1);
    assert!(ctx.launcher.events().is_empty());
    assert_eq!(session.state(), GameState::Attempted);
}

#[test]
fn unavailable_store__plays_from_first_time_defaults() {
    // given
    let launcher = RecordingLauncher::new();
    let clock = ManualClock::new();
    let mut session = Session::load(
        FailingStore,
        OutcomeDispatcher::new(launcher.clone(), default_targets()),
        clock.clone(),
        &mut StdRng::seed_from_u64(3),
    );
    assert_eq!(session.state(), GameState::Initial);
    assert!(session.notification().is_none());

    // when
    let winner = session.winner();
    session.choose(winner);
    clock.advance_ms(2500);
    session.tick();

    // then
    assert_eq!(launcher.navigations(), 1);
    assert!(session.departed());
}

#[test]
fn garbage_record__reads_as_absent() {
    // given
    let mut ctx = TestContext::new();
    ctx.store.set(WINNING_CHOICE_KEY, "middle").unwrap();
    ctx.store
        .set(card_gate::store::GAME_STATE_KEY, "victorious")
        .unwrap();
    ctx.store
        .set(card_gate::store::REFRESH_COUNT_KEY, "lots")
        .unwrap();

    // when
    let session = ctx.load();

    // then
    let record = session.store().record();
    assert_eq!(record.winning_choice, Some(session.winner()));
    assert_eq!(record.game_state, Some(GameState::Initial));
    assert_eq!(record.refresh_count, 0);
}
