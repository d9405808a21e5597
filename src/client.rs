use crate::ui;
use card_gate::{
    Session,
    config::AppConfig,
    dispatch::{
        OutcomeDispatcher,
        SystemLauncher,
        Targets,
    },
    schedule::TokioClock,
    store::{
        KeyValueStore,
        StateStore,
    },
};
use color_eyre::eyre::Result;
use std::time::Duration;
use tokio::time;
use tracing::info;

const TICK: Duration = Duration::from_millis(50);

type LiveSession<S> = Session<S, SystemLauncher, TokioClock>;

pub async fn run_app(config: AppConfig) -> Result<()> {
    info!(store = ?config.store, destination = %config.targets.destination, "starting");
    run_with_store(config.store.open(), config.targets).await
}

/// Prints the persisted record as JSON.
pub fn print_status(config: AppConfig) -> Result<()> {
    let record = StateStore::new(config.store.open()).record();
    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}

async fn run_with_store<S: KeyValueStore>(store: S, targets: Targets) -> Result<()> {
    let mut ui_state = ui::UiState::default();

    // UI bootstrap
    ui::terminal_enter(&mut ui_state)?;
    let res = run_loop(store, targets, &mut ui_state).await;
    ui::terminal_exit()?;
    res
}

fn view<S: KeyValueStore>(session: &LiveSession<S>) -> ui::View<'_> {
    ui::View::Ready {
        state: session.state(),
        notification: session.notification(),
        destination_host: session.targets().destination_host(),
    }
}

async fn run_loop<S: KeyValueStore>(
    store: S,
    targets: Targets,
    ui_state: &mut ui::UiState,
) -> Result<()> {
    ui::draw(ui_state, &ui::View::Loading)?;
    let mut session = Session::load(
        store,
        OutcomeDispatcher::new(SystemLauncher, targets),
        TokioClock::start(),
        &mut rand::rng(),
    );
    session.set_viewport(ui::viewport());
    ui::draw(ui_state, &view(&session))?;

    let mut events = ui::input_event_stream();
    let mut ticker = time::interval(TICK);
    ticker.set_missed_tick_behavior(time::MissedTickBehavior::Skip);
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => { break; }
            _ = ticker.tick() => {
                if session.tick() > 0 {
                    if session.departed() {
                        info!("departed to destination; exiting");
                        break;
                    }
                    ui::draw(ui_state, &view(&session))?;
                }
            }
            ev = ui::next_event(ui_state, &mut events) => {
                match ev? {
                    ui::UserEvent::Quit => break,
                    ui::UserEvent::Choose(side) => { session.choose(side); },
                    ui::UserEvent::Reload => {
                        ui::draw(ui_state, &ui::View::Loading)?;
                        session = session.reload(TokioClock::start(), &mut rand::rng());
                    }
                    ui::UserEvent::Resize(width, height) => {
                        session.set_viewport(Some((width, height)));
                    }
                    ui::UserEvent::Redraw => {}
                }
                ui::draw(ui_state, &view(&session))?;
            }
        }
    }
    Ok(())
}
