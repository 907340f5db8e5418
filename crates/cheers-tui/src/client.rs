//! Client orchestrator — wires the session controller to the TUI.
//!
//! Owns the event loop: a 50 ms cadence that renders, drives
//! [`SessionController::tick`], and translates keyboard input into
//! controller calls.

use std::path::PathBuf;

use tokio::time::{Duration, Instant};
use tracing::info;

use cheers_client::api::HttpApi;
use cheers_client::controller::SessionController;
use cheers_client::session::FileStore;
use cheers_client::state::Phase;
use cheers_core::rules::GameMode;

use crate::tui::{Tui, UserIntent};

pub async fn start_client(
    server_url: &str,
    name: Option<&str>,
    mode: GameMode,
    session_path: PathBuf,
) -> Result<(), Box<dyn std::error::Error>> {
    info!(server_url, "starting client");
    let api = HttpApi::new(server_url)?;
    let store = FileStore::new(session_path);
    let mut ctrl = SessionController::new(api, store, mode);

    // Recover a previous session and let the server route us.
    ctrl.bootstrap(Instant::now()).await;

    // A name on the command line skips the join form.
    if ctrl.state.phase == Phase::Joining
        && let Some(name) = name
    {
        ctrl.join(name, Instant::now()).await;
    }

    let mut tui = Tui::setup()?;
    let result = run_event_loop(&mut tui, &mut ctrl).await;
    tui.teardown()?;
    result
}

async fn run_event_loop(
    tui: &mut Tui,
    ctrl: &mut SessionController<HttpApi, FileStore>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut ticker = tokio::time::interval(Duration::from_millis(50));

    loop {
        tui.render(&ctrl.state)?;

        ticker.tick().await;
        ctrl.tick(Instant::now()).await;

        match tui.poll_and_handle_input(&ctrl.state)? {
            UserIntent::None => {}
            UserIntent::Quit => {
                ctrl.leave().await;
                break;
            }
            UserIntent::Join(name) => {
                ctrl.join(&name, Instant::now()).await;
            }
            UserIntent::Start => {
                ctrl.start().await;
            }
            UserIntent::Spin => {
                ctrl.spin().await;
            }
            UserIntent::Roll => {
                ctrl.roll(Instant::now());
            }
            UserIntent::QuizAnswer(letter) => {
                ctrl.answer_quiz(&letter, Instant::now()).await;
            }
            UserIntent::PickColor(color) => {
                ctrl.pick_color(color, Instant::now()).await;
            }
            UserIntent::DuelResult(we_won) => {
                ctrl.adjudicate_duel(we_won, Instant::now()).await;
            }
            UserIntent::DragonDraw => {
                ctrl.draw_dragon_gate(Instant::now()).await;
            }
            UserIntent::PromptDone => {
                ctrl.complete_prompt(Instant::now());
            }
            UserIntent::Reset => {
                ctrl.reset().await;
                break;
            }
        }
    }

    Ok(())
}
