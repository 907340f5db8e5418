//! The per-session controller.
//!
//! Owns the identity, the shadow [`ClientState`], every poll deadline
//! (room 1 s, wheel 500 ms, game 1 s, heartbeat 5 s), the local wheel
//! and dice animations, and the deferred actions between an event and
//! the turn advancing. Frontends call [`SessionController::tick`] from
//! their event loop and the user-operation methods on input; everything
//! else happens through the tick.
//!
//! Polls for one stream never overlap: `tick` awaits each due poll to
//! completion, so a stale response cannot land after a newer one.
//! Heartbeats are the one fire-and-forget exception; their failures are
//! logged and never surfaced.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::time::{Duration, Instant};
use tracing::{debug, info, warn};

use cheers_core::dice::{DiceShuffle, SHUFFLE_TICK};
use cheers_core::protocol::{PumpEventRequest, validate_player_name};
use cheers_core::rules::{
    DiceEvent, DragonGate, DuelKind, GameMode, PumpTrigger, WineColor, dice_event,
};
use cheers_core::wheel::{TICK as WHEEL_TICK, WheelAnimation};

use crate::api::GameApi;
use crate::session::{SessionStore, StoredSession};
use crate::state::{
    ActivePrompt, ClientState, LogCategory, Phase, StateChanged, WheelStage,
};

pub const ROOM_POLL: Duration = Duration::from_secs(1);
pub const WHEEL_POLL: Duration = Duration::from_millis(500);
pub const GAME_POLL: Duration = Duration::from_secs(1);
pub const HEARTBEAT: Duration = Duration::from_secs(5);

/// Display time for the finished draw before the game screen opens.
pub const WHEEL_RESULT_DELAY: Duration = Duration::from_secs(3);

/// Pause between an event resolving and the turn advancing.
pub const TURN_ADVANCE_DELAY: Duration = Duration::from_millis(1500);

/// An action scheduled for a later tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Deferred {
    /// Notify the server our turn is over.
    NextTurn,
    /// Leave the finished wheel for the game screen.
    EnterGame,
}

/// Owns one player session end to end.
pub struct SessionController<A, S> {
    api: A,
    store: S,
    pub state: ClientState,
    rng: StdRng,

    next_room_poll: Option<Instant>,
    next_wheel_poll: Option<Instant>,
    next_game_poll: Option<Instant>,
    next_heartbeat: Option<Instant>,

    wheel_anim: Option<(WheelAnimation, Instant)>,
    dice_shuffle: Option<(DiceShuffle, Instant)>,
    deferred: Vec<(Instant, Deferred)>,
}

impl<A, S> SessionController<A, S>
where
    A: GameApi + Clone + Send + Sync + 'static,
    S: SessionStore,
{
    pub fn new(api: A, store: S, mode: GameMode) -> Self {
        SessionController {
            api,
            store,
            state: ClientState::new(mode),
            rng: StdRng::from_os_rng(),
            next_room_poll: None,
            next_wheel_poll: None,
            next_game_poll: None,
            next_heartbeat: None,
            wheel_anim: None,
            dice_shuffle: None,
            deferred: Vec::new(),
        }
    }

    /// Construct with a caller-provided RNG, for deterministic tests.
    pub fn with_rng(api: A, store: S, mode: GameMode, rng: StdRng) -> Self {
        let mut controller = Self::new(api, store, mode);
        controller.rng = rng;
        controller
    }

    // ------------------------------------------------------------------
    // Session bootstrap
    // ------------------------------------------------------------------

    /// Restore any persisted session and ask the server where we belong.
    ///
    /// A failed fetch leaves the user on the join screen; the next
    /// action retries implicitly.
    pub async fn bootstrap(&mut self, now: Instant) -> StateChanged {
        let mut changed = StateChanged::default();

        if let Some(session) = self.store.load() {
            info!(player_id = %session.player_id, "restoring persisted session");
            self.api.set_identity(&session.player_id);
            self.state.our_id = Some(session.player_id);
            self.state.our_name = Some(session.player_name);
            self.state.mode = session.mode;
            if !session.players.is_empty() {
                self.state.seated = session.players;
                self.state.round = session.round.max(1);
                self.state.turn_index = session.turn_index;
            }
        }

        if self.state.our_id.is_some() {
            match self.api.player_state().await {
                Ok(response) => changed.merge(self.state.apply_bootstrap(&response)),
                Err(e) => debug!(error = %e, "bootstrap fetch failed"),
            }
        }

        self.sync_timers(now);
        changed
    }

    // ------------------------------------------------------------------
    // Room operations
    // ------------------------------------------------------------------

    /// Join the room under `name`. Validation failures never reach the
    /// network; server rejections surface as a log notice.
    pub async fn join(&mut self, name: &str, now: Instant) -> StateChanged {
        let mut changed = StateChanged::default();
        if let Err(message) = validate_player_name(name) {
            self.state.add_notice(message, LogCategory::Error);
            changed.log = true;
            return changed;
        }

        let name = name.trim();
        match self.api.join_room(name).await {
            Ok(response) => {
                info!(player_id = %response.player_id, "joined room");
                self.api.set_identity(&response.player_id);
                changed.merge(self.state.apply_join(name, &response));
                self.save_session();
            }
            Err(e) => {
                warn!(error = %e, "join failed");
                self.state.add_notice(e.display_message(), LogCategory::Error);
                changed.log = true;
            }
        }
        self.sync_timers(now);
        changed
    }

    /// Leave the room. The notify is best-effort; timers stop and the
    /// persisted session clears no matter what the network does.
    pub async fn leave(&mut self) -> StateChanged {
        if let Some(id) = self.state.our_id.clone()
            && let Err(e) = self.api.leave_room(&id).await
        {
            debug!(error = %e, "leave notify failed");
        }
        self.teardown();
        self.state.phase = Phase::Disconnected;
        StateChanged {
            phase: true,
            ..Default::default()
        }
    }

    /// Host-only start request. The poll loop, not this call, performs
    /// the screen transition.
    pub async fn start(&mut self) -> StateChanged {
        let mut changed = StateChanged::default();
        let Some(id) = self.state.our_id.clone() else {
            return changed;
        };
        if !self.state.is_host {
            self.state
                .add_notice("Only the host can start the game", LogCategory::Error);
            changed.log = true;
            return changed;
        }
        if let Err(e) = self.api.start_game(&id).await {
            warn!(error = %e, "start rejected");
            self.state.add_notice(e.display_message(), LogCategory::Error);
            changed.log = true;
        }
        changed
    }

    // ------------------------------------------------------------------
    // Wheel operations
    // ------------------------------------------------------------------

    /// Host-only spin request. Every client, the host included, then
    /// observes the spin through the wheel poll.
    pub async fn spin(&mut self) -> StateChanged {
        let mut changed = StateChanged::default();
        let Some(id) = self.state.our_id.clone() else {
            return changed;
        };
        if self.state.phase != Phase::Wheel(WheelStage::Idle) {
            return changed;
        }
        match self.api.spin_wheel(&id).await {
            Ok(response) => {
                debug!(seed = response.spin_seed, winner = response.winner_index, "spin accepted");
            }
            Err(e) => {
                warn!(error = %e, "spin rejected");
                self.state.add_notice(e.display_message(), LogCategory::Error);
                changed.log = true;
            }
        }
        changed
    }

    // ------------------------------------------------------------------
    // Game operations
    // ------------------------------------------------------------------

    /// Start the cosmetic dice shuffle if it is our turn and nothing is
    /// already rolling. The real submit happens when the shuffle ends.
    pub fn roll(&mut self, now: Instant) -> StateChanged {
        let mut changed = StateChanged::default();
        if self.state.phase != Phase::Playing {
            return changed;
        }
        if self.state.rolling {
            return changed;
        }
        if !self.state.is_my_turn() {
            self.state.add_notice("Not your turn", LogCategory::Error);
            changed.log = true;
            return changed;
        }
        self.state.rolling = true;
        let shuffle = DiceShuffle::start(&mut self.rng);
        self.state.dice = Some(shuffle.faces);
        self.dice_shuffle = Some((shuffle, now + SHUFFLE_TICK));
        changed.board = true;
        changed
    }

    /// Answer the active quiz with an option letter.
    pub async fn answer_quiz(&mut self, choice: &str, now: Instant) -> StateChanged {
        let Some(ActivePrompt::Quiz { answer, .. }) = self.state.prompt.clone() else {
            return StateChanged::default();
        };
        let mut changed = self.state.close_prompt();
        let correct = choice.eq_ignore_ascii_case(&answer);
        let delta = if correct { 1 } else { -1 };
        let text = if correct {
            "Correct! +1 point"
        } else {
            "Wrong answer, -1 point"
        };
        self.state.add_notice(text, LogCategory::Action);
        changed.log = true;
        if let Some(id) = self.state.our_id.clone() {
            changed.merge(self.submit_score(&id, delta).await);
        }
        self.schedule(now + TURN_ADVANCE_DELAY, Deferred::NextTurn);
        changed
    }

    /// Resolve the pick-a-color prompt (dice sum 7).
    pub async fn pick_color(&mut self, color: WineColor, now: Instant) -> StateChanged {
        if !matches!(self.state.prompt, Some(ActivePrompt::PickColor)) {
            return StateChanged::default();
        }
        let mut changed = self.state.close_prompt();
        changed.merge(self.pour(PumpTrigger::Score, Some(7), Some(color)).await);
        self.schedule(now + TURN_ADVANCE_DELAY, Deferred::NextTurn);
        changed
    }

    /// Adjudicate the active duel: `we_won` is the acting player's view.
    ///
    /// Family black-white moves a point from loser to winner; drunk
    /// duels give the loser a forced drink.
    pub async fn adjudicate_duel(&mut self, we_won: bool, now: Instant) -> StateChanged {
        let Some(ActivePrompt::Duel { kind, opponent_id, .. }) = self.state.prompt.clone()
        else {
            return StateChanged::default();
        };
        let mut changed = self.state.close_prompt();
        let Some(our_id) = self.state.our_id.clone() else {
            return changed;
        };
        let (winner, loser) = if we_won {
            (our_id.clone(), opponent_id)
        } else {
            (opponent_id, our_id.clone())
        };

        match (self.state.mode, kind) {
            (GameMode::Family, _) => {
                changed.merge(self.submit_score(&winner, 1).await);
                changed.merge(self.submit_score(&loser, -1).await);
                self.state.add_notice(
                    format!("{} wins the duel", self.state.player_name(&winner)),
                    LogCategory::Winner,
                );
                changed.log = true;
                self.schedule(now + TURN_ADVANCE_DELAY, Deferred::NextTurn);
            }
            (GameMode::Drunk, _) => {
                self.state.add_notice(
                    format!(
                        "{} loses the {} duel and drinks",
                        self.state.player_name(&loser),
                        kind.label()
                    ),
                    LogCategory::Winner,
                );
                changed.log = true;
                changed.merge(self.forced_drink(&loser, now).await);
            }
        }
        changed
    }

    /// Draw the third dragon-gate card and resolve the verdict.
    pub async fn draw_dragon_gate(&mut self, now: Instant) -> StateChanged {
        let Some(ActivePrompt::DragonGate { gate }) = self.state.prompt else {
            return StateChanged::default();
        };
        let mut changed = self.state.close_prompt();
        let card = DragonGate::third(&mut self.rng);
        if gate.passes(card) {
            self.state.add_notice(
                format!("Drew {card}: through the gate, safe!"),
                LogCategory::Action,
            );
            changed.log = true;
            self.schedule(now + TURN_ADVANCE_DELAY, Deferred::NextTurn);
        } else {
            self.state.add_notice(
                format!("Drew {card}: outside the gate, drink up"),
                LogCategory::Action,
            );
            changed.log = true;
            let Some(id) = self.state.our_id.clone() else {
                return changed;
            };
            changed.merge(self.forced_drink(&id, now).await);
        }
        changed
    }

    /// Dismiss the truth-or-dare prompt once performed.
    pub fn complete_prompt(&mut self, now: Instant) -> StateChanged {
        if !matches!(self.state.prompt, Some(ActivePrompt::TruthOrDare { .. })) {
            return StateChanged::default();
        }
        let changed = self.state.close_prompt();
        self.schedule(now + TURN_ADVANCE_DELAY, Deferred::NextTurn);
        changed
    }

    /// Full reset: clear local storage, best-effort reset the server
    /// game, best-effort leave, drop the identity, stop every timer.
    pub async fn reset(&mut self) -> StateChanged {
        if let Err(e) = self.api.reset_game().await {
            debug!(error = %e, "game reset failed");
        }
        if let Some(id) = self.state.our_id.clone()
            && let Err(e) = self.api.leave_room(&id).await
        {
            debug!(error = %e, "leave during reset failed");
        }
        self.api.clear_identity();
        self.teardown();
        let mode = self.state.mode;
        self.state = ClientState::new(mode);
        self.state.phase = Phase::Disconnected;
        StateChanged {
            phase: true,
            ..Default::default()
        }
    }

    // ------------------------------------------------------------------
    // Tick loop
    // ------------------------------------------------------------------

    /// Drive everything that is due at `now`: animations, polls, the
    /// heartbeat, and deferred actions. Returns the merged change set.
    pub async fn tick(&mut self, now: Instant) -> StateChanged {
        let mut changed = StateChanged::default();

        changed.merge(self.step_wheel_animation(now).await);
        changed.merge(self.step_dice_shuffle(now).await);
        changed.merge(self.run_due_polls(now).await);
        self.fire_heartbeat(now);
        changed.merge(self.fire_deferred(now).await);

        self.sync_timers(now);
        changed
    }

    async fn step_wheel_animation(&mut self, now: Instant) -> StateChanged {
        let mut changed = StateChanged::default();
        let Some((anim, due)) = &mut self.wheel_anim else {
            return changed;
        };
        if now < *due {
            return changed;
        }
        // Catch up every elapsed tick so the replay does not slow down
        // under a coarse frontend tick rate.
        let mut running = true;
        while running && *due <= now {
            running = anim.step();
            *due += WHEEL_TICK;
        }
        self.state.wheel_angle = anim.angle;
        changed.wheel = true;
        if !running {
            self.wheel_anim = None;
            debug!("wheel replay finished, notifying server");
            // Every client reports completion; the server takes the
            // first and ignores the rest.
            if let Err(e) = self.api.finish_wheel().await {
                debug!(error = %e, "wheel finish notify failed");
            }
        }
        changed
    }

    async fn step_dice_shuffle(&mut self, now: Instant) -> StateChanged {
        let mut changed = StateChanged::default();
        let Some((shuffle, due)) = &mut self.dice_shuffle else {
            return changed;
        };
        if now < *due {
            return changed;
        }
        let more = shuffle.step(&mut self.rng);
        self.state.dice = Some(shuffle.faces);
        *due += SHUFFLE_TICK;
        changed.board = true;
        if !more {
            let shuffle = self.dice_shuffle.take().map(|(s, _)| s);
            if let Some(shuffle) = shuffle {
                changed.merge(self.submit_roll(shuffle, now).await);
            }
        }
        changed
    }

    /// Submit the final faces and, as the acting client, evaluate the
    /// event table. Observers only ever render synced numbers.
    async fn submit_roll(&mut self, shuffle: DiceShuffle, now: Instant) -> StateChanged {
        let mut changed = StateChanged::default();
        let Some(id) = self.state.our_id.clone() else {
            self.state.rolling = false;
            return changed;
        };
        let (d1, d2) = shuffle.final_faces;
        match self.api.roll_dice(&id, d1, d2).await {
            Ok(response) => {
                // The server's recorded pair is truth, even for our own
                // roll; normally it echoes what we submitted.
                let (d1, d2) = match response.dice_values.as_slice() {
                    [a, b] => (*a, *b),
                    _ => (d1, d2),
                };
                self.state.dice = Some((d1, d2));
                let sum = d1 + d2;
                debug!(sum, "roll recorded");
                self.state
                    .add_notice(format!("Rolled {d1} + {d2} = {sum}"), LogCategory::Action);
                changed.board = true;
                changed.log = true;
                changed.merge(self.handle_dice_event(sum, d1 == d2, now).await);
            }
            Err(e) => {
                // The roll stays local; the next poll re-converges and
                // the player may roll again.
                warn!(error = %e, "roll submit failed");
                self.state.add_notice(e.display_message(), LogCategory::Error);
                changed.log = true;
            }
        }
        self.state.rolling = false;
        changed
    }

    async fn handle_dice_event(&mut self, sum: u8, is_double: bool, now: Instant) -> StateChanged {
        let mut changed = StateChanged::default();
        let our_id = match self.state.our_id.clone() {
            Some(id) => id,
            None => return changed,
        };
        let event = dice_event(self.state.mode, sum, is_double);
        info!(sum, is_double, ?event, "dice event");

        match event {
            DiceEvent::Nothing => {
                self.state
                    .add_notice("Nothing happens this turn", LogCategory::Info);
                changed.log = true;
                self.schedule(now + TURN_ADVANCE_DELAY, Deferred::NextTurn);
            }
            DiceEvent::ForcedDrink => {
                self.state.add_notice("Drink up!", LogCategory::Action);
                changed.log = true;
                changed.merge(self.forced_drink(&our_id, now).await);
            }
            DiceEvent::Quiz => match self.api.quiz().await {
                Ok(question) => {
                    changed.merge(self.state.open_prompt(ActivePrompt::Quiz {
                        question: question.question,
                        options: question.options,
                        answer: question.answer,
                    }));
                }
                Err(e) => {
                    debug!(error = %e, "quiz fetch failed");
                    self.schedule(now + TURN_ADVANCE_DELAY, Deferred::NextTurn);
                }
            },
            DiceEvent::RandomWine => {
                let color = WineColor::random(&mut self.rng);
                changed.merge(self.pour(PumpTrigger::Score, Some(sum), Some(color)).await);
                self.schedule(now + TURN_ADVANCE_DELAY, Deferred::NextTurn);
            }
            DiceEvent::PickWine => {
                changed.merge(self.state.open_prompt(ActivePrompt::PickColor));
            }
            DiceEvent::Duel(kind) => {
                changed.merge(self.open_duel(kind, &our_id, now));
            }
            DiceEvent::TruthOrDare => {
                let is_truth = self.rng.random_bool(0.5);
                let fetched = if is_truth {
                    self.api.truth().await
                } else {
                    self.api.dare().await
                };
                match fetched {
                    Ok(prompt) => {
                        changed.merge(self.state.open_prompt(ActivePrompt::TruthOrDare {
                            is_truth,
                            question: prompt.question,
                        }));
                    }
                    Err(e) => {
                        debug!(error = %e, "prompt fetch failed");
                        self.schedule(now + TURN_ADVANCE_DELAY, Deferred::NextTurn);
                    }
                }
            }
            DiceEvent::DragonGate => {
                let gate = DragonGate::draw(&mut self.rng);
                self.state.add_notice(
                    format!("Dragon gate: {} and {}", gate.low, gate.high),
                    LogCategory::Action,
                );
                changed.log = true;
                changed.merge(self.state.open_prompt(ActivePrompt::DragonGate { gate }));
            }
        }
        changed
    }

    fn open_duel(&mut self, kind: DuelKind, our_id: &str, now: Instant) -> StateChanged {
        let opponents = self.state.opponents_of(our_id);
        if opponents.is_empty() {
            self.schedule(now + TURN_ADVANCE_DELAY, Deferred::NextTurn);
            return StateChanged::default();
        }
        let pick = self.rng.random_range(0..opponents.len());
        let opponent = opponents[pick];
        let (opponent_id, opponent_name) =
            (opponent.player_id.clone(), opponent.player_name.clone());
        let mut changed = self.state.open_prompt(ActivePrompt::Duel {
            kind,
            opponent_id,
            opponent_name: opponent_name.clone(),
        });
        self.state.add_notice(
            format!("{} duel against {opponent_name}", kind.label()),
            LogCategory::Action,
        );
        changed.log = true;
        changed
    }

    /// The forced-drink sequence: score +1 for the drinker, refill pump,
    /// fresh base color, round advance in family mode, then the turn.
    async fn forced_drink(&mut self, drinker_id: &str, now: Instant) -> StateChanged {
        let mut changed = self.submit_score(drinker_id, 1).await;
        changed.merge(self.pour(PumpTrigger::AfterDrink, None, None).await);
        changed.merge(self.reset_base_color().await);

        if self.state.mode == GameMode::Family {
            let new_round = self.state.round + 1;
            match self
                .api
                .increment_round(drinker_id, new_round)
                .await
            {
                Ok(response) => {
                    if let Some(round) = response.current_round
                        && self.state.round != round
                    {
                        self.state.round = round;
                        changed.turn = true;
                    }
                }
                Err(e) => debug!(error = %e, "round increment failed"),
            }
        }

        self.schedule(now + TURN_ADVANCE_DELAY, Deferred::NextTurn);
        changed
    }

    /// Report a pump event and optionally add a wine color to the stack.
    async fn pour(
        &mut self,
        trigger: PumpTrigger,
        sum: Option<u8>,
        color: Option<WineColor>,
    ) -> StateChanged {
        let mut changed = StateChanged::default();
        let request = PumpEventRequest {
            mode: self.state.mode,
            event: trigger,
            score: sum,
        };
        match self.api.pump_event(&request).await {
            Ok(response) => {
                if let Some(duration) = response.duration {
                    debug!(?trigger, duration, "pump ran");
                }
            }
            Err(e) => debug!(error = %e, "pump event failed"),
        }

        if let Some(color) = color
            && let Some(id) = self.state.our_id.clone()
        {
            match self.api.add_wine(&id, color).await {
                Ok(response) => {
                    self.state.wine_stack = response.wine_stack;
                    self.state.add_notice(
                        format!("{} added to the glass", color.label()),
                        LogCategory::Action,
                    );
                    changed.board = true;
                    changed.log = true;
                }
                Err(e) => debug!(error = %e, "add wine failed"),
            }
        }
        changed
    }

    /// Ask the server for a fresh base color; the stack clears with it.
    async fn reset_base_color(&mut self) -> StateChanged {
        let mut changed = StateChanged::default();
        let Some(id) = self.state.our_id.clone() else {
            return changed;
        };
        match self.api.set_base_wine(&id).await {
            Ok(response) => {
                self.state.base_color = Some(response.base_wine_color);
                self.state.wine_stack = response.wine_stack;
                self.state.add_notice(
                    format!("New base: {}", response.base_wine_color.label()),
                    LogCategory::System,
                );
                changed.board = true;
                changed.log = true;
            }
            Err(e) => debug!(error = %e, "base reset failed"),
        }
        changed
    }

    /// Post a score delta and adopt the server's absolute answer.
    async fn submit_score(&mut self, player_id: &str, delta: i32) -> StateChanged {
        match self.api.update_score(player_id, delta).await {
            Ok(response) => self.state.apply_score(player_id, response.new_score),
            Err(e) => {
                debug!(error = %e, "score update failed");
                StateChanged::default()
            }
        }
    }

    /// Notify the server our turn ended, adopting its index. The local
    /// wraparound fallback applies only when the request never arrived;
    /// a rejection means someone else already advanced it.
    async fn advance_turn(&mut self) -> StateChanged {
        let Some(id) = self.state.our_id.clone() else {
            return StateChanged::default();
        };
        match self.api.next_turn(&id).await {
            Ok(response) => self.state.apply_next_turn(response.current_turn_index),
            Err(e) if e.is_transport() => {
                debug!(error = %e, "next turn lost in transit, advancing locally");
                self.state.local_next_turn()
            }
            Err(e) => {
                debug!(error = %e, "next turn rejected");
                StateChanged::default()
            }
        }
    }

    // ------------------------------------------------------------------
    // Polls
    // ------------------------------------------------------------------

    async fn run_due_polls(&mut self, now: Instant) -> StateChanged {
        let mut changed = StateChanged::default();

        if matches!(self.state.phase, Phase::Lobby | Phase::Queued)
            && self.next_room_poll.is_some_and(|due| now >= due)
        {
            self.next_room_poll = Some(now + ROOM_POLL);
            match self.api.room_state().await {
                Ok(snapshot) => changed.merge(self.state.apply_room_snapshot(&snapshot)),
                Err(e) => debug!(error = %e, "room poll failed"),
            }
        }

        if matches!(self.state.phase, Phase::Wheel(_))
            && self.next_wheel_poll.is_some_and(|due| now >= due)
        {
            self.next_wheel_poll = Some(now + WHEEL_POLL);
            match self.api.wheel_state().await {
                Ok(snapshot) => {
                    let was_finished = self.state.phase == Phase::Wheel(WheelStage::Finished);
                    changed.merge(self.state.apply_wheel_snapshot(&snapshot));
                    if let Some((seed, winner)) = self.state.take_pending_replay() {
                        info!(seed, winner, "replaying wheel spin");
                        self.wheel_anim = Some((WheelAnimation::new(seed), now + WHEEL_TICK));
                    }
                    if !was_finished && self.state.phase == Phase::Wheel(WheelStage::Finished) {
                        // Draw complete: show the order, then enter the
                        // game after the display delay.
                        self.wheel_anim = None;
                        self.schedule(now + WHEEL_RESULT_DELAY, Deferred::EnterGame);
                    }
                }
                Err(e) => debug!(error = %e, "wheel poll failed"),
            }
        }

        if self.state.phase == Phase::Playing && self.next_game_poll.is_some_and(|due| now >= due)
        {
            self.next_game_poll = Some(now + GAME_POLL);
            match self.api.game_state().await {
                Ok(snapshot) => changed.merge(self.state.apply_game_snapshot(&snapshot, now)),
                Err(e) => debug!(error = %e, "game poll failed"),
            }
        }

        changed
    }

    fn fire_heartbeat(&mut self, now: Instant) {
        let Some(id) = self.state.our_id.clone() else {
            return;
        };
        if self.state.phase == Phase::Disconnected {
            return;
        }
        if !self.next_heartbeat.is_some_and(|due| now >= due) {
            return;
        }
        self.next_heartbeat = Some(now + HEARTBEAT);
        let api = self.api.clone();
        tokio::spawn(async move {
            if let Err(e) = api.heartbeat(&id).await {
                debug!(error = %e, "heartbeat failed");
            }
        });
    }

    async fn fire_deferred(&mut self, now: Instant) -> StateChanged {
        let mut changed = StateChanged::default();
        let mut due: Vec<Deferred> = Vec::new();
        self.deferred.retain(|&(at, action)| {
            if at <= now {
                due.push(action);
                false
            } else {
                true
            }
        });
        for action in due {
            match action {
                Deferred::NextTurn => changed.merge(self.advance_turn().await),
                Deferred::EnterGame => changed.merge(self.enter_game(now).await),
            }
        }
        changed
    }

    /// Leave the finished wheel for the game screen.
    async fn enter_game(&mut self, now: Instant) -> StateChanged {
        let mut changed = StateChanged {
            phase: true,
            ..Default::default()
        };
        self.state.phase = Phase::Playing;
        self.state.begin_new_game(now);
        self.save_session();

        // The host primes the machine: opening pour and the first base
        // color. Everyone else just starts polling.
        if self.state.is_host {
            changed.merge(self.pour(PumpTrigger::GameStart, None, None).await);
            changed.merge(self.reset_base_color().await);
        }
        changed
    }

    // ------------------------------------------------------------------
    // Timer ownership
    // ------------------------------------------------------------------

    /// Arm and disarm poll deadlines to match the current phase, so a
    /// screen switch never leaks the previous screen's poll.
    fn sync_timers(&mut self, now: Instant) {
        match self.state.phase {
            Phase::Lobby | Phase::Queued => {
                self.next_room_poll.get_or_insert(now);
                self.next_wheel_poll = None;
                self.next_game_poll = None;
            }
            Phase::Wheel(WheelStage::Finished) => {
                // Order seen: wheel polling stops.
                self.next_room_poll = None;
                self.next_wheel_poll = None;
                self.next_game_poll = None;
            }
            Phase::Wheel(_) => {
                self.next_room_poll = None;
                self.next_wheel_poll.get_or_insert(now);
                self.next_game_poll = None;
            }
            Phase::Playing => {
                self.next_room_poll = None;
                self.next_wheel_poll = None;
                self.next_game_poll.get_or_insert(now);
            }
            Phase::Disconnected | Phase::Joining | Phase::Ended => {
                self.next_room_poll = None;
                self.next_wheel_poll = None;
                self.next_game_poll = None;
            }
        }

        let has_session =
            self.state.our_id.is_some() && self.state.phase != Phase::Disconnected;
        if has_session {
            self.next_heartbeat.get_or_insert(now);
        } else {
            self.next_heartbeat = None;
        }
    }

    fn schedule(&mut self, at: Instant, action: Deferred) {
        self.deferred.push((at, action));
    }

    /// Stop every timer, drop animations, and clear persistence. Runs on
    /// every exit path.
    fn teardown(&mut self) {
        self.next_room_poll = None;
        self.next_wheel_poll = None;
        self.next_game_poll = None;
        self.next_heartbeat = None;
        self.wheel_anim = None;
        self.dice_shuffle = None;
        self.deferred.clear();
        self.store.clear();
    }

    fn save_session(&self) {
        let (Some(id), Some(name)) = (&self.state.our_id, &self.state.our_name) else {
            return;
        };
        self.store.save(&StoredSession {
            player_id: id.clone(),
            player_name: name.clone(),
            mode: self.state.mode,
            players: self.state.seated.clone(),
            round: self.state.round,
            turn_index: self.state.turn_index,
            new_game_timestamp: std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .ok()
                .map(|d| d.as_millis() as u64),
        });
    }
}
