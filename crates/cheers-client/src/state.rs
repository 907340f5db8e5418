//! Client-side shadow state and the reconciliation layer.
//!
//! The server wins every conflict: each `apply_*` method overwrites the
//! local shadow with whatever the snapshot says and reports what changed
//! via [`StateChanged`] so the frontend can decide what to redraw. The
//! only client-owned values are transient animation progress and the
//! 10-second new-game buffer, which delays acceptance of end/round/dice
//! fields right after a fresh start so a stale "ended" flag from a
//! previous session cannot kill the new game.

use std::collections::{HashMap, VecDeque};

use serde::{Deserialize, Serialize};
use tokio::time::{Duration, Instant};

use cheers_core::protocol::{
    GameResult, GameSnapshot, JoinResponse, PlayerStateResponse, PlayerStatus, RankedPlayer,
    RoomPlayer, RoomSnapshot, ScoreEntry, ScreenTarget, WheelCandidate, WheelSnapshot,
};
use cheers_core::rules::{DragonGate, DuelKind, GameMode, WineColor, drunk_local_loser};

/// How long end/round/dice reconciliation stays suppressed after a
/// fresh game start.
pub const NEW_GAME_BUFFER: Duration = Duration::from_secs(10);

/// Semantic category for log notices. The UI layer decides styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogCategory {
    System,
    Action,
    Winner,
    Error,
    Info,
}

/// A line in the on-screen event log.
#[derive(Debug, Clone)]
pub struct Notice {
    pub text: String,
    pub category: LogCategory,
}

/// Wheel sub-stage while on the wheel screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WheelStage {
    Idle,
    Spinning,
    Finished,
}

/// The screen state machine, driven entirely by reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No live session (landing / kicked / after reset).
    Disconnected,
    /// Join form shown, nothing sent yet.
    Joining,
    /// Joined but waiting for a seat.
    Queued,
    /// Seated in the lobby.
    Lobby,
    /// Turn-order draw.
    Wheel(WheelStage),
    /// The dice game.
    Playing,
    /// End screen with the result payload.
    Ended,
}

/// A seated player in the shadow roster, ordered by draw rank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatedPlayer {
    pub player_id: String,
    pub player_name: String,
    pub score: i32,
    /// 1-based rank from the wheel draw.
    pub order: usize,
}

/// A modal awaiting input from the acting player.
#[derive(Debug, Clone)]
pub enum ActivePrompt {
    /// Multiple-choice quiz; `answer` is the correct letter.
    Quiz {
        question: String,
        options: Vec<String>,
        answer: String,
    },
    /// Pick the wine color to add (dice sum 7).
    PickColor,
    /// Head-to-head minigame awaiting manual adjudication.
    Duel {
        kind: DuelKind,
        opponent_id: String,
        opponent_name: String,
    },
    /// Truth-or-dare prompt to read aloud.
    TruthOrDare { is_truth: bool, question: String },
    /// Dragon gate posts shown; the player draws the third card.
    DragonGate { gate: DragonGate },
}

/// What changed in the shadow state after applying a server response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StateChanged {
    /// The screen phase moved.
    pub phase: bool,
    /// Lobby roster, host badge, or start gating changed.
    pub roster: bool,
    /// Wheel candidates, animation, or final order changed.
    pub wheel: bool,
    /// Dice faces, base color, or the wine stack changed.
    pub board: bool,
    /// A score changed.
    pub scores: bool,
    /// Round number or turn index changed.
    pub turn: bool,
    /// A prompt opened or closed.
    pub prompt: bool,
    /// A notice was appended to the log.
    pub log: bool,
}

impl StateChanged {
    pub fn any(self) -> bool {
        self.phase
            || self.roster
            || self.wheel
            || self.board
            || self.scores
            || self.turn
            || self.prompt
            || self.log
    }

    pub fn merge(&mut self, other: StateChanged) {
        self.phase |= other.phase;
        self.roster |= other.roster;
        self.wheel |= other.wheel;
        self.board |= other.board;
        self.scores |= other.scores;
        self.turn |= other.turn;
        self.prompt |= other.prompt;
        self.log |= other.log;
    }
}

/// All client-tracked game data.
#[derive(Debug, Clone)]
pub struct ClientState {
    pub phase: Phase,
    pub mode: GameMode,

    // Identity
    pub our_id: Option<String>,
    pub our_name: Option<String>,
    pub is_host: bool,
    pub queue_position: Option<u32>,

    // Lobby mirror
    pub roster: Vec<RoomPlayer>,
    pub host_id: Option<String>,
    pub can_start: bool,

    // Wheel mirror
    pub candidates: Vec<WheelCandidate>,
    /// Seed of the spin this client has already replayed, so a spin is
    /// animated once even though it keeps appearing in polls.
    pub replayed_seed: Option<u32>,
    pub winner_index: Option<usize>,
    pub player_order: Vec<RankedPlayer>,
    /// Wheel rotation in degrees while the local replay runs.
    pub wheel_angle: f64,
    pending_replay: Option<(u32, usize)>,

    // Game shadow
    pub seated: Vec<SeatedPlayer>,
    pub round: u32,
    pub turn_index: usize,
    pub dice: Option<(u8, u8)>,
    pub base_color: Option<WineColor>,
    pub wine_stack: Vec<WineColor>,
    pub game_result: Option<GameResult>,
    pub rolling: bool,

    pub prompt: Option<ActivePrompt>,
    pub events: VecDeque<Notice>,
    new_game_until: Option<Instant>,
}

impl ClientState {
    pub fn new(mode: GameMode) -> ClientState {
        ClientState {
            phase: Phase::Joining,
            mode,
            our_id: None,
            our_name: None,
            is_host: false,
            queue_position: None,
            roster: Vec::new(),
            host_id: None,
            can_start: false,
            candidates: Vec::new(),
            replayed_seed: None,
            winner_index: None,
            player_order: Vec::new(),
            wheel_angle: 0.0,
            pending_replay: None,
            seated: Vec::new(),
            round: 1,
            turn_index: 0,
            dice: None,
            base_color: None,
            wine_stack: Vec::new(),
            game_result: None,
            rolling: false,
            prompt: None,
            events: VecDeque::new(),
            new_game_until: None,
        }
    }

    /// Append a notice, keeping only the last 100.
    pub fn add_notice(&mut self, text: impl Into<String>, category: LogCategory) {
        self.events.push_back(Notice {
            text: text.into(),
            category,
        });
        if self.events.len() > 100 {
            self.events.pop_front();
        }
    }

    pub fn current_player(&self) -> Option<&SeatedPlayer> {
        self.seated.get(self.turn_index)
    }

    /// Whether the local player acts this turn, judged on shadow state.
    pub fn is_my_turn(&self) -> bool {
        match (&self.our_id, self.current_player()) {
            (Some(id), Some(player)) => *id == player.player_id,
            _ => false,
        }
    }

    pub fn player_name(&self, player_id: &str) -> String {
        self.seated
            .iter()
            .find(|p| p.player_id == player_id)
            .map(|p| p.player_name.clone())
            .or_else(|| {
                self.roster
                    .iter()
                    .find(|p| p.player_id == player_id)
                    .map(|p| p.player_name.clone())
            })
            .unwrap_or_else(|| player_id.to_string())
    }

    /// Seated players except the given one, for duel opponent picks.
    pub fn opponents_of(&self, player_id: &str) -> Vec<&SeatedPlayer> {
        self.seated
            .iter()
            .filter(|p| p.player_id != player_id)
            .collect()
    }

    /// A spin the controller still has to start animating, if any.
    pub fn take_pending_replay(&mut self) -> Option<(u32, usize)> {
        self.pending_replay.take()
    }

    /// Arm the suppression window for a freshly started game.
    pub fn begin_new_game(&mut self, now: Instant) {
        self.new_game_until = Some(now + NEW_GAME_BUFFER);
        self.round = 1;
        self.turn_index = 0;
        self.dice = None;
        self.wine_stack.clear();
        self.game_result = None;
        for player in &mut self.seated {
            player.score = 0;
        }
    }

    fn in_new_game_buffer(&self, now: Instant) -> bool {
        self.new_game_until.is_some_and(|until| now < until)
    }

    // ------------------------------------------------------------------
    // Reconciliation
    // ------------------------------------------------------------------

    /// Route the session bootstrap response to the matching phase.
    pub fn apply_bootstrap(&mut self, response: &PlayerStateResponse) -> StateChanged {
        let mut changed = StateChanged::default();
        let target = match response.status {
            PlayerStatus::NotFound => Phase::Joining,
            PlayerStatus::InQueue => Phase::Queued,
            PlayerStatus::InGame => match response.screen {
                Some(ScreenTarget::Wheel) => Phase::Wheel(WheelStage::Idle),
                Some(ScreenTarget::Game) => Phase::Playing,
                _ => Phase::Lobby,
            },
        };
        self.queue_position = response.queue_position;
        self.is_host = response.is_host;
        if self.phase != target {
            self.phase = target;
            changed.phase = true;
        }
        changed
    }

    /// Absorb a join acknowledgement (seat or queue slot).
    pub fn apply_join(&mut self, name: &str, response: &JoinResponse) -> StateChanged {
        let mut changed = StateChanged {
            phase: true,
            ..Default::default()
        };
        self.our_id = Some(response.player_id.clone());
        self.our_name = Some(name.to_string());
        self.queue_position = response.queue_position;
        match response.status {
            PlayerStatus::InQueue => {
                self.phase = Phase::Queued;
                self.add_notice(
                    format!(
                        "Room is full, you are number {} in the queue",
                        response.queue_position.unwrap_or(0)
                    ),
                    LogCategory::System,
                );
                changed.log = true;
            }
            _ => {
                self.phase = Phase::Lobby;
            }
        }
        if let Some(room) = &response.room_state {
            changed.merge(self.apply_room_snapshot(room));
        }
        changed
    }

    /// Reconcile the 1-second lobby poll.
    ///
    /// Membership loss forces the client back to the join screen; a
    /// started game switches to the wheel.
    pub fn apply_room_snapshot(&mut self, snapshot: &RoomSnapshot) -> StateChanged {
        let mut changed = StateChanged::default();

        if !snapshot.is_in_room && matches!(self.phase, Phase::Lobby | Phase::Queued) {
            self.phase = Phase::Disconnected;
            self.add_notice("You were removed from the room", LogCategory::Error);
            changed.phase = true;
            changed.log = true;
            return changed;
        }

        if self.roster != snapshot.players {
            self.roster = snapshot.players.clone();
            changed.roster = true;
        }
        if self.host_id != snapshot.host_id {
            self.host_id = snapshot.host_id.clone();
            changed.roster = true;
        }
        let am_host = match (&self.our_id, &self.host_id) {
            (Some(us), Some(host)) => us == host,
            _ => false,
        };
        if self.is_host != am_host {
            self.is_host = am_host;
            changed.roster = true;
        }
        if self.can_start != snapshot.can_start {
            self.can_start = snapshot.can_start;
            changed.roster = true;
        }

        // Queue promotion: the server lists us among the seated players.
        if self.phase == Phase::Queued
            && let Some(us) = &self.our_id
            && snapshot.players.iter().any(|p| &p.player_id == us)
        {
            self.phase = Phase::Lobby;
            self.queue_position = None;
            self.add_notice("A seat opened up, you are in the room", LogCategory::System);
            changed.phase = true;
            changed.log = true;
        }

        if snapshot.game_started && matches!(self.phase, Phase::Lobby) {
            self.phase = Phase::Wheel(WheelStage::Idle);
            changed.phase = true;
        }

        changed
    }

    /// Reconcile the 500 ms wheel poll.
    ///
    /// The first poll that shows `wheel_spinning` with an unreplayed seed
    /// queues a local animation; the first non-empty `player_order` is
    /// the finished edge and seats the players.
    pub fn apply_wheel_snapshot(&mut self, snapshot: &WheelSnapshot) -> StateChanged {
        let mut changed = StateChanged::default();

        if self.candidates != snapshot.candidates {
            self.candidates = snapshot.candidates.clone();
            changed.wheel = true;
        }

        if snapshot.wheel_spinning
            && let (Some(seed), Some(winner)) = (snapshot.spin_seed, snapshot.winner_index)
            && self.replayed_seed != Some(seed)
        {
            self.replayed_seed = Some(seed);
            self.winner_index = Some(winner);
            self.pending_replay = Some((seed, winner));
            self.phase = Phase::Wheel(WheelStage::Spinning);
            changed.phase = true;
            changed.wheel = true;
        }

        if !snapshot.player_order.is_empty() && self.player_order != snapshot.player_order {
            self.player_order = snapshot.player_order.clone();
            self.seat_from_order();
            self.phase = Phase::Wheel(WheelStage::Finished);
            changed.phase = true;
            changed.wheel = true;
        }

        changed
    }

    /// Build the shadow roster from the finished draw order.
    fn seat_from_order(&mut self) {
        let mut order = self.player_order.clone();
        order.sort_by_key(|p| p.order);
        self.seated = order
            .into_iter()
            .map(|p| SeatedPlayer {
                player_id: p.player_id,
                player_name: p.player_name,
                score: 0,
                order: p.order,
            })
            .collect();
        self.turn_index = 0;
        self.round = 1;
    }

    /// Reconcile the 1-second game poll.
    pub fn apply_game_snapshot(&mut self, snapshot: &GameSnapshot, now: Instant) -> StateChanged {
        let mut changed = StateChanged::default();
        let buffered = self.in_new_game_buffer(now);

        // Recover the roster from the snapshot if the local one is gone
        // (process restart between polls).
        if self.seated.is_empty() && !snapshot.players.is_empty() {
            self.seated = snapshot
                .players
                .iter()
                .enumerate()
                .map(|(i, p)| SeatedPlayer {
                    player_id: p.player_id.clone(),
                    player_name: p.player_name.clone(),
                    score: 0,
                    order: i + 1,
                })
                .collect();
            changed.scores = true;
        }

        if let Some(mode) = snapshot.game_mode
            && self.mode != mode
        {
            self.mode = mode;
            changed.turn = true;
        }

        if self.turn_index != snapshot.current_turn_index {
            self.turn_index = snapshot.current_turn_index;
            changed.turn = true;
        }
        if !buffered && self.round != snapshot.current_round {
            self.round = snapshot.current_round;
            changed.turn = true;
        }
        if !buffered
            && let Some(pair) = snapshot.dice_pair()
            && self.dice != Some(pair)
        {
            self.dice = Some(pair);
            changed.board = true;
        }
        if self.base_color != snapshot.base_wine_color {
            self.base_color = snapshot.base_wine_color;
            changed.board = true;
        }
        // Length diff only: colors are append-only between base resets.
        if self.wine_stack.len() != snapshot.wine_stack.len() {
            self.wine_stack = snapshot.wine_stack.clone();
            changed.board = true;
        }
        for player in &mut self.seated {
            if let Some(score) = snapshot.player_scores.get(&player.player_id)
                && player.score != *score
            {
                player.score = *score;
                changed.scores = true;
            }
        }

        if !buffered && snapshot.game_ended && self.phase != Phase::Ended {
            self.game_result = snapshot.game_result.clone();
            self.phase = Phase::Ended;
            changed.phase = true;
        }

        // Redundant local end detection for drunk mode, in case the
        // server's ended flag is delayed.
        if !buffered && self.mode == GameMode::Drunk && self.phase == Phase::Playing {
            let scores: HashMap<String, i32> = self
                .seated
                .iter()
                .map(|p| (p.player_id.clone(), p.score))
                .collect();
            if let Some((loser_id, score)) = drunk_local_loser(&scores) {
                let loser_id = loser_id.to_string();
                self.game_result = Some(GameResult {
                    mode: GameMode::Drunk,
                    winners: Vec::new(),
                    losers: Vec::new(),
                    loser: Some(ScoreEntry {
                        player_id: Some(loser_id.clone()),
                        player_name: self.player_name(&loser_id),
                        score,
                    }),
                    max_score: None,
                    min_score: None,
                    message: None,
                });
                self.phase = Phase::Ended;
                changed.phase = true;
            }
        }

        changed
    }

    /// Adopt the server's absolute score for a player.
    ///
    /// The local shadow is never `previous + delta`; it is whatever the
    /// server answered.
    pub fn apply_score(&mut self, player_id: &str, new_score: i32) -> StateChanged {
        let mut changed = StateChanged::default();
        if let Some(player) = self.seated.iter_mut().find(|p| p.player_id == player_id)
            && player.score != new_score
        {
            player.score = new_score;
            changed.scores = true;
        }
        changed
    }

    /// Adopt the server's turn index.
    pub fn apply_next_turn(&mut self, index: usize) -> StateChanged {
        let mut changed = StateChanged::default();
        if self.turn_index != index {
            self.turn_index = index;
            changed.turn = true;
        }
        changed
    }

    /// Fallback when the next-turn request failed in transit: advance
    /// locally with wraparound and let the next poll correct it.
    pub fn local_next_turn(&mut self) -> StateChanged {
        if self.seated.is_empty() {
            return StateChanged::default();
        }
        self.turn_index = (self.turn_index + 1) % self.seated.len();
        StateChanged {
            turn: true,
            ..Default::default()
        }
    }

    /// Open a prompt modal.
    pub fn open_prompt(&mut self, prompt: ActivePrompt) -> StateChanged {
        self.prompt = Some(prompt);
        StateChanged {
            prompt: true,
            ..Default::default()
        }
    }

    /// Close the active prompt, if any.
    pub fn close_prompt(&mut self) -> StateChanged {
        let had = self.prompt.take().is_some();
        StateChanged {
            prompt: had,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn room_player(id: &str, name: &str, host: bool) -> RoomPlayer {
        RoomPlayer {
            player_id: id.to_string(),
            player_name: name.to_string(),
            is_host: host,
        }
    }

    fn room_snapshot(players: Vec<RoomPlayer>, can_start: bool) -> RoomSnapshot {
        RoomSnapshot {
            is_in_room: true,
            player_count: players.len(),
            host_id: players
                .iter()
                .find(|p| p.is_host)
                .map(|p| p.player_id.clone()),
            players,
            game_started: false,
            can_start,
            min_players: 2,
            max_players: 6,
        }
    }

    fn seated_state(ids: &[&str]) -> ClientState {
        let mut state = ClientState::new(GameMode::Family);
        state.our_id = Some(ids[0].to_string());
        state.seated = ids
            .iter()
            .enumerate()
            .map(|(i, id)| SeatedPlayer {
                player_id: id.to_string(),
                player_name: format!("P{i}"),
                score: 0,
                order: i + 1,
            })
            .collect();
        state.phase = Phase::Playing;
        state
    }

    fn game_snapshot(turn: usize, round: u32) -> GameSnapshot {
        GameSnapshot {
            players: Vec::new(),
            host_id: None,
            current_turn_index: turn,
            current_player_id: None,
            current_round: round,
            game_mode: None,
            game_ended: false,
            game_result: None,
            base_wine_color: None,
            dice_values: Vec::new(),
            wine_stack: Vec::new(),
            player_scores: HashMap::new(),
            is_my_turn: false,
            my_player_id: None,
        }
    }

    #[test]
    fn bootstrap_routes_by_status_and_screen() {
        let mut state = ClientState::new(GameMode::Family);
        let changed = state.apply_bootstrap(&PlayerStateResponse {
            status: PlayerStatus::InGame,
            screen: Some(ScreenTarget::Wheel),
            queue_position: None,
            is_host: true,
        });
        assert!(changed.phase);
        assert_eq!(state.phase, Phase::Wheel(WheelStage::Idle));
        assert!(state.is_host);

        let changed = state.apply_bootstrap(&PlayerStateResponse {
            status: PlayerStatus::NotFound,
            screen: None,
            queue_position: None,
            is_host: false,
        });
        assert!(changed.phase);
        assert_eq!(state.phase, Phase::Joining);
    }

    #[test]
    fn first_joiner_becomes_host_and_cannot_start_alone() {
        let mut state = ClientState::new(GameMode::Family);
        state.our_id = Some("p1".to_string());
        state.phase = Phase::Lobby;

        let changed =
            state.apply_room_snapshot(&room_snapshot(vec![room_player("p1", "Ana", true)], false));
        assert!(changed.roster);
        assert_eq!(state.roster.len(), 1);
        assert!(state.is_host);
        assert!(!state.can_start);

        let changed = state.apply_room_snapshot(&room_snapshot(
            vec![
                room_player("p1", "Ana", true),
                room_player("p2", "Bo", false),
            ],
            true,
        ));
        assert!(changed.roster);
        assert!(state.can_start);
    }

    #[test]
    fn kicked_player_is_forced_out() {
        let mut state = ClientState::new(GameMode::Family);
        state.our_id = Some("p1".to_string());
        state.phase = Phase::Lobby;
        let mut snapshot = room_snapshot(vec![], false);
        snapshot.is_in_room = false;
        let changed = state.apply_room_snapshot(&snapshot);
        assert!(changed.phase);
        assert_eq!(state.phase, Phase::Disconnected);
    }

    #[test]
    fn queued_player_promotes_when_listed() {
        let mut state = ClientState::new(GameMode::Family);
        state.our_id = Some("p3".to_string());
        state.phase = Phase::Queued;
        state.queue_position = Some(1);

        let changed = state.apply_room_snapshot(&room_snapshot(
            vec![
                room_player("p1", "Ana", true),
                room_player("p3", "Cy", false),
            ],
            true,
        ));
        assert!(changed.phase);
        assert_eq!(state.phase, Phase::Lobby);
        assert_eq!(state.queue_position, None);
    }

    #[test]
    fn game_start_switches_lobby_to_wheel() {
        let mut state = ClientState::new(GameMode::Family);
        state.our_id = Some("p1".to_string());
        state.phase = Phase::Lobby;
        let mut snapshot = room_snapshot(vec![room_player("p1", "Ana", true)], false);
        snapshot.game_started = true;
        let changed = state.apply_room_snapshot(&snapshot);
        assert!(changed.phase);
        assert_eq!(state.phase, Phase::Wheel(WheelStage::Idle));
    }

    #[test]
    fn wheel_spin_is_replayed_once() {
        let mut state = ClientState::new(GameMode::Family);
        state.phase = Phase::Wheel(WheelStage::Idle);
        let snapshot = WheelSnapshot {
            wheel_spinning: true,
            wheel_finished: false,
            spin_seed: Some(4242),
            winner_index: Some(2),
            candidates: Vec::new(),
            player_order: Vec::new(),
        };
        let changed = state.apply_wheel_snapshot(&snapshot);
        assert!(changed.wheel);
        assert_eq!(state.take_pending_replay(), Some((4242, 2)));
        assert_eq!(state.phase, Phase::Wheel(WheelStage::Spinning));

        // The same spin keeps appearing in polls; no second replay.
        let changed = state.apply_wheel_snapshot(&snapshot);
        assert!(!changed.wheel);
        assert_eq!(state.take_pending_replay(), None);
    }

    #[test]
    fn wheel_finish_seats_players_by_rank() {
        let mut state = ClientState::new(GameMode::Family);
        state.phase = Phase::Wheel(WheelStage::Spinning);
        let order = vec![
            RankedPlayer {
                player_id: "p2".to_string(),
                player_name: "Bo".to_string(),
                order: 2,
            },
            RankedPlayer {
                player_id: "p1".to_string(),
                player_name: "Ana".to_string(),
                order: 1,
            },
        ];
        let changed = state.apply_wheel_snapshot(&WheelSnapshot {
            wheel_spinning: false,
            wheel_finished: true,
            spin_seed: None,
            winner_index: None,
            candidates: Vec::new(),
            player_order: order,
        });
        assert!(changed.phase);
        assert_eq!(state.phase, Phase::Wheel(WheelStage::Finished));
        assert_eq!(state.seated[0].player_id, "p1");
        assert_eq!(state.seated[1].player_id, "p2");
        assert_eq!(state.turn_index, 0);
    }

    #[test]
    fn score_is_the_server_absolute_value() {
        let mut state = seated_state(&["p1", "p2"]);
        state.seated[0].score = 5;
        // A +1 delta answered with 2 means 2, not 6.
        let changed = state.apply_score("p1", 2);
        assert!(changed.scores);
        assert_eq!(state.seated[0].score, 2);
    }

    #[test]
    fn new_game_buffer_suppresses_stale_end() {
        let mut state = seated_state(&["p1", "p2"]);
        let now = Instant::now();
        state.begin_new_game(now);

        let mut snapshot = game_snapshot(0, 4);
        snapshot.game_ended = true;
        let changed = state.apply_game_snapshot(&snapshot, now + Duration::from_secs(3));
        assert!(!changed.phase);
        assert_eq!(state.phase, Phase::Playing);
        assert_eq!(state.round, 1, "round reconciliation is buffered");

        // Past the buffer the same snapshot lands normally.
        let changed = state.apply_game_snapshot(&snapshot, now + Duration::from_secs(11));
        assert!(changed.phase);
        assert_eq!(state.phase, Phase::Ended);
    }

    #[test]
    fn drunk_end_is_detected_locally() {
        let mut state = seated_state(&["p1", "p2"]);
        state.mode = GameMode::Drunk;

        let mut snapshot = game_snapshot(0, 1);
        snapshot
            .player_scores
            .insert("p2".to_string(), 3);
        let changed = state.apply_game_snapshot(&snapshot, Instant::now());
        assert!(changed.phase);
        assert_eq!(state.phase, Phase::Ended);
        let result = state.game_result.as_ref().unwrap();
        assert_eq!(result.drunk_loser().unwrap().player_name, "P1");
    }

    #[test]
    fn turn_fallback_wraps_around() {
        let mut state = seated_state(&["p1", "p2", "p3"]);
        state.turn_index = 2;
        let changed = state.local_next_turn();
        assert!(changed.turn);
        assert_eq!(state.turn_index, 0);
    }

    #[test]
    fn wine_stack_diffs_by_length() {
        let mut state = seated_state(&["p1", "p2"]);
        let mut snapshot = game_snapshot(0, 1);
        snapshot.wine_stack = vec![WineColor::Red];
        assert!(state.apply_game_snapshot(&snapshot, Instant::now()).board);
        // Same length: no redraw even if the contents differ.
        snapshot.wine_stack = vec![WineColor::Blue];
        assert!(!state.apply_game_snapshot(&snapshot, Instant::now()).board);
    }
}
