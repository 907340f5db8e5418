//! Wire types for the party-game HTTP API.
//!
//! Every struct mirrors the JSON shape the server produces or expects;
//! only the fields the client actually consumes are modelled, and unknown
//! fields are ignored on deserialization. Error responses are plain HTTP
//! status codes with a `{"detail": ...}` body and are handled at the
//! transport layer, not here.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::rules::{GameMode, PumpTrigger, WineColor};

/// Where the server currently places a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerStatus {
    /// No live session for this identity.
    NotFound,
    /// Waiting for a seat; the room is at capacity.
    InQueue,
    /// Seated in the room (lobby, wheel, or game).
    InGame,
}

/// The screen the server expects the client to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScreenTarget {
    /// Lobby / waiting room.
    Setup,
    /// Turn-order wheel draw.
    Wheel,
    /// The dice game itself.
    Game,
}

/// `GET /api/player/state` — session bootstrap.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerStateResponse {
    pub status: PlayerStatus,
    #[serde(default)]
    pub screen: Option<ScreenTarget>,
    #[serde(default)]
    pub queue_position: Option<u32>,
    #[serde(default)]
    pub is_host: bool,
}

/// One seated player as reported in room snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomPlayer {
    pub player_id: String,
    pub player_name: String,
    #[serde(default)]
    pub is_host: bool,
}

/// `GET /api/room/state` — the lobby mirror, polled every second.
///
/// The join response embeds the same shape minus the caller-relative
/// fields (`is_in_room`, `is_host`), which is why those default.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomSnapshot {
    #[serde(default = "default_in_room")]
    pub is_in_room: bool,
    pub player_count: usize,
    #[serde(default)]
    pub players: Vec<RoomPlayer>,
    #[serde(default)]
    pub host_id: Option<String>,
    #[serde(default)]
    pub game_started: bool,
    #[serde(default)]
    pub can_start: bool,
    #[serde(default)]
    pub min_players: usize,
    #[serde(default)]
    pub max_players: usize,
}

fn default_in_room() -> bool {
    true
}

/// `POST /api/room/join` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinResponse {
    pub success: bool,
    pub player_id: String,
    #[serde(default)]
    pub message: String,
    /// `in_game` for a direct seat, `in_queue` when the room is full.
    pub status: PlayerStatus,
    #[serde(default)]
    pub queue_position: Option<u32>,
    #[serde(default)]
    pub room_state: Option<RoomSnapshot>,
}

/// Generic `{success, message?}` acknowledgement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AckResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

// ---------------------------------------------------------------------------
// Wheel
// ---------------------------------------------------------------------------

/// `POST /api/wheel/spin` response (host only).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpinResponse {
    pub success: bool,
    /// Seed in `1..=10000`; every client derives the same animation from it.
    pub spin_seed: u32,
    pub winner_index: usize,
}

/// A wheel slice candidate (seating order before the draw).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WheelCandidate {
    pub player_id: String,
    pub player_name: String,
}

/// One entry of the finished draw, `order` being the 1-based rank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedPlayer {
    pub player_id: String,
    pub player_name: String,
    pub order: usize,
}

/// `GET /api/wheel/state` — polled at 500 ms while on the wheel screen.
///
/// `player_order` stays empty until the server has accepted a finish
/// notification; its first non-empty appearance is the `finished` edge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WheelSnapshot {
    pub wheel_spinning: bool,
    pub wheel_finished: bool,
    #[serde(default)]
    pub spin_seed: Option<u32>,
    #[serde(default)]
    pub winner_index: Option<usize>,
    #[serde(default)]
    pub candidates: Vec<WheelCandidate>,
    #[serde(default)]
    pub player_order: Vec<RankedPlayer>,
}

// ---------------------------------------------------------------------------
// Game
// ---------------------------------------------------------------------------

/// A named score entry inside a [`GameResult`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreEntry {
    #[serde(default)]
    pub player_id: Option<String>,
    pub player_name: String,
    pub score: i32,
}

/// End-of-game payload, rendered identically by every polling client.
///
/// Family games carry `winners`/`losers` split by max/min score. Drunk
/// games carry the single loser; older payloads use `loser`, newer ones a
/// one-element `losers` list, so [`GameResult::drunk_loser`] checks both.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameResult {
    pub mode: GameMode,
    #[serde(default)]
    pub winners: Vec<ScoreEntry>,
    #[serde(default)]
    pub losers: Vec<ScoreEntry>,
    #[serde(default)]
    pub loser: Option<ScoreEntry>,
    #[serde(default)]
    pub max_score: Option<i32>,
    #[serde(default)]
    pub min_score: Option<i32>,
    #[serde(default)]
    pub message: Option<String>,
}

impl GameResult {
    /// The drunk-mode loser, from whichever field the payload used.
    pub fn drunk_loser(&self) -> Option<&ScoreEntry> {
        self.losers.first().or(self.loser.as_ref())
    }
}

/// `GET /api/game/state` — the authoritative turn-loop mirror.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameSnapshot {
    #[serde(default)]
    pub players: Vec<RoomPlayer>,
    #[serde(default)]
    pub host_id: Option<String>,
    pub current_turn_index: usize,
    #[serde(default)]
    pub current_player_id: Option<String>,
    pub current_round: u32,
    #[serde(default)]
    pub game_mode: Option<GameMode>,
    #[serde(default)]
    pub game_ended: bool,
    #[serde(default)]
    pub game_result: Option<GameResult>,
    #[serde(default)]
    pub base_wine_color: Option<WineColor>,
    /// Two faces; tolerated as a list because that is what the wire carries.
    #[serde(default)]
    pub dice_values: Vec<u8>,
    #[serde(default)]
    pub wine_stack: Vec<WineColor>,
    #[serde(default)]
    pub player_scores: HashMap<String, i32>,
    #[serde(default)]
    pub is_my_turn: bool,
    #[serde(default)]
    pub my_player_id: Option<String>,
}

impl GameSnapshot {
    /// The synced dice faces, if the server sent a well-formed pair.
    pub fn dice_pair(&self) -> Option<(u8, u8)> {
        match self.dice_values.as_slice() {
            [d1, d2] => Some((*d1, *d2)),
            _ => None,
        }
    }
}

/// `POST /api/game/roll-dice` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RollDiceResponse {
    pub success: bool,
    #[serde(default)]
    pub dice_values: Vec<u8>,
    pub sum: u8,
    /// Server-suggested duel opponent name (display only).
    #[serde(default)]
    pub current_opponent: Option<String>,
}

/// `POST /api/game/set-base-wine` response. The server picks a fresh
/// color (never repeating the previous one) and clears the stack.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaseWineResponse {
    pub success: bool,
    pub base_wine_color: WineColor,
    #[serde(default)]
    pub base_pump_id: Option<u8>,
    #[serde(default)]
    pub wine_stack: Vec<WineColor>,
}

/// `POST /api/game/add-wine` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddWineResponse {
    pub success: bool,
    pub color: WineColor,
    #[serde(default)]
    pub wine_stack: Vec<WineColor>,
}

/// `POST /api/game/update-score` response. `new_score` is the absolute
/// server-side value and always replaces the local shadow score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreUpdateResponse {
    pub success: bool,
    pub player_id: String,
    pub new_score: i32,
}

/// `POST /api/game/next-turn` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NextTurnResponse {
    pub success: bool,
    pub current_turn_index: usize,
    #[serde(default)]
    pub current_player_id: Option<String>,
}

/// `POST /api/game/increment-round` response. In drunk mode the server
/// acknowledges with `success: false` and no round; rounds only exist in
/// family games.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundResponse {
    pub success: bool,
    #[serde(default)]
    pub current_round: Option<u32>,
}

/// `POST /api/game/event` response — a physical dispenser ran (or not).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PumpEventResponse {
    pub success: bool,
    #[serde(default)]
    pub pump_id: Option<u8>,
    /// Pump run time in seconds, for display only.
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub message: Option<String>,
}

/// `GET /api/lsa` — a multiple-choice quiz question. `options` are
/// letter-prefixed strings ("A. ..."); `answer` is the correct letter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub question: String,
    pub options: Vec<String>,
    pub answer: String,
}

/// `GET /api/truth` / `GET /api/dare` — a single prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptQuestion {
    pub question: String,
}

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

/// `POST /api/room/join` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinRequest {
    pub player_name: String,
}

/// Body for every endpoint that only identifies the caller
/// (leave, heartbeat, start, spin, set-base-wine).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerRef {
    pub player_id: String,
}

/// `POST /api/game/roll-dice` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RollDiceRequest {
    pub player_id: String,
    pub dice1: u8,
    pub dice2: u8,
}

/// `POST /api/game/update-score` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreUpdateRequest {
    pub player_id: String,
    pub score_delta: i32,
}

/// `POST /api/game/add-wine` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddWineRequest {
    pub player_id: String,
    pub color: WineColor,
}

/// `POST /api/game/increment-round` body. The acting client sends the
/// round it just advanced to; the server adopts it (family mode only).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundRequest {
    pub player_id: String,
    pub new_round: u32,
}

/// `POST /api/game/event` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PumpEventRequest {
    pub mode: GameMode,
    pub event: PumpTrigger,
    /// Dice sum for `score` events, absent otherwise.
    #[serde(default)]
    pub score: Option<u8>,
}

// ---------------------------------------------------------------------------
// Player name validation
// ---------------------------------------------------------------------------

/// Maximum player name length, in characters.
pub const MAX_NAME_CHARS: usize = 10;

/// Validate a player name before it is sent to the server.
///
/// Names must be non-empty after trimming and at most 10 characters.
pub fn validate_player_name(name: &str) -> Result<(), String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err("Name cannot be empty".to_string());
    }
    if trimmed.chars().count() > MAX_NAME_CHARS {
        return Err(format!("Name must be at most {MAX_NAME_CHARS} characters"));
    }
    Ok(())
}
