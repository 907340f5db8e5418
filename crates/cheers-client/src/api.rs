//! The HTTP API surface the client polls and mutates through.
//!
//! [`GameApi`] abstracts the server contract so the controller stays
//! generic over it (tests drive it with an in-memory fake). [`HttpApi`]
//! is the real implementation: a `reqwest` client with a cookie jar
//! carrying the `player_id` identity issued at join.

use std::future::Future;
use std::sync::Arc;

use reqwest::cookie::Jar;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use cheers_core::protocol::{
    AckResponse, AddWineRequest, AddWineResponse, BaseWineResponse, GameSnapshot, JoinRequest,
    JoinResponse, NextTurnResponse, PlayerRef, PlayerStateResponse, PromptQuestion,
    PumpEventRequest, PumpEventResponse, QuizQuestion, RollDiceRequest, RollDiceResponse,
    RoomSnapshot, RoundRequest, RoundResponse, ScoreUpdateRequest, ScoreUpdateResponse,
    SpinResponse, WheelSnapshot,
};
use cheers_core::rules::WineColor;

use crate::error::{ClientError, Result};

/// One method per server endpoint the client consumes.
///
/// All methods take `&self`; implementations are expected to be cheaply
/// cloneable so fire-and-forget calls (heartbeat) can be spawned.
pub trait GameApi: Send + Sync {
    fn player_state(&self) -> impl Future<Output = Result<PlayerStateResponse>> + Send;
    fn join_room(&self, name: &str) -> impl Future<Output = Result<JoinResponse>> + Send;
    fn leave_room(&self, player_id: &str) -> impl Future<Output = Result<AckResponse>> + Send;
    fn heartbeat(&self, player_id: &str) -> impl Future<Output = Result<AckResponse>> + Send;
    fn start_game(&self, player_id: &str) -> impl Future<Output = Result<AckResponse>> + Send;
    fn room_state(&self) -> impl Future<Output = Result<RoomSnapshot>> + Send;

    fn spin_wheel(&self, player_id: &str) -> impl Future<Output = Result<SpinResponse>> + Send;
    fn wheel_state(&self) -> impl Future<Output = Result<WheelSnapshot>> + Send;
    fn finish_wheel(&self) -> impl Future<Output = Result<AckResponse>> + Send;

    fn game_state(&self) -> impl Future<Output = Result<GameSnapshot>> + Send;
    fn set_base_wine(&self, player_id: &str)
    -> impl Future<Output = Result<BaseWineResponse>> + Send;
    fn add_wine(
        &self,
        player_id: &str,
        color: WineColor,
    ) -> impl Future<Output = Result<AddWineResponse>> + Send;
    fn roll_dice(
        &self,
        player_id: &str,
        dice1: u8,
        dice2: u8,
    ) -> impl Future<Output = Result<RollDiceResponse>> + Send;
    fn update_score(
        &self,
        player_id: &str,
        score_delta: i32,
    ) -> impl Future<Output = Result<ScoreUpdateResponse>> + Send;
    fn next_turn(&self, player_id: &str) -> impl Future<Output = Result<NextTurnResponse>> + Send;
    fn increment_round(
        &self,
        player_id: &str,
        new_round: u32,
    ) -> impl Future<Output = Result<RoundResponse>> + Send;
    fn pump_event(
        &self,
        request: &PumpEventRequest,
    ) -> impl Future<Output = Result<PumpEventResponse>> + Send;
    fn reset_game(&self) -> impl Future<Output = Result<AckResponse>> + Send;

    fn quiz(&self) -> impl Future<Output = Result<QuizQuestion>> + Send;
    fn truth(&self) -> impl Future<Output = Result<PromptQuestion>> + Send;
    fn dare(&self) -> impl Future<Output = Result<PromptQuestion>> + Send;

    /// Inject a previously issued identity so `GET` endpoints recognise
    /// the caller (the cookie the browser version kept).
    fn set_identity(&self, player_id: &str);

    /// Drop the stored identity. Runs on full reset.
    fn clear_identity(&self);
}

/// `reqwest`-backed [`GameApi`] implementation.
#[derive(Clone)]
pub struct HttpApi {
    client: reqwest::Client,
    jar: Arc<Jar>,
    base: reqwest::Url,
}

impl HttpApi {
    /// Build an API client for the given base URL (e.g.
    /// `http://127.0.0.1:8000`).
    pub fn new(base_url: &str) -> Result<HttpApi> {
        let base = reqwest::Url::parse(base_url)
            .map_err(|e| ClientError::Invalid(format!("invalid server URL: {e}")))?;
        let jar = Arc::new(Jar::default());
        let client = reqwest::Client::builder()
            .cookie_provider(jar.clone())
            .build()?;
        Ok(HttpApi { client, jar, base })
    }

    fn url(&self, path: &str) -> reqwest::Url {
        // The base is a valid absolute URL, so joining a known path
        // cannot fail.
        self.base.join(path).unwrap_or_else(|_| self.base.clone())
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        debug!(path, "GET");
        let response = self.client.get(self.url(path)).send().await?;
        Self::decode(response).await
    }

    async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        debug!(path, "POST");
        let response = self.client.post(self.url(path)).json(body).send().await?;
        Self::decode(response).await
    }

    /// Success bodies parse as `T`; error statuses carry a FastAPI-style
    /// `{"detail": ...}` body which becomes the server message.
    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        #[derive(serde::Deserialize)]
        struct ErrorBody {
            #[serde(default)]
            detail: Option<String>,
        }

        let message = response
            .json::<ErrorBody>()
            .await
            .ok()
            .and_then(|body| body.detail)
            .unwrap_or_else(|| format!("request failed with status {status}"));
        Err(ClientError::Server {
            status: status.as_u16(),
            message,
        })
    }
}

impl GameApi for HttpApi {
    async fn player_state(&self) -> Result<PlayerStateResponse> {
        self.get_json("/api/player/state").await
    }

    async fn join_room(&self, name: &str) -> Result<JoinResponse> {
        self.post_json(
            "/api/room/join",
            &JoinRequest {
                player_name: name.to_string(),
            },
        )
        .await
    }

    async fn leave_room(&self, player_id: &str) -> Result<AckResponse> {
        self.post_json("/api/room/leave", &player_ref(player_id)).await
    }

    async fn heartbeat(&self, player_id: &str) -> Result<AckResponse> {
        self.post_json("/api/room/heartbeat", &player_ref(player_id))
            .await
    }

    async fn start_game(&self, player_id: &str) -> Result<AckResponse> {
        self.post_json("/api/room/start", &player_ref(player_id)).await
    }

    async fn room_state(&self) -> Result<RoomSnapshot> {
        self.get_json("/api/room/state").await
    }

    async fn spin_wheel(&self, player_id: &str) -> Result<SpinResponse> {
        self.post_json("/api/wheel/spin", &player_ref(player_id)).await
    }

    async fn wheel_state(&self) -> Result<WheelSnapshot> {
        self.get_json("/api/wheel/state").await
    }

    async fn finish_wheel(&self) -> Result<AckResponse> {
        self.post_json("/api/wheel/finish", &serde_json::json!({})).await
    }

    async fn game_state(&self) -> Result<GameSnapshot> {
        self.get_json("/api/game/state").await
    }

    async fn set_base_wine(&self, player_id: &str) -> Result<BaseWineResponse> {
        self.post_json("/api/game/set-base-wine", &player_ref(player_id))
            .await
    }

    async fn add_wine(&self, player_id: &str, color: WineColor) -> Result<AddWineResponse> {
        self.post_json(
            "/api/game/add-wine",
            &AddWineRequest {
                player_id: player_id.to_string(),
                color,
            },
        )
        .await
    }

    async fn roll_dice(&self, player_id: &str, dice1: u8, dice2: u8) -> Result<RollDiceResponse> {
        self.post_json(
            "/api/game/roll-dice",
            &RollDiceRequest {
                player_id: player_id.to_string(),
                dice1,
                dice2,
            },
        )
        .await
    }

    async fn update_score(&self, player_id: &str, score_delta: i32) -> Result<ScoreUpdateResponse> {
        self.post_json(
            "/api/game/update-score",
            &ScoreUpdateRequest {
                player_id: player_id.to_string(),
                score_delta,
            },
        )
        .await
    }

    async fn next_turn(&self, player_id: &str) -> Result<NextTurnResponse> {
        self.post_json("/api/game/next-turn", &player_ref(player_id))
            .await
    }

    async fn increment_round(&self, player_id: &str, new_round: u32) -> Result<RoundResponse> {
        self.post_json(
            "/api/game/increment-round",
            &RoundRequest {
                player_id: player_id.to_string(),
                new_round,
            },
        )
        .await
    }

    async fn pump_event(&self, request: &PumpEventRequest) -> Result<PumpEventResponse> {
        self.post_json("/api/game/event", request).await
    }

    async fn reset_game(&self) -> Result<AckResponse> {
        self.post_json("/api/game/reset", &serde_json::json!({})).await
    }

    async fn quiz(&self) -> Result<QuizQuestion> {
        self.get_json("/api/lsa").await
    }

    async fn truth(&self) -> Result<PromptQuestion> {
        self.get_json("/api/truth").await
    }

    async fn dare(&self) -> Result<PromptQuestion> {
        self.get_json("/api/dare").await
    }

    fn set_identity(&self, player_id: &str) {
        self.jar
            .add_cookie_str(&format!("player_id={player_id}"), &self.base);
    }

    fn clear_identity(&self) {
        self.jar
            .add_cookie_str("player_id=; Max-Age=0", &self.base);
    }
}

fn player_ref(player_id: &str) -> PlayerRef {
    PlayerRef {
        player_id: player_id.to_string(),
    }
}
