//! Client for the remote content service: one POST per call, typed request
//! and response envelopes, distinct error kinds for transport, status and
//! format failures. No retries happen here.
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::rc::Rc;
use thiserror::Error;

use crate::event::{GameEvent, OptionId};
use crate::history::{HistoryTurn, Role};
use crate::resources::ResourceVector;

/// A raw HTTP reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

impl TransportResponse {
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// The request never produced a reply (DNS, refused connection, CORS...).
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct TransportError(pub String);

/// Moves a JSON body to the content endpoint and hands back the reply.
#[async_trait(?Send)]
pub trait ContentTransport {
    async fn post_json(&self, body: String) -> Result<TransportResponse, TransportError>;
}

#[async_trait(?Send)]
impl<T: ContentTransport + ?Sized> ContentTransport for Rc<T> {
    async fn post_json(&self, body: String) -> Result<TransportResponse, TransportError> {
        (**self).post_json(body).await
    }
}

/// Caller-visible "please wait" affordance. Only foreground calls drive it.
pub trait BusyIndicator {
    fn set_busy(&self, busy: bool);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallMode {
    Foreground,
    Background,
}

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("request is missing its requestType")]
    MissingRequestType,
    #[error("could not encode request: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("could not reach the content service: {0}")]
    Transport(#[from] TransportError),
    #[error("content service answered {status}{}", status_suffix(.message))]
    Status { status: u16, message: Option<String> },
    #[error("content service reply is malformed: {0}")]
    Format(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerAction {
    pub chosen_option_id: OptionId,
}

/// The post-choice snapshot sent with a next-turn request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoiceContext {
    pub round_number: u32,
    pub resources: ResourceVector,
    pub kingdom_background: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WirePart {
    pub text: String,
}

/// Chat-style history entry expected by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireTurn {
    pub role: Role,
    pub parts: Vec<WirePart>,
}

impl From<&HistoryTurn> for WireTurn {
    fn from(turn: &HistoryTurn) -> Self {
        Self {
            role: turn.role,
            parts: vec![WirePart {
                text: turn.text.clone(),
            }],
        }
    }
}

#[must_use]
pub fn wire_history(turns: &[HistoryTurn]) -> Vec<WireTurn> {
    turns.iter().map(WireTurn::from).collect()
}

/// Every request shape the client sends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(
    tag = "requestType",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum ContentRequest {
    GenerateBackground,
    GenerateFirstEvent {
        kingdom_background: String,
        limited_history: Vec<WireTurn>,
    },
    ProcessChoiceAndPrepareNext {
        player_action: PlayerAction,
        current_state: ChoiceContext,
        limited_history: Vec<WireTurn>,
    },
    GenerateNextEvent {
        player_action: PlayerAction,
        current_state: ChoiceContext,
        limited_history: Vec<WireTurn>,
    },
}

/// Untyped JSON object posted to the endpoint. Must carry a non-empty
/// `requestType`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RequestEnvelope(Map<String, Value>);

impl RequestEnvelope {
    #[must_use]
    pub fn new(request_type: &str) -> Self {
        let mut fields = Map::new();
        fields.insert(
            String::from("requestType"),
            Value::String(request_type.to_string()),
        );
        Self(fields)
    }

    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// # Errors
    ///
    /// Returns an error if `value` cannot be represented as JSON.
    pub fn with(mut self, key: &str, value: impl Serialize) -> Result<Self, serde_json::Error> {
        self.0.insert(key.to_string(), serde_json::to_value(value)?);
        Ok(self)
    }

    #[must_use]
    pub fn request_type(&self) -> Option<&str> {
        self.0
            .get("requestType")
            .and_then(Value::as_str)
            .filter(|kind| !kind.trim().is_empty())
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }
}

impl TryFrom<&ContentRequest> for RequestEnvelope {
    type Error = serde_json::Error;

    fn try_from(request: &ContentRequest) -> Result<Self, Self::Error> {
        match serde_json::to_value(request)? {
            Value::Object(fields) => Ok(Self(fields)),
            other => Err(serde::ser::Error::custom(format!(
                "request serialized to non-object {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameStatePayload {
    #[serde(default)]
    pub kingdom_background: Option<String>,
    #[serde(default)]
    pub current_event: Option<GameEvent>,
    #[serde(default)]
    pub status_message: Option<String>,
}

/// Parsed reply. `raw` keeps the body verbatim for the conversation history.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentResponse {
    #[serde(default)]
    pub game_state: Option<GameStatePayload>,
    #[serde(default)]
    pub next_turn_event: Option<GameEvent>,
    #[serde(skip)]
    pub raw: String,
}

impl ContentResponse {
    /// Parse a success body and check the minimal shape.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Format`] if the body is not JSON, lacks both
    /// result containers, or carries an unplayable event.
    pub fn parse(body: &str) -> Result<Self, GatewayError> {
        let mut response: Self = serde_json::from_str(body)
            .map_err(|err| GatewayError::Format(format!("body is not a valid reply: {err}")))?;
        if response.game_state.is_none() && response.next_turn_event.is_none() {
            return Err(GatewayError::Format(String::from(
                "reply has neither gameState nor nextTurnEvent",
            )));
        }
        let events = response
            .next_turn_event
            .iter()
            .chain(response.game_state.iter().filter_map(|gs| gs.current_event.as_ref()));
        for event in events {
            event
                .validate()
                .map_err(|err| GatewayError::Format(format!("event is unplayable: {err}")))?;
        }
        response.raw = body.to_string();
        Ok(response)
    }

    #[must_use]
    pub fn kingdom_background(&self) -> Option<&str> {
        self.game_state
            .as_ref()
            .and_then(|gs| gs.kingdom_background.as_deref())
            .filter(|bg| !bg.trim().is_empty())
    }

    #[must_use]
    pub fn status_message(&self) -> Option<&str> {
        self.game_state
            .as_ref()
            .and_then(|gs| gs.status_message.as_deref())
    }

    /// The event for the next screen, whichever container carried it.
    #[must_use]
    pub fn event(&self) -> Option<&GameEvent> {
        self.next_turn_event.as_ref().or_else(|| {
            self.game_state
                .as_ref()
                .and_then(|gs| gs.current_event.as_ref())
        })
    }
}

fn status_suffix(message: &Option<String>) -> String {
    message
        .as_deref()
        .map(|m| format!(" - {m}"))
        .unwrap_or_default()
}

fn server_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }
    let Ok(value) = serde_json::from_str::<Value>(trimmed) else {
        return Some(trimmed.to_string());
    };
    if let Some(error) = value.get("error").and_then(Value::as_str) {
        return Some(error.to_string());
    }
    if let Some(details) = value.get("details") {
        return Some(
            details
                .as_str()
                .map_or_else(|| details.to_string(), str::to_string),
        );
    }
    Some(value.to_string())
}

pub struct Gateway<T: ContentTransport> {
    transport: T,
    busy: Option<Rc<dyn BusyIndicator>>,
}

impl<T: ContentTransport> Gateway<T> {
    pub const fn new(transport: T) -> Self {
        Self {
            transport,
            busy: None,
        }
    }

    #[must_use]
    pub fn with_busy_indicator(mut self, busy: Rc<dyn BusyIndicator>) -> Self {
        self.busy = Some(busy);
        self
    }

    fn signal_busy(&self, mode: CallMode, busy: bool) {
        if mode == CallMode::Foreground
            && let Some(indicator) = &self.busy
        {
            indicator.set_busy(busy);
        }
    }

    /// Post one envelope and parse the reply.
    ///
    /// # Errors
    ///
    /// See [`GatewayError`]; a missing `requestType` fails before any I/O.
    pub async fn send(
        &self,
        request: &RequestEnvelope,
        mode: CallMode,
    ) -> Result<ContentResponse, GatewayError> {
        let Some(request_type) = request.request_type() else {
            return Err(GatewayError::MissingRequestType);
        };
        let body = serde_json::to_string(&request.0)?;
        log::debug!("posting {request_type} ({mode:?})");

        self.signal_busy(mode, true);
        let reply = self.transport.post_json(body).await;
        self.signal_busy(mode, false);

        let reply = reply?;
        if !reply.is_success() {
            let message = server_message(&reply.body);
            log::warn!("{request_type} failed with status {}", reply.status);
            return Err(GatewayError::Status {
                status: reply.status,
                message,
            });
        }
        ContentResponse::parse(&reply.body)
    }

    /// # Errors
    ///
    /// See [`GatewayError`].
    pub async fn request(
        &self,
        request: &ContentRequest,
        mode: CallMode,
    ) -> Result<ContentResponse, GatewayError> {
        let envelope = RequestEnvelope::try_from(request)?;
        self.send(&envelope, mode).await
    }
}
