use async_trait::async_trait;
use kingdom_game::{
    Channel, ContentTransport, EventOption, GameEvent, OptionId, ResourceDelta, TransportError,
    TransportResponse,
};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde_json::{Value, json};
use std::cell::{Cell, RefCell};

const BACKGROUNDS: &[&str] = &[
    "A river kingdom of mills and ferries, newly crowned and deeply in debt.",
    "A mountain realm whose passes are guarded by an old and proud army.",
    "An island throne ringed by lighthouses, where the temples own half the land.",
    "A steppe khanate that settled into walled towns a generation ago.",
];

const SITUATIONS: &[(&str, &str)] = &[
    ("harvest", "The harvest came in thin and the granaries are half empty."),
    ("diplomacy", "Envoys from a neighbouring duchy ask for a marriage alliance."),
    ("military", "Scouts report raiders gathering beyond the eastern ford."),
    ("religion", "A wandering preacher draws crowds in the capital square."),
    ("economy", "Merchants petition for lower tolls on the river road."),
    ("court", "Two noble houses demand that you settle an old feud."),
];

const ACTIONS: &[&str] = &[
    "Open the royal stores",
    "Raise a new levy",
    "Send gifts and promises",
    "Call the priests to council",
    "Tax the merchant guilds",
    "Do nothing and wait",
];

const OPENING_STATUS: &str = "The court gathers for your first audience.";

/// In-process stand-in for the content service. Every reply is drawn from a
/// seeded stream, so the same seed always plays the same game.
pub struct ScriptedBackend {
    rng: RefCell<ChaCha8Rng>,
    outage_rate: f64,
    calls: Cell<u32>,
    outages: Cell<u32>,
}

impl ScriptedBackend {
    /// `outage_rate` is the chance (0.0 to 1.0) that any single call answers
    /// `503`.
    pub fn new(seed: u64, outage_rate: f64) -> Self {
        Self {
            rng: RefCell::new(ChaCha8Rng::seed_from_u64(seed)),
            outage_rate: outage_rate.clamp(0.0, 1.0),
            calls: Cell::new(0),
            outages: Cell::new(0),
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.get()
    }

    pub fn outages(&self) -> u32 {
        self.outages.get()
    }

    fn reply(&self, body: &str) -> TransportResponse {
        let request: Value = match serde_json::from_str(body) {
            Ok(value) => value,
            Err(err) => return error_reply(400, &format!("invalid JSON: {err}")),
        };
        let mut rng = self.rng.borrow_mut();
        if self.outage_rate > 0.0 && rng.gen_bool(self.outage_rate) {
            self.outages.set(self.outages.get() + 1);
            return error_reply(503, "scripted outage");
        }

        let payload = match request.get("requestType").and_then(Value::as_str) {
            Some("generateBackground") => {
                let background = BACKGROUNDS.choose(&mut *rng).copied().unwrap_or_default();
                json!({ "gameState": { "kingdomBackground": background } })
            }
            Some("generateFirstEvent") => {
                let event = scripted_event(&mut *rng, 1);
                json!({ "gameState": { "currentEvent": event, "statusMessage": OPENING_STATUS } })
            }
            Some("processChoiceAndPrepareNext" | "generateNextEvent") => {
                let stage = request
                    .pointer("/currentState/roundNumber")
                    .and_then(Value::as_u64)
                    .and_then(|round| u32::try_from(round).ok())
                    .unwrap_or(1);
                json!({ "nextTurnEvent": scripted_event(&mut *rng, stage) })
            }
            Some(other) => return error_reply(400, &format!("unknown requestType `{other}`")),
            None => return error_reply(400, "missing requestType"),
        };
        TransportResponse {
            status: 200,
            body: payload.to_string(),
        }
    }
}

#[async_trait(?Send)]
impl ContentTransport for ScriptedBackend {
    async fn post_json(&self, body: String) -> Result<TransportResponse, TransportError> {
        self.calls.set(self.calls.get() + 1);
        // Let a spawned background fetch interleave like a real request would.
        tokio::task::yield_now().await;
        Ok(self.reply(&body))
    }
}

fn error_reply(status: u16, message: &str) -> TransportResponse {
    TransportResponse {
        status,
        body: json!({ "error": message }).to_string(),
    }
}

fn scripted_event(rng: &mut ChaCha8Rng, stage: u32) -> GameEvent {
    let (event_type, description) = SITUATIONS.choose(rng).copied().unwrap_or(SITUATIONS[0]);
    let option_count = rng.gen_range(2..=OptionId::ALL.len());
    let mut actions: Vec<&str> = ACTIONS.to_vec();
    actions.shuffle(rng);

    let options = OptionId::ALL
        .iter()
        .zip(actions)
        .take(option_count)
        .map(|(&id, action)| {
            let delta = scripted_delta(rng);
            EventOption {
                id,
                text: action.to_string(),
                outcome_text: Some(format!("{action}. The realm feels it: {}.", delta.summary())),
                resource_changes: Some(delta),
            }
        })
        .collect();

    GameEvent {
        description: description.to_string(),
        stage: Some(stage),
        options,
        event_type: Some(event_type.to_string()),
    }
}

/// One or two channels, each moved by a non-zero amount in `-2..=2`.
fn scripted_delta(rng: &mut ChaCha8Rng) -> ResourceDelta {
    let mut channels = Channel::ALL.to_vec();
    channels.shuffle(rng);
    let touched = rng.gen_range(1..=2);
    channels
        .into_iter()
        .take(touched)
        .fold(ResourceDelta::default(), |delta, channel| {
            let magnitude = rng.gen_range(1..=2);
            let amount = if rng.gen_bool(0.5) { magnitude } else { -magnitude };
            delta.with(channel, amount)
        })
}
