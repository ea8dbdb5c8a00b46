//! Kingdom Game Engine
//!
//! Platform-agnostic core of the Kingdom narrative strategy game: the four
//! resource channels, the per-session store, the content service gateway and
//! the screen flow that hides content latency behind the feedback screen.
//! Browser and native front ends plug in through [`SessionStorage`],
//! [`ContentTransport`] and [`Sleeper`].

pub mod applier;
pub mod config;
pub mod constants;
pub mod endgame;
pub mod event;
pub mod flow;
pub mod gateway;
pub mod history;
pub mod resources;
pub mod state;
pub mod store;

// Re-export commonly used types
pub use applier::{ApplyError, apply_choice};
pub use config::{ConfigError, GameConfig};
pub use endgame::{GameOverInfo, generic_ending_text};
pub use event::{EventError, EventOption, GameEvent, OptionId};
pub use flow::{
    CancelToken, ChoiceError, ChoiceMade, ContinueError, Entry, FeedbackView, GameOverView,
    MainView, PollSettings, PrefetchError, PrefetchTask, Screen, Sleeper, StartError, TurnMachine,
};
pub use gateway::{
    BusyIndicator, CallMode, ContentRequest, ContentResponse, ContentTransport, Gateway,
    GatewayError, RequestEnvelope, TransportError, TransportResponse,
};
pub use history::{HistoryTurn, Role};
pub use resources::{
    Bound, Channel, ResourceDelta, ResourceVector, TerminalCheck, TerminalReason, apply_delta,
    check_terminal,
};
pub use state::{LastChoiceResult, MainState};
pub use store::{MemoryStorage, PendingSaveError, SessionStorage, SessionStore, StoreError};
