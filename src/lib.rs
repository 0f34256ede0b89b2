//! Drop Catcher core crate.
//!
//! A timed "click the target before it disappears" mini-game. The session
//! logic (`session`, `scheduler`, `difficulty`, `target`) is plain Rust and
//! runs natively under `cargo test`; `dom` wires it to the page when built for
//! the browser. Two flavours are exposed to JS:
//! - `start_game()`: water drops, +1 per drop, goal taken from the difficulty.
//! - `start_cans_game()`: good / bad cans, +10 / -5, fixed score thresholds.

use wasm_bindgen::prelude::*;

pub mod difficulty;
mod dom;
pub mod error;
pub mod scheduler;
pub mod session;
pub mod target;

pub use difficulty::{DifficultyProfile, Level, ParseLevelError};
pub use error::BindError;
pub use scheduler::{ManualScheduler, Scheduler, Task, TaskKind, TimerSlot};
pub use session::{HitEvent, Outcome, Session, SessionEvent, Snapshot, Tier, Variant};
pub use target::{Bounds, Target, TargetId, TargetKind};

// Optional small allocator for size (feature gated)
#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn wasm_start() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
    // A logger may already be installed by the host page; keep it.
    #[cfg(feature = "console_log")]
    let _ = console_log::init_with_level(log::Level::Info);
}

/// Mount the water-drop game on the current page.
#[wasm_bindgen]
pub fn start_game() -> Result<(), JsValue> {
    dom::mount(Variant::Drops).map_err(JsValue::from)
}

/// Mount the good / bad cans game on the current page.
#[wasm_bindgen]
pub fn start_cans_game() -> Result<(), JsValue> {
    dom::mount(Variant::Cans).map_err(JsValue::from)
}

/// JSON dump of the mounted session, for debugging from the console.
#[cfg(feature = "serde_json")]
#[wasm_bindgen]
pub fn session_snapshot_json() -> Option<String> {
    dom::snapshot().and_then(|s| serde_json::to_string(&s).ok())
}
