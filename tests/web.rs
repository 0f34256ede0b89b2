// Browser smoke tests; run with `wasm-pack test --headless --firefox`.
#![cfg(target_arch = "wasm32")]

use drop_catcher::{Level, ManualScheduler, Session, Variant};
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

#[wasm_bindgen_test]
fn mounting_without_markup_reports_missing_element() {
    let err = drop_catcher::start_game().unwrap_err();
    let text = err.as_string().unwrap_or_default();
    assert!(text.starts_with("missing element"), "{text}");
}

#[wasm_bindgen_test]
fn session_logic_runs_under_wasm() {
    let mut rng = rand::thread_rng();
    let mut s = Session::new(Variant::Drops, ManualScheduler::new());
    s.set_difficulty(Level::Hard);
    s.start();
    s.advance(20_000, &mut rng, drop_catcher::Bounds::new(300.0, 300.0));
    assert!(!s.is_active());
    assert_eq!(s.remaining_seconds(), 0);
}
