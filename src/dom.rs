//! Browser binding: looks up the page elements, forwards clicks to the
//! session and applies the session's events back onto the DOM.
//!
//! Expected markup (ids / attributes):
//! - `.difficulty-button[data-difficulty]` controls
//! - `#start-button`, optional `#reset-button`
//! - `#difficulty-label`, `#goal-display`, `#score-display`, `#timer-display`, `#message`
//! - `#game-area` play surface; targets are appended as `div[data-target-id]`
use std::cell::RefCell;

use log::{debug, warn};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Document, Element, HtmlButtonElement, Window, window};

use crate::difficulty::Level;
use crate::error::{BindError, BindResult};
use crate::scheduler::{Scheduler, Task};
use crate::session::{HitEvent, Session, SessionEvent, Snapshot, Variant};
use crate::target::{Bounds, Target, TargetId};

thread_local! {
    static APP: RefCell<Option<App>> = const { RefCell::new(None) };
}

/// `setInterval` / `setTimeout` backed scheduler. Every callback routes back
/// through [`dispatch`] into the mounted session.
pub struct BrowserScheduler {
    window: Window,
    live: Vec<(i32, Closure<dyn FnMut()>)>,
    // Cancelled interval closures. A closure may be cancelled from inside its
    // own callback (clock tick -> end), so it is dropped later, not in cancel().
    retired: Vec<Closure<dyn FnMut()>>,
}

impl BrowserScheduler {
    fn new(window: Window) -> Self {
        Self {
            window,
            live: Vec::new(),
            retired: Vec::new(),
        }
    }
}

impl Scheduler for BrowserScheduler {
    type Handle = i32;

    fn every(&mut self, period_ms: u32, task: Task) -> i32 {
        self.retired.clear();
        let closure = Closure::wrap(Box::new(move || dispatch(task)) as Box<dyn FnMut()>);
        match self
            .window
            .set_interval_with_callback_and_timeout_and_arguments_0(
                closure.as_ref().unchecked_ref(),
                period_ms as i32,
            ) {
            Ok(handle) => {
                self.live.push((handle, closure));
                handle
            }
            Err(e) => {
                warn!("setInterval failed for {:?}: {e:?}", task.kind);
                -1
            }
        }
    }

    fn after(&mut self, delay_ms: u32, task: Task) {
        let callback = Closure::once_into_js(move || dispatch(task));
        if let Err(e) = self
            .window
            .set_timeout_with_callback_and_timeout_and_arguments_0(
                callback.unchecked_ref(),
                delay_ms as i32,
            )
        {
            warn!("setTimeout failed for {:?}: {e:?}", task.kind);
        }
    }

    fn cancel(&mut self, handle: i32) {
        self.window.clear_interval_with_handle(handle);
        if let Some(pos) = self.live.iter().position(|(h, _)| *h == handle) {
            let (_, closure) = self.live.swap_remove(pos);
            self.retired.push(closure);
        }
    }
}

struct View {
    difficulty_buttons: Vec<HtmlButtonElement>,
    start_button: HtmlButtonElement,
    reset_button: Option<HtmlButtonElement>,
    difficulty_label: Element,
    goal_display: Element,
    score_display: Element,
    timer_display: Element,
    message: Element,
    game_area: Element,
    document: Document,
}

fn by_id(doc: &Document, id: &str) -> BindResult<Element> {
    doc.get_element_by_id(id)
        .ok_or_else(|| BindError::MissingElement(format!("#{id}")))
}

fn as_button(el: Element, name: &str) -> BindResult<HtmlButtonElement> {
    el.dyn_into::<HtmlButtonElement>()
        .map_err(|_| BindError::WrongElement(name.to_string(), "button"))
}

impl View {
    fn bind(document: Document) -> BindResult<Self> {
        let nodes = document.query_selector_all(".difficulty-button")?;
        let mut difficulty_buttons = Vec::new();
        for i in 0..nodes.length() {
            if let Some(node) = nodes.get(i) {
                let button = node
                    .dyn_into::<HtmlButtonElement>()
                    .map_err(|_| BindError::WrongElement(".difficulty-button".into(), "button"))?;
                difficulty_buttons.push(button);
            }
        }
        let reset_button = match document.get_element_by_id("reset-button") {
            Some(el) => Some(as_button(el, "#reset-button")?),
            None => None,
        };
        Ok(Self {
            difficulty_buttons,
            start_button: as_button(by_id(&document, "start-button")?, "#start-button")?,
            reset_button,
            difficulty_label: by_id(&document, "difficulty-label")?,
            goal_display: by_id(&document, "goal-display")?,
            score_display: by_id(&document, "score-display")?,
            timer_display: by_id(&document, "timer-display")?,
            message: by_id(&document, "message")?,
            game_area: by_id(&document, "game-area")?,
            document,
        })
    }

    fn bounds(&self) -> Bounds {
        Bounds::new(
            self.game_area.client_width() as f64,
            self.game_area.client_height() as f64,
        )
    }

    fn apply<S: Scheduler>(&self, event: &SessionEvent, session: &Session<S>) -> Result<(), JsValue> {
        match event {
            SessionEvent::DifficultyChanged(level) => {
                for button in &self.difficulty_buttons {
                    let on = button.get_attribute("data-difficulty").as_deref() == Some(level.id());
                    button.class_list().toggle_with_force("active", on)?;
                }
            }
            SessionEvent::StatusChanged(text) => self.message.set_text_content(Some(text.as_str())),
            SessionEvent::StatsChanged => {
                let profile = session.difficulty();
                self.difficulty_label.set_text_content(Some(profile.label));
                self.goal_display.set_text_content(Some(&session.goal_text()));
                self.score_display
                    .set_text_content(Some(&session.score().to_string()));
                self.timer_display
                    .set_text_content(Some(&format!("{}s", session.remaining_seconds().max(0))));
            }
            SessionEvent::TargetSpawned(target) => self.add_target(target)?,
            SessionEvent::TargetRemoved(id) => {
                if let Some(el) = self.target_element(*id)? {
                    el.remove();
                }
            }
            SessionEvent::TargetsCleared => {
                let nodes = self.game_area.query_selector_all("[data-target-id]")?;
                for i in 0..nodes.length() {
                    if let Some(el) = nodes.get(i).and_then(|n| n.dyn_into::<Element>().ok()) {
                        el.remove();
                    }
                }
            }
            SessionEvent::ControlsLocked(locked) => {
                for button in &self.difficulty_buttons {
                    button.set_disabled(*locked);
                }
                self.start_button.set_disabled(*locked);
            }
            SessionEvent::Ended(outcome) => debug!("outcome shown: {:?}", outcome.tier),
        }
        Ok(())
    }

    fn add_target(&self, target: &Target) -> Result<(), JsValue> {
        let el = self.document.create_element("div")?;
        el.set_attribute("class", target.kind.css_class())?;
        el.set_attribute("data-target-id", &target.id.0.to_string())?;
        el.set_attribute(
            "style",
            &format!("left:{:.1}px; top:{:.1}px;", target.x, target.y),
        )?;
        self.game_area.append_child(&el)?;
        Ok(())
    }

    fn target_element(&self, id: TargetId) -> Result<Option<Element>, JsValue> {
        self.game_area
            .query_selector(&format!("[data-target-id=\"{}\"]", id.0))
    }
}

struct App {
    session: Session<BrowserScheduler>,
    view: View,
}

impl App {
    fn fire(&mut self, task: Task) {
        let bounds = self.view.bounds();
        self.session
            .fire(task, &mut rand::thread_rng(), bounds, now_ms());
        self.render();
    }

    fn render(&mut self) {
        for event in self.session.drain_events() {
            if let Err(e) = self.view.apply(&event, &self.session) {
                warn!("failed to render {event:?}: {e:?}");
            }
        }
    }
}

fn now_ms() -> f64 {
    window()
        .and_then(|w| w.performance())
        .map(|p| p.now())
        .unwrap_or(0.0)
}

/// Run `f` against the mounted app and redraw. Re-entrant calls (a callback
/// firing while another holds the app) are dropped.
fn with_app(f: impl FnOnce(&mut App)) {
    APP.with(|cell| match cell.try_borrow_mut() {
        Ok(mut slot) => {
            if let Some(app) = slot.as_mut() {
                f(app);
                app.render();
            }
        }
        Err(_) => warn!("session busy; input dropped"),
    });
}

fn dispatch(task: Task) {
    APP.with(|cell| match cell.try_borrow_mut() {
        Ok(mut slot) => {
            if let Some(app) = slot.as_mut() {
                app.fire(task);
            }
        }
        Err(_) => warn!("session busy; {:?} tick dropped", task.kind),
    });
}

fn hit_from_click(evt: &web_sys::MouseEvent) -> Option<HitEvent> {
    let el = evt.target()?.dyn_into::<Element>().ok()?;
    let target = el.closest("[data-target-id]").ok()??;
    let id = target.get_attribute("data-target-id")?.parse::<u32>().ok()?;
    Some(HitEvent {
        target_id: TargetId(id),
        timestamp_ms: now_ms(),
    })
}

fn on_click<F>(el: &Element, handler: F) -> BindResult<()>
where
    F: FnMut(web_sys::MouseEvent) + 'static,
{
    let closure = Closure::wrap(Box::new(handler) as Box<dyn FnMut(_)>);
    el.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())?;
    closure.forget();
    Ok(())
}

/// Bind the page and mount a fresh session of the given variant.
pub fn mount(variant: Variant) -> BindResult<()> {
    if APP.with(|cell| cell.borrow().is_some()) {
        return Err(BindError::AlreadyMounted);
    }
    let win = window().ok_or(BindError::NoWindow)?;
    let doc = win.document().ok_or(BindError::NoDocument)?;
    let view = View::bind(doc)?;

    for button in &view.difficulty_buttons {
        let level = button.get_attribute("data-difficulty").unwrap_or_default();
        on_click(button, move |_evt| match level.parse::<Level>() {
            Ok(level) => with_app(|app| {
                app.session.set_difficulty(level);
            }),
            Err(e) => warn!("{e}"),
        })?;
    }
    on_click(&view.start_button, |_evt| {
        with_app(|app| {
            app.session.start();
        })
    })?;
    if let Some(reset) = &view.reset_button {
        on_click(reset, |_evt| {
            with_app(|app| {
                app.session.reset();
            })
        })?;
    }
    // One delegated listener for every target the surface will ever hold.
    on_click(&view.game_area, |evt| {
        if let Some(hit) = hit_from_click(&evt) {
            with_app(|app| {
                app.session.on_target_hit(hit);
            });
        }
    })?;

    let session = Session::new(variant, BrowserScheduler::new(win));
    APP.with(|cell| cell.replace(Some(App { session, view })));
    with_app(|_| {});
    Ok(())
}

#[cfg_attr(not(feature = "serde_json"), allow(dead_code))]
pub fn snapshot() -> Option<Snapshot> {
    APP.with(|cell| {
        cell.try_borrow()
            .ok()
            .and_then(|slot| slot.as_ref().map(|app| app.session.snapshot()))
    })
}
