//! Session controller: owns score, clock and live targets for one game surface
//! and drives the spawner / clock producers through a [`Scheduler`].
//!
//! State machine: `Idle -> Running -> Idle`. `start()` enters Running; the
//! clock reaching zero or an explicit `end()` leaves it. Difficulty changes and
//! `reset()` only apply while Idle. Operations that are not allowed in the
//! current state are silent no-ops and report that through their return value.
//!
//! The controller never touches the page. Everything the surface needs to
//! redraw is queued as [`SessionEvent`]s and drained by the caller.

use log::{debug, info};
use rand::Rng;

use crate::difficulty::{DifficultyProfile, Level};
use crate::scheduler::{ManualScheduler, Scheduler, Task, TaskKind, TimerSlot};
use crate::target::{
    Bounds, CAN_LIFETIME_MS, DROP_LIFETIME_MS, GOOD_CAN_CHANCE, Target, TargetId, TargetKind,
};

/// Points for clicking a good can.
pub const CAN_REWARD: u32 = 10;
/// Points lost for clicking a bad can (score never drops below zero).
pub const CAN_PENALTY: u32 = 5;
/// Cans: absolute score needed for the top message tier.
pub const CANS_WIN_SCORE: u32 = 100;
/// Cans: absolute score needed for the middle message tier.
pub const CANS_PARTIAL_SCORE: u32 = 50;

const CLOCK_PERIOD_MS: u32 = 1_000;

pub const READY_MESSAGE: &str = "Ready? Pick a difficulty and press Start.";

/// Which flavour of the game this session plays.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Variant {
    /// One kind of target, +1 per click, many on screen at once, goal from the profile.
    Drops,
    /// Good (+10) and bad (-5) cans, one on screen at a time, fixed thresholds.
    Cans,
}

impl Variant {
    fn lifetime_ms(self) -> u32 {
        match self {
            Variant::Drops => DROP_LIFETIME_MS,
            Variant::Cans => CAN_LIFETIME_MS,
        }
    }

    pub fn goal_text(self, profile: &DifficultyProfile) -> String {
        match self {
            Variant::Drops => format!("{} drops", profile.target_score),
            Variant::Cans => format!("{CANS_WIN_SCORE} points"),
        }
    }

    fn start_message(self) -> &'static str {
        match self {
            Variant::Drops => {
                "Game started! Click as many blue water drops as you can before time runs out."
            }
            Variant::Cans => "Game started! Click the yellow cans and avoid the polluted ones.",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Tier {
    Win,
    /// Cans only: made it past the lower threshold.
    Partial,
    /// Lose / retry.
    Lose,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Outcome {
    pub tier: Tier,
    pub score: u32,
    pub message: String,
}

impl Outcome {
    fn judge(variant: Variant, profile: &DifficultyProfile, score: u32) -> Self {
        let (tier, message) = match variant {
            Variant::Drops if score >= profile.target_score => (
                Tier::Win,
                format!(
                    "Amazing! You collected {score} drops and reached the goal for the {} level. \
                     Imagine the impact of bringing clean water to a whole community!",
                    profile.label
                ),
            ),
            Variant::Drops => (
                Tier::Lose,
                format!(
                    "You collected {score} drops, but the goal was {}. \
                     You're close, try again and see if you can beat your best score!",
                    profile.target_score
                ),
            ),
            Variant::Cans if score >= CANS_WIN_SCORE => (
                Tier::Win,
                format!("Incredible! You scored {score} points. You're a clean water champion!"),
            ),
            Variant::Cans if score >= CANS_PARTIAL_SCORE => (
                Tier::Partial,
                format!(
                    "Nice work! You scored {score} points. Reach {CANS_WIN_SCORE} to become a champion!"
                ),
            ),
            Variant::Cans => (
                Tier::Lose,
                format!("You scored {score} points. Keep practicing and try again!"),
            ),
        };
        Self { tier, score, message }
    }
}

/// A click on a target, already resolved to its id by the surface.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HitEvent {
    pub target_id: TargetId,
    pub timestamp_ms: f64,
}

/// Changes the surface has to reflect.
#[derive(Clone, Debug, PartialEq)]
pub enum SessionEvent {
    DifficultyChanged(Level),
    StatusChanged(String),
    /// Score, time or difficulty text needs a refresh.
    StatsChanged,
    TargetSpawned(Target),
    TargetRemoved(TargetId),
    TargetsCleared,
    /// Difficulty / start controls locked (`true`) or released (`false`).
    ControlsLocked(bool),
    Ended(Outcome),
}

/// Read-only view of the session, e.g. for exporting to JS.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Snapshot {
    pub variant: Variant,
    pub level: Level,
    pub label: &'static str,
    pub goal: String,
    pub score: u32,
    pub remaining_seconds: i32,
    pub active: bool,
    pub status: String,
    pub targets: Vec<Target>,
}

pub struct Session<S: Scheduler> {
    variant: Variant,
    difficulty: &'static DifficultyProfile,
    score: u32,
    remaining_seconds: i32,
    active: bool,
    status: String,
    targets: Vec<Target>,
    next_target_id: u32,
    generation: u64, // bumped on every start(); tasks from older runs are stale
    spawner: TimerSlot<S::Handle>,
    clock: TimerSlot<S::Handle>,
    scheduler: S,
    events: Vec<SessionEvent>,
    last_outcome: Option<Outcome>,
}

impl<S: Scheduler> Session<S> {
    /// New idle session on the default (easy) difficulty.
    pub fn new(variant: Variant, scheduler: S) -> Self {
        let difficulty = Level::default().profile();
        let mut session = Self {
            variant,
            difficulty,
            score: 0,
            remaining_seconds: difficulty.duration_seconds as i32,
            active: false,
            status: String::new(),
            targets: Vec::new(),
            next_target_id: 0,
            generation: 0,
            spawner: TimerSlot::Idle,
            clock: TimerSlot::Idle,
            scheduler,
            events: Vec::new(),
            last_outcome: None,
        };
        session.set_difficulty(difficulty.level);
        session
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    pub fn difficulty(&self) -> &'static DifficultyProfile {
        self.difficulty
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn remaining_seconds(&self) -> i32 {
        self.remaining_seconds
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    pub fn last_outcome(&self) -> Option<&Outcome> {
        self.last_outcome.as_ref()
    }

    pub fn goal_text(&self) -> String {
        self.variant.goal_text(self.difficulty)
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    /// True while either producer still holds a live timer.
    pub fn producers_armed(&self) -> bool {
        self.spawner.is_armed() || self.clock.is_armed()
    }

    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            variant: self.variant,
            level: self.difficulty.level,
            label: self.difficulty.label,
            goal: self.goal_text(),
            score: self.score,
            remaining_seconds: self.remaining_seconds,
            active: self.active,
            status: self.status.clone(),
            targets: self.targets.clone(),
        }
    }

    /// Select a difficulty and reset score / clock for it. Ignored while running.
    pub fn set_difficulty(&mut self, level: Level) -> bool {
        if self.active {
            debug!("difficulty change to {level} ignored: session running");
            return false;
        }
        self.difficulty = level.profile();
        self.score = 0;
        self.remaining_seconds = self.difficulty.duration_seconds as i32;
        self.clear_targets();
        self.events.push(SessionEvent::DifficultyChanged(level));
        self.set_status(format!(
            "You selected {}. Press \"Start Game\" to begin.",
            self.difficulty.label
        ));
        self.events.push(SessionEvent::StatsChanged);
        true
    }

    /// Begin a session and launch the spawner and clock. Ignored while running.
    pub fn start(&mut self) -> bool {
        if self.active {
            debug!("start ignored: session already running");
            return false;
        }
        self.generation += 1;
        self.active = true;
        self.score = 0;
        self.remaining_seconds = self.difficulty.duration_seconds as i32;
        self.last_outcome = None;
        self.clear_targets();
        self.events.push(SessionEvent::StatsChanged);
        self.set_status(self.variant.start_message().to_string());
        self.events.push(SessionEvent::ControlsLocked(true));

        let generation = self.generation;
        self.spawner.arm(
            &mut self.scheduler,
            self.difficulty.spawn_interval_ms,
            Task {
                kind: TaskKind::Spawn,
                generation,
            },
        );
        self.clock.arm(
            &mut self.scheduler,
            CLOCK_PERIOD_MS,
            Task {
                kind: TaskKind::Clock,
                generation,
            },
        );
        info!(
            "session {generation} started ({:?}, {}, {}s)",
            self.variant, self.difficulty.level, self.remaining_seconds
        );
        true
    }

    /// Run a scheduled task. Tasks from an earlier run are dropped.
    pub fn fire<R: Rng + ?Sized>(&mut self, task: Task, rng: &mut R, bounds: Bounds, now_ms: f64) {
        if task.generation != self.generation {
            debug!("stale task {:?} (generation {}) ignored", task.kind, task.generation);
            return;
        }
        match task.kind {
            TaskKind::Spawn => {
                self.spawn_target(rng, bounds, now_ms);
            }
            TaskKind::Clock => {
                self.tick();
            }
            TaskKind::Expire(id) => {
                self.expire_target(id);
            }
        }
    }

    /// Spawner body: place one target at a random position and schedule its expiry.
    pub fn spawn_target<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        bounds: Bounds,
        now_ms: f64,
    ) -> Option<TargetId> {
        if !self.active {
            return None;
        }
        let kind = match self.variant {
            Variant::Drops => TargetKind::Drop,
            Variant::Cans => {
                // A single can is on screen at a time; the new one replaces it.
                for old in std::mem::take(&mut self.targets) {
                    self.events.push(SessionEvent::TargetRemoved(old.id));
                }
                if rng.gen_bool(GOOD_CAN_CHANCE) {
                    TargetKind::GoodCan
                } else {
                    TargetKind::BadCan
                }
            }
        };
        let (x, y) = bounds.random_position(rng);
        let id = TargetId(self.next_target_id);
        self.next_target_id = self.next_target_id.wrapping_add(1);
        let target = Target {
            id,
            kind,
            x,
            y,
            spawned_ms: now_ms,
            lifetime_ms: self.variant.lifetime_ms(),
        };
        self.targets.push(target);
        self.events.push(SessionEvent::TargetSpawned(target));
        self.scheduler.after(
            target.lifetime_ms,
            Task {
                kind: TaskKind::Expire(id),
                generation: self.generation,
            },
        );
        Some(id)
    }

    /// Clock body: one second elapsed. Ends the session when time runs out.
    pub fn tick(&mut self) -> Option<Outcome> {
        if !self.active {
            return None;
        }
        self.remaining_seconds -= 1;
        self.events.push(SessionEvent::StatsChanged);
        if self.remaining_seconds <= 0 {
            return self.end();
        }
        None
    }

    /// Remove an unclicked target whose lifetime ran out. No-op if it is gone.
    pub fn expire_target(&mut self, id: TargetId) -> bool {
        let before = self.targets.len();
        self.targets.retain(|t| t.id != id);
        let removed = self.targets.len() != before;
        if removed {
            self.events.push(SessionEvent::TargetRemoved(id));
        }
        removed
    }

    /// Score a click on a live target.
    pub fn on_target_hit(&mut self, hit: HitEvent) -> bool {
        if !self.active {
            debug!("hit on {:?} ignored: session not running", hit.target_id);
            return false;
        }
        let Some(idx) = self.targets.iter().position(|t| t.id == hit.target_id) else {
            debug!("hit on unknown target {:?}", hit.target_id);
            return false;
        };
        match self.targets[idx].kind {
            TargetKind::Drop => {
                self.score += 1;
                self.targets.remove(idx);
                self.events.push(SessionEvent::TargetRemoved(hit.target_id));
            }
            TargetKind::GoodCan => {
                self.score += CAN_REWARD;
                self.clear_targets();
            }
            TargetKind::BadCan => {
                self.score = self.score.saturating_sub(CAN_PENALTY);
                self.clear_targets();
            }
        }
        self.events.push(SessionEvent::StatsChanged);
        true
    }

    /// Finish the running session: stop both producers, clear the surface and
    /// report the result tier. Ignored while idle.
    pub fn end(&mut self) -> Option<Outcome> {
        if !self.active {
            return None;
        }
        self.active = false;
        self.stop_producers();
        self.clear_targets();
        let outcome = Outcome::judge(self.variant, self.difficulty, self.score);
        info!(
            "session {} ended: {:?} with score {}",
            self.generation, outcome.tier, outcome.score
        );
        self.set_status(outcome.message.clone());
        self.events.push(SessionEvent::ControlsLocked(false));
        self.events.push(SessionEvent::Ended(outcome.clone()));
        self.last_outcome = Some(outcome.clone());
        Some(outcome)
    }

    /// Cans only: stop everything and return to a zeroed, ready state whether
    /// or not a session is running.
    pub fn reset(&mut self) -> bool {
        if self.variant != Variant::Cans {
            return false;
        }
        if self.active {
            info!("session {} reset while running", self.generation);
        }
        self.active = false;
        self.stop_producers();
        self.score = 0;
        self.remaining_seconds = 0;
        self.last_outcome = None;
        self.clear_targets();
        self.set_status(READY_MESSAGE.to_string());
        self.events.push(SessionEvent::ControlsLocked(false));
        self.events.push(SessionEvent::StatsChanged);
        true
    }

    fn stop_producers(&mut self) {
        self.spawner.disarm(&mut self.scheduler);
        self.clock.disarm(&mut self.scheduler);
    }

    fn clear_targets(&mut self) {
        self.targets.clear();
        self.events.push(SessionEvent::TargetsCleared);
    }

    fn set_status(&mut self, status: String) {
        self.status = status.clone();
        self.events.push(SessionEvent::StatusChanged(status));
    }
}

impl Session<ManualScheduler> {
    /// Advance the virtual clock by `ms`, firing every task that falls due in
    /// order. Used by tests and headless drivers.
    pub fn advance<R: Rng + ?Sized>(&mut self, ms: u64, rng: &mut R, bounds: Bounds) {
        let until = self.scheduler.now_ms() + ms;
        while let Some(task) = self.scheduler.next_due(until) {
            let now = self.scheduler.now_ms() as f64;
            self.fire(task, rng, bounds, now);
        }
        self.scheduler.park(until);
    }
}
