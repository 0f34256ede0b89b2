// Integration tests (native) for the `drop-catcher` crate.
// These tests avoid wasm-specific functionality and drive the session through
// the virtual-clock scheduler so they can run under `cargo test` on the host.

use drop_catcher::{
    Bounds, HitEvent, Level, ManualScheduler, Session, SessionEvent, Task, TaskKind, Variant,
};
use rand::SeedableRng;
use rand::rngs::StdRng;

const SURFACE: Bounds = Bounds {
    width: 640.0,
    height: 480.0,
};

fn session(variant: Variant) -> Session<ManualScheduler> {
    Session::new(variant, ManualScheduler::new())
}

fn hit_first(s: &mut Session<ManualScheduler>) -> bool {
    match s.targets().first() {
        Some(t) => {
            let hit = HitEvent {
                target_id: t.id,
                timestamp_ms: s.scheduler().now_ms() as f64,
            };
            s.on_target_hit(hit)
        }
        None => false,
    }
}

#[test]
fn set_difficulty_while_idle_resets_for_every_level() {
    let mut rng = StdRng::seed_from_u64(1);
    for level in Level::ALL {
        let mut s = session(Variant::Drops);
        s.start();
        s.advance(5_000, &mut rng, SURFACE);
        assert!(hit_first(&mut s));
        s.end();
        assert!(s.score() > 0);

        assert!(s.set_difficulty(level));
        assert_eq!(s.score(), 0);
        assert_eq!(s.remaining_seconds(), level.profile().duration_seconds as i32);
        assert_eq!(s.difficulty().level, level);
        assert!(s.targets().is_empty());
        assert_eq!(
            s.status(),
            format!("You selected {}. Press \"Start Game\" to begin.", level.profile().label)
        );
    }
}

#[test]
fn set_difficulty_while_running_is_ignored() {
    let mut rng = StdRng::seed_from_u64(2);
    let mut s = session(Variant::Drops);
    s.start();
    s.advance(3_000, &mut rng, SURFACE);
    hit_first(&mut s);
    let before = s.snapshot();
    assert!(!s.set_difficulty(Level::Hard));
    assert_eq!(s.snapshot(), before);
}

#[test]
fn double_start_creates_no_extra_producers() {
    let mut rng = StdRng::seed_from_u64(3);
    let mut s = session(Variant::Drops);
    assert!(s.start());
    assert!(!s.start());
    assert_eq!(s.scheduler().repeating(), 2);
    // One spawn per interval, not two.
    s.advance(900, &mut rng, SURFACE);
    assert_eq!(s.targets().len(), 1);
}

#[test]
fn clock_counts_down_and_ends_exactly_once() {
    let mut rng = StdRng::seed_from_u64(4);
    for level in Level::ALL {
        let duration = level.profile().duration_seconds as i32;
        let mut s = session(Variant::Drops);
        s.set_difficulty(level);
        s.start();
        s.drain_events();
        for t in 1..duration {
            s.advance(1_000, &mut rng, SURFACE);
            assert_eq!(s.remaining_seconds(), duration - t);
            assert!(s.is_active());
        }
        s.advance(1_000, &mut rng, SURFACE);
        assert_eq!(s.remaining_seconds(), 0);
        assert!(!s.is_active());
        // Keep the virtual clock running well past the end.
        s.advance(10_000, &mut rng, SURFACE);
        let ended = s
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, SessionEvent::Ended(_)))
            .count();
        assert_eq!(ended, 1);
        assert_eq!(s.remaining_seconds(), 0);
    }
}

#[test]
fn hits_while_idle_never_score() {
    let mut rng = StdRng::seed_from_u64(5);
    let mut s = session(Variant::Drops);
    s.start();
    s.advance(2_000, &mut rng, SURFACE);
    let id = s.targets()[0].id;
    s.end();
    assert!(!s.on_target_hit(HitEvent {
        target_id: id,
        timestamp_ms: 0.0,
    }));
    assert_eq!(s.score(), 0);
}

#[test]
fn end_cancels_both_producers() {
    let mut rng = StdRng::seed_from_u64(6);
    let mut s = session(Variant::Drops);
    s.start();
    s.advance(4_000, &mut rng, SURFACE);
    hit_first(&mut s);
    let outcome = s.end().expect("running session ends");
    assert_eq!(s.scheduler().repeating(), 0);
    assert!(!s.producers_armed());
    s.drain_events();

    // Stale callbacks from the finished run change nothing.
    for kind in [TaskKind::Spawn, TaskKind::Clock] {
        s.fire(Task { kind, generation: 1 }, &mut rng, SURFACE, 5_000.0);
    }
    assert!(s.tick().is_none());
    assert!(s.spawn_target(&mut rng, SURFACE, 5_000.0).is_none());
    s.advance(60_000, &mut rng, SURFACE);

    assert!(s.drain_events().is_empty());
    assert_eq!(s.score(), outcome.score);
    assert!(s.targets().is_empty());
    assert!(s.end().is_none());
}

#[test]
fn tasks_from_previous_run_are_ignored_after_restart() {
    let mut rng = StdRng::seed_from_u64(7);
    let mut s = session(Variant::Drops);
    s.start();
    s.end();
    s.start();
    let remaining = s.remaining_seconds();
    s.fire(
        Task {
            kind: TaskKind::Clock,
            generation: 1,
        },
        &mut rng,
        SURFACE,
        0.0,
    );
    assert_eq!(s.remaining_seconds(), remaining);
    s.fire(
        Task {
            kind: TaskKind::Clock,
            generation: 2,
        },
        &mut rng,
        SURFACE,
        0.0,
    );
    assert_eq!(s.remaining_seconds(), remaining - 1);
}

#[test]
fn unknown_target_hits_are_ignored() {
    let mut s = session(Variant::Drops);
    s.start();
    assert!(!s.on_target_hit(HitEvent {
        target_id: drop_catcher::TargetId(999),
        timestamp_ms: 0.0,
    }));
    assert_eq!(s.score(), 0);
}
