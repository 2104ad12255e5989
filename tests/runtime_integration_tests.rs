//! Integration tests for WidgetRuntime and WidgetHandle
//!
//! These run on tokio's paused clock, so step delays elapse instantly but in
//! order. They verify:
//! - Real timers pace the steps by the configured delay
//! - Direction switches through the handle cancel the in-flight step
//! - Subscribers see level changes and the end of an animation
//! - Reset halts and restores the spawn settings
//! - Shutdown halts the animation and closes the handle

use bathtub::models::{Direction, WidgetSettings};
use bathtub::{StateChange, WidgetError, WidgetHandle, WidgetRuntime};
use std::sync::atomic::Ordering;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};
use tokio_test::{assert_err, assert_ok};

const DELAY: Duration = Duration::from_millis(100);

fn spawn(initial_level: u32, target: u32) -> (WidgetHandle, JoinHandle<()>) {
    let settings = WidgetSettings {
        max_capacity: 10,
        target,
        delay: DELAY,
        initial_level,
    };
    WidgetRuntime::spawn(&settings, &tokio::runtime::Handle::current())
}

// Offsets keep the test clock away from exact step deadlines
async fn sleep_past(steps: u32) {
    sleep(DELAY * steps + DELAY / 2).await;
}

#[tokio::test(start_paused = true)]
async fn test_fill_paced_by_delay() {
    let (handle, _task) = spawn(0, 5);

    assert_ok!(handle.increase().await);
    sleep(DELAY / 2).await;
    assert_eq!(handle.current_level(), 1);

    sleep(DELAY).await; // 150ms
    assert_eq!(handle.current_level(), 2);

    sleep_past(4).await;
    assert_eq!(handle.current_level(), 5);
    assert_eq!(handle.current_direction(), Direction::None);
    assert_eq!(handle.snapshot().status_line(), "Direction: --  Level: 5");
}

#[tokio::test(start_paused = true)]
async fn test_drain_lands_on_target() {
    let (handle, _task) = spawn(10, 5);

    assert_ok!(handle.decrease().await);
    sleep_past(6).await;

    assert_eq!(handle.current_level(), 5);
    assert_eq!(handle.rendered_segments().len(), 5);
    assert_eq!(handle.metrics().steps(), 5);
    assert_eq!(handle.metrics().animations_completed.load(Ordering::Relaxed), 1);
}

#[tokio::test(start_paused = true)]
async fn test_switch_direction_through_handle() {
    let (handle, _task) = spawn(2, 5);

    assert_ok!(handle.increase().await);
    sleep(DELAY / 2).await;
    assert_eq!(handle.current_level(), 3);

    assert_ok!(handle.decrease().await);
    sleep(DELAY / 4).await;
    assert_eq!(handle.current_level(), 2);

    // Well past the abandoned step's deadline: the level only went down
    sleep(DELAY).await;
    assert_eq!(handle.current_level(), 1);

    sleep_past(3).await;
    assert_eq!(handle.current_level(), 0);
    assert_eq!(handle.metrics().direction_switches.load(Ordering::Relaxed), 1);
}

#[tokio::test(start_paused = true)]
async fn test_redundant_requests_do_not_speed_up() {
    let (handle, _task) = spawn(0, 10);

    for _ in 0..5 {
        assert_ok!(handle.increase().await);
    }
    sleep_past(2).await;

    assert_eq!(handle.current_level(), 3);
    assert_eq!(handle.metrics().redundant_requests.load(Ordering::Relaxed), 4);
    assert_eq!(handle.metrics().timers_scheduled.load(Ordering::Relaxed), 3);
}

#[tokio::test(start_paused = true)]
async fn test_target_and_delay_changes() {
    let (handle, _task) = spawn(0, 2);

    assert_ok!(handle.set_target(4).await);
    assert_ok!(handle.set_delay(DELAY * 2).await);
    sleep(Duration::from_millis(1)).await;

    let snapshot = handle.snapshot();
    assert_eq!(snapshot.target, 4);
    assert_eq!(snapshot.delay, DELAY * 2);

    assert_ok!(handle.increase().await);
    sleep(DELAY * 3).await; // one more step at 200ms
    assert_eq!(handle.current_level(), 2);

    assert_err!(handle.set_target(11).await);
    assert_err!(handle.set_delay(Duration::ZERO).await);
}

#[tokio::test(start_paused = true)]
async fn test_subscriber_sees_animation() {
    let (handle, _task) = spawn(0, 3);
    let mut rx = handle.subscribe();

    assert_ok!(handle.increase().await);

    let mut levels = Vec::new();
    loop {
        let change = timeout(DELAY * 10, rx.recv())
            .await
            .expect("Timeout waiting for state change")
            .expect("Channel closed");
        match change {
            StateChange::LevelChanged { level, .. } => levels.push(level),
            StateChange::AnimationFinished { level } => {
                assert_eq!(level, 3);
                break;
            }
            _ => {}
        }
    }

    assert_eq!(levels, vec![1, 2, 3]);
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_mid_animation() {
    let (handle, task) = spawn(0, 10);

    assert_ok!(handle.increase().await);
    sleep_past(2).await;
    assert_ok!(handle.shutdown().await);
    assert_ok!(task.await);

    assert_eq!(handle.current_level(), 3);
    assert_eq!(handle.current_direction(), Direction::None);

    // No timer survives the runtime
    sleep_past(5).await;
    assert_eq!(handle.current_level(), 3);
    assert!(matches!(
        handle.increase().await,
        Err(WidgetError::RuntimeClosed)
    ));
}

#[tokio::test(start_paused = true)]
async fn test_dropping_all_handles_stops_runtime() {
    let (handle, task) = spawn(0, 5);
    let clone = handle.clone();

    drop(handle);
    drop(clone);

    assert_ok!(assert_ok!(timeout(Duration::from_secs(1), task).await));
}

#[tokio::test(start_paused = true)]
async fn test_reset_mid_animation() {
    let (handle, _task) = spawn(1, 5);

    assert_ok!(handle.set_delay(DELAY * 2).await);
    assert_ok!(handle.set_target(9).await);
    assert_ok!(handle.increase().await);
    sleep(DELAY * 3).await;
    assert_eq!(handle.current_level(), 3);

    let mut rx = handle.subscribe();
    assert_ok!(handle.reset().await);

    let mut changes = Vec::new();
    loop {
        let change = timeout(DELAY, rx.recv())
            .await
            .expect("Timeout waiting for state change")
            .expect("Channel closed");
        let done = change == StateChange::StateReset;
        changes.push(change);
        if done {
            break;
        }
    }
    assert!(changes.contains(&StateChange::LevelChanged { level: 1, previous: 3 }));
    assert!(changes.contains(&StateChange::AnimationFinished { level: 1 }));
    assert!(changes.contains(&StateChange::TargetChanged { target: 5 }));
    assert!(changes.contains(&StateChange::DelayChanged { delay: DELAY }));

    // The cancelled step never lands
    sleep(DELAY * 5).await;
    let snapshot = handle.snapshot();
    assert_eq!(snapshot.level, 1);
    assert_eq!(snapshot.target, 5);
    assert_eq!(snapshot.delay, DELAY);
    assert!(!snapshot.is_animating());
}
