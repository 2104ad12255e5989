//! Integration tests for StateManager with state change events
//!
//! These tests verify that the StateManager correctly:
//! - Emits change events when a controller snapshot is published
//! - Supports multiple subscribers
//! - Handles concurrent access from multiple tasks
//! - Reports a whole fill as a consistent sequence of events

use bathtub::models::{Direction, WidgetSettings, WidgetState};
use bathtub::services::{DirectionController, Phase};
use bathtub::{StateChange, StateManager};
use std::sync::Arc;
use tokio::time::{Duration, timeout};

fn settings(initial_level: u32, target: u32) -> WidgetSettings {
    WidgetSettings {
        max_capacity: 10,
        target,
        delay: Duration::from_millis(100),
        initial_level,
    }
}

async fn drain_events(rx: &mut tokio::sync::broadcast::Receiver<StateChange>) -> Vec<StateChange> {
    let mut events = Vec::new();
    while let Ok(Ok(event)) = timeout(Duration::from_millis(10), rx.recv()).await {
        events.push(event);
    }
    events
}

#[tokio::test]
async fn test_controller_snapshot_emits_started() {
    let mut controller = DirectionController::virtual_clock(&settings(0, 5));
    let state = Arc::new(StateManager::with_state(controller.snapshot()));
    let mut rx = state.subscribe();

    controller.request_direction(Direction::Increasing);
    state.publish(controller.snapshot());

    let events = drain_events(&mut rx).await;
    assert!(
        events.contains(&StateChange::AnimationStarted {
            direction: Direction::Increasing
        }),
        "Expected AnimationStarted event, got: {:?}",
        events
    );
    assert!(events.contains(&StateChange::LevelChanged { level: 1, previous: 0 }));
}

#[tokio::test]
async fn test_multiple_subscribers_receive_events() {
    let state = Arc::new(StateManager::new());
    let mut rx1 = state.subscribe();
    let mut rx2 = state.subscribe();
    let mut rx3 = state.subscribe();

    state.update(|s| s.target = 8);

    for rx in [&mut rx1, &mut rx2, &mut rx3] {
        let event = timeout(Duration::from_millis(100), rx.recv())
            .await
            .expect("Timeout waiting for event")
            .expect("Channel closed");
        assert_eq!(event, StateChange::TargetChanged { target: 8 });
    }
}

#[tokio::test]
async fn test_full_fill_event_sequence() {
    let mut controller = DirectionController::virtual_clock(&settings(0, 3));
    let state = Arc::new(StateManager::with_state(controller.snapshot()));
    let mut rx = state.subscribe();

    controller.request_direction(Direction::Increasing);
    state.publish(controller.snapshot());
    while controller.phase() == Phase::Animating {
        controller.advance(Duration::from_millis(100));
        state.publish(controller.snapshot());
    }

    let events = drain_events(&mut rx).await;
    let levels: Vec<u32> = events
        .iter()
        .filter_map(|event| match event {
            StateChange::LevelChanged { level, .. } => Some(*level),
            _ => None,
        })
        .collect();
    assert_eq!(levels, vec![1, 2, 3]);
    assert_eq!(
        events.last(),
        Some(&StateChange::AnimationFinished { level: 3 })
    );
    assert_eq!(state.snapshot().status_line(), "Direction: --  Level: 3");
}

#[tokio::test]
async fn test_direction_switch_events() {
    let mut controller = DirectionController::virtual_clock(&settings(4, 8));
    let state = Arc::new(StateManager::with_state(controller.snapshot()));

    controller.request_direction(Direction::Increasing);
    state.publish(controller.snapshot());

    let mut rx = state.subscribe();
    controller.request_direction(Direction::Decreasing);
    let changes = state.publish(controller.snapshot());

    assert_eq!(
        changes,
        vec![
            StateChange::LevelChanged { level: 4, previous: 5 },
            StateChange::DirectionChanged {
                direction: Direction::Decreasing
            },
        ]
    );
    assert_eq!(drain_events(&mut rx).await, changes);
}

#[tokio::test]
async fn test_concurrent_state_access() {
    let state = Arc::new(StateManager::new());

    let mut handles = vec![];
    for level in 0..10 {
        let state_clone = state.clone();
        handles.push(tokio::spawn(async move {
            state_clone.update(|s| s.level = level);
        }));
    }

    for handle in handles {
        handle.await.unwrap();
    }

    // Last write wins
    let final_level = state.read(|s| s.level);
    assert!(final_level < 10, "Level should be within range");
}

#[tokio::test]
async fn test_reset_state() {
    let state = Arc::new(StateManager::with_state(WidgetState {
        level: 7,
        direction: Direction::Decreasing,
        ..WidgetState::default()
    }));
    let mut rx = state.subscribe();

    state.reset(WidgetState::default());

    let events = drain_events(&mut rx).await;
    assert!(events.contains(&StateChange::AnimationFinished { level: 0 }));
    assert_eq!(events.last(), Some(&StateChange::StateReset));
    assert!(!state.snapshot().is_animating());
}
