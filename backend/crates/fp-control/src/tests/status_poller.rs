use crate::server::{ControlError, LifecycleState, Liveness, PanelState};
use crate::tests::{Harness, Script};

use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use googletest::assert_that;
use googletest::prelude::eq;
use tokio::sync::Mutex;

fn alive() -> Script {
    Script {
        alive: true,
        ..Script::default()
    }
}

// =========================================================================
// Probe
// =========================================================================

#[tokio::test]
async fn given_process_running_when_probe_then_alive() {
    // Given
    let harness = Harness::new(alive());

    // When/Then
    assert_that!(harness.poller().probe().await, eq(Liveness::Alive));
}

#[tokio::test]
async fn given_no_process_when_probe_then_absent() {
    // Given
    let harness = Harness::new(Script::default());

    // When/Then
    assert_that!(harness.poller().probe().await, eq(Liveness::Absent));
}

#[tokio::test]
async fn given_probe_exits_abnormally_when_probe_then_unknown_treated_as_stopped() {
    // Given
    let harness = Harness::new(Script {
        alive: true,
        probe_exit: Some(2),
        ..Script::default()
    });

    // When
    let liveness = harness.poller().probe().await;

    // Then
    assert_that!(liveness, eq(Liveness::Unknown));
    assert_that!(liveness.lifecycle(), eq(LifecycleState::Stopped));
}

#[tokio::test]
async fn given_host_times_out_when_probe_then_retried_and_unknown() {
    // Given
    let harness = Harness::new(Script {
        silent: true,
        ..Script::default()
    });

    // When
    let liveness = harness.poller().probe().await;

    // Then
    assert_that!(liveness, eq(Liveness::Unknown));
    assert_that!(harness.host.count("pgrep"), eq(2));
    assert_that!(harness.bridge.pending_len(), eq(0));
}

#[tokio::test]
async fn given_host_rejects_when_probe_then_not_retried() {
    // Given
    let harness = Harness::new(Script {
        reject: true,
        ..Script::default()
    });

    // When/Then
    assert_that!(harness.poller().probe().await, eq(Liveness::Unknown));
}

// =========================================================================
// Edge detection
// =========================================================================

#[tokio::test]
async fn given_stopped_state_and_live_process_when_observe_then_edge_applied() {
    // Given
    let harness = Harness::new(alive());
    let poller = harness.poller();
    let mut rx = poller.subscribe();
    let mut state = PanelState::default();

    // When
    let changed = poller.observe(&mut state).await;

    // Then
    assert!(changed);
    assert_that!(state.lifecycle, eq(LifecycleState::Running));
    assert_that!(*rx.borrow_and_update(), eq(LifecycleState::Running));
    assert_eq!(
        harness.description().as_deref(),
        Some("[Running✅ | v17.5.1]")
    );
}

#[tokio::test]
async fn given_unchanged_liveness_when_observed_twice_then_descriptor_written_once() {
    // Given
    let harness = Harness::new(alive());
    let poller = harness.poller();
    let mut state = PanelState::default();
    poller.observe(&mut state).await;
    // Anything the poller writes would replace this marker.
    std::fs::write(
        &harness.config.paths.module_prop,
        "id=magisk-hluda\ndescription=marker\n",
    )
    .unwrap();

    // When
    let changed = poller.observe(&mut state).await;

    // Then
    assert!(!changed);
    assert_eq!(harness.description().as_deref(), Some("marker"));
}

#[tokio::test]
async fn given_running_state_and_process_gone_when_observe_then_stopped_written() {
    // Given
    let harness = Harness::new(Script::default());
    let poller = harness.poller();
    let mut state = PanelState {
        lifecycle: LifecycleState::Running,
        ..PanelState::default()
    };

    // When/Then
    assert!(poller.observe(&mut state).await);
    assert_that!(state.lifecycle, eq(LifecycleState::Stopped));
    assert_eq!(
        harness.description().as_deref(),
        Some("[Stopped❌ | v17.5.1]")
    );
}

#[tokio::test]
async fn given_descriptor_missing_when_edge_then_state_still_updated() {
    // Given
    let harness = Harness::new(alive());
    std::fs::remove_file(&harness.config.paths.module_prop).unwrap();
    let poller = harness.poller();
    let mut state = PanelState::default();

    // When/Then
    assert!(poller.observe(&mut state).await);
    assert_that!(state.lifecycle, eq(LifecycleState::Running));
    assert!(!harness.config.paths.module_prop.exists());
}

#[tokio::test]
async fn given_descriptor_when_edge_then_other_lines_preserved() {
    // Given
    let harness = Harness::new(alive());
    let poller = harness.poller();
    let mut state = PanelState::default();

    // When
    poller.observe(&mut state).await;

    // Then
    let contents = std::fs::read_to_string(&harness.config.paths.module_prop).unwrap();
    assert_eq!(
        contents,
        "id=magisk-hluda\nname=Florida Server\ndescription=[Running✅ | v17.5.1]\n"
    );
}

// =========================================================================
// Confirmation
// =========================================================================

#[tokio::test]
async fn given_process_never_appears_when_wait_for_running_then_confirm_timeout() {
    // Given
    let harness = Harness::new(Script::default());
    let poller = harness.poller();
    let mut state = PanelState::default();

    // When
    let err = poller
        .wait_for(&mut state, LifecycleState::Running)
        .await
        .unwrap_err();

    // Then
    assert!(matches!(
        err,
        ControlError::ConfirmTimeout {
            expected: LifecycleState::Running,
            attempts: 5,
            ..
        }
    ));
    assert_that!(harness.host.count("pgrep"), eq(5));
}

#[tokio::test]
async fn given_process_present_when_wait_for_running_then_confirmed_on_first_probe() {
    // Given
    let harness = Harness::new(alive());
    let poller = harness.poller();
    let mut state = PanelState::default();

    // When
    poller
        .wait_for(&mut state, LifecycleState::Running)
        .await
        .unwrap();

    // Then
    assert_that!(harness.host.count("pgrep"), eq(1));
}

// =========================================================================
// Background loop
// =========================================================================

#[tokio::test]
async fn given_spawned_poller_when_process_appears_then_watchers_notified() {
    // Given
    let harness = Harness::new(Script::default());
    let poller = Arc::new(harness.poller());
    let mut rx = poller.subscribe();
    let state = Arc::new(Mutex::new(PanelState::default()));
    let shutdown = Arc::new(AtomicBool::new(false));

    // When
    let handle = poller.spawn(Arc::clone(&state), Arc::clone(&shutdown));
    harness.host.update(|s| s.alive = true);
    tokio::time::timeout(Duration::from_secs(2), rx.changed())
        .await
        .unwrap()
        .unwrap();

    // Then
    assert_that!(*rx.borrow(), eq(LifecycleState::Running));
    assert_that!(state.lock().await.lifecycle, eq(LifecycleState::Running));
    shutdown.store(true, std::sync::atomic::Ordering::SeqCst);
    tokio::time::timeout(Duration::from_secs(2), handle)
        .await
        .unwrap()
        .unwrap();
}
