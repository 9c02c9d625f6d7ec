/*!
 * Signal System Tests
 * Trapping, masking and dispatch against the real OS, in this process
 *
 * Dispositions are process-wide, so every test holds the serial lock and
 * starts from a reset registry.
 */

use ai_os_signals::signals::resolve;
use ai_os_signals::{
    block, dispatch, trap, unblock, Disposition, DispositionKind, Signal, SignalError, SignalName,
    SignalRef, SignalRegistry,
};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use serial_test::serial;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn registry() -> &'static SignalRegistry {
    SignalRegistry::global()
}

/// Restore every default and drop leftovers from earlier tests
fn fresh() {
    registry().reset().unwrap();
    registry().dispatch();
}

fn counting_handler() -> (Disposition, Arc<AtomicUsize>) {
    let count = Arc::new(AtomicUsize::new(0));
    let seen = count.clone();
    let disposition = Disposition::handler(move |_| {
        seen.fetch_add(1, Ordering::SeqCst);
    });
    (disposition, count)
}

proptest! {
    #[test]
    fn prop_valid_numbers_resolve_to_themselves(n in 1i64..=31) {
        prop_assert_eq!(resolve(n).unwrap().get() as i64, n);
    }

    #[test]
    fn prop_numbers_outside_range_are_rejected(
        n in prop_oneof![i64::MIN..1i64, 32i64..i64::MAX]
    ) {
        prop_assert_eq!(resolve(n), Err(SignalError::OutOfRange(n)));
    }
}

#[test]
fn test_range_boundaries() {
    assert_eq!(resolve(0), Err(SignalError::OutOfRange(0)));
    assert_eq!(resolve(32), Err(SignalError::OutOfRange(32)));
    assert_eq!(resolve(1).unwrap().get(), 1);
    assert_eq!(resolve(31).unwrap().get(), 31);
}

#[test]
fn test_unknown_name_never_resolves() {
    let unknown = SignalError::UnknownSignal("SOMETHING".to_string());
    assert_eq!(resolve("SOMETHING"), Err(unknown.clone()));
    assert_eq!(Signal::new("SOMETHING"), Err(unknown.clone()));
    assert_eq!(trap("SOMETHING", Disposition::Ignore), Err(unknown.clone()));
    assert_eq!(block(["SOMETHING"]), Err(unknown));
}

#[test]
fn test_name_number_and_constant_are_one_identity() {
    let by_name = resolve("USR2").unwrap();
    assert_eq!(by_name, resolve(SignalName::SIGUSR2.number()).unwrap());
    assert_eq!(by_name, resolve(SignalName::SIGUSR2).unwrap());
    assert_eq!(by_name.name(), Some(SignalName::SIGUSR2));
}

#[test]
#[serial]
fn test_trap_by_name_is_visible_by_number() {
    fresh();
    let (handler, _) = counting_handler();

    trap("USR2", handler).unwrap();
    assert_eq!(
        registry().disposition(SignalName::SIGUSR2.number()).unwrap(),
        DispositionKind::Handler
    );

    trap(SignalName::SIGUSR2.number(), Disposition::Ignore).unwrap();
    assert_eq!(registry().disposition("USR2").unwrap(), DispositionKind::Ignore);
    fresh();
}

#[test]
#[serial]
fn test_handler_runs_once_per_dispatch() {
    fresh();
    let (handler, count) = counting_handler();
    trap("USR1", handler).unwrap();

    let invoked = Signal::new("USR1").unwrap().dispatch(None).unwrap();
    assert_eq!(invoked, 1);
    assert_eq!(count.load(Ordering::SeqCst), 1);

    // Nothing pending any more
    assert_eq!(dispatch(), 0);
    fresh();
}

#[test]
#[serial]
fn test_ignore_suppresses_handler() {
    fresh();
    let (handler, count) = counting_handler();
    trap("USR1", handler).unwrap();
    trap("USR1", Disposition::Ignore).unwrap();

    assert_eq!(Signal::new("USR1").unwrap().dispatch(None).unwrap(), 0);
    assert_eq!(count.load(Ordering::SeqCst), 0);
    fresh();
}

#[test]
#[serial]
fn test_ignore_discards_undispatched_deliveries() {
    fresh();
    let (handler, count) = counting_handler();
    trap("USR1", handler.clone()).unwrap();

    Signal::new("USR1").unwrap().send(None).unwrap();
    trap("USR1", Disposition::Ignore).unwrap();
    trap("USR1", handler).unwrap();

    assert_eq!(dispatch(), 0);
    assert_eq!(count.load(Ordering::SeqCst), 0);
    fresh();
}

#[test]
#[serial]
fn test_default_discards_undispatched_deliveries() {
    fresh();
    // WINCH is ignored by default, so a Default binding cannot end the test
    let (handler, count) = counting_handler();
    trap("WINCH", handler.clone()).unwrap();

    Signal::new("WINCH").unwrap().send(None).unwrap();
    trap("WINCH", Disposition::Default).unwrap();
    trap("WINCH", handler).unwrap();

    assert_eq!(dispatch(), 0);
    assert_eq!(count.load(Ordering::SeqCst), 0);
    fresh();
}

#[test]
#[serial]
fn test_handler_resending_its_signal_does_not_extend_dispatch() {
    fresh();
    let count = Arc::new(AtomicUsize::new(0));
    let seen = count.clone();
    let usr1 = Signal::new("USR1").unwrap();
    trap(
        "USR1",
        Disposition::handler(move |_| {
            // Bounded so a drain that chases new deliveries still terminates
            if seen.fetch_add(1, Ordering::SeqCst) < 100 {
                usr1.send(None).unwrap();
            }
        }),
    )
    .unwrap();

    usr1.send(None).unwrap();
    assert_eq!(dispatch(), 1);
    assert_eq!(count.load(Ordering::SeqCst), 1);

    // The resend is picked up by the next drain
    assert_eq!(dispatch(), 1);
    assert_eq!(count.load(Ordering::SeqCst), 2);
    fresh();
}

#[test]
#[serial]
fn test_repeated_sends_each_reach_the_handler() {
    fresh();
    let (handler, count) = counting_handler();
    trap("USR2", handler).unwrap();

    let signal = Signal::new("USR2").unwrap();
    for _ in 0..4 {
        signal.send(None).unwrap();
    }

    assert_eq!(dispatch(), 4);
    assert_eq!(count.load(Ordering::SeqCst), 4);
    fresh();
}

#[test]
#[serial]
fn test_handler_replacement_does_not_chain() {
    fresh();
    let (first, first_count) = counting_handler();
    let (second, second_count) = counting_handler();
    trap("USR1", first).unwrap();
    trap("USR1", second).unwrap();

    Signal::new("USR1").unwrap().dispatch(None).unwrap();
    assert_eq!(first_count.load(Ordering::SeqCst), 0);
    assert_eq!(second_count.load(Ordering::SeqCst), 1);
    fresh();
}

#[test]
#[serial]
fn test_handlers_run_in_delivery_order() {
    fresh();
    let order = Arc::new(parking_lot::Mutex::new(Vec::new()));
    for name in ["USR1", "USR2"] {
        let order = order.clone();
        trap(name, Disposition::handler(move |s| order.lock().push(s))).unwrap();
    }

    let usr1 = Signal::new("USR1").unwrap();
    let usr2 = Signal::new("USR2").unwrap();
    usr2.send(None).unwrap();
    usr1.send(None).unwrap();
    usr2.send(None).unwrap();

    assert_eq!(dispatch(), 3);
    assert_eq!(
        *order.lock(),
        vec![usr2.number(), usr1.number(), usr2.number()]
    );
    fresh();
}

#[test]
#[serial]
fn test_blocked_signal_is_deferred_until_unblocked() {
    fresh();
    let (handler, count) = counting_handler();
    trap("USR2", handler).unwrap();
    block(["USR2"]).unwrap();
    assert!(registry().blocked().unwrap().contains(&resolve("USR2").unwrap()));

    let signal = Signal::new("USR2").unwrap();
    signal.send(None).unwrap();
    signal.send(None).unwrap();
    assert_eq!(dispatch(), 0);
    assert_eq!(count.load(Ordering::SeqCst), 0);

    // The OS delivers on unmask; only the handler run waits for the drain
    unblock(["USR2"]).unwrap();
    assert!(!registry().blocked().unwrap().contains(&resolve("USR2").unwrap()));
    let invoked = dispatch();

    // Standard signals coalesce while blocked
    #[cfg(target_os = "linux")]
    assert_eq!(invoked, 1);
    #[cfg(not(target_os = "linux"))]
    assert!(invoked >= 1);
    assert_eq!(count.load(Ordering::SeqCst), invoked);
    fresh();
}

#[test]
#[serial]
fn test_block_batch_is_all_or_nothing() {
    fresh();
    let usr1 = resolve("USR1").unwrap();

    let result = block(vec![SignalRef::from("USR1"), SignalRef::from(0)]);
    assert_eq!(result, Err(SignalError::OutOfRange(0)));
    assert!(!registry().blocked().unwrap().contains(&usr1));
}

#[test]
#[serial]
fn test_kill_cannot_be_trapped() {
    fresh();
    let (handler, _) = counting_handler();
    assert!(matches!(
        trap("KILL", handler),
        Err(SignalError::Install { .. })
    ));
    assert_eq!(registry().disposition("KILL").unwrap(), DispositionKind::Default);
}

#[test]
#[serial]
fn test_delivery_errors_surface() {
    // PID i32::MAX is above pid_max on every supported system
    let missing = Signal::new("USR1").unwrap().dispatch(Some(i32::MAX as u32));
    assert!(matches!(missing, Err(SignalError::Delivery { .. })));

    let group = Signal::new("USR1").unwrap().send(Some(0));
    assert!(matches!(group, Err(SignalError::Delivery { pid: Some(0), .. })));
}

#[test]
#[serial]
fn test_state_snapshot_serializes() {
    fresh();
    let (handler, _) = counting_handler();
    trap("USR1", handler).unwrap();
    trap("HUP", Disposition::Ignore).unwrap();

    let state = registry().state().unwrap();
    assert_eq!(
        state.trapped,
        vec![
            (resolve("HUP").unwrap(), DispositionKind::Ignore),
            (resolve("USR1").unwrap(), DispositionKind::Handler),
        ]
    );
    assert_eq!(state.pending, 0);

    let json = serde_json::to_value(&state).unwrap();
    assert_eq!(json["trapped"][0][0], serde_json::json!(1));
    assert_eq!(json["trapped"][1][1], serde_json::json!("Handler"));

    let stats = serde_json::to_value(registry().stats()).unwrap();
    assert!(stats["traps_installed"].as_u64().unwrap() >= 2);
    fresh();
}
