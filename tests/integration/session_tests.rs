//! Integration tests for the Session → scheduler → lamp pipeline.
//!
//! Every test drives the public command API against [`MockLamp`] with a
//! manual clock, then asserts on the recorded lamp calls and events.

use crate::mock_hw::{EPOCH_START_MS, LampCall, MockLamp, RecordingSink, run_for, start_session};

use brightflashlight::adapters::time::ManualClock;
use brightflashlight::app::commands::{SessionCommand, SosAction, StrobeAction, TorchAction};
use brightflashlight::app::events::{SessionEvent, ShutdownReason};
use brightflashlight::app::session::Session;
use brightflashlight::config::SessionConfig;
use brightflashlight::error::{AccessFault, LampError};
use brightflashlight::patterns::{SOS_PATTERN, sos_cycle_ms};
use brightflashlight::scheduler::Mode;
use brightflashlight::timeline::Task;

fn torch_on(level: Option<u8>) -> SessionCommand {
    TorchAction::On { level }.into()
}

fn strobe_start(speed: u8) -> SessionCommand {
    StrobeAction::Start { speed: Some(speed) }.into()
}

// ── Mode switching ────────────────────────────────────────────

#[test]
fn strobe_then_sos_leaves_only_sos_running() {
    let (mut session, clock, mut sink) = start_session(MockLamp::new(1));

    session.handle_command(strobe_start(5), &mut sink);
    clock.advance(30);
    session.poll(&mut sink);
    session.handle_command(SosAction::Start.into(), &mut sink);

    assert_eq!(session.mode(), Mode::Sos);
    let tl = session.timeline();
    assert_eq!(tl.count_pending(|t| *t == Task::StrobeFlip), 0);
    assert_eq!(tl.count_pending(|t| matches!(t, Task::SosStep(_))), 1);

    // Lamp went off between the strobe and the first SOS dot.
    let calls = &session.hardware().calls;
    assert_eq!(calls[calls.len() - 2..], [LampCall::Torch(false), LampCall::Torch(true)]);
}

#[test]
fn stopped_strobe_never_touches_the_lamp_again() {
    let (mut session, clock, mut sink) = start_session(MockLamp::new(1));

    session.handle_command(strobe_start(10), &mut sink);
    session.handle_command(StrobeAction::Stop.into(), &mut sink);
    let after_stop = session.hardware().calls.len();

    run_for(&mut session, &clock, &mut sink, 2_000, 10);

    assert_eq!(session.hardware().calls.len(), after_stop);
    assert_eq!(session.hardware().last_call(), Some(LampCall::Torch(false)));
    assert_eq!(session.mode(), Mode::Off);
}

#[test]
fn torch_on_off_on_repeats_identical_calls() {
    let (mut session, _clock, mut sink) = start_session(MockLamp::new(5));

    session.handle_command(torch_on(Some(3)), &mut sink);
    assert_eq!(session.hardware().calls, [LampCall::Strength(3)]);

    session.handle_command(TorchAction::Off.into(), &mut sink);
    assert_eq!(session.hardware().calls[1..], [LampCall::Torch(false)]);

    session.handle_command(torch_on(Some(3)), &mut sink);
    assert_eq!(
        session.hardware().calls,
        [LampCall::Strength(3), LampCall::Torch(false), LampCall::Strength(3)]
    );
}

#[test]
fn single_level_lamp_degrades_to_plain_on() {
    let (mut session, _clock, mut sink) = start_session(MockLamp::new(1));

    session.handle_command(torch_on(Some(5)), &mut sink);

    assert_eq!(session.hardware().calls, [LampCall::Torch(true)]);
    assert_eq!(session.hardware().strength_calls(), 0);
    assert_eq!(session.mode(), Mode::Torch { level: Some(1) });
}

#[test]
fn torch_level_above_maximum_is_reported_as_maximum() {
    let (mut session, _clock, mut sink) = start_session(MockLamp::new(5));

    session.handle_command(torch_on(Some(9)), &mut sink);

    assert_eq!(session.hardware().calls, [LampCall::Strength(5)]);
    assert_eq!(session.mode(), Mode::Torch { level: Some(5) });
}

#[test]
fn torch_level_update_only_applies_in_torch() {
    let (mut session, _clock, mut sink) = start_session(MockLamp::new(5));

    session.handle_command(TorchAction::UpdateLevel(2).into(), &mut sink);
    assert!(session.hardware().calls.is_empty());

    session.handle_command(torch_on(Some(1)), &mut sink);
    session.handle_command(TorchAction::UpdateLevel(4).into(), &mut sink);

    assert_eq!(session.hardware().calls, [LampCall::Strength(1), LampCall::Strength(4)]);
    assert_eq!(session.mode(), Mode::Torch { level: Some(4) });
}

#[test]
fn mode_changes_are_published() {
    let (mut session, _clock, mut sink) = start_session(MockLamp::new(1));

    session.handle_command(torch_on(None), &mut sink);
    session.handle_command(SosAction::Start.into(), &mut sink);
    session.handle_command(SosAction::Stop.into(), &mut sink);

    let changes: Vec<_> = sink
        .events
        .iter()
        .filter_map(|e| match e {
            SessionEvent::ModeChanged { from, to } => Some((*from, *to)),
            _ => None,
        })
        .collect();
    assert_eq!(
        changes,
        [
            (Mode::Off, Mode::Torch { level: None }),
            (Mode::Torch { level: None }, Mode::Sos),
            (Mode::Sos, Mode::Off),
        ]
    );
}

#[test]
fn stop_for_inactive_mode_is_ignored() {
    let (mut session, _clock, mut sink) = start_session(MockLamp::new(1));

    session.handle_command(torch_on(None), &mut sink);
    session.handle_command(StrobeAction::Stop.into(), &mut sink);
    session.handle_command(SosAction::Stop.into(), &mut sink);

    assert_eq!(session.mode(), Mode::Torch { level: None });
    assert_eq!(session.hardware().calls, [LampCall::Torch(true)]);
}

// ── Strobe timing ─────────────────────────────────────────────

#[test]
fn strobe_speed_update_restarts_at_new_interval() {
    let (mut session, clock, mut sink) = start_session(MockLamp::new(1));

    session.handle_command(strobe_start(10), &mut sink);
    assert_eq!(session.timeline().next_due(), Some(50));

    clock.advance(20);
    session.poll(&mut sink);
    session.handle_command(StrobeAction::UpdateSpeed(1).into(), &mut sink);

    // Flipped immediately, next flip a full 500 ms half-period later.
    assert_eq!(
        session.hardware().calls,
        [LampCall::Torch(true), LampCall::Torch(false)]
    );
    assert_eq!(session.timeline().next_due(), Some(520));
    assert_eq!(
        session.mode(),
        Mode::Strobe {
            speed: 1,
            interval_ms: 1000
        }
    );

    run_for(&mut session, &clock, &mut sink, 499, 499);
    assert_eq!(session.hardware().calls.len(), 2);
    run_for(&mut session, &clock, &mut sink, 1, 1);
    assert_eq!(session.hardware().last_call(), Some(LampCall::Torch(true)));
}

#[test]
fn late_poll_writes_once_and_keeps_phase() {
    let (mut session, clock, mut sink) = start_session(MockLamp::new(1));

    session.handle_command(strobe_start(10), &mut sink);
    clock.advance(60_000);
    let next = session.poll(&mut sink);

    // 1199 missed flips are skipped; only the current one is written.
    assert_eq!(session.hardware().calls.len(), 2);
    assert_eq!(session.hardware().last_call(), Some(LampCall::Torch(true)));
    assert_eq!(next, Some(60_050));

    clock.advance(50);
    session.poll(&mut sink);
    assert_eq!(session.hardware().calls.len(), 3);
    assert_eq!(session.hardware().last_call(), Some(LampCall::Torch(false)));
}

#[test]
fn late_poll_during_sos_writes_once() {
    let (mut session, clock, mut sink) = start_session(MockLamp::new(1));

    session.handle_command(SosAction::Start.into(), &mut sink);
    clock.advance(60_250);
    let next = session.poll(&mut sink);

    assert_eq!(session.hardware().calls.len(), 2);
    assert_eq!(session.scheduler().sos_index(), Some(1));
    assert_eq!(next, Some(60_400));
}

#[test]
fn strobe_speed_set_while_off_becomes_default() {
    let (mut session, _clock, mut sink) = start_session(MockLamp::new(1));

    session.handle_command(StrobeAction::UpdateSpeed(4).into(), &mut sink);
    assert!(session.hardware().calls.is_empty());
    assert_eq!(session.mode(), Mode::Off);

    session.handle_command(StrobeAction::Start { speed: None }.into(), &mut sink);
    assert_eq!(
        session.mode(),
        Mode::Strobe {
            speed: 4,
            interval_ms: 250
        }
    );
}

// ── SOS ───────────────────────────────────────────────────────

#[test]
fn sos_runs_a_full_cycle_and_wraps() {
    let (mut session, clock, mut sink) = start_session(MockLamp::new(1));

    session.handle_command(SosAction::Start.into(), &mut sink);
    run_for(&mut session, &clock, &mut sink, u64::from(sos_cycle_ms()), 100);

    assert_eq!(session.scheduler().sos_index(), Some(0));
    let calls = &session.hardware().calls;
    assert_eq!(calls.len(), SOS_PATTERN.len() + 1);
    let expected: Vec<_> = SOS_PATTERN.iter().map(|s| LampCall::Torch(s.on)).collect();
    assert_eq!(calls[..SOS_PATTERN.len()], expected[..]);
    assert_eq!(calls[SOS_PATTERN.len()], LampCall::Torch(true));
}

// ── Auto-off ──────────────────────────────────────────────────

#[test]
fn auto_off_shuts_torch_down_exactly_once() {
    let (mut session, clock, mut sink) = start_session(MockLamp::new(1));

    session.handle_command(SessionCommand::AutoOffSet { minutes: 1 }, &mut sink);
    session.handle_command(torch_on(None), &mut sink);

    run_for(&mut session, &clock, &mut sink, 59_000, 1_000);
    assert_eq!(session.mode(), Mode::Torch { level: None });

    run_for(&mut session, &clock, &mut sink, 2_000, 1_000);
    assert_eq!(session.mode(), Mode::Off);
    assert_eq!(session.hardware().last_call(), Some(LampCall::Torch(false)));
    assert_eq!(session.auto_off_deadline(), None);

    run_for(&mut session, &clock, &mut sink, 10_000, 1_000);
    let shutdowns = sink.count(|e| {
        *e == SessionEvent::Shutdown {
            reason: ShutdownReason::AutoOff,
        }
    });
    assert_eq!(shutdowns, 1);
    assert!(session.timeline().is_empty());
}

#[test]
fn auto_off_zero_disarms() {
    let (mut session, clock, mut sink) = start_session(MockLamp::new(1));

    session.handle_command(SessionCommand::AutoOffSet { minutes: 1 }, &mut sink);
    session.handle_command(torch_on(None), &mut sink);
    session.handle_command(SessionCommand::AutoOffSet { minutes: 0 }, &mut sink);

    run_for(&mut session, &clock, &mut sink, 120_000, 1_000);
    assert_eq!(session.mode(), Mode::Torch { level: None });
    assert_eq!(sink.last(), Some(&SessionEvent::AutoOffDisarmed));
}

#[test]
fn rearming_replaces_the_deadline() {
    let (mut session, clock, mut sink) = start_session(MockLamp::new(1));

    session.handle_command(SessionCommand::AutoOffSet { minutes: 1 }, &mut sink);
    session.handle_command(SosAction::Start.into(), &mut sink);
    run_for(&mut session, &clock, &mut sink, 30_000, 100);
    session.handle_command(SessionCommand::AutoOffSet { minutes: 2 }, &mut sink);

    run_for(&mut session, &clock, &mut sink, 60_000, 100);
    assert_eq!(session.mode(), Mode::Sos);
    assert_eq!(session.timeline().count_pending(|t| *t == Task::AutoOffCheck), 1);

    run_for(&mut session, &clock, &mut sink, 60_000, 100);
    assert_eq!(session.mode(), Mode::Off);
}

#[test]
fn shutdown_all_stops_pattern_and_disarms() {
    let (mut session, _clock, mut sink) = start_session(MockLamp::new(1));

    session.handle_command(SessionCommand::AutoOffSet { minutes: 5 }, &mut sink);
    session.handle_command(strobe_start(3), &mut sink);
    session.handle_command(SessionCommand::ShutdownAll, &mut sink);

    assert_eq!(session.mode(), Mode::Off);
    assert!(!session.is_lit());
    assert!(session.timeline().is_empty());
    assert_eq!(session.auto_off_deadline(), None);
    assert_eq!(
        sink.last(),
        Some(&SessionEvent::Shutdown {
            reason: ShutdownReason::Command
        })
    );
}

// ── Failures ──────────────────────────────────────────────────

#[test]
fn missing_lamp_reports_unavailable() {
    let (mut session, _clock, mut sink) = start_session(MockLamp::without_units());

    assert_eq!(
        sink.events[0],
        SessionEvent::Started(brightflashlight::lamp::LampCapability::UNAVAILABLE)
    );
    session.handle_command(strobe_start(5), &mut sink);

    assert_eq!(session.mode(), Mode::Off);
    assert!(session.hardware().calls.is_empty());
    assert_eq!(
        sink.last(),
        Some(&SessionEvent::LampFault(LampError::HardwareUnavailable))
    );
}

#[test]
fn missing_permission_is_surfaced() {
    let mut lamp = MockLamp::new(1);
    lamp.permission = false;
    let (mut session, _clock, mut sink) = start_session(lamp);

    session.handle_command(torch_on(None), &mut sink);

    assert_eq!(session.mode(), Mode::Off);
    assert!(session.hardware().calls.is_empty());
    assert_eq!(
        sink.last(),
        Some(&SessionEvent::LampFault(LampError::PermissionDenied))
    );
}

#[test]
fn strobe_survives_transient_failures() {
    let mut lamp = MockLamp::new(1);
    lamp.fault = LampError::TransientAccess(AccessFault::Busy);
    let (mut session, clock, mut sink) = start_session(lamp);

    session.hardware_mut().fail_writes = 3;
    session.handle_command(strobe_start(10), &mut sink);
    assert_eq!(
        sink.last(),
        Some(&SessionEvent::LampFault(LampError::TransientAccess(
            AccessFault::Busy
        )))
    );

    run_for(&mut session, &clock, &mut sink, 300, 10);

    // Six flips attempted; the last three went through.
    assert_eq!(session.hardware().calls.len(), 7);
    assert!(matches!(session.mode(), Mode::Strobe { .. }));
    assert_eq!(session.timeline().count_pending(|t| *t == Task::StrobeFlip), 1);
}

#[test]
fn revoked_permission_mid_strobe_is_reported_once() {
    let (mut session, clock, mut sink) = start_session(MockLamp::new(1));
    let denied = |e: &SessionEvent| *e == SessionEvent::LampFault(LampError::PermissionDenied);

    session.handle_command(strobe_start(10), &mut sink);
    run_for(&mut session, &clock, &mut sink, 200, 10);

    session.hardware_mut().permission = false;
    let calls = session.hardware().calls.len();
    run_for(&mut session, &clock, &mut sink, 10_000, 10);

    assert_eq!(sink.count(denied), 1);
    assert_eq!(session.hardware().calls.len(), calls);
    assert!(matches!(session.mode(), Mode::Strobe { .. }));

    // Access returns: the strobe resumes, and losing it again is a new edge.
    session.hardware_mut().permission = true;
    run_for(&mut session, &clock, &mut sink, 200, 10);
    assert!(session.hardware().calls.len() > calls);

    session.hardware_mut().permission = false;
    run_for(&mut session, &clock, &mut sink, 1_000, 10);
    assert_eq!(sink.count(denied), 2);
}

#[test]
fn transient_tick_failures_are_not_published() {
    let mut lamp = MockLamp::new(1);
    lamp.fault = LampError::TransientAccess(AccessFault::Busy);
    let (mut session, clock, mut sink) = start_session(lamp);

    session.handle_command(strobe_start(10), &mut sink);
    session.hardware_mut().fail_writes = 3;
    run_for(&mut session, &clock, &mut sink, 300, 10);

    assert_eq!(sink.count(|e| matches!(e, SessionEvent::LampFault(_))), 0);
}

#[test]
fn stale_handle_rediscovers_on_next_command() {
    let mut lamp = MockLamp::new(1);
    lamp.fault = LampError::TransientAccess(AccessFault::StaleHandle);
    let (mut session, _clock, mut sink) = start_session(lamp);
    assert_eq!(session.hardware().enumerations, 1);

    session.hardware_mut().fail_writes = 1;
    session.handle_command(torch_on(None), &mut sink);
    assert_eq!(session.capability(), None);

    session.handle_command(TorchAction::Off.into(), &mut sink);
    session.handle_command(torch_on(None), &mut sink);

    assert_eq!(session.hardware().enumerations, 2);
    assert!(session.hardware().lit());
}

// ── Quick toggle ──────────────────────────────────────────────

#[test]
fn quick_toggle_follows_session_mode() {
    let (mut session, _clock, mut sink) = start_session(MockLamp::new(1));

    assert_eq!(session.quick_toggle(&mut sink), torch_on(None));
    assert_eq!(session.mode(), Mode::Torch { level: None });

    session.handle_command(strobe_start(2), &mut sink);
    assert_eq!(
        session.quick_toggle(&mut sink),
        SessionCommand::Torch(TorchAction::Off)
    );
    assert_eq!(session.mode(), Mode::Off);
    assert!(session.timeline().is_empty());
}

// ── Configuration ─────────────────────────────────────────────

#[test]
fn inverted_speed_range_from_config_file_still_strobes() {
    let config: SessionConfig =
        serde_json::from_str(r#"{"strobe_max_speed": 0}"#).expect("valid json");
    assert!(config.validate().is_err());

    let clock = ManualClock::new(EPOCH_START_MS);
    let mut session = Session::new(MockLamp::new(1), clock.clone(), config);
    let mut sink = RecordingSink::new();
    session.start(&mut sink);

    session.handle_command(strobe_start(5), &mut sink);
    assert_eq!(
        session.mode(),
        Mode::Strobe {
            speed: 1,
            interval_ms: 1000
        }
    );

    run_for(&mut session, &clock, &mut sink, 1_000, 100);
    assert_eq!(session.hardware().calls.len(), 3);
}

#[test]
fn zero_check_period_does_not_stall_poll() {
    let config = SessionConfig {
        auto_off_check_ms: 0,
        ..SessionConfig::default()
    };
    let clock = ManualClock::new(EPOCH_START_MS);
    let mut session = Session::new(MockLamp::new(1), clock.clone(), config);
    let mut sink = RecordingSink::new();
    session.start(&mut sink);

    session.handle_command(SessionCommand::AutoOffSet { minutes: 1 }, &mut sink);
    clock.advance(10);
    assert_eq!(session.poll(&mut sink), Some(11));
}
