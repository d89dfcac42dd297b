//! Session facade — the hexagonal core.
//!
//! [`Session`] owns the pattern scheduler, the auto-off timer and the one
//! timeline they share.  It exposes a hardware-agnostic command API; all
//! platform I/O flows through port traits, so the whole session runs
//! against mock adapters.
//!
//! ```text
//!  SessionCommand ──▶ ┌─────────────────────────────┐ ──▶ EventSink
//!                     │          Session             │
//!        Clock ──────▶│ Scheduler · AutoOff · Timeline│
//!                     └──────────────┬──────────────┘
//!                                    ▼
//!                              LampHardware
//! ```
//!
//! Nothing runs on its own: the caller invokes [`Session::poll`] whenever
//! the next due time (returned by `poll`) is reached.

use log::{info, warn};

use crate::auto_off::{AutoOffTimer, CheckOutcome};
use crate::config::SessionConfig;
use crate::error::LampError;
use crate::lamp::{LampCapability, LampDriver};
use crate::scheduler::{Mode, PatternScheduler};
use crate::timeline::{Task, Timeline};

use super::commands::{SessionCommand, SosAction, StrobeAction, TorchAction};
use super::events::{SessionEvent, SessionSnapshot, ShutdownReason};
use super::ports::{Clock, EventSink, LampHardware};
use super::quick_toggle;

// ───────────────────────────────────────────────────────────────
// Session
// ───────────────────────────────────────────────────────────────

/// One lamp-control session.
pub struct Session<H: LampHardware, C: Clock> {
    scheduler: PatternScheduler<H>,
    auto_off: AutoOffTimer,
    timeline: Timeline,
    clock: C,
    auto_off_max_minutes: u32,
    /// Tick fault already reported, until a tick write succeeds again.
    tick_fault: Option<LampError>,
}

impl<H: LampHardware, C: Clock> Session<H, C> {
    /// Build a session.  Does not touch the hardware; call [`start`] next.
    ///
    /// An invalid config is logged and used as far as it is safe: speeds,
    /// floors and check periods are clamped where they are applied.
    ///
    /// [`start`]: Self::start
    pub fn new(hw: H, clock: C, config: SessionConfig) -> Self {
        if let Err(e) = config.validate() {
            warn!("Session: {}, continuing with clamped values", e);
        }
        let timeline = Timeline::new(clock.now_ms());
        let auto_off = AutoOffTimer::new(config.auto_off_check_ms);
        let auto_off_max_minutes = config.auto_off_max_minutes;
        let scheduler = PatternScheduler::new(LampDriver::new(hw), config);

        Self {
            scheduler,
            auto_off,
            timeline,
            clock,
            auto_off_max_minutes,
            tick_fault: None,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Discover the lamp and announce its capability.
    pub fn start(&mut self, sink: &mut impl EventSink) -> LampCapability {
        self.sync();
        let capability = self.scheduler.discover();
        // An unavailable lamp is already reported by the capability itself.
        let _ = self.scheduler.driver_mut().take_error();

        sink.emit(&SessionEvent::Started(capability));
        info!("Session started: {:?}", capability);
        capability
    }

    /// Run every timeline task due by now.
    ///
    /// A pattern that fell behind resumes at its current step with a single
    /// lamp write.  Returns the due time of the next pending task, if any,
    /// so the caller knows when to poll again.
    pub fn poll(&mut self, sink: &mut impl EventSink) -> Option<u64> {
        let now = self.clock.now_ms();
        let mut ticked = false;

        while let Some((handle, task)) = self.timeline.pop_due(now) {
            match task {
                Task::StrobeFlip | Task::SosStep(_) => {
                    ticked |= self.scheduler.on_tick(handle, task, now, &mut self.timeline);
                }
                Task::AutoOffCheck => {
                    let epoch = self.clock.epoch_ms();
                    if self.auto_off.on_check(handle, epoch, &mut self.timeline)
                        == CheckOutcome::Expired
                    {
                        self.shutdown(ShutdownReason::AutoOff, sink);
                    }
                }
            }
        }
        self.timeline.advance_to(now);
        self.report_tick_fault(ticked, sink);

        self.timeline.next_due()
    }

    // ── Command handling ──────────────────────────────────────

    /// Route an external command.
    pub fn handle_command(&mut self, cmd: SessionCommand, sink: &mut impl EventSink) {
        match cmd {
            SessionCommand::Torch(action) => self.apply_torch(action, sink),
            SessionCommand::Strobe(action) => self.apply_strobe(action, sink),
            SessionCommand::Sos(action) => self.apply_sos(action, sink),
            SessionCommand::AutoOffSet { minutes } => self.update_auto_off(minutes, sink),
            SessionCommand::ShutdownAll => self.shutdown_all(sink),
        }
    }

    pub fn apply_torch(&mut self, action: TorchAction, sink: &mut impl EventSink) {
        self.sync();
        let before = self.mode();

        match action {
            TorchAction::On { level } => {
                if self.lamp_ready() {
                    self.scheduler.start_torch(level, &mut self.timeline);
                }
            }
            TorchAction::UpdateLevel(level) => {
                self.scheduler.update_torch_level(level);
            }
            TorchAction::Off => self.scheduler.shutdown(&mut self.timeline),
        }

        self.publish(before, sink);
    }

    pub fn apply_strobe(&mut self, action: StrobeAction, sink: &mut impl EventSink) {
        self.sync();
        let before = self.mode();

        match action {
            StrobeAction::Start { speed } => {
                if self.lamp_ready() {
                    let speed = speed.unwrap_or(self.scheduler.strobe_speed());
                    self.scheduler.start_strobe(speed, &mut self.timeline);
                }
            }
            StrobeAction::UpdateSpeed(speed) => {
                self.scheduler.update_strobe_speed(speed, &mut self.timeline);
            }
            StrobeAction::Stop => {
                self.scheduler.stop_strobe(&mut self.timeline);
            }
        }

        self.publish(before, sink);
    }

    pub fn apply_sos(&mut self, action: SosAction, sink: &mut impl EventSink) {
        self.sync();
        let before = self.mode();

        match action {
            SosAction::Start => {
                if self.lamp_ready() {
                    self.scheduler.start_sos(&mut self.timeline);
                }
            }
            SosAction::Stop => {
                self.scheduler.stop_sos(&mut self.timeline);
            }
        }

        self.publish(before, sink);
    }

    /// (Re)arm the auto-off deadline `minutes` from now; `0` disarms.
    pub fn update_auto_off(&mut self, minutes: u32, sink: &mut impl EventSink) {
        self.sync();

        let minutes = if minutes > self.auto_off_max_minutes {
            warn!(
                "Session: auto-off {} min above limit, using {}",
                minutes, self.auto_off_max_minutes
            );
            self.auto_off_max_minutes
        } else {
            minutes
        };

        let was_armed = self.auto_off.is_armed();
        let epoch = self.clock.epoch_ms();
        match self.auto_off.arm_minutes(minutes, epoch, &mut self.timeline) {
            Some(deadline_epoch_ms) => {
                sink.emit(&SessionEvent::AutoOffArmed { deadline_epoch_ms });
            }
            None if was_armed => sink.emit(&SessionEvent::AutoOffDisarmed),
            None => {}
        }
    }

    /// Stop every pattern, force the lamp off and disarm auto-off.
    pub fn shutdown_all(&mut self, sink: &mut impl EventSink) {
        self.sync();
        self.shutdown(ShutdownReason::Command, sink);
    }

    /// Issue the quick-toggle command for the current mode.
    pub fn quick_toggle(&mut self, sink: &mut impl EventSink) -> SessionCommand {
        let cmd = quick_toggle::toggle_command(self.mode());
        self.handle_command(cmd, sink);
        cmd
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn mode(&self) -> Mode {
        self.scheduler.mode()
    }

    pub fn is_lit(&self) -> bool {
        self.scheduler.is_lit()
    }

    /// Capability of the selected unit, once discovered.
    pub fn capability(&self) -> Option<LampCapability> {
        self.scheduler.driver().capability()
    }

    pub fn auto_off_deadline(&self) -> Option<u64> {
        self.auto_off.deadline()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            mode: self.mode(),
            lamp_lit: self.is_lit(),
            capability: self.capability(),
            auto_off_deadline_epoch_ms: self.auto_off.deadline(),
        }
    }

    pub fn scheduler(&self) -> &PatternScheduler<H> {
        &self.scheduler
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn hardware(&self) -> &H {
        self.scheduler.driver().hardware()
    }

    pub fn hardware_mut(&mut self) -> &mut H {
        self.scheduler.driver_mut().hardware_mut()
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    // ── Internal ──────────────────────────────────────────────

    /// Bring the timeline up to the clock before scheduling anything new.
    fn sync(&mut self) {
        self.timeline.advance_to(self.clock.now_ms());
    }

    fn lamp_ready(&mut self) -> bool {
        self.scheduler.discover().available && self.scheduler.driver_mut().ensure_ready()
    }

    fn shutdown(&mut self, reason: ShutdownReason, sink: &mut impl EventSink) {
        let before = self.mode();
        let was_armed = self.auto_off.is_armed();

        self.scheduler.shutdown(&mut self.timeline);
        self.auto_off.disarm(&mut self.timeline);
        info!("Session: shutdown ({:?})", reason);

        self.publish(before, sink);
        if was_armed {
            sink.emit(&SessionEvent::AutoOffDisarmed);
        }
        sink.emit(&SessionEvent::Shutdown { reason });
    }

    /// Emit a tick failure the caller must act on, once per failure edge.
    ///
    /// Transient faults are retried by the next tick and stay quiet.
    fn report_tick_fault(&mut self, ticked: bool, sink: &mut impl EventSink) {
        match self.scheduler.driver_mut().take_error() {
            Some(e @ (LampError::PermissionDenied | LampError::HardwareUnavailable)) => {
                if self.tick_fault != Some(e) {
                    warn!("Session: {:?} lamp writes failing: {}", self.mode(), e);
                    sink.emit(&SessionEvent::LampFault(e));
                    self.tick_fault = Some(e);
                }
            }
            Some(_) => {}
            None if ticked => self.tick_fault = None,
            None => {}
        }
    }

    /// Emit the mode change (if any) and the last lamp failure (if any).
    fn publish(&mut self, before: Mode, sink: &mut impl EventSink) {
        let after = self.mode();
        if after != before {
            sink.emit(&SessionEvent::ModeChanged {
                from: before,
                to: after,
            });
            self.tick_fault = None;
        }

        match self.scheduler.driver_mut().take_error() {
            Some(LampError::UnsupportedCapability) | None => {}
            Some(e) => sink.emit(&SessionEvent::LampFault(e)),
        }
    }
}
