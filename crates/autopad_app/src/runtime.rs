use std::thread;
use std::time::{Duration, Instant};

use autopad_core::calendar::CalendarState;
use autopad_core::frame::OutputFrame;
use autopad_core::model::RangeId;
use autopad_core::session::MacroSession;
use autopad_rt::transport::{FrameSink, TransportError};
use tracing::{info, warn};

pub trait Pacer {
    fn wait_next(&mut self);

    fn late_polls(&self) -> u64 {
        0
    }
}

#[derive(Default)]
pub struct NoPacer;

impl Pacer for NoPacer {
    fn wait_next(&mut self) {}
}

// Sleeps to absolute deadlines so per-poll overhead does not accumulate.
pub struct FixedIntervalPacer {
    interval: Duration,
    next_deadline: Option<Instant>,
    late_polls: u64,
}

impl FixedIntervalPacer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_deadline: None,
            late_polls: 0,
        }
    }
}

impl Pacer for FixedIntervalPacer {
    fn wait_next(&mut self) {
        let now = Instant::now();
        let deadline = self.next_deadline.unwrap_or(now + self.interval);

        if deadline > now {
            thread::sleep(deadline - now);
            self.next_deadline = Some(deadline + self.interval);
        } else {
            // Missed the slot; start a fresh schedule instead of bursting.
            self.late_polls = self.late_polls.saturating_add(1);
            self.next_deadline = Some(now + self.interval);
        }
    }

    fn late_polls(&self) -> u64 {
        self.late_polls
    }
}

// Each composed frame is followed by `echo_count` repeats.
pub fn estimated_polls(frames: u64, echo_count: u32) -> u64 {
    frames.saturating_mul(u64::from(echo_count) + 1)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PollReport {
    pub poll: u64,
    pub frame: OutputFrame,
    pub is_done: bool,
    pub range: Option<RangeId>,
    pub calendar: CalendarState,
    pub sink: &'static str,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunSummary {
    pub polls: u64,
    pub completed: bool,
    pub calendar: CalendarState,
    pub late_polls: u64,
}

pub struct RuntimeCoordinator {
    session: MacroSession,
    polls: u64,
    announced_range: Option<RangeId>,
}

impl RuntimeCoordinator {
    pub fn new(session: MacroSession) -> Self {
        Self {
            session,
            polls: 0,
            announced_range: None,
        }
    }

    pub fn session(&self) -> &MacroSession {
        &self.session
    }

    pub fn run_poll(&mut self, sink: &mut dyn FrameSink) -> Result<PollReport, TransportError> {
        let frame = self.session.advance_frame();
        sink.submit(&frame)?;
        self.polls = self.polls.saturating_add(1);

        let range = self.session.current_range();
        if range != self.announced_range && !self.session.is_done() {
            if let Some(range_id) = range {
                let calendar = self.session.calendar();
                info!(
                    poll = self.polls,
                    range = %range_id,
                    date = %calendar.date,
                    remaining = calendar.countdown.as_signed(),
                    "range started"
                );
            }
            self.announced_range = range;
        }

        Ok(PollReport {
            poll: self.polls,
            frame,
            is_done: self.session.is_done(),
            range,
            calendar: *self.session.calendar(),
            sink: sink.sink_name(),
        })
    }

    pub fn run_until_done(
        &mut self,
        sink: &mut dyn FrameSink,
        pacer: &mut dyn Pacer,
        max_polls: Option<u64>,
        mut on_poll: impl FnMut(&PollReport),
    ) -> Result<RunSummary, TransportError> {
        loop {
            if max_polls.is_some_and(|limit| self.polls >= limit) {
                warn!(polls = self.polls, "poll limit reached before the macro finished");
                break;
            }

            pacer.wait_next();
            let report = self.run_poll(sink)?;
            on_poll(&report);

            if report.is_done {
                break;
            }
        }

        let summary = RunSummary {
            polls: self.polls,
            completed: self.session.is_done(),
            calendar: *self.session.calendar(),
            late_polls: pacer.late_polls(),
        };

        if summary.late_polls > 0 {
            warn!(
                late_polls = summary.late_polls,
                "poll cadence slipped, button holds may be stretched"
            );
        }

        Ok(summary)
    }
}
