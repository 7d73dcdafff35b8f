use thiserror::Error;
use tracing::info;

use crate::calendar::{CalendarAdvancer, CalendarState};
use crate::echo::EchoBuffer;
use crate::frame::{compose, OutputFrame};
use crate::model::{ActionTable, RangeId, TableError};
use crate::script::RangeScript;
use crate::sequencer::{Sequencer, Step};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Scenario {
    // Ranges come from the calendar advancer until the skips run out.
    #[default]
    Calendar,
    // Ranges are played once each, in order, after Setup.
    Script(Vec<RangeId>),
}

impl Scenario {
    pub fn kind(&self) -> &'static str {
        match self {
            Scenario::Calendar => "calendar",
            Scenario::Script(_) => "script",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionConfig {
    pub calendar: CalendarState,
    // Extra polls each composed frame is repeated for.
    pub echo_count: u32,
    pub scenario: Scenario,
}

impl SessionConfig {
    pub fn new(calendar: CalendarState) -> Self {
        Self {
            calendar,
            echo_count: 0,
            scenario: Scenario::Calendar,
        }
    }

    pub fn scripted<I>(calendar: CalendarState, ranges: I) -> Self
    where
        I: IntoIterator<Item = RangeId>,
    {
        Self {
            scenario: Scenario::Script(ranges.into_iter().collect()),
            ..Self::new(calendar)
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("invalid action table: {0}")]
    Table(#[from] TableError),
}

#[derive(Clone, Debug)]
pub struct MacroSession {
    table: ActionTable,
    sequencer: Sequencer,
    advancer: CalendarAdvancer,
    script: Option<RangeScript>,
    echo: EchoBuffer,
    echo_count: u32,
    frames_emitted: u64,
}

impl MacroSession {
    pub fn new(table: ActionTable, config: SessionConfig) -> Result<Self, SessionError> {
        let advancer = CalendarAdvancer::new(config.calendar);

        table.require([RangeId::Setup])?;
        let script = match &config.scenario {
            Scenario::Calendar => {
                table.require(advancer.required_ranges())?;
                None
            }
            Scenario::Script(ranges) => {
                table.require(ranges.iter().copied())?;
                Some(RangeScript::new(ranges.iter().copied()))
            }
        };

        let setup = table
            .range(RangeId::Setup)
            .ok_or(TableError::MissingRange(RangeId::Setup))?;

        info!(
            table = table.name(),
            entries = table.len(),
            scenario = config.scenario.kind(),
            locale = %config.calendar.locale,
            date = %config.calendar.date,
            skips = config.calendar.countdown.as_signed(),
            echo_count = config.echo_count,
            "macro session configured"
        );

        Ok(Self {
            table,
            sequencer: Sequencer::starting_at(RangeId::Setup, setup),
            advancer,
            script,
            echo: EchoBuffer::new(),
            echo_count: config.echo_count,
            frames_emitted: 0,
        })
    }

    pub fn advance_frame(&mut self) -> OutputFrame {
        self.frames_emitted = self.frames_emitted.saturating_add(1);

        if let Some(frame) = self.echo.consume_echo() {
            return frame;
        }

        if self.sequencer.is_done() {
            return OutputFrame::neutral();
        }

        let step = match &mut self.script {
            Some(script) => self.sequencer.step(&self.table, script),
            None => self.sequencer.step(&self.table, &mut self.advancer),
        };

        let frame = match step {
            Step::Action(action) => compose(action),
            Step::Done => {
                info!(frames = self.frames_emitted, "macro session finished");
                OutputFrame::neutral()
            }
        };

        self.echo.store(frame, self.echo_count);
        frame
    }

    pub fn is_done(&self) -> bool {
        self.sequencer.is_done()
    }

    pub fn calendar(&self) -> &CalendarState {
        self.advancer.state()
    }

    pub fn advancer(&self) -> &CalendarAdvancer {
        &self.advancer
    }

    pub fn script(&self) -> Option<&RangeScript> {
        self.script.as_ref()
    }

    pub fn current_range(&self) -> Option<RangeId> {
        self.sequencer.current_range()
    }

    pub fn frames_emitted(&self) -> u64 {
        self.frames_emitted
    }

    pub fn table(&self) -> &ActionTable {
        &self.table
    }
}

#[cfg(test)]
mod tests {
    use super::{MacroSession, SessionConfig, SessionError};
    use crate::model::ActionTableBuilder;
    use crate::calendar::{CalendarDate, CalendarState, SkipCountdown};
    use crate::frame::{compose, OutputFrame};
    use crate::model::{Action, ActionRange, ActionTable, Locale, RangeId, TableEntry, TableError};

    const SETUP_FRAMES: usize = 3;

    fn table_for(locales: &[Locale]) -> ActionTable {
        let entries = vec![
            // setup
            TableEntry::new(Action::B, 2),
            TableEntry::new(Action::Nothing, 1),
            // teardown
            TableEntry::new(Action::Home, 1),
            // day
            TableEntry::new(Action::Up, 1),
            // month
            TableEntry::new(Action::RightA, 2),
            // year
            TableEntry::new(Action::UpA, 3),
        ];

        let mut ranges = vec![
            (RangeId::Setup, ActionRange::new(0, 1)),
            (RangeId::Teardown, ActionRange::new(2, 2)),
        ];
        for locale in locales {
            ranges.push((RangeId::DayStep(*locale), ActionRange::new(3, 3)));
            ranges.push((RangeId::MonthStep(*locale), ActionRange::new(4, 4)));
            ranges.push((RangeId::YearStep(*locale), ActionRange::new(5, 5)));
        }

        ActionTable::new("session-test", entries, ranges).unwrap()
    }

    fn config(day: u8, month: u8, year: u16, skips: u32, locale: Locale) -> SessionConfig {
        let date = CalendarDate::new(day, month, year).unwrap();
        SessionConfig::new(CalendarState::new(date, skips, locale))
    }

    fn run(session: &mut MacroSession, frames: usize) -> Vec<OutputFrame> {
        (0..frames).map(|_| session.advance_frame()).collect()
    }

    #[test]
    fn rejects_table_without_locale_ranges() {
        let table = table_for(&[Locale::Jp]);
        let error = MacroSession::new(table, config(1, 1, 2021, 1, Locale::Us)).unwrap_err();

        assert_eq!(
            error,
            SessionError::Table(TableError::MissingRange(RangeId::DayStep(Locale::Us)))
        );
    }

    #[test]
    fn rejects_table_without_setup() {
        let entries = vec![TableEntry::new(Action::A, 1)];
        let table = ActionTable::new(
            "no-setup",
            entries,
            [(RangeId::Teardown, ActionRange::new(0, 0))],
        )
        .unwrap();

        let error = MacroSession::new(table, config(1, 1, 2021, 0, Locale::Jp)).unwrap_err();
        assert_eq!(
            error,
            SessionError::Table(TableError::MissingRange(RangeId::Setup))
        );
    }

    #[test]
    fn leap_month_skip_in_jp_locale_end_to_end() {
        let mut session =
            MacroSession::new(table_for(&[Locale::Jp]), config(28, 2, 2021, 1, Locale::Jp))
                .unwrap();

        run(&mut session, SETUP_FRAMES);
        assert_eq!(session.current_range(), Some(RangeId::Setup));

        let month_frames = run(&mut session, 2);
        assert_eq!(session.current_range(), Some(RangeId::MonthStep(Locale::Jp)));
        assert!(month_frames.iter().all(|frame| *frame == compose(Action::RightA)));

        let state = session.calendar();
        assert_eq!(state.date, CalendarDate::new(1, 3, 2021).unwrap());
        assert_eq!(state.countdown, SkipCountdown::Pending(0));
        assert!(!session.is_done());
    }

    #[test]
    fn teardown_runs_once_then_session_is_done() {
        let mut session =
            MacroSession::new(table_for(&[Locale::Jp]), config(28, 2, 2021, 1, Locale::Jp))
                .unwrap();

        run(&mut session, SETUP_FRAMES + 2);
        let teardown = session.advance_frame();
        assert_eq!(teardown, compose(Action::Home));
        assert_eq!(session.current_range(), Some(RangeId::Teardown));
        assert_eq!(session.calendar().countdown.as_signed(), -1);

        let after = session.advance_frame();
        assert!(after.is_neutral());
        assert!(session.is_done());
    }

    #[test]
    fn done_session_keeps_returning_neutral_frames() {
        let mut session =
            MacroSession::new(table_for(&[Locale::Eu]), config(5, 6, 2021, 0, Locale::Eu))
                .unwrap();

        run(&mut session, 10);
        assert!(session.is_done());
        let calendar_before = *session.calendar();

        for frame in run(&mut session, 50) {
            assert_eq!(frame, OutputFrame::neutral());
        }
        assert_eq!(*session.calendar(), calendar_before);
        assert_eq!(session.frames_emitted(), 60);
    }

    #[test]
    fn echo_count_repeats_each_composed_frame() {
        let mut cfg = config(10, 10, 2021, 0, Locale::Us);
        cfg.echo_count = 2;
        let mut session = MacroSession::new(table_for(&[Locale::Us]), cfg).unwrap();

        let frames = run(&mut session, 6);

        // Echoes are served without touching the sequencer, so the second
        // B frame only appears after the first one has been echoed twice.
        let b = compose(Action::B);
        assert_eq!(frames[0..3], [b, b, b]);
        assert_eq!(frames[3..6], [b, b, b]);
        assert_eq!(session.advance_frame(), OutputFrame::neutral());
    }

    #[test]
    fn year_rollover_uses_year_range_and_resets_date() {
        let mut session =
            MacroSession::new(table_for(&[Locale::Us]), config(31, 12, 2021, 1, Locale::Us))
                .unwrap();

        run(&mut session, SETUP_FRAMES);
        let frames = run(&mut session, 3);

        assert!(frames.iter().all(|frame| *frame == compose(Action::UpA)));
        assert_eq!(session.current_range(), Some(RangeId::YearStep(Locale::Us)));
        assert_eq!(
            session.calendar().date,
            CalendarDate::new(1, 1, 2022).unwrap()
        );
    }

    #[test]
    fn setup_only_script_runs_to_done() {
        let table = ActionTableBuilder::new("setup-only")
            .range(
                RangeId::Setup,
                &[TableEntry::new(Action::B, 1), TableEntry::new(Action::Y, 50)],
            )
            .build()
            .unwrap();
        let calendar = config(1, 1, 2021, 0, Locale::Jp).calendar;
        let mut session =
            MacroSession::new(table, SessionConfig::scripted(calendar, Vec::new())).unwrap();

        let frames = run(&mut session, 51);
        assert_eq!(frames[0], compose(Action::B));
        assert!(frames[1..].iter().all(|frame| *frame == compose(Action::Y)));
        assert!(!session.is_done());

        assert!(session.advance_frame().is_neutral());
        assert!(session.is_done());
        assert_eq!(session.calendar().countdown, SkipCountdown::Pending(0));
    }

    #[test]
    fn script_plays_host_ranges_without_calendar_ranges() {
        let table = ActionTableBuilder::new("host")
            .range(RangeId::Setup, &[TableEntry::new(Action::B, 1)])
            .range(RangeId::Connect, &[TableEntry::new(Action::Y, 2)])
            .range(RangeId::StartRaid, &[TableEntry::new(Action::A, 1)])
            .build()
            .unwrap();
        let calendar = config(1, 1, 2021, 5, Locale::Jp).calendar;
        let scenario = [RangeId::Connect, RangeId::StartRaid, RangeId::Connect];
        let mut session =
            MacroSession::new(table, SessionConfig::scripted(calendar, scenario)).unwrap();

        let frames = run(&mut session, 7);
        let (b, y, a) = (compose(Action::B), compose(Action::Y), compose(Action::A));
        assert_eq!(frames, vec![b, y, y, a, y, y, OutputFrame::neutral()]);
        assert!(session.is_done());
        assert_eq!(session.calendar().date, CalendarDate::new(1, 1, 2021).unwrap());
    }

    #[test]
    fn script_rejects_ranges_missing_from_table() {
        let table = ActionTableBuilder::new("host")
            .range(RangeId::Setup, &[TableEntry::new(Action::B, 1)])
            .build()
            .unwrap();
        let calendar = config(1, 1, 2021, 0, Locale::Jp).calendar;

        let config = SessionConfig::scripted(calendar, [RangeId::SoftReset]);

        let error = MacroSession::new(table, config).unwrap_err();
        assert_eq!(
            error,
            SessionError::Table(TableError::MissingRange(RangeId::SoftReset))
        );
    }
}
