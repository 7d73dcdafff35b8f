// Day skipper: setup leaves the cursor on the "Date and Time" row of System Settings.
// Every step range opens the date editor, bumps the fields the calendar
// change touches, walks to OK and confirms, which lands back on the same
// row. The editor wraps a field past its maximum without carrying, so a
// month rollover bumps day and month and a year rollover bumps all three.
//
// Consecutive moves in the same direction alternate the left and right
// stick so the host sees a fresh press without an idle frame in between.

use autopad_core::model::{
    Action, ActionTable, ActionTableBuilder, Locale, RangeId, TableEntry, TableError,
};

pub const DAY_SKIPPER: &str = "day_skipper";
pub const AUTO_HOST: &str = "auto_host";
pub const NAMES: [&str; 2] = [DAY_SKIPPER, AUTO_HOST];

// link_code and quit_raid are opt-in through `session.script`.
pub const AUTO_HOST_SCRIPT: [RangeId; 3] =
    [RangeId::Connect, RangeId::StartRaid, RangeId::SoftReset];

// Frames spent with the Plus press that brings the game online.
const CONNECT_WAIT: u32 = 1000;

const fn hold(action: Action, frames: u32) -> TableEntry {
    TableEntry::new(action, frames)
}

const SETUP: &[TableEntry] = &[
    // wake the pad
    hold(Action::Nothing, 30),
    hold(Action::B, 1),
    hold(Action::Nothing, 1),
    // to System Settings
    hold(Action::Home, 1),
    hold(Action::Nothing, 30),
    hold(Action::Down, 1),
    hold(Action::Nothing, 1),
    hold(Action::Right, 1),
    hold(Action::RRight, 1),
    hold(Action::Right, 1),
    hold(Action::RRight, 1),
    hold(Action::A, 40),
    // to System > Date and Time
    hold(Action::Down, 1),
    hold(Action::RDown, 1),
    hold(Action::Down, 1),
    hold(Action::RDown, 1),
    hold(Action::Down, 1),
    hold(Action::RDown, 1),
    hold(Action::Down, 1),
    hold(Action::RDown, 1),
    hold(Action::Down, 1),
    hold(Action::RDown, 1),
    hold(Action::Down, 1),
    hold(Action::RDown, 1),
    hold(Action::Down, 1),
    hold(Action::RDown, 1),
    hold(Action::A, 8),
    hold(Action::Down, 1),
    hold(Action::RDown, 1),
    hold(Action::Down, 1),
    hold(Action::RDown, 1),
    hold(Action::Down, 1),
    hold(Action::A, 1),
    hold(Action::Nothing, 8),
    // sync off and on so the clock is manual
    hold(Action::A, 1),
    hold(Action::Nothing, 4),
    hold(Action::A, 1),
    hold(Action::Nothing, 8),
    hold(Action::Down, 1),
    hold(Action::RDown, 1),
];

const TEARDOWN: &[TableEntry] = &[
    hold(Action::Home, 1),
    hold(Action::Nothing, 30),
    hold(Action::Home, 1),
    hold(Action::Nothing, 30),
];

// Fields in editor order: year, month, day, hour, minute, OK.
const DAY_JP: &[TableEntry] = &[
    hold(Action::A, 1),
    hold(Action::Nothing, 7),
    hold(Action::Right, 1),
    hold(Action::RRight, 1),
    hold(Action::Up, 1),
    hold(Action::Right, 1),
    hold(Action::RRight, 1),
    hold(Action::Right, 1),
    hold(Action::A, 1),
    hold(Action::Nothing, 4),
];

const MONTH_JP: &[TableEntry] = &[
    hold(Action::A, 1),
    hold(Action::Nothing, 7),
    hold(Action::Right, 1),
    hold(Action::RRight, 1),
    hold(Action::Up, 1),
    hold(Action::Left, 1),
    hold(Action::Up, 1),
    hold(Action::Right, 1),
    hold(Action::RRight, 1),
    hold(Action::Right, 1),
    hold(Action::RRight, 1),
    hold(Action::A, 1),
    hold(Action::Nothing, 4),
];

const YEAR_JP: &[TableEntry] = &[
    hold(Action::A, 1),
    hold(Action::Nothing, 7),
    hold(Action::Right, 1),
    hold(Action::RRight, 1),
    hold(Action::Up, 1),
    hold(Action::Left, 1),
    hold(Action::Up, 1),
    hold(Action::Left, 1),
    hold(Action::Up, 1),
    hold(Action::Right, 1),
    hold(Action::RRight, 1),
    hold(Action::Right, 1),
    hold(Action::RRight, 1),
    hold(Action::Right, 1),
    hold(Action::A, 1),
    hold(Action::Nothing, 4),
];

// Fields in editor order: day, month, year, hour, minute, OK.
const DAY_EU: &[TableEntry] = &[
    hold(Action::A, 1),
    hold(Action::Nothing, 7),
    hold(Action::Up, 1),
    hold(Action::Right, 1),
    hold(Action::RRight, 1),
    hold(Action::Right, 1),
    hold(Action::RRight, 1),
    hold(Action::Right, 1),
    hold(Action::A, 1),
    hold(Action::Nothing, 4),
];

const MONTH_EU: &[TableEntry] = &[
    hold(Action::A, 1),
    hold(Action::Nothing, 7),
    hold(Action::UpA, 1),
    hold(Action::Nothing, 1),
    hold(Action::Up, 1),
    hold(Action::Right, 1),
    hold(Action::RRight, 1),
    hold(Action::Right, 1),
    hold(Action::RRight, 1),
    hold(Action::A, 1),
    hold(Action::Nothing, 4),
];

const YEAR_EU: &[TableEntry] = &[
    hold(Action::A, 1),
    hold(Action::Nothing, 7),
    hold(Action::UpA, 1),
    hold(Action::Nothing, 1),
    hold(Action::UpA, 1),
    hold(Action::Nothing, 1),
    hold(Action::Up, 1),
    hold(Action::Right, 1),
    hold(Action::RRight, 1),
    hold(Action::Right, 1),
    hold(Action::A, 1),
    hold(Action::Nothing, 4),
];

// Fields in editor order: month, day, year, hour, minute, OK.
const DAY_US: &[TableEntry] = &[
    hold(Action::A, 1),
    hold(Action::Nothing, 7),
    hold(Action::Right, 1),
    hold(Action::Up, 1),
    hold(Action::Right, 1),
    hold(Action::RRight, 1),
    hold(Action::Right, 1),
    hold(Action::RRight, 1),
    hold(Action::A, 1),
    hold(Action::Nothing, 4),
];

const MONTH_US: &[TableEntry] = &[
    hold(Action::A, 1),
    hold(Action::Nothing, 7),
    hold(Action::Right, 1),
    hold(Action::Up, 1),
    hold(Action::Left, 1),
    hold(Action::Up, 1),
    hold(Action::Right, 1),
    hold(Action::RRight, 1),
    hold(Action::Right, 1),
    hold(Action::RRight, 1),
    hold(Action::Right, 1),
    hold(Action::A, 1),
    hold(Action::Nothing, 4),
];

const YEAR_US: &[TableEntry] = &[
    hold(Action::A, 1),
    hold(Action::Nothing, 7),
    hold(Action::Right, 1),
    hold(Action::Up, 1),
    hold(Action::Left, 1),
    hold(Action::UpA, 1),
    hold(Action::Nothing, 1),
    hold(Action::RightA, 1),
    hold(Action::Nothing, 1),
    hold(Action::Up, 1),
    hold(Action::Right, 1),
    hold(Action::RRight, 1),
    hold(Action::Right, 1),
    hold(Action::A, 1),
    hold(Action::Nothing, 4),
];

// Host session: setup leaves the player standing in front of a den.
const HOST_SETUP: &[TableEntry] = &[
    hold(Action::Nothing, 30),
    hold(Action::B, 1),
    hold(Action::Nothing, 1),
];

const CONNECT: &[TableEntry] = &[
    hold(Action::Y, 50),
    hold(Action::Plus, CONNECT_WAIT),
    hold(Action::B, 1),
    hold(Action::Nothing, 6),
    hold(Action::B, 1),
    // other players load in
    hold(Action::Nothing, 240),
    // talk to the den, skip the energy and watts messages
    hold(Action::A, 20),
    hold(Action::Nothing, 1),
    hold(Action::A, 6),
    hold(Action::Nothing, 1),
    hold(Action::A, 30),
    hold(Action::Nothing, 200),
];

const START_RAID: &[TableEntry] = &[
    // about two minutes, then one more
    hold(Action::A, 2660),
    hold(Action::Nothing, 1),
    hold(Action::A, 5200),
    hold(Action::Nothing, 1),
    hold(Action::Up, 1),
    hold(Action::Nothing, 1),
    hold(Action::A, 1),
    hold(Action::Nothing, 30),
    hold(Action::A, 50),
    hold(Action::Nothing, 1),
    hold(Action::A, 1),
    hold(Action::Nothing, 19),
];

const LINK_CODE: &[TableEntry] = &[
    hold(Action::Plus, 40),
    hold(Action::Nothing, 1),
    // reset the pad to 0
    hold(Action::Down, 1),
    hold(Action::Nothing, 1),
    hold(Action::Down, 1),
    hold(Action::Nothing, 1),
    hold(Action::Down, 1),
    hold(Action::Nothing, 1),
    hold(Action::A, 1),
    hold(Action::Nothing, 1),
    // 1, 4, 7 then 2, 5, 8
    hold(Action::Up, 1),
    hold(Action::Nothing, 1),
    hold(Action::Up, 1),
    hold(Action::Nothing, 1),
    hold(Action::Up, 1),
    hold(Action::Nothing, 1),
    hold(Action::Left, 1),
    hold(Action::Nothing, 1),
    // 3, 6, 9
    hold(Action::Up, 1),
    hold(Action::Nothing, 1),
    hold(Action::Up, 1),
    hold(Action::Nothing, 1),
    hold(Action::Up, 1),
    hold(Action::Nothing, 1),
    hold(Action::Right, 1),
    hold(Action::Nothing, 1),
    hold(Action::Plus, 51),
    hold(Action::Nothing, 1),
    hold(Action::A, 1),
    hold(Action::Nothing, 30),
];

const SOFT_RESET: &[TableEntry] = &[
    hold(Action::Home, 1),
    hold(Action::Nothing, 40),
    // close the game and confirm
    hold(Action::X, 1),
    hold(Action::Nothing, 8),
    hold(Action::A, 1),
    hold(Action::Nothing, 120),
    // pick the game, then the user
    hold(Action::A, 1),
    hold(Action::Nothing, 50),
    hold(Action::A, 1),
    hold(Action::Nothing, 800),
    hold(Action::A, 1),
    hold(Action::Nothing, 460),
];

const QUIT_RAID: &[TableEntry] = &[
    hold(Action::B, 32),
    hold(Action::Nothing, 1),
    hold(Action::A, 200),
    hold(Action::Nothing, 1),
];

const HOST_TEARDOWN: &[TableEntry] = &[
    hold(Action::Home, 1),
    hold(Action::Nothing, 30),
    hold(Action::Home, 1),
    hold(Action::Nothing, 50),
];

pub fn by_name(name: &str) -> Option<Result<ActionTable, TableError>> {
    match name.trim() {
        DAY_SKIPPER => Some(day_skipper()),
        AUTO_HOST => Some(auto_host()),
        _ => None,
    }
}

pub fn auto_host() -> Result<ActionTable, TableError> {
    ActionTableBuilder::new(AUTO_HOST)
        .range(RangeId::Setup, HOST_SETUP)
        .range(RangeId::Connect, CONNECT)
        .range(RangeId::StartRaid, START_RAID)
        .range(RangeId::LinkCode, LINK_CODE)
        .range(RangeId::SoftReset, SOFT_RESET)
        .range(RangeId::QuitRaid, QUIT_RAID)
        .range(RangeId::Teardown, HOST_TEARDOWN)
        .build()
}

pub fn day_skipper() -> Result<ActionTable, TableError> {
    ActionTableBuilder::new(DAY_SKIPPER)
        .range(RangeId::Setup, SETUP)
        .range(RangeId::Teardown, TEARDOWN)
        .range(RangeId::DayStep(Locale::Jp), DAY_JP)
        .range(RangeId::MonthStep(Locale::Jp), MONTH_JP)
        .range(RangeId::YearStep(Locale::Jp), YEAR_JP)
        .range(RangeId::DayStep(Locale::Eu), DAY_EU)
        .range(RangeId::MonthStep(Locale::Eu), MONTH_EU)
        .range(RangeId::YearStep(Locale::Eu), YEAR_EU)
        .range(RangeId::DayStep(Locale::Us), DAY_US)
        .range(RangeId::MonthStep(Locale::Us), MONTH_US)
        .range(RangeId::YearStep(Locale::Us), YEAR_US)
        .build()
}

#[cfg(test)]
mod tests {
    use super::{auto_host, by_name, day_skipper, AUTO_HOST_SCRIPT, NAMES};
    use autopad_core::calendar::{CalendarDate, CalendarState};
    use autopad_core::frame::Buttons;
    use autopad_core::model::{Action, Locale, RangeId};
    use autopad_core::script::RangeScript;
    use autopad_core::session::{MacroSession, SessionConfig};
    use autopad_storage::table::TableEnvelope;

    #[test]
    fn preset_defines_every_range_for_every_locale() {
        let table = day_skipper().unwrap();

        table.require([RangeId::Setup, RangeId::Teardown]).unwrap();
        for locale in Locale::ALL {
            table.require(RangeId::steps_for(locale)).unwrap();
        }
    }

    #[test]
    fn every_step_opens_editor_and_confirms() {
        let table = day_skipper().unwrap();

        for locale in Locale::ALL {
            for range_id in RangeId::steps_for(locale) {
                let range = table.range(range_id).unwrap();
                let entries = &table.entries()[range.start..=range.end];
                assert_eq!(entries[0].action, Action::A, "{range_id} opens editor");
                assert_eq!(
                    entries[entries.len() - 2].action,
                    Action::A,
                    "{range_id} confirms"
                );
            }
        }
    }

    #[test]
    fn preset_survives_storage_format() {
        let table = day_skipper().unwrap();
        let text = TableEnvelope::new(table.clone()).to_text();
        let restored = TableEnvelope::from_text(&text).unwrap();
        assert_eq!(restored.table, table);
    }

    #[test]
    fn preset_session_reaches_done_with_expected_date() {
        let date = CalendarDate::new(28, 2, 2021).unwrap();
        let config = SessionConfig::new(CalendarState::new(date, 1, Locale::Jp));
        let mut session = MacroSession::new(day_skipper().unwrap(), config).unwrap();

        let mut home_presses = 0usize;
        let mut polls = 0usize;
        while !session.is_done() && polls < 10_000 {
            let frame = session.advance_frame();
            if frame.buttons.contains(Buttons::HOME) {
                home_presses += 1;
            }
            polls += 1;
        }

        assert!(session.is_done());
        assert_eq!(
            session.calendar().date,
            CalendarDate::new(1, 3, 2021).unwrap()
        );
        // one in setup, two in teardown
        assert_eq!(home_presses, 3);
    }

    #[test]
    fn every_preset_name_resolves() {
        for name in NAMES {
            let table = by_name(name).unwrap().unwrap();
            assert_eq!(table.name(), name);
        }
        assert!(by_name("speedrun").is_none());
    }

    #[test]
    fn host_script_ends_after_soft_reset() {
        let table = auto_host().unwrap();
        let expected_polls: u64 = [RangeId::Setup]
            .into_iter()
            .chain(AUTO_HOST_SCRIPT)
            .map(|range_id| table.range_frames(range_id).unwrap())
            .sum();

        let date = CalendarDate::new(1, 1, 2021).unwrap();
        let calendar = CalendarState::new(date, 0, Locale::Jp);
        let config = SessionConfig::scripted(calendar, AUTO_HOST_SCRIPT);
        let mut session = MacroSession::new(table, config).unwrap();
        assert_eq!(
            session.script().map(RangeScript::remaining),
            Some(AUTO_HOST_SCRIPT.len())
        );

        let mut polls = 0u64;
        while !session.is_done() && polls < 100_000 {
            session.advance_frame();
            polls += 1;
        }

        assert!(session.is_done());
        // the last poll reports done with a neutral frame
        assert_eq!(polls, expected_polls + 1);
        assert_eq!(session.current_range(), Some(RangeId::SoftReset));
    }
}
