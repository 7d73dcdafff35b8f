use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Action {
    Nothing,
    Up,
    Down,
    Left,
    Right,
    RUp,
    RDown,
    RLeft,
    RRight,
    DpadUp,
    DpadDown,
    DpadLeft,
    DpadRight,
    A,
    B,
    X,
    Y,
    L,
    R,
    Zl,
    Zr,
    Minus,
    Plus,
    LClick,
    RClick,
    Home,
    Capture,
    UpA,
    RightA,
    Triggers,
}

impl Action {
    pub const ALL: [Action; 30] = [
        Action::Nothing,
        Action::Up,
        Action::Down,
        Action::Left,
        Action::Right,
        Action::RUp,
        Action::RDown,
        Action::RLeft,
        Action::RRight,
        Action::DpadUp,
        Action::DpadDown,
        Action::DpadLeft,
        Action::DpadRight,
        Action::A,
        Action::B,
        Action::X,
        Action::Y,
        Action::L,
        Action::R,
        Action::Zl,
        Action::Zr,
        Action::Minus,
        Action::Plus,
        Action::LClick,
        Action::RClick,
        Action::Home,
        Action::Capture,
        Action::UpA,
        Action::RightA,
        Action::Triggers,
    ];

    pub fn token(self) -> &'static str {
        match self {
            Action::Nothing => "NOTHING",
            Action::Up => "UP",
            Action::Down => "DOWN",
            Action::Left => "LEFT",
            Action::Right => "RIGHT",
            Action::RUp => "RUP",
            Action::RDown => "RDOWN",
            Action::RLeft => "RLEFT",
            Action::RRight => "RRIGHT",
            Action::DpadUp => "DPAD_UP",
            Action::DpadDown => "DPAD_DOWN",
            Action::DpadLeft => "DPAD_LEFT",
            Action::DpadRight => "DPAD_RIGHT",
            Action::A => "A",
            Action::B => "B",
            Action::X => "X",
            Action::Y => "Y",
            Action::L => "L",
            Action::R => "R",
            Action::Zl => "ZL",
            Action::Zr => "ZR",
            Action::Minus => "MINUS",
            Action::Plus => "PLUS",
            Action::LClick => "LCLICK",
            Action::RClick => "RCLICK",
            Action::Home => "HOME",
            Action::Capture => "CAPTURE",
            Action::UpA => "UP_A",
            Action::RightA => "RIGHT_A",
            Action::Triggers => "TRIGGERS",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        let token = token.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|action| action.token().eq_ignore_ascii_case(token))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TableEntry {
    pub action: Action,
    pub duration: u32,
}

impl TableEntry {
    pub const fn new(action: Action, duration: u32) -> Self {
        Self { action, duration }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Locale {
    // year / month / day
    Jp,
    // day / month / year
    Eu,
    // month / day / year
    Us,
}

impl Locale {
    pub const ALL: [Locale; 3] = [Locale::Jp, Locale::Eu, Locale::Us];

    pub fn token(self) -> &'static str {
        match self {
            Locale::Jp => "jp",
            Locale::Eu => "eu",
            Locale::Us => "us",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        let token = token.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|locale| locale.token().eq_ignore_ascii_case(token))
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RangeId {
    Setup,
    Teardown,
    Connect,
    LinkCode,
    StartRaid,
    QuitRaid,
    SoftReset,
    DayStep(Locale),
    MonthStep(Locale),
    YearStep(Locale),
}

impl RangeId {
    pub const FIXED: [RangeId; 7] = [
        RangeId::Setup,
        RangeId::Teardown,
        RangeId::Connect,
        RangeId::LinkCode,
        RangeId::StartRaid,
        RangeId::QuitRaid,
        RangeId::SoftReset,
    ];

    pub fn token(self) -> String {
        match self {
            RangeId::Setup => "setup".to_string(),
            RangeId::Teardown => "teardown".to_string(),
            RangeId::Connect => "connect".to_string(),
            RangeId::LinkCode => "link_code".to_string(),
            RangeId::StartRaid => "start_raid".to_string(),
            RangeId::QuitRaid => "quit_raid".to_string(),
            RangeId::SoftReset => "soft_reset".to_string(),
            RangeId::DayStep(locale) => format!("day.{locale}"),
            RangeId::MonthStep(locale) => format!("month.{locale}"),
            RangeId::YearStep(locale) => format!("year.{locale}"),
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        let token = token.trim();
        if let Some(range_id) = Self::FIXED
            .iter()
            .copied()
            .find(|range_id| range_id.token() == token)
        {
            return Some(range_id);
        }

        let (kind, locale) = token.split_once('.')?;
        let locale = Locale::from_token(locale)?;
        match kind {
            "day" => Some(RangeId::DayStep(locale)),
            "month" => Some(RangeId::MonthStep(locale)),
            "year" => Some(RangeId::YearStep(locale)),
            _ => None,
        }
    }

    pub fn steps_for(locale: Locale) -> [RangeId; 3] {
        [
            RangeId::DayStep(locale),
            RangeId::MonthStep(locale),
            RangeId::YearStep(locale),
        ]
    }
}

impl fmt::Display for RangeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.token())
    }
}

// Inclusive on both ends.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ActionRange {
    pub start: usize,
    pub end: usize,
}

impl ActionRange {
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum TableError {
    #[error("action table has no entries")]
    Empty,
    #[error("entry {index} has a zero duration")]
    ZeroDuration { index: usize },
    #[error("range {range} starts at {start} after its end {end}")]
    InvertedRange {
        range: RangeId,
        start: usize,
        end: usize,
    },
    #[error("range {range} ends at {end} but the table has {len} entries")]
    RangeOutOfBounds { range: RangeId, end: usize, len: usize },
    #[error("range {0} is not defined in the action table")]
    MissingRange(RangeId),
    #[error("range {0} has no entries")]
    EmptyRange(RangeId),
    #[error("range {0} is defined more than once")]
    DuplicateRange(RangeId),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActionTable {
    name: String,
    entries: Vec<TableEntry>,
    ranges: BTreeMap<RangeId, ActionRange>,
}

impl ActionTable {
    pub fn new<I>(
        name: impl Into<String>,
        entries: Vec<TableEntry>,
        ranges: I,
    ) -> Result<Self, TableError>
    where
        I: IntoIterator<Item = (RangeId, ActionRange)>,
    {
        if entries.is_empty() {
            return Err(TableError::Empty);
        }

        if let Some(index) = entries.iter().position(|entry| entry.duration == 0) {
            return Err(TableError::ZeroDuration { index });
        }

        let len = entries.len();
        let mut map = BTreeMap::new();
        for (range_id, range) in ranges {
            if range.start > range.end {
                return Err(TableError::InvertedRange {
                    range: range_id,
                    start: range.start,
                    end: range.end,
                });
            }
            if range.end >= len {
                return Err(TableError::RangeOutOfBounds {
                    range: range_id,
                    end: range.end,
                    len,
                });
            }
            if map.insert(range_id, range).is_some() {
                return Err(TableError::DuplicateRange(range_id));
            }
        }

        Ok(Self {
            name: name.into(),
            entries,
            ranges: map,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn entries(&self) -> &[TableEntry] {
        &self.entries
    }

    pub fn entry(&self, index: usize) -> Option<&TableEntry> {
        self.entries.get(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn range(&self, range_id: RangeId) -> Option<ActionRange> {
        self.ranges.get(&range_id).copied()
    }

    pub fn ranges(&self) -> impl Iterator<Item = (RangeId, ActionRange)> + '_ {
        self.ranges.iter().map(|(id, range)| (*id, *range))
    }

    pub fn require<I>(&self, range_ids: I) -> Result<(), TableError>
    where
        I: IntoIterator<Item = RangeId>,
    {
        for range_id in range_ids {
            if !self.ranges.contains_key(&range_id) {
                return Err(TableError::MissingRange(range_id));
            }
        }
        Ok(())
    }

    pub fn range_frames(&self, range_id: RangeId) -> Option<u64> {
        let range = self.range(range_id)?;
        Some(
            self.entries[range.start..=range.end]
                .iter()
                .map(|entry| u64::from(entry.duration))
                .sum(),
        )
    }
}

#[derive(Clone, Debug, Default)]
pub struct ActionTableBuilder {
    name: String,
    entries: Vec<TableEntry>,
    ranges: Vec<(RangeId, ActionRange)>,
    aliases: Vec<(RangeId, RangeId)>,
    empty_range: Option<RangeId>,
}

impl ActionTableBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn range(mut self, range_id: RangeId, entries: &[TableEntry]) -> Self {
        if entries.is_empty() {
            self.empty_range.get_or_insert(range_id);
            return self;
        }

        let start = self.entries.len();
        self.entries.extend_from_slice(entries);
        self.ranges
            .push((range_id, ActionRange::new(start, self.entries.len() - 1)));
        self
    }

    pub fn alias(mut self, range_id: RangeId, target: RangeId) -> Self {
        self.aliases.push((range_id, target));
        self
    }

    pub fn build(self) -> Result<ActionTable, TableError> {
        if let Some(range_id) = self.empty_range {
            return Err(TableError::EmptyRange(range_id));
        }

        let mut ranges = self.ranges;
        for (range_id, target) in self.aliases {
            let range = ranges
                .iter()
                .find(|(id, _)| *id == target)
                .map(|(_, range)| *range)
                .ok_or(TableError::MissingRange(target))?;
            ranges.push((range_id, range));
        }

        ActionTable::new(self.name, self.entries, ranges)
    }
}
