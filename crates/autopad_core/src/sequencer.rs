use tracing::{debug, error};

use crate::calendar::CalendarAdvancer;
use crate::model::{Action, ActionRange, ActionTable, RangeId};

// Picks the range to enter once the current one runs out; `None` ends the run.
pub trait RangeSource {
    fn next_range(&mut self) -> Option<RangeId>;
}

impl RangeSource for CalendarAdvancer {
    fn next_range(&mut self) -> Option<RangeId> {
        CalendarAdvancer::next_range(self)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Processing,
    Done,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    Action(Action),
    Done,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Cursor {
    range_id: RangeId,
    index: usize,
    end: usize,
}

impl Cursor {
    fn enter(range_id: RangeId, range: ActionRange) -> Self {
        Self {
            range_id,
            index: range.start,
            end: range.end,
        }
    }
}

// `cursor == None` while processing means the last range ran out on the
// previous frame and the range source has to pick the next one.
#[derive(Clone, Debug)]
pub struct Sequencer {
    phase: Phase,
    cursor: Option<Cursor>,
    hold_counter: u32,
    last_range: Option<RangeId>,
}

impl Sequencer {
    pub fn starting_at(range_id: RangeId, range: ActionRange) -> Self {
        Self {
            phase: Phase::Processing,
            cursor: Some(Cursor::enter(range_id, range)),
            hold_counter: 0,
            last_range: Some(range_id),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_done(&self) -> bool {
        self.phase == Phase::Done
    }

    pub fn current_range(&self) -> Option<RangeId> {
        self.last_range
    }

    pub fn position(&self) -> Option<usize> {
        self.cursor.map(|cursor| cursor.index)
    }

    pub fn hold_counter(&self) -> u32 {
        self.hold_counter
    }

    pub fn step(&mut self, table: &ActionTable, source: &mut dyn RangeSource) -> Step {
        if self.phase == Phase::Done {
            return Step::Done;
        }

        let mut cursor = match self.cursor {
            Some(cursor) => cursor,
            None => match self.enter_next_range(table, source) {
                Some(cursor) => cursor,
                None => return Step::Done,
            },
        };

        let Some(entry) = table.entry(cursor.index).copied() else {
            error!(index = cursor.index, "sequencer cursor left the action table");
            self.finish();
            return Step::Done;
        };

        self.hold_counter += 1;
        if self.hold_counter >= entry.duration {
            self.hold_counter = 0;
            cursor.index += 1;
        }

        self.cursor = if cursor.index > cursor.end {
            debug!(range = %cursor.range_id, "range exhausted");
            None
        } else {
            Some(cursor)
        };

        Step::Action(entry.action)
    }

    fn enter_next_range(
        &mut self,
        table: &ActionTable,
        source: &mut dyn RangeSource,
    ) -> Option<Cursor> {
        let Some(range_id) = source.next_range() else {
            debug!("no ranges left, sequencer done");
            self.finish();
            return None;
        };

        let Some(range) = table.range(range_id) else {
            error!(range = %range_id, "selected range is missing from the table");
            self.finish();
            return None;
        };

        debug!(range = %range_id, start = range.start, end = range.end, "entering range");

        self.hold_counter = 0;
        self.last_range = Some(range_id);
        Some(Cursor::enter(range_id, range))
    }

    fn finish(&mut self) {
        self.phase = Phase::Done;
        self.cursor = None;
        self.hold_counter = 0;
    }
}
