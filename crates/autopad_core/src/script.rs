use std::collections::VecDeque;

use crate::model::RangeId;
use crate::sequencer::RangeSource;

// Fixed playlist of ranges for scenarios that do not depend on the calendar.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RangeScript {
    pending: VecDeque<RangeId>,
}

impl RangeScript {
    pub fn new<I>(ranges: I) -> Self
    where
        I: IntoIterator<Item = RangeId>,
    {
        Self {
            pending: ranges.into_iter().collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.pending.len()
    }

    pub fn ranges(&self) -> impl Iterator<Item = RangeId> + '_ {
        self.pending.iter().copied()
    }
}

impl RangeSource for RangeScript {
    fn next_range(&mut self) -> Option<RangeId> {
        self.pending.pop_front()
    }
}

#[cfg(test)]
mod tests {
    use super::RangeScript;
    use crate::model::RangeId;
    use crate::sequencer::RangeSource;

    #[test]
    fn hands_out_ranges_front_to_back() {
        let mut script = RangeScript::new([RangeId::Connect, RangeId::StartRaid, RangeId::Connect]);

        assert_eq!(script.remaining(), 3);
        assert_eq!(script.next_range(), Some(RangeId::Connect));
        assert_eq!(script.next_range(), Some(RangeId::StartRaid));
        assert_eq!(
            script.ranges().collect::<Vec<_>>(),
            vec![RangeId::Connect]
        );
        assert_eq!(script.next_range(), Some(RangeId::Connect));
        assert_eq!(script.next_range(), None);
        assert_eq!(script.next_range(), None);
    }

    #[test]
    fn empty_script_ends_immediately() {
        let mut script = RangeScript::default();
        assert_eq!(script.remaining(), 0);
        assert_eq!(script.next_range(), None);
    }
}
