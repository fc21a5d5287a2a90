// SPDX-FileCopyrightText: 2025 xfnw
//
// SPDX-License-Identifier: MPL-2.0

/// rough bytes per line, a dotted quad plus its newline averages about this
pub const AVERAGE_LINE_LEN: u64 = 14;

/// a guess at how many lines an input has, only good for showing progress
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Estimate {
    total: u64,
}

impl Estimate {
    #[must_use]
    pub const fn from_len(bytes: u64) -> Self {
        let total = bytes / AVERAGE_LINE_LEN;
        Self {
            total: if total == 0 { 1 } else { total },
        }
    }

    #[must_use]
    pub const fn total(self) -> u64 {
        self.total
    }

    /// how far along `done` lines are, never more than 100
    #[must_use]
    pub const fn percent(self, done: u64) -> u64 {
        let percent = done.saturating_mul(100) / self.total;
        if percent > 100 { 100 } else { percent }
    }
}

/// calls back whenever the whole percentage goes up
pub struct Tracker<F> {
    estimate: Estimate,
    reported: u64,
    report: F,
}

impl<F: FnMut(u64)> Tracker<F> {
    #[must_use]
    pub const fn new(estimate: Estimate, report: F) -> Self {
        Self {
            estimate,
            reported: 0,
            report,
        }
    }

    pub fn advance(&mut self, done: u64) {
        let percent = self.estimate.percent(done);
        if percent > self.reported {
            self.reported = percent;
            (self.report)(percent);
        }
    }
}

#[test]
fn test_estimate() {
    assert_eq!(Estimate::from_len(0).total(), 1);
    assert_eq!(Estimate::from_len(13).total(), 1);
    assert_eq!(Estimate::from_len(1400).total(), 100);
    let e = Estimate::from_len(1400);
    assert_eq!(e.percent(0), 0);
    assert_eq!(e.percent(50), 50);
    assert_eq!(e.percent(100), 100);
    assert_eq!(e.percent(250), 100);
    assert_eq!(e.percent(u64::MAX), 100);
}

#[test]
fn test_tracker_reports_increases_only() {
    let mut seen = vec![];
    let mut tracker = Tracker::new(Estimate::from_len(14 * 400), |p| seen.push(p));
    for done in 1..=1000 {
        tracker.advance(done);
    }
    drop(tracker);
    assert_eq!(seen, (1..=100).collect::<Vec<_>>());
}
