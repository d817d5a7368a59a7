//! Transmission history and dwell-time accounting.
//!
//! History is kept most-recent-first in a [`VecDeque`]: new records go on the
//! front and expired records fall off the back. A full re-sort only happens
//! when a record arrives out of order.

use log::debug;
use std::collections::VecDeque;

/// One past transmission.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransmissionRecord {
    /// Monotonic send timestamp in milliseconds.
    pub sent_at: i64,
    /// Time-on-air in milliseconds.
    pub duration: f64,
    /// Channel identifier, compared for equality only.
    pub frequency: u32,
}

impl TransmissionRecord {
    /// Create a new record.
    pub fn new(sent_at: i64, frequency: u32, duration: f64) -> Self {
        Self {
            sent_at,
            duration,
            frequency,
        }
    }

    /// End of the on-air interval `[sent_at, sent_at + duration)`.
    pub fn ends_at(&self) -> f64 {
        self.sent_at as f64 + self.duration
    }

    /// Portion of this record's airtime on `frequency` at or after `cutoff`.
    ///
    /// # Panics
    ///
    /// Panics if a straddling interval yields a negative overlap, which means
    /// the record itself is malformed (e.g. negative or NaN duration).
    pub fn airtime_after(&self, cutoff: f64, frequency: u32) -> f64 {
        if self.frequency != frequency || self.ends_at() <= cutoff {
            return 0.0;
        }
        let sent_at = self.sent_at as f64;
        if sent_at <= cutoff {
            let partial = self.duration - (cutoff - sent_at);
            assert!(
                partial >= 0.0,
                "negative partial airtime {} for record at {} (cutoff {})",
                partial,
                self.sent_at,
                cutoff
            );
            partial
        } else {
            self.duration
        }
    }
}

/// Sum the airtime on `frequency` that falls at or after `cutoff`.
pub fn dwell_time<'a, I>(history: I, cutoff: f64, frequency: u32) -> f64
where
    I: IntoIterator<Item = &'a TransmissionRecord>,
{
    history
        .into_iter()
        .map(|record| record.airtime_after(cutoff, frequency))
        .sum()
}

/// Most-recent-first record of transmissions within a retention window.
#[derive(Debug, Clone, Default)]
pub struct History {
    records: VecDeque<TransmissionRecord>,
}

impl History {
    /// Create an empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a transmission and drop everything at or before
    /// `newest.sent_at - window_ms`.
    pub fn push(&mut self, record: TransmissionRecord, window_ms: u64) {
        self.records.push_front(record);

        let previous = self.records.get(1).map(|r| r.sent_at);
        if let Some(previous) = previous.filter(|&prev| record.sent_at < prev) {
            debug!(
                "Out-of-order record at {} (newest {}), re-sorting history",
                record.sent_at, previous
            );
            self.records
                .make_contiguous()
                .sort_by(|a, b| b.sent_at.cmp(&a.sent_at));
        }

        self.trim(window_ms);
    }

    /// Drop records at or before the window cutoff of the newest record.
    fn trim(&mut self, window_ms: u64) {
        let Some(newest) = self.records.front() else {
            return;
        };
        let cutoff = newest.sent_at.saturating_sub(window_ms as i64);

        let before = self.records.len();
        while self
            .records
            .back()
            .is_some_and(|oldest| oldest.sent_at <= cutoff)
        {
            self.records.pop_back();
        }

        let dropped = before - self.records.len();
        if dropped > 0 {
            debug!(
                "Trimmed {} record(s) at or before {}, {} retained",
                dropped,
                cutoff,
                self.records.len()
            );
        }
    }

    /// Airtime on `frequency` at or after `cutoff`.
    pub fn dwell_time(&self, cutoff: f64, frequency: u32) -> f64 {
        dwell_time(&self.records, cutoff, frequency)
    }

    /// Iterate records, newest first.
    pub fn iter(&self) -> impl Iterator<Item = &TransmissionRecord> {
        self.records.iter()
    }

    /// Most recent record, if any.
    pub fn newest(&self) -> Option<&TransmissionRecord> {
        self.records.front()
    }

    /// Number of retained records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no records are retained.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FREQ: u32 = 868_100_000;
    const OTHER_FREQ: u32 = 868_300_000;

    fn sent_ats(history: &History) -> Vec<i64> {
        history.iter().map(|r| r.sent_at).collect()
    }

    #[test]
    fn test_dwell_time_empty() {
        let empty: Vec<TransmissionRecord> = Vec::new();
        assert_eq!(dwell_time(&empty, 0.0, FREQ), 0.0);
        assert_eq!(History::new().dwell_time(-1_000.0, FREQ), 0.0);
    }

    #[test]
    fn test_dwell_time_other_frequency_ignored() {
        let records = vec![
            TransmissionRecord::new(1_000, OTHER_FREQ, 300.0),
            TransmissionRecord::new(500, OTHER_FREQ, 100.0),
        ];
        assert_eq!(dwell_time(&records, 0.0, FREQ), 0.0);
    }

    #[test]
    fn test_dwell_time_straddle() {
        let records = vec![TransmissionRecord::new(1_000, FREQ, 300.0)];
        assert_eq!(dwell_time(&records, 1_100.0, FREQ), 200.0);
    }

    #[test]
    fn test_dwell_time_straddle_at_start() {
        // Cutoff exactly at sent_at counts the whole record
        let records = vec![TransmissionRecord::new(1_000, FREQ, 300.0)];
        assert_eq!(dwell_time(&records, 1_000.0, FREQ), 300.0);
    }

    #[test]
    fn test_dwell_time_ended_before_cutoff() {
        let records = vec![
            TransmissionRecord::new(1_000, FREQ, 300.0),
            TransmissionRecord::new(500, FREQ, 100.0),
        ];
        // First record ends exactly at the cutoff, second well before
        assert_eq!(dwell_time(&records, 1_300.0, FREQ), 0.0);
    }

    #[test]
    fn test_dwell_time_mixed() {
        let records = vec![
            TransmissionRecord::new(5_000, FREQ, 100.0),
            TransmissionRecord::new(4_000, OTHER_FREQ, 400.0),
            TransmissionRecord::new(2_950, FREQ, 100.0),
            TransmissionRecord::new(1_000, FREQ, 200.0),
        ];
        // 100 full + 50 of the straddling record + 0 for the expired one
        assert_eq!(dwell_time(&records, 3_000.0, FREQ), 150.0);
        // Order does not matter
        let reversed: Vec<_> = records.iter().rev().copied().collect();
        assert_eq!(dwell_time(&reversed, 3_000.0, FREQ), 150.0);
    }

    #[test]
    #[should_panic(expected = "negative partial airtime")]
    fn test_dwell_time_negative_partial_panics() {
        let record = TransmissionRecord::new(1_000, FREQ, f64::NAN);
        record.airtime_after(1_100.0, FREQ);
    }

    #[test]
    fn test_push_keeps_descending_order() {
        let mut history = History::new();
        for t in [1_000, 2_000, 3_000] {
            history.push(TransmissionRecord::new(t, FREQ, 100.0), 20_000);
        }
        assert_eq!(sent_ats(&history), vec![3_000, 2_000, 1_000]);
        assert_eq!(history.newest().map(|r| r.sent_at), Some(3_000));
    }

    #[test]
    fn test_push_out_of_order_resorts() {
        let mut history = History::new();
        history.push(TransmissionRecord::new(1_000, FREQ, 100.0), 20_000);
        history.push(TransmissionRecord::new(3_000, FREQ, 100.0), 20_000);
        history.push(TransmissionRecord::new(2_000, FREQ, 100.0), 20_000);
        assert_eq!(sent_ats(&history), vec![3_000, 2_000, 1_000]);
    }

    #[test]
    fn test_push_trims_window() {
        let mut history = History::new();
        history.push(TransmissionRecord::new(0, FREQ, 100.0), 20_000);
        history.push(TransmissionRecord::new(10_000, FREQ, 100.0), 20_000);
        // Cutoff 20_000 - 20_000 = 0, record at 0 is dropped (inclusive)
        history.push(TransmissionRecord::new(20_000, FREQ, 100.0), 20_000);
        assert_eq!(sent_ats(&history), vec![20_000, 10_000]);

        history.push(TransmissionRecord::new(45_000, FREQ, 100.0), 20_000);
        assert_eq!(sent_ats(&history), vec![45_000]);
    }

    #[test]
    fn test_push_stale_record_is_trimmed() {
        let mut history = History::new();
        history.push(TransmissionRecord::new(50_000, FREQ, 100.0), 20_000);
        // Arrives late and is already outside the window of the newest record
        history.push(TransmissionRecord::new(10_000, FREQ, 100.0), 20_000);
        assert_eq!(sent_ats(&history), vec![50_000]);
    }

    #[test]
    fn test_trim_near_i64_min() {
        let mut history = History::new();
        history.push(TransmissionRecord::new(i64::MIN + 1, FREQ, 1.0), 20_000);
        assert_eq!(history.len(), 1);
    }
}
