use chrono::{Days, NaiveDate};

/// Inclusive date range for one provider query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncWindow {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl SyncWindow {
    /// Build a window that never spans more than `max_days`.
    /// A missing `to` becomes `from + max_days`; a `to` past that bound is pulled back to it.
    pub fn bounded(from: NaiveDate, to: Option<NaiveDate>, max_days: u32) -> Self {
        let limit = from
            .checked_add_days(Days::new(u64::from(max_days)))
            .unwrap_or(NaiveDate::MAX);
        let to = match to {
            Some(t) if t <= limit => t,
            _ => limit,
        };
        Self { from, to }
    }

    pub fn span_days(&self) -> i64 {
        (self.to - self.from).num_days()
    }
}
