//! Bookable travel date range
//!
//! The travel-date picker accepts today through a fixed number of days ahead.
//! "Today" is the UTC calendar date, matching the ISO strings the form posts.

use chrono::{Days, NaiveDate, Utc};

/// Days ahead the travel date may be set by default
pub const DEFAULT_TRAVEL_WINDOW_DAYS: u64 = 7;

const ISO_FORMAT: &str = "%Y-%m-%d";

/// Inclusive `[min, max]` range of selectable travel dates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TravelDateWindow {
    min: NaiveDate,
    max: NaiveDate,
}

impl TravelDateWindow {
    pub fn from_today(today: NaiveDate, days: u64) -> Self {
        let max = today.checked_add_days(Days::new(days)).unwrap_or(NaiveDate::MAX);
        Self { min: today, max }
    }

    /// Window starting at the current UTC date
    pub fn current(days: u64) -> Self {
        Self::from_today(Utc::now().date_naive(), days)
    }

    pub fn min(&self) -> NaiveDate {
        self.min
    }

    pub fn max(&self) -> NaiveDate {
        self.max
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        (self.min..=self.max).contains(&date)
    }

    /// Nearest selectable date
    pub fn clamp(&self, date: NaiveDate) -> NaiveDate {
        date.clamp(self.min, self.max)
    }

    /// `min` attribute value, `YYYY-MM-DD`
    pub fn min_iso(&self) -> String {
        self.min.format(ISO_FORMAT).to_string()
    }

    /// `max` attribute value, `YYYY-MM-DD`
    pub fn max_iso(&self) -> String {
        self.max.format(ISO_FORMAT).to_string()
    }

    pub fn parse_iso(value: &str) -> Result<NaiveDate, chrono::ParseError> {
        NaiveDate::parse_from_str(value.trim(), ISO_FORMAT)
    }
}

impl Default for TravelDateWindow {
    fn default() -> Self {
        Self::current(DEFAULT_TRAVEL_WINDOW_DAYS)
    }
}
