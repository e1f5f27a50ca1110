use chrono::{DateTime, Datelike, Duration, LocalResult, NaiveDate, NaiveDateTime, TimeZone};

use cloudpos_checkout::{PaymentMethod, Transaction};

use crate::ledger::Ledger;

/// Resolve a wall-clock instant to epoch milliseconds in `tz`.
///
/// Ambiguous instants (DST fold) take the earlier mapping; instants inside a
/// DST gap resolve to the first wall-clock hour that exists after the gap.
fn wall_clock_ms<Tz: TimeZone>(tz: &Tz, naive: NaiveDateTime) -> i64 {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => dt.timestamp_millis(),
        LocalResult::Ambiguous(earliest, _) => earliest.timestamp_millis(),
        LocalResult::None => match tz.from_local_datetime(&(naive + Duration::hours(1))) {
            LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => dt.timestamp_millis(),
            LocalResult::None => naive.and_utc().timestamp_millis(),
        },
    }
}

/// Epoch milliseconds of local midnight on `now`'s calendar day.
pub fn start_of_day_ms<Tz: TimeZone>(now: &DateTime<Tz>) -> i64 {
    let midnight = now.date_naive().and_hms_opt(0, 0, 0).unwrap();
    wall_clock_ms(&now.timezone(), midnight)
}

/// Display label for the month `offset` months before `now`'s month.
pub fn month_label<Tz: TimeZone>(now: &DateTime<Tz>, offset: u32) -> String {
    let months = i64::from(now.year()) * 12 + i64::from(now.month0()) - i64::from(offset);
    format!(
        "{}年{}月",
        months.div_euclid(12),
        months.rem_euclid(12) + 1
    )
}

/// One calendar month as an inclusive epoch-millisecond range.
///
/// Start is the first instant of day 1; end is 23:59:59 of the last day.
/// Both are local wall-clock in `now`'s timezone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthWindow {
    pub start_ms: i64,
    pub end_ms: i64,
}

impl MonthWindow {
    /// The calendar month `offset` months before `now`'s month (0 = current).
    ///
    /// Offsets roll over year boundaries: January with offset 2 resolves to
    /// November of the prior year.
    pub fn from_offset<Tz: TimeZone>(now: &DateTime<Tz>, offset: u32) -> Self {
        let months = i64::from(now.year()) * 12 + i64::from(now.month0()) - i64::from(offset);
        let start = month_first_day(months);
        let last_day = month_first_day(months + 1) - Duration::days(1);

        let tz = now.timezone();
        Self {
            start_ms: wall_clock_ms(&tz, start.and_hms_opt(0, 0, 0).unwrap()),
            end_ms: wall_clock_ms(&tz, last_day.and_hms_opt(23, 59, 59).unwrap()),
        }
    }

    pub fn contains(&self, timestamp_ms: i64) -> bool {
        timestamp_ms >= self.start_ms && timestamp_ms <= self.end_ms
    }
}

fn month_first_day(months_since_year_zero: i64) -> NaiveDate {
    let year = months_since_year_zero.div_euclid(12) as i32;
    let month = months_since_year_zero.rem_euclid(12) as u32 + 1;
    NaiveDate::from_ymd_opt(year, month, 1).unwrap()
}

/// Derived sales aggregates, pure over the ledger and query parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SalesStats {
    /// Revenue since local midnight today.
    pub today_total: u64,
    /// Revenue since the first instant of the current calendar month.
    pub month_total: u64,
    /// Revenue over `filtered` (the per-method rollup when a filter is set).
    pub filtered_total: u64,
    /// Transactions inside the selected month window, optionally restricted
    /// to one payment method, in stored (reverse-chronological) order.
    pub filtered: Vec<Transaction>,
}

impl SalesStats {
    pub fn compute<Tz: TimeZone>(
        ledger: &Ledger,
        now: &DateTime<Tz>,
        month_offset: u32,
        method: Option<PaymentMethod>,
    ) -> Self {
        let today_start = start_of_day_ms(now);
        let current_month = MonthWindow::from_offset(now, 0);
        let window = MonthWindow::from_offset(now, month_offset);

        let mut today_total = 0u64;
        let mut month_total = 0u64;
        let mut filtered_total = 0u64;
        let mut filtered = Vec::new();

        for tx in ledger.transactions() {
            if tx.timestamp >= today_start {
                today_total += tx.total;
            }
            if tx.timestamp >= current_month.start_ms {
                month_total += tx.total;
            }
            if window.contains(tx.timestamp)
                && method.is_none_or(|m| tx.payment_method == m)
            {
                filtered_total += tx.total;
                filtered.push(tx.clone());
            }
        }

        Self {
            today_total,
            month_total,
            filtered_total,
            filtered,
        }
    }
}
