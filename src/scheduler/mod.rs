//! Daily run scheduler
//!
//! Fires the engine once per trading day at a configured local time. A
//! trigger that lands while a run is still in flight is dropped with a
//! warning, never queued.

pub mod calendar;

use std::sync::Arc;
use std::time::Duration;

use chrono::{Days, Local, NaiveDateTime, NaiveTime};
use tracing::{info, warn};

use crate::common::errors::Result;
use crate::common::types::TriggerKind;
use crate::config::loader::{parse_fire_at, parse_holidays};
use crate::config::types::SchedulerConfig;
use crate::engine::BatchEngine;

pub use calendar::{TradingCalendar, WeekdayCalendar};

/// Next fire instant strictly after `after`.
///
/// Same-day firing only happens when `after` is still before the fire
/// time; otherwise the search starts tomorrow and skips non-trading days.
pub fn next_fire(
    after: NaiveDateTime,
    fire_at: NaiveTime,
    calendar: &dyn TradingCalendar,
) -> NaiveDateTime {
    let mut date = after.date();
    if after.time() >= fire_at {
        date = date + Days::new(1);
    }
    // Bounded: a calendar rejecting a whole year would be misconfigured
    for _ in 0..366 {
        if calendar.is_trading_day(date) {
            break;
        }
        date = date + Days::new(1);
    }
    date.and_time(fire_at)
}

/// Fires the engine at the configured local time on trading days
pub struct Scheduler {
    engine: Arc<BatchEngine>,
    fire_at: NaiveTime,
    calendar: WeekdayCalendar,
}

impl Scheduler {
    pub fn from_config(cfg: &SchedulerConfig, engine: Arc<BatchEngine>) -> Result<Self> {
        let fire_at = parse_fire_at(&cfg.fire_at)?;
        let holidays = parse_holidays(&cfg.holidays)?;
        Ok(Self {
            engine,
            fire_at,
            calendar: WeekdayCalendar::new(holidays),
        })
    }

    pub async fn run(self) {
        loop {
            let now = Local::now().naive_local();
            let next = next_fire(now, self.fire_at, &self.calendar);
            let delay = (next - now).to_std().unwrap_or(Duration::ZERO);
            info!(next = %next, "scheduler sleeping until next trading-day fire");

            tokio::time::sleep(delay).await;

            if self.engine.try_trigger(TriggerKind::Scheduled).is_none() {
                warn!("scheduled trigger dropped: a run is already in flight");
            }

            // Step past the fire instant so the next iteration computes
            // tomorrow rather than re-firing within the same second
            tokio::time::sleep(Duration::from_secs(1)).await;
        }
    }
}
