//! Cron expression evaluation on top of [`cron::Schedule`].
//!
//! Fire times are a pure function of the expression, the timezone carried
//! by the reference instant, and the instant itself; nothing here reads the
//! clock.
//!
//! Expressions use the common five fields `min hour dom month dow`, or six
//! with a leading seconds field. Day-of-week is `0-7` with both `0` and `7`
//! meaning Sunday, or `SUN`..`SAT`. When day-of-month and day-of-week are
//! both restricted, a day must match both.

use chrono::{DateTime, LocalResult, TimeZone, Timelike, Utc};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::error::CronError;

/// Field names and upper bounds, seconds first
const FIELDS: [(&str, u32); 6] = [
    ("seconds", 59),
    ("minutes", 59),
    ("hours", 23),
    ("day-of-month", 31),
    ("month", 12),
    ("day-of-week", 7),
];

/// A parsed recurring schedule.
#[derive(Clone)]
pub struct CronSchedule {
    source: String,
    schedule: ::cron::Schedule,
}

impl CronSchedule {
    pub fn parse(expr: &str) -> Result<Self, CronError> {
        let mut fields: Vec<&str> = expr.split_whitespace().collect();
        let source = fields.join(" ");
        match fields.len() {
            5 => fields.insert(0, "0"),
            6 => {}
            n => return Err(CronError::FieldCount(n)),
        }

        for (text, (name, max)) in fields.iter().zip(FIELDS) {
            check_steps(text, name, max)?;
        }
        let weekdays = translate_weekdays(fields[5])?;

        let expanded = format!("{} {}", fields[..5].join(" "), weekdays);
        let schedule = ::cron::Schedule::from_str(&expanded).map_err(|e| CronError::Expression {
            expression: source.clone(),
            reason: e.to_string(),
        })?;

        Ok(Self { source, schedule })
    }

    /// First fire time strictly after `after`, in the same timezone.
    ///
    /// Local times that do not exist (DST gap) are skipped. Local times that
    /// occur twice (DST overlap) fire once, at the earlier instant. Returns
    /// `None` when the schedule can never fire, e.g. `0 0 30 2 *`.
    pub fn next_after<Z: TimeZone>(&self, after: &DateTime<Z>) -> Option<DateTime<Z>> {
        let tz = after.timezone();
        // Walk wall-clock times as if they were UTC, then place each one in
        // the real zone
        let wall = Utc.from_utc_datetime(&after.naive_local().with_nanosecond(0)?);

        self.schedule.after(&wall).find_map(|candidate| {
            match tz.from_local_datetime(&candidate.naive_utc()) {
                LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => {
                    (dt > *after).then_some(dt)
                }
                LocalResult::None => None,
            }
        })
    }

    /// The next `count` fire times after `after`
    pub fn upcoming<Z: TimeZone>(&self, after: &DateTime<Z>, count: usize) -> Vec<DateTime<Z>> {
        let mut times = Vec::with_capacity(count);
        let mut cursor = after.clone();

        while times.len() < count {
            match self.next_after(&cursor) {
                Some(next) => {
                    cursor = next.clone();
                    times.push(next);
                }
                None => break,
            }
        }

        times
    }
}

impl PartialEq for CronSchedule {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for CronSchedule {}

impl fmt::Debug for CronSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CronSchedule").field(&self.source).finish()
    }
}

impl fmt::Display for CronSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl FromStr for CronSchedule {
    type Err = CronError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn invalid(field: &'static str, value: &str, reason: impl Into<String>) -> CronError {
    CronError::InvalidField {
        field,
        value: value.to_string(),
        reason: reason.into(),
    }
}

/// Steps must be between 1 and the field's upper bound
fn check_steps(text: &str, field: &'static str, max: u32) -> Result<(), CronError> {
    for part in text.split(',') {
        if let Some((_, step)) = part.split_once('/') {
            parse_step(text, step, field, max)?;
        }
    }
    Ok(())
}

fn parse_step(text: &str, step: &str, field: &'static str, max: u32) -> Result<u32, CronError> {
    match step.parse::<u32>() {
        Ok(n) if (1..=max).contains(&n) => Ok(n),
        Ok(n) => Err(invalid(field, text, format!("step {} is outside 1-{}", n, max))),
        Err(_) => Err(invalid(field, text, format!("bad step '{}'", step))),
    }
}

/// Rewrites numeric day-of-week parts (`0-7`, Sunday is `0` or `7`) into the
/// numbering `cron` expects (`1-7`, Sunday is `1`). Named parts and `*` are
/// kept as written.
fn translate_weekdays(text: &str) -> Result<String, CronError> {
    const FIELD: &str = "day-of-week";

    let mut parts = Vec::new();
    for part in text.split(',') {
        let (range, step) = match part.split_once('/') {
            Some((range, step)) => (range, Some(parse_step(text, step, FIELD, 7)?)),
            None => (part, None),
        };

        if range == "*" {
            parts.push(part.to_string());
            continue;
        }

        let (start, end) = match range.split_once('-') {
            Some((a, b)) => (a, Some(b)),
            None => (range, None),
        };
        let Ok(start) = start.parse::<u32>() else {
            parts.push(part.to_string());
            continue;
        };
        let end = match end {
            Some(end) => end
                .parse::<u32>()
                .map_err(|_| invalid(FIELD, text, format!("'{}' is not a valid value", end)))?,
            // `a/n` runs to the end of the week
            None if step.is_some() => 7,
            None => start,
        };

        if start > 7 || end > 7 {
            return Err(invalid(FIELD, text, "values must be 0-7"));
        }
        if start > end {
            return Err(invalid(FIELD, text, format!("range {}-{} is reversed", start, end)));
        }

        let days: BTreeSet<u32> = (start..=end)
            .step_by(step.unwrap_or(1) as usize)
            .map(|day| day % 7 + 1)
            .collect();
        parts.extend(days.iter().map(u32::to_string));
    }

    Ok(parts.join(","))
}
