//! Schedule specs: when a timer entry fires.
//!
//! A spec is given either as a typed [`ScheduleSpec`] or as a string, which
//! [`ScheduleSpec::parse`] interprets as a cron expression (five or six
//! whitespace-separated fields), an RFC 3339 timestamp, or a relative
//! duration such as `"30s"` or `"1h30m"`, in that order.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use croner::Cron;
use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// How a schedule entry was requested.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleFlavour {
    /// Fire once at a point in time.
    At,
    /// Fire on a recurring cron pattern.
    Cron,
}

impl fmt::Display for ScheduleFlavour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::At => write!(f, "at"),
            Self::Cron => write!(f, "cron"),
        }
    }
}

impl FromStr for ScheduleFlavour {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "at" => Ok(Self::At),
            "cron" => Ok(Self::Cron),
            other => Err(TypeError::InvalidSchedule {
                spec: other.to_string(),
                reason: "flavour must be 'at' or 'cron'".into(),
            }),
        }
    }
}

/// When a schedule entry fires.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ScheduleSpec {
    /// An absolute instant.
    At(DateTime<Utc>),
    /// Relative to the moment the schedule is stored.
    In(Duration),
    /// Next occurrence of a cron expression, strictly after now.
    Cron(String),
}

impl ScheduleSpec {
    /// Interpret a spec string.
    pub fn parse(s: &str) -> Result<Self, TypeError> {
        let trimmed = s.trim();
        let fields = trimmed.split_whitespace().count();
        if fields == 5 || fields == 6 {
            parse_cron(trimmed)?;
            return Ok(Self::Cron(trimmed.to_string()));
        }
        if let Ok(at) = DateTime::parse_from_rfc3339(trimmed) {
            return Ok(Self::At(at.with_timezone(&Utc)));
        }
        parse_duration(trimmed).map(Self::In)
    }

    /// Resolve the next firing time relative to `now`.
    ///
    /// Returns `Ok(None)` when the spec can never fire (a cron pattern with
    /// no upcoming occurrence). Absolute instants in the past still resolve:
    /// they are due immediately.
    pub fn next_fire(&self, now: DateTime<Utc>) -> Result<Option<DateTime<Utc>>, TypeError> {
        match self {
            Self::At(at) => Ok(Some(*at)),
            Self::In(delta) => Ok(now.checked_add_signed(*delta)),
            Self::Cron(expr) => {
                let cron = parse_cron(expr)?;
                Ok(cron.find_next_occurrence(&now, false).ok())
            }
        }
    }
}

impl fmt::Display for ScheduleSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::At(at) => write!(f, "{}", at.to_rfc3339()),
            Self::In(delta) => write_duration(f, *delta),
            Self::Cron(expr) => write!(f, "{expr}"),
        }
    }
}

impl FromStr for ScheduleSpec {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Largest units first, in the syntax [`parse_duration`] reads back.
fn write_duration(f: &mut fmt::Formatter<'_>, delta: Duration) -> fmt::Result {
    let mut secs = delta.num_seconds();
    if secs <= 0 {
        return write!(f, "{secs}s");
    }
    for (unit, size) in [('w', 604_800), ('d', 86_400), ('h', 3_600), ('m', 60), ('s', 1)] {
        if secs >= size {
            write!(f, "{}{unit}", secs / size)?;
            secs %= size;
        }
    }
    Ok(())
}

fn parse_cron(expr: &str) -> Result<Cron, TypeError> {
    Cron::new(expr).parse().map_err(|e| TypeError::InvalidSchedule {
        spec: expr.to_string(),
        reason: e.to_string(),
    })
}

/// Parse a relative duration made of `<number><unit>` groups.
///
/// Units: `s`, `m`, `h`, `d`, `w`. Groups may be combined (`"1h30m"`).
///
/// ```
/// use revdoc_types::schedule::parse_duration;
///
/// assert_eq!(parse_duration("90s").unwrap().num_seconds(), 90);
/// assert_eq!(parse_duration("1h30m").unwrap().num_minutes(), 90);
/// assert!(parse_duration("soon").is_err());
/// ```
pub fn parse_duration(s: &str) -> Result<Duration, TypeError> {
    let invalid = |reason: &str| TypeError::InvalidSchedule {
        spec: s.to_string(),
        reason: reason.to_string(),
    };

    if s.is_empty() {
        return Err(invalid("empty spec"));
    }

    let mut total = Duration::zero();
    let mut digits = String::new();
    for ch in s.chars() {
        if ch.is_ascii_digit() {
            digits.push(ch);
            continue;
        }
        if digits.is_empty() {
            return Err(invalid("expected a number before each unit"));
        }
        let n: i64 = digits
            .parse()
            .map_err(|_| invalid("number out of range"))?;
        digits.clear();
        let part = match ch {
            's' => Duration::try_seconds(n),
            'm' => Duration::try_minutes(n),
            'h' => Duration::try_hours(n),
            'd' => Duration::try_days(n),
            'w' => Duration::try_weeks(n),
            _ => return Err(invalid("unknown unit (expected s, m, h, d or w)")),
        }
        .ok_or_else(|| invalid("duration out of range"))?;
        total = total
            .checked_add(&part)
            .ok_or_else(|| invalid("duration out of range"))?;
    }
    if !digits.is_empty() {
        return Err(invalid("trailing number without a unit"));
    }
    Ok(total)
}
