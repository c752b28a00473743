// Tick generation, domain rounding and tick label formats

use super::format::{precision_fixed, precision_prefix, precision_round, FormatSpec, NumberFormat};
use super::time_format::DateFormat;
use super::value::{js_number_string, Value};
use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Timelike, Utc};
use thiserror::Error;

/// Largest tick count a template may request.
pub const MAX_TICK_COUNT: f64 = 1e6;

#[derive(Error, Debug, Clone, PartialEq)]
#[error("Invalid tick count {0}")]
pub struct TickCountError(pub String);

/// The requested tick count (10 when absent), refused when it is infinite or
/// exceeds [`MAX_TICK_COUNT`]. NaN passes through and yields no ticks.
pub fn tick_count(value: Option<&Value>) -> Result<f64, TickCountError> {
    let count = match value {
        Some(v) if !v.is_nullish() => v.to_number(),
        _ => 10.0,
    };
    if count.is_nan() || (count.is_finite() && count <= MAX_TICK_COUNT) {
        Ok(count)
    } else {
        Err(TickCountError(js_number_string(count)))
    }
}

const E10: f64 = 7.0710678118654755; // sqrt(50)
const E5: f64 = 3.1622776601683795; // sqrt(10)
const E2: f64 = std::f64::consts::SQRT_2;

fn tick_spec(start: f64, stop: f64, count: f64) -> (f64, f64, f64) {
    let step = (stop - start) / count.max(0.0);
    let power = step.log10().floor();
    let error = step / 10f64.powf(power);
    let factor = if error >= E10 {
        10.0
    } else if error >= E5 {
        5.0
    } else if error >= E2 {
        2.0
    } else {
        1.0
    };
    let (mut i1, mut i2, inc);
    if power < 0.0 {
        let scale = 10f64.powf(-power) / factor;
        i1 = (start * scale).round();
        i2 = (stop * scale).round();
        if i1 / scale < start {
            i1 += 1.0;
        }
        if i2 / scale > stop {
            i2 -= 1.0;
        }
        inc = -scale;
    } else {
        let scale = 10f64.powf(power) * factor;
        i1 = (start / scale).round();
        i2 = (stop / scale).round();
        if i1 * scale < start {
            i1 += 1.0;
        }
        if i2 * scale > stop {
            i2 -= 1.0;
        }
        inc = scale;
    }
    if i2 < i1 && (0.5..2.0).contains(&count) {
        return tick_spec(start, stop, count * 2.0);
    }
    (i1, i2, inc)
}

/// Roughly `count` evenly spaced round values covering `[start, stop]`.
pub fn ticks(start: f64, stop: f64, count: f64) -> Vec<f64> {
    if count.is_nan() || count <= 0.0 || start.is_nan() || stop.is_nan() {
        return Vec::new();
    }
    if start == stop {
        return vec![start];
    }
    let reverse = stop < start;
    let (i1, i2, inc) = if reverse {
        tick_spec(stop, start, count)
    } else {
        tick_spec(start, stop, count)
    };
    if i2.is_nan() || i1.is_nan() || i2 < i1 || i2 - i1 >= MAX_TICK_COUNT * 2.0 {
        return Vec::new();
    }
    let n = (i2 - i1) as usize + 1;
    let value = |k: f64| if inc < 0.0 { k / -inc } else { k * inc };
    (0..n)
        .map(|i| {
            if reverse {
                value(i2 - i as f64)
            } else {
                value(i1 + i as f64)
            }
        })
        .collect()
}

/// Tick spacing as an integer power-of-ten multiple; negative values mean `1 / -inc`.
pub fn tick_increment(start: f64, stop: f64, count: f64) -> f64 {
    tick_spec(start, stop, count).2
}

pub fn tick_step(start: f64, stop: f64, count: f64) -> f64 {
    let reverse = stop < start;
    let inc = if reverse {
        tick_increment(stop, start, count)
    } else {
        tick_increment(start, stop, count)
    };
    let step = if inc < 0.0 { 1.0 / -inc } else { inc };
    if reverse {
        -step
    } else {
        step
    }
}

/// Extend the domain ends outward to round tick values.
pub fn nice_linear(domain: &mut [f64], count: f64) {
    if domain.len() < 2 {
        return;
    }
    let (mut i0, mut i1) = (0, domain.len() - 1);
    let (mut start, mut stop) = (domain[i0], domain[i1]);
    if stop < start {
        std::mem::swap(&mut start, &mut stop);
        std::mem::swap(&mut i0, &mut i1);
    }
    let mut previous = None;
    for _ in 0..10 {
        let step = tick_increment(start, stop, count);
        if previous == Some(step) {
            domain[i0] = start;
            domain[i1] = stop;
            return;
        } else if step > 0.0 {
            start = (start / step).floor() * step;
            stop = (stop / step).ceil() * step;
        } else if step < 0.0 {
            start = (start * step).ceil() / step;
            stop = (stop * step).floor() / step;
        } else {
            break;
        }
        previous = Some(step);
    }
}

/// Extend the domain ends with arbitrary floor/ceil functions.
pub fn nice_with(domain: &mut [f64], floor: impl Fn(f64) -> f64, ceil: impl Fn(f64) -> f64) {
    if domain.len() < 2 {
        return;
    }
    let (mut i0, mut i1) = (0, domain.len() - 1);
    if domain[i1] < domain[i0] {
        std::mem::swap(&mut i0, &mut i1);
    }
    domain[i0] = floor(domain[i0]);
    domain[i1] = ceil(domain[i1]);
}

/// Number format suited to ticks spaced over `[start, stop]`.
pub fn tick_format(start: f64, stop: f64, count: f64, specifier: Option<&str>) -> NumberFormat {
    let step = tick_step(start, stop, count);
    let mut spec = specifier
        .and_then(|s| s.parse::<FormatSpec>().ok())
        .unwrap_or(FormatSpec { comma: true, kind: Some('f'), ..FormatSpec::default() });
    let magnitude = start.abs().max(stop.abs());
    match spec.kind {
        Some('s') => {
            if spec.precision.is_none() {
                spec.precision = Some(precision_prefix(step, magnitude));
            }
            return NumberFormat::with_si_prefix(spec, magnitude);
        }
        None | Some('e') | Some('g') | Some('p') | Some('r') => {
            if spec.precision.is_none() {
                let shift = usize::from(spec.kind == Some('e'));
                spec.precision = Some(precision_round(step, magnitude).saturating_sub(shift));
            }
        }
        Some('f') | Some('%') => {
            if spec.precision.is_none() {
                let shift = if spec.kind == Some('%') { 2 } else { 0 };
                spec.precision = Some(precision_fixed(step).saturating_sub(shift));
            }
        }
        _ => {}
    }
    NumberFormat::from_spec(spec)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    Millisecond,
    Second,
    Minute,
    Hour,
    Day,
    Week,
    Month,
    Year,
}

const SECOND: f64 = 1_000.0;
const MINUTE: f64 = SECOND * 60.0;
const HOUR: f64 = MINUTE * 60.0;
const DAY: f64 = HOUR * 24.0;
const WEEK: f64 = DAY * 7.0;
const MONTH: f64 = DAY * 30.0;
const YEAR: f64 = DAY * 365.0;

const TICK_INTERVALS: [(TimeUnit, i64, f64); 17] = [
    (TimeUnit::Second, 1, SECOND),
    (TimeUnit::Second, 5, 5.0 * SECOND),
    (TimeUnit::Second, 15, 15.0 * SECOND),
    (TimeUnit::Second, 30, 30.0 * SECOND),
    (TimeUnit::Minute, 1, MINUTE),
    (TimeUnit::Minute, 5, 5.0 * MINUTE),
    (TimeUnit::Minute, 15, 15.0 * MINUTE),
    (TimeUnit::Minute, 30, 30.0 * MINUTE),
    (TimeUnit::Hour, 1, HOUR),
    (TimeUnit::Hour, 3, 3.0 * HOUR),
    (TimeUnit::Hour, 6, 6.0 * HOUR),
    (TimeUnit::Hour, 12, 12.0 * HOUR),
    (TimeUnit::Day, 1, DAY),
    (TimeUnit::Day, 2, 2.0 * DAY),
    (TimeUnit::Week, 1, WEEK),
    (TimeUnit::Month, 1, MONTH),
    (TimeUnit::Month, 3, 3.0 * MONTH),
];

/// A calendar interval (UTC) filtered to every `step`-th boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeInterval {
    pub unit: TimeUnit,
    pub step: i64,
}

fn to_date(ms: f64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(ms as i64).single()
}

fn midnight(year: i32, month: u32, day: u32) -> Option<DateTime<Utc>> {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

impl TimeInterval {
    /// Interval giving about `count` ticks between two instants (milliseconds).
    pub fn for_span(start: f64, stop: f64, count: f64) -> Self {
        let target = (stop - start).abs() / count;
        let i = TICK_INTERVALS.partition_point(|(_, _, duration)| *duration <= target);
        if i == TICK_INTERVALS.len() {
            let step = tick_step(start / YEAR, stop / YEAR, count).abs().max(1.0);
            return Self { unit: TimeUnit::Year, step: step as i64 };
        }
        if i == 0 {
            let step = tick_step(start, stop, count).abs().max(1.0);
            return Self { unit: TimeUnit::Millisecond, step: step as i64 };
        }
        let (below, above) = (TICK_INTERVALS[i - 1], TICK_INTERVALS[i]);
        let (unit, step, _) = if target / below.2 < above.2 / target { below } else { above };
        Self { unit, step }
    }

    fn floor_unit(&self, date: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let ms = date.timestamp_millis();
        let truncate = |size: i64| to_date((ms.div_euclid(size) * size) as f64);
        match self.unit {
            TimeUnit::Millisecond => Some(date),
            TimeUnit::Second => truncate(1_000),
            TimeUnit::Minute => truncate(60_000),
            TimeUnit::Hour => truncate(3_600_000),
            TimeUnit::Day => midnight(date.year(), date.month(), date.day()),
            TimeUnit::Week => {
                let back = date.weekday().num_days_from_sunday() as i64;
                let day = midnight(date.year(), date.month(), date.day())?;
                Some(day - Duration::days(back))
            }
            TimeUnit::Month => midnight(date.year(), date.month(), 1),
            TimeUnit::Year => midnight(date.year(), 1, 1),
        }
    }

    fn offset_unit(&self, date: DateTime<Utc>, n: i64) -> Option<DateTime<Utc>> {
        match self.unit {
            TimeUnit::Millisecond => date.checked_add_signed(Duration::milliseconds(n)),
            TimeUnit::Second => date.checked_add_signed(Duration::seconds(n)),
            TimeUnit::Minute => date.checked_add_signed(Duration::minutes(n)),
            TimeUnit::Hour => date.checked_add_signed(Duration::hours(n)),
            TimeUnit::Day => date.checked_add_signed(Duration::days(n)),
            TimeUnit::Week => date.checked_add_signed(Duration::weeks(n)),
            TimeUnit::Month => {
                let months = date.year() as i64 * 12 + date.month0() as i64 + n;
                midnight(months.div_euclid(12) as i32, months.rem_euclid(12) as u32 + 1, 1)
            }
            TimeUnit::Year => midnight(date.year().checked_add(i32::try_from(n).ok()?)?, 1, 1),
        }
    }

    /// Field whose multiples of `step` are kept.
    fn field(&self, date: DateTime<Utc>) -> i64 {
        match self.unit {
            TimeUnit::Millisecond => date.timestamp_millis(),
            TimeUnit::Second => date.second() as i64,
            TimeUnit::Minute => date.minute() as i64,
            TimeUnit::Hour => date.hour() as i64,
            TimeUnit::Day => date.day0() as i64,
            TimeUnit::Week => date.timestamp_millis().div_euclid(WEEK as i64),
            TimeUnit::Month => date.month0() as i64,
            TimeUnit::Year => date.year() as i64,
        }
    }

    pub fn floor(&self, ms: f64) -> f64 {
        let Some(mut date) = to_date(ms).and_then(|d| self.floor_unit(d)) else {
            return ms;
        };
        while self.field(date) % self.step != 0 {
            match self.offset_unit(date, -1) {
                Some(previous) => date = previous,
                None => break,
            }
        }
        date.timestamp_millis() as f64
    }

    pub fn ceil(&self, ms: f64) -> f64 {
        let Some(mut date) = to_date(ms).and_then(|d| self.floor_unit(d)) else {
            return ms;
        };
        if (date.timestamp_millis() as f64) < ms {
            if let Some(next) = self.offset_unit(date, 1) {
                date = next;
            }
        }
        while self.field(date) % self.step != 0 {
            match self.offset_unit(date, 1) {
                Some(next) => date = next,
                None => break,
            }
        }
        date.timestamp_millis() as f64
    }

    /// Boundaries within `[start, stop]`.
    pub fn range(&self, start: f64, stop: f64) -> Vec<f64> {
        let mut out = Vec::new();
        let mut current = to_date(self.ceil(start));
        while let Some(date) = current {
            let ms = date.timestamp_millis() as f64;
            if ms > stop || out.len() > 10_000 {
                break;
            }
            if self.field(date) % self.step == 0 {
                out.push(ms);
            }
            let stride = match self.unit {
                TimeUnit::Millisecond | TimeUnit::Year => self.step,
                _ => 1,
            };
            current = self.offset_unit(date, stride);
        }
        out
    }
}

pub fn time_ticks(start: f64, stop: f64, count: f64) -> Vec<f64> {
    let reverse = stop < start;
    let (lo, hi) = if reverse { (stop, start) } else { (start, stop) };
    let mut out = TimeInterval::for_span(lo, hi, count).range(lo, hi);
    if reverse {
        out.reverse();
    }
    out
}

/// Multi-scale label: the coarsest unit at which the instant is not a boundary.
pub fn time_tick_label(date: &DateTime<Utc>) -> String {
    let pattern = if date.timestamp_subsec_millis() != 0 {
        ".%L"
    } else if date.second() != 0 {
        ":%S"
    } else if date.minute() != 0 {
        "%I:%M"
    } else if date.hour() != 0 {
        "%I %p"
    } else if date.day() != 1 {
        if date.weekday().num_days_from_sunday() != 0 {
            "%a %d"
        } else {
            "%b %d"
        }
    } else if date.month() != 1 {
        "%B"
    } else {
        "%Y"
    };
    DateFormat::new(pattern).format(date, true)
}

/// How an axis turns tick values into label text.
#[derive(Debug, Clone)]
pub enum TickLabels {
    Number(NumberFormat),
    /// Log scales label only ticks near a power of the base.
    Log { format: NumberFormat, base: f64, limit: f64, reflect: bool },
    Time,
    Date(DateFormat),
    Text,
}

impl TickLabels {
    pub fn label(&self, value: &Value) -> String {
        match self {
            TickLabels::Number(format) => format.format(value.to_number()),
            TickLabels::Log { format, base, limit, reflect } => {
                let d = value.to_number();
                let exponent = log_base(*base, if *reflect { -d } else { d }).round();
                let power = pow_base(*base, exponent);
                let mut i = d / if *reflect { -power } else { power };
                if i * base < base - 0.5 {
                    i *= base;
                }
                if i <= *limit {
                    format.format(d)
                } else {
                    String::new()
                }
            }
            TickLabels::Time => match value.to_date() {
                Some(date) => time_tick_label(&date),
                None => value.to_output(),
            },
            TickLabels::Date(format) => match value.to_date() {
                Some(date) => format.format(&date, true),
                None => value.to_output(),
            },
            TickLabels::Text => match value {
                Value::Number(n) => js_number_string(*n),
                other => other.to_output(),
            },
        }
    }
}

pub fn log_base(base: f64, x: f64) -> f64 {
    if base == 10.0 {
        x.log10()
    } else if base == 2.0 {
        x.log2()
    } else if base == std::f64::consts::E {
        x.ln()
    } else {
        x.ln() / base.ln()
    }
}

pub fn pow_base(base: f64, x: f64) -> f64 {
    if base == 10.0 && x.is_finite() && x.fract() == 0.0 {
        return format!("1e{}", x as i64).parse().unwrap_or(f64::NAN);
    }
    if base == std::f64::consts::E {
        x.exp()
    } else {
        base.powf(x)
    }
}
