// Date formatting with d3-time-format directives

use chrono::{DateTime, Datelike, Local, NaiveDateTime, Timelike, Utc};

const WEEKDAYS: [&str; 7] = ["Sunday", "Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday"];
const MONTHS: [&str; 12] = [
    "January", "February", "March", "April", "May", "June", "July", "August", "September",
    "October", "November", "December",
];

#[derive(Debug, Clone, PartialEq)]
enum Part {
    Literal(String),
    Directive { code: char, pad: Option<char> },
}

/// A compiled date format. Unknown directives are emitted as written.
#[derive(Debug, Clone, PartialEq)]
pub struct DateFormat {
    parts: Vec<Part>,
}

impl DateFormat {
    pub fn new(specifier: &str) -> Self {
        let mut parts = Vec::new();
        let mut literal = String::new();
        let mut chars = specifier.chars().peekable();
        while let Some(c) = chars.next() {
            if c != '%' {
                literal.push(c);
                continue;
            }
            let mut pad = None;
            if let Some(&p) = chars.peek() {
                if p == '-' || p == '_' || p == '0' {
                    pad = Some(p);
                    chars.next();
                }
            }
            match chars.next() {
                Some('%') => literal.push('%'),
                Some(code) => {
                    if !literal.is_empty() {
                        parts.push(Part::Literal(std::mem::take(&mut literal)));
                    }
                    parts.push(Part::Directive { code, pad });
                }
                None => literal.push('%'),
            }
        }
        if !literal.is_empty() {
            parts.push(Part::Literal(literal));
        }
        Self { parts }
    }

    /// Format in UTC, or in the local time zone when `utc` is false.
    pub fn format(&self, date: &DateTime<Utc>, utc: bool) -> String {
        let (naive, offset_seconds) = if utc {
            (date.naive_utc(), 0)
        } else {
            let local = date.with_timezone(&Local);
            (local.naive_local(), local.offset().local_minus_utc())
        };
        let mut out = String::new();
        for part in &self.parts {
            match part {
                Part::Literal(text) => out.push_str(text),
                Part::Directive { code, pad } => {
                    directive(&mut out, *code, *pad, &naive, date, offset_seconds)
                }
            }
        }
        out
    }
}

fn pad(value: i64, fill: Option<char>, default: char, width: usize) -> String {
    let fill = match fill {
        Some('-') => return value.to_string(),
        Some('_') => ' ',
        Some('0') => '0',
        _ => default,
    };
    let sign = if value < 0 { "-" } else { "" };
    let digits = value.abs().to_string();
    let padding: String = std::iter::repeat(fill).take(width.saturating_sub(digits.len())).collect();
    format!("{}{}{}", sign, padding, digits)
}

fn directive(
    out: &mut String,
    code: char,
    fill: Option<char>,
    d: &NaiveDateTime,
    instant: &DateTime<Utc>,
    offset_seconds: i32,
) {
    let weekday = d.weekday().num_days_from_sunday() as usize;
    let yday = d.ordinal0() as i64;
    let hour12 = match d.hour() % 12 {
        0 => 12,
        h => h,
    };
    let text = match code {
        'a' => WEEKDAYS[weekday][..3].to_string(),
        'A' => WEEKDAYS[weekday].to_string(),
        'b' | 'h' => MONTHS[d.month0() as usize][..3].to_string(),
        'B' => MONTHS[d.month0() as usize].to_string(),
        'c' => format!(
            "{}/{}/{}, {}:{}:{} {}",
            d.month(),
            d.day(),
            pad(d.year() as i64, None, '0', 4),
            hour12,
            pad(d.minute() as i64, None, '0', 2),
            pad(d.second() as i64, None, '0', 2),
            if d.hour() < 12 { "AM" } else { "PM" }
        ),
        'd' => pad(d.day() as i64, fill, '0', 2),
        'e' => pad(d.day() as i64, fill, ' ', 2),
        'f' => pad((d.nanosecond() / 1_000) as i64 % 1_000_000, fill, '0', 6),
        'g' => pad(d.iso_week().year() as i64 % 100, fill, '0', 2),
        'G' => pad(d.iso_week().year() as i64, fill, '0', 4),
        'H' => pad(d.hour() as i64, fill, '0', 2),
        'I' => pad(hour12 as i64, fill, '0', 2),
        'j' => pad(yday + 1, fill, '0', 3),
        'L' => pad((d.nanosecond() / 1_000_000) as i64 % 1_000, fill, '0', 3),
        'm' => pad(d.month() as i64, fill, '0', 2),
        'M' => pad(d.minute() as i64, fill, '0', 2),
        'p' => if d.hour() < 12 { "AM" } else { "PM" }.to_string(),
        'q' => (d.month0() / 3 + 1).to_string(),
        'Q' => instant.timestamp_millis().to_string(),
        's' => instant.timestamp().to_string(),
        'S' => pad(d.second() as i64, fill, '0', 2),
        'u' => d.weekday().number_from_monday().to_string(),
        'U' => pad((yday + 7 - weekday as i64) / 7, fill, '0', 2),
        'V' => pad(d.iso_week().week() as i64, fill, '0', 2),
        'w' => weekday.to_string(),
        'W' => pad((yday + 7 - ((weekday as i64 + 6) % 7)) / 7, fill, '0', 2),
        'x' => format!("{}/{}/{}", d.month(), d.day(), pad(d.year() as i64, None, '0', 4)),
        'X' => format!(
            "{}:{}:{} {}",
            hour12,
            pad(d.minute() as i64, None, '0', 2),
            pad(d.second() as i64, None, '0', 2),
            if d.hour() < 12 { "AM" } else { "PM" }
        ),
        'y' => pad(d.year() as i64 % 100, fill, '0', 2),
        'Y' => pad(d.year() as i64, fill, '0', 4),
        'Z' => {
            let minutes = offset_seconds / 60;
            let sign = if minutes < 0 { '-' } else { '+' };
            let minutes = minutes.abs();
            format!("{}{:02}{:02}", sign, minutes / 60, minutes % 60)
        }
        other => {
            out.push('%');
            if let Some(p) = fill {
                out.push(p);
            }
            other.to_string()
        }
    };
    out.push_str(&text);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn date() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 5, 14, 7, 9).unwrap() + chrono::Duration::milliseconds(42)
    }

    #[test]
    fn test_common_directives() {
        let format = DateFormat::new("%Y-%m-%d %H:%M:%S.%L");
        assert_eq!(format.format(&date(), true), "2024-03-05 14:07:09.042");
    }

    #[test]
    fn test_names_and_twelve_hour_clock() {
        let format = DateFormat::new("%a %b %e, %I %p");
        assert_eq!(format.format(&date(), true), "Tue Mar  5, 02 PM");
        assert_eq!(DateFormat::new("%B %A").format(&date(), true), "March Tuesday");
    }

    #[test]
    fn test_padding_modifiers() {
        assert_eq!(DateFormat::new("%-d/%-m").format(&date(), true), "5/3");
        assert_eq!(DateFormat::new("%_m").format(&date(), true), " 3");
    }

    #[test]
    fn test_locale_composites() {
        assert_eq!(DateFormat::new("%x").format(&date(), true), "3/5/2024");
        assert_eq!(DateFormat::new("%X").format(&date(), true), "2:07:09 PM");
    }

    #[test]
    fn test_epoch_quarter_and_zone() {
        assert_eq!(DateFormat::new("Q%q").format(&date(), true), "Q1");
        assert_eq!(DateFormat::new("%s").format(&date(), true), date().timestamp().to_string());
        assert_eq!(DateFormat::new("%Z").format(&date(), true), "+0000");
    }

    #[test]
    fn test_week_numbers() {
        assert_eq!(DateFormat::new("%U %W %V %j").format(&date(), true), "09 10 10 065");
    }

    #[test]
    fn test_literal_percent_and_unknown_directive() {
        assert_eq!(DateFormat::new("100%% %k").format(&date(), true), "100% %k");
    }
}
