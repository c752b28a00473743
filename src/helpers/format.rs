// Number formatting with d3-format specifiers
//
// [[fill]align][sign][symbol][0][width][,][.precision][~][type]

use nom::{
    branch::alt,
    character::complete::{anychar, char, digit1, one_of, satisfy},
    combinator::{all_consuming, map, map_res, opt, verify},
    sequence::{pair, preceded},
    IResult,
};
use super::value::js_number_string;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
#[error("invalid format: {0}")]
pub struct FormatError(pub String);

/// Widest padding a specifier may ask for.
pub const MAX_WIDTH: usize = 1024;

const MINUS: &str = "\u{2212}";
const SI_PREFIXES: [&str; 17] = [
    "y", "z", "a", "f", "p", "n", "\u{b5}", "m", "", "k", "M", "G", "T", "P", "E", "Z", "Y",
];

/// A parsed format specifier.
#[derive(Debug, Clone, PartialEq)]
pub struct FormatSpec {
    pub fill: char,
    pub align: char,
    pub sign: char,
    pub symbol: Option<char>,
    pub zero: bool,
    pub width: Option<usize>,
    pub comma: bool,
    pub precision: Option<usize>,
    pub trim: bool,
    /// `None` for the default type.
    pub kind: Option<char>,
}

impl Default for FormatSpec {
    fn default() -> Self {
        Self {
            fill: ' ',
            align: '>',
            sign: '-',
            symbol: None,
            zero: false,
            width: None,
            comma: false,
            precision: None,
            trim: false,
            kind: None,
        }
    }
}

fn fill_align(input: &str) -> IResult<&str, (Option<char>, char)> {
    alt((
        pair(map(anychar, Some), one_of("<>=^")),
        map(one_of("<>=^"), |align| (None, align)),
    ))(input)
}

fn specifier(input: &str) -> IResult<&str, FormatSpec> {
    let (input, fill_align) = opt(fill_align)(input)?;
    let (input, sign) = opt(one_of("+-( "))(input)?;
    let (input, symbol) = opt(one_of("$#"))(input)?;
    let (input, zero) = opt(char('0'))(input)?;
    let (input, width) = opt(verify(map_res(digit1, str::parse::<usize>), |w: &usize| *w <= MAX_WIDTH))(input)?;
    let (input, comma) = opt(char(','))(input)?;
    let (input, precision) = opt(preceded(char('.'), map_res(digit1, str::parse::<usize>)))(input)?;
    let (input, trim) = opt(char('~'))(input)?;
    let (input, kind) = opt(satisfy(|c| c.is_ascii_alphabetic() || c == '%'))(input)?;

    let defaults = FormatSpec::default();
    let (fill, align) = match fill_align {
        Some((fill, align)) => (fill.unwrap_or(defaults.fill), align),
        None => (defaults.fill, defaults.align),
    };
    Ok((
        input,
        FormatSpec {
            fill,
            align,
            sign: sign.unwrap_or(defaults.sign),
            symbol,
            zero: zero.is_some(),
            width,
            comma: comma.is_some(),
            precision,
            trim: trim.is_some(),
            kind,
        },
    ))
}

impl FromStr for FormatSpec {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        all_consuming(specifier)(s)
            .map(|(_, spec)| spec)
            .map_err(|_| FormatError(s.to_string()))
    }
}

/// A compiled number formatter.
#[derive(Debug, Clone, PartialEq)]
pub struct NumberFormat {
    spec: FormatSpec,
    kind: char,
    precision: usize,
    prefix: String,
    suffix: String,
    maybe_suffix: bool,
    /// Fixed SI scaling `(k, prefix)` used by prefix formats.
    scaled: Option<(f64, &'static str)>,
}

impl NumberFormat {
    pub fn new(specifier: &str) -> Result<Self, FormatError> {
        Ok(Self::from_spec(specifier.parse()?))
    }

    pub fn from_spec(mut spec: FormatSpec) -> Self {
        let mut kind = spec.kind.unwrap_or('\0');
        let mut precision = spec.precision;
        if kind == 'n' {
            spec.comma = true;
            kind = 'g';
        } else if !"%bcdefgoprsXx".contains(kind) {
            if precision.is_none() {
                precision = Some(12);
            }
            spec.trim = true;
            kind = 'g';
        }
        if spec.zero || (spec.fill == '0' && spec.align == '=') {
            spec.zero = true;
            spec.fill = '0';
            spec.align = '=';
        }

        let prefix = match spec.symbol {
            Some('$') => "$".to_string(),
            Some('#') if "boxX".contains(kind) => format!("0{}", kind.to_ascii_lowercase()),
            _ => String::new(),
        };
        let suffix = if spec.symbol != Some('$') && (kind == '%' || kind == 'p') {
            "%".to_string()
        } else {
            String::new()
        };
        let precision = match precision {
            None => 6,
            Some(p) if "gprs".contains(kind) => p.clamp(1, 21),
            Some(p) => p.min(20),
        };

        Self {
            maybe_suffix: "defgprs%".contains(kind),
            spec,
            kind,
            precision,
            prefix,
            suffix,
            scaled: None,
        }
    }

    /// Fixed-point format that scales every value by the SI prefix of `reference`.
    pub fn with_si_prefix(mut spec: FormatSpec, reference: f64) -> Self {
        spec.kind = Some('f');
        let e = (exponent_of(reference).div_euclid(3)).clamp(-8, 8) * 3;
        let mut format = Self::from_spec(spec);
        format.scaled = Some((10f64.powi(-e), SI_PREFIXES[(8 + e / 3) as usize]));
        format
    }

    pub fn format(&self, value: f64) -> String {
        match self.scaled {
            Some((k, prefix)) => format!("{}{}", self.format_unscaled(k * value), prefix),
            None => self.format_unscaled(value),
        }
    }

    fn format_unscaled(&self, value: f64) -> String {
        let spec = &self.spec;
        let mut value_prefix = self.prefix.clone();
        let mut value_suffix = self.suffix.clone();
        let mut body;

        if self.kind == 'c' {
            value_suffix = format!("{}{}", js_number_string(value), value_suffix);
            body = String::new();
        } else {
            let mut negative = value < 0.0 || (value == 0.0 && value.is_sign_negative());
            let mut si_exponent = 0;
            body = if value.is_nan() {
                "NaN".to_string()
            } else {
                let (text, exponent) = format_type(self.kind, value.abs(), self.precision);
                si_exponent = exponent;
                text
            };
            if spec.trim {
                body = trim_insignificant(&body);
            }
            if negative && body.parse::<f64>().map(|v| v == 0.0).unwrap_or(false) && spec.sign != '+' {
                negative = false;
            }
            let sign = if negative {
                if spec.sign == '(' { "(".to_string() } else { MINUS.to_string() }
            } else if spec.sign == '-' || spec.sign == '(' {
                String::new()
            } else {
                spec.sign.to_string()
            };
            value_prefix = format!("{}{}", sign, value_prefix);
            let si = if self.kind == 's' { SI_PREFIXES[(8 + si_exponent / 3) as usize] } else { "" };
            let close = if negative && spec.sign == '(' { ")" } else { "" };
            value_suffix = format!("{}{}{}", si, value_suffix, close);

            if self.maybe_suffix {
                if let Some(i) = body.find(|c: char| !c.is_ascii_digit()) {
                    value_suffix = format!("{}{}", &body[i..], value_suffix);
                    body.truncate(i);
                }
            }
        }

        if spec.comma && !spec.zero {
            body = group(&body, usize::MAX);
        }

        let width = spec.width.unwrap_or(0);
        let length = value_prefix.chars().count() + body.chars().count() + value_suffix.chars().count();
        let mut padding: String = if length < width {
            std::iter::repeat(spec.fill).take(width - length).collect()
        } else {
            String::new()
        };
        if spec.comma && spec.zero {
            let limit = if padding.is_empty() {
                usize::MAX
            } else {
                width.saturating_sub(value_suffix.chars().count())
            };
            body = group(&format!("{}{}", padding, body), limit);
            padding.clear();
        }

        match spec.align {
            '<' => format!("{}{}{}{}", value_prefix, body, value_suffix, padding),
            '=' => format!("{}{}{}{}", value_prefix, padding, body, value_suffix),
            '^' => {
                let half = padding.chars().count() / 2;
                let left: String = padding.chars().take(half).collect();
                let right: String = padding.chars().skip(half).collect();
                format!("{}{}{}{}{}", left, value_prefix, body, value_suffix, right)
            }
            _ => format!("{}{}{}{}", padding, value_prefix, body, value_suffix),
        }
    }
}

/// Formats a non-negative value; also returns the SI exponent chosen by `s`.
fn format_type(kind: char, x: f64, precision: usize) -> (String, i32) {
    let text = match kind {
        '%' => to_fixed(x * 100.0, precision),
        'b' => format!("{:b}", x.round() as u64),
        'o' => format!("{:o}", x.round() as u64),
        'x' => format!("{:x}", x.round() as u64),
        'X' => format!("{:X}", x.round() as u64),
        'd' => js_number_string(x.round()),
        'e' => to_exponential(x, precision),
        'f' => to_fixed(x, precision),
        'g' => to_precision(x, precision),
        'p' => format_rounded(x * 100.0, precision),
        'r' => format_rounded(x, precision),
        's' => return format_prefix_auto(x, precision),
        _ => js_number_string(x),
    };
    (text, 0)
}

/// Rounds half away from zero on the exact decimal expansion.
fn round_significant(x: f64, significant: usize) -> (Vec<u8>, i32) {
    if x == 0.0 {
        return (vec![0; significant.max(1)], 0);
    }
    let exact = format!("{:.*e}", significant + 30, x);
    let (mantissa, exponent) = exact.split_once('e').unwrap_or((&exact, "0"));
    let mut exponent: i32 = exponent.parse().unwrap_or(0);
    let digits: Vec<u8> = mantissa.bytes().filter(u8::is_ascii_digit).map(|b| b - b'0').collect();
    let mut kept = digits[..significant.min(digits.len())].to_vec();
    if digits.get(significant).copied().unwrap_or(0) >= 5 && increment(&mut kept) {
        kept.insert(0, 1);
        kept.pop();
        exponent += 1;
    }
    (kept, exponent)
}

/// Adds one to the last digit; returns true on overflow.
fn increment(digits: &mut [u8]) -> bool {
    for d in digits.iter_mut().rev() {
        if *d == 9 {
            *d = 0;
        } else {
            *d += 1;
            return false;
        }
    }
    true
}

fn digits_to_string(digits: &[u8]) -> String {
    digits.iter().map(|d| char::from(b'0' + d)).collect()
}

/// Shortest digits when `precision` is zero, otherwise `precision` significant digits.
fn decimal_parts(x: f64, precision: usize) -> (String, i32) {
    if precision == 0 {
        let sci = format!("{:e}", x);
        let (mantissa, exponent) = sci.split_once('e').unwrap_or((&sci, "0"));
        (mantissa.replace('.', ""), exponent.parse().unwrap_or(0))
    } else {
        let (digits, exponent) = round_significant(x, precision);
        (digits_to_string(&digits), exponent)
    }
}

/// Decimal exponent of `x`, as in scientific notation.
pub fn exponent_of(x: f64) -> i32 {
    if x == 0.0 || !x.is_finite() {
        return 0;
    }
    decimal_parts(x.abs(), 0).1
}

pub fn to_fixed(x: f64, precision: usize) -> String {
    if x.abs() >= 1e21 || !x.is_finite() {
        return js_number_string(x);
    }
    let exact = format!("{:.*}", precision + 30, x.abs());
    let (int_part, frac_part) = exact.split_once('.').unwrap_or((&exact, ""));
    let mut digits: Vec<u8> = int_part
        .bytes()
        .chain(frac_part.bytes().take(precision))
        .map(|b| b - b'0')
        .collect();
    let next = frac_part.as_bytes().get(precision).map(|b| b - b'0').unwrap_or(0);
    if next >= 5 && increment(&mut digits) {
        digits.insert(0, 1);
    }
    let text = digits_to_string(&digits);
    let split = text.len() - precision;
    let body = if precision == 0 {
        text
    } else {
        format!("{}.{}", &text[..split], &text[split..])
    };
    if x < 0.0 && body.chars().any(|c| c != '0' && c != '.') {
        format!("-{}", body)
    } else {
        body
    }
}

pub fn to_exponential(x: f64, precision: usize) -> String {
    let (digits, exponent) = round_significant(x.abs(), precision + 1);
    let text = digits_to_string(&digits);
    let mantissa = if precision == 0 {
        text
    } else {
        format!("{}.{}", &text[..1], &text[1..])
    };
    let sign = if exponent < 0 { '-' } else { '+' };
    let minus = if x < 0.0 { "-" } else { "" };
    format!("{}{}e{}{}", minus, mantissa, sign, exponent.abs())
}

pub fn to_precision(x: f64, precision: usize) -> String {
    let precision = precision.max(1);
    let (digits, exponent) = round_significant(x.abs(), precision);
    let text = digits_to_string(&digits);
    let minus = if x < 0.0 { "-" } else { "" };
    if exponent < -6 || exponent >= precision as i32 {
        let mantissa = if precision == 1 {
            text
        } else {
            format!("{}.{}", &text[..1], &text[1..])
        };
        let sign = if exponent < 0 { '-' } else { '+' };
        return format!("{}{}e{}{}", minus, mantissa, sign, exponent.abs());
    }
    let body = if exponent >= 0 {
        let point = exponent as usize + 1;
        if point < text.len() {
            format!("{}.{}", &text[..point], &text[point..])
        } else {
            text
        }
    } else {
        format!("0.{}{}", "0".repeat((-exponent - 1) as usize), text)
    };
    format!("{}{}", minus, body)
}

fn format_rounded(x: f64, precision: usize) -> String {
    let (coefficient, exponent) = decimal_parts(x, precision);
    if exponent < 0 {
        format!("0.{}{}", "0".repeat((-exponent - 1) as usize), coefficient)
    } else if coefficient.len() > exponent as usize + 1 {
        let point = exponent as usize + 1;
        format!("{}.{}", &coefficient[..point], &coefficient[point..])
    } else {
        format!("{}{}", coefficient, "0".repeat(exponent as usize + 1 - coefficient.len()))
    }
}

fn format_prefix_auto(x: f64, precision: usize) -> (String, i32) {
    let (coefficient, exponent) = decimal_parts(x, precision);
    let prefix_exponent = exponent.div_euclid(3).clamp(-8, 8) * 3;
    let i = exponent - prefix_exponent + 1;
    let n = coefficient.len() as i32;
    let text = if i == n {
        coefficient
    } else if i > n {
        format!("{}{}", coefficient, "0".repeat((i - n) as usize))
    } else if i > 0 {
        format!("{}.{}", &coefficient[..i as usize], &coefficient[i as usize..])
    } else {
        let (digits, _) = decimal_parts(x, (precision as i32 + i - 1).max(0) as usize);
        format!("0.{}{}", "0".repeat((-i) as usize), digits)
    };
    (text, prefix_exponent)
}

/// Drops insignificant trailing zeros (and a dangling decimal point).
fn trim_insignificant(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut i0: isize = -1;
    let mut i1: isize = 0;
    for (i, c) in chars.iter().enumerate().skip(1) {
        match c {
            '.' => {
                i0 = i as isize;
                i1 = i as isize;
            }
            '0' => {
                if i0 == 0 {
                    i0 = i as isize;
                }
                i1 = i as isize;
            }
            c if c.is_ascii_digit() => {
                if i0 > 0 {
                    i0 = 0;
                }
            }
            _ => break,
        }
    }
    if i0 > 0 {
        let head: String = chars[..i0 as usize].iter().collect();
        let tail: String = chars[(i1 + 1) as usize..].iter().collect();
        format!("{}{}", head, tail)
    } else {
        s.to_string()
    }
}

/// Inserts thousands separators, limiting the grouped text to `width`.
fn group(value: &str, width: usize) -> String {
    let chars: Vec<char> = value.chars().collect();
    let mut i = chars.len() as isize;
    let mut parts = Vec::new();
    let mut length = 0usize;
    let mut g = 3usize;
    while i > 0 && g > 0 {
        if length + g + 1 > width {
            g = width.saturating_sub(length).max(1);
        }
        let end = i;
        i -= g as isize;
        parts.push(chars[i.max(0) as usize..end as usize].iter().collect::<String>());
        length += g + 1;
        if length > width {
            break;
        }
        g = 3;
    }
    parts.reverse();
    parts.join(",")
}

/// Fixed precision for labels spaced `step` apart.
pub fn precision_fixed(step: f64) -> usize {
    (-exponent_of(step.abs())).max(0) as usize
}

/// Precision for SI-prefixed labels spaced `step` apart around magnitude `value`.
pub fn precision_prefix(step: f64, value: f64) -> usize {
    let prefix_exponent = exponent_of(value).div_euclid(3).clamp(-8, 8) * 3;
    (prefix_exponent - exponent_of(step.abs())).max(0) as usize
}

/// Significant digits for labels spaced `step` apart up to `max`.
pub fn precision_round(step: f64, max: f64) -> usize {
    let step = step.abs();
    let max = max.abs() - step;
    (exponent_of(max) - exponent_of(step)).max(0) as usize + 1
}
