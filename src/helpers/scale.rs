// Scales: map data values onto visual ranges
//
// Each scale kind is a closed variant with a fixed method vocabulary. Methods
// called with arguments configure the scale; without arguments they read the
// current setting.

use super::format::{FormatSpec, NumberFormat};
use super::interpolate::{interpolate, piecewise};
use super::time_format::DateFormat;
use super::ticks::{
    log_base, nice_linear, nice_with, pow_base, tick_count, tick_format, ticks, time_ticks,
    TickCountError, TickLabels, TimeInterval, MAX_TICK_COUNT,
};
use super::value::Value;
use chrono::{TimeZone, Utc};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScaleError {
    #[error("Method {method} is not supported by {kind} scale")]
    Unsupported { method: &'static str, kind: &'static str },

    #[error(transparent)]
    TickCount(#[from] TickCountError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScaleKind {
    Linear,
    Log,
    Pow,
    Radial,
    Time,
    Sequential,
    Diverging,
    Quantize,
    Threshold,
    Band,
    Point,
    Ordinal,
}

impl ScaleKind {
    pub const ALL: [ScaleKind; 12] = [
        ScaleKind::Linear,
        ScaleKind::Log,
        ScaleKind::Pow,
        ScaleKind::Radial,
        ScaleKind::Time,
        ScaleKind::Sequential,
        ScaleKind::Diverging,
        ScaleKind::Quantize,
        ScaleKind::Threshold,
        ScaleKind::Band,
        ScaleKind::Point,
        ScaleKind::Ordinal,
    ];

    /// Name of the constructor helper (`scaleLinear`, ...).
    pub fn helper_name(self) -> &'static str {
        match self {
            ScaleKind::Linear => "scaleLinear",
            ScaleKind::Log => "scaleLog",
            ScaleKind::Pow => "scalePow",
            ScaleKind::Radial => "scaleRadial",
            ScaleKind::Time => "scaleTime",
            ScaleKind::Sequential => "scaleSequential",
            ScaleKind::Diverging => "scaleDiverging",
            ScaleKind::Quantize => "scaleQuantize",
            ScaleKind::Threshold => "scaleThreshold",
            ScaleKind::Band => "scaleBand",
            ScaleKind::Point => "scalePoint",
            ScaleKind::Ordinal => "scaleOrdinal",
        }
    }

    pub fn from_helper_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.helper_name() == name)
    }

    pub fn label(self) -> &'static str {
        match self {
            ScaleKind::Linear => "linear",
            ScaleKind::Log => "log",
            ScaleKind::Pow => "pow",
            ScaleKind::Radial => "radial",
            ScaleKind::Time => "time",
            ScaleKind::Sequential => "sequential",
            ScaleKind::Diverging => "diverging",
            ScaleKind::Quantize => "quantize",
            ScaleKind::Threshold => "threshold",
            ScaleKind::Band => "band",
            ScaleKind::Point => "point",
            ScaleKind::Ordinal => "ordinal",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScaleMethod {
    Domain,
    Range,
    RangeRound,
    Clamp,
    Nice,
    Ticks,
    Invert,
    Unknown,
    Base,
    Exponent,
    Padding,
    PaddingInner,
    PaddingOuter,
    Align,
    Round,
    Bandwidth,
    Step,
    Thresholds,
    InvertExtent,
}

impl ScaleMethod {
    pub const ALL: [ScaleMethod; 19] = [
        ScaleMethod::Domain,
        ScaleMethod::Range,
        ScaleMethod::RangeRound,
        ScaleMethod::Clamp,
        ScaleMethod::Nice,
        ScaleMethod::Ticks,
        ScaleMethod::Invert,
        ScaleMethod::Unknown,
        ScaleMethod::Base,
        ScaleMethod::Exponent,
        ScaleMethod::Padding,
        ScaleMethod::PaddingInner,
        ScaleMethod::PaddingOuter,
        ScaleMethod::Align,
        ScaleMethod::Round,
        ScaleMethod::Bandwidth,
        ScaleMethod::Step,
        ScaleMethod::Thresholds,
        ScaleMethod::InvertExtent,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ScaleMethod::Domain => "domain",
            ScaleMethod::Range => "range",
            ScaleMethod::RangeRound => "rangeRound",
            ScaleMethod::Clamp => "clamp",
            ScaleMethod::Nice => "nice",
            ScaleMethod::Ticks => "ticks",
            ScaleMethod::Invert => "invert",
            ScaleMethod::Unknown => "unknown",
            ScaleMethod::Base => "base",
            ScaleMethod::Exponent => "exponent",
            ScaleMethod::Padding => "padding",
            ScaleMethod::PaddingInner => "paddingInner",
            ScaleMethod::PaddingOuter => "paddingOuter",
            ScaleMethod::Align => "align",
            ScaleMethod::Round => "round",
            ScaleMethod::Bandwidth => "bandwidth",
            ScaleMethod::Step => "step",
            ScaleMethod::Thresholds => "thresholds",
            ScaleMethod::InvertExtent => "invertExtent",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|method| method.name() == name)
    }
}

fn numbers(value: &Value) -> Vec<f64> {
    value.as_array().map(|items| items.iter().map(Value::to_number).collect()).unwrap_or_default()
}

fn values(value: &Value) -> Vec<Value> {
    value.as_array().map(<[Value]>::to_vec).unwrap_or_default()
}

fn number_array(items: &[f64]) -> Value {
    Value::Array(items.iter().map(|n| Value::Number(*n)).collect())
}

fn normalize(a: f64, b: f64, x: f64) -> f64 {
    let span = b - a;
    if span != 0.0 {
        (x - a) / span
    } else if span.is_nan() {
        f64::NAN
    } else {
        0.5
    }
}

fn extent(items: &[f64]) -> (f64, f64) {
    items.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(*v), hi.max(*v)))
}

fn first_arg(args: &[Value]) -> Option<&Value> {
    args.first()
}

fn count_arg(args: &[Value]) -> Result<f64, ScaleError> {
    Ok(tick_count(args.first())?)
}

fn date_value(ms: f64) -> Value {
    Utc.timestamp_millis_opt(ms as i64).single().map(Value::Date).unwrap_or(Value::Null)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Transform {
    Identity,
    Log { base: f64 },
    Pow { exponent: f64 },
    Radial,
    Time,
}

/// Linear, log, pow, radial and time scales.
#[derive(Debug, Clone, PartialEq)]
pub struct Continuous {
    transform: Transform,
    domain: Vec<f64>,
    range: Vec<Value>,
    clamp: bool,
    round: bool,
    unknown: Value,
}

impl Continuous {
    fn new(transform: Transform) -> Self {
        let domain = match transform {
            Transform::Log { .. } => vec![1.0, 10.0],
            Transform::Time => vec![946_684_800_000.0, 946_771_200_000.0],
            _ => vec![0.0, 1.0],
        };
        Self {
            transform,
            domain,
            range: vec![Value::Number(0.0), Value::Number(1.0)],
            clamp: false,
            round: false,
            unknown: Value::Undefined,
        }
    }

    fn reflect(&self) -> bool {
        matches!(self.transform, Transform::Log { .. })
            && self.domain.first().is_some_and(|d| *d < 0.0)
    }

    fn forward(&self, x: f64) -> f64 {
        match self.transform {
            Transform::Log { .. } if self.reflect() => -(-x).ln(),
            Transform::Log { .. } => x.ln(),
            Transform::Pow { exponent } => x.signum() * x.abs().powf(exponent),
            _ => x,
        }
    }

    fn backward(&self, y: f64) -> f64 {
        match self.transform {
            Transform::Log { .. } if self.reflect() => -(-y).exp(),
            Transform::Log { .. } => y.exp(),
            Transform::Pow { exponent } => y.signum() * y.abs().powf(1.0 / exponent),
            _ => y,
        }
    }

    fn input(&self, value: &Value) -> f64 {
        match self.transform {
            Transform::Time => value
                .to_date()
                .map(|d| d.timestamp_millis() as f64)
                .unwrap_or(f64::NAN),
            _ => value.to_number(),
        }
    }

    fn domain_value(&self, x: f64) -> Value {
        match self.transform {
            Transform::Time => date_value(x),
            _ => Value::Number(x),
        }
    }

    fn set_domain(&mut self, value: &Value) {
        self.domain = match value.as_array() {
            Some(items) => items.iter().map(|v| self.input(v)).collect(),
            None => Vec::new(),
        };
    }

    /// Range stops in interpolation space (radial scales interpolate squares).
    fn range_stops(&self) -> Vec<Value> {
        match self.transform {
            Transform::Radial => self
                .range
                .iter()
                .map(|v| {
                    let r = v.to_number();
                    Value::Number(r.signum() * r * r)
                })
                .collect(),
            _ => self.range.clone(),
        }
    }

    pub fn apply(&self, value: &Value) -> Value {
        let x = self.input(value);
        let n = self.domain.len().min(self.range.len());
        if x.is_nan() || n < 2 {
            return self.unknown.clone();
        }
        let x = if self.clamp {
            let (lo, hi) = extent(&self.domain[..n]);
            x.clamp(lo, hi)
        } else {
            x
        };
        let mut d: Vec<f64> = self.domain[..n].iter().map(|v| self.forward(*v)).collect();
        let mut r = self.range_stops()[..n].to_vec();
        if d[n - 1] < d[0] {
            d.reverse();
            r.reverse();
        }
        let tx = self.forward(x);
        let i = d[1..n - 1].iter().filter(|v| **v <= tx).count();
        let t = normalize(d[i], d[i + 1], tx);
        let mut y = interpolate(&r[i], &r[i + 1], t);
        if let (Transform::Radial, Value::Number(squared)) = (self.transform, &y) {
            y = Value::Number(squared.signum() * squared.abs().sqrt());
        }
        match y {
            Value::Number(n) if self.round => Value::Number(n.round()),
            other => other,
        }
    }

    pub fn invert(&self, y: f64) -> f64 {
        let n = self.domain.len().min(self.range.len());
        if y.is_nan() || n < 2 {
            return f64::NAN;
        }
        let y = match self.transform {
            Transform::Radial => y.signum() * y * y,
            _ => y,
        };
        let mut r: Vec<f64> = self.range_stops()[..n].iter().map(Value::to_number).collect();
        let mut d: Vec<f64> = self.domain[..n].iter().map(|v| self.forward(*v)).collect();
        if r[n - 1] < r[0] {
            r.reverse();
            d.reverse();
        }
        let i = r[1..n - 1].iter().filter(|v| **v <= y).count();
        let t = normalize(r[i], r[i + 1], y);
        let x = self.backward(d[i] * (1.0 - t) + d[i + 1] * t);
        if self.clamp {
            let (lo, hi) = extent(&self.domain[..n]);
            x.clamp(lo, hi)
        } else {
            x
        }
    }

    fn ends(&self) -> Option<(f64, f64)> {
        match (self.domain.first(), self.domain.last()) {
            (Some(a), Some(b)) => Some((*a, *b)),
            _ => None,
        }
    }

    pub fn ticks(&self, count: f64) -> Vec<f64> {
        let Some((start, stop)) = self.ends() else {
            return Vec::new();
        };
        match self.transform {
            Transform::Log { base } => self.log_ticks(base, start, stop, count),
            Transform::Time => time_ticks(start, stop, count),
            _ => ticks(start, stop, count),
        }
    }

    fn log_ticks(&self, base: f64, start: f64, stop: f64, count: f64) -> Vec<f64> {
        let reflect = self.reflect();
        let logs = |x: f64| if reflect { -log_base(base, -x) } else { log_base(base, x) };
        let pows = |x: f64| if reflect { -pow_base(base, -x) } else { pow_base(base, x) };
        let (mut u, mut v) = (start, stop);
        let reverse = v < u;
        if reverse {
            std::mem::swap(&mut u, &mut v);
        }
        let (mut i, mut j) = (logs(u), logs(v));
        let mut z = Vec::new();
        // One candidate per mantissa and decade
        let candidates = (j.ceil() - i.floor() + 1.0) * base;
        if base.fract() == 0.0 && j - i < count && candidates <= MAX_TICK_COUNT {
            i = i.floor();
            j = j.ceil();
            let top = base as i64;
            let mut e = i;
            while e <= j {
                let mantissas: Vec<i64> = if u > 0.0 { (1..top).collect() } else { (1..top).rev().collect() };
                for k in mantissas {
                    let k = k as f64;
                    let t = if (u > 0.0 && e < 0.0) || (u <= 0.0 && e > 0.0) {
                        k / pows(-e)
                    } else {
                        k * pows(e)
                    };
                    if t < u {
                        continue;
                    }
                    if t > v {
                        break;
                    }
                    z.push(t);
                }
                e += 1.0;
            }
            if (z.len() as f64) * 2.0 < count {
                z = ticks(u, v, count);
            }
        } else {
            z = ticks(i, j, (j - i).min(count)).into_iter().map(pows).collect();
        }
        if reverse {
            z.reverse();
        }
        z
    }

    pub fn nice(&mut self, count: f64) {
        match self.transform {
            Transform::Log { base } => {
                let reflect = self.reflect();
                let logs = move |x: f64| if reflect { -log_base(base, -x) } else { log_base(base, x) };
                let pows = move |x: f64| if reflect { -pow_base(base, -x) } else { pow_base(base, x) };
                nice_with(&mut self.domain, |x| pows(logs(x).floor()), |x| pows(logs(x).ceil()));
            }
            Transform::Time => {
                if let Some((start, stop)) = self.ends() {
                    let interval = TimeInterval::for_span(start.min(stop), start.max(stop), count);
                    nice_with(&mut self.domain, |x| interval.floor(x), |x| interval.ceil(x));
                }
            }
            _ => nice_linear(&mut self.domain, count),
        }
    }

    pub fn tick_labels(&self, count: f64, specifier: Option<&str>) -> TickLabels {
        let Some((start, stop)) = self.ends() else {
            return TickLabels::Text;
        };
        match self.transform {
            Transform::Time => match specifier {
                Some(pattern) => TickLabels::Date(DateFormat::new(pattern)),
                None => TickLabels::Time,
            },
            Transform::Log { base } => {
                let default = if base == 10.0 { "s" } else { "," };
                let mut spec = specifier
                    .unwrap_or(default)
                    .parse::<FormatSpec>()
                    .unwrap_or_default();
                if base.fract() == 0.0 && spec.precision.is_none() {
                    spec.trim = true;
                }
                let produced = self.ticks(10.0).len().max(1) as f64;
                TickLabels::Log {
                    format: NumberFormat::from_spec(spec),
                    base,
                    limit: (base * count / produced).max(1.0),
                    reflect: self.reflect(),
                }
            }
            _ => TickLabels::Number(tick_format(start, stop, count, specifier)),
        }
    }

    fn call(&mut self, kind: ScaleKind, method: ScaleMethod, args: &[Value]) -> Result<Value, ScaleError> {
        let arg = first_arg(args);
        match (method, arg) {
            (ScaleMethod::Domain, Some(v)) => self.set_domain(v),
            (ScaleMethod::Domain, None) => {
                return Ok(Value::Array(self.domain.iter().map(|x| self.domain_value(*x)).collect()))
            }
            (ScaleMethod::Range, Some(v)) => self.range = values(v),
            (ScaleMethod::Range, None) => return Ok(Value::Array(self.range.clone())),
            (ScaleMethod::RangeRound, Some(v)) => {
                self.range = values(v);
                self.round = true;
            }
            (ScaleMethod::Clamp, Some(v)) => self.clamp = v.is_truthy(),
            (ScaleMethod::Clamp, None) => return Ok(Value::Bool(self.clamp)),
            (ScaleMethod::Round, Some(v)) => self.round = v.is_truthy(),
            (ScaleMethod::Round, None) => return Ok(Value::Bool(self.round)),
            (ScaleMethod::Unknown, Some(v)) => self.unknown = v.clone(),
            (ScaleMethod::Unknown, None) => return Ok(self.unknown.clone()),
            (ScaleMethod::Nice, _) => self.nice(count_arg(args)?),
            (ScaleMethod::Ticks, _) => {
                let out = self.ticks(count_arg(args)?);
                return Ok(Value::Array(out.into_iter().map(|x| self.domain_value(x)).collect()));
            }
            (ScaleMethod::Invert, Some(v)) => return Ok(self.domain_value(self.invert(v.to_number()))),
            (ScaleMethod::Base, arg) => match &mut self.transform {
                Transform::Log { base } => match arg {
                    Some(v) => *base = v.to_number(),
                    None => return Ok(Value::Number(*base)),
                },
                _ => return Err(unsupported(method, kind)),
            },
            (ScaleMethod::Exponent, arg) => match &mut self.transform {
                Transform::Pow { exponent } => match arg {
                    Some(v) => *exponent = v.to_number(),
                    None => return Ok(Value::Number(*exponent)),
                },
                _ => return Err(unsupported(method, kind)),
            },
            _ => return Err(unsupported(method, kind)),
        }
        Ok(Value::Undefined)
    }
}

/// Sequential and diverging scales: domain onto `[0, 1]`, then through the range stops.
#[derive(Debug, Clone, PartialEq)]
pub struct Sequential {
    domain: Vec<f64>,
    range: Vec<Value>,
    clamp: bool,
    unknown: Value,
}

impl Sequential {
    fn new(diverging: bool) -> Self {
        let domain = if diverging { vec![0.0, 0.5, 1.0] } else { vec![0.0, 1.0] };
        Self {
            domain,
            range: vec![Value::Number(0.0), Value::Number(1.0)],
            clamp: false,
            unknown: Value::Undefined,
        }
    }

    fn position(&self, x: f64) -> f64 {
        let t = match self.domain.as_slice() {
            [x0, x1, x2] => {
                let k10 = if x0 == x1 { 0.0 } else { 0.5 / (x1 - x0) };
                let k21 = if x1 == x2 { 0.0 } else { 0.5 / (x2 - x1) };
                let sign = if x2 < x0 { -1.0 } else { 1.0 };
                0.5 + (x - x1) * if sign * x < sign * x1 { k10 } else { k21 }
            }
            [x0, .., x1] => {
                let k10 = if x0 == x1 { 0.0 } else { 1.0 / (x1 - x0) };
                (x - x0) * k10
            }
            _ => f64::NAN,
        };
        if self.clamp {
            t.clamp(0.0, 1.0)
        } else {
            t
        }
    }

    pub fn apply(&self, value: &Value) -> Value {
        let x = value.to_number();
        if x.is_nan() {
            return self.unknown.clone();
        }
        let t = self.position(x);
        if t.is_nan() {
            return self.unknown.clone();
        }
        piecewise(&self.range, t)
    }

    fn ends(&self) -> Option<(f64, f64)> {
        match (self.domain.first(), self.domain.last()) {
            (Some(a), Some(b)) => Some((*a, *b)),
            _ => None,
        }
    }

    fn call(&mut self, kind: ScaleKind, method: ScaleMethod, args: &[Value]) -> Result<Value, ScaleError> {
        match (method, first_arg(args)) {
            (ScaleMethod::Domain, Some(v)) => self.domain = numbers(v),
            (ScaleMethod::Domain, None) => return Ok(number_array(&self.domain)),
            (ScaleMethod::Range, Some(v)) => self.range = values(v),
            (ScaleMethod::Range, None) => return Ok(Value::Array(self.range.clone())),
            (ScaleMethod::Clamp, Some(v)) => self.clamp = v.is_truthy(),
            (ScaleMethod::Clamp, None) => return Ok(Value::Bool(self.clamp)),
            (ScaleMethod::Unknown, Some(v)) => self.unknown = v.clone(),
            (ScaleMethod::Unknown, None) => return Ok(self.unknown.clone()),
            (ScaleMethod::Nice, _) => nice_linear(&mut self.domain, count_arg(args)?),
            (ScaleMethod::Ticks, _) => {
                let out = self.ends().map(|(a, b)| Ok::<_, ScaleError>(ticks(a, b, count_arg(args)?))).transpose()?.unwrap_or_default();
                return Ok(number_array(&out));
            }
            _ => return Err(unsupported(method, kind)),
        }
        Ok(Value::Undefined)
    }
}

/// Continuous domain split into equal segments, one per range value.
#[derive(Debug, Clone, PartialEq)]
pub struct Quantize {
    x0: f64,
    x1: f64,
    range: Vec<Value>,
    thresholds: Vec<f64>,
    unknown: Value,
}

impl Quantize {
    fn new() -> Self {
        let mut scale = Self {
            x0: 0.0,
            x1: 1.0,
            range: vec![Value::Number(0.0), Value::Number(1.0)],
            thresholds: Vec::new(),
            unknown: Value::Undefined,
        };
        scale.rescale();
        scale
    }

    fn rescale(&mut self) {
        let n = self.range.len().saturating_sub(1);
        let (x0, x1) = (self.x0, self.x1);
        self.thresholds = (0..n)
            .map(|i| {
                let i = i as f64;
                let n = n as f64;
                ((i + 1.0) * x1 - (i - n) * x0) / (n + 1.0)
            })
            .collect();
    }

    pub fn apply(&self, value: &Value) -> Value {
        let x = value.to_number();
        if x.is_nan() {
            return self.unknown.clone();
        }
        let i = self.thresholds.iter().filter(|t| **t <= x).count();
        self.range.get(i).cloned().unwrap_or_else(|| self.unknown.clone())
    }

    fn invert_extent(&self, y: &Value) -> Value {
        let n = self.thresholds.len();
        let Some(i) = self.range.iter().position(|r| r.strict_eq(y)) else {
            return number_array(&[f64::NAN, f64::NAN]);
        };
        let (a, b) = if i < 1 {
            (self.x0, self.thresholds.first().copied().unwrap_or(self.x1))
        } else if i >= n {
            (self.thresholds.get(n.wrapping_sub(1)).copied().unwrap_or(self.x0), self.x1)
        } else {
            (self.thresholds[i - 1], self.thresholds[i])
        };
        number_array(&[a, b])
    }

    fn call(&mut self, kind: ScaleKind, method: ScaleMethod, args: &[Value]) -> Result<Value, ScaleError> {
        match (method, first_arg(args)) {
            (ScaleMethod::Domain, Some(v)) => {
                if let [x0, x1] = numbers(v)[..] {
                    self.x0 = x0;
                    self.x1 = x1;
                }
                self.rescale();
            }
            (ScaleMethod::Domain, None) => return Ok(number_array(&[self.x0, self.x1])),
            (ScaleMethod::Range, Some(v)) => {
                self.range = values(v);
                self.rescale();
            }
            (ScaleMethod::Range, None) => return Ok(Value::Array(self.range.clone())),
            (ScaleMethod::Unknown, Some(v)) => self.unknown = v.clone(),
            (ScaleMethod::Unknown, None) => return Ok(self.unknown.clone()),
            (ScaleMethod::Thresholds, _) => return Ok(number_array(&self.thresholds)),
            (ScaleMethod::InvertExtent, Some(v)) => return Ok(self.invert_extent(v)),
            (ScaleMethod::Nice, _) => {
                let mut domain = [self.x0, self.x1];
                nice_linear(&mut domain, count_arg(args)?);
                self.x0 = domain[0];
                self.x1 = domain[1];
                self.rescale();
            }
            (ScaleMethod::Ticks, _) => return Ok(number_array(&ticks(self.x0, self.x1, count_arg(args)?))),
            _ => return Err(unsupported(method, kind)),
        }
        Ok(Value::Undefined)
    }
}

/// Arbitrary thresholds splitting the domain.
#[derive(Debug, Clone, PartialEq)]
pub struct Threshold {
    domain: Vec<f64>,
    range: Vec<Value>,
    unknown: Value,
}

impl Threshold {
    fn new() -> Self {
        Self {
            domain: vec![0.5],
            range: vec![Value::Number(0.0), Value::Number(1.0)],
            unknown: Value::Undefined,
        }
    }

    pub fn apply(&self, value: &Value) -> Value {
        let x = value.to_number();
        if x.is_nan() {
            return self.unknown.clone();
        }
        let n = self.domain.len().min(self.range.len().saturating_sub(1));
        let i = self.domain[..n].iter().filter(|t| **t <= x).count();
        self.range.get(i).cloned().unwrap_or_else(|| self.unknown.clone())
    }

    fn call(&mut self, kind: ScaleKind, method: ScaleMethod, args: &[Value]) -> Result<Value, ScaleError> {
        match (method, first_arg(args)) {
            (ScaleMethod::Domain, Some(v)) => self.domain = numbers(v),
            (ScaleMethod::Domain, None) => return Ok(number_array(&self.domain)),
            (ScaleMethod::Range, Some(v)) => self.range = values(v),
            (ScaleMethod::Range, None) => return Ok(Value::Array(self.range.clone())),
            (ScaleMethod::Unknown, Some(v)) => self.unknown = v.clone(),
            (ScaleMethod::Unknown, None) => return Ok(self.unknown.clone()),
            (ScaleMethod::InvertExtent, Some(y)) => {
                let bound = |i: Option<usize>| {
                    i.and_then(|i| self.domain.get(i)).map(|d| Value::Number(*d)).unwrap_or_default()
                };
                let i = self.range.iter().position(|r| r.strict_eq(y));
                return Ok(Value::Array(vec![
                    bound(i.and_then(|i| i.checked_sub(1))),
                    bound(i),
                ]));
            }
            _ => return Err(unsupported(method, kind)),
        }
        Ok(Value::Undefined)
    }
}

/// Band and point scales: discrete domain onto evenly spaced positions.
#[derive(Debug, Clone, PartialEq)]
pub struct Band {
    domain: Vec<Value>,
    range: (f64, f64),
    padding_inner: f64,
    padding_outer: f64,
    align: f64,
    round: bool,
    point: bool,
    step: f64,
    bandwidth: f64,
    positions: Vec<f64>,
}

impl Band {
    fn new(point: bool) -> Self {
        let mut scale = Self {
            domain: Vec::new(),
            range: (0.0, 1.0),
            padding_inner: if point { 1.0 } else { 0.0 },
            padding_outer: 0.0,
            align: 0.5,
            round: false,
            point,
            step: 0.0,
            bandwidth: 0.0,
            positions: Vec::new(),
        };
        scale.rescale();
        scale
    }

    fn set_domain(&mut self, value: &Value) {
        self.domain.clear();
        for item in values(value) {
            if !self.domain.iter().any(|d| d.strict_eq(&item)) {
                self.domain.push(item);
            }
        }
    }

    fn rescale(&mut self) {
        let n = self.domain.len() as f64;
        let (r0, r1) = self.range;
        let reverse = r1 < r0;
        let (mut start, stop) = if reverse { (r1, r0) } else { (r0, r1) };
        let mut step = (stop - start) / (n - self.padding_inner + self.padding_outer * 2.0).max(1.0);
        if self.round {
            step = step.floor();
        }
        start += (stop - start - step * (n - self.padding_inner)) * self.align;
        let mut bandwidth = step * (1.0 - self.padding_inner);
        if self.round {
            start = start.round();
            bandwidth = bandwidth.round();
        }
        self.step = step;
        self.bandwidth = bandwidth;
        self.positions = (0..self.domain.len()).map(|i| start + step * i as f64).collect();
        if reverse {
            self.positions.reverse();
        }
    }

    pub fn apply(&self, value: &Value) -> Value {
        self.domain
            .iter()
            .position(|d| d.strict_eq(value))
            .and_then(|i| self.positions.get(i))
            .map(|x| Value::Number(*x))
            .unwrap_or_default()
    }

    pub fn bandwidth(&self) -> f64 {
        self.bandwidth
    }

    fn set_range(&mut self, value: &Value) {
        if let [r0, r1] = numbers(value)[..] {
            self.range = (r0, r1);
        }
    }

    fn call(&mut self, kind: ScaleKind, method: ScaleMethod, args: &[Value]) -> Result<Value, ScaleError> {
        match (method, first_arg(args)) {
            (ScaleMethod::Domain, Some(v)) => self.set_domain(v),
            (ScaleMethod::Domain, None) => return Ok(Value::Array(self.domain.clone())),
            (ScaleMethod::Range, Some(v)) => self.set_range(v),
            (ScaleMethod::Range, None) => return Ok(number_array(&[self.range.0, self.range.1])),
            (ScaleMethod::RangeRound, Some(v)) => {
                self.set_range(v);
                self.round = true;
            }
            (ScaleMethod::Round, Some(v)) => self.round = v.is_truthy(),
            (ScaleMethod::Round, None) => return Ok(Value::Bool(self.round)),
            (ScaleMethod::Align, Some(v)) => self.align = v.to_number().clamp(0.0, 1.0),
            (ScaleMethod::Align, None) => return Ok(Value::Number(self.align)),
            (ScaleMethod::Padding, Some(v)) => {
                let p = v.to_number();
                if !self.point {
                    self.padding_inner = p.min(1.0);
                }
                self.padding_outer = p;
            }
            (ScaleMethod::Padding, None) if self.point => return Ok(Value::Number(self.padding_outer)),
            (ScaleMethod::Padding, None) => return Ok(Value::Number(self.padding_inner)),
            (ScaleMethod::PaddingInner, Some(v)) if !self.point => self.padding_inner = v.to_number().min(1.0),
            (ScaleMethod::PaddingInner, None) if !self.point => return Ok(Value::Number(self.padding_inner)),
            (ScaleMethod::PaddingOuter, Some(v)) if !self.point => self.padding_outer = v.to_number(),
            (ScaleMethod::PaddingOuter, None) if !self.point => return Ok(Value::Number(self.padding_outer)),
            (ScaleMethod::Bandwidth, _) => return Ok(Value::Number(self.bandwidth)),
            (ScaleMethod::Step, _) => return Ok(Value::Number(self.step)),
            _ => return Err(unsupported(method, kind)),
        }
        self.rescale();
        Ok(Value::Undefined)
    }
}

/// Discrete domain onto a cycled discrete range.
#[derive(Debug, Clone, PartialEq)]
pub struct Ordinal {
    domain: Vec<Value>,
    range: Vec<Value>,
    /// `None` extends the domain with every unseen value.
    unknown: Option<Value>,
}

impl Ordinal {
    fn new() -> Self {
        Self { domain: Vec::new(), range: Vec::new(), unknown: None }
    }

    pub fn apply(&mut self, value: &Value) -> Value {
        let index = match self.domain.iter().position(|d| d.strict_eq(value)) {
            Some(i) => i,
            None => match &self.unknown {
                Some(unknown) => return unknown.clone(),
                None => {
                    self.domain.push(value.clone());
                    self.domain.len() - 1
                }
            },
        };
        if self.range.is_empty() {
            return self.unknown.clone().unwrap_or_default();
        }
        self.range[index % self.range.len()].clone()
    }

    fn call(&mut self, kind: ScaleKind, method: ScaleMethod, args: &[Value]) -> Result<Value, ScaleError> {
        match (method, first_arg(args)) {
            (ScaleMethod::Domain, Some(v)) => {
                self.domain.clear();
                for item in values(v) {
                    if !self.domain.iter().any(|d| d.strict_eq(&item)) {
                        self.domain.push(item);
                    }
                }
            }
            (ScaleMethod::Domain, None) => return Ok(Value::Array(self.domain.clone())),
            (ScaleMethod::Range, Some(v)) => self.range = values(v),
            (ScaleMethod::Range, None) => return Ok(Value::Array(self.range.clone())),
            (ScaleMethod::Unknown, Some(v)) => self.unknown = Some(v.clone()),
            (ScaleMethod::Unknown, None) => return Ok(self.unknown.clone().unwrap_or_default()),
            _ => return Err(unsupported(method, kind)),
        }
        Ok(Value::Undefined)
    }
}

fn unsupported(method: ScaleMethod, kind: ScaleKind) -> ScaleError {
    ScaleError::Unsupported { method: method.name(), kind: kind.label() }
}

#[derive(Debug, Clone, PartialEq)]
enum Inner {
    Continuous(Continuous),
    Sequential(Sequential),
    Quantize(Quantize),
    Threshold(Threshold),
    Band(Band),
    Ordinal(Ordinal),
}

/// A named scale held by the helper registry.
#[derive(Debug, Clone, PartialEq)]
pub struct Scale {
    kind: ScaleKind,
    inner: Inner,
}

impl Scale {
    /// Construct with the kind's defaults, then apply constructor arguments:
    /// one argument sets the range (the domain for sequential and diverging
    /// scales), two set domain then range.
    pub fn new(kind: ScaleKind, args: &[Value]) -> Self {
        let inner = match kind {
            ScaleKind::Linear => Inner::Continuous(Continuous::new(Transform::Identity)),
            ScaleKind::Log => Inner::Continuous(Continuous::new(Transform::Log { base: 10.0 })),
            ScaleKind::Pow => Inner::Continuous(Continuous::new(Transform::Pow { exponent: 1.0 })),
            ScaleKind::Radial => Inner::Continuous(Continuous::new(Transform::Radial)),
            ScaleKind::Time => Inner::Continuous(Continuous::new(Transform::Time)),
            ScaleKind::Sequential => Inner::Sequential(Sequential::new(false)),
            ScaleKind::Diverging => Inner::Sequential(Sequential::new(true)),
            ScaleKind::Quantize => Inner::Quantize(Quantize::new()),
            ScaleKind::Threshold => Inner::Threshold(Threshold::new()),
            ScaleKind::Band => Inner::Band(Band::new(false)),
            ScaleKind::Point => Inner::Band(Band::new(true)),
            ScaleKind::Ordinal => Inner::Ordinal(Ordinal::new()),
        };
        let mut scale = Self { kind, inner };
        let domain_first = matches!(kind, ScaleKind::Sequential | ScaleKind::Diverging);
        match args {
            [] => {}
            [only] if domain_first => scale.configure(ScaleMethod::Domain, std::slice::from_ref(only)),
            [only] => scale.configure(ScaleMethod::Range, std::slice::from_ref(only)),
            [domain, range, ..] => {
                scale.configure(ScaleMethod::Domain, std::slice::from_ref(domain));
                scale.configure(ScaleMethod::Range, std::slice::from_ref(range));
            }
        }
        scale
    }

    pub fn kind(&self) -> ScaleKind {
        self.kind
    }

    fn configure(&mut self, method: ScaleMethod, args: &[Value]) {
        // Domain and range are accepted by every kind.
        let _ = self.call(method, args);
    }

    /// Map a domain value to the range. Ordinal scales may grow their domain.
    pub fn apply(&mut self, value: &Value) -> Value {
        match &mut self.inner {
            Inner::Continuous(s) => s.apply(value),
            Inner::Sequential(s) => s.apply(value),
            Inner::Quantize(s) => s.apply(value),
            Inner::Threshold(s) => s.apply(value),
            Inner::Band(s) => s.apply(value),
            Inner::Ordinal(s) => s.apply(value),
        }
    }

    /// Invoke a named method: a setter when arguments are given, a getter otherwise.
    pub fn call(&mut self, method: ScaleMethod, args: &[Value]) -> Result<Value, ScaleError> {
        let kind = self.kind;
        match &mut self.inner {
            Inner::Continuous(s) => s.call(kind, method, args),
            Inner::Sequential(s) => s.call(kind, method, args),
            Inner::Quantize(s) => s.call(kind, method, args),
            Inner::Threshold(s) => s.call(kind, method, args),
            Inner::Band(s) => s.call(kind, method, args),
            Inner::Ordinal(s) => s.call(kind, method, args),
        }
    }

    /// Values an axis should mark: ticks where the scale has them, otherwise the domain.
    pub fn axis_values(&self, count: f64) -> Vec<Value> {
        match &self.inner {
            Inner::Continuous(s) => s.ticks(count).into_iter().map(|x| s.domain_value(x)).collect(),
            Inner::Sequential(s) => match s.ends() {
                Some((a, b)) => ticks(a, b, count).into_iter().map(Value::Number).collect(),
                None => Vec::new(),
            },
            Inner::Quantize(s) => ticks(s.x0, s.x1, count).into_iter().map(Value::Number).collect(),
            Inner::Threshold(s) => s.domain.iter().map(|d| Value::Number(*d)).collect(),
            Inner::Band(s) => s.domain.clone(),
            Inner::Ordinal(s) => s.domain.clone(),
        }
    }

    pub fn tick_labels(&self, count: f64, specifier: Option<&str>) -> TickLabels {
        match &self.inner {
            Inner::Continuous(s) => s.tick_labels(count, specifier),
            Inner::Sequential(s) => match s.ends() {
                Some((a, b)) => TickLabels::Number(tick_format(a, b, count, specifier)),
                None => TickLabels::Text,
            },
            Inner::Quantize(s) => TickLabels::Number(tick_format(s.x0, s.x1, count, specifier)),
            _ => TickLabels::Text,
        }
    }

    /// Numeric extent of the output range, for drawing an axis line.
    pub fn range_extent(&self) -> (f64, f64) {
        let ends = |items: &[Value]| match (items.first(), items.last()) {
            (Some(a), Some(b)) => (a.to_number(), b.to_number()),
            _ => (0.0, 0.0),
        };
        match &self.inner {
            Inner::Continuous(s) => ends(&s.range),
            Inner::Sequential(s) => ends(&s.range),
            Inner::Quantize(s) => ends(&s.range),
            Inner::Threshold(s) => ends(&s.range),
            Inner::Band(s) => s.range,
            Inner::Ordinal(s) => ends(&s.range),
        }
    }

    pub fn bandwidth(&self) -> f64 {
        match &self.inner {
            Inner::Band(s) => s.bandwidth(),
            _ => 0.0,
        }
    }

    pub fn is_rounded(&self) -> bool {
        match &self.inner {
            Inner::Continuous(s) => s.round,
            Inner::Band(s) => s.round,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn array(items: &[f64]) -> Value {
        number_array(items)
    }

    fn strings(items: &[&str]) -> Value {
        Value::Array(items.iter().map(|s| Value::str(*s)).collect())
    }

    #[test]
    fn test_linear_maps_and_inverts() {
        let mut scale = Scale::new(ScaleKind::Linear, &[array(&[0.0, 100.0]), array(&[0.0, 500.0])]);
        assert_eq!(scale.apply(&Value::Number(20.0)), Value::Number(100.0));
        assert_eq!(scale.call(ScaleMethod::Invert, &[Value::Number(250.0)]), Ok(Value::Number(50.0)));
        assert_eq!(scale.apply(&Value::str("abc")), Value::Undefined);
    }

    #[test]
    fn test_linear_clamp_and_round() {
        let mut scale = Scale::new(ScaleKind::Linear, &[array(&[0.0, 10.0]), array(&[0.0, 3.0])]);
        scale.call(ScaleMethod::Clamp, &[Value::Bool(true)]).unwrap();
        scale.call(ScaleMethod::Round, &[Value::Bool(true)]).unwrap();
        assert_eq!(scale.apply(&Value::Number(20.0)), Value::Number(3.0));
        assert_eq!(scale.apply(&Value::Number(5.0)), Value::Number(2.0));
    }

    #[test]
    fn test_single_argument_sets_range() {
        let mut scale = Scale::new(ScaleKind::Linear, &[array(&[10.0, 20.0])]);
        assert_eq!(scale.apply(&Value::Number(0.5)), Value::Number(15.0));
    }

    #[test]
    fn test_polylinear_and_colors() {
        let mut scale = Scale::new(
            ScaleKind::Linear,
            &[array(&[-1.0, 0.0, 1.0]), strings(&["#ff0000", "#ffffff", "#0000ff"])],
        );
        assert_eq!(scale.apply(&Value::Number(0.0)), Value::str("rgb(255, 255, 255)"));
        assert_eq!(scale.apply(&Value::Number(1.0)), Value::str("rgb(0, 0, 255)"));
    }

    #[test]
    fn test_nice_and_ticks() {
        let mut scale = Scale::new(ScaleKind::Linear, &[array(&[0.2, 9.6]), array(&[0.0, 1.0])]);
        scale.call(ScaleMethod::Nice, &[]).unwrap();
        assert_eq!(scale.call(ScaleMethod::Domain, &[]), Ok(array(&[0.0, 10.0])));
        assert_eq!(scale.call(ScaleMethod::Ticks, &[Value::Number(2.0)]), Ok(array(&[0.0, 5.0, 10.0])));
    }

    #[test]
    fn test_log_scale() {
        let mut scale = Scale::new(ScaleKind::Log, &[array(&[1.0, 1000.0]), array(&[0.0, 3.0])]);
        let y = scale.apply(&Value::Number(100.0)).to_number();
        assert!((y - 2.0).abs() < 1e-9);
        let ticks = scale.call(ScaleMethod::Ticks, &[]).unwrap();
        let ticks = ticks.as_array().unwrap();
        assert_eq!(ticks.first(), Some(&Value::Number(1.0)));
        assert_eq!(ticks.last(), Some(&Value::Number(1000.0)));
        assert_eq!(ticks.len(), 28);
    }

    #[test]
    fn test_log_ticks_with_huge_base_stay_bounded() {
        let mut scale = Scale::new(ScaleKind::Log, &[array(&[1.0, 1e14]), array(&[0.0, 1.0])]);
        scale.call(ScaleMethod::Base, &[Value::Number(1e7)]).unwrap();
        let ticks = scale.call(ScaleMethod::Ticks, &[]).unwrap();
        assert_eq!(ticks.as_array().map(<[Value]>::len), Some(3));
    }

    #[test]
    fn test_tick_count_is_checked() {
        let mut scale = Scale::new(ScaleKind::Linear, &[array(&[0.0, 1.0]), array(&[0.0, 1.0])]);
        let err = scale.call(ScaleMethod::Ticks, &[Value::Number(1e7)]).unwrap_err();
        assert_eq!(err.to_string(), "Invalid tick count 10000000");
        assert!(scale.call(ScaleMethod::Nice, &[Value::Number(f64::INFINITY)]).is_err());
        assert_eq!(scale.call(ScaleMethod::Ticks, &[Value::Null]).unwrap().as_array().map(<[Value]>::len), Some(11));
    }

    #[test]
    fn test_pow_and_radial() {
        let mut pow = Scale::new(ScaleKind::Pow, &[array(&[0.0, 10.0]), array(&[0.0, 100.0])]);
        pow.call(ScaleMethod::Exponent, &[Value::Number(2.0)]).unwrap();
        assert_eq!(pow.apply(&Value::Number(5.0)), Value::Number(25.0));

        let mut radial = Scale::new(ScaleKind::Radial, &[array(&[0.0, 100.0]), array(&[0.0, 10.0])]);
        assert_eq!(radial.apply(&Value::Number(25.0)), Value::Number(5.0));
    }

    #[test]
    fn test_method_not_in_kind_vocabulary() {
        let mut scale = Scale::new(ScaleKind::Linear, &[]);
        assert_eq!(
            scale.call(ScaleMethod::Bandwidth, &[]),
            Err(ScaleError::Unsupported { method: "bandwidth", kind: "linear" })
        );
        assert_eq!(
            scale.call(ScaleMethod::Bandwidth, &[]).unwrap_err().to_string(),
            "Method bandwidth is not supported by linear scale"
        );
    }

    #[test]
    fn test_band_layout() {
        let mut scale = Scale::new(ScaleKind::Band, &[strings(&["a", "b", "c", "d"]), array(&[0.0, 400.0])]);
        assert_eq!(scale.apply(&Value::str("c")), Value::Number(200.0));
        assert_eq!(scale.bandwidth(), 100.0);

        scale.call(ScaleMethod::Padding, &[Value::Number(0.2)]).unwrap();
        let step = scale.call(ScaleMethod::Step, &[]).unwrap().to_number();
        let bandwidth = scale.call(ScaleMethod::Bandwidth, &[]).unwrap().to_number();
        assert!((step - 400.0 / 4.2).abs() < 1e-9);
        assert!((bandwidth - step * 0.8).abs() < 1e-9);
        assert_eq!(scale.apply(&Value::str("missing")), Value::Undefined);
    }

    #[test]
    fn test_point_scale() {
        let mut scale = Scale::new(ScaleKind::Point, &[strings(&["a", "b", "c"]), array(&[0.0, 100.0])]);
        assert_eq!(scale.apply(&Value::str("a")), Value::Number(0.0));
        assert_eq!(scale.apply(&Value::str("b")), Value::Number(50.0));
        assert_eq!(scale.bandwidth(), 0.0);
        assert!(scale.call(ScaleMethod::PaddingInner, &[Value::Number(0.1)]).is_err());
    }

    #[test]
    fn test_ordinal_implicit_domain() {
        let mut scale = Scale::new(ScaleKind::Ordinal, &[strings(&["red", "blue"])]);
        assert_eq!(scale.apply(&Value::str("x")), Value::str("red"));
        assert_eq!(scale.apply(&Value::str("y")), Value::str("blue"));
        assert_eq!(scale.apply(&Value::str("z")), Value::str("red"));
        assert_eq!(scale.apply(&Value::str("x")), Value::str("red"));
        assert_eq!(scale.call(ScaleMethod::Domain, &[]), Ok(strings(&["x", "y", "z"])));
    }

    #[test]
    fn test_ordinal_explicit_unknown() {
        let mut scale = Scale::new(ScaleKind::Ordinal, &[strings(&["a"]), strings(&["red"])]);
        scale.call(ScaleMethod::Unknown, &[Value::str("gray")]).unwrap();
        assert_eq!(scale.apply(&Value::str("b")), Value::str("gray"));
    }

    #[test]
    fn test_quantize_and_threshold() {
        let mut quantize = Scale::new(ScaleKind::Quantize, &[array(&[0.0, 1.0]), strings(&["lo", "mid", "hi"])]);
        assert_eq!(quantize.apply(&Value::Number(0.2)), Value::str("lo"));
        assert_eq!(quantize.apply(&Value::Number(0.5)), Value::str("mid"));
        assert_eq!(quantize.apply(&Value::Number(0.9)), Value::str("hi"));
        let extent = quantize.call(ScaleMethod::InvertExtent, &[Value::str("hi")]).unwrap();
        assert_eq!(extent.get("1"), Value::Number(1.0));

        let mut threshold = Scale::new(ScaleKind::Threshold, &[array(&[0.0, 1.0]), strings(&["neg", "low", "high"])]);
        assert_eq!(threshold.apply(&Value::Number(-1.0)), Value::str("neg"));
        assert_eq!(threshold.apply(&Value::Number(0.5)), Value::str("low"));
        assert_eq!(threshold.apply(&Value::Number(1.0)), Value::str("high"));
    }

    #[test]
    fn test_sequential_and_diverging() {
        let mut sequential = Scale::new(ScaleKind::Sequential, &[array(&[0.0, 100.0]), array(&[0.0, 1.0])]);
        assert_eq!(sequential.apply(&Value::Number(25.0)), Value::Number(0.25));

        let mut diverging = Scale::new(ScaleKind::Diverging, &[array(&[-10.0, 0.0, 30.0]), array(&[0.0, 1.0])]);
        assert_eq!(diverging.apply(&Value::Number(-5.0)), Value::Number(0.25));
        assert_eq!(diverging.apply(&Value::Number(15.0)), Value::Number(0.75));
    }

    #[test]
    fn test_time_scale_domain_roundtrip() {
        let start = Value::str("2024-01-01T00:00:00.000Z");
        let end = Value::str("2024-01-11T00:00:00.000Z");
        let mut scale = Scale::new(
            ScaleKind::Time,
            &[Value::Array(vec![start.clone(), end]), array(&[0.0, 100.0])],
        );
        assert_eq!(scale.apply(&Value::str("2024-01-06T00:00:00.000Z")), Value::Number(50.0));
        let domain = scale.call(ScaleMethod::Domain, &[]).unwrap();
        assert_eq!(domain.get("0").to_js_string(), "2024-01-01T00:00:00.000Z");
        let inverted = scale.call(ScaleMethod::Invert, &[Value::Number(0.0)]).unwrap();
        assert_eq!(inverted, start.to_date().map(Value::Date).unwrap());
    }

    #[test]
    fn test_method_names_roundtrip() {
        for method in ScaleMethod::ALL {
            assert_eq!(ScaleMethod::from_name(method.name()), Some(method));
        }
        assert_eq!(ScaleMethod::from_name("copy"), None);
        assert_eq!(ScaleKind::from_helper_name("scaleBand"), Some(ScaleKind::Band));
    }
}
