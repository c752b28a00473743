// Axes: SVG tick marks and labels for a scale

use super::format::{FormatError, NumberFormat};
use super::scale::Scale;
use super::ticks::{tick_count, TickCountError, TickLabels};
use super::value::{js_number_string, Value};
use handlebars::html_escape;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AxisError {
    #[error(transparent)]
    Format(#[from] FormatError),

    #[error(transparent)]
    TickCount(#[from] TickCountError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orient {
    Top,
    Right,
    Bottom,
    Left,
}

impl Orient {
    pub const ALL: [Orient; 4] = [Orient::Top, Orient::Right, Orient::Bottom, Orient::Left];

    pub fn helper_name(self) -> &'static str {
        match self {
            Orient::Top => "axisTop",
            Orient::Right => "axisRight",
            Orient::Bottom => "axisBottom",
            Orient::Left => "axisLeft",
        }
    }

    pub fn from_helper_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|o| o.helper_name() == name)
    }

    fn is_vertical(self) -> bool {
        matches!(self, Orient::Left | Orient::Right)
    }

    /// Direction ticks point in.
    fn k(self) -> f64 {
        match self {
            Orient::Top | Orient::Left => -1.0,
            Orient::Right | Orient::Bottom => 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisMethod {
    Ticks,
    TickArguments,
    TickValues,
    TickFormat,
    TickSize,
    TickSizeInner,
    TickSizeOuter,
    TickPadding,
    Offset,
}

impl AxisMethod {
    pub const ALL: [AxisMethod; 9] = [
        AxisMethod::Ticks,
        AxisMethod::TickArguments,
        AxisMethod::TickValues,
        AxisMethod::TickFormat,
        AxisMethod::TickSize,
        AxisMethod::TickSizeInner,
        AxisMethod::TickSizeOuter,
        AxisMethod::TickPadding,
        AxisMethod::Offset,
    ];

    pub fn name(self) -> &'static str {
        match self {
            AxisMethod::Ticks => "ticks",
            AxisMethod::TickArguments => "tickArguments",
            AxisMethod::TickValues => "tickValues",
            AxisMethod::TickFormat => "tickFormat",
            AxisMethod::TickSize => "tickSize",
            AxisMethod::TickSizeInner => "tickSizeInner",
            AxisMethod::TickSizeOuter => "tickSizeOuter",
            AxisMethod::TickPadding => "tickPadding",
            AxisMethod::Offset => "offset",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.name() == name)
    }
}

/// An axis bound to a scale by id; the scale is looked up when rendering.
#[derive(Debug, Clone)]
pub struct Axis {
    orient: Orient,
    scale_id: String,
    tick_arguments: Vec<Value>,
    tick_values: Option<Vec<Value>>,
    tick_format: Option<NumberFormat>,
    tick_size_inner: f64,
    tick_size_outer: f64,
    tick_padding: f64,
    offset: f64,
}

impl Axis {
    pub fn new(orient: Orient, scale_id: impl Into<String>) -> Self {
        Self {
            orient,
            scale_id: scale_id.into(),
            tick_arguments: Vec::new(),
            tick_values: None,
            tick_format: None,
            tick_size_inner: 6.0,
            tick_size_outer: 6.0,
            tick_padding: 3.0,
            offset: 0.5,
        }
    }

    pub fn scale_id(&self) -> &str {
        &self.scale_id
    }

    pub fn configure(&mut self, method: AxisMethod, args: &[Value]) -> Result<(), AxisError> {
        let number = |fallback: f64| args.first().map(Value::to_number).unwrap_or(fallback);
        match method {
            AxisMethod::Ticks => {
                tick_count(args.first())?;
                self.tick_arguments = args.to_vec();
            }
            AxisMethod::TickArguments => {
                let arguments = args.first().and_then(Value::as_array).map(<[Value]>::to_vec).unwrap_or_default();
                tick_count(arguments.first())?;
                self.tick_arguments = arguments;
            }
            AxisMethod::TickValues => {
                self.tick_values = args.first().and_then(Value::as_array).map(<[Value]>::to_vec)
            }
            AxisMethod::TickFormat => {
                self.tick_format = match args.first() {
                    Some(Value::String(spec)) => Some(NumberFormat::new(spec)?),
                    _ => None,
                }
            }
            AxisMethod::TickSize => {
                self.tick_size_inner = number(self.tick_size_inner);
                self.tick_size_outer = self.tick_size_inner;
            }
            AxisMethod::TickSizeInner => self.tick_size_inner = number(self.tick_size_inner),
            AxisMethod::TickSizeOuter => self.tick_size_outer = number(self.tick_size_outer),
            AxisMethod::TickPadding => self.tick_padding = number(self.tick_padding),
            AxisMethod::Offset => self.offset = number(self.offset),
        }
        Ok(())
    }

    /// Tick arguments are checked when configured.
    fn count(&self) -> f64 {
        tick_count(self.tick_arguments.first()).unwrap_or(f64::NAN)
    }

    /// SVG children of the axis group: the domain path followed by one group per tick.
    pub fn render(&self, scale: &Scale) -> String {
        let count = self.count();
        let values = match &self.tick_values {
            Some(values) => values.clone(),
            None => scale.axis_values(count),
        };
        let labels = match &self.tick_format {
            Some(format) => TickLabels::Number(format.clone()),
            None => {
                let specifier = self.tick_arguments.get(1).and_then(Value::as_str);
                scale.tick_labels(count, specifier)
            }
        };

        let k = self.orient.k();
        let spacing = self.tick_size_inner.max(0.0) + self.tick_padding;
        let (r0, r1) = scale.range_extent();
        let (range0, range1) = (r0 + self.offset, r1 + self.offset);
        let n = js_number_string;

        let mut center = 0.0;
        if scale.bandwidth() > 0.0 {
            center = (scale.bandwidth() - self.offset * 2.0).max(0.0) / 2.0;
            if scale.is_rounded() {
                center = center.round();
            }
        }
        // Positions come from a copy so ordinal scales do not grow their domain.
        let mut positioned = scale.clone();

        let outer = k * self.tick_size_outer;
        let d = if self.orient.is_vertical() {
            if self.tick_size_outer != 0.0 {
                format!("M{},{}H{}V{}H{}", n(outer), n(range0), n(self.offset), n(range1), n(outer))
            } else {
                format!("M{},{}V{}", n(self.offset), n(range0), n(range1))
            }
        } else if self.tick_size_outer != 0.0 {
            format!("M{},{}V{}H{}V{}", n(range0), n(outer), n(self.offset), n(range1), n(outer))
        } else {
            format!("M{},{}H{}", n(range0), n(self.offset), n(range1))
        };

        let mut out = format!(r#"<path class="domain" stroke="currentColor" d="{}"></path>"#, d);
        let axis = if self.orient.is_vertical() { 'x' } else { 'y' };
        let dy = match self.orient {
            Orient::Top => "0em",
            Orient::Bottom => "0.71em",
            Orient::Left | Orient::Right => "0.32em",
        };
        for value in &values {
            let position = positioned.apply(value).to_number() + center + self.offset;
            let transform = if self.orient.is_vertical() {
                format!("translate(0,{})", n(position))
            } else {
                format!("translate({},0)", n(position))
            };
            out.push_str(&format!(
                r#"<g class="tick" opacity="1" transform="{}"><line stroke="currentColor" {}2="{}"></line><text fill="currentColor" {}="{}" dy="{}">{}</text></g>"#,
                transform,
                axis,
                n(k * self.tick_size_inner),
                axis,
                n(k * spacing),
                dy,
                html_escape(&labels.label(value)),
            ));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helpers::scale::{ScaleKind, ScaleMethod};

    fn array(items: &[f64]) -> Value {
        Value::Array(items.iter().map(|n| Value::Number(*n)).collect())
    }

    #[test]
    fn test_bottom_axis_markup() {
        let scale = Scale::new(ScaleKind::Linear, &[array(&[0.0, 10.0]), array(&[0.0, 100.0])]);
        let mut axis = Axis::new(Orient::Bottom, "x");
        axis.configure(AxisMethod::Ticks, &[Value::Number(2.0)]).unwrap();
        let svg = axis.render(&scale);
        assert!(svg.starts_with(r#"<path class="domain" stroke="currentColor" d="M0.5,6V0.5H100.5V6"></path>"#));
        assert!(svg.contains(
            r#"<g class="tick" opacity="1" transform="translate(50.5,0)"><line stroke="currentColor" y2="6"></line><text fill="currentColor" y="9" dy="0.71em">5</text></g>"#
        ));
        assert_eq!(svg.matches(r#"class="tick""#).count(), 3);
    }

    #[test]
    fn test_left_axis_points_outward() {
        let scale = Scale::new(ScaleKind::Linear, &[array(&[0.0, 1.0]), array(&[100.0, 0.0])]);
        let mut axis = Axis::new(Orient::Left, "y");
        axis.configure(AxisMethod::TickValues, &[array(&[0.5])]).unwrap();
        let svg = axis.render(&scale);
        assert!(svg.contains(r#"d="M-6,100.5H0.5V0.5H-6""#));
        assert!(svg.contains(r#"transform="translate(0,50.5)""#));
        assert!(svg.contains(r#"<line stroke="currentColor" x2="-6"></line><text fill="currentColor" x="-9" dy="0.32em">0.5</text>"#));
    }

    #[test]
    fn test_band_axis_centers_ticks() {
        let domain = Value::Array(vec![Value::str("a"), Value::str("b")]);
        let scale = Scale::new(ScaleKind::Band, &[domain, array(&[0.0, 100.0])]);
        let axis = Axis::new(Orient::Bottom, "x");
        let svg = axis.render(&scale);
        assert!(svg.contains(r#"transform="translate(25,0)""#));
        assert!(svg.contains(">a</text>"));
        assert!(svg.contains(r#"transform="translate(75,0)""#));
    }

    #[test]
    fn test_tick_format_override() {
        let mut scale = Scale::new(ScaleKind::Linear, &[array(&[0.0, 1.0]), array(&[0.0, 10.0])]);
        scale.call(ScaleMethod::Nice, &[]).unwrap();
        let mut axis = Axis::new(Orient::Top, "x");
        axis.configure(AxisMethod::TickValues, &[array(&[0.25])]).unwrap();
        axis.configure(AxisMethod::TickFormat, &[Value::str(".0%")]).unwrap();
        axis.configure(AxisMethod::TickSize, &[Value::Number(0.0)]).unwrap();
        let svg = axis.render(&scale);
        assert!(svg.contains(r#"d="M0.5,0.5H10.5""#));
        assert!(svg.contains(r#"dy="0em">25%</text>"#));
        assert!(axis.configure(AxisMethod::TickFormat, &[Value::str("bogus")]).is_err());
    }

    #[test]
    fn test_oversized_tick_count_is_refused() {
        let scale = Scale::new(ScaleKind::Linear, &[array(&[0.0, 1.0]), array(&[0.0, 10.0])]);
        let mut axis = Axis::new(Orient::Bottom, "x");
        axis.configure(AxisMethod::Ticks, &[Value::Number(2.0)]).unwrap();
        let err = axis.configure(AxisMethod::Ticks, &[Value::Number(1e18)]).unwrap_err();
        assert_eq!(err, AxisError::TickCount(TickCountError("1000000000000000000".to_string())));
        assert!(axis.configure(AxisMethod::TickArguments, &[array(&[f64::INFINITY])]).is_err());
        // The previous setting survives a refused one.
        assert_eq!(axis.render(&scale).matches(r#"class="tick""#).count(), 3);
    }

    #[test]
    fn test_ordinal_axis_does_not_extend_domain() {
        let mut scale = Scale::new(ScaleKind::Ordinal, &[Value::Array(vec![Value::str("a")]), array(&[1.0, 2.0])]);
        let mut axis = Axis::new(Orient::Bottom, "x");
        axis.configure(AxisMethod::TickValues, &[Value::Array(vec![Value::str("z")])]).unwrap();
        axis.render(&scale);
        assert_eq!(scale.call(ScaleMethod::Domain, &[]), Ok(Value::Array(vec![Value::str("a")])));
    }

    #[test]
    fn test_method_names() {
        for method in AxisMethod::ALL {
            assert_eq!(AxisMethod::from_name(method.name()), Some(method));
        }
        assert_eq!(Orient::from_helper_name("axisLeft"), Some(Orient::Left));
    }
}
