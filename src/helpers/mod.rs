// Helper registry: named scales, axes, variables and formatter caches,
// plus dispatch for every helper a template may call.
//
// Misuse of a helper (unknown scale id, bad format string, missing column)
// produces a short sentinel string in the output instead of failing the render.

pub mod axis;
pub mod collections;
pub mod format;
pub mod interpolate;
pub mod math;
pub mod scale;
pub mod ticks;
pub mod time_format;
pub mod value;

use crate::data::Table;
use crate::host::HostServices;
use axis::{Axis, AxisError, AxisMethod, Orient};
use format::NumberFormat;
use log::debug;
use math::MathFn;
use scale::{Scale, ScaleError, ScaleKind, ScaleMethod};
use std::collections::HashMap;
use thiserror::Error;
use ticks::TickCountError;
use time_format::DateFormat;
use value::Value;

/// Failures that abort a render.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HelperError {
    #[error("{helper} expects an array, got {found}")]
    NotArray { helper: &'static str, found: &'static str },

    #[error("{helper}: unknown method \"{method}\"")]
    UnknownMethod { helper: &'static str, method: String },

    #[error(transparent)]
    TickCount(#[from] TickCountError),
}

/// Helper misuse. Displays as the sentinel text written into the output.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegistryError {
    #[error("Scale redeclared")]
    Redeclared,

    #[error("Wrong scale ID")]
    WrongScaleId,

    #[error("Scale {0} not found")]
    ScaleNotFound(String),

    #[error("Wrong format")]
    WrongFormat,

    #[error("Value is not number")]
    NotNumber,

    #[error(transparent)]
    Scale(#[from] ScaleError),

    #[error(transparent)]
    TickCount(#[from] TickCountError),
}

/// Render-scoped helper state. Scales, axes and variables are dropped by
/// [`HelperRegistry::reset`]; compiled formatters are kept, keyed by pattern.
#[derive(Debug, Default)]
pub struct HelperRegistry {
    scales: HashMap<String, Scale>,
    axes: HashMap<String, Axis>,
    variables: HashMap<String, Value>,
    number_formats: HashMap<String, NumberFormat>,
    utc_formats: HashMap<String, DateFormat>,
    local_formats: HashMap<String, DateFormat>,
}

impl HelperRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.scales.clear();
        self.axes.clear();
        self.variables.clear();
    }

    pub fn clear_scales(&mut self) {
        self.scales.clear();
    }

    pub fn clear_axes(&mut self) {
        self.axes.clear();
    }

    /// Scales are write-once: a second registration under the same id is refused
    /// and leaves the first untouched.
    pub fn register_scale(&mut self, kind: ScaleKind, id: &str, args: &[Value]) -> Result<(), RegistryError> {
        if self.scales.contains_key(id) {
            return Err(RegistryError::Redeclared);
        }
        debug!("Registering {} scale '{}'", kind.label(), id);
        self.scales.insert(id.to_string(), Scale::new(kind, args));
        Ok(())
    }

    pub fn scale(&self, id: &str) -> Option<&Scale> {
        self.scales.get(id)
    }

    /// Map `value` through scale `id`.
    pub fn use_scale(&mut self, id: &str, value: &Value) -> Result<Value, RegistryError> {
        match self.scales.get_mut(id) {
            Some(scale) if !id.is_empty() => Ok(scale.apply(value)),
            _ => Err(RegistryError::WrongScaleId),
        }
    }

    /// Invoke `method` on scale `id`. A missing scale yields `undefined`.
    pub fn configure_scale(&mut self, id: &str, method: ScaleMethod, args: &[Value]) -> Result<Value, RegistryError> {
        match self.scales.get_mut(id) {
            Some(scale) => Ok(scale.call(method, args)?),
            None => Ok(Value::Undefined),
        }
    }

    pub fn register_axis(&mut self, orient: Orient, id: &str, scale_id: &str) -> Result<(), RegistryError> {
        if !self.scales.contains_key(scale_id) {
            return Err(RegistryError::ScaleNotFound(scale_id.to_string()));
        }
        debug!("Registering {} '{}' on scale '{}'", orient.helper_name(), id, scale_id);
        self.axes.insert(id.to_string(), Axis::new(orient, scale_id));
        Ok(())
    }

    pub fn configure_axis(&mut self, id: &str, method: AxisMethod, args: &[Value]) -> Result<(), RegistryError> {
        if let Some(axis) = self.axes.get_mut(id) {
            axis.configure(method, args).map_err(|e| match e {
                AxisError::Format(_) => RegistryError::WrongFormat,
                AxisError::TickCount(e) => RegistryError::TickCount(e),
            })?;
        }
        Ok(())
    }

    /// SVG markup for axis `id`; `None` when no such axis exists.
    pub fn render_axis(&self, id: &str) -> Option<Result<String, RegistryError>> {
        let axis = self.axes.get(id)?;
        Some(match self.scales.get(axis.scale_id()) {
            Some(scale) => Ok(axis.render(scale)),
            None => Err(RegistryError::ScaleNotFound(axis.scale_id().to_string())),
        })
    }

    pub fn set_variable(&mut self, name: &str, value: Value) {
        self.variables.insert(name.to_string(), value);
    }

    pub fn variable(&self, name: &str) -> Value {
        self.variables.get(name).cloned().unwrap_or_default()
    }

    /// d3-format a number with a cached formatter.
    pub fn format(&mut self, value: &Value, pattern: &Value) -> Result<String, RegistryError> {
        if matches!(value, Value::Null) {
            return Ok("null".to_string());
        }
        let pattern = pattern.as_str().ok_or(RegistryError::WrongFormat)?;
        let number = value.as_f64().ok_or(RegistryError::NotNumber)?;
        if !self.number_formats.contains_key(pattern) {
            let formatter = NumberFormat::new(pattern).map_err(|_| RegistryError::WrongFormat)?;
            self.number_formats.insert(pattern.to_string(), formatter);
        }
        Ok(self.number_formats[pattern].format(number))
    }

    /// Format a date in UTC or local time. Dates, epoch milliseconds and ISO
    /// timestamps are accepted; anything else yields `undefined`.
    pub fn format_date(&mut self, value: &Value, pattern: &Value, utc: bool) -> Result<Value, RegistryError> {
        if matches!(value, Value::Null) {
            return Ok(Value::str("null"));
        }
        let pattern = pattern.as_str().ok_or(RegistryError::WrongFormat)?;
        let Some(date) = value.to_date() else {
            return Ok(Value::Undefined);
        };
        let cache = if utc { &mut self.utc_formats } else { &mut self.local_formats };
        let formatter = cache
            .entry(pattern.to_string())
            .or_insert_with(|| DateFormat::new(pattern));
        Ok(Value::String(formatter.format(&date, utc)))
    }
}

/// Every helper name a template may call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Helper {
    Format,
    UtcFormat,
    TimeFormat,
    Scale(ScaleKind),
    UseScale,
    GetScale,
    SetupScale,
    ResetScales,
    Axis(Orient),
    SetupAxis,
    UseAxis,
    ResetAxes,
    Var,
    Val,
    Array,
    JsonArray,
    Map,
    Min,
    Max,
    Mean,
    Median,
    Sums,
    Filter,
    Sum,
    Sub,
    Multiply,
    Divide,
    Math,
    Column,
    Distinct,
    Select,
    UseColor,
    UseSelection,
    UseSelectionClear,
    Lookup,
    Log,
}

const NAMED: [(&str, Helper); 34] = [
    ("format", Helper::Format),
    ("utcFormat", Helper::UtcFormat),
    ("timeFormat", Helper::TimeFormat),
    ("useScale", Helper::UseScale),
    ("getScale", Helper::GetScale),
    ("setupScale", Helper::SetupScale),
    ("resetScales", Helper::ResetScales),
    ("setupAxis", Helper::SetupAxis),
    ("useAxis", Helper::UseAxis),
    ("resetAxes", Helper::ResetAxes),
    ("var", Helper::Var),
    ("val", Helper::Val),
    ("array", Helper::Array),
    ("jsonArray", Helper::JsonArray),
    ("map", Helper::Map),
    ("min", Helper::Min),
    ("max", Helper::Max),
    ("mean", Helper::Mean),
    ("median", Helper::Median),
    ("sums", Helper::Sums),
    ("filter", Helper::Filter),
    ("sum", Helper::Sum),
    ("sub", Helper::Sub),
    ("multiply", Helper::Multiply),
    ("divide", Helper::Divide),
    ("math", Helper::Math),
    ("column", Helper::Column),
    ("distinct", Helper::Distinct),
    ("select", Helper::Select),
    ("useColor", Helper::UseColor),
    ("useSelection", Helper::UseSelection),
    ("useSelectionClear", Helper::UseSelectionClear),
    ("lookup", Helper::Lookup),
    ("log", Helper::Log),
];

impl Helper {
    /// Every helper a template may call, named ones first.
    pub fn all() -> impl Iterator<Item = Helper> {
        NAMED
            .into_iter()
            .map(|(_, helper)| helper)
            .chain(ScaleKind::ALL.into_iter().map(Helper::Scale))
            .chain(Orient::ALL.into_iter().map(Helper::Axis))
    }

    pub fn from_name(name: &str) -> Option<Self> {
        NAMED
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, h)| *h)
            .or_else(|| ScaleKind::from_helper_name(name).map(Helper::Scale))
            .or_else(|| Orient::from_helper_name(name).map(Helper::Axis))
    }

    pub fn name(self) -> &'static str {
        match self {
            Helper::Scale(kind) => kind.helper_name(),
            Helper::Axis(orient) => orient.helper_name(),
            _ => NAMED.iter().find(|(_, h)| *h == self).map(|(n, _)| *n).unwrap_or("helper"),
        }
    }

    /// Position of the argument naming a method, for helpers that dispatch on one.
    pub fn method_position(self) -> Option<usize> {
        match self {
            Helper::GetScale | Helper::SetupScale | Helper::SetupAxis => Some(1),
            Helper::Math => Some(0),
            _ => None,
        }
    }

    /// Whether `method` belongs to this helper's method vocabulary.
    pub fn accepts_method(self, method: &str) -> bool {
        match self {
            Helper::GetScale | Helper::SetupScale => ScaleMethod::from_name(method).is_some(),
            Helper::SetupAxis => AxisMethod::from_name(method).is_some(),
            Helper::Math => MathFn::from_name(method).is_some(),
            _ => true,
        }
    }
}

/// Everything a helper call can see during one render.
pub struct HelperScope<'a> {
    pub registry: &'a mut HelperRegistry,
    pub table: &'a Table,
    pub host: &'a dyn HostServices,
}

/// Misuse becomes sentinel text; an unusable tick count aborts the render.
fn sentinel<T: Into<Value>>(result: Result<T, RegistryError>) -> Result<Value, HelperError> {
    match result {
        Ok(value) => Ok(value.into()),
        Err(RegistryError::TickCount(e)) | Err(RegistryError::Scale(ScaleError::TickCount(e))) => Err(e.into()),
        Err(e) => Ok(Value::String(e.to_string())),
    }
}

/// `a + b` with string concatenation when either side is not a number-like primitive.
fn add(a: &Value, b: &Value) -> Value {
    let textual = |v: &Value| matches!(v, Value::String(_) | Value::Date(_) | Value::Array(_) | Value::Object(_));
    if textual(a) || textual(b) {
        Value::String(format!("{}{}", a.to_js_string(), b.to_js_string()))
    } else {
        Value::Number(a.to_number() + b.to_number())
    }
}

impl HelperScope<'_> {
    pub fn call(&mut self, helper: Helper, args: Vec<Value>) -> Result<Value, HelperError> {
        let arg = |i: usize| args.get(i).cloned().unwrap_or_default();
        let text = |i: usize| arg(i).to_js_string();
        let number = |i: usize| arg(i).to_number();
        let rest = |from: usize| args.get(from..).unwrap_or_default();

        let value = match helper {
            Helper::Format => sentinel(self.registry.format(&arg(0), &arg(1)).map(Value::String))?,
            Helper::UtcFormat => sentinel(self.registry.format_date(&arg(0), &arg(1), true))?,
            Helper::TimeFormat => sentinel(self.registry.format_date(&arg(0), &arg(1), false))?,

            Helper::Scale(kind) => sentinel(self.registry.register_scale(kind, &text(0), rest(1)).map(|_| Value::Undefined))?,
            Helper::UseScale => match arg(0) {
                Value::String(id) => sentinel(self.registry.use_scale(&id, &arg(1)))?,
                _ => Value::String(RegistryError::WrongScaleId.to_string()),
            },
            Helper::GetScale | Helper::SetupScale => {
                let method = text(1);
                let method = ScaleMethod::from_name(&method)
                    .ok_or(HelperError::UnknownMethod { helper: helper.name(), method })?;
                let result = self.registry.configure_scale(&text(0), method, rest(2));
                match (helper, result) {
                    (Helper::SetupScale, Ok(_)) => Value::Undefined,
                    (_, result) => sentinel(result)?,
                }
            }
            Helper::ResetScales => {
                self.registry.clear_scales();
                Value::Undefined
            }

            Helper::Axis(orient) => sentinel(self.registry.register_axis(orient, &text(0), &text(1)).map(|_| Value::Undefined))?,
            Helper::SetupAxis => {
                let method = text(1);
                let method = AxisMethod::from_name(&method)
                    .ok_or(HelperError::UnknownMethod { helper: helper.name(), method })?;
                sentinel(self.registry.configure_axis(&text(0), method, rest(2)).map(|_| Value::Undefined))?
            }
            Helper::UseAxis => match self.registry.render_axis(&text(0)) {
                Some(result) => sentinel(result.map(Value::String))?,
                None => Value::Undefined,
            },
            Helper::ResetAxes => {
                self.registry.clear_axes();
                Value::Undefined
            }

            Helper::Var => {
                self.registry.set_variable(&text(0), arg(1));
                Value::Undefined
            }
            Helper::Val => self.registry.variable(&text(0)),

            Helper::Array => Value::Array(args.clone()),
            Helper::JsonArray => collections::json_array(args.last().unwrap_or(&Value::Undefined))?,
            Helper::Map => collections::map(&arg(0), &arg(1))?,
            Helper::Min => collections::min(&arg(0))?,
            Helper::Max => collections::max(&arg(0))?,
            Helper::Mean => collections::mean(&arg(0))?,
            Helper::Median => collections::median(&arg(0))?,
            Helper::Sums => collections::sums(&arg(0))?,
            Helper::Filter => {
                let op = args.get(2).map(Value::to_js_string).unwrap_or_else(|| "==".to_string());
                collections::filter(&arg(0), &arg(1), &op)?
            }

            Helper::Sum => add(&arg(0), &arg(1)),
            Helper::Sub => Value::Number(number(0) - number(1)),
            Helper::Multiply => Value::Number(number(0) * number(1)),
            Helper::Divide => Value::Number(number(0) / number(1)),
            Helper::Math => {
                let method = text(0);
                let function = MathFn::from_name(&method)
                    .ok_or(HelperError::UnknownMethod { helper: helper.name(), method })?;
                function.eval(rest(1))
            }

            Helper::Column => collections::column(self.table, &text(0)),
            Helper::Distinct => collections::distinct(self.table, &text(0)),
            Helper::Select => {
                let names: Vec<String> = args.iter().map(Value::to_js_string).collect();
                collections::select(self.table, &names)
            }

            Helper::UseColor => Value::String(self.host.color(&text(0))),
            Helper::UseSelection => self.selection(&arg(0)),
            Helper::UseSelectionClear => Value::String(self.host.selection_clear_attribute()),

            Helper::Lookup => arg(0).get(&text(1)),
            Helper::Log => {
                let line: Vec<String> = args.iter().map(Value::to_js_string).collect();
                log::info!("{}", line.join(" "));
                Value::Undefined
            }
        };
        Ok(value)
    }

    /// Selection marker for row `index`; nothing when the index is not a row of the table.
    fn selection(&self, index: &Value) -> Value {
        let row = index
            .as_f64()
            .filter(|i| i.fract() == 0.0 && *i >= 0.0)
            .and_then(|i| self.table.rows().get(i as usize).map(|row| (i as usize, row)));
        match row {
            Some((i, row)) => Value::String(self.host.selection_attribute(i, row)),
            None => Value::Undefined,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::DefaultPalette;
    use serde_json::json;

    fn numbers(items: &[f64]) -> Value {
        Value::Array(items.iter().map(|n| Value::Number(*n)).collect())
    }

    fn table() -> Table {
        Table::from_json(&json!([
            { "Region": "North", "Sales": 10 },
            { "Region": "South", "Sales": 20 }
        ]))
        .unwrap()
    }

    fn call(registry: &mut HelperRegistry, name: &str, args: Vec<Value>) -> Value {
        let table = table();
        let host = DefaultPalette::new(vec!["red".into(), "blue".into()]);
        let mut scope = HelperScope { registry, table: &table, host: &host };
        scope.call(Helper::from_name(name).unwrap(), args).unwrap()
    }

    #[test]
    fn test_scale_redeclared_keeps_original() {
        let mut registry = HelperRegistry::new();
        let first = call(&mut registry, "scaleLinear", vec![Value::str("x"), numbers(&[0.0, 1.0]), numbers(&[0.0, 100.0])]);
        assert_eq!(first, Value::Undefined);
        let second = call(&mut registry, "scaleLinear", vec![Value::str("x"), numbers(&[0.0, 1.0]), numbers(&[0.0, 10.0])]);
        assert_eq!(second, Value::str("Scale redeclared"));
        assert_eq!(call(&mut registry, "useScale", vec![Value::str("x"), Value::Number(0.5)]), Value::Number(50.0));
    }

    #[test]
    fn test_reset_clears_scales_but_not_formatters() {
        let mut registry = HelperRegistry::new();
        registry.register_scale(ScaleKind::Linear, "s1", &[]).unwrap();
        registry.format(&Value::Number(1.0), &Value::str(".2f")).unwrap();
        registry.set_variable("v", Value::Number(1.0));
        registry.reset();
        assert!(registry.register_scale(ScaleKind::Linear, "s1", &[]).is_ok());
        assert_eq!(registry.variable("v"), Value::Undefined);
        assert!(registry.number_formats.contains_key(".2f"));
    }

    #[test]
    fn test_use_scale_sentinels() {
        let mut registry = HelperRegistry::new();
        assert_eq!(call(&mut registry, "useScale", vec![Value::str("nope"), Value::Number(1.0)]), Value::str("Wrong scale ID"));
        assert_eq!(call(&mut registry, "useScale", vec![Value::Number(1.0)]), Value::str("Wrong scale ID"));
        assert_eq!(call(&mut registry, "useScale", vec![Value::str("")]), Value::str("Wrong scale ID"));
    }

    #[test]
    fn test_axis_requires_scale() {
        let mut registry = HelperRegistry::new();
        assert_eq!(
            call(&mut registry, "axisBottom", vec![Value::str("a"), Value::str("x")]),
            Value::str("Scale x not found")
        );
        assert_eq!(call(&mut registry, "useAxis", vec![Value::str("a")]), Value::Undefined);
        call(&mut registry, "scaleLinear", vec![Value::str("x"), numbers(&[0.0, 10.0]), numbers(&[0.0, 100.0])]);
        call(&mut registry, "axisBottom", vec![Value::str("a"), Value::str("x")]);
        call(&mut registry, "setupAxis", vec![Value::str("a"), Value::str("ticks"), Value::Number(2.0)]);
        let svg = call(&mut registry, "useAxis", vec![Value::str("a")]);
        assert!(svg.as_str().unwrap().contains(r#"class="domain""#));
    }

    #[test]
    fn test_get_and_setup_scale() {
        let mut registry = HelperRegistry::new();
        call(&mut registry, "scaleLinear", vec![Value::str("x"), numbers(&[0.0, 10.0]), numbers(&[0.0, 100.0])]);
        call(&mut registry, "setupScale", vec![Value::str("x"), Value::str("domain"), numbers(&[0.0, 20.0])]);
        assert_eq!(call(&mut registry, "getScale", vec![Value::str("x"), Value::str("domain")]), numbers(&[0.0, 20.0]));
        assert_eq!(call(&mut registry, "getScale", vec![Value::str("missing"), Value::str("domain")]), Value::Undefined);
        assert_eq!(
            call(&mut registry, "getScale", vec![Value::str("x"), Value::str("bandwidth")]),
            Value::str("Method bandwidth is not supported by linear scale")
        );
    }

    #[test]
    fn test_format_sentinels() {
        let mut registry = HelperRegistry::new();
        assert_eq!(call(&mut registry, "format", vec![Value::Number(1234.5), Value::str(",.2f")]), Value::str("1,234.50"));
        assert_eq!(call(&mut registry, "format", vec![Value::Null, Value::str(".2f")]), Value::str("null"));
        assert_eq!(call(&mut registry, "format", vec![Value::str("1"), Value::str(".2f")]), Value::str("Value is not number"));
        assert_eq!(call(&mut registry, "format", vec![Value::Number(1.0), Value::Number(2.0)]), Value::str("Wrong format"));
        assert_eq!(call(&mut registry, "format", vec![Value::Number(1.0), Value::str("bogus")]), Value::str("Wrong format"));
    }

    #[test]
    fn test_utc_format_parses_iso_text() {
        let mut registry = HelperRegistry::new();
        let formatted = call(&mut registry, "utcFormat", vec![Value::str("2024-03-05T10:20:30.000Z"), Value::str("%Y-%m-%d")]);
        assert_eq!(formatted, Value::str("2024-03-05"));
        assert_eq!(call(&mut registry, "utcFormat", vec![Value::str("not a date"), Value::str("%Y")]), Value::Undefined);
        assert_eq!(call(&mut registry, "utcFormat", vec![Value::Bool(true), Value::str("%Y")]), Value::Undefined);
    }

    #[test]
    fn test_date_formats_accept_epoch_milliseconds() {
        let mut registry = HelperRegistry::new();
        let epoch = Value::Number(1_709_634_030_000.0);
        assert_eq!(call(&mut registry, "utcFormat", vec![epoch.clone(), Value::str("%Y-%m-%d %H:%M")]), Value::str("2024-03-05 10:20"));
        let local = call(&mut registry, "timeFormat", vec![epoch, Value::str("%Y")]);
        assert_eq!(local, Value::str("2024"));
    }

    #[test]
    fn test_oversized_tick_count_fails_render() {
        let mut registry = HelperRegistry::new();
        let table = table();
        let host = DefaultPalette::default();
        let mut scope = HelperScope { registry: &mut registry, table: &table, host: &host };
        scope
            .call(Helper::Scale(ScaleKind::Linear), vec![Value::str("x"), numbers(&[0.0, 1.0]), numbers(&[0.0, 10.0])])
            .unwrap();
        let err = scope
            .call(Helper::GetScale, vec![Value::str("x"), Value::str("ticks"), Value::Number(1e18)])
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid tick count 1000000000000000000");
        let ticks = scope.call(Helper::GetScale, vec![Value::str("x"), Value::str("ticks"), Value::Number(2.0)]).unwrap();
        assert_eq!(ticks, numbers(&[0.0, 0.5, 1.0]));

        scope.call(Helper::Axis(Orient::Bottom), vec![Value::str("a"), Value::str("x")]).unwrap();
        let err = scope
            .call(Helper::SetupAxis, vec![Value::str("a"), Value::str("ticks"), Value::Number(f64::INFINITY)])
            .unwrap_err();
        assert!(matches!(err, HelperError::TickCount(_)));
    }

    #[test]
    fn test_variables_and_arithmetic() {
        let mut registry = HelperRegistry::new();
        assert_eq!(call(&mut registry, "var", vec![Value::str("w"), Value::Number(40.0)]), Value::Undefined);
        assert_eq!(call(&mut registry, "val", vec![Value::str("w")]), Value::Number(40.0));
        assert_eq!(call(&mut registry, "sum", vec![Value::Number(1.0), Value::Number(2.0)]), Value::Number(3.0));
        assert_eq!(call(&mut registry, "sum", vec![Value::str("a"), Value::Number(2.0)]), Value::str("a2"));
        assert_eq!(call(&mut registry, "divide", vec![Value::Number(1.0), Value::Number(4.0)]), Value::Number(0.25));
        assert_eq!(call(&mut registry, "math", vec![Value::str("max"), Value::Number(3.0), Value::Number(9.0)]), Value::Number(9.0));
    }

    #[test]
    fn test_unknown_method_fails_render() {
        let mut registry = HelperRegistry::new();
        let table = table();
        let host = DefaultPalette::default();
        let mut scope = HelperScope { registry: &mut registry, table: &table, host: &host };
        let err = scope.call(Helper::Math, vec![Value::str("random")]).unwrap_err();
        assert_eq!(err.to_string(), "math: unknown method \"random\"");
    }

    #[test]
    fn test_host_helpers() {
        let mut registry = HelperRegistry::new();
        assert_eq!(call(&mut registry, "useColor", vec![Value::str("North")]), Value::str("red"));
        assert_eq!(
            call(&mut registry, "useSelection", vec![Value::Number(1.0)]),
            Value::str(r#"data-selection=true data-index="1""#)
        );
        assert_eq!(call(&mut registry, "useSelection", vec![Value::Number(5.0)]), Value::Undefined);
        assert_eq!(call(&mut registry, "useSelection", vec![Value::str("0")]), Value::Undefined);
        assert_eq!(call(&mut registry, "useSelectionClear", vec![]), Value::str(r#"data-selection-clear="true""#));
    }

    #[test]
    fn test_dataset_helpers_see_table() {
        let mut registry = HelperRegistry::new();
        assert_eq!(call(&mut registry, "column", vec![Value::str("Region")]), Value::str(r#"["North","South"]"#));
        assert_eq!(
            call(&mut registry, "select", vec![Value::str("Sales")]),
            Value::str(r#"[["10"],["20"]]"#)
        );
    }

    #[test]
    fn test_helper_names() {
        assert_eq!(Helper::from_name("scaleBand"), Some(Helper::Scale(ScaleKind::Band)));
        assert_eq!(Helper::from_name("axisTop"), Some(Helper::Axis(Orient::Top)));
        assert_eq!(Helper::from_name("nope"), None);
        for (name, helper) in NAMED {
            assert_eq!(helper.name(), name);
        }
        assert_eq!(Helper::all().count(), NAMED.len() + ScaleKind::ALL.len() + Orient::ALL.len());
        assert!(Helper::all().all(|helper| Helper::from_name(helper.name()) == Some(helper)));
        assert!(Helper::SetupAxis.accepts_method("tickValues"));
        assert!(!Helper::SetupScale.accepts_method("tickFormat"));
    }
}
