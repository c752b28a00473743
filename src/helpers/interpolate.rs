//! Value interpolation for continuous scale ranges.

use super::value::Value;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Rgb {
    pub fn to_css(self) -> String {
        let channel = |c: f64| c.round().clamp(0.0, 255.0) as u8;
        format!("rgb({}, {}, {})", channel(self.r), channel(self.g), channel(self.b))
    }
}

const NAMED_COLORS: [(&str, u32); 16] = [
    ("black", 0x000000),
    ("white", 0xffffff),
    ("red", 0xff0000),
    ("green", 0x008000),
    ("blue", 0x0000ff),
    ("yellow", 0xffff00),
    ("orange", 0xffa500),
    ("purple", 0x800080),
    ("gray", 0x808080),
    ("grey", 0x808080),
    ("steelblue", 0x4682b4),
    ("brown", 0xa52a2a),
    ("pink", 0xffc0cb),
    ("cyan", 0x00ffff),
    ("magenta", 0xff00ff),
    ("navy", 0x000080),
];

fn from_hex(value: u32) -> Rgb {
    Rgb {
        r: ((value >> 16) & 0xff) as f64,
        g: ((value >> 8) & 0xff) as f64,
        b: (value & 0xff) as f64,
    }
}

/// Parses `#rgb`, `#rrggbb`, `rgb(r, g, b)` and a handful of color names.
pub fn parse_color(text: &str) -> Option<Rgb> {
    let text = text.trim().to_ascii_lowercase();
    if let Some(hex) = text.strip_prefix('#') {
        let value = u32::from_str_radix(hex, 16).ok()?;
        return match hex.len() {
            6 => Some(from_hex(value)),
            3 => {
                let expand = |nibble: u32| (nibble << 4 | nibble) as f64;
                Some(Rgb {
                    r: expand((value >> 8) & 0xf),
                    g: expand((value >> 4) & 0xf),
                    b: expand(value & 0xf),
                })
            }
            _ => None,
        };
    }
    if let Some(body) = text.strip_prefix("rgb(").and_then(|t| t.strip_suffix(')')) {
        let channels: Vec<f64> = body
            .split(',')
            .map(|c| c.trim().parse::<f64>())
            .collect::<Result<_, _>>()
            .ok()?;
        return match channels.as_slice() {
            [r, g, b] => Some(Rgb { r: *r, g: *g, b: *b }),
            _ => None,
        };
    }
    NAMED_COLORS.iter().find(|(name, _)| *name == text).map(|(_, hex)| from_hex(*hex))
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a * (1.0 - t) + b * t
}

/// Interpolate between two range values: numbers linearly, colors in RGB.
/// Anything else snaps to the nearer endpoint.
pub fn interpolate(a: &Value, b: &Value, t: f64) -> Value {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => Value::Number(lerp(*x, *y, t)),
        (Value::Date(x), Value::Date(y)) => {
            let ms = lerp(x.timestamp_millis() as f64, y.timestamp_millis() as f64, t);
            Value::Number(ms).to_date().map(Value::Date).unwrap_or(Value::Null)
        }
        (Value::String(x), Value::String(y)) => match (parse_color(x), parse_color(y)) {
            (Some(c0), Some(c1)) => Value::String(
                Rgb { r: lerp(c0.r, c1.r, t), g: lerp(c0.g, c1.g, t), b: lerp(c0.b, c1.b, t) }.to_css(),
            ),
            _ => snap(a, b, t),
        },
        _ => snap(a, b, t),
    }
}

fn snap(a: &Value, b: &Value, t: f64) -> Value {
    if t < 0.5 {
        a.clone()
    } else {
        b.clone()
    }
}

/// Interpolate across several stops evenly spaced over `[0, 1]`.
pub fn piecewise(stops: &[Value], t: f64) -> Value {
    match stops {
        [] => Value::Undefined,
        [only] => only.clone(),
        _ => {
            let n = stops.len() - 1;
            let scaled = t * n as f64;
            let i = (scaled.floor().max(0.0) as usize).min(n - 1);
            interpolate(&stops[i], &stops[i + 1], scaled - i as f64)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_color_forms() {
        assert_eq!(parse_color("#f00"), Some(Rgb { r: 255.0, g: 0.0, b: 0.0 }));
        assert_eq!(parse_color("#00ff00"), Some(Rgb { r: 0.0, g: 255.0, b: 0.0 }));
        assert_eq!(parse_color("rgb(1, 2, 3)"), Some(Rgb { r: 1.0, g: 2.0, b: 3.0 }));
        assert_eq!(parse_color("SteelBlue"), parse_color("#4682b4"));
        assert_eq!(parse_color("nope"), None);
    }

    #[test]
    fn test_interpolate_numbers_and_colors() {
        assert_eq!(interpolate(&Value::Number(0.0), &Value::Number(10.0), 0.25), Value::Number(2.5));
        assert_eq!(
            interpolate(&Value::str("#000000"), &Value::str("#ffffff"), 0.5),
            Value::str("rgb(128, 128, 128)")
        );
    }

    #[test]
    fn test_piecewise_stops() {
        let stops = vec![Value::Number(0.0), Value::Number(10.0), Value::Number(30.0)];
        assert_eq!(piecewise(&stops, 0.75), Value::Number(20.0));
        assert_eq!(piecewise(&stops, 1.0), Value::Number(30.0));
    }
}
