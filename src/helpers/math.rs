// Deterministic Math functions and constants for the `math` helper

use super::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MathFn {
    Abs,
    Acos,
    Acosh,
    Asin,
    Asinh,
    Atan,
    Atan2,
    Atanh,
    Cbrt,
    Ceil,
    Clz32,
    Cos,
    Cosh,
    Exp,
    Expm1,
    Floor,
    Fround,
    Hypot,
    Imul,
    Log,
    Log10,
    Log1p,
    Log2,
    Max,
    Min,
    Pow,
    Round,
    Sign,
    Sin,
    Sinh,
    Sqrt,
    Tan,
    Tanh,
    Trunc,
    E,
    Ln10,
    Ln2,
    Log10e,
    Log2e,
    Pi,
    Sqrt1_2,
    Sqrt2,
}

impl MathFn {
    pub const ALL: [MathFn; 42] = [
        MathFn::Abs,
        MathFn::Acos,
        MathFn::Acosh,
        MathFn::Asin,
        MathFn::Asinh,
        MathFn::Atan,
        MathFn::Atan2,
        MathFn::Atanh,
        MathFn::Cbrt,
        MathFn::Ceil,
        MathFn::Clz32,
        MathFn::Cos,
        MathFn::Cosh,
        MathFn::Exp,
        MathFn::Expm1,
        MathFn::Floor,
        MathFn::Fround,
        MathFn::Hypot,
        MathFn::Imul,
        MathFn::Log,
        MathFn::Log10,
        MathFn::Log1p,
        MathFn::Log2,
        MathFn::Max,
        MathFn::Min,
        MathFn::Pow,
        MathFn::Round,
        MathFn::Sign,
        MathFn::Sin,
        MathFn::Sinh,
        MathFn::Sqrt,
        MathFn::Tan,
        MathFn::Tanh,
        MathFn::Trunc,
        MathFn::E,
        MathFn::Ln10,
        MathFn::Ln2,
        MathFn::Log10e,
        MathFn::Log2e,
        MathFn::Pi,
        MathFn::Sqrt1_2,
        MathFn::Sqrt2,
    ];

    pub fn name(self) -> &'static str {
        match self {
            MathFn::Abs => "abs",
            MathFn::Acos => "acos",
            MathFn::Acosh => "acosh",
            MathFn::Asin => "asin",
            MathFn::Asinh => "asinh",
            MathFn::Atan => "atan",
            MathFn::Atan2 => "atan2",
            MathFn::Atanh => "atanh",
            MathFn::Cbrt => "cbrt",
            MathFn::Ceil => "ceil",
            MathFn::Clz32 => "clz32",
            MathFn::Cos => "cos",
            MathFn::Cosh => "cosh",
            MathFn::Exp => "exp",
            MathFn::Expm1 => "expm1",
            MathFn::Floor => "floor",
            MathFn::Fround => "fround",
            MathFn::Hypot => "hypot",
            MathFn::Imul => "imul",
            MathFn::Log => "log",
            MathFn::Log10 => "log10",
            MathFn::Log1p => "log1p",
            MathFn::Log2 => "log2",
            MathFn::Max => "max",
            MathFn::Min => "min",
            MathFn::Pow => "pow",
            MathFn::Round => "round",
            MathFn::Sign => "sign",
            MathFn::Sin => "sin",
            MathFn::Sinh => "sinh",
            MathFn::Sqrt => "sqrt",
            MathFn::Tan => "tan",
            MathFn::Tanh => "tanh",
            MathFn::Trunc => "trunc",
            MathFn::E => "E",
            MathFn::Ln10 => "LN10",
            MathFn::Ln2 => "LN2",
            MathFn::Log10e => "LOG10E",
            MathFn::Log2e => "LOG2E",
            MathFn::Pi => "PI",
            MathFn::Sqrt1_2 => "SQRT1_2",
            MathFn::Sqrt2 => "SQRT2",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.name() == name)
    }

    fn constant(self) -> Option<f64> {
        use std::f64::consts;
        Some(match self {
            MathFn::E => consts::E,
            MathFn::Ln10 => consts::LN_10,
            MathFn::Ln2 => consts::LN_2,
            MathFn::Log10e => consts::LOG10_E,
            MathFn::Log2e => consts::LOG2_E,
            MathFn::Pi => consts::PI,
            MathFn::Sqrt1_2 => consts::FRAC_1_SQRT_2,
            MathFn::Sqrt2 => consts::SQRT_2,
            _ => return None,
        })
    }

    /// Evaluate with the given arguments; constants ignore them.
    pub fn eval(self, args: &[Value]) -> Value {
        if let Some(constant) = self.constant() {
            return Value::Number(constant);
        }
        let numbers: Vec<f64> = args.iter().map(Value::to_number).collect();
        let x = numbers.first().copied().unwrap_or(f64::NAN);
        let y = numbers.get(1).copied().unwrap_or(f64::NAN);
        let result = match self {
            MathFn::Abs => x.abs(),
            MathFn::Acos => x.acos(),
            MathFn::Acosh => x.acosh(),
            MathFn::Asin => x.asin(),
            MathFn::Asinh => x.asinh(),
            MathFn::Atan => x.atan(),
            MathFn::Atan2 => x.atan2(y),
            MathFn::Atanh => x.atanh(),
            MathFn::Cbrt => x.cbrt(),
            MathFn::Ceil => x.ceil(),
            MathFn::Clz32 => f64::from(to_uint32(x).leading_zeros()),
            MathFn::Cos => x.cos(),
            MathFn::Cosh => x.cosh(),
            MathFn::Exp => x.exp(),
            MathFn::Expm1 => x.exp_m1(),
            MathFn::Floor => x.floor(),
            MathFn::Fround => f64::from(x as f32),
            MathFn::Hypot => numbers.iter().map(|n| n * n).sum::<f64>().sqrt(),
            MathFn::Imul => f64::from((to_uint32(x) as i32).wrapping_mul(to_uint32(y) as i32)),
            MathFn::Log => x.ln(),
            MathFn::Log10 => x.log10(),
            MathFn::Log1p => x.ln_1p(),
            MathFn::Log2 => x.log2(),
            MathFn::Max => fold(&numbers, f64::NEG_INFINITY, f64::max),
            MathFn::Min => fold(&numbers, f64::INFINITY, f64::min),
            MathFn::Pow => x.powf(y),
            MathFn::Round => (x + 0.5).floor(),
            MathFn::Sign => {
                if x.is_nan() || x == 0.0 {
                    x
                } else {
                    x.signum()
                }
            }
            MathFn::Sin => x.sin(),
            MathFn::Sinh => x.sinh(),
            MathFn::Sqrt => x.sqrt(),
            MathFn::Tan => x.tan(),
            MathFn::Tanh => x.tanh(),
            MathFn::Trunc => x.trunc(),
            _ => f64::NAN,
        };
        Value::Number(result)
    }
}

/// Any NaN argument poisons the result.
fn fold(numbers: &[f64], start: f64, pick: fn(f64, f64) -> f64) -> f64 {
    if numbers.iter().any(|n| n.is_nan()) {
        return f64::NAN;
    }
    numbers.iter().copied().fold(start, pick)
}

fn to_uint32(x: f64) -> u32 {
    if !x.is_finite() {
        return 0;
    }
    x.trunc().rem_euclid(4_294_967_296.0) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(name: &str, args: &[f64]) -> f64 {
        let args: Vec<Value> = args.iter().map(|n| Value::Number(*n)).collect();
        MathFn::from_name(name).unwrap().eval(&args).as_f64().unwrap()
    }

    #[test]
    fn test_functions_spread_arguments() {
        assert_eq!(eval("max", &[1.0, 7.0, 3.0]), 7.0);
        assert_eq!(eval("min", &[]), f64::INFINITY);
        assert_eq!(eval("pow", &[2.0, 10.0]), 1024.0);
        assert_eq!(eval("hypot", &[3.0, 4.0]), 5.0);
        assert_eq!(eval("abs", &[-2.5]), 2.5);
    }

    #[test]
    fn test_round_half_up() {
        assert_eq!(eval("round", &[2.5]), 3.0);
        assert_eq!(eval("round", &[-2.5]), -2.0);
    }

    #[test]
    fn test_integer_functions() {
        assert_eq!(eval("clz32", &[1.0]), 31.0);
        assert_eq!(eval("imul", &[3.0, 4.0]), 12.0);
        assert_eq!(eval("sign", &[-3.0]), -1.0);
    }

    #[test]
    fn test_constants() {
        assert_eq!(eval("PI", &[]), std::f64::consts::PI);
        assert_eq!(eval("SQRT2", &[9.0]), std::f64::consts::SQRT_2);
        assert!(MathFn::from_name("random").is_none());
    }
}
