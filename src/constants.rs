use rug::float::Constant;
use rug::Float;

use crate::error::{Result, SumforgeError};

/// Default big-float precision in bits.
pub const DEFAULT_PRECISION: u32 = 512;

/// A target constant at full precision plus its f64 mirror for the fast
/// evaluation phase.
#[derive(Debug, Clone)]
pub struct TargetConstant {
    pub name: &'static str,
    pub value: Float,
    pub value_f64: f64,
}

const NAMES: [&str; 6] = ["pi", "e", "euler_gamma", "ln2", "catalan", "apery"];

/// Looks up a target constant by name, computed at `prec` bits.
pub fn get(name: &str, prec: u32) -> Result<TargetConstant> {
    let (canonical, value) = match name {
        "pi" => ("pi", Float::with_val(prec, Constant::Pi)),
        "e" => ("e", Float::with_val(prec, 1).exp()),
        "euler_gamma" => ("euler_gamma", Float::with_val(prec, Constant::Euler)),
        "ln2" => ("ln2", Float::with_val(prec, Constant::Log2)),
        "catalan" => ("catalan", Float::with_val(prec, Constant::Catalan)),
        "apery" => ("apery", Float::with_val(prec, 3).zeta()),
        _ => {
            return Err(SumforgeError::UnknownTarget(format!(
                "{name} (available: {})",
                NAMES.join(", ")
            )))
        }
    };
    let value_f64 = value.to_f64();
    Ok(TargetConstant {
        name: canonical,
        value,
        value_f64,
    })
}

/// Names of all available target constants.
pub fn names() -> &'static [&'static str] {
    &NAMES
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_values() {
        let cases = [
            ("pi", std::f64::consts::PI),
            ("e", std::f64::consts::E),
            ("euler_gamma", 0.5772156649015329),
            ("ln2", std::f64::consts::LN_2),
            ("catalan", 0.9159655941772190),
            ("apery", 1.2020569031595943),
        ];
        for (name, expected) in cases {
            let c = get(name, DEFAULT_PRECISION).unwrap();
            assert!(
                (c.value_f64 - expected).abs() < 1e-14,
                "{name}: {} vs {expected}",
                c.value_f64
            );
            assert_eq!(c.value.prec(), DEFAULT_PRECISION);
        }
    }

    #[test]
    fn unknown_target() {
        assert!(get("nonexistent", DEFAULT_PRECISION).is_err());
    }

    #[test]
    fn all_names_resolve() {
        for name in names() {
            assert!(get(name, 128).is_ok());
        }
    }
}
