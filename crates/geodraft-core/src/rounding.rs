//! Export-time coordinate rounding.
//!
//! Interactive editing keeps full precision; payloads are quantized only when
//! exported so that values like `-622.8000000000001` come out as `-622.8`.

use serde_json::{Number, Value};

/// Default export rounding step.
pub const DEFAULT_EXPORT_STEP: f64 = 0.1;

/// Nudge applied before quantizing so that representation error below a
/// half step never flips the rounding direction.
const ROUNDING_EPSILON: f64 = 1e-9;

/// Largest number of decimals kept when fixing the representation.
const MAX_DECIMALS: usize = 12;

/// Round `n` to a multiple of `step`, half up, without float residue.
///
/// Non-finite inputs and non-positive steps are returned unchanged.
pub fn round_to_step(n: f64, step: f64) -> f64 {
    if !n.is_finite() || !step.is_finite() || step <= 0.0 {
        return n;
    }
    let quantized = (((n + ROUNDING_EPSILON) / step) + 0.5).floor() * step;
    let fixed = format!("{:.*}", step_decimals(step), quantized)
        .parse::<f64>()
        .unwrap_or(quantized);
    if fixed == 0.0 { 0.0 } else { fixed }
}

/// Number of decimals needed to represent multiples of `step`.
fn step_decimals(step: f64) -> usize {
    let text = format!("{step}");
    match text.split_once('.') {
        Some((_, frac)) => frac.len().min(MAX_DECIMALS),
        None => 0,
    }
}

fn rounded_number(value: &Value, step: f64) -> Option<Value> {
    let n = value.as_f64()?;
    let r = round_to_step(n, step);
    if r.fract() == 0.0 && r.abs() < 9.0e15 {
        Some(Value::from(r as i64))
    } else {
        Number::from_f64(r).map(Value::Number)
    }
}

fn is_triple(items: &[Value]) -> bool {
    items.len() == 3 && items.iter().all(Value::is_number)
}

/// Round every `{x, z}` object and `[x, y, z]` triple inside a payload.
pub fn round_payload(value: &mut Value, step: f64) {
    match value {
        Value::Object(map) => {
            let is_coordinate = map.get("x").is_some_and(Value::is_number)
                && map.get("z").is_some_and(Value::is_number);
            for (key, child) in map.iter_mut() {
                let axis = matches!(key.as_str(), "x" | "y" | "z");
                if is_coordinate && axis {
                    if let Some(r) = rounded_number(child, step) {
                        *child = r;
                    }
                } else {
                    round_payload(child, step);
                }
            }
        }
        Value::Array(items) => {
            if is_triple(items) {
                for item in items.iter_mut() {
                    if let Some(r) = rounded_number(item, step) {
                        *item = r;
                    }
                }
            } else {
                for item in items.iter_mut() {
                    round_payload(item, step);
                }
            }
        }
        _ => {}
    }
}

/// Cloning variant of [`round_payload`].
pub fn rounded_payload(value: &Value, step: f64) -> Value {
    let mut out = value.clone();
    round_payload(&mut out, step);
    out
}
