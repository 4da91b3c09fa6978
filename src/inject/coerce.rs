use serde_json::{Number, Value};
use crate::model::Scalar;

/// JSON primitive → scalar. Objects, arrays and null yield `None`.
pub fn coerce(v: &Value) -> Option<Scalar> {
    match v {
        Value::String(s) => Some(Scalar::String(s.clone())),
        Value::Number(n) => Some(Scalar::Integer(truncate(n))),
        Value::Bool(b) => Some(Scalar::Boolean(*b)),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

// Kept for compatibility with existing documents: fractions are discarded and
// nothing is range-checked (u64 above i64::MAX wraps, large floats saturate).
// Probably a latent bug for real-valued data.
fn truncate(n: &Number) -> i64 {
    if let Some(i) = n.as_i64() {
        i
    } else if let Some(u) = n.as_u64() {
        u as i64
    } else {
        n.as_f64().map(|f| f.trunc() as i64).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn primitives_map_to_scalars() {
        assert_eq!(coerce(&json!("abc")), Some(Scalar::String("abc".into())));
        assert_eq!(coerce(&json!("")), Some(Scalar::String(String::new())));
        assert_eq!(coerce(&json!(42)), Some(Scalar::Integer(42)));
        assert_eq!(coerce(&json!(-7)), Some(Scalar::Integer(-7)));
        assert_eq!(coerce(&json!(true)), Some(Scalar::Boolean(true)));
        assert_eq!(coerce(&json!(false)), Some(Scalar::Boolean(false)));
    }

    #[test]
    fn fractions_truncate_toward_zero() {
        assert_eq!(coerce(&json!(3.9)), Some(Scalar::Integer(3)));
        assert_eq!(coerce(&json!(-3.9)), Some(Scalar::Integer(-3)));
        assert_eq!(coerce(&json!(0.5)), Some(Scalar::Integer(0)));
    }

    #[test]
    fn out_of_range_numbers_are_not_checked() {
        assert_eq!(coerce(&json!(u64::MAX)), Some(Scalar::Integer(-1)));
        assert_eq!(coerce(&json!(1e300)), Some(Scalar::Integer(i64::MAX)));
    }

    #[test]
    fn non_primitives_yield_nothing() {
        assert_eq!(coerce(&json!(null)), None);
        assert_eq!(coerce(&json!([1, 2])), None);
        assert_eq!(coerce(&json!({"a": 1})), None);
    }

    #[test]
    fn coercion_is_deterministic() {
        let v = json!(12.75);
        assert_eq!(coerce(&v), coerce(&v));
    }
}
