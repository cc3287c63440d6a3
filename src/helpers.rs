use num_cmp::NumCmp;
use serde_json::Number;

/// Exact equality between a native scalar and a JSON number, regardless of
/// how either side is represented (`1`, `1u64` and `1.0` all compare equal).
#[inline]
pub(crate) fn number_eq<T>(left: T, right: &Number) -> bool
where
    T: Copy + NumCmp<u64> + NumCmp<i64> + NumCmp<f64>,
{
    if let Some(right) = right.as_u64() {
        NumCmp::num_eq(left, right)
    } else if let Some(right) = right.as_i64() {
        NumCmp::num_eq(left, right)
    } else {
        NumCmp::num_eq(left, right.as_f64().expect("always valid"))
    }
}

#[cfg(test)]
mod tests {
    use super::number_eq;
    use serde_json::{json, Value};
    use test_case::test_case;

    fn number(value: &Value) -> &serde_json::Number {
        match value {
            Value::Number(number) => number,
            _ => panic!("not a number"),
        }
    }

    #[test_case(&json!(1))]
    #[test_case(&json!(1.0))]
    fn one_is_one(value: &Value) {
        assert!(number_eq(1_u32, number(value)));
        assert!(number_eq(1_i64, number(value)));
        assert!(number_eq(1.0_f64, number(value)));
    }

    #[test_case(&json!(-3))]
    #[test_case(&json!(-3.0))]
    fn negative(value: &Value) {
        assert!(number_eq(-3_i32, number(value)));
        assert!(!number_eq(3_u64, number(value)));
    }

    #[test]
    fn large_integers_do_not_round() {
        let value = json!(u64::MAX);
        assert!(number_eq(u64::MAX, number(&value)));
        assert!(!number_eq(u64::MAX - 1, number(&value)));
    }

    #[test]
    fn fractional() {
        let value = json!(2.5);
        assert!(number_eq(2.5_f64, number(&value)));
        assert!(!number_eq(2_u32, number(&value)));
    }
}
