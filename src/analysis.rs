//! Summary statistics over a list of numbers.

use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::error::AppError;

/// Summary of an `/analyze` input.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    /// Arithmetic mean (sum / count).
    #[serde(serialize_with = "json_number")]
    pub mean: f64,
    /// Sum of all values.
    #[serde(serialize_with = "json_number")]
    pub sum: f64,
    /// Smallest value.
    #[serde(serialize_with = "json_number")]
    pub min: f64,
    /// Largest value.
    #[serde(serialize_with = "json_number")]
    pub max: f64,
    /// Number of values.
    pub count: usize,
}

/// Largest integer magnitude an f64 represents exactly.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// Serialize integral floats as JSON integers, so `10.0` becomes `10`.
fn json_number<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if value.fract() == 0.0 && value.abs() <= MAX_SAFE_INTEGER {
        serializer.serialize_i64(*value as i64)
    } else {
        serializer.serialize_f64(*value)
    }
}

/// Compute the summary of `numbers`. Returns `None` for an empty slice.
pub fn summarize(numbers: &[f64]) -> Option<Summary> {
    let (&first, rest) = numbers.split_first()?;

    let (sum, min, max) = rest
        .iter()
        .fold((first, first, first), |(sum, min, max), &n| {
            (sum + n, min.min(n), max.max(n))
        });
    let count = numbers.len();

    Some(Summary {
        mean: sum / count as f64,
        sum,
        min,
        max,
        count,
    })
}

/// Read one element: a JSON number, or a string holding a finite number
/// (form bodies carry every value as a string).
fn as_number(item: &Value) -> Option<f64> {
    match item {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        _ => None,
    }
}

/// Extract the `numbers` array from an untyped request body.
///
/// An empty array is returned as-is; [`summarize`] decides what to do with it.
pub fn numbers_from_body(body: &Value) -> Result<Vec<f64>, AppError> {
    let items = body
        .get("numbers")
        .and_then(Value::as_array)
        .ok_or_else(|| AppError::BadRequest("numbers array is required".to_string()))?;

    items
        .iter()
        .map(|item| {
            as_number(item).ok_or_else(|| {
                AppError::BadRequest("numbers must contain only numeric values".to_string())
            })
        })
        .collect()
}

/// Validate `body` and summarize its `numbers`.
pub fn analyze(body: &Value) -> Result<Summary, AppError> {
    let numbers = numbers_from_body(body)?;
    summarize(&numbers)
        .ok_or_else(|| AppError::BadRequest("numbers array must not be empty".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn summarizes_example_input() {
        let summary = summarize(&[1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_eq!(
            serde_json::to_value(&summary).unwrap(),
            json!({ "mean": 2.5, "sum": 10, "min": 1, "max": 4, "count": 4 })
        );
    }

    #[test]
    fn bounds_hold_for_mixed_values() {
        let numbers = [3.5, -2.0, 10.25, 0.0, 7.0];
        let summary = summarize(&numbers).unwrap();

        assert_eq!(summary.count, numbers.len());
        assert!((summary.sum - numbers.iter().sum::<f64>()).abs() < 1e-9);
        assert!((summary.mean - summary.sum / 5.0).abs() < 1e-9);
        for n in numbers {
            assert!(summary.min <= n && n <= summary.max);
        }
        assert_eq!(summary.min, -2.0);
        assert_eq!(summary.max, 10.25);
    }

    #[test]
    fn single_value_summary() {
        let summary = summarize(&[42.0]).unwrap();
        assert_eq!(summary.mean, 42.0);
        assert_eq!(summary.min, summary.max);
    }

    #[test]
    fn empty_input_has_no_summary() {
        assert!(summarize(&[]).is_none());
    }

    #[test]
    fn numbers_from_body_rejects_missing_and_wrong_shape() {
        for body in [
            json!({}),
            json!({ "numbers": 5 }),
            json!({ "numbers": "1,2,3" }),
            json!({ "numbers": null }),
            json!({ "numbers": { "a": 1 } }),
            json!([1, 2, 3]),
        ] {
            let err = numbers_from_body(&body).unwrap_err();
            assert!(matches!(err, AppError::BadRequest(ref m) if !m.is_empty()));
        }
    }

    #[test]
    fn numbers_from_body_rejects_non_numeric() {
        for numbers in [json!([1, "two"]), json!([1, ""]), json!(["NaN"]), json!([[1]]), json!([null])] {
            assert!(numbers_from_body(&json!({ "numbers": numbers })).is_err());
        }
    }

    #[test]
    fn numbers_from_body_accepts_numeric_strings() {
        let numbers = numbers_from_body(&json!({ "numbers": ["1", " 2.5 ", "-3"] })).unwrap();
        assert_eq!(numbers, vec![1.0, 2.5, -3.0]);
    }

    #[test]
    fn analyze_rejects_empty_numbers() {
        assert_eq!(numbers_from_body(&json!({ "numbers": [] })).unwrap(), Vec::<f64>::new());

        let err = analyze(&json!({ "numbers": [] })).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(ref m) if m == "numbers array must not be empty"));
    }

    #[test]
    fn analyze_summarizes_valid_body() {
        let summary = analyze(&json!({ "numbers": [1, 2, 3, 4] })).unwrap();
        assert_eq!(summary.sum, 10.0);
        assert_eq!(summary.count, 4);
    }

    #[test]
    fn numbers_from_body_accepts_integers_and_floats() {
        let numbers = numbers_from_body(&json!({ "numbers": [1, 2.5, -3] })).unwrap();
        assert_eq!(numbers, vec![1.0, 2.5, -3.0]);
    }
}
