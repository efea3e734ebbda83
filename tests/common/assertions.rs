//! Assertion utilities for testing.
//!
//! This module provides helper functions for making assertions in tests,
//! particularly for floating-point comparisons.

#![allow(dead_code)]

/// Default epsilon for floating-point comparisons
pub const DEFAULT_EPSILON: f64 = 1e-9;

/// Assert that two floating-point values are approximately equal.
///
/// # Panics
///
/// Panics if the absolute difference between `actual` and `expected` is greater than `epsilon`.
pub fn assert_approx_eq(actual: f64, expected: f64, epsilon: Option<f64>) {
    let epsilon = epsilon.unwrap_or(DEFAULT_EPSILON);
    let diff = (actual - expected).abs();
    assert!(
        diff <= epsilon,
        "Values differ: actual = {}, expected = {}, diff = {}, epsilon = {}",
        actual,
        expected,
        diff,
        epsilon
    );
}

/// Assert that a sequence is strictly increasing
pub fn assert_strictly_increasing(values: &[f64]) {
    for pair in values.windows(2) {
        assert!(
            pair[0] < pair[1],
            "Sequence not strictly increasing at {} -> {}: {:?}",
            pair[0],
            pair[1],
            values
        );
    }
}

/// Assert that consecutive values are separated by one common step
pub fn assert_evenly_spaced(values: &[f64], epsilon: Option<f64>) {
    if values.len() < 3 {
        return;
    }
    let step = values[1] - values[0];
    for pair in values.windows(2) {
        assert_approx_eq(pair[1] - pair[0], step, epsilon);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assert_approx_eq() {
        assert_approx_eq(1.0, 1.0 + 1e-12, None);
        assert_approx_eq(1.0, 1.05, Some(0.1));
    }

    #[test]
    #[should_panic]
    fn test_assert_approx_eq_fails() {
        assert_approx_eq(1.0, 1.1, None);
    }

    #[test]
    fn test_sequences() {
        assert_strictly_increasing(&[0.0, 12.5, 25.0]);
        assert_evenly_spaced(&[0.0, 12.5, 25.0, 37.5], None);
    }
}
