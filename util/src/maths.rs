//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

/// Clamp a value into the range `[min, max]`.
pub fn clamp<T>(value: T, min: T, max: T) -> T
where
    T: Float,
{
    if value > max {
        max
    } else if value < min {
        min
    } else {
        value
    }
}

/// Return the euclidian norm (distance between) of two points.
///
/// If the points do not have the same number of dimentions then `None` is 
/// returned.
pub fn norm<T>(point_0: &[T], point_1: &[T]) -> Option<T>
where
    T: Float,
{
    if point_0.len() != point_1.len() {
        return None;
    }

    let sum = point_0
        .iter()
        .zip(point_1.iter())
        .fold(T::zero(), |acc, (&a, &b)| acc + (a - b).powi(2));

    Some(sum.sqrt())
}

/// Arithmetic mean of the values, or `None` if there are none.
pub fn mean<T>(values: &[T]) -> Option<T>
where
    T: Float,
{
    if values.is_empty() {
        return None;
    }

    let sum = values.iter().fold(T::zero(), |acc, &v| acc + v);

    T::from(values.len()).map(|n| sum / n)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_clamp() {
        assert_eq!(clamp(20f64, -15.0, 15.0), 15.0);
        assert_eq!(clamp(-20f64, -15.0, 15.0), -15.0);
        assert_eq!(clamp(3.5f64, -15.0, 15.0), 3.5);
    }

    #[test]
    fn test_norm() {
        assert_eq!(norm(&[0f64, 0.0], &[3.0, 4.0]), Some(5.0));
        assert_eq!(norm(&[1f64, 1.0], &[1.0, 1.0]), Some(0.0));
        assert_eq!(norm(&[1f64], &[1.0, 1.0]), None);
    }

    #[test]
    fn test_mean() {
        assert_eq!(mean(&[1f64, 2.0, 3.0]), Some(2.0));
        assert_eq!(mean::<f64>(&[]), None);
    }
}
