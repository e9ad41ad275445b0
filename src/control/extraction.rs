use cgmath::Vector3;

/// Axis of greatest absolute magnitude and its signed value
///
/// Ties go to the lowest axis index.
pub fn dominant_axis(translation: Vector3<f64>) -> (usize, f64) {
    let mut best = (0, translation[0]);
    for axis in 1..3 {
        if translation[axis].abs() > best.1.abs() {
            best = (axis, translation[axis]);
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_largest_magnitude_with_sign() {
        assert_eq!(dominant_axis(Vector3::new(0.02, -0.5, 0.01)), (1, -0.5));
        assert_eq!(dominant_axis(Vector3::new(0.0, 0.1, -0.3)), (2, -0.3));
    }

    #[test]
    fn ties_resolve_to_lowest_index() {
        assert_eq!(dominant_axis(Vector3::new(0.4, -0.4, 0.4)), (0, 0.4));
        assert_eq!(dominant_axis(Vector3::new(0.0, -0.2, 0.2)), (1, -0.2));
        assert_eq!(dominant_axis(Vector3::new(0.0, 0.0, 0.0)), (0, 0.0));
    }
}
