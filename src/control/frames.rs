use cgmath::{Deg, Matrix, Matrix3, Vector3};

/// Axis order of an extrinsic Euler rotation
///
/// The n-th angle rotates about the n-th named axis of the fixed frame, so
/// `Xyz` yields `Rz(c) * Ry(b) * Rx(a)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EulerOrder {
    Xyz,
    Zyx,
}

fn about(axis: char, degrees: f64) -> Matrix3<f64> {
    match axis {
        'x' => Matrix3::from_angle_x(Deg(degrees)),
        'y' => Matrix3::from_angle_y(Deg(degrees)),
        _ => Matrix3::from_angle_z(Deg(degrees)),
    }
}

/// Rotation matrix from three extrinsic angles in degrees
pub fn extrinsic_euler_deg(angles: Vector3<f64>, order: EulerOrder) -> Matrix3<f64> {
    let axes = match order {
        EulerOrder::Xyz => ['x', 'y', 'z'],
        EulerOrder::Zyx => ['z', 'y', 'x'],
    };
    let first = about(axes[0], angles.x);
    let second = about(axes[1], angles.y);
    let third = about(axes[2], angles.z);
    third * second * first
}

/// Inverse of a pure rotation
pub fn rotation_inverse(rotation: &Matrix3<f64>) -> Matrix3<f64> {
    rotation.transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{SquareMatrix, Zero};

    const EPS: f64 = 1e-12;

    fn close(a: Vector3<f64>, b: Vector3<f64>) -> bool {
        (a - b).x.abs() < EPS && (a - b).y.abs() < EPS && (a - b).z.abs() < EPS
    }

    #[test]
    fn zero_angles_give_identity() {
        let r = extrinsic_euler_deg(Vector3::zero(), EulerOrder::Zyx);
        assert_eq!(r, Matrix3::identity());
    }

    #[test]
    fn first_angle_uses_first_axis() {
        // 90 degrees about z turns x into y
        let r = extrinsic_euler_deg(Vector3::new(90.0, 0.0, 0.0), EulerOrder::Zyx);
        assert!(close(r * Vector3::unit_x(), Vector3::unit_y()));

        let r = extrinsic_euler_deg(Vector3::new(0.0, 0.0, 90.0), EulerOrder::Xyz);
        assert!(close(r * Vector3::unit_x(), Vector3::unit_y()));
    }

    #[test]
    fn extrinsic_order_applies_first_angle_first() {
        // x by 90 then z by 90, both about fixed axes: y -> z -> z
        let r = extrinsic_euler_deg(Vector3::new(90.0, 0.0, 90.0), EulerOrder::Xyz);
        assert!(close(r * Vector3::unit_y(), Vector3::unit_z()));
        // z by 90 then x by 90: y -> -x -> -x
        let r = extrinsic_euler_deg(Vector3::new(90.0, 0.0, 90.0), EulerOrder::Zyx);
        assert!(close(r * Vector3::unit_y(), -Vector3::unit_x()));
    }

    #[test]
    fn inverse_undoes_rotation() {
        let r = extrinsic_euler_deg(Vector3::new(12.0, -40.0, 75.0), EulerOrder::Xyz);
        let v = Vector3::new(0.3, -1.2, 2.0);
        assert!(close(rotation_inverse(&r) * (r * v), v));
    }
}
