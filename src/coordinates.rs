//! Mapping between logical and physical axes, and between cartesian and
//! cylindrical coordinates.
//!
//! The cartesian frame has its origin in the upper left corner of the first
//! slice. The cylindrical frame of a radial stack has its origin at
//! `(h, r, theta) = (0, 0, 0)`, so a rotation axis through `origin` in the
//! cartesian frame is where `r == 0`.

use std::f64::consts::PI;

use crate::enums::AxisOrder;

impl AxisOrder {
    /// For every array axis of `self`, the array axis the same logical axis
    /// occupies in `to`.
    pub fn index_array(self, to: AxisOrder) -> [usize; 3] {
        self.axes().map(|axis| to.slot_of(axis))
    }
}

/// Free-function form of [`AxisOrder::index_array`].
pub fn index_array(from: AxisOrder, to: AxisOrder) -> [usize; 3] {
    from.index_array(to)
}

/// Converts a cartesian position to `[h, r, theta_index]`.
///
/// - `h` is `z`
/// - `r` is the distance from the rotation axis through `origin`
/// - `theta_index` is the angle in degrees, in `[0, 360)`, divided by
///   `angle_spacing`; it is left fractional for interpolation
///
/// On the rotation axis itself the angle is defined as 0.
#[inline]
pub fn to_cylindrical(xyz: [f64; 3], origin: [f64; 3], angle_spacing: f64) -> [f64; 3] {
    let dx = xyz[0] - origin[0];
    let dy = xyz[1] - origin[1];

    let r = dx.hypot(dy);
    let theta = if dx == 0.0 && dy == 0.0 {
        0.0
    } else {
        let degrees = dy.atan2(dx).to_degrees() + 180.0;
        if degrees >= 360.0 { degrees - 360.0 } else { degrees }
    };

    [xyz[2], r, theta / angle_spacing]
}

/// Inverse of [`to_cylindrical`]: converts `[h, r, theta_index]` back to a
/// cartesian position.
#[inline]
pub fn to_cartesian(h_r_theta: [f64; 3], origin: [f64; 3], angle_spacing: f64) -> [f64; 3] {
    let [h, r, theta_index] = h_r_theta;
    let angle = (theta_index * angle_spacing - 180.0) * PI / 180.0;

    [
        origin[0] + r * angle.cos(),
        origin[1] + r * angle.sin(),
        origin[2] + h,
    ]
}

/// Physical array axes of the logical coordinates of both volumes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AxisMapping {
    /// Array axes of the source volume holding `H`, `R` and `Theta`.
    pub source: [usize; 3],
    /// Array axes of the destination volume holding `X`, `Y` and `Z`.
    pub destination: [usize; 3],
}

impl AxisMapping {
    pub fn new(source_order: AxisOrder, destination_order: AxisOrder) -> Self {
        Self {
            source: AxisOrder::HRTheta.index_array(source_order),
            destination: AxisOrder::RThetaH.index_array(destination_order),
        }
    }

    /// Reads the logical `[x, y, z]` of a destination array index.
    #[inline]
    pub fn cartesian(&self, index: [usize; 3]) -> [f64; 3] {
        self.destination.map(|slot| index[slot] as f64)
    }

    /// Places a logical `[h, r, theta]` into the source array order.
    #[inline]
    pub fn source_position(&self, h_r_theta: [f64; 3]) -> [f64; 3] {
        let mut position = [0.0; 3];
        for (logical, &slot) in self.source.iter().enumerate() {
            position[slot] = h_r_theta[logical];
        }
        position
    }

    /// Destination extents for a source stack with `radius` and `height` extents.
    pub fn destination_dim(&self, radius: usize, height: usize) -> Option<[usize; 3]> {
        let diameter = radius.checked_mul(2)?;
        let mut dim = [0; 3];
        dim[self.destination[0]] = diameter;
        dim[self.destination[1]] = diameter;
        dim[self.destination[2]] = height;
        Some(dim)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn is_permutation(indices: [usize; 3]) -> bool {
        let mut seen = [false; 3];
        for i in indices {
            if i > 2 || seen[i] {
                return false;
            }
            seen[i] = true;
        }
        true
    }

    #[test]
    fn test_index_array_is_bijection_with_inverse() {
        for a in AxisOrder::ALL {
            for b in AxisOrder::ALL {
                let ab = index_array(a, b);
                let ba = index_array(b, a);
                assert!(is_permutation(ab), "{a} -> {b} gave {ab:?}");
                for i in 0..3 {
                    assert_eq!(ba[ab[i]], i, "{a} <-> {b}");
                }
            }
        }
    }

    #[test]
    fn test_index_array_identity_and_example() {
        assert_eq!(index_array(AxisOrder::HRTheta, AxisOrder::HRTheta), [0, 1, 2]);
        // H -> 2, R -> 0, Theta -> 1
        assert_eq!(index_array(AxisOrder::HRTheta, AxisOrder::RThetaH), [2, 0, 1]);
    }

    #[test]
    fn test_origin_maps_to_zero_radius_and_angle() {
        let origin = [50.0, 50.0, 0.0];
        for z in [0.0, 3.0, 17.5] {
            for spacing in [0.5, 1.0, 2.79] {
                let [h, r, theta] = to_cylindrical([50.0, 50.0, z], origin, spacing);
                assert_eq!(h, z);
                assert_eq!(r, 0.0);
                assert_eq!(theta, 0.0);
            }
        }
    }

    #[test]
    fn test_angles_on_the_axes() {
        let origin = [0.0; 3];
        assert!((to_cylindrical([1.0, 0.0, 0.0], origin, 1.0)[2] - 180.0).abs() < EPS);
        assert!((to_cylindrical([0.0, 1.0, 0.0], origin, 1.0)[2] - 270.0).abs() < EPS);
        assert!(to_cylindrical([-1.0, 0.0, 0.0], origin, 1.0)[2].abs() < EPS);
        assert!((to_cylindrical([0.0, -1.0, 0.0], origin, 1.0)[2] - 90.0).abs() < EPS);
    }

    #[test]
    fn test_spacing_scales_the_angle_index() {
        let origin = [0.0; 3];
        let theta = to_cylindrical([0.0, 1.0, 0.0], origin, 2.0)[2];
        assert!((theta - 135.0).abs() < EPS);
        let r = to_cylindrical([3.0, 4.0, 0.0], origin, 2.0)[1];
        assert!((r - 5.0).abs() < EPS);
    }

    #[test]
    fn test_to_cartesian_inverts_to_cylindrical() {
        let origin = [20.0, 30.0, 0.0];
        for xyz in [[25.0, 30.0, 4.0], [11.5, 42.0, 0.0], [20.0, 7.0, 9.0]] {
            let back = to_cartesian(to_cylindrical(xyz, origin, 1.5), origin, 1.5);
            for i in 0..3 {
                assert!((back[i] - xyz[i]).abs() < 1e-9, "{xyz:?} -> {back:?}");
            }
        }
    }

    #[test]
    fn test_mapping_places_coordinates() {
        let mapping = AxisMapping::new(AxisOrder::ThetaHR, AxisOrder::HThetaR);
        // Destination H_Theta_R holds Z, Y, X.
        assert_eq!(mapping.cartesian([7, 8, 9]), [9.0, 8.0, 7.0]);
        // Source Theta_H_R wants theta, h, r.
        assert_eq!(mapping.source_position([1.0, 2.0, 3.0]), [3.0, 1.0, 2.0]);
        assert_eq!(mapping.destination_dim(50, 10), Some([10, 100, 100]));
        assert_eq!(mapping.destination_dim(usize::MAX, 1), None);
    }
}
