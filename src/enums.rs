use std::fmt;
use std::str::FromStr;

use crate::error::ReconstructionError;

/// Logical axis of a radial stack.
///
/// In a reconstructed (cartesian) volume the same labels stand for the
/// cartesian axes: `Radius` is X, `Angle` is Y (the second axis of the
/// rotation plane) and `Height` is Z.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    Height,
    Radius,
    Angle,
}

impl Axis {
    fn name(self) -> &'static str {
        match self {
            Axis::Height => "H",
            Axis::Radius => "R",
            Axis::Angle => "Theta",
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Axis {
    type Err = ReconstructionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "H" => Ok(Axis::Height),
            "R" => Ok(Axis::Radius),
            "Theta" => Ok(Axis::Angle),
            _ => Err(ReconstructionError::InvalidOrder(s.to_string())),
        }
    }
}

/// Physical order of the three array axes of a volume.
///
/// The variant name lists the logical axis stored in array axis 0, 1 and 2.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum AxisOrder {
    #[default]
    HRTheta,
    HThetaR,
    RHTheta,
    RThetaH,
    ThetaRH,
    ThetaHR,
}

impl AxisOrder {
    pub const ALL: [AxisOrder; 6] = [
        AxisOrder::HRTheta,
        AxisOrder::HThetaR,
        AxisOrder::RHTheta,
        AxisOrder::RThetaH,
        AxisOrder::ThetaRH,
        AxisOrder::ThetaHR,
    ];

    /// Logical axis held by each array axis.
    pub fn axes(self) -> [Axis; 3] {
        use Axis::*;
        match self {
            AxisOrder::HRTheta => [Height, Radius, Angle],
            AxisOrder::HThetaR => [Height, Angle, Radius],
            AxisOrder::RHTheta => [Radius, Height, Angle],
            AxisOrder::RThetaH => [Radius, Angle, Height],
            AxisOrder::ThetaRH => [Angle, Radius, Height],
            AxisOrder::ThetaHR => [Angle, Height, Radius],
        }
    }

    /// Array axis holding `axis`.
    pub fn slot_of(self, axis: Axis) -> usize {
        match self.axes() {
            [a, _, _] if a == axis => 0,
            [_, b, _] if b == axis => 1,
            _ => 2,
        }
    }

    /// Build an order from the logical axis of each array axis.
    ///
    /// # Errors
    ///
    /// Returns [`ReconstructionError::InvalidOrder`] unless `axes` names every
    /// logical axis exactly once.
    pub fn from_axes(axes: [Axis; 3]) -> Result<Self, ReconstructionError> {
        Self::ALL
            .into_iter()
            .find(|order| order.axes() == axes)
            .ok_or_else(|| {
                ReconstructionError::InvalidOrder(format!("{}_{}_{}", axes[0], axes[1], axes[2]))
            })
    }
}

impl fmt::Display for AxisOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c] = self.axes();
        write!(f, "{a}_{b}_{c}")
    }
}

impl FromStr for AxisOrder {
    type Err = ReconstructionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ReconstructionError::InvalidOrder(s.to_string());
        let parts: Vec<&str> = s.split('_').collect();
        let [a, b, c] = parts.as_slice() else {
            return Err(invalid());
        };
        let axes = [
            a.parse().map_err(|_| invalid())?,
            b.parse().map_err(|_| invalid())?,
            c.parse().map_err(|_| invalid())?,
        ];
        Self::from_axes(axes).map_err(|_| invalid())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_and_parse_agree() {
        for order in AxisOrder::ALL {
            let parsed: AxisOrder = order.to_string().parse().unwrap();
            assert_eq!(parsed, order);
        }
        assert_eq!(AxisOrder::HRTheta.to_string(), "H_R_Theta");
        assert_eq!(AxisOrder::ThetaHR.to_string(), "Theta_H_R");
    }

    #[test]
    fn test_rejects_non_permutations() {
        assert!(matches!(
            "H_H_Theta".parse::<AxisOrder>(),
            Err(ReconstructionError::InvalidOrder(_))
        ));
        assert!(matches!(
            "H_R".parse::<AxisOrder>(),
            Err(ReconstructionError::InvalidOrder(_))
        ));
        assert!(matches!(
            "X_Y_Z".parse::<AxisOrder>(),
            Err(ReconstructionError::InvalidOrder(_))
        ));
        assert!(AxisOrder::from_axes([Axis::Angle, Axis::Angle, Axis::Radius]).is_err());
    }

    #[test]
    fn test_slot_of_matches_axes() {
        for order in AxisOrder::ALL {
            for (slot, axis) in order.axes().into_iter().enumerate() {
                assert_eq!(order.slot_of(axis), slot);
            }
        }
    }
}
