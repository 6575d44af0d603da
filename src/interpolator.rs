use ndarray::ArrayView3;

/// How an axis is read outside `[0, extent)`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Extension {
    /// Samples outside the volume are zero.
    #[default]
    Zero,
    /// The axis wraps around, e.g. the angle axis of a full revolution.
    Periodic,
}

/// Continuous read access into a volume.
///
/// Positions are real-valued array indices; values between lattice points
/// are trilinearly interpolated. A `Sampler` is a cheap view and can be
/// copied into every worker.
#[derive(Clone, Copy, Debug)]
pub struct Sampler<'a> {
    data: ArrayView3<'a, f32>,
    extension: [Extension; 3],
}

impl<'a> Sampler<'a> {
    /// Sampler with zero extension on every axis.
    pub fn new(data: ArrayView3<'a, f32>) -> Self {
        Self::with_extension(data, [Extension::Zero; 3])
    }

    pub fn with_extension(data: ArrayView3<'a, f32>, extension: [Extension; 3]) -> Self {
        Self { data, extension }
    }

    pub fn extension(&self) -> [Extension; 3] {
        self.extension
    }

    #[inline]
    pub fn sample(&self, position: [f64; 3]) -> f32 {
        Interpolator::trilinear_interpolate(&self.data, position, &self.extension)
    }
}

pub(crate) struct Interpolator;

impl Interpolator {
    #[inline]
    fn fetch(data: &ArrayView3<f32>, index: [isize; 3], extension: &[Extension; 3]) -> f32 {
        let (d0, d1, d2) = data.dim();
        let dim = [d0, d1, d2];
        let mut resolved = [0usize; 3];

        for axis in 0..3 {
            let len = dim[axis] as isize;
            let i = index[axis];
            resolved[axis] = match extension[axis] {
                _ if len == 0 => return 0.0,
                Extension::Zero if i < 0 || i >= len => return 0.0,
                Extension::Zero => i as usize,
                Extension::Periodic => i.rem_euclid(len) as usize,
            };
        }

        data[resolved]
    }

    #[inline]
    pub(crate) fn trilinear_interpolate(
        data: &ArrayView3<f32>,
        position: [f64; 3],
        extension: &[Extension; 3],
    ) -> f32 {
        let floor = position.map(f64::floor);
        let i0 = floor.map(|f| f as isize);
        let t = [
            (position[0] - floor[0]) as f32,
            (position[1] - floor[1]) as f32,
            (position[2] - floor[2]) as f32,
        ];
        let i1 = i0.map(|i| i.saturating_add(1));

        let at = |a: isize, b: isize, c: isize| Self::fetch(data, [a, b, c], extension);

        let lerp = |v0: f32, v1: f32, t: f32| v0.mul_add(1.0 - t, v1 * t);

        let c00 = lerp(at(i0[0], i0[1], i0[2]), at(i0[0], i0[1], i1[2]), t[2]);
        let c01 = lerp(at(i0[0], i1[1], i0[2]), at(i0[0], i1[1], i1[2]), t[2]);
        let c10 = lerp(at(i1[0], i0[1], i0[2]), at(i1[0], i0[1], i1[2]), t[2]);
        let c11 = lerp(at(i1[0], i1[1], i0[2]), at(i1[0], i1[1], i1[2]), t[2]);

        let c0 = lerp(c00, c01, t[1]);
        let c1 = lerp(c10, c11, t[1]);

        lerp(c0, c1, t[0])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;

    fn ramp() -> Array3<f32> {
        // v = 100 i + 10 j + k is linear, so trilinear sampling is exact inside.
        Array3::from_shape_fn((3, 4, 5), |(i, j, k)| (100 * i + 10 * j + k) as f32)
    }

    #[test]
    fn test_lattice_points_are_exact() {
        let data = ramp();
        let sampler = Sampler::new(data.view());
        assert_eq!(sampler.sample([0.0, 0.0, 0.0]), 0.0);
        assert_eq!(sampler.sample([2.0, 3.0, 4.0]), 234.0);
        assert_eq!(sampler.sample([1.0, 2.0, 3.0]), 123.0);
    }

    #[test]
    fn test_interpolates_linear_field() {
        let data = ramp();
        let sampler = Sampler::new(data.view());
        let v = sampler.sample([0.5, 1.25, 2.75]);
        assert!((v - 65.25).abs() < 1e-4, "{v}");
    }

    #[test]
    fn test_zero_extension_outside() {
        let data = Array3::from_elem((2, 2, 2), 4.0f32);
        let sampler = Sampler::new(data.view());
        assert_eq!(sampler.sample([-1.0, 0.0, 0.0]), 0.0);
        assert_eq!(sampler.sample([0.0, 0.0, 5.0]), 0.0);
        // Halfway past the last sample blends with the zero border.
        assert!((sampler.sample([0.0, 0.0, 1.5]) - 2.0).abs() < 1e-6);
        // Exactly on the last sample there is no blending.
        assert_eq!(sampler.sample([1.0, 1.0, 1.0]), 4.0);
    }

    #[test]
    fn test_periodic_extension_wraps() {
        let data = Array3::from_shape_fn((1, 1, 4), |(_, _, k)| k as f32);
        let sampler = Sampler::with_extension(
            data.view(),
            [Extension::Zero, Extension::Zero, Extension::Periodic],
        );
        assert_eq!(sampler.sample([0.0, 0.0, 4.0]), 0.0);
        assert_eq!(sampler.sample([0.0, 0.0, 5.0]), 1.0);
        assert_eq!(sampler.sample([0.0, 0.0, -1.0]), 3.0);
        // Between the last slice (3) and the first (0).
        assert!((sampler.sample([0.0, 0.0, 3.5]) - 1.5).abs() < 1e-6);
    }

    #[test]
    fn test_constant_volume_is_preserved() {
        let data = Array3::from_elem((4, 4, 4), 7.0f32);
        let sampler = Sampler::new(data.view());
        for position in [[0.3, 1.7, 2.2], [2.9, 0.1, 1.0], [1.5, 1.5, 1.5]] {
            assert!((sampler.sample(position) - 7.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_empty_volume_reads_zero() {
        let data = Array3::<f32>::zeros((0, 3, 3));
        let sampler = Sampler::new(data.view());
        assert_eq!(sampler.sample([0.0, 1.0, 1.0]), 0.0);
    }
}
