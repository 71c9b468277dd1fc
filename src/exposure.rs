//! Masked exposure container: pixel, mask, and variance planes plus metadata.
//!
//! This is the minimal container surface the correction needs: dimension
//! queries, whole-plane scaling, masked subtraction, and metadata access.
//! The three planes of one exposure always share identical dimensions.

use ndarray::{Array2, NdFloat, Zip};
use num_traits::NumCast;

use crate::image_size::ImageSize;
use crate::metadata::Metadata;

/// A detector exposure with pixel, mask, and variance planes.
///
/// Generic over the pixel float type; calibration pipelines use both `f32`
/// and `f64` planes depending on the detector data budget.
#[derive(Debug, Clone)]
pub struct Exposure<P: NdFloat> {
    image: Array2<P>,
    mask: Array2<u16>,
    variance: Array2<P>,
    metadata: Metadata,
}

impl<P: NdFloat> Exposure<P> {
    /// Create an exposure with zeroed planes and empty metadata.
    pub fn new(size: ImageSize) -> Self {
        Self {
            image: Array2::zeros(size.shape()),
            mask: Array2::zeros(size.shape()),
            variance: Array2::zeros(size.shape()),
            metadata: Metadata::new(),
        }
    }

    /// Assemble an exposure from existing planes.
    ///
    /// # Panics
    /// Panics if the planes do not share the same shape.
    pub fn from_planes(
        image: Array2<P>,
        mask: Array2<u16>,
        variance: Array2<P>,
        metadata: Metadata,
    ) -> Self {
        assert_eq!(
            image.dim(),
            mask.dim(),
            "mask plane shape must match image plane"
        );
        assert_eq!(
            image.dim(),
            variance.dim(),
            "variance plane shape must match image plane"
        );

        Self {
            image,
            mask,
            variance,
            metadata,
        }
    }

    /// Pixel plane dimensions.
    pub fn size(&self) -> ImageSize {
        let (rows, cols) = self.image.dim();
        ImageSize::from_width_height(cols, rows)
    }

    /// Pixel plane.
    pub fn image(&self) -> &Array2<P> {
        &self.image
    }

    /// Mutable pixel plane.
    pub fn image_mut(&mut self) -> &mut Array2<P> {
        &mut self.image
    }

    /// Mask plane.
    pub fn mask(&self) -> &Array2<u16> {
        &self.mask
    }

    /// Mutable mask plane.
    pub fn mask_mut(&mut self) -> &mut Array2<u16> {
        &mut self.mask
    }

    /// Variance plane.
    pub fn variance(&self) -> &Array2<P> {
        &self.variance
    }

    /// Mutable variance plane.
    pub fn variance_mut(&mut self) -> &mut Array2<P> {
        &mut self.variance
    }

    /// Exposure metadata.
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Mutable exposure metadata.
    pub fn metadata_mut(&mut self) -> &mut Metadata {
        &mut self.metadata
    }

    /// Scale the exposure in place.
    ///
    /// Pixels are multiplied by `factor` and the variance plane by `factor`
    /// squared, per standard error propagation for a deterministic scaling.
    pub fn scale(&mut self, factor: f64) {
        // NdFloat is only implemented for f32 and f64, and every f64 value
        // (including non-finite ones) casts into both, so this cannot fail.
        let f: P = NumCast::from(factor).unwrap();
        let f2 = f * f;
        self.image.mapv_inplace(|v| v * f);
        self.variance.mapv_inplace(|v| v * f2);
    }

    /// Subtract another exposure from this one in place.
    ///
    /// Pixels subtract element-wise, variances combine additively (the two
    /// signals are independent), and mask flags combine by bitwise OR.
    ///
    /// # Panics
    /// Panics if the exposures differ in size; callers validate dimensions
    /// before subtracting.
    pub fn subtract(&mut self, other: &Exposure<P>) {
        assert_eq!(
            self.size(),
            other.size(),
            "exposure dimensions must match for subtraction"
        );

        self.image -= &other.image;
        self.variance += &other.variance;
        Zip::from(&mut self.mask)
            .and(&other.mask)
            .for_each(|m, &o| *m |= o);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn filled(size: ImageSize, pixel: f64, variance: f64) -> Exposure<f64> {
        Exposure::from_planes(
            Array2::from_elem(size.shape(), pixel),
            Array2::zeros(size.shape()),
            Array2::from_elem(size.shape(), variance),
            Metadata::new(),
        )
    }

    #[test]
    fn test_new_is_zeroed() {
        let exposure: Exposure<f64> = Exposure::new(ImageSize::from_width_height(4, 3));
        assert_eq!(exposure.size(), ImageSize::from_width_height(4, 3));
        assert_eq!(exposure.image().sum(), 0.0);
        assert_eq!(exposure.variance().sum(), 0.0);
        assert!(exposure.metadata().is_empty());
    }

    #[test]
    #[should_panic(expected = "variance plane shape must match")]
    fn test_from_planes_rejects_shape_mismatch() {
        let _ = Exposure::from_planes(
            Array2::<f64>::zeros((3, 4)),
            Array2::zeros((3, 4)),
            Array2::zeros((4, 3)),
            Metadata::new(),
        );
    }

    #[test]
    fn test_scale_squares_into_variance() {
        let mut exposure = filled(ImageSize::from_width_height(2, 2), 10.0, 4.0);
        exposure.scale(3.0);

        assert_relative_eq!(exposure.image()[[0, 0]], 30.0);
        assert_relative_eq!(exposure.variance()[[1, 1]], 36.0);
    }

    #[test]
    fn test_subtract_combines_planes() {
        let size = ImageSize::from_width_height(2, 2);
        let mut chunk = filled(size, 100.0, 2.0);
        chunk.mask_mut()[[0, 0]] = 0b0001;

        let mut dark = filled(size, 30.0, 1.5);
        dark.mask_mut()[[0, 0]] = 0b0100;
        dark.mask_mut()[[1, 0]] = 0b0010;

        chunk.subtract(&dark);

        assert_relative_eq!(chunk.image()[[0, 1]], 70.0);
        assert_relative_eq!(chunk.variance()[[0, 1]], 3.5);
        assert_eq!(chunk.mask()[[0, 0]], 0b0101);
        assert_eq!(chunk.mask()[[1, 0]], 0b0010);
    }

    #[test]
    #[should_panic(expected = "dimensions must match")]
    fn test_subtract_rejects_size_mismatch() {
        let mut chunk = filled(ImageSize::from_width_height(2, 2), 1.0, 0.0);
        let dark = filled(ImageSize::from_width_height(2, 3), 1.0, 0.0);
        chunk.subtract(&dark);
    }

    #[test]
    fn test_scale_factor_beyond_f32_range_saturates() {
        let mut exposure: Exposure<f32> = Exposure::new(ImageSize::from_width_height(1, 1));
        exposure.image_mut().fill(1.0);
        exposure.scale(1e300);
        assert!(exposure.image()[[0, 0]].is_infinite());
    }

    #[test]
    fn test_f32_planes() {
        let mut exposure: Exposure<f32> = Exposure::new(ImageSize::from_width_height(2, 2));
        exposure.image_mut().fill(8.0);
        exposure.scale(0.5);
        assert_relative_eq!(exposure.image()[[0, 0]], 4.0f32);
    }
}
