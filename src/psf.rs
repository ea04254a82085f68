use std::f64::consts::PI;

use ndarray::prelude::*;

use crate::error::{RadpostError, Result};

/// A 2-D elliptical Gaussian beam kernel and the axes it was generated on.
#[derive(Debug, Clone)]
pub struct Psf {
    pub kernel: Array2<f64>,
    pub x: Array1<f64>,
    pub y: Array1<f64>,
}

/// Generates an elliptical Gaussian PSF.
///
/// `fwhm` holds the full width at half maximum along the two principal axes,
/// `pa_deg` the position angle of the ellipse measured from north
/// counter-clockwise, and `pscale` the pixel scale; `fwhm` must be in the
/// same unit as `pscale`.
///
/// The kernel is divided by `1 / (2*pi*sigma_x*sigma_y)` after evaluation,
/// so its center value ends up at `2*pi*sigma_x*sigma_y`. Downstream beam
/// conversions rely on this exact normalization.
pub fn generate_psf(
    nx: usize,
    ny: usize,
    fwhm: [f64; 2],
    pa_deg: f64,
    pscale: [f64; 2],
) -> Result<Psf> {
    if nx == 0 || ny == 0 {
        return Err(RadpostError::NumericDomain(format!(
            "PSF grid must be non-empty (got {} x {})",
            nx, ny
        )));
    }
    if fwhm[0] <= 0.0 || fwhm[1] <= 0.0 {
        return Err(RadpostError::NumericDomain(format!(
            "PSF FWHM components must be positive (got {} x {})",
            fwhm[0], fwhm[1]
        )));
    }

    let [dx, dy] = pscale;
    let x = Array1::from_iter((0..nx).map(|i| (i as f64 - nx as f64 / 2.0) * dx));
    let y = Array1::from_iter((0..ny).map(|j| (j as f64 - ny as f64 / 2.0) * dy));

    let sigma_x = fwhm[0] / (2.0 * (2.0 * 2.0f64.ln()).sqrt());
    let sigma_y = fwhm[1] / (2.0 * (2.0 * 2.0f64.ln()).sqrt());
    let norm = 1.0 / (2.0 * PI * sigma_x * sigma_y);

    // Position angle counts from north; rotate into the principal axes.
    let sin_pa = (pa_deg.to_radians() - PI / 2.0).sin();
    let cos_pa = (pa_deg.to_radians() - PI / 2.0).cos();

    let mut kernel = Array2::<f64>::zeros((nx, ny));
    for ix in 0..nx {
        for iy in 0..ny {
            let xx = cos_pa * x[ix] - sin_pa * y[iy];
            let yy = sin_pa * x[ix] + cos_pa * y[iy];
            kernel[[ix, iy]] =
                (-0.5 * (xx / sigma_x).powi(2) - 0.5 * (yy / sigma_y).powi(2)).exp();
        }
    }
    kernel.mapv_inplace(|v| v / norm);

    Ok(Psf { kernel, x, y })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn center_value_matches_normalization() {
        let fwhm = [2.0, 3.0];
        let psf = generate_psf(8, 8, fwhm, 0.0, [1.0, 1.0]).unwrap();
        let sigma_x = fwhm[0] / (2.0 * (2.0 * 2.0f64.ln()).sqrt());
        let sigma_y = fwhm[1] / (2.0 * (2.0 * 2.0f64.ln()).sqrt());
        // x[4] = y[4] = 0 is the kernel peak, exp(0) / norm.
        let expected = 2.0 * PI * sigma_x * sigma_y;
        assert!((psf.kernel[[4, 4]] - expected).abs() / expected < 1e-12);
    }

    #[test]
    fn symmetric_for_zero_position_angle() {
        let psf = generate_psf(8, 8, [2.0, 1.0], 0.0, [1.0, 1.0]).unwrap();
        let c = 4;
        for k in 1..4 {
            for j in 1..4 {
                let a = psf.kernel[[c + k, c + j]];
                let b = psf.kernel[[c - k, c - j]];
                assert!((a - b).abs() < 1e-12 * a.max(1e-300));
            }
        }
    }

    #[test]
    fn rotation_swaps_principal_axes() {
        // At pa = 0 the fwhm_y axis lies along image x; at pa = 90 along y.
        let psf0 = generate_psf(16, 16, [1.0, 4.0], 0.0, [1.0, 1.0]).unwrap();
        let psf90 = generate_psf(16, 16, [1.0, 4.0], 90.0, [1.0, 1.0]).unwrap();
        let c = 8;
        assert!((psf0.kernel[[c + 3, c]] - psf90.kernel[[c, c + 3]]).abs() < 1e-9);
        assert!((psf0.kernel[[c, c + 3]] - psf90.kernel[[c + 3, c]]).abs() < 1e-9);
    }

    #[test]
    fn rejects_non_positive_fwhm() {
        assert!(matches!(
            generate_psf(8, 8, [0.0, 1.0], 0.0, [1.0, 1.0]),
            Err(RadpostError::NumericDomain(_))
        ));
        assert!(matches!(
            generate_psf(0, 8, [1.0, 1.0], 0.0, [1.0, 1.0]),
            Err(RadpostError::NumericDomain(_))
        ));
    }
}
