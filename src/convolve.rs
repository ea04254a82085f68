use std::f64::consts::PI;

use ndarray::prelude::*;
use num_complex::Complex;

use crate::error::{RadpostError, Result};
use crate::fft::{fft2, ifft2, ifftshift2};
use crate::image::{ImageCube, AU, PC};
use crate::psf::generate_psf;

type C64 = Complex<f64>;

/// Convolves one image plane with the beam in the frequency domain. The
/// magnitude of the back-transform is shifted so the result stays aligned
/// with the input (the kernel is centered, not origin-anchored).
fn convolve_plane(plane: ArrayView2<f64>, f_psf: &Array2<C64>) -> Array2<f64> {
    let f_img = fft2(&plane.mapv(|v| C64::new(v, 0.0)));
    let f_conv = &f_img * f_psf;
    let back = ifft2(&f_conv);
    ifftshift2(&back.mapv(|z| z.norm()))
}

/// Convolves a cube with an elliptical Gaussian beam of the given FWHM
/// [arcsec] and position angle [deg], for a source at `dpc` parsec.
///
/// Every (stokes, frequency) plane is processed independently; the result
/// is a new cube in erg/s/cm^2/Hz/beam with the beam attached as
/// provenance, and `jyppix` rescaled to Jy/beam.
pub fn convolve(cube: &ImageCube, fwhm: [f64; 2], pa_deg: f64, dpc: f64) -> Result<ImageCube> {
    if dpc <= 0.0 {
        return Err(RadpostError::NumericDomain(format!(
            "distance must be positive (got {} pc)",
            dpc
        )));
    }

    let dx = cube.sizepix_x / AU / dpc;
    let dy = cube.sizepix_y / AU / dpc;
    let psf = generate_psf(cube.nx, cube.ny, fwhm, pa_deg, [dx, dy])?;
    let f_psf = fft2(&psf.kernel.mapv(|v| C64::new(v, 0.0)));

    let mut out = ArrayD::<f64>::zeros(cube.data.raw_dim());
    match (cube.data.ndim(), cube.stokes) {
        (2, _) => {
            let d = cube.data.view().into_dimensionality::<Ix2>().unwrap();
            out.view_mut()
                .into_dimensionality::<Ix2>()
                .unwrap()
                .assign(&convolve_plane(d, &f_psf));
        }
        // Single-frequency Stokes cube: the third axis holds I,Q,U,V.
        (3, true) => {
            let d = cube.data.view().into_dimensionality::<Ix3>().unwrap();
            let mut o = out.view_mut().into_dimensionality::<Ix3>().unwrap();
            for istokes in 0..4 {
                o.slice_mut(s![.., .., istokes])
                    .assign(&convolve_plane(d.slice(s![.., .., istokes]), &f_psf));
            }
        }
        (3, false) => {
            let d = cube.data.view().into_dimensionality::<Ix3>().unwrap();
            let mut o = out.view_mut().into_dimensionality::<Ix3>().unwrap();
            for ifreq in 0..cube.nfreq() {
                o.slice_mut(s![.., .., ifreq])
                    .assign(&convolve_plane(d.slice(s![.., .., ifreq]), &f_psf));
            }
        }
        (4, true) => {
            let d = cube.data.view().into_dimensionality::<Ix4>().unwrap();
            let mut o = out.view_mut().into_dimensionality::<Ix4>().unwrap();
            for ifreq in 0..cube.nfreq() {
                for istokes in 0..4 {
                    o.slice_mut(s![.., .., istokes, ifreq]).assign(&convolve_plane(
                        d.slice(s![.., .., istokes, ifreq]),
                        &f_psf,
                    ));
                }
            }
        }
        (rank, stokes) => {
            return Err(RadpostError::DimensionMismatch(format!(
                "cannot convolve a rank-{} image with stokes = {}",
                rank, stokes
            )))
        }
    }

    // Per-steradian to per-beam intensity.
    let conv = cube.sizepix_x * cube.sizepix_y / (dpc * PC).powi(2)
        / (fwhm[0] * fwhm[1] * PI / (4.0 * 2.0f64.ln()));
    out.mapv_inplace(|v| v * conv);

    let mut res = cube.clone();
    res.jyppix = out.mapv(|v| v * 1e23);
    res.data = out;
    res.psf = Some(psf);
    res.fwhm = Some(fwhm);
    res.pa = pa_deg;
    res.dpc = dpc;
    Ok(res)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::ArrayD;

    fn beam_factor(fwhm: [f64; 2], sizepix: f64, dpc: f64) -> f64 {
        // Scale expected for a near-impulse kernel: the kernel collapses to
        // its center value 2*pi*sigma_x*sigma_y, times the beam conversion.
        let s = 2.0 * (2.0 * 2.0f64.ln()).sqrt();
        let kernel_center = 2.0 * PI * (fwhm[0] / s) * (fwhm[1] / s);
        let conv = sizepix * sizepix / (dpc * PC).powi(2)
            / (fwhm[0] * fwhm[1] * PI / (4.0 * 2.0f64.ln()));
        kernel_center * conv
    }

    #[test]
    fn near_impulse_kernel_reproduces_the_image() {
        let nx = 8;
        let data = ArrayD::from_shape_fn(IxDyn(&[nx, nx, 1]), |ix| {
            (ix[0] * nx + ix[1]) as f64 + 1.0
        });
        let wav = Array1::from_elem(1, 870.0);
        let cube = ImageCube::new(data, 1e13, 1e13, wav, false).unwrap();

        // FWHM far below the pixel scale: the kernel is a scaled impulse.
        let fwhm = [1e-6, 1e-6];
        let res = convolve(&cube, fwhm, 0.0, 100.0).unwrap();

        let k = beam_factor(fwhm, 1e13, 100.0);
        for ix in 0..nx {
            for iy in 0..nx {
                let got = res.data[[ix, iy, 0]];
                let want = cube.data[[ix, iy, 0]] * k;
                assert!(
                    (got - want).abs() <= want.abs() * 1e-9,
                    "pixel ({}, {}): got {}, want {}",
                    ix,
                    iy,
                    got,
                    want
                );
            }
        }
        assert!((res.jyppix[[3, 3, 0]] - res.data[[3, 3, 0]] * 1e23).abs() < 1e-30);
        assert_eq!(res.fwhm, Some(fwhm));
        assert!(res.psf.is_some());
    }

    #[test]
    fn single_frequency_stokes_cube_dispatches_over_stokes_axis() {
        let nx = 4;
        let data = ArrayD::from_shape_fn(IxDyn(&[nx, nx, 4]), |ix| {
            (ix[2] + 1) as f64 * ((ix[0] * nx + ix[1]) as f64 + 1.0)
        });
        let wav = Array1::from_elem(1, 1300.0);
        let cube = ImageCube::new(data, 1e13, 1e13, wav, true).unwrap();

        let fwhm = [1e-6, 1e-6];
        let res = convolve(&cube, fwhm, 0.0, 50.0).unwrap();
        assert_eq!(res.data.shape(), &[nx, nx, 4]);

        let k = beam_factor(fwhm, 1e13, 50.0);
        for istokes in 0..4 {
            let got = res.data[[1, 2, istokes]];
            let want = cube.data[[1, 2, istokes]] * k;
            assert!((got - want).abs() <= want.abs() * 1e-9);
        }
    }

    #[test]
    fn rejects_non_positive_distance() {
        let data = ArrayD::zeros(IxDyn(&[4, 4, 1]));
        let wav = Array1::from_elem(1, 870.0);
        let cube = ImageCube::new(data, 1e13, 1e13, wav, false).unwrap();
        assert!(matches!(
            convolve(&cube, [0.1, 0.1], 0.0, 0.0),
            Err(RadpostError::NumericDomain(_))
        ));
    }
}
