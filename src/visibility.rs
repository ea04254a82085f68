use std::f64::consts::PI;

use ndarray::prelude::*;
use num_complex::Complex;
use rayon::prelude::*;

use crate::error::{RadpostError, Result};
use crate::image::{ImageCube, ARCSEC_PER_RAD, AU};

type C64 = Complex<f64>;

/// Complex visibilities sampled at (baseline, wavelength) points, with the
/// spatial frequencies and derived amplitude/phase. Shapes are (nbl, nwav).
#[derive(Debug, Clone)]
pub struct VisibilityResult {
    /// Projected baseline lengths [m].
    pub bl: Array1<f64>,
    /// Baseline position angles, consumed directly by cos/sin.
    pub pa: Array1<f64>,
    pub u: Array2<f64>,
    pub v: Array2<f64>,
    pub vis: Array2<C64>,
    pub amp: Array2<f64>,
    /// Fourier phase in [0, 2*pi) radians.
    pub phase: Array2<f64>,
    /// Wavelength grid [micron].
    pub wav: Array1<f64>,
}

impl VisibilityResult {
    pub fn nbl(&self) -> usize {
        self.bl.len()
    }

    pub fn nwav(&self) -> usize {
        self.wav.len()
    }
}

/// Direct Fourier sum of one image plane at a single (u, v) point.
///
/// Accumulation runs x-outer / y-inner; parallel callers must not split a
/// slot, so each slot's floating-point summation order is reproducible.
fn dft_point(
    plane: ArrayView2<f64>,
    l: &Array1<f64>,
    m: &Array1<f64>,
    u: f64,
    v: f64,
    dl: f64,
    dm: f64,
) -> C64 {
    let mut acc = C64::new(0.0, 0.0);
    for (il, &lv) in l.iter().enumerate() {
        for (im, &mv) in m.iter().enumerate() {
            let ph = 2.0 * PI * (u * lv + v * mv);
            acc += plane[[il, im]] * C64::new(ph.cos(), -ph.sin());
        }
    }
    acc * dl * dm
}

/// Resolves the arccos sign ambiguity: the phase of `vis` mapped into
/// [0, 2*pi), with the cosine ratio clamped against rounding excursions
/// outside [-1, 1].
fn phase_of(vis: C64, amp: f64) -> f64 {
    if amp == 0.0 {
        return 0.0;
    }
    let mut phase = (vis.re / amp).clamp(-1.0, 1.0).acos();
    if vis.im < 0.0 {
        phase = 2.0 * PI - phase;
    }
    phase
}

/// Computes complex visibilities of a spectral cube for a set of projected
/// baselines [m] and position angles, at a source distance of `dpc` parsec,
/// by direct discrete Fourier summation over the image pixels.
///
/// The quadrature is exact for the sampled (u, v) points, which are
/// continuous and not restricted to any FFT grid; the cost is
/// O(nbl * nwav * nx * ny) by construction. Independent (baseline,
/// wavelength) slots are evaluated in parallel.
pub fn compute_visibilities(
    cube: &ImageCube,
    bl: &[f64],
    pa: &[f64],
    dpc: f64,
) -> Result<VisibilityResult> {
    if dpc <= 0.0 {
        return Err(RadpostError::NumericDomain(format!(
            "distance must be positive (got {} pc)",
            dpc
        )));
    }
    if bl.len() != pa.len() {
        return Err(RadpostError::DimensionMismatch(format!(
            "{} baselines but {} position angles",
            bl.len(),
            pa.len()
        )));
    }
    if bl.is_empty() {
        return Err(RadpostError::DimensionMismatch(
            "at least one baseline is required".to_string(),
        ));
    }
    if cube.stokes || cube.data.ndim() != 3 {
        return Err(RadpostError::DimensionMismatch(format!(
            "visibilities require an intensity cube of shape (nx, ny, nfreq); \
             got rank {} with stokes = {}",
            cube.data.ndim(),
            cube.stokes
        )));
    }
    if cube.nx < 2 || cube.ny < 2 {
        return Err(RadpostError::DimensionMismatch(
            "the image needs at least 2 pixels per axis".to_string(),
        ));
    }

    let data = cube.data.view().into_dimensionality::<Ix3>().unwrap();
    let nbl = bl.len();
    let nwav = cube.nfreq();

    // Angular sky coordinates [rad] of the pixel centers.
    let l = cube.x.mapv(|x| x / AU / dpc / ARCSEC_PER_RAD);
    let m = cube.y.mapv(|y| y / AU / dpc / ARCSEC_PER_RAD);
    let dl = l[1] - l[0];
    let dm = m[1] - m[0];

    let bl = Array1::from_vec(bl.to_vec());
    let pa = Array1::from_vec(pa.to_vec());

    let mut u = Array2::<f64>::zeros((nbl, nwav));
    let mut v = Array2::<f64>::zeros((nbl, nwav));
    for ibl in 0..nbl {
        for iwav in 0..nwav {
            // Meter baselines against micron wavelengths.
            u[[ibl, iwav]] = bl[ibl] * pa[ibl].cos() * 1e6 / cube.wav[iwav];
            v[[ibl, iwav]] = bl[ibl] * pa[ibl].sin() * 1e6 / cube.wav[iwav];
        }
    }

    let slots: Vec<(usize, usize)> = (0..nbl)
        .flat_map(|ibl| (0..nwav).map(move |iwav| (ibl, iwav)))
        .collect();
    let computed: Vec<C64> = slots
        .par_iter()
        .map(|&(ibl, iwav)| {
            let plane = data.slice(s![.., .., iwav]);
            dft_point(plane, &l, &m, u[[ibl, iwav]], v[[ibl, iwav]], dl, dm)
        })
        .collect();

    let mut vis = Array2::<C64>::from_elem((nbl, nwav), C64::new(0.0, 0.0));
    let mut amp = Array2::<f64>::zeros((nbl, nwav));
    let mut phase = Array2::<f64>::zeros((nbl, nwav));
    for (&(ibl, iwav), &value) in slots.iter().zip(computed.iter()) {
        vis[[ibl, iwav]] = value;
        amp[[ibl, iwav]] = value.norm();
        phase[[ibl, iwav]] = phase_of(value, amp[[ibl, iwav]]);
    }

    Ok(VisibilityResult {
        bl,
        pa,
        u,
        v,
        vis,
        amp,
        phase,
        wav: cube.wav.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::ArrayD;

    fn test_cube(nx: usize, ny: usize, wavs: &[f64], fill: f64) -> ImageCube {
        let data = ArrayD::from_elem(IxDyn(&[nx, ny, wavs.len()]), fill);
        ImageCube::new(data, 1e13, 1e13, Array1::from_vec(wavs.to_vec()), false).unwrap()
    }

    #[test]
    fn zero_baseline_recovers_total_flux() {
        let cube = test_cube(4, 4, &[870.0, 1300.0], 1.5);
        let res = compute_visibilities(&cube, &[0.0], &[0.0], 10.0).unwrap();

        let dl = (cube.x[1] - cube.x[0]) / AU / 10.0 / ARCSEC_PER_RAD;
        let flux = 1.5 * 16.0 * dl * dl;
        for iwav in 0..2 {
            assert_eq!(res.u[[0, iwav]], 0.0);
            assert_eq!(res.v[[0, iwav]], 0.0);
            assert!((res.amp[[0, iwav]] - flux).abs() <= flux * 1e-12);
            assert_eq!(res.phase[[0, iwav]], 0.0);
        }
    }

    #[test]
    fn point_source_amplitude_is_flux_at_any_baseline() {
        let mut data = ArrayD::zeros(IxDyn(&[4, 4, 1]));
        data[[1, 2, 0]] = 3.0;
        let cube = ImageCube::new(data, 1e13, 1e13, Array1::from_elem(1, 870.0), false).unwrap();

        let res = compute_visibilities(&cube, &[0.0, 50.0, 120.0], &[0.0, 0.3, 1.2], 10.0).unwrap();
        let dl = (cube.x[1] - cube.x[0]) / AU / 10.0 / ARCSEC_PER_RAD;
        let flux = 3.0 * dl * dl;
        for ibl in 0..3 {
            assert!((res.amp[[ibl, 0]] - flux).abs() <= flux * 1e-12);
        }
        // The off-center pixel gives a nonzero phase on nonzero baselines.
        assert!(res.phase[[1, 0]] > 0.0);
    }

    #[test]
    fn point_source_phase_matches_analytic_value() {
        let mut data = ArrayD::zeros(IxDyn(&[4, 4, 1]));
        data[[3, 0, 0]] = 2.0;
        let cube = ImageCube::new(data, 1e13, 1e13, Array1::from_elem(1, 870.0), false).unwrap();

        let res = compute_visibilities(&cube, &[80.0], &[0.7], 10.0).unwrap();
        let l = cube.x[3] / AU / 10.0 / ARCSEC_PER_RAD;
        let m = cube.y[0] / AU / 10.0 / ARCSEC_PER_RAD;
        let raw = -2.0 * PI * (res.u[[0, 0]] * l + res.v[[0, 0]] * m);
        let expected = raw.rem_euclid(2.0 * PI);
        assert!((res.phase[[0, 0]] - expected).abs() < 1e-9);
    }

    #[test]
    fn rejects_mismatched_baseline_and_angle_counts() {
        let cube = test_cube(4, 4, &[870.0], 1.0);
        assert!(matches!(
            compute_visibilities(&cube, &[10.0, 20.0], &[0.0], 10.0),
            Err(RadpostError::DimensionMismatch(_))
        ));
    }

    #[test]
    fn rejects_non_positive_distance() {
        let cube = test_cube(4, 4, &[870.0], 1.0);
        assert!(matches!(
            compute_visibilities(&cube, &[10.0], &[0.0], -1.0),
            Err(RadpostError::NumericDomain(_))
        ));
    }

    #[test]
    fn rejects_stokes_cubes() {
        let data = ArrayD::zeros(IxDyn(&[4, 4, 4]));
        let cube = ImageCube::new(data, 1e13, 1e13, Array1::from_elem(1, 870.0), true).unwrap();
        assert!(matches!(
            compute_visibilities(&cube, &[10.0], &[0.0], 10.0),
            Err(RadpostError::DimensionMismatch(_))
        ));
    }
}
