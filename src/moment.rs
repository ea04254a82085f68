use ndarray::prelude::*;

use crate::error::{RadpostError, Result};
use crate::image::{ImageCube, CC};

/// A velocity moment of a spectral cube, trapezoid-integrated along the
/// frequency axis.
#[derive(Debug, Clone)]
pub struct MomentMap {
    pub map: Array2<f64>,
    pub moment: i32,
    /// Rest frequency [Hz] the velocity axis was derived from.
    pub nu0: f64,
}

/// Computes the `moment`-th velocity moment map of a line cube.
///
/// The rest frame is fixed by `nu0` [Hz] or, when `nu0 <= 0`, by the rest
/// wavelength `wav0` [micron]; one of the two must be given. Channel
/// velocities are `c * (nu0 - freq) / nu0` in km/s.
///
/// Raw integrals are returned; callers display moment > 0 maps normalized
/// by the moment-0 map.
pub fn moment_map(cube: &ImageCube, moment: i32, nu0: f64, wav0: f64) -> Result<MomentMap> {
    let nu0 = if nu0 > 0.0 {
        nu0
    } else if wav0 > 0.0 {
        CC / wav0 * 1e4
    } else {
        return Err(RadpostError::Config(
            "neither rest frequency nor rest wavelength of the line is given".to_string(),
        ));
    };
    if moment < 0 {
        return Err(RadpostError::Config(format!(
            "moment order must be non-negative (got {})",
            moment
        )));
    }
    if cube.stokes || cube.data.ndim() != 3 {
        return Err(RadpostError::DimensionMismatch(format!(
            "moment maps require an intensity cube of shape (nx, ny, nfreq); \
             got rank {} with stokes = {}",
            cube.data.ndim(),
            cube.stokes
        )));
    }

    let data = cube.data.view().into_dimensionality::<Ix3>().unwrap();
    let nfreq = cube.nfreq();
    // Channel velocities [km/s] relative to the rest frequency.
    let vel = cube.freq.mapv(|f| CC * (nu0 - f) / nu0 / 1e5);

    let mut map = Array2::<f64>::zeros((cube.nx, cube.ny));
    for ix in 0..cube.nx {
        for iy in 0..cube.ny {
            let mut acc = 0.0;
            for ifreq in 0..nfreq.saturating_sub(1) {
                let y0 = data[[ix, iy, ifreq]] * vel[ifreq].powi(moment);
                let y1 = data[[ix, iy, ifreq + 1]] * vel[ifreq + 1].powi(moment);
                acc += (vel[ifreq + 1] - vel[ifreq]) * (y0 + y1) * 0.5;
            }
            map[[ix, iy]] = acc;
        }
    }

    Ok(MomentMap { map, moment, nu0 })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::ArrayD;

    fn line_cube(nx: usize, wavs: &[f64], fill: f64) -> ImageCube {
        let data = ArrayD::from_elem(IxDyn(&[nx, nx, wavs.len()]), fill);
        ImageCube::new(data, 1e13, 1e13, Array1::from_vec(wavs.to_vec()), false).unwrap()
    }

    #[test]
    fn moment_zero_of_flat_cube_is_velocity_span() {
        let cube = line_cube(4, &[869.0, 870.0, 871.0], 2.0);
        let nu0 = CC / 870.0 * 1e4;
        let res = moment_map(&cube, 0, nu0, 0.0).unwrap();

        let vel = cube.freq.mapv(|f| CC * (nu0 - f) / nu0 / 1e5);
        let expected = 2.0 * (vel[2] - vel[0]);
        for v in res.map.iter() {
            assert!((v - expected).abs() <= expected.abs() * 1e-12);
        }
    }

    #[test]
    fn rest_wavelength_substitutes_rest_frequency() {
        let cube = line_cube(4, &[869.0, 871.0], 1.0);
        let by_wav = moment_map(&cube, 0, 0.0, 870.0).unwrap();
        let by_freq = moment_map(&cube, 0, CC / 870.0 * 1e4, 0.0).unwrap();
        assert!((by_wav.nu0 - by_freq.nu0).abs() / by_freq.nu0 < 1e-12);
        assert_eq!(by_wav.map, by_freq.map);
    }

    #[test]
    fn first_moment_weights_by_velocity() {
        // Two channels with equal spacing: the trapezoid of I*v over v is
        // (v1 - v0) * (I0*v0 + I1*v1) / 2.
        let cube = line_cube(2, &[869.0, 871.0], 3.0);
        let nu0 = CC / 870.0 * 1e4;
        let res = moment_map(&cube, 1, nu0, 0.0).unwrap();
        let vel = cube.freq.mapv(|f| CC * (nu0 - f) / nu0 / 1e5);
        let expected = (vel[1] - vel[0]) * (3.0 * vel[0] + 3.0 * vel[1]) * 0.5;
        for v in res.map.iter() {
            assert!((v - expected).abs() <= expected.abs() * 1e-12 + 1e-300);
        }
    }

    #[test]
    fn requires_a_rest_frame() {
        let cube = line_cube(2, &[869.0, 871.0], 1.0);
        assert!(matches!(
            moment_map(&cube, 0, 0.0, 0.0),
            Err(RadpostError::Config(_))
        ));
    }

    #[test]
    fn rejects_stokes_cubes() {
        let data = ArrayD::zeros(IxDyn(&[4, 4, 4]));
        let cube = ImageCube::new(data, 1e13, 1e13, Array1::from_elem(1, 870.0), true).unwrap();
        assert!(matches!(
            moment_map(&cube, 0, 2.3e11, 0.0),
            Err(RadpostError::DimensionMismatch(_))
        ));
    }
}
