use ndarray::prelude::*;
use num_complex::Complex;

use crate::error::{RadpostError, Result};
use crate::image::ImageCube;
use crate::visibility::compute_visibilities;

type C64 = Complex<f64>;

/// Per-triangle visibility quantities, shape (ntri, 3, nwav), and the
/// closure phases, shape (ntri, nwav), in degrees within (-180, 180].
#[derive(Debug, Clone)]
pub struct ClosurePhaseResult {
    /// Baseline lengths [m], (ntri, 3).
    pub bl: Array2<f64>,
    /// Baseline position angles, (ntri, 3).
    pub pa: Array2<f64>,
    pub u: Array3<f64>,
    pub v: Array3<f64>,
    pub vis: Array3<C64>,
    pub amp: Array3<f64>,
    pub phase: Array3<f64>,
    /// Closure phase [deg].
    pub cp: Array2<f64>,
    pub wav: Array1<f64>,
}

impl ClosurePhaseResult {
    pub fn ntri(&self) -> usize {
        self.bl.nrows()
    }

    pub fn nwav(&self) -> usize {
        self.wav.len()
    }
}

/// Maps a summed phase [deg] into (-180, 180]. Exactly 180 is kept.
pub fn wrap_closure_phase_deg(deg: f64) -> f64 {
    let wrapped = deg.rem_euclid(360.0);
    if wrapped > 180.0 {
        wrapped - 360.0
    } else {
        wrapped
    }
}

/// Parses a comma-separated triple, e.g. a triangle's "B1,B2,B3".
pub fn parse_triple(text: &str, what: &str) -> Result<[f64; 3]> {
    let parts: Vec<&str> = text.split(',').map(str::trim).collect();
    if parts.len() != 3 {
        return Err(RadpostError::DimensionMismatch(format!(
            "{} must have exactly 3 components, got '{}'",
            what, text
        )));
    }
    let mut values = [0.0f64; 3];
    for (slot, part) in values.iter_mut().zip(parts.iter()) {
        *slot = part.parse().map_err(|_| {
            RadpostError::DataFormat(format!("invalid {} component '{}'", what, part))
        })?;
    }
    Ok(values)
}

/// Computes closure phases for a set of baseline triangles, each given as
/// (3 baseline lengths [m], 3 position angles).
///
/// The three visibility phases of a triangle are summed per wavelength and
/// wrapped into (-180, 180] degrees; closure phases are insensitive to
/// antenna-based phase errors, so a centrosymmetric source closes to zero.
pub fn compute_closure_phases(
    cube: &ImageCube,
    triangles: &[([f64; 3], [f64; 3])],
    dpc: f64,
) -> Result<ClosurePhaseResult> {
    if triangles.is_empty() {
        return Err(RadpostError::DimensionMismatch(
            "at least one baseline triangle is required".to_string(),
        ));
    }

    let ntri = triangles.len();
    let nwav = cube.nfreq();
    let mut bl = Array2::<f64>::zeros((ntri, 3));
    let mut pa = Array2::<f64>::zeros((ntri, 3));
    let mut u = Array3::<f64>::zeros((ntri, 3, nwav));
    let mut v = Array3::<f64>::zeros((ntri, 3, nwav));
    let mut vis = Array3::<C64>::from_elem((ntri, 3, nwav), C64::new(0.0, 0.0));
    let mut amp = Array3::<f64>::zeros((ntri, 3, nwav));
    let mut phase = Array3::<f64>::zeros((ntri, 3, nwav));
    let mut cp = Array2::<f64>::zeros((ntri, nwav));

    for (itri, (tri_bl, tri_pa)) in triangles.iter().enumerate() {
        let res = compute_visibilities(cube, tri_bl, tri_pa, dpc)?;

        bl.row_mut(itri).assign(&res.bl);
        pa.row_mut(itri).assign(&res.pa);
        u.index_axis_mut(Axis(0), itri).assign(&res.u);
        v.index_axis_mut(Axis(0), itri).assign(&res.v);
        vis.index_axis_mut(Axis(0), itri).assign(&res.vis);
        amp.index_axis_mut(Axis(0), itri).assign(&res.amp);
        phase.index_axis_mut(Axis(0), itri).assign(&res.phase);

        for iwav in 0..nwav {
            let sum: f64 = (0..3).map(|ibl| res.phase[[ibl, iwav]]).sum();
            cp[[itri, iwav]] = wrap_closure_phase_deg(sum.to_degrees());
        }
    }

    Ok(ClosurePhaseResult {
        bl,
        pa,
        u,
        v,
        vis,
        amp,
        phase,
        cp,
        wav: cube.wav.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::ArrayD;

    #[test]
    fn wrap_keeps_180_and_folds_above() {
        assert_eq!(wrap_closure_phase_deg(200.0), -160.0);
        assert_eq!(wrap_closure_phase_deg(180.0), 180.0);
        assert_eq!(wrap_closure_phase_deg(0.0), 0.0);
        assert_eq!(wrap_closure_phase_deg(360.0), 0.0);
        assert_eq!(wrap_closure_phase_deg(-200.0), 160.0);
        assert_eq!(wrap_closure_phase_deg(540.0), 180.0);
    }

    #[test]
    fn degenerate_triangle_closes_exactly() {
        // 4x4 uniform single-frequency cube, all-zero baselines: every
        // visibility phase is exactly 0, so the closure phase is 0.0.
        let data = ArrayD::from_elem(IxDyn(&[4, 4, 1]), 1.0);
        let cube = ImageCube::new(data, 1e12, 1e12, Array1::from_elem(1, 870.0), false).unwrap();

        let res =
            compute_closure_phases(&cube, &[([0.0, 0.0, 0.0], [0.0, 0.0, 0.0])], 1.0).unwrap();
        assert_eq!(res.ntri(), 1);
        for iwav in 0..res.nwav() {
            assert_eq!(res.cp[[0, iwav]], 0.0);
        }
    }

    #[test]
    fn centrosymmetric_source_closes_to_zero() {
        // A centered Gaussian blob is point-symmetric, so its visibilities
        // are real; with baselines short enough to stay positive-definite,
        // every phase is 0 and the triangle sum closes.
        let nx = 8;
        let data = ArrayD::from_shape_fn(IxDyn(&[nx, nx, 1]), |ix| {
            let dx = ix[0] as f64 + 0.5 - nx as f64 / 2.0;
            let dy = ix[1] as f64 + 0.5 - nx as f64 / 2.0;
            (-(dx * dx + dy * dy) / 4.0).exp()
        });
        let cube = ImageCube::new(data, 1e13, 1e13, Array1::from_elem(1, 870.0), false).unwrap();

        let res = compute_closure_phases(
            &cube,
            &[([5.0, 8.0, 3.0], [0.2, 1.1, 2.4])],
            100.0,
        )
        .unwrap();
        assert!(res.cp[[0, 0]].abs() < 1e-6);
    }

    #[test]
    fn rejects_empty_triangle_list() {
        let data = ArrayD::from_elem(IxDyn(&[4, 4, 1]), 1.0);
        let cube = ImageCube::new(data, 1e12, 1e12, Array1::from_elem(1, 870.0), false).unwrap();
        assert!(matches!(
            compute_closure_phases(&cube, &[], 1.0),
            Err(RadpostError::DimensionMismatch(_))
        ));
    }

    #[test]
    fn parse_triple_requires_three_components() {
        assert_eq!(parse_triple("1,2.5,3", "baseline").unwrap(), [1.0, 2.5, 3.0]);
        assert!(matches!(
            parse_triple("1,2", "baseline"),
            Err(RadpostError::DimensionMismatch(_))
        ));
        assert!(matches!(
            parse_triple("1,x,3", "baseline"),
            Err(RadpostError::DataFormat(_))
        ));
    }
}
