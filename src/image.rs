use ndarray::prelude::*;

use crate::error::{RadpostError, Result};
use crate::psf::Psf;

/// Astronomical unit [cm].
pub const AU: f64 = 1.496e13;
/// Parsec [cm].
pub const PC: f64 = 3.08572e18;
/// Speed of light [cm/s].
pub const CC: f64 = 2.99792458e10;
/// Arcseconds per radian (3600 * 180 / pi).
pub const ARCSEC_PER_RAD: f64 = 3600.0 * 180.0 / std::f64::consts::PI;

/// An intensity or Stokes image cube with its coordinate metadata.
///
/// `data` holds specific intensities in erg/s/cm^2/Hz/ster, indexed
/// (x-pixel, y-pixel, [stokes], [frequency]):
///   rank 2 -> (nx, ny), a single plane
///   rank 3 -> (nx, ny, nfreq) when `stokes` is false,
///             (nx, ny, 4) when `stokes` is true and nfreq == 1
///   rank 4 -> (nx, ny, 4, nfreq)
///
/// Cubes are value objects: the processing engines never mutate a cube in
/// place, they return derived copies.
#[derive(Debug, Clone)]
pub struct ImageCube {
    pub data: ArrayD<f64>,
    /// Same shape as `data`, in Jy/pixel (Jy/beam after convolution).
    pub jyppix: ArrayD<f64>,
    pub nx: usize,
    pub ny: usize,
    /// Pixel size [cm].
    pub sizepix_x: f64,
    pub sizepix_y: f64,
    /// Pixel-center coordinates [cm], centered on the image center.
    pub x: Array1<f64>,
    pub y: Array1<f64>,
    /// Frequency grid [Hz].
    pub freq: Array1<f64>,
    /// Wavelength grid [micron].
    pub wav: Array1<f64>,
    pub stokes: bool,
    /// Beam provenance, set by the convolution engine.
    pub psf: Option<Psf>,
    pub fwhm: Option<[f64; 2]>,
    pub pa: f64,
    pub dpc: f64,
}

/// Unit of the radius argument to [`ImageCube::masked`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaskUnit {
    Pixel,
    Au,
    Arcsec,
}

impl MaskUnit {
    pub fn from_name(name: &str) -> Result<MaskUnit> {
        match name.trim().to_ascii_lowercase().as_str() {
            "pixel" | "pix" => Ok(MaskUnit::Pixel),
            "au" => Ok(MaskUnit::Au),
            "arcsec" => Ok(MaskUnit::Arcsec),
            other => Err(RadpostError::Config(format!(
                "unknown mask unit '{}' (expected pixel, au or arcsec)",
                other
            ))),
        }
    }
}

/// Pixel-center coordinates, `(i + 0.5 - n/2) * sizepix`.
pub fn pixel_centers(n: usize, sizepix: f64) -> Array1<f64> {
    Array1::from_iter((0..n).map(|i| (i as f64 + 0.5 - n as f64 / 2.0) * sizepix))
}

impl ImageCube {
    /// Builds a cube from raw intensity data, checking the layout invariants.
    ///
    /// `jyppix` is derived with the per-pixel conversion
    /// `sizepix_x * sizepix_y / pc^2 * 1e23`; the convolution engine
    /// overrides it with the per-beam conversion.
    pub fn new(
        data: ArrayD<f64>,
        sizepix_x: f64,
        sizepix_y: f64,
        wav: Array1<f64>,
        stokes: bool,
    ) -> Result<ImageCube> {
        if sizepix_x <= 0.0 || sizepix_y <= 0.0 {
            return Err(RadpostError::NumericDomain(format!(
                "pixel sizes must be positive (got {} x {})",
                sizepix_x, sizepix_y
            )));
        }
        if wav.is_empty() || wav.iter().any(|&w| w <= 0.0) {
            return Err(RadpostError::NumericDomain(
                "wavelength grid must be non-empty and positive".to_string(),
            ));
        }

        let shape = data.shape().to_vec();
        let nfreq = wav.len();
        let layout_ok = match (shape.len(), stokes) {
            (2, false) => nfreq == 1,
            (3, false) => shape[2] == nfreq,
            (3, true) => shape[2] == 4 && nfreq == 1,
            (4, true) => shape[2] == 4 && shape[3] == nfreq,
            _ => false,
        };
        if !layout_ok {
            return Err(RadpostError::DimensionMismatch(format!(
                "image of shape {:?} does not fit nfreq = {} with stokes = {}",
                shape, nfreq, stokes
            )));
        }
        let (nx, ny) = (shape[0], shape[1]);
        if nx == 0 || ny == 0 {
            return Err(RadpostError::DimensionMismatch(
                "image must have at least one pixel per axis".to_string(),
            ));
        }

        let freq = wav.mapv(|w| CC / w * 1e4);
        let x = pixel_centers(nx, sizepix_x);
        let y = pixel_centers(ny, sizepix_y);
        let conv = sizepix_x * sizepix_y / PC.powi(2) * 1e23;
        let jyppix = data.mapv(|v| v * conv);

        Ok(ImageCube {
            data,
            jyppix,
            nx,
            ny,
            sizepix_x,
            sizepix_y,
            x,
            y,
            freq,
            wav,
            stokes,
            psf: None,
            fwhm: None,
            pa: 0.0,
            dpc: 0.0,
        })
    }

    pub fn nfreq(&self) -> usize {
        self.freq.len()
    }

    /// Simulates a coronagraphic mask: returns a copy with every channel
    /// zeroed inside `radius` of the image center.
    ///
    /// `dpc` is only consulted for [`MaskUnit::Arcsec`].
    pub fn masked(&self, radius: f64, unit: MaskUnit, dpc: f64) -> Result<ImageCube> {
        if radius < 0.0 {
            return Err(RadpostError::NumericDomain(
                "mask radius must be non-negative".to_string(),
            ));
        }
        let crad = match unit {
            MaskUnit::Pixel => radius * self.sizepix_x,
            MaskUnit::Au => radius * AU,
            MaskUnit::Arcsec => {
                if dpc <= 0.0 {
                    return Err(RadpostError::NumericDomain(
                        "an arcsec mask radius requires a positive distance".to_string(),
                    ));
                }
                radius * AU * dpc
            }
        };

        let mut res = self.clone();
        for ix in 0..self.nx {
            for iy in 0..self.ny {
                let r = (self.x[ix].powi(2) + self.y[iy].powi(2)).sqrt();
                if r <= crad {
                    res.data
                        .index_axis_mut(Axis(0), ix)
                        .index_axis_move(Axis(0), iy)
                        .fill(0.0);
                    res.jyppix
                        .index_axis_mut(Axis(0), ix)
                        .index_axis_move(Axis(0), iy)
                        .fill(0.0);
                }
            }
        }
        Ok(res)
    }
}
