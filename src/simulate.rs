use std::process::{Command, ExitStatus};

use crate::error::{RadpostError, Result};

/// Validated parameter set for one `radmc3d image` run.
///
/// `npix`, `incl` and `sizeau` are always required; the wavelength axis is
/// fixed by either a single `wav` [micron] or a `lambdarange` with `nlam`
/// samples, never both. Line channel maps take `widthkms` (a symmetric
/// velocity window) or `vkms` (a single channel), never both.
#[derive(Debug, Clone)]
pub struct SimulatorConfig {
    pub npix: u32,
    /// Inclination of the source [deg].
    pub incl: f64,
    /// Image diameter [AU].
    pub sizeau: f64,
    pub wav: Option<f64>,
    pub lambdarange: Option<[f64; 2]>,
    pub nlam: Option<u32>,
    /// Azimuthal rotation of the source in model space [deg].
    pub phi: Option<f64>,
    /// Position angle of the source in the image plane [deg].
    pub posang: Option<f64>,
    /// Cartesian coordinates of the image center [AU].
    pub pointau: Option<[f64; 3]>,
    /// Adaptive sub-pixeling for flux conservation.
    pub fluxcons: bool,
    pub nostar: bool,
    pub noscat: bool,
    pub widthkms: Option<f64>,
    pub linenlam: Option<u32>,
    pub vkms: Option<f64>,
    pub iline: Option<u32>,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        SimulatorConfig {
            npix: 100,
            incl: 0.0,
            sizeau: 100.0,
            wav: None,
            lambdarange: None,
            nlam: None,
            phi: None,
            posang: None,
            pointau: None,
            fluxcons: true,
            nostar: false,
            noscat: false,
            widthkms: None,
            linenlam: None,
            vkms: None,
            iline: None,
        }
    }
}

impl SimulatorConfig {
    /// Builds the `radmc3d` argument list, validating parameter conflicts.
    pub fn to_args(&self) -> Result<Vec<String>> {
        match (self.wav, self.lambdarange) {
            (Some(_), Some(_)) => {
                return Err(RadpostError::Config(
                    "either a single wavelength or a wavelength range should be set, \
                     but not both"
                        .to_string(),
                ))
            }
            (None, None) => {
                return Err(RadpostError::Config("no wavelength is specified".to_string()))
            }
            (None, Some(_)) if self.nlam.is_none() => {
                return Err(RadpostError::Config(
                    "a wavelength range needs the number of samples".to_string(),
                ))
            }
            _ => {}
        }
        if self.widthkms.is_some() && self.vkms.is_some() {
            return Err(RadpostError::Config(
                "either a velocity width or a single channel velocity should be set, \
                 but not both"
                    .to_string(),
            ));
        }

        let mut args = vec![
            "image".to_string(),
            "npix".to_string(),
            self.npix.to_string(),
            "incl".to_string(),
            self.incl.to_string(),
            "sizeau".to_string(),
            self.sizeau.to_string(),
        ];

        if let Some(wav) = self.wav {
            args.push("lambda".to_string());
            args.push(wav.to_string());
        } else if let Some([lam0, lam1]) = self.lambdarange {
            args.push("lambdarange".to_string());
            args.push(lam0.to_string());
            args.push(lam1.to_string());
            args.push("nlam".to_string());
            args.push(self.nlam.unwrap_or(1).to_string());
        }

        if let Some(phi) = self.phi {
            args.push("phi".to_string());
            args.push(phi.to_string());
        }
        if let Some(posang) = self.posang {
            args.push("posang".to_string());
            args.push(posang.to_string());
        }
        let pointau = self.pointau.unwrap_or([0.0, 0.0, 0.0]);
        args.push("pointau".to_string());
        for component in pointau {
            args.push(component.to_string());
        }

        if self.fluxcons {
            args.push("fluxcons".to_string());
        }
        if self.nostar {
            args.push("nostar".to_string());
        }
        if self.noscat {
            args.push("noscat".to_string());
        }

        if let Some(widthkms) = self.widthkms {
            args.push("widthkms".to_string());
            args.push(format!("{:.5e}", widthkms));
        }
        if let Some(vkms) = self.vkms {
            args.push("vkms".to_string());
            args.push(format!("{:.5e}", vkms));
        }
        if let Some(linenlam) = self.linenlam {
            args.push("linenlam".to_string());
            args.push(linenlam.to_string());
        }
        if let Some(iline) = self.iline {
            args.push("iline".to_string());
            args.push(iline.to_string());
        }

        Ok(args)
    }
}

/// Runs `radmc3d` with the configured arguments and returns its exit
/// status. Only the orchestration layer calls this; the processing engines
/// never regenerate images themselves.
pub fn run_simulator(config: &SimulatorConfig) -> Result<ExitStatus> {
    let args = config.to_args()?;
    let status = Command::new("radmc3d").args(&args).status()?;
    Ok(status)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_builds_an_image_command() {
        let config = SimulatorConfig {
            npix: 128,
            incl: 45.0,
            sizeau: 200.0,
            wav: Some(870.0),
            ..SimulatorConfig::default()
        };
        let args = config.to_args().unwrap();
        assert_eq!(args[0], "image");
        let joined = args.join(" ");
        assert!(joined.contains("npix 128"));
        assert!(joined.contains("incl 45"));
        assert!(joined.contains("sizeau 200"));
        assert!(joined.contains("lambda 870"));
        assert!(joined.contains("pointau 0 0 0"));
        assert!(joined.contains("fluxcons"));
    }

    #[test]
    fn wavelength_range_needs_sample_count() {
        let config = SimulatorConfig {
            wav: None,
            lambdarange: Some([1.0, 1000.0]),
            nlam: None,
            ..SimulatorConfig::default()
        };
        assert!(matches!(config.to_args(), Err(RadpostError::Config(_))));

        let config = SimulatorConfig {
            wav: None,
            lambdarange: Some([1.0, 1000.0]),
            nlam: Some(30),
            ..SimulatorConfig::default()
        };
        let joined = config.to_args().unwrap().join(" ");
        assert!(joined.contains("lambdarange 1 1000 nlam 30"));
    }

    #[test]
    fn rejects_contradictory_wavelength_selection() {
        let config = SimulatorConfig {
            wav: Some(870.0),
            lambdarange: Some([1.0, 1000.0]),
            nlam: Some(30),
            ..SimulatorConfig::default()
        };
        assert!(matches!(config.to_args(), Err(RadpostError::Config(_))));

        let config = SimulatorConfig {
            wav: None,
            ..SimulatorConfig::default()
        };
        assert!(matches!(config.to_args(), Err(RadpostError::Config(_))));
    }

    #[test]
    fn rejects_widthkms_together_with_vkms() {
        let config = SimulatorConfig {
            wav: Some(870.0),
            widthkms: Some(10.0),
            vkms: Some(2.0),
            ..SimulatorConfig::default()
        };
        assert!(matches!(config.to_args(), Err(RadpostError::Config(_))));
    }
}
