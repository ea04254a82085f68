use clap::Parser;
pub use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "radpost",
    version = "0.1.0",
    about = "Post-processing for RADMC-3D image cubes: beam convolution, \
             interferometric visibilities, closure phases and moment maps."
)]
pub struct Args {
    /// Path to the RADMC-3D image file (image.out or image.bout).
    #[arg(long, aliases = ["in", "inp", "inpu"])]
    pub input: PathBuf,

    /// Treat the input as C-binary (image.bout) instead of formatted ASCII.
    #[arg(long, aliases = ["bin"])]
    pub binary: bool,

    /// Distance to the source in parsec.
    #[arg(long, default_value_t = 1.0)]
    pub dpc: f64,

    /// Convolve with an elliptical Gaussian beam; FWHM along the two
    /// principal axes in arcsec.
    #[arg(long, num_args = 2, value_name = "FWHM_X FWHM_Y")]
    pub conv: Vec<f64>,

    /// Beam position angle in degrees, measured from north counter-clockwise.
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub pa: f64,

    /// Projected baseline lengths in meters for visibility computation.
    #[arg(long, num_args = 1.., value_name = "METERS")]
    pub baseline: Vec<f64>,

    /// Baseline position angles in radians (one per baseline).
    #[arg(long, num_args = 1.., value_name = "RAD", allow_negative_numbers = true)]
    pub posang: Vec<f64>,

    /// Baseline triangle "B1,B2,B3" in meters for closure phases. Can be
    /// specified multiple times.
    #[arg(long, value_name = "B1,B2,B3")]
    pub triangle: Vec<String>,

    /// Position-angle triple "P1,P2,P3" in radians, one per --triangle.
    #[arg(long, value_name = "P1,P2,P3", allow_negative_numbers = true)]
    pub triangle_pa: Vec<String>,

    /// Order of the velocity moment map to compute.
    #[arg(long)]
    pub moment: Option<i32>,

    /// Rest frequency of the line in Hz (for moment maps).
    #[arg(long, default_value_t = 0.0)]
    pub restfreq: f64,

    /// Rest wavelength of the line in micron (for moment maps).
    #[arg(long, default_value_t = 0.0)]
    pub restwav: f64,

    /// Radius of a circular mask applied around the image center before
    /// any processing.
    #[arg(long)]
    pub mask: Option<f64>,

    /// Unit of the mask radius: pixel, au or arcsec.
    #[arg(long, default_value = "pixel")]
    pub mask_unit: String,

    /// Save PNG plots of the image planes and computed results.
    #[arg(long, aliases = ["pl", "plo"])]
    pub plot: bool,

    /// Plot image planes on a logarithmic intensity scale.
    #[arg(long)]
    pub log: bool,

    /// Frequency channel index used for image plots.
    #[arg(long, default_value_t = 0)]
    pub ifreq: usize,

    /// Stokes channel index used for image plots (Stokes cubes only).
    #[arg(long, default_value_t = 0)]
    pub istokes: usize,

    /// Write TSV tables of the computed results.
    #[arg(long, aliases = ["ou", "out", "outp", "outpu"])]
    pub output: bool,

    /// Rerun radmc3d to regenerate the image before loading it.
    #[arg(long)]
    pub simulate: bool,

    /// Number of image pixels per axis (with --simulate).
    #[arg(long, default_value_t = 100)]
    pub npix: u32,

    /// Source inclination in degrees (with --simulate).
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub incl: f64,

    /// Image diameter in AU (with --simulate).
    #[arg(long, default_value_t = 100.0)]
    pub sizeau: f64,

    /// Single image wavelength in micron (with --simulate).
    #[arg(long)]
    pub lambda: Option<f64>,

    /// Wavelength range in micron (with --simulate).
    #[arg(long, num_args = 2, value_name = "LAM0 LAM1")]
    pub lambdarange: Vec<f64>,

    /// Number of wavelengths across --lambdarange.
    #[arg(long)]
    pub nlam: Option<u32>,

    /// Width of the velocity axis in km/s for line channel maps.
    #[arg(long)]
    pub widthkms: Option<f64>,

    /// Single channel velocity in km/s.
    #[arg(long, allow_negative_numbers = true)]
    pub vkms: Option<f64>,

    /// Number of channels across the velocity axis.
    #[arg(long)]
    pub linenlam: Option<u32>,

    /// Line transition index.
    #[arg(long)]
    pub iline: Option<u32>,
}
