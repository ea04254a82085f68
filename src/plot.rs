use std::error::Error;
use std::path::Path;

use ndarray::Array2;
use plotters::prelude::*;
use plotters::style::colors::colormaps::ViridisRGB;

use crate::image::ImageCube;
use crate::moment::MomentMap;
use crate::visibility::VisibilityResult;

/// Draws one 2-D map as a Viridis heatmap with a colorbar on the right.
/// Axis coordinates are taken from `x`/`y` ranges (same units as labels).
fn heatmap_with_colorbar(
    output_path: &Path,
    data: &Array2<f64>,
    title: &str,
    x_desc: &str,
    y_desc: &str,
    colorbar_title: &str,
) -> Result<(), Box<dyn Error>> {
    let (nx, ny) = data.dim();

    let main_chart_width = 520;
    let colorbar_area_width = 120;
    let total_width = (main_chart_width + colorbar_area_width) as u32;
    let total_height = 480u32;

    let root = BitMapBackend::new(output_path, (total_width, total_height)).into_drawing_area();
    root.fill(&WHITE)?;
    let (chart_area, colorbar_area) = root.split_horizontally(main_chart_width);

    let min_val = data.iter().cloned().fold(f64::INFINITY, f64::min);
    let max_val = data.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let span = if max_val > min_val {
        max_val - min_val
    } else {
        1.0
    };

    let top_margin = 10;
    let bottom_margin = 10;
    let x_label_area_size = 40;

    let mut chart = ChartBuilder::on(&chart_area)
        .caption(title, ("sans-serif", 20).into_font())
        .margin_top(top_margin)
        .margin_bottom(bottom_margin)
        .margin_left(10)
        .margin_right(10)
        .x_label_area_size(x_label_area_size)
        .y_label_area_size(50)
        .build_cartesian_2d(0..nx, 0..ny)?;

    chart
        .configure_mesh()
        .x_desc(x_desc)
        .y_desc(y_desc)
        .disable_mesh()
        .x_label_style(("sans-serif", 16).into_font())
        .y_label_style(("sans-serif", 16).into_font())
        .draw()?;

    chart.draw_series((0..nx).flat_map(|ix| (0..ny).map(move |iy| (ix, iy))).map(
        |(ix, iy)| {
            let value = (data[[ix, iy]] - min_val) / span;
            let color = ViridisRGB.get_color(value);
            Rectangle::new([(ix, iy), (ix + 1, iy + 1)], color.filled())
        },
    ))?;

    // Colorbar, drawn bottom-up.
    let bar_width = 25;
    let bar_height = total_height as i32 - (top_margin + bottom_margin + x_label_area_size);
    for i in 0..bar_height {
        let color = ViridisRGB.get_color(i as f64 / (bar_height - 1) as f64);
        colorbar_area.draw(&Rectangle::new(
            [
                (0, top_margin + bar_height - i),
                (bar_width, top_margin + bar_height - i - 1),
            ],
            color.filled(),
        ))?;
    }
    colorbar_area.draw_text(
        colorbar_title,
        &TextStyle::from(("sans-serif", 16).into_font())
            .color(&BLACK)
            .transform(FontTransform::Rotate270),
        (colorbar_area_width as i32 - 20, total_height as i32 / 2),
    )?;
    for i in 0..5 {
        let fraction = i as f64 / 4.0;
        let value = min_val + span * fraction;
        let y_pos = top_margin + bar_height - (fraction * bar_height as f64) as i32;
        colorbar_area.draw_text(
            &format!("{:.2e}", value),
            &TextStyle::from(("sans-serif", 14).into_font()).color(&BLACK),
            (bar_width + 5, y_pos - 6),
        )?;
    }

    root.present()?;
    Ok(())
}

/// Renders one (stokes, frequency) plane of a cube. Intensities are
/// plotted linearly, or as log10 clipped at 1e-90 when `log_scale` is set.
pub fn plot_image_plane(
    output_path: &Path,
    cube: &ImageCube,
    istokes: usize,
    ifreq: usize,
    log_scale: bool,
) -> Result<(), Box<dyn Error>> {
    if ifreq >= cube.nfreq() {
        return Err(format!(
            "frequency channel {} is out of range (cube has {})",
            ifreq,
            cube.nfreq()
        )
        .into());
    }
    if cube.stokes && istokes >= 4 {
        return Err(format!("stokes channel {} is out of range", istokes).into());
    }

    let mut plane = Array2::<f64>::zeros((cube.nx, cube.ny));
    for ix in 0..cube.nx {
        for iy in 0..cube.ny {
            let value = match cube.data.ndim() {
                2 => cube.data[[ix, iy]],
                3 if cube.stokes => cube.data[[ix, iy, istokes]],
                3 => cube.data[[ix, iy, ifreq]],
                _ => cube.data[[ix, iy, istokes, ifreq]],
            };
            plane[[ix, iy]] = if log_scale {
                value.max(1e-90).log10()
            } else {
                value
            };
        }
    }

    let title = format!("lambda = {:.5} micron", cube.wav[ifreq]);
    let colorbar_title = if log_scale {
        "log I [erg/s/cm2/Hz/ster]"
    } else {
        "I [erg/s/cm2/Hz/ster]"
    };
    heatmap_with_colorbar(
        output_path,
        &plane,
        &title,
        "X [pixel]",
        "Y [pixel]",
        colorbar_title,
    )
}

/// Renders a moment map; maps of order > 0 are shown normalized by the
/// zeroth moment where that is nonzero.
pub fn plot_moment_map(
    output_path: &Path,
    map: &MomentMap,
    moment0: Option<&MomentMap>,
) -> Result<(), Box<dyn Error>> {
    let mut display = map.map.clone();
    if let Some(m0) = moment0 {
        display.zip_mut_with(&m0.map, |v, &w| {
            *v = if w != 0.0 { *v / w } else { 0.0 };
        });
    }
    let label = match (map.moment, moment0.is_some()) {
        (0, _) => "I [erg/s/cm2/Hz/ster * km/s]".to_string(),
        (1, true) => "v [km/s]".to_string(),
        (n, true) => format!("v^{} [(km/s)^{}]", n, n),
        (n, false) => format!("moment {}", n),
    };
    heatmap_with_colorbar(
        output_path,
        &display,
        &format!("moment {}", map.moment),
        "X [pixel]",
        "Y [pixel]",
        &label,
    )
}

/// Plots visibility amplitude (top) and phase (bottom) against wavelength,
/// one series per baseline.
pub fn plot_visibility(output_path: &Path, res: &VisibilityResult) -> Result<(), Box<dyn Error>> {
    let root = BitMapBackend::new(output_path, (900, 700)).into_drawing_area();
    root.fill(&WHITE)?;
    let (amp_area, phase_area) = root.split_vertically(350);

    let wav_min = res.wav.iter().cloned().fold(f64::INFINITY, f64::min);
    let wav_max = res.wav.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let wav_span = if wav_max > wav_min {
        (wav_min * 0.98)..(wav_max * 1.02)
    } else {
        (wav_min * 0.9)..(wav_max * 1.1 + 1.0)
    };
    let amp_max = res.amp.iter().cloned().fold(0.0f64, f64::max).max(1e-300) * 1.05;

    let colors = [
        RGBColor(0, 102, 204),
        RGBColor(204, 102, 0),
        RGBColor(34, 139, 34),
        RGBColor(160, 32, 240),
        RGBColor(204, 0, 102),
        RGBColor(0, 153, 153),
    ];

    let mut amp_chart = ChartBuilder::on(&amp_area)
        .margin(15)
        .x_label_area_size(45)
        .y_label_area_size(70)
        .build_cartesian_2d(wav_span.clone(), 0.0..amp_max)?;
    amp_chart
        .configure_mesh()
        .x_desc("Wavelength [micron]")
        .y_desc("Amplitude [Jy-equivalent]")
        .y_label_formatter(&|y| format!("{:>9.2e}", *y))
        .label_style(("sans-serif", 18))
        .axis_desc_style(("sans-serif", 20))
        .light_line_style(&WHITE)
        .draw()?;

    for ibl in 0..res.nbl() {
        let color = colors[ibl % colors.len()];
        amp_chart
            .draw_series((0..res.nwav()).map(|iwav| {
                Circle::new((res.wav[iwav], res.amp[[ibl, iwav]]), 4, color.filled())
            }))?
            .label(format!("{:.0} m", res.bl[ibl]))
            .legend(move |(x, y)| Circle::new((x + 10, y), 5, color.filled()));
    }
    amp_chart
        .configure_series_labels()
        .border_style(&BLACK)
        .background_style(&WHITE.mix(0.8))
        .draw()?;

    let mut phase_chart = ChartBuilder::on(&phase_area)
        .margin(15)
        .x_label_area_size(45)
        .y_label_area_size(70)
        .build_cartesian_2d(wav_span, 0.0..360.0)?;
    phase_chart
        .configure_mesh()
        .x_desc("Wavelength [micron]")
        .y_desc("Phase [deg]")
        .y_labels(9)
        .y_label_formatter(&|y| format!("{:>4.0}", *y))
        .label_style(("sans-serif", 18))
        .axis_desc_style(("sans-serif", 20))
        .light_line_style(&WHITE)
        .draw()?;

    for ibl in 0..res.nbl() {
        let color = colors[ibl % colors.len()];
        phase_chart.draw_series((0..res.nwav()).map(|iwav| {
            Circle::new(
                (res.wav[iwav], res.phase[[ibl, iwav]].to_degrees()),
                4,
                color.filled(),
            )
        }))?;
    }

    root.present()?;
    Ok(())
}

/// Renders the beam kernel attached to a convolved cube, axes in arcsec.
pub fn plot_psf(output_path: &Path, cube: &ImageCube) -> Result<(), Box<dyn Error>> {
    let psf = match &cube.psf {
        Some(psf) => psf,
        None => return Ok(()),
    };
    heatmap_with_colorbar(
        output_path,
        &psf.kernel,
        "beam",
        "X [pixel]",
        "Y [pixel]",
        "PSF response",
    )
}
