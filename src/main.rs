use std::error::Error;
use std::fs;
use std::path::Path;

use clap::{CommandFactory, Parser};

use radpost::args::Args;
use radpost::closure::{compute_closure_phases, parse_triple};
use radpost::convolve::convolve;
use radpost::error::RadpostError;
use radpost::image::MaskUnit;
use radpost::moment::moment_map;
use radpost::output::{write_closure_tsv, write_moment_tsv, write_visibility_tsv};
use radpost::plot::{plot_image_plane, plot_moment_map, plot_psf, plot_visibility};
use radpost::read::read_image;
use radpost::simulate::{run_simulator, SimulatorConfig};
use radpost::visibility::compute_visibilities;

fn main() -> Result<(), Box<dyn Error>> {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            // If no arguments are provided, print help and exit
            if std::env::args().len() <= 1 {
                let mut cmd = Args::command();
                cmd.print_help().expect("Failed to print help");
                std::process::exit(0);
            } else {
                e.exit();
            }
        }
    };

    // --- Optionally Regenerate the Image ---
    if args.simulate {
        let config = SimulatorConfig {
            npix: args.npix,
            incl: args.incl,
            sizeau: args.sizeau,
            wav: args.lambda,
            lambdarange: match args.lambdarange.as_slice() {
                [lam0, lam1] => Some([*lam0, *lam1]),
                _ => None,
            },
            nlam: args.nlam,
            widthkms: args.widthkms,
            vkms: args.vkms,
            linenlam: args.linenlam,
            iline: args.iline,
            ..SimulatorConfig::default()
        };
        let status = run_simulator(&config)?;
        if !status.success() {
            return Err(format!("radmc3d exited with status {}", status).into());
        }
    }

    // --- File and Path Setup ---
    let input_path = &args.input;
    let parent_dir = input_path.parent().unwrap_or_else(|| Path::new(""));
    let radpost_dir = parent_dir.join("radpost");
    let basename = input_path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "image".to_string());

    // --- Load the Image Cube ---
    let mut cube = read_image(input_path, args.binary)?;
    println!(
        "# Loaded {}: {} x {} pixels, {} wavelength(s), stokes = {}",
        input_path.display(),
        cube.nx,
        cube.ny,
        cube.nfreq(),
        cube.stokes
    );

    if let Some(radius) = args.mask {
        let unit = MaskUnit::from_name(&args.mask_unit)?;
        cube = cube.masked(radius, unit, args.dpc)?;
        println!(
            "# Applied a {} {} mask around the image center",
            radius, args.mask_unit
        );
    }

    let plot_dir = radpost_dir.join("plots");
    if args.plot {
        fs::create_dir_all(&plot_dir)?;
        let path = plot_dir.join(format!("{}_image.png", basename));
        plot_image_plane(&path, &cube, args.istokes, args.ifreq, args.log)?;
        println!("# Saved image plot to {}", path.display());
    }

    // --- Beam Convolution ---
    if !args.conv.is_empty() {
        let fwhm = [args.conv[0], args.conv[1]];
        let convolved = convolve(&cube, fwhm, args.pa, args.dpc)?;
        let peak = convolved
            .jyppix
            .iter()
            .cloned()
            .fold(f64::NEG_INFINITY, f64::max);
        println!(
            "# Convolved with a {:.4} x {:.4} arcsec beam at pa {:.1} deg, peak {:.4e} Jy/beam",
            fwhm[0], fwhm[1], args.pa, peak
        );
        if args.plot {
            let path = plot_dir.join(format!("{}_convolved.png", basename));
            plot_image_plane(&path, &convolved, args.istokes, args.ifreq, args.log)?;
            let beam_path = plot_dir.join(format!("{}_beam.png", basename));
            plot_psf(&beam_path, &convolved)?;
            println!("# Saved convolved image plot to {}", path.display());
        }
    }

    // --- Visibilities ---
    if !args.baseline.is_empty() {
        let vis = compute_visibilities(&cube, &args.baseline, &args.posang, args.dpc)?;
        println!(
            "# Computed visibilities for {} baseline(s) x {} wavelength(s)",
            vis.nbl(),
            vis.nwav()
        );
        if args.output {
            let vis_dir = radpost_dir.join("visibility");
            fs::create_dir_all(&vis_dir)?;
            let path = vis_dir.join(format!("{}_vis.tsv", basename));
            write_visibility_tsv(&path, &vis)?;
            println!("# Saved visibility table to {}", path.display());
        }
        if args.plot {
            fs::create_dir_all(&plot_dir)?;
            let path = plot_dir.join(format!("{}_vis.png", basename));
            plot_visibility(&path, &vis)?;
            println!("# Saved visibility plot to {}", path.display());
        }
    }

    // --- Closure Phases ---
    if !args.triangle.is_empty() {
        if args.triangle.len() != args.triangle_pa.len() {
            return Err(RadpostError::DimensionMismatch(format!(
                "{} triangle(s) but {} position-angle triple(s)",
                args.triangle.len(),
                args.triangle_pa.len()
            ))
            .into());
        }
        let mut triangles = Vec::with_capacity(args.triangle.len());
        for (bl_text, pa_text) in args.triangle.iter().zip(args.triangle_pa.iter()) {
            triangles.push((
                parse_triple(bl_text, "baseline triple")?,
                parse_triple(pa_text, "position-angle triple")?,
            ));
        }

        let res = compute_closure_phases(&cube, &triangles, args.dpc)?;
        for itri in 0..res.ntri() {
            println!(
                "# Triangle {} ({:.0}/{:.0}/{:.0} m): closure phase {:.3} deg at {:.3} micron",
                itri,
                res.bl[[itri, 0]],
                res.bl[[itri, 1]],
                res.bl[[itri, 2]],
                res.cp[[itri, 0]],
                res.wav[0]
            );
        }
        if args.output {
            let closure_dir = radpost_dir.join("closure_phase");
            fs::create_dir_all(&closure_dir)?;
            let path = closure_dir.join(format!("{}_closure.tsv", basename));
            write_closure_tsv(&path, &res)?;
            println!("# Saved closure-phase table to {}", path.display());
        }
    }

    // --- Moment Map ---
    if let Some(moment) = args.moment {
        let map = moment_map(&cube, moment, args.restfreq, args.restwav)?;
        println!(
            "# Computed moment {} map (rest frequency {:.4e} Hz)",
            moment, map.nu0
        );
        if args.output {
            let moment_dir = radpost_dir.join("moment");
            fs::create_dir_all(&moment_dir)?;
            let path = moment_dir.join(format!("{}_moment{}.tsv", basename, moment));
            write_moment_tsv(&path, &map)?;
            println!("# Saved moment map to {}", path.display());
        }
        if args.plot {
            fs::create_dir_all(&plot_dir)?;
            let moment0 = if moment > 0 {
                Some(moment_map(&cube, 0, args.restfreq, args.restwav)?)
            } else {
                None
            };
            let path = plot_dir.join(format!("{}_moment{}.png", basename, moment));
            plot_moment_map(&path, &map, moment0.as_ref())?;
            println!("# Saved moment map plot to {}", path.display());
        }
    }

    Ok(())
}
