use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::closure::ClosurePhaseResult;
use crate::moment::MomentMap;
use crate::visibility::VisibilityResult;

/// Writes one row per (baseline, wavelength) sample.
pub fn write_visibility_tsv(path: &Path, res: &VisibilityResult) -> io::Result<()> {
    let mut file = File::create(path)?;
    writeln!(
        file,
        "wav_micron\tbaseline_m\tposang\tu\tv\tre\tim\tamp\tphase_rad"
    )?;
    for ibl in 0..res.nbl() {
        for iwav in 0..res.nwav() {
            writeln!(
                file,
                "{:.6}\t{:.3}\t{:.6}\t{:.6e}\t{:.6e}\t{:.6e}\t{:.6e}\t{:.6e}\t{:.6}",
                res.wav[iwav],
                res.bl[ibl],
                res.pa[ibl],
                res.u[[ibl, iwav]],
                res.v[[ibl, iwav]],
                res.vis[[ibl, iwav]].re,
                res.vis[[ibl, iwav]].im,
                res.amp[[ibl, iwav]],
                res.phase[[ibl, iwav]]
            )?;
        }
    }
    Ok(())
}

/// Writes one row per (triangle, wavelength) sample with the three member
/// visibilities and the closure phase.
pub fn write_closure_tsv(path: &Path, res: &ClosurePhaseResult) -> io::Result<()> {
    let mut file = File::create(path)?;
    writeln!(
        file,
        "triangle\twav_micron\tre1\tim1\tre2\tim2\tre3\tim3\tclosure_phase_deg"
    )?;
    for itri in 0..res.ntri() {
        for iwav in 0..res.nwav() {
            write!(file, "{}\t{:.6}", itri, res.wav[iwav])?;
            for ibl in 0..3 {
                let vis = res.vis[[itri, ibl, iwav]];
                write!(file, "\t{:.6e}\t{:.6e}", vis.re, vis.im)?;
            }
            writeln!(file, "\t{:.6}", res.cp[[itri, iwav]])?;
        }
    }
    Ok(())
}

/// Writes the moment map as a matrix, one image row per line.
pub fn write_moment_tsv(path: &Path, map: &MomentMap) -> io::Result<()> {
    let mut file = File::create(path)?;
    writeln!(
        file,
        "# moment {} map, {} x {} pixels, rest frequency {:.6e} Hz",
        map.moment,
        map.map.nrows(),
        map.map.ncols(),
        map.nu0
    )?;
    for row in map.map.rows() {
        let line: Vec<String> = row.iter().map(|v| format!("{:.6e}", v)).collect();
        writeln!(file, "{}", line.join("\t"))?;
    }
    Ok(())
}
