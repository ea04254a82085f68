use std::fs::File;
use std::io::{Cursor, Read};
use std::path::Path;
use std::str::{FromStr, SplitWhitespace};

use byteorder::{LittleEndian, ReadBytesExt};
use ndarray::prelude::*;

use crate::error::{RadpostError, Result};
use crate::image::ImageCube;

/// Reads a RADMC-3D image file into an [`ImageCube`].
///
/// `binary = false` parses the formatted ASCII `image.out` layout,
/// `binary = true` the C-binary `image.bout` layout. Format code 1 is a
/// total-intensity cube, format code 3 a full-Stokes cube. Pixel values
/// are stored x-fastest within each row block for both layouts.
pub fn read_image(path: &Path, binary: bool) -> Result<ImageCube> {
    let mut file = File::open(path)?;
    let mut buffer = Vec::new();
    file.read_to_end(&mut buffer)?;

    if binary {
        parse_binary(&buffer)
    } else {
        let text = String::from_utf8(buffer)
            .map_err(|_| RadpostError::DataFormat("image file is not valid text".to_string()))?;
        parse_ascii(&text)
    }
}

fn parse_next<T: FromStr>(tokens: &mut SplitWhitespace, what: &str) -> Result<T> {
    let token = tokens.next().ok_or_else(|| {
        RadpostError::DataFormat(format!("unexpected end of file while reading {}", what))
    })?;
    token
        .parse()
        .map_err(|_| RadpostError::DataFormat(format!("invalid {}: '{}'", what, token)))
}

fn check_grid(iformat: i64, nx: i64, ny: i64, nfreq: i64) -> Result<(bool, usize, usize, usize)> {
    let stokes = match iformat {
        1 => false,
        3 => true,
        other => {
            return Err(RadpostError::DataFormat(format!(
                "unsupported image format code {}",
                other
            )))
        }
    };
    if nx <= 0 || ny <= 0 || nfreq <= 0 {
        return Err(RadpostError::DataFormat(format!(
            "image dimensions must be positive (nx = {}, ny = {}, nfreq = {})",
            nx, ny, nfreq
        )));
    }
    Ok((stokes, nx as usize, ny as usize, nfreq as usize))
}

fn cube_shape(stokes: bool, nx: usize, ny: usize, nfreq: usize) -> Vec<usize> {
    // A single-frequency Stokes cube drops the frequency axis.
    match (stokes, nfreq) {
        (false, _) => vec![nx, ny, nfreq],
        (true, 1) => vec![nx, ny, 4],
        (true, _) => vec![nx, ny, 4, nfreq],
    }
}

fn parse_ascii(text: &str) -> Result<ImageCube> {
    let mut tokens = text.split_whitespace();

    let iformat: i64 = parse_next(&mut tokens, "format code")?;
    let nx: i64 = parse_next(&mut tokens, "nx")?;
    let ny: i64 = parse_next(&mut tokens, "ny")?;
    let nfreq: i64 = parse_next(&mut tokens, "nfreq")?;
    let sizepix_x: f64 = parse_next(&mut tokens, "pixel size x")?;
    let sizepix_y: f64 = parse_next(&mut tokens, "pixel size y")?;
    let (stokes, nx, ny, nfreq) = check_grid(iformat, nx, ny, nfreq)?;

    let mut wav = Array1::<f64>::zeros(nfreq);
    for iwav in 0..nfreq {
        wav[iwav] = parse_next(&mut tokens, "wavelength")?;
    }

    let mut data = ArrayD::<f64>::zeros(IxDyn(&cube_shape(stokes, nx, ny, nfreq)));
    for iwav in 0..nfreq {
        for iy in 0..ny {
            for ix in 0..nx {
                if stokes {
                    for istokes in 0..4 {
                        let value: f64 = parse_next(&mut tokens, "intensity")?;
                        if nfreq == 1 {
                            data[[ix, iy, istokes]] = value;
                        } else {
                            data[[ix, iy, istokes, iwav]] = value;
                        }
                    }
                } else {
                    data[[ix, iy, iwav]] = parse_next(&mut tokens, "intensity")?;
                }
            }
        }
    }

    ImageCube::new(data, sizepix_x, sizepix_y, wav, stokes)
}

fn parse_binary(buffer: &[u8]) -> Result<ImageCube> {
    let mut cursor = Cursor::new(buffer);
    let truncated = |what: &str| RadpostError::DataFormat(format!("truncated binary image: {}", what));

    let iformat = cursor
        .read_i64::<LittleEndian>()
        .map_err(|_| truncated("format code"))?;
    let nx = cursor.read_i64::<LittleEndian>().map_err(|_| truncated("nx"))?;
    let ny = cursor.read_i64::<LittleEndian>().map_err(|_| truncated("ny"))?;
    let nfreq = cursor
        .read_i64::<LittleEndian>()
        .map_err(|_| truncated("nfreq"))?;
    let (stokes, nx, ny, nfreq) = check_grid(iformat, nx, ny, nfreq)?;

    let sizepix_x = cursor
        .read_f64::<LittleEndian>()
        .map_err(|_| truncated("pixel size x"))?;
    let sizepix_y = cursor
        .read_f64::<LittleEndian>()
        .map_err(|_| truncated("pixel size y"))?;

    let mut wav = Array1::<f64>::zeros(nfreq);
    for iwav in 0..nfreq {
        wav[iwav] = cursor
            .read_f64::<LittleEndian>()
            .map_err(|_| truncated("wavelength"))?;
    }

    let mut data = ArrayD::<f64>::zeros(IxDyn(&cube_shape(stokes, nx, ny, nfreq)));
    if stokes {
        // Binary Stokes blocks are ordered frequency, stokes, row, column.
        for iwav in 0..nfreq {
            for istokes in 0..4 {
                for iy in 0..ny {
                    for ix in 0..nx {
                        let value = cursor
                            .read_f64::<LittleEndian>()
                            .map_err(|_| truncated("intensity"))?;
                        if nfreq == 1 {
                            data[[ix, iy, istokes]] = value;
                        } else {
                            data[[ix, iy, istokes, iwav]] = value;
                        }
                    }
                }
            }
        }
    } else {
        for iwav in 0..nfreq {
            for iy in 0..ny {
                for ix in 0..nx {
                    data[[ix, iy, iwav]] = cursor
                        .read_f64::<LittleEndian>()
                        .map_err(|_| truncated("intensity"))?;
                }
            }
        }
    }

    ImageCube::new(data, sizepix_x, sizepix_y, wav, stokes)
}
