use ndarray::prelude::*;
use num_complex::Complex;
use rustfft::FftPlanner;

type C64 = Complex<f64>;

/// Forward 2-D FFT, computed as a row pass followed by a column pass.
pub fn fft2(input: &Array2<C64>) -> Array2<C64> {
    let (nx, ny) = input.dim();
    let mut planner = FftPlanner::new();
    let fft_row = planner.plan_fft_forward(ny);
    let fft_col = planner.plan_fft_forward(nx);

    let mut out = input.clone();
    for mut row in out.rows_mut() {
        let mut buf = row.to_vec();
        fft_row.process(&mut buf);
        row.assign(&ArrayView::from(&buf));
    }
    for j in 0..ny {
        let mut buf = out.column(j).to_vec();
        fft_col.process(&mut buf);
        out.column_mut(j).assign(&ArrayView::from(&buf));
    }
    out
}

/// Inverse 2-D FFT with 1/(nx*ny) normalization.
pub fn ifft2(input: &Array2<C64>) -> Array2<C64> {
    let (nx, ny) = input.dim();
    let mut planner = FftPlanner::new();
    let ifft_row = planner.plan_fft_inverse(ny);
    let ifft_col = planner.plan_fft_inverse(nx);

    let mut out = input.clone();
    for mut row in out.rows_mut() {
        let mut buf = row.to_vec();
        ifft_row.process(&mut buf);
        row.assign(&ArrayView::from(&buf));
    }
    for j in 0..ny {
        let mut buf = out.column(j).to_vec();
        ifft_col.process(&mut buf);
        out.column_mut(j).assign(&ArrayView::from(&buf));
    }
    let scale = 1.0 / (nx * ny) as f64;
    out.mapv_inplace(|v| v * scale);
    out
}

/// Inverse FFT shift: rolls each axis left by n/2, moving the centered
/// origin back to index 0.
pub fn ifftshift2(input: &Array2<f64>) -> Array2<f64> {
    let (nx, ny) = input.dim();
    let (sx, sy) = (nx / 2, ny / 2);
    let mut out = Array2::zeros((nx, ny));
    for i in 0..nx {
        for j in 0..ny {
            out[[i, j]] = input[[(i + sx) % nx, (j + sy) % ny]];
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fft2_of_impulse_is_flat() {
        let mut a = Array2::from_elem((4, 4), C64::new(0.0, 0.0));
        a[[0, 0]] = C64::new(1.0, 0.0);
        let f = fft2(&a);
        for v in f.iter() {
            assert!((v.re - 1.0).abs() < 1e-12);
            assert!(v.im.abs() < 1e-12);
        }
    }

    #[test]
    fn ifft2_inverts_fft2() {
        let a = Array2::from_shape_fn((8, 6), |(i, j)| {
            C64::new((i * 6 + j) as f64, (i as f64 - j as f64) * 0.5)
        });
        let b = ifft2(&fft2(&a));
        for (u, v) in a.iter().zip(b.iter()) {
            assert!((u - v).norm() < 1e-9);
        }
    }

    #[test]
    fn ifftshift_moves_center_to_origin() {
        let mut a = Array2::zeros((4, 4));
        a[[2, 2]] = 1.0;
        let b = ifftshift2(&a);
        assert_eq!(b[[0, 0]], 1.0);
        assert_eq!(b[[2, 2]], 0.0);
    }
}
