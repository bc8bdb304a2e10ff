use crate::{
    foundation::error::{MosaiqError, MosaiqResult},
    render::surface::Surface,
};

/// Gaussian-blur a surface with clamp-to-edge sampling.
///
/// Radius 0 returns an identical copy. Sigma defaults to `radius / 2` when
/// not supplied by the caller.
pub fn blur_surface(src: &Surface, radius: u32) -> MosaiqResult<Surface> {
    blur_surface_sigma(src, radius, (radius as f32) / 2.0)
}

/// Gaussian-blur with an explicit sigma.
pub fn blur_surface_sigma(src: &Surface, radius: u32, sigma: f32) -> MosaiqResult<Surface> {
    if radius == 0 {
        return Ok(src.clone());
    }
    let kernel = Kernel::gaussian(radius, sigma)?;
    let (width, height) = (src.width(), src.height());

    let mut tmp = Surface::new(width, height)?;
    let mut out = Surface::new(width, height)?;
    kernel.convolve(src.data(), tmp.data_mut(), width, height, Axis::X);
    kernel.convolve(tmp.data(), out.data_mut(), width, height, Axis::Y);
    Ok(out)
}

#[derive(Clone, Copy)]
enum Axis {
    X,
    Y,
}

/// Symmetric 1-D gaussian kernel in Q16 fixed point. The taps always sum to
/// exactly 65536 so a constant image survives both passes bit-identically.
struct Kernel {
    taps: Vec<u32>,
}

impl Kernel {
    fn gaussian(radius: u32, sigma: f32) -> MosaiqResult<Self> {
        if !sigma.is_finite() || sigma <= 0.0 {
            return Err(MosaiqError::validation("blur sigma must be > 0"));
        }
        let r = i64::from(radius);
        let sigma = f64::from(sigma);
        let gauss = |i: i64| (-((i * i) as f64) / (2.0 * sigma * sigma)).exp();
        let total: f64 = (-r..=r).map(gauss).sum();
        if total <= 0.0 {
            return Err(MosaiqError::render("gaussian kernel sum is zero"));
        }

        let mut taps: Vec<u32> = (-r..=r)
            .map(|i| ((gauss(i) / total * 65536.0).round() as i64).clamp(0, 65536) as u32)
            .collect();

        // Rounding drift lands on the center tap, keeping the sum exact.
        let drift = 65536 - taps.iter().map(|&t| i64::from(t)).sum::<i64>();
        let mid = taps.len() / 2;
        taps[mid] = (i64::from(taps[mid]) + drift).clamp(0, 65536) as u32;
        Ok(Self { taps })
    }

    fn convolve(&self, src: &[u8], dst: &mut [u8], width: u32, height: u32, axis: Axis) {
        let reach = (self.taps.len() / 2) as i32;
        let (w, h) = (width as i32, height as i32);
        for y in 0..h {
            for x in 0..w {
                let mut acc = [0u64; 4];
                for (ti, &tap) in self.taps.iter().enumerate() {
                    let offset = ti as i32 - reach;
                    let (sx, sy) = match axis {
                        Axis::X => ((x + offset).clamp(0, w - 1), y),
                        Axis::Y => (x, (y + offset).clamp(0, h - 1)),
                    };
                    let idx = ((sy * w + sx) as usize) * 4;
                    for (a, &s) in acc.iter_mut().zip(&src[idx..idx + 4]) {
                        *a += u64::from(tap) * u64::from(s);
                    }
                }
                let out_idx = ((y * w + x) as usize) * 4;
                for (c, &a) in acc.iter().enumerate() {
                    dst[out_idx + c] = ((a + 32768) >> 16).min(255) as u8;
                }
            }
        }
    }
}
