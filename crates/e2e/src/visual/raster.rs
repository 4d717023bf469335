//! Raster comparison: luma decode, resampling and windowed SSIM
//!
//! The score follows the usual structural similarity definition with a
//! 7x7 uniform window, K1 = 0.01, K2 = 0.03, an 8-bit dynamic range and
//! sample (N - 1) covariance. Per-window scores are averaged over every
//! window lying fully inside the image. Window statistics are kept as
//! exact integer column sums over a band of rows that slides down the
//! image, so working memory grows with the width only.

use std::path::Path;

use image::imageops::{self, FilterType};
use image::{GrayImage, ImageError, Luma};

use crate::error::{E2eError, E2eResult};

/// Side of the square similarity window
pub const WINDOW: u32 = 7;

const DATA_RANGE: f64 = 255.0;
const K1: f64 = 0.01;
const K2: f64 = 0.03;

/// Decode an image file into 8-bit luma, discarding color and alpha.
///
/// Uses the ITU-R 601 weights in 16-bit fixed point, the same conversion
/// common imaging libraries apply for "L" mode.
pub fn load_luma(path: &Path) -> E2eResult<GrayImage> {
    let decoded = image::open(path).map_err(|e| match e {
        ImageError::IoError(source) => E2eError::Read {
            path: path.to_path_buf(),
            source,
        },
        other => E2eError::Decode {
            path: path.to_path_buf(),
            reason: other.to_string(),
        },
    })?;

    let rgb = decoded.to_rgb8();
    let mut luma = GrayImage::new(rgb.width(), rgb.height());
    for (x, y, pixel) in rgb.enumerate_pixels() {
        let [r, g, b] = pixel.0;
        let l = (u32::from(r) * 19595 + u32::from(g) * 38470 + u32::from(b) * 7471 + 0x8000) >> 16;
        luma.put_pixel(x, y, Luma([l as u8]));
    }
    Ok(luma)
}

/// Resample `other` to the dimensions of `reference` if they differ
pub fn conform(reference: &GrayImage, other: GrayImage) -> GrayImage {
    if reference.dimensions() == other.dimensions() {
        return other;
    }
    imageops::resize(&other, reference.width(), reference.height(), FilterType::CatmullRom)
}

/// Load two images for comparison, the second resampled to the first's size.
///
/// Fails with [`E2eError::Decode`] when either image is empty or the
/// reference is smaller than the similarity window.
pub fn load_pair(reference: &Path, other: &Path) -> E2eResult<(GrayImage, GrayImage)> {
    let a = load_luma(reference)?;
    let b = load_luma(other)?;

    if a.width() < WINDOW || a.height() < WINDOW {
        return Err(E2eError::Decode {
            path: reference.to_path_buf(),
            reason: format!(
                "{}x{} image is smaller than the {}x{} similarity window",
                a.width(),
                a.height(),
                WINDOW,
                WINDOW
            ),
        });
    }
    if b.width() == 0 || b.height() == 0 {
        return Err(E2eError::Decode {
            path: other.to_path_buf(),
            reason: "image has no pixels".to_string(),
        });
    }

    let b = conform(&a, b);
    Ok((a, b))
}

/// SSIM between two files
pub fn similarity(reference: &Path, other: &Path) -> E2eResult<f64> {
    let (a, b) = load_pair(reference, other)?;
    Ok(ssim(&a, &b))
}

/// Sums of the five window moments over some set of pixels
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Moments {
    a: u64,
    b: u64,
    aa: u64,
    bb: u64,
    ab: u64,
}

impl Moments {
    fn pixel(a: u8, b: u8) -> Self {
        let (a, b) = (u64::from(a), u64::from(b));
        Self {
            a,
            b,
            aa: a * a,
            bb: b * b,
            ab: a * b,
        }
    }

    /// SSIM of a window of `n` pixels holding these sums
    fn score(&self, n: f64) -> f64 {
        let cov_norm = n / (n - 1.0);
        let c1 = (K1 * DATA_RANGE).powi(2);
        let c2 = (K2 * DATA_RANGE).powi(2);

        let ux = self.a as f64 / n;
        let uy = self.b as f64 / n;
        let vx = cov_norm * (self.aa as f64 / n - ux * ux);
        let vy = cov_norm * (self.bb as f64 / n - uy * uy);
        let vxy = cov_norm * (self.ab as f64 / n - ux * uy);

        let numerator = (2.0 * ux * uy + c1) * (2.0 * vxy + c2);
        let denominator = (ux * ux + uy * uy + c1) * (vx + vy + c2);
        numerator / denominator
    }
}

impl std::ops::AddAssign for Moments {
    fn add_assign(&mut self, other: Self) {
        self.a += other.a;
        self.b += other.b;
        self.aa += other.aa;
        self.bb += other.bb;
        self.ab += other.ab;
    }
}

impl std::ops::SubAssign for Moments {
    fn sub_assign(&mut self, other: Self) {
        self.a -= other.a;
        self.b -= other.b;
        self.aa -= other.aa;
        self.bb -= other.bb;
        self.ab -= other.ab;
    }
}

/// Mean SSIM of two equally sized luma images, in [-1, 1].
///
/// Both images must be at least [`WINDOW`] pixels in each dimension;
/// [`load_pair`] enforces this for files.
pub fn ssim(a: &GrayImage, b: &GrayImage) -> f64 {
    debug_assert_eq!(a.dimensions(), b.dimensions());
    let (w, h) = (a.width() as usize, a.height() as usize);
    let win = WINDOW as usize;
    if w < win || h < win {
        return f64::NAN;
    }

    let at = |x: usize, y: usize| {
        Moments::pixel(
            a.get_pixel(x as u32, y as u32).0[0],
            b.get_pixel(x as u32, y as u32).0[0],
        )
    };

    // per-column sums over rows top..top + win
    let mut columns = vec![Moments::default(); w];
    for y in 0..win {
        for (x, column) in columns.iter_mut().enumerate() {
            *column += at(x, y);
        }
    }

    let n = (win * win) as f64;
    let mut total = 0.0;
    let mut windows = 0usize;
    for top in 0..=h - win {
        if top > 0 {
            for (x, column) in columns.iter_mut().enumerate() {
                *column -= at(x, top - 1);
                *column += at(x, top + win - 1);
            }
        }

        let mut window = Moments::default();
        for column in &columns[..win] {
            window += *column;
        }
        for left in 0..=w - win {
            if left > 0 {
                window -= columns[left - 1];
                window += columns[left + win - 1];
            }
            total += window.score(n);
            windows += 1;
        }
    }

    total / windows as f64
}

/// Per-pixel absolute difference, for inspecting a mismatch
pub fn difference(a: &GrayImage, b: &GrayImage) -> GrayImage {
    GrayImage::from_fn(a.width(), a.height(), |x, y| {
        let pa = a.get_pixel(x, y).0[0];
        let pb = b.get_pixel(x, y).0[0];
        Luma([pa.abs_diff(pb)])
    })
}
