#![allow(
    clippy::arithmetic_side_effects,
    clippy::integer_division,
    reason = "row and column arithmetic is bounded by the image size checked at construction"
)]

use std::num::NonZero;
use std::thread;

use energy_harness::{ExecuteError, Payload, PrepareError};
use tracing::debug;

use crate::{Error, Result, try_filled, try_with_capacity};

/// Iterations after which a point that has not escaped is considered part of the set.
const MAX_ITERATIONS: usize = 50;

/// Escape is only tested every this many iterations.
const ESCAPE_CHECK_INTERVAL: usize = 5;

/// Pixels per byte of the bitmap. Image sizes are rounded down to a multiple of this.
const PIXELS_PER_BYTE: usize = 8;

const MAX_SIZE: usize = 1 << 16;

/// Whether `c = cr + ci*i` is still bounded after [`MAX_ITERATIONS`] iterations of
/// `z = z^2 + c`.
fn is_member(cr: f64, ci: f64) -> bool {
    let (mut zr, mut zi, mut tr, mut ti) = (0.0_f64, 0.0_f64, 0.0_f64, 0.0_f64);

    for _ in 0..MAX_ITERATIONS / ESCAPE_CHECK_INTERVAL {
        for _ in 0..ESCAPE_CHECK_INTERVAL {
            zi = (zr + zr) * zi + ci;
            zr = tr - ti + cr;
            tr = zr * zr;
            ti = zi * zi;
        }

        if tr + ti > 4.0 {
            return false;
        }
    }

    true
}

/// Renders one row of the bitmap, most significant bit first.
fn render_row(x_coordinates: &[f64], ci: f64, row: &mut [u8]) {
    for (byte, xs) in row
        .iter_mut()
        .zip(x_coordinates.chunks_exact(PIXELS_PER_BYTE))
    {
        *byte = xs
            .iter()
            .enumerate()
            .filter(|&(_, &cr)| is_member(cr, ci))
            .fold(0_u8, |bits, (bit, _)| bits | (0x80 >> bit));
    }
}

/// Precomputed coordinates and the bitmap of a [`Mandelbrot`] execution.
#[derive(Debug)]
pub struct Canvas {
    x_coordinates: Vec<f64>,
    bitmap: Vec<u8>,
}

impl Canvas {
    /// The rendered image, one bit per pixel, rows top to bottom.
    #[must_use]
    pub fn bitmap(&self) -> &[u8] {
        &self.bitmap
    }
}

/// Renders the Mandelbrot set over `[-1.5, 0.5] x [-1, 1]` as a `size x size` bitmap.
///
/// Rows are rendered in parallel by a set of scoped worker threads, each owning a contiguous
/// band of rows. All workers are joined before an execution returns. The result is the number
/// of pixels inside the set.
#[derive(Debug)]
pub struct Mandelbrot {
    size: usize,
    workers: NonZero<usize>,
}

impl Mandelbrot {
    /// Name of the kernel.
    pub const NAME: &str = "mandelbrot";

    /// Default image width and height in pixels.
    pub const DEFAULT_SIZE: usize = 200;

    /// Creates the kernel for a `size x size` image, using one worker thread per available
    /// processor.
    ///
    /// The size is rounded down to a multiple of 8.
    ///
    /// # Errors
    ///
    /// Fails if `size` is below 8 or above 65536.
    pub fn new(size: usize) -> Result<Self> {
        if !(PIXELS_PER_BYTE..=MAX_SIZE).contains(&size) {
            return Err(Error::invalid_size(
                Self::NAME,
                "size",
                format!("must be between {PIXELS_PER_BYTE} and {MAX_SIZE}, was {size}"),
            ));
        }

        let workers = thread::available_parallelism().unwrap_or(NonZero::<usize>::MIN);

        Ok(Self {
            size: size / PIXELS_PER_BYTE * PIXELS_PER_BYTE,
            workers,
        })
    }

    /// Uses `workers` threads instead of one per available processor.
    #[must_use]
    pub fn with_workers(mut self, workers: NonZero<usize>) -> Self {
        self.workers = workers;
        self
    }

    /// The image size after rounding.
    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }
}

impl Payload for Mandelbrot {
    type State = Canvas;
    type Output = u64;

    #[expect(
        clippy::cast_precision_loss,
        reason = "pixel coordinates are far below 2^52"
    )]
    fn prepare(&mut self) -> std::result::Result<Canvas, PrepareError> {
        let scale = 2.0 / self.size as f64;

        let mut x_coordinates = try_with_capacity(Self::NAME, self.size)?;
        x_coordinates.extend((0..self.size).map(|x| x as f64 * scale - 1.5));

        Ok(Canvas {
            x_coordinates,
            bitmap: try_filled(Self::NAME, self.size * self.size / PIXELS_PER_BYTE, 0)?,
        })
    }

    #[expect(
        clippy::cast_precision_loss,
        reason = "pixel coordinates are far below 2^52"
    )]
    fn execute(&mut self, canvas: &mut Canvas) -> std::result::Result<u64, ExecuteError> {
        let size = self.size;
        let scale = 2.0 / size as f64;
        let row_bytes = size / PIXELS_PER_BYTE;
        let rows_per_worker = size.div_ceil(self.workers.get());

        let x_coordinates = &canvas.x_coordinates;

        thread::scope(|scope| {
            for (band_index, band) in canvas
                .bitmap
                .chunks_mut(rows_per_worker * row_bytes)
                .enumerate()
            {
                let first_row = band_index * rows_per_worker;

                scope.spawn(move || {
                    for (offset, row) in band.chunks_exact_mut(row_bytes).enumerate() {
                        let ci = (first_row + offset) as f64 * scale - 1.0;
                        render_row(x_coordinates, ci, row);
                    }
                });
            }
        });

        let members: u64 = canvas
            .bitmap
            .iter()
            .map(|byte| u64::from(byte.count_ones()))
            .sum();

        debug!(
            size,
            workers = self.workers.get(),
            members,
            "mandelbrot rendered"
        );

        Ok(members)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(size: usize, workers: usize) -> (u64, Vec<u8>) {
        let mut kernel = Mandelbrot::new(size)
            .unwrap()
            .with_workers(NonZero::new(workers).unwrap());
        let mut canvas = kernel.prepare().unwrap();
        let members = kernel.execute(&mut canvas).unwrap();

        (members, canvas.bitmap().to_vec())
    }

    #[test]
    fn membership() {
        assert!(is_member(0.0, 0.0));
        assert!(is_member(-1.0, 0.0));
        assert!(!is_member(1.0, 1.0));
        assert!(!is_member(-1.5, -1.0));
    }

    #[test]
    fn parallel_matches_single_threaded() {
        let single = render(64, 1);
        let parallel = render(64, 3);

        assert_eq!(single, parallel);
        assert!(single.0 > 0);
        assert!(single.0 < 64 * 64);
    }

    #[test]
    fn more_workers_than_rows() {
        assert_eq!(render(8, 1), render(8, 32));
    }

    #[test]
    fn centre_pixel_is_set() {
        // x = 120 * (2 / 160) - 1.5 = 0, y = 80 * (2 / 160) - 1 = 0
        let (_, bitmap) = render(160, 2);
        let byte = bitmap[80 * 160 / 8 + 120 / 8];

        assert_ne!(byte & (0x80 >> (120 % 8)), 0);
    }

    #[test]
    fn size_is_rounded_down() {
        assert_eq!(Mandelbrot::new(203).unwrap().size(), 200);
    }

    #[test]
    fn out_of_range_is_rejected() {
        assert!(Mandelbrot::new(7).is_err());
        assert!(Mandelbrot::new(MAX_SIZE + 1).is_err());
    }
}
