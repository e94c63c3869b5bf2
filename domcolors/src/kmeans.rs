//! Provides the implementation for a k-means clustering pass

use crate::{Color, Palette, PaletteError};

/// Squared Euclidean distance between two colors in RGB space
///
/// The maximum value is `3 * 255^2`, so this always fits in a `u32`.
fn squared_distance(x: Color, y: Color) -> u32 {
	let dr = i32::from(x.red) - i32::from(y.red);
	let dg = i32::from(x.green) - i32::from(y.green);
	let db = i32::from(x.blue) - i32::from(y.blue);
	dr.unsigned_abs().pow(2) + dg.unsigned_abs().pow(2) + db.unsigned_abs().pow(2)
}

/// Euclidean distance between two colors in RGB space
#[must_use]
pub fn distance(x: Color, y: Color) -> f64 {
	f64::from(squared_distance(x, y)).sqrt()
}

/// Returns the index of the centroid nearest to `color`
///
/// On ties, the centroid with the lowest index wins.
/// `centroids` must not be empty.
fn nearest(color: Color, centroids: &[Color]) -> usize {
	let mut min_dist = squared_distance(color, centroids[0]);
	let mut min_center = 0;
	for (i, &centroid) in centroids.iter().enumerate().skip(1) {
		let dist = squared_distance(color, centroid);
		if dist < min_dist {
			min_dist = dist;
			min_center = i;
		}
	}
	min_center
}

/// Running channel sums and pixel counts for each center
#[derive(Debug, Clone, PartialEq, Eq)]
struct CenterSums {
	/// Per channel sum of all pixels in this center
	sum: Vec<[u64; 3]>,
	/// Number of pixels in this center
	count: Vec<u64>,
}

impl CenterSums {
	/// Create a [`CenterSums`] with the given number of centers
	fn new(k: usize) -> Self {
		Self { sum: vec![[0; 3]; k], count: vec![0; k] }
	}

	/// Add a pixel to the given center
	fn add(&mut self, center: usize, color: Color) {
		let sum = &mut self.sum[center];
		sum[0] += u64::from(color.red);
		sum[1] += u64::from(color.green);
		sum[2] += u64::from(color.blue);
		self.count[center] += 1;
	}

	/// Combine the sums and counts from two disjoint sets of pixels
	#[cfg(any(feature = "threads", test))]
	fn merge(mut self, other: Self) -> Self {
		for (sum, other) in self.sum.iter_mut().zip(&other.sum) {
			for (s, o) in sum.iter_mut().zip(other) {
				*s += o;
			}
		}
		for (count, other) in self.count.iter_mut().zip(&other.count) {
			*count += other;
		}
		self
	}

	/// The mean color of a center, truncated toward zero, or `None` if it has no pixels
	// the mean of u8 values is <= u8::MAX
	#[allow(clippy::cast_possible_truncation)]
	fn mean(&self, center: usize) -> Option<Color> {
		let n = self.count[center];
		if n == 0 {
			None
		} else {
			let [r, g, b] = self.sum[center].map(|s| s / n);
			Some(Color::new(r as u8, g as u8, b as u8))
		}
	}
}

/// Assign each pixel to its nearest centroid, accumulating the sums and counts
fn accumulate_serial(pixels: &[Color], centroids: &[Color]) -> CenterSums {
	let mut sums = CenterSums::new(centroids.len());
	for &color in pixels {
		sums.add(nearest(color, centroids), color);
	}
	sums
}

/// Assign each pixel to its nearest centroid, accumulating the sums and counts
#[cfg(not(feature = "threads"))]
fn accumulate(pixels: &[Color], centroids: &[Color]) -> CenterSums {
	accumulate_serial(pixels, centroids)
}

/// Assign each pixel to its nearest centroid, accumulating the sums and counts
///
/// Each thread accumulates one chunk of pixels, and the partial results are then added together.
#[cfg(feature = "threads")]
fn accumulate(pixels: &[Color], centroids: &[Color]) -> CenterSums {
	use rayon::prelude::*;

	let chunk_size = pixels.len().div_ceil(rayon::current_num_threads()).max(1);
	pixels
		.par_chunks(chunk_size)
		.map(|chunk| accumulate_serial(chunk, centroids))
		.reduce(|| CenterSums::new(centroids.len()), CenterSums::merge)
}

/// The result of a single clustering pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterPass {
	/// The updated palette, in the same order as the input palette
	pub palette: Palette,
	/// Number of pixels assigned to each color of the input palette
	pub counts: Vec<u64>,
}

/// Run a pass on a pixel slice that is known to be non-empty
fn pass_nonempty(pixels: &[Color], seed: &Palette) -> ClusterPass {
	let sums = accumulate(pixels, seed.colors());

	let colors = seed
		.colors()
		.iter()
		.enumerate()
		.map(|(i, &centroid)| sums.mean(i).unwrap_or(centroid))
		.collect();

	ClusterPass { palette: Palette { colors }, counts: sums.count }
}

/// Run one k-means pass, also returning the number of pixels assigned to each color.
///
/// See [`cluster`].
///
/// # Errors
/// Returns [`PaletteError::NoPixels`] if `pixels` is empty.
pub fn pass(pixels: &[Color], seed: &Palette) -> Result<ClusterPass, PaletteError> {
	if pixels.is_empty() {
		Err(PaletteError::NoPixels)
	} else {
		Ok(pass_nonempty(pixels, seed))
	}
}

/// Run one k-means pass.
///
/// Every pixel is assigned to the nearest color in `seed` (lowest index on ties),
/// and each color is replaced by the mean of its pixels, truncated toward zero.
/// A color with no pixels is left unchanged.
///
/// # Errors
/// Returns [`PaletteError::NoPixels`] if `pixels` is empty.
pub fn cluster(pixels: &[Color], seed: &Palette) -> Result<Palette, PaletteError> {
	pass(pixels, seed).map(|pass| pass.palette)
}

/// An unbounded iterator of k-means passes, see [`passes`]
#[derive(Debug, Clone)]
pub struct Passes<'a> {
	/// Pixels being clustered, never empty
	pixels: &'a [Color],
	/// The input palette for the next pass
	palette: Palette,
}

impl Iterator for Passes<'_> {
	type Item = ClusterPass;

	fn next(&mut self) -> Option<Self::Item> {
		let pass = pass_nonempty(self.pixels, &self.palette);
		self.palette = pass.palette.clone();
		Some(pass)
	}
}

/// Repeatedly run k-means passes, starting from `initial`.
///
/// Each yielded palette is the input to the next pass.
/// The iterator never ends, so use [`Iterator::take`] for a fixed number of iterations.
///
/// # Errors
/// Returns [`PaletteError::NoPixels`] if `pixels` is empty.
pub fn passes(pixels: &[Color], initial: Palette) -> Result<Passes<'_>, PaletteError> {
	if pixels.is_empty() {
		Err(PaletteError::NoPixels)
	} else {
		Ok(Passes { pixels, palette: initial })
	}
}
