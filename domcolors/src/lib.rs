//! Extract the dominant colors of an image by iterative k-means clustering on RGB pixel values.
//!
//! # Examples
//!
//! ## Read an image file and run 10 clustering passes for 5 colors.
//!
//! ```no_run
//! let pixels = image::open("some image").unwrap().into_rgb8();
//! let srgb = palette::cast::from_component_slice(pixels.as_raw());
//!
//! let initial = domcolors::Palette::random(5, 0).unwrap();
//! for pass in domcolors::passes(srgb, initial).unwrap().take(10) {
//! 	println!("{:?}", pass.palette.colors());
//! }
//! ```
//!
//! ## Render a palette as stacked swatches.
//!
//! ```no_run
//! use domcolors::{render, Palette, SwatchSize};
//! use palette::Srgb;
//!
//! let palette = Palette::new(vec![Srgb::new(255, 0, 0), Srgb::new(0, 255, 0)]).unwrap();
//! let image = render(&palette, SwatchSize::default()).unwrap();
//! image.save("palette.png").unwrap();
//! ```
//!
//! # Arguments
//!
//! ## K
//!
//! This is the number of colors in the palette.
//! It is fixed for the whole run: every pass returns exactly `k` colors,
//! even if some of them attracted no pixels.
//!
//! ## Seed
//!
//! This is the value used to seed the random number generator which picks the initial palette.
//! Each channel of each initial color is drawn uniformly from `0..=255`.
//!
//! Provide any arbitrary value like `0`, `42`, or `123456789`.
//!
//! ## Iterations
//!
//! There is no convergence check.
//! [`passes`] yields a new palette forever and the caller decides how many to take.
//!
//! # Empty clusters
//!
//! A color that is not the nearest color for any pixel keeps its previous value.
//! Clustering is therefore a pure function of the pixels and the input palette.

#![deny(unsafe_code)]
#![warn(clippy::pedantic, clippy::cargo)]
#![warn(clippy::use_debug, clippy::dbg_macro, clippy::todo, clippy::unimplemented)]
#![warn(clippy::unwrap_used, clippy::unwrap_in_result)]
#![warn(clippy::unneeded_field_pattern, clippy::rest_pat_in_fully_bound_structs)]
#![warn(clippy::unnecessary_self_imports)]
#![warn(clippy::str_to_string, clippy::string_to_string, clippy::string_slice)]
#![warn(missing_docs, clippy::missing_docs_in_private_items, rustdoc::all)]
#![warn(clippy::float_cmp_const, clippy::lossy_float_literal)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::enum_glob_use)]
#![allow(clippy::unreadable_literal)]

use palette::Srgb;
use rand::{Rng, SeedableRng};
use std::fmt::{self, Display};

mod kmeans;
mod render;

pub use kmeans::{cluster, distance, pass, passes, ClusterPass, Passes};
pub use render::{render, SwatchSize};

/// An 8-bit sRGB color
pub type Color = Srgb<u8>;

/// Error cases for clustering and rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaletteError {
	/// The pixel buffer had no pixels
	NoPixels,
	/// A palette was requested or provided with no colors
	EmptyPalette,
	/// The swatch width or height was zero
	EmptySwatch,
	/// The rendered image would not fit in memory or in `u32` dimensions
	SwatchTooLarge,
}

impl Display for PaletteError {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self {
			PaletteError::NoPixels => write!(f, "The image has no pixels"),
			PaletteError::EmptyPalette => write!(f, "A palette must have at least one color"),
			PaletteError::EmptySwatch => write!(f, "Swatch width and height must be greater than zero"),
			PaletteError::SwatchTooLarge => write!(f, "The palette image is too large to render"),
		}
	}
}

impl std::error::Error for PaletteError {}

/// A non-empty, ordered sequence of colors
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
	/// The colors, never empty
	colors: Vec<Color>,
}

#[allow(clippy::len_without_is_empty)]
impl Palette {
	/// Create a palette from the given colors.
	///
	/// # Errors
	/// Returns [`PaletteError::EmptyPalette`] if `colors` is empty.
	pub fn new(colors: Vec<Color>) -> Result<Self, PaletteError> {
		if colors.is_empty() {
			Err(PaletteError::EmptyPalette)
		} else {
			Ok(Self { colors })
		}
	}

	/// Create a palette of `k` random colors.
	///
	/// Each channel is drawn independently and uniformly from `0..=255`.
	/// The same `seed` always gives the same palette.
	///
	/// # Errors
	/// Returns [`PaletteError::EmptyPalette`] if `k` is `0`.
	pub fn random(k: u8, seed: u64) -> Result<Self, PaletteError> {
		let mut rng = rand_xoshiro::Xoroshiro128PlusPlus::seed_from_u64(seed);
		Self::new(random_colors(&mut rng, k))
	}

	/// The colors in this palette
	#[must_use]
	pub fn colors(&self) -> &[Color] {
		&self.colors
	}

	/// The number of colors, always at least one
	#[must_use]
	pub fn len(&self) -> usize {
		self.colors.len()
	}

	/// Consume the palette, returning its colors
	#[must_use]
	pub fn into_colors(self) -> Vec<Color> {
		self.colors
	}
}

/// Draw `k` colors with uniformly random channels
fn random_colors(rng: &mut impl Rng, k: u8) -> Vec<Color> {
	(0..k).map(|_| Srgb::new(rng.gen(), rng.gen(), rng.gen())).collect()
}
