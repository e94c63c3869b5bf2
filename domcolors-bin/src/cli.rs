//! Specifies the CLI and handles arg parsing

use clap::{Parser, ValueEnum};
use domcolors::SwatchSize;
use std::path::PathBuf;

/// Supported formats for printing each iteration's colors
#[derive(Copy, Clone, ValueEnum)]
pub enum FormatOutput {
	/// sRGB hexcode
	Hex,
	/// sRGB (r,g,b) triple
	Rgb,
	/// Whitespace with true color background
	Swatch,
}

/// Extract the dominant colors of an image by k-means clustering on RGB values.
///
/// After each clustering iteration, the current palette is written as a PNG of stacked swatches
/// to `<prefix>_<iteration>.png`.
#[derive(Parser)]
#[command(version)]
pub struct Options {
	/// The number of colors to extract
	#[arg(value_parser = clap::value_parser!(u8).range(1..))]
	pub k: u8,

	/// The path to the input image
	#[arg(short, long)]
	pub image: PathBuf,

	/// The number of k-means iterations to run
	///
	/// There is no convergence check, so exactly this many iterations are run
	/// and this many palette images are written.
	#[arg(short = 'n', long, default_value_t = 10)]
	pub iterations: u32,

	/// The path prefix of the output images
	///
	/// Missing parent directories are created.
	#[arg(short = 'o', long, default_value = "out/output")]
	pub prefix: PathBuf,

	/// The width of each color swatch in the output images
	#[arg(long, default_value_t = 256, value_parser = clap::value_parser!(u32).range(1..))]
	pub swatch_width: u32,

	/// The height of each color swatch in the output images
	#[arg(long, default_value_t = 256, value_parser = clap::value_parser!(u32).range(1..))]
	pub swatch_height: u32,

	/// The format to print each iteration's colors in
	#[arg(short, long, default_value = "rgb")]
	pub format: FormatOutput,

	/// The maximum image size, in number of pixels, before a thumbnail is created
	///
	/// This option is intended for reducing the time needed for large images,
	/// but multiple pixels in the original image are interpolated to form a pixel in the thumbnail.
	#[arg(short = 'p', long, default_value_t = u32::MAX, value_parser = clap::value_parser!(u32).range(1..))]
	pub max_pixels: u32,

	/// The seed value used for the random number generator that picks the initial colors
	#[arg(long, default_value_t = 0)]
	pub seed: u64,

	/// The number of threads to use
	///
	/// A value of 0 uses one thread per logical CPU.
	#[cfg(feature = "threads")]
	#[arg(short, long, default_value_t = 0)]
	pub threads: u8,

	/// Print additional information, such as timings and the number of pixels for each color
	#[arg(long)]
	pub verbose: bool,
}

impl Options {
	/// The swatch dimensions for the output images
	#[must_use]
	pub fn swatch_size(&self) -> SwatchSize {
		SwatchSize { width: self.swatch_width, height: self.swatch_height }
	}
}
