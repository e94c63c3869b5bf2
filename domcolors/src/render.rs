//! Render a palette as an image of stacked swatches

use crate::{Palette, PaletteError};
use image::{Rgb, RgbImage};

/// Dimensions of the block drawn for each palette color
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwatchSize {
	/// Width in pixels
	pub width: u32,
	/// Height in pixels
	pub height: u32,
}

impl Default for SwatchSize {
	fn default() -> Self {
		Self { width: 256, height: 256 }
	}
}

/// Render the palette as a column of solid color swatches.
///
/// The image is `swatch.width` pixels wide and `swatch.height * palette.len()` pixels high.
/// Rows `i * swatch.height..(i + 1) * swatch.height` are filled with the `i`-th color.
///
/// # Errors
/// Returns [`PaletteError::EmptySwatch`] if either swatch dimension is `0`,
/// or [`PaletteError::SwatchTooLarge`] if the image height does not fit in a `u32`
/// or the image buffer does not fit in memory.
pub fn render(palette: &Palette, swatch: SwatchSize) -> Result<RgbImage, PaletteError> {
	let SwatchSize { width, height } = swatch;
	if width == 0 || height == 0 {
		return Err(PaletteError::EmptySwatch);
	}

	let total_height = u32::try_from(palette.len())
		.ok()
		.and_then(|k| k.checked_mul(height))
		.ok_or(PaletteError::SwatchTooLarge)?;

	let bytes = u64::from(width) * u64::from(total_height) * 3;
	if usize::try_from(bytes).is_err() {
		return Err(PaletteError::SwatchTooLarge);
	}

	let colors = palette.colors();
	Ok(RgbImage::from_fn(width, total_height, |_, y| {
		let color = colors[(y / height) as usize];
		Rgb([color.red, color.green, color.blue])
	}))
}
