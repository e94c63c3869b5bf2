//! Extract the dominant colors of an image by iterative k-means clustering,
//! writing the palette as an image of swatches after every iteration.

#![deny(unsafe_code, unsafe_op_in_unsafe_fn)]
#![warn(
    clippy::pedantic,
    clippy::cargo,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::todo,
    clippy::unimplemented,
    clippy::unwrap_used,
    clippy::unwrap_in_result,
    clippy::unneeded_field_pattern,
    clippy::rest_pat_in_fully_bound_structs,
    clippy::unnecessary_self_imports,
    clippy::str_to_string,
    clippy::string_to_string,
    clippy::string_slice,
    missing_docs,
    clippy::missing_docs_in_private_items,
    rustdoc::all,
    clippy::float_cmp_const,
    clippy::lossy_float_literal
)]
#![allow(
    clippy::doc_markdown,
    clippy::module_name_repetitions,
    clippy::missing_panics_doc,
    clippy::unreadable_literal
)]

mod cli;

use cli::{FormatOutput, Options};

use std::{
    ffi::OsString,
    fmt::{self, Display},
    path::{Path, PathBuf},
    process::ExitCode,
    time::Instant,
};

use clap::Parser;
use colored::Colorize;
use domcolors::{ClusterPass, Color, Palette, PaletteError};
use image::{DynamicImage, GenericImageView, ImageFormat, RgbImage};

/// Record the running time of a function and print the elapsed time
macro_rules! time {
    ($name: literal, $verbose: expr, $func_call: expr) => {{
        let start = Instant::now();
        let result = $func_call;
        if $verbose {
            println!("{} took {}ms", $name, start.elapsed().as_millis());
        }
        result
    }};
}

/// Error cases for a palette extraction run
#[derive(Debug)]
enum RunError {
    /// Failed to read or decode the image file
    ImageLoad(image::ImageError),
    /// The image or options could not produce a palette
    Palette(PaletteError),
    /// Failed to create the directory for the output images
    CreateDir(PathBuf, std::io::Error),
    /// Failed to encode or write an output image
    Write(PathBuf, image::ImageError),
    /// Failed to build the thread pool
    #[cfg(feature = "threads")]
    ThreadPool(rayon::ThreadPoolBuildError),
}

impl Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RunError::ImageLoad(e) => write!(f, "Failed to load the image file: {e}"),
            RunError::Palette(e) => write!(f, "{e}"),
            RunError::CreateDir(dir, e) => {
                write!(f, "Failed to create the output directory {}: {e}", dir.display())
            }
            RunError::Write(path, e) => write!(f, "Failed to write {}: {e}", path.display()),
            #[cfg(feature = "threads")]
            RunError::ThreadPool(e) => write!(f, "Failed to create the thread pool: {e}"),
        }
    }
}

impl From<PaletteError> for RunError {
    fn from(e: PaletteError) -> Self {
        RunError::Palette(e)
    }
}

fn main() -> ExitCode {
    let options = match Options::try_parse() {
        Ok(options) => options,
        Err(e) => {
            // --help and --version are not errors, everything else exits with 1 instead of clap's 2
            // Nothing more can be reported if printing the message itself fails
            e.print().ok();
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    let result = run_extract_and_write_palettes(&options);

    // Returning Result<_> uses Debug printing instead of Display
    if let Err(e) = result {
        eprintln!("{e}");
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

/// Builds a thread pool and then runs `extract_and_write_palettes`
#[cfg(feature = "threads")]
fn run_extract_and_write_palettes(options: &Options) -> Result<(), RunError> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(usize::from(options.threads))
        .build()
        .map_err(RunError::ThreadPool)?;

    pool.install(|| extract_and_write_palettes(options))
}

/// Runs `extract_and_write_palettes` on a single thread
#[cfg(not(feature = "threads"))]
fn run_extract_and_write_palettes(options: &Options) -> Result<(), RunError> {
    extract_and_write_palettes(options)
}

/// Load an image, then run the k-means iterations, writing and printing the palette after each one
fn extract_and_write_palettes(options: &Options) -> Result<(), RunError> {
    let verbose = options.verbose;

    // Input
    let img = time!("Image loading", verbose, load_image(&options.image))?;
    if verbose {
        let (width, height) = img.dimensions();
        println!(
            "Width: {width}\nHeight: {height}\nChannels: {}",
            img.color().channel_count()
        );
    }
    let img = generate_thumbnail(img, options.max_pixels, verbose);
    let img = img.into_rgb8();
    let pixels: &[Color] = palette::cast::from_component_slice(img.as_raw());

    // Processing and output
    let initial = Palette::random(options.k, options.seed)?;
    let mut passes = domcolors::passes(pixels, initial)?;
    create_output_dir(&options.prefix)?;

    let swatch = options.swatch_size();
    for iteration in 0..options.iterations {
        let next = time!("k-means pass", verbose, passes.next());
        let Some(ClusterPass { palette, counts }) = next else {
            break;
        };

        let path = output_path(&options.prefix, iteration);
        let image = domcolors::render(&palette, swatch)?;
        if verbose {
            println!("Writing {}", path.display());
        }
        time!("Writing", verbose, write_png(&image, &path))?;

        print_palette(iteration, palette.colors(), options.format);
        if verbose {
            print_counts(&counts);
        }
    }

    Ok(())
}

/// Load the image at the given path
fn load_image(path: &Path) -> Result<DynamicImage, RunError> {
    image::open(path).map_err(RunError::ImageLoad)
}

/// Create a thumbnail with at most `max_pixels` pixels if the image has more than `max_pixels` pixels
fn generate_thumbnail(image: DynamicImage, max_pixels: u32, verbose: bool) -> DynamicImage {
    // The number of pixels should be < u64::MAX, since image dimensions are (u32, u32)
    let (width, height) = image.dimensions();
    let pixels = u64::from(width) * u64::from(height);
    if pixels <= u64::from(max_pixels) {
        image
    } else {
        // (u64 as f64) only gives innaccurate results for very large u64
        #[allow(clippy::cast_precision_loss)]
        let scale = (f64::from(max_pixels) / pixels as f64).sqrt();

        // multiplying by a positive factor < 1
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let (thumb_width, thumb_height) = (
            (f64::from(width) * scale) as u32,
            (f64::from(height) * scale) as u32,
        );

        if verbose {
            println!("Creating a thumbnail with dimensions {thumb_width}x{thumb_height}");
        }

        time!(
            "Image thumbnail",
            verbose,
            image.thumbnail(thumb_width, thumb_height)
        )
    }
}

/// The output image path for an iteration: `<prefix>_<iteration>.png`
fn output_path(prefix: &Path, iteration: u32) -> PathBuf {
    let mut path = OsString::from(prefix.as_os_str());
    path.push(format!("_{iteration}.png"));
    PathBuf::from(path)
}

/// Create the parent directory of the output prefix, if it has one
fn create_output_dir(prefix: &Path) -> Result<(), RunError> {
    match prefix.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => {
            std::fs::create_dir_all(dir).map_err(|e| RunError::CreateDir(dir.to_path_buf(), e))
        }
        _ => Ok(()),
    }
}

/// Encode the image as a PNG at the given path
fn write_png(image: &RgbImage, path: &Path) -> Result<(), RunError> {
    image
        .save_with_format(path, ImageFormat::Png)
        .map_err(|e| RunError::Write(path.to_path_buf(), e))
}

/// Format a single color for printing
fn format_color(color: Color, format: FormatOutput) -> String {
    match format {
        FormatOutput::Hex => format!("{color:X}"),
        FormatOutput::Rgb => format!("({},{},{})", color.red, color.green, color.blue),
        FormatOutput::Swatch => "   "
            .on_truecolor(color.red, color.green, color.blue)
            .to_string(),
    }
}

/// Print a line with the iteration number and its colors
fn print_palette(iteration: u32, colors: &[Color], format: FormatOutput) {
    let delimiter = match format {
        FormatOutput::Hex | FormatOutput::Rgb => " ",
        FormatOutput::Swatch => "",
    };

    println!(
        "{iteration}: {}",
        colors
            .iter()
            .map(|&color| format_color(color, format))
            .collect::<Vec<_>>()
            .join(delimiter)
    );
}

/// Print the number of pixels assigned to each color
fn print_counts(counts: &[u64]) {
    println!(
        "Pixels per color: {}",
        counts
            .iter()
            .map(u64::to_string)
            .collect::<Vec<_>>()
            .join(" ")
    );
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use image::Rgb;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("domcolors-{name}-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn parse(args: &[&str]) -> Result<Options, clap::Error> {
        Options::try_parse_from(std::iter::once("domcolors").chain(args.iter().copied()))
    }

    fn write_test_image(path: &Path) {
        let red = Rgb([255, 0, 0]);
        let green = Rgb([0, 255, 0]);
        let img = RgbImage::from_fn(2, 2, |_, y| if y == 0 { red } else { green });
        img.save_with_format(path, ImageFormat::Png).unwrap();
    }

    #[test]
    fn output_path_appends_iteration() {
        assert_eq!(
            output_path(Path::new("out/output"), 0),
            PathBuf::from("out/output_0.png")
        );
        assert_eq!(
            output_path(Path::new("palette"), 9),
            PathBuf::from("palette_9.png")
        );
    }

    #[test]
    fn cli_defaults() {
        let options = parse(&["5", "-i", "img.png"]).unwrap();
        assert_eq!(options.k, 5);
        assert_eq!(options.image, PathBuf::from("img.png"));
        assert_eq!(options.iterations, 10);
        assert_eq!(options.prefix, PathBuf::from("out/output"));
        assert_eq!(options.swatch_size(), domcolors::SwatchSize::default());
        assert_eq!(options.seed, 0);
    }

    #[test]
    fn cli_rejects_bad_k() {
        for args in [
            &["-i", "img.png"][..],
            &["0", "-i", "img.png"][..],
            &["ten", "-i", "img.png"][..],
            &["256", "-i", "img.png"][..],
        ] {
            let error = parse(args).err().unwrap();
            assert!(error.use_stderr());
        }
    }

    #[test]
    fn cli_rejects_empty_swatch() {
        assert!(parse(&["3", "-i", "img.png", "--swatch-width", "0"]).is_err());
    }

    #[test]
    fn thumbnail_has_at_most_max_pixels() {
        let img = DynamicImage::ImageRgb8(RgbImage::new(200, 100));

        let unchanged = generate_thumbnail(img.clone(), 200 * 100, false);
        assert_eq!(unchanged.dimensions(), (200, 100));

        for max_pixels in [50, 1000, 5000, 19_999] {
            let thumb = generate_thumbnail(img.clone(), max_pixels, false);
            let (width, height) = thumb.dimensions();
            assert!(width * height <= max_pixels);
        }
    }

    #[test]
    fn load_missing_image_fails() {
        let dir = scratch_dir("missing");
        assert!(matches!(
            load_image(&dir.join("nothing.png")),
            Err(RunError::ImageLoad(_))
        ));
    }

    #[test]
    fn writes_one_image_per_iteration() {
        let dir = scratch_dir("iterations");
        let input = dir.join("input.png");
        write_test_image(&input);

        let prefix = dir.join("out").join("palette");
        let options = parse(&[
            "2",
            "-i",
            input.to_str().unwrap(),
            "-n",
            "3",
            "-o",
            prefix.to_str().unwrap(),
            "--swatch-width",
            "4",
            "--swatch-height",
            "5",
        ])
        .unwrap();

        extract_and_write_palettes(&options).unwrap();

        for iteration in 0..3 {
            let written = image::open(output_path(&prefix, iteration)).unwrap();
            assert_eq!(written.dimensions(), (4, 10));
        }
        assert!(!output_path(&prefix, 3).exists());
    }

    #[test]
    fn unwritable_prefix_fails() {
        let dir = scratch_dir("unwritable");
        let input = dir.join("input.png");
        write_test_image(&input);

        let blocker = dir.join("blocker");
        std::fs::write(&blocker, b"not a directory").unwrap();

        let prefix = blocker.join("palette");
        let options = parse(&[
            "2",
            "-i",
            input.to_str().unwrap(),
            "-o",
            prefix.to_str().unwrap(),
        ])
        .unwrap();

        assert!(matches!(
            extract_and_write_palettes(&options),
            Err(RunError::CreateDir(..))
        ));
    }

    #[test]
    fn write_failure_stops_at_that_iteration() {
        let dir = scratch_dir("write");
        let input = dir.join("input.png");
        write_test_image(&input);

        let prefix = dir.join("palette");
        std::fs::create_dir_all(output_path(&prefix, 1)).unwrap();

        let options = parse(&[
            "1",
            "-i",
            input.to_str().unwrap(),
            "-o",
            prefix.to_str().unwrap(),
        ])
        .unwrap();

        let result = extract_and_write_palettes(&options);
        assert!(
            matches!(&result, Err(RunError::Write(path, _)) if *path == output_path(&prefix, 1))
        );
        assert!(output_path(&prefix, 0).is_file());
        assert!(!output_path(&prefix, 2).exists());
    }

    #[test]
    fn corrupt_image_fails_before_writing() {
        let dir = scratch_dir("corrupt");
        let input = dir.join("input.png");
        std::fs::write(&input, b"definitely not a png").unwrap();

        let prefix = dir.join("out").join("palette");
        let options = parse(&[
            "2",
            "-i",
            input.to_str().unwrap(),
            "-o",
            prefix.to_str().unwrap(),
        ])
        .unwrap();

        assert!(matches!(
            extract_and_write_palettes(&options),
            Err(RunError::ImageLoad(_))
        ));
        assert!(!dir.join("out").exists());
    }
}
