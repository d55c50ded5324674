use std::path::{Path, PathBuf};

use image::{GrayImage, ImageBuffer, ImageFormat, Luma, Rgb};
use ndarray::Array2;

use crate::error::{DeblurError, Result};
use crate::frame::{ColorFrame, Frame, StereoImage};
use crate::psf::Psf;

fn buffer_error(w: usize, h: usize) -> DeblurError {
    DeblurError::InvalidDimensions {
        width: w,
        height: h,
    }
}

/// Save a frame as 16-bit grayscale TIFF.
pub fn save_tiff(frame: &Frame, path: &Path) -> Result<()> {
    let (h, w) = frame.data.dim();
    let pixels: Vec<u16> = frame
        .data
        .iter()
        .map(|&v| (v.clamp(0.0, 1.0) * 65535.0) as u16)
        .collect();

    let img = ImageBuffer::<Luma<u16>, Vec<u16>>::from_raw(w as u32, h as u32, pixels)
        .ok_or_else(|| buffer_error(w, h))?;
    img.save(path)?;
    Ok(())
}

/// Save a frame as 8-bit grayscale PNG.
pub fn save_png(frame: &Frame, path: &Path) -> Result<()> {
    let (h, w) = frame.data.dim();
    let mut img = GrayImage::new(w as u32, h as u32);
    for ((row, col), &v) in frame.data.indexed_iter() {
        let val = (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        img.put_pixel(col as u32, row as u32, Luma([val]));
    }

    img.save_with_format(path, ImageFormat::Png)?;
    Ok(())
}

/// Save frame, choosing format from file extension.
pub fn save_image(frame: &Frame, path: &Path) -> Result<()> {
    match extension(path).as_deref() {
        Some("tiff" | "tif") => save_tiff(frame, path),
        Some("png") => save_png(frame, path),
        _ => save_tiff(frame, path),
    }
}

/// Save a ColorFrame as 16-bit RGB TIFF.
pub fn save_color_tiff(color: &ColorFrame, path: &Path) -> Result<()> {
    let (h, w) = color.red.data.dim();
    let mut pixels: Vec<u16> = Vec::with_capacity(h * w * 3);
    for ((r, g), b) in color
        .red
        .data
        .iter()
        .zip(color.green.data.iter())
        .zip(color.blue.data.iter())
    {
        for v in [r, g, b] {
            pixels.push((v.clamp(0.0, 1.0) * 65535.0) as u16);
        }
    }

    let img = ImageBuffer::<Rgb<u16>, Vec<u16>>::from_raw(w as u32, h as u32, pixels)
        .ok_or_else(|| buffer_error(w, h))?;
    img.save(path)?;
    Ok(())
}

/// Save a ColorFrame as 8-bit RGB PNG.
pub fn save_color_png(color: &ColorFrame, path: &Path) -> Result<()> {
    let (h, w) = color.red.data.dim();
    let to_u8 = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;

    let mut img = image::RgbImage::new(w as u32, h as u32);
    for row in 0..h {
        for col in 0..w {
            let r = to_u8(color.red.data[[row, col]]);
            let g = to_u8(color.green.data[[row, col]]);
            let b = to_u8(color.blue.data[[row, col]]);
            img.put_pixel(col as u32, row as u32, Rgb([r, g, b]));
        }
    }

    img.save_with_format(path, ImageFormat::Png)?;
    Ok(())
}

/// Save a ColorFrame, choosing format from file extension.
pub fn save_color_image(color: &ColorFrame, path: &Path) -> Result<()> {
    match extension(path).as_deref() {
        Some("tiff" | "tif") => save_color_tiff(color, path),
        Some("png") => save_color_png(color, path),
        _ => save_color_tiff(color, path),
    }
}

pub fn save_stereo_image(image: &StereoImage, path: &Path) -> Result<()> {
    match image {
        StereoImage::Mono(frame) => save_image(frame, path),
        StereoImage::Color(color) => save_color_image(color, path),
    }
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

fn bit_depth(img: &image::DynamicImage) -> u8 {
    match img.color() {
        image::ColorType::L8 | image::ColorType::La8 | image::ColorType::Rgb8 | image::ColorType::Rgba8 => 8,
        _ => 16,
    }
}

/// Load a grayscale image file into a Frame.
pub fn load_image(path: &Path) -> Result<Frame> {
    let img = image::open(path)?;
    let depth = bit_depth(&img);
    let gray = img.to_luma16();
    let (w, h) = gray.dimensions();
    let data = Array2::from_shape_fn((h as usize, w as usize), |(row, col)| {
        gray.get_pixel(col as u32, row as u32).0[0] as f32 / 65535.0
    });

    Ok(Frame::new(data, depth))
}

/// Load a color image file into a ColorFrame.
pub fn load_color_image(path: &Path) -> Result<ColorFrame> {
    let img = image::open(path)?;
    let depth = bit_depth(&img);
    let rgb = img.to_rgb16();
    let (w, h) = rgb.dimensions();
    let channel = |c: usize| {
        let data = Array2::from_shape_fn((h as usize, w as usize), |(row, col)| {
            rgb.get_pixel(col as u32, row as u32).0[c] as f32 / 65535.0
        });
        Frame::new(data, depth)
    };

    Ok(ColorFrame::from_channels([channel(0), channel(1), channel(2)]))
}

/// Load one view of the stereo pair, keeping color when asked to.
pub fn load_stereo_image(path: &Path, color: bool) -> Result<StereoImage> {
    if color {
        Ok(StereoImage::Color(load_color_image(path)?))
    } else {
        Ok(StereoImage::Mono(load_image(path)?))
    }
}

/// `<dir>/kernel<index>.png`, the bootstrap kernel of the `index`-th
/// top-level region.
pub fn kernel_path(dir: &Path, index: usize) -> PathBuf {
    dir.join(format!("kernel{index}.png"))
}

/// Load a kernel image and turn it into an energy-preserving kernel.
pub fn load_kernel(path: &Path) -> Result<Psf> {
    let kernel_error = |reason: String| DeblurError::KernelLoad {
        path: path.to_path_buf(),
        reason,
    };
    let frame = load_image(path).map_err(|e| kernel_error(e.to_string()))?;
    Psf::from_weights(frame.data).map_err(|e| kernel_error(e.to_string()))
}

/// Save a kernel as 8-bit PNG, scaled so its largest weight is white.
pub fn save_kernel(psf: &Psf, path: &Path) -> Result<()> {
    let weights = psf.as_array();
    let max = weights.iter().fold(0.0f32, |m, &v| m.max(v));
    let scale = if max > 0.0 { 1.0 / max } else { 0.0 };
    save_png(&Frame::new(weights.mapv(|v| v * scale), 8), path)
}
