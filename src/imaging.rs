//! Conversions between channel-first `[0, 1]` tensors and 8-bit RGB images

use crate::data::ImageShape;
use crate::{Error, Result};
use image::{imageops, DynamicImage, Rgb, RgbImage};

/// Gap in pixels between panels of a side-by-side render
const PANEL_GAP: u32 = 2;

/// Convert one channel-first image in `[0, 1]` to 8-bit RGB
///
/// Values are scaled by 255 and cast (saturating; NaN becomes 0), then
/// reordered to channel-last. Single-channel images are replicated to gray.
pub fn tensor_to_rgb(pixels: &[f32], shape: ImageShape) -> Result<RgbImage> {
    if pixels.len() != shape.numel() {
        return Err(Error::shape(
            "image tensor",
            vec![shape.channels, shape.height, shape.width],
            vec![pixels.len()],
        ));
    }
    let plane = shape.height * shape.width;
    let to_u8 = |v: f32| (v * 255.0) as u8;

    let channel_of: fn(usize) -> usize = match shape.channels {
        1 => |_| 0,
        3 => |c| c,
        _ => {
            return Err(Error::shape(
                "image channels",
                vec![3],
                vec![shape.channels],
            ))
        }
    };

    let img = RgbImage::from_fn(shape.width as u32, shape.height as u32, |x, y| {
        let offset = y as usize * shape.width + x as usize;
        Rgb([
            to_u8(pixels[channel_of(0) * plane + offset]),
            to_u8(pixels[channel_of(1) * plane + offset]),
            to_u8(pixels[channel_of(2) * plane + offset]),
        ])
    });
    Ok(img)
}

/// Convert a decoded image to channel-first `[0, 1]` floats of `shape`
///
/// Resizes when the source dimensions differ.
pub fn image_to_tensor(img: &DynamicImage, shape: ImageShape) -> Result<Vec<f32>> {
    let (w, h) = (shape.width as u32, shape.height as u32);
    let resized = if img.width() != w || img.height() != h {
        img.resize_exact(w, h, imageops::FilterType::Triangle)
    } else {
        img.clone()
    };

    let plane = shape.height * shape.width;
    let mut out = vec![0.0f32; shape.numel()];
    match shape.channels {
        1 => {
            let gray = resized.to_luma8();
            for (i, p) in gray.pixels().enumerate() {
                out[i] = f32::from(p.0[0]) / 255.0;
            }
        }
        3 => {
            let rgb = resized.to_rgb8();
            for (i, p) in rgb.pixels().enumerate() {
                for c in 0..3 {
                    out[c * plane + i] = f32::from(p.0[c]) / 255.0;
                }
            }
        }
        other => return Err(Error::shape("image channels", vec![3], vec![other])),
    }
    Ok(out)
}

/// Place images left to right on a white canvas
pub fn side_by_side(panels: &[RgbImage]) -> RgbImage {
    let height = panels.iter().map(RgbImage::height).max().unwrap_or(0);
    let width = panels.iter().map(RgbImage::width).sum::<u32>()
        + PANEL_GAP * panels.len().saturating_sub(1) as u32;

    let mut canvas = RgbImage::from_pixel(width, height, Rgb([255, 255, 255]));
    let mut x = 0i64;
    for panel in panels {
        imageops::replace(&mut canvas, panel, x, 0);
        x += i64::from(panel.width() + PANEL_GAP);
    }
    canvas
}
