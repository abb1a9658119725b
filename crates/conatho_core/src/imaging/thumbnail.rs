//! Center-crop + nearest-neighbor thumbnailing.

use image::imageops::{self, FilterType};
use image::RgbaImage;

/// Region of the source image kept for the thumbnail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Largest centered rectangle of `width x height` with the aspect ratio of
/// `target_width x target_height`.
///
/// Only the longer axis (relative to the target aspect) is cropped; the two
/// margins on that axis differ by at most one pixel.
pub fn center_crop(width: u32, height: u32, target_width: u32, target_height: u32) -> CropRect {
    let full = CropRect {
        x: 0,
        y: 0,
        width,
        height,
    };
    if width == 0 || height == 0 || target_width == 0 || target_height == 0 {
        return full;
    }

    // Cross-multiplied in u64 so large inputs cannot overflow.
    let source_wide = u64::from(width) * u64::from(target_height);
    let source_tall = u64::from(height) * u64::from(target_width);

    if source_wide > source_tall {
        let crop_width = (source_tall / u64::from(target_height)).max(1) as u32;
        CropRect {
            x: (width - crop_width) / 2,
            width: crop_width,
            ..full
        }
    } else if source_tall > source_wide {
        let crop_height = (source_wide / u64::from(target_width)).max(1) as u32;
        CropRect {
            y: (height - crop_height) / 2,
            height: crop_height,
            ..full
        }
    } else {
        full
    }
}

/// Crops `source` to the target aspect around its center and resamples it
/// with nearest-neighbor to exactly `target_width x target_height`.
pub fn make_thumbnail(source: &RgbaImage, target_width: u32, target_height: u32) -> RgbaImage {
    let rect = center_crop(source.width(), source.height(), target_width, target_height);
    let cropped = imageops::crop_imm(source, rect.x, rect.y, rect.width, rect.height).to_image();
    imageops::resize(&cropped, target_width, target_height, FilterType::Nearest)
}
