//! Image ingestion: decode, lossless re-encode, thumbnail.
//!
//! # Responsibility
//! - Decode raster input with format auto-detection.
//! - Re-encode the full image to QOI (lossless, fixed RGBA8 layout).
//! - Produce a center-cropped, nearest-neighbor thumbnail, also as QOI.
//!
//! # Invariants
//! - Output blobs are always QOI RGBA8, whatever the input format was.
//! - Thumbnails have exactly the requested dimensions.

use image::{ImageFormat, RgbaImage};
use log::debug;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io::Cursor;

mod thumbnail;

pub use thumbnail::{center_crop, make_thumbnail, CropRect};

/// Stored pixel format of image and thumbnail blobs.
pub const STORED_FORMAT: ImageFormat = ImageFormat::Qoi;

pub type ImageResult<T> = Result<T, ImageError>;

#[derive(Debug)]
pub enum ImageError {
    /// Input is not a recognised or intact raster image.
    Decode(image::ImageError),
    Encode(image::ImageError),
    /// Decoded image has a zero dimension.
    EmptyImage,
}

impl Display for ImageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Decode(err) => write!(f, "could not decode image: {err}"),
            Self::Encode(err) => write!(f, "could not encode image: {err}"),
            Self::EmptyImage => write!(f, "image has no pixels"),
        }
    }
}

impl Error for ImageError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Decode(err) | Self::Encode(err) => Some(err),
            Self::EmptyImage => None,
        }
    }
}

/// Blobs ready to be stored for one entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedImage {
    /// Full-resolution image, QOI encoded.
    pub image: Vec<u8>,
    /// Thumbnail, QOI encoded.
    pub thumbnail: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Decodes `raw` and prepares the stored image and thumbnail blobs.
pub fn process_image(
    raw: &[u8],
    thumbnail_width: u32,
    thumbnail_height: u32,
) -> ImageResult<ProcessedImage> {
    let format = image::guess_format(raw).map_err(ImageError::Decode)?;
    let decoded = image::load_from_memory_with_format(raw, format)
        .map_err(ImageError::Decode)?
        .to_rgba8();
    if decoded.width() == 0 || decoded.height() == 0 {
        return Err(ImageError::EmptyImage);
    }
    debug!(
        "event=image_decode module=imaging status=ok format={:?} width={} height={}",
        format,
        decoded.width(),
        decoded.height()
    );

    let thumbnail = make_thumbnail(&decoded, thumbnail_width, thumbnail_height);
    Ok(ProcessedImage {
        image: encode_stored(&decoded)?,
        thumbnail: encode_stored(&thumbnail)?,
        width: decoded.width(),
        height: decoded.height(),
    })
}

/// Encodes pixels in the stored blob format.
pub fn encode_stored(pixels: &RgbaImage) -> ImageResult<Vec<u8>> {
    let mut bytes = Cursor::new(Vec::new());
    pixels
        .write_to(&mut bytes, STORED_FORMAT)
        .map_err(ImageError::Encode)?;
    Ok(bytes.into_inner())
}

/// Decodes a stored blob back into pixels.
pub fn decode_stored(blob: &[u8]) -> ImageResult<RgbaImage> {
    image::load_from_memory_with_format(blob, STORED_FORMAT)
        .map(|decoded| decoded.to_rgba8())
        .map_err(ImageError::Decode)
}
