//! # Camera Equipment Communications Module

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::convert::TryFrom;

use base64::DecodeError;
use chrono::{serde::ts_milliseconds, DateTime, Utc};
use image::{DynamicImage, ImageError, RgbImage};
use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A serialisable frame from the forward navigation camera
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CamFrame {
    /// UTC timestamp at which the frame was acquired
    #[serde(with = "ts_milliseconds")]
    pub timestamp: DateTime<Utc>,

    /// The format of this frame
    pub format: ImageFormat,

    /// The formatted (PNG or JPEG) image data, encoded in base64.
    pub b64_data: String,
}

/// A decoded camera frame.
#[derive(Debug, Clone)]
pub struct CamImage {
    /// UTC timestamp at which the frame was acquired
    pub timestamp: DateTime<Utc>,

    /// The image itself
    pub image: RgbImage,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Possible formats for camera images. This is used rather than image::ImageFormat to:
///     1. Restrict the formats that can be sent back and forth
///     2. Allow serialisation as image::ImageFormat does not implement serde.
#[derive(Debug, Serialize, Deserialize, Copy, Clone, PartialEq)]
pub enum ImageFormat {
    /// PNG image
    Png,

    /// JPEG image with a quality value between 1 and 100, where 100 is best.
    Jpeg(u8),
}

#[derive(Debug, thiserror::Error)]
pub enum CamError {
    #[error("Failed to decode frame from base64: {0}")]
    Base64DecodeError(DecodeError),

    #[error("Failed to decode the image data: {0}")]
    ImageDecodeError(ImageError),

    #[error("Failed to encode the image data: {0}")]
    ImageEncodeError(ImageError),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl TryFrom<CamFrame> for CamImage {
    type Error = CamError;

    fn try_from(frame: CamFrame) -> Result<Self, Self::Error> {
        let bytes = base64::decode(&frame.b64_data).map_err(CamError::Base64DecodeError)?;

        let format = match frame.format {
            ImageFormat::Png => image::ImageFormat::Png,
            ImageFormat::Jpeg(_) => image::ImageFormat::Jpeg,
        };

        let image = image::load_from_memory_with_format(&bytes, format)
            .map_err(CamError::ImageDecodeError)?
            .to_rgb8();

        Ok(Self {
            timestamp: frame.timestamp,
            image,
        })
    }
}

impl CamImage {
    /// Convert this camera image into a camera frame with the given format
    pub fn to_cam_frame(&self, format: ImageFormat) -> Result<CamFrame, CamError> {
        let mut data = Vec::<u8>::new();

        let output_format = match format {
            ImageFormat::Png => image::ImageOutputFormat::Png,
            ImageFormat::Jpeg(q) => image::ImageOutputFormat::Jpeg(q),
        };

        DynamicImage::ImageRgb8(self.image.clone())
            .write_to(&mut data, output_format)
            .map_err(CamError::ImageEncodeError)?;

        Ok(CamFrame {
            timestamp: self.timestamp,
            format,
            b64_data: base64::encode(&data),
        })
    }

    /// Width and height of the image in pixels
    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_png_frame() {
        let mut image = RgbImage::new(4, 2);
        image.put_pixel(1, 0, Rgb([200, 180, 20]));
        image.put_pixel(3, 1, Rgb([10, 20, 30]));

        let cam_image = CamImage {
            timestamp: Utc::now(),
            image,
        };

        let frame = cam_image.to_cam_frame(ImageFormat::Png).unwrap();
        let json = serde_json::to_string(&frame).unwrap();
        let decoded = CamImage::try_from(serde_json::from_str::<CamFrame>(&json).unwrap()).unwrap();

        // PNG is lossless so every pixel survives
        assert_eq!(decoded.image, cam_image.image);
        assert_eq!(decoded.dimensions(), (4, 2));
    }

    #[test]
    fn test_bad_frame() {
        let frame = CamFrame {
            timestamp: Utc::now(),
            format: ImageFormat::Png,
            b64_data: String::from("not base64!"),
        };

        assert!(matches!(
            CamImage::try_from(frame),
            Err(CamError::Base64DecodeError(_))
        ));

        let frame = CamFrame {
            timestamp: Utc::now(),
            format: ImageFormat::Png,
            b64_data: base64::encode(b"definitely not a png"),
        };

        assert!(matches!(
            CamImage::try_from(frame),
            Err(CamError::ImageDecodeError(_))
        ));
    }
}
