//! Image introspection: format detection, dimensions and EXIF camera tags.
//!
//! Detection sniffs the file header rather than trusting the extension, so a
//! renamed PNG is still recognised and a text file named `.jpg` is not.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use exif::{In, Tag, Value};
use image::{ImageFormat, ImageReader};
use serde::Serialize;

/// Basic facts about an image file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
    pub format: String,
    pub mime: String,
}

/// Camera and capture tags read from EXIF.
///
/// The shape is fixed: a tag missing from the file is `None`. `mime` is the
/// detected image type; `created` is the original capture time, falling back
/// to the generic EXIF date.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CameraInfo {
    pub created: Option<String>,
    pub mime: Option<String>,
    pub make: Option<String>,
    pub model: Option<String>,
    pub orientation: Option<String>,
    pub x_resolution: Option<String>,
    pub y_resolution: Option<String>,
    pub resolution_unit: Option<String>,
    pub software: Option<String>,
    pub date_time: Option<String>,
    pub exposure_time: Option<String>,
    pub f_number: Option<String>,
    pub iso_speed: Option<String>,
    pub focal_length: Option<String>,
    pub flash: Option<String>,
    pub white_balance: Option<String>,
    pub exposure_program: Option<String>,
    pub metering_mode: Option<String>,
    pub pixel_x_dimension: Option<String>,
    pub pixel_y_dimension: Option<String>,
}

/// Detects the image format from the file's leading bytes.
pub fn detect_format(path: &Path) -> Option<ImageFormat> {
    ImageReader::open(path)
        .ok()?
        .with_guessed_format()
        .ok()?
        .format()
}

/// Reads the dimensions, format and MIME type of an image.
///
/// Returns `None` for anything that is not a decodable image.
pub fn read_image_info(path: &Path) -> Option<ImageInfo> {
    let reader = ImageReader::open(path).ok()?.with_guessed_format().ok()?;
    let format = reader.format()?;
    let (width, height) = match reader.into_dimensions() {
        Ok(dims) => dims,
        Err(e) => {
            tracing::debug!("failed to read dimensions of {}: {e}", path.display());
            return None;
        }
    };
    Some(ImageInfo {
        width,
        height,
        format: format!("{format:?}"),
        mime: format.to_mime_type().to_string(),
    })
}

/// Reads the EXIF camera record of an image.
///
/// Returns `None` if the file is not a recognised image. An image without
/// EXIF data yields a record with only `mime` set.
pub fn read_camera_info(path: &Path) -> Option<CameraInfo> {
    let format = detect_format(path)?;
    let mut info = CameraInfo {
        mime: Some(format.to_mime_type().to_string()),
        ..CameraInfo::default()
    };

    let file = File::open(path).ok()?;
    let exif = match exif::Reader::new().read_from_container(&mut BufReader::new(file)) {
        Ok(exif) => exif,
        Err(e) => {
            tracing::debug!("no EXIF data in {}: {e}", path.display());
            return Some(info);
        }
    };

    let tag = |t: Tag| -> Option<String> {
        let field = exif.get_field(t, In::PRIMARY)?;
        let text = match &field.value {
            Value::Ascii(parts) => parts
                .iter()
                .map(|p| String::from_utf8_lossy(p).trim_end_matches('\0').trim().to_string())
                .collect::<Vec<_>>()
                .join(" "),
            _ => field.display_value().with_unit(&exif).to_string(),
        };
        (!text.is_empty()).then_some(text)
    };

    info.make = tag(Tag::Make);
    info.model = tag(Tag::Model);
    info.orientation = tag(Tag::Orientation);
    info.x_resolution = tag(Tag::XResolution);
    info.y_resolution = tag(Tag::YResolution);
    info.resolution_unit = tag(Tag::ResolutionUnit);
    info.software = tag(Tag::Software);
    info.date_time = tag(Tag::DateTime);
    info.exposure_time = tag(Tag::ExposureTime);
    info.f_number = tag(Tag::FNumber);
    info.iso_speed = tag(Tag::PhotographicSensitivity);
    info.focal_length = tag(Tag::FocalLength);
    info.flash = tag(Tag::Flash);
    info.white_balance = tag(Tag::WhiteBalance);
    info.exposure_program = tag(Tag::ExposureProgram);
    info.metering_mode = tag(Tag::MeteringMode);
    info.pixel_x_dimension = tag(Tag::PixelXDimension);
    info.pixel_y_dimension = tag(Tag::PixelYDimension);
    info.created = tag(Tag::DateTimeOriginal).or_else(|| info.date_time.clone());

    Some(info)
}
