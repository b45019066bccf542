//! Encoding a [`PixelBuffer`] to PNG, JPEG, or BMP and writing it out.
//!
//! Encoders sit behind [`FrameEncoder`] so a new format only needs a new
//! implementation and an [`ImageFormat`] variant; the grabber and the
//! compositor never see the format.
//!
//! Files are written to a sibling `<name>.partial` first and renamed over
//! the destination once the encoder has finished, so an interrupted or
//! failed encode never leaves a truncated image under the final name.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use image::codecs::bmp::BmpEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, ImageError};

use crate::errors::{ArgumentError, EncodeError};
use crate::pixels::PixelBuffer;

/// Default JPEG quality.
pub const DEFAULT_JPEG_QUALITY: u8 = 90;

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageFormat {
    #[default]
    Png,
    Jpeg,
    Bmp,
}

impl ImageFormat {
    /// Parse a format name (`png`, `jpg`/`jpeg`, `bmp`), case-insensitively.
    pub fn parse(name: &str) -> Result<Self, ArgumentError> {
        match name.to_ascii_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "jpg" | "jpeg" => Ok(Self::Jpeg),
            "bmp" => Ok(Self::Bmp),
            _ => Err(ArgumentError::UnsupportedFormat(name.to_owned())),
        }
    }

    /// Extension including the leading dot.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => ".png",
            Self::Jpeg => ".jpg",
            Self::Bmp => ".bmp",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Bmp => "image/bmp",
        }
    }
}

/// JPEG quality, validated to `0..=100` at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(u8);

impl Quality {
    pub fn new(value: i64) -> Result<Self, ArgumentError> {
        u8::try_from(value)
            .ok()
            .filter(|q| *q <= 100)
            .map(Self)
            .ok_or(ArgumentError::QualityOutOfRange(value))
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(DEFAULT_JPEG_QUALITY)
    }
}

/// Format and format-specific parameters.  The format is always the
/// explicit option; the output file's extension never overrides it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EncodeOptions {
    pub format: ImageFormat,
    /// Only meaningful for [`ImageFormat::Jpeg`].
    pub quality: Quality,
}

// ---------------------------------------------------------------------------
// Encoders
// ---------------------------------------------------------------------------

/// Serialises a frame into some image container.
pub trait FrameEncoder {
    fn encode(&self, buffer: &PixelBuffer, out: &mut dyn Write) -> Result<(), EncodeError>;
}

pub struct PngFrameEncoder;

pub struct JpegFrameEncoder {
    pub quality: Quality,
}

pub struct BmpFrameEncoder;

/// Pick the encoder for `options`.
pub fn encoder_for(options: &EncodeOptions) -> Box<dyn FrameEncoder> {
    match options.format {
        ImageFormat::Png => Box::new(PngFrameEncoder),
        ImageFormat::Jpeg => Box::new(JpegFrameEncoder {
            quality: options.quality,
        }),
        ImageFormat::Bmp => Box::new(BmpFrameEncoder),
    }
}

fn map_image_error(format: ImageFormat, err: ImageError) -> EncodeError {
    match err {
        ImageError::Unsupported(_) => EncodeError::EncoderUnavailable(format.mime_type()),
        ImageError::IoError(e) => EncodeError::Io {
            path: String::new(),
            source: e,
        },
        other => EncodeError::Encode(other.to_string()),
    }
}

fn reject_empty(buffer: &PixelBuffer) -> Result<(), EncodeError> {
    if buffer.is_empty() {
        return Err(EncodeError::Encode(format!(
            "cannot encode a {}x{} image",
            buffer.width(),
            buffer.height()
        )));
    }
    Ok(())
}

impl FrameEncoder for PngFrameEncoder {
    fn encode(&self, buffer: &PixelBuffer, out: &mut dyn Write) -> Result<(), EncodeError> {
        reject_empty(buffer)?;
        PngEncoder::new(out)
            .write_image(
                &buffer.to_rgba(),
                buffer.width(),
                buffer.height(),
                ExtendedColorType::Rgba8,
            )
            .map_err(|e| map_image_error(ImageFormat::Png, e))
    }
}

impl FrameEncoder for JpegFrameEncoder {
    fn encode(&self, buffer: &PixelBuffer, out: &mut dyn Write) -> Result<(), EncodeError> {
        reject_empty(buffer)?;
        // JPEG has no alpha channel.
        let rgb: Vec<u8> = buffer
            .as_bytes()
            .chunks_exact(4)
            .flat_map(|px| [px[2], px[1], px[0]])
            .collect();
        JpegEncoder::new_with_quality(out, self.quality.get())
            .write_image(&rgb, buffer.width(), buffer.height(), ExtendedColorType::Rgb8)
            .map_err(|e| map_image_error(ImageFormat::Jpeg, e))
    }
}

impl FrameEncoder for BmpFrameEncoder {
    fn encode(&self, buffer: &PixelBuffer, out: &mut dyn Write) -> Result<(), EncodeError> {
        reject_empty(buffer)?;
        let mut out = out;
        BmpEncoder::new(&mut out)
            .write_image(
                &buffer.to_rgba(),
                buffer.width(),
                buffer.height(),
                ExtendedColorType::Rgba8,
            )
            .map_err(|e| map_image_error(ImageFormat::Bmp, e))
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".partial");
    path.with_file_name(name)
}

/// Encode `buffer` per `options` and write it to `path`.
///
/// Returns the final path on success.  On failure no file exists at `path`
/// unless one was there before, and the temporary file is removed.
pub fn save(
    buffer: &PixelBuffer,
    path: &Path,
    options: &EncodeOptions,
) -> Result<PathBuf, EncodeError> {
    let io_err = |p: &Path| {
        let p = p.display().to_string();
        move |source| EncodeError::Io { path: p, source }
    };

    let encoder = encoder_for(options);
    let tmp = partial_path(path);

    let result = (|| -> Result<(), EncodeError> {
        let file = File::create(&tmp).map_err(io_err(&tmp))?;
        let mut writer = BufWriter::new(file);
        encoder.encode(buffer, &mut writer).map_err(|e| match e {
            EncodeError::Io { source, .. } => EncodeError::Io {
                path: tmp.display().to_string(),
                source,
            },
            other => other,
        })?;
        writer.flush().map_err(io_err(&tmp))?;
        std::fs::rename(&tmp, path).map_err(io_err(path))
    })();

    if result.is_err() {
        let _ = std::fs::remove_file(&tmp);
    }
    result?;

    log::info!(
        "Encoded {}x{} {} to {}",
        buffer.width(),
        buffer.height(),
        options.format.mime_type(),
        path.display()
    );
    Ok(path.to_path_buf())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn gradient(width: u32, height: u32) -> PixelBuffer {
        let mut buf = PixelBuffer::new(width, height);
        for y in 0..height {
            for x in 0..width {
                buf.set_pixel(x, y, [(x * 3) as u8, (y * 5) as u8, 200, 255]);
            }
        }
        buf
    }

    #[test]
    fn test_format_parse() {
        assert_eq!(ImageFormat::parse("PNG").unwrap(), ImageFormat::Png);
        assert_eq!(ImageFormat::parse("jpg").unwrap(), ImageFormat::Jpeg);
        assert_eq!(ImageFormat::parse("jpeg").unwrap(), ImageFormat::Jpeg);
        assert_eq!(ImageFormat::parse("Bmp").unwrap(), ImageFormat::Bmp);
        assert!(matches!(
            ImageFormat::parse("gif"),
            Err(ArgumentError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_quality_bounds() {
        assert_eq!(Quality::new(0).unwrap().get(), 0);
        assert_eq!(Quality::new(100).unwrap().get(), 100);
        assert_eq!(Quality::new(-1), Err(ArgumentError::QualityOutOfRange(-1)));
        assert_eq!(Quality::new(101), Err(ArgumentError::QualityOutOfRange(101)));
        assert_eq!(Quality::default().get(), DEFAULT_JPEG_QUALITY);
    }

    #[test]
    fn test_save_png_roundtrips_pixels() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.png");
        let buf = gradient(40, 30);

        let saved = save(&buf, &path, &EncodeOptions::default()).unwrap();
        assert_eq!(saved, path);
        assert!(!partial_path(&path).exists());

        let decoded = image::open(&path).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (40, 30));
        let px = decoded.get_pixel(7, 4).0;
        assert_eq!(px, [200, 20, 21, 255]);
    }

    #[test]
    fn test_save_jpeg_quality_affects_size() {
        let dir = TempDir::new().unwrap();
        let buf = gradient(64, 64);
        let low = dir.path().join("low.jpg");
        let high = dir.path().join("high.jpg");
        let opts = |q| EncodeOptions {
            format: ImageFormat::Jpeg,
            quality: Quality::new(q).unwrap(),
        };
        save(&buf, &low, &opts(5)).unwrap();
        save(&buf, &high, &opts(100)).unwrap();

        let bytes = std::fs::read(&low).unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
        assert!(std::fs::metadata(&low).unwrap().len() < std::fs::metadata(&high).unwrap().len());
    }

    #[test]
    fn test_save_jpeg_quality_zero() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("q0.jpg");
        let opts = EncodeOptions {
            format: ImageFormat::Jpeg,
            quality: Quality::new(0).unwrap(),
        };
        save(&gradient(8, 8), &path, &opts).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_jpeg_quality_reaches_codec_unmodified() {
        let frame = gradient(16, 16);
        let rgb: Vec<u8> = frame
            .to_rgba()
            .chunks_exact(4)
            .flat_map(|p| [p[0], p[1], p[2]])
            .collect();
        for q in [0u8, 37, 100] {
            let mut ours = Vec::new();
            JpegFrameEncoder {
                quality: Quality::new(i64::from(q)).unwrap(),
            }
            .encode(&frame, &mut ours)
            .unwrap();

            let mut direct = Vec::new();
            JpegEncoder::new_with_quality(&mut direct, q)
                .write_image(&rgb, 16, 16, ExtendedColorType::Rgb8)
                .unwrap();
            assert_eq!(ours, direct, "quality {q}");
        }
    }

    #[test]
    fn test_save_bmp() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.bmp");
        let opts = EncodeOptions {
            format: ImageFormat::Bmp,
            ..EncodeOptions::default()
        };
        save(&gradient(5, 3), &path, &opts).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[..2], b"BM");
    }

    #[test]
    fn test_format_option_wins_over_extension() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("actually-a-bmp.png");
        let opts = EncodeOptions {
            format: ImageFormat::Bmp,
            ..EncodeOptions::default()
        };
        save(&gradient(4, 4), &path, &opts).unwrap();
        assert_eq!(&std::fs::read(&path).unwrap()[..2], b"BM");
    }

    #[test]
    fn test_save_empty_buffer_fails_cleanly() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.png");
        let err = save(&PixelBuffer::empty(), &path, &EncodeOptions::default()).unwrap_err();
        assert!(matches!(err, EncodeError::Encode(_)));
        assert!(!path.exists());
        assert!(!partial_path(&path).exists());
    }

    #[test]
    fn test_save_into_missing_directory() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("no-such-dir").join("out.png");
        let err = save(&gradient(2, 2), &path, &EncodeOptions::default()).unwrap_err();
        assert!(matches!(err, EncodeError::Io { .. }));
    }

    #[test]
    fn test_partial_path_is_sibling() {
        let p = partial_path(Path::new("shots/a.png"));
        assert_eq!(p, PathBuf::from("shots/a.png.partial"));
    }
}
