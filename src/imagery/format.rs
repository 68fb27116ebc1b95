//! Structural checks that a downloaded payload really is an image.
//!
//! Map providers answer quota and key problems with a 200 and a JSON or
//! HTML body, so a success status alone proves nothing. Each container is
//! walked far enough to confirm its framing and read the pixel dimensions.

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use serde::Serialize;
use strum::Display;
use thiserror::Error;

const PNG_SIGNATURE: &[u8; 8] = b"\x89PNG\r\n\x1a\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Png,
    Jpeg,
    Gif,
    WebP,
}

impl ImageFormat {
    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Gif => "image/gif",
            ImageFormat::WebP => "image/webp",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImageInfo {
    pub format: ImageFormat,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ImageFormatError {
    #[error("payload is empty")]
    Empty,
    #[error("unrecognised image signature")]
    UnknownFormat,
    #[error("{0} payload is truncated")]
    Truncated(ImageFormat),
    #[error("{format} payload is corrupt: {reason}")]
    Corrupt {
        format: ImageFormat,
        reason: &'static str,
    },
    #[error("{0} image has zero width or height")]
    ZeroDimensions(ImageFormat),
}

/// Identifies the container format and validates its framing.
pub fn inspect(bytes: &[u8]) -> Result<ImageInfo, ImageFormatError> {
    if bytes.is_empty() {
        return Err(ImageFormatError::Empty);
    }
    let info = if bytes.starts_with(PNG_SIGNATURE) {
        inspect_png(bytes)?
    } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        inspect_jpeg(bytes)?
    } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        inspect_gif(bytes)?
    } else if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        inspect_webp(bytes)?
    } else {
        return Err(ImageFormatError::UnknownFormat);
    };

    if info.width == 0 || info.height == 0 {
        return Err(ImageFormatError::ZeroDimensions(info.format));
    }
    Ok(info)
}

fn inspect_png(bytes: &[u8]) -> Result<ImageInfo, ImageFormatError> {
    let format = ImageFormat::Png;
    let mut pos = PNG_SIGNATURE.len();
    let mut dims = None;

    loop {
        // length(4) + type(4) + data + crc(4)
        let header = bytes
            .get(pos..pos + 8)
            .ok_or(ImageFormatError::Truncated(format))?;
        let len = BigEndian::read_u32(&header[0..4]) as usize;
        let kind = &header[4..8];
        let data_start = pos + 8;
        let data_end = data_start
            .checked_add(len)
            .ok_or(ImageFormatError::Truncated(format))?;
        let data = bytes
            .get(data_start..data_end)
            .ok_or(ImageFormatError::Truncated(format))?;
        if bytes.len() < data_end + 4 {
            return Err(ImageFormatError::Truncated(format));
        }

        match kind {
            b"IHDR" => {
                if dims.is_some() || pos != PNG_SIGNATURE.len() {
                    return Err(ImageFormatError::Corrupt { format, reason: "misplaced IHDR" });
                }
                if len != 13 {
                    return Err(ImageFormatError::Corrupt { format, reason: "bad IHDR length" });
                }
                dims = Some((BigEndian::read_u32(&data[0..4]), BigEndian::read_u32(&data[4..8])));
            }
            b"IEND" => break,
            _ if dims.is_none() => {
                return Err(ImageFormatError::Corrupt { format, reason: "first chunk is not IHDR" });
            }
            _ => {}
        }
        pos = data_end + 4;
    }

    let (width, height) = dims.ok_or(ImageFormatError::Corrupt { format, reason: "missing IHDR" })?;
    Ok(ImageInfo { format, width, height })
}

fn inspect_jpeg(bytes: &[u8]) -> Result<ImageInfo, ImageFormatError> {
    let format = ImageFormat::Jpeg;
    let mut pos = 2;

    loop {
        let marker = bytes
            .get(pos..pos + 2)
            .ok_or(ImageFormatError::Truncated(format))?;
        if marker[0] != 0xFF {
            return Err(ImageFormatError::Corrupt { format, reason: "expected marker" });
        }
        let code = marker[1];
        match code {
            // Fill bytes before a marker.
            0xFF => {
                pos += 1;
                continue;
            }
            // Standalone markers without a length field.
            0x01 | 0xD0..=0xD7 => {
                pos += 2;
                continue;
            }
            0xD9 | 0xDA => {
                return Err(ImageFormatError::Corrupt { format, reason: "no frame header before scan" });
            }
            _ => {}
        }

        let len_bytes = bytes
            .get(pos + 2..pos + 4)
            .ok_or(ImageFormatError::Truncated(format))?;
        let seg_len = BigEndian::read_u16(len_bytes) as usize;
        if seg_len < 2 {
            return Err(ImageFormatError::Corrupt { format, reason: "bad segment length" });
        }
        let segment = bytes
            .get(pos + 4..pos + 2 + seg_len)
            .ok_or(ImageFormatError::Truncated(format))?;

        // SOF0..SOF15 minus DHT (C4), JPG (C8) and DAC (CC).
        if matches!(code, 0xC0..=0xCF) && !matches!(code, 0xC4 | 0xC8 | 0xCC) {
            if segment.len() < 5 {
                return Err(ImageFormatError::Truncated(format));
            }
            let height = BigEndian::read_u16(&segment[1..3]) as u32;
            let width = BigEndian::read_u16(&segment[3..5]) as u32;
            return Ok(ImageInfo { format, width, height });
        }
        pos += 2 + seg_len;
    }
}

fn inspect_gif(bytes: &[u8]) -> Result<ImageInfo, ImageFormatError> {
    let format = ImageFormat::Gif;
    let screen = bytes.get(6..10).ok_or(ImageFormatError::Truncated(format))?;
    if bytes.last() != Some(&0x3B) {
        return Err(ImageFormatError::Truncated(format));
    }
    Ok(ImageInfo {
        format,
        width: LittleEndian::read_u16(&screen[0..2]) as u32,
        height: LittleEndian::read_u16(&screen[2..4]) as u32,
    })
}

fn inspect_webp(bytes: &[u8]) -> Result<ImageInfo, ImageFormatError> {
    let format = ImageFormat::WebP;
    let riff_len = LittleEndian::read_u32(&bytes[4..8]) as usize;
    if bytes.len() < riff_len + 8 {
        return Err(ImageFormatError::Truncated(format));
    }
    let chunk = bytes.get(12..30).ok_or(ImageFormatError::Truncated(format))?;
    let (width, height) = match &chunk[0..4] {
        b"VP8 " => {
            // Frame tag (3) + start code (3), then 14-bit dimensions.
            if chunk[11..14] != [0x9D, 0x01, 0x2A] {
                return Err(ImageFormatError::Corrupt { format, reason: "bad VP8 start code" });
            }
            (
                (LittleEndian::read_u16(&chunk[14..16]) & 0x3FFF) as u32,
                (LittleEndian::read_u16(&chunk[16..18]) & 0x3FFF) as u32,
            )
        }
        b"VP8L" => {
            if chunk[8] != 0x2F {
                return Err(ImageFormatError::Corrupt { format, reason: "bad VP8L signature" });
            }
            let bits = LittleEndian::read_u32(&chunk[9..13]);
            ((bits & 0x3FFF) + 1, ((bits >> 14) & 0x3FFF) + 1)
        }
        b"VP8X" => (
            LittleEndian::read_u24(&chunk[12..15]) + 1,
            LittleEndian::read_u24(&chunk[15..18]) + 1,
        ),
        _ => return Err(ImageFormatError::Corrupt { format, reason: "unknown WebP chunk" }),
    };
    Ok(ImageInfo { format, width, height })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    fn png_chunk(kind: &[u8; 4], data: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&(data.len() as u32).to_be_bytes());
        out.extend_from_slice(kind);
        out.extend_from_slice(data);
        // CRC is not verified.
        out.extend_from_slice(&[0, 0, 0, 0]);
        out
    }

    /// Minimal well-framed PNG of the given size.
    pub(crate) fn png(width: u32, height: u32) -> Vec<u8> {
        let mut ihdr = Vec::new();
        ihdr.extend_from_slice(&width.to_be_bytes());
        ihdr.extend_from_slice(&height.to_be_bytes());
        ihdr.extend_from_slice(&[8, 2, 0, 0, 0]);

        let mut out = PNG_SIGNATURE.to_vec();
        out.extend(png_chunk(b"IHDR", &ihdr));
        out.extend(png_chunk(b"IDAT", &[0x78, 0x9C, 0x03, 0x00]));
        out.extend(png_chunk(b"IEND", &[]));
        out
    }

    fn jpeg(width: u16, height: u16) -> Vec<u8> {
        let mut out = vec![0xFF, 0xD8];
        // APP0 / JFIF
        out.extend_from_slice(&[0xFF, 0xE0, 0x00, 0x10]);
        out.extend_from_slice(b"JFIF\0\x01\x01\x00\x00\x01\x00\x01\x00\x00");
        // SOF0
        out.extend_from_slice(&[0xFF, 0xC0, 0x00, 0x0B, 0x08]);
        out.extend_from_slice(&height.to_be_bytes());
        out.extend_from_slice(&width.to_be_bytes());
        out.extend_from_slice(&[0x01, 0x01, 0x11, 0x00]);
        out.extend_from_slice(&[0xFF, 0xD9]);
        out
    }

    #[test]
    fn test_png_dimensions() {
        let info = inspect(&png(640, 480)).unwrap();
        assert_eq!(info, ImageInfo { format: ImageFormat::Png, width: 640, height: 480 });
        assert_eq!(info.format.mime_type(), "image/png");
    }

    #[test]
    fn test_truncated_png_is_rejected() {
        let bytes = png(640, 640);
        let cut = &bytes[..bytes.len() - 12];
        assert_eq!(inspect(cut), Err(ImageFormatError::Truncated(ImageFormat::Png)));
    }

    #[test]
    fn test_png_zero_width_is_rejected() {
        assert_eq!(inspect(&png(0, 10)), Err(ImageFormatError::ZeroDimensions(ImageFormat::Png)));
    }

    #[test]
    fn test_jpeg_dimensions() {
        let info = inspect(&jpeg(640, 320)).unwrap();
        assert_eq!(info, ImageInfo { format: ImageFormat::Jpeg, width: 640, height: 320 });
    }

    #[test]
    fn test_gif_dimensions() {
        let mut bytes = b"GIF89a".to_vec();
        bytes.extend_from_slice(&[0x80, 0x02, 0xE0, 0x01]);
        bytes.extend_from_slice(&[0x00, 0x00, 0x00, 0x3B]);
        let info = inspect(&bytes).unwrap();
        assert_eq!((info.width, info.height), (640, 480));
    }

    #[test]
    fn test_webp_lossless_dimensions() {
        let mut bytes = b"RIFF".to_vec();
        bytes.extend_from_slice(&22u32.to_le_bytes());
        bytes.extend_from_slice(b"WEBPVP8L");
        bytes.extend_from_slice(&10u32.to_le_bytes());
        bytes.push(0x2F);
        let bits: u32 = (640 - 1) | ((480 - 1) << 14);
        bytes.extend_from_slice(&bits.to_le_bytes());
        bytes.extend_from_slice(&[0; 5]);
        let info = inspect(&bytes).unwrap();
        assert_eq!(info, ImageInfo { format: ImageFormat::WebP, width: 640, height: 480 });
    }

    #[test]
    fn test_error_payloads_are_rejected() {
        let json = br#"{"error_message": "The provided API key is invalid."}"#;
        assert_eq!(inspect(json), Err(ImageFormatError::UnknownFormat));
        assert_eq!(inspect(b"<html>quota exceeded</html>"), Err(ImageFormatError::UnknownFormat));
        assert_eq!(inspect(b""), Err(ImageFormatError::Empty));
    }
}
