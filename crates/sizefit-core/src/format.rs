//! Source and output format handling.
//!
//! Quality is only continuously tunable for lossy codecs, so every session
//! picks its `OutputFormat` once from the source format before the first
//! trial. PNG (and anything else without a quality knob) becomes JPEG.

use serde::{Deserialize, Serialize};

/// Format of the uploaded image, detected from its bytes or MIME type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceFormat {
    Jpeg,
    Png,
    WebP,
    Gif,
    Bmp,
    Other,
}

impl SourceFormat {
    /// Detect the format from magic bytes.
    pub fn detect(bytes: &[u8]) -> Self {
        match image::guess_format(bytes) {
            Ok(image::ImageFormat::Jpeg) => SourceFormat::Jpeg,
            Ok(image::ImageFormat::Png) => SourceFormat::Png,
            Ok(image::ImageFormat::WebP) => SourceFormat::WebP,
            Ok(image::ImageFormat::Gif) => SourceFormat::Gif,
            Ok(image::ImageFormat::Bmp) => SourceFormat::Bmp,
            _ => SourceFormat::Other,
        }
    }

    /// Map a MIME type such as `image/png`.
    pub fn from_mime(mime: &str) -> Self {
        match mime.trim().to_ascii_lowercase().as_str() {
            "image/jpeg" | "image/jpg" => SourceFormat::Jpeg,
            "image/png" => SourceFormat::Png,
            "image/webp" => SourceFormat::WebP,
            "image/gif" => SourceFormat::Gif,
            "image/bmp" => SourceFormat::Bmp,
            _ => SourceFormat::Other,
        }
    }
}

/// Lossy format a session encodes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OutputFormat {
    #[default]
    #[serde(rename = "image/jpeg")]
    Jpeg,
    #[serde(rename = "image/webp")]
    WebP,
}

impl OutputFormat {
    /// Pick the output format for a source.
    ///
    /// WebP stays WebP only when lossy WebP encoding is compiled in.
    pub fn for_source(source: SourceFormat) -> Self {
        match source {
            SourceFormat::WebP if cfg!(feature = "webp") => OutputFormat::WebP,
            _ => OutputFormat::Jpeg,
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "image/jpeg",
            OutputFormat::WebP => "image/webp",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "jpg",
            OutputFormat::WebP => "webp",
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.mime_type())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_png_coerced_to_jpeg() {
        assert_eq!(OutputFormat::for_source(SourceFormat::Png), OutputFormat::Jpeg);
        assert_eq!(OutputFormat::for_source(SourceFormat::Gif), OutputFormat::Jpeg);
        assert_eq!(OutputFormat::for_source(SourceFormat::Jpeg), OutputFormat::Jpeg);
    }

    #[cfg(feature = "webp")]
    #[test]
    fn test_webp_stays_webp() {
        assert_eq!(OutputFormat::for_source(SourceFormat::WebP), OutputFormat::WebP);
    }

    #[test]
    fn test_from_mime() {
        assert_eq!(SourceFormat::from_mime("image/png"), SourceFormat::Png);
        assert_eq!(SourceFormat::from_mime("IMAGE/JPEG"), SourceFormat::Jpeg);
        assert_eq!(SourceFormat::from_mime("image/tiff"), SourceFormat::Other);
    }

    #[test]
    fn test_detect_magic_bytes() {
        assert_eq!(SourceFormat::detect(&[0xFF, 0xD8, 0xFF, 0xE0]), SourceFormat::Jpeg);
        assert_eq!(
            SourceFormat::detect(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]),
            SourceFormat::Png
        );
        assert_eq!(SourceFormat::detect(&[0, 1, 2, 3]), SourceFormat::Other);
    }

    #[test]
    fn test_extension_and_mime() {
        assert_eq!(OutputFormat::Jpeg.extension(), "jpg");
        assert_eq!(OutputFormat::WebP.mime_type(), "image/webp");
        assert_eq!(OutputFormat::Jpeg.to_string(), "image/jpeg");
    }

    #[test]
    fn test_serializes_as_mime() {
        let json = serde_json::to_string(&OutputFormat::WebP).unwrap();
        assert_eq!(json, "\"image/webp\"");
        let back: OutputFormat = serde_json::from_str("\"image/jpeg\"").unwrap();
        assert_eq!(back, OutputFormat::Jpeg);
    }
}
