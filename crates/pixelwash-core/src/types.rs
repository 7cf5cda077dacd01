//! Core data types for the sanitization pipeline.

use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Untrusted input handed to one pipeline run.
#[derive(Debug, Clone, Copy)]
pub struct InputImage<'a> {
    /// Raw bytes exactly as received
    pub bytes: &'a [u8],

    /// Content type claimed by whoever supplied the bytes (e.g. "image/x-tga")
    pub content_type: Option<&'a str>,

    /// Original file name, used as a format hint by the fallback decoder
    pub file_name: Option<&'a str>,
}

impl<'a> InputImage<'a> {
    /// Wrap bytes without any format hints.
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            content_type: None,
            file_name: None,
        }
    }

    /// Attach a claimed content type.
    pub fn with_content_type(mut self, content_type: &'a str) -> Self {
        self.content_type = Some(content_type);
        self
    }

    /// Attach the original file name.
    pub fn with_file_name(mut self, file_name: &'a str) -> Self {
        self.file_name = Some(file_name);
        self
    }
}

/// Decoded pixels: RGBA8, row-major, nothing else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl DecodedImage {
    /// Take ownership of an RGBA buffer produced by a decoder.
    pub fn from_rgba(image: RgbaImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            width,
            height,
            pixels: image.into_raw(),
        }
    }

    /// Expected buffer length for the declared dimensions.
    pub fn expected_len(&self) -> Option<usize> {
        (self.width as usize)
            .checked_mul(self.height as usize)
            .and_then(|pixels| pixels.checked_mul(4))
    }
}

/// Which decoder produced the sanitized image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    Primary,
    Fallback,
}

impl Tool {
    pub fn as_str(self) -> &'static str {
        match self {
            Tool::Primary => "primary",
            Tool::Fallback => "fallback",
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A freshly encoded PNG together with its dimensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedPng {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Successful result of a pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SanitizedImage {
    /// The safe PNG artifact
    pub png: EncodedPng,

    /// Decoder that produced it
    pub tool: Tool,

    /// Non-fatal anomaly observed on the way, already truncated
    pub malformed: Option<String>,
}

/// Terminal outcome of one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SanitizationOutcome {
    /// A safe PNG was produced.
    Sanitized(SanitizedImage),

    /// No decoder recognized the input; not this tool's concern.
    OptedOut,

    /// The input looked like an image but could not be converted.
    Failed {
        /// Full malformed description, the user-visible failure message
        description: String,
        /// `description` truncated for the `malformed` feature
        note: String,
    },
}

impl SanitizationOutcome {
    /// The sanitized image, if any.
    pub fn sanitized(&self) -> Option<&SanitizedImage> {
        match self {
            SanitizationOutcome::Sanitized(image) => Some(image),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_serialization() {
        assert_eq!(serde_json::to_string(&Tool::Primary).unwrap(), "\"primary\"");
        assert_eq!(serde_json::to_string(&Tool::Fallback).unwrap(), "\"fallback\"");
        assert_eq!(Tool::Fallback.to_string(), "fallback");
    }

    #[test]
    fn test_decoded_image_from_rgba() {
        let decoded = DecodedImage::from_rgba(RgbaImage::new(3, 2));
        assert_eq!((decoded.width, decoded.height), (3, 2));
        assert_eq!(decoded.pixels.len(), 24);
        assert_eq!(decoded.expected_len(), Some(24));
    }

    #[test]
    fn test_input_image_hints() {
        let bytes = [0u8; 4];
        let input = InputImage::new(&bytes)
            .with_content_type("image/png")
            .with_file_name("a.png");
        assert_eq!(input.content_type, Some("image/png"));
        assert_eq!(input.file_name, Some("a.png"));
    }

    #[test]
    fn test_outcome_sanitized_accessor() {
        assert!(SanitizationOutcome::OptedOut.sanitized().is_none());
        let failed = SanitizationOutcome::Failed {
            description: "x".to_string(),
            note: "x".to_string(),
        };
        assert!(failed.sanitized().is_none());
    }
}
