//! The sanitization state machine.
//!
//! ```text
//! Start ─► PrimaryDecoding ─┬─ ok ──────────► clamp ─► reduce? ─► re-encode ─► Sanitized(primary)
//!                           ├─ unrecognized ─► fallback ─┬─ ok ─► Sanitized(fallback)
//!                           │                            └─ err ► OptedOut
//!                           └─ malformed ────► fallback ─┬─ ok ─► Sanitized(fallback, note)
//!                                                        └─ err ► Failed(note)
//! ```
//!
//! Each decoder runs at most once per call. A failed reduction on the primary
//! path is a soft warning: the full-size image is re-encoded and the reason is
//! attached as the malformed note.

use std::time::Instant;

use crate::config::{Config, SanitizeConfig};
use crate::error::DecodeError;
use crate::types::{DecodedImage, InputImage, SanitizationOutcome, SanitizedImage, Tool};

use super::clamp::{clamp, reduction_factor};
use super::encode::strip_and_reencode;
use super::fallback::{FallbackDecoder, PermissiveDecoder};
use super::primary::{ImageCrateDecoder, PrimaryDecoder};

/// Runs untrusted bytes through primary decode, fallback and re-encode.
pub struct Sanitizer<P = ImageCrateDecoder, F = PermissiveDecoder> {
    config: SanitizeConfig,
    primary: P,
    fallback: F,
}

impl Sanitizer {
    /// Create a sanitizer with the production decoders.
    pub fn new(config: &Config) -> Self {
        Self::with_decoders(
            config.sanitize.clone(),
            ImageCrateDecoder::new(config.limits.clone()),
            PermissiveDecoder::new(config.limits.clone()),
        )
    }
}

impl<P: PrimaryDecoder, F: FallbackDecoder> Sanitizer<P, F> {
    /// Create a sanitizer with explicit decoders.
    pub fn with_decoders(config: SanitizeConfig, primary: P, fallback: F) -> Self {
        Self {
            config,
            primary,
            fallback,
        }
    }

    /// Get the sanitization policy in effect.
    pub fn config(&self) -> &SanitizeConfig {
        &self.config
    }

    /// Sanitize one input. Never panics on hostile bytes; every failure is an
    /// outcome.
    pub fn sanitize(&self, input: &InputImage<'_>) -> SanitizationOutcome {
        let start = Instant::now();

        let normalized = self.primary.probe(input.bytes).and_then(|probe| {
            tracing::debug!(
                "Primary decoder identified {:?} ({}x{})",
                probe.format,
                probe.width,
                probe.height
            );
            self.primary.normalize(input.bytes, &probe)
        });

        let outcome = match normalized {
            Ok(decoded) => self.finish_primary(input, decoded),
            Err(DecodeError::Malformed(reason)) => self.recover_malformed(input, &reason),
            Err(_) => self.recover_unrecognized(input),
        };

        tracing::trace!("  Sanitize: {:?}", start.elapsed());
        outcome
    }

    fn finish_primary(&self, input: &InputImage<'_>, decoded: DecodedImage) -> SanitizationOutcome {
        let max_dimension = self.config.max_dimension;
        let target = clamp(decoded.width, decoded.height, max_dimension);
        let mut malformed = None;

        let image = if target.needs_resize {
            let factor = reduction_factor(decoded.width, decoded.height, max_dimension);
            match self.primary.reduce(&decoded, factor) {
                Ok(reduced) => {
                    tracing::debug!(
                        "Reduced {}x{} by {} to {}x{}",
                        decoded.width,
                        decoded.height,
                        factor,
                        reduced.width,
                        reduced.height
                    );
                    reduced
                }
                Err(e) => {
                    let note = self.truncate(&resize_warning(&e.to_string()));
                    tracing::warn!("{}", note);
                    malformed = Some(note);
                    decoded
                }
            }
        } else {
            decoded
        };

        match strip_and_reencode(image) {
            Ok(png) => SanitizationOutcome::Sanitized(SanitizedImage {
                png,
                tool: Tool::Primary,
                malformed,
            }),
            // The primary decoder handed over pixels it cannot stand behind
            Err(e) => self.recover_malformed(input, &e.to_string()),
        }
    }

    fn recover_malformed(&self, input: &InputImage<'_>, reason: &str) -> SanitizationOutcome {
        let description = malformed_description(reason);
        let note = self.truncate(&description);
        tracing::warn!("{}", note);

        match self
            .fallback
            .decode_and_sanitize(input, self.config.max_dimension)
        {
            Ok(png) => SanitizationOutcome::Sanitized(SanitizedImage {
                png,
                tool: Tool::Fallback,
                malformed: Some(note),
            }),
            Err(_) => SanitizationOutcome::Failed { description, note },
        }
    }

    fn recover_unrecognized(&self, input: &InputImage<'_>) -> SanitizationOutcome {
        tracing::debug!("Primary decoder did not recognize the input, trying fallback");

        match self
            .fallback
            .decode_and_sanitize(input, self.config.max_dimension)
        {
            Ok(png) => SanitizationOutcome::Sanitized(SanitizedImage {
                png,
                tool: Tool::Fallback,
                malformed: None,
            }),
            Err(_) => {
                tracing::debug!("No decoder recognized the input, opting out");
                SanitizationOutcome::OptedOut
            }
        }
    }

    /// Feature values stay strictly below `max_value_length` characters.
    fn truncate(&self, text: &str) -> String {
        truncate_chars(text, self.config.max_value_length.saturating_sub(1))
    }
}

/// Feature text for input that was identified but could not be converted.
pub fn malformed_description(reason: &str) -> String {
    format!(
        "Image is Malformed and cannot be converted to another format. Reason : {}",
        reason
    )
}

/// Feature text for a failed primary-path reduction.
pub fn resize_warning(reason: &str) -> String {
    format!(
        "Image is malformed and cannot be resized, continuing with full size image. Reason: {}",
        reason
    )
}

/// Keep at most `max_chars` characters, never splitting a code point.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => text[..end].to_string(),
        None => text.to_string(),
    }
}
