//! Sanitization pipeline components.
//!
//! - **clamp**: dimension math (clamp target, reduction factor)
//! - **primary**: `image` crate decoder, magic-byte detection
//! - **fallback**: permissive second-chance decoder
//! - **resize**: RGBA8 resampling shared by both decoders
//! - **jpeg**: JPEG marker-stream completeness check
//! - **encode**: strip-and-reencode to PNG
//! - **sanitizer**: the decode/fallback/re-encode state machine
//! - **hash**: BLAKE3 content hashes
//! - **validate**: file existence and size checks
//! - **discovery**: find input files in directories

pub mod clamp;
pub mod discovery;
pub mod encode;
pub mod fallback;
pub mod hash;
mod jpeg;
pub mod primary;
mod resize;
pub mod sanitizer;
pub mod validate;

// Re-exports for convenient access
pub use clamp::{clamp, reduction_factor, ResizeTarget};
pub use discovery::{DiscoveredFile, FileDiscovery};
pub use encode::strip_and_reencode;
pub use fallback::{FallbackDecoder, PermissiveDecoder};
pub use hash::Hasher;
pub use primary::{ImageCrateDecoder, PrimaryDecoder, Probe};
pub use sanitizer::Sanitizer;
pub use validate::Validator;
