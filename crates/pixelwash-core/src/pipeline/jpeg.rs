//! JPEG stream structure check.
//!
//! The `image` crate fills missing scan data with gray instead of failing, so
//! the primary decoder walks the marker structure itself first. A stream must
//! reach its EOI marker through well-formed segments; entropy-coded data may
//! only contain stuffed bytes, fill bytes and restart markers.

const SOI: u8 = 0xD8;
const EOI: u8 = 0xD9;
const SOS: u8 = 0xDA;
const TEM: u8 = 0x01;

/// Check that `bytes` is a complete, well-formed JPEG marker stream.
///
/// Data after EOI is ignored.
pub(crate) fn check_stream(bytes: &[u8]) -> Result<(), String> {
    if !bytes.starts_with(&[0xFF, SOI]) {
        return Err("missing JPEG start of image marker".to_string());
    }

    let mut pos = 2;
    loop {
        match bytes.get(pos) {
            None => return Err(truncated(pos)),
            Some(0xFF) => {}
            Some(other) => {
                return Err(format!(
                    "expected marker at offset {}, found 0x{:02X}",
                    pos, other
                ))
            }
        }

        while bytes.get(pos) == Some(&0xFF) {
            pos += 1;
        }
        let marker = *bytes.get(pos).ok_or_else(|| truncated(pos))?;
        pos += 1;

        match marker {
            EOI => return Ok(()),
            TEM | 0xD0..=0xD7 => {}
            SOS => {
                pos = skip_segment(bytes, pos)?;
                pos = skip_entropy_data(bytes, pos)?;
            }
            0xC0..=0xCF | 0xDB..=0xEF | 0xFE => {
                pos = skip_segment(bytes, pos)?;
            }
            _ => {
                return Err(format!(
                    "invalid JPEG marker 0xFF{:02X} at offset {}",
                    marker,
                    pos - 2
                ))
            }
        }
    }
}

/// Skip a length-prefixed segment body starting at `pos`.
fn skip_segment(bytes: &[u8], pos: usize) -> Result<usize, String> {
    let length = match bytes.get(pos..pos + 2) {
        Some(&[hi, lo]) => usize::from(u16::from_be_bytes([hi, lo])),
        _ => return Err(truncated(pos)),
    };
    if length < 2 {
        return Err(format!("JPEG segment length {} at offset {}", length, pos));
    }

    let end = pos + length;
    if end > bytes.len() {
        return Err(truncated(bytes.len()));
    }
    Ok(end)
}

/// Advance past entropy-coded data to the next real marker.
fn skip_entropy_data(bytes: &[u8], mut pos: usize) -> Result<usize, String> {
    loop {
        match bytes.get(pos) {
            None => return Err(truncated(pos)),
            Some(0xFF) => match bytes.get(pos + 1) {
                None => return Err(truncated(pos + 1)),
                Some(0x00) | Some(0xD0..=0xD7) => pos += 2,
                Some(0xFF) => pos += 1,
                Some(_) => return Ok(pos),
            },
            Some(_) => pos += 1,
        }
    }
}

fn truncated(offset: usize) -> String {
    format!(
        "image file is truncated (stream ends at byte {} before end of image)",
        offset
    )
}
