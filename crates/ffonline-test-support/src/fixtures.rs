//! Byte fixtures with recognisable magic numbers and environment probes.

use std::process::Command;

/// Smallest buffer `infer` recognises as PNG, padded with IHDR-like bytes.
#[must_use]
pub fn png_bytes() -> Vec<u8> {
    let mut bytes = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    bytes.extend_from_slice(&[0, 0, 0, 0x0D, b'I', b'H', b'D', b'R']);
    bytes.extend_from_slice(&[0; 13]);
    bytes
}

/// GIF89a header followed by a minimal logical screen descriptor.
#[must_use]
pub fn gif_bytes() -> Vec<u8> {
    let mut bytes = b"GIF89a".to_vec();
    bytes.extend_from_slice(&[1, 0, 1, 0, 0, 0, 0]);
    bytes.push(0x3B);
    bytes
}

/// An ISO base media `ftyp` box with the `isom` major brand.
#[must_use]
pub fn mp4_bytes() -> Vec<u8> {
    let mut bytes = vec![0, 0, 0, 0x1C];
    bytes.extend_from_slice(b"ftypisom");
    bytes.extend_from_slice(&[0, 0, 0x02, 0]);
    bytes.extend_from_slice(b"isomiso2mp41");
    bytes.extend_from_slice(&[0, 0, 0, 8]);
    bytes.extend_from_slice(b"free");
    bytes
}

/// RIFF container with the `WEBP` form type.
#[must_use]
pub fn webp_bytes() -> Vec<u8> {
    let mut bytes = b"RIFF".to_vec();
    bytes.extend_from_slice(&[0x1A, 0, 0, 0]);
    bytes.extend_from_slice(b"WEBPVP8 ");
    bytes.extend_from_slice(&[0; 16]);
    bytes
}

/// Plain text that no magic-number detector recognises.
#[must_use]
pub fn text_bytes() -> Vec<u8> {
    b"frame=1 fps=0.0 q=-1.0 size=N/A time=00:00:01.00".to_vec()
}

/// Returns `true` if an ffmpeg executable is reachable for integration tests.
///
/// Honours `FFONLINE_FFMPEG` when set, otherwise probes `ffmpeg` on `PATH`.
#[must_use]
pub fn ffmpeg_available() -> bool {
    let binary = std::env::var("FFONLINE_FFMPEG").unwrap_or_else(|_| "ffmpeg".to_string());
    ffmpeg_available_at(&binary)
}

fn ffmpeg_available_at(binary: &str) -> bool {
    Command::new(binary)
        .arg("-version")
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}
