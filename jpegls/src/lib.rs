#![allow(dead_code)]

//! ITU-T T.87 (JPEG-LS) single-component near-lossless codec.
//!
//! The entropy kernel lives in [`scan`]; this module wraps it with the
//! marker segments (SOI/SOF55/LSE/SOS/EOI) a standalone bitstream needs.

use std::error;
use std::fmt;

use log::info;

mod context;
mod golomb;
mod predictor;
mod run_mode;
mod scan;
mod traits;

pub use traits::Traits;

const MARKER_SOI: u16 = 0xFFD8;
const MARKER_EOI: u16 = 0xFFD9;
const MARKER_SOF55: u16 = 0xFFF7;
const MARKER_SOS: u16 = 0xFFDA;
const MARKER_LSE: u16 = 0xFFF8;

/// Errors a JPEG-LS encode or decode entry point can report.
#[derive(Debug)]
pub enum JpegLsError {
    InvalidPrecision { precision: u8 },
    InvalidNear { near: u16 },
    InvalidDimensions { width: u16, height: u16 },
    SampleCountMismatch { expected: usize, actual: usize },
    MarkerMissing { expected: u16 },
    MarkerUnexpected { marker: u16, offset: usize },
    Truncated { offset: usize, needed: usize },
    UnsupportedComponentCount { count: u8 },
}

impl error::Error for JpegLsError {}

impl fmt::Display for JpegLsError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::InvalidPrecision { precision } => {
                write!(f, "sample precision {} is out of the 2..=16 range", precision)
            }
            Self::InvalidNear { near } => {
                write!(f, "NEAR value {} exceeds the maximum of 255", near)
            }
            Self::InvalidDimensions { width, height } => {
                write!(f, "frame dimensions must be nonzero, got {}x{}", width, height)
            }
            Self::SampleCountMismatch { expected, actual } => {
                write!(f, "expected {} samples, got {}", expected, actual)
            }
            Self::MarkerMissing { expected } => {
                write!(f, "missing marker 0x{:04X}", expected)
            }
            Self::MarkerUnexpected { marker, offset } => {
                write!(f, "unexpected marker 0x{:04X} at byte offset {}", marker, offset)
            }
            Self::Truncated { offset, needed } => {
                write!(f, "bitstream truncated at byte offset {}, needed {} more bytes", offset, needed)
            }
            Self::UnsupportedComponentCount { count } => {
                write!(f, "only single-component scans are supported, got {} components", count)
            }
        }
    }
}

/// Frame parameters carried by the SOF55 segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameInfo {
    pub precision: u8,
    pub width: u16,
    pub height: u16,
}

/// Encode a single-component frame into a complete JPEG-LS bitstream
/// (SOI, SOF55, an optional LSE when thresholds are non-default, SOS,
/// entropy-coded scan data, EOI).
pub fn encode(frame: FrameInfo, near: u16, samples: &[i32]) -> Result<Vec<u8>, JpegLsError> {
    if frame.width == 0 || frame.height == 0 {
        return Err(JpegLsError::InvalidDimensions {
            width: frame.width,
            height: frame.height,
        });
    }
    let expected = frame.width as usize * frame.height as usize;
    if samples.len() != expected {
        return Err(JpegLsError::SampleCountMismatch {
            expected,
            actual: samples.len(),
        });
    }

    let traits = Traits::new(frame.precision, near, None)?;

    let mut out = Vec::new();
    put_marker(&mut out, MARKER_SOI);
    put_sof55(&mut out, frame);
    if near > 0 {
        put_lse(&mut out, &traits);
    }
    put_sos(&mut out, near);

    let scan_bytes = scan::encode_scan(&traits, frame.width as usize, frame.height as usize, samples);
    out.extend_from_slice(&scan_bytes);

    put_marker(&mut out, MARKER_EOI);

    info!(
        "jpegls encode: {}x{} precision={} near={} -> {} bytes",
        frame.width,
        frame.height,
        frame.precision,
        near,
        out.len()
    );
    Ok(out)
}

/// Decode a complete JPEG-LS bitstream produced by [`encode`], returning
/// the frame parameters, NEAR, and reconstructed samples.
pub fn decode(data: &[u8]) -> Result<(FrameInfo, u16, Vec<i32>), JpegLsError> {
    let mut pos = 0usize;

    expect_marker(data, &mut pos, MARKER_SOI)?;

    let (marker, seg_start, _len) = read_marker_segment(data, &mut pos)?;
    if marker != MARKER_SOF55 {
        return Err(JpegLsError::MarkerUnexpected { marker, offset: seg_start });
    }
    let frame = parse_sof55(data, seg_start)?;

    let mut preset = None;
    let (mut marker, mut seg_start, mut seg_len) = read_marker_segment(data, &mut pos)?;
    if marker == MARKER_LSE {
        preset = Some(parse_lse(data, seg_start)?);
        let next = read_marker_segment(data, &mut pos)?;
        marker = next.0;
        seg_start = next.1;
        seg_len = next.2;
    }
    if marker != MARKER_SOS {
        return Err(JpegLsError::MarkerUnexpected { marker, offset: seg_start });
    }
    let near = parse_sos(data, seg_start, seg_len)?;

    let traits = Traits::new(frame.precision, near, preset)?;

    let scan_end = find_marker(data, pos, MARKER_EOI)?;
    let scan_bytes = &data[pos..scan_end];
    let samples = scan::decode_scan(&traits, frame.width as usize, frame.height as usize, scan_bytes);

    info!(
        "jpegls decode: {}x{} precision={} near={} <- {} bytes",
        frame.width,
        frame.height,
        frame.precision,
        near,
        data.len()
    );
    Ok((frame, near, samples))
}

fn put_marker(out: &mut Vec<u8>, marker: u16) {
    out.extend_from_slice(&marker.to_be_bytes());
}

fn put_sof55(out: &mut Vec<u8>, frame: FrameInfo) {
    put_marker(out, MARKER_SOF55);
    let length: u16 = 8 + 3;
    out.extend_from_slice(&length.to_be_bytes());
    out.push(frame.precision);
    out.extend_from_slice(&frame.height.to_be_bytes());
    out.extend_from_slice(&frame.width.to_be_bytes());
    out.push(1); // single component
    out.push(1); // component id
    out.push(0x11); // sampling factors 1:1
    out.push(0); // no quantization table
}

fn put_lse(out: &mut Vec<u8>, traits: &Traits) {
    put_marker(out, MARKER_LSE);
    out.extend_from_slice(&13u16.to_be_bytes());
    out.push(1); // ID = preset coding parameters
    out.extend_from_slice(&(traits.maxval as u16).to_be_bytes());
    out.extend_from_slice(&(traits.t1 as u16).to_be_bytes());
    out.extend_from_slice(&(traits.t2 as u16).to_be_bytes());
    out.extend_from_slice(&(traits.t3 as u16).to_be_bytes());
    out.extend_from_slice(&(traits.reset as u16).to_be_bytes());
}

fn put_sos(out: &mut Vec<u8>, near: u16) {
    put_marker(out, MARKER_SOS);
    out.extend_from_slice(&8u16.to_be_bytes());
    out.push(1); // one component in scan
    out.push(1); // component selector
    out.push(0); // mapping table, unused
    out.push(near as u8);
    out.push(0); // interleave mode: non-interleaved
    out.push(0); // point transform, unused
}

fn expect_marker(data: &[u8], pos: &mut usize, expected: u16) -> Result<(), JpegLsError> {
    let marker = read_u16(data, *pos).ok_or(JpegLsError::MarkerMissing { expected })?;
    if marker != expected {
        return Err(JpegLsError::MarkerUnexpected { marker, offset: *pos });
    }
    *pos += 2;
    Ok(())
}

/// Reads a marker and its length-prefixed segment, returning
/// `(marker, segment_payload_start, segment_payload_len)` and advancing
/// `pos` past the segment.
fn read_marker_segment(data: &[u8], pos: &mut usize) -> Result<(u16, usize, usize), JpegLsError> {
    let marker = read_u16(data, *pos).ok_or(JpegLsError::Truncated { offset: *pos, needed: 2 })?;
    let len_offset = *pos + 2;
    let length = read_u16(data, len_offset).ok_or(JpegLsError::Truncated {
        offset: len_offset,
        needed: 2,
    })? as usize;
    let payload_start = len_offset + 2;
    let payload_len = length.saturating_sub(2);
    if data.len() < payload_start + payload_len {
        return Err(JpegLsError::Truncated {
            offset: payload_start,
            needed: payload_len,
        });
    }
    *pos = payload_start + payload_len;
    Ok((marker, payload_start, payload_len))
}

fn find_marker(data: &[u8], start: usize, marker: u16) -> Result<usize, JpegLsError> {
    let bytes = marker.to_be_bytes();
    let mut i = start;
    while i + 1 < data.len() {
        if data[i] == bytes[0] && data[i + 1] == bytes[1] {
            return Ok(i);
        }
        i += 1;
    }
    Err(JpegLsError::MarkerMissing { expected: marker })
}

fn parse_sof55(data: &[u8], start: usize) -> Result<FrameInfo, JpegLsError> {
    if data.len() < start + 6 {
        return Err(JpegLsError::Truncated { offset: start, needed: 6 });
    }
    let precision = data[start];
    let height = u16::from_be_bytes([data[start + 1], data[start + 2]]);
    let width = u16::from_be_bytes([data[start + 3], data[start + 4]]);
    let component_count = data[start + 5];
    if component_count != 1 {
        return Err(JpegLsError::UnsupportedComponentCount { count: component_count });
    }
    Ok(FrameInfo { precision, width, height })
}

fn parse_lse(data: &[u8], start: usize) -> Result<(u16, u16, u16, u16), JpegLsError> {
    if data.len() < start + 9 {
        return Err(JpegLsError::Truncated { offset: start, needed: 9 });
    }
    let maxval = u16::from_be_bytes([data[start + 1], data[start + 2]]);
    let t1 = u16::from_be_bytes([data[start + 3], data[start + 4]]);
    let t2 = u16::from_be_bytes([data[start + 5], data[start + 6]]);
    let t3 = u16::from_be_bytes([data[start + 7], data[start + 8]]);
    Ok((maxval, t1, t2, t3))
}

fn parse_sos(data: &[u8], start: usize, len: usize) -> Result<u16, JpegLsError> {
    if len < 5 {
        return Err(JpegLsError::Truncated { offset: start, needed: 5 });
    }
    let near = data[start + 3] as u16;
    Ok(near)
}

fn read_u16(data: &[u8], offset: usize) -> Option<u16> {
    if data.len() < offset + 2 {
        None
    } else {
        Some(u16::from_be_bytes([data[offset], data[offset + 1]]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lossless_round_trip_preserves_samples() {
        let frame = FrameInfo {
            precision: 8,
            width: 16,
            height: 16,
        };
        let samples: Vec<i32> = (0..256).map(|i| (i * 13) % 256).collect();
        let encoded = encode(frame, 0, &samples).unwrap();

        assert_eq!(&encoded[0..2], &MARKER_SOI.to_be_bytes());
        assert_eq!(&encoded[encoded.len() - 2..], &MARKER_EOI.to_be_bytes());

        let (decoded_frame, near, decoded) = decode(&encoded).unwrap();
        assert_eq!(decoded_frame, frame);
        assert_eq!(near, 0);
        assert_eq!(decoded, samples);
    }

    #[test]
    fn near_lossless_round_trip_emits_lse_and_honours_bound() {
        let frame = FrameInfo {
            precision: 8,
            width: 16,
            height: 16,
        };
        let samples: Vec<i32> = (0..256).map(|i| (i * 13) % 256).collect();
        let encoded = encode(frame, 4, &samples).unwrap();

        // SOI (2) + SOF55 marker+length+payload (2+2+9=13) = 15
        assert_eq!(&encoded[15..17], &MARKER_LSE.to_be_bytes());

        let (_, near, decoded) = decode(&encoded).unwrap();
        assert_eq!(near, 4);
        for (a, b) in samples.iter().zip(decoded.iter()) {
            assert!((a - b).abs() <= 4);
        }
    }

    #[test]
    fn rejects_mismatched_sample_count() {
        let frame = FrameInfo {
            precision: 8,
            width: 4,
            height: 4,
        };
        let err = encode(frame, 0, &[0; 4]).unwrap_err();
        assert!(matches!(err, JpegLsError::SampleCountMismatch { .. }));
    }

    #[test]
    fn rejects_zero_dimensions() {
        let frame = FrameInfo {
            precision: 8,
            width: 0,
            height: 4,
        };
        let err = encode(frame, 0, &[]).unwrap_err();
        assert!(matches!(err, JpegLsError::InvalidDimensions { .. }));
    }
}
