//! Color-format conversion from sensor-native planar layouts to the layout
//! the encoder was configured with.
//!
//! Sensors frequently pad their planes: the chroma row stride can exceed the
//! logical sample width and the chroma pixel stride can be 2 when U and V
//! arrive semi-planar. The converters here walk the planes by stride and
//! clamp reads that would land past the end of a plane (last row/column of
//! odd-dimension frames) to the final valid byte instead of failing.

use crate::types::{ColorFormat, FrameBuffer};

/// Convert a raw frame into the tightly packed 4:2:0 layout `format` names.
///
/// Output is always exactly `w*h + 2 * (w/2)*(h/2)` bytes. The source frame
/// is borrowed read-only so a parallel consumer can reuse it afterwards.
pub fn convert(frame: &FrameBuffer, format: ColorFormat) -> Vec<u8> {
    match format {
        ColorFormat::I420 => to_i420(frame),
        ColorFormat::Nv21 => to_nv21(frame),
    }
}

/// Number of bytes a converted 4:2:0 frame occupies.
pub fn converted_len(width: u32, height: u32) -> usize {
    let w = width as usize;
    let h = height as usize;
    w * h + 2 * (w / 2) * (h / 2)
}

/// Planar output: Y plane, then U plane, then V plane.
pub fn to_i420(frame: &FrameBuffer) -> Vec<u8> {
    let w = frame.width as usize;
    let h = frame.height as usize;
    let y_size = w * h;
    let uv_size = (w / 2) * (h / 2);
    let mut out = vec![0u8; y_size + uv_size * 2];

    copy_luma(frame, &mut out[..y_size]);

    let (u_out, v_out) = {
        let (_, uv) = out.split_at_mut(y_size);
        uv.split_at_mut(uv_size)
    };

    let mut idx = 0;
    for i in 0..h / 2 {
        for j in 0..w / 2 {
            u_out[idx] = chroma_sample(&frame.chroma_u, frame, i, j);
            v_out[idx] = chroma_sample(&frame.chroma_v, frame, i, j);
            idx += 1;
        }
    }
    out
}

/// Semi-planar output: Y plane, then interleaved U,V pairs.
pub fn to_nv21(frame: &FrameBuffer) -> Vec<u8> {
    let w = frame.width as usize;
    let h = frame.height as usize;
    let y_size = w * h;
    let uv_size = (w / 2) * (h / 2);
    let mut out = vec![0u8; y_size + uv_size * 2];

    copy_luma(frame, &mut out[..y_size]);

    let mut pos = y_size;
    for i in 0..h / 2 {
        for j in 0..w / 2 {
            out[pos] = chroma_sample(&frame.chroma_u, frame, i, j);
            out[pos + 1] = chroma_sample(&frame.chroma_v, frame, i, j);
            pos += 2;
        }
    }
    out
}

/// Copy the luma plane row by row, honoring the row stride.
fn copy_luma(frame: &FrameBuffer, out: &mut [u8]) {
    let w = frame.width as usize;
    let h = frame.height as usize;
    let stride = frame.luma_row_stride as usize;

    for row in 0..h {
        let src_start = row * stride;
        if src_start >= frame.luma.len() {
            break;
        }
        // Last row of a padded plane may be shorter than the full stride.
        let avail = (frame.luma.len() - src_start).min(w);
        let dst_start = row * w;
        out[dst_start..dst_start + avail]
            .copy_from_slice(&frame.luma[src_start..src_start + avail]);
    }
}

/// Read one chroma sample at logical position (row, col), clamping the
/// stride-computed index into the plane bounds.
fn chroma_sample(plane: &[u8], frame: &FrameBuffer, row: usize, col: usize) -> u8 {
    if plane.is_empty() {
        return 128; // Neutral chroma for degenerate planes.
    }
    let idx = row * frame.chroma_row_stride as usize + col * frame.chroma_pixel_stride as usize;
    plane[idx.min(plane.len() - 1)]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tight_frame(width: u32, height: u32) -> FrameBuffer {
        let w = width as usize;
        let h = height as usize;
        let luma: Vec<u8> = (0..w * h).map(|i| (i % 251) as u8).collect();
        let chroma: Vec<u8> = (0..(w / 2) * (h / 2)).map(|i| (i % 239) as u8).collect();
        FrameBuffer::new(
            luma,
            chroma.clone(),
            chroma,
            width,
            height,
            width,
            width / 2,
            1,
            0,
        )
    }

    #[test]
    fn i420_output_is_exactly_sized() {
        let frame = tight_frame(64, 48);
        let out = to_i420(&frame);
        assert_eq!(out.len(), converted_len(64, 48));
    }

    #[test]
    fn nv21_interleaves_u_then_v() {
        let mut frame = tight_frame(4, 4);
        frame.chroma_u = vec![10, 11, 12, 13];
        frame.chroma_v = vec![20, 21, 22, 23];
        frame.chroma_row_stride = 2;
        frame.chroma_pixel_stride = 1;

        let out = to_nv21(&frame);
        let uv = &out[16..];
        assert_eq!(uv, &[10, 20, 11, 21, 12, 22, 13, 23]);
    }

    #[test]
    fn padded_row_stride_skips_padding() {
        // 4x2 luma with a row stride of 6: two padding bytes per row.
        let luma = vec![
            1, 2, 3, 4, 0xAA, 0xAA, //
            5, 6, 7, 8, 0xAA, 0xAA,
        ];
        let frame = FrameBuffer::new(luma, vec![128; 2], vec![128; 2], 4, 2, 6, 2, 1, 0);
        let out = to_i420(&frame);
        assert_eq!(&out[..8], &[1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn semiplanar_chroma_pixel_stride_two() {
        // Chroma planes delivered semi-planar: every other byte is the
        // co-sited sample from the opposite plane.
        let mut frame = tight_frame(4, 4);
        frame.chroma_u = vec![10, 0, 11, 0, 12, 0, 13, 0];
        frame.chroma_v = vec![20, 0, 21, 0, 22, 0, 23, 0];
        frame.chroma_row_stride = 4;
        frame.chroma_pixel_stride = 2;

        let out = to_i420(&frame);
        assert_eq!(&out[16..20], &[10, 11, 12, 13]);
        assert_eq!(&out[20..24], &[20, 21, 22, 23]);
    }

    #[test]
    fn short_last_row_is_clamped_not_panicked() {
        // Plane ends mid-row; the converter must clamp, not index out of bounds.
        let frame = FrameBuffer::new(
            vec![9; 4 * 6 - 3],
            vec![7; 3],
            vec![7; 3],
            4,
            6,
            4,
            2,
            1,
            0,
        );
        let out = to_nv21(&frame);
        assert_eq!(out.len(), converted_len(4, 6));
    }
}
