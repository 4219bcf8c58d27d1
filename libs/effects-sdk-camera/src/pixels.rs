// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! 32-bit pixel helpers: frame geometry, red/blue channel swap, row packing
//! and solid-color synthesis.
//!
//! All frames handled here are 4 bytes per pixel with top-to-bottom rows.
//! Source rows may be padded (`stride >= width * 4`); destination buffers are
//! always tightly packed.

/// Bytes per BGRA / RGBA pixel.
pub const BYTES_PER_PIXEL: usize = 4;

/// Frame dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Bytes per tightly packed row.
    pub fn stride(&self) -> usize {
        self.width as usize * BYTES_PER_PIXEL
    }

    /// Bytes in a tightly packed frame.
    pub fn frame_len(&self) -> usize {
        self.stride() * self.height as usize
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// A color split into BGRA byte order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BgraColor {
    pub b: u8,
    pub g: u8,
    pub r: u8,
    pub a: u8,
}

impl BgraColor {
    /// Decompose a packed color: bits 24..32 are blue, 16..24 green, 8..16
    /// red and 0..8 alpha.
    pub fn from_packed(color: u32) -> Self {
        Self {
            b: (color >> 24) as u8,
            g: (color >> 16) as u8,
            r: (color >> 8) as u8,
            a: color as u8,
        }
    }

    pub fn to_bytes(self) -> [u8; 4] {
        [self.b, self.g, self.r, self.a]
    }
}

/// Tightly packed `width x height` BGRA buffer filled with one color.
pub fn solid_bgra(color: BgraColor, resolution: Resolution) -> Vec<u8> {
    let pixel = color.to_bytes();
    let pixels = resolution.width as usize * resolution.height as usize;

    let mut data = Vec::with_capacity(pixels * BYTES_PER_PIXEL);
    for _ in 0..pixels {
        data.extend_from_slice(&pixel);
    }
    data
}

/// Swap bytes 0 and 2 of every pixel in the first `height` rows, in place.
///
/// Converts RGBA to BGRA and back. Row padding beyond `width` pixels is left
/// untouched.
pub fn swap_red_blue(rows: &mut [u8], stride: usize, width: usize, height: usize) {
    let row_bytes = width * BYTES_PER_PIXEL;
    if row_bytes == 0 || stride == 0 {
        return;
    }
    debug_assert!(stride >= row_bytes);

    for row in rows.chunks_mut(stride).take(height) {
        for pixel in row[..row_bytes].chunks_exact_mut(BYTES_PER_PIXEL) {
            pixel.swap(0, 2);
        }
    }
}

/// Copy `height` rows of `row_bytes` each from a (possibly padded) source
/// into a tightly packed destination.
pub fn copy_rows(dst: &mut [u8], src: &[u8], src_stride: usize, row_bytes: usize, height: usize) {
    if row_bytes == 0 || src_stride == 0 {
        return;
    }
    if src_stride == row_bytes {
        let len = row_bytes * height;
        dst[..len].copy_from_slice(&src[..len]);
        return;
    }

    for (dst_row, src_row) in dst
        .chunks_exact_mut(row_bytes)
        .zip(src.chunks(src_stride))
        .take(height)
    {
        dst_row.copy_from_slice(&src_row[..row_bytes]);
    }
}

/// Pack `src` into `dst` while swapping red and blue. Used when a frame skips
/// the effects pipeline so the output channel order stays the same.
pub fn convert_into(dst: &mut [u8], src: &[u8], src_stride: usize, width: usize, height: usize) {
    let row_bytes = width * BYTES_PER_PIXEL;
    if row_bytes == 0 || src_stride == 0 {
        return;
    }

    for (dst_row, src_row) in dst
        .chunks_exact_mut(row_bytes)
        .zip(src.chunks(src_stride))
        .take(height)
    {
        for (out, pixel) in dst_row
            .chunks_exact_mut(BYTES_PER_PIXEL)
            .zip(src_row[..row_bytes].chunks_exact(BYTES_PER_PIXEL))
        {
            out[0] = pixel[2];
            out[1] = pixel[1];
            out[2] = pixel[0];
            out[3] = pixel[3];
        }
    }
}
