//! Owned, format-independent pixel buffer shared by every pipeline stage.
//!
//! Pixels are 32-bit BGRA, row-major, top-down.  GDI hands out bottom-up
//! DIBs unless asked otherwise, so the row order of incoming data is
//! declared explicitly via [`RowOrder`] and normalised exactly once, in
//! [`PixelBuffer::from_raw`].

use rayon::prelude::*;

use crate::geometry::{Point, Rect};

/// Bytes per pixel (BGRA).
pub const BYTES_PER_PIXEL: usize = 4;

/// Size of a `BITMAPINFOHEADER`.
pub const DIB_HEADER_LEN: usize = 40;

/// Row order of raw pixel data as delivered by the producer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowOrder {
    TopDown,
    BottomUp,
}

/// A captured frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    /// BGRA bytes, top-down; length == `width * height * 4`.
    data: Vec<u8>,
}

impl PixelBuffer {
    /// A zero-sized buffer, produced for zero-area regions.
    pub fn empty() -> Self {
        Self {
            width: 0,
            height: 0,
            data: Vec::new(),
        }
    }

    /// Opaque black buffer of the given size.
    pub fn new(width: u32, height: u32) -> Self {
        let mut data = vec![0u8; width as usize * height as usize * BYTES_PER_PIXEL];
        data.chunks_exact_mut(BYTES_PER_PIXEL).for_each(|px| px[3] = 255);
        Self {
            width,
            height,
            data,
        }
    }

    /// Adopt raw BGRA bytes, flipping bottom-up input so rows are stored
    /// top-down.  Returns `None` on a length mismatch.
    pub fn from_raw(width: u32, height: u32, mut data: Vec<u8>, order: RowOrder) -> Option<Self> {
        let stride = width as usize * BYTES_PER_PIXEL;
        if data.len() != stride * height as usize {
            return None;
        }
        if order == RowOrder::BottomUp && stride > 0 {
            let rows = height as usize;
            for row in 0..rows / 2 {
                let (upper, lower) = data.split_at_mut((rows - 1 - row) * stride);
                upper[row * stride..(row + 1) * stride].swap_with_slice(&mut lower[..stride]);
            }
        }
        Some(Self {
            width,
            height,
            data,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Raw BGRA bytes, top-down.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn stride(&self) -> usize {
        self.width as usize * BYTES_PER_PIXEL
    }

    fn offset(&self, x: u32, y: u32) -> Option<usize> {
        (x < self.width && y < self.height)
            .then(|| y as usize * self.stride() + x as usize * BYTES_PER_PIXEL)
    }

    /// `[b, g, r, a]` at `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        let i = self.offset(x, y)?;
        Some([
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ])
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, bgra: [u8; 4]) {
        if let Some(i) = self.offset(x, y) {
            self.data[i..i + BYTES_PER_PIXEL].copy_from_slice(&bgra);
        }
    }

    /// Source-over blend of an opaque BGR colour at `alpha` (0-255) onto the
    /// pixel at signed coordinates; out-of-bounds writes are dropped.
    pub fn blend(&mut self, x: i64, y: i64, bgr: [u8; 3], alpha: u8) {
        if alpha == 0 || x < 0 || y < 0 {
            return;
        }
        let (Ok(x), Ok(y)) = (u32::try_from(x), u32::try_from(y)) else {
            return;
        };
        let Some(i) = self.offset(x, y) else {
            return;
        };
        let a = alpha as u32;
        for (c, &src) in bgr.iter().enumerate() {
            let dst = self.data[i + c] as u32;
            self.data[i + c] = ((src as u32 * a + dst * (255 - a) + 127) / 255) as u8;
        }
        self.data[i + 3] = 255;
    }

    /// GDI leaves alpha at zero for `BI_RGB` 32-bit surfaces; the capture is
    /// opaque by definition.
    pub fn force_opaque(&mut self) {
        self.data
            .par_chunks_exact_mut(BYTES_PER_PIXEL)
            .for_each(|px| px[3] = 255);
    }

    /// Copy out the part of this buffer covered by `area` (buffer-local
    /// coordinates).  Parts of `area` outside the buffer are left black.
    pub fn crop(&self, area: &Rect) -> PixelBuffer {
        let mut out = PixelBuffer::new(area.width(), area.height());
        let bounds = Rect::new(0, 0, self.width as i32, self.height as i32);
        let Some(visible) = bounds.intersect(area) else {
            return out;
        };

        let row_len = visible.width() as usize * BYTES_PER_PIXEL;
        for y in visible.top..visible.bottom {
            let src = y as usize * self.stride() + visible.left as usize * BYTES_PER_PIXEL;
            let dst_x = (visible.left - area.left) as usize;
            let dst_y = (y - area.top) as usize;
            let dst = dst_y * out.stride() + dst_x * BYTES_PER_PIXEL;
            out.data[dst..dst + row_len].copy_from_slice(&self.data[src..src + row_len]);
        }
        out
    }

    /// Copy `src` into this buffer with its top-left corner at `at`,
    /// clipping whatever falls outside.
    pub fn paste(&mut self, src: &PixelBuffer, at: Point) {
        let bounds = Rect::new(0, 0, self.width as i32, self.height as i32);
        let Some(placed) = Rect::from_origin_size(at.x, at.y, src.width, src.height) else {
            return;
        };
        let Some(visible) = bounds.intersect(&placed) else {
            return;
        };

        let row_len = visible.width() as usize * BYTES_PER_PIXEL;
        for y in visible.top..visible.bottom {
            let src_x = (visible.left - at.x) as usize;
            let src_y = (y - at.y) as usize;
            let from = src_y * src.stride() + src_x * BYTES_PER_PIXEL;
            let to = y as usize * self.stride() + visible.left as usize * BYTES_PER_PIXEL;
            self.data[to..to + row_len].copy_from_slice(&src.data[from..from + row_len]);
        }
    }

    /// Convert to RGBA for the `image` crate.
    pub fn to_rgba(&self) -> Vec<u8> {
        let mut rgba = self.data.clone();
        rgba.par_chunks_exact_mut(BYTES_PER_PIXEL)
            .for_each(|px| px.swap(0, 2));
        rgba
    }

    /// Serialise as a packed DIB (`CF_DIB` clipboard payload):
    /// `BITMAPINFOHEADER` followed by bottom-up 32-bit BGR rows.
    pub fn to_dib(&self) -> Vec<u8> {
        let image_len = self.data.len();
        let mut dib = Vec::with_capacity(DIB_HEADER_LEN + image_len);

        dib.extend_from_slice(&(DIB_HEADER_LEN as u32).to_le_bytes()); // biSize
        dib.extend_from_slice(&(self.width as i32).to_le_bytes()); // biWidth
        dib.extend_from_slice(&(self.height as i32).to_le_bytes()); // biHeight (bottom-up)
        dib.extend_from_slice(&1u16.to_le_bytes()); // biPlanes
        dib.extend_from_slice(&32u16.to_le_bytes()); // biBitCount
        dib.extend_from_slice(&0u32.to_le_bytes()); // biCompression = BI_RGB
        dib.extend_from_slice(&(image_len as u32).to_le_bytes()); // biSizeImage
        dib.extend_from_slice(&0i32.to_le_bytes()); // biXPelsPerMeter
        dib.extend_from_slice(&0i32.to_le_bytes()); // biYPelsPerMeter
        dib.extend_from_slice(&0u32.to_le_bytes()); // biClrUsed
        dib.extend_from_slice(&0u32.to_le_bytes()); // biClrImportant

        if self.stride() > 0 {
            for row in self.data.chunks_exact(self.stride()).rev() {
                dib.extend_from_slice(row);
            }
        }
        dib
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    /// 2x3 buffer whose blue channel encodes the row index.
    fn rows_buffer(order: RowOrder) -> PixelBuffer {
        let mut data = Vec::new();
        for row in 0..3u8 {
            for _ in 0..2 {
                data.extend_from_slice(&[row, 0, 0, 0]);
            }
        }
        PixelBuffer::from_raw(2, 3, data, order).unwrap()
    }

    #[test]
    fn test_from_raw_top_down_untouched() {
        let buf = rows_buffer(RowOrder::TopDown);
        assert_eq!(buf.pixel(0, 0).unwrap()[0], 0);
        assert_eq!(buf.pixel(1, 2).unwrap()[0], 2);
    }

    #[test]
    fn test_from_raw_bottom_up_is_flipped() {
        let buf = rows_buffer(RowOrder::BottomUp);
        assert_eq!(buf.pixel(0, 0).unwrap()[0], 2);
        assert_eq!(buf.pixel(0, 1).unwrap()[0], 1);
        assert_eq!(buf.pixel(1, 2).unwrap()[0], 0);
    }

    #[test]
    fn test_from_raw_length_mismatch() {
        assert!(PixelBuffer::from_raw(2, 2, vec![0; 15], RowOrder::TopDown).is_none());
    }

    #[test]
    fn test_empty_buffer() {
        let buf = PixelBuffer::empty();
        assert!(buf.is_empty());
        assert!(buf.as_bytes().is_empty());
        assert!(buf.to_rgba().is_empty());
        assert_eq!(buf.to_dib().len(), DIB_HEADER_LEN);
    }

    #[test]
    fn test_crop_inside_and_clipped() {
        let mut src = PixelBuffer::new(4, 4);
        src.set_pixel(2, 1, [9, 8, 7, 255]);

        let inner = src.crop(&Rect::new(1, 1, 3, 3));
        assert_eq!((inner.width(), inner.height()), (2, 2));
        assert_eq!(inner.pixel(1, 0), Some([9, 8, 7, 255]));

        let clipped = src.crop(&Rect::new(2, -1, 6, 2));
        assert_eq!((clipped.width(), clipped.height()), (4, 3));
        assert_eq!(clipped.pixel(0, 2), Some([9, 8, 7, 255]));
        assert_eq!(clipped.pixel(3, 0), Some([0, 0, 0, 255]));
    }

    #[test]
    fn test_paste_clips_to_bounds() {
        let mut dst = PixelBuffer::new(4, 4);
        let mut patch = PixelBuffer::new(3, 3);
        patch.set_pixel(0, 0, [1, 1, 1, 255]);
        patch.set_pixel(2, 2, [2, 2, 2, 255]);

        dst.paste(&patch, Point::new(2, 2));
        assert_eq!(dst.pixel(2, 2), Some([1, 1, 1, 255]));
        assert_eq!(dst.pixel(3, 3), Some([0, 0, 0, 255]));

        dst.paste(&patch, Point::new(-2, -2));
        assert_eq!(dst.pixel(0, 0), Some([2, 2, 2, 255]));

        dst.paste(&patch, Point::new(10, 10));
    }

    #[test]
    fn test_blend_half_alpha() {
        let mut buf = PixelBuffer::new(1, 1);
        buf.set_pixel(0, 0, [200, 200, 200, 255]);
        buf.blend(0, 0, [0, 0, 0], 128);
        let px = buf.pixel(0, 0).unwrap();
        assert!(px[0] > 95 && px[0] < 105, "got {px:?}");
        buf.blend(-1, 0, [255, 255, 255], 255);
        buf.blend(5, 5, [255, 255, 255], 255);
    }

    #[test]
    fn test_to_rgba_swizzles() {
        let buf = PixelBuffer::from_raw(1, 1, vec![1, 2, 3, 4], RowOrder::TopDown).unwrap();
        assert_eq!(buf.to_rgba(), vec![3, 2, 1, 4]);
    }

    #[test]
    fn test_to_dib_header_and_row_order() {
        let buf = rows_buffer(RowOrder::TopDown);
        let dib = buf.to_dib();
        assert_eq!(dib.len(), DIB_HEADER_LEN + 2 * 3 * 4);
        assert_eq!(u32::from_le_bytes(dib[0..4].try_into().unwrap()), 40);
        assert_eq!(i32::from_le_bytes(dib[4..8].try_into().unwrap()), 2);
        assert_eq!(i32::from_le_bytes(dib[8..12].try_into().unwrap()), 3);
        assert_eq!(u16::from_le_bytes(dib[14..16].try_into().unwrap()), 32);
        // first stored row is the bottom row
        assert_eq!(dib[DIB_HEADER_LEN], 2);
        assert_eq!(dib[dib.len() - 4], 0);
    }

    #[test]
    fn test_force_opaque() {
        let mut buf = PixelBuffer::from_raw(2, 1, vec![0; 8], RowOrder::TopDown).unwrap();
        buf.force_opaque();
        assert_eq!(buf.pixel(1, 0).unwrap()[3], 255);
    }
}
