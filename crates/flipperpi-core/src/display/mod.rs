//! Monochrome framebuffer and text rendering
//!
//! The buffer uses the SSD1306 memory layout: the panel is split into
//! horizontal pages of eight rows, and each byte is one column of one page
//! with the least significant bit at the top. A driver can therefore send
//! [`FrameBuffer::as_bytes`] to the panel unchanged in horizontal
//! addressing mode.
//!
//! ```text
//!            x=0      x=1      x=2
//! page 0   [byte 0] [byte 1] [byte 2] ...   rows 0..=7
//! page 1   [byte W] [W + 1]  [W + 2]  ...   rows 8..=15
//! ```

mod font;

pub use font::glyph;

/// Width of one character cell (5 pixel glyph plus one column of spacing)
pub const CHAR_WIDTH: i32 = 6;

/// Height of one glyph in pixels
pub const CHAR_HEIGHT: i32 = 8;

/// 1 bit-per-pixel framebuffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    width: u32,
    height: u32,
    buf: Vec<u8>,
}

impl FrameBuffer {
    /// Create a blank framebuffer
    ///
    /// `height` is rounded up to a whole number of pages.
    pub fn new(width: u32, height: u32) -> Self {
        let pages = height.div_ceil(8);
        Self {
            width,
            height,
            buf: vec![0; (width * pages) as usize],
        }
    }

    /// Width in pixels
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of 8-row pages
    pub fn pages(&self) -> u32 {
        self.height.div_ceil(8)
    }

    /// Raw buffer in page order
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Fill every pixel with `on`
    pub fn fill(&mut self, on: bool) {
        let value = if on { 0xFF } else { 0x00 };
        self.buf.iter_mut().for_each(|b| *b = value);
    }

    /// Set one pixel; coordinates outside the panel are ignored
    pub fn set_pixel(&mut self, x: i32, y: i32, on: bool) {
        let Some(idx) = self.index(x, y) else {
            return;
        };
        let mask = 1u8 << (y % 8);
        if on {
            self.buf[idx] |= mask;
        } else {
            self.buf[idx] &= !mask;
        }
    }

    /// Read one pixel; coordinates outside the panel read as off
    pub fn pixel(&self, x: i32, y: i32) -> bool {
        self.index(x, y)
            .map(|idx| self.buf[idx] & (1 << (y % 8)) != 0)
            .unwrap_or(false)
    }

    /// Draw `text` with the built-in font, top-left corner at (`x`, `y`)
    ///
    /// Only lit glyph pixels are drawn, so text can be overlaid on existing
    /// content. Text running off the panel is clipped.
    pub fn text(&mut self, text: &str, x: i32, y: i32, on: bool) {
        for (n, c) in text.chars().enumerate() {
            let cx = x + n as i32 * CHAR_WIDTH;
            if cx >= self.width as i32 {
                break;
            }
            for (col, bits) in glyph(c).iter().enumerate() {
                for row in 0..CHAR_HEIGHT {
                    if bits & (1 << row) != 0 {
                        self.set_pixel(cx + col as i32, y + row, on);
                    }
                }
            }
        }
    }

    /// Number of lit pixels
    pub fn lit_pixels(&self) -> u32 {
        self.buf.iter().map(|b| b.count_ones()).sum()
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return None;
        }
        Some(x as usize + (y as usize / 8) * self.width as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_layout() {
        let mut fb = FrameBuffer::new(128, 64);
        assert_eq!(fb.as_bytes().len(), 1024);
        assert_eq!(fb.pages(), 8);

        fb.set_pixel(3, 9, true);
        // Page 1, column 3, bit 1
        assert_eq!(fb.as_bytes()[128 + 3], 0b0000_0010);
        assert!(fb.pixel(3, 9));

        fb.set_pixel(3, 9, false);
        assert_eq!(fb.lit_pixels(), 0);
    }

    #[test]
    fn test_out_of_bounds_ignored() {
        let mut fb = FrameBuffer::new(16, 8);
        fb.set_pixel(-1, 0, true);
        fb.set_pixel(16, 0, true);
        fb.set_pixel(0, 8, true);
        assert_eq!(fb.lit_pixels(), 0);
        assert!(!fb.pixel(100, 100));
    }

    #[test]
    fn test_text_matches_glyph() {
        let mut fb = FrameBuffer::new(128, 64);
        fb.text("1", 0, 0, true);

        // Row 0 of the page is the glyph column unchanged
        assert_eq!(&fb.as_bytes()[..5], glyph('1'));
        assert_eq!(fb.as_bytes()[5], 0);
    }

    #[test]
    fn test_text_second_line_crosses_pages() {
        let mut fb = FrameBuffer::new(128, 64);
        fb.text("B", 0, 10, true);

        let expected: u32 = glyph('B').iter().map(|b| b.count_ones()).sum();
        assert_eq!(fb.lit_pixels(), expected);
        // Bit 0 of each glyph column lands on row 10 (page 1, bit 2)
        assert!(fb.pixel(0, 10));
        assert!(!fb.pixel(0, 0));
    }

    #[test]
    fn test_text_clipped_at_edge() {
        let mut fb = FrameBuffer::new(12, 8);
        // Only the first two character cells fit
        fb.text("8888", 0, 0, true);
        let per_glyph: u32 = glyph('8').iter().map(|b| b.count_ones()).sum();
        assert_eq!(fb.lit_pixels(), per_glyph * 2);
    }

    #[test]
    fn test_unknown_char_uses_question_mark() {
        assert_eq!(glyph('é'), glyph('?'));
        assert_eq!(glyph('\n'), glyph('?'));
    }

    #[test]
    fn test_fill() {
        let mut fb = FrameBuffer::new(8, 16);
        fb.fill(true);
        assert_eq!(fb.lit_pixels(), 128);
        fb.fill(false);
        assert_eq!(fb.lit_pixels(), 0);
    }
}
