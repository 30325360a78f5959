//! Letter rasters for the label and name blocks.
//!
//! Each block face shows one upper-case character drawn white on the block's
//! color. Glyphs come from the 8×8 `font8x8` bitmaps, upscaled with nearest
//! sampling into a square RGBA raster.

use font8x8::legacy::BASIC_LEGACY;
use slotmap::SlotMap;

use crate::color::Rgb;

pub const LETTER_RASTER_SIZE: u32 = 128;
const GLYPH_CELLS: u32 = 8;
const GLYPH_SCALE: u32 = 10;

slotmap::new_key_type! {
    pub struct TextureId;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LetterRaster {
    pub glyph: char,
    pub background: Rgb,
    pub foreground: Rgb,
    pub size: u32,
    /// Tightly packed RGBA8, row-major, top row first.
    pub pixels: Vec<u8>,
}

impl LetterRaster {
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let offset = ((y * self.size + x) * 4) as usize;
        let mut out = [0u8; 4];
        out.copy_from_slice(&self.pixels[offset..offset + 4]);
        out
    }
}

fn glyph_rows(ch: char) -> [u8; 8] {
    let index = ch as usize;
    if index < BASIC_LEGACY.len() {
        BASIC_LEGACY[index]
    } else {
        BASIC_LEGACY[b'?' as usize]
    }
}

/// Renders `glyph` centered on a `background` square.
pub fn rasterize_letter(glyph: char, background: Rgb) -> LetterRaster {
    let size = LETTER_RASTER_SIZE;
    let foreground = Rgb::WHITE;
    let [br, bg, bb] = background.channels();
    let [fr, fg, fb] = foreground.channels();

    let mut pixels = Vec::with_capacity((size * size * 4) as usize);
    for _ in 0..size * size {
        pixels.extend_from_slice(&[br, bg, bb, 255]);
    }

    let rows = glyph_rows(glyph);
    let extent = GLYPH_CELLS * GLYPH_SCALE;
    let origin = (size - extent) / 2;
    for (row, bits) in rows.iter().enumerate() {
        for col in 0..GLYPH_CELLS {
            if bits & (1 << col) == 0 {
                continue;
            }
            let x0 = origin + col * GLYPH_SCALE;
            let y0 = origin + row as u32 * GLYPH_SCALE;
            for y in y0..y0 + GLYPH_SCALE {
                for x in x0..x0 + GLYPH_SCALE {
                    let offset = ((y * size + x) * 4) as usize;
                    pixels[offset..offset + 4].copy_from_slice(&[fr, fg, fb, 255]);
                }
            }
        }
    }

    LetterRaster {
        glyph,
        background,
        foreground,
        size,
        pixels,
    }
}

/// Owns every live letter raster. `revision` bumps on each insert or
/// release so renderers know when to rebuild their atlas.
#[derive(Default)]
pub struct TextureStore {
    rasters: SlotMap<TextureId, LetterRaster>,
    revision: u64,
}

impl TextureStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, raster: LetterRaster) -> TextureId {
        self.revision += 1;
        self.rasters.insert(raster)
    }

    pub fn release(&mut self, id: TextureId) -> Option<LetterRaster> {
        let removed = self.rasters.remove(id);
        if removed.is_some() {
            self.revision += 1;
        }
        removed
    }

    pub fn get(&self, id: TextureId) -> Option<&LetterRaster> {
        self.rasters.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (TextureId, &LetterRaster)> {
        self.rasters.iter()
    }

    pub fn len(&self) -> usize {
        self.rasters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rasters.is_empty()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn clear(&mut self) {
        if !self.rasters.is_empty() {
            self.rasters.clear();
            self.revision += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raster_draws_white_glyph_on_background() {
        let background = Rgb::from_hex(0xffc107);
        let raster = rasterize_letter('A', background);
        assert_eq!(raster.pixels.len(), (128 * 128 * 4) as usize);
        assert_eq!(raster.pixel(0, 0), [0xff, 0xc1, 0x07, 255]);
        let white = raster
            .pixels
            .chunks_exact(4)
            .filter(|px| *px == [255, 255, 255, 255])
            .count();
        assert!(white > 0);
        assert_eq!(white % 100, 0, "glyph cells upscale to 10x10 blocks");
    }

    #[test]
    fn space_has_no_ink() {
        let raster = rasterize_letter(' ', Rgb::from_hex(0x2196f3));
        assert!(
            raster
                .pixels
                .chunks_exact(4)
                .all(|px| px == [0x21, 0x96, 0xf3, 255])
        );
    }

    #[test]
    fn store_tracks_revisions() {
        let mut store = TextureStore::new();
        let first = store.insert(rasterize_letter('P', Rgb::BLACK));
        let rev = store.revision();
        assert!(store.release(first).is_some());
        assert!(store.revision() > rev);
        assert!(store.release(first).is_none());
        assert!(store.is_empty());
    }
}
