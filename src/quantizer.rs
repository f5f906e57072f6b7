//! The encoder's approximate nearest-palette-color quantizer.
//!
//! Ported from `opencv_giflib.cpp`'s `encoder_palette_lookup` /
//! `rgb_distance` / `giflib_encoder_encode_frame`: a 2^15-entry cache keyed
//! by the high 5 bits of each RGB channel, populated lazily by a
//! cube-center Manhattan-distance search over the frame's effective
//! palette, and invalidated only when the effective palette actually
//! changes between consecutive frames.

use crate::canvas::CanvasRef;
use crate::colormap::ColorMap;

const LOOKUP_SIZE: usize = 1 << 15;
const ALPHA_TRANSPARENT_THRESHOLD: u8 = 128;

#[derive(Clone, Copy, Default)]
struct LookupEntry {
  present: bool,
  palette_index: u8,
}

/// The per-encoder crushed-RGB → palette-index cache, reused across frames
/// that share a byte-identical effective palette.
pub struct PaletteLookup {
  entries: Vec<LookupEntry>,
}

impl PaletteLookup {
  pub fn new() -> Self {
    Self { entries: vec![LookupEntry::default(); LOOKUP_SIZE] }
  }

  pub fn clear(&mut self) {
    for entry in &mut self.entries {
      *entry = LookupEntry::default();
    }
  }

  #[cfg(test)]
  pub(crate) fn entries_present_count(&self) -> usize {
    self.entries.iter().filter(|e| e.present).count()
  }

  fn crush(r: u8, g: u8, b: u8) -> usize {
    ((r as usize >> 3) << 10) | ((g as usize >> 3) << 5) | (b as usize >> 3)
  }

  fn best_match(cmap: &ColorMap, r_center: i32, g_center: i32, b_center: i32) -> u8 {
    let mut best_index = 0u8;
    let mut best_distance = i32::MAX;
    for i in 0..cmap.count() {
      let (cr, cg, cb) = cmap.get(i).expect("index within count()");
      let distance =
        (r_center - cr as i32).abs() + (g_center - cg as i32).abs() + (b_center - cb as i32).abs();
      if distance < best_distance {
        best_distance = distance;
        best_index = i as u8;
      }
    }
    best_index
  }

  /// Looks up (populating the cache on miss) the best palette index for an
  /// opaque pixel.
  fn index_for(&mut self, cmap: &ColorMap, r: u8, g: u8, b: u8) -> u8 {
    let key = Self::crush(r, g, b);
    if self.entries[key].present {
      return self.entries[key].palette_index;
    }
    let r_center = ((r & 0xF8) | 4) as i32;
    let g_center = ((g & 0xF8) | 4) as i32;
    let b_center = ((b & 0xF8) | 4) as i32;
    let best = Self::best_match(cmap, r_center, g_center, b_center);
    self.entries[key] = LookupEntry { present: true, palette_index: best };
    best
  }
}

/// True iff the palette cache built for `previous` can be reused for
/// `current` without clearing — i.e. the two effective palettes are
/// byte-identical.
pub fn palettes_match(previous: Option<&ColorMap>, current: &ColorMap) -> bool {
  match previous {
    Some(prev) => prev.as_rgb_bytes() == current.as_rgb_bytes(),
    None => false,
  }
}

/// Quantizes every pixel of `canvas` into `cmap`, honoring `transparent_index`
/// for pixels whose alpha is below the transparency threshold. Pixels are
/// read in row-major order, matching the order `raster_indices` expects on
/// decode.
pub fn quantize_canvas(
  canvas: &CanvasRef<'_>,
  cmap: &ColorMap,
  transparent_index: Option<u8>,
  lookup: &mut PaletteLookup,
) -> Vec<u8> {
  let width = canvas.width();
  let height = canvas.height();
  let mut raster = Vec::with_capacity(width as usize * height as usize);
  for y in 0..height {
    for x in 0..width {
      let (b, g, r, a) = canvas.get(x, y);
      if a < ALPHA_TRANSPARENT_THRESHOLD {
        if let Some(idx) = transparent_index {
          raster.push(idx);
          continue;
        }
      }
      raster.push(lookup.index_for(cmap, r, g, b));
    }
  }
  raster
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::canvas::CanvasRef;

  fn palette_rg() -> ColorMap {
    ColorMap::from_rgb_bytes(vec![255, 0, 0, 0, 255, 0])
  }

  #[test]
  fn maps_exact_palette_colors_idempotently() {
    let cmap = palette_rg();
    // BGRA: red, then green.
    let buf = [0u8, 0, 255, 255, 0, 255, 0, 255];
    let canvas = CanvasRef::new(&buf, 2, 1).unwrap();
    let mut lookup = PaletteLookup::new();
    let raster = quantize_canvas(&canvas, &cmap, None, &mut lookup);
    assert_eq!(raster, vec![0, 1]);
  }

  #[test]
  fn transparent_pixels_emit_transparent_index() {
    let cmap = palette_rg();
    let buf = [0u8, 0, 255, 10]; // alpha < 128
    let canvas = CanvasRef::new(&buf, 1, 1).unwrap();
    let mut lookup = PaletteLookup::new();
    let raster = quantize_canvas(&canvas, &cmap, Some(7), &mut lookup);
    assert_eq!(raster, vec![7]);
  }

  #[test]
  fn cache_is_reused_across_matching_palettes() {
    let cmap_a = palette_rg();
    let cmap_b = palette_rg();
    assert!(palettes_match(Some(&cmap_a), &cmap_b));

    let different = ColorMap::from_rgb_bytes(vec![0, 0, 255, 255, 255, 0]);
    assert!(!palettes_match(Some(&cmap_a), &different));
    assert!(!palettes_match(None, &cmap_a));
  }

  #[test]
  fn cube_center_breaks_ties_toward_lowest_index() {
    let cmap = ColorMap::from_rgb_bytes(vec![100, 100, 100, 100, 100, 100]);
    let buf = [100u8, 100, 100, 255];
    let canvas = CanvasRef::new(&buf, 1, 1).unwrap();
    let mut lookup = PaletteLookup::new();
    let raster = quantize_canvas(&canvas, &cmap, None, &mut lookup);
    assert_eq!(raster, vec![0]);
  }
}
