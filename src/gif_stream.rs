//! The decoded-GIF in-memory tree: global screen properties plus every
//! frame's metadata (and, once slurped, raster bytes).

use crate::colormap::ColorMap;
use crate::frame::Frame;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopCount {
  Finite(u16),
  Infinite,
}

impl From<gif::Repeat> for LoopCount {
  fn from(value: gif::Repeat) -> Self {
    match value {
      gif::Repeat::Finite(n) => LoopCount::Finite(n),
      gif::Repeat::Infinite => LoopCount::Infinite,
    }
  }
}

impl From<LoopCount> for gif::Repeat {
  fn from(value: LoopCount) -> Self {
    match value {
      LoopCount::Finite(n) => gif::Repeat::Finite(n),
      LoopCount::Infinite => gif::Repeat::Infinite,
    }
  }
}

pub struct GifStream {
  pub screen_width: u32,
  pub screen_height: u32,
  pub background_color_index: Option<u8>,
  pub global_colormap: Option<ColorMap>,
  pub loop_count: LoopCount,
  pub frames: Vec<Frame>,
}

impl GifStream {
  /// The background color resolved per spec §4.1: fully transparent if the
  /// background index equals frame 0's transparent index, else the global
  /// colormap entry at `background_color_index` with alpha 255.
  pub fn resolved_background(&self) -> (u8, u8, u8, u8) {
    let first_transparent = self.frames.first().and_then(|f| f.graphic_control.transparent_index);
    if let (Some(bg_index), Some(transparent)) = (self.background_color_index, first_transparent) {
      if bg_index == transparent {
        return (0, 0, 0, 0);
      }
    }
    match (self.background_color_index, &self.global_colormap) {
      (Some(idx), Some(cmap)) => {
        if let Some((r, g, b)) = cmap.get(idx as usize) {
          return (b, g, r, 255);
        }
        (0, 0, 0, 255)
      }
      _ => (0, 0, 0, 255),
    }
  }
}
