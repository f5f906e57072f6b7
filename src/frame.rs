//! In-memory frame record owned by `Decoder`/`Encoder`.
//!
//! This type never crosses the napi host boundary directly — the host only
//! ever sees `Decoder`/`Encoder`/`DecoderOptions` handles (see DESIGN.md).

use crate::colormap::ColorMap;
use crate::disposal::{DisposalMode, GraphicControl};

#[derive(Debug, Clone)]
pub struct Frame {
  pub left: u32,
  pub top: u32,
  pub width: u32,
  pub height: u32,
  pub interlaced: bool,
  pub local_colormap: Option<ColorMap>,
  /// Absent until the frame has been slurped (decode) or encoded (encode).
  pub raster_indices: Option<Vec<u8>>,
  pub graphic_control: GraphicControl,
}

impl Frame {
  /// Builds structural metadata for a frame from the `gif` crate's frame
  /// info, without its raster bytes (used by `Decoder::open`, which defers
  /// LZW expansion to `slurp`).
  pub fn from_gif_frame_info(f: &gif::Frame) -> Self {
    Self {
      left: f.left as u32,
      top: f.top as u32,
      width: f.width as u32,
      height: f.height as u32,
      interlaced: f.interlaced,
      local_colormap: f.palette.clone().map(ColorMap::from_rgb_bytes),
      raster_indices: None,
      graphic_control: GraphicControl {
        delay_centiseconds: f.delay,
        transparent_index: f.transparent,
        disposal_mode: DisposalMode::from(f.dispose),
        needs_user_input: f.needs_user_input,
      },
    }
  }

  /// Builds a full frame record, raster bytes included, from a fully
  /// decoded `gif::Frame` (used by `Decoder::slurp`).
  pub fn from_gif_frame_decoded(f: &gif::Frame) -> Self {
    let mut frame = Self::from_gif_frame_info(f);
    frame.raster_indices = Some(f.buffer.to_vec());
    frame
  }

  /// Builds a template frame (metadata only, no raster) seeded from a
  /// decoder's frame during `Encoder::new`.
  pub fn template_from(source: &Frame) -> Self {
    Self {
      left: 0,
      top: 0,
      width: source.width,
      height: source.height,
      interlaced: source.interlaced,
      local_colormap: source.local_colormap.clone(),
      raster_indices: None,
      graphic_control: source.graphic_control.clone(),
    }
  }

  /// The effective colormap for this frame: local if present, else the
  /// given global map.
  pub fn effective_colormap<'a>(&'a self, global: Option<&'a ColorMap>) -> Option<&'a ColorMap> {
    self.local_colormap.as_ref().or(global)
  }

  /// Builds the `gif::Frame` used to serialize this frame, consuming the
  /// frame's raster bytes. Panics if `raster_indices` is absent; callers
  /// (`Encoder::flush`) only invoke this after every frame has been encoded.
  pub fn to_gif_frame(&self) -> gif::Frame<'static> {
    let raster = self.raster_indices.clone().expect("frame raster must be encoded before flush");
    let mut frame = gif::Frame::from_indexed_pixels(
      self.width as u16,
      self.height as u16,
      raster,
      self.graphic_control.transparent_index,
    );
    frame.left = self.left as u16;
    frame.top = self.top as u16;
    frame.interlaced = self.interlaced;
    frame.delay = self.graphic_control.delay_centiseconds;
    frame.dispose = self.graphic_control.disposal_mode.into();
    frame.needs_user_input = self.graphic_control.needs_user_input;
    if let Some(cmap) = &self.local_colormap {
      frame.palette = Some(cmap.as_rgb_bytes().to_vec());
    }
    frame
  }
}
