//! Owns a skeleton GIF built from a decoder's metadata plus a palette-index
//! cache; accepts RGBA frames one at a time, quantizes them to palette
//! indices, and finally serializes the complete stream.
//!
//! Grounded on `opencv_giflib.cpp`'s `giflib_encoder_create` /
//! `giflib_encoder_init` / `giflib_encoder_encode_frame` /
//! `giflib_encoder_spew`: construction deep-copies the template's metadata
//! but deliberately leaves screen dimensions unset until `init` is called
//! (the reference implementation's own separation of concerns), and `flush`
//! is the single point where the full stream is assembled and written.

use std::io::Cursor;

use napi::bindgen_prelude::*;
use napi_derive::napi;

use crate::canvas::CanvasRef;
use crate::colormap::ColorMap;
use crate::decoder::Decoder;
use crate::error::{CoreError, CoreResult};
use crate::frame::Frame;
use crate::gif_stream::LoopCount;
use crate::quantizer::{palettes_match, quantize_canvas, PaletteLookup};

#[napi]
pub struct Encoder {
  screen_width: Option<u32>,
  screen_height: Option<u32>,
  global_colormap: Option<ColorMap>,
  loop_count: LoopCount,
  frames: Vec<Frame>,
  lookup: PaletteLookup,
  previous_effective_palette: Option<ColorMap>,
  flushed: bool,
}

#[napi]
impl Encoder {
  /// Seeds a fresh encoder from a decoder used strictly as a metadata
  /// template: global colormap (deep copy), loop count, frame count, and
  /// per-frame metadata (local colormap deep copy, graphic control deep
  /// copy). Raster arrays are left unset.
  #[napi(constructor)]
  pub fn new(decoder: &Decoder) -> napi::Result<Encoder> {
    let stream = decoder.stream();
    let frames = stream.frames.iter().map(Frame::template_from).collect();
    log::debug!("encoder seeded from template with {} frame(s)", stream.frames.len());
    Ok(Encoder {
      screen_width: None,
      screen_height: None,
      global_colormap: stream.global_colormap.clone(),
      loop_count: stream.loop_count,
      frames,
      lookup: PaletteLookup::new(),
      previous_effective_palette: None,
      flushed: false,
    })
  }

  /// Sets the logical screen dimensions of the output. Must be called
  /// before any `encode_frame` call.
  #[napi]
  pub fn init(&mut self, width: u16, height: u16) -> napi::Result<()> {
    self.screen_width = Some(width as u32);
    self.screen_height = Some(height as u32);
    Ok(())
  }

  /// Quantizes `rgba_canvas` into `frame_index`'s raster indices. Every
  /// encoded frame covers the full canvas at origin (0,0); partial-frame
  /// encoding is out of scope.
  #[napi]
  pub fn encode_frame(&mut self, frame_index: u32, rgba_canvas: &[u8]) -> napi::Result<()> {
    self.encode_frame_impl(frame_index, rgba_canvas).map_err(napi::Error::from)
  }

  /// Serializes the fully populated encoder to a fresh byte buffer. After a
  /// successful flush, further `encode_frame`/`flush` calls fail.
  #[napi]
  pub fn flush(&mut self) -> napi::Result<Buffer> {
    self.flush_impl().map(Buffer::from).map_err(napi::Error::from)
  }
}

impl Encoder {
  fn encode_frame_impl(&mut self, frame_index: u32, rgba_canvas: &[u8]) -> CoreResult<()> {
    let screen_width = self.screen_width.ok_or(CoreError::EncodeGeometry { frame_index })?;
    let screen_height = self.screen_height.ok_or(CoreError::EncodeGeometry { frame_index })?;

    let frame = self
      .frames
      .get(frame_index as usize)
      .ok_or(CoreError::EncodeGeometry { frame_index })?
      .clone();

    // A frame's own canvas dimensions (not the template's) govern the
    // raster it produces, since the caller may have resized between decode
    // and encode; every encoded frame covers the encoder's full declared
    // canvas at origin (0,0), so the caller-supplied buffer is expected to
    // be exactly screen_width * screen_height * 4 bytes.
    if rgba_canvas.len() != screen_width as usize * screen_height as usize * 4 {
      log::warn!(
        "encode_frame: frame {frame_index} canvas is {} bytes, expected {}x{}x4",
        rgba_canvas.len(),
        screen_width,
        screen_height
      );
      return Err(CoreError::EncodeGeometry { frame_index });
    }

    let canvas = CanvasRef::new(rgba_canvas, screen_width, screen_height)
      .map_err(|_| CoreError::EncodeGeometry { frame_index })?;

    let cmap = frame
      .local_colormap
      .clone()
      .or_else(|| self.global_colormap.clone())
      .ok_or(CoreError::EncodeGeometry { frame_index })?;

    let reuse_cache = frame_index != 0 && palettes_match(self.previous_effective_palette.as_ref(), &cmap);
    if !reuse_cache {
      self.lookup.clear();
    }
    log::trace!("encode_frame: frame {frame_index} palette cache {}", if reuse_cache { "reused" } else { "cleared" });

    let raster = quantize_canvas(&canvas, &cmap, frame.graphic_control.transparent_index, &mut self.lookup);

    let stored = &mut self.frames[frame_index as usize];
    stored.width = screen_width;
    stored.height = screen_height;
    stored.left = 0;
    stored.top = 0;
    stored.raster_indices = Some(raster);

    self.previous_effective_palette = Some(cmap);
    Ok(())
  }

  fn flush_impl(&mut self) -> CoreResult<Vec<u8>> {
    if self.flushed {
      return Err(CoreError::Serialization("encoder already flushed".into()));
    }
    let width = self.screen_width.unwrap_or(0) as u16;
    let height = self.screen_height.unwrap_or(0) as u16;
    let global_bytes = self.global_colormap.as_ref().map(ColorMap::as_rgb_bytes).unwrap_or(&[]);

    let mut gif_encoder = gif::Encoder::new(Cursor::new(Vec::new()), width, height, global_bytes)
      .map_err(|e| CoreError::Serialization(e.to_string()))?;
    let _ = gif_encoder.set_repeat(self.loop_count.into());

    for (index, frame) in self.frames.iter().enumerate() {
      if frame.raster_indices.is_none() {
        log::warn!("flush: frame {index} was never encoded");
        return Err(CoreError::Serialization(format!("frame {index} was never encoded")));
      }
      gif_encoder
        .write_frame(&frame.to_gif_frame())
        .map_err(|e| CoreError::Serialization(e.to_string()))?;
    }

    let mut bytes = gif_encoder.get_mut().clone().into_inner();
    bytes.push(0x3B); // trailer; gif::Encoder only writes it on Drop, see DESIGN.md
    self.flushed = true;
    log::debug!("encoder flushed {} byte(s) across {} frame(s)", bytes.len(), self.frames.len());
    Ok(bytes)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::decoder::Decoder;
  use std::io::Cursor as StdCursor;

  fn encode_simple_gif() -> Vec<u8> {
    let mut out = Vec::new();
    {
      let mut encoder = gif::Encoder::new(StdCursor::new(&mut out), 2, 2, &[255, 0, 0, 0, 255, 0]).unwrap();
      let frame = gif::Frame::from_indexed_pixels(2, 2, vec![0, 1, 1, 0], None);
      encoder.write_frame(&frame).unwrap();
    }
    out
  }

  #[test]
  fn s6_oversize_canvas_rejected() {
    let bytes = encode_simple_gif();
    let decoder = Decoder::open(&bytes, None).unwrap();
    let mut encoder = Encoder::new(&decoder).unwrap();
    encoder.init(10, 10).unwrap();
    let oversize_canvas = vec![0u8; 12 * 10 * 4];
    assert!(encoder.encode_frame_impl(0, &oversize_canvas).is_err());
  }

  #[test]
  fn round_trip_palette_colors_are_exact() {
    let bytes = encode_simple_gif();
    let mut decoder = Decoder::open(&bytes, None).unwrap();
    let mut canvas = vec![0u8; 2 * 2 * 4];
    decoder.render_impl(0, &mut canvas).unwrap();

    let mut encoder = Encoder::new(&decoder).unwrap();
    encoder.init(2, 2).unwrap();
    encoder.encode_frame_impl(0, &canvas).unwrap();
    let out = encoder.flush_impl().unwrap();

    let mut redecoder = Decoder::open(&out, None).unwrap();
    let mut roundtrip_canvas = vec![0u8; 2 * 2 * 4];
    redecoder.render_impl(0, &mut roundtrip_canvas).unwrap();
    assert_eq!(canvas, roundtrip_canvas);
  }

  #[test]
  fn flush_twice_fails() {
    let bytes = encode_simple_gif();
    let decoder = Decoder::open(&bytes, None).unwrap();
    let mut encoder = Encoder::new(&decoder).unwrap();
    encoder.init(2, 2).unwrap();
    encoder.encode_frame_impl(0, &vec![0u8; 2 * 2 * 4]).unwrap();
    encoder.flush_impl().unwrap();
    assert!(encoder.flush_impl().is_err());
  }

  #[test]
  fn palette_lookup_cache_spans_matching_consecutive_frames() {
    let mut out = Vec::new();
    {
      let mut gif_encoder = gif::Encoder::new(StdCursor::new(&mut out), 1, 1, &[255, 0, 0, 0, 255, 0]).unwrap();
      gif_encoder.write_frame(&gif::Frame::from_indexed_pixels(1, 1, vec![0], None)).unwrap();
      gif_encoder.write_frame(&gif::Frame::from_indexed_pixels(1, 1, vec![1], None)).unwrap();
    }
    let decoder = Decoder::open(&out, None).unwrap();
    let mut encoder = Encoder::new(&decoder).unwrap();
    encoder.init(1, 1).unwrap();

    encoder.encode_frame_impl(0, &[0, 0, 255, 255]).unwrap();
    assert!(encoder.lookup.entries_present_count() >= 1);
    let count_after_first = encoder.lookup.entries_present_count();

    // Second frame shares the same effective (global) palette, so the cache
    // should be reused, not cleared, growing monotonically.
    encoder.encode_frame_impl(1, &[0, 255, 0, 255]).unwrap();
    assert!(encoder.lookup.entries_present_count() >= count_after_first);
  }
}
