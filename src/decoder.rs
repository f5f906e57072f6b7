//! Owns a parsed GIF in memory and renders individual frames onto a
//! caller-owned canvas.
//!
//! The open/slurp split mirrors `opencv_giflib.cpp`'s `giflib_decoder_create`
//! (header-only `DGifOpen`) versus `giflib_decoder_slurp` (`DGifSlurp`,
//! forcing full LZW expansion), which lines up with the `gif` crate's own
//! `next_frame_info` (skip the raster) versus `read_next_frame` (decode it).

use std::io::Cursor;
use std::num::NonZero;

use napi::bindgen_prelude::*;
use napi_derive::napi;

use crate::canvas::CanvasView;
use crate::colormap::ColorMap;
use crate::error::{CoreError, CoreResult};
use crate::frame::Frame;
use crate::gif_stream::{GifStream, LoopCount};

/// Configuration for a `Decoder`, mirroring the knobs the `gif` crate
/// itself exposes for decode-time behavior (see SPEC_FULL.md §4.5). There is
/// no environment-variable or file-based configuration anywhere in this
/// crate; this struct is the entire surface.
#[napi]
#[derive(Clone, Default)]
pub struct DecoderOptions {
  memory_limit: Option<gif::MemoryLimit>,
  check_frame_consistency: bool,
  check_lzw_end_code: bool,
  allow_unknown_blocks: bool,
}

#[napi]
impl DecoderOptions {
  #[napi(constructor)]
  pub fn new() -> Self {
    Self::default()
  }

  /// Negative values mean unlimited; positive values are a byte limit on
  /// LZW expansion.
  #[napi]
  pub fn set_memory_limit(&mut self, value: i64) -> napi::Result<()> {
    self.memory_limit = Some(if value <= -1 {
      gif::MemoryLimit::Unlimited
    } else {
      gif::MemoryLimit::Bytes(
        NonZero::new(value as u64)
          .ok_or_else(|| Error::new(Status::InvalidArg, "limit must be a positive non-zero integer"))?,
      )
    });
    Ok(())
  }

  #[napi]
  pub fn check_frame_consistency(&mut self, value: bool) {
    self.check_frame_consistency = value;
  }

  #[napi]
  pub fn check_lzw_end_code(&mut self, value: bool) {
    self.check_lzw_end_code = value;
  }

  #[napi]
  pub fn allow_unknown_blocks(&mut self, value: bool) {
    self.allow_unknown_blocks = value;
  }

  fn to_gif_options(&self) -> gif::DecodeOptions {
    let mut opts = gif::DecodeOptions::new();
    opts.set_color_output(gif::ColorOutput::Indexed);
    if let Some(limit) = self.memory_limit {
      opts.set_memory_limit(limit);
    }
    opts.check_frame_consistency(self.check_frame_consistency);
    opts.check_lzw_end_code(self.check_lzw_end_code);
    opts.allow_unknown_blocks(self.allow_unknown_blocks);
    opts
  }
}

/// The GIF decoder: a fully structurally-parsed GIF plus, once `slurp` has
/// run, every frame's raster bytes.
#[napi]
pub struct Decoder {
  raw_bytes: Vec<u8>,
  options: gif::DecodeOptions,
  stream: GifStream,
  slurped: bool,
}

#[napi]
impl Decoder {
  #[napi(constructor)]
  pub fn new(buffer: &[u8], options: Option<&DecoderOptions>) -> napi::Result<Decoder> {
    Self::open(buffer, options).map_err(napi::Error::from)
  }

  #[napi(getter)]
  pub fn width(&self) -> u16 {
    self.stream.screen_width as u16
  }

  #[napi(getter)]
  pub fn height(&self) -> u16 {
    self.stream.screen_height as u16
  }

  #[napi(getter)]
  pub fn frame_count(&self) -> u32 {
    self.stream.frames.len() as u32
  }

  /// Completes LZW expansion of every frame's raster bytes. Idempotent;
  /// `render` calls this automatically if it has not yet run.
  #[napi]
  pub fn slurp(&mut self) -> napi::Result<()> {
    self.slurp_impl().map_err(napi::Error::from)
  }

  /// Composites `frame_index` onto `canvas`, honoring transparency and the
  /// previous frame's disposal mode. `canvas` must be exactly
  /// `width * height * 4` bytes, BGRA, row-major.
  #[napi]
  pub fn render(&mut self, frame_index: u32, canvas: &mut [u8]) -> napi::Result<()> {
    self.render_impl(frame_index, canvas).map_err(napi::Error::from)
  }
}

impl Decoder {
  pub fn open(buffer: &[u8], options: Option<&DecoderOptions>) -> CoreResult<Decoder> {
    let gif_options = options.map(DecoderOptions::to_gif_options).unwrap_or_else(|| {
      let mut opts = gif::DecodeOptions::new();
      opts.set_color_output(gif::ColorOutput::Indexed);
      opts
    });

    let raw_bytes = buffer.to_vec();
    let mut reader = gif_options
      .clone()
      .read_info(Cursor::new(raw_bytes.clone()))
      .map_err(|e| CoreError::Parse(e.to_string()))?;

    let global_colormap = reader.global_palette().map(|p| ColorMap::from_rgb_bytes(p.to_vec()));
    let background_color_index = reader.bg_color().map(|c| c as u8);
    let loop_count = LoopCount::from(reader.repeat());
    let screen_width = reader.width() as u32;
    let screen_height = reader.height() as u32;

    let mut frames = Vec::new();
    while let Some(f) = reader.next_frame_info().map_err(|e| CoreError::Parse(e.to_string()))? {
      frames.push(Frame::from_gif_frame_info(f));
    }

    log::debug!(
      "decoder parsed {}x{} GIF with {} frame(s)",
      screen_width,
      screen_height,
      frames.len()
    );

    Ok(Decoder {
      raw_bytes,
      options: gif_options,
      stream: GifStream { screen_width, screen_height, background_color_index, global_colormap, loop_count, frames },
      slurped: false,
    })
  }

  pub fn stream(&self) -> &GifStream {
    &self.stream
  }

  fn slurp_impl(&mut self) -> CoreResult<()> {
    if self.slurped {
      return Ok(());
    }
    let mut reader = self
      .options
      .clone()
      .read_info(Cursor::new(self.raw_bytes.clone()))
      .map_err(|e| CoreError::Parse(e.to_string()))?;

    let mut frames = Vec::with_capacity(self.stream.frames.len());
    while let Some(f) = reader.read_next_frame().map_err(|e| CoreError::Parse(e.to_string()))? {
      frames.push(Frame::from_gif_frame_decoded(f));
    }
    self.stream.frames = frames;
    self.slurped = true;
    log::debug!("decoder slurped {} frame(s)", self.stream.frames.len());
    Ok(())
  }

  fn render_impl(&mut self, frame_index: u32, canvas: &mut [u8]) -> CoreResult<()> {
    self.slurp_impl()?;

    let screen_width = self.stream.screen_width;
    let screen_height = self.stream.screen_height;
    let mut view = CanvasView::new(canvas, screen_width, screen_height)?;

    let (bg_b, bg_g, bg_r, bg_a) = self.stream.resolved_background();

    if frame_index == 0 {
      view.fill(bg_b, bg_g, bg_r, bg_a);
    }

    if frame_index > 0 {
      let previous = self.stream.frames.get(frame_index as usize - 1).ok_or_else(|| {
        log::warn!("render: no previous frame for index {frame_index}");
        CoreError::RenderGeometry { frame_index }
      })?;
      match previous.graphic_control.disposal_mode {
        crate::disposal::DisposalMode::DisposeBackground => {
          view.fill_rect(previous.left, previous.top, previous.width, previous.height, bg_b, bg_g, bg_r, bg_a);
        }
        crate::disposal::DisposalMode::DisposePrevious => {
          log::debug!("render: DisposePrevious on frame {} left as a no-op", frame_index - 1);
        }
        _ => {}
      }
    }

    let frame = self.stream.frames.get(frame_index as usize).ok_or_else(|| {
      log::warn!("render: frame index {frame_index} out of range");
      CoreError::RenderGeometry { frame_index }
    })?;

    if frame.left + frame.width > screen_width || frame.top + frame.height > screen_height {
      log::warn!(
        "render: frame {frame_index} rectangle ({},{},{},{}) overflows {}x{} screen",
        frame.left,
        frame.top,
        frame.width,
        frame.height,
        screen_width,
        screen_height
      );
      return Err(CoreError::RenderGeometry { frame_index });
    }

    let cmap = frame.effective_colormap(self.stream.global_colormap.as_ref()).ok_or_else(|| {
      log::warn!("render: frame {frame_index} has no effective colormap");
      CoreError::RenderGeometry { frame_index }
    })?;

    let raster = frame.raster_indices.as_ref().ok_or_else(|| {
      log::warn!("render: frame {frame_index} has not been slurped");
      CoreError::RenderGeometry { frame_index }
    })?;

    let transparent = frame.graphic_control.transparent_index;
    let mut raster_pos = 0usize;
    for y in frame.top..frame.top + frame.height {
      for x in frame.left..frame.left + frame.width {
        let idx = raster[raster_pos];
        raster_pos += 1;
        if Some(idx) == transparent {
          continue;
        }
        if let Some((r, g, b)) = cmap.get(idx as usize) {
          view.put_opaque(x, y, b, g, r);
        }
      }
    }

    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::io::Cursor as StdCursor;

  fn encode_test_gif(
    width: u16,
    height: u16,
    palette: &[u8],
    frames: Vec<(u16, u16, u16, u16, Vec<u8>, Option<u8>, gif::DisposalMethod)>,
  ) -> Vec<u8> {
    let mut out = Vec::new();
    {
      let mut encoder = gif::Encoder::new(StdCursor::new(&mut out), width, height, palette).unwrap();
      for (left, top, w, h, raster, transparent, dispose) in frames {
        let mut frame = gif::Frame::from_indexed_pixels(w, h, raster, transparent);
        frame.left = left;
        frame.top = top;
        frame.dispose = dispose;
        encoder.write_frame(&frame).unwrap();
      }
    }
    out
  }

  #[test]
  fn s1_single_frame_static() {
    let bytes = encode_test_gif(
      2,
      2,
      &[255, 0, 0, 0, 255, 0],
      vec![(0, 0, 2, 2, vec![0, 1, 1, 0], None, gif::DisposalMethod::Any)],
    );
    let mut decoder = Decoder::open(&bytes, None).unwrap();
    let mut canvas = vec![0u8; 2 * 2 * 4];
    decoder.render_impl(0, &mut canvas).unwrap();
    assert_eq!(canvas, vec![0, 0, 255, 255, 0, 255, 0, 255, 0, 255, 0, 255, 0, 0, 255, 255]);
  }

  #[test]
  fn s2_transparency_preserves_background() {
    let bytes = encode_test_gif(
      1,
      2,
      &[10, 20, 30, 40, 50, 60],
      vec![(0, 0, 1, 2, vec![0, 1], Some(1), gif::DisposalMethod::Any)],
    );
    let mut decoder = Decoder::open(&bytes, None).unwrap();
    let mut canvas = vec![0u8; 1 * 2 * 4];
    decoder.render_impl(0, &mut canvas).unwrap();
    assert_eq!(canvas, vec![30, 20, 10, 255, 30, 20, 10, 255]);
  }

  #[test]
  fn s3_dispose_background_then_overwrite() {
    let bytes = encode_test_gif(
      4,
      1,
      &[255, 0, 0, 0, 255, 0],
      vec![
        (0, 0, 4, 1, vec![0, 0, 0, 0], None, gif::DisposalMethod::Background),
        (1, 0, 2, 1, vec![1, 1], None, gif::DisposalMethod::Any),
      ],
    );
    let mut decoder = Decoder::open(&bytes, None).unwrap();
    let mut canvas = vec![0u8; 4 * 1 * 4];
    decoder.render_impl(0, &mut canvas).unwrap();
    decoder.render_impl(1, &mut canvas).unwrap();
    let red = [0u8, 0, 255, 255];
    let green = [0u8, 255, 0, 255];
    let mut expected = Vec::new();
    expected.extend_from_slice(&red);
    expected.extend_from_slice(&green);
    expected.extend_from_slice(&green);
    expected.extend_from_slice(&red);
    assert_eq!(canvas, expected);
  }

  #[test]
  fn bounds_property_rejects_overflowing_frame_rectangle() {
    // Frame rectangle (left=1, width=2) overflows a 2-wide screen.
    let bytes = encode_test_gif(
      2,
      2,
      &[255, 0, 0, 0, 255, 0],
      vec![(1, 0, 2, 2, vec![0, 1, 1, 0], None, gif::DisposalMethod::Any)],
    );
    let mut decoder = Decoder::open(&bytes, None).unwrap();
    let mut canvas = vec![0u8; 2 * 2 * 4];
    assert!(decoder.render_impl(0, &mut canvas).is_err());
  }

  #[test]
  fn rejects_undersized_caller_canvas() {
    let bytes = encode_test_gif(
      2,
      2,
      &[255, 0, 0, 0, 255, 0],
      vec![(0, 0, 2, 2, vec![0, 1, 1, 0], None, gif::DisposalMethod::Any)],
    );
    let mut decoder = Decoder::open(&bytes, None).unwrap();
    let mut too_small = vec![0u8; 1 * 2 * 4];
    assert!(decoder.render_impl(0, &mut too_small).is_err());
  }
}
