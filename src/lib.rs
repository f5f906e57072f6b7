//! GIF decode/encode core: reconstructs per-frame RGBA canvases from a
//! compressed, palette-indexed animation (honoring transparency, frame
//! rectangles, and disposal), and quantizes RGBA canvases back into a
//! palette-indexed stream that preserves the timing and palette structure
//! of a source GIF.
//!
//! Module layout, leaves first:
//! - [`error`]: the napi-free `CoreError` type and its conversion to
//!   `napi::Error` at the host boundary.
//! - [`canvas`]: the caller-owned BGRA pixel grid (`CanvasView` for
//!   rendering into, `CanvasRef` for reading out of).
//! - [`colormap`]: the flat-RGB `ColorMap` type shared by global and local
//!   palettes.
//! - [`disposal`]: `DisposalMode` and `GraphicControl`, the per-frame
//!   graphic-control metadata.
//! - [`frame`]: the in-memory `Frame` record `Decoder`/`Encoder` build and
//!   consume internally.
//! - [`gif_stream`]: `GifStream`, the decoded-GIF in-memory tree.
//! - [`quantizer`]: the palette-lookup cache and nearest-color quantizer
//!   used by `Encoder::encode_frame`.
//! - [`decoder`]: `Decoder` and `DecoderOptions`, napi-exposed.
//! - [`encoder`]: `Encoder`, napi-exposed.
//!
//! `Decoder`, `Encoder`, and `DecoderOptions` are the only types that cross
//! the napi host boundary; everything else is plain, host-agnostic Rust
//! that can be exercised without a JS runtime (see each module's tests).

#[macro_use]
extern crate napi_derive;

mod canvas;
mod colormap;
mod decoder;
mod disposal;
mod encoder;
mod error;
mod frame;
mod gif_stream;
mod quantizer;

pub use decoder::{Decoder, DecoderOptions};
pub use encoder::Encoder;
pub use error::CoreError;
