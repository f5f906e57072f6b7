use std::error::Error as StdError;
use std::fmt;

use napi::{Error as NapiError, Status};

/// Errors surfaced by the decode/render/encode core, independent of the
/// napi host boundary.
///
/// Every variant corresponds to one of the four failure modes enumerated in
/// the core's error taxonomy: a malformed source stream, a geometry problem
/// discovered while compositing a frame onto a canvas, a geometry problem
/// discovered while quantizing a canvas into a frame, or a rejection from
/// the downstream GIF stream codec during serialization.
#[derive(Debug, Eq, PartialEq, Clone)]
pub enum CoreError {
  /// The input byte stream could not be parsed as a GIF, or a requested
  /// frame index does not exist.
  Parse(String),
  /// `render` aborted: the frame rectangle overflows the screen, or no
  /// effective colormap (local or global) exists for the frame.
  RenderGeometry { frame_index: u32 },
  /// `encode_frame` aborted: the supplied canvas is larger than the
  /// declared screen dimensions, or no effective palette exists.
  EncodeGeometry { frame_index: u32 },
  /// `flush` aborted: the downstream stream codec rejected the assembled
  /// GIF.
  Serialization(String),
}

impl fmt::Display for CoreError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      CoreError::Parse(msg) => write!(f, "failed to parse GIF stream: {msg}"),
      CoreError::RenderGeometry { frame_index } => {
        write!(f, "frame {frame_index} has a rectangle that does not fit the canvas, or no effective colormap")
      }
      CoreError::EncodeGeometry { frame_index } => {
        write!(f, "frame {frame_index} exceeds the declared screen dimensions, or no effective palette exists")
      }
      CoreError::Serialization(msg) => write!(f, "failed to serialize GIF stream: {msg}"),
    }
  }
}

impl StdError for CoreError {}

impl From<CoreError> for NapiError {
  fn from(err: CoreError) -> Self {
    NapiError::new(Status::GenericFailure, err.to_string())
  }
}

pub type CoreResult<T> = Result<T, CoreError>;
