//! Per-frame graphic-control metadata: delay, transparency, and disposal.

/// Instructs the renderer how to treat a frame's pixels before the next
/// frame is drawn.
///
/// `DisposePrevious` is accepted on decode and re-emitted on encode, but
/// `Decoder::render` treats it as a no-op (see module docs on
/// `crate::decoder`): fully supporting it requires a shadow canvas across
/// an arbitrary run of non-`DoNotDispose` frames, which this crate does not
/// implement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisposalMode {
  Unspecified,
  DoNotDispose,
  DisposeBackground,
  DisposePrevious,
}

impl From<gif::DisposalMethod> for DisposalMode {
  fn from(value: gif::DisposalMethod) -> Self {
    match value {
      gif::DisposalMethod::Any => DisposalMode::Unspecified,
      gif::DisposalMethod::Keep => DisposalMode::DoNotDispose,
      gif::DisposalMethod::Background => DisposalMode::DisposeBackground,
      gif::DisposalMethod::Previous => DisposalMode::DisposePrevious,
    }
  }
}

impl From<DisposalMode> for gif::DisposalMethod {
  fn from(value: DisposalMode) -> Self {
    match value {
      DisposalMode::Unspecified => gif::DisposalMethod::Any,
      DisposalMode::DoNotDispose => gif::DisposalMethod::Keep,
      DisposalMode::DisposeBackground => gif::DisposalMethod::Background,
      DisposalMode::DisposePrevious => gif::DisposalMethod::Previous,
    }
  }
}

/// Per-frame metadata carried by the graphic control extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphicControl {
  pub delay_centiseconds: u16,
  pub transparent_index: Option<u8>,
  pub disposal_mode: DisposalMode,
  pub needs_user_input: bool,
}

impl Default for GraphicControl {
  fn default() -> Self {
    Self {
      delay_centiseconds: 0,
      transparent_index: None,
      disposal_mode: DisposalMode::Unspecified,
      needs_user_input: false,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn disposal_round_trips_through_gif_crate_type() {
    for mode in [
      DisposalMode::Unspecified,
      DisposalMode::DoNotDispose,
      DisposalMode::DisposeBackground,
      DisposalMode::DisposePrevious,
    ] {
      let raw: gif::DisposalMethod = mode.into();
      let back: DisposalMode = raw.into();
      assert_eq!(mode, back);
    }
  }
}
