//! An ordered sequence of up to 256 (R, G, B) entries, stored flat to match
//! the byte layout `gif::Frame::palette` and `gif::Decoder::global_palette`
//! already use.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorMap {
  /// Flat RGB triples, length `3 * count()`.
  rgb: Vec<u8>,
}

impl ColorMap {
  pub fn from_rgb_bytes(rgb: Vec<u8>) -> Self {
    Self { rgb }
  }

  pub fn count(&self) -> usize {
    self.rgb.len() / 3
  }

  pub fn get(&self, index: usize) -> Option<(u8, u8, u8)> {
    let start = index * 3;
    self.rgb.get(start..start + 3).map(|c| (c[0], c[1], c[2]))
  }

  pub fn as_rgb_bytes(&self) -> &[u8] {
    &self.rgb
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn counts_and_indexes_entries() {
    let cmap = ColorMap::from_rgb_bytes(vec![255, 0, 0, 0, 255, 0]);
    assert_eq!(cmap.count(), 2);
    assert_eq!(cmap.get(0), Some((255, 0, 0)));
    assert_eq!(cmap.get(1), Some((0, 255, 0)));
    assert_eq!(cmap.get(2), None);
  }
}
