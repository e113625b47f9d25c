use crate::layer_stack::{LayerError, LayerMode, LayerStack};

/// A derived layer which is active while two other layers are both active.
///
/// Ref: <https://docs.qmk.fm/features/tri_layer>
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TriLayer {
    pub lower: u8,
    pub raise: u8,
    pub adjust: u8,
}

impl TriLayer {
    pub const fn new(lower: u8, raise: u8, adjust: u8) -> Self {
        Self { lower, raise, adjust }
    }

    /// All three layers must exist and be different
    pub fn is_valid(&self, num_layer: usize) -> bool {
        let in_range = [self.lower, self.raise, self.adjust]
            .iter()
            .all(|&l| (l as usize) < num_layer);
        in_range && self.lower != self.raise && self.lower != self.adjust && self.raise != self.adjust
    }

    /// Push or pop the adjust layer after a layer change.
    ///
    /// While it's active, the adjust layer is kept above both halves.
    pub fn update(&self, stack: &mut LayerStack) -> Result<(), LayerError> {
        let both = stack.is_active(self.lower) && stack.is_active(self.raise);
        match (both, stack.index_of(self.adjust, LayerMode::Tri)) {
            (true, None) => {
                debug!("Both layer {} and {} are active, activate layer {}", self.lower, self.raise, self.adjust);
                stack.activate(self.adjust, LayerMode::Tri)?;
            }
            (true, Some(i)) => {
                let below_half = [self.lower, self.raise]
                    .iter()
                    .any(|&l| stack.top_index(l).is_some_and(|h| h > i));
                if below_half {
                    stack.raise(self.adjust, LayerMode::Tri);
                }
            }
            (false, Some(_)) => {
                debug!("Deactivate tri layer {}", self.adjust);
                stack.clear(self.adjust, LayerMode::Tri);
            }
            (false, None) => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validity() {
        assert!(TriLayer::new(1, 2, 3).is_valid(4));
        assert!(!TriLayer::new(1, 2, 4).is_valid(4));
        assert!(!TriLayer::new(1, 1, 3).is_valid(4));
        assert!(!TriLayer::new(1, 2, 2).is_valid(4));
    }

    #[test]
    fn test_derived_layer_follows_halves() {
        let tri = TriLayer::new(1, 2, 3);
        let mut stack = LayerStack::new(0);

        stack.activate(1, LayerMode::Momentary).unwrap();
        tri.update(&mut stack).unwrap();
        assert!(!stack.is_active(3));

        stack.activate(2, LayerMode::Toggle).unwrap();
        tri.update(&mut stack).unwrap();
        assert!(stack.is_active_in(3, LayerMode::Tri));
        assert_eq!(stack.highest_layer(), 3);

        // Re-pressing a half keeps the adjust layer on top
        stack.activate(1, LayerMode::Momentary).unwrap();
        tri.update(&mut stack).unwrap();
        assert_eq!(stack.highest_layer(), 3);

        stack.toggle(2).unwrap();
        tri.update(&mut stack).unwrap();
        assert!(!stack.is_active(3));
        assert!(stack.is_active(1));
    }
}
