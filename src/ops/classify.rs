//! Broadcast topology classification.
//!
//! Given two operand shapes and their broadcast shape, [`classify`] decides
//! which traversal pattern relates them and whether the logically first
//! operand is the broadcast one (the swap flag). The classification is cheap
//! and recomputed on every invocation.
//!
//! A classification names a loop shape, and each specialized loop assumes a
//! fixed layout of the broadcast operand. [`Classification::fits`] verifies that
//! layout against the concrete shapes; pairs that do not fit run on the
//! general engine instead.

use crate::tensors::{count, count_from, equal_from, pad_shape};

/// Strided traversal pattern relating two operand shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BroadcastType {
    /// Identical shapes, one contiguous pass.
    Normal,
    /// One operand holds a single element.
    Single,
    /// One operand holds one value per channel, `[C, 1, 1]`-like.
    Channel,
    /// Shapes differ only in the batch dimension.
    Element,
    /// Shapes differ only in batch and channel.
    HeightWidth,
    /// Shapes differ in batch, channel and height; width matches.
    Width,
    /// Anything else.
    General,
}

/// Result of [`classify`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub kind: BroadcastType,
    /// True when the first operand is the broadcast (smaller) one.
    pub swap: bool,
}

impl Classification {
    const fn new(kind: BroadcastType, swap: bool) -> Self {
        Self { kind, swap }
    }

    /// Whether the specialized loop for this classification computes the
    /// broadcast of `lhs` and `rhs` into an output of shape `out` exactly.
    ///
    /// `full` is the broadcast shape of `lhs` and `rhs`. The loops read the
    /// non-broadcast operand with the full layout and the broadcast operand
    /// with one fixed layout per kind:
    ///
    /// | kind          | broadcast operand, right-aligned to `full` |
    /// |---------------|--------------------------------------------|
    /// | `Single`      | one element                                |
    /// | `Channel`     | `[1, C, 1, ..]`, rank 2 to 4               |
    /// | `Element`     | `[1, ..]`, same rank                       |
    /// | `HeightWidth` | `[1, 1, ..]`                               |
    /// | `Width`       | `[1, 1, 1, W]`, rank 4                     |
    #[must_use]
    pub fn fits(&self, out: &[usize], full: &[usize], lhs: &[usize], rhs: &[usize]) -> bool {
        if out != full {
            return false;
        }
        let (big, small) = if self.swap { (rhs, lhs) } else { (lhs, rhs) };
        if self.kind == BroadcastType::Normal {
            return lhs == rhs && lhs == full;
        }
        if big != full {
            return false;
        }

        let rank = full.len();
        let padded = pad_shape(small, rank);
        let unit = |range: core::ops::Range<usize>| padded[range].iter().all(|&d| d == 1);

        match self.kind {
            BroadcastType::Single => count(small) == 1,
            BroadcastType::Channel => {
                (2..=4).contains(&rank) && padded[0] == 1 && padded[1] == full[1] && unit(2..rank)
            }
            BroadcastType::Element => {
                small.len() == rank && rank > 0 && small[0] == 1 && small[1..] == full[1..]
            }
            BroadcastType::HeightWidth => rank >= 2 && unit(0..2) && padded[2..] == full[2..],
            BroadcastType::Width => rank == 4 && unit(0..3) && padded[3] == full[3],
            BroadcastType::Normal | BroadcastType::General => false,
        }
    }
}

/// Classifies the pair `(a, b)` whose broadcast shape is `full`.
///
/// Checks run in priority order and the first match wins:
///
/// 1. `a == b` gives `Normal`.
/// 2. Equal apart from dim 0 gives `Element`, swapped when `a[0] < b[0]`.
/// 3. Equal apart from dims 0..2 gives `HeightWidth`, swapped when `a[1] < b[1]`.
/// 4. Equal apart from dims 0..3 gives `Width`, swapped when `a[1] < b[1]`.
/// 5. Otherwise the operand that is not `full` is the broadcast one (`a` when
///    neither is, with swap set). It is `Single` when it holds one element,
///    `Channel` when it holds `full[1]` elements laid out as `[C, 1, 1]`, and
///    `General` in every other case.
///
/// Total over compatible shapes; never fails.
#[must_use]
pub fn classify(full: &[usize], a: &[usize], b: &[usize]) -> Classification {
    let result = if a == b {
        Classification::new(BroadcastType::Normal, false)
    } else if equal_from(a, b, 1) {
        Classification::new(BroadcastType::Element, a[0] < b[0])
    } else if equal_from(a, b, 2) {
        Classification::new(BroadcastType::HeightWidth, a[1] < b[1])
    } else if equal_from(a, b, 3) {
        // keyed on the channel dim like HeightWidth
        Classification::new(BroadcastType::Width, a[1] < b[1])
    } else {
        let (broadcast, swap) = if a == full { (b, false) } else { (a, true) };
        let n = count(broadcast);
        let rank = broadcast.len();
        let channels = full.get(1).copied();

        let kind = if n == 1 {
            BroadcastType::Single
        } else if channels == Some(n) && rank >= 3 && Some(broadcast[rank - 3]) == channels {
            BroadcastType::Channel
        } else {
            BroadcastType::General
        };
        Classification::new(kind, swap)
    };

    log::debug!(
        "classified {a:?} x {b:?} -> {full:?} as {:?} (swap: {})",
        result.kind,
        result.swap
    );
    result
}

/// Contiguous run length inside one channel of a rank-4 (or lower) layout.
#[inline]
pub(crate) fn channel_stride(full: &[usize]) -> usize {
    count_from(full, 2)
}
