//! Vector capability selection.
//!
//! This module defines the vector widths the kernels are compiled for and
//! provides functions to query the host and to pin a preferred width.
//!
//! # Supported Capabilities
//!
//! - `Sse42` — 4 float lanes per step (baseline, always available).
//! - `Avx2` — 8 float lanes per step.
//!
//! The preference is stored globally using an `AtomicU8`. The kernels never
//! write it; only the host does, typically once at startup. When nothing was
//! pinned, [`get_capability`] falls back to what [`Capability::detect`] reports.
//!
//! # Notes
//!
//! The capability only picks the lane count. Whether the lanes map onto real
//! vector registers is decided at compile time by the `simd` feature and the
//! target features, so every capability is safe to request on every host.

use core::convert::TryFrom;
use core::sync::atomic::{AtomicU8, Ordering};
use std::sync::OnceLock;

/// Host vector capability, as far as the binary kernels care.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Hash)]
#[repr(u8)]
pub enum Capability {
    /// 128-bit vectors, 4 lanes (default).
    #[default]
    Sse42 = 0,
    /// 256-bit vectors, 8 lanes.
    Avx2,
}

impl Capability {
    /// Number of `f32` lanes processed per vector step.
    #[must_use]
    pub const fn lanes(self) -> usize {
        match self {
            Self::Sse42 => 4,
            Self::Avx2 => 8,
        }
    }

    /// Queries the host once and caches the answer.
    ///
    /// Reports `Avx2` only on `x86_64` hosts advertising AVX2; everything
    /// else gets the 4-lane baseline.
    pub fn detect() -> Self {
        static DETECTED: OnceLock<Capability> = OnceLock::new();
        *DETECTED.get_or_init(|| {
            #[cfg(target_arch = "x86_64")]
            {
                if std::arch::is_x86_feature_detected!("avx2") {
                    return Capability::Avx2;
                }
            }
            Capability::Sse42
        })
    }
}

impl TryFrom<u8> for Capability {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Sse42),
            1 => Ok(Self::Avx2),
            _ => Err(()),
        }
    }
}

/// Sentinel stored while no capability was pinned.
const UNPINNED: u8 = u8::MAX;

/// Process-wide capability preference.
///
/// Only the host writes this; invocations read it once each.
static PREFERRED_CAPABILITY: AtomicU8 = AtomicU8::new(UNPINNED);

/// Pins the capability used by [`crate::ops::dispatch::forward`].
///
/// # Example
///
/// ```
/// use binary_broadcast::backend::{get_capability, set_capability, Capability};
/// set_capability(Capability::Sse42);
/// assert_eq!(get_capability(), Capability::Sse42);
/// ```
pub fn set_capability(c: Capability) {
    log::debug!("pinning binary kernel capability to {c:?}");
    PREFERRED_CAPABILITY.store(c as u8, Ordering::Release);
}

/// Drops a pinned capability so that detection applies again.
pub fn reset_capability() {
    PREFERRED_CAPABILITY.store(UNPINNED, Ordering::Release);
}

/// Returns the capability in effect.
///
/// The pinned value if there is one, otherwise [`Capability::detect`].
pub fn get_capability() -> Capability {
    Capability::try_from(PREFERRED_CAPABILITY.load(Ordering::Acquire))
        .unwrap_or_else(|()| Capability::detect())
}
