//! Fixed-width `f32` vectors used by the binary kernels.
//!
//! Two widths exist, matching the two host capabilities:
//!
//! - [`F32x4`] — 128-bit, used for [`Capability::Sse42`](crate::backend::Capability::Sse42)
//! - [`F32x8`] — 256-bit, used for [`Capability::Avx2`](crate::backend::Capability::Avx2)
//!
//! With the `simd` feature on `x86_64`, `F32x4` maps onto SSE registers and
//! `F32x8` onto AVX registers when the build enables `target_feature = "avx"`.
//! Every other configuration uses plain arrays with the same lane semantics,
//! so results never depend on which implementation was compiled in.

/// A vector of `LANES` single-precision floats.
///
/// `load` and `store` touch exactly the first `LANES` elements of the slice and
/// panic if the slice is shorter. Kernels only call them on full chunks.
pub trait Lanes: Copy {
    const LANES: usize;

    fn splat(x: f32) -> Self;

    fn load(src: &[f32]) -> Self;

    fn store(self, dst: &mut [f32]);

    fn add(self, rhs: Self) -> Self;

    fn sub(self, rhs: Self) -> Self;

    fn mul(self, rhs: Self) -> Self;

    fn div(self, rhs: Self) -> Self;

    /// Lane-wise `self > rhs ? self : rhs`.
    fn max(self, rhs: Self) -> Self;

    /// Lane-wise `self < rhs ? self : rhs`.
    fn min(self, rhs: Self) -> Self;
}

macro_rules! portable_lanes {
    ($name:ident, $n:literal) => {
        /// Portable lane vector backed by a plain array.
        #[derive(Debug, Clone, Copy, PartialEq)]
        pub struct $name([f32; $n]);

        impl $name {
            #[inline(always)]
            fn zip(self, rhs: Self, f: impl Fn(f32, f32) -> f32) -> Self {
                Self(core::array::from_fn(|i| f(self.0[i], rhs.0[i])))
            }
        }

        impl Lanes for $name {
            const LANES: usize = $n;

            #[inline(always)]
            fn splat(x: f32) -> Self {
                Self([x; $n])
            }

            #[inline(always)]
            fn load(src: &[f32]) -> Self {
                let mut lanes = [0.0; $n];
                lanes.copy_from_slice(&src[..$n]);
                Self(lanes)
            }

            #[inline(always)]
            fn store(self, dst: &mut [f32]) {
                dst[..$n].copy_from_slice(&self.0);
            }

            #[inline(always)]
            fn add(self, rhs: Self) -> Self {
                self.zip(rhs, |a, b| a + b)
            }

            #[inline(always)]
            fn sub(self, rhs: Self) -> Self {
                self.zip(rhs, |a, b| a - b)
            }

            #[inline(always)]
            fn mul(self, rhs: Self) -> Self {
                self.zip(rhs, |a, b| a * b)
            }

            #[inline(always)]
            fn div(self, rhs: Self) -> Self {
                self.zip(rhs, |a, b| a / b)
            }

            #[inline(always)]
            fn max(self, rhs: Self) -> Self {
                self.zip(rhs, |a, b| if a > b { a } else { b })
            }

            #[inline(always)]
            fn min(self, rhs: Self) -> Self {
                self.zip(rhs, |a, b| if a < b { a } else { b })
            }
        }
    };
}

#[cfg(not(all(feature = "simd", target_arch = "x86_64")))]
portable_lanes!(F32x4, 4);

#[cfg(not(all(feature = "simd", target_arch = "x86_64", target_feature = "avx")))]
portable_lanes!(F32x8, 8);

#[cfg(all(feature = "simd", target_arch = "x86_64"))]
pub use self::sse::F32x4;

#[cfg(all(feature = "simd", target_arch = "x86_64", target_feature = "avx"))]
pub use self::avx::F32x8;

#[cfg(all(feature = "simd", target_arch = "x86_64"))]
#[allow(unused_unsafe)]
mod sse {
    use super::Lanes;
    use core::arch::x86_64::*;

    /// Four lanes in one SSE register.
    #[derive(Clone, Copy)]
    pub struct F32x4(__m128);

    impl Lanes for F32x4 {
        const LANES: usize = 4;

        #[inline(always)]
        fn splat(x: f32) -> Self {
            Self(unsafe { _mm_set1_ps(x) })
        }

        #[inline(always)]
        fn load(src: &[f32]) -> Self {
            let src = &src[..4];
            // SAFETY: `src` holds exactly four initialized floats; loadu has no alignment requirement.
            Self(unsafe { _mm_loadu_ps(src.as_ptr()) })
        }

        #[inline(always)]
        fn store(self, dst: &mut [f32]) {
            let dst = &mut dst[..4];
            // SAFETY: `dst` has room for exactly four floats.
            unsafe { _mm_storeu_ps(dst.as_mut_ptr(), self.0) }
        }

        #[inline(always)]
        fn add(self, rhs: Self) -> Self {
            Self(unsafe { _mm_add_ps(self.0, rhs.0) })
        }

        #[inline(always)]
        fn sub(self, rhs: Self) -> Self {
            Self(unsafe { _mm_sub_ps(self.0, rhs.0) })
        }

        #[inline(always)]
        fn mul(self, rhs: Self) -> Self {
            Self(unsafe { _mm_mul_ps(self.0, rhs.0) })
        }

        #[inline(always)]
        fn div(self, rhs: Self) -> Self {
            Self(unsafe { _mm_div_ps(self.0, rhs.0) })
        }

        // maxps/minps return the second source when either lane is NaN.
        #[inline(always)]
        fn max(self, rhs: Self) -> Self {
            Self(unsafe { _mm_max_ps(self.0, rhs.0) })
        }

        #[inline(always)]
        fn min(self, rhs: Self) -> Self {
            Self(unsafe { _mm_min_ps(self.0, rhs.0) })
        }
    }
}

#[cfg(all(feature = "simd", target_arch = "x86_64", target_feature = "avx"))]
#[allow(unused_unsafe)]
mod avx {
    use super::Lanes;
    use core::arch::x86_64::*;

    /// Eight lanes in one AVX register.
    #[derive(Clone, Copy)]
    pub struct F32x8(__m256);

    impl Lanes for F32x8 {
        const LANES: usize = 8;

        #[inline(always)]
        fn splat(x: f32) -> Self {
            Self(unsafe { _mm256_set1_ps(x) })
        }

        #[inline(always)]
        fn load(src: &[f32]) -> Self {
            let src = &src[..8];
            // SAFETY: `src` holds exactly eight initialized floats; loadu has no alignment requirement.
            Self(unsafe { _mm256_loadu_ps(src.as_ptr()) })
        }

        #[inline(always)]
        fn store(self, dst: &mut [f32]) {
            let dst = &mut dst[..8];
            // SAFETY: `dst` has room for exactly eight floats.
            unsafe { _mm256_storeu_ps(dst.as_mut_ptr(), self.0) }
        }

        #[inline(always)]
        fn add(self, rhs: Self) -> Self {
            Self(unsafe { _mm256_add_ps(self.0, rhs.0) })
        }

        #[inline(always)]
        fn sub(self, rhs: Self) -> Self {
            Self(unsafe { _mm256_sub_ps(self.0, rhs.0) })
        }

        #[inline(always)]
        fn mul(self, rhs: Self) -> Self {
            Self(unsafe { _mm256_mul_ps(self.0, rhs.0) })
        }

        #[inline(always)]
        fn div(self, rhs: Self) -> Self {
            Self(unsafe { _mm256_div_ps(self.0, rhs.0) })
        }

        #[inline(always)]
        fn max(self, rhs: Self) -> Self {
            Self(unsafe { _mm256_max_ps(self.0, rhs.0) })
        }

        #[inline(always)]
        fn min(self, rhs: Self) -> Self {
            Self(unsafe { _mm256_min_ps(self.0, rhs.0) })
        }
    }
}
