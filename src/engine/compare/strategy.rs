//! Chunk equality strategies
//!
//! `ChunkEq` compares two equal-length byte slices. Two implementations:
//! an AVX2 scan over 32-byte lanes (x86_64 only, chosen when the CPU
//! reports support) and a word-at-a-time scalar scan used everywhere else
//! and for the vector tail. `detect` probes once per process.

use std::sync::OnceLock;

/// Byte-range equality check
pub trait ChunkEq: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &'static str;

    /// `true` iff both slices have the same length and contents
    fn equal(&self, a: &[u8], b: &[u8]) -> bool;
}

/// Portable fallback comparing 8 bytes at a time, then the remainder
#[derive(Debug, Clone, Copy, Default)]
pub struct ScalarEq;

impl ChunkEq for ScalarEq {
    fn name(&self) -> &'static str {
        "scalar"
    }

    fn equal(&self, a: &[u8], b: &[u8]) -> bool {
        scalar_equal(a, b)
    }
}

fn scalar_equal(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut words_a = a.chunks_exact(8);
    let mut words_b = b.chunks_exact(8);
    for (wa, wb) in words_a.by_ref().zip(words_b.by_ref()) {
        let wa = u64::from_ne_bytes([wa[0], wa[1], wa[2], wa[3], wa[4], wa[5], wa[6], wa[7]]);
        let wb = u64::from_ne_bytes([wb[0], wb[1], wb[2], wb[3], wb[4], wb[5], wb[6], wb[7]]);
        if wa != wb {
            return false;
        }
    }

    words_a
        .remainder()
        .iter()
        .zip(words_b.remainder())
        .all(|(x, y)| x == y)
}

#[cfg(target_arch = "x86_64")]
pub use avx2::Avx2Eq;

#[cfg(target_arch = "x86_64")]
mod avx2 {
    use super::{ChunkEq, scalar_equal};
    use std::arch::x86_64::{__m256i, _mm256_cmpeq_epi8, _mm256_loadu_si256, _mm256_movemask_epi8};

    const LANES: usize = 32;

    /// AVX2 scan. Only obtainable through `probe`, so the feature is known present.
    #[derive(Debug)]
    pub struct Avx2Eq {
        _probed: (),
    }

    impl Avx2Eq {
        /// `Some` when the running CPU supports AVX2
        #[must_use]
        pub fn probe() -> Option<Self> {
            if std::is_x86_feature_detected!("avx2") {
                Some(Self { _probed: () })
            } else {
                None
            }
        }
    }

    impl ChunkEq for Avx2Eq {
        fn name(&self) -> &'static str {
            "avx2"
        }

        fn equal(&self, a: &[u8], b: &[u8]) -> bool {
            if a.len() != b.len() {
                return false;
            }
            // SAFETY: `Avx2Eq` only exists after `probe` confirmed AVX2 support.
            unsafe { equal_avx2(a, b) }
        }
    }

    #[target_feature(enable = "avx2")]
    unsafe fn equal_avx2(a: &[u8], b: &[u8]) -> bool {
        let len = a.len();
        let mut offset = 0;

        while offset + LANES <= len {
            // SAFETY: offset + 32 <= len for both slices; unaligned loads are allowed.
            let mask = unsafe {
                let va = _mm256_loadu_si256(a.as_ptr().add(offset).cast::<__m256i>());
                let vb = _mm256_loadu_si256(b.as_ptr().add(offset).cast::<__m256i>());
                _mm256_movemask_epi8(_mm256_cmpeq_epi8(va, vb))
            };
            if mask != -1 {
                return false;
            }
            offset += LANES;
        }

        scalar_equal(&a[offset..], &b[offset..])
    }
}

/// Widest strategy the running CPU supports, probed once
#[must_use]
pub fn detect() -> &'static dyn ChunkEq {
    static SELECTED: OnceLock<Box<dyn ChunkEq>> = OnceLock::new();

    SELECTED
        .get_or_init(|| {
            #[cfg(target_arch = "x86_64")]
            {
                if let Some(avx2) = Avx2Eq::probe() {
                    return Box::new(avx2) as Box<dyn ChunkEq>;
                }
            }
            Box::new(ScalarEq)
        })
        .as_ref()
}
