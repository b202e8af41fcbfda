//! Deterministic id assignment for entities the document leaves unnumbered.

use sha2::{Digest, Sha256};

use crate::error::{ConverterError, Result};

/// Separator between seeds, so `["ab", "c"]` and `["a", "bc"]` differ.
const SEED_SEPARATOR: u8 = 0x1f;

/// Maps seed strings to ids in `[min, max)`.
///
/// The mapping is a SHA-256 digest of the seeds, so it is stable across
/// runs, processes and platforms. Distinct seeds may collide.
///
/// # Examples
/// ```
/// use mdorchestra_converter::idgen::IdGenerator;
///
/// let ids = IdGenerator::new(5000, 40000).unwrap();
/// let id = ids.generate(&["SideCodeSet", "Buy"]);
/// assert_eq!(id, ids.generate(&["SideCodeSet", "Buy"]));
/// assert!((5000..40000).contains(&id));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdGenerator {
    min: u32,
    max: u32,
}

impl IdGenerator {
    /// Create a generator; `min` must be below `max`.
    pub fn new(min: u32, max: u32) -> Result<Self> {
        if min >= max {
            return Err(ConverterError::InvalidIdRange { min, max });
        }
        Ok(Self { min, max })
    }

    #[must_use]
    pub fn min(&self) -> u32 {
        self.min
    }

    #[must_use]
    pub fn max(&self) -> u32 {
        self.max
    }

    #[must_use]
    pub fn generate<S: AsRef<str>>(&self, seeds: &[S]) -> u32 {
        let mut hasher = Sha256::new();
        for (i, seed) in seeds.iter().enumerate() {
            if i > 0 {
                hasher.update([SEED_SEPARATOR]);
            }
            hasher.update(seed.as_ref().as_bytes());
        }
        let digest = hasher.finalize();

        let mut prefix = [0u8; 8];
        prefix.copy_from_slice(&digest[..8]);
        let value = u64::from_be_bytes(prefix);

        let span = u64::from(self.max - self.min);
        // value % span < span <= u32::MAX, so the cast is lossless
        self.min + (value % span) as u32
    }
}
