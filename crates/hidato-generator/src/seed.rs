use std::{
    fmt::{self, Display},
    str::FromStr,
};

use rand::SeedableRng as _;
use rand_pcg::Pcg64;
use sha2::{Digest as _, Sha256};

/// A 32-byte seed that reproduces a generation run.
///
/// Seeds display as 64 lowercase hex digits and parse from the same form. A
/// seed can also be derived from a `u64`, which is how configuration seeds
/// enter the pipeline.
///
/// # Examples
///
/// ```
/// use hidato_generator::PuzzleSeed;
///
/// let seed = PuzzleSeed::from_u64(42);
/// let parsed: PuzzleSeed = seed.to_string().parse()?;
/// assert_eq!(seed, parsed);
/// # Ok::<(), hidato_generator::SeedError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct PuzzleSeed([u8; 32]);

impl PuzzleSeed {
    /// Creates a seed from raw bytes.
    #[must_use]
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Derives a seed from a `u64` by hashing it.
    #[must_use]
    pub fn from_u64(value: u64) -> Self {
        let digest = Sha256::new()
            .chain_update(b"hidato-seed")
            .chain_update(value.to_le_bytes())
            .finalize();
        let mut bytes = [0; 32];
        bytes.copy_from_slice(&digest);
        Self(bytes)
    }

    /// Returns the raw bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Returns a generator seeded from this seed.
    #[must_use]
    pub fn rng(&self) -> Pcg64 {
        Pcg64::from_seed(self.0)
    }
}

impl From<u64> for PuzzleSeed {
    fn from(value: u64) -> Self {
        Self::from_u64(value)
    }
}

impl Display for PuzzleSeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

/// Error returned when parsing a [`PuzzleSeed`].
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum SeedError {
    /// The text is not 64 characters long.
    #[display("seed must be 64 hex digits, got {len}")]
    InvalidLength {
        /// Length of the input.
        len: usize,
    },
    /// The text contains a non-hex character.
    #[display("invalid hex digit {ch:?} in seed")]
    InvalidDigit {
        /// The offending character.
        ch: char,
    },
}

impl FromStr for PuzzleSeed {
    type Err = SeedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 64 {
            return Err(SeedError::InvalidLength { len: s.len() });
        }
        let mut bytes = [0; 32];
        let mut digits = s.chars().map(|ch| {
            ch.to_digit(16)
                .and_then(|d| u8::try_from(d).ok())
                .ok_or(SeedError::InvalidDigit { ch })
        });
        for byte in &mut bytes {
            let (Some(hi), Some(lo)) = (digits.next(), digits.next()) else {
                return Err(SeedError::InvalidLength { len: s.len() });
            };
            *byte = (hi? << 4) | lo?;
        }
        Ok(Self(bytes))
    }
}
