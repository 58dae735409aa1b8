//! Stable 64-bit signatures.
//!
//! Signatures identify block masks and memoised validator inputs. They are
//! derived from a SHA-256 digest so that they stay identical across runs,
//! platforms, and compiler versions, unlike [`std::hash::Hash`].

use hidato_core::Position;
use sha2::{Digest as _, Sha256};

/// Incrementally builds a stable signature.
///
/// # Examples
///
/// ```
/// use hidato_core::Position;
/// use hidato_solver::signature::SignatureBuilder;
///
/// let a = SignatureBuilder::new("mask").u32(6).position(Position::new(1, 2)).finish();
/// let b = SignatureBuilder::new("mask").u32(6).position(Position::new(1, 2)).finish();
/// assert_eq!(a, b);
/// ```
#[derive(Debug, Clone)]
pub struct SignatureBuilder {
    hasher: Sha256,
}

impl SignatureBuilder {
    /// Starts a signature in the given domain.
    ///
    /// Signatures built in different domains never collide by construction of
    /// their input.
    #[must_use]
    pub fn new(domain: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(u32::try_from(domain.len()).unwrap_or(u32::MAX).to_le_bytes());
        hasher.update(domain.as_bytes());
        Self { hasher }
    }

    /// Appends a number.
    #[must_use]
    pub fn u32(mut self, value: u32) -> Self {
        self.hasher.update(value.to_le_bytes());
        self
    }

    /// Appends a position.
    #[must_use]
    pub fn position(mut self, pos: Position) -> Self {
        self.hasher.update([pos.row(), pos.col()]);
        self
    }

    /// Finishes the signature.
    #[must_use]
    pub fn finish(self) -> u64 {
        let digest = self.hasher.finalize();
        let mut bytes = [0; 8];
        bytes.copy_from_slice(&digest[..8]);
        u64::from_le_bytes(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domains_differ() {
        let a = SignatureBuilder::new("mask").u32(1).finish();
        let b = SignatureBuilder::new("givens").u32(1).finish();
        assert_ne!(a, b);
    }

    #[test]
    fn test_order_matters() {
        let a = SignatureBuilder::new("x").u32(1).u32(2).finish();
        let b = SignatureBuilder::new("x").u32(2).u32(1).finish();
        assert_ne!(a, b);
    }
}
