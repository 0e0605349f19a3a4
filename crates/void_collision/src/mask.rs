//! Collision masks
//!
//! Every collider carries a 16-bit mask. A query mask of zero matches every
//! collider; otherwise the two masks must share at least one bit.

use serde::{Deserialize, Serialize};
use std::ops::{BitAnd, BitOr, BitOrAssign};

/// Bit set of collision layers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CollisionMask(pub u16);

impl CollisionMask {
    /// Query wildcard, and the mask of a collider that only wildcard queries see
    pub const ANY: Self = Self(0);
    /// Every layer
    pub const ALL: Self = Self(u16::MAX);

    /// Mask with the single layer `n` set (0-15)
    #[inline]
    pub const fn layer(n: u8) -> Self {
        Self(1 << (n & 15))
    }

    /// Raw bits
    #[inline]
    pub const fn bits(self) -> u16 {
        self.0
    }

    /// Check if a collider with this mask is visible to a query with `query`
    #[inline]
    pub const fn matches_query(self, query: CollisionMask) -> bool {
        query.0 == 0 || self.0 & query.0 != 0
    }
}

impl From<u16> for CollisionMask {
    fn from(bits: u16) -> Self {
        Self(bits)
    }
}

impl BitOr for CollisionMask {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for CollisionMask {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for CollisionMask {
    type Output = Self;
    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_matching() {
        let collider = CollisionMask(0x1);
        assert!(!collider.matches_query(CollisionMask(0x2)));
        assert!(collider.matches_query(CollisionMask::ANY));
        assert!(collider.matches_query(CollisionMask(0x3)));
        assert!(CollisionMask::ANY.matches_query(CollisionMask::ANY));
        assert!(!CollisionMask::ANY.matches_query(CollisionMask::ALL));
    }

    #[test]
    fn test_layers() {
        let mask = CollisionMask::layer(0) | CollisionMask::layer(4);
        assert_eq!(mask.bits(), 0b1_0001);
        assert_eq!((mask & CollisionMask::layer(4)).bits(), 0b1_0000);
        assert_eq!(CollisionMask::layer(15).bits(), 0x8000);
    }
}
