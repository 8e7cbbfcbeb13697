//! Identifier newtypes used throughout the engine.
//!
//! These follow the `ValidatedX` pattern: construction validates the
//! invariant once, and every later consumer gets a value that cannot be in
//! an invalid state.

use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Dense, monotonically assigned node identifier. `u64::MAX` is reserved as
/// a sentinel for "no node" and is never handed out by the allocator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId {
    inner: u64,
}

impl NodeId {
    pub const INVALID: NodeId = NodeId { inner: u64::MAX };

    pub fn new(id: u64) -> Result<Self> {
        ensure!(id != u64::MAX, "node id {} collides with the INVALID sentinel", id);
        Ok(Self { inner: id })
    }

    pub fn get(&self) -> u64 {
        self.inner
    }

    pub fn is_valid(&self) -> bool {
        self.inner != u64::MAX
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.inner)
    }
}

/// Dense edge identifier, same sentinel convention as `NodeId`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EdgeId {
    inner: u64,
}

impl EdgeId {
    pub const INVALID: EdgeId = EdgeId { inner: u64::MAX };

    pub fn new(id: u64) -> Result<Self> {
        ensure!(id != u64::MAX, "edge id {} collides with the INVALID sentinel", id);
        Ok(Self { inner: id })
    }

    pub fn get(&self) -> u64 {
        self.inner
    }

    pub fn is_valid(&self) -> bool {
        self.inner != u64::MAX
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.inner)
    }
}

/// Interned attribute name id (a key in a graph entity's `AttributeSet`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AttrId {
    inner: u16,
}

impl AttrId {
    pub const NONE: AttrId = AttrId { inner: u16::MAX };

    pub fn new(id: u16) -> Result<Self> {
        ensure!(id != u16::MAX, "attribute id {} collides with the NONE sentinel", id);
        Ok(Self { inner: id })
    }

    pub fn get(&self) -> u16 {
        self.inner
    }
}

impl fmt::Display for AttrId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.inner)
    }
}

/// Interned label id, indexes into the store's `M_L` label matrix set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LabelId {
    inner: u16,
}

impl LabelId {
    pub fn new(id: u16) -> Self {
        Self { inner: id }
    }

    pub fn get(&self) -> u16 {
        self.inner
    }
}

impl fmt::Display for LabelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.inner)
    }
}

/// Interned relationship-type id, indexes into the store's `A_R` matrices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RelTypeId {
    inner: u16,
}

impl RelTypeId {
    pub fn new(id: u16) -> Self {
        Self { inner: id }
    }

    pub fn get(&self) -> u16 {
        self.inner
    }
}

impl fmt::Display for RelTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.inner)
    }
}

/// A schema name, validated against the identifier grammar labels and
/// relationship types must conform to (non-empty, no null bytes, bounded
/// length — matches what a real parser would already have rejected, kept
/// here as the engine's own defense in depth).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SchemaName {
    inner: String,
}

impl SchemaName {
    const MAX_LENGTH: usize = 512;

    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        ensure!(!name.is_empty(), "schema name cannot be empty");
        ensure!(!name.contains('\0'), "schema name cannot contain null bytes");
        ensure!(
            name.len() <= Self::MAX_LENGTH,
            "schema name exceeds maximum length of {} bytes",
            Self::MAX_LENGTH
        );
        Ok(Self { inner: name })
    }

    pub fn as_str(&self) -> &str {
        &self.inner
    }
}

impl fmt::Display for SchemaName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.inner)
    }
}

/// Direction of traversal across a relation matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Outgoing,
    Incoming,
    Both,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Outgoing => write!(f, "outgoing"),
            Direction::Incoming => write!(f, "incoming"),
            Direction::Both => write!(f, "both"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_id_rejects_sentinel() {
        assert!(NodeId::new(u64::MAX).is_err());
        assert!(NodeId::new(0).is_ok());
        assert_eq!(NodeId::INVALID.is_valid(), false);
    }

    #[test]
    fn edge_id_rejects_sentinel() {
        assert!(EdgeId::new(u64::MAX).is_err());
        assert!(EdgeId::new(7).is_ok());
    }

    #[test]
    fn attr_id_rejects_sentinel() {
        assert!(AttrId::new(u16::MAX).is_err());
        assert_eq!(AttrId::new(3).unwrap().get(), 3);
    }

    #[test]
    fn schema_name_validation() {
        assert!(SchemaName::new("Person").is_ok());
        assert!(SchemaName::new("").is_err());
        assert!(SchemaName::new("bad\0name").is_err());
        assert!(SchemaName::new("x".repeat(1000)).is_err());
    }
}
