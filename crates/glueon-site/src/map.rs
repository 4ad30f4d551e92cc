//! Nodes and maps of the base domain.
//!
//! The base is a category C with objects ("nodes") and morphisms
//! ("maps"). A map f: Y → X is a way of reaching the node X from the
//! node Y; transporting local data happens contravariantly along maps.
//!
//! Maps carry stable identifiers. Equality of maps is equality of
//! identifiers: the [`Site`](crate::Site) composition table is keyed by
//! identifier pairs, so every equation between composites is decidable.

use serde::{Deserialize, Serialize};

/// Opaque identifier for a node of the base domain.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque identifier for a map of the base domain.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MapId(pub String);

impl MapId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for MapId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A map f: source → target in the base domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Map {
    pub id: MapId,

    /// The node the map starts from (Y in f: Y → X).
    pub source: NodeId,

    /// The node the map lands in (X in f: Y → X).
    pub target: NodeId,
}

impl Map {
    pub fn new(id: impl Into<String>, source: NodeId, target: NodeId) -> Self {
        Self {
            id: MapId::new(id),
            source,
            target,
        }
    }

    /// Whether this map is an endomap (source and target coincide).
    ///
    /// Identity maps are endomaps; the converse is decided by the
    /// [`Site`](crate::Site) identity table, not here.
    pub fn is_endo(&self) -> bool {
        self.source == self.target
    }
}
