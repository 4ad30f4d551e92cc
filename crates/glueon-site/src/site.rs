//! Finite presentation of the base category.
//!
//! A [`Site`] holds the nodes, the maps with their endpoints, one
//! identity map per node, and an explicit composition table over the
//! non-identity composable pairs. Composition is written diagrammatically:
//! `compose(f, g)` is "f then g" (g ∘ f).
//!
//! Keeping the whole category in tables makes every equation between
//! maps decidable by identifier comparison, which is what the gluing
//! laws downstream are checked against.

use crate::error::SiteError;
use crate::map::{Map, MapId, NodeId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Canonical key for an ordered composable pair.
fn composite_key(first: &MapId, second: &MapId) -> String {
    format!("{first}>{second}")
}

/// The base category, presented by finite tables.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Site {
    /// All nodes.
    nodes: BTreeSet<NodeId>,

    /// All maps, identities included.
    maps: BTreeMap<String, Map>,

    /// Identity map per node.
    identities: BTreeMap<NodeId, MapId>,

    /// Composition table over non-identity composable pairs.
    /// Key is `composite_key(first, second)` for "first then second".
    composites: BTreeMap<String, MapId>,
}

impl Site {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a node, together with its identity map.
    ///
    /// The identity map is named `id@<node>`.
    pub fn add_node(&mut self, id: impl Into<String>) -> NodeId {
        let node = NodeId::new(id);
        if self.nodes.insert(node.clone()) {
            let ident = Map::new(format!("id@{node}"), node.clone(), node.clone());
            self.identities.insert(node.clone(), ident.id.clone());
            self.maps.insert(ident.id.0.clone(), ident);
        }
        node
    }

    /// Register a map between two already-registered nodes.
    pub fn add_map(&mut self, map: Map) -> Result<MapId, SiteError> {
        if !self.nodes.contains(&map.source) {
            return Err(SiteError::UnknownNode(map.source.0.clone()));
        }
        if !self.nodes.contains(&map.target) {
            return Err(SiteError::UnknownNode(map.target.0.clone()));
        }
        if self.maps.contains_key(&map.id.0) {
            return Err(SiteError::InvalidSite {
                description: format!("duplicate map id: {}", map.id),
            });
        }
        let id = map.id.clone();
        self.maps.insert(map.id.0.clone(), map);
        Ok(id)
    }

    /// Record `first ≫ second = result` in the composition table.
    pub fn set_composite(
        &mut self,
        first: &MapId,
        second: &MapId,
        result: &MapId,
    ) -> Result<(), SiteError> {
        let f = self.map(first)?.clone();
        let g = self.map(second)?.clone();
        let r = self.map(result)?;
        if f.target != g.source {
            return Err(SiteError::NotComposable {
                first: first.0.clone(),
                second: second.0.clone(),
            });
        }
        if r.source != f.source || r.target != g.target {
            return Err(SiteError::InvalidSite {
                description: format!(
                    "composite {first} ≫ {second} = {result} has wrong endpoints"
                ),
            });
        }
        self.composites
            .insert(composite_key(first, second), result.clone());
        Ok(())
    }

    /// Look up a map by identifier.
    pub fn map(&self, id: &MapId) -> Result<&Map, SiteError> {
        self.maps
            .get(&id.0)
            .ok_or_else(|| SiteError::UnknownMap(id.0.clone()))
    }

    /// The identity map on a node.
    pub fn identity(&self, node: &NodeId) -> Result<&MapId, SiteError> {
        self.identities
            .get(node)
            .ok_or_else(|| SiteError::UnknownNode(node.0.clone()))
    }

    /// Whether the given map is an identity.
    pub fn is_identity(&self, id: &MapId) -> bool {
        self.identities.values().any(|i| i == id)
    }

    /// Diagrammatic composition: `first` then `second`.
    ///
    /// Identities compose implicitly; non-identity pairs must have an
    /// entry in the composition table.
    pub fn compose(&self, first: &MapId, second: &MapId) -> Result<MapId, SiteError> {
        let f = self.map(first)?;
        let g = self.map(second)?;
        if f.target != g.source {
            return Err(SiteError::NotComposable {
                first: first.0.clone(),
                second: second.0.clone(),
            });
        }
        if self.is_identity(first) {
            return Ok(second.clone());
        }
        if self.is_identity(second) {
            return Ok(first.clone());
        }
        self.composites
            .get(&composite_key(first, second))
            .cloned()
            .ok_or_else(|| SiteError::MissingComposite {
                first: first.0.clone(),
                second: second.0.clone(),
            })
    }

    /// All maps, identities included, in identifier order.
    pub fn maps(&self) -> impl Iterator<Item = &Map> {
        self.maps.values()
    }

    /// All maps landing in the given node.
    pub fn maps_into(&self, target: &NodeId) -> Vec<&Map> {
        self.maps.values().filter(|m| &m.target == target).collect()
    }

    /// All nodes in identifier order.
    pub fn nodes(&self) -> impl Iterator<Item = &NodeId> {
        self.nodes.iter()
    }

    /// Check the category laws on the stored tables:
    /// every composable non-identity pair has a composite, and
    /// composition is associative wherever defined.
    pub fn validate(&self) -> Result<(), SiteError> {
        for f in self.maps.values() {
            for g in self.maps.values() {
                if f.target != g.source {
                    continue;
                }
                if self.is_identity(&f.id) || self.is_identity(&g.id) {
                    continue;
                }
                if !self.composites.contains_key(&composite_key(&f.id, &g.id)) {
                    return Err(SiteError::MissingComposite {
                        first: f.id.0.clone(),
                        second: g.id.0.clone(),
                    });
                }
            }
        }

        for f in self.maps.values() {
            for g in self.maps.values() {
                if f.target != g.source {
                    continue;
                }
                for h in self.maps.values() {
                    if g.target != h.source {
                        continue;
                    }
                    let left = self.compose(&self.compose(&f.id, &g.id)?, &h.id)?;
                    let right = self.compose(&f.id, &self.compose(&g.id, &h.id)?)?;
                    if left != right {
                        return Err(SiteError::InvalidSite {
                            description: format!(
                                "associativity fails on {} ≫ {} ≫ {}: {left} vs {right}",
                                f.id, g.id, h.id
                            ),
                        });
                    }
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_step_site() -> (Site, MapId, MapId, MapId) {
        let mut site = Site::new();
        let a = site.add_node("a");
        let b = site.add_node("b");
        let c = site.add_node("c");
        let f = site.add_map(Map::new("f", a.clone(), b.clone())).unwrap();
        let g = site.add_map(Map::new("g", b, c.clone())).unwrap();
        let fg = site.add_map(Map::new("fg", a, c)).unwrap();
        site.set_composite(&f, &g, &fg).unwrap();
        (site, f, g, fg)
    }

    #[test]
    fn identity_composition_is_implicit() {
        let (site, f, _, _) = two_step_site();
        let a = NodeId::new("a");
        let b = NodeId::new("b");
        let id_a = site.identity(&a).unwrap().clone();
        let id_b = site.identity(&b).unwrap().clone();
        assert_eq!(site.compose(&id_a, &f).unwrap(), f);
        assert_eq!(site.compose(&f, &id_b).unwrap(), f);
    }

    #[test]
    fn table_composition() {
        let (site, f, g, fg) = two_step_site();
        assert_eq!(site.compose(&f, &g).unwrap(), fg);
        site.validate().unwrap();
    }

    #[test]
    fn non_composable_rejected() {
        let (site, f, _, _) = two_step_site();
        let err = site.compose(&f, &f).unwrap_err();
        assert!(matches!(err, SiteError::NotComposable { .. }));
    }

    #[test]
    fn missing_composite_detected() {
        let mut site = Site::new();
        let a = site.add_node("a");
        let b = site.add_node("b");
        let c = site.add_node("c");
        let f = site.add_map(Map::new("f", a, b.clone())).unwrap();
        let g = site.add_map(Map::new("g", b, c)).unwrap();
        assert!(matches!(
            site.compose(&f, &g).unwrap_err(),
            SiteError::MissingComposite { .. }
        ));
        assert!(site.validate().is_err());
    }

    #[test]
    fn unknown_endpoints_rejected() {
        let mut site = Site::new();
        let a = site.add_node("a");
        let err = site
            .add_map(Map::new("f", a, NodeId::new("missing")))
            .unwrap_err();
        assert!(matches!(err, SiteError::UnknownNode(_)));
    }
}
