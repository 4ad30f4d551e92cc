//! Fibers: the state space of local data over one node.
//!
//! A fiber is a small category: objects are the local data that can
//! live over the node, homs relate them, composition is diagrammatic.
//! Invertible homs may be registered in an inverse table; those are the
//! homs [`Fiber::inverse`] can resolve, and the ones `iso_mk` upstream
//! feeds on.
//!
//! Like the base site, fibers are finite lookup tables with equality by
//! identifier, so transition-data equations are decidable.

use crate::error::FiberError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Opaque identifier for a local datum (an object of a fiber).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjId(pub String);

impl ObjId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for ObjId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque identifier for a hom between local data.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct HomId(pub String);

impl HomId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for HomId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A hom h: source → target between local data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hom {
    pub id: HomId,
    pub source: ObjId,
    pub target: ObjId,
}

impl Hom {
    pub fn new(id: impl Into<String>, source: ObjId, target: ObjId) -> Self {
        Self {
            id: HomId::new(id),
            source,
            target,
        }
    }
}

/// Canonical key for an ordered composable hom pair.
fn composite_key(first: &HomId, second: &HomId) -> String {
    format!("{first}>{second}")
}

/// The state space over one node, presented by finite tables.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Fiber {
    objects: BTreeSet<ObjId>,
    homs: BTreeMap<String, Hom>,
    identities: BTreeMap<ObjId, HomId>,
    composites: BTreeMap<String, HomId>,
    inverses: BTreeMap<HomId, HomId>,
}

impl Fiber {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an object, together with its identity hom `id@<obj>`.
    pub fn add_object(&mut self, id: impl Into<String>) -> ObjId {
        let obj = ObjId::new(id);
        if self.objects.insert(obj.clone()) {
            let ident = Hom::new(format!("id@{obj}"), obj.clone(), obj.clone());
            self.identities.insert(obj.clone(), ident.id.clone());
            self.homs.insert(ident.id.0.clone(), ident);
        }
        obj
    }

    /// Register a hom between two already-registered objects.
    pub fn add_hom(&mut self, hom: Hom) -> Result<HomId, FiberError> {
        if !self.objects.contains(&hom.source) {
            return Err(FiberError::UnknownObject(hom.source.0.clone()));
        }
        if !self.objects.contains(&hom.target) {
            return Err(FiberError::UnknownObject(hom.target.0.clone()));
        }
        if self.homs.contains_key(&hom.id.0) {
            return Err(FiberError::InvalidFiber {
                description: format!("duplicate hom id: {}", hom.id),
            });
        }
        let id = hom.id.clone();
        self.homs.insert(hom.id.0.clone(), hom);
        Ok(id)
    }

    /// Record `first ≫ second = result` in the composition table.
    pub fn set_composite(
        &mut self,
        first: &HomId,
        second: &HomId,
        result: &HomId,
    ) -> Result<(), FiberError> {
        let f = self.hom(first)?.clone();
        let g = self.hom(second)?.clone();
        let r = self.hom(result)?;
        if f.target != g.source {
            return Err(FiberError::NotComposable {
                first: first.0.clone(),
                second: second.0.clone(),
            });
        }
        if r.source != f.source || r.target != g.target {
            return Err(FiberError::InvalidFiber {
                description: format!("composite {first} ≫ {second} = {result} has wrong endpoints"),
            });
        }
        self.composites
            .insert(composite_key(first, second), result.clone());
        Ok(())
    }

    /// Register `forward` and `backward` as mutually inverse.
    ///
    /// Requires the two composites to already resolve to identities.
    pub fn set_inverse(&mut self, forward: &HomId, backward: &HomId) -> Result<(), FiberError> {
        let f = self.hom(forward)?.clone();
        let round = self.compose(forward, backward)?;
        let back = self.compose(backward, forward)?;
        let id_src = self.identity(&f.source)?.clone();
        let id_tgt = self.identity(&f.target)?.clone();
        if round != id_src || back != id_tgt {
            return Err(FiberError::InvalidFiber {
                description: format!("{forward} and {backward} are not mutually inverse"),
            });
        }
        self.inverses.insert(forward.clone(), backward.clone());
        self.inverses.insert(backward.clone(), forward.clone());
        Ok(())
    }

    pub fn hom(&self, id: &HomId) -> Result<&Hom, FiberError> {
        self.homs
            .get(&id.0)
            .ok_or_else(|| FiberError::UnknownHom(id.0.clone()))
    }

    pub fn has_object(&self, obj: &ObjId) -> bool {
        self.objects.contains(obj)
    }

    /// The identity hom on an object.
    pub fn identity(&self, obj: &ObjId) -> Result<&HomId, FiberError> {
        self.identities
            .get(obj)
            .ok_or_else(|| FiberError::UnknownObject(obj.0.clone()))
    }

    /// Whether the given hom is an identity.
    pub fn is_identity(&self, id: &HomId) -> bool {
        self.identities.values().any(|i| i == id)
    }

    /// Diagrammatic composition: `first` then `second`.
    pub fn compose(&self, first: &HomId, second: &HomId) -> Result<HomId, FiberError> {
        let f = self.hom(first)?;
        let g = self.hom(second)?;
        if f.target != g.source {
            return Err(FiberError::NotComposable {
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
            .ok_or_else(|| FiberError::MissingComposite {
                first: first.0.clone(),
                second: second.0.clone(),
            })
    }

    /// The registered inverse of a hom. Identities are their own
    /// inverse; anything else must be in the inverse table.
    pub fn inverse(&self, id: &HomId) -> Result<HomId, FiberError> {
        if self.is_identity(id) {
            return Ok(id.clone());
        }
        self.inverses
            .get(id)
            .cloned()
            .ok_or_else(|| FiberError::NotInvertible(id.0.clone()))
    }

    /// All homs, identities included, in identifier order.
    pub fn homs(&self) -> impl Iterator<Item = &Hom> {
        self.homs.values()
    }

    /// Check closure and associativity of the composition table.
    pub fn validate(&self) -> Result<(), FiberError> {
        for f in self.homs.values() {
            for g in self.homs.values() {
                if f.target != g.source {
                    continue;
                }
                if self.is_identity(&f.id) || self.is_identity(&g.id) {
                    continue;
                }
                if !self.composites.contains_key(&composite_key(&f.id, &g.id)) {
                    return Err(FiberError::MissingComposite {
                        first: f.id.0.clone(),
                        second: g.id.0.clone(),
                    });
                }
            }
        }

        for f in self.homs.values() {
            for g in self.homs.values() {
                if f.target != g.source {
                    continue;
                }
                for h in self.homs.values() {
                    if g.target != h.source {
                        continue;
                    }
                    let left = self.compose(&self.compose(&f.id, &g.id)?, &h.id)?;
                    let right = self.compose(&f.id, &self.compose(&g.id, &h.id)?)?;
                    if left != right {
                        return Err(FiberError::InvalidFiber {
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

    /// One object with a self-inverse twist g (g ≫ g = id).
    fn twist_fiber() -> (Fiber, ObjId, HomId) {
        let mut fiber = Fiber::new();
        let c = fiber.add_object("c");
        let g = fiber.add_hom(Hom::new("g", c.clone(), c.clone())).unwrap();
        let id_c = fiber.identity(&c).unwrap().clone();
        fiber.set_composite(&g, &g, &id_c).unwrap();
        fiber.set_inverse(&g, &g).unwrap();
        (fiber, c, g)
    }

    #[test]
    fn identity_composition() {
        let (fiber, c, g) = twist_fiber();
        let id_c = fiber.identity(&c).unwrap().clone();
        assert_eq!(fiber.compose(&id_c, &g).unwrap(), g);
        assert_eq!(fiber.compose(&g, &id_c).unwrap(), g);
        assert_eq!(fiber.compose(&g, &g).unwrap(), id_c);
    }

    #[test]
    fn self_inverse_twist() {
        let (fiber, _, g) = twist_fiber();
        assert_eq!(fiber.inverse(&g).unwrap(), g);
    }

    #[test]
    fn fiber_validates() {
        let (fiber, _, _) = twist_fiber();
        fiber.validate().unwrap();
    }

    #[test]
    fn non_invertible_hom_reported() {
        let mut fiber = Fiber::new();
        let a = fiber.add_object("a");
        let b = fiber.add_object("b");
        let h = fiber.add_hom(Hom::new("h", a, b)).unwrap();
        assert!(matches!(
            fiber.inverse(&h).unwrap_err(),
            FiberError::NotInvertible(_)
        ));
    }

    #[test]
    fn hom_serializes_flat() {
        let h = Hom::new("g", ObjId::new("c"), ObjId::new("c"));
        let json = serde_json::to_value(&h).unwrap();
        assert_eq!(json["id"], "g");
        assert_eq!(json["source"], "c");
        assert_eq!(json["target"], "c");
    }

    #[test]
    fn bad_inverse_rejected() {
        let mut fiber = Fiber::new();
        let a = fiber.add_object("a");
        let b = fiber.add_object("b");
        let h = fiber.add_hom(Hom::new("h", a.clone(), b.clone())).unwrap();
        let k = fiber.add_hom(Hom::new("k", b, a.clone())).unwrap();
        // h ≫ k resolves to a non-identity endomap, not id@a.
        let e = fiber.add_hom(Hom::new("e", a.clone(), a)).unwrap();
        let id_b = fiber.hom(&k).unwrap().source.clone();
        let id_b = fiber.identity(&id_b).unwrap().clone();
        fiber.set_composite(&h, &k, &e).unwrap();
        fiber.set_composite(&k, &h, &id_b).unwrap();
        assert!(fiber.set_inverse(&h, &k).is_err());
    }
}
