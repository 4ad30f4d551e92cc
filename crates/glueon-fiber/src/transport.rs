//! Transport of local data along base maps.
//!
//! A state-space assignment gives every node X a fiber Def(X) and every
//! map f: Y → X a transport functor f*: Def(X) → Def(Y), pulling local
//! data back contravariantly. Transport respects composition and
//! identity up to coherence isomorphisms, not on the nose:
//!
//!   unit_iso(X, a):      id_X*(a) → a
//!   comp_iso(f, g, a):   f*(g*(a)) → (f ≫ g)*(a)
//!
//! subject to the usual triangle/pentagon identities. The descent layer
//! conjugates by these isos when it normalizes restricted transition
//! data.
//!
//! [`TransportTable`] is the table-backed realization. Its `strict`
//! mode is the common case for finite models: transport composes on the
//! nose and every coherence iso is an identity.

use crate::error::FiberError;
use crate::fiber::{Fiber, HomId, ObjId};
use glueon_site::{Map, MapId, NodeId, Site};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The state-space assignment consumed by the descent layer.
///
/// Implementations move objects and homs along base maps and expose the
/// coherence isomorphisms the gluing laws are normalized by.
pub trait Transport {
    /// The fiber of local data over a node.
    fn fiber(&self, node: &NodeId) -> Result<&Fiber, FiberError>;

    /// Pull an object back along a map: for f: Y → X and a ∈ Def(X),
    /// returns f*(a) ∈ Def(Y).
    fn map_obj(&self, along: &MapId, obj: &ObjId) -> Result<ObjId, FiberError>;

    /// Pull a hom back along a map: for f: Y → X and h: a → b in
    /// Def(X), returns f*(h): f*(a) → f*(b) in Def(Y).
    fn map_hom(&self, along: &MapId, hom: &HomId) -> Result<HomId, FiberError>;

    /// The coherence iso id_X*(a) → a in Def(X).
    fn unit_iso(&self, node: &NodeId, obj: &ObjId) -> Result<HomId, FiberError>;

    /// The coherence iso f*(g*(a)) → (f ≫ g)*(a) in Def(source of f),
    /// for composable f then g.
    fn comp_iso(&self, first: &MapId, second: &MapId, obj: &ObjId) -> Result<HomId, FiberError>;
}

fn unit_key(node: &NodeId, obj: &ObjId) -> String {
    format!("{node}|{obj}")
}

fn comp_key(first: &MapId, second: &MapId, obj: &ObjId) -> String {
    format!("{first}>{second}|{obj}")
}

/// Table-backed state-space assignment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportTable {
    /// Whether transport is strict: functorial on the nose, with all
    /// coherence isos identities.
    strict: bool,

    /// Fiber per node.
    fibers: BTreeMap<NodeId, Fiber>,

    /// Source node of each registered map (where pulled data lands).
    sources: BTreeMap<MapId, NodeId>,

    /// Object assignment per map: obj in Def(target) → obj in Def(source).
    obj_maps: BTreeMap<MapId, BTreeMap<ObjId, ObjId>>,

    /// Hom assignment per map.
    hom_maps: BTreeMap<MapId, BTreeMap<HomId, HomId>>,

    /// Explicit unit isos for non-strict tables, keyed `node|obj`.
    unit_isos: BTreeMap<String, HomId>,

    /// Explicit composition isos for non-strict tables, keyed
    /// `first>second|obj`.
    comp_isos: BTreeMap<String, HomId>,
}

impl TransportTable {
    /// An empty table expecting explicit coherence isos.
    pub fn new() -> Self {
        Self {
            strict: false,
            fibers: BTreeMap::new(),
            sources: BTreeMap::new(),
            obj_maps: BTreeMap::new(),
            hom_maps: BTreeMap::new(),
            unit_isos: BTreeMap::new(),
            comp_isos: BTreeMap::new(),
        }
    }

    /// An empty strict table: coherence isos are synthesized as
    /// identities, and `validate` checks transport composes on the nose.
    pub fn strict() -> Self {
        Self {
            strict: true,
            ..Self::new()
        }
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    pub fn add_fiber(&mut self, node: NodeId, fiber: Fiber) {
        self.fibers.insert(node, fiber);
    }

    /// Assign the transport action of one map, object table and hom
    /// table together.
    pub fn assign(
        &mut self,
        map: &Map,
        objs: Vec<(ObjId, ObjId)>,
        homs: Vec<(HomId, HomId)>,
    ) -> Result<(), FiberError> {
        if !self.fibers.contains_key(&map.source) {
            return Err(FiberError::UnknownFiber(map.source.0.clone()));
        }
        if !self.fibers.contains_key(&map.target) {
            return Err(FiberError::UnknownFiber(map.target.0.clone()));
        }
        self.sources.insert(map.id.clone(), map.source.clone());
        self.obj_maps
            .insert(map.id.clone(), objs.into_iter().collect());
        self.hom_maps
            .insert(map.id.clone(), homs.into_iter().collect());
        Ok(())
    }

    /// Assign the identity functor as the transport action of an
    /// endomap (the usual choice for identity maps in strict tables).
    pub fn assign_identity(&mut self, map: &Map) -> Result<(), FiberError> {
        if map.source != map.target {
            return Err(FiberError::IncoherentTransport {
                description: format!("identity assignment for non-endomap {}", map.id),
            });
        }
        let fiber = self
            .fibers
            .get(&map.source)
            .ok_or_else(|| FiberError::UnknownFiber(map.source.0.clone()))?;
        let objs: Vec<(ObjId, ObjId)> = fiber
            .homs()
            .map(|h| (h.source.clone(), h.source.clone()))
            .chain(fiber.homs().map(|h| (h.target.clone(), h.target.clone())))
            .collect();
        let homs: Vec<(HomId, HomId)> = fiber.homs().map(|h| (h.id.clone(), h.id.clone())).collect();
        self.sources.insert(map.id.clone(), map.source.clone());
        self.obj_maps
            .insert(map.id.clone(), objs.into_iter().collect());
        self.hom_maps
            .insert(map.id.clone(), homs.into_iter().collect());
        Ok(())
    }

    pub fn set_unit_iso(&mut self, node: &NodeId, obj: &ObjId, iso: HomId) {
        self.unit_isos.insert(unit_key(node, obj), iso);
    }

    pub fn set_comp_iso(&mut self, first: &MapId, second: &MapId, obj: &ObjId, iso: HomId) {
        self.comp_isos.insert(comp_key(first, second, obj), iso);
    }

    fn source_of(&self, along: &MapId) -> Result<&NodeId, FiberError> {
        self.sources
            .get(along)
            .ok_or_else(|| FiberError::MissingTransport {
                description: format!("no transport assigned along {along}"),
            })
    }

    /// Check the assignment against the site: every map is covered,
    /// each f* is an honest functor between the right fibers, and (in
    /// strict mode) transport composes on the nose.
    pub fn validate(&self, site: &Site) -> Result<(), FiberError> {
        for node in site.nodes() {
            if !self.fibers.contains_key(node) {
                return Err(FiberError::UnknownFiber(node.0.clone()));
            }
        }

        for map in site.maps() {
            let objs = self
                .obj_maps
                .get(&map.id)
                .ok_or_else(|| FiberError::MissingTransport {
                    description: format!("no object assignment along {}", map.id),
                })?;
            let homs = self
                .hom_maps
                .get(&map.id)
                .ok_or_else(|| FiberError::MissingTransport {
                    description: format!("no hom assignment along {}", map.id),
                })?;
            let upstairs = &self.fibers[&map.target];
            let downstairs = &self.fibers[&map.source];

            for h in upstairs.homs() {
                let image = homs.get(&h.id).ok_or_else(|| FiberError::MissingTransport {
                    description: format!("hom {} has no image along {}", h.id, map.id),
                })?;
                let image_hom = downstairs.hom(image)?;
                let src = objs
                    .get(&h.source)
                    .ok_or_else(|| FiberError::MissingTransport {
                        description: format!("object {} has no image along {}", h.source, map.id),
                    })?;
                let tgt = objs
                    .get(&h.target)
                    .ok_or_else(|| FiberError::MissingTransport {
                        description: format!("object {} has no image along {}", h.target, map.id),
                    })?;
                if &image_hom.source != src || &image_hom.target != tgt {
                    return Err(FiberError::IncoherentTransport {
                        description: format!(
                            "image of {} along {} has endpoints {} → {}, expected {src} → {tgt}",
                            h.id, map.id, image_hom.source, image_hom.target
                        ),
                    });
                }
                if upstairs.is_identity(&h.id) && !downstairs.is_identity(image) {
                    return Err(FiberError::IncoherentTransport {
                        description: format!(
                            "identity {} maps to non-identity {image} along {}",
                            h.id, map.id
                        ),
                    });
                }
            }

            // f* preserves composition within the fiber.
            for f in upstairs.homs() {
                for g in upstairs.homs() {
                    if f.target != g.source {
                        continue;
                    }
                    let upstairs_comp = upstairs.compose(&f.id, &g.id)?;
                    let downstairs_comp =
                        downstairs.compose(&homs[&f.id], &homs[&g.id])?;
                    if homs[&upstairs_comp] != downstairs_comp {
                        return Err(FiberError::IncoherentTransport {
                            description: format!(
                                "transport along {} does not preserve {} ≫ {}",
                                map.id, f.id, g.id
                            ),
                        });
                    }
                }
            }
        }

        if self.strict {
            self.validate_strict(site)?;
        }

        Ok(())
    }

    /// Strictness: id* is the identity assignment and transport along a
    /// composite equals the composite of transports, object by object.
    fn validate_strict(&self, site: &Site) -> Result<(), FiberError> {
        for node in site.nodes() {
            let ident = site
                .identity(node)
                .map_err(|e| FiberError::IncoherentTransport {
                    description: e.to_string(),
                })?;
            let objs = &self.obj_maps[ident];
            for (from, to) in objs {
                if from != to {
                    return Err(FiberError::IncoherentTransport {
                        description: format!("strict table moves {from} to {to} along {ident}"),
                    });
                }
            }
        }

        for f in site.maps() {
            for g in site.maps() {
                if f.target != g.source {
                    continue;
                }
                let composite = site
                    .compose(&f.id, &g.id)
                    .map_err(|e| FiberError::IncoherentTransport {
                        description: e.to_string(),
                    })?;
                let upstairs = &self.fibers[&g.target];
                for h in upstairs.homs() {
                    let stepwise = self.map_obj(&f.id, &self.map_obj(&g.id, &h.source)?)?;
                    let direct = self.map_obj(&composite, &h.source)?;
                    if stepwise != direct {
                        return Err(FiberError::IncoherentTransport {
                            description: format!(
                                "strictness fails on {} along {} ≫ {}: {stepwise} vs {direct}",
                                h.source, f.id, g.id
                            ),
                        });
                    }
                    let hom_stepwise = self.map_hom(&f.id, &self.map_hom(&g.id, &h.id)?)?;
                    let hom_direct = self.map_hom(&composite, &h.id)?;
                    if hom_stepwise != hom_direct {
                        return Err(FiberError::IncoherentTransport {
                            description: format!(
                                "strictness fails on {} along {} ≫ {}: {hom_stepwise} vs {hom_direct}",
                                h.id, f.id, g.id
                            ),
                        });
                    }
                }
            }
        }

        Ok(())
    }
}

impl Default for TransportTable {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for TransportTable {
    fn fiber(&self, node: &NodeId) -> Result<&Fiber, FiberError> {
        self.fibers
            .get(node)
            .ok_or_else(|| FiberError::UnknownFiber(node.0.clone()))
    }

    fn map_obj(&self, along: &MapId, obj: &ObjId) -> Result<ObjId, FiberError> {
        self.obj_maps
            .get(along)
            .and_then(|m| m.get(obj))
            .cloned()
            .ok_or_else(|| FiberError::MissingTransport {
                description: format!("object {obj} has no image along {along}"),
            })
    }

    fn map_hom(&self, along: &MapId, hom: &HomId) -> Result<HomId, FiberError> {
        self.hom_maps
            .get(along)
            .and_then(|m| m.get(hom))
            .cloned()
            .ok_or_else(|| FiberError::MissingTransport {
                description: format!("hom {hom} has no image along {along}"),
            })
    }

    fn unit_iso(&self, node: &NodeId, obj: &ObjId) -> Result<HomId, FiberError> {
        if self.strict {
            return Ok(self.fiber(node)?.identity(obj)?.clone());
        }
        self.unit_isos
            .get(&unit_key(node, obj))
            .cloned()
            .ok_or_else(|| FiberError::MissingTransport {
                description: format!("no unit iso for {obj} over {node}"),
            })
    }

    fn comp_iso(&self, first: &MapId, second: &MapId, obj: &ObjId) -> Result<HomId, FiberError> {
        if self.strict {
            let stepwise = self.map_obj(first, &self.map_obj(second, obj)?)?;
            let node = self.source_of(first)?;
            return Ok(self.fiber(node)?.identity(&stepwise)?.clone());
        }
        self.comp_isos
            .get(&comp_key(first, second, obj))
            .cloned()
            .ok_or_else(|| FiberError::MissingTransport {
                description: format!("no composition iso for {obj} along {first} ≫ {second}"),
            })
    }
}
