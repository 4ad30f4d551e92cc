//! The canonical presentation: glued data without fixed witnesses.
//!
//! Instead of one transition datum per ordered chart pair, a canonical
//! datum carries one transition per *compatible pair of maps* into
//! charts: any node Y, any f1: Y → X_i1 and f2: Y → X_i2 agreeing over
//! the base. The laws are stated in this unrestricted form: the general
//! self law, the general cocycle law, and naturality under
//! precomposition.
//!
//! Over a finite site the compatible pairs are enumerable, so the
//! canonical presentation is a total table and its laws are checked
//! exhaustively at construction. The [`GluingData`] trait unifies the
//! two presentations behind one transition query.

use crate::engine::Descent;
use crate::error::{DescentError, Law, Violation};
use crate::glued::GluedDatum;
use glueon_fiber::{HomId, ObjId, Transport};
use glueon_site::{MapId, NodeId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Canonical key for a transition at a compatible pair of maps.
///
/// The base map q is determined by either leg, so it is not part of
/// the key.
pub fn transition_key(left_index: &str, f1: &MapId, right_index: &str, f2: &MapId) -> String {
    format!("{left_index}@{f1}|{right_index}@{f2}")
}

/// A compatible pair of maps into two charts: f1: Y → X_i1 and
/// f2: Y → X_i2 with f1 ≫ f_i1 = f2 ≫ f_i2 = q.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompatiblePair {
    pub left_index: String,
    pub right_index: String,
    pub f1: MapId,
    pub f2: MapId,

    /// The common base map q: Y → S.
    pub q: MapId,

    /// The shared source node Y.
    pub source: NodeId,
}

/// Glued data in canonical form: locals plus a total transition table
/// over all compatible map pairs of the (finite) site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalDatum {
    /// Identifier of the cover this datum is over.
    pub cover_id: String,

    /// Local data: chart index → obj in the fiber of X_i.
    pub objs: BTreeMap<String, ObjId>,

    /// Transitions: `transition_key(i1, f1, i2, f2)` → hom running
    /// f1*(obj(i1)) → f2*(obj(i2)) in the fiber over the shared source.
    pub transitions: BTreeMap<String, HomId>,
}

impl CanonicalDatum {
    /// The local datum of one chart.
    pub fn obj(&self, index: &str) -> Result<&ObjId, DescentError> {
        self.objs
            .get(index)
            .ok_or_else(|| DescentError::MissingTransition {
                description: format!("no local datum for chart {index}"),
            })
    }

    /// The transition at one compatible pair of maps.
    pub fn transition_at(
        &self,
        left_index: &str,
        f1: &MapId,
        right_index: &str,
        f2: &MapId,
    ) -> Result<&HomId, DescentError> {
        self.transitions
            .get(&transition_key(left_index, f1, right_index, f2))
            .ok_or_else(|| DescentError::MissingTransition {
                description: format!(
                    "no transition for ({left_index} via {f1}, {right_index} via {f2})"
                ),
            })
    }
}

/// A morphism of canonical data: one component per chart, commuting
/// with every transition in the table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalHom {
    pub components: BTreeMap<String, HomId>,
}

/// One transition query, served by either presentation.
///
/// [`GluedDatum`] computes it by restriction through the fixed
/// witnesses; [`CanonicalDatum`] looks it up in its total table. The
/// conversion functions in [`crate::equiv`] move between the two
/// without loss.
pub trait GluingData {
    /// Identifier of the cover the data is over.
    fn cover_id(&self) -> &str;

    /// The local datum of one chart, if present.
    fn local(&self, chart: &str) -> Option<&ObjId>;

    /// The transition datum for a compatible pair of maps over q.
    fn transition<T: Transport>(
        &self,
        descent: &Descent<'_, T>,
        q: &MapId,
        left: (&str, &MapId),
        right: (&str, &MapId),
    ) -> Result<HomId, DescentError>;
}

impl GluingData for GluedDatum {
    fn cover_id(&self) -> &str {
        &self.cover_id
    }

    fn local(&self, chart: &str) -> Option<&ObjId> {
        self.objs.get(chart)
    }

    fn transition<T: Transport>(
        &self,
        descent: &Descent<'_, T>,
        q: &MapId,
        left: (&str, &MapId),
        right: (&str, &MapId),
    ) -> Result<HomId, DescentError> {
        descent.pull_hom(self, q, left, right)
    }
}

impl GluingData for CanonicalDatum {
    fn cover_id(&self) -> &str {
        &self.cover_id
    }

    fn local(&self, chart: &str) -> Option<&ObjId> {
        self.objs.get(chart)
    }

    fn transition<T: Transport>(
        &self,
        descent: &Descent<'_, T>,
        q: &MapId,
        left: (&str, &MapId),
        right: (&str, &MapId),
    ) -> Result<HomId, DescentError> {
        let (i1, f1) = left;
        let (i2, f2) = right;
        let c1 = descent.cover.chart(i1)?;
        let c2 = descent.cover.chart(i2)?;
        let q1 = descent.site.compose(f1, &c1.to_base)?;
        let q2 = descent.site.compose(f2, &c2.to_base)?;
        if q1 != *q || q2 != *q {
            return Err(glueon_site::SiteError::InvalidFactoring {
                description: format!(
                    "({f1}, {f2}) do not factor {q}: composites are {q1} and {q2}"
                ),
            }
            .into());
        }
        Ok(self.transition_at(i1, f1, i2, f2)?.clone())
    }
}

impl<'a, T: Transport> Descent<'a, T> {
    /// Enumerate every compatible pair of maps into charts, in
    /// canonical key order.
    pub fn compatible_pairs(&self) -> Result<Vec<CompatiblePair>, DescentError> {
        let mut pairs = Vec::new();
        for c1 in &self.cover.charts {
            for c2 in &self.cover.charts {
                for f1 in self.site.maps_into(&c1.node) {
                    for f2 in self.site.maps_into(&c2.node) {
                        if f1.source != f2.source {
                            continue;
                        }
                        let q1 = self.site.compose(&f1.id, &c1.to_base)?;
                        let q2 = self.site.compose(&f2.id, &c2.to_base)?;
                        if q1 != q2 {
                            continue;
                        }
                        pairs.push(CompatiblePair {
                            left_index: c1.index.clone(),
                            right_index: c2.index.clone(),
                            f1: f1.id.clone(),
                            f2: f2.id.clone(),
                            q: q1,
                            source: f1.source.clone(),
                        });
                    }
                }
            }
        }
        Ok(pairs)
    }

    /// Assemble a canonical datum, checking completeness of the
    /// transition table and the general laws before the value exists.
    pub fn canonical(
        &self,
        cover_id: impl Into<String>,
        objs: BTreeMap<String, ObjId>,
        transitions: BTreeMap<String, HomId>,
    ) -> Result<CanonicalDatum, DescentError> {
        for chart in &self.cover.charts {
            if !objs.contains_key(&chart.index) {
                return Err(DescentError::InvalidDatum {
                    description: format!("no local datum for chart {}", chart.index),
                });
            }
        }

        let pairs = self.compatible_pairs()?;
        let mut expected_keys: Vec<String> = pairs
            .iter()
            .map(|p| transition_key(&p.left_index, &p.f1, &p.right_index, &p.f2))
            .collect();
        expected_keys.sort();
        for key in &expected_keys {
            if !transitions.contains_key(key) {
                return Err(DescentError::InvalidDatum {
                    description: format!("transition table is missing {key}"),
                });
            }
        }
        for key in transitions.keys() {
            if !expected_keys.iter().any(|k| k == key) {
                return Err(DescentError::InvalidDatum {
                    description: format!("transition table has spurious entry {key}"),
                });
            }
        }

        let datum = CanonicalDatum {
            cover_id: cover_id.into(),
            objs,
            transitions,
        };

        let mut violations = Vec::new();

        // Typing.
        for p in &pairs {
            let hom_id = datum.transition_at(&p.left_index, &p.f1, &p.right_index, &p.f2)?;
            let fiber = self.transport.fiber(&p.source)?;
            let expected_src = self.transport.map_obj(&p.f1, datum.obj(&p.left_index)?)?;
            let expected_tgt = self.transport.map_obj(&p.f2, datum.obj(&p.right_index)?)?;
            match fiber.hom(hom_id) {
                Ok(h) if h.source == expected_src && h.target == expected_tgt => {}
                Ok(h) => violations.push(Violation::error(
                    Law::Typing,
                    transition_key(&p.left_index, &p.f1, &p.right_index, &p.f2),
                    format!(
                        "transition {hom_id} runs {} → {}, expected {expected_src} → {expected_tgt}",
                        h.source, h.target
                    ),
                )),
                Err(_) => violations.push(Violation::error(
                    Law::Typing,
                    transition_key(&p.left_index, &p.f1, &p.right_index, &p.f2),
                    format!("transition {hom_id} is not in the fiber over {}", p.source),
                )),
            }
        }
        if !violations.is_empty() {
            return Err(DescentError::CocycleViolation { violations });
        }

        // General self law: on a pair with the same chart and the same
        // leg, the transition is the identity.
        for p in &pairs {
            if p.left_index != p.right_index || p.f1 != p.f2 {
                continue;
            }
            let hom_id = datum.transition_at(&p.left_index, &p.f1, &p.right_index, &p.f2)?;
            let fiber = self.transport.fiber(&p.source)?;
            let pulled = self.transport.map_obj(&p.f1, datum.obj(&p.left_index)?)?;
            let expected = fiber.identity(&pulled)?;
            if hom_id != expected {
                violations.push(Violation::error(
                    Law::SelfConsistency,
                    transition_key(&p.left_index, &p.f1, &p.right_index, &p.f2),
                    format!("transition is {hom_id}, expected {expected}"),
                ));
            }
        }

        // General cocycle law: any three pairwise-compatible legs.
        for p in &pairs {
            for c3 in &self.cover.charts {
                for f3 in self.site.maps_into(&c3.node) {
                    if f3.source != p.source {
                        continue;
                    }
                    let q3 = self.site.compose(&f3.id, &c3.to_base)?;
                    if q3 != p.q {
                        continue;
                    }
                    let t12 = datum.transition_at(&p.left_index, &p.f1, &p.right_index, &p.f2)?;
                    let t23 = datum.transition_at(&p.right_index, &p.f2, &c3.index, &f3.id)?;
                    let t13 = datum.transition_at(&p.left_index, &p.f1, &c3.index, &f3.id)?;
                    let fiber = self.transport.fiber(&p.source)?;
                    let composed = fiber.compose(t12, t23)?;
                    if &composed != t13 {
                        violations.push(Violation::error(
                            Law::Cocycle,
                            format!("{}:{}:{}", p.left_index, p.right_index, c3.index),
                            format!(
                                "transitions compose to {composed} but the direct transition is {t13}"
                            ),
                        ));
                    }
                }
            }
        }

        // Naturality: precomposition by any g into the shared source.
        for p in &pairs {
            for g in self.site.maps() {
                if g.target != p.source {
                    continue;
                }
                let t = datum.transition_at(&p.left_index, &p.f1, &p.right_index, &p.f2)?;
                let moved = self.transport.map_hom(&g.id, t)?;

                let gf1 = self.site.compose(&g.id, &p.f1)?;
                let gf2 = self.site.compose(&g.id, &p.f2)?;
                let direct = datum.transition_at(&p.left_index, &gf1, &p.right_index, &gf2)?;

                let fiber = self.transport.fiber(&g.source)?;
                let a1 = datum.obj(&p.left_index)?;
                let a2 = datum.obj(&p.right_index)?;
                let left_iso = self.transport.comp_iso(&g.id, &p.f1, a1)?;
                let right_iso = self.transport.comp_iso(&g.id, &p.f2, a2)?;
                let left_inv = fiber.inverse(&left_iso)?;
                let half = fiber.compose(&left_inv, &moved)?;
                let normalized = fiber.compose(&half, &right_iso)?;

                if &normalized != direct {
                    violations.push(Violation::error(
                        Law::Naturality,
                        transition_key(&p.left_index, &p.f1, &p.right_index, &p.f2),
                        format!(
                            "transition transported along {} is {normalized}, direct is {direct}",
                            g.id
                        ),
                    ));
                }
            }
        }

        if violations.is_empty() {
            Ok(datum)
        } else {
            Err(DescentError::CocycleViolation { violations })
        }
    }

    /// Build a morphism of canonical data, checking the commuting
    /// condition against every transition in the table.
    pub fn canonical_hom(
        &self,
        src: &CanonicalDatum,
        dst: &CanonicalDatum,
        components: BTreeMap<String, HomId>,
    ) -> Result<CanonicalHom, DescentError> {
        let mut violations = Vec::new();

        for chart in &self.cover.charts {
            let phi = components
                .get(&chart.index)
                .ok_or_else(|| DescentError::InvalidDatum {
                    description: format!("no morphism component for chart {}", chart.index),
                })?;
            let fiber = self.transport.fiber(&chart.node)?;
            match fiber.hom(phi) {
                Ok(h)
                    if &h.source == src.obj(&chart.index)?
                        && &h.target == dst.obj(&chart.index)? => {}
                _ => violations.push(Violation::error(
                    Law::Typing,
                    chart.index.clone(),
                    format!("component {phi} is not a hom obj1 → obj2 over {}", chart.node),
                )),
            }
        }
        if !violations.is_empty() {
            return Err(DescentError::MorphismIncompatible { violations });
        }

        for p in self.compatible_pairs()? {
            let fiber = self.transport.fiber(&p.source)?;
            let moved_left = self
                .transport
                .map_hom(&p.f1, &components[&p.left_index])?;
            let moved_right = self
                .transport
                .map_hom(&p.f2, &components[&p.right_index])?;
            let t_src = src.transition_at(&p.left_index, &p.f1, &p.right_index, &p.f2)?;
            let t_dst = dst.transition_at(&p.left_index, &p.f1, &p.right_index, &p.f2)?;

            let via_dst = fiber.compose(&moved_left, t_dst)?;
            let via_src = fiber.compose(t_src, &moved_right)?;
            if via_dst != via_src {
                violations.push(Violation::error(
                    Law::Commuting,
                    transition_key(&p.left_index, &p.f1, &p.right_index, &p.f2),
                    format!("square does not commute: {via_dst} vs {via_src}"),
                ));
            }
        }

        if violations.is_empty() {
            Ok(CanonicalHom { components })
        } else {
            Err(DescentError::MorphismIncompatible { violations })
        }
    }
}
