//! Morphisms of glued data.
//!
//! A morphism between two glued data over the same cover is a family of
//! per-chart homs φ(i): obj1(i) → obj2(i) commuting with the transition
//! data on every overlap:
//!
//!   p1*(φ(i)) ≫ hom2(i,j)  =  hom1(i,j) ≫ p2*(φ(j))
//!
//! The condition is checked once per ordered pair at construction time;
//! [`Descent::check_hom_restriction`] is the derived generalization to
//! arbitrary compatible map pairs. Identity and composition are
//! componentwise, so the category laws hold by construction.

use crate::engine::Descent;
use crate::error::{DescentError, Law, Violation};
use crate::glued::GluedDatum;
use glueon_fiber::{HomId, Transport};
use glueon_site::{MapId, pair_key};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A morphism of glued data: one component per chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GluedHom {
    /// Chart index → component φ(i) in the fiber of X_i.
    pub components: BTreeMap<String, HomId>,
}

impl GluedHom {
    /// The component of one chart.
    pub fn component(&self, index: &str) -> Result<&HomId, DescentError> {
        self.components
            .get(index)
            .ok_or_else(|| DescentError::MissingTransition {
                description: format!("no morphism component for chart {index}"),
            })
    }
}

/// An isomorphism of glued data: a morphism together with its
/// componentwise inverse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GluedIso {
    pub to: GluedHom,
    pub from: GluedHom,
}

impl<'a, T: Transport> Descent<'a, T> {
    /// Commuting-square probe for one ordered pair.
    fn commuting_violation(
        &self,
        src: &GluedDatum,
        dst: &GluedDatum,
        components: &BTreeMap<String, HomId>,
        left: &str,
        right: &str,
    ) -> Result<Option<Violation>, DescentError> {
        let witness = self.witnesses.pair(left, right)?;
        let fiber = self.transport.fiber(&witness.node)?;

        let phi_left = components
            .get(left)
            .ok_or_else(|| DescentError::MissingTransition {
                description: format!("no morphism component for chart {left}"),
            })?;
        let phi_right = components
            .get(right)
            .ok_or_else(|| DescentError::MissingTransition {
                description: format!("no morphism component for chart {right}"),
            })?;

        let moved_left = self.transport.map_hom(&witness.p1, phi_left)?;
        let moved_right = self.transport.map_hom(&witness.p2, phi_right)?;

        let via_dst = fiber.compose(&moved_left, dst.hom(left, right)?)?;
        let via_src = fiber.compose(src.hom(left, right)?, &moved_right)?;

        if via_dst == via_src {
            Ok(None)
        } else {
            Ok(Some(Violation::error(
                Law::Commuting,
                pair_key(left, right),
                format!(
                    "square does not commute on ({left}, {right}): {via_dst} vs {via_src}"
                ),
            )))
        }
    }

    /// Build a morphism of glued data, checking typing per chart and
    /// the commuting square per ordered pair.
    pub fn hom(
        &self,
        src: &GluedDatum,
        dst: &GluedDatum,
        components: BTreeMap<String, HomId>,
    ) -> Result<GluedHom, DescentError> {
        let mut violations = Vec::new();

        for chart in &self.cover.charts {
            let phi = components
                .get(&chart.index)
                .ok_or_else(|| DescentError::InvalidDatum {
                    description: format!("no morphism component for chart {}", chart.index),
                })?;
            let fiber = self.transport.fiber(&chart.node)?;
            match fiber.hom(phi) {
                Ok(h) => {
                    let expected_src = src.obj(&chart.index)?;
                    let expected_tgt = dst.obj(&chart.index)?;
                    if &h.source != expected_src || &h.target != expected_tgt {
                        violations.push(Violation::error(
                            Law::Typing,
                            chart.index.clone(),
                            format!(
                                "component {phi} runs {} → {}, expected {expected_src} → {expected_tgt}",
                                h.source, h.target
                            ),
                        ));
                    }
                }
                Err(_) => violations.push(Violation::error(
                    Law::Typing,
                    chart.index.clone(),
                    format!("component {phi} is not in the fiber over {}", chart.node),
                )),
            }
        }
        if !violations.is_empty() {
            return Err(DescentError::MorphismIncompatible { violations });
        }

        for a in &self.cover.charts {
            for b in &self.cover.charts {
                if let Some(v) =
                    self.commuting_violation(src, dst, &components, &a.index, &b.index)?
                {
                    violations.push(v);
                }
            }
        }

        if violations.is_empty() {
            Ok(GluedHom { components })
        } else {
            Err(DescentError::MorphismIncompatible { violations })
        }
    }

    /// The identity morphism on a glued datum.
    pub fn identity_hom(&self, datum: &GluedDatum) -> Result<GluedHom, DescentError> {
        let mut components = BTreeMap::new();
        for chart in &self.cover.charts {
            let fiber = self.transport.fiber(&chart.node)?;
            let ident = fiber.identity(datum.obj(&chart.index)?)?.clone();
            components.insert(chart.index.clone(), ident);
        }
        Ok(GluedHom { components })
    }

    /// Componentwise composition of glued-data morphisms.
    pub fn compose_homs(
        &self,
        first: &GluedHom,
        second: &GluedHom,
    ) -> Result<GluedHom, DescentError> {
        let mut components = BTreeMap::new();
        for chart in &self.cover.charts {
            let fiber = self.transport.fiber(&chart.node)?;
            let composed = fiber.compose(
                first.component(&chart.index)?,
                second.component(&chart.index)?,
            )?;
            components.insert(chart.index.clone(), composed);
        }
        Ok(GluedHom { components })
    }

    /// Build an isomorphism of glued data from componentwise isos.
    ///
    /// Only the forward pairwise condition is checked; the inverse
    /// family satisfies its squares automatically and is assembled from
    /// the fiber inverse tables.
    pub fn iso_mk(
        &self,
        src: &GluedDatum,
        dst: &GluedDatum,
        components: BTreeMap<String, HomId>,
    ) -> Result<GluedIso, DescentError> {
        let forward = self.hom(src, dst, components)?;

        let mut inverse = BTreeMap::new();
        for chart in &self.cover.charts {
            let fiber = self.transport.fiber(&chart.node)?;
            let inv = fiber.inverse(forward.component(&chart.index)?)?;
            inverse.insert(chart.index.clone(), inv);
        }

        Ok(GluedIso {
            to: forward,
            from: GluedHom {
                components: inverse,
            },
        })
    }

    /// Derived generalization of the commuting square: for any
    /// compatible pair of maps (f1, f2) over q, the restricted
    /// transitions commute with the transported components.
    pub fn check_hom_restriction(
        &self,
        src: &GluedDatum,
        dst: &GluedDatum,
        hom: &GluedHom,
        q: &MapId,
        left: (&str, &MapId),
        right: (&str, &MapId),
    ) -> Result<(), DescentError> {
        let (i1, f1) = left;
        let (i2, f2) = right;

        let source_node = self.site.map(f1)?.source.clone();
        let fiber = self.transport.fiber(&source_node)?;

        let moved_left = self.transport.map_hom(f1, hom.component(i1)?)?;
        let moved_right = self.transport.map_hom(f2, hom.component(i2)?)?;

        let via_dst = fiber.compose(&moved_left, &self.pull_hom(dst, q, left, right)?)?;
        let via_src = fiber.compose(&self.pull_hom(src, q, left, right)?, &moved_right)?;

        if via_dst == via_src {
            Ok(())
        } else {
            Err(DescentError::MorphismIncompatible {
                violations: vec![Violation::error(
                    Law::Commuting,
                    pair_key(i1, i2),
                    format!(
                        "restricted square does not commute on ({i1}, {i2}): {via_dst} vs {via_src}"
                    ),
                )],
            })
        }
    }
}
