//! The descent engine: restriction of transition data and the gluing
//! laws.
//!
//! [`Descent`] bundles the base site, a cover, the overlap witnesses,
//! and a state-space assignment. Its central operation is
//! [`Descent::pull_hom`]: given a glued datum and an arbitrary
//! compatible pair of maps (f1: Y → X_i1, f2: Y → X_i2) over a common
//! base map q, it produces the transition datum between the pulled-back
//! local data, by factoring through the overlap witness, transporting,
//! and normalizing by the transport coherence isos.
//!
//! Path independence is structural: the factoring map is unique by the
//! universal property, so any two computations of the same restriction
//! agree. The remaining laws (self consistency, the general cocycle
//! law, precomposition stability) are exposed as callable checks and
//! enforced by [`Descent::glue`] before a datum exists.

use crate::error::{DescentError, Law, Violation};
use crate::glued::GluedDatum;
use glueon_fiber::{HomId, ObjId, Transport};
use glueon_site::{Cover, MapId, Site, WitnessTable, pair_key, triple_key};
use std::collections::BTreeMap;

/// The engine context: everything restriction and gluing need.
///
/// Construction validates the site, the cover, and the witness table;
/// the transport is validated by its own provider.
#[derive(Debug)]
pub struct Descent<'a, T: Transport> {
    pub site: &'a Site,
    pub cover: &'a Cover,
    pub witnesses: &'a WitnessTable,
    pub transport: &'a T,
}

impl<'a, T: Transport> Descent<'a, T> {
    pub fn new(
        site: &'a Site,
        cover: &'a Cover,
        witnesses: &'a WitnessTable,
        transport: &'a T,
    ) -> Result<Self, DescentError> {
        site.validate()?;
        cover.validate(site)?;
        witnesses.validate(site, cover)?;
        Ok(Self {
            site,
            cover,
            witnesses,
            transport,
        })
    }

    /// Restrict a transition datum along an arbitrary compatible pair
    /// of maps.
    ///
    /// Preconditions: `f1 ≫ f_i1 = q` and `f2 ≫ f_i2 = q`; violations
    /// surface as `InvalidFactoring`. The result runs
    /// f1*(obj(i1)) → f2*(obj(i2)) in the fiber over the shared source.
    pub fn pull_hom(
        &self,
        datum: &GluedDatum,
        q: &MapId,
        left: (&str, &MapId),
        right: (&str, &MapId),
    ) -> Result<HomId, DescentError> {
        let (i1, f1) = left;
        let (i2, f2) = right;
        let c1 = self.cover.chart(i1)?;
        let c2 = self.cover.chart(i2)?;

        let q1 = self.site.compose(f1, &c1.to_base)?;
        let q2 = self.site.compose(f2, &c2.to_base)?;
        if q1 != *q || q2 != *q {
            return Err(glueon_site::SiteError::InvalidFactoring {
                description: format!(
                    "({f1}, {f2}) do not factor {q}: composites are {q1} and {q2}"
                ),
            }
            .into());
        }

        let witness = self.witnesses.pair(i1, i2)?;
        let fact = self.witnesses.factor(self.site, c1, c2, f1, f2)?;
        let u = &fact.through;

        let a1 = datum.obj(i1)?;
        let a2 = datum.obj(i2)?;
        let hom = datum.hom(i1, i2)?;

        // u*(hom): u*(p1*(a1)) → u*(p2*(a2)) in the fiber over Y.
        let moved = self.transport.map_hom(u, hom)?;
        let source_node = self.site.map(u)?.source.clone();
        let fiber = self.transport.fiber(&source_node)?;

        // Normalize both ends: u*(p1*(a1)) ≅ (u ≫ p1)*(a1) = f1*(a1),
        // and likewise on the right.
        let left_iso = self.transport.comp_iso(u, &witness.p1, a1)?;
        let right_iso = self.transport.comp_iso(u, &witness.p2, a2)?;
        let left_inv = fiber.inverse(&left_iso)?;
        let half = fiber.compose(&left_inv, &moved)?;
        Ok(fiber.compose(&half, &right_iso)?)
    }

    /// Self law as a violation probe: restricting hom(i,i) along the
    /// identity must yield the identity on id*(obj(i)).
    fn self_law_violation(
        &self,
        datum: &GluedDatum,
        index: &str,
    ) -> Result<Option<Violation>, DescentError> {
        let chart = self.cover.chart(index)?;
        let ident = self.site.identity(&chart.node)?.clone();
        let pulled = self.pull_hom(datum, &chart.to_base, (index, &ident), (index, &ident))?;
        let pulled_obj = self.transport.map_obj(&ident, datum.obj(index)?)?;
        let expected = self
            .transport
            .fiber(&chart.node)?
            .identity(&pulled_obj)?
            .clone();
        if pulled == expected {
            Ok(None)
        } else {
            Ok(Some(Violation::error(
                Law::SelfConsistency,
                pair_key(index, index),
                format!("restriction of hom({index},{index}) along the identity is {pulled}, expected {expected}"),
            )))
        }
    }

    /// Cocycle law as a violation probe at an arbitrary node.
    fn cocycle_violation(
        &self,
        datum: &GluedDatum,
        q: &MapId,
        first: (&str, &MapId),
        second: (&str, &MapId),
        third: (&str, &MapId),
    ) -> Result<Option<Violation>, DescentError> {
        let pull_12 = self.pull_hom(datum, q, first, second)?;
        let pull_23 = self.pull_hom(datum, q, second, third)?;
        let pull_13 = self.pull_hom(datum, q, first, third)?;

        let source_node = self.site.map(first.1)?.source.clone();
        let fiber = self.transport.fiber(&source_node)?;
        let composed = fiber.compose(&pull_12, &pull_23)?;

        if composed == pull_13 {
            Ok(None)
        } else {
            Ok(Some(Violation::error(
                Law::Cocycle,
                triple_key(first.0, second.0, third.0),
                format!(
                    "restrictions compose to {composed} but the direct restriction is {pull_13}"
                ),
            )))
        }
    }

    /// Check the self law on one chart.
    pub fn check_self_law(&self, datum: &GluedDatum, index: &str) -> Result<(), DescentError> {
        match self.self_law_violation(datum, index)? {
            None => Ok(()),
            Some(v) => Err(DescentError::CocycleViolation {
                violations: vec![v],
            }),
        }
    }

    /// Check the general cocycle law: for any node Y, base map q, and
    /// three compatible maps into charts, restriction composes.
    ///
    /// This is derived from the primitive laws checked at gluing time,
    /// but callers get it as an operation of its own.
    pub fn check_cocycle(
        &self,
        datum: &GluedDatum,
        q: &MapId,
        first: (&str, &MapId),
        second: (&str, &MapId),
        third: (&str, &MapId),
    ) -> Result<(), DescentError> {
        match self.cocycle_violation(datum, q, first, second, third)? {
            None => Ok(()),
            Some(v) => Err(DescentError::CocycleViolation {
                violations: vec![v],
            }),
        }
    }

    /// Check precomposition stability: restricting at Y and then
    /// transporting along g: Y' → Y agrees with restricting at Y'
    /// directly, after normalizing by the composition isos.
    pub fn check_precomposition(
        &self,
        datum: &GluedDatum,
        g: &MapId,
        q: &MapId,
        left: (&str, &MapId),
        right: (&str, &MapId),
    ) -> Result<(), DescentError> {
        let (i1, f1) = left;
        let (i2, f2) = right;

        let pulled = self.pull_hom(datum, q, left, right)?;
        let moved = self.transport.map_hom(g, &pulled)?;

        let gf1 = self.site.compose(g, f1)?;
        let gf2 = self.site.compose(g, f2)?;
        let gq = self.site.compose(g, q)?;
        let direct = self.pull_hom(datum, &gq, (i1, &gf1), (i2, &gf2))?;

        let a1 = datum.obj(i1)?;
        let a2 = datum.obj(i2)?;
        let source_node = self.site.map(g)?.source.clone();
        let fiber = self.transport.fiber(&source_node)?;
        let left_iso = self.transport.comp_iso(g, f1, a1)?;
        let right_iso = self.transport.comp_iso(g, f2, a2)?;
        let left_inv = fiber.inverse(&left_iso)?;
        let half = fiber.compose(&left_inv, &moved)?;
        let normalized = fiber.compose(&half, &right_iso)?;

        if normalized == direct {
            Ok(())
        } else {
            Err(DescentError::CocycleViolation {
                violations: vec![Violation::error(
                    Law::Naturality,
                    pair_key(i1, i2),
                    format!(
                        "restriction transported along {g} is {normalized}, direct restriction is {direct}"
                    ),
                )],
            })
        }
    }

    /// Typing probe: hom(i,j) must live in the fiber of P_ij and run
    /// p1*(obj(i)) → p2*(obj(j)).
    fn typing_violation(
        &self,
        datum: &GluedDatum,
        left: &str,
        right: &str,
    ) -> Result<Option<Violation>, DescentError> {
        let witness = self.witnesses.pair(left, right)?;
        let a1 = datum.obj(left)?;
        let a2 = datum.obj(right)?;
        let hom_id = datum.hom(left, right)?;

        let fiber = self.transport.fiber(&witness.node)?;
        let hom = match fiber.hom(hom_id) {
            Ok(h) => h,
            Err(_) => {
                return Ok(Some(Violation::error(
                    Law::Typing,
                    pair_key(left, right),
                    format!("hom {hom_id} is not in the fiber over {}", witness.node),
                )));
            }
        };
        let expected_src = self.transport.map_obj(&witness.p1, a1)?;
        let expected_tgt = self.transport.map_obj(&witness.p2, a2)?;
        if hom.source != expected_src || hom.target != expected_tgt {
            return Ok(Some(Violation::error(
                Law::Typing,
                pair_key(left, right),
                format!(
                    "hom {hom_id} runs {} → {}, expected {expected_src} → {expected_tgt}",
                    hom.source, hom.target
                ),
            )));
        }
        Ok(None)
    }

    /// Assemble a glued datum, checking every law before the value
    /// exists.
    ///
    /// Obligations: a local datum per chart, a well-typed transition
    /// datum per ordered chart pair, the self law on every chart, and
    /// the cocycle law on every ordered chart triple. Failures are
    /// collected and surfaced together as `CocycleViolation`.
    pub fn glue(
        &self,
        cover_id: impl Into<String>,
        objs: BTreeMap<String, ObjId>,
        homs: BTreeMap<String, HomId>,
    ) -> Result<GluedDatum, DescentError> {
        for chart in &self.cover.charts {
            if !objs.contains_key(&chart.index) {
                return Err(DescentError::InvalidDatum {
                    description: format!("no local datum for chart {}", chart.index),
                });
            }
            let obj = &objs[&chart.index];
            if !self.transport.fiber(&chart.node)?.has_object(obj) {
                return Err(DescentError::InvalidDatum {
                    description: format!(
                        "local datum {obj} is not in the fiber over {}",
                        chart.node
                    ),
                });
            }
        }
        let mut expected_pairs = Vec::new();
        for a in &self.cover.charts {
            for b in &self.cover.charts {
                let key = pair_key(&a.index, &b.index);
                if !homs.contains_key(&key) {
                    return Err(DescentError::InvalidDatum {
                        description: format!(
                            "no transition datum for ({}, {})",
                            a.index, b.index
                        ),
                    });
                }
                expected_pairs.push(key);
            }
        }
        for index in objs.keys() {
            if self.cover.chart(index).is_err() {
                return Err(DescentError::InvalidDatum {
                    description: format!("spurious local datum for unknown chart {index}"),
                });
            }
        }
        for key in homs.keys() {
            if !expected_pairs.iter().any(|k| k == key) {
                return Err(DescentError::InvalidDatum {
                    description: format!("spurious transition entry {key}"),
                });
            }
        }

        let datum = GluedDatum {
            cover_id: cover_id.into(),
            objs,
            homs,
        };

        let mut violations = Vec::new();

        for a in &self.cover.charts {
            for b in &self.cover.charts {
                if let Some(v) = self.typing_violation(&datum, &a.index, &b.index)? {
                    violations.push(v);
                }
            }
        }
        if !violations.is_empty() {
            // Law checks below assume well-typed data.
            return Err(DescentError::CocycleViolation { violations });
        }

        for chart in &self.cover.charts {
            if let Some(v) = self.self_law_violation(&datum, &chart.index)? {
                violations.push(v);
            }
        }

        for t in self.witnesses.triples() {
            let p12 = self.witnesses.pair(&t.first, &t.second)?;
            let p23 = self.witnesses.pair(&t.second, &t.third)?;
            let q1 = self.site.compose(&t.to_pair12, &p12.p1)?;
            let q2 = self.site.compose(&t.to_pair12, &p12.p2)?;
            let q3 = self.site.compose(&t.to_pair23, &p23.p2)?;
            let base = self
                .site
                .compose(&q1, &self.cover.chart(&t.first)?.to_base)?;
            if let Some(v) = self.cocycle_violation(
                &datum,
                &base,
                (&t.first, &q1),
                (&t.second, &q2),
                (&t.third, &q3),
            )? {
                violations.push(v);
            }
        }

        if violations.is_empty() {
            Ok(datum)
        } else {
            Err(DescentError::CocycleViolation { violations })
        }
    }
}
