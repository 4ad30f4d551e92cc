//! Overlap witnesses and the universal factoring operation.
//!
//! For charts f_i: X_i → S and f_j: X_j → S, a pair witness is a node
//! P_ij with projections p1: P_ij → X_i and p2: P_ij → X_j such that
//! p1 ≫ f_i = p2 ≫ f_j, the canonical representative of the overlap
//! of chart i and chart j. Its universal property says: any node Y with
//! a compatible pair of maps into X_i and X_j factors through P_ij by a
//! unique map.
//!
//! On a finite site the universal property is an algorithm, not an
//! axiom: [`WitnessTable::factor`] searches the map table for the
//! factoring map and rejects witnesses that admit none or several. The
//! returned [`Factorization`] carries the recovery composites as
//! certificates, so callers never rely on implicit uniqueness reasoning.

use crate::cover::Chart;
use crate::error::SiteError;
use crate::map::{MapId, NodeId};
use crate::site::Site;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Canonical key for an ordered chart pair.
pub fn pair_key(left: &str, right: &str) -> String {
    format!("{left}:{right}")
}

/// Canonical key for an ordered chart triple.
pub fn triple_key(first: &str, second: &str, third: &str) -> String {
    format!("{first}:{second}:{third}")
}

/// Witness node for the overlap of two charts, with its projections.
///
/// sq(i,j): P_ij with p1: P_ij → X_i, p2: P_ij → X_j.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairWitness {
    /// Left chart index i.
    pub left: String,

    /// Right chart index j.
    pub right: String,

    /// The witness node P_ij.
    pub node: NodeId,

    /// Projection p1: P_ij → X_i.
    pub p1: MapId,

    /// Projection p2: P_ij → X_j.
    pub p2: MapId,
}

/// Witness node for a triple overlap, with legs into the pairwise
/// witnesses.
///
/// sq₃(i1,i2,i3): a node Q with to_pair12: Q → P_{i1,i2},
/// to_pair23: Q → P_{i2,i3}, to_pair13: Q → P_{i1,i3}, whose shared
/// legs agree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripleWitness {
    pub first: String,
    pub second: String,
    pub third: String,

    /// The witness node Q.
    pub node: NodeId,

    pub to_pair12: MapId,
    pub to_pair23: MapId,
    pub to_pair13: MapId,
}

/// The unique factoring of a compatible map pair through a pair
/// witness, with recovery certificates.
///
/// `through ≫ p1 = recovers_left` and `through ≫ p2 = recovers_right`,
/// both recomputed from the site tables at construction time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Factorization {
    /// The factoring map u: Y → P_ij.
    pub through: MapId,

    /// The recomputed composite u ≫ p1 (equal to the supplied g1).
    pub recovers_left: MapId,

    /// The recomputed composite u ≫ p2 (equal to the supplied g2).
    pub recovers_right: MapId,
}

/// Witness provider backed by explicit tables.
///
/// Pair witnesses are required for every ordered chart pair and triple
/// witnesses for every ordered chart triple; `validate` rejects tables
/// with gaps, so the cocycle obligations downstream are never vacuous.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WitnessTable {
    pairs: BTreeMap<String, PairWitness>,
    triples: BTreeMap<String, TripleWitness>,
}

impl WitnessTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_pair(&mut self, witness: PairWitness) {
        self.pairs
            .insert(pair_key(&witness.left, &witness.right), witness);
    }

    pub fn add_triple(&mut self, witness: TripleWitness) {
        self.triples.insert(
            triple_key(&witness.first, &witness.second, &witness.third),
            witness,
        );
    }

    /// The witness for the ordered pair (left, right).
    pub fn pair(&self, left: &str, right: &str) -> Result<&PairWitness, SiteError> {
        self.pairs
            .get(&pair_key(left, right))
            .ok_or_else(|| SiteError::MissingWitness {
                description: format!("no pair witness for ({left}, {right})"),
            })
    }

    /// All registered triple witnesses, in key order.
    pub fn triples(&self) -> impl Iterator<Item = &TripleWitness> {
        self.triples.values()
    }

    /// Check every witness against the site and cover: projections have
    /// the right endpoints, commute with the covering maps, the pair
    /// and triple tables are total over ordered chart pairs/triples,
    /// and triple legs agree.
    pub fn validate(&self, site: &Site, cover: &crate::cover::Cover) -> Result<(), SiteError> {
        for a in &cover.charts {
            for b in &cover.charts {
                if !self.pairs.contains_key(&pair_key(&a.index, &b.index)) {
                    return Err(SiteError::MissingWitness {
                        description: format!("no pair witness for ({}, {})", a.index, b.index),
                    });
                }
                for c in &cover.charts {
                    if !self
                        .triples
                        .contains_key(&triple_key(&a.index, &b.index, &c.index))
                    {
                        return Err(SiteError::MissingWitness {
                            description: format!(
                                "no triple witness for ({}, {}, {})",
                                a.index, b.index, c.index
                            ),
                        });
                    }
                }
            }
        }

        for w in self.pairs.values() {
            let left = cover.chart(&w.left)?;
            let right = cover.chart(&w.right)?;
            let p1 = site.map(&w.p1)?;
            let p2 = site.map(&w.p2)?;
            if p1.source != w.node || p1.target != left.node {
                return Err(SiteError::InvalidWitness {
                    description: format!(
                        "p1 of ({}, {}) does not run {} → {}",
                        w.left, w.right, w.node, left.node
                    ),
                });
            }
            if p2.source != w.node || p2.target != right.node {
                return Err(SiteError::InvalidWitness {
                    description: format!(
                        "p2 of ({}, {}) does not run {} → {}",
                        w.left, w.right, w.node, right.node
                    ),
                });
            }
            let via_left = site.compose(&w.p1, &left.to_base)?;
            let via_right = site.compose(&w.p2, &right.to_base)?;
            if via_left != via_right {
                return Err(SiteError::InvalidWitness {
                    description: format!(
                        "projections of ({}, {}) do not commute over the base: {via_left} vs {via_right}",
                        w.left, w.right
                    ),
                });
            }
        }

        for t in self.triples.values() {
            let p12 = self.pair(&t.first, &t.second)?;
            let p23 = self.pair(&t.second, &t.third)?;
            let p13 = self.pair(&t.first, &t.third)?;

            let q1_via_12 = site.compose(&t.to_pair12, &p12.p1)?;
            let q2_via_12 = site.compose(&t.to_pair12, &p12.p2)?;
            let q2_via_23 = site.compose(&t.to_pair23, &p23.p1)?;
            let q3_via_23 = site.compose(&t.to_pair23, &p23.p2)?;
            let q1_via_13 = site.compose(&t.to_pair13, &p13.p1)?;
            let q3_via_13 = site.compose(&t.to_pair13, &p13.p2)?;

            if q2_via_12 != q2_via_23 || q1_via_12 != q1_via_13 || q3_via_23 != q3_via_13 {
                return Err(SiteError::InvalidWitness {
                    description: format!(
                        "triple ({}, {}, {}) legs do not share projections",
                        t.first, t.second, t.third
                    ),
                });
            }
        }

        Ok(())
    }

    /// Factor a compatible pair of maps (g1: Y → X_i, g2: Y → X_j)
    /// through the witness of (i, j).
    ///
    /// Preconditions: g1 and g2 share a source and g1 ≫ f_i = g2 ≫ f_j
    /// (otherwise `InvalidFactoring`). The factoring map is found by
    /// exhaustive search over the site's map table; zero or several
    /// candidates mean the witness is not actually universal
    /// (`NotUniversal`).
    pub fn factor(
        &self,
        site: &Site,
        left: &Chart,
        right: &Chart,
        g1: &MapId,
        g2: &MapId,
    ) -> Result<Factorization, SiteError> {
        let witness = self.pair(&left.index, &right.index)?;
        let m1 = site.map(g1)?;
        let m2 = site.map(g2)?;

        if m1.target != left.node || m2.target != right.node {
            return Err(SiteError::InvalidFactoring {
                description: format!(
                    "({g1}, {g2}) do not land in charts ({}, {})",
                    left.index, right.index
                ),
            });
        }
        if m1.source != m2.source {
            return Err(SiteError::InvalidFactoring {
                description: format!("({g1}, {g2}) do not share a source"),
            });
        }
        let via_left = site.compose(g1, &left.to_base)?;
        let via_right = site.compose(g2, &right.to_base)?;
        if via_left != via_right {
            return Err(SiteError::InvalidFactoring {
                description: format!(
                    "({g1}, {g2}) do not commute over the base: {via_left} vs {via_right}"
                ),
            });
        }

        let source = m1.source.clone();
        let mut found: Option<MapId> = None;
        for u in site.maps() {
            if u.source != source || u.target != witness.node {
                continue;
            }
            if site.compose(&u.id, &witness.p1)? != *g1 || site.compose(&u.id, &witness.p2)? != *g2
            {
                continue;
            }
            if let Some(prev) = &found {
                return Err(SiteError::NotUniversal {
                    description: format!(
                        "({g1}, {g2}) factors through ({}, {}) via both {prev} and {}",
                        left.index, right.index, u.id
                    ),
                });
            }
            found = Some(u.id.clone());
        }

        let through = found.ok_or_else(|| SiteError::NotUniversal {
            description: format!(
                "({g1}, {g2}) admits no factoring through ({}, {})",
                left.index, right.index
            ),
        })?;

        let recovers_left = site.compose(&through, &witness.p1)?;
        let recovers_right = site.compose(&through, &witness.p2)?;
        Ok(Factorization {
            through,
            recovers_left,
            recovers_right,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cover::Cover;
    use crate::map::Map;

    /// Two charts x1, x2 over s with overlap node o.
    fn overlap_site() -> (Site, Cover, WitnessTable) {
        let mut site = Site::new();
        let s = site.add_node("s");
        let x1 = site.add_node("x1");
        let x2 = site.add_node("x2");
        let o = site.add_node("o");

        let a1 = site.add_map(Map::new("a1", x1.clone(), s.clone())).unwrap();
        let a2 = site.add_map(Map::new("a2", x2.clone(), s.clone())).unwrap();
        let o1 = site.add_map(Map::new("o1", o.clone(), x1.clone())).unwrap();
        let o2 = site.add_map(Map::new("o2", o.clone(), x2.clone())).unwrap();
        let os = site.add_map(Map::new("os", o.clone(), s.clone())).unwrap();
        site.set_composite(&o1, &a1, &os).unwrap();
        site.set_composite(&o2, &a2, &os).unwrap();
        site.validate().unwrap();

        let cover = Cover::new(
            s,
            "two-charts",
            vec![
                Chart {
                    index: "1".into(),
                    node: x1.clone(),
                    to_base: a1,
                },
                Chart {
                    index: "2".into(),
                    node: x2.clone(),
                    to_base: a2,
                },
            ],
        );

        let id_x1 = site.identity(&x1).unwrap().clone();
        let id_x2 = site.identity(&x2).unwrap().clone();
        let id_o = site.identity(&o).unwrap().clone();
        let mut witnesses = WitnessTable::new();
        witnesses.add_pair(PairWitness {
            left: "1".into(),
            right: "1".into(),
            node: x1.clone(),
            p1: id_x1.clone(),
            p2: id_x1.clone(),
        });
        witnesses.add_pair(PairWitness {
            left: "2".into(),
            right: "2".into(),
            node: x2.clone(),
            p1: id_x2.clone(),
            p2: id_x2.clone(),
        });
        witnesses.add_pair(PairWitness {
            left: "1".into(),
            right: "2".into(),
            node: o.clone(),
            p1: o1.clone(),
            p2: o2.clone(),
        });
        witnesses.add_pair(PairWitness {
            left: "2".into(),
            right: "1".into(),
            node: o.clone(),
            p1: o2.clone(),
            p2: o1.clone(),
        });

        // Leg from the triple overlap node into a pair witness node.
        let leg = |l: &str, r: &str| {
            if l == r {
                if l == "1" { o1.clone() } else { o2.clone() }
            } else {
                id_o.clone()
            }
        };
        for i in ["1", "2"] {
            for j in ["1", "2"] {
                for k in ["1", "2"] {
                    if i == j && j == k {
                        let (node, ident) =
                            if i == "1" { (&x1, &id_x1) } else { (&x2, &id_x2) };
                        witnesses.add_triple(TripleWitness {
                            first: i.into(),
                            second: j.into(),
                            third: k.into(),
                            node: node.clone(),
                            to_pair12: ident.clone(),
                            to_pair23: ident.clone(),
                            to_pair13: ident.clone(),
                        });
                    } else {
                        witnesses.add_triple(TripleWitness {
                            first: i.into(),
                            second: j.into(),
                            third: k.into(),
                            node: o.clone(),
                            to_pair12: leg(i, j),
                            to_pair23: leg(j, k),
                            to_pair13: leg(i, k),
                        });
                    }
                }
            }
        }

        (site, cover, witnesses)
    }

    #[test]
    fn witness_table_validates() {
        let (site, cover, witnesses) = overlap_site();
        cover.validate(&site).unwrap();
        witnesses.validate(&site, &cover).unwrap();
    }

    #[test]
    fn factor_finds_the_unique_map() {
        let (site, cover, witnesses) = overlap_site();
        let c1 = cover.chart("1").unwrap();
        let c2 = cover.chart("2").unwrap();
        let fact = witnesses
            .factor(&site, c1, c2, &MapId::new("o1"), &MapId::new("o2"))
            .unwrap();
        assert_eq!(fact.through, *site.identity(&NodeId::new("o")).unwrap());
        assert_eq!(fact.recovers_left, MapId::new("o1"));
        assert_eq!(fact.recovers_right, MapId::new("o2"));
    }

    #[test]
    fn factor_rejects_non_commuting_inputs() {
        let (site, cover, witnesses) = overlap_site();
        let c1 = cover.chart("1").unwrap();
        let c2 = cover.chart("2").unwrap();
        // o1 into chart 1 paired with o1 again: wrong target for chart 2.
        let err = witnesses
            .factor(&site, c1, c2, &MapId::new("o1"), &MapId::new("o1"))
            .unwrap_err();
        assert!(matches!(err, SiteError::InvalidFactoring { .. }));
    }

    #[test]
    fn missing_pair_witness_reported() {
        let (site, cover, mut witnesses) = overlap_site();
        witnesses.pairs.remove(&pair_key("2", "1"));
        assert!(matches!(
            witnesses.validate(&site, &cover).unwrap_err(),
            SiteError::MissingWitness { .. }
        ));
    }

    #[test]
    fn missing_triple_witness_reported() {
        let (site, cover, mut witnesses) = overlap_site();
        witnesses.triples.remove(&triple_key("1", "2", "1"));
        assert!(matches!(
            witnesses.validate(&site, &cover).unwrap_err(),
            SiteError::MissingWitness { .. }
        ));
    }

    #[test]
    fn factor_without_candidate_not_universal() {
        let (mut site, cover, witnesses) = overlap_site();
        // A second node with a compatible pair of maps into the charts
        // but no map into the overlap node.
        let y = site.add_node("y");
        let x1 = NodeId::new("x1");
        let x2 = NodeId::new("x2");
        let s = NodeId::new("s");
        let y1 = site.add_map(Map::new("y1", y.clone(), x1)).unwrap();
        let y2 = site.add_map(Map::new("y2", y.clone(), x2)).unwrap();
        let ys = site.add_map(Map::new("ys", y, s)).unwrap();
        site.set_composite(&y1, &MapId::new("a1"), &ys).unwrap();
        site.set_composite(&y2, &MapId::new("a2"), &ys).unwrap();

        let c1 = cover.chart("1").unwrap();
        let c2 = cover.chart("2").unwrap();
        let err = witnesses.factor(&site, c1, c2, &y1, &y2).unwrap_err();
        assert!(matches!(err, SiteError::NotUniversal { .. }));
    }

    #[test]
    fn factor_with_two_candidates_not_universal() {
        let (mut site, cover, witnesses) = overlap_site();
        // Two distinct maps y → o recovering the same compatible pair.
        let y = site.add_node("y");
        let o = NodeId::new("o");
        let x1 = NodeId::new("x1");
        let x2 = NodeId::new("x2");
        let s = NodeId::new("s");
        let y1 = site.add_map(Map::new("y1", y.clone(), x1)).unwrap();
        let y2 = site.add_map(Map::new("y2", y.clone(), x2)).unwrap();
        let ys = site.add_map(Map::new("ys", y.clone(), s)).unwrap();
        let u1 = site.add_map(Map::new("u1", y.clone(), o.clone())).unwrap();
        let u2 = site.add_map(Map::new("u2", y, o)).unwrap();
        site.set_composite(&y1, &MapId::new("a1"), &ys).unwrap();
        site.set_composite(&y2, &MapId::new("a2"), &ys).unwrap();
        site.set_composite(&u1, &MapId::new("o1"), &y1).unwrap();
        site.set_composite(&u1, &MapId::new("o2"), &y2).unwrap();
        site.set_composite(&u2, &MapId::new("o1"), &y1).unwrap();
        site.set_composite(&u2, &MapId::new("o2"), &y2).unwrap();

        let c1 = cover.chart("1").unwrap();
        let c2 = cover.chart("2").unwrap();
        let err = witnesses.factor(&site, c1, c2, &y1, &y2).unwrap_err();
        assert!(matches!(err, SiteError::NotUniversal { .. }));
    }

    #[test]
    fn self_pair_factors_through_the_diagonal() {
        let (site, cover, witnesses) = overlap_site();
        let c1 = cover.chart("1").unwrap();
        let id_x1 = site.identity(&NodeId::new("x1")).unwrap().clone();
        let fact = witnesses.factor(&site, c1, c1, &id_x1, &id_x1).unwrap();
        assert_eq!(fact.through, id_x1);
    }
}
