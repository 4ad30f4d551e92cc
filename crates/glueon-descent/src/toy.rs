//! Toy worlds for descent conformance testing.
//!
//! One small base: two charts x1, x2 covering s with overlap node o.
//! Every fiber has a single local datum `c` and a self-inverse twist
//! `g: c → c` (g ≫ g = id); every transport acts as the identity.
//! Different transition tables over this fixed world exercise the
//! engine's law checking:
//!
//! - **constant**: all transitions are identities. The golden world:
//!   gluing succeeds and the glued result is `c` everywhere.
//! - **twisted_self**: hom(1,1) is the twist. Violates the self law.
//! - **twisted_cycle**: hom(1,2) is the twist but hom(2,1) is the
//!   identity. Passes the self law, fails the cocycle law on the
//!   (1,2,1) triple.

use glueon_fiber::{Fiber, Hom, HomId, ObjId, TransportTable};
use glueon_site::{
    Chart, Cover, Map, MapId, NodeId, PairWitness, Site, TripleWitness, WitnessTable, pair_key,
};
use std::collections::BTreeMap;

/// The fixed two-chart base world shared by all toy data.
pub struct ToyWorld {
    pub site: Site,
    pub cover: Cover,
    pub witnesses: WitnessTable,
    pub transport: TransportTable,
}

/// One fiber of the toy world: object `c` and twist `g` with
/// g ≫ g = id.
fn twist_fiber() -> Fiber {
    let mut fiber = Fiber::new();
    let c = fiber.add_object("c");
    let g = fiber
        .add_hom(Hom::new("g", c.clone(), c.clone()))
        .expect("toy fiber is well-formed");
    let id_c = fiber.identity(&c).expect("c was just added").clone();
    fiber
        .set_composite(&g, &g, &id_c)
        .expect("toy fiber is well-formed");
    fiber.set_inverse(&g, &g).expect("g is self-inverse");
    fiber
}

/// Assign the identity-shaped action (c ↦ c, g ↦ g) along a map
/// between two twist fibers.
fn assign_constant(transport: &mut TransportTable, map: &Map) {
    transport
        .assign(
            map,
            vec![(ObjId::new("c"), ObjId::new("c"))],
            vec![
                (HomId::new("g"), HomId::new("g")),
                (HomId::new("id@c"), HomId::new("id@c")),
            ],
        )
        .expect("toy fibers are registered");
}

/// Build the two-chart world: charts x1, x2 over s, overlap o, all
/// four pair witnesses and three triple witnesses registered.
pub fn two_chart_world() -> ToyWorld {
    let mut site = Site::new();
    let s = site.add_node("s");
    let x1 = site.add_node("x1");
    let x2 = site.add_node("x2");
    let o = site.add_node("o");

    let a1 = site
        .add_map(Map::new("a1", x1.clone(), s.clone()))
        .expect("nodes are registered");
    let a2 = site
        .add_map(Map::new("a2", x2.clone(), s.clone()))
        .expect("nodes are registered");
    let o1 = site
        .add_map(Map::new("o1", o.clone(), x1.clone()))
        .expect("nodes are registered");
    let o2 = site
        .add_map(Map::new("o2", o.clone(), x2.clone()))
        .expect("nodes are registered");
    let os = site
        .add_map(Map::new("os", o.clone(), s.clone()))
        .expect("nodes are registered");
    site.set_composite(&o1, &a1, &os).expect("endpoints line up");
    site.set_composite(&o2, &a2, &os).expect("endpoints line up");

    let cover = Cover::new(
        s.clone(),
        "two-charts",
        vec![
            Chart {
                index: "1".into(),
                node: x1.clone(),
                to_base: a1.clone(),
            },
            Chart {
                index: "2".into(),
                node: x2.clone(),
                to_base: a2.clone(),
            },
        ],
    );

    let id_x1 = site.identity(&x1).expect("x1 is registered").clone();
    let id_x2 = site.identity(&x2).expect("x2 is registered").clone();
    let id_o = site.identity(&o).expect("o is registered").clone();

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

    // One triple witness per ordered chart triple: the all-same triples
    // sit on the chart node itself, the mixed ones on the overlap o.
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
                    let (node, ident) = if i == "1" { (&x1, &id_x1) } else { (&x2, &id_x2) };
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

    let mut transport = TransportTable::strict();
    transport.add_fiber(s.clone(), twist_fiber());
    transport.add_fiber(x1.clone(), twist_fiber());
    transport.add_fiber(x2.clone(), twist_fiber());
    transport.add_fiber(o.clone(), twist_fiber());

    for node in [&s, &x1, &x2, &o] {
        transport
            .assign_identity(&Map::new(format!("id@{node}"), node.clone(), node.clone()))
            .expect("fiber is registered");
    }
    assign_constant(&mut transport, &Map::new("a1", x1.clone(), s.clone()));
    assign_constant(&mut transport, &Map::new("a2", x2.clone(), s.clone()));
    assign_constant(&mut transport, &Map::new("o1", o.clone(), x1));
    assign_constant(&mut transport, &Map::new("o2", o.clone(), x2));
    assign_constant(&mut transport, &Map::new("os", o, s));

    ToyWorld {
        site,
        cover,
        witnesses,
        transport,
    }
}

/// Transition table with the given homs on the mixed pairs; the self
/// pairs are always identities unless overridden.
fn transitions(
    self_1: &str,
    hom_12: &str,
    hom_21: &str,
) -> BTreeMap<String, HomId> {
    [
        (pair_key("1", "1"), HomId::new(self_1)),
        (pair_key("2", "2"), HomId::new("id@c")),
        (pair_key("1", "2"), HomId::new(hom_12)),
        (pair_key("2", "1"), HomId::new(hom_21)),
    ]
    .into_iter()
    .collect()
}

/// The constant local data: `c` on both charts.
pub fn constant_objs() -> BTreeMap<String, ObjId> {
    [
        ("1".to_string(), ObjId::new("c")),
        ("2".to_string(), ObjId::new("c")),
    ]
    .into_iter()
    .collect()
}

/// Golden transition data: every transition is an identity.
pub fn constant_homs() -> BTreeMap<String, HomId> {
    transitions("id@c", "id@c", "id@c")
}

/// Adversarial data violating the self law: hom(1,1) is the twist.
pub fn twisted_self_homs() -> BTreeMap<String, HomId> {
    transitions("g", "id@c", "id@c")
}

/// Adversarial data violating the cocycle law: hom(1,2) is the twist
/// but hom(2,1) is not its inverse.
pub fn twisted_cycle_homs() -> BTreeMap<String, HomId> {
    transitions("id@c", "g", "id@c")
}

/// Coherent non-trivial data: hom(1,2) is the twist and hom(2,1) is
/// its inverse, so every cocycle closes.
pub fn twisted_pair_homs() -> BTreeMap<String, HomId> {
    transitions("id@c", "g", "g")
}

/// The identity map on the overlap node, for restriction tests.
pub fn overlap_identity(world: &ToyWorld) -> MapId {
    world
        .site
        .identity(&NodeId::new("o"))
        .expect("o is registered")
        .clone()
}
