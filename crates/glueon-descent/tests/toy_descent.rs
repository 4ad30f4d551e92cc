//! End-to-end descent tests over the toy two-chart world.
//!
//! The world: charts x1, x2 covering s with overlap o; every fiber has
//! one local datum `c` and a self-inverse twist `g`. Different
//! transition tables exercise the engine's construction-time law
//! checking, restriction, morphisms, and the equivalence between the
//! fixed-witness and canonical presentations.

use glueon_descent::engine::Descent;
use glueon_descent::toy::{
    constant_homs, constant_objs, overlap_identity, twisted_cycle_homs, twisted_pair_homs,
    twisted_self_homs, two_chart_world, ToyWorld,
};
use glueon_descent::{
    from_canonical, hom_from_canonical, hom_to_canonical, to_canonical, DescentError, GluedDatum,
    GluingData, Law,
};
use glueon_fiber::{HomId, ObjId, Transport, TransportTable};
use glueon_site::{MapId, NodeId, SiteError, WitnessTable};
use std::collections::BTreeMap;

fn descent(world: &ToyWorld) -> Descent<'_, TransportTable> {
    Descent::new(
        &world.site,
        &world.cover,
        &world.witnesses,
        &world.transport,
    )
    .expect("toy world is well-formed")
}

fn golden(descent: &Descent<'_, TransportTable>) -> GluedDatum {
    descent
        .glue("two-charts", constant_objs(), constant_homs())
        .expect("constant data glues")
}

fn twisted_pair(descent: &Descent<'_, TransportTable>) -> GluedDatum {
    descent
        .glue("two-charts", constant_objs(), twisted_pair_homs())
        .expect("twist with its inverse glues")
}

#[test]
fn golden_constant_data_glues() {
    let world = two_chart_world();
    let descent = descent(&world);
    let datum = golden(&descent);
    assert_eq!(datum.obj("1").unwrap().0, "c");
    assert_eq!(datum.obj("2").unwrap().0, "c");
}

#[test]
fn glue_hash_is_deterministic() {
    let world = two_chart_world();
    let descent = descent(&world);
    assert_eq!(golden(&descent).glue_hash(), golden(&descent).glue_hash());
    assert_ne!(
        golden(&descent).glue_hash(),
        twisted_pair(&descent).glue_hash()
    );
}

#[test]
fn pairs_only_witness_table_rejected() {
    // A witness table with no triple witnesses would let law-violating
    // transition data through gluing unchecked, so the context refuses
    // to construct.
    let world = two_chart_world();
    let mut pruned = WitnessTable::new();
    for left in ["1", "2"] {
        for right in ["1", "2"] {
            pruned.add_pair(world.witnesses.pair(left, right).unwrap().clone());
        }
    }
    let err = Descent::new(&world.site, &world.cover, &pruned, &world.transport).unwrap_err();
    assert!(matches!(
        err,
        DescentError::Site(SiteError::MissingWitness { .. })
    ));
}

#[test]
fn spurious_datum_entries_rejected() {
    let world = two_chart_world();
    let descent = descent(&world);

    let mut objs = constant_objs();
    objs.insert("3".to_string(), ObjId::new("c"));
    let err = descent
        .glue("two-charts", objs, constant_homs())
        .unwrap_err();
    assert!(matches!(err, DescentError::InvalidDatum { .. }));

    let mut homs = constant_homs();
    homs.insert("9:9".to_string(), HomId::new("id@c"));
    let err = descent
        .glue("two-charts", constant_objs(), homs)
        .unwrap_err();
    assert!(matches!(err, DescentError::InvalidDatum { .. }));
}

#[test]
fn adversarial_self_law_failure() {
    let world = two_chart_world();
    let descent = descent(&world);
    let err = descent
        .glue("two-charts", constant_objs(), twisted_self_homs())
        .unwrap_err();
    match err {
        DescentError::CocycleViolation { violations } => {
            assert!(violations.iter().any(|v| v.law == Law::SelfConsistency));
        }
        other => panic!("expected cocycle violation, got {other:?}"),
    }
}

#[test]
fn adversarial_cocycle_failure() {
    let world = two_chart_world();
    let descent = descent(&world);
    let err = descent
        .glue("two-charts", constant_objs(), twisted_cycle_homs())
        .unwrap_err();
    match err {
        DescentError::CocycleViolation { violations } => {
            assert!(violations.iter().any(|v| v.law == Law::Cocycle));
        }
        other => panic!("expected cocycle violation, got {other:?}"),
    }
}

#[test]
fn restriction_at_the_witness_recovers_the_transition() {
    let world = two_chart_world();
    let descent = descent(&world);
    let datum = twisted_pair(&descent);
    let pulled = descent
        .pull_hom(
            &datum,
            &MapId::new("os"),
            ("1", &MapId::new("o1")),
            ("2", &MapId::new("o2")),
        )
        .unwrap();
    assert_eq!(pulled, HomId::new("g"));
}

#[test]
fn restriction_rejects_non_factoring_inputs() {
    let world = two_chart_world();
    let descent = descent(&world);
    let datum = golden(&descent);
    // Claimed base map a1 does not match the composites through os.
    let err = descent
        .pull_hom(
            &datum,
            &MapId::new("a1"),
            ("1", &MapId::new("o1")),
            ("2", &MapId::new("o2")),
        )
        .unwrap_err();
    assert!(matches!(
        err,
        DescentError::Site(SiteError::InvalidFactoring { .. })
    ));
}

#[test]
fn self_law_holds_on_every_chart() {
    let world = two_chart_world();
    let descent = descent(&world);
    let datum = golden(&descent);
    descent.check_self_law(&datum, "1").unwrap();
    descent.check_self_law(&datum, "2").unwrap();
}

#[test]
fn general_cocycle_law_holds_at_the_overlap() {
    let world = two_chart_world();
    let descent = descent(&world);
    let datum = twisted_pair(&descent);
    let os = MapId::new("os");
    let o1 = MapId::new("o1");
    let o2 = MapId::new("o2");
    // Reconcile 1 with 2, then 2 back with 1: must close up to the
    // direct self restriction.
    descent
        .check_cocycle(&datum, &os, ("1", &o1), ("2", &o2), ("1", &o1))
        .unwrap();
    descent
        .check_cocycle(&datum, &os, ("1", &o1), ("2", &o2), ("2", &o2))
        .unwrap();
}

#[test]
fn precomposition_stability() {
    let world = two_chart_world();
    let descent = descent(&world);
    let datum = twisted_pair(&descent);
    let id_x1 = world.site.identity(&NodeId::new("x1")).unwrap().clone();
    descent
        .check_precomposition(
            &datum,
            &MapId::new("o1"),
            &MapId::new("a1"),
            ("1", &id_x1),
            ("1", &id_x1),
        )
        .unwrap();
}

#[test]
fn precomposition_associates() {
    // Two successive precompositions agree with the single composite
    // precomposition: pulling at x1 and transporting along o1 then
    // along id@o equals pulling at o along the composite directly.
    let world = two_chart_world();
    let descent = descent(&world);
    let datum = twisted_pair(&descent);

    let id_x1 = world.site.identity(&NodeId::new("x1")).unwrap().clone();
    let o1 = MapId::new("o1");
    let id_o = overlap_identity(&world);

    let at_x1 = descent
        .pull_hom(&datum, &MapId::new("a1"), ("1", &id_x1), ("1", &id_x1))
        .unwrap();
    let stepwise = world
        .transport
        .map_hom(&id_o, &world.transport.map_hom(&o1, &at_x1).unwrap())
        .unwrap();

    let composite = world.site.compose(&id_o, &o1).unwrap();
    let direct = descent
        .pull_hom(&datum, &MapId::new("os"), ("1", &composite), ("1", &composite))
        .unwrap();
    assert_eq!(stepwise, direct);
}

#[test]
fn morphism_construction_and_iso() {
    let world = two_chart_world();
    let descent = descent(&world);
    let src = golden(&descent);
    let dst = twisted_pair(&descent);

    // The twist on chart 2 intertwines the two transition tables.
    let components: BTreeMap<String, HomId> = [
        ("1".to_string(), HomId::new("id@c")),
        ("2".to_string(), HomId::new("g")),
    ]
    .into_iter()
    .collect();

    let iso = descent.iso_mk(&src, &dst, components).unwrap();
    let round = descent.compose_homs(&iso.to, &iso.from).unwrap();
    assert_eq!(round, descent.identity_hom(&src).unwrap());
}

#[test]
fn incompatible_morphism_rejected() {
    let world = two_chart_world();
    let descent = descent(&world);
    let src = golden(&descent);
    let dst = twisted_pair(&descent);

    let components: BTreeMap<String, HomId> = [
        ("1".to_string(), HomId::new("id@c")),
        ("2".to_string(), HomId::new("id@c")),
    ]
    .into_iter()
    .collect();

    let err = descent.hom(&src, &dst, components).unwrap_err();
    match err {
        DescentError::MorphismIncompatible { violations } => {
            assert!(violations.iter().any(|v| v.law == Law::Commuting));
        }
        other => panic!("expected morphism incompatibility, got {other:?}"),
    }
}

#[test]
fn morphism_commutes_with_arbitrary_restrictions() {
    let world = two_chart_world();
    let descent = descent(&world);
    let src = golden(&descent);
    let dst = twisted_pair(&descent);

    let components: BTreeMap<String, HomId> = [
        ("1".to_string(), HomId::new("id@c")),
        ("2".to_string(), HomId::new("g")),
    ]
    .into_iter()
    .collect();
    let hom = descent.hom(&src, &dst, components).unwrap();

    descent
        .check_hom_restriction(
            &src,
            &dst,
            &hom,
            &MapId::new("os"),
            ("1", &MapId::new("o1")),
            ("2", &MapId::new("o2")),
        )
        .unwrap();
}

#[test]
fn violation_report_is_stable() {
    let world = two_chart_world();
    let descent = descent(&world);
    let err = descent
        .glue("two-charts", constant_objs(), twisted_self_homs())
        .unwrap_err();
    let DescentError::CocycleViolation { violations } = err else {
        panic!("expected cocycle violation");
    };
    insta::assert_json_snapshot!(violations, @r#"
    [
      {
        "law": "self_consistency",
        "severity": "error",
        "charts": "1:1",
        "description": "restriction of hom(1,1) along the identity is g, expected id@c"
      },
      {
        "law": "cocycle",
        "severity": "error",
        "charts": "1:1:1",
        "description": "restrictions compose to id@c but the direct restriction is g"
      },
      {
        "law": "cocycle",
        "severity": "error",
        "charts": "1:1:2",
        "description": "restrictions compose to g but the direct restriction is id@c"
      },
      {
        "law": "cocycle",
        "severity": "error",
        "charts": "1:2:1",
        "description": "restrictions compose to id@c but the direct restriction is g"
      },
      {
        "law": "cocycle",
        "severity": "error",
        "charts": "2:1:1",
        "description": "restrictions compose to g but the direct restriction is id@c"
      }
    ]
    "#);
}

#[test]
fn glued_datum_serialization_round_trips() {
    let world = two_chart_world();
    let descent = descent(&world);
    let datum = twisted_pair(&descent);
    let json = serde_json::to_string(&datum).expect("glued data serializes");
    let back: GluedDatum = serde_json::from_str(&json).expect("glued data deserializes");
    assert_eq!(back, datum);
}

#[test]
fn round_trip_through_the_canonical_presentation() {
    let world = two_chart_world();
    let descent = descent(&world);
    for datum in [golden(&descent), twisted_pair(&descent)] {
        let canonical = to_canonical(&descent, &datum).unwrap();
        let back = from_canonical(&descent, &canonical).unwrap();
        assert_eq!(back, datum);

        let there_again = to_canonical(&descent, &back).unwrap();
        assert_eq!(there_again, canonical);
    }
}

#[test]
fn both_presentations_answer_the_same_transition_query() {
    let world = two_chart_world();
    let descent = descent(&world);
    let datum = twisted_pair(&descent);
    let canonical = to_canonical(&descent, &datum).unwrap();

    let q = MapId::new("os");
    let o1 = MapId::new("o1");
    let o2 = MapId::new("o2");
    let from_witnesses = datum
        .transition(&descent, &q, ("1", &o1), ("2", &o2))
        .unwrap();
    let from_table = canonical
        .transition(&descent, &q, ("1", &o1), ("2", &o2))
        .unwrap();
    assert_eq!(from_witnesses, from_table);
}

#[test]
fn morphism_round_trip_through_the_canonical_presentation() {
    let world = two_chart_world();
    let descent = descent(&world);
    let src = golden(&descent);
    let dst = twisted_pair(&descent);
    let src_can = to_canonical(&descent, &src).unwrap();
    let dst_can = to_canonical(&descent, &dst).unwrap();

    let components: BTreeMap<String, HomId> = [
        ("1".to_string(), HomId::new("id@c")),
        ("2".to_string(), HomId::new("g")),
    ]
    .into_iter()
    .collect();
    let hom = descent.hom(&src, &dst, components).unwrap();

    let canonical_hom = hom_to_canonical(&descent, &src_can, &dst_can, &hom).unwrap();
    let back = hom_from_canonical(&descent, &src, &dst, &canonical_hom).unwrap();
    assert_eq!(back, hom);
}

#[test]
fn tampered_canonical_table_rejected() {
    let world = two_chart_world();
    let descent = descent(&world);
    let datum = golden(&descent);
    let canonical = to_canonical(&descent, &datum).unwrap();

    let mut transitions = canonical.transitions.clone();
    transitions.insert(
        glueon_descent::transition_key("1", &MapId::new("o1"), "2", &MapId::new("o2")),
        HomId::new("g"),
    );
    let err = descent
        .canonical("two-charts", canonical.objs.clone(), transitions)
        .unwrap_err();
    assert!(matches!(err, DescentError::CocycleViolation { .. }));
}

#[test]
fn incomplete_canonical_table_rejected() {
    let world = two_chart_world();
    let descent = descent(&world);
    let datum = golden(&descent);
    let canonical = to_canonical(&descent, &datum).unwrap();

    let mut transitions = canonical.transitions.clone();
    let removed = transitions.keys().next().unwrap().clone();
    transitions.remove(&removed);
    let err = descent
        .canonical("two-charts", canonical.objs.clone(), transitions)
        .unwrap_err();
    assert!(matches!(err, DescentError::InvalidDatum { .. }));
}
