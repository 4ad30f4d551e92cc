//! Conversion between the two presentations of glued data.
//!
//! `to_canonical` expands a fixed-witness datum into the total
//! transition table by restriction; `from_canonical` specializes a
//! canonical datum back to the witness projections. Both go through
//! the checked constructors, so the laws of the target presentation
//! are re-established rather than assumed; that is the content of the
//! equivalence.
//!
//! Over a strict transport the round trips are equalities on the nose;
//! in general they hold up to the transport coherence isos.

use crate::canonical::{CanonicalDatum, CanonicalHom, transition_key};
use crate::engine::Descent;
use crate::error::DescentError;
use crate::glued::GluedDatum;
use crate::morphism::GluedHom;
use glueon_fiber::Transport;
use glueon_site::pair_key;
use std::collections::BTreeMap;

/// Expand a fixed-witness datum into canonical form: the transition at
/// every compatible map pair is its restriction.
pub fn to_canonical<T: Transport>(
    descent: &Descent<'_, T>,
    datum: &GluedDatum,
) -> Result<CanonicalDatum, DescentError> {
    let mut transitions = BTreeMap::new();
    for p in descent.compatible_pairs()? {
        let hom = descent.pull_hom(
            datum,
            &p.q,
            (&p.left_index, &p.f1),
            (&p.right_index, &p.f2),
        )?;
        transitions.insert(
            transition_key(&p.left_index, &p.f1, &p.right_index, &p.f2),
            hom,
        );
    }
    descent.canonical(datum.cover_id.clone(), datum.objs.clone(), transitions)
}

/// Specialize a canonical datum to the fixed witnesses: the transition
/// datum of each ordered pair is the table entry at the projections.
pub fn from_canonical<T: Transport>(
    descent: &Descent<'_, T>,
    datum: &CanonicalDatum,
) -> Result<GluedDatum, DescentError> {
    let mut homs = BTreeMap::new();
    for a in &descent.cover.charts {
        for b in &descent.cover.charts {
            let witness = descent.witnesses.pair(&a.index, &b.index)?;
            let hom = datum
                .transition_at(&a.index, &witness.p1, &b.index, &witness.p2)?
                .clone();
            homs.insert(pair_key(&a.index, &b.index), hom);
        }
    }
    descent.glue(datum.cover_id.clone(), datum.objs.clone(), homs)
}

/// Carry a morphism of glued data over to the canonical presentation.
///
/// Components are unchanged; the general commuting condition is
/// re-established by the checked constructor.
pub fn hom_to_canonical<T: Transport>(
    descent: &Descent<'_, T>,
    src: &CanonicalDatum,
    dst: &CanonicalDatum,
    hom: &GluedHom,
) -> Result<CanonicalHom, DescentError> {
    descent.canonical_hom(src, dst, hom.components.clone())
}

/// Carry a morphism of canonical data back to the fixed-witness
/// presentation.
pub fn hom_from_canonical<T: Transport>(
    descent: &Descent<'_, T>,
    src: &GluedDatum,
    dst: &GluedDatum,
    hom: &CanonicalHom,
) -> Result<GluedHom, DescentError> {
    descent.hom(src, dst, hom.components.clone())
}
