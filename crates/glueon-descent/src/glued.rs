//! Glued data: the fixed-witness presentation.
//!
//! A glued datum over a cover {f_i: X_i → S} consists of:
//! - local data: one obj(i) in the fiber of X_i per chart,
//! - transition data: one hom(i,j) in the fiber of P_ij per ordered
//!   chart pair, running p1*(obj(i)) → p2*(obj(j)),
//! satisfying the self law and the cocycle law.
//!
//! Values of [`GluedDatum`] are only produced by
//! [`Descent::glue`](crate::engine::Descent::glue), which checks both
//! laws before the value exists; they are immutable afterwards.

use crate::error::DescentError;
use crate::hash::ContentHash;
use glueon_fiber::{HomId, ObjId};
use glueon_site::pair_key;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The complete package of local data and transition data over one
/// cover, with both gluing laws already checked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GluedDatum {
    /// Identifier of the cover this datum is over.
    pub cover_id: String,

    /// Local data: chart index → obj in the fiber of X_i.
    pub objs: BTreeMap<String, ObjId>,

    /// Transition data: `pair_key(i, j)` → hom in the fiber of P_ij.
    pub homs: BTreeMap<String, HomId>,
}

impl GluedDatum {
    /// The local datum of one chart.
    pub fn obj(&self, index: &str) -> Result<&ObjId, DescentError> {
        self.objs
            .get(index)
            .ok_or_else(|| DescentError::MissingTransition {
                description: format!("no local datum for chart {index}"),
            })
    }

    /// The transition datum of one ordered chart pair.
    pub fn hom(&self, left: &str, right: &str) -> Result<&HomId, DescentError> {
        self.homs
            .get(&pair_key(left, right))
            .ok_or_else(|| DescentError::MissingTransition {
                description: format!("no transition datum for ({left}, {right})"),
            })
    }

    /// Deterministic fingerprint of the glued result.
    ///
    /// Hashes local and transition data in canonical order; does not
    /// include the cover identifier, so re-labelled covers with the
    /// same content agree.
    pub fn glue_hash(&self) -> ContentHash {
        let mut builder = ContentHash::builder();
        for (index, obj) in &self.objs {
            builder = builder.field("obj", &format!("{index}={obj}"));
        }
        for (pair, hom) in &self.homs {
            builder = builder.field("hom", &format!("{pair}={hom}"));
        }
        builder.finish()
    }
}
