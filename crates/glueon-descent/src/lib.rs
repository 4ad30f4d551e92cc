//! # Glueon Descent
//!
//! The gluing engine: assemble one globally consistent structure out of
//! locally defined fragments attached to the charts of a cover.
//!
//! Local data obj(i) live in the fibers over the charts X_i; transition
//! data hom(i,j) live over the overlap witnesses P_ij and reconcile the
//! two restrictions of neighbouring fragments. Valid gluing data
//! satisfies two laws:
//!
//! - *self consistency*: hom(i,i) restricted along the identity is the
//!   identity;
//! - *cocycle*: on every triple overlap, reconciling i1 with i2 and
//!   then i2 with i3 agrees with reconciling i1 with i3 directly.
//!
//! ## Architecture
//!
//! ```text
//! Site / Cover / WitnessTable   ← base domain (glueon-site)
//!     │
//! Fiber / Transport             ← state spaces (glueon-fiber)
//!     │
//! Descent::pull_hom             ← restriction along arbitrary maps
//!     │
//! GluedDatum + GluedHom         ← fixed-witness presentation, checked
//!     │                           at construction
//! CanonicalDatum + CanonicalHom ← witness-free presentation
//!     │
//! to_canonical / from_canonical ← lossless conversion between the two
//! ```
//!
//! Everything is checked when a value is constructed; constructed
//! values are immutable and their derived operations are total.

pub mod canonical;
pub mod engine;
pub mod equiv;
pub mod error;
pub mod glued;
pub mod hash;
pub mod morphism;
pub mod toy;

pub use canonical::{
    CanonicalDatum, CanonicalHom, CompatiblePair, GluingData, transition_key,
};
pub use engine::Descent;
pub use equiv::{from_canonical, hom_from_canonical, hom_to_canonical, to_canonical};
pub use error::{DescentError, Law, Severity, Violation};
pub use glued::GluedDatum;
pub use hash::ContentHash;
pub use morphism::{GluedHom, GluedIso};
