//! # Glueon Site
//!
//! The base domain of the gluing engine: a finite presented category of
//! nodes and maps, covers {f_i: X_i → S} of a base node, and overlap
//! witnesses P_ij with their projections and universal factoring.
//!
//! The crate is deliberately table-driven: composition and equality of
//! maps are decided by lookup, so every law the descent layer states
//! about maps is checkable rather than assumed.
//!
//! ## Architecture
//!
//! ```text
//! NodeId / MapId / Map      ← objects and morphisms of the base C
//!     │
//! Site                      ← finite composition tables, category laws
//!     │
//! Cover / Chart             ← families {f_i: X_i → S}
//!     │
//! PairWitness / TripleWitness
//!     │                     ← overlaps P_ij, triples sq₃(i1,i2,i3)
//! WitnessTable::factor      ← the universal property, as an algorithm
//! ```

pub mod cover;
pub mod error;
pub mod map;
pub mod site;
pub mod witness;

pub use cover::{Chart, Cover};
pub use error::SiteError;
pub use map::{Map, MapId, NodeId};
pub use site::Site;
pub use witness::{Factorization, PairWitness, TripleWitness, WitnessTable, pair_key, triple_key};
