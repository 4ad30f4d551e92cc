//! # Glueon Fiber
//!
//! State spaces for the gluing engine. Every base node X carries a
//! fiber Def(X) of local data; every base map f: Y → X carries a
//! transport functor f*: Def(X) → Def(Y) pulling that data back,
//! coherent with composition and identities up to isomorphism.
//!
//! ```text
//! ObjId / HomId / Hom       ← local data and the homs between them
//!     │
//! Fiber                     ← finite category over one node
//!     │
//! Transport                 ← f*: Def(X) → Def(Y), unit/comp isos
//!     │
//! TransportTable            ← table-backed realization, strict mode
//! ```
//!
//! The crate does not prescribe what local data are; it only prescribes
//! how they move along base maps.

pub mod error;
pub mod fiber;
pub mod transport;

pub use error::FiberError;
pub use fiber::{Fiber, Hom, HomId, ObjId};
pub use transport::{Transport, TransportTable};
