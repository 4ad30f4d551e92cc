//! Error types for fiber and transport operations.

/// Errors arising from malformed fibers or incomplete transport tables.
#[derive(Debug, thiserror::Error)]
pub enum FiberError {
    /// No fiber is assigned to the given node.
    #[error("no fiber over node: {0}")]
    UnknownFiber(String),

    /// An object identifier is not present in the fiber.
    #[error("unknown object: {0}")]
    UnknownObject(String),

    /// A hom identifier is not present in the fiber.
    #[error("unknown hom: {0}")]
    UnknownHom(String),

    /// Two homs were composed whose endpoints do not line up.
    #[error("homs not composable: {first} then {second}")]
    NotComposable { first: String, second: String },

    /// A composable pair has no entry in the composition table.
    #[error("missing hom composite: {first} then {second}")]
    MissingComposite { first: String, second: String },

    /// A hom has no registered inverse.
    #[error("hom not invertible: {0}")]
    NotInvertible(String),

    /// The fiber tables violate the category laws.
    #[error("invalid fiber: {description}")]
    InvalidFiber { description: String },

    /// A transport table has no assignment for the given map/datum.
    #[error("missing transport: {description}")]
    MissingTransport { description: String },

    /// Transport fails its functoriality or coherence obligations.
    #[error("incoherent transport: {description}")]
    IncoherentTransport { description: String },
}
