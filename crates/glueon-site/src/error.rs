//! Error types for base-domain operations.

/// Errors arising from malformed sites, covers, or witness tables, and
/// from precondition violations on the factoring operation.
#[derive(Debug, thiserror::Error)]
pub enum SiteError {
    /// A node identifier is not registered in the site.
    #[error("unknown node: {0}")]
    UnknownNode(String),

    /// A map identifier is not registered in the site.
    #[error("unknown map: {0}")]
    UnknownMap(String),

    /// Two maps were composed whose endpoints do not line up.
    #[error("maps not composable: {first} then {second}")]
    NotComposable { first: String, second: String },

    /// A composable pair has no entry in the composition table.
    #[error("missing composite: {first} then {second}")]
    MissingComposite { first: String, second: String },

    /// The site tables violate the category laws.
    #[error("invalid site: {description}")]
    InvalidSite { description: String },

    /// A cover chart index is not present in the cover.
    #[error("unknown chart: {0}")]
    UnknownChart(String),

    /// No overlap witness is registered for the requested charts.
    #[error("missing witness: {description}")]
    MissingWitness { description: String },

    /// A witness fails its commutation equations.
    #[error("invalid witness: {description}")]
    InvalidWitness { description: String },

    /// Factoring inputs do not commute with the claimed base map.
    #[error("invalid factoring: {description}")]
    InvalidFactoring { description: String },

    /// A witness is not universal: zero or several factorings exist.
    #[error("witness not universal: {description}")]
    NotUniversal { description: String },
}
