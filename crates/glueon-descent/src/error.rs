//! Error types and law-violation reporting for the descent engine.

use glueon_fiber::FiberError;
use glueon_site::SiteError;
use serde::{Deserialize, Serialize};

/// Errors arising from descent operations.
///
/// Everything here is a construction-time failure: once a glued datum
/// or morphism exists, the derived operations on it are total.
#[derive(Debug, thiserror::Error)]
pub enum DescentError {
    /// A base-domain error (unknown maps, bad witnesses, factoring
    /// precondition violations).
    #[error(transparent)]
    Site(#[from] SiteError),

    /// A state-space error (unknown fibers, missing transport).
    #[error(transparent)]
    Fiber(#[from] FiberError),

    /// Supplied transition data fails the self or cocycle law.
    #[error("cocycle violation: {} law failure(s)", violations.len())]
    CocycleViolation { violations: Vec<Violation> },

    /// Supplied per-chart morphisms fail the commuting condition.
    #[error("morphism incompatible: {} failure(s)", violations.len())]
    MorphismIncompatible { violations: Vec<Violation> },

    /// A datum is structurally malformed (missing or extra entries).
    #[error("invalid datum: {description}")]
    InvalidDatum { description: String },

    /// A requested transition is not present in the datum.
    #[error("missing transition: {description}")]
    MissingTransition { description: String },
}

/// Which gluing law was violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Law {
    /// hom(i,i) restricted along the identity must be the identity.
    SelfConsistency,

    /// Three-way consistency on triple overlaps.
    Cocycle,

    /// Stability of transitions under precomposition.
    Naturality,

    /// The commuting-square condition on morphisms of glued data.
    Commuting,

    /// A datum entry has the wrong fiber or endpoints.
    Typing,
}

/// Severity of a violation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// A concrete violation of a gluing law.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub law: Law,
    pub severity: Severity,

    /// The chart indices involved, e.g. "1:2" or "1:2:3".
    pub charts: Option<String>,

    pub description: String,
}

impl Violation {
    pub fn error(law: Law, charts: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            law,
            severity: Severity::Error,
            charts: Some(charts.into()),
            description: description.into(),
        }
    }
}
