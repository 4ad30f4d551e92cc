//! Covers of the base.
//!
//! A cover of a base node S is a family of charts {f_i: X_i → S}. Each
//! chart carries a caller-chosen index label; transition data downstream
//! is keyed by ordered pairs of these labels.
//!
//! How a base comes to be covered is the provider's business; the
//! engine only consumes the family.

use crate::error::SiteError;
use crate::map::{MapId, NodeId};
use crate::site::Site;
use serde::{Deserialize, Serialize};

/// One chart of a cover: the map f_i: X_i → S.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chart {
    /// Index label i.
    pub index: String,

    /// The chart node X_i.
    pub node: NodeId,

    /// The covering map f_i: X_i → S.
    pub to_base: MapId,
}

/// A cover of a base node: a family of charts {f_i: X_i → S}.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cover {
    /// The node being covered.
    pub base: NodeId,

    /// Identifier for this cover.
    pub id: String,

    /// The charts, in declaration order.
    pub charts: Vec<Chart>,
}

impl Cover {
    pub fn new(base: NodeId, id: impl Into<String>, charts: Vec<Chart>) -> Self {
        Self {
            base,
            id: id.into(),
            charts,
        }
    }

    /// Number of charts.
    pub fn len(&self) -> usize {
        self.charts.len()
    }

    /// Whether the cover has no charts.
    pub fn is_empty(&self) -> bool {
        self.charts.is_empty()
    }

    /// Look up a chart by its index label.
    pub fn chart(&self, index: &str) -> Result<&Chart, SiteError> {
        self.charts
            .iter()
            .find(|c| c.index == index)
            .ok_or_else(|| SiteError::UnknownChart(index.to_string()))
    }

    /// Check that every chart map exists in the site, runs X_i → S, and
    /// that no index label repeats.
    pub fn validate(&self, site: &Site) -> Result<(), SiteError> {
        for (n, chart) in self.charts.iter().enumerate() {
            let f = site.map(&chart.to_base)?;
            if f.source != chart.node || f.target != self.base {
                return Err(SiteError::InvalidSite {
                    description: format!(
                        "chart {} map {} does not run {} → {}",
                        chart.index, chart.to_base, chart.node, self.base
                    ),
                });
            }
            if self.charts[..n].iter().any(|c| c.index == chart.index) {
                return Err(SiteError::InvalidSite {
                    description: format!("duplicate chart index: {}", chart.index),
                });
            }
        }
        Ok(())
    }
}
