//! Centrality traits.

use crate::error::Result;
use crate::network::DirectedNetwork;

/// A node-level centrality measure.
pub trait Centrality {
    /// Canonical name of the measure.
    fn name(&self) -> &'static str;

    /// Score every node of `network`.
    ///
    /// Returns one value per node, indexed by node index.
    fn compute(&self, network: &DirectedNetwork) -> Result<Vec<f64>>;
}
