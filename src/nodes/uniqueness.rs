//! Seed tokens and the sibling collision check that keeps them unique

use super::schema_node::SchemaNode;
use super::slot::NodeId;
use crate::constants::seed;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Per-node token prefixed to every application id the node emits
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Seed(String);

impl Seed {
    /// Fresh token: SHA-256 of a random UUID, first 20 lowercase hex characters
    pub fn generate() -> Self {
        let uuid = uuid::Uuid::new_v4().to_string();
        let digest = Sha256::digest(uuid.as_bytes());
        let hex: String = digest.iter().map(|byte| format!("{:02x}", byte)).collect();
        Seed(hex[..seed::LENGTH].to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for Seed {
    fn from(value: String) -> Self {
        Seed(value)
    }
}

impl From<&str> for Seed {
    fn from(value: &str) -> Self {
        Seed(value.to_string())
    }
}

impl fmt::Display for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Finds another node of the same declared type that already uses a seed
pub trait SiblingSeedLookup {
    fn find_collision(&self, declared_type: &str, seed: &Seed, exclude: NodeId) -> Option<NodeId>;
}

/// Regenerates the node's seed when a sibling already uses it.
///
/// Only the first collision is handled; the new seed is not re-checked.
pub fn ensure_unique<L>(node: &mut SchemaNode, siblings: &L) -> bool
where
    L: SiblingSeedLookup + ?Sized,
{
    let collision = siblings.find_collision(node.declared_type(), node.seed(), node.id);
    match collision {
        Some(other) => {
            node.set_seed(Seed::generate());
            log::info!(
                "Node {} shared its seed with node {}; regenerated as {}",
                node.id,
                other,
                node.seed()
            );
            true
        }
        None => false,
    }
}

impl SiblingSeedLookup for [SchemaNode] {
    fn find_collision(&self, declared_type: &str, seed: &Seed, exclude: NodeId) -> Option<NodeId> {
        self.iter()
            .find(|node| {
                node.id != exclude && node.declared_type() == declared_type && node.seed() == seed
            })
            .map(|node| node.id)
    }
}
