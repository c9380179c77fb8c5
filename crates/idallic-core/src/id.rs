//! Identifier types.
//!
//! `NodeId` is a slotmap key: stable across removals, cheap to copy, and
//! never reused for a different node within one world. Catalog identifiers
//! (`ResourceId`, `RecipeId`) are plain indices assigned at registration
//! time and valid for the lifetime of the catalog that issued them.

use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

new_key_type! {
    /// Identifies a placed production or consumption node.
    pub struct NodeId;
}

/// Identifies a registered resource kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ResourceId(pub u32);

/// Identifies a registered recipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RecipeId(pub u32);

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn resource_ids_compare_by_index() {
        assert_eq!(ResourceId(3), ResourceId(3));
        assert_ne!(ResourceId(3), ResourceId(4));
        assert!(ResourceId(1) < ResourceId(2));
    }

    #[test]
    fn ids_work_as_map_keys() {
        let mut map = HashMap::new();
        map.insert(RecipeId(0), "dirt");
        map.insert(RecipeId(1), "mud");
        assert_eq!(map.get(&RecipeId(1)), Some(&"mud"));
    }
}
