//! Gateway group ownership.
//!
//! Each gateway instance serves a subset of gateway groups; requests for an
//! app whose group lives elsewhere were routed to the wrong instance.

use std::collections::HashSet;
use std::sync::Arc;

use apiguard_core::{CoreError, GroupId};

/// Reports which gateway groups the current instance serves.
pub trait TopologyProvider: Send + Sync {
    /// The ids of the groups served by this instance.
    fn owned_group_ids(&self) -> Arc<HashSet<GroupId>>;
}

/// A fixed set of owned groups, typically from configuration.
#[derive(Debug, Clone, Default)]
pub struct StaticTopology {
    groups: Arc<HashSet<GroupId>>,
}

impl StaticTopology {
    /// Serve exactly the given groups.
    #[must_use]
    pub fn new<I: IntoIterator<Item = GroupId>>(groups: I) -> Self {
        Self {
            groups: Arc::new(groups.into_iter().collect()),
        }
    }

    /// Parse a comma-separated list of group ids, e.g. `"a,b"`.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidGroupId` for an entry that is not a single
    /// character.
    pub fn parse(source: &str) -> Result<Self, CoreError> {
        let groups = source
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::parse)
            .collect::<Result<HashSet<GroupId>, _>>()?;
        Ok(Self {
            groups: Arc::new(groups),
        })
    }
}

impl TopologyProvider for StaticTopology {
    fn owned_group_ids(&self) -> Arc<HashSet<GroupId>> {
        Arc::clone(&self.groups)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_group_list() {
        let topology = StaticTopology::parse("a, b,").unwrap();
        let owned = topology.owned_group_ids();
        assert_eq!(owned.len(), 2);
        assert!(owned.contains(&GroupId::new('a')));
        assert!(owned.contains(&GroupId::new('b')));
    }

    #[test]
    fn parse_rejects_long_ids() {
        assert!(StaticTopology::parse("a,bc").is_err());
    }

    #[test]
    fn empty_topology_owns_nothing() {
        assert!(StaticTopology::default().owned_group_ids().is_empty());
        assert!(StaticTopology::parse("").unwrap().owned_group_ids().is_empty());
    }
}
