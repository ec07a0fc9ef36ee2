//! Mock roster oracle.

use insignia_core::{Readiness, ReadinessHandle, RoleName, RosterEffects};
use parking_lot::Mutex;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Default)]
struct RosterTable {
    /// display name -> roles; presence in the map means roster membership
    members: BTreeMap<String, BTreeSet<RoleName>>,
    queries: u64,
}

/// Role table keyed by display name, with a readiness latch.
///
/// Queries answer `false` for everyone until the roster is marked ready,
/// like a roster that has not finished loading.
#[derive(Debug)]
pub struct MockRoster {
    table: Mutex<RosterTable>,
    handle: ReadinessHandle,
    readiness: Readiness,
}

impl MockRoster {
    /// A roster that is not ready yet.
    pub fn new() -> Self {
        let (handle, readiness) = Readiness::new();
        Self {
            table: Mutex::new(RosterTable::default()),
            handle,
            readiness,
        }
    }

    /// A roster that is already ready.
    pub fn ready() -> Self {
        let roster = Self::new();
        roster.mark_ready();
        roster
    }

    /// Put `display_name` on the roster with `roles`.
    pub fn add_member<I, R>(&self, display_name: &str, roles: I)
    where
        I: IntoIterator<Item = R>,
        R: Into<RoleName>,
    {
        let mut table = self.table.lock();
        table
            .members
            .entry(display_name.to_string())
            .or_default()
            .extend(roles.into_iter().map(Into::into));
    }

    /// Drop `display_name` from the roster.
    pub fn remove_member(&self, display_name: &str) {
        self.table.lock().members.remove(display_name);
    }

    /// Flip the roster to ready and release waiters.
    pub fn mark_ready(&self) {
        tracing::debug!("Mock roster marked ready");
        self.handle.mark_ready();
    }

    /// Number of role/membership queries answered so far.
    pub fn query_count(&self) -> u64 {
        self.table.lock().queries
    }
}

impl Default for MockRoster {
    fn default() -> Self {
        Self::new()
    }
}

impl RosterEffects for MockRoster {
    fn is_ready(&self) -> bool {
        self.handle.is_ready()
    }

    fn readiness(&self) -> Readiness {
        self.readiness.clone()
    }

    fn has_role(&self, display_name: &str, role: &RoleName) -> bool {
        let ready = self.is_ready();
        let mut table = self.table.lock();
        table.queries += 1;
        ready
            && table
                .members
                .get(display_name)
                .is_some_and(|roles| roles.contains(role))
    }

    fn is_roster_member(&self, display_name: &str) -> bool {
        let ready = self.is_ready();
        let mut table = self.table.lock();
        table.queries += 1;
        ready && table.members.contains_key(display_name)
    }
}
