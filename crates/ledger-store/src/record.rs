use domain::Item;

/// Version number for a stored ledger entry, used for optimistic
/// concurrency control.
///
/// Versions start at 1 when an entry is inserted and increment by 1 on
/// every successful save.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version(i64);

impl Version {
    /// Creates a version from a raw value.
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// Returns the version of a freshly inserted entry (1).
    pub fn first() -> Self {
        Self(1)
    }

    /// Returns the next version.
    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }

    /// Returns the raw version value.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for Version {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<Version> for i64 {
    fn from(version: Version) -> Self {
        version.0
    }
}

/// A ledger entry together with the version it was read at.
///
/// The version pins a save to the exact state the caller read. A save
/// whose version no longer matches the stored one fails with
/// [`crate::LedgerError::VersionConflict`] instead of overwriting a
/// concurrent writer's commit.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemRecord {
    /// The ledger entry.
    pub item: Item,

    /// The version the entry was read at (or assigned on insert).
    pub version: Version,
}

impl ItemRecord {
    /// Wraps a new entry at the initial version.
    pub fn new(item: Item) -> Self {
        Self {
            item,
            version: Version::first(),
        }
    }

    /// Returns the identifier of the wrapped entry.
    pub fn id(&self) -> common::ItemId {
        self.item.id
    }
}
