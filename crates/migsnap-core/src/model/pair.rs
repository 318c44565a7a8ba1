use serde::{Deserialize, Serialize};

/// One (unit, version) fact: a migration `version` applied within `unit`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MigrationPair {
    pub unit: String,
    pub version: String,
}

impl MigrationPair {
    pub fn new(unit: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            unit: unit.into(),
            version: version.into(),
        }
    }
}

impl std::fmt::Display for MigrationPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.unit, self.version)
    }
}

impl<U: Into<String>, V: Into<String>> From<(U, V)> for MigrationPair {
    fn from((unit, version): (U, V)) -> Self {
        Self::new(unit, version)
    }
}

/// A row of the migration ledger, as seen by the ledger reader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    /// Ledger ordinal; higher means applied later
    pub id: i64,
    pub unit: String,
    pub version: String,
}

impl LedgerEntry {
    pub fn pair(&self) -> MigrationPair {
        MigrationPair::new(self.unit.clone(), self.version.clone())
    }
}
