//! Compile-time registry of zone tables.
//!
//! Each entry is a `(name, toml_content)` pair embedded via `include_str!`.
//! Adding a jurisdiction requires creating a TOML file in `zones/` and
//! adding a corresponding entry here.

use crate::zone::ZoneTable;

/// Number of registered zone tables. Enforced by a test.
#[cfg(test)]
const EXPECTED_TABLE_COUNT: usize = 2;

/// Embedded TOML zone table definitions.
const ZONE_TOMLS: &[(&str, &str)] = &[
    (
        "riviera_beach",
        include_str!("../zones/riviera_beach.toml"),
    ),
    (
        "west_palm_beach",
        include_str!("../zones/west_palm_beach.toml"),
    ),
];

/// Identifier of the table used when a caller does not pick one.
pub const DEFAULT_TABLE_ID: &str = "riviera_beach";

/// Returns all registered zone tables.
///
/// # Panics
///
/// Panics if any embedded TOML file fails to parse or validate. Since
/// these are compile-time constants, failures indicate a development
/// error and are caught by the tests below.
#[must_use]
pub fn all_zone_tables() -> Vec<ZoneTable> {
    ZONE_TOMLS
        .iter()
        .map(|(name, toml_str)| {
            ZoneTable::from_toml_str(toml_str)
                .unwrap_or_else(|e| panic!("Failed to parse zone table '{name}': {e}"))
        })
        .collect()
}

/// Returns the registered zone table with the given id.
#[must_use]
pub fn zone_table(id: &str) -> Option<ZoneTable> {
    all_zone_tables().into_iter().find(|t| t.id() == id)
}

/// Ids of all registered zone tables.
#[must_use]
pub fn table_ids() -> Vec<&'static str> {
    ZONE_TOMLS.iter().map(|(name, _)| *name).collect()
}
