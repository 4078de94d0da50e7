//! Tables worth dumping and where their databases live.

/// Pseudo-table rendered as the reconstructed bookmarks hierarchy.
pub const TREE_TABLE: &str = "tree";

/// Directory a database lives in, relative to the application data root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DbLocation {
    /// `files/mozilla/<profile>/`
    Profile,
    /// `databases/`
    Databases,
}

impl DbLocation {
    /// Absolute directory on the device, or `None` when a profile is needed
    /// but none was given.
    pub fn remote_dir(&self, device_root: &str, profile: Option<&str>) -> Option<String> {
        match self {
            DbLocation::Profile => profile.map(|p| format!("{device_root}/files/mozilla/{p}")),
            DbLocation::Databases => Some(format!("{device_root}/databases")),
        }
    }
}

/// One table of one database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSpec {
    pub location: DbLocation,
    pub db: String,
    pub table: String,
}

impl TableSpec {
    pub fn new(location: DbLocation, db: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            location,
            db: db.into(),
            table: table.into(),
        }
    }

    /// Whether this renders the bookmarks tree instead of a table dump.
    pub fn is_tree(&self) -> bool {
        self.table == TREE_TABLE
    }
}

/// The tables dumped when no filter is given.
///
/// Login tables are deliberately absent.
pub fn default_catalog() -> Vec<TableSpec> {
    use DbLocation::{Databases, Profile};

    [
        (Profile, "browser.db", "history"),
        (Profile, "browser.db", "bookmarks"),
        (Profile, "browser.db", TREE_TABLE),
        (Profile, "tabs.db", "tabs"),
        (Profile, "tabs.db", "clients"),
        (Profile, "formhistory.sqlite", "moz_deleted_formhistory"),
        (Profile, "formhistory.sqlite", "moz_formhistory"),
        (Databases, "clients_database", "clients"),
        (Databases, "clients_database", "commands"),
        (Databases, "history_extension_database", "HistoryExtension"),
    ]
    .into_iter()
    .map(|(location, db, table)| TableSpec::new(location, db, table))
    .collect()
}

/// Narrow the catalog.
///
/// With both names, exactly that table is dumped (located like the catalog
/// entry for the same database, or in the profile). With one name, entries
/// whose database or table name contains it, case-insensitively, are kept.
pub fn select_tables(
    catalog: &[TableSpec],
    db: Option<&str>,
    table: Option<&str>,
) -> Vec<TableSpec> {
    match (db, table) {
        (Some(db), Some(table)) => {
            let location = catalog
                .iter()
                .find(|spec| spec.db == db)
                .map_or(DbLocation::Profile, |spec| spec.location);
            vec![TableSpec::new(location, db, table)]
        }
        (Some(db), None) => {
            let needle = db.to_lowercase();
            catalog
                .iter()
                .filter(|spec| spec.db.to_lowercase().contains(&needle))
                .cloned()
                .collect()
        }
        (None, Some(table)) => {
            let needle = table.to_lowercase();
            catalog
                .iter()
                .filter(|spec| spec.table.to_lowercase().contains(&needle))
                .cloned()
                .collect()
        }
        (None, None) => catalog.to_vec(),
    }
}
