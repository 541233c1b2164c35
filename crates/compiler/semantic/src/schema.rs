//! # Database schema lookup
//!
//! The tree parser reads the database catalog through [`SchemaLookup`]. [`Schema`] is an
//! in-memory catalog that can be loaded from JSON:
//!
//! ```json
//! { "databases": [ { "name": "sports", "tables": [
//!     { "name": "Customer",
//!       "fields": [ { "name": "CustNum", "type": "integer" } ],
//!       "indexes": [ { "name": "CustNum", "fields": ["CustNum"], "unique": true, "primary": true } ] }
//! ] } ] }
//! ```

use abl_compiler_syntax::DataType;
use serde::Deserialize;
use smol_str::SmolStr;

use crate::table::match_name;

/// Read-only access to a database catalog, shareable between concurrent analyses.
pub trait SchemaLookup: Send + Sync {
    /// Find a table by `table`, `db.table`, or an unambiguous abbreviation of the table name.
    fn lookup_table(&self, name: &str) -> Option<SchemaTableRef<'_>>;
}

#[derive(Debug, Clone, Copy)]
pub struct SchemaTableRef<'a> {
    pub database: &'a str,
    pub table: &'a SchemaTable,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Schema {
    #[serde(default)]
    pub databases: Vec<SchemaDatabase>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SchemaDatabase {
    pub name: SmolStr,
    #[serde(default)]
    pub tables: Vec<SchemaTable>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SchemaTable {
    pub name: SmolStr,
    #[serde(default)]
    pub fields: Vec<SchemaField>,
    #[serde(default)]
    pub indexes: Vec<SchemaIndex>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SchemaField {
    pub name: SmolStr,
    #[serde(rename = "type")]
    pub data_type: DataType,
    /// Array size, 0 for scalar fields
    #[serde(default)]
    pub extent: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SchemaIndex {
    pub name: SmolStr,
    pub fields: Vec<SmolStr>,
    #[serde(default)]
    pub unique: bool,
    #[serde(default)]
    pub primary: bool,
    #[serde(default)]
    pub word: bool,
}

impl Schema {
    pub fn new(databases: Vec<SchemaDatabase>) -> Self {
        Self { databases }
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    fn database(&self, name: &str) -> Option<&SchemaDatabase> {
        self.databases
            .iter()
            .find(|database| database.name.eq_ignore_ascii_case(name))
    }
}

impl SchemaLookup for Schema {
    fn lookup_table(&self, name: &str) -> Option<SchemaTableRef<'_>> {
        let (databases, table_name): (Vec<&SchemaDatabase>, &str) = match name.split_once('.') {
            Some((database, table)) => (vec![self.database(database)?], table),
            None => (self.databases.iter().collect(), name),
        };
        let candidates = databases.into_iter().flat_map(|database| {
            database.tables.iter().map(move |table| {
                (
                    table.name.as_str(),
                    SchemaTableRef {
                        database: database.name.as_str(),
                        table,
                    },
                )
            })
        });
        match_name(table_name, candidates, true).map(|(table, _)| table)
    }
}
