//! Schema introspection for the todo database.

use super::Database;
use crate::error::StoreResult;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

/// Information about a table column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: String,
    pub nullable: bool,
    pub default_value: Option<String>,
    pub primary_key: bool,
}

/// Information about a table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableInfo {
    pub name: String,
    pub columns: Vec<ColumnInfo>,
    pub indexes: Vec<String>,
    pub sql: Option<String>,
}

/// Application tables, excluding SQLite internals and refinery bookkeeping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSchema {
    pub tables: Vec<TableInfo>,
    pub sqlite_version: String,
}

impl DatabaseSchema {
    pub fn table(&self, name: &str) -> Option<&TableInfo> {
        self.tables.iter().find(|t| t.name == name)
    }
}

fn table_columns(conn: &Connection, table_name: &str) -> StoreResult<Vec<ColumnInfo>> {
    let mut stmt = conn.prepare("SELECT * FROM pragma_table_info(?1)")?;

    let columns = stmt
        .query_map([table_name], |row| {
            Ok(ColumnInfo {
                name: row.get("name")?,
                data_type: row.get::<_, String>("type")?.to_uppercase(),
                nullable: row.get::<_, i32>("notnull")? == 0,
                default_value: row.get("dflt_value")?,
                primary_key: row.get::<_, i32>("pk")? > 0,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(columns)
}

fn table_indexes(conn: &Connection, table_name: &str) -> StoreResult<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT name FROM sqlite_master
         WHERE type = 'index' AND tbl_name = ?1 AND name NOT LIKE 'sqlite_autoindex_%'
         ORDER BY name",
    )?;

    let names = stmt
        .query_map([table_name], |row| row.get(0))?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(names)
}

impl Database {
    /// Get schema information for the application tables.
    pub fn get_schema(&self, include_sql: bool) -> StoreResult<DatabaseSchema> {
        self.with_conn(|conn| {
            let sqlite_version: String =
                conn.query_row("SELECT sqlite_version()", [], |row| row.get(0))?;

            let mut stmt = conn.prepare(
                "SELECT name, sql FROM sqlite_master
                 WHERE type = 'table'
                 AND name NOT LIKE 'sqlite_%'
                 AND name NOT LIKE 'refinery_%'
                 ORDER BY name",
            )?;

            let table_names: Vec<(String, Option<String>)> = stmt
                .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
                .collect::<Result<Vec<_>, _>>()?;

            let mut tables = Vec::new();
            for (name, sql) in table_names {
                tables.push(TableInfo {
                    columns: table_columns(conn, &name)?,
                    indexes: table_indexes(conn, &name)?,
                    sql: if include_sql { sql } else { None },
                    name,
                });
            }

            Ok(DatabaseSchema {
                tables,
                sqlite_version,
            })
        })
    }

    /// Count rows in the tasks table.
    pub fn task_count(&self) -> StoreResult<i64> {
        self.with_conn(|conn| {
            Ok(conn.query_row("SELECT COUNT(*) FROM tasks", [], |row| row.get(0))?)
        })
    }
}
