use anyhow::{bail, Result};
use rusqlite::{params, Connection, OptionalExtension};

#[macro_export]
macro_rules! sqlite_column {
    ($name:expr, $sql_type:expr $(, $field:ident = $value:expr)*) => {
        {
            // Only mutated when optional field assignments are passed
            #[allow(unused_mut)]
            let mut column = Column {
                name: $name,
                sql_type: $sql_type,
                is_primary_key: false,
                is_autoincrement: false,
                non_null: false,
                is_unique: false,
                default_value: None,
                foreign_key: None,
            };
            $(
                column.$field = $value;
            )*
            column
        }
    };
}

#[derive(Debug, PartialEq, Eq)]
pub enum SqlType {
    Text,
    Integer,
    Real,
}

impl SqlType {
    fn as_sql(&self) -> &'static str {
        match self {
            SqlType::Text => "TEXT",
            SqlType::Integer => "INTEGER",
            SqlType::Real => "REAL",
        }
    }

    fn from_declared(declared: &str) -> Option<&'static SqlType> {
        match declared.to_ascii_uppercase().as_str() {
            "TEXT" => Some(&SqlType::Text),
            "INTEGER" => Some(&SqlType::Integer),
            "REAL" | "FLOAT" => Some(&SqlType::Real),
            _ => None,
        }
    }
}

#[allow(unused)]
pub enum ForeignKeyOnChange {
    NoAction,
    Restrict,
    Cascade,
}

impl ForeignKeyOnChange {
    fn as_sql(&self) -> &'static str {
        match self {
            ForeignKeyOnChange::NoAction => "NO ACTION",
            ForeignKeyOnChange::Restrict => "RESTRICT",
            ForeignKeyOnChange::Cascade => "CASCADE",
        }
    }
}

pub struct ForeignKey {
    pub foreign_table: &'static str,
    pub foreign_column: &'static str,
    pub on_delete: ForeignKeyOnChange,
}

pub struct Column {
    pub name: &'static str,
    pub sql_type: &'static SqlType,
    pub is_primary_key: bool,
    pub is_autoincrement: bool,
    pub non_null: bool,
    pub is_unique: bool,
    pub default_value: Option<&'static str>,
    pub foreign_key: Option<&'static ForeignKey>,
}

pub struct Table {
    pub name: &'static str,
    pub columns: &'static [Column],
    pub indices: &'static [(&'static str, &'static str)],
}

impl Table {
    fn create_sql(&self) -> String {
        let columns = self
            .columns
            .iter()
            .map(|column| {
                let mut sql = format!("{} {}", column.name, column.sql_type.as_sql());
                if column.is_primary_key {
                    sql.push_str(" PRIMARY KEY");
                    if column.is_autoincrement {
                        sql.push_str(" AUTOINCREMENT");
                    }
                }
                if column.non_null {
                    sql.push_str(" NOT NULL");
                }
                if column.is_unique {
                    sql.push_str(" UNIQUE");
                }
                if let Some(default_value) = column.default_value {
                    sql.push_str(&format!(" DEFAULT {}", default_value));
                }
                if let Some(fk) = column.foreign_key {
                    sql.push_str(&format!(
                        " REFERENCES {}({}) ON DELETE {}",
                        fk.foreign_table,
                        fk.foreign_column,
                        fk.on_delete.as_sql()
                    ));
                }
                sql
            })
            .collect::<Vec<_>>()
            .join(", ");
        format!("CREATE TABLE {} ({});", self.name, columns)
    }

    pub fn exists(&self, conn: &Connection) -> Result<bool> {
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
            params![self.name],
            |r| r.get(0),
        )?;
        Ok(count > 0)
    }

    pub fn create(&self, conn: &Connection) -> Result<()> {
        conn.execute(&self.create_sql(), params![])?;
        for (index_name, column_name) in self.indices {
            conn.execute(
                &format!(
                    "CREATE INDEX {} ON {}({});",
                    index_name, self.name, column_name
                ),
                params![],
            )?;
        }
        Ok(())
    }

    /// Checks the live table against this declaration: column names, types,
    /// nullability, primary keys, unique columns, indices and foreign keys.
    pub fn validate(&self, conn: &Connection) -> Result<()> {
        struct ActualColumn {
            name: String,
            declared_type: String,
            non_null: bool,
            is_primary_key: bool,
        }

        let mut stmt = conn.prepare(&format!("PRAGMA table_info({});", self.name))?;
        let actual_columns: Vec<ActualColumn> = stmt
            .query_map([], |row| {
                Ok(ActualColumn {
                    name: row.get(1)?,
                    declared_type: row.get(2)?,
                    non_null: row.get::<_, i32>(3)? == 1,
                    is_primary_key: row.get::<_, i32>(5)? > 0,
                })
            })?
            .collect::<rusqlite::Result<_>>()?;

        if actual_columns.len() != self.columns.len() {
            bail!(
                "Table {} has {} columns, expected {}. Found: {}, expected: {}",
                self.name,
                actual_columns.len(),
                self.columns.len(),
                actual_columns
                    .iter()
                    .map(|c| c.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
                self.columns
                    .iter()
                    .map(|c| c.name)
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }

        for (actual, expected) in actual_columns.iter().zip(self.columns.iter()) {
            if !actual.name.eq_ignore_ascii_case(expected.name) {
                bail!(
                    "Table {} column name mismatch: expected {}, got {}",
                    self.name,
                    expected.name,
                    actual.name
                );
            }
            if SqlType::from_declared(&actual.declared_type) != Some(expected.sql_type) {
                bail!(
                    "Table {} column {} type mismatch: expected {:?}, got {}",
                    self.name,
                    expected.name,
                    expected.sql_type,
                    actual.declared_type
                );
            }
            // SQLite reports NOT NULL only for explicit constraints, never for a bare PK.
            if actual.non_null != expected.non_null && !expected.is_primary_key {
                bail!(
                    "Table {} column {} non-null mismatch: expected {}, got {}",
                    self.name,
                    expected.name,
                    expected.non_null,
                    actual.non_null
                );
            }
            if actual.is_primary_key != expected.is_primary_key {
                bail!(
                    "Table {} column {} primary key mismatch: expected {}, got {}",
                    self.name,
                    expected.name,
                    expected.is_primary_key,
                    actual.is_primary_key
                );
            }
        }

        for (index_name, _) in self.indices {
            let index_exists = conn
                .query_row(
                    "SELECT 1 FROM sqlite_master WHERE type='index' AND name=?1 AND tbl_name=?2",
                    params![index_name, self.name],
                    |_| Ok(()),
                )
                .optional()?
                .is_some();
            if !index_exists {
                bail!("Table {} is missing index '{}'", self.name, index_name);
            }
        }

        let unique_columns = self.unique_single_columns(conn)?;
        for column in self.columns.iter().filter(|c| c.is_unique) {
            if !unique_columns.iter().any(|c| c.eq_ignore_ascii_case(column.name)) {
                bail!(
                    "Table {} is missing unique constraint on column {}",
                    self.name,
                    column.name
                );
            }
        }

        let mut fk_stmt = conn.prepare(&format!("PRAGMA foreign_key_list({})", self.name))?;
        let actual_fks: Vec<(String, String, Option<String>)> = fk_stmt
            .query_map([], |row| Ok((row.get(3)?, row.get(2)?, row.get(4)?)))?
            .collect::<rusqlite::Result<_>>()?;
        for column in self.columns {
            let Some(expected_fk) = column.foreign_key else {
                continue;
            };
            let found = actual_fks.iter().any(|(from, to_table, to_column)| {
                from.eq_ignore_ascii_case(column.name)
                    && to_table.eq_ignore_ascii_case(expected_fk.foreign_table)
                    && to_column
                        .as_deref()
                        .is_some_and(|c| c.eq_ignore_ascii_case(expected_fk.foreign_column))
            });
            if !found {
                bail!(
                    "Table {} column {} is missing foreign key: expected REFERENCES {}({})",
                    self.name,
                    column.name,
                    expected_fk.foreign_table,
                    expected_fk.foreign_column
                );
            }
        }

        Ok(())
    }

    fn unique_single_columns(&self, conn: &Connection) -> Result<Vec<String>> {
        let mut stmt = conn.prepare(&format!("PRAGMA index_list({})", self.name))?;
        let unique_indices: Vec<String> = stmt
            .query_map([], |row| Ok((row.get::<_, String>(1)?, row.get::<_, i32>(2)?)))?
            .filter_map(|r| r.ok())
            .filter(|(_, is_unique)| *is_unique == 1)
            .map(|(name, _)| name)
            .collect();

        let mut columns = Vec::new();
        for index_name in unique_indices {
            let mut idx_stmt = conn.prepare(&format!("PRAGMA index_info({})", index_name))?;
            let cols: Vec<String> = idx_stmt
                .query_map([], |row| row.get::<_, String>(2))?
                .filter_map(|r| r.ok())
                .collect();
            if let [single] = cols.as_slice() {
                columns.push(single.clone());
            }
        }
        Ok(columns)
    }
}

pub struct VersionedSchema {
    pub version: usize,
    pub tables: &'static [Table],
}

impl VersionedSchema {
    /// Creates missing tables and validates the ones already present.
    /// Returns the names of the tables that were created.
    pub fn ensure(&self, conn: &Connection) -> Result<Vec<&'static str>> {
        conn.execute("PRAGMA foreign_keys = ON;", params![])?;
        let mut created = Vec::new();
        for table in self.tables {
            if table.exists(conn)? {
                table.validate(conn)?;
            } else {
                table.create(conn)?;
                created.push(table.name);
            }
        }
        if !created.is_empty() {
            conn.execute(
                &format!("PRAGMA user_version = {}", BASE_DB_VERSION + self.version),
                [],
            )?;
        }
        Ok(created)
    }
}

pub const BASE_DB_VERSION: usize = 99999;
