use std::sync::{Arc, Mutex, RwLock};

use num_traits::ToPrimitive;
use rusqlite::types::{Value as SqlValue, ValueRef};
use rusqlite::{Connection, params_from_iter};
use serde_json::{Map, Value as Json};
use thiserror::Error;

use crate::runtime::value::Value;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Database lock poisoned")]
    Poisoned,
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Handle to an open SQLite database. Clones share the same connection.
#[derive(Debug, Clone)]
pub struct Storage {
    connection: Arc<Mutex<Connection>>,
}

/// Result set of a full-table select.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Rows {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl Rows {
    /// Renders each row as a Python tuple, e.g. `(1, 'Ada')` or `(1,)`.
    pub fn tuples(&self) -> impl Iterator<Item = String> + '_ {
        self.rows.iter().map(|row| {
            let items = row.iter().map(Value::repr).collect::<Vec<_>>();
            if items.len() == 1 {
                format!("({},)", items[0])
            } else {
                format!("({})", items.join(", "))
            }
        })
    }

    /// Rows as a JSON array of column-keyed objects.
    pub fn to_json(&self) -> Json {
        Json::Array(
            self.rows
                .iter()
                .map(|row| {
                    let object = self
                        .columns
                        .iter()
                        .cloned()
                        .zip(row.iter().map(Json::from))
                        .collect::<Map<_, _>>();
                    Json::Object(object)
                })
                .collect(),
        )
    }
}

impl Storage {
    /// Opens or creates the database at `path`; `:memory:` opens a private in-memory database.
    pub fn open(path: &str) -> StorageResult<Self> {
        let connection = Connection::open(path)?;
        log::info!("opened database {path}");
        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    pub fn create_table(&self, table: &str, columns: &[(String, String)]) -> StorageResult<()> {
        let definitions = columns
            .iter()
            .map(|(name, column_type)| format!("{} {column_type}", quote_identifier(name)))
            .collect::<Vec<_>>();
        let sql = format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            quote_identifier(table),
            definitions.join(", ")
        );
        let connection = self.lock()?;
        connection.execute_batch("PRAGMA encoding = \"UTF-8\";")?;
        log::debug!("{sql}");
        connection.execute(&sql, [])?;
        Ok(())
    }

    pub fn insert(&self, table: &str, row: Vec<(String, SqlValue)>) -> StorageResult<usize> {
        let table = quote_identifier(table);
        let (columns, values): (Vec<_>, Vec<_>) = row.into_iter().unzip();
        let sql = if columns.is_empty() {
            format!("INSERT INTO {table} DEFAULT VALUES")
        } else {
            let names = columns
                .iter()
                .map(|name| quote_identifier(name))
                .collect::<Vec<_>>();
            let placeholders = (1..=values.len())
                .map(|position| format!("?{position}"))
                .collect::<Vec<_>>();
            format!(
                "INSERT INTO {table} ({}) VALUES ({})",
                names.join(", "),
                placeholders.join(", ")
            )
        };
        log::debug!("{sql}");
        let connection = self.lock()?;
        Ok(connection.execute(&sql, params_from_iter(values))?)
    }

    pub fn select_all(&self, table: &str) -> StorageResult<Rows> {
        let sql = format!("SELECT * FROM {}", quote_identifier(table));
        log::debug!("{sql}");
        let connection = self.lock()?;
        let mut statement = connection.prepare(&sql)?;
        let columns = statement
            .column_names()
            .into_iter()
            .map(str::to_string)
            .collect::<Vec<_>>();
        let width = columns.len();
        let rows = statement
            .query_map([], |row| {
                (0..width)
                    .map(|index| row.get_ref(index).map(from_sql))
                    .collect::<rusqlite::Result<Vec<_>>>()
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(Rows { columns, rows })
    }

    fn lock(&self) -> StorageResult<std::sync::MutexGuard<'_, Connection>> {
        self.connection.lock().map_err(|_| StorageError::Poisoned)
    }
}

/// Storage slot filled by `connect_db` and read by the HTTP service thread.
#[derive(Debug, Clone, Default)]
pub struct SharedStorage {
    slot: Arc<RwLock<Option<Storage>>>,
}

impl SharedStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces any previously installed database.
    pub fn install(&self, storage: Storage) -> StorageResult<()> {
        let mut slot = self.slot.write().map_err(|_| StorageError::Poisoned)?;
        *slot = Some(storage);
        Ok(())
    }

    pub fn get(&self) -> StorageResult<Option<Storage>> {
        let slot = self.slot.read().map_err(|_| StorageError::Poisoned)?;
        Ok(slot.clone())
    }
}

/// Converts a runtime value into a bindable SQL parameter. Lists, dicts and
/// integers outside the 64-bit range have no column form.
pub fn sql_value(value: &Value) -> Option<SqlValue> {
    match value {
        Value::None => Some(SqlValue::Null),
        Value::Bool(value) => Some(SqlValue::Integer(i64::from(*value))),
        Value::Int(value) => value.to_i64().map(SqlValue::Integer),
        Value::Real(value) => Some(SqlValue::Real(*value)),
        Value::Str(value) => Some(SqlValue::Text(value.clone())),
        Value::List(_) | Value::Dict(_) => None,
    }
}

fn from_sql(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::None,
        ValueRef::Integer(value) => Value::from(value),
        ValueRef::Real(value) => Value::Real(value),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
            Value::Str(String::from_utf8_lossy(bytes).into_owned())
        }
    }
}

fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use rusqlite::types::Value as SqlValue;

    use super::{SharedStorage, Storage, quote_identifier, sql_value};
    use crate::runtime::value::Value;

    fn people() -> Storage {
        let storage = Storage::open(":memory:").expect("open in-memory database");
        storage
            .create_table(
                "people",
                &[
                    ("id".to_string(), "INTEGER".to_string()),
                    ("name".to_string(), "TEXT".to_string()),
                ],
            )
            .expect("create table");
        storage
    }

    #[test]
    fn inserts_and_selects_rows_in_order() {
        let storage = people();
        for (id, name) in [(1, "Ada"), (2, "Grace")] {
            storage
                .insert(
                    "people",
                    vec![
                        ("id".to_string(), SqlValue::Integer(id)),
                        ("name".to_string(), SqlValue::Text(name.to_string())),
                    ],
                )
                .expect("insert row");
        }

        let rows = storage.select_all("people").expect("select rows");
        assert_eq!(rows.columns, vec!["id", "name"]);
        assert_eq!(
            rows.tuples().collect::<Vec<_>>(),
            vec!["(1, 'Ada')", "(2, 'Grace')"]
        );
        assert_eq!(
            rows.to_json().to_string(),
            r#"[{"id":1,"name":"Ada"},{"id":2,"name":"Grace"}]"#
        );
    }

    #[test]
    fn single_column_rows_render_with_trailing_comma() {
        let storage = Storage::open(":memory:").expect("open in-memory database");
        storage
            .create_table("tags", &[("label".to_string(), "TEXT".to_string())])
            .expect("create table");
        storage
            .insert("tags", vec![("label".to_string(), SqlValue::Null)])
            .expect("insert row");
        let rows = storage.select_all("tags").expect("select rows");
        assert_eq!(rows.tuples().collect::<Vec<_>>(), vec!["(None,)"]);
    }

    #[test]
    fn missing_table_is_an_error() {
        let storage = Storage::open(":memory:").expect("open in-memory database");
        let error = storage.select_all("ghosts").expect_err("table does not exist");
        assert!(error.to_string().contains("no such table"));
    }

    #[test]
    fn shared_slot_sees_installed_database() {
        let shared = SharedStorage::new();
        assert!(shared.get().expect("read slot").is_none());
        shared.install(people()).expect("install");
        let storage = shared.get().expect("read slot").expect("installed");
        assert!(storage.select_all("people").expect("select").rows.is_empty());
    }

    #[test]
    fn converts_values_to_parameters() {
        assert_eq!(sql_value(&Value::Bool(true)), Some(SqlValue::Integer(1)));
        assert_eq!(sql_value(&Value::from(i64::MIN)), Some(SqlValue::Integer(i64::MIN)));
        let wide = Value::Int("9223372036854775808".parse().expect("valid digits"));
        assert_eq!(sql_value(&wide), None);
        assert_eq!(sql_value(&Value::None), Some(SqlValue::Null));
        assert_eq!(sql_value(&Value::List(vec![])), None);
        assert_eq!(quote_identifier("we\"ird"), "\"we\"\"ird\"");
    }
}
