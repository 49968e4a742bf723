use std::path::Path;
use std::sync::Mutex;

use rusqlite::Connection;
use serde_json::Value;

use crate::error::DocError;
use crate::traits::{Doc, DocumentStore, OrderBy, WriteOp};

/// SqliteDocStore is a DocumentStore backed by rusqlite (bundled SQLite).
///
/// Every document lives in one table keyed by (collection, id) with the
/// body stored as JSON text. Equality filters and ordering use SQLite's
/// built-in `json_extract`.
pub struct SqliteDocStore {
    conn: Mutex<Connection>,
}

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS documents (
    collection TEXT NOT NULL,
    id TEXT NOT NULL,
    data TEXT NOT NULL,
    PRIMARY KEY (collection, id)
)";

impl SqliteDocStore {
    /// Open or create a document database at the given path.
    pub fn open(path: &Path) -> Result<Self, DocError> {
        let conn = Connection::open(path).map_err(|e| DocError::Storage(e.to_string()))?;

        // WAL mode for better concurrent read performance.
        conn.execute_batch("PRAGMA journal_mode=WAL;")
            .map_err(|e| DocError::Storage(e.to_string()))?;

        Self::init(conn)
    }

    /// Create an in-memory document database (useful for tests).
    pub fn open_in_memory() -> Result<Self, DocError> {
        let conn = Connection::open_in_memory().map_err(|e| DocError::Storage(e.to_string()))?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self, DocError> {
        conn.execute(SCHEMA, [])
            .map_err(|e| DocError::Storage(e.to_string()))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, DocError> {
        self.conn.lock().map_err(|e| DocError::Storage(e.to_string()))
    }
}

/// JSON path expression for a top-level field.
fn field_path(field: &str) -> String {
    format!("$.\"{}\"", field)
}

/// Convert a JSON scalar into a rusqlite parameter for comparison with
/// `json_extract` output (strings come back as TEXT, booleans as 0/1).
fn filter_param(value: &Value) -> rusqlite::types::Value {
    match value {
        Value::Null => rusqlite::types::Value::Null,
        Value::Bool(b) => rusqlite::types::Value::Integer(i64::from(*b)),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                rusqlite::types::Value::Integer(i)
            } else {
                rusqlite::types::Value::Real(n.as_f64().unwrap_or(0.0))
            }
        }
        Value::String(s) => rusqlite::types::Value::Text(s.clone()),
        other => rusqlite::types::Value::Text(other.to_string()),
    }
}

/// Merge `fields` into the stored JSON body of (collection, id) inside
/// an open transaction. Returns NotFound if the document is absent.
fn apply_update(
    tx: &rusqlite::Transaction<'_>,
    collection: &str,
    id: &str,
    fields: &serde_json::Map<String, Value>,
) -> Result<(), DocError> {
    let data: String = tx
        .query_row(
            "SELECT data FROM documents WHERE collection = ?1 AND id = ?2",
            (collection, id),
            |row| row.get(0),
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => {
                DocError::NotFound(format!("{}/{}", collection, id))
            }
            other => DocError::Storage(other.to_string()),
        })?;

    let mut body: Value =
        serde_json::from_str(&data).map_err(|e| DocError::Serialization(e.to_string()))?;
    if let Some(obj) = body.as_object_mut() {
        for (key, value) in fields {
            obj.insert(key.clone(), value.clone());
        }
    } else {
        return Err(DocError::Serialization(format!(
            "{}/{} is not a JSON object",
            collection, id
        )));
    }

    let json = serde_json::to_string(&body).map_err(|e| DocError::Serialization(e.to_string()))?;
    tx.execute(
        "UPDATE documents SET data = ?1 WHERE collection = ?2 AND id = ?3",
        (&json, collection, id),
    )
    .map_err(|e| DocError::Storage(e.to_string()))?;
    Ok(())
}

/// Atomic numeric increment of one field inside an open transaction.
fn apply_increment(
    tx: &rusqlite::Transaction<'_>,
    collection: &str,
    id: &str,
    field: &str,
    delta: i64,
) -> Result<(), DocError> {
    let path = field_path(field);
    let affected = tx
        .execute(
            "UPDATE documents
             SET data = json_set(data, ?1, COALESCE(json_extract(data, ?1), 0) + ?2)
             WHERE collection = ?3 AND id = ?4",
            (&path, delta, collection, id),
        )
        .map_err(|e| DocError::Storage(e.to_string()))?;
    if affected == 0 {
        return Err(DocError::NotFound(format!("{}/{}", collection, id)));
    }
    Ok(())
}

fn apply_op(tx: &rusqlite::Transaction<'_>, op: &WriteOp) -> Result<(), DocError> {
    match op {
        WriteOp::Set { collection, id, data } => {
            let json =
                serde_json::to_string(data).map_err(|e| DocError::Serialization(e.to_string()))?;
            tx.execute(
                "INSERT INTO documents (collection, id, data) VALUES (?1, ?2, ?3)
                 ON CONFLICT (collection, id) DO UPDATE SET data = excluded.data",
                (collection, id, &json),
            )
            .map_err(|e| DocError::Storage(e.to_string()))?;
            Ok(())
        }
        WriteOp::Update { collection, id, fields } => apply_update(tx, collection, id, fields),
        WriteOp::Delete { collection, id } => {
            tx.execute(
                "DELETE FROM documents WHERE collection = ?1 AND id = ?2",
                (collection, id),
            )
            .map_err(|e| DocError::Storage(e.to_string()))?;
            Ok(())
        }
        WriteOp::Increment { collection, id, field, delta } => {
            apply_increment(tx, collection, id, field, *delta)
        }
    }
}

impl DocumentStore for SqliteDocStore {
    fn get(&self, collection: &str, id: &str) -> Result<Option<Value>, DocError> {
        let conn = self.lock()?;
        let result = conn.query_row(
            "SELECT data FROM documents WHERE collection = ?1 AND id = ?2",
            (collection, id),
            |row| row.get::<_, String>(0),
        );
        match result {
            Ok(data) => {
                let value = serde_json::from_str(&data)
                    .map_err(|e| DocError::Serialization(e.to_string()))?;
                Ok(Some(value))
            }
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(DocError::Storage(e.to_string())),
        }
    }

    fn create(&self, collection: &str, id: &str, data: &Value) -> Result<(), DocError> {
        let json =
            serde_json::to_string(data).map_err(|e| DocError::Serialization(e.to_string()))?;
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO documents (collection, id, data) VALUES (?1, ?2, ?3)",
            (collection, id, &json),
        )
        .map_err(|e| {
            let msg = e.to_string();
            if msg.contains("UNIQUE constraint") {
                DocError::AlreadyExists(format!("{}/{}", collection, id))
            } else {
                DocError::Storage(msg)
            }
        })?;
        Ok(())
    }

    fn set(&self, collection: &str, id: &str, data: &Value) -> Result<(), DocError> {
        let json =
            serde_json::to_string(data).map_err(|e| DocError::Serialization(e.to_string()))?;
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO documents (collection, id, data) VALUES (?1, ?2, ?3)
             ON CONFLICT (collection, id) DO UPDATE SET data = excluded.data",
            (collection, id, &json),
        )
        .map_err(|e| DocError::Storage(e.to_string()))?;
        Ok(())
    }

    fn update(
        &self,
        collection: &str,
        id: &str,
        fields: &serde_json::Map<String, Value>,
    ) -> Result<(), DocError> {
        let mut conn = self.lock()?;
        let tx = conn
            .transaction()
            .map_err(|e| DocError::Storage(e.to_string()))?;
        apply_update(&tx, collection, id, fields)?;
        tx.commit().map_err(|e| DocError::Storage(e.to_string()))
    }

    fn delete(&self, collection: &str, id: &str) -> Result<(), DocError> {
        let conn = self.lock()?;
        conn.execute(
            "DELETE FROM documents WHERE collection = ?1 AND id = ?2",
            (collection, id),
        )
        .map_err(|e| DocError::Storage(e.to_string()))?;
        Ok(())
    }

    fn query(
        &self,
        collection: &str,
        filters: &[(&str, Value)],
        order: Option<&OrderBy>,
        limit: Option<usize>,
    ) -> Result<Vec<Doc>, DocError> {
        let mut sql = String::from("SELECT id, data FROM documents WHERE collection = ?1");
        let mut params: Vec<rusqlite::types::Value> =
            vec![rusqlite::types::Value::Text(collection.to_string())];

        for (field, value) in filters {
            sql.push_str(&format!(
                " AND json_extract(data, ?{}) = ?{}",
                params.len() + 1,
                params.len() + 2
            ));
            params.push(rusqlite::types::Value::Text(field_path(field)));
            params.push(filter_param(value));
        }

        if let Some(order) = order {
            sql.push_str(&format!(
                " ORDER BY json_extract(data, ?{}) {}",
                params.len() + 1,
                if order.descending { "DESC" } else { "ASC" }
            ));
            params.push(rusqlite::types::Value::Text(field_path(&order.field)));
        }

        if let Some(limit) = limit {
            sql.push_str(&format!(" LIMIT ?{}", params.len() + 1));
            params.push(rusqlite::types::Value::Integer(limit as i64));
        }

        let conn = self.lock()?;
        collect_docs(&conn, &sql, &params)
    }

    fn collection_group(&self, leaf: &str) -> Result<Vec<Doc>, DocError> {
        let conn = self.lock()?;
        let params = vec![
            rusqlite::types::Value::Text(leaf.to_string()),
            rusqlite::types::Value::Text(format!("%/{}", leaf)),
        ];
        collect_docs(
            &conn,
            "SELECT id, data FROM documents WHERE collection = ?1 OR collection LIKE ?2",
            &params,
        )
    }

    fn batch_write(&self, ops: &[WriteOp]) -> Result<(), DocError> {
        let mut conn = self.lock()?;
        let tx = conn
            .transaction()
            .map_err(|e| DocError::Storage(e.to_string()))?;
        for op in ops {
            apply_op(&tx, op)?;
        }
        tx.commit().map_err(|e| DocError::Storage(e.to_string()))
    }

    fn increment_field(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        delta: i64,
    ) -> Result<(), DocError> {
        let mut conn = self.lock()?;
        let tx = conn
            .transaction()
            .map_err(|e| DocError::Storage(e.to_string()))?;
        apply_increment(&tx, collection, id, field, delta)?;
        tx.commit().map_err(|e| DocError::Storage(e.to_string()))
    }
}

fn collect_docs(
    conn: &Connection,
    sql: &str,
    params: &[rusqlite::types::Value],
) -> Result<Vec<Doc>, DocError> {
    let mut stmt = conn
        .prepare(sql)
        .map_err(|e| DocError::Storage(e.to_string()))?;

    let rows = stmt
        .query_map(rusqlite::params_from_iter(params.iter()), |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })
        .map_err(|e| DocError::Storage(e.to_string()))?;

    let mut docs = Vec::new();
    for row in rows {
        let (id, data) = row.map_err(|e| DocError::Storage(e.to_string()))?;
        let data =
            serde_json::from_str(&data).map_err(|e| DocError::Serialization(e.to_string()))?;
        docs.push(Doc { id, data });
    }
    Ok(docs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store() -> SqliteDocStore {
        SqliteDocStore::open_in_memory().unwrap()
    }

    #[test]
    fn test_create_then_conflict() {
        let s = store();
        s.create("departments", "d1", &json!({"name": "QA"})).unwrap();
        let err = s.create("departments", "d1", &json!({"name": "QA"})).unwrap_err();
        assert!(matches!(err, DocError::AlreadyExists(_)));
        // Other collections are unaffected.
        s.create("users", "d1", &json!({})).unwrap();
    }

    #[test]
    fn test_get_set_delete() {
        let s = store();
        assert!(s.get("users", "u1").unwrap().is_none());
        s.set("users", "u1", &json!({"name": "Ana"})).unwrap();
        assert_eq!(s.get("users", "u1").unwrap().unwrap()["name"], "Ana");
        s.set("users", "u1", &json!({"name": "Bea"})).unwrap();
        assert_eq!(s.get("users", "u1").unwrap().unwrap()["name"], "Bea");
        s.delete("users", "u1").unwrap();
        assert!(s.get("users", "u1").unwrap().is_none());
        // Deleting again is a no-op.
        s.delete("users", "u1").unwrap();
    }

    #[test]
    fn test_update_merges_top_level_fields() {
        let s = store();
        s.set("users", "u1", &json!({"name": "Ana", "role": "fresher"})).unwrap();
        let mut fields = serde_json::Map::new();
        fields.insert("departmentId".into(), json!("d9"));
        s.update("users", "u1", &fields).unwrap();
        let doc = s.get("users", "u1").unwrap().unwrap();
        assert_eq!(doc["name"], "Ana");
        assert_eq!(doc["departmentId"], "d9");

        let err = s.update("users", "missing", &fields).unwrap_err();
        assert!(matches!(err, DocError::NotFound(_)));
    }

    #[test]
    fn test_query_filters_order_limit() {
        let s = store();
        s.set("users", "u1", &json!({"role": "fresher", "name": "c"})).unwrap();
        s.set("users", "u2", &json!({"role": "admin", "name": "a"})).unwrap();
        s.set("users", "u3", &json!({"role": "fresher", "name": "b"})).unwrap();

        let freshers = s
            .query("users", &[("role", json!("fresher"))], None, None)
            .unwrap();
        assert_eq!(freshers.len(), 2);

        let ordered = s
            .query("users", &[], Some(&OrderBy::asc("name")), Some(2))
            .unwrap();
        assert_eq!(ordered.len(), 2);
        assert_eq!(ordered[0].data["name"], "a");
        assert_eq!(ordered[1].data["name"], "b");
    }

    #[test]
    fn test_collection_group() {
        let s = store();
        s.set("users/u1/courses", "c1", &json!({})).unwrap();
        s.set("users/u2/courses", "c2", &json!({})).unwrap();
        s.set("users/u2/courses", "c3", &json!({})).unwrap();
        s.set("users", "u1", &json!({})).unwrap();
        assert_eq!(s.collection_group("courses").unwrap().len(), 3);
    }

    #[test]
    fn test_batch_is_atomic() {
        let s = store();
        s.set("departments", "d1", &json!({"memberCount": 1})).unwrap();

        // Second op targets a missing document: nothing must commit.
        let err = s
            .batch_write(&[
                WriteOp::Increment {
                    collection: "departments".into(),
                    id: "d1".into(),
                    field: "memberCount".into(),
                    delta: 5,
                },
                WriteOp::Update {
                    collection: "users".into(),
                    id: "missing".into(),
                    fields: serde_json::Map::new(),
                },
            ])
            .unwrap_err();
        assert!(matches!(err, DocError::NotFound(_)));
        let doc = s.get("departments", "d1").unwrap().unwrap();
        assert_eq!(doc["memberCount"], 1);
    }

    #[test]
    fn test_increment_field() {
        let s = store();
        s.set("departments", "d1", &json!({"name": "QA"})).unwrap();
        // Missing field counts as 0.
        s.increment_field("departments", "d1", "memberCount", 1).unwrap();
        s.increment_field("departments", "d1", "memberCount", 2).unwrap();
        let doc = s.get("departments", "d1").unwrap().unwrap();
        assert_eq!(doc["memberCount"], 3);

        let err = s
            .increment_field("departments", "nope", "memberCount", 1)
            .unwrap_err();
        assert!(matches!(err, DocError::NotFound(_)));
    }

    #[test]
    fn test_persists_across_reopen() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("docs.sqlite");
        {
            let s = SqliteDocStore::open(&path).unwrap();
            s.set("users", "u1", &json!({"name": "Ana"})).unwrap();
        }
        let s = SqliteDocStore::open(&path).unwrap();
        assert_eq!(s.get("users", "u1").unwrap().unwrap()["name"], "Ana");
    }
}
