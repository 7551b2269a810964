use anyhow::anyhow;
use serde_json::{json, Value as JsonValue};
use sqlx::sqlite::{SqliteArguments, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};

use crate::error::Result;
use crate::storage::adapter::{
    apply_changes, stamp_new, EntityKind, Filter, Scope, StorageAdapter,
};
use crate::utils::ids;

use async_trait::async_trait;

/// Embedded relational backend. Nested list fields are persisted as
/// serialized JSON text columns and deserialized on every read; booleans
/// are INTEGER 0/1; timestamps are RFC 3339 TEXT.
pub struct SqliteAdapter {
    pool: SqlitePool,
}

#[derive(Clone, Copy)]
enum ColType {
    Text,
    OptText,
    Bool,
    Int,
    List,
}

struct Col {
    name: &'static str,
    ty: ColType,
}

const fn text(name: &'static str) -> Col {
    Col {
        name,
        ty: ColType::Text,
    }
}

const fn opt(name: &'static str) -> Col {
    Col {
        name,
        ty: ColType::OptText,
    }
}

const fn boolean(name: &'static str) -> Col {
    Col {
        name,
        ty: ColType::Bool,
    }
}

const fn int(name: &'static str) -> Col {
    Col {
        name,
        ty: ColType::Int,
    }
}

const fn list(name: &'static str) -> Col {
    Col {
        name,
        ty: ColType::List,
    }
}

const USER_COLS: &[Col] = &[
    text("name"),
    text("email"),
    text("password_hash"),
    text("role"),
    opt("phone"),
    opt("address"),
    list("skills"),
    opt("experience"),
    opt("education"),
    opt("linkedin_url"),
    opt("company_name"),
    opt("company_sector"),
    opt("company_website"),
    opt("company_size"),
    text("created_at"),
    text("updated_at"),
];

const JOB_COLS: &[Col] = &[
    text("title"),
    text("company"),
    text("location"),
    text("job_type"),
    opt("description"),
    opt("salary"),
    opt("job_url"),
    text("posted_date"),
    opt("source"),
    boolean("remote"),
    list("requirements"),
    text("recruiter_id"),
    boolean("archived"),
    text("created_at"),
    text("updated_at"),
];

const APPLICATION_COLS: &[Col] = &[
    text("title"),
    text("company"),
    text("location"),
    opt("job_url"),
    opt("job_id"),
    opt("recruiter_id"),
    text("contract_type"),
    text("application_date"),
    text("status"),
    opt("notes"),
    list("documents"),
    text("user_id"),
    opt("last_follow_up"),
    int("follow_up_count"),
    text("created_at"),
    text("updated_at"),
];

const HISTORY_COLS: &[Col] = &[
    text("application_id"),
    opt("old_status"),
    text("new_status"),
    text("changed_by"),
    opt("note"),
    text("created_at"),
    text("updated_at"),
];

const MESSAGE_COLS: &[Col] = &[
    text("application_id"),
    text("sender_id"),
    text("sender_role"),
    text("body"),
    boolean("read"),
    text("created_at"),
    text("updated_at"),
];

fn columns(kind: EntityKind) -> &'static [Col] {
    match kind {
        EntityKind::Users => USER_COLS,
        EntityKind::Jobs => JOB_COLS,
        EntityKind::Applications => APPLICATION_COLS,
        EntityKind::ApplicationHistory => HISTORY_COLS,
        EntityKind::Messages => MESSAGE_COLS,
    }
}

const INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_users_email ON users(email)",
    "CREATE INDEX IF NOT EXISTS idx_jobs_recruiter_id ON jobs(recruiter_id)",
    "CREATE INDEX IF NOT EXISTS idx_applications_user_id ON applications(user_id)",
    "CREATE INDEX IF NOT EXISTS idx_applications_job_id ON applications(job_id)",
    "CREATE INDEX IF NOT EXISTS idx_applications_status ON applications(status)",
    "CREATE INDEX IF NOT EXISTS idx_applications_application_date ON applications(application_date)",
    "CREATE INDEX IF NOT EXISTS idx_application_history_application_id ON application_history(application_id)",
    "CREATE INDEX IF NOT EXISTS idx_messages_application_id ON messages(application_id)",
];

impl SqliteAdapter {
    /// The pool connects lazily so constructing the adapter never blocks
    /// selector readiness; connection failures surface on first use.
    pub fn new(database_url: &str) -> Result<Self> {
        let max_connections = if database_url.contains("memory") { 1 } else { 5 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_lazy(database_url)?;
        Ok(Self { pool })
    }

    pub fn in_memory() -> Self {
        Self::new("sqlite::memory:").expect("in-memory sqlite url is valid")
    }

    fn create_table_sql(kind: EntityKind) -> String {
        let mut defs = vec!["id TEXT PRIMARY KEY NOT NULL".to_string()];
        for col in columns(kind) {
            let sql_type = match col.ty {
                ColType::Text => "TEXT NOT NULL",
                ColType::OptText | ColType::List => "TEXT",
                ColType::Bool | ColType::Int => "INTEGER NOT NULL DEFAULT 0",
            };
            defs.push(format!("{} {}", col.name, sql_type));
        }
        format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            kind.collection(),
            defs.join(", ")
        )
    }
}

type SqliteQuery<'q> = sqlx::query::Query<'q, sqlx::Sqlite, SqliteArguments<'q>>;

fn bind_column<'q>(
    query: SqliteQuery<'q>,
    col: &Col,
    value: Option<&JsonValue>,
) -> Result<SqliteQuery<'q>> {
    let query = match col.ty {
        ColType::Text => {
            let raw = value
                .and_then(JsonValue::as_str)
                .ok_or_else(|| anyhow!("missing required field: {}", col.name))?;
            query.bind(raw.to_string())
        }
        ColType::OptText => match value {
            None | Some(JsonValue::Null) => query.bind(None::<String>),
            Some(JsonValue::String(s)) => query.bind(Some(s.clone())),
            Some(other) => query.bind(Some(other.to_string())),
        },
        ColType::Bool => query.bind(value.and_then(JsonValue::as_bool).unwrap_or(false) as i64),
        ColType::Int => query.bind(value.and_then(JsonValue::as_i64).unwrap_or(0)),
        ColType::List => match value {
            Some(v @ JsonValue::Array(_)) => query.bind(Some(serde_json::to_string(v)?)),
            _ => query.bind(None::<String>),
        },
    };
    Ok(query)
}

fn row_to_record(kind: EntityKind, row: &SqliteRow) -> Result<JsonValue> {
    let mut obj = serde_json::Map::new();
    obj.insert("id".to_string(), json!(row.try_get::<String, _>("id")?));
    for col in columns(kind) {
        let value = match col.ty {
            ColType::Text => JsonValue::String(row.try_get::<String, _>(col.name)?),
            ColType::OptText => row
                .try_get::<Option<String>, _>(col.name)?
                .map(JsonValue::String)
                .unwrap_or(JsonValue::Null),
            ColType::Bool => JsonValue::Bool(row.try_get::<i64, _>(col.name)? != 0),
            ColType::Int => json!(row.try_get::<i64, _>(col.name)?),
            ColType::List => match row.try_get::<Option<String>, _>(col.name)? {
                Some(raw) => serde_json::from_str(&raw).unwrap_or_else(|_| json!([])),
                None => json!([]),
            },
        };
        obj.insert(col.name.to_string(), value);
    }
    Ok(JsonValue::Object(obj))
}

enum Bind {
    Str(String),
    Int(i64),
}

/// Translates a [`Filter`] into a WHERE clause plus bind values. Date
/// bounds go through datetime() so RFC 3339 offset variants compare
/// correctly.
fn build_where(filter: &Filter) -> (Vec<String>, Vec<Bind>) {
    let mut clauses = Vec::new();
    let mut binds = Vec::new();

    for (field, value) in &filter.equals {
        match value {
            JsonValue::Null => clauses.push(format!("{} IS NULL", field)),
            JsonValue::Bool(b) => {
                clauses.push(format!("{} = ?", field));
                binds.push(Bind::Int(*b as i64));
            }
            JsonValue::Number(n) => {
                clauses.push(format!("{} = ?", field));
                match n.as_i64() {
                    Some(i) => binds.push(Bind::Int(i)),
                    None => binds.push(Bind::Str(n.to_string())),
                }
            }
            JsonValue::String(s) => {
                clauses.push(format!("{} = ?", field));
                binds.push(Bind::Str(s.clone()));
            }
            other => {
                clauses.push(format!("{} = ?", field));
                binds.push(Bind::Str(other.to_string()));
            }
        }
    }

    if let Some(range) = &filter.date_range {
        if let Some(from) = range.from {
            clauses.push(format!("datetime({}) >= datetime(?)", range.field));
            binds.push(Bind::Str(from.to_rfc3339()));
        }
        if let Some(to) = range.to {
            clauses.push(format!("datetime({}) <= datetime(?)", range.field));
            binds.push(Bind::Str(to.to_rfc3339()));
        }
    }

    if let Some(term) = &filter.search {
        let likes: Vec<String> = term
            .fields
            .iter()
            .map(|field| format!("{} LIKE ?", field))
            .collect();
        clauses.push(format!("({})", likes.join(" OR ")));
        for _ in &term.fields {
            binds.push(Bind::Str(format!("%{}%", term.needle)));
        }
    }

    (clauses, binds)
}

fn bind_values<'q>(mut query: SqliteQuery<'q>, binds: &[Bind]) -> SqliteQuery<'q> {
    for bind in binds {
        query = match bind {
            Bind::Str(s) => query.bind(s.clone()),
            Bind::Int(i) => query.bind(*i),
        };
    }
    query
}

#[async_trait]
impl StorageAdapter for SqliteAdapter {
    async fn initialize(&self) -> Result<()> {
        for kind in EntityKind::ALL {
            sqlx::query(&Self::create_table_sql(kind))
                .execute(&self.pool)
                .await?;
        }
        for index in INDEXES {
            sqlx::query(index).execute(&self.pool).await?;
        }
        Ok(())
    }

    async fn insert(&self, kind: EntityKind, record: JsonValue) -> Result<JsonValue> {
        let mut record = record;
        stamp_new(&mut record, ids::generate_id())?;

        let cols = columns(kind);
        let mut names = vec!["id"];
        names.extend(cols.iter().map(|c| c.name));
        let placeholders = vec!["?"; names.len()].join(", ");
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            kind.collection(),
            names.join(", "),
            placeholders
        );

        let obj = record.as_object().expect("stamped record is an object");
        let mut query = sqlx::query(&sql).bind(
            obj.get("id")
                .and_then(JsonValue::as_str)
                .expect("stamped record has an id")
                .to_string(),
        );
        for col in cols {
            query = bind_column(query, col, obj.get(col.name))?;
        }
        query.execute(&self.pool).await?;
        Ok(record)
    }

    async fn get_by_id<'a>(
        &self,
        kind: EntityKind,
        id: &str,
        scope: Option<&'a Scope>,
    ) -> Result<Option<JsonValue>> {
        let mut sql = format!("SELECT * FROM {} WHERE id = ?", kind.collection());
        if let Some(scope) = scope {
            sql.push_str(&format!(" AND {} = ?", scope.field));
        }
        let mut query = sqlx::query(&sql).bind(id.to_string());
        if let Some(scope) = scope {
            query = query.bind(scope.value.clone());
        }
        match query.fetch_optional(&self.pool).await? {
            Some(row) => Ok(Some(row_to_record(kind, &row)?)),
            None => Ok(None),
        }
    }

    async fn query(&self, kind: EntityKind, filter: &Filter) -> Result<Vec<JsonValue>> {
        let (clauses, binds) = build_where(filter);
        let mut sql = format!("SELECT * FROM {}", kind.collection());
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        let query = bind_values(sqlx::query(&sql), &binds);
        let rows = query.fetch_all(&self.pool).await?;
        rows.iter().map(|row| row_to_record(kind, row)).collect()
    }

    async fn update<'a>(
        &self,
        kind: EntityKind,
        id: &str,
        changes: JsonValue,
        scope: Option<&'a Scope>,
    ) -> Result<Option<JsonValue>> {
        let Some(mut current) = self.get_by_id(kind, id, scope).await? else {
            return Ok(None);
        };
        apply_changes(&mut current, &changes)?;

        let cols = columns(kind);
        let assignments: Vec<String> = cols.iter().map(|c| format!("{} = ?", c.name)).collect();
        let mut sql = format!(
            "UPDATE {} SET {} WHERE id = ?",
            kind.collection(),
            assignments.join(", ")
        );
        if let Some(scope) = scope {
            sql.push_str(&format!(" AND {} = ?", scope.field));
        }

        let obj = current.as_object().expect("loaded record is an object");
        let mut query = sqlx::query(&sql);
        for col in cols {
            query = bind_column(query, col, obj.get(col.name))?;
        }
        query = query.bind(id.to_string());
        if let Some(scope) = scope {
            query = query.bind(scope.value.clone());
        }
        let result = query.execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Ok(None);
        }
        Ok(Some(current))
    }

    async fn delete<'a>(&self, kind: EntityKind, id: &str, scope: Option<&'a Scope>) -> Result<bool> {
        let mut sql = format!("DELETE FROM {} WHERE id = ?", kind.collection());
        if let Some(scope) = scope {
            sql.push_str(&format!(" AND {} = ?", scope.field));
        }
        let mut query = sqlx::query(&sql).bind(id.to_string());
        if let Some(scope) = scope {
            query = query.bind(scope.value.clone());
        }
        let result = query.execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }
}
