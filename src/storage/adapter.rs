use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;

use crate::error::Result;

/// The entity collections every backend must be able to hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Users,
    Jobs,
    Applications,
    ApplicationHistory,
    Messages,
}

impl EntityKind {
    pub const ALL: [EntityKind; 5] = [
        EntityKind::Users,
        EntityKind::Jobs,
        EntityKind::Applications,
        EntityKind::ApplicationHistory,
        EntityKind::Messages,
    ];

    /// Table or collection name, identical across backends so data stays
    /// portable between them.
    pub fn collection(self) -> &'static str {
        match self {
            EntityKind::Users => "users",
            EntityKind::Jobs => "jobs",
            EntityKind::Applications => "applications",
            EntityKind::ApplicationHistory => "application_history",
            EntityKind::Messages => "messages",
        }
    }
}

/// Equality pin on a single top-level field, used to enforce ownership at
/// the storage boundary as a second layer of defense beneath the rule
/// layer. A non-matching scope reads as "not found", never as an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    pub field: &'static str,
    pub value: String,
}

impl Scope {
    pub fn new(field: &'static str, value: impl Into<String>) -> Self {
        Self {
            field,
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DateRange {
    pub field: &'static str,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct SearchTerm {
    pub fields: Vec<&'static str>,
    pub needle: String,
}

/// A declarative query. Each adapter translates what its backend supports
/// natively and evaluates the rest in memory; result ordering is always
/// imposed by the caller.
#[derive(Debug, Clone, Default)]
pub struct Filter {
    pub equals: Vec<(&'static str, JsonValue)>,
    pub date_range: Option<DateRange>,
    pub search: Option<SearchTerm>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, field: &'static str, value: impl Into<JsonValue>) -> Self {
        self.equals.push((field, value.into()));
        self
    }

    pub fn date_between(
        mut self,
        field: &'static str,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Self {
        if from.is_some() || to.is_some() {
            self.date_range = Some(DateRange { field, from, to });
        }
        self
    }

    /// Case-insensitive substring match against any of the given fields.
    pub fn search(mut self, fields: &[&'static str], needle: impl Into<String>) -> Self {
        self.search = Some(SearchTerm {
            fields: fields.to_vec(),
            needle: needle.into(),
        });
        self
    }
}

/// The persistence contract every backend implements. Records cross this
/// boundary as JSON objects; the rule layer owns the typed views.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StorageAdapter: Send + Sync {
    /// Idempotent; creates schema or collections if absent.
    async fn initialize(&self) -> Result<()>;

    /// Assigns id, created_at and updated_at, then stores the record.
    /// Returns the record as stored.
    async fn insert(&self, kind: EntityKind, record: JsonValue) -> Result<JsonValue>;

    /// `Ok(None)` for an absent id and for a scope mismatch alike.
    async fn get_by_id<'a>(
        &self,
        kind: EntityKind,
        id: &str,
        scope: Option<&'a Scope>,
    ) -> Result<Option<JsonValue>>;

    /// All matching records, unordered.
    async fn query(&self, kind: EntityKind, filter: &Filter) -> Result<Vec<JsonValue>>;

    /// Merges `changes` into the record and bumps updated_at. `Ok(None)`
    /// when the id is absent or the scope does not match.
    async fn update<'a>(
        &self,
        kind: EntityKind,
        id: &str,
        changes: JsonValue,
        scope: Option<&'a Scope>,
    ) -> Result<Option<JsonValue>>;

    /// Returns whether a record was removed; never errors for "not
    /// matched".
    async fn delete<'a>(&self, kind: EntityKind, id: &str, scope: Option<&'a Scope>) -> Result<bool>;
}

pub(crate) fn record_id(record: &JsonValue) -> Option<&str> {
    record.get("id").and_then(JsonValue::as_str)
}

/// Stamps a freshly-inserted record with its id and timestamps.
pub(crate) fn stamp_new(record: &mut JsonValue, id: String) -> Result<()> {
    let obj = record
        .as_object_mut()
        .ok_or_else(|| anyhow!("record must be a JSON object"))?;
    let now = serde_json::to_value(Utc::now())?;
    obj.insert("id".to_string(), JsonValue::String(id));
    obj.insert("created_at".to_string(), now.clone());
    obj.insert("updated_at".to_string(), now);
    Ok(())
}

/// Field-wise merge of a partial record; id and created_at are immutable,
/// updated_at is bumped.
pub(crate) fn apply_changes(record: &mut JsonValue, changes: &JsonValue) -> Result<()> {
    let changes = changes
        .as_object()
        .ok_or_else(|| anyhow!("changes must be a JSON object"))?;
    let obj = record
        .as_object_mut()
        .ok_or_else(|| anyhow!("record must be a JSON object"))?;
    for (field, value) in changes {
        if field == "id" || field == "created_at" {
            continue;
        }
        obj.insert(field.clone(), value.clone());
    }
    obj.insert("updated_at".to_string(), serde_json::to_value(Utc::now())?);
    Ok(())
}

pub(crate) fn matches_scope(record: &JsonValue, scope: Option<&Scope>) -> bool {
    match scope {
        None => true,
        Some(scope) => {
            record.get(scope.field).and_then(JsonValue::as_str) == Some(scope.value.as_str())
        }
    }
}

/// In-memory filter evaluation, shared by the backends that cannot push
/// (all of) the filter down to the store.
pub(crate) fn matches_filter(record: &JsonValue, filter: &Filter) -> bool {
    for (field, expected) in &filter.equals {
        if record.get(*field).unwrap_or(&JsonValue::Null) != expected {
            return false;
        }
    }
    if let Some(range) = &filter.date_range {
        let Some(actual) = record
            .get(range.field)
            .and_then(JsonValue::as_str)
            .and_then(parse_timestamp)
        else {
            return false;
        };
        if let Some(from) = range.from {
            if actual < from {
                return false;
            }
        }
        if let Some(to) = range.to {
            if actual > to {
                return false;
            }
        }
    }
    if let Some(term) = &filter.search {
        let needle = term.needle.to_lowercase();
        let hit = term.fields.iter().any(|field| {
            record
                .get(*field)
                .and_then(JsonValue::as_str)
                .map(|text| text.to_lowercase().contains(&needle))
                .unwrap_or(false)
        });
        if !hit {
            return false;
        }
    }
    true
}

pub(crate) fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
