//! The list/search/create/edit/delete/toggle pattern shared by every
//! dashboard section.
//!
//! A [`ResourceController`] owns the canonical list for one endpoint, keyed
//! by record id, and a filtered copy recomputed from the search query. Each
//! successful mutation patches the canonical list in place. When a mutation
//! response does not carry the record, the list is fetched again.

use crate::api::{self, ApiClient, Body};
use crate::error::ApiError;
use crate::form::FormSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::fmt;
use tracing::{info, warn};

/// Workflow status carried by most records.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RecordStatus {
    Pending,
    Completed,
    Activated,
    Deactivated,
    /// Any other value the server sends, kept as-is. Empty when absent.
    Other(String),
    #[default]
    Unset,
}

impl RecordStatus {
    /// The status a toggle moves to, or `None` when the record has no
    /// further transition.
    pub fn next(&self) -> Option<RecordStatus> {
        match self {
            RecordStatus::Pending => Some(RecordStatus::Completed),
            RecordStatus::Activated => Some(RecordStatus::Deactivated),
            RecordStatus::Deactivated => Some(RecordStatus::Activated),
            RecordStatus::Completed | RecordStatus::Other(_) | RecordStatus::Unset => None,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            RecordStatus::Pending => "pending",
            RecordStatus::Completed => "completed",
            RecordStatus::Activated => "activated",
            RecordStatus::Deactivated => "deactivated",
            RecordStatus::Other(s) => s,
            RecordStatus::Unset => "",
        }
    }
}

impl From<String> for RecordStatus {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "pending" => RecordStatus::Pending,
            "completed" => RecordStatus::Completed,
            "activated" | "active" => RecordStatus::Activated,
            "deactivated" | "inactive" => RecordStatus::Deactivated,
            "" => RecordStatus::Unset,
            _ => RecordStatus::Other(value),
        }
    }
}

impl From<RecordStatus> for String {
    fn from(value: RecordStatus) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordStatus::Unset => f.write_str("-"),
            other => f.write_str(other.as_str()),
        }
    }
}

/// A record type served by one REST collection.
pub trait Resource: Clone + fmt::Debug + Serialize + DeserializeOwned + 'static {
    /// Server-assigned id; the reconciliation key for updates and deletes.
    fn id(&self) -> &str;

    /// Text the search box matches against.
    fn search_fields(&self) -> Vec<String>;

    /// Table cells, in the order of the schema's columns.
    fn row(&self) -> Vec<String>;

    /// Values used to populate the edit form, keyed by form field.
    fn form_values(&self) -> Vec<(&'static str, String)> {
        Vec::new()
    }

    fn status(&self) -> Option<RecordStatus> {
        None
    }

    fn set_status(&mut self, _status: RecordStatus) {}
}

/// Records in insertion order, indexed by id. Never holds two records with
/// the same id.
#[derive(Debug, Clone)]
pub struct Collection<R> {
    items: Vec<R>,
    index: HashMap<String, usize>,
}

impl<R: Resource> Default for Collection<R> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<R: Resource> Collection<R> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a collection, dropping records without an id. A later record
    /// with a repeated id replaces the earlier one in place.
    pub fn from_records(records: Vec<R>) -> Self {
        let mut collection = Self::new();
        for record in records {
            if record.id().is_empty() {
                warn!("dropping record without id: {record:?}");
                continue;
            }
            collection.upsert(record);
        }
        collection
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn as_slice(&self) -> &[R] {
        &self.items
    }

    pub fn get(&self, id: &str) -> Option<&R> {
        self.index.get(id).map(|&i| &self.items[i])
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut R> {
        match self.index.get(id) {
            Some(&i) => self.items.get_mut(i),
            None => None,
        }
    }

    /// Inserts or replaces by id. Returns `true` if an existing record was
    /// replaced.
    pub fn upsert(&mut self, record: R) -> bool {
        match self.index.get(record.id()) {
            Some(&i) => {
                self.items[i] = record;
                true
            }
            None => {
                self.index.insert(record.id().to_string(), self.items.len());
                self.items.push(record);
                false
            }
        }
    }

    pub fn remove(&mut self, id: &str) -> Option<R> {
        let i = self.index.remove(id)?;
        let removed = self.items.remove(i);
        for slot in self.index.values_mut() {
            if *slot > i {
                *slot -= 1;
            }
        }
        Some(removed)
    }
}

/// Case-insensitive substring filter over each record's search fields.
/// An empty query keeps everything. Order is preserved.
pub fn filter_records<R: Resource>(records: &[R], query: &str) -> Vec<R> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return records.to_vec();
    }
    records
        .iter()
        .filter(|r| {
            r.search_fields()
                .iter()
                .any(|field| field.to_lowercase().contains(&query))
        })
        .cloned()
        .collect()
}

/// Pulls a record out of a mutation response, if one with an id is there.
pub fn extract_record<R: Resource>(response: &Value) -> Option<R> {
    api::record_candidates(response)
        .into_iter()
        .filter_map(|candidate| R::deserialize(candidate).ok())
        .find(|record| !record.id().is_empty())
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    pub create: bool,
    pub edit: bool,
    pub delete: bool,
    pub toggle: bool,
}

impl Capabilities {
    pub const READ_ONLY: Capabilities = Capabilities {
        create: false,
        edit: false,
        delete: false,
        toggle: false,
    };
    pub const FULL: Capabilities = Capabilities {
        create: true,
        edit: true,
        delete: true,
        toggle: false,
    };

    pub fn with_toggle(mut self) -> Self {
        self.toggle = true;
        self
    }

    pub fn with_delete(mut self) -> Self {
        self.delete = true;
        self
    }

    pub fn with_create(mut self) -> Self {
        self.create = true;
        self
    }
}

/// Everything a section needs to know about one resource endpoint.
#[derive(Debug, Clone)]
pub struct ResourceSchema {
    pub title: &'static str,
    /// Singular noun used in messages ("Doctor added successfully").
    pub noun: &'static str,
    /// Base path for mutations; records live at `{endpoint}/{id}`.
    pub endpoint: String,
    /// Path the list is loaded from.
    pub list_endpoint: String,
    pub columns: Vec<&'static str>,
    pub form: Option<FormSchema>,
    pub caps: Capabilities,
}

impl ResourceSchema {
    pub fn new(title: &'static str, noun: &'static str, endpoint: &str) -> Self {
        Self {
            title,
            noun,
            endpoint: endpoint.to_string(),
            list_endpoint: endpoint.to_string(),
            columns: Vec::new(),
            form: None,
            caps: Capabilities::READ_ONLY,
        }
    }

    pub fn list_from(mut self, path: impl Into<String>) -> Self {
        self.list_endpoint = path.into();
        self
    }

    pub fn columns(mut self, columns: &[&'static str]) -> Self {
        self.columns = columns.to_vec();
        self
    }

    pub fn form(mut self, form: FormSchema) -> Self {
        self.form = Some(form);
        self
    }

    pub fn caps(mut self, caps: Capabilities) -> Self {
        self.caps = caps;
        self
    }

    pub fn record_path(&self, id: &str) -> String {
        format!(
            "{}/{}",
            self.endpoint.trim_end_matches('/'),
            api::encode_component(id)
        )
    }
}

/// Canonical list plus filtered view for one resource.
pub struct ResourceController<R: Resource> {
    pub schema: ResourceSchema,
    records: Collection<R>,
    filtered: Vec<R>,
    query: String,
    stale: bool,
}

impl<R: Resource> ResourceController<R> {
    pub fn new(schema: ResourceSchema) -> Self {
        Self {
            schema,
            records: Collection::new(),
            filtered: Vec::new(),
            query: String::new(),
            stale: false,
        }
    }

    pub fn records(&self) -> &[R] {
        self.records.as_slice()
    }

    pub fn filtered(&self) -> &[R] {
        &self.filtered
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn get(&self, id: &str) -> Option<&R> {
        self.records.get(id)
    }

    /// True when the last mutation could not be reconciled and a re-fetch
    /// also failed.
    pub fn is_stale(&self) -> bool {
        self.stale
    }

    fn refilter(&mut self) {
        self.filtered = filter_records(self.records.as_slice(), &self.query);
    }

    pub fn set_query(&mut self, query: &str) {
        self.query = query.to_string();
        self.refilter();
    }

    /// Replaces the canonical list with the server's collection.
    pub fn load(&mut self, api: &ApiClient) -> Result<usize, ApiError> {
        let response = api.get(&self.schema.list_endpoint)?;
        let items = api::unwrap_list(response).ok_or_else(|| {
            ApiError::Decode(format!("{} did not return a list", self.schema.list_endpoint))
        })?;
        let mut records = Vec::with_capacity(items.len());
        for item in items {
            match serde_json::from_value::<R>(item) {
                Ok(record) => records.push(record),
                Err(e) => warn!(endpoint = %self.schema.list_endpoint, error = %e, "skipping unreadable record"),
            }
        }
        self.records = Collection::from_records(records);
        self.stale = false;
        self.refilter();
        info!(endpoint = %self.schema.list_endpoint, count = self.records.len(), "loaded records");
        Ok(self.records.len())
    }

    fn reconcile(&mut self, api: &ApiClient, action: &str) {
        warn!(endpoint = %self.schema.endpoint, action, "response did not include the record, refetching");
        if let Err(e) = self.load(api) {
            warn!(error = %e, "refetch after {action} failed");
            self.stale = true;
        }
    }

    pub fn create(&mut self, api: &ApiClient, body: Body) -> Result<String, ApiError> {
        let response = api.post_body(&self.schema.endpoint, body)?;
        match extract_record::<R>(&response) {
            Some(record) => {
                if self.records.upsert(record) {
                    warn!(endpoint = %self.schema.endpoint, "created record reused an existing id; replaced it");
                }
                self.refilter();
            }
            None => self.reconcile(api, "create"),
        }
        Ok(format!("{} added successfully", self.schema.noun))
    }

    pub fn update(&mut self, api: &ApiClient, id: &str, body: Body) -> Result<String, ApiError> {
        let response = api.put_body(&self.schema.record_path(id), body)?;
        match extract_record::<R>(&response).filter(|record| record.id() == id) {
            Some(record) => {
                self.records.upsert(record);
                self.refilter();
            }
            None => self.reconcile(api, "update"),
        }
        Ok(format!("{} updated successfully", self.schema.noun))
    }

    pub fn delete(&mut self, api: &ApiClient, id: &str) -> Result<String, ApiError> {
        api.delete(&self.schema.record_path(id))?;
        self.records.remove(id);
        self.refilter();
        Ok(format!("{} deleted successfully", self.schema.noun))
    }

    /// Moves one record's status to its next value. Nothing else in the
    /// record, and no other record, changes.
    pub fn toggle_status(&mut self, api: &ApiClient, id: &str) -> Result<String, ApiError> {
        let Some(record) = self.get(id) else {
            return Err(ApiError::NotFound {
                noun: self.schema.noun.to_string(),
                id: id.to_string(),
            });
        };
        let current = record.status().unwrap_or_default();
        let Some(next) = current.next() else {
            return Ok(format!("{} is already {}", self.schema.noun, current));
        };
        api.patch(&self.schema.record_path(id), json!({ "status": next.as_str() }))?;
        if let Some(record) = self.records.get_mut(id) {
            record.set_status(next.clone());
        }
        self.refilter();
        Ok(format!("{} marked as {}", self.schema.noun, next))
    }
}
