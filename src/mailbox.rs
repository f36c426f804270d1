//! Notifications, feedback and messages: lists with a read flag.
//!
//! Read flags only move from unread to read. The unread counter is derived
//! on load and then adjusted locally as items are read or deleted.

use crate::api::{self, ApiClient};
use crate::error::ApiError;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::fmt;
use tracing::{info, warn};

pub trait MailItem: Clone + fmt::Debug + DeserializeOwned + 'static {
    fn id(&self) -> &str;
    fn is_read(&self) -> bool;
    fn mark_read(&mut self);
    fn sender(&self) -> String;
    fn summary(&self) -> String;
    fn date(&self) -> String;
}

pub struct Mailbox<M: MailItem> {
    pub title: &'static str,
    /// Items live at `{endpoint}/{id}`; new ones are POSTed here.
    endpoint: String,
    list_endpoint: String,
    items: Vec<M>,
    unread: usize,
}

impl<M: MailItem> Mailbox<M> {
    pub fn new(title: &'static str, endpoint: &str) -> Self {
        Self {
            title,
            endpoint: endpoint.to_string(),
            list_endpoint: endpoint.to_string(),
            items: Vec::new(),
            unread: 0,
        }
    }

    /// Notifications are listed per recipient but addressed by id.
    pub fn list_from(mut self, path: impl Into<String>) -> Self {
        self.list_endpoint = path.into();
        self
    }

    pub fn items(&self) -> &[M] {
        &self.items
    }

    pub fn unread(&self) -> usize {
        self.unread
    }

    fn item_path(&self, id: &str) -> String {
        format!("{}/{}", self.endpoint, api::encode_component(id))
    }

    pub fn load(&mut self, api: &ApiClient) -> Result<usize, ApiError> {
        let response = api.get(&self.list_endpoint)?;
        let values = api::unwrap_list(response).unwrap_or_default();
        self.items = values
            .into_iter()
            .filter_map(|value| match serde_json::from_value::<M>(value) {
                Ok(item) if !item.id().is_empty() => Some(item),
                Ok(_) => None,
                Err(e) => {
                    warn!(endpoint = %self.list_endpoint, error = %e, "skipping unreadable item");
                    None
                }
            })
            .collect();
        self.unread = self.items.iter().filter(|m| !m.is_read()).count();
        info!(endpoint = %self.list_endpoint, total = self.items.len(), unread = self.unread, "mailbox loaded");
        Ok(self.unread)
    }

    /// Marks one item read on the server, then locally. Reading an item that
    /// is already read sends nothing.
    pub fn mark_read(&mut self, api: &ApiClient, id: &str) -> Result<(), ApiError> {
        let Some(index) = self.items.iter().position(|m| m.id() == id) else {
            return Ok(());
        };
        if self.items[index].is_read() {
            return Ok(());
        }
        api.patch(&format!("{}/read", self.item_path(id)), json!({ "isRead": true }))?;
        self.items[index].mark_read();
        self.unread = self.unread.saturating_sub(1);
        Ok(())
    }

    /// Flips every item to read and zeroes the counter before asking the
    /// server to do the same. The local flags stay read even if the server
    /// call fails; the error is returned for the caller to report.
    pub fn mark_all_read(&mut self, api: &ApiClient) -> Result<(), ApiError> {
        let ids: Vec<String> = self
            .items
            .iter()
            .filter(|m| !m.is_read())
            .map(|m| m.id().to_string())
            .collect();
        for item in &mut self.items {
            item.mark_read();
        }
        self.unread = 0;
        if ids.is_empty() {
            return Ok(());
        }
        api.patch(&format!("{}/read-all", self.endpoint), json!({ "ids": ids }))
            .map(drop)
    }

    pub fn delete(&mut self, api: &ApiClient, id: &str) -> Result<(), ApiError> {
        api.delete(&self.item_path(id))?;
        if let Some(index) = self.items.iter().position(|m| m.id() == id) {
            let removed = self.items.remove(index);
            if !removed.is_read() {
                self.unread = self.unread.saturating_sub(1);
            }
        }
        Ok(())
    }

    /// Sends a new message or feedback entry. The created item is shown at
    /// the top when the server returns it.
    pub fn compose(&mut self, api: &ApiClient, body: Value) -> Result<(), ApiError> {
        let response = api.post(&self.endpoint, body)?;
        let created = api::record_candidates(&response)
            .into_iter()
            .filter_map(|candidate| M::deserialize(candidate).ok())
            .find(|item| !item.id().is_empty());
        if let Some(item) = created {
            if !item.is_read() {
                self.unread += 1;
            }
            self.items.insert(0, item);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::MockTransport;
    use crate::api::Method;
    use crate::models::{Feedback, Notification};
    use serde::Deserialize;

    fn inbox(mock: &MockTransport) -> Mailbox<Notification> {
        mock.respond(json!([
            {"_id": "n1", "message": "Lab result ready", "isRead": false},
            {"_id": "n2", "message": "Shift change", "isRead": true},
            {"_id": "n3", "message": "New referral", "isRead": false},
        ]));
        let mut mailbox = Mailbox::new("Notifications", "/notifications")
            .list_from("/notifications/doctor/doctor%40hospital.et");
        mailbox.load(&mock.client()).unwrap();
        mailbox
    }

    #[test]
    fn unread_counts_unread_items_on_load() {
        let mock = MockTransport::new();
        let mailbox = inbox(&mock);
        assert_eq!(mailbox.unread(), 2);
        assert_eq!(mailbox.items().len(), 3);
        assert_eq!(
            mock.requests()[0].path,
            "/notifications/doctor/doctor%40hospital.et"
        );
    }

    #[test]
    fn mark_read_decrements_once() {
        let mock = MockTransport::new();
        let mut mailbox = inbox(&mock);
        mock.respond(json!({"message": "ok"}));

        mailbox.mark_read(&mock.client(), "n1").unwrap();
        mailbox.mark_read(&mock.client(), "n1").unwrap();
        mailbox.mark_read(&mock.client(), "n2").unwrap();

        assert_eq!(mailbox.unread(), 1);
        let patches: Vec<_> = mock
            .requests()
            .into_iter()
            .filter(|r| r.method == Method::Patch)
            .collect();
        assert_eq!(patches.len(), 1);
        assert_eq!(patches[0].path, "/notifications/n1/read");
    }

    #[test]
    fn failed_mark_read_keeps_item_unread() {
        let mock = MockTransport::new();
        let mut mailbox = inbox(&mock);
        mock.fail(500, "boom");
        assert!(mailbox.mark_read(&mock.client(), "n1").is_err());
        assert_eq!(mailbox.unread(), 2);
        assert!(!mailbox.items()[0].is_read());
    }

    #[test]
    fn mark_all_read_never_reverts() {
        let mock = MockTransport::new();
        let mut mailbox = inbox(&mock);
        mock.fail(503, "Service unavailable");

        let err = mailbox.mark_all_read(&mock.client()).unwrap_err();

        assert_eq!(err.to_string(), "Service unavailable");
        assert_eq!(mailbox.unread(), 0);
        assert!(mailbox.items().iter().all(|m| m.is_read()));
        let last = mock.requests().pop().unwrap();
        assert_eq!(last.body, crate::api::Body::Json(json!({"ids": ["n1", "n3"]})));
    }

    #[test]
    fn delete_adjusts_unread_only_for_unread_items() {
        let mock = MockTransport::new();
        let mut mailbox = inbox(&mock);
        mock.respond(Value::Null);
        mock.respond(Value::Null);

        mailbox.delete(&mock.client(), "n2").unwrap();
        assert_eq!(mailbox.unread(), 2);
        mailbox.delete(&mock.client(), "n3").unwrap();
        assert_eq!(mailbox.unread(), 1);
        assert_eq!(mailbox.items().len(), 1);
    }

    #[test]
    fn compose_prepends_created_item() {
        let mock = MockTransport::new();
        mock.respond(json!([]));
        let mut feedback: Mailbox<Feedback> = Mailbox::new("Feedback", "/feedback");
        feedback.load(&mock.client()).unwrap();
        mock.respond(json!({"data": {"_id": "f1", "name": "Almaz", "message": "Great care"}}));

        feedback
            .compose(&mock.client(), json!({"name": "Almaz", "message": "Great care"}))
            .unwrap();

        assert_eq!(feedback.items().len(), 1);
        assert_eq!(feedback.unread(), 1);
        assert_eq!(feedback.items()[0].summary(), "Great care");
    }

    #[test]
    fn items_without_ids_are_skipped() {
        #[derive(Debug, Clone, Deserialize)]
        struct Bare {
            #[serde(default)]
            id: String,
        }
        impl MailItem for Bare {
            fn id(&self) -> &str {
                &self.id
            }
            fn is_read(&self) -> bool {
                false
            }
            fn mark_read(&mut self) {}
            fn sender(&self) -> String {
                String::new()
            }
            fn summary(&self) -> String {
                String::new()
            }
            fn date(&self) -> String {
                String::new()
            }
        }

        let mock = MockTransport::new();
        mock.respond(json!({"messages": [{"id": "m1"}, {}]}));
        let mut mailbox: Mailbox<Bare> = Mailbox::new("Messages", "/messages");
        assert_eq!(mailbox.load(&mock.client()).unwrap(), 1);
    }
}
