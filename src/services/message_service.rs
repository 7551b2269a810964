use std::sync::Arc;

use serde_json::json;

use crate::dto::message_dto::SendMessagePayload;
use crate::error::{Error, Result};
use crate::models::actor::Actor;
use crate::models::application::Application;
use crate::models::message::Message;
use crate::services::access;
use crate::storage::{EntityKind, Filter, StorageAdapter};
use crate::utils::validation;

/// Notes exchanged on an application thread between the candidate and the
/// attached recruiter. Messages are never deleted; the only mutation is
/// flipping the read flag.
#[derive(Clone)]
pub struct MessageService {
    adapter: Arc<dyn StorageAdapter>,
}

impl MessageService {
    pub fn new(adapter: Arc<dyn StorageAdapter>) -> Self {
        Self { adapter }
    }

    pub async fn send(
        &self,
        actor: &Actor,
        application_id: &str,
        payload: SendMessagePayload,
    ) -> Result<Message> {
        validation::validate(&payload)?;
        let application = self.load_application(application_id).await?;
        if !access::is_application_participant(actor, &application) {
            return Err(Error::PermissionDenied(
                "only the candidate and the attached recruiter may message on this application"
                    .to_string(),
            ));
        }

        let record = json!({
            "application_id": application_id,
            "sender_id": actor.id,
            "sender_role": actor.role,
            "body": payload.body,
            "read": false,
        });
        let stored = self.adapter.insert(EntityKind::Messages, record).await?;
        Ok(serde_json::from_value(stored)?)
    }

    /// Thread in conversation order, oldest first.
    pub async fn list(&self, application_id: &str, actor: &Actor) -> Result<Vec<Message>> {
        let application = self.load_application(application_id).await?;
        if !access::can_view_application(actor, &application) {
            return Err(Error::NotFound);
        }

        let filter = Filter::new().eq("application_id", application_id);
        let records = self.adapter.query(EntityKind::Messages, &filter).await?;
        let mut messages = records
            .into_iter()
            .map(serde_json::from_value::<Message>)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        messages.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(messages)
    }

    pub async fn mark_read(&self, message_id: &str, actor: &Actor) -> Result<Message> {
        let record = self
            .adapter
            .get_by_id(EntityKind::Messages, message_id, None)
            .await?
            .ok_or(Error::NotFound)?;
        let message: Message = serde_json::from_value(record)?;
        let application = self.load_application(&message.application_id).await?;
        if !access::is_application_participant(actor, &application) && !actor.is_admin() {
            return Err(Error::NotFound);
        }

        let updated = self
            .adapter
            .update(EntityKind::Messages, message_id, json!({ "read": true }), None)
            .await?
            .ok_or(Error::NotFound)?;
        Ok(serde_json::from_value(updated)?)
    }

    /// Unread messages addressed to the actor on this thread.
    pub async fn unread_count(&self, application_id: &str, actor: &Actor) -> Result<usize> {
        let messages = self.list(application_id, actor).await?;
        Ok(messages
            .iter()
            .filter(|message| !message.read && message.sender_id != actor.id)
            .count())
    }

    async fn load_application(&self, application_id: &str) -> Result<Application> {
        let record = self
            .adapter
            .get_by_id(EntityKind::Applications, application_id, None)
            .await?
            .ok_or(Error::NotFound)?;
        Ok(serde_json::from_value(record)?)
    }
}
