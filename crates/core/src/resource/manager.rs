use tracing::{info, warn};

use super::Resource;
use crate::{
    http::ApiClient,
    validation::{FieldErrors, Validate, Validated},
    Error, Result,
};

/// Owns the cached list and the current draft for one resource type.
///
/// Every successful mutation reloads the whole list from the server rather
/// than patching the cache, unless that reload fails. Calls are not queued:
/// callers must not start a second mutation while one is in flight.
pub struct ResourceManager<R: Resource> {
    client: ApiClient,
    items: Vec<R>,
    editing: Option<String>,
    draft: R::Draft,
}

impl<R: Resource> ResourceManager<R> {
    /// Empty manager issuing requests through `client`.
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            items: Vec::new(),
            editing: None,
            draft: R::Draft::default(),
        }
    }

    /// Records from the last successful load, in server order.
    pub fn items(&self) -> &[R] {
        &self.items
    }

    /// Cached record with `id`.
    pub fn get(&self, id: &str) -> Option<&R> {
        self.items.iter().find(|item| item.id() == id)
    }

    /// Id of the record being edited, if any.
    pub fn editing(&self) -> Option<&str> {
        self.editing.as_deref()
    }

    /// Current form draft (new record or edit).
    pub fn draft(&self) -> &R::Draft {
        &self.draft
    }

    /// Mutable access for form input.
    pub fn draft_mut(&mut self) -> &mut R::Draft {
        &mut self.draft
    }

    /// Fetch every record, replacing the cache.
    pub async fn list(&mut self) -> Result<&[R]> {
        let items: Vec<R> = self.client.get(R::COLLECTION).await?;
        self.replace_items(items);
        Ok(&self.items)
    }

    /// Create a record from checked input, then reload the list.
    ///
    /// Once the server accepts the record this succeeds even if the reload
    /// fails; the cache is then patched locally.
    pub async fn create(&mut self, input: Validated<R::Input>) -> Result<R> {
        let created: R = self.client.post(R::COLLECTION, input.get()).await?;
        info!(resource = R::LABEL, id = created.id(), "record created");
        if let Err(err) = self.reload().await {
            warn!(resource = R::LABEL, error = %err, "reload after create failed");
            self.items.push(created.clone());
        }
        Ok(created)
    }

    /// Replace record `id` with checked input, then reload the list.
    pub async fn update(&mut self, id: &str, input: Validated<R::Input>) -> Result<R> {
        let updated: R = self.client.put(&R::member_path(id), input.get()).await?;
        info!(resource = R::LABEL, id, "record updated");
        if let Err(err) = self.reload().await {
            warn!(resource = R::LABEL, error = %err, "reload after update failed");
            if let Some(slot) = self.items.iter_mut().find(|item| item.id() == id) {
                *slot = updated.clone();
            }
        }
        Ok(updated)
    }

    /// Start a deletion that still needs the user's confirmation.
    pub fn request_delete(&self, id: &str) -> PendingDelete {
        let prompt = match self.get(id) {
            Some(record) => format!("Delete {} \"{}\"?", R::LABEL, record.title()),
            None => format!("Delete {} {}?", R::LABEL, id),
        };
        PendingDelete {
            id: id.to_string(),
            prompt,
        }
    }

    /// Delete a confirmed record, then reload the list.
    ///
    /// If the delete is rejected the cached list is left as it was.
    pub async fn delete(&mut self, confirmed: ConfirmedDelete) -> Result<()> {
        self.client.delete(&R::member_path(&confirmed.id)).await?;
        info!(resource = R::LABEL, id = %confirmed.id, "record deleted");
        if self.editing.as_deref() == Some(confirmed.id.as_str()) {
            self.cancel_edit();
        }
        if let Err(err) = self.reload().await {
            warn!(resource = R::LABEL, error = %err, "reload after delete failed");
            self.items.retain(|item| item.id() != confirmed.id);
        }
        Ok(())
    }

    /// Load a cached record into the draft for editing.
    pub fn begin_edit(&mut self, id: &str) -> Result<&R::Draft> {
        let record = self
            .get(id)
            .ok_or_else(|| Error::NotFound(format!("{} {}", R::LABEL, id)))?;
        self.draft = record.to_draft();
        self.editing = Some(id.to_string());
        Ok(&self.draft)
    }

    /// Drop the draft and leave edit mode. No network effect.
    pub fn cancel_edit(&mut self) {
        self.editing = None;
        self.draft = R::Draft::default();
    }

    /// Check the current draft against its schema.
    pub fn validate_draft(&self) -> Result<Validated<R::Input>, FieldErrors> {
        self.draft.validate()
    }

    /// Create or update (when editing) from checked input, then clear the draft.
    pub async fn save(&mut self, input: Validated<R::Input>) -> Result<R> {
        let record = match self.editing.clone() {
            Some(id) => self.update(&id, input).await?,
            None => self.create(input).await?,
        };
        self.cancel_edit();
        Ok(record)
    }

    /// Validate the draft and save it. Invalid drafts never reach the network.
    pub async fn submit(&mut self) -> Result<R> {
        let input = self.validate_draft()?;
        self.save(input).await
    }

    async fn reload(&mut self) -> Result<()> {
        self.list().await.map(|_| ())
    }

    pub(crate) fn replace_items(&mut self, items: Vec<R>) {
        info!(resource = R::LABEL, total = items.len(), "records loaded");
        self.items = items;
    }
}

/// A deletion awaiting user confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingDelete {
    id: String,
    prompt: String,
}

impl PendingDelete {
    /// Id that will be deleted.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Question to show the user.
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Record the user's confirmation.
    pub fn confirm(self) -> ConfirmedDelete {
        ConfirmedDelete { id: self.id }
    }
}

/// Proof that the user confirmed a deletion.
#[derive(Debug)]
pub struct ConfirmedDelete {
    id: String,
}

impl ConfirmedDelete {
    /// Id that will be deleted.
    pub fn id(&self) -> &str {
        &self.id
    }
}
