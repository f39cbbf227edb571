use tracing::info;

use super::{manager::ResourceManager, ConfirmedDelete, PendingDelete, Resource};
use crate::{
    http::ApiClient,
    models::{Category, Part},
    validation::{FieldErrors, PartDraft, PartInput, Validated},
    Result,
};

/// Part CRUD plus the category list that feeds the category selector.
///
/// Categories are only ever read here; they are owned by the category
/// manager and refreshed on [`PartManager::load`].
pub struct PartManager {
    parts: ResourceManager<Part>,
    client: ApiClient,
    categories: Vec<Category>,
}

impl PartManager {
    /// Empty manager issuing requests through `client`.
    pub fn new(client: ApiClient) -> Self {
        Self {
            parts: ResourceManager::new(client.clone()),
            client,
            categories: Vec::new(),
        }
    }

    /// Cached parts.
    pub fn items(&self) -> &[Part] {
        self.parts.items()
    }

    /// Categories available for selection.
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// Name of the category with `id`, if loaded.
    pub fn category_name(&self, id: &str) -> Option<&str> {
        self.categories
            .iter()
            .find(|category| category.id == id)
            .map(|category| category.name.as_str())
    }

    /// Underlying part manager.
    pub fn parts(&self) -> &ResourceManager<Part> {
        &self.parts
    }

    /// Mutable access to the underlying part manager.
    pub fn parts_mut(&mut self) -> &mut ResourceManager<Part> {
        &mut self.parts
    }

    /// Current draft.
    pub fn draft(&self) -> &PartDraft {
        self.parts.draft()
    }

    /// Mutable draft for form input.
    pub fn draft_mut(&mut self) -> &mut PartDraft {
        self.parts.draft_mut()
    }

    /// Fetch parts and categories concurrently.
    ///
    /// State only changes once both requests have succeeded.
    pub async fn load(&mut self) -> Result<()> {
        let (parts, categories) = tokio::try_join!(
            self.client.get::<Vec<Part>>(Part::COLLECTION),
            self.client.get::<Vec<Category>>(Category::COLLECTION),
        )?;
        info!(categories = categories.len(), "part view loaded");
        self.parts.replace_items(parts);
        self.categories = categories;
        Ok(())
    }

    /// Refresh only the part list.
    pub async fn list(&mut self) -> Result<&[Part]> {
        self.parts.list().await
    }

    /// Check the draft, including that its category is one of the loaded ones.
    pub fn validate_draft(&self) -> Result<Validated<PartInput>, FieldErrors> {
        let input = self.parts.validate_draft()?;
        self.check_category(&input)?;
        Ok(input)
    }

    /// Create a part after checking its category.
    pub async fn create(&mut self, input: Validated<PartInput>) -> Result<Part> {
        self.check_category(&input)?;
        self.parts.create(input).await
    }

    /// Update part `id` after checking its category.
    pub async fn update(&mut self, id: &str, input: Validated<PartInput>) -> Result<Part> {
        self.check_category(&input)?;
        self.parts.update(id, input).await
    }

    /// Validate and save the draft.
    pub async fn submit(&mut self) -> Result<Part> {
        let input = self.validate_draft()?;
        self.parts.save(input).await
    }

    /// Load part `id` into the draft.
    pub fn begin_edit(&mut self, id: &str) -> Result<&PartDraft> {
        self.parts.begin_edit(id)
    }

    /// Discard the draft.
    pub fn cancel_edit(&mut self) {
        self.parts.cancel_edit();
    }

    /// Start a deletion awaiting confirmation.
    pub fn request_delete(&self, id: &str) -> PendingDelete {
        self.parts.request_delete(id)
    }

    /// Delete a confirmed part.
    pub async fn delete(&mut self, confirmed: ConfirmedDelete) -> Result<()> {
        self.parts.delete(confirmed).await
    }

    /// Reject category ids outside the loaded set. Skipped when no
    /// categories are loaded; the server stays authoritative.
    fn check_category(&self, input: &PartInput) -> Result<(), FieldErrors> {
        if self.categories.is_empty() || self.category_name(&input.category_id).is_some() {
            return Ok(());
        }
        let mut errors = FieldErrors::new();
        errors.insert("categoryId", "Unknown category");
        Err(errors)
    }
}
