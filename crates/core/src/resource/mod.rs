//! CRUD managers for the inventory resources.

/// Generic list/create/update/delete manager.
pub mod manager;
/// Part manager with its read-only category lookup.
pub mod parts;

use serde::{de::DeserializeOwned, Serialize};

use crate::{
    models::{Category, Part},
    validation::{CategoryDraft, CategoryInput, FormDraft, PartDraft, PartInput, Validate},
};

pub use manager::{ConfirmedDelete, PendingDelete, ResourceManager};
pub use parts::PartManager;

/// Manager for categories.
pub type CategoryManager = ResourceManager<Category>;

/// A record type served from one REST collection.
pub trait Resource: Clone + DeserializeOwned + Send + Sync + 'static {
    /// Collection path, e.g. `/api/categories`.
    const COLLECTION: &'static str;
    /// Singular noun used in messages.
    const LABEL: &'static str;

    /// Editable form state.
    type Draft: FormDraft + Validate<Output = Self::Input> + Default + Clone + Send;
    /// Checked payload for create/update.
    type Input: Serialize + Send + Sync;

    /// Server-assigned id.
    fn id(&self) -> &str;

    /// Human-readable name shown in lists and prompts.
    fn title(&self) -> &str;

    /// Draft pre-filled with this record's fields.
    fn to_draft(&self) -> Self::Draft;

    /// Path of a single record.
    fn member_path(id: &str) -> String {
        format!("{}/{}", Self::COLLECTION, id)
    }
}

impl Resource for Category {
    const COLLECTION: &'static str = "/api/categories";
    const LABEL: &'static str = "category";

    type Draft = CategoryDraft;
    type Input = CategoryInput;

    fn id(&self) -> &str {
        &self.id
    }

    fn title(&self) -> &str {
        &self.name
    }

    fn to_draft(&self) -> CategoryDraft {
        CategoryDraft::from(self)
    }
}

impl Resource for Part {
    const COLLECTION: &'static str = "/api/parts";
    const LABEL: &'static str = "part";

    type Draft = PartDraft;
    type Input = PartInput;

    fn id(&self) -> &str {
        &self.id
    }

    fn title(&self) -> &str {
        &self.name
    }

    fn to_draft(&self) -> PartDraft {
        PartDraft::from(self)
    }
}
