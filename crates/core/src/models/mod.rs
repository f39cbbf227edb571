//! Records exchanged with the inventory API.

use serde::{Deserialize, Deserializer, Serialize};

/// Identity of the logged-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Server-side user id.
    pub id: String,
    /// Given name.
    pub firstname: String,
    /// Family name.
    pub lastname: String,
    /// Account email.
    pub email: String,
    /// Whether the account has administrative rights.
    #[serde(default)]
    pub admin: bool,
    /// Whether the account is enabled.
    #[serde(default = "default_active")]
    pub active: bool,
}

impl Profile {
    /// Name shown in the UI header.
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.firstname, self.lastname);
        match full.trim() {
            "" => self.email.clone(),
            name => name.to_string(),
        }
    }
}

fn default_active() -> bool {
    true
}

/// Part category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Server-assigned id (`id` or `_id` on the wire).
    #[serde(alias = "_id", deserialize_with = "id_string")]
    pub id: String,
    /// Category name.
    pub name: String,
    /// Optional free text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Inventory part.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Part {
    /// Server-assigned id (`id` or `_id` on the wire).
    #[serde(alias = "_id", deserialize_with = "id_string")]
    pub id: String,
    /// Part name.
    pub name: String,
    /// Owning category id.
    #[serde(rename = "categoryId", deserialize_with = "id_string")]
    pub category_id: String,
    /// Unit price.
    pub price: f64,
    /// Units in stock.
    pub stock: u32,
}

/// Accept ids encoded either as JSON strings or numbers.
pub(crate) fn id_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(i64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(value) => value,
        RawId::Number(value) => value.to_string(),
    })
}
