use serde::{Deserialize, Serialize};

use super::ItemId;

/// A votable entry in the catalog.
///
/// Only `id` participates in voting. `name` and `image_url` are display
/// metadata captured when the catalog was populated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    #[serde(rename = "image_id", alias = "id")]
    pub id: ItemId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl Item {
    #[must_use]
    pub const fn new(id: ItemId) -> Self {
        Self {
            id,
            name: None,
            image_url: None,
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_image_url(mut self, url: impl Into<String>) -> Self {
        self.image_url = Some(url.into());
        self
    }
}
