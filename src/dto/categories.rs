use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::Category,
    validation::{validate_name, validate_slug},
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CategoryRequest {
    pub name: Option<String>,
    pub slug: Option<String>,
}

impl CategoryRequest {
    /// Returns the validated `(name, slug)` pair.
    pub fn validate(self) -> AppResult<(String, String)> {
        let name = validate_name("name", self.name.as_deref())?;
        let slug = validate_slug("slug", self.slug.as_deref())?;
        Ok((name, slug))
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CategoryList {
    pub items: Vec<Category>,
}
