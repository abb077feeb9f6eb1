use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    error::{AppError, AppResult},
    models::{Product, SizeStock},
    validation::{
        require_text, validate_description, validate_price, validate_sizes, validate_slug,
    },
};

const MAX_PRODUCT_ID_LEN: usize = 50;
const MAX_LABEL_LEN: usize = 200;

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    /// Generated as `prod-<8 hex>` when omitted.
    pub id: Option<String>,
    pub name: Option<String>,
    pub brand: Option<String>,
    #[schema(value_type = Option<String>, example = "120.00")]
    pub price: Option<Decimal>,
    #[schema(value_type = Option<String>)]
    pub original_price: Option<Decimal>,
    #[serde(default)]
    pub images: Vec<String>,
    pub description: Option<String>,
    pub sizes: Option<Vec<SizeStock>>,
    pub category: Option<String>,
    #[serde(default)]
    pub featured: bool,
}

/// Validated product fields, ready to insert.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub id: Option<String>,
    pub name: String,
    pub brand: String,
    pub price: Decimal,
    pub original_price: Option<Decimal>,
    pub images: Vec<String>,
    pub description: String,
    pub sizes: Vec<SizeStock>,
    pub category: String,
    pub featured: bool,
}

fn bounded_text(field: &str, value: Option<&str>) -> AppResult<String> {
    let text = require_text(field, value)?;
    if text.chars().count() > MAX_LABEL_LEN {
        return Err(AppError::BadRequest(format!(
            "{field} is too long (max {MAX_LABEL_LEN} characters)"
        )));
    }
    Ok(text)
}

fn optional_price(field: &str, value: Option<Decimal>) -> AppResult<Option<Decimal>> {
    value.map(|p| validate_price(field, Some(p))).transpose()
}

fn image_list(images: Vec<String>) -> Vec<String> {
    images
        .into_iter()
        .map(|url| url.trim().to_string())
        .filter(|url| !url.is_empty())
        .collect()
}

impl CreateProductRequest {
    pub fn validate(self) -> AppResult<NewProduct> {
        let id = match self.id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => {
                if id.chars().count() > MAX_PRODUCT_ID_LEN {
                    return Err(AppError::BadRequest(format!(
                        "id is too long (max {MAX_PRODUCT_ID_LEN} characters)"
                    )));
                }
                Some(id.to_string())
            }
            _ => None,
        };

        Ok(NewProduct {
            id,
            name: bounded_text("name", self.name.as_deref())?,
            brand: bounded_text("brand", self.brand.as_deref())?,
            price: validate_price("price", self.price)?,
            original_price: optional_price("originalPrice", self.original_price)?,
            images: image_list(self.images),
            description: validate_description("description", self.description.as_deref())?,
            sizes: validate_sizes("sizes", self.sizes)?,
            category: validate_slug("category", self.category.as_deref())?,
            featured: self.featured,
        })
    }
}

/// Partial update. Absent fields keep their stored value.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub brand: Option<String>,
    #[schema(value_type = Option<String>)]
    pub price: Option<Decimal>,
    #[schema(value_type = Option<String>)]
    pub original_price: Option<Decimal>,
    pub images: Option<Vec<String>>,
    pub description: Option<String>,
    pub sizes: Option<Vec<SizeStock>>,
    pub category: Option<String>,
    pub featured: Option<bool>,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct ProductChanges {
    pub name: Option<String>,
    pub brand: Option<String>,
    pub price: Option<Decimal>,
    pub original_price: Option<Decimal>,
    pub images: Option<Vec<String>>,
    pub description: Option<String>,
    pub sizes: Option<Vec<SizeStock>>,
    pub category: Option<String>,
    pub featured: Option<bool>,
}

impl UpdateProductRequest {
    pub fn validate(self) -> AppResult<ProductChanges> {
        Ok(ProductChanges {
            name: self
                .name
                .map(|v| bounded_text("name", Some(&v)))
                .transpose()?,
            brand: self
                .brand
                .map(|v| bounded_text("brand", Some(&v)))
                .transpose()?,
            price: optional_price("price", self.price)?,
            original_price: optional_price("originalPrice", self.original_price)?,
            images: self.images.map(image_list),
            description: self
                .description
                .map(|v| validate_description("description", Some(&v)))
                .transpose()?,
            sizes: self
                .sizes
                .map(|v| validate_sizes("sizes", Some(v)))
                .transpose()?,
            category: self
                .category
                .map(|v| validate_slug("category", Some(&v)))
                .transpose()?,
            featured: self.featured,
        })
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateStockRequest {
    pub size: String,
    pub stock: i32,
}

#[derive(Serialize, ToSchema)]
pub struct ProductList {
    pub items: Vec<Product>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> CreateProductRequest {
        serde_json::from_value(serde_json::json!({
            "name": "Air Jordan 1 Retro",
            "brand": "Nike",
            "price": "120.00",
            "originalPrice": 180,
            "images": ["https://img.example/aj1.jpg", "  "],
            "description": "Icónico diseño de basketball",
            "sizes": [{ "value": "37", "stock": 3 }, { "value": "38", "stock": 8 }],
            "category": "Tenis"
        }))
        .unwrap()
    }

    #[test]
    fn create_request_normalizes_fields() {
        let product = request().validate().unwrap();
        assert_eq!(product.id, None);
        assert_eq!(product.price, Decimal::new(12000, 2));
        assert_eq!(product.original_price, Some(Decimal::from(180)));
        assert_eq!(product.images, ["https://img.example/aj1.jpg"]);
        assert_eq!(product.category, "tenis");
        assert!(!product.featured);
    }

    #[test]
    fn create_request_rejects_bad_sizes() {
        let mut req = request();
        req.sizes = Some(vec![SizeStock {
            value: "99".into(),
            stock: 1,
        }]);
        assert!(req.validate().unwrap_err().to_string().contains("unknown size '99'"));

        let mut req = request();
        req.sizes = None;
        assert_eq!(
            req.validate().unwrap_err().to_string(),
            "sizes must contain at least one size"
        );
    }

    #[test]
    fn update_validates_only_present_fields() {
        let changes = UpdateProductRequest {
            featured: Some(true),
            ..Default::default()
        }
        .validate()
        .unwrap();
        assert_eq!(changes.featured, Some(true));
        assert_eq!(changes.name, None);

        let err = UpdateProductRequest {
            description: Some("short".into()),
            ..Default::default()
        }
        .validate()
        .unwrap_err();
        assert!(err.to_string().starts_with("description"));
    }
}
