//! ITscope Catalog Domain Models
//!
//! These models represent the JSON documents returned by the product search
//! and product type endpoints, plus the small set/list helpers used to filter
//! them.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ============================================================================
// Products
// ============================================================================

/// Reference from a product to one of its accessories
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Accessory {
    #[serde(default)]
    pub referenced_product_id: String,
}

/// Product record from the search endpoint
///
/// Only the fields the client works with are typed; everything else the API
/// sends is kept in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(default)]
    pub puid: String,
    #[serde(default)]
    pub product_type_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub image1: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub image2: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub image3: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub image4: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub image5: String,
    #[serde(default, rename = "accessory", skip_serializing_if = "Vec::is_empty")]
    pub accessories: Vec<Accessory>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Product {
    /// Non-empty image references, in slot order
    pub fn image_urls(&self) -> Vec<String> {
        [
            &self.image1,
            &self.image2,
            &self.image3,
            &self.image4,
            &self.image5,
        ]
        .into_iter()
        .filter(|url| !url.is_empty())
        .cloned()
        .collect()
    }

    /// Product ids of all referenced accessories
    pub fn accessory_ids(&self) -> Vec<String> {
        self.accessories
            .iter()
            .map(|a| a.referenced_product_id.clone())
            .collect()
    }
}

/// `{"product": [...]}` response body
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductsContainer {
    #[serde(default)]
    pub product: Vec<Product>,
}

// ============================================================================
// Product Types
// ============================================================================

/// Group a product type belongs to (e.g. `SSP` for service products)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductTypeGroup {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductType {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub product_type_group: ProductTypeGroup,
}

/// `{"producttype": [...]}` response body
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductTypesContainer {
    #[serde(default, rename = "producttype")]
    pub product_types: Vec<ProductType>,
}

/// Group id of service product types
pub const SERVICE_TYPE_GROUP: &str = "SSP";

// ============================================================================
// Language
// ============================================================================

/// Response language, sent as `Accept-Language`
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Language {
    #[default]
    German,
    English,
    Other(String),
}

impl Language {
    pub fn as_str(&self) -> &str {
        match self {
            Language::German => "de",
            Language::English => "en",
            Language::Other(tag) => tag,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for Language {
    fn from(tag: String) -> Self {
        match tag.to_lowercase().as_str() {
            "de" | "german" => Language::German,
            "en" | "english" => Language::English,
            _ => Language::Other(tag),
        }
    }
}

impl From<Language> for String {
    fn from(lang: Language) -> Self {
        lang.as_str().to_string()
    }
}

impl FromStr for Language {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Language::from(s.to_string()))
    }
}

// ============================================================================
// Filters
// ============================================================================

/// Product types whose group id equals `group_id`
pub fn filter_product_types_by_group_id(group_id: &str, product_types: &[ProductType]) -> Vec<ProductType> {
    product_types
        .iter()
        .filter(|t| t.product_type_group.id == group_id)
        .cloned()
        .collect()
}

/// Product types whose id equals `id`
pub fn filter_product_types_by_id(id: &str, product_types: &[ProductType]) -> Vec<ProductType> {
    product_types
        .iter()
        .filter(|t| t.id == id)
        .cloned()
        .collect()
}

/// Products whose type is one of `type_list`, de-duplicated by `puid`
///
/// A product with an empty type id never matches, and neither does a type
/// without a group. On a `puid` collision the last match wins. The result is
/// ordered by `puid`.
pub fn filter_products_by_type_list(products: &[Product], type_list: &[ProductType]) -> Vec<Product> {
    let mut filtered: BTreeMap<&str, &Product> = BTreeMap::new();

    for product_type in type_list {
        if product_type.product_type_group.id.is_empty() {
            continue;
        }
        for product in products {
            if !product.product_type_id.is_empty() && product.product_type_id == product_type.id {
                filtered.insert(product.puid.as_str(), product);
            }
        }
    }

    filtered.into_values().cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(puid: &str, type_id: &str) -> Product {
        Product {
            puid: puid.to_string(),
            product_type_id: type_id.to_string(),
            ..Default::default()
        }
    }

    fn product_type(id: &str, group: &str) -> ProductType {
        ProductType {
            id: id.to_string(),
            name: format!("type {}", id),
            product_type_group: ProductTypeGroup {
                id: group.to_string(),
                name: String::new(),
            },
        }
    }

    #[test]
    fn test_decode_products_container() {
        let body = r#"{
            "product": [{
                "puid": "1001",
                "productTypeId": "42",
                "image1": "https://img/1.jpg",
                "image3": "https://img/3.jpg",
                "accessory": [{"referencedProductId": "2002"}],
                "manufacturerSku": "ABC-1"
            }]
        }"#;

        let container: ProductsContainer = serde_json::from_str(body).unwrap();
        let p = &container.product[0];

        assert_eq!(p.puid, "1001");
        assert_eq!(p.product_type_id, "42");
        assert_eq!(p.accessory_ids(), vec!["2002".to_string()]);
        assert_eq!(p.extra.get("manufacturerSku").and_then(|v| v.as_str()), Some("ABC-1"));
    }

    #[test]
    fn test_decode_empty_containers() {
        let products: ProductsContainer = serde_json::from_str("{}").unwrap();
        assert!(products.product.is_empty());

        let types: ProductTypesContainer = serde_json::from_str("{}").unwrap();
        assert!(types.product_types.is_empty());
    }

    #[test]
    fn test_decode_product_types() {
        let body = r#"{"producttype": [{"id": "7", "name": "Warranty", "productTypeGroup": {"id": "SSP", "name": "Service"}}]}"#;
        let container: ProductTypesContainer = serde_json::from_str(body).unwrap();

        assert_eq!(container.product_types.len(), 1);
        assert_eq!(container.product_types[0].product_type_group.id, SERVICE_TYPE_GROUP);
    }

    #[test]
    fn test_image_urls_skip_empty_slots() {
        let p = Product {
            image1: "a".into(),
            image2: String::new(),
            image4: "d".into(),
            image5: "e".into(),
            ..Default::default()
        };

        assert_eq!(p.image_urls(), vec!["a", "d", "e"]);
        assert!(Product::default().image_urls().is_empty());
    }

    #[test]
    fn test_language_tags() {
        assert_eq!(Language::from("DE".to_string()), Language::German);
        assert_eq!("en".parse::<Language>().unwrap(), Language::English);
        assert_eq!(Language::from("fr".to_string()).as_str(), "fr");
        assert_eq!(Language::default().to_string(), "de");
    }

    #[test]
    fn test_filter_product_types() {
        let types = vec![product_type("1", "SSP"), product_type("2", "HW"), product_type("3", "SSP")];

        let services = filter_product_types_by_group_id("SSP", &types);
        assert_eq!(services.len(), 2);

        let by_id = filter_product_types_by_id("2", &types);
        assert_eq!(by_id, vec![product_type("2", "HW")]);
    }

    #[test]
    fn test_filter_products_by_type_list() {
        let products = vec![
            product("b", "1"),
            product("a", "1"),
            product("c", "2"),
            product("d", ""),
        ];
        let types = vec![product_type("1", "SSP"), product_type("", "SSP")];

        let filtered = filter_products_by_type_list(&products, &types);
        let puids: Vec<_> = filtered.iter().map(|p| p.puid.as_str()).collect();

        assert_eq!(puids, vec!["a", "b"]);
    }

    #[test]
    fn test_filter_products_dedups_last_wins() {
        let mut second = product("a", "1");
        second.image1 = "newer".into();
        let products = vec![product("a", "1"), second.clone()];

        let filtered = filter_products_by_type_list(&products, &[product_type("1", "SSP")]);

        assert_eq!(filtered, vec![second]);
    }

    #[test]
    fn test_filter_products_ignores_types_without_group() {
        let products = vec![product("a", "1")];

        assert!(filter_products_by_type_list(&products, &[product_type("1", "")]).is_empty());
    }
}
