//! Domain types and models

pub mod product;

pub use product::{
    Accessory, Language, Product, ProductType, ProductTypeGroup, ProductTypesContainer, ProductsContainer,
    SERVICE_TYPE_GROUP,
};
