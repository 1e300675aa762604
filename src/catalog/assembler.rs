//! Product assembler for accessory resolution
//!
//! Composes the catalog operations into the higher-level lookups: all
//! accessories of a product, and only those accessories that are service
//! products.

use std::sync::Arc;

use tracing::{debug, instrument};

use crate::domain::product::{
    filter_product_types_by_group_id, filter_products_by_type_list, Product, SERVICE_TYPE_GROUP,
};
use crate::providers::context::RequestContext;
use crate::providers::traits::{CatalogResult, ProductCatalog, ResultExt};

/// Accessory resolution on top of a product catalog
pub struct ProductAssembler<C: ?Sized> {
    catalog: Arc<C>,
}

impl<C: ?Sized> Clone for ProductAssembler<C> {
    fn clone(&self) -> Self {
        Self {
            catalog: self.catalog.clone(),
        }
    }
}

impl<C: ProductCatalog + ?Sized> ProductAssembler<C> {
    pub fn new(catalog: Arc<C>) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    /// Fetch every accessory referenced by `product`
    #[instrument(skip(self, ctx, product), fields(puid = %product.puid))]
    pub async fn product_accessories(&self, ctx: &RequestContext, product: &Product) -> CatalogResult<Vec<Product>> {
        let accessory_ids = product.accessory_ids();
        debug!(accessories = accessory_ids.len(), "Resolving accessories");

        self.catalog
            .get_products_by_ids(ctx, &accessory_ids)
            .await
            .context("product accessories")
    }

    /// Accessories of `product` whose type belongs to the service group
    ///
    /// De-duplicated by `puid` and ordered by `puid`.
    #[instrument(skip(self, ctx, product), fields(puid = %product.puid))]
    pub async fn service_type_accessories(
        &self,
        ctx: &RequestContext,
        product: &Product,
    ) -> CatalogResult<Vec<Product>> {
        let product_types = self
            .catalog
            .get_all_product_types(ctx)
            .await
            .context("service type accessories")?;

        let accessories = self.product_accessories(ctx, product).await?;

        let service_types = filter_product_types_by_group_id(SERVICE_TYPE_GROUP, &product_types);
        let services = filter_products_by_type_list(&accessories, &service_types);

        debug!(
            accessories = accessories.len(),
            service_types = service_types.len(),
            services = services.len(),
            "Filtered service accessories"
        );

        Ok(services)
    }
}
