use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        auth::{LoginRequest, LoginResponse, RegisterRequest},
        categories::{CategoryList, CategoryRequest},
        orders::{
            CustomerRequest, DeliveryRequest, OrderItemRequest, OrderList, OrderWithItems,
            PlaceOrderRequest, UpdatePaymentStatusRequest,
        },
        payments::{PaymentPreferenceRequest, PaymentPreferenceResponse},
        products::{CreateProductRequest, ProductList, UpdateProductRequest, UpdateStockRequest},
    },
    models::{
        Category, Order, OrderLine, PaymentMethod, PaymentStatus, Product, SizeStock, User,
    },
    response::{ApiResponse, Meta},
    routes::{auth, categories, health, orders, params, payments, products},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::login,
        auth::register,
        products::list_products,
        products::get_product,
        products::create_product,
        products::update_product,
        products::set_size_stock,
        products::delete_product,
        categories::list_categories,
        categories::get_category,
        categories::create_category,
        categories::update_category,
        categories::delete_category,
        orders::place_order,
        orders::list_orders,
        orders::get_order,
        orders::update_payment_status,
        payments::create_preference
    ),
    components(
        schemas(
            User,
            Category,
            Product,
            SizeStock,
            Order,
            OrderLine,
            PaymentMethod,
            PaymentStatus,
            RegisterRequest,
            LoginRequest,
            LoginResponse,
            CategoryRequest,
            CategoryList,
            CreateProductRequest,
            UpdateProductRequest,
            UpdateStockRequest,
            ProductList,
            PlaceOrderRequest,
            OrderItemRequest,
            CustomerRequest,
            DeliveryRequest,
            UpdatePaymentStatusRequest,
            OrderList,
            OrderWithItems,
            PaymentPreferenceRequest,
            PaymentPreferenceResponse,
            params::SortOrder,
            params::ProductSortBy,
            Meta,
            ApiResponse<Product>,
            ApiResponse<ProductList>,
            ApiResponse<OrderWithItems>,
            ApiResponse<OrderList>
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Authentication endpoints"),
        (name = "Products", description = "Catalog products"),
        (name = "Categories", description = "Catalog categories"),
        (name = "Orders", description = "Order placement and admin order management"),
        (name = "Payments", description = "Payment gateway checkout"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_lists_order_routes() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/orders"));
        assert!(doc.paths.paths.contains_key("/api/orders/{id}/payment-status"));
        assert!(doc.paths.paths.contains_key("/api/payments/preference"));
    }
}
