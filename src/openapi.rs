use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// OpenAPI document for the documented subset of the surface. Served at
/// `/docs`.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "backoffice-api",
        description = "Back-office and storefront API: catalog, commerce, stock, HR, helpdesk, content and finance",
        license(name = "MIT")
    ),
    paths(
        crate::handlers::catalog::list_products,
        crate::handlers::catalog::get_product,
        crate::handlers::clients::list_clients,
        crate::handlers::orders::list_orders,
        crate::handlers::orders::get_order,
        crate::handlers::quotes::convert_quote,
        crate::handlers::stock::list_movements,
        crate::handlers::stock::record_movement,
        crate::handlers::hr::list_employees,
        crate::handlers::leave::submit_request,
        crate::handlers::tickets::list_tickets,
        crate::handlers::finance::list_transactions,
        crate::handlers::storefront::place_order,
        crate::handlers::storefront::track_order,
    ),
    tags(
        (name = "Catalog", description = "Products, brands and categories"),
        (name = "Clients", description = "Client directory"),
        (name = "Orders", description = "Sales orders"),
        (name = "Quotes", description = "Quotes and conversion"),
        (name = "Stock", description = "Stock movement ledger"),
        (name = "HR", description = "Departments and employees"),
        (name = "Leave", description = "Leave request workflow"),
        (name = "Helpdesk", description = "Tickets and SLA tracking"),
        (name = "Finance", description = "Financial transactions"),
        (name = "Storefront", description = "Public storefront API"),
    )
)]
pub struct ApiDoc;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi())
}
