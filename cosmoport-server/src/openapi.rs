//! OpenAPI specification for the Cosmoport server.

use utoipa::OpenApi;

use cosmoport_core::{PageRequest, Ship, ShipFilter, ShipInput, ShipOrder, ShipType};

use crate::error::ErrorResponse;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::list_ships,
        crate::routes::count_ships,
        crate::routes::create_ship,
        crate::routes::get_ship,
        crate::routes::update_ship,
        crate::routes::delete_ship,
        crate::routes::openapi_json
    ),
    components(
        schemas(
            Ship,
            ShipInput,
            ShipType,
            ShipOrder,
            ShipFilter,
            PageRequest,
            ErrorResponse
        )
    ),
    tags(
        (name = "ships", description = "Ship registry"),
        (name = "system", description = "System endpoints")
    )
)]
/// OpenAPI specification for the Cosmoport server.
pub struct ApiDoc;
