//! HTTP handlers for the Cosmoport ship registry.

use actix_web::error::{InternalError, JsonPayloadError, QueryPayloadError};
use actix_web::{HttpRequest, HttpResponse, Responder, delete, get, post, web};
use cosmoport_core::{PageRequest, Ship, ShipFilter, ShipInput, ShipService, ShipStore, validate};
use serde::Serialize;
use utoipa::OpenApi;

use crate::error::{ApiError, ErrorResponse};
use crate::openapi::ApiDoc;
use crate::store::ShipRepository;

#[derive(Clone)]
/// Shared application state for handlers.
pub struct AppState {
    /// Ship storage backend.
    pub ships: ShipRepository,
}

/// Run a service operation on the blocking pool inside one store transaction.
async fn run<T, F>(state: &web::Data<AppState>, op: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(ShipService<&mut dyn ShipStore>) -> cosmoport_core::Result<T> + Send + 'static,
{
    let ships = state.ships.clone();
    web::block(move || ships.execute(op)).await?
}

fn respond<T: Serialize>(result: Result<T, ApiError>) -> HttpResponse {
    match result {
        Ok(body) => HttpResponse::Ok().json(body),
        Err(err) => err.into_response(),
    }
}

fn query_error(err: QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    let response = HttpResponse::BadRequest().json(ErrorResponse {
        message: format!("Invalid query: {err}"),
    });
    InternalError::from_response(err, response).into()
}

fn json_error(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    let response = HttpResponse::BadRequest().json(ErrorResponse {
        message: format!("Invalid request body: {err}"),
    });
    InternalError::from_response(err, response).into()
}

/// Register the ship routes and their extractor error handlers.
///
/// `count` is registered ahead of `{id}` so it is never read as an id.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::QueryConfig::default().error_handler(query_error))
        .app_data(web::JsonConfig::default().error_handler(json_error))
        .service(count_ships)
        .service(list_ships)
        .service(create_ship)
        .service(get_ship)
        .service(update_ship)
        .service(delete_ship)
        .service(openapi_json);
}

#[utoipa::path(
    get,
    path = "/rest/ships",
    params(ShipFilter, PageRequest),
    responses(
        (status = 200, description = "Matching ships, ordered and paged", body = [Ship]),
        (status = 400, description = "Malformed query", body = ErrorResponse)
    ),
    tag = "ships"
)]
#[get("/rest/ships")]
/// List ships matching the filter, ordered and paged.
pub async fn list_ships(
    state: web::Data<AppState>,
    filter: web::Query<ShipFilter>,
    paging: web::Query<PageRequest>,
) -> impl Responder {
    let filter = filter.into_inner();
    let paging = paging.into_inner();
    let order = paging.order.unwrap_or_default();
    let result = run(&state, move |mut service| {
        let page = validate::page(paging.page_number, paging.page_size)?;
        service.list(&filter, order, page)
    })
    .await;
    respond(result)
}

#[utoipa::path(
    get,
    path = "/rest/ships/count",
    params(ShipFilter),
    responses(
        (status = 200, description = "Number of matching ships", body = u64),
        (status = 400, description = "Malformed query", body = ErrorResponse)
    ),
    tag = "ships"
)]
#[get("/rest/ships/count")]
/// Count ships matching the filter.
pub async fn count_ships(
    state: web::Data<AppState>,
    filter: web::Query<ShipFilter>,
) -> impl Responder {
    let filter = filter.into_inner();
    respond(run(&state, move |mut service| service.count(&filter)).await)
}

#[utoipa::path(
    post,
    path = "/rest/ships",
    request_body = ShipInput,
    responses(
        (status = 200, description = "Created ship", body = Ship),
        (status = 400, description = "Missing or invalid field", body = ErrorResponse)
    ),
    tag = "ships"
)]
#[post("/rest/ships")]
/// Create a ship from a complete payload.
pub async fn create_ship(
    state: web::Data<AppState>,
    payload: web::Json<Option<ShipInput>>,
) -> impl Responder {
    let candidate = payload.into_inner();
    let result = run(&state, move |mut service| service.create(candidate)).await;
    if let Ok(ship) = &result {
        log::debug!("created ship {:?}", ship.id);
    }
    respond(result)
}

#[utoipa::path(
    get,
    path = "/rest/ships/{id}",
    params(
        ("id" = i64, Path, description = "Ship identifier")
    ),
    responses(
        (status = 200, description = "Ship", body = Ship),
        (status = 400, description = "Invalid id", body = ErrorResponse),
        (status = 404, description = "No such ship", body = ErrorResponse)
    ),
    tag = "ships"
)]
#[get("/rest/ships/{id}")]
/// Fetch a ship by id.
pub async fn get_ship(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let raw = path.into_inner();
    let result = run(&state, move |mut service| {
        let id = validate::parse_id(&raw)?;
        service.get_by_id(id)
    })
    .await;
    respond(result)
}

#[utoipa::path(
    post,
    path = "/rest/ships/{id}",
    params(
        ("id" = i64, Path, description = "Ship identifier")
    ),
    request_body = ShipInput,
    responses(
        (status = 200, description = "Updated ship", body = Ship),
        (status = 400, description = "Invalid id or field", body = ErrorResponse),
        (status = 404, description = "No such ship", body = ErrorResponse)
    ),
    tag = "ships"
)]
#[post("/rest/ships/{id}")]
/// Apply a partial update to a ship and recompute its rating.
pub async fn update_ship(
    state: web::Data<AppState>,
    path: web::Path<String>,
    payload: web::Json<Option<ShipInput>>,
) -> impl Responder {
    let raw = path.into_inner();
    let patch = payload.into_inner();
    let result = run(&state, move |mut service| {
        let id = validate::parse_id(&raw)?;
        service.update_by_id(patch, id)
    })
    .await;
    if let Ok(ship) = &result {
        log::debug!("updated ship {:?}", ship.id);
    }
    respond(result)
}

#[utoipa::path(
    delete,
    path = "/rest/ships/{id}",
    params(
        ("id" = i64, Path, description = "Ship identifier")
    ),
    responses(
        (status = 200, description = "Ship deleted"),
        (status = 400, description = "Invalid id", body = ErrorResponse),
        (status = 404, description = "No such ship", body = ErrorResponse)
    ),
    tag = "ships"
)]
#[delete("/rest/ships/{id}")]
/// Delete a ship by id.
pub async fn delete_ship(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let raw = path.into_inner();
    let result = run(&state, move |mut service| {
        let id = validate::parse_id(&raw)?;
        service.delete_by_id(id).map(|()| id)
    })
    .await;
    match result {
        Ok(id) => {
            log::debug!("deleted ship {id}");
            HttpResponse::Ok().finish()
        }
        Err(err) => err.into_response(),
    }
}

#[utoipa::path(
    get,
    path = "/rest/openapi.json",
    responses(
        (status = 200, description = "OpenAPI document", body = serde_json::Value)
    ),
    tag = "system"
)]
#[get("/rest/openapi.json")]
/// Serve the OpenAPI document.
pub async fn openapi_json() -> impl Responder {
    HttpResponse::Ok().json(ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::{StatusCode, header::ContentType};
    use actix_web::{App, test};
    use chrono::{TimeZone, Utc};
    use serde_json::{Value, json};

    fn millis(year: i32) -> i64 {
        Utc.with_ymd_and_hms(year, 1, 1, 0, 0, 0)
            .unwrap()
            .timestamp_millis()
    }

    fn ship_json(speed: f64, year: i32, used: bool) -> Value {
        json!({
            "name": "Orion",
            "planet": "Mars",
            "shipType": "MERCHANT",
            "prodDate": millis(year),
            "isUsed": used,
            "speed": speed,
            "crewSize": 10
        })
    }

    macro_rules! init_app {
        () => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new(AppState {
                        ships: ShipRepository::memory(),
                    }))
                    .configure(configure),
            )
            .await
        };
    }

    macro_rules! post_ship {
        ($app:expr, $body:expr) => {{
            let req = test::TestRequest::post()
                .uri("/rest/ships")
                .set_json($body)
                .to_request();
            let ship: Ship = test::call_and_read_body_json(&$app, req).await;
            ship
        }};
    }

    macro_rules! error_of {
        ($app:expr, $req:expr) => {{
            let resp = test::call_service(&$app, $req).await;
            let status = resp.status();
            let body: ErrorResponse = test::read_body_json(resp).await;
            (status, body.message)
        }};
    }

    #[actix_web::test]
    async fn create_new_ship_rates_it() {
        let app = init_app!();
        let ship = post_ship!(
            app,
            json!({
                "name": "A",
                "planet": "P",
                "shipType": "MERCHANT",
                "prodDate": 33_103_209_600_000_i64,
                "speed": 0.5,
                "crewSize": 10
            })
        );

        assert_eq!(ship.id, Some(1));
        assert!(!ship.is_used);
        assert_eq!(ship.rating, 40.0);
    }

    #[actix_web::test]
    async fn create_old_used_ship_rates_it_low() {
        let app = init_app!();
        let ship = post_ship!(app, ship_json(0.5, 2800, true));
        assert_eq!(ship.rating, 0.09);
    }

    #[actix_web::test]
    async fn create_rejects_bad_speed_and_missing_fields() {
        let app = init_app!();
        let req = test::TestRequest::post()
            .uri("/rest/ships")
            .set_json(ship_json(0.005, 3000, false))
            .to_request();
        assert_eq!(
            error_of!(app, req),
            (StatusCode::BAD_REQUEST, "Wrong speed!".to_string())
        );

        let req = test::TestRequest::post()
            .uri("/rest/ships")
            .set_json(json!({ "name": "A", "planet": "P" }))
            .to_request();
        assert_eq!(
            error_of!(app, req),
            (StatusCode::BAD_REQUEST, "Empty fields!".to_string())
        );

        let req = test::TestRequest::post()
            .uri("/rest/ships")
            .insert_header(ContentType::json())
            .set_payload("null")
            .to_request();
        assert_eq!(
            error_of!(app, req),
            (StatusCode::BAD_REQUEST, "Empty fields!".to_string())
        );
    }

    #[actix_web::test]
    async fn malformed_body_is_bad_request() {
        let app = init_app!();
        let req = test::TestRequest::post()
            .uri("/rest/ships")
            .insert_header(ContentType::json())
            .set_payload("{\"name\":")
            .to_request();
        let (status, message) = error_of!(app, req);
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(message.starts_with("Invalid request body"));
    }

    #[actix_web::test]
    async fn list_orders_by_speed_and_pages() {
        let app = init_app!();
        for speed in [0.3, 0.1, 0.5] {
            post_ship!(app, ship_json(speed, 3000, false));
        }

        let req = test::TestRequest::get()
            .uri("/rest/ships?order=SPEED&pageSize=2&pageNumber=0")
            .to_request();
        let ships: Vec<Ship> = test::call_and_read_body_json(&app, req).await;
        let speeds: Vec<f64> = ships.iter().map(|ship| ship.speed).collect();
        assert_eq!(speeds, vec![0.1, 0.3]);

        let req = test::TestRequest::get().uri("/rest/ships").to_request();
        let ships: Vec<Ship> = test::call_and_read_body_json(&app, req).await;
        let ids: Vec<Option<i64>> = ships.iter().map(|ship| ship.id).collect();
        assert_eq!(ids, vec![Some(1), Some(2), Some(3)]);
    }

    #[actix_web::test]
    async fn count_applies_filters() {
        let app = init_app!();
        for index in 0..11 {
            post_ship!(app, ship_json(0.5, 3000, index < 4));
        }

        let req = test::TestRequest::get()
            .uri("/rest/ships/count?isUsed=true")
            .to_request();
        let count: u64 = test::call_and_read_body_json(&app, req).await;
        assert_eq!(count, 4);

        let req = test::TestRequest::get()
            .uri("/rest/ships/count?planet=ars&shipType=MERCHANT")
            .to_request();
        let count: u64 = test::call_and_read_body_json(&app, req).await;
        assert_eq!(count, 11);

        let req = test::TestRequest::get()
            .uri("/rest/ships/count?isUsed=&minSpeed=&shipType=")
            .to_request();
        let count: u64 = test::call_and_read_body_json(&app, req).await;
        assert_eq!(count, 11);

        let req = test::TestRequest::get()
            .uri("/rest/ships?pageSize=&order=")
            .to_request();
        let ships: Vec<Ship> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(ships.len(), 3);
    }

    #[actix_web::test]
    async fn bad_query_values_are_bad_requests() {
        let app = init_app!();
        let req = test::TestRequest::get()
            .uri("/rest/ships?shipType=merchant")
            .to_request();
        let (status, message) = error_of!(app, req);
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(message.starts_with("Invalid query"));

        let req = test::TestRequest::get()
            .uri("/rest/ships?pageNumber=-1")
            .to_request();
        assert_eq!(
            error_of!(app, req),
            (StatusCode::BAD_REQUEST, "Wrong page!".to_string())
        );
    }

    #[actix_web::test]
    async fn update_recomputes_rating_only_for_changed_fields() {
        let app = init_app!();
        let ship = post_ship!(app, ship_json(0.5, 2800, true));
        let id = ship.id.expect("id");

        let req = test::TestRequest::post()
            .uri(&format!("/rest/ships/{id}"))
            .set_json(json!({ "speed": 0.7 }))
            .to_request();
        let updated: Ship = test::call_and_read_body_json(&app, req).await;

        assert_eq!(updated.speed, 0.7);
        assert_eq!(updated.rating, 0.13);
        assert_eq!(updated.name, ship.name);
        assert_eq!(updated.planet, ship.planet);
        assert_eq!(updated.prod_date, ship.prod_date);
        assert_eq!(updated.crew_size, ship.crew_size);
        assert!(updated.is_used);
    }

    #[actix_web::test]
    async fn update_with_null_body_needs_existing_ship() {
        let app = init_app!();
        let req = test::TestRequest::post()
            .uri("/rest/ships/9")
            .insert_header(ContentType::json())
            .set_payload("null")
            .to_request();
        assert_eq!(
            error_of!(app, req),
            (StatusCode::NOT_FOUND, "Ship not found!".to_string())
        );

        post_ship!(app, ship_json(0.5, 3000, false));
        let req = test::TestRequest::post()
            .uri("/rest/ships/1")
            .insert_header(ContentType::json())
            .set_payload("null")
            .to_request();
        assert_eq!(
            error_of!(app, req),
            (StatusCode::BAD_REQUEST, "Empty update info!".to_string())
        );
    }

    #[actix_web::test]
    async fn get_reports_bad_and_missing_ids() {
        let app = init_app!();
        for uri in ["/rest/ships/abc", "/rest/ships/0", "/rest/ships/-4"] {
            let req = test::TestRequest::get().uri(uri).to_request();
            assert_eq!(
                error_of!(app, req),
                (StatusCode::BAD_REQUEST, "Wrong id!".to_string()),
                "{uri}"
            );
        }

        let req = test::TestRequest::get().uri("/rest/ships/77").to_request();
        assert_eq!(
            error_of!(app, req),
            (StatusCode::NOT_FOUND, "Ship not found!".to_string())
        );
    }

    #[actix_web::test]
    async fn delete_removes_ship() {
        let app = init_app!();
        let ship = post_ship!(app, ship_json(0.5, 3000, false));
        let id = ship.id.expect("id");

        let req = test::TestRequest::get()
            .uri(&format!("/rest/ships/{id}"))
            .to_request();
        let fetched: Ship = test::call_and_read_body_json(&app, req).await;
        assert_eq!(fetched, ship);

        let req = test::TestRequest::delete()
            .uri(&format!("/rest/ships/{id}"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(test::read_body(resp).await.is_empty());

        let req = test::TestRequest::delete()
            .uri(&format!("/rest/ships/{id}"))
            .to_request();
        assert_eq!(
            error_of!(app, req),
            (StatusCode::NOT_FOUND, "Ship not found!".to_string())
        );
    }

    #[actix_web::test]
    async fn openapi_lists_ship_routes() {
        let app = init_app!();
        let req = test::TestRequest::get()
            .uri("/rest/openapi.json")
            .to_request();
        let doc: Value = test::call_and_read_body_json(&app, req).await;
        let paths = doc["paths"].as_object().expect("paths");
        assert!(paths.contains_key("/rest/ships"));
        assert!(paths.contains_key("/rest/ships/count"));
        assert!(paths.contains_key("/rest/ships/{id}"));
    }
}
