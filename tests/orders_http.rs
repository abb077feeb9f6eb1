mod common;

use axum::{
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use serde_json::{Value, json};
use tower::ServiceExt;

use common::{bearer, harness, order_json};
use urbangoal_api::{routes::app, store::StockPolicy};

async fn send(router: axum::Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn post_order_returns_created_with_joined_lines() {
    let h = harness(StockPolicy::Clamp);
    let body = order_json(
        "order-1",
        json!([{ "productId": "prod-1", "quantity": 2, "size": "38" }]),
    );

    let (status, json) = send(app(h.state.clone()), post_json("/api/orders", &body)).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["message"], "Order placed");
    assert_eq!(json["data"]["order"]["id"], "order-1");
    assert_eq!(json["data"]["order"]["paymentStatus"], "pending");
    let line = &json["data"]["items"][0];
    assert_eq!(line["productName"], "Air Jordan 1 Retro");
    assert_eq!(line["productBrand"], "Nike");
    assert_eq!(line["priceAtPurchase"], "120");
    assert_eq!(h.stock("prod-1", "38"), Some(6));
}

#[tokio::test]
async fn validation_errors_are_bad_requests() {
    let h = harness(StockPolicy::Clamp);
    let mut body = order_json(
        "order-2",
        json!([{ "productId": "prod-1", "quantity": 2, "size": "38" }]),
    );
    body.as_object_mut().unwrap().remove("customer");

    let (status, json) = send(app(h.state.clone()), post_json("/api/orders", &body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["message"], "Bad Request");
    assert_eq!(json["error"], "customer is required");
    assert!(json["meta"].is_null());
    assert_eq!(h.store.order_count(), 0);
}

#[tokio::test]
async fn values_the_schema_cannot_hold_are_bad_requests() {
    let h = harness(StockPolicy::Clamp);
    let items = json!([{ "productId": "prod-1", "quantity": 1, "size": "38" }]);

    let mut body = order_json("order-8", items.clone());
    body["total"] = json!(0.001);
    let (status, json) = send(app(h.state.clone()), post_json("/api/orders", &body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "total must have at most 2 decimals");

    let mut body = order_json("order-8", items);
    body["delivery"]["line"] = json!("L".repeat(150));
    let (status, json) = send(app(h.state.clone()), post_json("/api/orders", &body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "delivery.line is too long (max 100 characters)");

    assert_eq!(h.store.order_count(), 0);
    assert_eq!(h.stock("prod-1", "38"), Some(8));
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
    let h = harness(StockPolicy::Clamp);
    let request = Request::post("/api/orders")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"id\": \"order-3\", \"items\": ["))
        .unwrap();

    let (status, json) = send(app(h.state), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().len() > 0);
}

#[tokio::test]
async fn unknown_product_is_rejected_without_side_effects() {
    let h = harness(StockPolicy::Clamp);
    let body = order_json(
        "order-4",
        json!([
            { "productId": "prod-2", "quantity": 1, "size": "36" },
            { "productId": "prod-99", "quantity": 1, "size": "36" }
        ]),
    );

    let (status, json) = send(app(h.state.clone()), post_json("/api/orders", &body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Product prod-99 not found");
    assert_eq!(h.stock("prod-2", "36"), Some(4));
    assert!(h.sink.events().is_empty());
}

#[tokio::test]
async fn duplicate_order_is_a_server_error_with_generic_message() {
    let h = harness(StockPolicy::Clamp);
    let body = order_json(
        "order-5",
        json!([{ "productId": "prod-3", "quantity": 1, "size": "38" }]),
    );

    let (first, _) = send(app(h.state.clone()), post_json("/api/orders", &body)).await;
    let (second, json) = send(app(h.state.clone()), post_json("/api/orders", &body)).await;

    assert_eq!(first, StatusCode::CREATED);
    assert_eq!(second, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"], "Internal Server Error");
    assert_eq!(h.stock("prod-3", "38"), Some(6));
}

#[tokio::test]
async fn admin_order_routes_check_the_token() {
    let h = harness(StockPolicy::Clamp);
    let body = order_json(
        "order-6",
        json!([{ "productId": "prod-1", "quantity": 1, "size": "37" }]),
    );
    send(app(h.state.clone()), post_json("/api/orders", &body)).await;

    let anonymous = Request::get("/api/orders").body(Body::empty()).unwrap();
    let (status, _) = send(app(h.state.clone()), anonymous).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let customer = Request::get("/api/orders")
        .header(header::AUTHORIZATION, bearer(&h.state.config, "user"))
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(app(h.state.clone()), customer).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let admin = Request::get("/api/orders?page=1&per_page=5&payment_status=pending")
        .header(header::AUTHORIZATION, bearer(&h.state.config, "admin"))
        .body(Body::empty())
        .unwrap();
    let (status, json) = send(app(h.state.clone()), admin).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["meta"]["total"], 1);
    assert_eq!(json["meta"]["per_page"], 5);
    assert_eq!(json["data"]["items"][0]["id"], "order-6");

    let one = Request::get("/api/orders/order-6")
        .header(header::AUTHORIZATION, bearer(&h.state.config, "admin"))
        .body(Body::empty())
        .unwrap();
    let (status, json) = send(app(h.state.clone()), one).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["items"][0]["size"], "37");
}

#[tokio::test]
async fn payment_preference_route() {
    let h = harness(StockPolicy::Clamp);
    let body = order_json(
        "order-7",
        json!([{ "productId": "prod-2", "quantity": 2, "size": "37" }]),
    );
    send(app(h.state.clone()), post_json("/api/orders", &body)).await;

    let (status, json) = send(
        app(h.state.clone()),
        post_json("/api/payments/preference", &json!({ "orderId": "order-7" })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["data"]["preferenceId"], "pref-order-7");
    assert!(
        json["data"]["redirectUrl"]
            .as_str()
            .unwrap()
            .starts_with("https://checkout.example/")
    );
}

#[tokio::test]
async fn health_and_fallback() {
    let h = harness(StockPolicy::Clamp);

    let (status, json) = send(
        app(h.state.clone()),
        Request::get("/health").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["status"], "ok");

    let (status, json) = send(
        app(h.state),
        Request::get("/api/nowhere").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["data"]["path"], "/api/nowhere");
}
