use axum::Json;
use serde_json::{json, Value};

#[utoipa::path(
    get,
    path = "/",
    tag = "converter",
    responses((status = 200, description = "Greeting"))
)]
pub async fn root() -> Json<Value> {
    Json(json!({ "Hello": "World" }))
}
