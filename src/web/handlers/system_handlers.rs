// src/web/handlers/system_handlers.rs
use crate::app_log;
use crate::model::ModelMetadata;
use crate::web::types::*;

use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::State;

pub async fn api_test_handler() -> Json<MessageResponse> {
    app_log!(info, "API test ping");
    Json(MessageResponse {
        message: "API is working".to_string(),
    })
}

pub async fn model_info_handler(
    ctx: &State<AppContext>,
) -> Result<Json<ModelMetadata>, (Status, Json<ErrorResponse>)> {
    match ctx.model() {
        Ok(model) => Ok(Json(model.metadata().clone())),
        Err(err) => Err((err.status(), Json(ErrorResponse::from(&err)))),
    }
}
