// src/web/handlers/github_handlers.rs
use crate::app_log;
use crate::web::types::*;

use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::State;

/// Shared by `/api/github` and `/analyze_github`. Failures keep the flat
/// `{"error": ...}` body; the status tells invalid input from upstream trouble.
pub async fn analyze_github_handler(
    request: Json<GithubRequest>,
    ctx: &State<AppContext>,
) -> (Status, Json<GithubResult>) {
    match ctx.github.analyze(&request.github_url).await {
        Ok(analysis) => (Status::Ok, Json(GithubResult::Analysis(analysis))),
        Err(err) => {
            app_log!(warn, "GitHub analysis failed for '{}': {}", request.github_url, err);
            let status = err.status();
            (status, Json(GithubResult::from(Err(err))))
        }
    }
}
