// src/web/mod.rs

pub mod handlers;
pub mod types;

pub use handlers::*;
pub use types::*;

use crate::app_log;
use crate::core::ConfigManager;
use crate::github::GithubScorer;
use crate::model::{ModelMetadata, SelectionModel};
use anyhow::Result;
use rocket::fairing::{Fairing, Info, Kind};
use rocket::form::Form;
use rocket::fs::NamedFile;
use rocket::http::{Header, Status};
use rocket::response::content::RawHtml;
use rocket::serde::json::Json;
use rocket::{catchers, get, options, post, routes, Build, Request, Response, Rocket, State};
use std::collections::HashMap;

// CORS Fairing
pub struct Cors;

#[rocket::async_trait]
impl Fairing for Cors {
    fn info(&self) -> Info {
        Info {
            name: "Add CORS headers to responses",
            kind: Kind::Response,
        }
    }

    async fn on_response<'r>(&self, _request: &'r Request<'_>, response: &mut Response<'r>) {
        response.set_header(Header::new("Access-Control-Allow-Origin", "*"));
        response.set_header(Header::new(
            "Access-Control-Allow-Methods",
            "POST, GET, OPTIONS",
        ));
        response.set_header(Header::new("Access-Control-Allow-Headers", "*"));
    }
}

// Pages

#[get("/")]
pub async fn home(ctx: &State<AppContext>) -> Option<NamedFile> {
    handlers::page_handler("index.html", ctx).await
}

#[get("/index")]
pub async fn index_page(ctx: &State<AppContext>) -> Option<NamedFile> {
    handlers::page_handler("index.html", ctx).await
}

#[get("/auth")]
pub async fn auth_page(ctx: &State<AppContext>) -> Option<NamedFile> {
    handlers::page_handler("auth.html", ctx).await
}

#[get("/company")]
pub async fn company_dashboard(ctx: &State<AppContext>) -> Option<NamedFile> {
    handlers::page_handler("company_dashboard.html", ctx).await
}

#[get("/jobseeker")]
pub async fn jobseeker_dashboard(ctx: &State<AppContext>) -> Option<NamedFile> {
    handlers::page_handler("jobseeker_dashboard.html", ctx).await
}

#[get("/profile")]
pub async fn profile_edit(ctx: &State<AppContext>) -> Option<NamedFile> {
    handlers::page_handler("profile_edit.html", ctx).await
}

#[get("/skilldna")]
pub async fn skilldna(ctx: &State<AppContext>) -> Option<NamedFile> {
    handlers::page_handler("skilldna_match.html", ctx).await
}

// API

#[get("/api/test")]
pub async fn api_test() -> Json<MessageResponse> {
    handlers::api_test_handler().await
}

#[get("/api/model")]
pub async fn model_info(
    ctx: &State<AppContext>,
) -> Result<Json<ModelMetadata>, (Status, Json<ErrorResponse>)> {
    handlers::model_info_handler(ctx).await
}

#[post("/api/predict", data = "<record>")]
pub async fn predict_api(
    record: Json<crate::features::RawRecord>,
    ctx: &State<AppContext>,
) -> Result<Json<PredictResponse>, ApiError> {
    handlers::predict_api_handler(record, ctx).await
}

#[post("/predict", data = "<record>")]
pub async fn predict_match(
    record: Json<crate::features::RawRecord>,
    ctx: &State<AppContext>,
) -> Result<Json<MatchPredictResponse>, ApiError> {
    handlers::predict_match_handler(record, ctx).await
}

#[post("/api/github", data = "<request>")]
pub async fn github_api(
    request: Json<GithubRequest>,
    ctx: &State<AppContext>,
) -> (Status, Json<GithubResult>) {
    handlers::analyze_github_handler(request, ctx).await
}

#[post("/analyze_github", data = "<request>")]
pub async fn analyze_github(
    request: Json<GithubRequest>,
    ctx: &State<AppContext>,
) -> (Status, Json<GithubResult>) {
    handlers::analyze_github_handler(request, ctx).await
}

#[post("/match_project", data = "<record>")]
pub async fn match_project(
    record: Json<crate::features::RawRecord>,
    ctx: &State<AppContext>,
) -> Result<Json<MatchProjectResponse>, ApiError> {
    handlers::match_project_handler(record, ctx).await
}

#[post("/predict_skilldna", data = "<form>")]
pub async fn predict_skilldna(
    form: Form<HashMap<String, String>>,
    ctx: &State<AppContext>,
) -> Result<RawHtml<String>, (Status, RawHtml<String>)> {
    handlers::predict_skilldna_handler(form.into_inner(), ctx).await
}

#[options("/<_..>")]
pub async fn options() -> Status {
    Status::Ok
}

// Error catchers

fn catcher_body(error: &str, error_code: &str) -> Json<ErrorResponse> {
    Json(ErrorResponse {
        error: error.to_string(),
        error_code: error_code.to_string(),
    })
}

#[rocket::catch(400)]
pub fn bad_request() -> Json<ErrorResponse> {
    catcher_body("Invalid request format", "BAD_REQUEST")
}

#[rocket::catch(404)]
pub fn not_found() -> Json<ErrorResponse> {
    catcher_body("Not found", "NOT_FOUND")
}

#[rocket::catch(422)]
pub fn unprocessable() -> Json<ErrorResponse> {
    catcher_body("Request body is not a valid JSON object", "INVALID_INPUT")
}

#[rocket::catch(500)]
pub fn internal_error() -> Json<ErrorResponse> {
    catcher_body("Internal server error", "INTERNAL_ERROR")
}

/// Assemble the rocket instance around an already-built context.
pub fn build_rocket(ctx: AppContext) -> Rocket<Build> {
    rocket::build()
        .attach(Cors)
        .manage(ctx)
        .register(
            "/",
            catchers![bad_request, not_found, unprocessable, internal_error],
        )
        .mount(
            "/",
            routes![
                home,
                index_page,
                auth_page,
                company_dashboard,
                jobseeker_dashboard,
                profile_edit,
                skilldna,
                api_test,
                model_info,
                predict_api,
                predict_match,
                github_api,
                analyze_github,
                match_project,
                predict_skilldna,
                options,
            ],
        )
}

/// Build the application context from configuration. A missing or invalid
/// model is fatal unless `require_model` is off.
pub fn build_context(config: &ConfigManager) -> Result<AppContext> {
    let model_path = &config.environment.model_path;
    let model = match SelectionModel::load(model_path) {
        Ok(model) => Some(model),
        Err(e) if config.environment.require_model => {
            app_log!(error, "Failed to load model: {:#}", e);
            return Err(e);
        }
        Err(e) => {
            app_log!(warn, "Model unavailable, predictions disabled: {:#}", e);
            None
        }
    };

    let github = GithubScorer::new(
        &config.service.github_api_url,
        config.service.timeout_seconds,
    )?;

    Ok(AppContext {
        model,
        github,
        templates_dir: config.environment.templates_path.clone(),
    })
}

// Main server start function
pub async fn start_web_server(config: ConfigManager) -> Result<()> {
    let ctx = build_context(&config)?;

    app_log!(info, "Starting SkillLens matching server");
    app_log!(info, "Templates: {}", config.environment.templates_path.display());
    app_log!(info, "GitHub API: {}", config.service.github_api_url);

    let _rocket = build_rocket(ctx)
        .launch()
        .await
        .map_err(|e| anyhow::anyhow!("Server failed: {}", e))?;

    Ok(())
}
