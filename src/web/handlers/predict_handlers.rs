// src/web/handlers/predict_handlers.rs
use crate::app_log;
use crate::error::MatchError;
use crate::features::{FeatureVector, RawRecord};
use crate::model::Prediction;
use crate::scoring::overall_fit_score;
use crate::template_processor::TemplateProcessor;
use crate::web::types::*;

use rocket::http::Status;
use rocket::response::content::RawHtml;
use rocket::serde::json::{Json, Value};
use rocket::State;
use std::collections::HashMap;

pub type ApiError = (Status, Json<ErrorResponse>);

fn api_error(err: MatchError) -> ApiError {
    app_log!(warn, "Request failed ({}): {}", err.code(), err);
    (err.status(), Json(ErrorResponse::from(&err)))
}

/// Encode and classify one raw record.
pub fn predict_record(ctx: &AppContext, record: &RawRecord) -> Result<Prediction, MatchError> {
    let model = ctx.model()?;
    let vector = FeatureVector::from_record(record)?;
    let prediction = model.predict(&vector)?;
    app_log!(
        info,
        "Predicted {} (p={:.4}) for {:?}",
        prediction.label,
        prediction.probability,
        vector.to_row()
    );
    Ok(prediction)
}

pub async fn predict_api_handler(
    record: Json<RawRecord>,
    ctx: &State<AppContext>,
) -> Result<Json<PredictResponse>, ApiError> {
    let prediction = predict_record(ctx, &record).map_err(api_error)?;
    Ok(Json(PredictResponse {
        prediction: prediction.label,
        probability: prediction.probability,
    }))
}

pub async fn predict_match_handler(
    record: Json<RawRecord>,
    ctx: &State<AppContext>,
) -> Result<Json<MatchPredictResponse>, ApiError> {
    let prediction = predict_record(ctx, &record).map_err(api_error)?;
    Ok(Json(MatchPredictResponse {
        prediction: prediction.label,
        match_probability: prediction.probability,
    }))
}

fn github_link(record: &RawRecord) -> Option<&str> {
    ["github_link", "github_url"]
        .iter()
        .filter_map(|key| record.get(*key).and_then(Value::as_str))
        .map(str::trim)
        .find(|link| !link.is_empty())
}

pub async fn match_project_handler(
    record: Json<RawRecord>,
    ctx: &State<AppContext>,
) -> Result<Json<MatchProjectResponse>, ApiError> {
    let prediction = predict_record(ctx, &record).map_err(api_error)?;

    let github = match github_link(&record) {
        Some(link) => Some(GithubResult::from(ctx.github.analyze(link).await)),
        None => None,
    };
    let complexity = github.as_ref().map(GithubResult::complexity_score).unwrap_or(0);

    Ok(Json(MatchProjectResponse {
        prediction: prediction.label,
        match_probability: prediction.probability,
        github,
        overall_fit_score: overall_fit_score(prediction.probability, complexity),
    }))
}

const FALLBACK_RESULT_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head><title>Skill DNA Result</title></head>
<body>
<h1>{{verdict}}</h1>
<p>Prediction: {{prediction}}</p>
<p>Match probability: {{probability_percent}}%</p>
</body>
</html>
"#;

pub async fn predict_skilldna_handler(
    form: HashMap<String, String>,
    ctx: &State<AppContext>,
) -> Result<RawHtml<String>, (Status, RawHtml<String>)> {
    let record: RawRecord = form
        .into_iter()
        .map(|(key, value)| (key, Value::String(value)))
        .collect();

    let prediction = predict_record(ctx, &record).map_err(|err| {
        app_log!(warn, "Skill DNA prediction failed: {}", err);
        (err.status(), RawHtml(err.message().to_string()))
    })?;

    let mut vars = HashMap::new();
    vars.insert("prediction".to_string(), prediction.label.to_string());
    vars.insert("probability".to_string(), format!("{:.4}", prediction.probability));
    vars.insert(
        "probability_percent".to_string(),
        format!("{:.1}", prediction.probability * 100.0),
    );
    vars.insert(
        "verdict".to_string(),
        if prediction.label == 1 {
            "Suitable: selected".to_string()
        } else {
            "Not suitable: not selected".to_string()
        },
    );

    let processor = TemplateProcessor::new(ctx.templates_dir.clone());
    let html = if processor.has_template("skilldna_result.html") {
        processor
            .render("skilldna_result.html", &vars)
            .await
            .map_err(|e| {
                app_log!(error, "Failed to render result page: {}", e);
                (
                    Status::InternalServerError,
                    RawHtml("Failed to render result page".to_string()),
                )
            })?
    } else {
        app_log!(warn, "skilldna_result.html not found, using built-in result page");
        TemplateProcessor::process_variables(FALLBACK_RESULT_PAGE, &vars)
    };

    Ok(RawHtml(html))
}
