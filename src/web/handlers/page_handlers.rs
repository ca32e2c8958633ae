// src/web/handlers/page_handlers.rs
use crate::app_log;
use crate::template_processor::TemplateProcessor;
use crate::web::types::AppContext;

use rocket::fs::NamedFile;
use rocket::State;

/// Static page from the templates directory; `None` becomes a 404.
pub async fn page_handler(name: &str, ctx: &State<AppContext>) -> Option<NamedFile> {
    let path = TemplateProcessor::new(ctx.templates_dir.clone()).page_path(name);
    match NamedFile::open(&path).await {
        Ok(file) => Some(file),
        Err(e) => {
            app_log!(warn, "Page {} unavailable: {}", path.display(), e);
            None
        }
    }
}
