use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::config::AppConfig;
use crate::handlers;
use crate::state::AppState;

pub fn routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::files::list_files,
            handlers::files::upload_file
        ))
        .routes(routes!(
            handlers::files::get_file,
            handlers::files::rename_file,
            handlers::files::delete_file
        ))
        .layer(handlers::files::upload_body_limit(
            config.storage.max_upload_size,
        ))
}
