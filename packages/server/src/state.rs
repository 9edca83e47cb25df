use sea_orm::DatabaseConnection;

use crate::config::AppConfig;
use crate::files::ContentDelivery;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub content: ContentDelivery,
    pub config: AppConfig,
}
