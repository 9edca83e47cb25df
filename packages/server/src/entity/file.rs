use common::AccessLevel;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "files")]
pub struct Model {
    /// Public handle of the file. Case-sensitive, stored exactly as given.
    #[sea_orm(primary_key, auto_increment = false)]
    pub name: String,

    /// Where the content and its `.gz` mirror live. Never updated.
    #[sea_orm(unique)]
    pub locator: String,

    /// Caller identity that uploaded the file.
    pub owner: String,

    pub access_level: AccessLevel,

    /// Sniffed content type. NULL for rows that predate sniffing.
    pub mime: Option<String>,
}

impl ActiveModelBehavior for ActiveModel {}
