use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub fid: String,
    pub user_name: String,
    #[sea_orm(nullable)]
    pub description: Option<String>,
    pub follower_count: i64,
    pub following_count: i64,
    #[sea_orm(nullable)]
    pub pfp_url: Option<String>,
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub verified_addresses: Option<Json>,
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub channels_following: Option<Json>,
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub channels_member: Option<Json>,
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub embeddings: Option<Json>,
    #[sea_orm(column_type = "Text", nullable)]
    pub summary: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
