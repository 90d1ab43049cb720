use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One row per fid; `casts` holds a `{ "data": [...] }` document.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "casts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub fid: String,
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub casts: Option<Json>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
