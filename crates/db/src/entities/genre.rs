//! Genre entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "genre")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    pub name: String,

    #[sea_orm(unique)]
    pub slug: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::genre_title::Entity")]
    GenreTitles,
}

impl Related<super::genre_title::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::GenreTitles.def()
    }
}

impl Related<super::title::Entity> for Entity {
    fn to() -> RelationDef {
        super::genre_title::Relation::Title.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::genre_title::Relation::Genre.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
