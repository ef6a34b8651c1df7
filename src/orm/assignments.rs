//! SeaORM Entity for assignments table
//!
//! A row grants one feature flag to one person. The pair is unique; see
//! `db::create_schema`.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "assignments")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub person_id: i32,
    pub feature_flag_id: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::people::Entity",
        from = "Column::PersonId",
        to = "super::people::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Person,
    #[sea_orm(
        belongs_to = "super::feature_flags::Entity",
        from = "Column::FeatureFlagId",
        to = "super::feature_flags::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    FeatureFlag,
}

impl Related<super::people::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Person.def()
    }
}

impl Related<super::feature_flags::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FeatureFlag.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
