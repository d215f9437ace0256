use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Deserialize, Serialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    #[serde(skip_serializing)]
    pub id: i32,
    #[sea_orm(unique, index)]
    pub uuid: String,
    pub username: String,
    #[sea_orm(unique)]
    pub email: String,
    pub role: super::enums::Role,
    #[serde(skip_deserializing)]
    pub created_at: DateTime,
    #[serde(skip_deserializing)]
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_one = "super::instructor_profile::Entity")]
    InstructorProfile,
}

impl Related<super::instructor_profile::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::InstructorProfile.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
