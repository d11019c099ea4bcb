//! Waste record entity.
//!
//! The tier fields (`hdfs_path`, `local_path`, `upload_status`) describe
//! where the attached file currently lives; at most one path is ever set.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "waste_records")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub latitude: f64,
    pub longitude: f64,
    pub description: Option<String>,
    pub name: Option<String>,
    pub custom_id: Option<String>,
    pub quantity: i32,
    pub status: String,
    pub hdfs_path: Option<String>,
    pub local_path: Option<String>,
    pub upload_status: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
