use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Scheduled clinical reminder. The recurrence detail columns are mutually
/// exclusive; the validator in `scheduling` is the only writer and clears
/// whatever does not belong to the stored `recurrence` kind.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Deserialize, Serialize)]
#[sea_orm(table_name = "alerts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub patient_id: i32,
    pub prescription_id: Option<i32>,
    pub kind: String,
    #[sea_orm(column_type = "Text")]
    pub message: String,
    pub recurrence: String,
    pub starts_at: DateTime,
    pub ends_at: Option<DateTime>,
    pub daily_time: Option<Time>,
    pub weekly_day: Option<i16>,
    pub weekly_time: Option<Time>,
    pub times_of_day: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::patient::Entity",
        from = "Column::PatientId",
        to = "super::patient::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Patient,
    #[sea_orm(
        belongs_to = "super::prescription::Entity",
        from = "Column::PrescriptionId",
        to = "super::prescription::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Prescription,
}

impl Related<super::patient::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Patient.def()
    }
}

impl Related<super::prescription::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Prescription.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
