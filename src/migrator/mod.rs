use sea_orm_migration::prelude::*;

mod m20260210_000001_create_table;
mod m20260215_000002_create_medications_table;
mod m20260215_000003_create_prescriptions_table;
mod m20260301_000004_create_alerts_table;
mod m20260312_000005_enhance_alerts_recurrence;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260210_000001_create_table::Migration),
            Box::new(m20260215_000002_create_medications_table::Migration),
            Box::new(m20260215_000003_create_prescriptions_table::Migration),
            Box::new(m20260301_000004_create_alerts_table::Migration),
            Box::new(m20260312_000005_enhance_alerts_recurrence::Migration),
        ]
    }
}
