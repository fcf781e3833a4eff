use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Prescriptions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Prescriptions::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Prescriptions::PatientId).integer().not_null())
                    .col(
                        ColumnDef::new(Prescriptions::MedicationId)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Prescriptions::PrescribedBy).integer())
                    .col(ColumnDef::new(Prescriptions::Dose).string().not_null())
                    .col(ColumnDef::new(Prescriptions::Frequency).string().not_null())
                    .col(
                        ColumnDef::new(Prescriptions::Status)
                            .string()
                            .default("active")
                            .not_null(),
                    )
                    .col(ColumnDef::new(Prescriptions::Notes).text())
                    .col(
                        ColumnDef::new(Prescriptions::CreatedAt)
                            .date_time()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Prescriptions::UpdatedAt)
                            .date_time()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-prescription-patient_id")
                            .from(Prescriptions::Table, Prescriptions::PatientId)
                            .to(Patients::Table, Patients::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-prescription-medication_id")
                            .from(Prescriptions::Table, Prescriptions::MedicationId)
                            .to(Medications::Table, Medications::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-prescription-prescribed_by")
                            .from(Prescriptions::Table, Prescriptions::PrescribedBy)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Administrations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Administrations::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Administrations::PrescriptionId)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Administrations::UserId).integer().not_null())
                    .col(
                        ColumnDef::new(Administrations::RecordedAt)
                            .date_time()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Administrations::Notes).text())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-administration-prescription_id")
                            .from(Administrations::Table, Administrations::PrescriptionId)
                            .to(Prescriptions::Table, Prescriptions::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-administration-user_id")
                            .from(Administrations::Table, Administrations::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Administrations::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Prescriptions::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Prescriptions {
    Table,
    Id,
    PatientId,
    MedicationId,
    PrescribedBy,
    Dose,
    Frequency,
    Status,
    Notes,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Administrations {
    Table,
    Id,
    PrescriptionId,
    UserId,
    RecordedAt,
    Notes,
}

#[derive(DeriveIden)]
enum Patients {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Medications {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}
