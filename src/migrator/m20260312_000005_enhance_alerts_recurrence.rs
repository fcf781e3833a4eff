use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Supersedes the one-shot alert shape with the full recurrence model.
        // Existing rows become recurrence=none, which preserves their
        // fire-once-at-starts_at behavior.
        manager
            .alter_table(
                Table::alter()
                    .table(Alerts::Table)
                    .add_column(
                        ColumnDef::new(Alerts::Recurrence)
                            .string()
                            .default("none")
                            .not_null(),
                    )
                    .add_column(ColumnDef::new(Alerts::EndsAt).date_time())
                    .add_column(ColumnDef::new(Alerts::DailyTime).time())
                    .add_column(ColumnDef::new(Alerts::WeeklyDay).small_integer())
                    .add_column(ColumnDef::new(Alerts::WeeklyTime).time())
                    .add_column(ColumnDef::new(Alerts::TimesOfDay).string())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_alerts_is_active")
                    .table(Alerts::Table)
                    .col(Alerts::IsActive)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_alerts_is_active")
                    .table(Alerts::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .alter_table(
                Table::alter()
                    .table(Alerts::Table)
                    .drop_column(Alerts::Recurrence)
                    .drop_column(Alerts::EndsAt)
                    .drop_column(Alerts::DailyTime)
                    .drop_column(Alerts::WeeklyDay)
                    .drop_column(Alerts::WeeklyTime)
                    .drop_column(Alerts::TimesOfDay)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Alerts {
    Table,
    Recurrence,
    EndsAt,
    DailyTime,
    WeeklyDay,
    WeeklyTime,
    TimesOfDay,
    IsActive,
}
