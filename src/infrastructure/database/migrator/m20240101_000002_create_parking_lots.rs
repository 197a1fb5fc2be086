//! Create parking_lots table
//!
//! `available_spots` is the capacity counter maintained by the ledger.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ParkingLots::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ParkingLots::LotId)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ParkingLots::LotName).string().not_null())
                    .col(ColumnDef::new(ParkingLots::Location).string().not_null())
                    .col(ColumnDef::new(ParkingLots::TotalSpots).integer().not_null())
                    .col(
                        ColumnDef::new(ParkingLots::AvailableSpots)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ParkingLots::HourlyRate)
                            .decimal_len(10, 2)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ParkingLots::Status)
                            .string_len(20)
                            .not_null()
                            .default("open"),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ParkingLots::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum ParkingLots {
    Table,
    LotId,
    LotName,
    Location,
    TotalSpots,
    AvailableSpots,
    HourlyRate,
    Status,
}
