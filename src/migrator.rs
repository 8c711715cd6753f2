use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240301_000001_create_item_master_table::Migration),
            Box::new(m20240301_000002_create_stock_locations_table::Migration),
            Box::new(m20240301_000003_create_receipt_tables::Migration),
            Box::new(m20240301_000004_create_demand_tables::Migration),
            Box::new(m20240301_000005_create_stock_units_table::Migration),
            Box::new(m20240301_000006_create_stock_allocations_table::Migration),
            Box::new(m20240301_000007_create_stock_movements_table::Migration),
        ]
    }
}

mod m20240301_000001_create_item_master_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000001_create_item_master_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(ItemMaster::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ItemMaster::InventoryItemId)
                                .big_integer()
                                .primary_key()
                                .auto_increment()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ItemMaster::ItemNumber).string().not_null())
                        .col(ColumnDef::new(ItemMaster::Description).string().null())
                        .col(ColumnDef::new(ItemMaster::PrimaryUomCode).string().null())
                        .col(
                            ColumnDef::new(ItemMaster::UnitWeight)
                                .decimal_len(19, 4)
                                .null(),
                        )
                        .col(ColumnDef::new(ItemMaster::StatusCode).string().null())
                        .col(
                            ColumnDef::new(ItemMaster::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ItemMaster::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_item_master_item_number")
                        .table(ItemMaster::Table)
                        .col(ItemMaster::ItemNumber)
                        .unique()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ItemMaster::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum ItemMaster {
        Table,
        InventoryItemId,
        ItemNumber,
        Description,
        PrimaryUomCode,
        UnitWeight,
        StatusCode,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240301_000002_create_stock_locations_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000002_create_stock_locations_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(StockLocations::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(StockLocations::LocationId)
                                .integer()
                                .primary_key()
                                .auto_increment()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockLocations::WarehouseId)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockLocations::LocationCode)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockLocations::LocationName)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockLocations::LocationClass)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockLocations::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockLocations::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_stock_locations_warehouse_class")
                        .table(StockLocations::Table)
                        .col(StockLocations::WarehouseId)
                        .col(StockLocations::LocationClass)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(StockLocations::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum StockLocations {
        Table,
        LocationId,
        WarehouseId,
        LocationCode,
        LocationName,
        LocationClass,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240301_000003_create_receipt_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000003_create_receipt_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(ReceiptHeaders::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ReceiptHeaders::ReceiptHeaderId)
                                .big_integer()
                                .primary_key()
                                .auto_increment()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ReceiptHeaders::ReceiptNum)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ReceiptHeaders::WarehouseId)
                                .integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ReceiptHeaders::VendorId).big_integer().null())
                        .col(ColumnDef::new(ReceiptHeaders::Status).string().not_null())
                        .col(
                            ColumnDef::new(ReceiptHeaders::ReceivedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(ReceiptHeaders::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ReceiptHeaders::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(ReceiptLines::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ReceiptLines::ReceiptLineId)
                                .big_integer()
                                .primary_key()
                                .auto_increment()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ReceiptLines::ReceiptHeaderId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ReceiptLines::ItemCode).string().not_null())
                        .col(
                            ColumnDef::new(ReceiptLines::InventoryItemId)
                                .big_integer()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(ReceiptLines::ExpectedQuantity)
                                .decimal_len(19, 4)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(ReceiptLines::ReceivedQuantity)
                                .decimal_len(19, 4)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(ReceiptLines::QuantityPutAway)
                                .decimal_len(19, 4)
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(ReceiptLines::BatchNumber).string().null())
                        .col(ColumnDef::new(ReceiptLines::ExpiryDate).date().null())
                        .col(ColumnDef::new(ReceiptLines::ManufactureDate).date().null())
                        .col(ColumnDef::new(ReceiptLines::PalletId).string().null())
                        .col(
                            ColumnDef::new(ReceiptLines::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ReceiptLines::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_receipt_lines_header_id")
                        .table(ReceiptLines::Table)
                        .col(ReceiptLines::ReceiptHeaderId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ReceiptLines::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(ReceiptHeaders::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum ReceiptHeaders {
        Table,
        ReceiptHeaderId,
        ReceiptNum,
        WarehouseId,
        VendorId,
        Status,
        ReceivedAt,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum ReceiptLines {
        Table,
        ReceiptLineId,
        ReceiptHeaderId,
        ItemCode,
        InventoryItemId,
        ExpectedQuantity,
        ReceivedQuantity,
        QuantityPutAway,
        BatchNumber,
        ExpiryDate,
        ManufactureDate,
        PalletId,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240301_000004_create_demand_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000004_create_demand_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(DemandHeaders::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(DemandHeaders::DemandHeaderId)
                                .big_integer()
                                .primary_key()
                                .auto_increment()
                                .not_null(),
                        )
                        .col(ColumnDef::new(DemandHeaders::OrderNum).string().not_null())
                        .col(
                            ColumnDef::new(DemandHeaders::WarehouseId)
                                .integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(DemandHeaders::Status).string().not_null())
                        .col(
                            ColumnDef::new(DemandHeaders::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(DemandHeaders::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(DemandLines::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(DemandLines::DemandLineId)
                                .big_integer()
                                .primary_key()
                                .auto_increment()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(DemandLines::DemandHeaderId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(DemandLines::InventoryItemId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(DemandLines::OrderedQuantity)
                                .decimal_len(19, 4)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(DemandLines::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(DemandLines::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_demand_lines_header_id")
                        .table(DemandLines::Table)
                        .col(DemandLines::DemandHeaderId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(DemandLines::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(DemandHeaders::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum DemandHeaders {
        Table,
        DemandHeaderId,
        OrderNum,
        WarehouseId,
        Status,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum DemandLines {
        Table,
        DemandLineId,
        DemandHeaderId,
        InventoryItemId,
        OrderedQuantity,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240301_000005_create_stock_units_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000005_create_stock_units_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(StockUnits::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(StockUnits::StockUnitId)
                                .big_integer()
                                .primary_key()
                                .auto_increment()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockUnits::InventoryItemId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(StockUnits::WarehouseId).integer().not_null())
                        .col(ColumnDef::new(StockUnits::LocationId).integer().not_null())
                        .col(ColumnDef::new(StockUnits::PalletId).string().null())
                        .col(ColumnDef::new(StockUnits::BatchNumber).string().null())
                        .col(ColumnDef::new(StockUnits::ManufactureDate).date().null())
                        .col(ColumnDef::new(StockUnits::ExpiryDate).date().null())
                        .col(
                            ColumnDef::new(StockUnits::QuantityOnHand)
                                .decimal_len(19, 4)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(StockUnits::QuantityAllocated)
                                .decimal_len(19, 4)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(StockUnits::QuantityAvailable)
                                .decimal_len(19, 4)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(StockUnits::QuantityShipped)
                                .decimal_len(19, 4)
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(StockUnits::Status).string().not_null())
                        .col(ColumnDef::new(StockUnits::Disposition).string().null())
                        .col(
                            ColumnDef::new(StockUnits::ReceiptLineId)
                                .big_integer()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(StockUnits::UnitWeight)
                                .decimal_len(19, 4)
                                .null(),
                        )
                        .col(
                            ColumnDef::new(StockUnits::Version)
                                .integer()
                                .not_null()
                                .default(1),
                        )
                        .col(
                            ColumnDef::new(StockUnits::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockUnits::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_stock_units_item_id")
                        .table(StockUnits::Table)
                        .col(StockUnits::InventoryItemId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_stock_units_item_location")
                        .table(StockUnits::Table)
                        .col(StockUnits::InventoryItemId)
                        .col(StockUnits::LocationId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_stock_units_receipt_line")
                        .table(StockUnits::Table)
                        .col(StockUnits::ReceiptLineId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(StockUnits::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum StockUnits {
        Table,
        StockUnitId,
        InventoryItemId,
        WarehouseId,
        LocationId,
        PalletId,
        BatchNumber,
        ManufactureDate,
        ExpiryDate,
        QuantityOnHand,
        QuantityAllocated,
        QuantityAvailable,
        QuantityShipped,
        Status,
        Disposition,
        ReceiptLineId,
        UnitWeight,
        Version,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240301_000006_create_stock_allocations_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000006_create_stock_allocations_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(StockAllocations::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(StockAllocations::AllocationId)
                                .big_integer()
                                .primary_key()
                                .auto_increment()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockAllocations::DemandLineId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockAllocations::StockUnitId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockAllocations::InventoryItemId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockAllocations::LocationId)
                                .integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(StockAllocations::PalletId).string().null())
                        .col(
                            ColumnDef::new(StockAllocations::BatchNumber)
                                .string()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(StockAllocations::QuantityAllocated)
                                .decimal_len(19, 4)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(StockAllocations::QuantityPicked)
                                .decimal_len(19, 4)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(StockAllocations::QuantityShipped)
                                .decimal_len(19, 4)
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(StockAllocations::Status).string().not_null())
                        .col(
                            ColumnDef::new(StockAllocations::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockAllocations::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_stock_allocations_demand_line")
                        .table(StockAllocations::Table)
                        .col(StockAllocations::DemandLineId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_stock_allocations_stock_unit")
                        .table(StockAllocations::Table)
                        .col(StockAllocations::StockUnitId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(StockAllocations::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum StockAllocations {
        Table,
        AllocationId,
        DemandLineId,
        StockUnitId,
        InventoryItemId,
        LocationId,
        PalletId,
        BatchNumber,
        QuantityAllocated,
        QuantityPicked,
        QuantityShipped,
        Status,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240301_000007_create_stock_movements_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000007_create_stock_movements_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(StockMovements::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(StockMovements::MovementId)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockMovements::InventoryItemId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockMovements::StockUnitId)
                                .big_integer()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(StockMovements::FromLocationId)
                                .integer()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(StockMovements::ToLocationId)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockMovements::QuantityMoved)
                                .decimal_len(19, 4)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockMovements::MovementType)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockMovements::ReferenceType)
                                .string()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(StockMovements::ReferenceId)
                                .big_integer()
                                .null(),
                        )
                        .col(ColumnDef::new(StockMovements::MovedBy).string().null())
                        .col(
                            ColumnDef::new(StockMovements::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_stock_movements_item_id")
                        .table(StockMovements::Table)
                        .col(StockMovements::InventoryItemId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_stock_movements_to_location")
                        .table(StockMovements::Table)
                        .col(StockMovements::ToLocationId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(StockMovements::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum StockMovements {
        Table,
        MovementId,
        InventoryItemId,
        StockUnitId,
        FromLocationId,
        ToLocationId,
        QuantityMoved,
        MovementType,
        ReferenceType,
        ReferenceId,
        MovedBy,
        CreatedAt,
    }
}
