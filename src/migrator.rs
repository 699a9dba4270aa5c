use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_stock_transactions_table::Migration),
            Box::new(m20240101_000002_create_consumption_logs_table::Migration),
            Box::new(m20240101_000003_create_stock_requests_table::Migration),
            Box::new(m20240101_000004_create_adjustment_requests_table::Migration),
            Box::new(m20240101_000005_create_return_requests_table::Migration),
        ]
    }
}

// Migration implementations

mod m20240101_000001_create_stock_transactions_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000001_create_stock_transactions_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(StockTransactions::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(StockTransactions::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockTransactions::TransactionDate)
                                .date()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockTransactions::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockTransactions::BranchId)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(StockTransactions::Kind).string().not_null())
                        .col(
                            ColumnDef::new(StockTransactions::Category)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockTransactions::SubCategory)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockTransactions::ItemName)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockTransactions::Quantity)
                                .decimal()
                                .not_null(),
                        )
                        .col(ColumnDef::new(StockTransactions::Unit).string().not_null())
                        .col(ColumnDef::new(StockTransactions::UnitPrice).decimal().null())
                        .col(
                            ColumnDef::new(StockTransactions::TotalValue)
                                .decimal()
                                .null(),
                        )
                        .col(ColumnDef::new(StockTransactions::IssuedTo).string().null())
                        .col(
                            ColumnDef::new(StockTransactions::IssuedToId)
                                .string()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(StockTransactions::SourceIssueId)
                                .uuid()
                                .null(),
                        )
                        .col(ColumnDef::new(StockTransactions::Reason).string().null())
                        .col(
                            ColumnDef::new(StockTransactions::BillNumber)
                                .string()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(StockTransactions::BillAttachment)
                                .string()
                                .null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_stock_transactions_branch_date")
                        .table(StockTransactions::Table)
                        .col(StockTransactions::BranchId)
                        .col(StockTransactions::TransactionDate)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_stock_transactions_source_issue_id")
                        .table(StockTransactions::Table)
                        .col(StockTransactions::SourceIssueId)
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(StockTransactions::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum StockTransactions {
        Table,
        Id,
        TransactionDate,
        CreatedAt,
        BranchId,
        Kind,
        Category,
        SubCategory,
        ItemName,
        Quantity,
        Unit,
        UnitPrice,
        TotalValue,
        IssuedTo,
        IssuedToId,
        SourceIssueId,
        Reason,
        BillNumber,
        BillAttachment,
    }
}

mod m20240101_000002_create_consumption_logs_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000002_create_consumption_logs_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(ConsumptionLogs::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ConsumptionLogs::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ConsumptionLogs::IssueTransactionId)
                                .uuid()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ConsumptionLogs::BranchId).string().not_null())
                        .col(ColumnDef::new(ConsumptionLogs::ItemName).string().not_null())
                        .col(
                            ColumnDef::new(ConsumptionLogs::QuantityConsumed)
                                .decimal()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ConsumptionLogs::ConsumedOn).date().not_null())
                        .col(ColumnDef::new(ConsumptionLogs::Remarks).string().null())
                        .col(
                            ColumnDef::new(ConsumptionLogs::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_consumption_logs_issue_transaction_id")
                        .table(ConsumptionLogs::Table)
                        .col(ConsumptionLogs::IssueTransactionId)
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ConsumptionLogs::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum ConsumptionLogs {
        Table,
        Id,
        IssueTransactionId,
        BranchId,
        ItemName,
        QuantityConsumed,
        ConsumedOn,
        Remarks,
        CreatedAt,
    }
}

mod m20240101_000003_create_stock_requests_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000003_create_stock_requests_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(StockRequests::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(StockRequests::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(StockRequests::BranchId).string().not_null())
                        .col(ColumnDef::new(StockRequests::EmployeeId).string().not_null())
                        .col(
                            ColumnDef::new(StockRequests::EmployeeName)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(StockRequests::Category).string().not_null())
                        .col(ColumnDef::new(StockRequests::SubCategory).string().not_null())
                        .col(ColumnDef::new(StockRequests::ItemName).string().not_null())
                        .col(ColumnDef::new(StockRequests::Quantity).decimal().not_null())
                        .col(ColumnDef::new(StockRequests::Unit).string().not_null())
                        .col(
                            ColumnDef::new(StockRequests::Status)
                                .string()
                                .not_null()
                                .default("pending"),
                        )
                        .col(ColumnDef::new(StockRequests::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(StockRequests::UpdatedAt).timestamp().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_stock_requests_branch_id")
                        .table(StockRequests::Table)
                        .col(StockRequests::BranchId)
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(StockRequests::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum StockRequests {
        Table,
        Id,
        BranchId,
        EmployeeId,
        EmployeeName,
        Category,
        SubCategory,
        ItemName,
        Quantity,
        Unit,
        Status,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000004_create_adjustment_requests_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000004_create_adjustment_requests_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(AdjustmentRequests::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(AdjustmentRequests::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(AdjustmentRequests::BranchId)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(AdjustmentRequests::Category)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(AdjustmentRequests::SubCategory)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(AdjustmentRequests::ItemName)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(AdjustmentRequests::Quantity)
                                .decimal()
                                .not_null(),
                        )
                        .col(ColumnDef::new(AdjustmentRequests::Unit).string().not_null())
                        .col(ColumnDef::new(AdjustmentRequests::Reason).string().not_null())
                        .col(
                            ColumnDef::new(AdjustmentRequests::Status)
                                .string()
                                .not_null()
                                .default("pending"),
                        )
                        .col(
                            ColumnDef::new(AdjustmentRequests::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(AdjustmentRequests::ResolvedAt)
                                .timestamp()
                                .null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_adjustment_requests_branch_status")
                        .table(AdjustmentRequests::Table)
                        .col(AdjustmentRequests::BranchId)
                        .col(AdjustmentRequests::Status)
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(AdjustmentRequests::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum AdjustmentRequests {
        Table,
        Id,
        BranchId,
        Category,
        SubCategory,
        ItemName,
        Quantity,
        Unit,
        Reason,
        Status,
        CreatedAt,
        ResolvedAt,
    }
}

mod m20240101_000005_create_return_requests_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000005_create_return_requests_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(ReturnRequests::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ReturnRequests::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ReturnRequests::IssueTransactionId)
                                .uuid()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ReturnRequests::BranchId).string().not_null())
                        .col(ColumnDef::new(ReturnRequests::EmployeeId).string().not_null())
                        .col(ColumnDef::new(ReturnRequests::ItemName).string().not_null())
                        .col(
                            ColumnDef::new(ReturnRequests::RequestedQuantity)
                                .decimal()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(ReturnRequests::Status)
                                .string()
                                .not_null()
                                .default("pending"),
                        )
                        .col(
                            ColumnDef::new(ReturnRequests::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ReturnRequests::CompletedAt)
                                .timestamp()
                                .null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_return_requests_issue_transaction_id")
                        .table(ReturnRequests::Table)
                        .col(ReturnRequests::IssueTransactionId)
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ReturnRequests::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum ReturnRequests {
        Table,
        Id,
        IssueTransactionId,
        BranchId,
        EmployeeId,
        ItemName,
        RequestedQuantity,
        Status,
        CreatedAt,
        CompletedAt,
    }
}
