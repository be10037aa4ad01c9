use sea_orm_migration::prelude::*;

use super::m20240115_000002_create_catalog_tables::Products;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20240301_000009_create_content_tables"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(BlogPosts::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(BlogPosts::Id).uuid().not_null().primary_key())
                    .col(
                        ColumnDef::new(BlogPosts::Slug)
                            .string_len(255)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(BlogPosts::Title).string_len(255).not_null())
                    .col(ColumnDef::new(BlogPosts::Excerpt).text().null())
                    .col(ColumnDef::new(BlogPosts::Body).text().not_null())
                    .col(ColumnDef::new(BlogPosts::BannerKey).string_len(1024).null())
                    .col(ColumnDef::new(BlogPosts::Topics).json().not_null())
                    .col(ColumnDef::new(BlogPosts::Sources).json().not_null())
                    .col(
                        ColumnDef::new(BlogPosts::Status)
                            .string_len(32)
                            .not_null()
                            .default("draft"),
                    )
                    .col(ColumnDef::new(BlogPosts::PublishedAt).timestamp().null())
                    .col(ColumnDef::new(BlogPosts::AuthorUserId).uuid().null())
                    .col(
                        ColumnDef::new(BlogPosts::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(BlogPosts::UpdatedAt).timestamp().null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ProductReviews::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ProductReviews::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ProductReviews::ProductId).uuid().not_null())
                    .col(
                        ColumnDef::new(ProductReviews::AuthorName)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ProductReviews::AuthorEmail)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(ColumnDef::new(ProductReviews::Rating).integer().not_null())
                    .col(ColumnDef::new(ProductReviews::Body).text().null())
                    .col(
                        ColumnDef::new(ProductReviews::Status)
                            .string_len(32)
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(ProductReviews::ModeratedBy).uuid().null())
                    .col(ColumnDef::new(ProductReviews::ModeratedAt).timestamp().null())
                    .col(
                        ColumnDef::new(ProductReviews::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(ProductReviews::UpdatedAt).timestamp().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_product_reviews_product")
                            .from(ProductReviews::Table, ProductReviews::ProductId)
                            .to(Products::Table, Products::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_product_reviews_product_status")
                    .table(ProductReviews::Table)
                    .col(ProductReviews::ProductId)
                    .col(ProductReviews::Status)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ProductReviews::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(BlogPosts::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum BlogPosts {
    Table,
    Id,
    Slug,
    Title,
    Excerpt,
    Body,
    BannerKey,
    Topics,
    Sources,
    Status,
    PublishedAt,
    AuthorUserId,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
pub enum ProductReviews {
    Table,
    Id,
    ProductId,
    AuthorName,
    AuthorEmail,
    Rating,
    Body,
    Status,
    ModeratedBy,
    ModeratedAt,
    CreatedAt,
    UpdatedAt,
}
