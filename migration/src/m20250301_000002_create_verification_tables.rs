use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Verification Submissions Table
        manager
            .create_table(
                Table::create()
                    .table(VerificationSubmissions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(VerificationSubmissions::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(VerificationSubmissions::ProfileId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(VerificationSubmissions::Status)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(VerificationSubmissions::RejectionReason).text())
                    .col(
                        ColumnDef::new(VerificationSubmissions::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(VerificationSubmissions::ReviewedAt).timestamp())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_verification_submissions_profile")
                            .from(
                                VerificationSubmissions::Table,
                                VerificationSubmissions::ProfileId,
                            )
                            .to(InstructorProfiles::Table, InstructorProfiles::Id)
                            .on_update(ForeignKeyAction::Cascade)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_verification_submissions_profile")
                    .table(VerificationSubmissions::Table)
                    .col(VerificationSubmissions::ProfileId)
                    .to_owned(),
            )
            .await?;

        // At most one pending submission per profile, enforced by the
        // database itself so concurrent creations serialize correctly.
        // Partial indexes are not expressible through the schema builder,
        // hence raw SQL (valid on both Postgres and SQLite).
        manager
            .get_connection()
            .execute_unprepared(
                "CREATE UNIQUE INDEX ux_verification_submissions_one_pending \
                 ON verification_submissions (profile_id) WHERE status = 'pending'",
            )
            .await?;

        // Verification Documents Table
        manager
            .create_table(
                Table::create()
                    .table(VerificationDocuments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(VerificationDocuments::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(VerificationDocuments::SubmissionId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(VerificationDocuments::FileRef)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(VerificationDocuments::FileName)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(VerificationDocuments::UploadedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_verification_documents_submission")
                            .from(
                                VerificationDocuments::Table,
                                VerificationDocuments::SubmissionId,
                            )
                            .to(
                                VerificationSubmissions::Table,
                                VerificationSubmissions::Id,
                            )
                            .on_update(ForeignKeyAction::Cascade)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Verification Audit Logs Table
        manager
            .create_table(
                Table::create()
                    .table(VerificationAuditLogs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(VerificationAuditLogs::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(VerificationAuditLogs::SubmissionId)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(VerificationAuditLogs::AdminId).integer())
                    .col(
                        ColumnDef::new(VerificationAuditLogs::Action)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(VerificationAuditLogs::Reason).text())
                    .col(
                        ColumnDef::new(VerificationAuditLogs::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_verification_audit_logs_submission")
                            .from(
                                VerificationAuditLogs::Table,
                                VerificationAuditLogs::SubmissionId,
                            )
                            .to(
                                VerificationSubmissions::Table,
                                VerificationSubmissions::Id,
                            )
                            .on_update(ForeignKeyAction::Cascade)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_verification_audit_logs_admin")
                            .from(
                                VerificationAuditLogs::Table,
                                VerificationAuditLogs::AdminId,
                            )
                            .to(Users::Table, Users::Id)
                            .on_update(ForeignKeyAction::Cascade)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(VerificationAuditLogs::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(VerificationDocuments::Table).to_owned())
            .await?;
        manager
            .drop_table(
                Table::drop()
                    .table(VerificationSubmissions::Table)
                    .to_owned(),
            )
            .await?;
        Ok(())
    }
}

#[derive(Iden)]
enum Users {
    Table,
    Id,
}

#[derive(Iden)]
enum InstructorProfiles {
    Table,
    Id,
}

#[derive(Iden)]
enum VerificationSubmissions {
    Table,
    Id,
    ProfileId,
    Status,
    RejectionReason,
    CreatedAt,
    ReviewedAt,
}

#[derive(Iden)]
enum VerificationDocuments {
    Table,
    Id,
    SubmissionId,
    FileRef,
    FileName,
    UploadedAt,
}

#[derive(Iden)]
enum VerificationAuditLogs {
    Table,
    Id,
    SubmissionId,
    AdminId,
    Action,
    Reason,
    CreatedAt,
}
