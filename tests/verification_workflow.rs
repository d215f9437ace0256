mod common;

use common::*;
use coursehub_backend::modules::verification::entities::audit_log::{self, AuditAction};
use coursehub_backend::modules::verification::entities::{document, submission};
use coursehub_backend::modules::verification::entities::submission::SubmissionStatus;
use coursehub_backend::modules::verification::error::VerificationError;
use coursehub_backend::modules::verification::service::VerificationStatus;
use coursehub_backend::shared::error::AppError;
use sea_orm::{ActiveModelTrait, EntityTrait, PaginatorTrait, Set};
use std::sync::Arc;

#[tokio::test]
async fn full_workflow_from_signup_to_verified() {
    let env = setup().await;
    let (instructor, profile) = seed_instructor(&env.db, "jane@example.com").await;
    let admin = seed_admin(&env.db).await;

    // No submissions yet.
    let status = env.service.current_status(&profile).await.unwrap();
    assert_eq!(status, VerificationStatus::NoSubmission);

    // First attempt with two valid files.
    let first = env
        .service
        .create_submission(&instructor, &profile, vec![doc("id.pdf"), doc("diploma.png")])
        .await
        .unwrap();
    assert_eq!(first.status, SubmissionStatus::Pending);

    let status = env.service.current_status(&profile).await.unwrap();
    assert!(matches!(status, VerificationStatus::Pending(ref s) if s.id == first.id));

    // Admin rejects with a reason.
    let rejected = env
        .service
        .reject(first.id, &admin, "blurry ID")
        .await
        .unwrap();
    assert_eq!(rejected.status, SubmissionStatus::Rejected);
    assert_eq!(rejected.rejection_reason.as_deref(), Some("blurry ID"));
    assert!(rejected.reviewed_at.is_some());

    let status = env.service.current_status(&profile).await.unwrap();
    assert!(matches!(status, VerificationStatus::Rejected(_)));

    let trail = env.service.audit_trail(first.id).await.unwrap();
    assert_eq!(trail.len(), 1);
    assert_eq!(trail[0].0.action, AuditAction::Rejected);
    assert_eq!(trail[0].0.reason.as_deref(), Some("blurry ID"));

    // Rejection unblocks resubmission immediately.
    let profile = reload_profile(&env.db, profile.id).await;
    let second = env
        .service
        .create_submission(&instructor, &profile, vec![doc("id_retake.jpg")])
        .await
        .unwrap();
    assert_ne!(second.id, first.id);

    let status = env.service.current_status(&profile).await.unwrap();
    assert!(matches!(status, VerificationStatus::Pending(ref s) if s.id == second.id));

    // Admin approves the retake.
    let approved = env.service.approve(second.id, &admin).await.unwrap();
    assert_eq!(approved.status, SubmissionStatus::Approved);
    assert_eq!(approved.rejection_reason, None);

    let profile = reload_profile(&env.db, profile.id).await;
    assert!(profile.is_verified);
    let status = env.service.current_status(&profile).await.unwrap();
    assert_eq!(status, VerificationStatus::Verified);

    // Two audit entries across the history, one per decision.
    let total = audit_log::Entity::find().count(&env.db).await.unwrap();
    assert_eq!(total, 2);

    // Both submissions survive as history.
    let kept = submission::Entity::find().count(&env.db).await.unwrap();
    assert_eq!(kept, 2);
}

#[tokio::test]
async fn second_pending_submission_is_refused() {
    let env = setup().await;
    let (instructor, profile) = seed_instructor(&env.db, "jane@example.com").await;

    env.service
        .create_submission(&instructor, &profile, vec![doc("id.pdf")])
        .await
        .unwrap();

    let err = env
        .service
        .create_submission(&instructor, &profile, vec![doc("other.pdf")])
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AppError::Verification(VerificationError::DuplicatePending)
    ));

    let count = submission::Entity::find().count(&env.db).await.unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn storage_layer_enforces_single_pending() {
    let env = setup().await;
    let (instructor, profile) = seed_instructor(&env.db, "jane@example.com").await;

    env.service
        .create_submission(&instructor, &profile, vec![doc("id.pdf")])
        .await
        .unwrap();

    // Bypass the service: the partial unique index must still refuse a
    // second pending row for the same profile.
    let direct = submission::ActiveModel {
        profile_id: Set(profile.id),
        status: Set(SubmissionStatus::Pending),
        rejection_reason: Set(None),
        created_at: Set(chrono::Utc::now().naive_utc()),
        reviewed_at: Set(None),
        ..Default::default()
    }
    .insert(&env.db)
    .await;

    assert!(direct.is_err());
}

#[tokio::test]
async fn deciding_twice_fails_with_invalid_state() {
    let env = setup().await;
    let (instructor, profile) = seed_instructor(&env.db, "jane@example.com").await;
    let admin = seed_admin(&env.db).await;

    let created = env
        .service
        .create_submission(&instructor, &profile, vec![doc("id.pdf")])
        .await
        .unwrap();

    env.service.approve(created.id, &admin).await.unwrap();

    let err = env.service.approve(created.id, &admin).await.unwrap_err();
    assert!(matches!(
        err,
        AppError::Verification(VerificationError::InvalidState)
    ));

    let err = env
        .service
        .reject(created.id, &admin, "too late")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AppError::Verification(VerificationError::InvalidState)
    ));

    // Exactly one audit entry for the one decision that went through.
    let trail = env.service.audit_trail(created.id).await.unwrap();
    assert_eq!(trail.len(), 1);
    assert_eq!(trail[0].0.action, AuditAction::Approved);
}

#[tokio::test]
async fn rejection_requires_a_reason() {
    let env = setup().await;
    let (instructor, profile) = seed_instructor(&env.db, "jane@example.com").await;
    let admin = seed_admin(&env.db).await;

    let created = env
        .service
        .create_submission(&instructor, &profile, vec![doc("id.pdf")])
        .await
        .unwrap();

    for reason in ["", "   "] {
        let err = env
            .service
            .reject(created.id, &admin, reason)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::Verification(VerificationError::MissingReason)
        ));
    }

    // Still pending, still undecided.
    let found = submission::Entity::find_by_id(created.id)
        .one(&env.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.status, SubmissionStatus::Pending);
    let trail = env.service.audit_trail(created.id).await.unwrap();
    assert!(trail.is_empty());
}

#[tokio::test]
async fn one_bad_file_persists_nothing() {
    let env = setup().await;
    let (instructor, profile) = seed_instructor(&env.db, "jane@example.com").await;

    let err = env
        .service
        .create_submission(
            &instructor,
            &profile,
            vec![doc("id.pdf"), doc("malware.exe")],
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AppError::Verification(VerificationError::InvalidDocument(_))
    ));

    assert_eq!(submission::Entity::find().count(&env.db).await.unwrap(), 0);
    assert_eq!(document::Entity::find().count(&env.db).await.unwrap(), 0);
    assert_eq!(env.blobs.len(), 0);

    // Empty batches are refused outright.
    let err = env
        .service
        .create_submission(&instructor, &profile, vec![])
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AppError::Verification(VerificationError::NoDocuments)
    ));
}

#[tokio::test]
async fn verified_instructor_cannot_resubmit() {
    let env = setup().await;
    let (instructor, profile) = seed_instructor(&env.db, "jane@example.com").await;
    let admin = seed_admin(&env.db).await;

    let created = env
        .service
        .create_submission(&instructor, &profile, vec![doc("id.pdf")])
        .await
        .unwrap();
    env.service.approve(created.id, &admin).await.unwrap();

    let profile = reload_profile(&env.db, profile.id).await;
    let err = env
        .service
        .create_submission(&instructor, &profile, vec![doc("again.pdf")])
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AppError::Verification(VerificationError::AlreadyVerified)
    ));
}

#[tokio::test]
async fn decisions_touch_only_the_verified_flag() {
    let env = setup().await;
    let (instructor, profile) = seed_instructor(&env.db, "jane@example.com").await;
    let admin = seed_admin(&env.db).await;

    let created = env
        .service
        .create_submission(&instructor, &profile, vec![doc("id.pdf")])
        .await
        .unwrap();
    let before = reload_profile(&env.db, profile.id).await;

    env.service
        .reject(created.id, &admin, "blurry ID")
        .await
        .unwrap();
    let after = reload_profile(&env.db, profile.id).await;
    assert!(!after.is_verified);
    assert_eq!(after, before);

    let second = env
        .service
        .create_submission(&instructor, &after, vec![doc("retake.pdf")])
        .await
        .unwrap();
    let before = reload_profile(&env.db, profile.id).await;

    env.service.approve(second.id, &admin).await.unwrap();
    let after = reload_profile(&env.db, profile.id).await;
    assert!(after.is_verified);
    assert_eq!(
        instructor_fields(&after),
        instructor_fields(&before),
        "approval must not touch profile content"
    );
}

fn instructor_fields(
    p: &coursehub_backend::modules::users::entities::instructor_profile::Model,
) -> (Option<String>, Option<String>, i32) {
    (p.bio.clone(), p.expertise.clone(), p.user_id)
}

#[tokio::test]
async fn notifications_fire_after_each_transition() {
    let env = setup().await;
    let (instructor, profile) = seed_instructor(&env.db, "jane@example.com").await;
    let admin = seed_admin(&env.db).await;

    let created = env
        .service
        .create_submission(&instructor, &profile, vec![doc("id.pdf")])
        .await
        .unwrap();

    // Creation fans out to the whole admin distribution list.
    let sent = env.mailer.sent();
    assert_eq!(sent.len(), ADMIN_LIST.len());
    assert!(sent.iter().all(|m| m.subject == "New verification submission"));
    assert!(ADMIN_LIST.iter().all(|a| sent.iter().any(|m| &m.to == a)));

    env.service
        .reject(created.id, &admin, "blurry ID")
        .await
        .unwrap();

    let sent = env.mailer.sent();
    let to_instructor = sent.last().unwrap();
    assert_eq!(to_instructor.to, instructor.email);
    assert_eq!(
        to_instructor.subject,
        "Your instructor verification was rejected"
    );
    assert!(to_instructor.body.contains("blurry ID"));
}

#[tokio::test]
async fn broken_mail_transport_never_blocks_the_workflow() {
    let (db, service) = setup_with_mailer(Arc::new(FailingMailer)).await;
    let (instructor, profile) = seed_instructor(&db, "jane@example.com").await;
    let admin = seed_admin(&db).await;

    let created = service
        .create_submission(&instructor, &profile, vec![doc("id.pdf")])
        .await
        .expect("creation must survive mail failure");

    service
        .approve(created.id, &admin)
        .await
        .expect("approval must survive mail failure");

    let profile = reload_profile(&db, profile.id).await;
    assert!(profile.is_verified);
}

#[tokio::test]
async fn audit_entries_outlive_the_deciding_admin() {
    let env = setup().await;
    let (instructor, profile) = seed_instructor(&env.db, "jane@example.com").await;
    let admin = seed_admin(&env.db).await;

    let created = env
        .service
        .create_submission(&instructor, &profile, vec![doc("id.pdf")])
        .await
        .unwrap();
    env.service.approve(created.id, &admin).await.unwrap();

    let trail = env.service.audit_trail(created.id).await.unwrap();
    assert_eq!(trail[0].1.as_ref().map(|u| u.id), Some(admin.id));

    // Removing the admin account nulls the weak reference but keeps the entry.
    use coursehub_backend::modules::users::entities::user;
    user::Entity::delete_by_id(admin.id)
        .exec(&env.db)
        .await
        .unwrap();

    let trail = env.service.audit_trail(created.id).await.unwrap();
    assert_eq!(trail.len(), 1);
    assert!(trail[0].1.is_none());
    assert!(trail[0].0.admin_id.is_none());
}

#[tokio::test]
async fn admin_listing_filters_by_status_newest_first() {
    let env = setup().await;
    let admin_seeded = seed_admin(&env.db).await;

    let (alice, alice_profile) = seed_instructor(&env.db, "alice@example.com").await;
    let (bob, bob_profile) = seed_instructor(&env.db, "bob@example.com").await;

    let first = env
        .service
        .create_submission(&alice, &alice_profile, vec![doc("id.pdf")])
        .await
        .unwrap();
    env.service
        .reject(first.id, &admin_seeded, "blurry ID")
        .await
        .unwrap();
    env.service
        .create_submission(&bob, &bob_profile, vec![doc("id.pdf")])
        .await
        .unwrap();

    let all = env.service.list_submissions(None).await.unwrap();
    assert_eq!(all.len(), 2);
    // Newest first, and each row carries its own instructor.
    assert_eq!(all[0].instructor.email, "bob@example.com");
    assert_eq!(all[0].profile.id, bob_profile.id);
    assert_eq!(all[1].instructor.email, "alice@example.com");
    assert_eq!(all[1].profile.id, alice_profile.id);

    let pending = env
        .service
        .list_submissions(Some(SubmissionStatus::Pending))
        .await
        .unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].instructor.email, "bob@example.com");

    let detail = env.service.submission_detail(first.id).await.unwrap();
    assert_eq!(detail.instructor.email, "alice@example.com");
    assert_eq!(detail.documents.len(), 1);
    assert_eq!(detail.documents[0].file_name, "id.pdf");

    let err = env.service.submission_detail(9999).await.unwrap_err();
    assert!(matches!(
        err,
        AppError::Verification(VerificationError::NotFound)
    ));
}
