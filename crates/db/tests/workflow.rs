//! Integration tests for the status transition engine.

use assert_matches::assert_matches;
use leaders_core::error::CoreError;
use leaders_core::status::{ApplicationStatus, DisputeStatus, PaymentStatus, TaskStatus};
use leaders_db::error::DbError;
use leaders_db::models::application::CreateApplication;
use leaders_db::models::campaign::CreateCampaign;
use leaders_db::models::payment::CreatePayment;
use leaders_db::models::task::Task;
use leaders_db::models::user::CreateAccount;
use leaders_db::repositories::{
    ApplicationRepo, CampaignRepo, DisputeRepo, PaymentRepo, StatusChange, TaskRepo, UserRepo,
    WorkflowRepo,
};
use sqlx::PgPool;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn account(pool: &PgPool, email: &str, role: &str) -> Uuid {
    let (user, _) = UserRepo::create_account(
        pool,
        &CreateAccount {
            email: email.to_string(),
            password_hash: "x".to_string(),
            display_name: email.to_string(),
            role: role.to_string(),
        },
    )
    .await
    .unwrap();
    user.id
}

/// Staff user, creator, and a task in `selected`.
async fn selected_task(pool: &PgPool) -> (Uuid, Uuid, Task) {
    let staff = account(pool, "ops@leaders.example", "admin").await;
    let creator = account(pool, "maya@creators.example", "creator").await;

    let brand_id: Uuid = sqlx::query_scalar("INSERT INTO brands (name) VALUES ('Glow') RETURNING id")
        .fetch_one(pool)
        .await
        .unwrap();
    let campaign = CampaignRepo::create(
        pool,
        &CreateCampaign {
            brand_id,
            title: "Spring launch".to_string(),
            description: String::new(),
            fixed_price_cents: 25_000,
            currency: None,
            deadline: None,
        },
        staff,
    )
    .await
    .unwrap();
    let application = ApplicationRepo::create(
        pool,
        campaign.id,
        creator,
        &CreateApplication {
            pitch: "Unboxing reel".to_string(),
            bid_cents: None,
        },
    )
    .await
    .unwrap();

    let (_, task) =
        WorkflowRepo::decide_application(pool, &application, ApplicationStatus::Approved, staff)
            .await
            .unwrap();
    (staff, creator, task.unwrap())
}

async fn advance(pool: &PgPool, task_id: Uuid, from: TaskStatus, to: TaskStatus, actor: Uuid) {
    WorkflowRepo::transition_task(pool, &StatusChange::new(task_id, from, to, actor), None)
        .await
        .unwrap();
}

async fn task_status(pool: &PgPool, id: Uuid) -> String {
    TaskRepo::find_by_id(pool, id).await.unwrap().unwrap().status
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn approving_application_creates_selected_task(pool: PgPool) {
    let (_, creator, task) = selected_task(&pool).await;
    assert_eq!(task.status, "selected");
    assert_eq!(task.creator_id, creator);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn illegal_transition_writes_nothing(pool: PgPool) {
    let (staff, _, task) = selected_task(&pool).await;
    let audit_before: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM audit_logs")
        .fetch_one(&pool)
        .await
        .unwrap();

    let err = WorkflowRepo::transition_task(
        &pool,
        &StatusChange::new(task.id, TaskStatus::Selected, TaskStatus::Approved, staff),
        None,
    )
    .await
    .unwrap_err();
    assert_matches!(err, DbError::Domain(CoreError::InvalidTransition { .. }));

    let audit_after: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM audit_logs")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(audit_before, audit_after);
    assert_eq!(task_status(&pool, task.id).await, "selected");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn stale_expected_status_is_a_conflict(pool: PgPool) {
    let (staff, creator, task) = selected_task(&pool).await;
    advance(&pool, task.id, TaskStatus::Selected, TaskStatus::InProduction, creator).await;

    // A second writer still believes the task is `selected`.
    let err = WorkflowRepo::transition_task(
        &pool,
        &StatusChange::new(task.id, TaskStatus::Selected, TaskStatus::InProduction, staff),
        None,
    )
    .await
    .unwrap_err();
    assert_matches!(err, DbError::Domain(CoreError::Conflict(_)));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn paying_a_payment_pays_the_task(pool: PgPool) {
    let (staff, creator, task) = selected_task(&pool).await;
    advance(&pool, task.id, TaskStatus::Selected, TaskStatus::InProduction, creator).await;
    advance(&pool, task.id, TaskStatus::InProduction, TaskStatus::Uploaded, creator).await;
    advance(&pool, task.id, TaskStatus::Uploaded, TaskStatus::Approved, staff).await;

    let payment = PaymentRepo::create(
        &pool,
        task.id,
        &CreatePayment {
            amount_cents: 25_000,
            currency: None,
        },
        staff,
    )
    .await
    .unwrap();
    let applied = WorkflowRepo::set_payment_status(&pool, &payment, PaymentStatus::Paid, staff)
        .await
        .unwrap();

    assert_eq!(applied.len(), 2);
    assert_eq!(task_status(&pool, task.id).await, "paid");
    let paid = PaymentRepo::find_by_id(&pool, payment.id).await.unwrap().unwrap();
    assert!(paid.paid_at.is_some());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn payment_for_unapproved_task_rolls_back(pool: PgPool) {
    let (staff, _, task) = selected_task(&pool).await;
    let payment = PaymentRepo::create(
        &pool,
        task.id,
        &CreatePayment {
            amount_cents: 25_000,
            currency: None,
        },
        staff,
    )
    .await
    .unwrap();

    let err = WorkflowRepo::set_payment_status(&pool, &payment, PaymentStatus::Paid, staff)
        .await
        .unwrap_err();
    assert_matches!(err, DbError::Domain(CoreError::InvalidTransition { .. }));

    let unchanged = PaymentRepo::find_by_id(&pool, payment.id).await.unwrap().unwrap();
    assert_eq!(unchanged.status, "pending");
    assert!(unchanged.paid_at.is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn dispute_round_trip_moves_the_task(pool: PgPool) {
    let (staff, creator, task) = selected_task(&pool).await;
    advance(&pool, task.id, TaskStatus::Selected, TaskStatus::InProduction, creator).await;
    advance(&pool, task.id, TaskStatus::InProduction, TaskStatus::Uploaded, creator).await;

    let (dispute, _) = WorkflowRepo::open_dispute(&pool, task.id, creator, "Brand went silent")
        .await
        .unwrap();
    assert_eq!(task_status(&pool, task.id).await, "disputed");

    WorkflowRepo::advance_dispute(&pool, &dispute, DisputeStatus::Rejected, staff, Some("Needs captions"))
        .await
        .unwrap();
    assert_eq!(task_status(&pool, task.id).await, "needs_edits");

    let closed = DisputeRepo::find_by_id(&pool, dispute.id).await.unwrap().unwrap();
    assert_eq!(closed.status, "rejected");
    assert_eq!(closed.resolved_by, Some(staff));
}
