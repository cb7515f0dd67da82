//! Resource-level authorization.
//!
//! Staff see everything; brand members see their brand's campaigns and
//! everything hanging off them; creators see published campaigns and
//! their own tasks. Role gates alone live in [`crate::middleware::rbac`].

use leaders_core::audit::entities;
use leaders_core::error::CoreError;
use leaders_core::status::{CampaignStatus, Transition};
use leaders_core::types::DbId;
use leaders_db::models::campaign::Campaign;
use leaders_db::models::task::{Task, TaskOwner};
use leaders_db::repositories::{BrandRepo, CampaignRepo, TaskRepo};
use leaders_db::DbPool;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;

/// How the caller relates to a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskRelation {
    Staff,
    BrandMember,
    Creator,
}

impl TaskRelation {
    pub fn is_reviewer(self) -> bool {
        matches!(self, TaskRelation::Staff | TaskRelation::BrandMember)
    }
}

fn forbidden(message: &str) -> AppError {
    AppError::Core(CoreError::Forbidden(message.into()))
}

pub async fn load_campaign(pool: &DbPool, id: DbId) -> AppResult<Campaign> {
    CampaignRepo::find_by_id(pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: entities::CAMPAIGN,
            id,
        }))
}

pub async fn load_task(pool: &DbPool, id: DbId) -> AppResult<Task> {
    TaskRepo::find_by_id(pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: entities::TASK,
            id,
        }))
}

/// Staff, or a member of `brand_id`.
pub async fn ensure_brand_access(pool: &DbPool, user: &AuthUser, brand_id: DbId) -> AppResult<()> {
    if user.is_staff() {
        return Ok(());
    }
    if user.is_brand() && BrandRepo::is_member(pool, brand_id, user.user_id).await? {
        return Ok(());
    }
    Err(forbidden("Not a member of this brand"))
}

/// Whether the caller may read `campaign`. Creators only see campaigns
/// that have left `draft`.
pub async fn ensure_campaign_readable(
    pool: &DbPool,
    user: &AuthUser,
    campaign: &Campaign,
) -> AppResult<()> {
    if user.is_creator() {
        if campaign.status == CampaignStatus::Draft.as_str() {
            return Err(forbidden("Campaign is not published"));
        }
        return Ok(());
    }
    ensure_brand_access(pool, user, campaign.brand_id).await
}

/// Resolve the caller's relation to a task, or 403.
/// The task's creator and brand, for access checks and event audiences.
pub async fn load_task_owner(pool: &DbPool, task_id: DbId) -> AppResult<TaskOwner> {
    TaskRepo::find_owner(pool, task_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: entities::TASK,
            id: task_id,
        }))
}

pub async fn task_relation(
    pool: &DbPool,
    user: &AuthUser,
    task_id: DbId,
) -> AppResult<(TaskOwner, TaskRelation)> {
    let owner = load_task_owner(pool, task_id).await?;

    let relation = if user.is_staff() {
        TaskRelation::Staff
    } else if owner.creator_id == user.user_id {
        TaskRelation::Creator
    } else if user.is_brand() && BrandRepo::is_member(pool, owner.brand_id, user.user_id).await? {
        TaskRelation::BrandMember
    } else {
        return Err(forbidden("No access to this task"));
    };
    Ok((owner, relation))
}
