//! Recurring session templates service

use chrono::Utc;

use crate::{
    error::{AppError, AppResult, ValidationError},
    models::{
        booking::BulkOutcome,
        notification::{NotificationKind, NotificationRefs},
        recurring::{conflicting_dates, expand_occurrences, CreateRecurringSession, RecurringSession},
        status::ReservationStatus,
        time_window::TimeWindow,
        user::UserClaims,
    },
    repository::Repository,
};

use super::dispatch::NotificationService;

#[derive(Clone)]
pub struct RecurringService {
    repository: Repository,
    notifications: NotificationService,
}

impl RecurringService {
    pub fn new(repository: Repository, notifications: NotificationService) -> Self {
        Self {
            repository,
            notifications,
        }
    }

    async fn authorize_lab_admin(&self, claims: &UserClaims, lab_id: i32) -> AppResult<()> {
        claims.require_admin()?;
        if claims.is_super_admin {
            return Ok(());
        }
        if self
            .repository
            .users
            .manages_lab(claims.user_id, lab_id)
            .await?
        {
            Ok(())
        } else {
            Err(AppError::Authorization(
                "You do not manage this lab".to_string(),
            ))
        }
    }

    /// Occurrence dates that collide with approved sessions or other
    /// approved templates in the lab. Empty means the expansion is clear.
    async fn occurrence_conflicts(
        &self,
        lab_id: i32,
        occurrences: &[TimeWindow],
        exclude_template: Option<i32>,
    ) -> AppResult<Vec<String>> {
        let Some(first) = occurrences.first() else {
            return Ok(Vec::new());
        };
        let last = &occurrences[occurrences.len() - 1];

        let mut existing = self
            .repository
            .sessions
            .approved_windows_in_range(lab_id, first.start, last.end)
            .await?;

        for template in self
            .repository
            .recurring
            .list_approved_for_lab(lab_id, exclude_template)
            .await?
        {
            existing.extend(template.occurrence_windows()?);
        }

        Ok(conflicting_dates(occurrences, &existing))
    }

    /// Request a recurring session. The whole expansion is validated up
    /// front; any colliding occurrence date fails the request and is
    /// reported back.
    pub async fn create(
        &self,
        claims: &UserClaims,
        request: CreateRecurringSession,
    ) -> AppResult<RecurringSession> {
        claims.require_lecturer()?;

        let lab = self.repository.labs.get_by_id(request.lab_id).await?;
        let occurrences = expand_occurrences(
            request.cadence,
            request.start_date,
            request.end_date,
            request.start_time,
            request.end_time,
        )?;

        let now = Utc::now();
        if let Some(first) = occurrences.first() {
            if first.start < now {
                return Err(ValidationError::PastStartTime.into());
            }
        }

        let conflicts = self
            .occurrence_conflicts(lab.id, &occurrences, None)
            .await?;
        if !conflicts.is_empty() {
            return Err(ValidationError::RecurrenceConflict(conflicts).into());
        }

        let lecturer = self.repository.users.get_by_id(claims.user_id).await?;
        let template = self
            .repository
            .recurring
            .create(
                lab.id,
                lecturer.id,
                &request.title,
                request.start_date,
                request.end_date,
                request.start_time,
                request.end_time,
                request.cadence,
            )
            .await?;

        tracing::info!(
            recurring_session_id = template.id,
            occurrences = occurrences.len(),
            "recurring session requested"
        );

        self.notifications
            .notify_lab_admins(
                lab.id,
                &format!(
                    "{} requested the {} session \"{}\" in {} ({} to {})",
                    lecturer.username,
                    template.cadence,
                    template.title,
                    lab.name,
                    template.start_date,
                    template.end_date,
                ),
                NotificationKind::RecurringRequested,
                NotificationRefs::recurring(template.id),
            )
            .await;

        Ok(template)
    }

    /// Approve a template and materialize every occurrence as an approved
    /// session. The expansion is re-validated first and is all-or-nothing:
    /// one colliding occurrence fails the whole approval.
    pub async fn approve(&self, claims: &UserClaims, id: i32) -> AppResult<RecurringSession> {
        let template = self.repository.recurring.get_by_id(id).await?;
        self.authorize_lab_admin(claims, template.lab_id).await?;

        template
            .status
            .validate_transition(ReservationStatus::Approved)?;

        let occurrences = template.occurrence_windows()?;
        let conflicts = self
            .occurrence_conflicts(template.lab_id, &occurrences, Some(id))
            .await?;
        if !conflicts.is_empty() {
            return Err(ValidationError::RecurrenceConflict(conflicts).into());
        }

        let template = self
            .repository
            .recurring
            .approve_and_materialize(id, &occurrences, Utc::now())
            .await?;
        let lab = self.repository.labs.get_by_id(template.lab_id).await?;

        tracing::info!(
            recurring_session_id = id,
            occurrences = occurrences.len(),
            "recurring session approved"
        );

        self.notifications
            .notify_user(
                template.lecturer_id,
                &format!(
                    "Your {} session \"{}\" in {} has been approved ({} occurrences)",
                    template.cadence,
                    template.title,
                    lab.name,
                    occurrences.len(),
                ),
                NotificationKind::RecurringApproved,
                NotificationRefs::recurring(id),
            )
            .await;

        Ok(template)
    }

    /// Reject a pending template. The lecturer is notified, then the
    /// template is removed; no tombstone is kept.
    pub async fn reject(&self, claims: &UserClaims, id: i32) -> AppResult<()> {
        let template = self.repository.recurring.get_by_id(id).await?;
        self.authorize_lab_admin(claims, template.lab_id).await?;

        template
            .status
            .validate_transition(ReservationStatus::Rejected)?;
        let lab = self.repository.labs.get_by_id(template.lab_id).await?;

        self.notifications
            .notify_user(
                template.lecturer_id,
                &format!(
                    "Your {} session \"{}\" in {} has been rejected",
                    template.cadence, template.title, lab.name
                ),
                NotificationKind::RecurringRejected,
                NotificationRefs::default(),
            )
            .await;

        tracing::info!(recurring_session_id = id, "recurring session rejected");

        self.repository.recurring.delete(id).await
    }

    /// Cancel an approved template: future materialized sessions are removed
    /// (their attendees notified), then the template itself is deleted.
    pub async fn cancel(&self, claims: &UserClaims, id: i32) -> AppResult<()> {
        let template = self.repository.recurring.get_by_id(id).await?;
        let is_owner = template.lecturer_id == claims.user_id;
        if !is_owner {
            self.authorize_lab_admin(claims, template.lab_id).await?;
        }

        let now = Utc::now();
        let removed = self
            .repository
            .sessions
            .delete_future_children(id, now)
            .await?;

        for (session, attendees) in &removed {
            for &student_id in attendees {
                self.notifications
                    .notify_user(
                        student_id,
                        &format!(
                            "The session \"{}\" on {} has been cancelled",
                            session.title,
                            session.start_time.format("%Y-%m-%d %H:%M"),
                        ),
                        NotificationKind::SessionCancelled,
                        NotificationRefs::default(),
                    )
                    .await;
            }
        }

        let lab = self.repository.labs.get_by_id(template.lab_id).await?;
        if is_owner {
            let lecturer = self.repository.users.get_by_id(template.lecturer_id).await?;
            self.notifications
                .notify_lab_admins(
                    lab.id,
                    &format!(
                        "{} cancelled the {} session \"{}\" in {}",
                        lecturer.username, template.cadence, template.title, lab.name
                    ),
                    NotificationKind::SessionCancelled,
                    NotificationRefs::default(),
                )
                .await;
        } else {
            self.notifications
                .notify_user(
                    template.lecturer_id,
                    &format!(
                        "Your {} session \"{}\" in {} has been cancelled",
                        template.cadence, template.title, lab.name
                    ),
                    NotificationKind::SessionCancelled,
                    NotificationRefs::default(),
                )
                .await;
        }

        tracing::info!(
            recurring_session_id = id,
            removed = removed.len(),
            "recurring session cancelled"
        );

        self.repository.recurring.delete(id).await
    }

    /// Approve a batch of templates; per-item failures never abort the batch
    pub async fn bulk_approve(&self, claims: &UserClaims, ids: &[i32]) -> AppResult<BulkOutcome> {
        let mut outcome = BulkOutcome::default();
        for &id in ids {
            match self.approve(claims, id).await {
                Ok(_) => outcome.succeeded += 1,
                Err(e) => {
                    tracing::warn!(recurring_session_id = id, error = %e, "bulk approve item failed");
                    outcome.failed += 1;
                }
            }
        }
        Ok(outcome)
    }

    /// Get a template
    pub async fn get(&self, id: i32) -> AppResult<RecurringSession> {
        self.repository.recurring.get_by_id(id).await
    }

    /// Pending templates awaiting a decision (admin view)
    pub async fn list_pending(&self, claims: &UserClaims) -> AppResult<Vec<RecurringSession>> {
        claims.require_admin()?;
        self.repository.recurring.list_pending().await
    }

    /// The caller's own templates
    pub async fn list_mine(&self, claims: &UserClaims) -> AppResult<Vec<RecurringSession>> {
        self.repository.recurring.list_for_lecturer(claims.user_id).await
    }
}
