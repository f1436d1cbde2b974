//! Computer booking lifecycle service

use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult, ValidationError},
    models::{
        booking::{BookingDetails, BulkOutcome, ComputerBooking, CreateBooking},
        lab::ComputerStatus,
        notification::{NotificationKind, NotificationRefs},
        status::ReservationStatus,
        time_window::TimeWindow,
        user::UserClaims,
    },
    repository::Repository,
};

use super::{dispatch::NotificationService, email::EmailService};

/// Minimum notice a student must give before cancelling their own booking
const CANCELLATION_NOTICE_MINUTES: i64 = 30;

/// How much an in-progress booking is pushed back by an extension
const EXTENSION_MINUTES: i64 = 30;

#[derive(Clone)]
pub struct BookingsService {
    repository: Repository,
    notifications: NotificationService,
    email: EmailService,
}

impl BookingsService {
    pub fn new(
        repository: Repository,
        notifications: NotificationService,
        email: EmailService,
    ) -> Self {
        Self {
            repository,
            notifications,
            email,
        }
    }

    /// Admins may act on a booking only in labs they manage; super admins
    /// act everywhere.
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

    /// Request a new booking. Conflicts against approved bookings and
    /// sessions block the request up front; pending ones do not.
    pub async fn create(
        &self,
        claims: &UserClaims,
        request: CreateBooking,
    ) -> AppResult<ComputerBooking> {
        claims.require_student()?;

        let window = TimeWindow::new(request.start_time, request.end_time)?;
        let now = Utc::now();
        if window.start < now {
            return Err(ValidationError::PastStartTime.into());
        }

        let computer = self.repository.labs.get_computer(request.computer_id).await?;
        if computer.status == ComputerStatus::Maintenance {
            return Err(AppError::Conflict(
                "Computer is under maintenance".to_string(),
            ));
        }
        let lab = self.repository.labs.get_by_id(computer.lab_id).await?;

        if self
            .repository
            .bookings
            .conflict_exists(computer.id, lab.id, &window, None)
            .await?
        {
            return Err(ValidationError::SlotTaken("Computer".to_string()).into());
        }

        let student = self.repository.users.get_student(claims.user_id).await?;
        let booking = self
            .repository
            .bookings
            .create(computer.id, student.id, &window, Uuid::new_v4())
            .await?;

        tracing::info!(booking_id = booking.id, student_id = student.id, "booking requested");

        self.notifications
            .notify_lab_admins(
                lab.id,
                &format!(
                    "{} requested {} from {} to {}",
                    student.username,
                    computer.label(&lab.name),
                    window.start.format("%Y-%m-%d %H:%M"),
                    window.end.format("%H:%M"),
                ),
                NotificationKind::NewBooking,
                NotificationRefs::booking(booking.id),
            )
            .await;

        Ok(booking)
    }

    /// Approve a pending booking. Of two overlapping pending requests the
    /// first approval wins; the second fails with a slot conflict.
    pub async fn approve(&self, claims: &UserClaims, id: i32) -> AppResult<ComputerBooking> {
        let booking = self.repository.bookings.get_by_id(id).await?;
        let computer = self.repository.labs.get_computer(booking.computer_id).await?;
        self.authorize_lab_admin(claims, computer.lab_id).await?;

        let booking = self.repository.bookings.approve(id, Utc::now()).await?;
        let lab = self.repository.labs.get_by_id(computer.lab_id).await?;
        let student = self.repository.users.get_by_id(booking.student_id).await?;

        tracing::info!(booking_id = id, "booking approved");

        self.notifications
            .notify_user(
                student.id,
                &format!(
                    "Your booking for {} on {} has been approved",
                    computer.label(&lab.name),
                    booking.start_time.format("%Y-%m-%d %H:%M"),
                ),
                NotificationKind::BookingApproved,
                NotificationRefs::booking(id),
            )
            .await;

        // The sent flag is only set after a successful send, so a failed
        // delivery is retried on the next approval-email pass.
        if !booking.approval_email_sent {
            match self
                .email
                .send_booking_approved(&student, &booking, &computer, &lab)
                .await
            {
                Ok(()) => self.repository.bookings.set_approval_email_sent(id).await?,
                Err(e) => tracing::warn!(booking_id = id, error = %e, "approval email failed"),
            }
        }

        Ok(booking)
    }

    /// Reject a pending booking
    pub async fn reject(&self, claims: &UserClaims, id: i32) -> AppResult<ComputerBooking> {
        let booking = self.repository.bookings.get_by_id(id).await?;
        let computer = self.repository.labs.get_computer(booking.computer_id).await?;
        self.authorize_lab_admin(claims, computer.lab_id).await?;

        booking
            .status
            .validate_transition(ReservationStatus::Rejected)?;
        let booking = self.repository.bookings.reject(id, Utc::now()).await?;
        let lab = self.repository.labs.get_by_id(computer.lab_id).await?;
        let student = self.repository.users.get_by_id(booking.student_id).await?;

        tracing::info!(booking_id = id, "booking rejected");

        self.notifications
            .notify_user(
                student.id,
                &format!(
                    "Your booking for {} on {} has been rejected",
                    computer.label(&lab.name),
                    booking.start_time.format("%Y-%m-%d %H:%M"),
                ),
                NotificationKind::BookingRejected,
                NotificationRefs::booking(id),
            )
            .await;

        if !booking.rejection_email_sent {
            match self
                .email
                .send_booking_rejected(&student, &booking, &computer, &lab)
                .await
            {
                Ok(()) => self.repository.bookings.set_rejection_email_sent(id).await?,
                Err(e) => tracing::warn!(booking_id = id, error = %e, "rejection email failed"),
            }
        }

        Ok(booking)
    }

    /// Cancel an approved booking. The owner needs at least 30 minutes of
    /// notice before the start; admins of the lab can cancel at any time.
    pub async fn cancel(
        &self,
        claims: &UserClaims,
        id: i32,
        reason: Option<&str>,
    ) -> AppResult<ComputerBooking> {
        let booking = self.repository.bookings.get_by_id(id).await?;
        let computer = self.repository.labs.get_computer(booking.computer_id).await?;
        let now = Utc::now();

        let is_owner = booking.student_id == claims.user_id;
        if is_owner {
            if booking.start_time - now < Duration::minutes(CANCELLATION_NOTICE_MINUTES) {
                return Err(AppError::Conflict(format!(
                    "Bookings can only be cancelled at least {} minutes before they start",
                    CANCELLATION_NOTICE_MINUTES
                )));
            }
        } else {
            self.authorize_lab_admin(claims, computer.lab_id).await?;
        }

        booking
            .status
            .validate_transition(ReservationStatus::Cancelled)?;
        let booking = self.repository.bookings.cancel(id, reason, now).await?;
        let lab = self.repository.labs.get_by_id(computer.lab_id).await?;

        tracing::info!(booking_id = id, by_owner = is_owner, "booking cancelled");

        if is_owner {
            let student = self.repository.users.get_by_id(booking.student_id).await?;
            self.notifications
                .notify_lab_admins(
                    lab.id,
                    &format!(
                        "{} cancelled their booking for {} on {}",
                        student.username,
                        computer.label(&lab.name),
                        booking.start_time.format("%Y-%m-%d %H:%M"),
                    ),
                    NotificationKind::BookingCancelled,
                    NotificationRefs::booking(id),
                )
                .await;
        } else {
            let student = self.repository.users.get_by_id(booking.student_id).await?;
            self.notifications
                .notify_user(
                    student.id,
                    &format!(
                        "Your booking for {} on {} has been cancelled",
                        computer.label(&lab.name),
                        booking.start_time.format("%Y-%m-%d %H:%M"),
                    ),
                    NotificationKind::BookingCancelled,
                    NotificationRefs::booking(id),
                )
                .await;

            if !booking.cancellation_email_sent {
                match self
                    .email
                    .send_booking_cancelled(&student, &booking, &computer, &lab)
                    .await
                {
                    Ok(()) => {
                        self.repository
                            .bookings
                            .set_cancellation_email_sent(id)
                            .await?
                    }
                    Err(e) => {
                        tracing::warn!(booking_id = id, error = %e, "cancellation email failed")
                    }
                }
            }
        }

        Ok(booking)
    }

    /// Whether a booking can currently be pushed back by 30 minutes:
    /// approved, not yet extended, not over, and the extra window is free.
    pub async fn can_extend(&self, booking: &ComputerBooking) -> AppResult<bool> {
        let now = Utc::now();
        if booking.status != ReservationStatus::Approved
            || booking.extension_approved
            || booking.end_time <= now
        {
            return Ok(false);
        }

        let computer = self.repository.labs.get_computer(booking.computer_id).await?;
        // The booking itself is excluded, so checking the whole extended
        // window is the same as checking just the extra half hour
        let extended = booking.window().extended_by_minutes(EXTENSION_MINUTES);
        let conflict = self
            .repository
            .bookings
            .conflict_exists(computer.id, computer.lab_id, &extended, Some(booking.id))
            .await?;
        Ok(!conflict)
    }

    /// Extend an in-progress booking by 30 minutes (owner only, once)
    pub async fn extend(&self, claims: &UserClaims, id: i32) -> AppResult<ComputerBooking> {
        let booking = self.repository.bookings.get_by_id(id).await?;
        if booking.student_id != claims.user_id {
            return Err(AppError::Authorization(
                "Only the booking owner can request an extension".to_string(),
            ));
        }

        if !self.can_extend(&booking).await? {
            return Err(AppError::Conflict(
                "This booking cannot be extended".to_string(),
            ));
        }

        let new_end = booking.end_time + Duration::minutes(EXTENSION_MINUTES);
        let booking = self.repository.bookings.extend(id, new_end, Utc::now()).await?;

        tracing::info!(booking_id = id, "booking extended");

        self.notifications
            .notify_user(
                booking.student_id,
                &format!(
                    "Your booking has been extended until {}",
                    booking.end_time.format("%H:%M")
                ),
                NotificationKind::BookingExtended,
                NotificationRefs::booking(id),
            )
            .await;

        Ok(booking)
    }

    /// Notify students whose approved bookings end in 5 to 6 minutes.
    /// The reminder flag makes the pass idempotent across scheduler ticks.
    pub async fn send_ending_reminders(&self) -> AppResult<usize> {
        let now = Utc::now();
        let from = now + Duration::minutes(5);
        let to = now + Duration::minutes(6);

        let ending = self.repository.bookings.list_ending_between(from, to).await?;
        let mut sent = 0;

        for booking in ending {
            let (kind, message) = if self.can_extend(&booking).await? {
                (
                    NotificationKind::BookingEnding,
                    format!(
                        "Your booking ends at {}. You can extend it by {} minutes.",
                        booking.end_time.format("%H:%M"),
                        EXTENSION_MINUTES
                    ),
                )
            } else {
                (
                    NotificationKind::ExtensionUnavailable,
                    format!(
                        "Your booking ends at {}. No extension is available for this slot.",
                        booking.end_time.format("%H:%M")
                    ),
                )
            };

            self.notifications
                .notify_user(
                    booking.student_id,
                    &message,
                    kind,
                    NotificationRefs::booking(booking.id),
                )
                .await;
            self.repository.bookings.set_reminder_sent(booking.id).await?;
            sent += 1;
        }

        Ok(sent)
    }

    /// Approve a batch of bookings; per-item failures never abort the batch
    pub async fn bulk_approve(&self, claims: &UserClaims, ids: &[i32]) -> AppResult<BulkOutcome> {
        let mut outcome = BulkOutcome::default();
        for &id in ids {
            match self.approve(claims, id).await {
                Ok(_) => outcome.succeeded += 1,
                Err(e) => {
                    tracing::warn!(booking_id = id, error = %e, "bulk approve item failed");
                    outcome.failed += 1;
                }
            }
        }
        Ok(outcome)
    }

    /// Cancel a batch of bookings; per-item failures never abort the batch
    pub async fn bulk_cancel(
        &self,
        claims: &UserClaims,
        ids: &[i32],
        reason: Option<&str>,
    ) -> AppResult<BulkOutcome> {
        let mut outcome = BulkOutcome::default();
        for &id in ids {
            match self.cancel(claims, id, reason).await {
                Ok(_) => outcome.succeeded += 1,
                Err(e) => {
                    tracing::warn!(booking_id = id, error = %e, "bulk cancel item failed");
                    outcome.failed += 1;
                }
            }
        }
        Ok(outcome)
    }

    /// Get a booking, visible to its owner and lab admins
    pub async fn get(&self, claims: &UserClaims, id: i32) -> AppResult<ComputerBooking> {
        let booking = self.repository.bookings.get_by_id(id).await?;
        if booking.student_id == claims.user_id {
            return Ok(booking);
        }
        let computer = self.repository.labs.get_computer(booking.computer_id).await?;
        self.authorize_lab_admin(claims, computer.lab_id).await?;
        Ok(booking)
    }

    /// Pending bookings awaiting a decision (admin view)
    pub async fn list_pending(&self, claims: &UserClaims) -> AppResult<Vec<BookingDetails>> {
        claims.require_admin()?;
        self.repository.bookings.list_pending_details(Utc::now()).await
    }

    /// The caller's own bookings
    pub async fn list_mine(&self, claims: &UserClaims) -> AppResult<Vec<ComputerBooking>> {
        self.repository.bookings.list_for_student(claims.user_id).await
    }
}
