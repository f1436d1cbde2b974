//! Lab session lifecycle and attendance service

use chrono::{Duration, Utc};

use crate::{
    error::{AppError, AppResult, ValidationError},
    models::{
        attendance::{BulkAttendanceEntry, BulkAttendanceReport, AttendanceFailure, BookingAttendance, MarkAttendance, SessionAttendance},
        booking::BulkOutcome,
        notification::{NotificationKind, NotificationRefs},
        session::{CreateSession, LabSession, SessionDetails},
        status::ReservationStatus,
        time_window::TimeWindow,
        user::UserClaims,
    },
    repository::Repository,
};

use super::{dispatch::NotificationService, email::EmailService};

/// Minimum notice a lecturer must give before cancelling their own session
const CANCELLATION_NOTICE_HOURS: i64 = 2;

/// A pending session is refused while more than this many approved bookings
/// overlap it in the lab
const MAX_CONCURRENT_BOOKINGS: i64 = 10;

/// Labs at least this large absorb a session approval by displacing
/// overlapping approved bookings instead of blocking on them
const DISPLACEMENT_MIN_COMPUTERS: i64 = 5;

#[derive(Clone)]
pub struct SessionsService {
    repository: Repository,
    notifications: NotificationService,
    email: EmailService,
}

impl SessionsService {
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

    /// Request a lab session. Refused when an approved session already holds
    /// the lab or when too many approved bookings overlap the window.
    pub async fn create(
        &self,
        claims: &UserClaims,
        request: CreateSession,
    ) -> AppResult<LabSession> {
        claims.require_lecturer()?;

        let window = TimeWindow::new(request.start_time, request.end_time)?;
        let now = Utc::now();
        if window.start < now {
            return Err(ValidationError::PastStartTime.into());
        }

        let lab = self.repository.labs.get_by_id(request.lab_id).await?;

        if self
            .repository
            .sessions
            .conflict_exists(lab.id, &window, None)
            .await?
        {
            return Err(ValidationError::SlotTaken("Lab".to_string()).into());
        }

        let overlapping = self
            .repository
            .bookings
            .count_approved_overlapping_in_lab(lab.id, &window)
            .await?;
        if overlapping > MAX_CONCURRENT_BOOKINGS {
            return Err(
                ValidationError::TooManyConcurrentBookings(MAX_CONCURRENT_BOOKINGS).into(),
            );
        }

        let lecturer = self.repository.users.get_by_id(claims.user_id).await?;
        let session = self
            .repository
            .sessions
            .create(lab.id, lecturer.id, &request.title, &window)
            .await?;

        tracing::info!(session_id = session.id, lecturer_id = lecturer.id, "session requested");

        self.notifications
            .notify_lab_admins(
                lab.id,
                &format!(
                    "{} requested the session \"{}\" in {} from {} to {}",
                    lecturer.username,
                    session.title,
                    lab.name,
                    window.start.format("%Y-%m-%d %H:%M"),
                    window.end.format("%H:%M"),
                ),
                NotificationKind::SessionRequested,
                NotificationRefs::session(session.id),
            )
            .await;

        Ok(session)
    }

    /// Approve a pending session. In labs with at least 5 computers,
    /// overlapping approved bookings are displaced (cancelled with a notice);
    /// smaller labs block on them instead.
    pub async fn approve(&self, claims: &UserClaims, id: i32) -> AppResult<LabSession> {
        let session = self.repository.sessions.get_by_id(id).await?;
        self.authorize_lab_admin(claims, session.lab_id).await?;

        let lab = self.repository.labs.get_by_id(session.lab_id).await?;
        let computer_count = self.repository.labs.computer_count(lab.id).await?;
        let window = session.window();

        // Small labs block on overlapping approved bookings; the check runs
        // inside the approval transaction so a booking approved in between
        // cannot end up coexisting with the session
        let now = Utc::now();
        let block_on_bookings = computer_count < DISPLACEMENT_MIN_COMPUTERS;
        let session = self
            .repository
            .sessions
            .approve(id, now, block_on_bookings)
            .await?;

        if computer_count >= DISPLACEMENT_MIN_COMPUTERS {
            let displaced = self
                .repository
                .bookings
                .displace_approved_in_lab(lab.id, &window, now)
                .await?;
            for booking in &displaced {
                self.notifications
                    .notify_user(
                        booking.student_id,
                        &format!(
                            "Your booking on {} was cancelled because the lab is reserved for \"{}\"",
                            booking.start_time.format("%Y-%m-%d %H:%M"),
                            session.title,
                        ),
                        NotificationKind::BookingCancelled,
                        NotificationRefs::booking(booking.id),
                    )
                    .await;
            }
            if !displaced.is_empty() {
                tracing::info!(session_id = id, count = displaced.len(), "bookings displaced");
            }
        }

        let lecturer = self.repository.users.get_by_id(session.lecturer_id).await?;

        tracing::info!(session_id = id, "session approved");

        self.notifications
            .notify_user(
                lecturer.id,
                &format!(
                    "Your session \"{}\" in {} has been approved",
                    session.title, lab.name
                ),
                NotificationKind::SessionApproved,
                NotificationRefs::session(id),
            )
            .await;

        if !session.approval_email_sent {
            match self
                .email
                .send_session_approved(&lecturer, &session, &lab)
                .await
            {
                Ok(()) => self.repository.sessions.set_approval_email_sent(id).await?,
                Err(e) => tracing::warn!(session_id = id, error = %e, "approval email failed"),
            }
        }

        Ok(session)
    }

    /// Reject a pending session
    pub async fn reject(&self, claims: &UserClaims, id: i32) -> AppResult<LabSession> {
        let session = self.repository.sessions.get_by_id(id).await?;
        self.authorize_lab_admin(claims, session.lab_id).await?;

        session
            .status
            .validate_transition(ReservationStatus::Rejected)?;
        let session = self.repository.sessions.reject(id, Utc::now()).await?;
        let lab = self.repository.labs.get_by_id(session.lab_id).await?;
        let lecturer = self.repository.users.get_by_id(session.lecturer_id).await?;

        tracing::info!(session_id = id, "session rejected");

        self.notifications
            .notify_user(
                lecturer.id,
                &format!(
                    "Your session \"{}\" in {} has been rejected",
                    session.title, lab.name
                ),
                NotificationKind::SessionRejected,
                NotificationRefs::session(id),
            )
            .await;

        if !session.rejection_email_sent {
            match self
                .email
                .send_session_rejected(&lecturer, &session, &lab)
                .await
            {
                Ok(()) => self.repository.sessions.set_rejection_email_sent(id).await?,
                Err(e) => tracing::warn!(session_id = id, error = %e, "rejection email failed"),
            }
        }

        Ok(session)
    }

    /// Cancel an approved session. The owning lecturer needs at least two
    /// hours of notice; lab admins can cancel at any time. Registered
    /// attendees are notified either way.
    pub async fn cancel(
        &self,
        claims: &UserClaims,
        id: i32,
        reason: Option<&str>,
    ) -> AppResult<LabSession> {
        let session = self.repository.sessions.get_by_id(id).await?;
        let now = Utc::now();

        let is_owner = session.lecturer_id == claims.user_id;
        if is_owner {
            if session.start_time - now < Duration::hours(CANCELLATION_NOTICE_HOURS) {
                return Err(AppError::Conflict(format!(
                    "Sessions can only be cancelled at least {} hours before they start",
                    CANCELLATION_NOTICE_HOURS
                )));
            }
        } else {
            self.authorize_lab_admin(claims, session.lab_id).await?;
        }

        session
            .status
            .validate_transition(ReservationStatus::Cancelled)?;
        let session = self.repository.sessions.cancel(id, reason, now).await?;
        let lab = self.repository.labs.get_by_id(session.lab_id).await?;
        let lecturer = self.repository.users.get_by_id(session.lecturer_id).await?;

        tracing::info!(session_id = id, by_owner = is_owner, "session cancelled");

        if is_owner {
            self.notifications
                .notify_lab_admins(
                    lab.id,
                    &format!(
                        "{} cancelled the session \"{}\" in {}",
                        lecturer.username, session.title, lab.name
                    ),
                    NotificationKind::SessionCancelled,
                    NotificationRefs::session(id),
                )
                .await;
        } else {
            self.notifications
                .notify_user(
                    lecturer.id,
                    &format!(
                        "Your session \"{}\" in {} has been cancelled",
                        session.title, lab.name
                    ),
                    NotificationKind::SessionCancelled,
                    NotificationRefs::session(id),
                )
                .await;
        }

        for student_id in self.repository.sessions.attendee_ids(id).await? {
            self.notifications
                .notify_user(
                    student_id,
                    &format!(
                        "The session \"{}\" on {} has been cancelled",
                        session.title,
                        session.start_time.format("%Y-%m-%d %H:%M"),
                    ),
                    NotificationKind::SessionCancelled,
                    NotificationRefs::session(id),
                )
                .await;
        }

        if !session.cancellation_email_sent {
            match self
                .email
                .send_session_cancelled(&lecturer, &session, &lab)
                .await
            {
                Ok(()) => {
                    self.repository
                        .sessions
                        .set_cancellation_email_sent(id)
                        .await?
                }
                Err(e) => tracing::warn!(session_id = id, error = %e, "cancellation email failed"),
            }
        }

        Ok(session)
    }

    /// Register the calling student on an approved session's roster
    pub async fn join(&self, claims: &UserClaims, id: i32) -> AppResult<()> {
        claims.require_student()?;
        let session = self.repository.sessions.get_by_id(id).await?;
        if session.status != ReservationStatus::Approved {
            return Err(AppError::Conflict(
                "Only approved sessions can be joined".to_string(),
            ));
        }
        self.repository
            .sessions
            .add_attendee(id, claims.user_id)
            .await
    }

    /// Record attendance for a computer booking (admin of the lab only)
    pub async fn mark_booking_attendance(
        &self,
        claims: &UserClaims,
        booking_id: i32,
        mark: MarkAttendance,
    ) -> AppResult<BookingAttendance> {
        let booking = self.repository.bookings.get_by_id(booking_id).await?;
        let computer = self.repository.labs.get_computer(booking.computer_id).await?;
        self.authorize_lab_admin(claims, computer.lab_id).await?;

        if booking.status != ReservationStatus::Approved {
            return Err(AppError::Conflict(
                "Attendance can only be marked on approved bookings".to_string(),
            ));
        }

        let record = self
            .repository
            .attendance
            .upsert_booking_attendance(
                booking_id,
                mark.status,
                mark.notes.as_deref(),
                claims.user_id,
                Utc::now(),
            )
            .await?;

        self.notifications
            .notify_user(
                booking.student_id,
                &format!("You were marked {} for your booking", mark.status),
                NotificationKind::AttendanceMarked,
                NotificationRefs::booking(booking_id),
            )
            .await;

        Ok(record)
    }

    /// Record attendance for one student on a session. The student is added
    /// to the roster if not already registered.
    pub async fn mark_session_attendance(
        &self,
        claims: &UserClaims,
        session_id: i32,
        student_id: i32,
        mark: MarkAttendance,
    ) -> AppResult<SessionAttendance> {
        let session = self.repository.sessions.get_by_id(session_id).await?;
        self.authorize_lab_admin(claims, session.lab_id).await?;

        if session.status != ReservationStatus::Approved {
            return Err(AppError::Conflict(
                "Attendance can only be marked on approved sessions".to_string(),
            ));
        }

        let student = self.repository.users.get_student(student_id).await?;
        self.repository
            .sessions
            .add_attendee(session_id, student.id)
            .await?;

        let record = self
            .repository
            .attendance
            .upsert_session_attendance(
                session_id,
                student.id,
                mark.status,
                mark.notes.as_deref(),
                claims.user_id,
                Utc::now(),
            )
            .await?;

        self.notifications
            .notify_user(
                student.id,
                &format!(
                    "You were marked {} for \"{}\"",
                    mark.status, session.title
                ),
                NotificationKind::AttendanceMarked,
                NotificationRefs::session(session_id),
            )
            .await;

        Ok(record)
    }

    /// Record attendance for a whole roster at once; per-entry failures are
    /// reported but never abort the batch
    pub async fn bulk_attendance(
        &self,
        claims: &UserClaims,
        session_id: i32,
        entries: Vec<BulkAttendanceEntry>,
    ) -> AppResult<BulkAttendanceReport> {
        let mut report = BulkAttendanceReport::default();
        for entry in entries {
            let mark = MarkAttendance {
                status: entry.status,
                notes: entry.notes.clone(),
            };
            match self
                .mark_session_attendance(claims, session_id, entry.student_id, mark)
                .await
            {
                Ok(_) => report.recorded += 1,
                Err(e) => report.failures.push(AttendanceFailure {
                    student_id: entry.student_id,
                    reason: e.to_string(),
                }),
            }
        }
        Ok(report)
    }

    /// Attendance records for a session (admin of the lab only)
    pub async fn list_attendance(
        &self,
        claims: &UserClaims,
        session_id: i32,
    ) -> AppResult<Vec<SessionAttendance>> {
        let session = self.repository.sessions.get_by_id(session_id).await?;
        self.authorize_lab_admin(claims, session.lab_id).await?;
        self.repository.attendance.list_for_session(session_id).await
    }

    /// Approve a batch of sessions; per-item failures never abort the batch
    pub async fn bulk_approve(&self, claims: &UserClaims, ids: &[i32]) -> AppResult<BulkOutcome> {
        let mut outcome = BulkOutcome::default();
        for &id in ids {
            match self.approve(claims, id).await {
                Ok(_) => outcome.succeeded += 1,
                Err(e) => {
                    tracing::warn!(session_id = id, error = %e, "bulk approve item failed");
                    outcome.failed += 1;
                }
            }
        }
        Ok(outcome)
    }

    /// Cancel a batch of sessions; per-item failures never abort the batch
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
                    tracing::warn!(session_id = id, error = %e, "bulk cancel item failed");
                    outcome.failed += 1;
                }
            }
        }
        Ok(outcome)
    }

    /// Get a session
    pub async fn get(&self, id: i32) -> AppResult<LabSession> {
        self.repository.sessions.get_by_id(id).await
    }

    /// Pending sessions awaiting a decision (admin view)
    pub async fn list_pending(&self, claims: &UserClaims) -> AppResult<Vec<LabSession>> {
        claims.require_admin()?;
        self.repository.sessions.list_pending_future(Utc::now()).await
    }

    /// Upcoming approved sessions with display context
    pub async fn list_upcoming(&self) -> AppResult<Vec<SessionDetails>> {
        self.repository.sessions.list_approved_future(Utc::now()).await
    }

    /// The caller's own sessions
    pub async fn list_mine(&self, claims: &UserClaims) -> AppResult<Vec<LabSession>> {
        self.repository.sessions.list_for_lecturer(claims.user_id).await
    }
}
