//! Email service for reservation lifecycle notifications

use lettre::{
    message::{header::ContentType, Mailbox, Message, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    SmtpTransport, Transport,
};
use std::str::FromStr;

use crate::{
    config::EmailConfig,
    error::{AppError, AppResult},
    models::{booking::ComputerBooking, lab::Computer, session::LabSession, user::User, Lab},
};

#[derive(Clone)]
pub struct EmailService {
    config: EmailConfig,
}

impl EmailService {
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    /// Booking approval confirmation, including the check-in code
    pub async fn send_booking_approved(
        &self,
        student: &User,
        booking: &ComputerBooking,
        computer: &Computer,
        lab: &Lab,
    ) -> AppResult<()> {
        let Some(to) = student.email.as_deref() else {
            tracing::debug!(user_id = student.id, "no email address on file, skipping");
            return Ok(());
        };
        let subject = "Your computer booking has been approved";
        let body = format!(
            r#"
Hello {name},

Your booking has been approved.

Computer: {computer}
Lab: {lab}
From: {start}
To: {end}

Your booking code is: {code}
Show this code at check-in.
"#,
            name = student.full_name(),
            computer = computer.label(&lab.name),
            lab = lab.name,
            start = booking.start_time.format("%Y-%m-%d %H:%M UTC"),
            end = booking.end_time.format("%Y-%m-%d %H:%M UTC"),
            code = booking.booking_code,
        );

        self.send_email(to, subject, &body).await
    }

    /// Booking rejection notice
    pub async fn send_booking_rejected(
        &self,
        student: &User,
        booking: &ComputerBooking,
        computer: &Computer,
        lab: &Lab,
    ) -> AppResult<()> {
        let Some(to) = student.email.as_deref() else {
            tracing::debug!(user_id = student.id, "no email address on file, skipping");
            return Ok(());
        };
        let subject = "Your computer booking has been rejected";
        let body = format!(
            r#"
Hello {name},

Unfortunately your booking could not be approved.

Computer: {computer}
From: {start}
To: {end}

Please pick another time slot and try again.
"#,
            name = student.full_name(),
            computer = computer.label(&lab.name),
            start = booking.start_time.format("%Y-%m-%d %H:%M UTC"),
            end = booking.end_time.format("%Y-%m-%d %H:%M UTC"),
        );

        self.send_email(to, subject, &body).await
    }

    /// Booking cancellation notice
    pub async fn send_booking_cancelled(
        &self,
        student: &User,
        booking: &ComputerBooking,
        computer: &Computer,
        lab: &Lab,
    ) -> AppResult<()> {
        let Some(to) = student.email.as_deref() else {
            tracing::debug!(user_id = student.id, "no email address on file, skipping");
            return Ok(());
        };
        let subject = "Your computer booking has been cancelled";
        let reason = booking
            .cancellation_reason
            .as_deref()
            .unwrap_or("No reason given");
        let body = format!(
            r#"
Hello {name},

Your booking has been cancelled.

Computer: {computer}
From: {start}
To: {end}
Reason: {reason}
"#,
            name = student.full_name(),
            computer = computer.label(&lab.name),
            start = booking.start_time.format("%Y-%m-%d %H:%M UTC"),
            end = booking.end_time.format("%Y-%m-%d %H:%M UTC"),
            reason = reason,
        );

        self.send_email(to, subject, &body).await
    }

    /// Session approval confirmation for the lecturer
    pub async fn send_session_approved(
        &self,
        lecturer: &User,
        session: &LabSession,
        lab: &Lab,
    ) -> AppResult<()> {
        let Some(to) = lecturer.email.as_deref() else {
            tracing::debug!(user_id = lecturer.id, "no email address on file, skipping");
            return Ok(());
        };
        let subject = "Your lab session has been approved";
        let body = format!(
            r#"
Hello {name},

Your lab session "{title}" has been approved.

Lab: {lab}
From: {start}
To: {end}
"#,
            name = lecturer.full_name(),
            title = session.title,
            lab = lab.name,
            start = session.start_time.format("%Y-%m-%d %H:%M UTC"),
            end = session.end_time.format("%Y-%m-%d %H:%M UTC"),
        );

        self.send_email(to, subject, &body).await
    }

    /// Session rejection notice for the lecturer
    pub async fn send_session_rejected(
        &self,
        lecturer: &User,
        session: &LabSession,
        lab: &Lab,
    ) -> AppResult<()> {
        let Some(to) = lecturer.email.as_deref() else {
            tracing::debug!(user_id = lecturer.id, "no email address on file, skipping");
            return Ok(());
        };
        let subject = "Your lab session has been rejected";
        let body = format!(
            r#"
Hello {name},

Unfortunately your lab session "{title}" could not be approved.

Lab: {lab}
From: {start}
To: {end}

Please pick another time slot and try again.
"#,
            name = lecturer.full_name(),
            title = session.title,
            lab = lab.name,
            start = session.start_time.format("%Y-%m-%d %H:%M UTC"),
            end = session.end_time.format("%Y-%m-%d %H:%M UTC"),
        );

        self.send_email(to, subject, &body).await
    }

    /// Session cancellation notice for the lecturer or an attendee
    pub async fn send_session_cancelled(
        &self,
        recipient: &User,
        session: &LabSession,
        lab: &Lab,
    ) -> AppResult<()> {
        let Some(to) = recipient.email.as_deref() else {
            tracing::debug!(user_id = recipient.id, "no email address on file, skipping");
            return Ok(());
        };
        let subject = "A lab session has been cancelled";
        let reason = session
            .cancellation_reason
            .as_deref()
            .unwrap_or("No reason given");
        let body = format!(
            r#"
Hello {name},

The lab session "{title}" has been cancelled.

Lab: {lab}
From: {start}
To: {end}
Reason: {reason}
"#,
            name = recipient.full_name(),
            title = session.title,
            lab = lab.name,
            start = session.start_time.format("%Y-%m-%d %H:%M UTC"),
            end = session.end_time.format("%Y-%m-%d %H:%M UTC"),
            reason = reason,
        );

        self.send_email(to, subject, &body).await
    }

    /// Generic email sending function
    async fn send_email(&self, to: &str, subject: &str, body: &str) -> AppResult<()> {
        let from_name = self
            .config
            .smtp_from_name
            .as_deref()
            .unwrap_or("LabReserve");
        let from_mailbox = Mailbox::from_str(&format!("{} <{}>", from_name, self.config.smtp_from))
            .map_err(|e| AppError::Internal(format!("Invalid from address: {}", e)))?;

        let to_mailbox = Mailbox::from_str(to)
            .map_err(|e| AppError::Internal(format!("Invalid to address: {}", e)))?;

        let email = Message::builder()
            .from(from_mailbox)
            .to(to_mailbox)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(body.to_string()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(format!(
                                r#"<html><body><pre>{}</pre></body></html>"#,
                                body.replace('\n', "<br>")
                            )),
                    ),
            )
            .map_err(|e| AppError::Internal(format!("Failed to build email: {}", e)))?;

        let mailer_builder = if self.config.smtp_use_tls {
            SmtpTransport::starttls_relay(&self.config.smtp_host)
                .map_err(|e| AppError::Internal(format!("Failed to create SMTP transport: {}", e)))?
        } else {
            SmtpTransport::builder_dangerous(&self.config.smtp_host)
        }
        .port(self.config.smtp_port);

        let mailer_builder = if let (Some(username), Some(password)) =
            (&self.config.smtp_username, &self.config.smtp_password)
        {
            mailer_builder.credentials(Credentials::new(username.clone(), password.clone()))
        } else {
            mailer_builder
        };

        let mailer = mailer_builder.build();

        mailer
            .send(&email)
            .map_err(|e| AppError::Internal(format!("Failed to send email: {}", e)))?;

        Ok(())
    }
}
