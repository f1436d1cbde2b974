//! Notification fan-out

use crate::{
    error::AppResult,
    models::notification::{Notification, NotificationKind, NotificationRefs},
    repository::Repository,
};

/// Merge lab admins and super admins into one recipient list, deduplicated
/// so an admin who is both gets a single notification.
pub fn resolve_recipients(lab_admin_ids: &[i32], super_admin_ids: &[i32]) -> Vec<i32> {
    let mut ids: Vec<i32> = lab_admin_ids
        .iter()
        .chain(super_admin_ids.iter())
        .copied()
        .collect();
    ids.sort_unstable();
    ids.dedup();
    ids
}

#[derive(Clone)]
pub struct NotificationService {
    repository: Repository,
}

impl NotificationService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Create a notification for one user. Delivery is best-effort: a
    /// failure is logged and never fails the transition that triggered it.
    pub async fn notify_user(
        &self,
        user_id: i32,
        message: &str,
        kind: NotificationKind,
        refs: NotificationRefs,
    ) {
        if let Err(e) = self
            .repository
            .notifications
            .create(user_id, message, kind, refs)
            .await
        {
            tracing::warn!(user_id, error = %e, "failed to create notification");
        }
    }

    /// Fan a notification out to every admin responsible for a lab
    /// (lab admins plus super admins, deduplicated)
    pub async fn notify_lab_admins(
        &self,
        lab_id: i32,
        message: &str,
        kind: NotificationKind,
        refs: NotificationRefs,
    ) {
        let lab_admins = match self.repository.users.lab_admin_ids(lab_id).await {
            Ok(ids) => ids,
            Err(e) => {
                tracing::warn!(lab_id, error = %e, "failed to resolve lab admins");
                return;
            }
        };
        let super_admins = match self.repository.users.super_admin_ids().await {
            Ok(ids) => ids,
            Err(e) => {
                tracing::warn!(error = %e, "failed to resolve super admins");
                return;
            }
        };

        for user_id in resolve_recipients(&lab_admins, &super_admins) {
            self.notify_user(user_id, message, kind, refs).await;
        }
    }

    /// Notifications for a user, newest first
    pub async fn list_for_user(&self, user_id: i32) -> AppResult<Vec<Notification>> {
        self.repository.notifications.list_for_user(user_id).await
    }

    /// Unread notification count
    pub async fn unread_count(&self, user_id: i32) -> AppResult<i64> {
        self.repository.notifications.unread_count(user_id).await
    }

    /// Mark all of a user's notifications as read
    pub async fn mark_all_read(&self, user_id: i32) -> AppResult<u64> {
        self.repository.notifications.mark_all_read(user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recipients_are_deduplicated() {
        let recipients = resolve_recipients(&[3, 1, 7], &[7, 2]);
        assert_eq!(recipients, vec![1, 2, 3, 7]);
    }

    #[test]
    fn empty_admin_lists_yield_no_recipients() {
        assert!(resolve_recipients(&[], &[]).is_empty());
    }

    #[test]
    fn super_admins_alone_are_enough() {
        assert_eq!(resolve_recipients(&[], &[5, 5, 4]), vec![4, 5]);
    }
}
