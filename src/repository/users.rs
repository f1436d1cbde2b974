//! Users repository for database operations

use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::user::User,
};

#[derive(Clone)]
pub struct UsersRepository {
    pool: Pool<Postgres>,
}

impl UsersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get user by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<User> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))
    }

    /// Get a student by ID, failing if the user is not a student
    pub async fn get_student(&self, id: i32) -> AppResult<User> {
        let user = self.get_by_id(id).await?;
        if !user.is_student {
            return Err(AppError::NotFound(format!(
                "Student with id {} not found",
                id
            )));
        }
        Ok(user)
    }

    /// IDs of admins managing a specific lab
    pub async fn lab_admin_ids(&self, lab_id: i32) -> AppResult<Vec<i32>> {
        let ids: Vec<i32> = sqlx::query_scalar(
            "SELECT user_id FROM lab_admins WHERE lab_id = $1",
        )
        .bind(lab_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }

    /// IDs of super admins (authorized across all labs)
    pub async fn super_admin_ids(&self) -> AppResult<Vec<i32>> {
        let ids: Vec<i32> = sqlx::query_scalar(
            "SELECT id FROM users WHERE is_super_admin = TRUE",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }

    /// Whether the user manages the given lab
    pub async fn manages_lab(&self, user_id: i32, lab_id: i32) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM lab_admins WHERE user_id = $1 AND lab_id = $2)",
        )
        .bind(user_id)
        .bind(lab_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }
}
