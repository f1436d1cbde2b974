//! Labs and computers repository

use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::lab::{Computer, Lab},
};

#[derive(Clone)]
pub struct LabsRepository {
    pool: Pool<Postgres>,
}

impl LabsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// List all labs
    pub async fn list(&self) -> AppResult<Vec<Lab>> {
        let labs = sqlx::query_as::<_, Lab>("SELECT * FROM labs ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        Ok(labs)
    }

    /// Get lab by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Lab> {
        sqlx::query_as::<_, Lab>("SELECT * FROM labs WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Lab with id {} not found", id)))
    }

    /// Get computer by ID
    pub async fn get_computer(&self, id: i32) -> AppResult<Computer> {
        sqlx::query_as::<_, Computer>("SELECT * FROM computers WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Computer with id {} not found", id)))
    }

    /// List computers in a lab
    pub async fn list_computers(&self, lab_id: i32) -> AppResult<Vec<Computer>> {
        let computers = sqlx::query_as::<_, Computer>(
            "SELECT * FROM computers WHERE lab_id = $1 ORDER BY computer_number",
        )
        .bind(lab_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(computers)
    }

    /// Number of computers in a lab
    pub async fn computer_count(&self, lab_id: i32) -> AppResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM computers WHERE lab_id = $1")
                .bind(lab_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }
}
