//! Lab and computer endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{Duration, NaiveTime, Utc};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::{
    error::{AppError, AppResult},
    models::{
        lab::{Computer, Lab},
        timeslot::{availability, Timeslot, LOOKAHEAD_DAYS},
    },
};

use super::AuthenticatedUser;

/// Filter for the availability grid
#[derive(Deserialize, IntoParams)]
pub struct TimeslotQuery {
    /// Restrict the grid to one computer instead of the whole lab
    pub computer_id: Option<i32>,
}

/// List all labs
#[utoipa::path(
    get,
    path = "/labs",
    tag = "labs",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "All labs", body = Vec<Lab>)
    )
)]
pub async fn list_labs(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
) -> AppResult<Json<Vec<Lab>>> {
    let labs = state.repository.labs.list().await?;
    Ok(Json(labs))
}

/// Get a lab
#[utoipa::path(
    get,
    path = "/labs/{id}",
    tag = "labs",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Lab ID")
    ),
    responses(
        (status = 200, description = "Lab details", body = Lab),
        (status = 404, description = "Lab not found")
    )
)]
pub async fn get_lab(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<Lab>> {
    let lab = state.repository.labs.get_by_id(id).await?;
    Ok(Json(lab))
}

/// List the computers in a lab
#[utoipa::path(
    get,
    path = "/labs/{id}/computers",
    tag = "labs",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Lab ID")
    ),
    responses(
        (status = 200, description = "Computers in the lab", body = Vec<Computer>),
        (status = 404, description = "Lab not found")
    )
)]
pub async fn list_computers(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<Vec<Computer>>> {
    state.repository.labs.get_by_id(id).await?;
    let computers = state.repository.labs.list_computers(id).await?;
    Ok(Json(computers))
}

/// Hourly availability grid for the next seven days. An approved session
/// occupies the whole lab, so it blocks every computer's slots too.
#[utoipa::path(
    get,
    path = "/labs/{id}/timeslots",
    tag = "labs",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Lab ID"),
        TimeslotQuery
    ),
    responses(
        (status = 200, description = "Hourly slots over the opening hours", body = Vec<Timeslot>),
        (status = 404, description = "Lab or computer not found")
    )
)]
pub async fn list_timeslots(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Query(query): Query<TimeslotQuery>,
) -> AppResult<Json<Vec<Timeslot>>> {
    let lab = state.repository.labs.get_by_id(id).await?;

    let today = Utc::now().date_naive();
    let range_start = today.and_time(NaiveTime::MIN).and_utc();
    let range_end = range_start + Duration::days(LOOKAHEAD_DAYS);

    let mut busy = state
        .repository
        .sessions
        .approved_windows_in_range(lab.id, range_start, range_end)
        .await?;

    match query.computer_id {
        Some(computer_id) => {
            let computer = state.repository.labs.get_computer(computer_id).await?;
            if computer.lab_id != lab.id {
                return Err(AppError::NotFound(format!(
                    "Computer with id {} not found in this lab",
                    computer_id
                )));
            }
            busy.extend(
                state
                    .repository
                    .bookings
                    .approved_windows_for_computer(computer_id, range_start, range_end)
                    .await?,
            );
        }
        None => {
            busy.extend(
                state
                    .repository
                    .bookings
                    .approved_windows_in_lab(lab.id, range_start, range_end)
                    .await?,
            );
        }
    }

    Ok(Json(availability(today, LOOKAHEAD_DAYS, &busy)))
}
