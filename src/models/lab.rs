//! Lab and computer models

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Computer operational status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[repr(i16)]
pub enum ComputerStatus {
    Available = 0,
    Maintenance = 1,
    Reserved = 2,
}

impl From<i16> for ComputerStatus {
    fn from(v: i16) -> Self {
        match v {
            1 => ComputerStatus::Maintenance,
            2 => ComputerStatus::Reserved,
            _ => ComputerStatus::Available,
        }
    }
}

impl From<ComputerStatus> for i16 {
    fn from(s: ComputerStatus) -> Self {
        s as i16
    }
}

impl std::fmt::Display for ComputerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ComputerStatus::Available => "Available",
            ComputerStatus::Maintenance => "Under Maintenance",
            ComputerStatus::Reserved => "Reserved",
        };
        write!(f, "{}", label)
    }
}

/// A computer lab. Owns its computers; deleting a lab cascades.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Lab {
    pub id: i32,
    pub name: String,
    pub location: String,
    pub description: Option<String>,
    /// Total number of computers in the lab
    pub capacity: i32,
}

/// A single workstation, unique per (lab, computer_number)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Computer {
    pub id: i32,
    pub lab_id: i32,
    pub computer_number: i32,
    pub specs: Option<String>,
    pub status: ComputerStatus,
}

impl Computer {
    /// Display label matching notification/email copy, e.g. "Lab A - Computer #3"
    pub fn label(&self, lab_name: &str) -> String {
        format!("{} - Computer #{}", lab_name, self.computer_number)
    }
}
