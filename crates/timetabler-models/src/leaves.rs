//! Leave request models.
//!
//! Teachers and students submit leave requests; admins approve or reject them.
//! A request starts out [`LeaveStatus::Pending`] and is reviewed at most once.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::ids::LeaveId;
use crate::users::Role;
use crate::validation::not_blank;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
}

impl LeaveStatus {
    pub const ALL: [LeaveStatus; 3] = [
        LeaveStatus::Pending,
        LeaveStatus::Approved,
        LeaveStatus::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LeaveStatus::Pending => "Pending",
            LeaveStatus::Approved => "Approved",
            LeaveStatus::Rejected => "Rejected",
        }
    }
}

impl fmt::Display for LeaveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown leave status: {0}")]
pub struct UnknownLeaveStatus(pub String);

impl FromStr for LeaveStatus {
    type Err = UnknownLeaveStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LeaveStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownLeaveStatus(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Leave {
    pub id: LeaveId,
    pub user_id: String,
    pub name: String,
    pub role: Role,
    pub reason: String,
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
    pub status: LeaveStatus,
    pub applied_at: DateTime<Utc>,
}

impl Leave {
    pub fn pending(user_id: String, name: String, role: Role, dto: ApplyLeaveDto) -> Self {
        Self {
            id: LeaveId::new(),
            user_id,
            name,
            role,
            reason: dto.reason.trim().to_string(),
            from_date: dto.from_date,
            to_date: dto.to_date,
            status: LeaveStatus::Pending,
            applied_at: Utc::now(),
        }
    }
}

fn validate_leave_dates(dto: &ApplyLeaveDto) -> Result<(), ValidationError> {
    if dto.to_date < dto.from_date {
        return Err(ValidationError::new("date_range")
            .with_message("toDate must not be before fromDate".into()));
    }
    Ok(())
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_leave_dates"))]
pub struct ApplyLeaveDto {
    #[validate(custom(function = "not_blank", message = "reason is required"))]
    pub reason: String,
    #[schema(example = "2025-03-10")]
    pub from_date: NaiveDate,
    #[schema(example = "2025-03-12")]
    pub to_date: NaiveDate,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ReviewLeaveDto {
    pub status: LeaveStatus,
}
