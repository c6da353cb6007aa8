use serde::Serialize;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, ToSchema};

use timetabler_models::{
    ApplyLeaveDto, Booking, ConflictReport, CreateSlotDto, CreateSubjectDto, Day, Leave,
    LeaveStatus, ReviewLeaveDto, Role, Schedule, Slot, SlotId, Subject, SubjectList,
    SubjectSource, SubjectType,
};

/// Error body returned by every endpoint. Conflicts add a `conflict` object.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::modules::timetable::controller::get_schedule,
        crate::modules::timetable::controller::add_slot,
        crate::modules::timetable::controller::remove_slot,
        crate::modules::timetable::controller::get_conflicts,
        crate::modules::timetable::controller::stream_schedule,
        crate::modules::subjects::controller::list_subjects,
        crate::modules::subjects::controller::create_subject,
        crate::modules::leaves::controller::apply_leave,
        crate::modules::leaves::controller::list_leaves,
        crate::modules::leaves::controller::list_my_leaves,
        crate::modules::leaves::controller::review_leave,
        crate::modules::leaves::controller::delete_leave,
        crate::modules::leaves::controller::stream_leaves,
    ),
    components(
        schemas(
            Day,
            Slot,
            SlotId,
            Schedule,
            CreateSlotDto,
            Booking,
            ConflictReport,
            Subject,
            SubjectType,
            SubjectSource,
            SubjectList,
            CreateSubjectDto,
            Leave,
            LeaveStatus,
            ApplyLeaveDto,
            ReviewLeaveDto,
            Role,
            ErrorResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Timetable", description = "Weekly class schedules with teacher conflict checks"),
        (name = "Subjects", description = "Subject reference data"),
        (name = "Leaves", description = "Leave requests and reviews")
    ),
    info(
        title = "Timetabler API",
        version = "0.1.0",
        description = "Department timetable service: conflict-checked slot editing, subjects and leave requests.",
        license(
            name = "MIT"
        )
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            )
        }
    }
}
