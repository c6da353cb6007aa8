//! Strongly-typed ID newtypes for store-generated documents.
//!
//! Slot ids are opaque strings scoped to their schedule and live in
//! [`crate::timetable::SlotId`]; the ids here are globally unique UUIDs.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
        #[serde(transparent)]
        #[schema(value_type = String, format = "uuid")]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new random ID.
            #[inline]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            #[inline]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            #[inline]
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            #[inline]
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for Uuid {
            #[inline]
            fn from(id: $name) -> Uuid {
                id.0
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }
    };
}

define_id!(
    /// Identifies a leave request.
    LeaveId
);

define_id!(
    /// Identifies a subject document.
    SubjectId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_distinct_types_over_uuid() {
        let uuid = Uuid::new_v4();
        let leave = LeaveId::from_uuid(uuid);
        let subject = SubjectId::from(uuid);

        assert_eq!(leave.into_inner(), Uuid::from(subject));
        assert_eq!(leave.to_string(), uuid.to_string());
    }

    #[test]
    fn test_id_serializes_transparently() {
        let id: LeaveId = "67e55044-10b1-426f-9247-bb680e5fe0c8".parse().unwrap();
        assert_eq!(
            serde_json::to_string(&id).unwrap(),
            r#""67e55044-10b1-426f-9247-bb680e5fe0c8""#
        );
        assert_eq!(
            format!("{:?}", id),
            "LeaveId(67e55044-10b1-426f-9247-bb680e5fe0c8)"
        );
    }
}
