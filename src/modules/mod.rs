pub mod leaves;
pub mod subjects;
pub mod timetable;
