/// Database models
///
/// One module per table, each owning its row struct, its `CreateX`/`UpdateX`
/// input structs, and its queries:
///
/// - `user`: login accounts with roles (admin/teacher/student)
/// - `student`: roster rows owning attendance records
/// - `subject`: taught subjects with an owning teacher
/// - `attendance`: per-day attendance marks, upserts, and report aggregation
/// - `page`: pagination parameters and the list-response envelope
pub mod attendance;
pub mod page;
pub mod student;
pub mod subject;
pub mod user;
