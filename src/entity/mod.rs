pub mod chapter;
pub mod course;
pub mod course_like;
pub mod daily_watch_time;
pub mod learning_path;
pub mod learning_path_course;
pub mod lesson;
pub mod lesson_answer;
pub mod lesson_question;
pub mod mux_data;
pub mod note;
pub mod payment_reference;
pub mod point_transaction;
pub mod purchase;
pub mod quiz_attempt;
pub mod quiz_question;
pub mod review;
pub mod user;
pub mod user_learning_path;
pub mod user_progress;
pub mod wishlist;

pub use course::CourseStatus;
pub use lesson::LessonType;
pub use point_transaction::PointReason;
pub use user::{UserRole, UserStatus};
