pub mod analytics;
pub mod checkout;
pub mod clerk;
pub mod content;
pub mod course;
pub mod discussion;
pub mod engagement;
pub mod gamification;
pub mod learning_path;
pub mod mail;
pub mod moderation;
pub mod mux;
pub mod paystack;
pub mod progress;
pub mod quiz;
pub mod recommend;
pub mod user;
pub mod video;

#[cfg(test)]
pub mod test_utils;

pub use analytics::Analytics;
pub use checkout::Checkout;
pub use content::Content;
pub use course::Course;
pub use discussion::Discussion;
pub use engagement::Engagement;
pub use gamification::Gamification;
pub use learning_path::LearningPath;
pub use moderation::Moderation;
pub use progress::Progress;
pub use quiz::Quiz;
pub use recommend::Recommend;
pub use user::User;
pub use video::Video;
