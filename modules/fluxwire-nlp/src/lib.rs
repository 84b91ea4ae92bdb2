pub mod country;
pub mod country_data;
pub mod question;
pub mod topic;
pub mod topic_data;

pub use country::CountryTagger;
pub use question::{detect_countries_in_text, topics_in_question};
pub use topic::TopicTagger;
