//! 学習進捗の記録

pub mod session;
pub mod study_log;

pub use session::SessionManager;
pub use study_log::{StudyLog, TimeBreakdown};
