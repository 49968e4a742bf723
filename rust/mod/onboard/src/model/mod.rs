mod chat;
mod course;
mod department;
mod fresher;
mod login;
mod task;

pub use chat::{ChatAnalytics, ChatMessage, Sender, TopicCounts};
pub use course::{
    AssignOutcome, AssignTarget, Course, CourseDraft, CourseStatus, Lecture, LectureDraft,
};
pub use department::{CreateDepartment, Department};
pub use fresher::{CsvImportReport, Fresher, ImportFailure, ImportSuccess, NewFresher, Provisioned};
pub use login::{LoginLogEntry, LoginResponse};
pub use task::AssessmentTask;
