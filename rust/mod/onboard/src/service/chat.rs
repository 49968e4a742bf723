use tracing::warn;

use hexaboard_core::{new_id, now_rfc3339};
use hexaboard_doc::OrderBy;

use crate::model::{
    ChatAnalytics, ChatMessage, Course, CourseStatus, Department, Fresher, Sender, TopicCounts,
};
use crate::service::{OnboardError, OnboardService};

/// Reply sent when the generative backend is unreachable. The chat
/// never surfaces backend failures to the fresher.
const FALLBACK_APOLOGY: &str =
    "I'm having trouble connecting to the assistant right now. Please try again in a moment, \
     or contact support if the issue persists.";

/// Coarse topic of a user message, for the analytics histogram.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Topic {
    Course,
    Assignment,
    Progress,
    Technical,
    General,
}

pub(crate) fn classify_topic(text: &str) -> Topic {
    let text = text.to_lowercase();
    let has = |words: &[&str]| words.iter().any(|w| text.contains(w));
    if has(&["course", "lesson", "module"]) {
        Topic::Course
    } else if has(&["assignment", "homework"]) {
        Topic::Assignment
    } else if has(&["progress", "performance"]) {
        Topic::Progress
    } else if has(&["error", "problem", "issue"]) {
        Topic::Technical
    } else {
        Topic::General
    }
}

fn average_progress(courses: &[Course]) -> u32 {
    if courses.is_empty() {
        return 0;
    }
    let total: u32 = courses.iter().map(|c| c.progress).sum();
    (f64::from(total) / courses.len() as f64).round() as u32
}

/// Scripted response rules, evaluated in order. Returns None when no
/// rule matches, which sends the message to the generative fallback.
fn scripted_reply(
    courses: &[Course],
    department: Option<&Department>,
    message: &str,
) -> Option<String> {
    let text = message.to_lowercase();
    let has = |words: &[&str]| words.iter().any(|w| text.contains(w));

    let active: Vec<&Course> = courses
        .iter()
        .filter(|c| c.status == CourseStatus::Active)
        .collect();
    let completed_count = courses
        .iter()
        .filter(|c| c.status == CourseStatus::Completed)
        .count();

    if has(&["course", "lesson", "module"]) {
        if courses.is_empty() {
            return Some(
                "You don't have any courses assigned yet. Please contact your administrator \
                 to get started with your learning journey!"
                    .to_string(),
            );
        }

        if has(&["progress", "how much"]) {
            return Some(format!(
                "You have {} courses total. {} are active and {} are completed. Your average \
                 progress across all courses is {}%. Keep up the great work!",
                courses.len(),
                active.len(),
                completed_count,
                average_progress(courses),
            ));
        }

        if has(&["active", "current"]) {
            if active.is_empty() {
                return Some(
                    "You don't have any active courses at the moment. All your courses are \
                     completed."
                        .to_string(),
                );
            }
            let list = active
                .iter()
                .map(|c| format!("- {} ({}% complete)", c.title, c.progress))
                .collect::<Vec<_>>()
                .join("\n");
            return Some(format!(
                "Here are your active courses:\n{}\n\nYou can continue learning in the \
                 \"My Courses\" section!",
                list
            ));
        }

        return Some(format!(
            "You have {} courses assigned. {} are currently active. You can view all your \
             courses in the \"My Courses\" tab and track your progress there.",
            courses.len(),
            active.len(),
        ));
    }

    if has(&["assignment", "homework", "task"]) {
        let pending = active.iter().filter(|c| c.progress < 100).count();
        if pending == 0 {
            return Some(
                "Great news! You don't have any pending assignments. All your active courses \
                 are up to date."
                    .to_string(),
            );
        }
        return Some(format!(
            "You have {} courses with pending work. Check your \"My Courses\" section to see \
             which lessons need to be completed.",
            pending
        ));
    }

    if has(&["progress", "performance", "how am i doing"]) {
        if courses.is_empty() {
            return Some(
                "I don't have enough data to show your progress yet. Start completing lessons \
                 and I'll be able to track your learning journey!"
                    .to_string(),
            );
        }
        return Some(format!(
            "Your average progress across {} courses is {}%. You're making steady progress. \
             Keep up the consistent learning!",
            courses.len(),
            average_progress(courses),
        ));
    }

    if let Some(dept) = department {
        if has(&["department", "team"]) {
            let about = if dept.description.is_empty() {
                "This department focuses on specialized training and development.".to_string()
            } else {
                dept.description.clone()
            };
            return Some(format!("You're part of the {} department. {}", dept.name, about));
        }
    }

    if has(&["help", "what can you do"]) {
        return Some(
            "I'm your learning assistant! Ask me about your courses, assignments, progress, \
             or your department, and I'll do my best to help."
                .to_string(),
        );
    }

    None
}

impl OnboardService {
    fn save_message(
        &self,
        fresher_id: &str,
        text: &str,
        sender: Sender,
        user_name: Option<String>,
    ) -> Result<ChatMessage, OnboardError> {
        let message = ChatMessage {
            id: new_id(),
            text: text.to_string(),
            sender,
            user_name,
            timestamp: now_rfc3339(),
        };
        self.create_doc(&Self::chat_of(fresher_id), &message.id, &message)?;
        Ok(message)
    }

    /// Handle one chat message: persist it, answer from the scripted
    /// rules where one matches, otherwise fall back to the generative
    /// backend, degrading to a canned apology on any backend error.
    pub async fn chat_reply(
        &self,
        fresher_id: &str,
        message: &str,
    ) -> Result<ChatMessage, OnboardError> {
        if message.trim().is_empty() {
            return Err(OnboardError::Validation("message is required".into()));
        }

        let fresher: Fresher = self.get_doc("users", fresher_id)?;
        self.save_message(fresher_id, message, Sender::User, Some(fresher.name.clone()))?;

        let courses = self.courses_for_fresher(fresher_id)?;
        let department = match &fresher.department_id {
            Some(id) => self.try_get_doc::<Department>("departments", id)?,
            None => None,
        };

        let reply = match scripted_reply(&courses, department.as_ref(), message) {
            Some(reply) => reply,
            None => match self.completer.complete(message).await {
                Ok(text) => text,
                Err(e) => {
                    warn!(fresher_id, error = %e, "text backend unavailable, sending apology");
                    FALLBACK_APOLOGY.to_string()
                }
            },
        };

        self.save_message(fresher_id, &reply, Sender::Bot, None)
    }

    /// The most recent `limit` messages, returned oldest first.
    pub fn chat_history(
        &self,
        fresher_id: &str,
        limit: usize,
    ) -> Result<Vec<ChatMessage>, OnboardError> {
        let mut messages: Vec<ChatMessage> = self.query_docs(
            &Self::chat_of(fresher_id),
            &[],
            Some(&OrderBy::desc("timestamp")),
            Some(limit),
        )?;
        messages.reverse();
        Ok(messages)
    }

    /// Usage summary over the fresher's recent messages.
    pub fn chat_analytics(&self, fresher_id: &str) -> Result<ChatAnalytics, OnboardError> {
        let messages = self.chat_history(fresher_id, self.config.analytics_window)?;

        let mut topics = TopicCounts::default();
        let mut user_messages = 0;
        let mut bot_messages = 0;
        for message in &messages {
            match message.sender {
                Sender::User => {
                    user_messages += 1;
                    match classify_topic(&message.text) {
                        Topic::Course => topics.course += 1,
                        Topic::Assignment => topics.assignment += 1,
                        Topic::Progress => topics.progress += 1,
                        Topic::Technical => topics.technical += 1,
                        Topic::General => topics.general += 1,
                    }
                }
                Sender::Bot => bot_messages += 1,
            }
        }

        Ok(ChatAnalytics {
            total_messages: messages.len(),
            user_messages,
            bot_messages,
            topics,
            last_interaction: messages.last().map(|m| m.timestamp.clone()),
        })
    }

    /// Learning tips derived from the fresher's course state.
    pub fn learning_tips(&self, fresher_id: &str) -> Result<Vec<String>, OnboardError> {
        let courses = self.courses_for_fresher(fresher_id)?;
        let mut tips = Vec::new();

        if courses.is_empty() {
            tips.push("Start by exploring your assigned courses in the 'My Courses' section.".to_string());
        } else {
            let active: Vec<&Course> = courses
                .iter()
                .filter(|c| c.status == CourseStatus::Active)
                .collect();
            let low_progress = active.iter().filter(|c| c.progress < 30).count();

            if low_progress > 0 {
                tips.push(format!(
                    "Focus on completing one course at a time. You have {} courses with low progress.",
                    low_progress
                ));
            }
            if active.len() > 3 {
                tips.push(
                    "You have many active courses. Consider focusing on 2-3 courses at a time \
                     for better retention."
                        .to_string(),
                );
            }
            if average_progress(&courses) > 80 {
                tips.push(
                    "Excellent progress! Keep up the great work and consider helping others in \
                     your department."
                        .to_string(),
                );
            }
        }

        if tips.is_empty() {
            tips.push(
                "Maintain a consistent learning schedule and take regular breaks to improve \
                 retention."
                    .to_string(),
            );
        }
        Ok(tips)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AssignTarget;
    use crate::service::course::tests::{draft, provision};
    use crate::service::testutil::{StubCompleter, test_env, test_env_with_completer};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_scripted_course_reply_uses_course_state() {
        let env = test_env();
        let id = provision(&env, "ana@x.com", "QA");
        env.svc
            .assign_course(&draft(3), &AssignTarget::Individual { fresher_id: id.clone() })
            .unwrap();
        env.svc
            .assign_course(&draft(3), &AssignTarget::Individual { fresher_id: id.clone() })
            .unwrap();

        let reply = env.svc.chat_reply(&id, "How are my courses going?").await.unwrap();
        assert_eq!(reply.sender, Sender::Bot);
        assert!(reply.text.contains("2 courses assigned"));

        // Both messages persisted: user + bot.
        let history = env.svc.chat_history(&id, 50).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].sender, Sender::User);
        assert_eq!(history[1].sender, Sender::Bot);
    }

    #[tokio::test]
    async fn test_unmatched_message_falls_back_to_completer() {
        let env = test_env_with_completer(Arc::new(StubCompleter {
            reply: "backend says hi".into(),
            fail: false,
        }));
        let id = provision(&env, "ana@x.com", "QA");
        let reply = env.svc.chat_reply(&id, "tell me a joke").await.unwrap();
        assert_eq!(reply.text, "backend says hi");
    }

    #[tokio::test]
    async fn test_backend_failure_degrades_to_apology() {
        let env = test_env_with_completer(Arc::new(StubCompleter {
            reply: String::new(),
            fail: true,
        }));
        let id = provision(&env, "ana@x.com", "QA");
        let reply = env.svc.chat_reply(&id, "tell me a joke").await.unwrap();
        assert!(reply.text.contains("trouble connecting"));
    }

    #[tokio::test]
    async fn test_department_reply() {
        let env = test_env();
        let id = provision(&env, "ana@x.com", "QA");
        let reply = env.svc.chat_reply(&id, "what team am I in?").await.unwrap();
        assert!(reply.text.contains("QA"));
    }

    #[tokio::test]
    async fn test_analytics_classifies_topics() {
        let env = test_env();
        let id = provision(&env, "ana@x.com", "QA");
        for message in [
            "how is my course going",
            "any homework for me?",
            "I hit an error in the player",
            "hello there",
        ] {
            env.svc.chat_reply(&id, message).await.unwrap();
        }

        let analytics = env.svc.chat_analytics(&id).unwrap();
        assert_eq!(analytics.user_messages, 4);
        assert_eq!(analytics.bot_messages, 4);
        assert_eq!(analytics.total_messages, 8);
        assert_eq!(analytics.topics.course, 1);
        assert_eq!(analytics.topics.assignment, 1);
        assert_eq!(analytics.topics.technical, 1);
        assert_eq!(analytics.topics.general, 1);
        assert!(analytics.last_interaction.is_some());
    }

    #[test]
    fn test_classify_topic() {
        assert_eq!(classify_topic("my COURSE is stuck"), Topic::Course);
        assert_eq!(classify_topic("homework due?"), Topic::Assignment);
        assert_eq!(classify_topic("my progress?"), Topic::Progress);
        assert_eq!(classify_topic("there is a problem"), Topic::Technical);
        assert_eq!(classify_topic("hi"), Topic::General);
    }

    #[test]
    fn test_learning_tips_reflect_course_state() {
        let env = test_env();
        let id = provision(&env, "ana@x.com", "QA");

        let tips = env.svc.learning_tips(&id).unwrap();
        assert!(tips[0].contains("Start by exploring"));

        env.svc
            .assign_course(&draft(3), &AssignTarget::Individual { fresher_id: id.clone() })
            .unwrap();
        let tips = env.svc.learning_tips(&id).unwrap();
        assert!(tips.iter().any(|t| t.contains("low progress")));
    }
}
