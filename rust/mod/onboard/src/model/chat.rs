use serde::{Deserialize, Serialize};

/// Who authored a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

/// One message in a fresher's chat log. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String,

    pub text: String,

    pub sender: Sender,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,

    /// RFC 3339 timestamp.
    pub timestamp: String,
}

/// Topic histogram over a fresher's recent user messages.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TopicCounts {
    pub course: usize,
    pub assignment: usize,
    pub progress: usize,
    pub technical: usize,
    pub general: usize,
}

/// Per-fresher chat usage summary.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatAnalytics {
    pub total_messages: usize,
    pub user_messages: usize,
    pub bot_messages: usize,
    pub topics: TopicCounts,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_interaction: Option<String>,
}
