use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Label {
    pub id: String,
    pub account_id: String,
    pub name: String,
    pub role: Option<String>, // 'inbox', 'sent', ... for system labels
    #[serde(default)]
    pub display_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Folder {
    pub id: String,
    pub account_id: String,
    pub name: String,
    pub role: Option<String>,
}

/// A single message. When only identifiers were loaded, `account_id` and the
/// body/metadata fields are left empty.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub account_id: Option<String>,
    pub thread_id: String,
    pub folder_id: String,
    pub subject: Option<String>,
    pub snippet: Option<String>,
    pub from_address: Option<String>,
    pub to_address: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub body: Option<String>,
    pub unread: bool,
    pub starred: bool,
}

/// A conversation. `label_ids` and `folder_ids` are derived from the member
/// messages by `membership::refresh_membership`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Thread {
    pub id: String,
    pub account_id: String,
    pub version: i64,
    pub remote_thread_id: Option<String>,
    pub subject: Option<String>,
    pub snippet: Option<String>,
    pub unread_count: u32,
    pub starred_count: u32,
    pub first_message_date: Option<DateTime<Utc>>,
    pub last_message_date: Option<DateTime<Utc>>,
    pub last_message_received_date: Option<DateTime<Utc>>,
    pub last_message_sent_date: Option<DateTime<Utc>>,
    pub participants: Vec<serde_json::Value>,
    #[serde(default)]
    pub label_ids: BTreeSet<String>,
    #[serde(default)]
    pub folder_ids: BTreeSet<String>,
}
