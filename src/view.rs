//! External representation of a thread, as handed to the API layer.

use crate::error::{Association, ThreadError};
use crate::models::{Folder, Label, Message, Thread};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How much of each message a projection carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetailLevel {
    /// Only message identifiers.
    #[default]
    Ids,
    /// Full message records.
    Expanded,
}

impl DetailLevel {
    /// Guess the detail level from loaded data: messages were fully hydrated
    /// if the first one carries its account id. Use this only when the loader
    /// did not say which level it produced.
    pub fn infer(messages: &[Message]) -> Self {
        match messages.first() {
            Some(first) if first.account_id.as_deref().is_some_and(|a| !a.is_empty()) => {
                DetailLevel::Expanded
            }
            _ => DetailLevel::Ids,
        }
    }
}

/// A thread together with its associations. `None` means the association
/// was never loaded, which is distinct from loaded-but-empty.
#[derive(Debug, Clone, Default)]
pub struct HydratedThread {
    pub thread: Thread,
    pub folders: Option<Vec<Folder>>,
    pub labels: Option<Vec<Label>>,
    pub messages: Option<Vec<Message>>,
    pub detail: DetailLevel,
}

impl HydratedThread {
    /// Wrap associations produced by a loader that does not report its
    /// detail level; the level is inferred from the messages.
    pub fn from_loaded(
        thread: Thread,
        folders: Vec<Folder>,
        labels: Vec<Label>,
        messages: Vec<Message>,
    ) -> Self {
        Self {
            detail: DetailLevel::infer(&messages),
            thread,
            folders: Some(folders),
            labels: Some(labels),
            messages: Some(messages),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ThreadMessages {
    Messages(Vec<Message>),
    MessageIds(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThreadRecord {
    pub id: String,
    pub object: &'static str,
    pub folders: Vec<Folder>,
    pub labels: Vec<Label>,
    pub account_id: String,
    pub participants: Vec<serde_json::Value>,
    pub subject: Option<String>,
    pub snippet: Option<String>,
    pub unread: bool,
    pub starred: bool,
    pub last_message_timestamp: Option<f64>,
    pub last_message_sent_timestamp: Option<f64>,
    pub last_message_received_timestamp: Option<f64>,
    #[serde(flatten)]
    pub messages: ThreadMessages,
}

pub fn project(hydrated: HydratedThread) -> Result<ThreadRecord, ThreadError> {
    let HydratedThread {
        thread,
        folders,
        labels,
        messages,
        detail,
    } = hydrated;

    let missing = |association| ThreadError::DataNotLoaded {
        thread_id: thread.id.clone(),
        association,
    };
    let labels = labels.ok_or_else(|| missing(Association::Labels))?;
    let folders = folders.ok_or_else(|| missing(Association::Folders))?;
    let messages = messages.ok_or_else(|| missing(Association::Messages))?;

    let messages = match detail {
        DetailLevel::Expanded => ThreadMessages::Messages(messages),
        DetailLevel::Ids => {
            ThreadMessages::MessageIds(messages.into_iter().map(|m| m.id).collect())
        }
    };

    Ok(ThreadRecord {
        id: thread.id,
        object: "thread",
        folders,
        labels,
        account_id: thread.account_id,
        participants: thread.participants,
        subject: thread.subject,
        snippet: thread.snippet,
        unread: thread.unread_count > 0,
        starred: thread.starred_count > 0,
        last_message_timestamp: epoch_seconds(thread.last_message_date),
        last_message_sent_timestamp: epoch_seconds(thread.last_message_sent_date),
        last_message_received_timestamp: epoch_seconds(thread.last_message_received_date),
        messages,
    })
}

fn epoch_seconds(date: Option<DateTime<Utc>>) -> Option<f64> {
    date.map(|d| d.timestamp_millis() as f64 / 1000.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn message(id: &str, account_id: Option<&str>) -> Message {
        Message {
            id: id.to_string(),
            account_id: account_id.map(str::to_string),
            thread_id: "t1".to_string(),
            folder_id: "f-inbox".to_string(),
            ..Default::default()
        }
    }

    fn hydrated(messages: Vec<Message>, detail: DetailLevel) -> HydratedThread {
        HydratedThread {
            thread: Thread {
                id: "t1".to_string(),
                account_id: "acct".to_string(),
                subject: Some("Lunch?".to_string()),
                participants: vec![json!({"name": "Ada", "email": "ada@example.com"})],
                ..Default::default()
            },
            folders: Some(vec![Folder {
                id: "f-inbox".to_string(),
                account_id: "acct".to_string(),
                name: "INBOX".to_string(),
                role: Some("inbox".to_string()),
            }]),
            labels: Some(Vec::new()),
            messages: Some(messages),
            detail,
        }
    }

    #[rstest]
    #[case::folders(Association::Folders)]
    #[case::labels(Association::Labels)]
    #[case::messages(Association::Messages)]
    fn projection_requires_loaded_association(#[case] association: Association) {
        let mut input = hydrated(vec![message("m1", None)], DetailLevel::Ids);
        match association {
            Association::Folders => input.folders = None,
            Association::Labels => input.labels = None,
            Association::Messages => input.messages = None,
        }

        match project(input) {
            Err(ThreadError::DataNotLoaded {
                thread_id,
                association: missing,
            }) => {
                assert_eq!(thread_id, "t1");
                assert_eq!(missing, association);
            }
            other => panic!("expected DataNotLoaded, got {other:?}"),
        }
    }

    #[test]
    fn expanded_projection_carries_full_messages() {
        let messages = vec![message("m1", Some("acct")), message("m2", Some("acct"))];
        let record = project(hydrated(messages.clone(), DetailLevel::Expanded)).unwrap();
        assert_eq!(record.messages, ThreadMessages::Messages(messages));

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["messages"][1]["id"], "m2");
        assert!(value.get("message_ids").is_none());
    }

    #[test]
    fn id_projection_lists_ids_in_loaded_order() {
        let messages = vec![message("m3", None), message("m1", None), message("m2", None)];
        let value = serde_json::to_value(project(hydrated(messages, DetailLevel::Ids)).unwrap())
            .unwrap();

        assert_eq!(value["message_ids"], json!(["m3", "m1", "m2"]));
        assert!(value.get("messages").is_none());
    }

    #[test]
    fn empty_thread_projects_empty_id_list() {
        let value = serde_json::to_value(project(hydrated(Vec::new(), DetailLevel::Ids)).unwrap())
            .unwrap();
        assert_eq!(value["message_ids"], json!([]));
    }

    #[test]
    fn record_has_wire_field_names() {
        let mut input = hydrated(Vec::new(), DetailLevel::Ids);
        input.thread.last_message_date = DateTime::from_timestamp_millis(1_000_000);
        input.thread.last_message_sent_date = DateTime::from_timestamp_millis(1_500);

        let value = serde_json::to_value(project(input).unwrap()).unwrap();
        assert_eq!(value["id"], "t1");
        assert_eq!(value["object"], "thread");
        assert_eq!(value["account_id"], "acct");
        assert_eq!(value["subject"], "Lunch?");
        assert_eq!(value["snippet"], json!(null));
        assert_eq!(value["participants"][0]["email"], "ada@example.com");
        assert_eq!(value["folders"][0]["name"], "INBOX");
        assert_eq!(value["labels"], json!([]));
        assert_eq!(value["last_message_timestamp"], json!(1000.0));
        assert_eq!(value["last_message_sent_timestamp"], json!(1.5));
        assert_eq!(value["last_message_received_timestamp"], json!(null));
    }

    #[rstest]
    #[case(0, false)]
    #[case(1, true)]
    #[case(3, true)]
    fn unread_and_starred_follow_counts(#[case] count: u32, #[case] expected: bool) {
        let mut input = hydrated(Vec::new(), DetailLevel::Ids);
        input.thread.unread_count = count;
        input.thread.starred_count = count;

        let record = project(input).unwrap();
        assert_eq!(record.unread, expected);
        assert_eq!(record.starred, expected);
    }

    #[test]
    fn infer_detects_hydrated_messages() {
        assert_eq!(DetailLevel::infer(&[]), DetailLevel::Ids);
        assert_eq!(
            DetailLevel::infer(&[message("m1", None), message("m2", Some("acct"))]),
            DetailLevel::Ids
        );
        assert_eq!(
            DetailLevel::infer(&[message("m1", Some(""))]),
            DetailLevel::Ids
        );
        assert_eq!(
            DetailLevel::infer(&[message("m1", Some("acct"))]),
            DetailLevel::Expanded
        );
    }

    #[test]
    fn from_loaded_expands_hydrated_messages() {
        let record = project(HydratedThread::from_loaded(
            Thread::default(),
            Vec::new(),
            Vec::new(),
            vec![message("m1", Some("acct"))],
        ))
        .unwrap();
        assert!(matches!(record.messages, ThreadMessages::Messages(ref m) if m.len() == 1));

        let record = project(HydratedThread::from_loaded(
            Thread::default(),
            Vec::new(),
            Vec::new(),
            vec![message("m1", None)],
        ))
        .unwrap();
        assert_eq!(record.messages, ThreadMessages::MessageIds(vec!["m1".to_string()]));
    }
}
