use crate::error::ThreadError;
use crate::models::Thread;
use crate::store::ThreadStore;
use crate::sync::RefreshLocks;
use futures::future::try_join_all;
use std::collections::BTreeSet;
use tracing::{debug, warn};

/// Recompute the thread's labels and folders as the union over its messages
/// and persist them.
///
/// Nothing is written unless every message's labels could be read. A thread
/// without messages ends up with no labels and no folders.
///
/// Two refreshes of the same thread may race; the last replace wins. Use
/// [`refresh_membership_serialized`] when callers can overlap.
pub async fn refresh_membership<S>(store: &S, mut thread: Thread) -> Result<Thread, ThreadError>
where
    S: ThreadStore + ?Sized,
{
    let messages = store.list_messages(&thread.id).await?;

    let per_message = try_join_all(messages.iter().map(|msg| async move {
        let label_ids = store.list_label_ids(&msg.id).await?;
        Ok::<_, ThreadError>((label_ids, msg.folder_id.clone()))
    }))
    .await
    .inspect_err(|e| warn!(thread_id = %thread.id, error = %e, "failed to fetch message labels"))?;

    let mut label_ids = BTreeSet::new();
    let mut folder_ids = BTreeSet::new();
    for (labels, folder_id) in per_message {
        label_ids.extend(labels);
        folder_ids.insert(folder_id);
    }

    let labels: Vec<String> = label_ids.iter().cloned().collect();
    let folders: Vec<String> = folder_ids.iter().cloned().collect();
    futures::try_join!(
        store.replace_labels(&thread.id, &labels),
        store.replace_folders(&thread.id, &folders),
    )?;

    thread.label_ids = label_ids;
    thread.folder_ids = folder_ids;
    thread.version += 1;
    store.save(&thread).await?;

    debug!(
        thread_id = %thread.id,
        messages = messages.len(),
        labels = thread.label_ids.len(),
        folders = thread.folder_ids.len(),
        "refreshed thread membership"
    );

    Ok(thread)
}

/// [`refresh_membership`] run under the thread's entry in `locks`, so that
/// overlapping refreshes of one thread apply one after another.
pub async fn refresh_membership_serialized<S>(
    store: &S,
    locks: &RefreshLocks,
    thread: Thread,
) -> Result<Thread, ThreadError>
where
    S: ThreadStore + ?Sized,
{
    let _guard = locks.acquire(&thread.id).await;
    refresh_membership(store, thread).await
}
