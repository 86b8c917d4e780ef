//! Chat Session Adapter: one append-only conversation per analyzed candidate.
//!
//! A turn is a pending/settled pair: the user message is appended and the
//! entry marked `awaiting_reply` in one write, then exactly one assistant
//! message (model text or the fixed fallback) settles it. The model call runs
//! in its own task so a dropped request cannot leave a turn unanswered.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::chat::ChatMessage;
use crate::pipeline::model_service::CandidateChat;
use crate::pipeline::store::{EntryPatch, PipelineStore};

/// Assistant reply recorded when the chat call fails.
pub const CHAT_FAILURE_REPLY: &str =
    "Sorry, I encountered an error analyzing the resume context.";

#[derive(Debug, Clone, Serialize)]
pub struct ChatTurn {
    pub user: ChatMessage,
    pub reply: ChatMessage,
}

pub async fn send_chat_message(
    store: &PipelineStore,
    chat: Arc<dyn CandidateChat>,
    id: Uuid,
    message: &str,
) -> Result<ChatTurn, AppError> {
    if message.trim().is_empty() {
        return Err(AppError::Validation("Message cannot be empty".to_string()));
    }

    let (user, grounding, conversation) = store
        .transact(|state| {
            let entry = state
                .entry(id)
                .ok_or_else(|| AppError::NotFound(format!("Candidate {id} not found")))?;
            let grounding = entry.state.result().cloned().ok_or_else(|| {
                AppError::Validation("Candidate has not been analyzed yet".to_string())
            })?;
            if entry.awaiting_reply {
                return Err(AppError::chat_in_progress());
            }

            let user = ChatMessage::user(message);
            let mut conversation = entry.conversation.clone();
            conversation.push(user.clone());

            state.apply(
                id,
                EntryPatch {
                    append: vec![user.clone()],
                    awaiting_reply: Some(true),
                    ..Default::default()
                },
            );
            Ok((user, grounding, conversation))
        })
        .await?;

    let turn = {
        let store = store.clone();
        let message = message.to_string();
        tokio::spawn(async move {
            let text = match chat.reply(&grounding, &conversation, &message).await {
                Ok(text) => text,
                Err(e) => {
                    warn!(entry_id = %id, "Chat call failed, sending fallback reply: {e}");
                    CHAT_FAILURE_REPLY.to_string()
                }
            };
            settle_turn(&store, id, ChatMessage::assistant(text)).await
        })
    };

    let reply = match turn.await {
        Ok(reply) => reply,
        Err(e) => {
            error!(entry_id = %id, "Chat task failed: {e}");
            settle_turn(store, id, ChatMessage::assistant(CHAT_FAILURE_REPLY)).await
        }
    };

    Ok(ChatTurn { user, reply })
}

async fn settle_turn(store: &PipelineStore, id: Uuid, reply: ChatMessage) -> ChatMessage {
    let delivered = store
        .update_entry(
            id,
            EntryPatch {
                append: vec![reply.clone()],
                awaiting_reply: Some(false),
                ..Default::default()
            },
        )
        .await;
    if !delivered {
        debug!(entry_id = %id, "Candidate removed before chat reply arrived");
    }
    reply
}
