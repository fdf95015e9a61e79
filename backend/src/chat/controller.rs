use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::SqlitePool;

use crate::chat::markup::{Attachment, compose_content, split_content};
use crate::chat::session::SessionContext;
use crate::db;
use crate::models::{Message, User, UserType};
use crate::services::distance::{Distance, distance_km};
use crate::services::media::{MediaError, MediaKind, MediaStore};
use crate::services::translation::{TranslationService, language_or_default};

/// The user on the other side of the open conversation.
#[derive(Debug, Clone, Serialize)]
pub struct ChatPartner {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub user_type: UserType,
    pub language: String,
    pub location: Option<String>,
    pub distance: Distance,
}

impl ChatPartner {
    pub fn from_user(viewer: &User, partner: User) -> Self {
        let distance = distance_km(viewer.latitude, viewer.longitude, partner.latitude, partner.longitude);
        Self {
            id: partner.id,
            name: partner.name,
            email: partner.email,
            user_type: partner.user_type,
            language: partner.language,
            location: partner.location,
            distance,
        }
    }
}

/// Stored paths of attachments waiting to be sent. One of each kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Draft {
    pub image: Option<String>,
    pub video: Option<String>,
}

impl Draft {
    pub fn is_empty(&self) -> bool {
        self.image.is_none() && self.video.is_none()
    }

    /// Puts `path` in the slot for `kind`, returning what it replaced.
    fn set(&mut self, kind: MediaKind, path: String) -> Option<String> {
        let slot = match kind {
            MediaKind::Image => &mut self.image,
            MediaKind::Video => &mut self.video,
        };
        slot.replace(path)
    }
}

#[derive(Debug, Clone, Default)]
pub enum ChatState {
    #[default]
    NoContactSelected,
    ContactSelected { partner: ChatPartner },
    Composing { partner: ChatPartner, draft: Draft },
}

impl ChatState {
    pub fn partner(&self) -> Option<&ChatPartner> {
        match self {
            ChatState::NoContactSelected => None,
            ChatState::ContactSelected { partner } | ChatState::Composing { partner, .. } => Some(partner),
        }
    }

    pub fn draft(&self) -> Option<&Draft> {
        match self {
            ChatState::Composing { draft, .. } => Some(draft),
            _ => None,
        }
    }

    fn phase(&self) -> ChatPhase {
        match self {
            ChatState::NoContactSelected => ChatPhase::NoContactSelected,
            ChatState::ContactSelected { .. } => ChatPhase::ContactSelected,
            ChatState::Composing { .. } => ChatPhase::Composing,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatPhase {
    NoContactSelected,
    ContactSelected,
    Composing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Sent,
    Received,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConversationMessage {
    pub id: i64,
    pub sender_id: i64,
    pub receiver_id: i64,
    pub direction: Direction,
    /// Raw stored content, attachment markup included
    pub content: String,
    pub text: String,
    pub translated_text: String,
    pub attachments: Vec<Attachment>,
    pub original_language: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatView {
    pub state: ChatPhase,
    pub contact: Option<ChatPartner>,
    pub messages: Vec<ConversationMessage>,
    pub draft: Option<Draft>,
}

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("select a contact to start chatting")]
    NoContactSelected,
    #[error("user {0} is not someone you can message")]
    UnknownContact(i64),
    #[error("type a message or attach a photo or video")]
    EmptyMessage,
    #[error(transparent)]
    Media(#[from] MediaError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Drives one session through contact selection, composing and sending.
///
/// Every transition works on the caller's `SessionContext`; the caller is
/// responsible for writing it back to the session store.
pub struct ChatController<'a> {
    pool: &'a SqlitePool,
    translator: &'a TranslationService,
    media: &'a MediaStore,
}

impl<'a> ChatController<'a> {
    pub fn new(pool: &'a SqlitePool, translator: &'a TranslationService, media: &'a MediaStore) -> Self {
        Self { pool, translator, media }
    }

    /// Renders the current state, re-reading the conversation from the store.
    pub async fn view(&self, ctx: &SessionContext) -> Result<ChatView, ChatError> {
        let messages = match ctx.chat.partner() {
            Some(partner) => self.load_conversation(&ctx.user, partner.id).await?,
            None => Vec::new(),
        };

        Ok(ChatView {
            state: ctx.chat.phase(),
            contact: ctx.chat.partner().cloned(),
            messages,
            draft: ctx.chat.draft().cloned(),
        })
    }

    /// Opens the conversation with `contact_id`, discarding any draft.
    pub async fn select_contact(&self, ctx: &mut SessionContext, contact_id: i64) -> Result<ChatView, ChatError> {
        let partner = db::users::get_user_by_id(self.pool, contact_id)
            .await?
            .filter(|user| user.id != ctx.user.id && user.user_type == ctx.user.user_type.counterpart())
            .ok_or(ChatError::UnknownContact(contact_id))?;

        ctx.chat = ChatState::ContactSelected {
            partner: ChatPartner::from_user(&ctx.user, partner),
        };
        tracing::debug!("User {} opened chat with {}", ctx.user.id, contact_id);

        self.view(ctx).await
    }

    /// Stores an upload and adds it to the draft.
    pub async fn attach(
        &self,
        ctx: &mut SessionContext,
        kind: MediaKind,
        file_name: &str,
        data: &[u8],
    ) -> Result<ChatView, ChatError> {
        let partner = ctx.chat.partner().cloned().ok_or(ChatError::NoContactSelected)?;
        let path = self.media.save(kind, ctx.user.id, file_name, data).await?;

        let mut draft = ctx.chat.draft().cloned().unwrap_or_default();
        if let Some(replaced) = draft.set(kind, path) {
            if let Err(e) = tokio::fs::remove_file(&replaced).await {
                tracing::warn!("Failed to remove replaced attachment {}: {}", replaced, e);
            }
        }
        ctx.chat = ChatState::Composing { partner, draft };

        self.view(ctx).await
    }

    /// Persists one message from the text and drafted attachments, then
    /// reloads the conversation. Nothing changes if validation fails.
    pub async fn send(&self, ctx: &mut SessionContext, text: &str) -> Result<ChatView, ChatError> {
        let partner = ctx.chat.partner().cloned().ok_or(ChatError::NoContactSelected)?;
        let draft = ctx.chat.draft().cloned().unwrap_or_default();
        let text = text.trim();
        if text.is_empty() && draft.is_empty() {
            return Err(ChatError::EmptyMessage);
        }

        let content = compose_content(text, draft.image.as_deref(), draft.video.as_deref());
        let message = db::messages::insert_message(
            self.pool,
            ctx.user.id,
            partner.id,
            &content,
            &ctx.user.language,
        )
        .await?;
        tracing::info!("User {} sent message {} to {}", ctx.user.id, message.id, partner.id);

        ctx.chat = ChatState::ContactSelected { partner };
        self.view(ctx).await
    }

    /// Closes the conversation. Drafted files stay on disk.
    pub fn clear(&self, ctx: &mut SessionContext) -> ChatView {
        ctx.chat = ChatState::NoContactSelected;
        ChatView {
            state: ChatPhase::NoContactSelected,
            contact: None,
            messages: Vec::new(),
            draft: None,
        }
    }

    async fn load_conversation(&self, viewer: &User, partner_id: i64) -> Result<Vec<ConversationMessage>, ChatError> {
        let messages = db::messages::get_conversation(self.pool, viewer.id, partner_id).await?;

        // Translate the text only, never the attachment markup
        let mut parts = Vec::with_capacity(messages.len());
        let mut texts = Vec::with_capacity(messages.len());
        for message in messages {
            let (text, attachments) = split_content(&message.content);
            texts.push(Message {
                content: text.clone(),
                ..message.clone()
            });
            parts.push((message, text, attachments));
        }
        let target = language_or_default(&viewer.language);
        let translated = self.translator.translate_messages(texts, &target).await;

        Ok(parts
            .into_iter()
            .zip(translated)
            .map(|((message, text, attachments), translated)| ConversationMessage {
                id: message.id,
                sender_id: message.sender_id,
                receiver_id: message.receiver_id,
                direction: if message.sender_id == viewer.id {
                    Direction::Sent
                } else {
                    Direction::Received
                },
                content: message.content,
                text,
                translated_text: translated.translated_content,
                attachments,
                original_language: message.original_language,
                read: message.read,
                created_at: message.created_at,
            })
            .collect())
    }
}
