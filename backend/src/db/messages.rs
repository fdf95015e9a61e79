use crate::models::Message;
use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

pub async fn insert_message(
    pool: &SqlitePool,
    sender_id: i64,
    receiver_id: i64,
    content: &str,
    original_language: &str,
) -> Result<Message> {
    insert_message_at(pool, sender_id, receiver_id, content, original_language, Utc::now()).await
}

pub async fn insert_message_at(
    pool: &SqlitePool,
    sender_id: i64,
    receiver_id: i64,
    content: &str,
    original_language: &str,
    created_at: DateTime<Utc>,
) -> Result<Message> {
    let message = sqlx::query_as::<_, Message>(
        r#"
        INSERT INTO messages (sender_id, receiver_id, content, original_language, created_at)
        VALUES (?, ?, ?, ?, ?)
        RETURNING id, sender_id, receiver_id, content, original_language, read, created_at
        "#,
    )
    .bind(sender_id)
    .bind(receiver_id)
    .bind(content)
    .bind(original_language)
    .bind(created_at)
    .fetch_one(pool)
    .await?;

    Ok(message)
}

/// Full history between two users in both directions, oldest first.
pub async fn get_conversation(pool: &SqlitePool, user_a: i64, user_b: i64) -> Result<Vec<Message>> {
    let messages = sqlx::query_as::<_, Message>(
        r#"
        SELECT id, sender_id, receiver_id, content, original_language, read, created_at
        FROM messages
        WHERE (sender_id = ?1 AND receiver_id = ?2) OR (sender_id = ?2 AND receiver_id = ?1)
        ORDER BY created_at ASC, id ASC
        "#,
    )
    .bind(user_a)
    .bind(user_b)
    .fetch_all(pool)
    .await?;

    Ok(messages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserType;
    use crate::test_support::{create_test_user, test_pool};
    use chrono::Duration;

    #[tokio::test]
    async fn test_conversation_is_ascending_regardless_of_insert_order() {
        let pool = test_pool().await;
        let a = create_test_user(&pool, "a@example.com", UserType::Farmer).await;
        let b = create_test_user(&pool, "b@example.com", UserType::Buyer).await;
        let base = Utc::now();

        // Later message inserted first, by the other party
        insert_message_at(&pool, b.id, a.id, "second", "hi", base + Duration::seconds(5))
            .await
            .unwrap();
        insert_message_at(&pool, a.id, b.id, "first", "en", base).await.unwrap();

        let from_a = get_conversation(&pool, a.id, b.id).await.unwrap();
        let from_b = get_conversation(&pool, b.id, a.id).await.unwrap();

        let contents: Vec<_> = from_a.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["first", "second"]);
        assert_eq!(
            from_b.iter().map(|m| m.id).collect::<Vec<_>>(),
            from_a.iter().map(|m| m.id).collect::<Vec<_>>()
        );
    }

    #[tokio::test]
    async fn test_conversation_excludes_other_pairs() {
        let pool = test_pool().await;
        let a = create_test_user(&pool, "a@example.com", UserType::Farmer).await;
        let b = create_test_user(&pool, "b@example.com", UserType::Buyer).await;
        let c = create_test_user(&pool, "c@example.com", UserType::Buyer).await;

        insert_message(&pool, a.id, b.id, "to b", "en").await.unwrap();
        insert_message(&pool, a.id, c.id, "to c", "en").await.unwrap();

        let conversation = get_conversation(&pool, a.id, b.id).await.unwrap();
        assert_eq!(conversation.len(), 1);
        assert_eq!(conversation[0].content, "to b");
        assert!(!conversation[0].read);
    }
}
