use super::*;
use sqlx::sqlite::SqlitePoolOptions;
use tempfile::TempDir;

async fn create_test_pool() -> (TempDir, SqlitePool) {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let db_path = temp_dir.path().join("test.db");

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(
            sqlx::sqlite::SqliteConnectOptions::new()
                .filename(&db_path)
                .create_if_missing(true)
                .foreign_keys(true),
        )
        .await
        .expect("Failed to create test pool");

    sqlx::raw_sql(include_str!("../migrations/001_initial_schema.sql"))
        .execute(&pool)
        .await
        .expect("Failed to run migrations");

    (temp_dir, pool)
}

fn visitor_message(text: &str) -> NewMessage {
    NewMessage {
        tenant: "client@example.com".to_string(),
        visitor_id: "visitor-1".to_string(),
        chatbot_id: "bot-1".to_string(),
        sender: Sender::Visitor,
        text: text.to_string(),
    }
}

#[tokio::test]
async fn append_assigns_id_and_sequence() {
    let (_temp_dir, pool) = create_test_pool().await;

    let first = MessageQueries::append(&pool, visitor_message("Hello"))
        .await
        .expect("Failed to append message");
    let second = MessageQueries::append(&pool, visitor_message("Anyone there?"))
        .await
        .expect("Failed to append message");

    assert!(uuid::Uuid::parse_str(&first.id).is_ok());
    assert_ne!(first.id, second.id);
    assert!(second.seq > first.seq);
    assert_eq!(first.conversation_id, second.conversation_id);
}

#[tokio::test]
async fn append_creates_conversation_on_first_contact() {
    let (_temp_dir, pool) = create_test_pool().await;

    let before = ConversationQueries::get(&pool, "client@example.com", "visitor-1", "bot-1")
        .await
        .expect("Query should succeed");
    assert!(before.is_none());

    MessageQueries::append(&pool, visitor_message("Hello"))
        .await
        .expect("Failed to append message");

    let conversation = ConversationQueries::get(&pool, "client@example.com", "visitor-1", "bot-1")
        .await
        .expect("Query should succeed")
        .expect("Conversation should exist");
    assert_eq!(conversation.tenant, "client@example.com");
    assert_eq!(conversation.visitor_id, "visitor-1");
    assert_eq!(conversation.chatbot_id, "bot-1");
}

#[tokio::test]
async fn turns_list_in_insertion_order() {
    let (_temp_dir, pool) = create_test_pool().await;

    MessageQueries::append(&pool, visitor_message("First question"))
        .await
        .expect("Failed to append message");

    let reply = NewMessage {
        sender: Sender::Assistant,
        text: "First answer".to_string(),
        ..visitor_message("")
    };
    MessageQueries::append(&pool, reply)
        .await
        .expect("Failed to append message");

    MessageQueries::append(&pool, visitor_message("Second question"))
        .await
        .expect("Failed to append message");

    let turns =
        MessageQueries::list_for_conversation(&pool, "client@example.com", "visitor-1", "bot-1")
            .await
            .expect("Failed to list messages");

    assert_eq!(turns.len(), 3);
    assert_eq!(turns[0].sender, Sender::Visitor);
    assert_eq!(turns[0].text, "First question");
    assert_eq!(turns[1].sender, Sender::Assistant);
    assert_eq!(turns[1].text, "First answer");
    assert_eq!(turns[2].sender, Sender::Visitor);
    assert_eq!(turns[2].text, "Second question");
}

#[tokio::test]
async fn conversations_list_most_recent_first() {
    let (_temp_dir, pool) = create_test_pool().await;

    MessageQueries::append(&pool, visitor_message("Hello from visitor-1"))
        .await
        .expect("Failed to append message");

    let other_visitor = NewMessage {
        visitor_id: "visitor-2".to_string(),
        ..visitor_message("Hello from visitor-2")
    };
    MessageQueries::append(&pool, other_visitor)
        .await
        .expect("Failed to append message");

    let conversations = ConversationQueries::list_for_chatbot(&pool, "client@example.com", "bot-1")
        .await
        .expect("Failed to list conversations");

    assert_eq!(conversations.len(), 2);
    assert!(conversations[0].last_modified >= conversations[1].last_modified);
}

#[tokio::test]
async fn customization_upsert_overwrites() {
    let (_temp_dir, pool) = create_test_pool().await;

    let initial = NewCustomization {
        tenant: "client@example.com".to_string(),
        chatbot_id: "bot-1".to_string(),
        system_prompt: "You are a helpful assistant.".to_string(),
    };
    CustomizationQueries::upsert(&pool, initial)
        .await
        .expect("Failed to upsert customization");

    let replacement = NewCustomization {
        tenant: "client@example.com".to_string(),
        chatbot_id: "bot-1".to_string(),
        system_prompt: "You are a terse assistant.".to_string(),
    };
    CustomizationQueries::upsert(&pool, replacement)
        .await
        .expect("Failed to upsert customization");

    let stored = CustomizationQueries::get(&pool, "client@example.com", "bot-1")
        .await
        .expect("Query should succeed")
        .expect("Customization should exist");
    assert_eq!(stored.system_prompt, "You are a terse assistant.");

    let missing = CustomizationQueries::get(&pool, "client@example.com", "bot-2")
        .await
        .expect("Query should succeed");
    assert!(missing.is_none());
}
