//! Integration tests for the Telegram client
//!
//! Verifies the sendMessage request shape and that API failures surface as
//! errors without leaking the bot token.

use review_notifier::telegram::{ChatError, ChatSink, TelegramBot, TelegramConfig};
use std::time::Duration;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const BOT_TOKEN: &str = "123456:AAH-secret_part";

fn test_bot(api_url: &str) -> TelegramBot {
    TelegramBot::new(TelegramConfig {
        bot_token: BOT_TOKEN.to_string(),
        api_url: api_url.to_string(),
        timeout: Duration::from_secs(2),
    })
    .unwrap()
}

#[tokio::test]
async fn test_send_message_posts_chat_id_and_text() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(format!("/bot{BOT_TOKEN}/sendMessage")))
        .and(body_json(serde_json::json!({
            "chat_id": "-100200300",
            "text": "Новая проверка работы!",
            "disable_web_page_preview": true
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "ok": true,
            "result": {"message_id": 42}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let bot = test_bot(&mock_server.uri());
    let result = bot
        .send_message("-100200300", "Новая проверка работы!")
        .await;

    assert!(result.is_ok(), "send failed: {result:?}");
}

#[tokio::test]
async fn test_rejected_message_returns_api_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "ok": false,
            "error_code": 400,
            "description": "Bad Request: chat not found"
        })))
        .mount(&mock_server)
        .await;

    let bot = test_bot(&mock_server.uri());
    let result = bot.send_message("1", "hello").await;

    assert_eq!(
        result,
        Err(ChatError::Api {
            code: 400,
            description: "Bad Request: chat not found".to_string()
        })
    );
}

#[tokio::test]
async fn test_network_error_does_not_leak_token() {
    let bot = test_bot("http://127.0.0.1:1");
    let error = bot.send_message("1", "hello").await.unwrap_err();

    assert!(matches!(error, ChatError::Network(_)));
    assert!(!error.to_string().contains("AAH-secret_part"));
}
