//! Chat text for review attempts

use crate::review::ReviewAttempt;

const HEADER: &str = "Новая проверка работы!";
const VERDICT_REJECTED: &str = "Урок не принят.";
const VERDICT_ACCEPTED: &str = "Всё правильно! Делай дальше.";

/// Render one attempt as a chat message
pub fn format_attempt_message(attempt: &ReviewAttempt) -> String {
    let verdict = if attempt.is_negative {
        VERDICT_REJECTED
    } else {
        VERDICT_ACCEPTED
    };

    format!(
        "{HEADER}\n\nУрок: {}\nСсылка: {}\nРезультат: {verdict}",
        attempt.lesson_title, attempt.lesson_url
    )
}
