//! Trivia quiz service.
//!
//! Serves a static question bank and proxies three AI-assisted features
//! (hint, chat, explain) plus batch translation to a chat-completion
//! provider, with per-user usage caps per question.

use careride_common::{AppError, AppResult};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

use super::completion::{ChatCompletion, ChatMessage};
use super::usage_limit::{QuizFeature, UsageDecision, UsageLimiter};

/// Largest batch accepted by the translate feature.
const MAX_TRANSLATE_BATCH: usize = 10;

/// Recovers a JSON array embedded in surrounding prose.
static JSON_ARRAY_RE: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::unwrap_used)] // pattern is a constant
    Regex::new(r"(?s)\[\s*\{.*?\}\s*\]").unwrap()
});

/// A trivia question.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub question: String,
    pub choices: Vec<String>,
    pub correct_index: i64,
}

/// The static question bank, keyed by topic.
#[derive(Debug, Clone, Serialize)]
pub struct QuestionBank {
    pub topics: serde_json::Map<String, serde_json::Value>,
}

impl QuestionBank {
    /// Load the bank from the first existing path. The file may be a bare
    /// topic map or wrapped in a `{"topics": ...}` object.
    pub fn load(paths: &[String]) -> AppResult<Self> {
        for path in paths {
            if Path::new(path).exists() {
                let raw = std::fs::read_to_string(path).map_err(|e| {
                    AppError::Internal(format!("Failed to read questions file {path}: {e}"))
                })?;
                return Self::parse(&raw);
            }
        }

        Err(AppError::Internal(format!(
            "Questions file not found in any of: {}",
            paths.join(", ")
        )))
    }

    fn parse(raw: &str) -> AppResult<Self> {
        let value: serde_json::Value = serde_json::from_str(raw)
            .map_err(|e| AppError::Internal(format!("Invalid questions file: {e}")))?;

        let topics = match value {
            serde_json::Value::Object(map) => {
                if let Some(serde_json::Value::Object(inner)) = map.get("topics") {
                    inner.clone()
                } else {
                    map
                }
            }
            _ => {
                return Err(AppError::Internal(
                    "Bad questions file structure".to_string(),
                ));
            }
        };

        Ok(Self { topics })
    }
}

/// Input for the chat feature.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatInput {
    pub question: Question,
    pub user_message: String,
    #[serde(default)]
    pub history: Vec<ChatMessage>,
    #[serde(default)]
    pub is_hint: bool,
}

/// Chat feature result. `limit_reached` marks the guarded no-call outcome.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatOutcome {
    pub text: String,
    pub history: Vec<ChatMessage>,
    pub usage_count: u64,
    pub max_usage: u64,
    pub limit_reached: bool,
}

/// Input for the explain feature.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplainInput {
    pub question: Question,
    pub user_answer_index: Option<i64>,
}

/// Explain feature result.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplainOutcome {
    pub text: String,
    pub usage_count: u64,
    pub max_usage: u64,
    pub limit_reached: bool,
}

/// Input for batch translation.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslateInput {
    #[serde(default = "default_lang")]
    pub lang: String,
    #[serde(default)]
    pub questions: Vec<Question>,
}

fn default_lang() -> String {
    "he".to_string()
}

/// Quiz service.
#[derive(Clone)]
pub struct QuizService {
    completion: Arc<dyn ChatCompletion>,
    limiter: UsageLimiter,
    question_paths: Vec<String>,
}

impl QuizService {
    /// Create a new quiz service.
    #[must_use]
    pub const fn new(
        completion: Arc<dyn ChatCompletion>,
        limiter: UsageLimiter,
        question_paths: Vec<String>,
    ) -> Self {
        Self {
            completion,
            limiter,
            question_paths,
        }
    }

    /// Load the static question bank.
    pub fn questions(&self) -> AppResult<QuestionBank> {
        QuestionBank::load(&self.question_paths)
    }

    /// Chat about a question without revealing the answer. Hints and regular
    /// chat messages draw from separate usage counters.
    pub async fn chat(&self, user_id: &str, input: ChatInput) -> AppResult<ChatOutcome> {
        validate_question(&input.question)?;

        let user_message = input.user_message.trim();
        if user_message.is_empty() {
            return Err(AppError::Validation("Chat message is empty".to_string()));
        }

        let feature = if input.is_hint {
            QuizFeature::Hint
        } else {
            QuizFeature::Chat
        };

        let decision = self
            .limiter
            .check_and_consume(user_id, &input.question.question, feature)
            .await?;

        let (used, limit) = match decision {
            UsageDecision::Allowed { used, limit } => (used, limit),
            UsageDecision::LimitReached { limit } => {
                let text = if input.is_hint {
                    "You already used your hint for this question. Try solving it yourself!"
                        .to_string()
                } else {
                    format!("You reached the maximum of {limit} chat messages for this question.")
                };
                return Ok(ChatOutcome {
                    text,
                    history: input.history,
                    usage_count: limit,
                    max_usage: limit,
                    limit_reached: true,
                });
            }
        };

        let system = "You are a study helper in a trivia game.\n\
            Rules:\n\
            - Never reveal the correct answer or hint explicitly which choice it is.\n\
            - If asked for the answer directly, politely refuse and offer a hint plus a guiding question.\n\
            - Keep replies short, to the point, and in Hebrew.";

        let mut messages = vec![
            ChatMessage::system(system),
            ChatMessage::user(format!(
                "Question: {}\nChoices: {}",
                input.question.question,
                input.question.choices.join(", ")
            )),
        ];
        messages.extend(input.history.iter().cloned());
        messages.push(ChatMessage::user(user_message));

        let text = self.completion.complete(&messages).await?;

        let mut history = input.history;
        history.push(ChatMessage::user(user_message));
        history.push(ChatMessage::assistant(text.clone()));

        Ok(ChatOutcome {
            text,
            history,
            usage_count: used,
            max_usage: limit,
            limit_reached: false,
        })
    }

    /// Explain the correct answer after the user has answered.
    pub async fn explain(&self, user_id: &str, input: ExplainInput) -> AppResult<ExplainOutcome> {
        validate_question(&input.question)?;

        let Some(user_answer_index) = input.user_answer_index else {
            return Err(AppError::Validation(
                "Answer the question before asking for an explanation".to_string(),
            ));
        };

        let decision = self
            .limiter
            .check_and_consume(user_id, &input.question.question, QuizFeature::Explain)
            .await?;

        let (used, limit) = match decision {
            UsageDecision::Allowed { used, limit } => (used, limit),
            UsageDecision::LimitReached { limit } => {
                return Ok(ExplainOutcome {
                    text: "You already used the explanation for this question.".to_string(),
                    usage_count: limit,
                    max_usage: limit,
                    limit_reached: true,
                });
            }
        };

        let system = "You explain trivia answers.\n\
            You may reveal the correct answer and why it is correct.\n\
            Keep the explanation short, clear, and in Hebrew.";

        let payload = serde_json::json!({
            "question": input.question.question,
            "choices": input.question.choices,
            "correctIndex": input.question.correct_index,
            "userAnswerIndex": user_answer_index,
        });

        let messages = vec![
            ChatMessage::system(system),
            ChatMessage::user(payload.to_string()),
        ];

        let text = self.completion.complete(&messages).await?;

        Ok(ExplainOutcome {
            text,
            usage_count: used,
            max_usage: limit,
            limit_reached: false,
        })
    }

    /// Translate up to ten questions to Hebrew, preserving the choice array
    /// structure and `correctIndex`. Not usage-capped.
    pub async fn translate(&self, input: TranslateInput) -> AppResult<Vec<Question>> {
        if input.lang != "he" {
            return Err(AppError::BadRequest("Unsupported language".to_string()));
        }
        if input.questions.is_empty() {
            return Err(AppError::BadRequest("No questions provided".to_string()));
        }

        let mut questions = input.questions;
        questions.truncate(MAX_TRANSLATE_BATCH);

        let system = "You are a professional English-to-Hebrew translator.\n\
            You will receive a JSON object with questions.\n\
            Return ONLY a JSON array (no extra text) in this format:\n\
            [\n\
              {\"question\":\"...\",\"choices\":[\"...\"],\"correctIndex\":0},\n\
              ...\n\
            ]\n\
            Rules:\n\
            - Never change correctIndex.\n\
            - Keep code terms and keywords in English (SQL, JSON, API, def, let, etc.).\n\
            - Translate the question and choices into natural Hebrew.";

        let payload = serde_json::json!({ "questions": &questions });
        let messages = vec![
            ChatMessage::system(system),
            ChatMessage::user(payload.to_string()),
        ];

        let text = self.completion.complete(&messages).await?;
        let translated = extract_json_array(&text)?;

        if translated.len() != questions.len() {
            tracing::warn!(
                sent = questions.len(),
                received = translated.len(),
                "Translation batch size mismatch"
            );
        }

        Ok(translated)
    }
}

fn validate_question(question: &Question) -> AppResult<()> {
    if question.question.trim().is_empty() || question.choices.is_empty() {
        return Err(AppError::Validation("Invalid question".to_string()));
    }
    Ok(())
}

/// Parse a JSON array of questions out of model output, tolerating
/// surrounding prose. Fails when no well-formed array is found.
fn extract_json_array(text: &str) -> AppResult<Vec<Question>> {
    let trimmed = text.trim();

    let candidate = if trimmed.starts_with('[') && trimmed.ends_with(']') {
        trimmed
    } else {
        JSON_ARRAY_RE
            .find(trimmed)
            .map(|m| m.as_str())
            .ok_or_else(|| {
                AppError::ExternalService("No JSON array found in model output".to_string())
            })?
    };

    let questions: Vec<Question> = serde_json::from_str(candidate)
        .map_err(|e| AppError::ExternalService(format!("Malformed translation output: {e}")))?;

    if questions.is_empty() {
        return Err(AppError::ExternalService(
            "Model returned an empty array".to_string(),
        ));
    }

    for question in &questions {
        if question.choices.is_empty() {
            return Err(AppError::ExternalService(
                "Translated question has no choices".to_string(),
            ));
        }
    }

    Ok(questions)
}
