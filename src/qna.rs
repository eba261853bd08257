//! Biodiversity QnA and Species Suggestion Flows
//!
//! The chat endpoint prefers the configured LLM provider and falls back to
//! the compiled-in keyword matcher when no provider is configured or the call
//! fails, so the chat page always gets an answer.

use serde::Serialize;

use crate::knowledge;
use crate::llm::LlmClient;

const QNA_SYSTEM_PROMPT: &str = "You are a helpful AI assistant specializing \
    in biodiversity, particularly in Islamabad, Pakistan, and its surrounding \
    regions. Your primary goal is to provide accurate and informative answers \
    to questions about local flora, fauna, ecosystems, conservation efforts, \
    and general biodiversity topics. If the user's question is NOT related to \
    biodiversity, nature, wildlife, plants, animals, ecosystems, or \
    conservation, you MUST politely decline to answer, for example: \"I can \
    only answer questions related to biodiversity. Please ask me something \
    about nature, wildlife, or conservation.\"";

const SPECIES_SYSTEM_PROMPT: &str = "You are an AI assistant specializing in \
    identifying species from images. Given an image, suggest 2-3 possible \
    species names. Respond with ONLY a JSON array of strings, for example \
    [\"Kalij Pheasant\", \"Cheer Pheasant\"]. If you are not confident in any \
    suggestion, respond with an empty JSON array [].";

/// Where an answer came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerSource {
    Llm,
    KnowledgeBase,
}

#[derive(Debug, Serialize)]
pub struct QnAnswer {
    pub answer: String,
    pub source: AnswerSource,
}

/// Answer a free-text biodiversity question. Infallible: the keyword matcher
/// covers every path the provider cannot.
pub async fn answer_question(llm: &LlmClient, question: &str) -> QnAnswer {
    if llm.is_configured() {
        match llm.chat(QNA_SYSTEM_PROMPT, question).await {
            Ok(answer) => {
                return QnAnswer {
                    answer,
                    source: AnswerSource::Llm,
                }
            }
            Err(err) => {
                tracing::warn!("LLM QnA failed, using knowledge base: {}", err);
            }
        }
    }

    QnAnswer {
        answer: knowledge::answer(question).to_string(),
        source: AnswerSource::KnowledgeBase,
    }
}

/// Suggest species names for an uploaded photo (as a data URI). Failures and
/// unparseable model output both yield the empty list, which callers treat as
/// "no confident suggestion".
pub async fn suggest_species(llm: &LlmClient, image_data_uri: &str) -> Vec<String> {
    if !llm.is_configured() {
        return Vec::new();
    }

    let user_message = format!(
        "Suggest species names for the organism in this image: {}",
        image_data_uri
    );

    match llm.chat(SPECIES_SYSTEM_PROMPT, &user_message).await {
        Ok(raw) => parse_species_array(&raw),
        Err(err) => {
            tracing::warn!("Species suggestion failed: {}", err);
            Vec::new()
        }
    }
}

/// Extract a JSON string array from model output, tolerating prose around it.
fn parse_species_array(raw: &str) -> Vec<String> {
    let start = match raw.find('[') {
        Some(i) => i,
        None => return Vec::new(),
    };
    let end = match raw.rfind(']') {
        Some(i) if i > start => i,
        _ => return Vec::new(),
    };

    serde_json::from_str::<Vec<String>>(&raw[start..=end]).unwrap_or_default()
}
