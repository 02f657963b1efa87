//! Guided chat assistant for contractor certification questions.
//!
//! Three-stage response resolution: fuzzy pattern match against the bundled
//! intent guide, an off-topic/code guard, then a model call grounded in the
//! bundled knowledge base. The assistant is stateless; conversation history
//! arrives with each request.

use std::path::Path;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::CHAT_MODEL;
use crate::openai::{ChatMessage, OpenAiClient, ProviderError};

/// Minimum sequence similarity for a pattern hit.
const PATTERN_MATCH_CUTOFF: f64 = 0.65;

/// Messages longer than this skip pattern matching entirely.
const PATTERN_MATCH_MAX_CHARS: usize = 100;

/// Conversation turns handed to the model.
const HISTORY_WINDOW: usize = 5;

const GREETING_WORDS: [&str; 6] = [
    "hi",
    "hello",
    "hey",
    "good morning",
    "good afternoon",
    "greetings",
];

const OFF_TOPIC_RESPONSE: &str = "I can only assist with questions about the Ministry of Works, \
     Housing & Water Resources certification and application process. For code or other topics, \
     please try another platform.";

const FALLBACK_DEFAULT_RESPONSE: &str =
    "I apologize, but I am having trouble accessing my knowledge base.";

/// One prior turn of the conversation, as sent by the caller.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatTurn {
    pub role: String,
    pub content: String,
}

/// Canned intent: match any of `patterns`, answer with `response`.
#[derive(Debug, Clone, Deserialize)]
pub struct Intent {
    pub id: String,
    pub patterns: Vec<String>,
    pub response: String,
}

/// The bundled pattern guide (`chat-data.json`).
#[derive(Debug, Clone, Deserialize)]
pub struct PatternGuide {
    pub intents: Vec<Intent>,
    pub default_response: String,
}

impl PatternGuide {
    fn fallback() -> Self {
        Self {
            intents: Vec::new(),
            default_response: FALLBACK_DEFAULT_RESPONSE.to_string(),
        }
    }
}

pub struct ChatAssistant {
    client: Option<OpenAiClient>,
    pattern_guide: PatternGuide,
    knowledge_base: String,
}

impl ChatAssistant {
    /// Load the data files from `data_dir`. Missing or malformed files log
    /// a warning and degrade the assistant rather than failing startup.
    pub fn load(data_dir: &Path, client: Option<OpenAiClient>) -> Self {
        let pattern_guide_path = data_dir.join("chat-data.json");
        let pattern_guide = match std::fs::read_to_string(&pattern_guide_path)
            .map_err(|e| e.to_string())
            .and_then(|raw| serde_json::from_str(&raw).map_err(|e| e.to_string()))
        {
            Ok(guide) => guide,
            Err(e) => {
                warn!(path = %pattern_guide_path.display(), error = %e, "Failed to load chat pattern guide");
                PatternGuide::fallback()
            }
        };

        let knowledge_base_path = data_dir.join("guidelines.md");
        let knowledge_base = match std::fs::read_to_string(&knowledge_base_path) {
            Ok(text) => text,
            Err(e) => {
                warn!(path = %knowledge_base_path.display(), error = %e, "Failed to load knowledge base");
                String::new()
            }
        };

        Self {
            client,
            pattern_guide,
            knowledge_base,
        }
    }

    /// Resolve one user message to a response.
    ///
    /// Only a model-call failure surfaces as an error; every degraded state
    /// short of that still produces a response.
    pub async fn respond(
        &self,
        message: &str,
        history: &[ChatTurn],
    ) -> Result<String, ProviderError> {
        if let Some(response) = self.pattern_match(message) {
            debug!("Chat message answered from the pattern guide");
            return Ok(response);
        }

        if is_off_topic_or_code(message) {
            return Ok(OFF_TOPIC_RESPONSE.to_string());
        }

        let Some(client) = &self.client else {
            return Ok(format!(
                "{} (AI service unavailable)",
                self.pattern_guide.default_response
            ));
        };

        let system = system_prompt(
            &self.knowledge_base,
            &self.intents_json(),
            &self.fee_responses(),
        );

        let mut messages = vec![ChatMessage::system(system)];
        let start = history.len().saturating_sub(HISTORY_WINDOW);
        for turn in &history[start..] {
            if turn.role == "user" {
                messages.push(ChatMessage::user(turn.content.clone()));
            } else {
                messages.push(ChatMessage::assistant(turn.content.clone()));
            }
        }
        messages.push(ChatMessage::user(message));

        client.chat(CHAT_MODEL, &messages, 0.7).await
    }

    /// Best fuzzy pattern hit at or above the cutoff, if any. Greeting
    /// patterns only compete when the message actually looks like one.
    fn pattern_match(&self, message: &str) -> Option<String> {
        let normalized = message.trim().to_lowercase();
        if normalized.chars().count() > PATTERN_MATCH_MAX_CHARS {
            return None;
        }

        let likely_greeting = GREETING_WORDS.iter().any(|word| normalized.contains(word));

        let mut best: Option<(f64, &str)> = None;
        for intent in &self.pattern_guide.intents {
            if intent.id == "greeting" && !likely_greeting {
                continue;
            }
            for pattern in &intent.patterns {
                let score = sequence_ratio(&normalized, &pattern.to_lowercase());
                if score >= PATTERN_MATCH_CUTOFF && best.map(|(top, _)| score > top).unwrap_or(true)
                {
                    best = Some((score, &intent.response));
                }
            }
        }
        best.map(|(_, response)| response.to_string())
    }

    fn intents_json(&self) -> String {
        let intents = self
            .pattern_guide
            .intents
            .iter()
            .map(|intent| {
                serde_json::json!({
                    "id": intent.id,
                    "patterns": intent.patterns,
                    "response": intent.response,
                })
            })
            .collect::<Vec<_>>();
        serde_json::to_string_pretty(&intents).unwrap_or_default()
    }

    fn fee_responses(&self) -> String {
        self.pattern_guide
            .intents
            .iter()
            .filter(|intent| intent.id.starts_with("fees_"))
            .map(|intent| intent.response.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// Heuristic: treat the message as off-topic when it looks like code or is
/// mostly symbols rather than language.
fn is_off_topic_or_code(message: &str) -> bool {
    let msg = message.trim();
    if msg.chars().count() < 2 {
        return true;
    }
    let lower = msg.to_lowercase();

    if msg.contains("```")
        || lower.contains("def ")
        || lower.contains("function ")
        || lower.contains("import ")
    {
        return true;
    }
    if lower.contains("const ")
        || lower.contains("let ")
        || lower.contains("var ")
        || lower.contains("class ")
    {
        return true;
    }
    if msg.contains("=>")
        || msg.contains("->")
        || (msg.contains('{') && msg.contains('}') && (msg.contains('(') || msg.contains(';')))
    {
        return true;
    }

    let total = msg.chars().count();
    if total > 20 {
        let letters = msg
            .chars()
            .filter(|c| c.is_alphabetic() || c.is_whitespace())
            .count();
        if (letters as f64) / (total as f64) < 0.4 {
            return true;
        }
    }
    false
}

/// Ratcliff-Obershelp similarity of two strings in [0, 1]: twice the
/// recursively-matched character count over the combined length.
fn sequence_ratio(a: &str, b: &str) -> f64 {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let total = a_chars.len() + b_chars.len();
    if total == 0 {
        return 1.0;
    }
    2.0 * matching_chars(&a_chars, &b_chars) as f64 / total as f64
}

/// Characters covered by the longest common block plus, recursively, the
/// blocks on either side of it.
fn matching_chars(a: &[char], b: &[char]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }

    let mut best_len = 0usize;
    let mut best_a = 0usize;
    let mut best_b = 0usize;
    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];

    for (i, &a_ch) in a.iter().enumerate() {
        for (j, &b_ch) in b.iter().enumerate() {
            if a_ch == b_ch {
                curr[j + 1] = prev[j] + 1;
                if curr[j + 1] > best_len {
                    best_len = curr[j + 1];
                    best_a = i + 1 - best_len;
                    best_b = j + 1 - best_len;
                }
            } else {
                curr[j + 1] = 0;
            }
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    if best_len == 0 {
        return 0;
    }
    best_len
        + matching_chars(&a[..best_a], &b[..best_b])
        + matching_chars(&a[best_a + best_len..], &b[best_b + best_len..])
}

fn system_prompt(knowledge_base: &str, intents_json: &str, fee_responses: &str) -> String {
    format!(
        r#"You are Mavis, a helpful assistant for the Ministry of Works, Housing & Water Resources (MWHWR) in Ghana.
Your role is to provide accurate information about contractor classification and certification processes.

CRITICAL INSTRUCTIONS:
1. You have access to TWO information sources:
   - KNOWLEDGE BASE: Contains detailed guidelines, procedures, and general information
   - PATTERN GUIDE: Contains specific data like fees, contact info, and quick reference responses

2. ALWAYS use BOTH sources to answer questions:
   - For general information, procedures, requirements: Use the KNOWLEDGE BASE
   - For specific fees, contact details, quick facts: Use the PATTERN GUIDE
   - Combine information from both sources when answering complex questions

3. When answering fee questions:
   - The PATTERN GUIDE contains the exact fee amounts - USE THESE
   - Reference the KNOWLEDGE BASE for context about fee structure and validity periods
   - Never say fees are not available - they are in the PATTERN GUIDE below

4. Answer format:
   - Be comprehensive and cite information from both sources
   - Use the exact fee amounts from the PATTERN GUIDE
   - Reference the KNOWLEDGE BASE for procedures and requirements
   - Be professional, accurate, and helpful

5. If information is truly not in either source, acknowledge this and provide what you can from available sources

6. If the user's message is primarily code, or clearly unrelated to certification/ministry (e.g. general coding help, math, other topics), respond with exactly: "{off_topic}"

KNOWLEDGE BASE (Guidelines and Procedures):
{knowledge_base}

PATTERN GUIDE (Specific Data - Fees, Contact Info, Quick References):
{intents_json}

SPECIFIC FEE INFORMATION (for quick reference):
{fee_responses}

Remember: You are representing an official government ministry. Use ALL available information sources to provide complete, accurate answers."#,
        off_topic = OFF_TOPIC_RESPONSE,
    )
}
