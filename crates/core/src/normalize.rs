//! Normalization of raw model output into the canonical quiz schema.
//!
//! Generative-model output is not contractually typed: it arrives fenced in
//! markdown, wrapped in prose, with aliased keys, dict-shaped options and
//! letter-encoded answers. This module applies a fixed, ordered list of
//! rewrite rules to the untyped `serde_json::Value` tree and only then
//! constructs the strongly-typed `Quiz`. The untyped tree never leaves this
//! module.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::error::Error;
use crate::model::{Choice, ItemId, OPTION_COUNT, Quiz, QuizItem};
use crate::validate::{SchemaError, Violation, ViolationRule};

/// Maximum number of characters of offending text carried by a `ParseError`.
const SNIPPET_LEN: usize = 500;

/// Maximum number of characters of fallback topic text used for a synthesized topic.
const TOPIC_LEN: usize = 100;

/// Topic used when the model names none and no fallback text is available.
const GENERIC_TOPIC: &str = "General Quiz";

//
// ─── PARSE ERROR ──────────────────────────────────────────────────────────────
//

/// Raw text is not JSON and the brace-extraction recovery also failed.
///
/// Carries the first 500 characters of the offending text so the failure can
/// be diagnosed against the originating model output. Not retryable: the
/// caller must request fresh output.
#[derive(Debug, Error)]
#[error("quiz text is not valid JSON ({source}); output begins: {snippet:?}")]
pub struct ParseError {
    pub snippet: String,
    #[source]
    pub source: serde_json::Error,
}

//
// ─── ENTRY POINT ──────────────────────────────────────────────────────────────
//

/// Converts loosely-structured model output into a canonical `Quiz`.
///
/// `fallback_topic` and `fallback_level` fill in the corresponding fields
/// when the output omits them. Pure function: no I/O, safe to call
/// repeatedly over unrelated inputs.
///
/// # Errors
///
/// Returns `Error::Parse` when the text is not JSON even after extracting
/// the outermost `{...}` span, and `Error::Schema` when it parses but
/// violates the quiz schema.
pub fn normalize(raw: &str, fallback_topic: &str, fallback_level: &str) -> Result<Quiz, Error> {
    let stripped = strip_code_fence(raw);
    let root = parse_with_recovery(stripped)?;

    let Value::Object(mut map) = root else {
        return Err(schema(Violation::quiz(ViolationRule::MissingItems)));
    };

    // Top-level key aliasing, applied once, not recursively. An aliased key
    // overwrites its target when both are present.
    if let Some(items) = map.remove("questions") {
        map.insert("items".to_owned(), items);
    }
    if let Some(topic) = map.remove("quiz_name") {
        map.insert("topic".to_owned(), topic);
    }

    let topic = match map.get("topic").and_then(Value::as_str) {
        Some(topic) => topic.to_owned(),
        None => synthesize_topic(fallback_topic),
    };
    let level = map
        .get("level")
        .and_then(Value::as_str)
        .unwrap_or(fallback_level)
        .to_owned();

    let Some(Value::Array(raw_items)) = map.remove("items") else {
        return Err(schema(Violation::quiz(ViolationRule::MissingItems)));
    };

    // An empty sequence is accepted: the result is a zero-item quiz and the
    // caller decides how to surface it.
    let mut items = Vec::with_capacity(raw_items.len());
    for (index, raw_item) in raw_items.into_iter().enumerate() {
        items.push(normalize_item(raw_item, index)?);
    }

    Ok(Quiz {
        topic,
        level,
        items,
    })
}

//
// ─── TEXT RECOVERY ────────────────────────────────────────────────────────────
//

/// Strips a markdown code fence the model sometimes wraps its output in,
/// despite instructions not to.
fn strip_code_fence(raw: &str) -> &str {
    let mut text = raw.trim();
    if let Some(rest) = text.strip_prefix("```json") {
        text = rest.trim();
    } else if let Some(rest) = text.strip_prefix("```") {
        text = rest.trim();
    }
    if let Some(rest) = text.strip_suffix("```") {
        text = rest.trim();
    }
    text
}

/// Direct parse, then a single retry on the outermost `{...}` span.
fn parse_with_recovery(text: &str) -> Result<Value, ParseError> {
    let direct_err = match serde_json::from_str(text) {
        Ok(value) => return Ok(value),
        Err(err) => err,
    };

    // The model may have surrounded the JSON with prose. One retry only.
    if let (Some(open), Some(close)) = (text.find('{'), text.rfind('}')) {
        if open < close {
            if let Ok(value) = serde_json::from_str(&text[open..=close]) {
                return Ok(value);
            }
        }
    }

    Err(ParseError {
        snippet: text.chars().take(SNIPPET_LEN).collect(),
        source: direct_err,
    })
}

fn synthesize_topic(fallback_topic: &str) -> String {
    let trimmed = fallback_topic.trim();
    if trimmed.is_empty() {
        GENERIC_TOPIC.to_owned()
    } else {
        trimmed.chars().take(TOPIC_LEN).collect()
    }
}

//
// ─── PER-ITEM RULES ───────────────────────────────────────────────────────────
//

/// Applies the per-item rewrite rules in their fixed order. `index` is the
/// zero-based position; positional defaults use the 1-based position.
fn normalize_item(raw_item: Value, index: usize) -> Result<QuizItem, Error> {
    let Value::Object(mut item) = raw_item else {
        return Err(schema(Violation::item(index, ViolationRule::MissingQuestion)));
    };

    // (a) question_text -> question; question must exist afterwards.
    if let Some(text) = item.remove("question_text") {
        item.insert("question".to_owned(), text);
    }
    let Some(question) = item.get("question").and_then(Value::as_str) else {
        return Err(schema(Violation::item(index, ViolationRule::MissingQuestion)));
    };
    let question = question.to_owned();

    // (b) dict-shaped options -> ordered sequence keyed A-D.
    // (c) exactly four entries afterwards.
    let options = normalize_options(item.get("options"), index)?;

    // (d) letter-encoded answer wins over a numeric index when both appear.
    // (e) answer_index must be an integer in range afterwards.
    let answer_index = normalize_answer(&mut item, index)?;

    // (f) question_number -> positional id; (g) default to the 1-based position.
    let id = match item.remove("question_number") {
        Some(number) => ItemId::new(format!("q{}", plain_text(&number))),
        None => match item.get("id") {
            Some(id) => ItemId::new(plain_text(id)),
            None => ItemId::positional(index + 1),
        },
    };

    // (h) defaults.
    let explanation = item
        .get("explanation")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_owned();
    let tags = match item.get("tags") {
        Some(Value::Array(tags)) => tags
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_owned)
            .collect(),
        _ => Vec::new(),
    };

    Ok(QuizItem {
        id,
        question,
        options,
        answer_index,
        explanation,
        tags,
    })
}

fn normalize_options(raw: Option<&Value>, index: usize) -> Result<Vec<String>, Error> {
    let options: Vec<String> = match raw {
        Some(Value::Object(map)) => ["A", "B", "C", "D"]
            .iter()
            .map(|letter| map.get(*letter).map(option_text).unwrap_or_default())
            .collect(),
        Some(Value::Array(entries)) => entries.iter().map(option_text).collect(),
        _ => {
            return Err(schema(Violation::item(
                index,
                ViolationRule::WrongOptionCount { found: 0 },
            )));
        }
    };

    if options.len() != OPTION_COUNT {
        return Err(schema(Violation::item(
            index,
            ViolationRule::WrongOptionCount {
                found: options.len(),
            },
        )));
    }
    Ok(options)
}

fn normalize_answer(item: &mut Map<String, Value>, index: usize) -> Result<usize, Error> {
    if let Some(letter) = item.remove("correct_answer") {
        let choice = letter
            .as_str()
            .ok_or(())
            .and_then(|raw| Choice::from_letter(raw).map_err(|_| ()))
            .map_err(|()| {
                schema(Violation::item(
                    index,
                    ViolationRule::InvalidAnswerLetter {
                        found: plain_text(&letter),
                    },
                ))
            })?;
        return Ok(choice.index());
    }

    let Some(answer_index) = item.get("answer_index").and_then(Value::as_i64) else {
        return Err(schema(Violation::item(
            index,
            ViolationRule::MissingAnswerIndex,
        )));
    };
    if !(0..OPTION_COUNT as i64).contains(&answer_index) {
        return Err(schema(Violation::item(
            index,
            ViolationRule::AnswerIndexOutOfRange {
                found: answer_index,
            },
        )));
    }
    Ok(answer_index as usize)
}

//
// ─── VALUE COERCION ───────────────────────────────────────────────────────────
//

/// Renders a JSON value as option/id text: strings pass through, null is
/// empty, anything else keeps its JSON rendering.
fn plain_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn option_text(value: &Value) -> String {
    plain_text(value)
}

fn schema(violation: Violation) -> Error {
    Error::Schema(SchemaError::single(violation))
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
