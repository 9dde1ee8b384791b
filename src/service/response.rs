//! Response shapes returned by the model service
//!
//! Generation bodies have changed shape across API versions. Each known
//! shape is a typed struct; they are tried in declaration order, empty text
//! never matches, and the raw payload is kept when none do.

use serde::Deserialize;
use serde_json::Value;

use crate::errors::ServiceError;

/// A string that fails to deserialize when empty
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct NonEmptyText(String);

impl TryFrom<String> for NonEmptyText {
    type Error = &'static str;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value.is_empty() {
            Err("empty text")
        } else {
            Ok(NonEmptyText(value))
        }
    }
}

/// `{"text": "..."}`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TextBody {
    text: NonEmptyText,
}

/// `{"output_text": "..."}`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OutputTextBody {
    output_text: NonEmptyText,
}

/// `{"output": [{"content": [{"text": "..."}]}]}`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OutputBody {
    output: Vec<OutputItem>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
struct OutputItem {
    content: Vec<OutputPart>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
struct OutputPart {
    text: NonEmptyText,
}

/// `{"candidates": [{"content": {"parts": [{"text": "..."}]}}]}`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CandidatePartsBody {
    candidates: Vec<PartsCandidate>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
struct PartsCandidate {
    content: CandidateContent,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
struct CandidateContent {
    parts: Vec<CandidatePart>,
}

/// Function calls and other non-text parts carry no `text`
#[derive(Debug, Clone, PartialEq, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

/// `{"candidates": [{"text": "..."}]}`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CandidateTextBody {
    candidates: Vec<TextCandidate>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
struct TextCandidate {
    text: NonEmptyText,
}

/// Known generation response shapes, tried top to bottom
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum GenerationResponse {
    Text(TextBody),
    OutputText(OutputTextBody),
    Output(OutputBody),
    CandidateParts(CandidatePartsBody),
    CandidateText(CandidateTextBody),
    /// Anything else
    Raw(Value),
}

impl GenerationResponse {
    pub fn from_value(value: Value) -> Self {
        match serde_json::from_value::<Self>(value.clone()) {
            Ok(GenerationResponse::Raw(_)) | Err(_) => GenerationResponse::Raw(value),
            // A matched shape with empty lists still has nothing to show
            Ok(response) if response.text().is_none() => GenerationResponse::Raw(value),
            Ok(response) => response,
        }
    }

    /// Text carried by a known shape; `None` for `Raw`
    pub fn text(&self) -> Option<String> {
        match self {
            GenerationResponse::Text(body) => Some(body.text.0.clone()),
            GenerationResponse::OutputText(body) => Some(body.output_text.0.clone()),
            GenerationResponse::Output(body) => body
                .output
                .first()
                .and_then(|item| item.content.first())
                .map(|part| part.text.0.clone()),
            GenerationResponse::CandidateParts(body) => body.candidates.first().and_then(|c| {
                let text: String = c
                    .content
                    .parts
                    .iter()
                    .filter_map(|part| part.text.as_deref())
                    .collect();
                (!text.is_empty()).then_some(text)
            }),
            GenerationResponse::CandidateText(body) => {
                body.candidates.first().map(|c| c.text.0.clone())
            }
            GenerationResponse::Raw(_) => None,
        }
    }

    /// The text to show the student
    pub fn into_text(self) -> String {
        match self.text() {
            Some(text) => text,
            None => match self {
                GenerationResponse::Raw(value) => value.to_string(),
                _ => String::new(),
            },
        }
    }
}

/// Extract one vector per input from an embedding response.
///
/// Accepts `{"embedding": {"values": [...]}}` and
/// `{"embeddings": [{"values": [...]}, ...]}`.
pub fn parse_embeddings(value: &Value, expected: usize) -> Result<Vec<Vec<f32>>, ServiceError> {
    let vectors = if let Some(values) = value.pointer("/embedding/values") {
        vec![parse_vector(values)?]
    } else if let Some(items) = value.get("embeddings").and_then(Value::as_array) {
        items
            .iter()
            .map(|item| {
                item.get("values")
                    .ok_or_else(|| ServiceError::malformed("embedding entry without values"))
                    .and_then(parse_vector)
            })
            .collect::<Result<Vec<_>, _>>()?
    } else {
        return Err(ServiceError::malformed(
            "response has neither `embedding` nor `embeddings`",
        ));
    };

    if vectors.len() != expected {
        return Err(ServiceError::malformed(format!(
            "expected {} embeddings, got {}",
            expected,
            vectors.len()
        )));
    }

    Ok(vectors)
}

fn parse_vector(values: &Value) -> Result<Vec<f32>, ServiceError> {
    values
        .as_array()
        .ok_or_else(|| ServiceError::malformed("embedding values is not an array"))?
        .iter()
        .map(|v| {
            v.as_f64()
                .map(|f| f as f32)
                .ok_or_else(|| ServiceError::malformed("non-numeric embedding value"))
        })
        .collect()
}
