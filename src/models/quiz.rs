use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const OPTION_LABELS: [&str; 4] = ["A", "B", "C", "D"];

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum QuizError {
    #[error("{0}")]
    InvalidResponse(String),
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct QuizQuestion {
    pub question: String,
    /// Option text keyed by label `A`..`D`.
    pub options: BTreeMap<String, String>,
    pub answer: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawOptions {
    Labeled(BTreeMap<String, String>),
    Listed(Vec<String>),
}

#[derive(Deserialize)]
struct RawQuestion {
    question: String,
    options: RawOptions,
    #[serde(alias = "correct", alias = "correct_answer", alias = "correct_option")]
    answer: String,
}

/// Validates a model reply as a JSON array of multiple-choice questions.
pub fn parse_quiz(raw: &str) -> Result<Vec<QuizQuestion>, QuizError> {
    let json = extract_json_array(raw)
        .ok_or_else(|| QuizError::InvalidResponse("response contains no JSON array".into()))?;

    let items: Vec<RawQuestion> = serde_json::from_str(json)
        .map_err(|e| QuizError::InvalidResponse(format!("malformed quiz JSON: {e}")))?;

    if items.is_empty() {
        return Err(QuizError::InvalidResponse("quiz array is empty".into()));
    }

    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| validate_question(item).map_err(|reason| {
            QuizError::InvalidResponse(format!("question {}: {reason}", i + 1))
        }))
        .collect()
}

fn extract_json_array(raw: &str) -> Option<&str> {
    let start = raw.find('[')?;
    let end = raw.rfind(']')?;
    (start < end).then(|| &raw[start..=end])
}

fn validate_question(item: RawQuestion) -> Result<QuizQuestion, String> {
    let question = item.question.trim().to_string();
    if question.is_empty() {
        return Err("question text is empty".into());
    }

    let options: BTreeMap<String, String> = match item.options {
        RawOptions::Labeled(map) => map
            .into_iter()
            .map(|(label, text)| (normalize_label(&label), text.trim().to_string()))
            .collect(),
        RawOptions::Listed(list) if list.len() != OPTION_LABELS.len() => {
            return Err("expected exactly four options labelled A-D".into());
        }
        RawOptions::Listed(list) => OPTION_LABELS
            .iter()
            .map(|l| l.to_string())
            .zip(list.into_iter().map(|t| t.trim().to_string()))
            .collect(),
    };

    let has_all_labels = options.len() == OPTION_LABELS.len()
        && OPTION_LABELS.iter().all(|l| options.contains_key(*l));
    if !has_all_labels {
        return Err("expected exactly four options labelled A-D".into());
    }
    if options.values().any(|t| t.is_empty()) {
        return Err("option text is empty".into());
    }

    let answer = normalize_label(&item.answer);
    if !options.contains_key(&answer) {
        return Err(format!("answer '{}' is not one of A-D", item.answer.trim()));
    }

    Ok(QuizQuestion {
        question,
        options,
        answer,
    })
}

/// Accepts `"b"`, `"B)"`, `"(B)"` or `"B. text"` as label `B`.
fn normalize_label(label: &str) -> String {
    let trimmed = label.trim().trim_start_matches('(');
    let mut chars = trimmed.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => c.to_ascii_uppercase().to_string(),
        (Some(c), Some(next)) if !next.is_alphanumeric() => c.to_ascii_uppercase().to_string(),
        _ => trimmed.to_uppercase(),
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct QuestionResult {
    pub question: String,
    pub selected: Option<String>,
    pub answer: String,
    pub correct: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct QuizGrade {
    pub score: usize,
    pub total: usize,
    pub results: Vec<QuestionResult>,
}

/// Missing or unrecognised answers count as wrong.
pub fn grade_quiz(quiz: &[QuizQuestion], answers: &[Option<String>]) -> QuizGrade {
    let results: Vec<QuestionResult> = quiz
        .iter()
        .enumerate()
        .map(|(i, q)| {
            let selected = answers
                .get(i)
                .cloned()
                .flatten()
                .map(|a| normalize_label(&a))
                .filter(|a| !a.is_empty());
            let correct = selected.as_deref() == Some(q.answer.as_str());
            QuestionResult {
                question: q.question.clone(),
                selected,
                answer: q.answer.clone(),
                correct,
            }
        })
        .collect();

    QuizGrade {
        score: results.iter().filter(|r| r.correct).count(),
        total: quiz.len(),
        results,
    }
}
