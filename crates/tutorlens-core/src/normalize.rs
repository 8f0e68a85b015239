//! Turns raw model output into a validated [`Analysis`].
//!
//! Models frequently wrap JSON in Markdown code fences even when told not
//! to, so parsing is preceded by a fence-stripping pass. Validation is
//! strict: a response missing the explanation or the quiz is rejected
//! rather than rendered half-empty.

use serde::{Deserialize, Serialize};

use crate::prompt::{self, Language};

/// Fully validated tutoring result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    pub answer: String,
    pub explanation: String,
    pub quiz: Quiz,
}

/// Self-contained multiple-choice question with exactly four options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quiz {
    pub question: String,
    pub options: Vec<String>,
    #[serde(rename = "correctIndex")]
    pub correct_index: usize,
    pub explanation: String,
}

#[derive(Debug, thiserror::Error)]
pub enum NormalizeError {
    #[error("response is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("required field missing or empty: {0}")]
    MissingField(&'static str),
    #[error("quiz must have exactly 4 options, got {0}")]
    OptionCount(usize),
    #[error("quiz correctIndex {index} out of range for {options} options")]
    IndexOutOfRange { index: usize, options: usize },
}

#[derive(Debug, Default, Deserialize)]
struct RawAnalysis {
    #[serde(default)]
    answer: Option<String>,
    #[serde(default)]
    explanation: Option<String>,
    #[serde(default)]
    quiz: Option<RawQuiz>,
}

#[derive(Debug, Default, Deserialize)]
struct RawQuiz {
    #[serde(default)]
    question: Option<String>,
    #[serde(default)]
    options: Vec<String>,
    #[serde(default, rename = "correctIndex")]
    correct_index: Option<usize>,
    #[serde(default)]
    explanation: Option<String>,
}

/// Removes a surrounding Markdown code fence, if present.
///
/// Handles ```` ```json ````, bare ```` ``` ````, and a language tag with no
/// newline after it. Text without fences passes through untouched.
#[must_use]
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the language tag up to the first newline.
    let body = match rest.find('\n') {
        Some(pos) => &rest[pos + 1..],
        None => rest.trim_start_matches("json"),
    };
    body.trim_end_matches("```").trim()
}

/// Parses and validates raw model output into an [`Analysis`].
///
/// A missing or empty `answer` is replaced with a localized placeholder;
/// every other gap is an error.
pub fn normalize(raw: &str, lang: Language) -> Result<Analysis, NormalizeError> {
    let parsed: RawAnalysis = serde_json::from_str(strip_code_fences(raw))?;

    let explanation = parsed
        .explanation
        .filter(|s| !s.trim().is_empty())
        .ok_or(NormalizeError::MissingField("explanation"))?;

    let quiz = parsed.quiz.ok_or(NormalizeError::MissingField("quiz"))?;
    let question = quiz
        .question
        .filter(|s| !s.trim().is_empty())
        .ok_or(NormalizeError::MissingField("quiz.question"))?;
    let quiz_explanation = quiz
        .explanation
        .filter(|s| !s.trim().is_empty())
        .ok_or(NormalizeError::MissingField("quiz.explanation"))?;
    if quiz.options.len() != 4 {
        return Err(NormalizeError::OptionCount(quiz.options.len()));
    }
    let correct_index = quiz
        .correct_index
        .ok_or(NormalizeError::MissingField("quiz.correctIndex"))?;
    if correct_index >= quiz.options.len() {
        return Err(NormalizeError::IndexOutOfRange {
            index: correct_index,
            options: quiz.options.len(),
        });
    }

    let answer = parsed
        .answer
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| prompt::default_answer(lang).to_owned());

    Ok(Analysis {
        answer,
        explanation,
        quiz: Quiz {
            question,
            options: quiz.options,
            correct_index,
            explanation: quiz_explanation,
        },
    })
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn valid_json() -> String {
        serde_json::json!({
            "answer": "x = 5",
            "explanation": "Subtract 3 from both sides.",
            "quiz": {
                "question": "Solve 2y + 1 = 7. What is y?",
                "options": ["1", "2", "3", "4"],
                "correctIndex": 2,
                "explanation": "2y = 6 so y = 3."
            }
        })
        .to_string()
    }

    #[test]
    fn plain_json_parses() {
        let analysis = normalize(&valid_json(), Language::En).unwrap();
        assert_eq!(analysis.answer, "x = 5");
        assert_eq!(analysis.quiz.correct_index, 2);
        assert_eq!(analysis.quiz.options.len(), 4);
    }

    #[test]
    fn fenced_json_equals_plain() {
        let plain = normalize(&valid_json(), Language::En).unwrap();
        let fenced = format!("```json\n{}\n```", valid_json());
        assert_eq!(normalize(&fenced, Language::En).unwrap(), plain);
    }

    #[test]
    fn fence_without_language_tag() {
        let fenced = format!("```\n{}\n```", valid_json());
        assert!(normalize(&fenced, Language::En).is_ok());
    }

    #[test]
    fn fence_without_newline_after_tag() {
        let fenced = format!("```json{}```", valid_json());
        assert!(normalize(&fenced, Language::En).is_ok());
    }

    #[test]
    fn missing_answer_gets_english_placeholder() {
        let mut value: serde_json::Value = serde_json::from_str(&valid_json()).unwrap();
        value.as_object_mut().unwrap().remove("answer");
        let analysis = normalize(&value.to_string(), Language::En).unwrap();
        assert_eq!(analysis.answer, "See explanation below");
    }

    #[test]
    fn missing_answer_gets_chinese_placeholder() {
        let mut value: serde_json::Value = serde_json::from_str(&valid_json()).unwrap();
        value["answer"] = serde_json::Value::String("  ".into());
        let analysis = normalize(&value.to_string(), Language::Zh).unwrap();
        assert_eq!(analysis.answer, "见详细解析");
    }

    #[test]
    fn missing_explanation_rejected() {
        let mut value: serde_json::Value = serde_json::from_str(&valid_json()).unwrap();
        value.as_object_mut().unwrap().remove("explanation");
        assert!(matches!(
            normalize(&value.to_string(), Language::En).unwrap_err(),
            NormalizeError::MissingField("explanation")
        ));
    }

    #[test]
    fn missing_quiz_rejected() {
        let mut value: serde_json::Value = serde_json::from_str(&valid_json()).unwrap();
        value.as_object_mut().unwrap().remove("quiz");
        assert!(matches!(
            normalize(&value.to_string(), Language::En).unwrap_err(),
            NormalizeError::MissingField("quiz")
        ));
    }

    #[test]
    fn wrong_option_count_rejected() {
        let mut value: serde_json::Value = serde_json::from_str(&valid_json()).unwrap();
        value["quiz"]["options"] = serde_json::json!(["only", "three", "options"]);
        assert!(matches!(
            normalize(&value.to_string(), Language::En).unwrap_err(),
            NormalizeError::OptionCount(3)
        ));
    }

    #[test]
    fn out_of_range_index_rejected() {
        let mut value: serde_json::Value = serde_json::from_str(&valid_json()).unwrap();
        value["quiz"]["correctIndex"] = serde_json::json!(4);
        assert!(matches!(
            normalize(&value.to_string(), Language::En).unwrap_err(),
            NormalizeError::IndexOutOfRange {
                index: 4,
                options: 4
            }
        ));
    }

    #[test]
    fn missing_index_rejected() {
        let mut value: serde_json::Value = serde_json::from_str(&valid_json()).unwrap();
        value["quiz"].as_object_mut().unwrap().remove("correctIndex");
        assert!(matches!(
            normalize(&value.to_string(), Language::En).unwrap_err(),
            NormalizeError::MissingField("quiz.correctIndex")
        ));
    }

    #[test]
    fn non_json_is_parse_error() {
        assert!(matches!(
            normalize("I cannot help with that.", Language::En).unwrap_err(),
            NormalizeError::Parse(_)
        ));
    }

    proptest! {
        // Fencing valid JSON must never change the parsed result.
        #[test]
        fn fencing_is_transparent(tag in "(json)?", pad in "[ \t\n]{0,4}") {
            let plain = normalize(&valid_json(), Language::En).unwrap();
            let fenced = format!("```{tag}\n{}{pad}```", valid_json());
            prop_assert_eq!(normalize(&fenced, Language::En).unwrap(), plain);
        }
    }
}
