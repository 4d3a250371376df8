//! Survey questions and question-file loading

use crate::{Result, VoxpollError};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// A multiple-choice question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// Form field name the answer is stored under
    pub id: String,
    /// Prompt read aloud
    #[serde(rename = "question", alias = "text")]
    pub text: String,
    /// Options in display order; order also breaks matching ties
    pub options: Vec<String>,
}

impl Question {
    /// Build a question, rejecting empty or duplicate options
    pub fn new<I, S>(id: impl Into<String>, text: impl Into<String>, options: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let question = Self {
            id: id.into(),
            text: text.into(),
            options: options.into_iter().map(Into::into).collect(),
        };
        question.validate()?;
        Ok(question)
    }

    /// Check the invariants a loaded question must hold
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(VoxpollError::Survey(format!(
                "question {:?} has an empty id",
                self.text
            )));
        }
        if self.options.is_empty() {
            return Err(VoxpollError::Survey(format!(
                "question {} has no options",
                self.id
            )));
        }
        let mut seen = HashSet::new();
        for option in &self.options {
            if option.trim().is_empty() {
                return Err(VoxpollError::Survey(format!(
                    "question {} has an empty option",
                    self.id
                )));
            }
            if !seen.insert(option.as_str()) {
                return Err(VoxpollError::Survey(format!(
                    "question {} repeats option {:?}",
                    self.id, option
                )));
            }
        }
        Ok(())
    }

    /// Text read aloud: the prompt followed by the options
    pub fn spoken_text(&self) -> String {
        format!("{}. Options: {}", self.text, self.options.join(", "))
    }
}

/// Parse a JSON array of questions
pub fn parse_questions(json: &str) -> Result<Vec<Question>> {
    let questions: Vec<Question> = serde_json::from_str(json)?;

    let mut ids = HashSet::new();
    for question in &questions {
        question.validate()?;
        if !ids.insert(question.id.as_str()) {
            return Err(VoxpollError::Survey(format!(
                "duplicate question id {}",
                question.id
            )));
        }
    }
    debug!("Parsed {} questions", questions.len());
    Ok(questions)
}

/// Load questions from a JSON file
pub fn load_questions(path: &Path) -> Result<Vec<Question>> {
    info!("Loading questions from {:?}", path);
    let json = fs::read_to_string(path)?;
    parse_questions(&json)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_questions() {
        let json = r#"[
            {"id": "q1", "question": "Do you enjoy coding?", "options": ["yes", "no"]},
            {"id": "q2", "text": "Favourite colour?", "options": ["red", "blue", "green"]}
        ]"#;
        let questions = parse_questions(json).unwrap();
        assert_eq!(questions.len(), 2);
        assert_eq!(questions[0].text, "Do you enjoy coding?");
        assert_eq!(questions[1].text, "Favourite colour?");
        assert_eq!(questions[1].options, vec!["red", "blue", "green"]);
    }

    #[test]
    fn test_spoken_text() {
        let q = Question::new("q1", "Do you agree", ["yes", "no", "maybe"]).unwrap();
        assert_eq!(q.spoken_text(), "Do you agree. Options: yes, no, maybe");
    }

    #[test]
    fn test_rejects_empty_options() {
        let options: Vec<String> = Vec::new();
        assert!(Question::new("q1", "Anything?", options).is_err());
        let json = r#"[{"id": "q1", "question": "x", "options": []}]"#;
        assert!(parse_questions(json).is_err());
    }

    #[test]
    fn test_rejects_duplicates() {
        assert!(Question::new("q1", "x", ["yes", "yes"]).is_err());
        let json = r#"[
            {"id": "q1", "question": "a", "options": ["yes"]},
            {"id": "q1", "question": "b", "options": ["no"]}
        ]"#;
        assert!(parse_questions(json).is_err());
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            parse_questions("{not json"),
            Err(VoxpollError::Json(_))
        ));
    }
}
