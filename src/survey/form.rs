//! Survey form model
//!
//! Radio groups hold the multiple-choice answers, one group per question,
//! one radio per option. Each radio sits in a container whose background
//! is set when a spoken answer selects it. Free-text inputs hold dictated
//! text.

use super::question::Question;
use log::debug;
use std::collections::{BTreeMap, HashMap};

/// Background colour applied to a container when its radio is matched
pub const DEFAULT_HIGHLIGHT: &str = "#d3ffd3";

/// Element wrapping a radio button
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Container {
    /// Inline background-color style, if any
    pub background: Option<String>,
}

/// A single radio button
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Radio {
    pub value: String,
    pub checked: bool,
    pub container: Container,
}

impl Radio {
    fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            checked: false,
            container: Container::default(),
        }
    }
}

/// Radios sharing one name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RadioGroup {
    pub name: String,
    pub radios: Vec<Radio>,
}

impl RadioGroup {
    /// Value of the checked radio
    pub fn checked(&self) -> Option<&str> {
        self.radios
            .iter()
            .find(|r| r.checked)
            .map(|r| r.value.as_str())
    }
}

/// The survey form
#[derive(Debug, Clone)]
pub struct Form {
    groups: HashMap<String, RadioGroup>,
    inputs: HashMap<String, String>,
    highlight: String,
}

impl Form {
    /// Empty form using the default highlight colour
    pub fn new() -> Self {
        Self::with_highlight(DEFAULT_HIGHLIGHT)
    }

    pub fn with_highlight(highlight: impl Into<String>) -> Self {
        Self {
            groups: HashMap::new(),
            inputs: HashMap::new(),
            highlight: highlight.into(),
        }
    }

    /// Form with one radio group per question
    pub fn from_questions(questions: &[Question], highlight: impl Into<String>) -> Self {
        let mut form = Self::with_highlight(highlight);
        for question in questions {
            form.add_group(&question.id, &question.options);
        }
        form
    }

    /// Add (or replace) a radio group
    pub fn add_group<S: AsRef<str>>(&mut self, name: &str, values: &[S]) {
        let radios = values.iter().map(|v| Radio::new(v.as_ref())).collect();
        self.groups.insert(
            name.to_string(),
            RadioGroup {
                name: name.to_string(),
                radios,
            },
        );
    }

    /// Add an empty free-text input
    pub fn add_input(&mut self, id: &str) {
        self.inputs.entry(id.to_string()).or_default();
    }

    pub fn group(&self, name: &str) -> Option<&RadioGroup> {
        self.groups.get(name)
    }

    pub fn highlight(&self) -> &str {
        &self.highlight
    }

    /// Check the radio with `value` in group `name` and highlight its container
    ///
    /// Siblings are unchecked; highlights applied earlier are left alone.
    /// Returns false if no such radio exists, leaving the group untouched.
    pub fn select(&mut self, name: &str, value: &str) -> bool {
        let group = match self.groups.get_mut(name) {
            Some(group) => group,
            None => {
                debug!("No radio group named {}", name);
                return false;
            }
        };
        if !group.radios.iter().any(|r| r.value == value) {
            debug!("Group {} has no radio {:?}", name, value);
            return false;
        }

        for radio in &mut group.radios {
            radio.checked = radio.value == value;
            if radio.checked {
                radio.container.background = Some(self.highlight.clone());
            }
        }
        debug!("Selected {:?} for {}", value, name);
        true
    }

    /// Checked value of a radio group
    pub fn selected(&self, name: &str) -> Option<&str> {
        self.groups.get(name).and_then(RadioGroup::checked)
    }

    /// Set a free-text input; returns false if it does not exist
    pub fn set_input(&mut self, id: &str, value: &str) -> bool {
        match self.inputs.get_mut(id) {
            Some(slot) => {
                *slot = value.to_string();
                true
            }
            None => {
                debug!("No text input named {}", id);
                false
            }
        }
    }

    pub fn input(&self, id: &str) -> Option<&str> {
        self.inputs.get(id).map(String::as_str)
    }

    /// Current answers: checked radios and non-empty text inputs, by name
    pub fn answers(&self) -> BTreeMap<String, String> {
        let radios = self
            .groups
            .iter()
            .filter_map(|(name, group)| group.checked().map(|v| (name.clone(), v.to_string())));
        let inputs = self
            .inputs
            .iter()
            .filter(|(_, value)| !value.is_empty())
            .map(|(id, value)| (id.clone(), value.clone()));
        radios.chain(inputs).collect()
    }
}

impl Default for Form {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> Form {
        let mut form = Form::new();
        form.add_group("q1", &["yes", "no", "maybe"]);
        form
    }

    #[test]
    fn test_select_checks_and_highlights() {
        let mut form = form();
        assert!(form.select("q1", "no"));
        assert_eq!(form.selected("q1"), Some("no"));

        let group = form.group("q1").unwrap();
        assert_eq!(group.radios[1].container.background.as_deref(), Some(DEFAULT_HIGHLIGHT));
        assert_eq!(group.radios[0].container.background, None);
    }

    #[test]
    fn test_reselect_unchecks_sibling_keeps_highlight() {
        let mut form = form();
        form.select("q1", "no");
        form.select("q1", "maybe");

        let group = form.group("q1").unwrap();
        assert!(!group.radios[1].checked);
        assert!(group.radios[2].checked);
        assert!(group.radios[1].container.background.is_some());
    }

    #[test]
    fn test_select_unknown_leaves_form() {
        let mut form = form();
        form.select("q1", "yes");
        assert!(!form.select("q1", "never"));
        assert!(!form.select("q9", "yes"));
        assert_eq!(form.selected("q1"), Some("yes"));
    }

    #[test]
    fn test_inputs_and_answers() {
        let mut form = form();
        form.add_input("comments");
        form.add_input("name");
        assert!(form.set_input("comments", "great survey"));
        assert!(!form.set_input("missing", "x"));
        form.select("q1", "yes");

        let answers = form.answers();
        assert_eq!(answers.len(), 2);
        assert_eq!(answers["q1"], "yes");
        assert_eq!(answers["comments"], "great survey");
    }

    #[test]
    fn test_custom_highlight() {
        let questions = vec![Question::new("q1", "x", ["a", "b"]).unwrap()];
        let mut form = Form::from_questions(&questions, "#ffeeaa");
        form.select("q1", "b");
        assert_eq!(
            form.group("q1").unwrap().radios[1].container.background.as_deref(),
            Some("#ffeeaa")
        );
    }
}
