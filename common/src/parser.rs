//! Quiz text parser
//!
//! Splits OCR text of a quiz screenshot into one question and an ordered
//! list of options. This is a heuristic over line shapes, not a grammar:
//! OCR noise can produce a wrong split, and the user fixes that by pasting
//! a cleaner capture.
//!
//! Rules:
//! 1. the first non-empty line starts the question
//! 2. a later line beginning with an option marker (`A.`, `b)`, `(C)`, `1.`, `2:`) is an option
//! 3. any other non-empty line is appended to the question

use crate::error::{Error, Result};
use regex::Regex;

/// Question and options extracted from quiz text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedQuiz {
    pub question: String,
    pub options: Vec<String>,
}

impl ParsedQuiz {
    /// A quiz needs a question and at least two options to be worth asking about.
    pub fn is_answerable(&self) -> bool {
        !self.question.is_empty() && self.options.len() >= 2
    }

    pub fn ensure_answerable(&self) -> Result<()> {
        if self.question.is_empty() {
            return Err(Error::Parse("no question text found".into()));
        }
        if self.options.len() < 2 {
            return Err(Error::Parse(format!(
                "expected at least 2 options, found {}",
                self.options.len()
            )));
        }
        Ok(())
    }
}

/// Strip an option marker from the start of a line.
///
/// Returns the option text when the line is an option, `None` otherwise.
///
/// # Examples
/// ```
/// use reading_companion_common::parser::strip_option_marker;
///
/// assert_eq!(strip_option_marker("B. 4"), Some("4"));
/// assert_eq!(strip_option_marker("(c) a cat"), Some("a cat"));
/// assert_eq!(strip_option_marker("What is 2+2?"), None);
/// ```
pub fn strip_option_marker(line: &str) -> Option<&str> {
    lazy_static::lazy_static! {
        // A. / a) / A: / (A) / 1. / 2) / (3)
        static ref OPTION_RE: Regex =
            Regex::new(r"^\s*(?:\(\s*(?:[A-Ja-j]|\d{1,2})\s*\)|(?:[A-Ja-j]|\d{1,2})\s*[.):])\s*(\S.*)$").unwrap();
    }

    OPTION_RE
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim_end())
}

/// Parse OCR text into a question and its options.
///
/// # Examples
/// ```
/// use reading_companion_common::parse_quiz_text;
///
/// let parsed = parse_quiz_text("What is 2+2?\nA. 3\nB. 4\nC. 5");
/// assert_eq!(parsed.question, "What is 2+2?");
/// assert_eq!(parsed.options, vec!["3", "4", "5"]);
/// ```
pub fn parse_quiz_text(raw_text: &str) -> ParsedQuiz {
    let mut question_parts: Vec<&str> = Vec::new();
    let mut options: Vec<String> = Vec::new();

    for line in raw_text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if question_parts.is_empty() {
            question_parts.push(line);
            continue;
        }
        match strip_option_marker(line) {
            Some(option) => options.push(option.to_string()),
            None => question_parts.push(line),
        }
    }

    ParsedQuiz {
        question: question_parts.join(" "),
        options,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic_lettered_options() {
        let parsed = parse_quiz_text("What is 2+2?\nA. 3\nB. 4\nC. 5");
        assert_eq!(parsed.question, "What is 2+2?");
        assert_eq!(parsed.options, vec!["3", "4", "5"]);
        assert!(parsed.is_answerable());
    }

    #[test]
    fn test_parse_multi_line_question() {
        let text = "\n\nWhy did Max run\nback to the house?\n\na) He was cold\nb) He forgot his bag\n";
        let parsed = parse_quiz_text(text);
        assert_eq!(parsed.question, "Why did Max run back to the house?");
        assert_eq!(parsed.options, vec!["He was cold", "He forgot his bag"]);
    }

    #[test]
    fn test_parse_numbered_and_parenthesised_markers() {
        let parsed = parse_quiz_text("Pick one\n1) red\n(2) green\n3: blue");
        assert_eq!(parsed.options, vec!["red", "green", "blue"]);
    }

    #[test]
    fn test_first_line_is_question_even_with_marker() {
        let parsed = parse_quiz_text("1. Who wrote the letter?\nA. Sam\nB. Ana");
        assert_eq!(parsed.question, "1. Who wrote the letter?");
        assert_eq!(parsed.options, vec!["Sam", "Ana"]);
    }

    #[test]
    fn test_unmatched_lines_join_question() {
        let parsed = parse_quiz_text("Choose the best title.\nA. Rain\nQuestion 3 of 10\nB. Sun");
        assert_eq!(parsed.question, "Choose the best title. Question 3 of 10");
        assert_eq!(parsed.options, vec!["Rain", "Sun"]);
    }

    #[test]
    fn test_parse_empty_text() {
        let parsed = parse_quiz_text("   \n\n");
        assert_eq!(parsed, ParsedQuiz::default());
        assert!(parsed.ensure_answerable().is_err());
    }

    #[test]
    fn test_question_without_options_is_not_answerable() {
        let parsed = parse_quiz_text("Describe the ending.");
        assert_eq!(parsed.question, "Describe the ending.");
        assert!(parsed.options.is_empty());
        let err = parsed.ensure_answerable().unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }

    #[test]
    fn test_strip_option_marker_rejects_words() {
        assert_eq!(strip_option_marker("A man walked in."), None);
        assert_eq!(strip_option_marker("Q1. What"), None);
        assert_eq!(strip_option_marker("B."), None);
        assert_eq!(strip_option_marker("  D.   last one  "), Some("last one"));
    }
}
