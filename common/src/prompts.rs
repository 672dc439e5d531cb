//! Prompt construction for quiz answering
//!
//! - SYSTEM_PROMPT: fixed instruction for every backend
//! - build_quiz_prompt: question + lettered options + optional book context
//! - trim_context: keeps the tail of long book transcripts

/// Instruction sent as the system message.
pub const SYSTEM_PROMPT: &str = "You are a reading comprehension assistant. \
Choose the single best answer option and respond only with the option letter \
and the full option text.";

/// Default budget for book context, in characters.
pub const DEFAULT_MAX_CONTEXT_CHARS: usize = 4000;

/// `0 -> 'A'`, `1 -> 'B'`, ... Indices past `Z` wrap.
pub fn option_letter(index: usize) -> char {
    (b'A' + (index % 26) as u8) as char
}

/// Keep at most `max_chars` characters from the end of `context`.
///
/// The most recently read pages matter most, so the head is dropped.
pub fn trim_context(context: &str, max_chars: usize) -> &str {
    let context = context.trim();
    let total = context.chars().count();
    if total <= max_chars {
        return context;
    }
    let skip = total - max_chars;
    let start = context
        .char_indices()
        .nth(skip)
        .map(|(i, _)| i)
        .unwrap_or(context.len());
    &context[start..]
}

/// Build the user message.
///
/// # Arguments
/// * `question` - quiz question text
/// * `options` - option texts in display order
/// * `context` - book transcript, already trimmed; `None` or blank to omit
pub fn build_quiz_prompt(question: &str, options: &[String], context: Option<&str>) -> String {
    let mut lines: Vec<String> = Vec::new();

    if let Some(context) = context.map(str::trim).filter(|c| !c.is_empty()) {
        lines.push("Use the following book transcript to answer the quiz question.".into());
        lines.push(String::new());
        lines.push("Book transcript:".into());
        lines.push(context.to_string());
        lines.push(String::new());
    }

    lines.push("Question:".into());
    lines.push(question.trim().to_string());
    lines.push(String::new());
    lines.push("Options:".into());
    for (index, option) in options.iter().enumerate() {
        lines.push(format!("{}. {}", option_letter(index), option));
    }
    lines.push(String::new());
    lines.push(
        "Choose the single best option and answer with the letter and full option text.".into(),
    );
    lines.join("\n")
}
