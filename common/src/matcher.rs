//! Matching a free-text model answer back to one of the supplied options
//!
//! Order of attempts:
//! 1. letter label: `B`, `B.`, `(B)`, `b) ...`, `Answer: B`, `Option B`.
//!    A label past the last option only matches an option that reads exactly
//!    like it.
//! 2. option text (case-insensitive, whitespace-collapsed): exact, then the
//!    longest option the reply starts with, then the one option a truncated
//!    reply of whole words starts
//! 3. bare letter followed by the text of that same option: `B 4`
//!
//! Two options matching equally well count as no match. The caller then shows
//! the raw response instead.

use regex::Regex;

fn normalize(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Remove lead-ins such as "Answer:", "The correct answer is" and markdown emphasis.
fn strip_lead_in(response: &str) -> String {
    lazy_static::lazy_static! {
        static ref LEAD_IN_RE: Regex = Regex::new(
            r"^(?:the\s+)?(?:correct\s+|best\s+|final\s+)?(?:answer|option|choice)\b(?:\s+is\b\s*[:\-]?|\s*[:\-])\s*"
        ).unwrap();
        static ref LEAD_IN_LABEL_RE: Regex = Regex::new(
            r"^(?:the\s+)?(?:correct\s+|best\s+|final\s+)?(?:answer|option|choice)\s+(\(?[a-z](?:\s*[).:].*|\)?))$"
        ).unwrap();
    }

    let cleaned: String = response
        .chars()
        .filter(|c| !matches!(c, '*' | '"' | '`'))
        .collect();
    let normalized = normalize(&cleaned);
    if LEAD_IN_RE.is_match(&normalized) {
        return LEAD_IN_RE.replace(&normalized, "").trim().to_string();
    }
    match LEAD_IN_LABEL_RE.captures(&normalized).and_then(|caps| caps.get(1)) {
        Some(label) => label.as_str().trim().to_string(),
        None => normalized,
    }
}

fn letter_index(letter: char, option_count: usize) -> Option<usize> {
    let index = (letter as u32).checked_sub('a' as u32)? as usize;
    (index < option_count).then_some(index)
}

fn label_letter(response: &str) -> Option<char> {
    lazy_static::lazy_static! {
        static ref LABEL_RE: Regex = Regex::new(r"^\(?([a-z])(?:\s*[).:]|\)?$)").unwrap();
    }

    LABEL_RE.captures(response)?.get(1)?.as_str().chars().next()
}

/// `prefix` starts `text` and ends on a word boundary of it.
fn is_word_prefix(text: &str, prefix: &str) -> bool {
    !prefix.is_empty()
        && text.starts_with(prefix)
        && text[prefix.len()..]
            .chars()
            .next()
            .map_or(true, |c| !c.is_alphanumeric())
}

fn single(indices: Vec<usize>) -> Option<usize> {
    match indices.as_slice() {
        [index] => Some(*index),
        _ => None,
    }
}

fn exact_match(response: &str, normalized: &[String]) -> Option<usize> {
    single(
        normalized
            .iter()
            .enumerate()
            .filter(|(_, option)| !option.is_empty() && option.as_str() == response)
            .map(|(index, _)| index)
            .collect(),
    )
}

fn text_match(response: &str, normalized: &[String]) -> Option<usize> {
    if normalized.iter().any(|option| option == response) {
        return exact_match(response, normalized);
    }

    let contained: Vec<(usize, usize)> = normalized
        .iter()
        .enumerate()
        .filter(|(_, option)| is_word_prefix(response, option))
        .map(|(index, option)| (index, option.len()))
        .collect();
    if let Some(longest) = contained.iter().map(|(_, len)| *len).max() {
        return single(
            contained
                .into_iter()
                .filter(|(_, len)| *len == longest)
                .map(|(index, _)| index)
                .collect(),
        );
    }

    // reply cut off inside an option
    single(
        normalized
            .iter()
            .enumerate()
            .filter(|(_, option)| is_word_prefix(option, response))
            .map(|(index, _)| index)
            .collect(),
    )
}

fn bare_letter_with_text(response: &str, normalized: &[String]) -> Option<usize> {
    let mut chars = response.chars();
    let letter = chars.next()?;
    let rest = chars.as_str();
    if !rest.starts_with(' ') {
        return None;
    }
    let index = letter_index(letter, normalized.len())?;
    let rest = rest.trim();
    let option = &normalized[index];
    (is_word_prefix(rest, option) || is_word_prefix(option, rest)).then_some(index)
}

/// Find the option a model response refers to.
///
/// # Examples
/// ```
/// use reading_companion_common::match_answer;
///
/// let options = vec!["3".to_string(), "4".to_string(), "5".to_string()];
/// assert_eq!(match_answer("B. 4", &options), Some(1));
/// assert_eq!(match_answer("I am not sure.", &options), None);
/// ```
pub fn match_answer(response: &str, options: &[String]) -> Option<usize> {
    if options.is_empty() {
        return None;
    }
    let response = strip_lead_in(response);
    if response.is_empty() {
        return None;
    }
    let normalized: Vec<String> = options.iter().map(|o| normalize(o)).collect();

    if let Some(letter) = label_letter(&response) {
        return letter_index(letter, options.len())
            .or_else(|| exact_match(&response, &normalized));
    }

    text_match(&response, &normalized).or_else(|| bare_letter_with_text(&response, &normalized))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_letter_with_text() {
        assert_eq!(match_answer("B. 4", &opts(&["3", "4", "5"])), Some(1));
    }

    #[test]
    fn test_letter_variants() {
        let options = opts(&["red", "green", "blue"]);
        assert_eq!(match_answer("C", &options), Some(2));
        assert_eq!(match_answer("(a) red", &options), Some(0));
        assert_eq!(match_answer("b) green", &options), Some(1));
        assert_eq!(match_answer("Answer: C. blue", &options), Some(2));
        assert_eq!(match_answer("**B. green**", &options), Some(1));
        assert_eq!(match_answer("The correct answer is A: red", &options), Some(0));
    }

    #[test]
    fn test_letter_out_of_range_with_text() {
        let options = opts(&["yes", "no"]);
        assert_eq!(match_answer("D. maybe", &options), None);
    }

    #[test]
    fn test_text_only_case_insensitive() {
        let options = opts(&["He was cold", "He forgot his bag"]);
        assert_eq!(match_answer("he forgot his BAG", &options), Some(1));
        assert_eq!(match_answer("He forgot his bag at school.", &options), Some(1));
    }

    #[test]
    fn test_longest_prefix_wins() {
        let options = opts(&["4", "40"]);
        assert_eq!(match_answer("40 apples", &options), Some(1));
    }

    #[test]
    fn test_option_starting_with_article() {
        let options = opts(&["The dog", "A cat ran away"]);
        assert_eq!(match_answer("A cat ran away", &options), Some(1));
    }

    #[test]
    fn test_bare_letter_then_text() {
        let options = opts(&["sunny", "rainy"]);
        assert_eq!(match_answer("B rainy", &options), Some(1));
    }

    #[test]
    fn test_out_of_range_label_is_not_text() {
        let options = opts(&["Dog", "Cat", "Bird"]);
        assert_eq!(match_answer("D", &options), None);
        assert_eq!(match_answer("(E)", &options), None);
        assert_eq!(match_answer("Answer: D", &options), None);
    }

    #[test]
    fn test_single_letter_option_text() {
        let options = opts(&["x", "y"]);
        assert_eq!(match_answer("y", &options), Some(1));
    }

    #[test]
    fn test_truncated_reply_shared_by_options() {
        let options = opts(&["The dog ran", "The cat sat"]);
        assert_eq!(match_answer("The", &options), None);
        assert_eq!(match_answer("The cat", &options), Some(1));
        assert_eq!(match_answer("The c", &options), None);
    }

    #[test]
    fn test_tied_options_are_ambiguous() {
        let options = opts(&["Rain", "rain", "Snow"]);
        assert_eq!(match_answer("rain", &options), None);
        assert_eq!(match_answer("Rain all day", &options), None);
        assert_eq!(match_answer("Snow", &options), Some(2));
    }

    #[test]
    fn test_options_starting_with_lead_in_words() {
        let options = opts(&["Optional homework", "Required reading"]);
        assert_eq!(match_answer("Optional homework", &options), Some(0));

        let options = opts(&["The choice was hard", "It was easy"]);
        assert_eq!(match_answer("The choice was hard", &options), Some(0));

        let options = opts(&["Answers were hidden", "Nothing changed"]);
        assert_eq!(match_answer("Answers were hidden", &options), Some(0));
    }

    #[test]
    fn test_lead_in_needs_separator_or_label() {
        let options = opts(&["red", "green", "blue"]);
        assert_eq!(match_answer("Option B", &options), Some(1));
        assert_eq!(match_answer("The answer is: C", &options), Some(2));
        assert_eq!(match_answer("Choice - A. red", &options), Some(0));
    }

    #[test]
    fn test_unmatched_returns_none() {
        let options = opts(&["3", "4", "5"]);
        assert_eq!(match_answer("I cannot tell from the text.", &options), None);
        assert_eq!(match_answer("", &options), None);
        assert_eq!(match_answer("B. 4", &[]), None);
    }
}
