use regex::Regex;
use std::sync::LazyLock;

use crate::error::SplitError;

/// An option marker: a hyphen at the start of input or after whitespace,
/// followed by a key that starts with a letter (so `-5` stays positional).
static OPTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|\s)-(?P<key>[A-Za-z]\w*)").unwrap());

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOption {
    pub key: String,
    pub value: String,
}

/// A raw line broken into its leading verb, positional body and options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SplitInput {
    /// First whitespace-delimited token of the body, empty when there is none.
    pub command: String,
    /// Positional text before the first option marker, trimmed. Starts with `command`.
    pub body: String,
    /// Options in input order; keys may repeat.
    pub options: Vec<CommandOption>,
}

impl SplitInput {
    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }
}

fn strip_quotes(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}

pub fn split(text: &str) -> Result<SplitInput, SplitError> {
    let markers: Vec<(usize, usize, String)> = OPTION_RE
        .captures_iter(text)
        .filter_map(|caps| {
            let key = caps.name("key")?;
            // the hyphen sits right before the key
            Some((key.start() - 1, key.end(), key.as_str().to_string()))
        })
        .collect();

    let body_end = markers.first().map(|(start, _, _)| *start).unwrap_or(text.len());
    let body = text[..body_end].trim().to_string();
    let command = body.split_whitespace().next().unwrap_or_default().to_string();

    let mut options = Vec::with_capacity(markers.len());
    for (i, (_, value_start, key)) in markers.iter().enumerate() {
        let value_end = markers
            .get(i + 1)
            .map(|(start, _, _)| *start)
            .unwrap_or(text.len());
        let value = strip_quotes(text[*value_start..value_end].trim()).trim();
        if value.is_empty() {
            return Err(SplitError::EmptyOptionValue(key.clone()));
        }
        options.push(CommandOption {
            key: key.clone(),
            value: value.to_string(),
        });
    }

    Ok(SplitInput {
        command,
        body,
        options,
    })
}

/// The single value of `key`, if present. Repeating a single-valued option is an error.
pub fn extract_single(options: &[CommandOption], key: &str) -> Result<Option<String>, SplitError> {
    let mut values = options.iter().filter(|o| o.key == key);
    let first = values.next().map(|o| o.value.clone());
    if values.next().is_some() {
        return Err(SplitError::RepeatedOption(key.to_string()));
    }
    Ok(first)
}

pub fn extract_all(options: &[CommandOption], key: &str) -> Vec<String> {
    options
        .iter()
        .filter(|o| o.key == key)
        .map(|o| o.value.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_body_and_ordered_options() {
        let input = split("deadline buy milk -time 01/01/2030 2300 -tag urgent -tag home").unwrap();
        assert_eq!(input.command, "deadline");
        assert_eq!(input.body, "deadline buy milk");
        let keys: Vec<_> = input.options.iter().map(|o| o.key.as_str()).collect();
        assert_eq!(keys, vec!["time", "tag", "tag"]);
        assert_eq!(input.options[0].value, "01/01/2030 2300");
        assert_eq!(extract_all(&input.options, "tag"), vec!["urgent", "home"]);
    }

    #[test]
    fn hyphen_inside_words_is_not_a_marker() {
        let input = split("todo follow-up call -tag x-ray").unwrap();
        assert_eq!(input.body, "todo follow-up call");
        assert_eq!(input.options[0].value, "x-ray");
    }

    #[test]
    fn negative_numbers_stay_positional() {
        let input = split("reminder -5").unwrap();
        assert_eq!(input.body, "reminder -5");
        assert!(input.options.is_empty());
    }

    #[test]
    fn surrounding_quotes_are_removed() {
        let input = split(r#"addKeyword project -exp "project update""#).unwrap();
        assert_eq!(input.options[0].value, "project update");
    }

    #[test]
    fn empty_values_are_rejected() {
        assert_eq!(
            split("todo read -tag"),
            Err(SplitError::EmptyOptionValue("tag".into()))
        );
        assert_eq!(
            split("todo read -tag   -priority high"),
            Err(SplitError::EmptyOptionValue("tag".into()))
        );
    }

    #[test]
    fn empty_input_has_no_command() {
        let input = split("   ").unwrap();
        assert!(input.is_empty());
        assert_eq!(input.command, "");
    }

    #[test]
    fn single_valued_options() {
        let input = split("update 1 -priority high -priority low").unwrap();
        assert_eq!(
            extract_single(&input.options, "priority"),
            Err(SplitError::RepeatedOption("priority".into()))
        );
        assert_eq!(extract_single(&input.options, "time"), Ok(None));
    }
}
