use regex::Regex;
use std::sync::LazyLock;

use super::options::{SplitInput, extract_all};
use super::{Domain, INVALID_INDEX_MSG, IndexError, ParseContext, index_arg, parse_index};
use crate::command::{Command, EmailCommand};
use crate::core::email_list::SortOrder;
use crate::core::keyword::KeywordPair;
use crate::error::EmailParseError;

static ADD_KEYWORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^addKeyword\s+(?P<keyword>[\w\s]+)$").unwrap());

static FUZZY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^fuzzySearch\s+(?P<target>\S+)\s*$").unwrap());

static SORT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^sort\s+(?P<order>time|relevance)\s*$").unwrap());

const MAX_FILTER_TAGS: usize = 2;

/// Index of `verb I` checked against the email list. Malformed text is an
/// invalid command; a well-formed index that does not fit is an error.
fn email_index(
    input: &SplitInput,
    verb: &str,
    ctx: &ParseContext,
) -> Result<Result<usize, Command>, EmailParseError> {
    let Some(digits) = index_arg(&input.body, verb) else {
        return Ok(Err(Command::invalid(format!(
            "Please enter an email index after '{}', e.g. '{} 1'.",
            verb, verb
        ))));
    };
    match parse_index(digits, ctx.email_count) {
        Ok(i) => Ok(Ok(i)),
        Err(IndexError::TooLarge) => Err(EmailParseError::new(INVALID_INDEX_MSG)),
        Err(IndexError::OutOfBounds { len: 0, .. }) => {
            Err(EmailParseError::new("email list is empty"))
        }
        Err(IndexError::OutOfBounds { index, len }) => Err(EmailParseError::new(format!(
            "Index {} out of bounds of 1 to {}",
            index, len
        ))),
    }
}

/// Parse an email-domain command. Unknown verbs, bad indices and too many
/// filter tags are errors; malformed arguments to a known verb become
/// `Command::Invalid` with a reason.
pub fn parse_email(input: &SplitInput, ctx: &ParseContext) -> Result<Command, EmailParseError> {
    let exact = |verb: &str| input.body == verb;
    let cmd = match input.command.as_str() {
        "flip" if exact("flip") => Command::Flip,
        "help" if exact("help") => Command::Help(Domain::Email),
        "bye" if exact("bye") => Command::Exit,
        "fetch" if exact("fetch") => Command::Email(EmailCommand::Fetch),
        "listKeyword" if exact("listKeyword") => Command::Email(EmailCommand::ListKeywords),
        "listTag" if exact("listTag") => Command::Email(EmailCommand::ListAllTags),
        "clear" if exact("clear") => Command::Email(EmailCommand::Clear),
        "list" if exact("list") => parse_list(input)?,
        "show" => match email_index(input, "show", ctx)? {
            Ok(i) => Command::Email(EmailCommand::Show(i)),
            Err(invalid) => invalid,
        },
        "delete" => match email_index(input, "delete", ctx)? {
            Ok(i) => Command::Email(EmailCommand::Delete(i)),
            Err(invalid) => invalid,
        },
        "update" => match email_index(input, "update", ctx)? {
            Ok(index) => {
                let tags = extract_all(&input.options, "tag");
                if tags.is_empty() {
                    Command::invalid("Please add at least one tag with -tag.")
                } else {
                    Command::Email(EmailCommand::Tag { index, tags })
                }
            }
            Err(invalid) => invalid,
        },
        "addKeyword" => parse_add_keyword(input, ctx),
        "fuzzySearch" => match FUZZY_RE.captures(&input.body) {
            Some(caps) => Command::Email(EmailCommand::FuzzySearch(caps["target"].to_string())),
            None => Command::invalid("Please enter one word to search for, e.g. 'fuzzySearch meeting'."),
        },
        "sort" => match SORT_RE.captures(&input.body) {
            Some(caps) if &caps["order"] == "relevance" => {
                Command::Email(EmailCommand::Sort(SortOrder::Relevance))
            }
            Some(_) => Command::Email(EmailCommand::Sort(SortOrder::Time)),
            None => Command::invalid("Please sort by time or relevance."),
        },
        _ => {
            return Err(EmailParseError::new(format!(
                "Unknown email command '{}'. Type 'help' to see what you can do.",
                input.body
            )));
        }
    };
    Ok(cmd)
}

fn parse_list(input: &SplitInput) -> Result<Command, EmailParseError> {
    let tags = extract_all(&input.options, "tag");
    match tags.len() {
        0 => Ok(Command::Email(EmailCommand::List)),
        n if n <= MAX_FILTER_TAGS => Ok(Command::Email(EmailCommand::FilterByTag(tags))),
        _ => Err(EmailParseError::new(
            "Please enter at most 2 tags to filter the email list.",
        )),
    }
}

fn parse_add_keyword(input: &SplitInput, ctx: &ParseContext) -> Command {
    let Some(caps) = ADD_KEYWORD_RE.captures(&input.body) else {
        return Command::invalid("Please enter a keyword made of letters, digits and spaces, e.g. 'addKeyword project -exp \"project update\"'.");
    };
    let expressions = extract_all(&input.options, "exp");
    if expressions.is_empty() {
        return Command::invalid("Please add at least one expression with -exp.");
    }
    let keyword = caps["keyword"].trim().to_string();
    let keywords = ctx
        .keywords
        .add_and_copy(KeywordPair::new(keyword.clone(), expressions));
    Command::Email(EmailCommand::AddKeyword { keyword, keywords })
}
