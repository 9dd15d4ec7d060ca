use crate::ast::*;
use winnow::ascii::{multispace0, multispace1};
use winnow::combinator::{delimited, opt};
use winnow::prelude::*;
use winnow::token::{rest, take_till, take_while};

pub const FENCE: &str = "```";

const META_KEYS: [&str; 4] = ["title", "author", "version", "autoclear"];

/// Parse state the classifier needs to know about.
#[derive(Debug, Clone, Copy, Default)]
pub struct LineState {
    pub in_code_block: bool,
    pub choice_pending: bool,
}

/// Classify one physical line. `raw` is the untrimmed source line.
pub fn classify(raw: &str, state: LineState) -> Classified<'_> {
    let trimmed = raw.trim();
    if trimmed.starts_with(FENCE) {
        return Classified::Fence;
    }
    if state.in_code_block {
        return Classified::Verbatim(raw);
    }
    if trimmed.is_empty() {
        return Classified::Blank;
    }
    if trimmed.starts_with("//") {
        return Classified::Comment;
    }
    if let Some(rest) = trimmed.strip_prefix('#') {
        return match split_meta(rest) {
            Some((key, value)) => Classified::Meta { key, value },
            None => Classified::Comment,
        };
    }
    if let Some(id) = directive(trimmed, "@node") {
        return Classified::NodeDirective(id);
    }
    if let Some(target) = directive(trimmed, "@jump") {
        return Classified::JumpDirective(target);
    }

    let (condition, text) = match guarded.parse(trimmed) {
        Ok((condition, text)) if !text.is_empty() => (Some(condition), text),
        _ => (None, trimmed),
    };
    Classified::Content(Content {
        condition,
        body: classify_body(text, state.choice_pending),
    })
}

fn classify_body(text: &str, choice_pending: bool) -> Body<'_> {
    if let Some(rest) = text.strip_prefix('>') {
        let rest = rest.trim();
        return match split_speaker(rest) {
            Some((speaker, content)) => Body::Dialogue {
                speaker: Some(speaker),
                content,
            },
            None => Body::Dialogue {
                speaker: None,
                content: rest,
            },
        };
    }
    if let Some(rest) = text.strip_prefix('$') {
        return Body::Command(rest.trim());
    }
    if let Some(rest) = text.strip_prefix('?') {
        let rest = rest.trim();
        return match input_head.parse(rest) {
            Ok((variable, prompt)) => Body::Input { variable, prompt },
            Err(_) => Body::Prompt(rest),
        };
    }
    if choice_pending {
        if let Some(rest) = text.strip_prefix('-') {
            let rest = rest.trim();
            return match parse_option(rest) {
                Some(option) => Body::Option(option),
                None => Body::MalformedOption(text),
            };
        }
    }
    Body::Unknown(text)
}

fn directive<'a>(line: &'a str, keyword: &str) -> Option<&'a str> {
    let rest = line.strip_prefix(keyword)?;
    if rest.is_empty() || rest.starts_with(char::is_whitespace) {
        Some(rest.trim())
    } else {
        None
    }
}

fn split_meta(comment: &str) -> Option<(&'static str, &str)> {
    let (key, value) = comment.split_once(':')?;
    let key = key.trim();
    META_KEYS
        .into_iter()
        .find(|k| k.eq_ignore_ascii_case(key))
        .map(|k| (k, value.trim()))
}

/// Split `Name: text` at the first colon outside brackets, parens and braces.
fn split_speaker(s: &str) -> Option<(&str, &str)> {
    let mut depth = 0usize;
    for (idx, ch) in s.char_indices() {
        match ch {
            '[' | '(' | '{' => depth += 1,
            ']' | ')' | '}' => depth = depth.saturating_sub(1),
            ':' if depth == 0 => {
                let speaker = s[..idx].trim();
                if speaker.is_empty() {
                    return None;
                }
                return Some((speaker, s[idx + 1..].trim()));
            }
            _ => {}
        }
    }
    None
}

pub(crate) fn is_word(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// `[condition]`. The bracketed text is kept as written.
fn guard<'s>(input: &mut &'s str) -> ModalResult<&'s str> {
    delimited('[', take_till(1.., ']'), ']').parse_next(input)
}

/// `[condition] rest`
fn guarded<'s>(input: &mut &'s str) -> ModalResult<(&'s str, &'s str)> {
    let condition = guard.parse_next(input)?;
    let _ = multispace0.parse_next(input)?;
    let body = rest.parse_next(input)?;
    Ok((condition, body))
}

/// `{variable} prompt`
fn input_head<'s>(input: &mut &'s str) -> ModalResult<(&'s str, &'s str)> {
    let variable = delimited('{', take_while(1.., is_word), '}').parse_next(input)?;
    let _ = multispace0.parse_next(input)?;
    let prompt = rest.parse_next(input)?;
    Ok((variable, prompt))
}

fn arrow_target<'s>(input: &mut &'s str) -> ModalResult<&'s str> {
    let _ = "->".parse_next(input)?;
    let _ = multispace0.parse_next(input)?;
    take_while(1.., |_: char| true)
        .map(str::trim_end)
        .parse_next(input)
}

/// Everything after an option's text: ` [condition] -> target`, both optional.
fn option_tail<'s>(input: &mut &'s str) -> ModalResult<(Option<&'s str>, Option<&'s str>)> {
    let _ = multispace0.parse_next(input)?;
    let condition = opt(guard).parse_next(input)?;
    let _ = multispace0.parse_next(input)?;
    let target = opt(arrow_target).parse_next(input)?;
    Ok((condition, target))
}

/// Parse `text [condition] -> target`. The text is the shortest prefix
/// after which the rest of the line is a valid option tail.
pub(crate) fn parse_option(text: &str) -> Option<ParsedOption<'_>> {
    if text.is_empty() {
        return None;
    }
    let splits = text
        .char_indices()
        .map(|(idx, _)| idx)
        .skip(1)
        .chain(std::iter::once(text.len()));
    for at in splits {
        if let Ok((condition, target)) = option_tail.parse(&text[at..]) {
            return Some(ParsedOption {
                text: text[..at].trim_end(),
                condition,
                target,
            });
        }
    }
    None
}

/// Variable assigned by a `set name ...` command segment.
pub(crate) fn set_target<'s>(input: &mut &'s str) -> ModalResult<&'s str> {
    let _ = multispace0.parse_next(input)?;
    let _ = "set".parse_next(input)?;
    let _ = multispace1.parse_next(input)?;
    take_while(1.., is_word).parse_next(input)
}
