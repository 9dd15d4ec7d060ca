//! Emitter: Script → script source text.
//!
//! Output parses back into an equal `Script`.

use crate::parser::FENCE;
use crate::types::{ChoiceOption, Line, Script};
use std::fmt::Write;

#[must_use]
pub fn to_source(script: &Script) -> String {
    let mut out = String::with_capacity(1024);

    let mut has_header = false;
    for (key, value) in script.metadata().entries() {
        let _ = writeln!(out, "# {key}: {value}");
        has_header = true;
    }

    for (i, node) in script.nodes().iter().enumerate() {
        if has_header || i > 0 {
            out.push('\n');
        }
        let _ = writeln!(out, "@node {}", node.id);
        for line in &node.lines {
            emit_line(&mut out, line);
        }
        if let Some(target) = &node.jump {
            let _ = writeln!(out, "@jump {target}");
        }
    }

    out
}

fn guard(condition: &Option<String>) -> String {
    match condition {
        Some(c) => format!("[{c}] "),
        None => String::new(),
    }
}

fn push_line(out: &mut String, line: &str) {
    out.push_str(line.trim_end());
    out.push('\n');
}

fn emit_line(out: &mut String, line: &Line) {
    match line {
        Line::Dialogue {
            speaker,
            content,
            condition,
        } => {
            let head = match speaker {
                Some(speaker) => format!("{}> {speaker}: ", guard(condition)),
                None => format!("{}> ", guard(condition)),
            };
            let fenced = content
                .strip_prefix(FENCE)
                .and_then(|s| s.strip_prefix('\n'))
                .and_then(|s| s.strip_suffix(FENCE))
                .and_then(|s| s.strip_suffix('\n'));
            match fenced {
                Some(inner) => {
                    // A first line starting with a fence can only be text that
                    // preceded the opening fence, and inside the block it would
                    // close it.
                    let (first, body) = inner.split_once('\n').unwrap_or((inner, ""));
                    let body = if first.starts_with(FENCE) {
                        push_line(out, &format!("{head}{first} {FENCE}"));
                        inner.contains('\n').then_some(body)
                    } else {
                        push_line(out, &format!("{head}{FENCE}"));
                        Some(inner)
                    };
                    // Captured lines are kept verbatim, whitespace included.
                    if let Some(body) = body {
                        out.push_str(body);
                        out.push('\n');
                    }
                    out.push_str(FENCE);
                    out.push('\n');
                }
                None => push_line(out, &format!("{head}{content}")),
            }
        }
        Line::Command { content, condition } => {
            push_line(out, &format!("{}$ {content}", guard(condition)));
        }
        Line::Choice {
            content,
            options,
            condition,
        } => {
            push_line(out, &format!("{}? {content}", guard(condition)));
            for option in options {
                emit_option(out, option);
            }
        }
        Line::Input {
            variable,
            content,
            condition,
        } => {
            push_line(
                out,
                &format!("{}? {{{variable}}} {content}", guard(condition)),
            );
        }
    }
}

fn emit_option(out: &mut String, option: &ChoiceOption) {
    let mut line = format!("- {}", option.text);
    if let Some(condition) = &option.condition {
        let _ = write!(line, " [{condition}]");
    }
    if let Some(target) = &option.target {
        let _ = write!(line, " -> {target}");
    }
    push_line(out, &line);
}

/// A small starter script that exercises every line type and always parses.
#[must_use]
pub fn script_template(title: &str) -> String {
    let title = title.split_whitespace().collect::<Vec<_>>().join(" ");
    let title = if title.is_empty() { "Untitled" } else { title.as_str() };
    format!(
        "\
# title: {title}
# version: 1.0

@node start
> Narrator: Welcome to {title}.
$ set visits = 1
? Where do you want to go?
- Explore -> explore
- Rest [visits > 0] -> rest

@node explore
> Narrator: You look around.
@jump end

@node rest
? {{name}} What is your name?
> Narrator: Sleep well, {{name}}.
@jump end

@node end
> Narrator: The end.
"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{extract_variables, find_unreachable_nodes, parse};
    use pretty_assertions::assert_eq;

    const STORY: &str = "\
# title: Lab
# autoclear: true

@node start
> Ann: Hi {name}.
[late] > It is late.
$ set score = 0
? {name} Your name?
? Pick one
- A -> x
- B [hasFlag] -> y
- C
> Bot: Look ```
  indented
\t
```
@jump x

@node x
[debug] $ log score

@node y
```
```

@node z
[ ] > hi
? q
- A [ ] -> start
> A: ```foo```
bar
```
> ```only```
```
";

    #[test]
    fn emitted_source_parses_to_the_same_script() {
        let script = parse(STORY).unwrap();
        let source = to_source(&script);
        let again = parse(&source).unwrap();
        assert_eq!(again, script);
        assert_eq!(
            again.node_ids().collect::<Vec<_>>(),
            script.node_ids().collect::<Vec<_>>()
        );
    }

    #[test]
    fn leading_fence_text_stays_on_the_opening_line() {
        let script = parse("@node start\n> A: ```foo```\nbar\n```").unwrap();
        assert_eq!(to_source(&script), "@node start\n> A: ```foo ```\nbar\n```\n");
    }

    #[test]
    fn emits_expected_text() {
        let script = parse("@node start\n? Go\n- on [ok] -> end\n@jump end\n@node end\n[x] > A: b").unwrap();
        assert_eq!(
            to_source(&script),
            "@node start\n? Go\n- on [ok] -> end\n@jump end\n\n@node end\n[x] > A: b\n"
        );
    }

    #[test]
    fn template_parses() {
        let source = script_template("  My\nGame ");
        let script = parse(&source).unwrap();
        assert_eq!(script.metadata().title.as_deref(), Some("My Game"));
        assert!(find_unreachable_nodes(&script).is_empty());
        assert_eq!(extract_variables(&script), vec!["name", "visits"]);
    }

    #[test]
    fn empty_title_falls_back() {
        let script = parse(&script_template("")).unwrap();
        assert_eq!(script.metadata().title.as_deref(), Some("Untitled"));
    }
}
