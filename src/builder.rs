use crate::ast::{Body, Classified, Content};
use crate::error::{ErrorKind, ParseError};
use crate::parser::{classify, LineState, FENCE};
use crate::types::{ChoiceOption, Line, Metadata, Node, Script};
use std::collections::HashSet;

/// What to do with content lines that appear before the first `@node`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrphanLines {
    #[default]
    Ignore,
    Reject,
}

#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Prompt used for `? {var}` lines without text. `{var}` is replaced by
    /// the variable name.
    pub input_prompt: String,
    pub orphan_lines: OrphanLines,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            input_prompt: "Enter {var}:".to_string(),
            orphan_lines: OrphanLines::default(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Parser {
    options: ParseOptions,
}

impl Parser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ParseOptions) -> Self {
        Self { options }
    }

    /// Build a script from source text. The returned script always has a
    /// `start` node and every jump or option target resolves.
    pub fn parse(&self, text: &str) -> Result<Script, ParseError> {
        let mut st = BuilderState::new(&self.options);

        for (idx, line) in text.lines().enumerate() {
            let line_no = idx + 1;
            let mut raw = line;
            if idx == 0 {
                raw = raw.trim_start_matches('\u{feff}');
            }

            let classified = classify(raw, st.line_state());
            log::trace!("line {line_no}: {classified:?}");
            st.handle(classified, line_no)?;
        }

        st.finish()
    }
}

struct PendingChoice {
    line_no: usize,
    content: String,
    condition: Option<String>,
    options: Vec<ChoiceOption>,
}

struct CodeBlock {
    start_line: usize,
    speaker: Option<String>,
    condition: Option<String>,
    buffer: Vec<String>,
}

struct BuilderState<'o> {
    options: &'o ParseOptions,
    metadata: Metadata,
    nodes: Vec<Node>,
    seen: HashSet<String>,
    current: Option<Node>,
    pending_choice: Option<PendingChoice>,
    code_block: Option<CodeBlock>,
}

impl<'o> BuilderState<'o> {
    fn new(options: &'o ParseOptions) -> Self {
        Self {
            options,
            metadata: Metadata::default(),
            nodes: Vec::new(),
            seen: HashSet::new(),
            current: None,
            pending_choice: None,
            code_block: None,
        }
    }

    fn line_state(&self) -> LineState {
        LineState {
            in_code_block: self.code_block.is_some(),
            choice_pending: self.pending_choice.is_some(),
        }
    }

    fn handle(&mut self, line: Classified<'_>, line_no: usize) -> Result<(), ParseError> {
        match line {
            Classified::Fence => match self.code_block.take() {
                Some(block) => self.close_code_block(block),
                None => {
                    self.flush_choice()?;
                    self.code_block = Some(CodeBlock {
                        start_line: line_no,
                        speaker: None,
                        condition: None,
                        buffer: Vec::new(),
                    });
                    Ok(())
                }
            },
            Classified::Verbatim(raw) => {
                if let Some(block) = &mut self.code_block {
                    block.buffer.push(raw.to_string());
                }
                Ok(())
            }
            Classified::Blank | Classified::Comment => self.flush_choice(),
            Classified::Meta { key, value } => {
                self.flush_choice()?;
                self.metadata.set(key, value.to_string());
                Ok(())
            }
            Classified::NodeDirective(id) => self.handle_node(id, line_no),
            Classified::JumpDirective(target) => self.handle_jump(target, line_no),
            Classified::Content(content) => self.handle_content(content, line_no),
        }
    }

    fn handle_node(&mut self, id: &str, line_no: usize) -> Result<(), ParseError> {
        if id.is_empty() {
            return Err(ParseError::at(line_no, ErrorKind::EmptyNodeId));
        }
        self.flush_choice()?;
        self.commit_current();
        if !self.seen.insert(id.to_string()) {
            return Err(ParseError::at(
                line_no,
                ErrorKind::DuplicateNode(id.to_string()),
            ));
        }
        self.current = Some(Node::new(id));
        Ok(())
    }

    fn handle_jump(&mut self, target: &str, line_no: usize) -> Result<(), ParseError> {
        let Some(node) = self.current.as_mut() else {
            return Err(ParseError::at(line_no, ErrorKind::JumpOutsideNode));
        };
        if target.is_empty() {
            return Err(ParseError::at(line_no, ErrorKind::EmptyJumpTarget));
        }
        node.jump = Some(target.to_string());
        Ok(())
    }

    fn handle_content(&mut self, c: Content<'_>, line_no: usize) -> Result<(), ParseError> {
        let condition = c.condition.map(str::to_string);
        match c.body {
            Body::Dialogue { speaker, content } => {
                self.flush_choice()?;
                if let Some(leading) = content.strip_suffix(FENCE) {
                    let leading = leading.trim();
                    let mut buffer = Vec::new();
                    if !leading.is_empty() {
                        buffer.push(leading.to_string());
                    }
                    self.code_block = Some(CodeBlock {
                        start_line: line_no,
                        speaker: speaker.map(str::to_string),
                        condition,
                        buffer,
                    });
                    return Ok(());
                }
                self.push_line(
                    Line::Dialogue {
                        speaker: speaker.map(str::to_string),
                        content: content.to_string(),
                        condition,
                    },
                    line_no,
                )
            }
            Body::Command(content) => {
                self.flush_choice()?;
                self.push_line(
                    Line::Command {
                        content: content.to_string(),
                        condition,
                    },
                    line_no,
                )
            }
            Body::Input { variable, prompt } => {
                self.flush_choice()?;
                let content = if prompt.is_empty() {
                    self.options.input_prompt.replace("{var}", variable)
                } else {
                    prompt.to_string()
                };
                self.push_line(
                    Line::Input {
                        variable: variable.to_string(),
                        content,
                        condition,
                    },
                    line_no,
                )
            }
            Body::Prompt(prompt) => {
                self.flush_choice()?;
                self.pending_choice = Some(PendingChoice {
                    line_no,
                    content: prompt.to_string(),
                    condition,
                    options: Vec::new(),
                });
                Ok(())
            }
            Body::Option(option) => {
                if let (Some(guard), Some(inline)) = (&condition, option.condition) {
                    log::warn!(
                        "line {line_no}: option condition [{inline}] overrides line guard [{guard}]"
                    );
                }
                if let Some(choice) = &mut self.pending_choice {
                    choice.options.push(ChoiceOption {
                        text: option.text.to_string(),
                        condition: option.condition.map(str::to_string).or(condition),
                        target: option.target.map(str::to_string),
                    });
                }
                Ok(())
            }
            Body::MalformedOption(text) => Err(ParseError::at(
                line_no,
                ErrorKind::MalformedOption(text.to_string()),
            )),
            Body::Unknown(text) => Err(ParseError::at(
                line_no,
                ErrorKind::UnknownLine(text.to_string()),
            )),
        }
    }

    fn close_code_block(&mut self, block: CodeBlock) -> Result<(), ParseError> {
        self.flush_choice()?;
        let content = format!("{FENCE}\n{}\n{FENCE}", block.buffer.join("\n"));
        self.push_line(
            Line::Dialogue {
                speaker: block.speaker,
                content,
                condition: block.condition,
            },
            block.start_line,
        )
    }

    fn flush_choice(&mut self) -> Result<(), ParseError> {
        match self.pending_choice.take() {
            Some(choice) => self.push_line(
                Line::Choice {
                    content: choice.content,
                    options: choice.options,
                    condition: choice.condition,
                },
                choice.line_no,
            ),
            None => Ok(()),
        }
    }

    fn push_line(&mut self, line: Line, line_no: usize) -> Result<(), ParseError> {
        if let Some(node) = self.current.as_mut() {
            node.lines.push(line);
            return Ok(());
        }
        match self.options.orphan_lines {
            OrphanLines::Ignore => {
                log::warn!("line {line_no}: dropping content outside of a node");
                Ok(())
            }
            OrphanLines::Reject => Err(ParseError::at(
                line_no,
                ErrorKind::OutsideNode(line.content().to_string()),
            )),
        }
    }

    fn commit_current(&mut self) {
        if let Some(node) = self.current.take() {
            log::debug!("node {} committed with {} lines", node.id, node.lines.len());
            self.nodes.push(node);
        }
    }

    fn finish(mut self) -> Result<Script, ParseError> {
        if let Some(block) = &self.code_block {
            return Err(ParseError::at(
                block.start_line,
                ErrorKind::UnterminatedCodeBlock,
            ));
        }
        self.flush_choice()?;
        self.commit_current();

        let script = Script::assemble(self.metadata, self.nodes)?;
        log::debug!("parsed script with {} nodes", script.len());
        Ok(script)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::START_NODE;
    use pretty_assertions::assert_eq;

    fn parse(text: &str) -> Result<Script, ParseError> {
        Parser::new().parse(text)
    }

    fn lines<'s>(script: &'s Script, id: &str) -> &'s [Line] {
        &script.node(id).unwrap().lines
    }

    #[test]
    fn builds_nodes_in_order() {
        let script = parse(
            "# title: Demo\n# author: Kim\n\n@node start\n> Ann: Hi\n$ set met = true\n@jump end\n\n@node end\n> Bye",
        )
        .unwrap();

        assert_eq!(script.node_ids().collect::<Vec<_>>(), vec!["start", "end"]);
        assert_eq!(script.metadata().title.as_deref(), Some("Demo"));
        assert_eq!(script.metadata().author.as_deref(), Some("Kim"));
        assert_eq!(script.node(START_NODE).unwrap().jump.as_deref(), Some("end"));
        assert_eq!(
            lines(&script, "start"),
            &[
                Line::Dialogue {
                    speaker: Some("Ann".into()),
                    content: "Hi".into(),
                    condition: None
                },
                Line::Command {
                    content: "set met = true".into(),
                    condition: None
                },
            ]
        );
    }

    #[test]
    fn choice_block_collects_options() {
        let script = parse(
            "@node start\n? pick\n- A -> x\n- B [hasFlag] -> y\n\n@node x\n@node y",
        )
        .unwrap();

        assert_eq!(
            lines(&script, "start"),
            &[Line::Choice {
                content: "pick".into(),
                options: vec![
                    ChoiceOption {
                        text: "A".into(),
                        condition: None,
                        target: Some("x".into()),
                    },
                    ChoiceOption {
                        text: "B".into(),
                        condition: Some("hasFlag".into()),
                        target: Some("y".into()),
                    },
                ],
                condition: None,
            }]
        );
    }

    #[test]
    fn guard_on_option_line_becomes_its_condition() {
        let script = parse("@node start\n? pick\n[rich] - Buy\n- Steal [sneaky]").unwrap();
        let Line::Choice { options, .. } = &lines(&script, "start")[0] else {
            panic!("expected choice");
        };
        assert_eq!(options[0].condition.as_deref(), Some("rich"));
        assert_eq!(options[1].condition.as_deref(), Some("sneaky"));
    }

    #[test]
    fn inline_option_condition_overrides_line_guard() {
        let script = parse("@node start\n? pick\n[rich] - Buy [x]").unwrap();
        let Line::Choice { options, .. } = &lines(&script, "start")[0] else {
            panic!("expected choice");
        };
        assert_eq!(options[0].condition.as_deref(), Some("x"));
    }

    #[test]
    fn new_prompt_flushes_previous_choice() {
        let script = parse("@node start\n? one\n- a\n? two\n- b").unwrap();
        let prompts: Vec<_> = lines(&script, "start").iter().map(Line::content).collect();
        assert_eq!(prompts, vec!["one", "two"]);
    }

    #[test]
    fn dialogue_after_choice_keeps_source_order() {
        let script = parse("@node start\n? one\n- a\n> after").unwrap();
        let contents: Vec<_> = lines(&script, "start").iter().map(Line::content).collect();
        assert_eq!(contents, vec!["one", "after"]);
    }

    #[test]
    fn input_lines() {
        let script = parse("@node start\n? {name} Who are you?\n[askAge] ? {age}").unwrap();
        assert_eq!(
            lines(&script, "start"),
            &[
                Line::Input {
                    variable: "name".into(),
                    content: "Who are you?".into(),
                    condition: None,
                },
                Line::Input {
                    variable: "age".into(),
                    content: "Enter age:".into(),
                    condition: Some("askAge".into()),
                },
            ]
        );
    }

    #[test]
    fn custom_input_prompt() {
        let parser = Parser::with_options(ParseOptions {
            input_prompt: "Type your {var}".to_string(),
            ..ParseOptions::default()
        });
        let script = parser.parse("@node start\n? {name}").unwrap();
        assert_eq!(lines(&script, "start")[0].content(), "Type your name");
    }

    #[test]
    fn code_fence_folds_into_one_dialogue() {
        let script = parse(
            "@node start\n[debug] > Bot: Here it is ```\n  fn main() {\n\n      run();\n  }\n```\n> done",
        )
        .unwrap();

        assert_eq!(
            lines(&script, "start"),
            &[
                Line::Dialogue {
                    speaker: Some("Bot".into()),
                    content: "```\nHere it is\n  fn main() {\n\n      run();\n  }\n```".into(),
                    condition: Some("debug".into()),
                },
                Line::Dialogue {
                    speaker: None,
                    content: "done".into(),
                    condition: None,
                },
            ]
        );
    }

    #[test]
    fn bare_fence_block_has_no_speaker() {
        let script = parse("@node start\n```\n@node nope\n- not an option\n```").unwrap();
        assert_eq!(script.len(), 1);
        assert_eq!(
            lines(&script, "start"),
            &[Line::Dialogue {
                speaker: None,
                content: "```\n@node nope\n- not an option\n```".into(),
                condition: None,
            }]
        );
    }

    #[test]
    fn unterminated_fence_is_an_error() {
        let err = parse("@node start\n> A: ```\nstill open").unwrap_err();
        assert_eq!(err.line(), Some(2));
        assert_eq!(err.kind(), &ErrorKind::UnterminatedCodeBlock);
    }

    #[test]
    fn located_syntax_errors() {
        let err = parse("@node start\n@node \n").unwrap_err();
        assert_eq!((err.line(), err.kind()), (Some(2), &ErrorKind::EmptyNodeId));

        let err = parse("@jump start").unwrap_err();
        assert_eq!((err.line(), err.kind()), (Some(1), &ErrorKind::JumpOutsideNode));

        let err = parse("@node start\n@jump").unwrap_err();
        assert_eq!((err.line(), err.kind()), (Some(2), &ErrorKind::EmptyJumpTarget));

        let err = parse("@node start\nwhat is this").unwrap_err();
        assert_eq!(err.line(), Some(2));
        assert!(err.to_string().contains("unknown line format"));

        let err = parse("@node start\n- orphan option").unwrap_err();
        assert_eq!(
            err.kind(),
            &ErrorKind::UnknownLine("- orphan option".to_string())
        );

        let err = parse("@node start\n? pick\n-").unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::MalformedOption("-".to_string()));
    }

    #[test]
    fn duplicate_node_ids_are_rejected() {
        let err = parse("@node start\n@node a\n@node a").unwrap_err();
        assert_eq!(err.line(), Some(3));
        assert_eq!(err.kind(), &ErrorKind::DuplicateNode("a".to_string()));
    }

    #[test]
    fn missing_start_node() {
        for text in ["", "\n\n", "@node intro\n> hi", "> stray line"] {
            let err = parse(text).unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::MissingStart, "input {text:?}");
            assert!(err.to_string().contains("\"start\""));
        }
    }

    #[test]
    fn orphan_lines_can_be_rejected() {
        let parser = Parser::with_options(ParseOptions {
            orphan_lines: OrphanLines::Reject,
            ..ParseOptions::default()
        });
        let err = parser.parse("> stray\n@node start").unwrap_err();
        assert_eq!(err.line(), Some(1));
        assert_eq!(err.kind(), &ErrorKind::OutsideNode("stray".to_string()));
    }

    #[test]
    fn dangling_jump_fails_and_names_target() {
        let err = parse("@node start\n@jump ghost").unwrap_err();
        assert_eq!(err.line(), None);
        assert!(err.to_string().contains("ghost"));
    }

    #[test]
    fn dangling_references_are_aggregated() {
        let err = parse("@node start\n? go\n- a -> nowhere\n- b -> void\n@jump ghost").unwrap_err();
        let ErrorKind::DanglingReferences(errors) = err.kind() else {
            panic!("unexpected error {err}");
        };
        assert_eq!(errors.len(), 3);
        assert_eq!(err.to_string().lines().count(), 3);
    }

    #[test]
    fn strips_byte_order_mark() {
        let script = parse("\u{feff}@node start\n> hi").unwrap();
        assert!(script.contains("start"));
    }
}
