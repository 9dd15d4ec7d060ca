/// Category of one physical source line, as seen by the builder.
#[derive(Debug, Clone, PartialEq)]
pub enum Classified<'a> {
    /// A line starting with the triple-backtick marker.
    Fence,
    /// Raw line captured inside an open code block.
    Verbatim(&'a str),
    Blank,
    Comment,
    Meta { key: &'static str, value: &'a str },
    NodeDirective(&'a str),
    JumpDirective(&'a str),
    Content(Content<'a>),
}

/// A content line with its leading `[condition]` guard already split off.
#[derive(Debug, Clone, PartialEq)]
pub struct Content<'a> {
    pub condition: Option<&'a str>,
    pub body: Body<'a>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Body<'a> {
    Dialogue {
        speaker: Option<&'a str>, // "Name" in "> Name: Content"
        content: &'a str,
    },
    Command(&'a str),
    Prompt(&'a str),
    Input { variable: &'a str, prompt: &'a str },
    Option(ParsedOption<'a>),
    MalformedOption(&'a str),
    Unknown(&'a str),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedOption<'a> {
    pub text: &'a str,
    pub condition: Option<&'a str>,
    pub target: Option<&'a str>,
}
