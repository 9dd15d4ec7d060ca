/// A structural or syntactic defect found while building a script.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ErrorKind {
    #[error("node id must not be empty")]
    EmptyNodeId,

    #[error("duplicate node id: {0}")]
    DuplicateNode(String),

    #[error("@jump outside of a node")]
    JumpOutsideNode,

    #[error("jump target must not be empty")]
    EmptyJumpTarget,

    #[error("content outside of a node: {0}")]
    OutsideNode(String),

    #[error("unknown line format: {0}")]
    UnknownLine(String),

    #[error("malformed choice option: {0}")]
    MalformedOption(String),

    #[error("unterminated code block")]
    UnterminatedCodeBlock,

    #[error("script must contain a \"start\" node")]
    MissingStart,

    #[error("{}", .0.join("\n"))]
    DanglingReferences(Vec<String>),
}

/// Error returned by the parse entry point.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("line {line}: {kind}")]
    Line { line: usize, kind: ErrorKind },

    #[error("{0}")]
    Script(ErrorKind),
}

impl ParseError {
    pub(crate) fn at(line: usize, kind: ErrorKind) -> Self {
        ParseError::Line { line, kind }
    }

    /// 1-based source line, when the defect is tied to one.
    pub fn line(&self) -> Option<usize> {
        match self {
            ParseError::Line { line, .. } => Some(*line),
            ParseError::Script(_) => None,
        }
    }

    pub fn kind(&self) -> &ErrorKind {
        match self {
            ParseError::Line { kind, .. } | ParseError::Script(kind) => kind,
        }
    }

    /// The message without the line prefix.
    pub fn message(&self) -> String {
        self.kind().to_string()
    }
}

/// Error for the JSON entry points.
#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn located_errors_carry_their_line() {
        let err = ParseError::at(4, ErrorKind::EmptyJumpTarget);
        assert_eq!(err.line(), Some(4));
        assert_eq!(err.to_string(), "line 4: jump target must not be empty");
        assert_eq!(err.message(), "jump target must not be empty");
    }

    #[test]
    fn dangling_references_render_one_per_line() {
        let err = ParseError::Script(ErrorKind::DanglingReferences(vec![
            "a".to_string(),
            "b".to_string(),
        ]));
        assert_eq!(err.line(), None);
        assert_eq!(err.to_string(), "a\nb");
    }
}
