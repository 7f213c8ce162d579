/// A piece of a generated file, before indentation is applied.
#[derive(Debug, Clone, PartialEq)]
pub enum CodeFragment {
    Line(String),
    Blank,
    /// `// text`
    Comment(String),
    /// `header`, then `body` one level deeper, then `close` if present.
    Block {
        header: String,
        body: Vec<CodeFragment>,
        close: Option<String>,
    },
}

impl CodeFragment {
    pub fn line(text: impl Into<String>) -> Self {
        Self::Line(text.into())
    }

    pub fn blank() -> Self {
        Self::Blank
    }

    pub fn comment(text: impl Into<String>) -> Self {
        Self::Comment(text.into())
    }

    pub fn block(
        header: impl Into<String>,
        body: Vec<CodeFragment>,
        close: Option<String>,
    ) -> Self {
        Self::Block {
            header: header.into(),
            body,
            close,
        }
    }

    /// A block closed by a lone `}`.
    pub fn braced(header: impl Into<String>, body: Vec<CodeFragment>) -> Self {
        Self::block(header, body, Some("}".to_string()))
    }
}

/// A node of the output that knows its own layout.
pub trait Renderable {
    fn to_fragments(&self) -> Vec<CodeFragment>;
}

impl<T: Renderable + ?Sized> Renderable for &T {
    fn to_fragments(&self) -> Vec<CodeFragment> {
        (**self).to_fragments()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_braced_closes_with_brace() {
        let block = CodeFragment::braced("if err != nil {", vec![CodeFragment::line("return")]);
        assert_eq!(
            block,
            CodeFragment::Block {
                header: "if err != nil {".to_string(),
                body: vec![CodeFragment::Line("return".to_string())],
                close: Some("}".to_string()),
            }
        );
    }
}
