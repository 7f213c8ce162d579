use super::{CodeFragment, Indent, Renderable};

/// Accumulates indented lines of generated source.
///
/// ```
/// use genstrument_codegen::builder::{CodeBuilder, CodeFragment};
///
/// let mut builder = CodeBuilder::go();
/// builder.push_line("func main() {").push_indent();
/// builder.apply_fragment(CodeFragment::line("run()"));
/// builder.push_dedent().push_line("}");
///
/// assert_eq!(builder.build(), "func main() {\n\trun()\n}\n");
/// ```
#[derive(Debug, Clone, Default)]
pub struct CodeBuilder {
    indent: Indent,
    depth: usize,
    buffer: String,
}

impl CodeBuilder {
    pub fn new(indent: Indent) -> Self {
        Self {
            indent,
            depth: 0,
            buffer: String::new(),
        }
    }

    /// A builder indenting with tabs.
    pub fn go() -> Self {
        Self::new(Indent::GO)
    }

    pub fn push_line(&mut self, text: &str) -> &mut Self {
        self.indent.write(&mut self.buffer, self.depth);
        self.buffer.push_str(text);
        self.buffer.push('\n');
        self
    }

    /// Blank lines carry no indentation.
    pub fn push_blank(&mut self) -> &mut Self {
        self.buffer.push('\n');
        self
    }

    pub fn push_indent(&mut self) -> &mut Self {
        self.depth += 1;
        self
    }

    pub fn push_dedent(&mut self) -> &mut Self {
        self.depth = self.depth.saturating_sub(1);
        self
    }

    pub fn push_comment(&mut self, text: &str) -> &mut Self {
        self.push_line(&format!("// {}", text))
    }

    pub fn emit(&mut self, node: &impl Renderable) -> &mut Self {
        node.to_fragments()
            .into_iter()
            .for_each(|fragment| self.apply_fragment(fragment));
        self
    }

    pub fn apply_fragment(&mut self, fragment: CodeFragment) {
        match fragment {
            CodeFragment::Line(text) => {
                self.push_line(&text);
            }
            CodeFragment::Blank => {
                self.push_blank();
            }
            CodeFragment::Comment(text) => {
                self.push_comment(&text);
            }
            CodeFragment::Block {
                header,
                body,
                close,
            } => {
                self.push_line(&header).push_indent();
                body.into_iter()
                    .for_each(|fragment| self.apply_fragment(fragment));
                self.push_dedent();
                if let Some(close) = close {
                    self.push_line(&close);
                }
            }
        }
    }

    pub fn build(self) -> String {
        self.buffer
    }
}
