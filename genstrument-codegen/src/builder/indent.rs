/// One level of indentation in emitted text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Indent {
    /// `gofmt` layout.
    #[default]
    Tab,
    Spaces(u8),
}

impl Indent {
    pub const GO: Self = Self::Tab;

    /// Append `depth` levels to `out`.
    pub(super) fn write(self, out: &mut String, depth: usize) {
        match self {
            Self::Tab => out.extend(std::iter::repeat_n('\t', depth)),
            Self::Spaces(width) => {
                out.extend(std::iter::repeat_n(' ', depth * usize::from(width)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_depth() {
        let mut out = String::new();
        Indent::Tab.write(&mut out, 2);
        Indent::Spaces(3).write(&mut out, 1);
        Indent::Spaces(3).write(&mut out, 0);
        assert_eq!(out, "\t\t   ");
        assert_eq!(Indent::default(), Indent::GO);
    }
}
