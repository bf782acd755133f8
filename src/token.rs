/// Whether a token opens, closes, or stands on its own
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nesting {
    Open,
    Standalone,
    Close,
}

/// Token kinds emitted by the parser
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    ParagraphOpen,
    ParagraphClose,
    HeadingOpen(u8),
    HeadingClose(u8),
    BulletListOpen,
    BulletListClose,
    OrderedListOpen,
    OrderedListClose,
    ListItemOpen,
    ListItemClose,
    BlockquoteOpen,
    BlockquoteClose,
    Fence,
    CodeBlock,
    HtmlBlock,
    Hr,
    /// A run of inline content; the only kind that carries children
    Inline,
    Text,
    CodeInline,
    HtmlInline,
    SoftBreak,
    HardBreak,
    EmOpen,
    EmClose,
    StrongOpen,
    StrongClose,
    StrikeOpen,
    StrikeClose,
    LinkOpen,
    LinkClose,
    Image,
}

impl TokenKind {
    /// HTML tag name, empty for kinds without one.
    pub fn tag(self) -> &'static str {
        use TokenKind::*;
        match self {
            ParagraphOpen | ParagraphClose => "p",
            HeadingOpen(level) | HeadingClose(level) => match level {
                1 => "h1",
                2 => "h2",
                3 => "h3",
                4 => "h4",
                5 => "h5",
                _ => "h6",
            },
            BulletListOpen | BulletListClose => "ul",
            OrderedListOpen | OrderedListClose => "ol",
            ListItemOpen | ListItemClose => "li",
            BlockquoteOpen | BlockquoteClose => "blockquote",
            Fence | CodeBlock => "code",
            Hr => "hr",
            CodeInline => "code",
            HardBreak => "br",
            EmOpen | EmClose => "em",
            StrongOpen | StrongClose => "strong",
            StrikeOpen | StrikeClose => "s",
            LinkOpen | LinkClose => "a",
            Image => "img",
            HtmlBlock | Inline | Text | HtmlInline | SoftBreak => "",
        }
    }

    pub fn nesting(self) -> Nesting {
        use TokenKind::*;
        match self {
            ParagraphOpen | HeadingOpen(_) | BulletListOpen | OrderedListOpen | ListItemOpen
            | BlockquoteOpen | EmOpen | StrongOpen | StrikeOpen | LinkOpen => Nesting::Open,
            ParagraphClose | HeadingClose(_) | BulletListClose | OrderedListClose
            | ListItemClose | BlockquoteClose | EmClose | StrongClose | StrikeClose
            | LinkClose => Nesting::Close,
            _ => Nesting::Standalone,
        }
    }

    /// Block-level kinds are the ones that appear in the top-level sequence.
    pub fn is_block(self) -> bool {
        use TokenKind::*;
        matches!(
            self,
            ParagraphOpen
                | ParagraphClose
                | HeadingOpen(_)
                | HeadingClose(_)
                | BulletListOpen
                | BulletListClose
                | OrderedListOpen
                | OrderedListClose
                | ListItemOpen
                | ListItemClose
                | BlockquoteOpen
                | BlockquoteClose
                | Fence
                | CodeBlock
                | HtmlBlock
                | Hr
                | Inline
        )
    }
}

/// A node of the parsed document, flattened into a level-annotated sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// Nesting depth; a token's structural parent is the nearest earlier token one level up
    pub level: usize,
    pub content: String,
    /// Info string of fenced code blocks
    pub info: String,
    pub children: Vec<Token>,
    /// Attributes in insertion order, names unique
    pub attrs: Vec<(String, String)>,
    /// Hidden tokens are skipped by the renderer (paragraphs of tight lists)
    pub hidden: bool,
}

impl Token {
    pub fn new(kind: TokenKind, level: usize) -> Self {
        Self {
            kind,
            level,
            content: String::new(),
            info: String::new(),
            children: Vec::new(),
            attrs: Vec::new(),
            hidden: false,
        }
    }

    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::new(TokenKind::Text, 0)
        }
    }

    pub fn html_inline(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::new(TokenKind::HtmlInline, 0)
        }
    }

    pub fn attr_index(&self, name: &str) -> Option<usize> {
        self.attrs.iter().position(|(n, _)| n == name)
    }

    pub fn attr_get(&self, name: &str) -> Option<&str> {
        self.attr_index(name).map(|i| self.attrs[i].1.as_str())
    }

    /// Append an attribute without checking for an existing one.
    pub fn attr_push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.attrs.push((name.into(), value.into()));
    }

    /// Set an attribute, replacing the value in place if the name already exists.
    pub fn attr_set(&mut self, name: &str, value: impl Into<String>) {
        match self.attr_index(name) {
            Some(i) => self.attrs[i].1 = value.into(),
            None => self.attr_push(name, value),
        }
    }
}

/// Find the enclosing token of `tokens[index]`: the nearest earlier token one level shallower.
///
/// Returns `None` for root-level tokens and for malformed sequences where no
/// such token exists.
pub fn parent_index(tokens: &[Token], index: usize) -> Option<usize> {
    let target = tokens.get(index)?.level.checked_sub(1)?;
    tokens[..index].iter().rposition(|t| t.level == target)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(kind: TokenKind, level: usize) -> Token {
        Token::new(kind, level)
    }

    #[test]
    fn attr_set_appends_new_names() {
        let mut token = at(TokenKind::ListItemOpen, 1);
        token.attr_set("class", "a");
        token.attr_set("id", "b");
        assert_eq!(
            token.attrs,
            vec![
                ("class".to_string(), "a".to_string()),
                ("id".to_string(), "b".to_string())
            ]
        );
    }

    #[test]
    fn attr_set_replaces_in_place() {
        let mut token = at(TokenKind::ListItemOpen, 1);
        token.attr_push("class", "old");
        token.attr_push("id", "x");
        token.attr_set("class", "new");
        assert_eq!(token.attr_index("class"), Some(0));
        assert_eq!(token.attr_get("class"), Some("new"));
        assert_eq!(token.attrs.len(), 2);
    }

    #[test]
    fn attr_get_missing() {
        assert_eq!(at(TokenKind::Inline, 0).attr_get("class"), None);
    }

    #[test]
    fn parent_of_list_item_is_list() {
        let tokens = vec![
            at(TokenKind::BulletListOpen, 0),
            at(TokenKind::ListItemOpen, 1),
            at(TokenKind::ParagraphOpen, 2),
            at(TokenKind::Inline, 3),
            at(TokenKind::ParagraphClose, 2),
            at(TokenKind::ListItemClose, 1),
            at(TokenKind::ListItemOpen, 1),
        ];
        assert_eq!(parent_index(&tokens, 1), Some(0));
        assert_eq!(parent_index(&tokens, 3), Some(2));
        assert_eq!(parent_index(&tokens, 6), Some(0));
    }

    #[test]
    fn parent_of_nested_item_is_innermost_list() {
        let tokens = vec![
            at(TokenKind::BulletListOpen, 0),
            at(TokenKind::ListItemOpen, 1),
            at(TokenKind::BulletListOpen, 2),
            at(TokenKind::ListItemOpen, 3),
        ];
        assert_eq!(parent_index(&tokens, 3), Some(2));
    }

    #[test]
    fn root_tokens_have_no_parent() {
        let tokens = vec![at(TokenKind::ParagraphOpen, 0), at(TokenKind::Inline, 1)];
        assert_eq!(parent_index(&tokens, 0), None);
        assert_eq!(parent_index(&tokens, 5), None);
    }

    #[test]
    fn malformed_levels_have_no_parent() {
        let tokens = vec![at(TokenKind::ListItemOpen, 3), at(TokenKind::Inline, 3)];
        assert_eq!(parent_index(&tokens, 1), None);
    }

    #[test]
    fn kind_shapes() {
        assert_eq!(TokenKind::HeadingOpen(2).tag(), "h2");
        assert_eq!(TokenKind::ListItemClose.nesting(), Nesting::Close);
        assert_eq!(TokenKind::HtmlInline.nesting(), Nesting::Standalone);
        assert!(TokenKind::Inline.is_block());
        assert!(!TokenKind::Text.is_block());
    }
}
