use std::ops::Range;

use pulldown_cmark::{
    CodeBlockKind, CowStr, Event, HeadingLevel, Options as CmarkOptions, Parser, Tag, TagEnd,
};
use tracing::trace;

use crate::token::{Token, TokenKind};

/// Parse markdown text into a flat, level-annotated token sequence.
///
/// Task list markers are left in the text; recognising them is the job of a
/// later pipeline rule.
pub fn parse(markdown: &str) -> Vec<Token> {
    let mut options = CmarkOptions::empty();
    options.insert(CmarkOptions::ENABLE_STRIKETHROUGH);
    let parser = Parser::new_ext(markdown, options).into_offset_iter();
    let mut state = ParseState::new(markdown);

    for (event, range) in parser {
        state.process(event, range);
    }

    state.finish()
}

enum Container {
    List,
    Item,
    Quote,
}

/// Inline content being collected for the next `Inline` token
struct InlineRun {
    children: Vec<Token>,
    // Source span covered so far
    start: usize,
    end: usize,
    // Index of an image whose alt text is being collected
    image: Option<usize>,
    // Images nested inside that image's description
    nested_images: usize,
}

impl InlineRun {
    fn at(range: &Range<usize>) -> Self {
        Self {
            children: Vec::new(),
            start: range.start,
            end: range.end,
            image: None,
            nested_images: 0,
        }
    }

    fn push_text(&mut self, text: &str) {
        if let Some(image) = self.image {
            self.children[image].content.push_str(text);
            return;
        }
        match self.children.last_mut() {
            Some(last) if last.kind == TokenKind::Text => last.content.push_str(text),
            _ => self.children.push(Token::text(text)),
        }
    }

    fn push(&mut self, kind: TokenKind, content: &str) {
        // Alt text is plain: keep code and breaks as text, drop formatting
        if let Some(image) = self.image {
            let alt = &mut self.children[image].content;
            match kind {
                TokenKind::CodeInline | TokenKind::HtmlInline => alt.push_str(content),
                TokenKind::SoftBreak | TokenKind::HardBreak => alt.push('\n'),
                _ => {}
            }
            return;
        }
        let mut token = Token::new(kind, 0);
        token.content = content.to_string();
        self.children.push(token);
    }
}

struct CodeBuffer {
    fenced: bool,
    info: String,
    content: String,
}

struct ParseState<'a> {
    source: &'a str,
    tokens: Vec<Token>,
    level: usize,
    containers: Vec<Container>,
    // Inside an explicit paragraph or heading
    in_text_block: bool,
    // A hidden paragraph opened for a tight list item
    implicit_paragraph: bool,
    run: Option<InlineRun>,
    code: Option<CodeBuffer>,
    html: Option<String>,
}

impl<'a> ParseState<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            tokens: Vec::new(),
            level: 0,
            containers: Vec::new(),
            in_text_block: false,
            implicit_paragraph: false,
            run: None,
            code: None,
            html: None,
        }
    }

    fn finish(mut self) -> Vec<Token> {
        self.end_implicit_paragraph();
        self.flush_inline();
        self.tokens
    }

    fn open(&mut self, kind: TokenKind) -> &mut Token {
        self.tokens.push(Token::new(kind, self.level));
        self.level += 1;
        let last = self.tokens.len() - 1;
        &mut self.tokens[last]
    }

    fn close(&mut self, kind: TokenKind) -> &mut Token {
        self.level = self.level.saturating_sub(1);
        self.tokens.push(Token::new(kind, self.level));
        let last = self.tokens.len() - 1;
        &mut self.tokens[last]
    }

    fn leaf(&mut self, kind: TokenKind) -> &mut Token {
        self.tokens.push(Token::new(kind, self.level));
        let last = self.tokens.len() - 1;
        &mut self.tokens[last]
    }

    /// Close whatever implicit paragraph a new block would interrupt.
    fn begin_block(&mut self) {
        self.end_implicit_paragraph();
    }

    fn end_implicit_paragraph(&mut self) {
        if self.implicit_paragraph {
            self.flush_inline();
            self.close(TokenKind::ParagraphClose).hidden = true;
            self.implicit_paragraph = false;
        }
    }

    fn flush_inline(&mut self) {
        let Some(run) = self.run.take() else {
            return;
        };
        let raw = self.source.get(run.start..run.end).unwrap_or_default();
        let token = self.leaf(TokenKind::Inline);
        token.content = inline_source(raw);
        token.children = run.children;
    }

    /// The inline run for the current block, started on first use.
    fn inline(&mut self, range: &Range<usize>) -> &mut InlineRun {
        if self.run.is_none()
            && !self.in_text_block
            && !self.implicit_paragraph
            && matches!(self.containers.last(), Some(Container::Item))
        {
            self.open(TokenKind::ParagraphOpen).hidden = true;
            self.implicit_paragraph = true;
        }
        let run = self.run.get_or_insert_with(|| InlineRun::at(range));
        run.start = run.start.min(range.start);
        run.end = run.end.max(range.end);
        run
    }

    fn process(&mut self, event: Event<'a>, range: Range<usize>) {
        match event {
            // Paragraphs
            Event::Start(Tag::Paragraph) => {
                self.begin_block();
                self.open(TokenKind::ParagraphOpen);
                self.in_text_block = true;
            }
            Event::End(TagEnd::Paragraph) => {
                self.flush_inline();
                self.close(TokenKind::ParagraphClose);
                self.in_text_block = false;
            }

            // Headings
            Event::Start(Tag::Heading { level, .. }) => {
                self.begin_block();
                self.open(TokenKind::HeadingOpen(heading_level_to_u8(level)));
                self.in_text_block = true;
            }
            Event::End(TagEnd::Heading(level)) => {
                self.flush_inline();
                self.close(TokenKind::HeadingClose(heading_level_to_u8(level)));
                self.in_text_block = false;
            }

            // Block quotes
            Event::Start(Tag::BlockQuote(_)) => {
                self.begin_block();
                self.open(TokenKind::BlockquoteOpen);
                self.containers.push(Container::Quote);
            }
            Event::End(TagEnd::BlockQuote(_)) => {
                self.end_implicit_paragraph();
                self.containers.pop();
                self.close(TokenKind::BlockquoteClose);
            }

            // Lists
            Event::Start(Tag::List(first_number)) => {
                self.begin_block();
                match first_number {
                    Some(start) => {
                        let token = self.open(TokenKind::OrderedListOpen);
                        if start != 1 {
                            token.attr_push("start", start.to_string());
                        }
                    }
                    None => {
                        self.open(TokenKind::BulletListOpen);
                    }
                }
                self.containers.push(Container::List);
            }
            Event::End(TagEnd::List(ordered)) => {
                self.containers.pop();
                self.close(if ordered {
                    TokenKind::OrderedListClose
                } else {
                    TokenKind::BulletListClose
                });
            }
            Event::Start(Tag::Item) => {
                self.open(TokenKind::ListItemOpen);
                self.containers.push(Container::Item);
            }
            Event::End(TagEnd::Item) => {
                self.end_implicit_paragraph();
                self.containers.pop();
                self.close(TokenKind::ListItemClose);
            }

            // Code blocks
            Event::Start(Tag::CodeBlock(kind)) => {
                self.begin_block();
                self.code = Some(match kind {
                    CodeBlockKind::Fenced(info) => CodeBuffer {
                        fenced: true,
                        info: info.into_string(),
                        content: String::new(),
                    },
                    CodeBlockKind::Indented => CodeBuffer {
                        fenced: false,
                        info: String::new(),
                        content: String::new(),
                    },
                });
            }
            Event::End(TagEnd::CodeBlock) => {
                if let Some(code) = self.code.take() {
                    let token = self.leaf(if code.fenced {
                        TokenKind::Fence
                    } else {
                        TokenKind::CodeBlock
                    });
                    token.info = code.info;
                    token.content = code.content;
                }
            }

            // Raw HTML blocks
            Event::Start(Tag::HtmlBlock) => {
                self.begin_block();
                self.html = Some(String::new());
            }
            Event::End(TagEnd::HtmlBlock) => {
                if let Some(html) = self.html.take() {
                    self.leaf(TokenKind::HtmlBlock).content = html;
                }
            }
            Event::Html(html) => match self.html.as_mut() {
                Some(buffer) => buffer.push_str(&html),
                None => self.inline(&range).push(TokenKind::HtmlInline, &html),
            },

            Event::Rule => {
                self.begin_block();
                self.leaf(TokenKind::Hr);
            }

            // Text content
            Event::Text(text) => {
                if let Some(code) = self.code.as_mut() {
                    code.content.push_str(&text);
                } else {
                    self.inline(&range).push_text(&text);
                }
            }
            Event::Code(code) => self.inline(&range).push(TokenKind::CodeInline, &code),
            Event::InlineHtml(html) => self.inline(&range).push(TokenKind::HtmlInline, &html),
            Event::SoftBreak => self.inline(&range).push(TokenKind::SoftBreak, ""),
            Event::HardBreak => self.inline(&range).push(TokenKind::HardBreak, ""),

            // Inline formatting
            Event::Start(Tag::Emphasis) => self.inline(&range).push(TokenKind::EmOpen, ""),
            Event::End(TagEnd::Emphasis) => self.inline(&range).push(TokenKind::EmClose, ""),
            Event::Start(Tag::Strong) => self.inline(&range).push(TokenKind::StrongOpen, ""),
            Event::End(TagEnd::Strong) => self.inline(&range).push(TokenKind::StrongClose, ""),
            Event::Start(Tag::Strikethrough) => self.inline(&range).push(TokenKind::StrikeOpen, ""),
            Event::End(TagEnd::Strikethrough) => {
                self.inline(&range).push(TokenKind::StrikeClose, "")
            }

            // Links and images
            Event::Start(Tag::Link {
                dest_url, title, ..
            }) => {
                let run = self.inline(&range);
                if run.image.is_some() {
                    return;
                }
                let mut token = Token::new(TokenKind::LinkOpen, 0);
                token.attr_push("href", dest_url.into_string());
                push_title(&mut token, title);
                run.children.push(token);
            }
            Event::End(TagEnd::Link) => self.inline(&range).push(TokenKind::LinkClose, ""),
            Event::Start(Tag::Image {
                dest_url, title, ..
            }) => {
                let run = self.inline(&range);
                if run.image.is_some() {
                    run.nested_images += 1;
                    return;
                }
                let mut token = Token::new(TokenKind::Image, 0);
                token.attr_push("src", dest_url.into_string());
                token.attr_push("alt", "");
                push_title(&mut token, title);
                run.children.push(token);
                run.image = Some(run.children.len() - 1);
            }
            Event::End(TagEnd::Image) => {
                let run = self.inline(&range);
                if run.nested_images > 0 {
                    run.nested_images -= 1;
                } else if let Some(image) = run.image.take() {
                    let image = &mut run.children[image];
                    let alt = image.content.clone();
                    image.attr_set("alt", alt);
                }
            }

            // Ignore other events
            other => trace!(?other, "unhandled markdown event"),
        }
    }
}

fn push_title(token: &mut Token, title: CowStr<'_>) {
    if !title.is_empty() {
        token.attr_push("title", title.into_string());
    }
}

/// Raw inline source with the indentation of continuation lines removed.
fn inline_source(raw: &str) -> String {
    raw.lines()
        .map(str::trim_start)
        .collect::<Vec<_>>()
        .join("\n")
}

fn heading_level_to_u8(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use TokenKind::*;

    fn shape(tokens: &[Token]) -> Vec<(TokenKind, usize, bool)> {
        tokens.iter().map(|t| (t.kind, t.level, t.hidden)).collect()
    }

    #[test]
    fn heading() {
        let tokens = parse("# My first file");
        assert_eq!(
            shape(&tokens),
            vec![
                (HeadingOpen(1), 0, false),
                (Inline, 1, false),
                (HeadingClose(1), 0, false)
            ]
        );
        assert_eq!(tokens[1].content, "My first file");
    }

    #[test]
    fn tight_list_gets_hidden_paragraphs() {
        let tokens = parse("- one\n- two\n");
        assert_eq!(
            shape(&tokens),
            vec![
                (BulletListOpen, 0, false),
                (ListItemOpen, 1, false),
                (ParagraphOpen, 2, true),
                (Inline, 3, false),
                (ParagraphClose, 2, true),
                (ListItemClose, 1, false),
                (ListItemOpen, 1, false),
                (ParagraphOpen, 2, true),
                (Inline, 3, false),
                (ParagraphClose, 2, true),
                (ListItemClose, 1, false),
                (BulletListClose, 0, false),
            ]
        );
    }

    #[test]
    fn loose_list_keeps_visible_paragraphs() {
        let tokens = parse("- one\n\n- two\n");
        let paragraphs: Vec<_> = tokens.iter().filter(|t| t.kind == ParagraphOpen).collect();
        assert_eq!(paragraphs.len(), 2);
        assert!(paragraphs.iter().all(|t| !t.hidden));
    }

    #[test]
    fn task_marker_stays_in_text() {
        let tokens = parse("- [ ] This\n");
        let inline = &tokens[3];
        assert_eq!(inline.kind, Inline);
        assert_eq!(inline.content, "[ ] This");
        assert_eq!(inline.children.len(), 1);
        assert_eq!(inline.children[0].kind, Text);
        assert_eq!(inline.children[0].content, "[ ] This");
    }

    #[test]
    fn nested_list_closes_hidden_paragraph() {
        let tokens = parse("- a\n  - b\n");
        assert_eq!(
            shape(&tokens),
            vec![
                (BulletListOpen, 0, false),
                (ListItemOpen, 1, false),
                (ParagraphOpen, 2, true),
                (Inline, 3, false),
                (ParagraphClose, 2, true),
                (BulletListOpen, 2, false),
                (ListItemOpen, 3, false),
                (ParagraphOpen, 4, true),
                (Inline, 5, false),
                (ParagraphClose, 4, true),
                (ListItemClose, 3, false),
                (BulletListClose, 2, false),
                (ListItemClose, 1, false),
                (BulletListClose, 0, false),
            ]
        );
    }

    #[test]
    fn ordered_list_start() {
        let tokens = parse("3. three\n4. four\n");
        assert_eq!(tokens[0].kind, OrderedListOpen);
        assert_eq!(tokens[0].attr_get("start"), Some("3"));
        assert_eq!(tokens.last().map(|t| t.kind), Some(OrderedListClose));
    }

    #[test]
    fn inline_children() {
        let tokens = parse("a *b* `c`");
        let kinds: Vec<_> = tokens[1].children.iter().map(|t| t.kind).collect();
        assert_eq!(kinds, vec![Text, EmOpen, Text, EmClose, Text, CodeInline]);
        assert_eq!(tokens[1].content, "a *b* `c`");
    }

    #[test]
    fn continuation_indent_is_dropped_from_content() {
        let tokens = parse("- [ ] one\n  two\n");
        assert_eq!(tokens[3].content, "[ ] one\ntwo");
    }

    #[test]
    fn image_alt_text() {
        let tokens = parse("![alt text](img.png)");
        let image = &tokens[1].children[0];
        assert_eq!(image.kind, Image);
        assert_eq!(image.attr_get("src"), Some("img.png"));
        assert_eq!(image.attr_get("alt"), Some("alt text"));
    }

    #[test]
    fn image_alt_text_is_flattened() {
        let tokens = parse("![*a* `b` [c](u)](img.png) d");
        let children = &tokens[1].children;
        assert_eq!(children.len(), 2);
        assert_eq!(children[0].attr_get("alt"), Some("a b c"));
        assert_eq!(children[1].content, " d");
    }

    #[test]
    fn fenced_code() {
        let tokens = parse("```rust\nlet x = 1;\n```");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, Fence);
        assert_eq!(tokens[0].info, "rust");
        assert_eq!(tokens[0].content, "let x = 1;\n");
    }

    #[test]
    fn levels_balance() {
        let tokens = parse("> - [x] quoted\n>   - [ ] nested\n\n---\n");
        let mut depth: isize = 0;
        for token in &tokens {
            match token.kind.nesting() {
                crate::token::Nesting::Open => {
                    assert_eq!(token.level as isize, depth);
                    depth += 1;
                }
                crate::token::Nesting::Close => {
                    depth -= 1;
                    assert_eq!(token.level as isize, depth);
                }
                crate::token::Nesting::Standalone => assert_eq!(token.level as isize, depth),
            }
        }
        assert_eq!(depth, 0);
    }
}
