use crate::token::{Nesting, Token, TokenKind};

/// Convert a token sequence to HTML
pub fn render(tokens: &[Token]) -> String {
    let mut out = String::new();

    for (i, token) in tokens.iter().enumerate() {
        match token.kind {
            TokenKind::Inline => render_inline(&token.children, &mut out),
            TokenKind::Fence => emit_fence(token, &mut out),
            TokenKind::CodeBlock => {
                out.push_str("<pre><code>");
                escape_into(&token.content, &mut out);
                out.push_str("</code></pre>\n");
            }
            TokenKind::HtmlBlock => out.push_str(&token.content),
            _ => render_token(tokens, i, &mut out),
        }
    }

    out
}

fn render_inline(children: &[Token], out: &mut String) {
    for (i, token) in children.iter().enumerate() {
        match token.kind {
            TokenKind::Text => escape_into(&token.content, out),
            TokenKind::HtmlInline => out.push_str(&token.content),
            TokenKind::CodeInline => {
                out.push_str("<code>");
                escape_into(&token.content, out);
                out.push_str("</code>");
            }
            TokenKind::SoftBreak => out.push('\n'),
            TokenKind::HardBreak => out.push_str("<br>\n"),
            _ => render_token(children, i, out),
        }
    }
}

fn emit_fence(token: &Token, out: &mut String) {
    let language = token.info.split_whitespace().next().unwrap_or_default();
    if language.is_empty() {
        out.push_str("<pre><code>");
    } else {
        out.push_str("<pre><code class=\"language-");
        escape_into(language, out);
        out.push_str("\">");
    }
    escape_into(&token.content, out);
    out.push_str("</code></pre>\n");
}

/// Generic tag rendering: open or close tag with attributes, and a newline
/// after block tags unless the content continues inline.
fn render_token(tokens: &[Token], idx: usize, out: &mut String) {
    let token = &tokens[idx];
    if token.hidden {
        return;
    }

    let nesting = token.kind.nesting();
    let block = token.kind.is_block();

    // A hidden paragraph left the line open
    if block && nesting != Nesting::Close && idx > 0 && tokens[idx - 1].hidden {
        out.push('\n');
    }

    out.push_str(if nesting == Nesting::Close { "</" } else { "<" });
    out.push_str(token.kind.tag());
    for (name, value) in &token.attrs {
        out.push(' ');
        escape_into(name, out);
        out.push_str("=\"");
        escape_into(value, out);
        out.push('"');
    }

    let mut newline = block;
    if block && nesting == Nesting::Open {
        if let Some(next) = tokens.get(idx + 1) {
            if next.kind == TokenKind::Inline
                || next.hidden
                || (next.kind.nesting() == Nesting::Close && next.kind.tag() == token.kind.tag())
            {
                newline = false;
            }
        }
    }

    out.push_str(if newline { ">\n" } else { ">" });
}

fn escape_into(text: &str, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
}
