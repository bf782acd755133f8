use std::fmt;

use tracing::{debug, trace};

use crate::config::Options;
use crate::ids::{IdGenerator, RandomIds};
use crate::pipeline::CoreRule;
use crate::token::{Token, TokenKind, parent_index};

const UNCHECKED: &str = "[ ] ";
const CHECKED: [&str; 2] = ["[x] ", "[X] "];
/// Characters removed from the item text; the separating space stays.
const MARKER_LEN: usize = 3;

fn starts_with_task_marker(content: &str) -> bool {
    content.starts_with(UNCHECKED) || is_checked(content)
}

fn is_checked(content: &str) -> bool {
    CHECKED.iter().any(|marker| content.starts_with(marker))
}

/// Whether `tokens[index]` is the inline content of a task list item.
///
/// The item must have the shape list item open, paragraph open, inline, with
/// the inline text starting with a task marker.
pub fn is_task_item(tokens: &[Token], index: usize) -> bool {
    if index < 2 || index >= tokens.len() {
        return false;
    }
    tokens[index].kind == TokenKind::Inline
        && tokens[index - 1].kind == TokenKind::ParagraphOpen
        && tokens[index - 2].kind == TokenKind::ListItemOpen
        && starts_with_task_marker(&tokens[index].content)
}

/// The `<input type="checkbox">` fragment
#[derive(Debug, Clone, PartialEq, Eq)]
struct Checkbox<'a> {
    class: &'a str,
    checked: bool,
    disabled: bool,
    id: Option<String>,
}

impl fmt::Display for Checkbox<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, r#"<input class="{}" type="checkbox""#, self.class)?;
        if self.checked {
            f.write_str(" checked")?;
        }
        if self.disabled {
            f.write_str(" disabled")?;
        }
        if let Some(id) = &self.id {
            write!(f, r#" id="{id}""#)?;
        }
        f.write_str(">")
    }
}

fn begin_label(options: &Options) -> Token {
    Token::html_inline(format!(r#"<label class="{}">"#, options.label_class))
}

fn end_label() -> Token {
    Token::html_inline("</label>")
}

/// A label tied to the checkbox through `for`.
fn paired_label(text: &str, id: &str, options: &Options) -> Token {
    let mut token = Token::html_inline(format!(
        r#"<label class="{}" for="{id}">{}</label>"#,
        options.label_class,
        text.trim()
    ));
    token.attr_push("for", id);
    token
}

fn strip_marker(text: &mut String) {
    if starts_with_task_marker(text) {
        text.drain(..MARKER_LEN);
    }
}

/// Turn the inline token of a task item into checkbox markup.
fn create_todo(token: &mut Token, options: &Options, ids: &mut impl IdGenerator) {
    let mut checkbox = Checkbox {
        class: &options.input_class,
        checked: is_checked(&token.content),
        disabled: !options.enabled,
        id: None,
    };

    token.children.insert(0, Token::html_inline(checkbox.to_string()));
    if let Some(text) = token.children.get_mut(1) {
        strip_marker(&mut text.content);
    }
    strip_marker(&mut token.content);

    if !options.label {
        return;
    }

    if options.label_after || options.label_before {
        token.children.pop();

        let id = ids.next_id(&options.item_class);
        checkbox.id = Some(id.clone());
        if let Some(input) = token.children.first_mut() {
            input.content = checkbox.to_string();
        }

        let label = paired_label(&token.content, &id, options);
        if options.label_after {
            token.children.push(label);
        } else {
            token.children.insert(0, label);
        }
    } else {
        token.children.insert(0, begin_label(options));
        token.children.push(end_label());
    }
}

/// Pipeline rule that renders GitHub-style task list items as checkboxes.
///
/// List items whose text starts with `[ ] `, `[x] ` or `[X] ` get a checkbox in
/// place of the marker, see
/// <https://github.com/blog/1375-task-lists-in-gfm-issues-pulls-comments>.
///
/// Only inline children and `class` attributes are touched; the token
/// sequence keeps its length and order.
pub struct TaskLists<G = RandomIds> {
    options: Options,
    ids: G,
}

impl TaskLists {
    pub fn new(options: Options) -> Self {
        Self::with_ids(options, RandomIds::new())
    }
}

impl<G: IdGenerator> TaskLists<G> {
    /// Use `ids` to generate the identifiers of paired labels.
    pub fn with_ids(options: Options, ids: G) -> Self {
        Self { options, ids }
    }

    /// Rewrite every task item in `tokens` in a single forward pass.
    pub fn apply(&mut self, tokens: &mut [Token]) {
        let item_class = self.options.item_class_attr();
        let mut converted = 0usize;

        for i in 2..tokens.len() {
            if !is_task_item(tokens, i) {
                continue;
            }
            create_todo(&mut tokens[i], &self.options, &mut self.ids);
            tokens[i - 2].attr_set("class", item_class.as_str());

            match parent_index(tokens, i - 2) {
                Some(parent) => {
                    tokens[parent].attr_set("class", self.options.container_class.as_str())
                }
                None => trace!(index = i - 2, "task item without enclosing list"),
            }

            debug!(index = i, content = %tokens[i].content.trim(), "task list item");
            converted += 1;
        }

        debug!(converted, "task list pass finished");
    }
}

impl<G: IdGenerator> CoreRule for TaskLists<G> {
    fn name(&self) -> &'static str {
        "github-task-lists"
    }

    fn run(&mut self, tokens: &mut [Token]) {
        self.apply(tokens);
    }
}
