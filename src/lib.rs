mod config;
mod error;
mod html;
mod ids;
mod parser;
mod pipeline;
mod tasks;
mod token;

pub use config::{Config, Options, OptionsOverride};
pub use error::ConfigError;
pub use ids::{IdGenerator, RandomIds, SequentialIds};
pub use pipeline::{CoreRule, Markdown};
pub use tasks::{TaskLists, is_task_item};
pub use token::{Nesting, Token, TokenKind, parent_index};

/// Parse markdown text into a flat token sequence.
pub fn parse(markdown: &str) -> Vec<Token> {
    parser::parse(markdown)
}

/// Render a token sequence to HTML.
pub fn render(tokens: &[Token]) -> String {
    html::render(tokens)
}

/// Convert markdown to HTML with task lists using default options.
pub fn markdown_to_html(markdown: &str) -> String {
    markdown_to_html_with_options(markdown, &Config::compiled_default().tasks)
}

/// Convert markdown to HTML with task lists using custom options.
pub fn markdown_to_html_with_options(markdown: &str, options: &Options) -> String {
    Markdown::new()
        .with_rule(TaskLists::new(options.clone()))
        .render(markdown)
}
