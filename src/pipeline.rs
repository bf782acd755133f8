use tracing::debug;

use crate::html;
use crate::parser;
use crate::token::Token;

/// A transform over the whole token sequence, run after inline parsing.
///
/// Rules get a slice: they may edit tokens but never add or remove them.
pub trait CoreRule {
    fn name(&self) -> &'static str;

    fn run(&mut self, tokens: &mut [Token]);
}

/// Markdown to HTML with a list of core rules applied in registration order.
#[derive(Default)]
pub struct Markdown {
    rules: Vec<Box<dyn CoreRule>>,
}

impl Markdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `rule` after the rules already present.
    pub fn with_rule(mut self, rule: impl CoreRule + 'static) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|rule| rule.name()).collect()
    }

    /// Tokenize `markdown` and run every rule over the result.
    pub fn parse(&mut self, markdown: &str) -> Vec<Token> {
        let mut tokens = parser::parse(markdown);
        for rule in &mut self.rules {
            debug!(rule = rule.name(), tokens = tokens.len(), "running core rule");
            rule.run(&mut tokens);
        }
        tokens
    }

    pub fn render(&mut self, markdown: &str) -> String {
        html::render(&self.parse(markdown))
    }
}
