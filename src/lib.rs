pub mod config;
pub mod parser;
pub mod syntax;

pub use config::Config;
pub use config::ConfigBuilder;
pub use parser::{ParseOptions, Parser, ParserBuilder};
pub use syntax::{Node, NodeValue};

#[cfg(debug_assertions)]
fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Parses a Markdown document with every GFM grammar and default options.
///
/// # Examples
///
/// ```rust
/// use markmatch::{parse, NodeValue};
///
/// let tree = parse("# Heading\n\nParagraph *text*.");
/// assert_eq!(tree.children[0].value, NodeValue::Heading { depth: 1 });
/// assert_eq!(tree.children[1].to_plain_text(), "Paragraph text.");
/// ```
pub fn parse(input: &str) -> Node {
    parse_with_config(input, &Config::default())
}

/// Parses a Markdown document with the grammar set and options from `config`.
pub fn parse_with_config(input: &str, config: &Config) -> Node {
    #[cfg(debug_assertions)]
    {
        init_logger();
    }

    ParserBuilder::from_config(config)
        .build()
        .parse(input, &ParseOptions::from(config))
}
