
use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd};

/// Convert a markdown (MDX) body into plain text suitable for embedding.
///
/// JSX component tags and raw HTML are dropped, code spans are kept as text,
/// and block boundaries become paragraph breaks. Runs of blank lines are
/// collapsed so chunk boundary detection sees at most one `\n\n` in a row.
#[inline]
pub fn extract_plain_text(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let parser = Parser::new_ext(markdown, options);
    let mut text = String::new();

    for event in parser {
        match event {
            Event::Start(Tag::Item) => {
                push_paragraph_break(&mut text);
            }
            Event::Text(chunk) | Event::Code(chunk) => {
                text.push_str(&chunk);
            }
            Event::SoftBreak | Event::HardBreak => {
                text.push('\n');
            }
            Event::End(
                TagEnd::Paragraph
                | TagEnd::Heading(_)
                | TagEnd::CodeBlock
                | TagEnd::List(_)
                | TagEnd::Table
                | TagEnd::BlockQuote(_),
            ) => {
                push_paragraph_break(&mut text);
            }
            Event::End(TagEnd::TableRow) => {
                text.push('\n');
            }
            Event::End(TagEnd::TableCell) => {
                text.push(' ');
            }
            // MDX components and raw HTML carry no prose
            Event::Html(_) | Event::InlineHtml(_) => {}
            _ => {}
        }
    }

    collapse_blank_lines(text.trim())
}

fn push_paragraph_break(text: &mut String) {
    while text.ends_with('\n') {
        text.pop();
    }
    if !text.is_empty() {
        text.push_str("\n\n");
    }
}

/// Collapse three or more consecutive newlines down to a paragraph break
fn collapse_blank_lines(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut newline_run = 0;

    for ch in text.chars() {
        if ch == '\n' {
            newline_run += 1;
            if newline_run <= 2 {
                out.push(ch);
            }
        } else {
            newline_run = 0;
            out.push(ch);
        }
    }

    out
}
