//! Markdown flattening for clipboard copy
//!
//! Reports travel and export as raw markdown; the clipboard gets the
//! rendered reading text instead, the same split the original client made
//! between copying and downloading. This keeps formatting characters out
//! of pasted text while leaving the exported source untouched.

use pulldown_cmark::{Event, Parser, Tag, TagEnd};

/// Flatten markdown to plain reading text
pub fn to_plain_text(markdown: &str) -> String {
    let mut out = String::new();
    let mut list_stack: Vec<Option<u64>> = Vec::new();

    for event in Parser::new(markdown) {
        match event {
            Event::Start(Tag::List(start)) => list_stack.push(start),
            Event::End(TagEnd::List(_)) => {
                list_stack.pop();
                if !out.ends_with("\n\n") {
                    out.push('\n');
                }
            }
            Event::Start(Tag::Item) => match list_stack.last_mut() {
                Some(Some(number)) => {
                    out.push_str(&format!("{number}. "));
                    *number += 1;
                }
                _ => out.push_str("- "),
            },
            Event::End(TagEnd::Item) => {
                if !out.ends_with('\n') {
                    out.push('\n');
                }
            }
            Event::Text(text) | Event::Code(text) => out.push_str(&text),
            Event::SoftBreak | Event::HardBreak => out.push('\n'),
            Event::End(TagEnd::Paragraph) | Event::End(TagEnd::Heading(_)) => {
                out.push_str("\n\n");
            }
            Event::Rule => out.push('\n'),
            _ => {}
        }
    }

    out.trim().to_string()
}
