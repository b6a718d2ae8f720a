use pulldown_cmark::{CowStr, Event, HeadingLevel, Options, Parser, Tag, TagEnd, html};
use std::collections::HashMap;

/// A heading found while rendering, used for the page outline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heading {
    pub level: u8,
    pub text: String,
    pub anchor: String,
}

/// Render markdown to HTML. Every heading gets an `id` anchor (explicit
/// `{#id}` attributes win) and is returned in document order.
pub fn render_markdown(source: &str) -> (String, Vec<Heading>) {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_TASKLISTS);
    options.insert(Options::ENABLE_HEADING_ATTRIBUTES);

    let mut events: Vec<Event> = Parser::new_ext(source, options).collect();
    let mut headings = Vec::new();
    let mut seen: HashMap<String, usize> = HashMap::new();

    for i in 0..events.len() {
        let (level, explicit_id) = match &events[i] {
            Event::Start(Tag::Heading { level, id, .. }) => (*level, id.clone()),
            _ => continue,
        };

        let mut text = String::new();
        for event in &events[i + 1..] {
            match event {
                Event::End(TagEnd::Heading(_)) => break,
                Event::Text(t) | Event::Code(t) => text.push_str(t),
                _ => {}
            }
        }

        let anchor = match explicit_id {
            Some(id) => id.to_string(),
            None => unique_anchor(&text, &mut seen),
        };

        if let Event::Start(Tag::Heading { id, .. }) = &mut events[i] {
            *id = Some(CowStr::from(anchor.clone()));
        }

        headings.push(Heading {
            level: heading_level(level),
            text,
            anchor,
        });
    }

    let mut out = String::with_capacity(source.len() * 3 / 2);
    html::push_html(&mut out, events.into_iter());
    (out, headings)
}

/// Heading ids may hold any letter, so CJK headings keep readable anchors
fn anchor_slug(text: &str) -> String {
    let mut anchor = String::with_capacity(text.len());
    for c in text.trim().to_lowercase().chars() {
        if c.is_alphanumeric() {
            anchor.push(c);
        } else if (c.is_whitespace() || c == '-' || c == '_') && !anchor.ends_with('-') {
            anchor.push('-');
        }
    }
    anchor.trim_matches('-').to_string()
}

fn unique_anchor(text: &str, seen: &mut HashMap<String, usize>) -> String {
    let mut base = anchor_slug(text);
    if base.is_empty() {
        base = "section".to_string();
    }
    let count = seen.entry(base.clone()).or_insert(0);
    *count += 1;
    if *count == 1 {
        base
    } else {
        format!("{}-{}", base, *count - 1)
    }
}

fn heading_level(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}
