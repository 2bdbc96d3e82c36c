// src/corpus/markdown.rs
use once_cell::sync::Lazy;
use pulldown_cmark::{html, Options, Parser};
use regex::Regex;
use serde::Serialize;

/// One "Key Takeaways" bullet. Unnamed bullets are labelled "Key point".
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Takeaway {
    pub name: String,
    pub text: String,
}

static RE_SECTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^##\s+Key Takeaways").expect("section regex"));
static RE_NAMED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[-*]\s+\*\*(.+?)\*\*[:\s]*(.+)").expect("named bullet regex"));
static RE_BULLET: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[-*]\s+(.+)").expect("bullet regex"));

/// Render markdown with tables, footnotes, strikethrough and heading attributes.
pub fn render_html(body_md: &str) -> String {
    let mut opts = Options::empty();
    opts.insert(Options::ENABLE_TABLES);
    opts.insert(Options::ENABLE_FOOTNOTES);
    opts.insert(Options::ENABLE_STRIKETHROUGH);
    opts.insert(Options::ENABLE_HEADING_ATTRIBUTES);
    let parser = Parser::new_ext(body_md, opts);
    let mut out = String::with_capacity(body_md.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}

/// Collect bullets under `## Key Takeaways`, stopping at the next heading or rule.
pub fn extract_key_takeaways(body_md: &str) -> Vec<Takeaway> {
    let mut out = Vec::new();
    let mut inside = false;
    for line in body_md.lines() {
        if !inside {
            inside = RE_SECTION.is_match(line);
            continue;
        }
        if line.starts_with('#') || line.starts_with("---") {
            break;
        }
        if let Some(c) = RE_NAMED.captures(line) {
            out.push(Takeaway {
                name: c[1].trim().trim_end_matches(':').trim_end().to_string(),
                text: c[2].trim().to_string(),
            });
        } else if let Some(c) = RE_BULLET.captures(line) {
            out.push(Takeaway {
                name: "Key point".to_string(),
                text: c[1].trim().to_string(),
            });
        }
    }
    out
}
