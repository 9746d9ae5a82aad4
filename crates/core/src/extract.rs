//! Rule ID extraction from XML rule-file content.
//!
//! Rule files are not standalone XML documents: a file may hold several
//! top-level sibling elements with no enclosing root. The scanner here
//! therefore parses content as a forest of sibling fragments instead of
//! wrapping it in a synthetic root element first.
//!
//! Extraction never fails across this boundary. Content that is not
//! well-formed (an unclosed element, a mismatched closing tag, a broken
//! attribute) yields an empty identifier sequence plus a [`ParseIssue`]
//! carrying a short content preview for diagnosis.

use tracing::debug;

use crate::models::RuleId;

/// Element whose `id` attribute carries a rule identifier.
const RULE_ELEMENT: &str = "rule";

/// How much of the offending content a [`ParseIssue`] preview keeps.
const PREVIEW_LEN: usize = 200;

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// A diagnostic for content that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIssue {
    /// What went wrong.
    pub message: String,
    /// The first ~200 characters of the content.
    pub preview: String,
}

/// The outcome of extracting rule identifiers from one blob of content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    /// Identifiers in document order, duplicates preserved.
    pub ids: Vec<RuleId>,
    /// Present when the content was malformed; `ids` is then empty.
    pub issue: Option<ParseIssue>,
}

impl Extraction {
    fn ok(ids: Vec<RuleId>) -> Self {
        Self { ids, issue: None }
    }

    fn malformed(content: &str, message: String) -> Self {
        Self {
            ids: Vec::new(),
            issue: Some(ParseIssue {
                message,
                preview: preview(content),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

/// Extract every rule identifier from `content`, in document order.
///
/// A `rule` element contributes an identifier only when its `id`
/// attribute is present, non-empty, and entirely ASCII digits. Anything
/// else on that element is silently skipped. Elements may nest at any
/// depth and the content may hold any number of top-level siblings.
pub fn extract_rule_ids(content: &str) -> Extraction {
    if content.trim().is_empty() {
        return Extraction::ok(Vec::new());
    }
    match scan_fragments(content) {
        Ok(ids) => {
            debug!(count = ids.len(), "extracted rule ids");
            Extraction::ok(ids)
        }
        Err(message) => {
            debug!(%message, "content is not well-formed");
            Extraction::malformed(content, message)
        }
    }
}

/// Walk the tag stream, tracking open elements for well-formedness and
/// collecting `rule` ids as they appear.
fn scan_fragments(content: &str) -> Result<Vec<RuleId>, String> {
    let mut ids = Vec::new();
    let mut stack: Vec<&str> = Vec::new();
    let mut pos = 0;

    while let Some(rel) = content[pos..].find('<') {
        pos += rel;
        let rest = &content[pos..];

        // Comments, CDATA, processing instructions, declarations.
        if let Some(skip) = skip_special(rest)? {
            pos += skip;
            continue;
        }

        let end = tag_end(rest).ok_or_else(|| "tag is never closed with '>'".to_string())?;
        let tag = &rest[1..end];
        pos += end + 1;

        // Closing tag.
        if let Some(name) = tag.strip_prefix('/') {
            let name = name.trim();
            match stack.pop() {
                Some(open) if open == name => {}
                Some(open) => {
                    return Err(format!(
                        "mismatched closing tag </{}> (expected </{}>)",
                        name, open
                    ));
                }
                None => {
                    return Err(format!("closing tag </{}> with no open element", name));
                }
            }
            continue;
        }

        // Opening or self-closing tag.
        let self_closing = tag.ends_with('/');
        let body = if self_closing {
            tag[..tag.len() - 1].trim()
        } else {
            tag.trim()
        };
        if body.is_empty() {
            return Err("empty tag".to_string());
        }

        let name_end = body
            .find(|c: char| c.is_whitespace())
            .unwrap_or(body.len());
        let (name, attrs) = body.split_at(name_end);
        if !is_valid_name(name) {
            return Err(format!("invalid element name '{}'", name));
        }

        if name == RULE_ELEMENT {
            if let Some(value) = attr_value(attrs, "id")? {
                if is_all_digits(&value) {
                    if let Ok(id) = value.parse::<RuleId>() {
                        ids.push(id);
                    }
                }
            }
        }

        if !self_closing {
            stack.push(name);
        }
    }

    if let Some(open) = stack.last() {
        return Err(format!("unclosed element <{}>", open));
    }
    Ok(ids)
}

/// Skip over non-element markup. Returns `Ok(Some(len))` with the number
/// of bytes to advance, `Ok(None)` for an ordinary tag.
fn skip_special(rest: &str) -> Result<Option<usize>, String> {
    if rest.starts_with("<!--") {
        return match rest.find("-->") {
            Some(end) => Ok(Some(end + 3)),
            None => Err("unterminated comment".to_string()),
        };
    }
    if rest.starts_with("<![CDATA[") {
        return match rest.find("]]>") {
            Some(end) => Ok(Some(end + 3)),
            None => Err("unterminated CDATA section".to_string()),
        };
    }
    if rest.starts_with("<?") {
        return match rest.find("?>") {
            Some(end) => Ok(Some(end + 2)),
            None => Err("unterminated processing instruction".to_string()),
        };
    }
    if rest.starts_with("<!") {
        return match rest.find('>') {
            Some(end) => Ok(Some(end + 1)),
            None => Err("unterminated markup declaration".to_string()),
        };
    }
    Ok(None)
}

/// Find the byte offset of the `>` that terminates the tag starting at
/// `rest[0] == '<'`, ignoring `>` inside quoted attribute values.
fn tag_end(rest: &str) -> Option<usize> {
    let mut quote: Option<char> = None;
    for (i, c) in rest.char_indices().skip(1) {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None => match c {
                '"' | '\'' => quote = Some(c),
                '>' => return Some(i),
                _ => {}
            },
        }
    }
    None
}

/// Look up one attribute in a tag's attribute string, walking `name="value"`
/// pairs so that `id` never matches a suffix of another attribute name.
fn attr_value(attrs: &str, wanted: &str) -> Result<Option<String>, String> {
    let mut rest = attrs.trim_start();
    while !rest.is_empty() {
        let name_end = rest
            .find(|c: char| c == '=' || c.is_whitespace())
            .ok_or_else(|| format!("attribute '{}' has no value", rest.trim()))?;
        let name = &rest[..name_end];
        rest = rest[name_end..].trim_start();
        rest = rest
            .strip_prefix('=')
            .ok_or_else(|| format!("attribute '{}' is missing '='", name))?
            .trim_start();
        let quote = match rest.chars().next() {
            Some(q @ ('"' | '\'')) => q,
            Some(_) => return Err(format!("attribute '{}' value is not quoted", name)),
            None => return Err(format!("attribute '{}' has no value", name)),
        };
        let value_and_rest = &rest[1..];
        let close = value_and_rest
            .find(quote)
            .ok_or_else(|| format!("unterminated value for attribute '{}'", name))?;
        let value = &value_and_rest[..close];
        rest = value_and_rest[close + 1..].trim_start();
        if name == wanted {
            return Ok(Some(xml_unescape(value)));
        }
    }
    Ok(None)
}

/// Unescape standard XML entities.
fn xml_unescape(s: &str) -> String {
    s.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
}

fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_' | ':'))
}

fn is_all_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// First ~200 characters of `content`, cut on a char boundary.
fn preview(content: &str) -> String {
    let mut end = PREVIEW_LEN.min(content.len());
    while !content.is_char_boundary(end) {
        end -= 1;
    }
    content[..end].to_string()
}
