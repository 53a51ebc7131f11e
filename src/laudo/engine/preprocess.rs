//! Markup clean-up before a part is parsed as a template.
//!
//! Word splits typed text across runs freely, so `{{ Contratante }}` may reach
//! us as `{{</w:t></w:r><w:r><w:t>Contratante }}`. Tags are stitched back
//! together, and scoped tags (`{%tr`, `{%tc`, `{%p`, `{%r`) replace the table
//! row, cell, paragraph or run that contains them.

use lazy_static::lazy_static;
use quick_xml::escape::unescape;
use regex::{Captures, Regex};

use super::RenderError;

lazy_static! {
    static ref MARKUP_AFTER_OPEN: Regex = Regex::new(r"\{(?:<[^>]*>)+([{%#])").unwrap();
    static ref MARKUP_BEFORE_CLOSE: Regex = Regex::new(r"([%}#])(?:<[^>]*>)+\}").unwrap();
    static ref TAG: Regex = Regex::new(r"(?s)\{\{.*?\}\}|\{%.*?%\}|\{#.*?#\}").unwrap();
    static ref MARKUP: Regex = Regex::new(r"<[^>]*>").unwrap();
    static ref SCOPED_TAG: Regex = Regex::new(r"(?s)\{%(tr|tc|p|r)\s(.*?)%\}").unwrap();
}

/// Clean `xml` so every template tag is plain text with no markup inside.
pub fn prepare(xml: &str) -> Result<String, RenderError> {
    let joined = MARKUP_AFTER_OPEN.replace_all(xml, "{${1}");
    let joined = MARKUP_BEFORE_CLOSE.replace_all(&joined, "${1}}");
    let cleaned = TAG.replace_all(&joined, |caps: &Captures| clean_tag(&caps[0]));
    expand_scoped_tags(&cleaned)
}

/// Strip markup from inside one tag and turn entities and typographic quotes
/// back into plain characters.
fn clean_tag(tag: &str) -> String {
    let stripped = MARKUP.replace_all(tag, "");
    let unescaped = unescape(&stripped)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| stripped.into_owned());
    unescaped
        .replace(['\u{201C}', '\u{201D}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'")
}

fn element_for_scope(scope: &str) -> &'static str {
    match scope {
        "tr" => "w:tr",
        "tc" => "w:tc",
        "p" => "w:p",
        _ => "w:r",
    }
}

/// Position of the last `<element>` or `<element ...>` opening tag.
fn find_open(haystack: &str, element: &str) -> Option<usize> {
    let open = format!("<{element}");
    let mut search_end = haystack.len();
    while let Some(pos) = haystack[..search_end].rfind(&open) {
        match haystack[pos + open.len()..].chars().next() {
            Some('>') | Some(' ') | Some('/') => return Some(pos),
            _ => search_end = pos,
        }
    }
    None
}

fn expand_scoped_tags(xml: &str) -> Result<String, RenderError> {
    let mut out = xml.to_string();
    loop {
        let (tag_start, tag_end, scope, statement) = match SCOPED_TAG.captures(&out) {
            Some(caps) => {
                let whole = caps.get(0).expect("group 0 always matches");
                (
                    whole.start(),
                    whole.end(),
                    caps[1].to_string(),
                    caps[2].trim().to_string(),
                )
            }
            None => return Ok(out),
        };

        let element = element_for_scope(&scope);
        let close = format!("</{element}>");
        let start = find_open(&out[..tag_start], element);
        let end = out[tag_end..]
            .find(&close)
            .map(|i| tag_end + i + close.len());

        match (start, end) {
            (Some(start), Some(end)) => {
                out.replace_range(start..end, &format!("{{% {statement} %}}"));
            }
            _ => {
                return Err(RenderError::Syntax(format!(
                    "tag '{{%{scope} {statement} %}}' is not inside a <{element}> element"
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_joins_tag_split_across_runs() {
        let xml = "<w:r><w:t>{</w:t></w:r><w:r><w:t>{ Contratante }</w:t></w:r><w:r><w:t>}</w:t></w:r>";
        let prepared = prepare(xml).unwrap();
        assert!(prepared.contains("{{ Contratante }}"));
    }

    #[test]
    fn test_strips_markup_inside_tag() {
        let xml = "<w:t>{{ Contra</w:t></w:r><w:r><w:t>tante }}</w:t>";
        let prepared = prepare(xml).unwrap();
        assert_eq!(prepared, "<w:t>{{ Contratante }}</w:t>");
    }

    #[test]
    fn test_unescapes_entities_and_quotes() {
        let xml = "<w:t>{% if a &amp;&amp; \u{201C}b\u{201D} %}</w:t>";
        let prepared = prepare(xml).unwrap();
        assert_eq!(prepared, "<w:t>{% if a && \"b\" %}</w:t>");
    }

    #[test]
    fn test_row_scoped_tag_replaces_row() {
        let xml = concat!(
            "<w:tbl>",
            "<w:tr><w:trPr/><w:tc><w:p><w:r><w:t>{%tr for row in geral_rows %}</w:t></w:r></w:p></w:tc></w:tr>",
            "<w:tr><w:tc><w:p><w:r><w:t>{{ row.col1_caption }}</w:t></w:r></w:p></w:tc></w:tr>",
            "<w:tr><w:tc><w:p><w:r><w:t>{%tr endfor %}</w:t></w:r></w:p></w:tc></w:tr>",
            "</w:tbl>"
        );
        let prepared = prepare(xml).unwrap();
        assert_eq!(
            prepared,
            concat!(
                "<w:tbl>",
                "{% for row in geral_rows %}",
                "<w:tr><w:tc><w:p><w:r><w:t>{{ row.col1_caption }}</w:t></w:r></w:p></w:tc></w:tr>",
                "{% endfor %}",
                "</w:tbl>"
            )
        );
    }

    #[test]
    fn test_paragraph_tag_skips_paragraph_properties() {
        let xml = "<w:p><w:pPr/><w:r><w:t>{%p if x %}</w:t></w:r></w:p>";
        assert_eq!(prepare(xml).unwrap(), "{% if x %}");
    }

    #[test]
    fn test_scoped_tag_outside_element_fails() {
        assert!(prepare("<w:t>{%tr for a in b %}</w:t>").is_err());
    }
}
