use chrono::NaiveDate;

use crate::catalog::TemplateDefinition;

/// Placeholder in a template's `filename_pattern`.
pub const DATE_PLACEHOLDER: &str = "{date}";

/// Artifact filename for `template`.
///
/// A non-empty `custom` name wins and only gains the format's extension.
/// Otherwise the template name has each whitespace run replaced by `_`,
/// followed by `_YYYY-MM-DD`.
pub fn resolve_filename(template: &TemplateDefinition, custom: Option<&str>, date: NaiveDate) -> String {
    let ext = template.format.extension();
    match custom.filter(|c| !c.is_empty()) {
        Some(name) => format!("{name}.{ext}"),
        None => format!(
            "{}_{}.{ext}",
            collapse_whitespace(template.name, '_'),
            date.format("%Y-%m-%d")
        ),
    }
}

/// The template's display filename with `{date}` filled in.
pub fn expand_filename_pattern(template: &TemplateDefinition, date: NaiveDate) -> String {
    template
        .filename_pattern
        .replace(DATE_PLACEHOLDER, &date.format("%Y-%m-%d").to_string())
}

fn collapse_whitespace(s: &str, with: char) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_run = false;
    for ch in s.chars() {
        if ch.is_whitespace() {
            if !in_run {
                out.push(with);
            }
            in_run = true;
        } else {
            out.push(ch);
            in_run = false;
        }
    }
    out
}
