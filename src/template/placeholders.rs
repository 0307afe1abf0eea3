//! Built-in resolvers for every template level.

use std::fmt::Write;

use chrono::{DateTime, Utc};

use super::registry::PlaceholderRegistry;
use super::scope::{DocumentScope, ObjectScope, PropertyScope, TextScope};
use crate::model::{ExportFormat, Op, PropertyKind};
use crate::render::{escape_html, escape_rtf};

/// Register the built-in resolvers.
pub fn register_defaults(registry: &mut PlaceholderRegistry) {
    let document = &mut registry.document;
    document.register("texts", |s: &DocumentScope| Op::cooked(s.texts.clone(), true));
    document.register("objects", |s: &DocumentScope| Op::cooked(s.objects.clone(), true));
    document.register("project", |s: &DocumentScope| Op::text(s.project.clone()));
    document.register("author", |s: &DocumentScope| {
        Op::text(s.author.clone().unwrap_or_default())
    });
    document.register("date", |s: &DocumentScope| {
        Op::text(format_date(&s.exported_at, &s.date_format))
    });
    document.register("textCount", |s: &DocumentScope| Op::text(s.stats.text_count.to_string()));
    document.register("objectCount", |s: &DocumentScope| {
        Op::text(s.stats.object_count.to_string())
    });
    document.register("wordCount", |s: &DocumentScope| Op::text(s.stats.word_count.to_string()));
    document.register("charCount", |s: &DocumentScope| Op::text(s.stats.char_count.to_string()));

    let text = &mut registry.text;
    text.register("name", |s: &TextScope| Op::text(s.name.clone()));
    text.register("content", |s: &TextScope| Op::cooked(s.content.clone(), true));
    text.register("created", |s: &TextScope| {
        Op::text(format_date(&s.created, &s.date_format))
    });
    text.register("changed", |s: &TextScope| {
        Op::text(format_date(&s.changed, &s.date_format))
    });
    text.register("wordCount", |s: &TextScope| Op::text(s.word_count.to_string()));

    let object = &mut registry.object;
    object.register("name", |s: &ObjectScope| Op::text(s.name.clone()));
    object.register("path", |s: &ObjectScope| Op::text(s.path.clone()));
    object.register("properties", |s: &ObjectScope| {
        Op::cooked(s.properties.clone(), true)
    });
    object.register("citations", |s: &ObjectScope| Op::cooked(s.citations.clone(), true));

    let property = &mut registry.property;
    property.register("name", |s: &PropertyScope| match s.kind {
        PropertyKind::Header => header_name(s.format, &s.name),
        _ => Op::text(s.name.clone()),
    });
    property.register("value", |s: &PropertyScope| s.value.clone());
}

/// Format a date, falling back to ISO dates for a malformed format string.
fn format_date(at: &DateTime<Utc>, format: &str) -> String {
    let mut out = String::new();
    if write!(out, "{}", at.format(format)).is_err() {
        log::warn!("Invalid date format '{}', using %Y-%m-%d", format);
        out.clear();
        out = at.format("%Y-%m-%d").to_string();
    }
    out
}

/// Uppercase, letter-spaced rendering of a header property name.
fn header_name(format: ExportFormat, name: &str) -> Op {
    let upper = name.to_uppercase();
    match format {
        ExportFormat::Html => Op::cooked(
            format!("<span class=\"property-header\">{}</span>", escape_html(&upper)),
            false,
        ),
        ExportFormat::Rtf => Op::cooked(format!("{{\\b\\expndtw40 {}}}", escape_rtf(&upper)), false),
        ExportFormat::Txt | ExportFormat::Docx => Op::text(letter_spaced(&upper)),
    }
}

/// Insert a space between every character.
pub fn letter_spaced(s: &str) -> String {
    let mut out = String::with_capacity(s.len() * 2);
    for (i, c) in s.chars().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Delta;
    use chrono::TimeZone;
    use crate::template::registry::PlaceholderRegistry;

    fn property(format: ExportFormat, kind: PropertyKind) -> PropertyScope {
        PropertyScope {
            format,
            id: "P1".to_string(),
            name: "Origins".to_string(),
            kind,
            value: Op::text("north"),
        }
    }

    #[test]
    fn test_letter_spaced() {
        assert_eq!(letter_spaced("ABC"), "A B C");
        assert_eq!(letter_spaced(""), "");
    }

    #[test]
    fn test_header_name_per_format() {
        let registry = PlaceholderRegistry::with_defaults();
        let template = Delta::from_ops(vec![Op::placeholder("name")]);

        let txt = registry.expand(&template, &property(ExportFormat::Txt, PropertyKind::Header));
        assert_eq!(txt.ops[0].as_text(), Some("O R I G I N S"));

        let html = registry.expand(&template, &property(ExportFormat::Html, PropertyKind::Header));
        assert!(html.ops[0].is_cooked());
        assert_eq!(
            html.ops[0].as_text(),
            Some("<span class=\"property-header\">ORIGINS</span>")
        );

        let rtf = registry.expand(&template, &property(ExportFormat::Rtf, PropertyKind::Header));
        assert_eq!(rtf.ops[0].as_text(), Some("{\\b\\expndtw40 ORIGINS}"));

        let plain = registry.expand(&template, &property(ExportFormat::Html, PropertyKind::Text));
        assert_eq!(plain.ops[0].as_text(), Some("Origins"));
        assert!(!plain.ops[0].is_cooked());
    }

    #[test]
    fn test_value_passes_through() {
        let registry = PlaceholderRegistry::with_defaults();
        let template = Delta::from_ops(vec![Op::placeholder("value")]);
        let out = registry.expand(&template, &property(ExportFormat::Txt, PropertyKind::Text));
        assert_eq!(out.ops[0].as_text(), Some("north"));
    }

    #[test]
    fn test_malformed_date_format_falls_back() {
        let at = Utc.with_ymd_and_hms(2024, 5, 17, 8, 30, 0).unwrap();
        assert_eq!(format_date(&at, "%d.%m.%Y"), "17.05.2024");
        assert_eq!(format_date(&at, "%Q"), "2024-05-17");
    }
}
