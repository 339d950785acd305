//! Recognition of feature references in source text
//!
//! Two surface syntaxes embed a feature id in arbitrary text:
//!
//! - hot-phrase: `baseline/grid`
//! - attribute: `<baseline-status featureId="grid">`
//!
//! Matching is purely textual and line based. Only the first reference of a
//! line is reported.

use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

static HOT_PHRASE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bbaseline/([a-z-]+)\b").expect("valid regex"));

static ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<baseline-status[^>]*featureId=['"]?([a-z-]+)['"]?"#).expect("valid regex")
});

static TODO_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bTODO\(baseline/\b([A-Za-z0-9-]+)\b\)").expect("valid regex")
});

// Trigger grammars are anchored at the cursor; group 1 is what the user has
// already typed of the id.
static HOT_PHRASE_TRIGGER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bbaseline/([a-z-]*)$").expect("valid regex"));

static ATTRIBUTE_TRIGGER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<baseline-status[^>]*featureId=['"]?([a-z-]*)$"#).expect("valid regex")
});

/// A zero-based line/column position (UTF-16 columns)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Position {
    pub line: u32,
    pub character: u32,
}

/// A half-open range between two positions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

/// Which syntax a reference was written in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SyntaxKind {
    /// `baseline/<id>`
    HotPhrase,
    /// `<baseline-status ... featureId="<id>">`
    Attribute,
}

/// A feature id located in a line of text.
///
/// Columns count UTF-16 code units from the start of the line, matching the
/// default LSP position encoding. `end_column` is exclusive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reference {
    /// Line number (0-indexed)
    pub line: u32,
    pub start_column: u32,
    pub end_column: u32,
    /// The captured id, lowercased
    pub feature_id: String,
    pub syntax: SyntaxKind,
}

impl Reference {
    /// Range covering exactly the feature id
    pub fn range(&self) -> Range {
        Range {
            start: Position {
                line: self.line,
                character: self.start_column,
            },
            end: Position {
                line: self.line,
                character: self.end_column,
            },
        }
    }

    /// Whether a cursor column falls on the id
    pub fn contains_column(&self, column: u32) -> bool {
        self.start_column <= column && column < self.end_column
    }
}

/// Find the leftmost reference on a line, in either syntax.
///
/// When both syntaxes start at the same offset the hot-phrase wins.
// TODO: report every reference on the line instead of the first one
pub fn find_first_reference(line_text: &str, line: u32) -> Option<Reference> {
    let hot = HOT_PHRASE
        .captures(line_text)
        .map(|c| (c, SyntaxKind::HotPhrase));
    let attr = ATTRIBUTE
        .captures(line_text)
        .map(|c| (c, SyntaxKind::Attribute));

    let (caps, syntax) = match (hot, attr) {
        (Some(h), Some(a)) => {
            if a.0.get(0)?.start() < h.0.get(0)?.start() {
                a
            } else {
                h
            }
        }
        (Some(h), None) => h,
        (None, Some(a)) => a,
        (None, None) => return None,
    };

    // Group 1 is the id; its offset already accounts for the prefix length
    // of whichever syntax matched.
    let id = caps.get(1)?;

    Some(Reference {
        line,
        start_column: utf16_column(line_text, id.start()),
        end_column: utf16_column(line_text, id.end()),
        feature_id: id.as_str().to_lowercase(),
        syntax,
    })
}

/// Extract the id of a `TODO(baseline/<id>)` marker, verbatim.
pub fn find_todo_marker(line_text: &str) -> Option<&str> {
    TODO_MARKER
        .captures(line_text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// A position where a feature id may be inserted
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InsertionTrigger {
    /// Line number (0-indexed)
    pub line: u32,
    /// Where the id starts (UTF-16 column)
    pub column: u32,
    /// Cursor column; equal to `column` when nothing has been typed yet
    pub cursor: u32,
    /// Part of the id already typed after the trigger
    pub typed: String,
    pub syntax: SyntaxKind,
}

/// Text to insert at a location. Applying it is up to the editor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextInsertion {
    pub line: u32,
    pub column: u32,
    pub text: String,
}

impl InsertionTrigger {
    /// Instruction that inserts the chosen id at the trigger point
    pub fn insert(&self, feature_id: &str) -> TextInsertion {
        TextInsertion {
            line: self.line,
            column: self.column,
            text: feature_id.to_string(),
        }
    }
}

/// Whether the cursor sits immediately after `baseline/` or an open
/// `featureId=` attribute, with nothing typed yet.
pub fn insertion_trigger(line_text: &str, line: u32, column: u32) -> Option<InsertionTrigger> {
    completion_trigger(line_text, line, column).filter(|t| t.typed.is_empty())
}

/// Like [`insertion_trigger`], but also accepts a partially typed id between
/// the trigger and the cursor.
pub fn completion_trigger(line_text: &str, line: u32, column: u32) -> Option<InsertionTrigger> {
    let before = &line_text[..byte_offset(line_text, column)];

    let (caps, syntax) = if let Some(c) = HOT_PHRASE_TRIGGER.captures(before) {
        (c, SyntaxKind::HotPhrase)
    } else if let Some(c) = ATTRIBUTE_TRIGGER.captures(before) {
        (c, SyntaxKind::Attribute)
    } else {
        return None;
    };
    let typed = caps.get(1)?;

    Some(InsertionTrigger {
        line,
        column: utf16_column(before, typed.start()),
        cursor: utf16_column(before, before.len()),
        typed: typed.as_str().to_string(),
        syntax,
    })
}

/// UTF-16 column of a byte offset within a line
pub fn utf16_column(line_text: &str, byte_offset: usize) -> u32 {
    line_text[..byte_offset.min(line_text.len())]
        .encode_utf16()
        .count() as u32
}

/// Byte offset of a UTF-16 column, clamped to the line
pub fn byte_offset(line_text: &str, column: u32) -> usize {
    let mut units = 0u32;
    for (idx, ch) in line_text.char_indices() {
        if units >= column {
            return idx;
        }
        units += ch.len_utf16() as u32;
    }
    line_text.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn covered<'a>(line: &'a str, r: &Reference) -> &'a str {
        &line[byte_offset(line, r.start_column)..byte_offset(line, r.end_column)]
    }

    #[test]
    fn test_hot_phrase_range_covers_id() {
        let line = "// see baseline/foo-bar for details";
        let r = find_first_reference(line, 3).unwrap();
        assert_eq!(r.feature_id, "foo-bar");
        assert_eq!(r.syntax, SyntaxKind::HotPhrase);
        assert_eq!(r.line, 3);
        assert_eq!(covered(line, &r), "foo-bar");
    }

    #[test]
    fn test_attribute_range_covers_id() {
        let line = r#"<baseline-status featureId="foo-bar"></baseline-status>"#;
        let r = find_first_reference(line, 0).unwrap();
        assert_eq!(r.feature_id, "foo-bar");
        assert_eq!(r.syntax, SyntaxKind::Attribute);
        assert_eq!(covered(line, &r), "foo-bar");
    }

    #[test]
    fn test_attribute_with_other_attributes_and_quotes() {
        let line = "  <baseline-status class='x' featureId='grid'>";
        let r = find_first_reference(line, 0).unwrap();
        assert_eq!(covered(line, &r), "grid");

        let line = "<baseline-status featureId=grid>";
        let r = find_first_reference(line, 0).unwrap();
        assert_eq!(covered(line, &r), "grid");
    }

    #[test]
    fn test_case_insensitive_and_lowercased() {
        let line = "// Baseline/Container-Queries";
        let r = find_first_reference(line, 0).unwrap();
        assert_eq!(r.feature_id, "container-queries");
        assert_eq!(covered(line, &r), "Container-Queries");
    }

    #[test]
    fn test_leftmost_match_wins() {
        let line = r#"<baseline-status featureId="dialog"> see baseline/grid"#;
        let r = find_first_reference(line, 0).unwrap();
        assert_eq!(r.feature_id, "dialog");
        assert_eq!(r.syntax, SyntaxKind::Attribute);

        let line = r#"baseline/grid <baseline-status featureId="dialog">"#;
        let r = find_first_reference(line, 0).unwrap();
        assert_eq!(r.feature_id, "grid");
    }

    #[test]
    fn test_first_match_only() {
        let line = "baseline/grid and baseline/subgrid";
        let r = find_first_reference(line, 0).unwrap();
        assert_eq!(r.feature_id, "grid");
    }

    #[test]
    fn test_word_boundary_required() {
        assert!(find_first_reference("mybaseline/grid", 0).is_none());
        assert!(find_first_reference("baseline/", 0).is_none());
        assert!(find_first_reference("nothing to see here", 0).is_none());
    }

    #[test]
    fn test_trailing_hyphen_not_captured() {
        let line = "baseline/grid- next";
        let r = find_first_reference(line, 0).unwrap();
        assert_eq!(r.feature_id, "grid");
    }

    #[test]
    fn test_columns_are_utf16() {
        let line = "// ✨ baseline/grid";
        let r = find_first_reference(line, 0).unwrap();
        assert_eq!(r.start_column, 14);
        assert_eq!(r.end_column, 18);
        assert_eq!(covered(line, &r), "grid");
    }

    #[test]
    fn test_contains_column_is_half_open() {
        let r = find_first_reference("baseline/grid", 0).unwrap();
        assert!(!r.contains_column(8));
        assert!(r.contains_column(9));
        assert!(r.contains_column(12));
        assert!(!r.contains_column(13));
    }

    #[test]
    fn test_todo_marker() {
        assert_eq!(find_todo_marker("// TODO(baseline/grid) fix this"), Some("grid"));
        assert_eq!(
            find_todo_marker("/* TODO(baseline/CSS-Nesting2) */"),
            Some("CSS-Nesting2")
        );
        assert_eq!(find_todo_marker("// TODO: baseline/grid"), None);
        assert_eq!(find_todo_marker("// todo(baseline/grid)"), None);
        assert_eq!(find_todo_marker("// TODO(baseline/)"), None);
    }

    #[test]
    fn test_insertion_trigger_hot_phrase() {
        let line = "// see baseline/";
        let t = insertion_trigger(line, 2, 16).unwrap();
        assert_eq!(t.syntax, SyntaxKind::HotPhrase);
        assert_eq!(
            t.insert("grid"),
            TextInsertion {
                line: 2,
                column: 16,
                text: "grid".into()
            }
        );

        // Cursor not right after the trigger
        assert!(insertion_trigger(line, 2, 10).is_none());
    }

    #[test]
    fn test_insertion_trigger_attribute() {
        let line = r#"<baseline-status featureId=""#;
        let t = insertion_trigger(line, 0, 28).unwrap();
        assert_eq!(t.syntax, SyntaxKind::Attribute);
        assert_eq!(t.column, 28);

        let line = "<baseline-status featureId=";
        assert!(insertion_trigger(line, 0, 27).is_some());
    }

    #[test]
    fn test_completion_trigger_with_typed_prefix() {
        let line = "// baseline/gr";
        let t = completion_trigger(line, 0, 14).unwrap();
        assert_eq!(t.typed, "gr");
        assert_eq!(t.column, 12);
        assert_eq!(t.cursor, 14);
        assert!(insertion_trigger(line, 0, 14).is_none());
    }
}
