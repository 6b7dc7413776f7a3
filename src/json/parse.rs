//! Purpose: Provide the runtime JSON decode entrypoints and stable failure categories.
//! Exports: `from_str`, `ParseFailureCategory`, `categorize_error`,
//! `categorize_message`, `hint_for_error`.
//! Role: Parser boundary that centralizes serde_json usage details.
//! Invariants: Category labels are stable; they appear in user-facing hints.
//! Notes: Error mapping to crate errors is done by callsites so domain context stays explicit.

use serde::de::DeserializeOwned;
use serde_json::error::Category;

pub(crate) fn from_str<T: DeserializeOwned>(input: &str) -> Result<T, serde_json::Error> {
    serde_json::from_str(input)
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum ParseFailureCategory {
    Syntax,
    Eof,
    Utf8,
    NumericRange,
    DepthLimit,
    Unknown,
}

impl ParseFailureCategory {
    pub(crate) fn label(self) -> &'static str {
        match self {
            ParseFailureCategory::Syntax => "syntax",
            ParseFailureCategory::Eof => "eof",
            ParseFailureCategory::Utf8 => "utf8",
            ParseFailureCategory::NumericRange => "numeric-range",
            ParseFailureCategory::DepthLimit => "depth-limit",
            ParseFailureCategory::Unknown => "unknown",
        }
    }
}

pub(crate) fn categorize_error(err: &serde_json::Error) -> ParseFailureCategory {
    let by_message = categorize_message(&err.to_string());
    if by_message != ParseFailureCategory::Unknown {
        return by_message;
    }
    match err.classify() {
        Category::Eof => ParseFailureCategory::Eof,
        Category::Syntax => ParseFailureCategory::Syntax,
        Category::Data | Category::Io => ParseFailureCategory::Unknown,
    }
}

pub(crate) fn categorize_message(message: &str) -> ParseFailureCategory {
    let message = message.to_ascii_lowercase();
    if message.contains("recursion limit") {
        ParseFailureCategory::DepthLimit
    } else if message.contains("utf-8") || message.contains("utf8") || message.contains("unicode") {
        ParseFailureCategory::Utf8
    } else if message.contains("out of range") {
        ParseFailureCategory::NumericRange
    } else if message.contains("eof") {
        ParseFailureCategory::Eof
    } else if message.contains("expected") || message.contains("trailing") || message.contains("key must be") {
        ParseFailureCategory::Syntax
    } else {
        ParseFailureCategory::Unknown
    }
}

pub(crate) fn hint_for_error(err: &serde_json::Error, context: &str) -> String {
    format!(
        "parse category: {}; line {}, column {}; context: {context}",
        categorize_error(err).label(),
        err.line(),
        err.column()
    )
}
