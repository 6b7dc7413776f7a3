//! Purpose: Session-wide formatting switches consulted when leaf values are rendered or parsed.
//! Exports: `FormatPolicy`, `DateRepresentation`, `FloatParseTarget`, `LayoutMode`.
//! Role: Pure configuration; behavior lives in `core::leaf` and the engine writer.
//! Invariants: A policy is immutable once built and read by any number of sessions.
//! Invariants: Exactly one value of each switch is active per session.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DateRepresentation {
    /// RFC 3339 text, e.g. `2012-03-21T05:40:00Z`.
    #[default]
    Iso8601,
    /// Millisecond epoch wrapped in markers, e.g. `/Date(1332308400000)/`.
    EpochMillisTagged,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FloatParseTarget {
    /// IEEE 754 double. Never fails on range; precision loss is accepted.
    #[default]
    Binary64,
    /// `ExactDecimal`. Fails with `Overflow` instead of rounding.
    DecimalExact,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LayoutMode {
    #[default]
    Compact,
    Indented,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct FormatPolicy {
    dates: DateRepresentation,
    floats: FloatParseTarget,
    layout: LayoutMode,
}

impl FormatPolicy {
    pub const fn new(
        dates: DateRepresentation,
        floats: FloatParseTarget,
        layout: LayoutMode,
    ) -> Self {
        Self {
            dates,
            floats,
            layout,
        }
    }

    pub const fn with_dates(mut self, dates: DateRepresentation) -> Self {
        self.dates = dates;
        self
    }

    pub const fn with_floats(mut self, floats: FloatParseTarget) -> Self {
        self.floats = floats;
        self
    }

    pub const fn with_layout(mut self, layout: LayoutMode) -> Self {
        self.layout = layout;
        self
    }

    pub const fn dates(&self) -> DateRepresentation {
        self.dates
    }

    pub const fn floats(&self) -> FloatParseTarget {
        self.floats
    }

    pub const fn layout(&self) -> LayoutMode {
        self.layout
    }
}
