// Copyright (C) 2021 Scott Lamb <slamb@slamb.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-call mapping settings.

use std::borrow::Cow;

/// Order of the day, month, and year components in a numeric date.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum DateOrder {
    /// `10/19/2026`
    MonthDayYear,

    /// `19/10/2026`
    DayMonthYear,

    /// `2026/10/19`
    YearMonthDay,
}

/// Locale conventions used when parsing numbers and dates.
///
/// The default is [`Culture::invariant`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Culture {
    pub decimal_separator: char,
    pub group_separator: char,
    pub date_order: DateOrder,
    pub date_separator: char,
}

impl Culture {
    /// `1,234.5` and `10/19/2026 13:45:00`.
    pub const fn invariant() -> Self {
        Culture {
            decimal_separator: '.',
            group_separator: ',',
            date_order: DateOrder::MonthDayYear,
            date_separator: '/',
        }
    }

    pub const fn new(
        decimal_separator: char,
        group_separator: char,
        date_order: DateOrder,
        date_separator: char,
    ) -> Self {
        Culture {
            decimal_separator,
            group_separator,
            date_order,
            date_separator,
        }
    }

    /// Rewrites a culture-formatted number into the form Rust's `FromStr` impls expect.
    ///
    /// Group separators are removed, then the decimal separator becomes `.`.
    pub fn normalize_number<'a>(&self, text: &'a str) -> Cow<'a, str> {
        if self.decimal_separator == '.' && !text.contains(self.group_separator) {
            return Cow::Borrowed(text);
        }
        Cow::Owned(
            text.chars()
                .filter(|&c| c != self.group_separator)
                .map(|c| if c == self.decimal_separator { '.' } else { c })
                .collect(),
        )
    }

    /// Returns `chrono` format strings for a numeric date in this culture's order.
    ///
    /// The two-digit year form comes first, as `%Y` also accepts two digits.
    pub(crate) fn date_formats(&self) -> [String; 2] {
        let s = self.date_separator;
        match self.date_order {
            DateOrder::MonthDayYear => [format!("%m{s}%d{s}%y"), format!("%m{s}%d{s}%Y")],
            DateOrder::DayMonthYear => [format!("%d{s}%m{s}%y"), format!("%d{s}%m{s}%Y")],
            DateOrder::YearMonthDay => [format!("%y{s}%m{s}%d"), format!("%Y{s}%m{s}%d")],
        }
    }
}

impl Default for Culture {
    fn default() -> Self {
        Culture::invariant()
    }
}

/// Settings for a [`crate::Deserializer`].
///
/// Empty strings are treated the same as `None`.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct MappingConfig {
    /// Name of a direct child of the document root to map instead of the root itself.
    pub root_element: Option<String>,

    /// Namespace to qualify every lookup name with.
    ///
    /// When unset, all namespaces are stripped from the document before mapping.
    pub namespace: Option<String>,

    /// Exact [`chrono::format::strftime`] format for date/time fields.
    pub date_format: Option<String>,

    pub culture: Culture,
}

impl MappingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_root_element(mut self, root_element: impl Into<String>) -> Self {
        self.root_element = Some(root_element.into());
        self
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn with_date_format(mut self, date_format: impl Into<String>) -> Self {
        self.date_format = Some(date_format.into());
        self
    }

    pub fn with_culture(mut self, culture: Culture) -> Self {
        self.culture = culture;
        self
    }

    pub fn root_element(&self) -> Option<&str> {
        non_empty(&self.root_element)
    }

    pub fn namespace(&self) -> Option<&str> {
        non_empty(&self.namespace)
    }

    pub fn date_format(&self) -> Option<&str> {
        non_empty(&self.date_format)
    }
}

fn non_empty(s: &Option<String>) -> Option<&str> {
    s.as_deref().filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_strings_are_unset() {
        let config = MappingConfig::new()
            .with_namespace("")
            .with_root_element("Root");
        assert_eq!(config.namespace(), None);
        assert_eq!(config.root_element(), Some("Root"));
        assert_eq!(config.date_format(), None);
    }

    #[test]
    fn normalize_invariant_number() {
        let c = Culture::invariant();
        assert!(matches!(c.normalize_number("1.5"), Cow::Borrowed("1.5")));
        assert_eq!(c.normalize_number("1,234.5"), "1234.5");
    }

    #[test]
    fn normalize_comma_decimal_number() {
        let c = Culture::new(',', '.', DateOrder::DayMonthYear, '.');
        assert_eq!(c.normalize_number("1.234,5"), "1234.5");
        assert_eq!(c.normalize_number("-4,9"), "-4.9");
    }

    #[test]
    fn date_formats_follow_order() {
        let c = Culture::new(',', '.', DateOrder::DayMonthYear, '.');
        assert_eq!(c.date_formats(), ["%d.%m.%y", "%d.%m.%Y"]);
        assert_eq!(Culture::invariant().date_formats()[1], "%m/%d/%Y");
    }
}
