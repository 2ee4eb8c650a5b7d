// Copyright (C) 2021 Scott Lamb <slamb@slamb.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Spellings tried when matching a field name against XML names.

use heck::AsLowerCamelCase;

/// `FirstProperty` → `firstproperty`.
pub fn lowercase(name: &str) -> String {
    name.to_lowercase()
}

/// `FirstProperty` → `firstProperty`.
pub fn camel_case(name: &str) -> String {
    format!("{}", AsLowerCamelCase(name))
}

/// `first_property-name` → `firstpropertyname`.
pub fn remove_underscores_and_dashes(name: &str) -> std::borrow::Cow<'_, str> {
    if name.contains(['_', '-']) {
        name.replace(['_', '-'], "").into()
    } else {
        name.into()
    }
}

/// Tests if `candidate`, ignoring underscores and dashes, equals `target`.
pub(crate) fn matches_sanitized(candidate: &str, target: &str) -> bool {
    remove_underscores_and_dashes(candidate) == target
}
