//! Inflection helpers for payload keys.
//!
//! Type names are written dasherized (`comic-book`, `super-hero`). Serializers
//! expect other shapes: camelized root keys (`comicBook`), dasherized plurals
//! for sideloads (`super-heros`), underscored polymorphic type stubs
//! (`big_hat`). Rules are compiled once and cached.

use std::sync::OnceLock;

use regex::Regex;

/// Words whose plural is the word itself.
const UNCOUNTABLE: &[&str] = &[
    "equipment",
    "information",
    "rice",
    "money",
    "species",
    "series",
    "fish",
    "sheep",
    "jeans",
    "police",
    "news",
    "data",
];

/// Irregular singular/plural pairs.
const IRREGULAR: &[(&str, &str)] = &[
    ("person", "people"),
    ("man", "men"),
    ("woman", "women"),
    ("child", "children"),
    ("mouse", "mice"),
    ("goose", "geese"),
    ("ox", "oxen"),
];

/// Suffix rules, tried in order; the first match wins.
fn plural_rules() -> &'static [(Regex, &'static str)] {
    static RULES: OnceLock<Vec<(Regex, &'static str)>> = OnceLock::new();
    RULES.get_or_init(|| {
        [
            (r"(?i)(quiz)$", "${1}zes"),
            (r"(?i)(matr|vert|ind)(?:ix|ex)$", "${1}ices"),
            (r"(?i)(x|ch|ss|sh|s|z)$", "${1}es"),
            (r"(?i)([^aeiouy]|qu)y$", "${1}ies"),
            (r"(?i)(?:([^f])fe|([lr])f)$", "${1}${2}ves"),
        ]
        .into_iter()
        .map(|(pattern, replacement)| {
            let regex = Regex::new(pattern).expect("valid inflection rule");
            (regex, replacement)
        })
        .collect()
    })
}

fn camel_boundary() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"([a-z\d])([A-Z])").expect("valid regex"))
}

fn separators() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[-_\s]+(.)?").expect("valid regex"))
}

/// Split `word` into (prefix, last word) on the last `-`, `_`, or camel hump.
fn split_tail(word: &str) -> (&str, &str) {
    let boundary = word
        .char_indices()
        .rev()
        .find(|(i, c)| *c == '-' || *c == '_' || (*i > 0 && c.is_ascii_uppercase()))
        .map(|(i, c)| if c.is_ascii_uppercase() { i } else { i + 1 });
    match boundary {
        Some(at) => word.split_at(at),
        None => ("", word),
    }
}

fn match_case(template: &str, word: &str) -> String {
    if template.starts_with(|c: char| c.is_ascii_uppercase()) {
        let mut chars = word.chars();
        match chars.next() {
            Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
            None => String::new(),
        }
    } else {
        word.to_string()
    }
}

/// Pluralize the last word of `word`.
///
/// ```
/// use fixturekit_core::inflect::pluralize;
///
/// assert_eq!(pluralize("company"), "companies");
/// assert_eq!(pluralize("super-hero"), "super-heros");
/// assert_eq!(pluralize("comicBook"), "comicBooks");
/// ```
pub fn pluralize(word: &str) -> String {
    if word.is_empty() {
        return String::new();
    }
    let (prefix, tail) = split_tail(word);
    let lower = tail.to_ascii_lowercase();

    if UNCOUNTABLE.contains(&lower.as_str()) {
        return word.to_string();
    }
    if let Some((_, plural)) = IRREGULAR.iter().find(|(singular, _)| *singular == lower) {
        return format!("{prefix}{}", match_case(tail, plural));
    }
    for (rule, replacement) in plural_rules() {
        if rule.is_match(tail) {
            return format!("{prefix}{}", rule.replace(tail, *replacement));
        }
    }
    format!("{word}s")
}

/// Convert dashes/underscores/spaces to lower camel case.
///
/// ```
/// use fixturekit_core::inflect::camelize;
///
/// assert_eq!(camelize("comic-book"), "comicBook");
/// assert_eq!(camelize("big_hat"), "bigHat");
/// ```
pub fn camelize(word: &str) -> String {
    let camel = separators().replace_all(word, |caps: &regex::Captures<'_>| {
        caps.get(1)
            .map(|m| m.as_str().to_uppercase())
            .unwrap_or_default()
    });
    let mut chars = camel.chars();
    match chars.next() {
        Some(first) => first.to_ascii_lowercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

/// Convert camel humps and dashes to underscores, lowercased.
///
/// ```
/// use fixturekit_core::inflect::underscore;
///
/// assert_eq!(underscore("big-hat"), "big_hat");
/// assert_eq!(underscore("BigHat"), "big_hat");
/// ```
pub fn underscore(word: &str) -> String {
    camel_boundary()
        .replace_all(word, "${1}_${2}")
        .replace(['-', ' '], "_")
        .to_ascii_lowercase()
}

/// Convert camel humps and underscores to dashes, lowercased.
pub fn dasherize(word: &str) -> String {
    underscore(word).replace('_', "-")
}
