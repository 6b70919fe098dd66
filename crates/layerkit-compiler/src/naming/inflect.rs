//! English inflection for single lowercase words.
//!
//! Both directions are idempotent: pluralizing a plural or singularizing a
//! singular returns the word unchanged. Callers never apply suffix rules of
//! their own; everything goes through [`pluralize`] and [`singularize`].

/// Words with the same singular and plural form.
const UNCOUNTABLE: &[&str] = &[
    "data", "deer", "equipment", "feedback", "fish", "information", "media", "metadata", "news",
    "series", "sheep", "species", "staff",
];

/// (singular, plural) pairs that no suffix rule covers.
const IRREGULAR: &[(&str, &str)] = &[
    ("child", "children"),
    ("criterion", "criteria"),
    ("foot", "feet"),
    ("goose", "geese"),
    ("half", "halves"),
    ("knife", "knives"),
    ("leaf", "leaves"),
    ("life", "lives"),
    ("man", "men"),
    ("mouse", "mice"),
    ("ox", "oxen"),
    ("person", "people"),
    ("shelf", "shelves"),
    ("tooth", "teeth"),
    ("wife", "wives"),
    ("wolf", "wolves"),
    ("woman", "women"),
];

/// Singular words ending in `s` that the `-s` rule must leave alone.
const SINGULAR_ENDING_IN_S: &[&str] = &[
    "alias", "atlas", "bias", "canvas", "chaos", "gas", "iris", "lens",
];

/// Singulars ending in `o` that take `-es`.
const O_TAKES_ES: &[&str] = &["echo", "hero", "potato", "tomato", "veto"];

/// Plurals ending in `uses` whose singular ends in `us`.
const US_PLURALS: &[&str] = &["bonuses", "buses", "campuses", "censuses", "statuses", "viruses"];

/// Returns the plural form of a lowercase word.
pub fn pluralize(word: &str) -> String {
    if word.is_empty() || UNCOUNTABLE.contains(&word) {
        return word.to_string();
    }
    if let Some((_, plural)) = IRREGULAR.iter().find(|(s, _)| *s == word) {
        return plural.to_string();
    }
    if IRREGULAR.iter().any(|(_, p)| *p == word) {
        return word.to_string();
    }

    // Already plural: singularizing changes it and the rule maps it back.
    let singular = singularize(word);
    if singular != word && plural_rule(&singular) == word {
        return word.to_string();
    }

    plural_rule(word)
}

/// Returns the singular form of a lowercase word.
pub fn singularize(word: &str) -> String {
    if word.is_empty() || UNCOUNTABLE.contains(&word) {
        return word.to_string();
    }
    if let Some((singular, _)) = IRREGULAR.iter().find(|(_, p)| *p == word) {
        return singular.to_string();
    }
    if IRREGULAR.iter().any(|(s, _)| *s == word) || SINGULAR_ENDING_IN_S.contains(&word) {
        return word.to_string();
    }

    if US_PLURALS.contains(&word) {
        return strip(word, 2);
    }
    if word.len() > 3 && word.ends_with("ies") {
        return format!("{}y", strip(word, 3));
    }
    if word.ends_with("sses")
        || word.ends_with("xes")
        || word.ends_with("ches")
        || word.ends_with("shes")
        || word.ends_with("zzes")
    {
        return strip(word, 2);
    }
    if word.ends_with("oes") && O_TAKES_ES.contains(&strip(word, 2).as_str()) {
        return strip(word, 2);
    }
    if word.len() > 4 && word.ends_with("yses") {
        // analyses → analysis
        return format!("{}is", strip(word, 2));
    }
    if word.ends_with('s')
        && !word.ends_with("ss")
        && !word.ends_with("us")
        && !word.ends_with("is")
        && word.len() > 1
    {
        return strip(word, 1);
    }

    word.to_string()
}

/// Suffix rule for a word known to be singular.
fn plural_rule(word: &str) -> String {
    if let Some(stem) = word.strip_suffix("is") {
        if !stem.is_empty() {
            return format!("{}es", stem);
        }
    }
    if word.ends_with('s')
        || word.ends_with('x')
        || word.ends_with('z')
        || word.ends_with("ch")
        || word.ends_with("sh")
    {
        return format!("{}es", word);
    }
    if let Some(stem) = word.strip_suffix('y') {
        let before = stem.chars().last();
        if before.is_some_and(|c| !"aeiou".contains(c)) {
            return format!("{}ies", stem);
        }
    }
    if O_TAKES_ES.contains(&word) {
        return format!("{}es", word);
    }
    format!("{}s", word)
}

fn strip(word: &str, n: usize) -> String {
    word[..word.len() - n].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_singularize_regular() {
        assert_eq!(singularize("posts"), "post");
        assert_eq!(singularize("slots"), "slot");
        assert_eq!(singularize("categories"), "category");
        assert_eq!(singularize("classes"), "class");
        assert_eq!(singularize("boxes"), "box");
        assert_eq!(singularize("matches"), "match");
        assert_eq!(singularize("statuses"), "status");
        assert_eq!(singularize("heroes"), "hero");
        assert_eq!(singularize("analyses"), "analysis");
        assert_eq!(singularize("days"), "day");
    }

    #[test]
    fn test_singularize_is_idempotent() {
        for word in ["post", "category", "status", "address", "canvas", "analysis", "person"] {
            assert_eq!(singularize(word), word, "{word}");
        }
    }

    #[test]
    fn test_pluralize_regular() {
        assert_eq!(pluralize("post"), "posts");
        assert_eq!(pluralize("category"), "categories");
        assert_eq!(pluralize("day"), "days");
        assert_eq!(pluralize("status"), "statuses");
        assert_eq!(pluralize("address"), "addresses");
        assert_eq!(pluralize("box"), "boxes");
        assert_eq!(pluralize("analysis"), "analyses");
        assert_eq!(pluralize("canvas"), "canvases");
    }

    #[test]
    fn test_pluralize_is_idempotent() {
        for word in ["posts", "categories", "statuses", "addresses", "people", "slots"] {
            assert_eq!(pluralize(word), word, "{word}");
        }
    }

    #[test]
    fn test_irregular_and_uncountable() {
        assert_eq!(pluralize("person"), "people");
        assert_eq!(singularize("people"), "person");
        assert_eq!(pluralize("child"), "children");
        assert_eq!(pluralize("news"), "news");
        assert_eq!(singularize("media"), "media");
    }
}
