//! Word-list representation of identifiers.
//!
//! An identifier is split into lowercase words exactly once. Every case
//! variant is a recombination of that list, so `myShop`, `my-shop`, `my_shop`
//! and `MyShop` all produce the same words and therefore the same variants.

use super::inflect;

/// An identifier split into lowercase semantic words.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordList {
    words: Vec<String>,
}

impl WordList {
    /// Splits an identifier into words.
    ///
    /// Boundaries are any non-alphanumeric character, a lowercase letter or
    /// digit followed by an uppercase letter, and the last capital of an
    /// acronym followed by a lowercase letter (`HTTPServer` → `http server`).
    pub fn parse(input: &str) -> Self {
        let chars: Vec<char> = input.chars().collect();
        let mut words = Vec::new();
        let mut current = String::new();

        for (i, &c) in chars.iter().enumerate() {
            if !c.is_alphanumeric() {
                flush(&mut current, &mut words);
                continue;
            }

            if c.is_uppercase() && !current.is_empty() {
                let prev = chars[i - 1];
                let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
                let lower_to_upper = prev.is_lowercase() || prev.is_ascii_digit();
                let acronym_end = prev.is_uppercase() && next_is_lower;
                if lower_to_upper || acronym_end {
                    flush(&mut current, &mut words);
                }
            }

            current.extend(c.to_lowercase());
        }
        flush(&mut current, &mut words);

        Self { words }
    }

    /// Concatenates two word lists (layer words followed by collection words).
    pub fn join(&self, other: &WordList) -> WordList {
        let mut words = self.words.clone();
        words.extend(other.words.iter().cloned());
        WordList { words }
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    /// Same words with the last one pluralized.
    pub fn plural(&self) -> WordList {
        self.map_last(inflect::pluralize)
    }

    /// Same words with the last one singularized.
    pub fn singular(&self) -> WordList {
        self.map_last(inflect::singularize)
    }

    fn map_last(&self, f: fn(&str) -> String) -> WordList {
        let mut words = self.words.clone();
        if let Some(last) = words.last_mut() {
            *last = f(last);
        }
        WordList { words }
    }

    /// `blogPost`
    pub fn camel(&self) -> String {
        let mut out = String::new();
        for (i, word) in self.words.iter().enumerate() {
            if i == 0 {
                out.push_str(word);
            } else {
                out.push_str(&capitalize(word));
            }
        }
        out
    }

    /// `BlogPost`
    pub fn pascal(&self) -> String {
        self.words.iter().map(|w| capitalize(w)).collect()
    }

    /// `blog-post`
    pub fn kebab(&self) -> String {
        self.words.join("-")
    }

    /// `blog_post`
    pub fn snake(&self) -> String {
        self.words.join("_")
    }

    /// `Blog post`
    pub fn sentence(&self) -> String {
        let joined = self.words.join(" ");
        capitalize(&joined)
    }
}

fn flush(current: &mut String, words: &mut Vec<String>) {
    if !current.is_empty() {
        words.push(std::mem::take(current));
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().chain(chars).collect(),
    }
}
