//! Product label normalisation
//!
//! Persistence keys and lookup keys both go through [`slugify`], so the
//! mapping must never change for an existing label.

/// Cyrillic to Latin replacements, applied to lowercase text
const TRANSLITERATION: &[(char, &str)] = &[
    ('а', "a"),
    ('б', "b"),
    ('в', "v"),
    ('г', "g"),
    ('д', "d"),
    ('е', "e"),
    ('ё', "e"),
    ('ж', "zh"),
    ('з', "z"),
    ('и', "i"),
    ('й', "i"),
    ('к', "k"),
    ('л', "l"),
    ('м', "m"),
    ('н', "n"),
    ('о', "o"),
    ('п', "p"),
    ('р', "r"),
    ('с', "s"),
    ('т', "t"),
    ('у', "u"),
    ('ф', "f"),
    ('х', "h"),
    ('ц', "c"),
    ('ч', "cz"),
    ('ш', "sh"),
    ('щ', "scz"),
    ('ъ', ""),
    ('ы', "y"),
    ('ь', "b"),
    ('э', "e"),
    ('ю', "u"),
    ('я', "ja"),
];

/// Transliterate Cyrillic letters of an already lowercased string
pub fn transliterate(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match TRANSLITERATION.iter().find(|(from, _)| *from == c) {
            Some((_, to)) => out.push_str(to),
            None => out.push(c),
        }
    }
    out
}

/// Map a free-text product label to a URL-safe identifier.
///
/// Lowercases, transliterates Cyrillic, drops everything except word
/// characters, whitespace and hyphens, trims, then collapses each run of
/// whitespace and hyphens into a single `-`.
///
/// ```
/// use price_forecast::slug::slugify;
///
/// assert_eq!(slugify("Хлеб ржаной, кг"), "hleb-rzhanoi-kg");
/// assert_eq!(slugify("  Milk 2.5% -- 1 L "), "milk-25-1-l");
/// ```
pub fn slugify(label: &str) -> String {
    let lowered = transliterate(&label.to_lowercase());

    let kept: String = lowered
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || c.is_whitespace() || *c == '-')
        .collect();

    let mut slug = String::with_capacity(kept.len());
    let mut in_separator = false;
    for c in kept.trim().chars() {
        if c.is_whitespace() || c == '-' {
            in_separator = true;
        } else {
            if in_separator {
                slug.push('-');
                in_separator = false;
            }
            slug.push(c);
        }
    }
    // A trailing hyphen run survives trimming in the label itself
    if in_separator {
        slug.push('-');
    }
    slug
}
