//! Arabic-aware text processing for search and keyword extraction.

const STOPWORDS: &[&str] = &[
    // Arabic, in normalized form
    "في", "من", "الي", "علي", "عن", "مع", "هذا", "هذه", "ذلك", "تلك", "التي",
    "الذي", "الذين", "وهو", "وهي", "هو", "هي", "كان", "كانت", "ان", "او", "ثم",
    "قد", "لقد", "كل", "بعد", "قبل", "بين", "حتي", "اذا", "لم", "لن", "ما",
    "ولا", "لا", "غير", "عند", "فيه", "فيها", "منه", "منها", "به", "بها", "له",
    "لها", "وقد", "كما", "ايضا", "حيث", "تم", "وفي", "ومن",
    // English
    "the", "and", "for", "are", "but", "not", "you", "all", "any", "can",
    "her", "was", "one", "our", "out", "has", "have", "had", "this", "that",
    "with", "from", "they", "will", "would", "there", "their", "what", "which",
    "into", "than", "then", "them", "these", "those", "been", "were", "its",
];

fn is_diacritic(c: char) -> bool {
    matches!(c, '\u{064B}'..='\u{0652}' | '\u{0670}' | '\u{0640}')
}

fn fold_letter(c: char) -> char {
    match c {
        'أ' | 'إ' | 'آ' | 'ٱ' => 'ا',
        'ة' => 'ه',
        'ى' | 'ئ' => 'ي',
        'ؤ' => 'و',
        other => other,
    }
}

/// Lowercase, strip diacritics and tatweel, fold letter variants and
/// collapse whitespace.
pub fn normalize_arabic(text: &str) -> String {
    let folded: String = text
        .chars()
        .filter(|c| !is_diacritic(*c))
        .map(fold_letter)
        .flat_map(char::to_lowercase)
        .collect();
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn is_punctuation(c: char) -> bool {
    c.is_ascii_punctuation() || matches!(c, '،' | '؛' | '؟' | '«' | '»')
}

/// Replace Arabic and ASCII punctuation with spaces.
pub fn remove_punctuation(text: &str) -> String {
    text.chars()
        .map(|c| if is_punctuation(c) { ' ' } else { c })
        .collect()
}

fn is_stopword(word: &str) -> bool {
    STOPWORDS.contains(&word)
}

/// Up to `max` distinct content words in first-seen order.
pub fn extract_keywords(text: &str, max: usize) -> Vec<String> {
    let cleaned = remove_punctuation(&normalize_arabic(text));
    let mut out: Vec<String> = Vec::new();
    for word in cleaned.split_whitespace() {
        if out.len() >= max {
            break;
        }
        if word.chars().count() < 3 || is_stopword(word) {
            continue;
        }
        if !out.iter().any(|w| w == word) {
            out.push(word.to_string());
        }
    }
    out
}

fn push_escaped(out: &mut String, c: char) {
    match c {
        '&' => out.push_str("&amp;"),
        '<' => out.push_str("&lt;"),
        '>' => out.push_str("&gt;"),
        '"' => out.push_str("&quot;"),
        '\'' => out.push_str("&#39;"),
        _ => out.push(c),
    }
}

/// HTML-escape `text` and wrap case-insensitive occurrences of each term
/// in `<mark>` tags. The result is safe to render as markup.
pub fn highlight_matches(text: &str, terms: &[&str]) -> String {
    let terms: Vec<Vec<char>> = terms
        .iter()
        .filter(|t| !t.trim().is_empty())
        .map(|t| t.trim().chars().flat_map(char::to_lowercase).collect())
        .collect();

    let chars: Vec<char> = text.chars().collect();
    let lower: Vec<char> = chars
        .iter()
        .map(|c| c.to_lowercase().next().unwrap_or(*c))
        .collect();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;
    while i < chars.len() {
        let hit = terms
            .iter()
            .filter(|t| lower[i..].starts_with(t))
            .map(Vec::len)
            .max();
        match hit {
            Some(len) => {
                out.push_str("<mark>");
                for c in &chars[i..i + len] {
                    push_escaped(&mut out, *c);
                }
                out.push_str("</mark>");
                i += len;
            }
            None => {
                push_escaped(&mut out, chars[i]);
                i += 1;
            }
        }
    }
    out
}

/// Escape `%`, `_` and `\` so user text matches literally inside ILIKE.
pub fn like_pattern(q: &str) -> String {
    let mut escaped = String::with_capacity(q.len() + 2);
    for c in q.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    format!("%{}%", escaped)
}

/// `ar`, `en` or `mixed`, by the share of Arabic among alphabetic chars.
pub fn detect_language(text: &str) -> &'static str {
    let (mut arabic, mut latin) = (0usize, 0usize);
    for c in text.chars().filter(|c| c.is_alphabetic()) {
        if ('\u{0600}'..='\u{06FF}').contains(&c) {
            arabic += 1;
        } else if c.is_ascii_alphabetic() {
            latin += 1;
        }
    }
    let total = arabic + latin;
    if total == 0 || arabic * 10 >= total * 8 {
        "ar"
    } else if latin * 10 >= total * 8 {
        "en"
    } else {
        "mixed"
    }
}
