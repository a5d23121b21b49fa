//! Topic routing-key pattern matching: `*` matches exactly one
//! `.`-separated word, `#` matches zero or more.

pub fn matches(pattern: &str, key: &str) -> bool {
    let pat: Vec<&str> = pattern.split('.').collect();
    let words: Vec<&str> = key.split('.').collect();
    match_from(&pat, &words)
}

fn match_from(pat: &[&str], words: &[&str]) -> bool {
    match pat.split_first() {
        None => words.is_empty(),
        Some((&"#", rest)) => {
            // `#` greedily tries every possible span, including empty.
            (0..=words.len()).any(|skip| match_from(rest, &words[skip..]))
        }
        Some((&"*", rest)) => match words.split_first() {
            Some((_, word_rest)) => match_from(rest, word_rest),
            None => false,
        },
        Some((literal, rest)) => match words.split_first() {
            Some((word, word_rest)) if word == literal => match_from(rest, word_rest),
            _ => false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::matches;

    #[test]
    fn exact_keys() {
        assert!(matches("service.lifecycle", "service.lifecycle"));
        assert!(!matches("service.lifecycle", "service.other"));
        assert!(!matches("service.lifecycle", "service.lifecycle.extra"));
    }

    #[test]
    fn star_matches_one_word() {
        assert!(matches("service.*", "service.lifecycle"));
        assert!(!matches("service.*", "service"));
        assert!(!matches("service.*", "service.a.b"));
    }

    #[test]
    fn hash_matches_any_span() {
        assert!(matches("#", "anything.at.all"));
        assert!(matches("service.#", "service"));
        assert!(matches("service.#", "service.a.b.c"));
        assert!(matches("#.lifecycle", "service.lifecycle"));
        assert!(!matches("#.lifecycle", "service.other"));
    }
}
