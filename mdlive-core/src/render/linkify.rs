//! Detection of bare URLs and e-mail addresses in text.

use regex::Regex;
use std::sync::LazyLock;

static LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:(?:https?|ftp)://|www\.)[^\s<>]+|[a-z0-9._%+-]+@[a-z0-9-]+(?:\.[a-z0-9-]+)*\.[a-z]{2,}",
    )
    .unwrap()
});

/// A piece of text after link detection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment<'a> {
    Text(&'a str),
    Url { text: &'a str, href: String },
    Email(&'a str),
}

/// Split text into plain runs and detected links
pub fn split(text: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut last = 0;

    for found in LINK.find_iter(text) {
        let candidate = trim_trailing(found.as_str());
        // Bare scheme or "www." with nothing after it
        if candidate.ends_with("://") || candidate.eq_ignore_ascii_case("www.") {
            continue;
        }

        let start = found.start();
        let end = start + candidate.len();
        if start > last {
            segments.push(Segment::Text(&text[last..start]));
        }

        let matched = &text[start..end];
        if matched.contains('@') && !matched.contains("://") {
            segments.push(Segment::Email(matched));
        } else {
            segments.push(Segment::Url {
                text: matched,
                href: href_for(matched),
            });
        }
        last = end;
    }

    if last < text.len() {
        segments.push(Segment::Text(&text[last..]));
    }
    segments
}

fn href_for(url: &str) -> String {
    if url.len() >= 4 && url[..4].eq_ignore_ascii_case("www.") {
        format!("http://{url}")
    } else {
        url.to_string()
    }
}

/// Drop sentence punctuation and unbalanced closing brackets from the end of a URL
fn trim_trailing(url: &str) -> &str {
    let mut end = url.len();
    loop {
        let current = &url[..end];
        let Some(last) = current.chars().next_back() else {
            break;
        };
        let strip = match last {
            '.' | ',' | ';' | ':' | '!' | '?' | '\'' | '"' | '\u{2019}' | '\u{201d}' => true,
            ')' => current.matches('(').count() < current.matches(')').count(),
            ']' => current.matches('[').count() < current.matches(']').count(),
            _ => false,
        };
        if !strip {
            break;
        }
        end -= last.len_utf8();
    }
    &url[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_single_segment() {
        assert_eq!(split("no links here"), vec![Segment::Text("no links here")]);
    }

    #[test]
    fn test_url_in_sentence() {
        let segments = split("Go to https://example.com/a?b=c, then stop.");
        assert_eq!(
            segments,
            vec![
                Segment::Text("Go to "),
                Segment::Url {
                    text: "https://example.com/a?b=c",
                    href: "https://example.com/a?b=c".to_string(),
                },
                Segment::Text(", then stop."),
            ]
        );
    }

    #[test]
    fn test_www_gets_scheme() {
        let segments = split("www.example.org");
        assert_eq!(
            segments,
            vec![Segment::Url {
                text: "www.example.org",
                href: "http://www.example.org".to_string(),
            }]
        );
    }

    #[test]
    fn test_balanced_parentheses_are_kept() {
        let segments = split("(see https://en.wikipedia.org/wiki/Rust_(language))");
        assert!(segments.contains(&Segment::Url {
            text: "https://en.wikipedia.org/wiki/Rust_(language)",
            href: "https://en.wikipedia.org/wiki/Rust_(language)".to_string(),
        }));
        assert_eq!(segments.last(), Some(&Segment::Text(")")));
    }

    #[test]
    fn test_email() {
        assert_eq!(
            split("ping a.b+c@mail.example.com!"),
            vec![
                Segment::Text("ping "),
                Segment::Email("a.b+c@mail.example.com"),
                Segment::Text("!"),
            ]
        );
    }

    #[test]
    fn test_bare_scheme_is_ignored() {
        assert_eq!(split("use https:// prefix"), vec![Segment::Text("use https:// prefix")]);
    }
}
