//! Typographic replacements for plain text runs.
//!
//! Applied after link detection, so URLs and e-mail addresses keep their
//! `...` and `--`. `before` is the character that precedes `text` in the
//! same block, if any; it decides quote direction and dash spacing at the
//! start of a run that follows emphasis, a link or a line break.

use regex::{Captures, Regex};
use std::borrow::Cow;
use std::sync::LazyLock;

static SYMBOLS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\((c|r|tm)\)").unwrap());
static DOTS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\.{2,}").unwrap());
static MARK_ELLIPSIS: LazyLock<Regex> = LazyLock::new(|| Regex::new("([?!])\u{2026}").unwrap());
static REPEATED_MARKS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"([?!]){4,}").unwrap());
static REPEATED_COMMAS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r",{2,}").unwrap());
static DASHES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-{2,}").unwrap());

const TRIGGERS: [char; 9] = ['(', '+', '?', '!', ',', '.', '-', '"', '\''];

type Step = fn(&str) -> Cow<'_, str>;

/// Apply replacements, borrowing the input when nothing changes
pub fn replace(text: &str, before: Option<char>) -> Cow<'_, str> {
    if !text.contains(TRIGGERS) {
        return Cow::Borrowed(text);
    }

    let mut out = Cow::Borrowed(text);
    for step in [symbols as Step, plus_minus, ellipsis, punctuation_runs] {
        out = chain(out, step);
    }
    out = chain(out, |s| dashes(s, before));
    chain(out, |s| quotes(s, before))
}

fn chain<'a>(out: Cow<'a, str>, step: impl FnOnce(&str) -> Cow<'_, str>) -> Cow<'a, str> {
    let replaced = match step(&out) {
        Cow::Owned(replaced) => Some(replaced),
        Cow::Borrowed(_) => None,
    };
    match replaced {
        Some(replaced) => Cow::Owned(replaced),
        None => out,
    }
}

fn symbols(text: &str) -> Cow<'_, str> {
    SYMBOLS.replace_all(text, |caps: &Captures| {
        match caps[1].to_ascii_lowercase().as_str() {
            "c" => "\u{a9}",
            "r" => "\u{ae}",
            _ => "\u{2122}",
        }
    })
}

fn plus_minus(text: &str) -> Cow<'_, str> {
    if text.contains("+-") {
        Cow::Owned(text.replace("+-", "\u{b1}"))
    } else {
        Cow::Borrowed(text)
    }
}

/// `..` and longer become `…`, except right after `?` or `!` where they stay `..`
fn ellipsis(text: &str) -> Cow<'_, str> {
    let dotted = DOTS.replace_all(text, "\u{2026}");
    let replaced = match MARK_ELLIPSIS.replace_all(&dotted, "$1..") {
        Cow::Owned(replaced) => Some(replaced),
        Cow::Borrowed(_) => None,
    };
    match replaced {
        Some(replaced) => Cow::Owned(replaced),
        None => dotted,
    }
}

fn punctuation_runs(text: &str) -> Cow<'_, str> {
    let marks = REPEATED_MARKS.replace_all(text, "$1$1$1");
    let replaced = match REPEATED_COMMAS.replace_all(&marks, ",") {
        Cow::Owned(replaced) => Some(replaced),
        Cow::Borrowed(_) => None,
    };
    match replaced {
        Some(replaced) => Cow::Owned(replaced),
        None => marks,
    }
}

/// `---` is an em dash. `--` is an en dash when spaced the same on both sides
/// (`a -- b`, `1--2`); other runs are left alone.
fn dashes(text: &str, before: Option<char>) -> Cow<'_, str> {
    if !text.contains("--") {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for run in DASHES.find_iter(text) {
        let prev = match run.start() {
            0 => before,
            start => text[..start].chars().next_back(),
        };
        let next = text[run.end()..].chars().next();

        let dash = match run.len() {
            3 => Some('\u{2014}'),
            2 if same_spacing(prev, next) => Some('\u{2013}'),
            _ => None,
        };
        if let Some(dash) = dash {
            out.push_str(&text[last..run.start()]);
            out.push(dash);
            last = run.end();
        }
    }

    if last == 0 {
        return Cow::Borrowed(text);
    }
    out.push_str(&text[last..]);
    Cow::Owned(out)
}

fn same_spacing(prev: Option<char>, next: Option<char>) -> bool {
    let spaced = |c: Option<char>| c.map_or(true, char::is_whitespace);
    let tight = |c: Option<char>| c.map_or(true, |c| !c.is_whitespace());
    (spaced(prev) && spaced(next)) || (tight(prev) && tight(next))
}

/// Curly quotes. A quote opens after whitespace, an opening bracket or a dash
/// (or at the start of a block) when something follows it; otherwise it closes.
fn quotes(text: &str, before: Option<char>) -> Cow<'_, str> {
    if !text.contains(['"', '\'']) {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len() + 8);
    let mut prev = before;
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        let curly = match c {
            '"' | '\'' => {
                let opens = chars.peek().map_or(true, |next| !next.is_whitespace())
                    && prev.map_or(true, |p| {
                        p.is_whitespace() || matches!(p, '(' | '[' | '{' | '-' | '\u{2013}' | '\u{2014}')
                    });
                match (c, opens) {
                    ('"', true) => '\u{201c}',
                    ('"', false) => '\u{201d}',
                    (_, true) => '\u{2018}',
                    _ => '\u{2019}',
                }
            }
            other => other,
        };
        out.push(curly);
        prev = Some(c);
    }
    Cow::Owned(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_untouched_text_is_borrowed() {
        assert!(matches!(replace("nothing to do here", None), Cow::Borrowed(_)));
        assert!(matches!(replace("one. two-three", None), Cow::Borrowed(_)));
    }

    #[test]
    fn test_symbols() {
        assert_eq!(replace("(c) (C) (r) (tm) (TM)", None), "\u{a9} \u{a9} \u{ae} \u{2122} \u{2122}");
        assert_eq!(replace("(x) stays", None), "(x) stays");
    }

    #[test]
    fn test_plus_minus() {
        assert_eq!(replace("+-3 dB", None), "\u{b1}3 dB");
    }

    #[test]
    fn test_ellipsis() {
        assert_eq!(replace("wait...", None), "wait\u{2026}");
        assert_eq!(replace("and..", None), "and\u{2026}");
    }

    #[test]
    fn test_punctuation_runs() {
        assert_eq!(replace("what?????", None), "what???");
        assert_eq!(replace("no!!!!!", None), "no!!!");
        assert_eq!(replace("a,,, b", None), "a, b");
        assert_eq!(replace("really?....", None), "really?..");
        assert_eq!(replace("wow!\u{2026}", None), "wow!..");
    }

    #[test]
    fn test_dashes() {
        assert_eq!(replace("a -- b", None), "a \u{2013} b");
        assert_eq!(replace("pages 10--20", None), "pages 10\u{2013}20");
        assert_eq!(replace("wait---what", None), "wait\u{2014}what");
        assert_eq!(replace("a-- b", None), "a-- b");
        assert_eq!(replace("----", None), "----");
        assert_eq!(replace("-- b", Some('a')), "-- b");
        assert_eq!(replace("-- b", Some(' ')), "\u{2013} b");
    }

    #[test]
    fn test_quotes() {
        assert_eq!(replace("\"Quoted\"", None), "\u{201c}Quoted\u{201d}");
        assert_eq!(replace("don't 'go'", None), "don\u{2019}t \u{2018}go\u{2019}");
        assert_eq!(replace("(\"x\")", None), "(\u{201c}x\u{201d})");
    }

    #[test]
    fn test_quote_direction_uses_preceding_character() {
        assert_eq!(replace("\" after", Some('d')), "\u{201d} after");
        assert_eq!(replace("\"next", Some(' ')), "\u{201c}next");
    }
}
