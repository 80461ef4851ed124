//! Emoji shortcode and emoticon expansion.

use regex::{Captures, Regex};
use std::borrow::Cow;
use std::sync::LazyLock;

static SHORTCODE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r":([a-z0-9_+\-]+):").unwrap());

/// Emoticons and the gemoji shortcode they stand for
const SHORTCUTS: &[(&str, &str)] = &[
    (">:(", "angry"),
    (">:-(", "angry"),
    (":\")", "blush"),
    (":-\")", "blush"),
    ("</3", "broken_heart"),
    ("<\\3", "broken_heart"),
    (":/", "confused"),
    (":-/", "confused"),
    (":'(", "cry"),
    (":'-(", "cry"),
    (":,(", "cry"),
    (":,-(", "cry"),
    (":(", "frowning"),
    (":-(", "frowning"),
    ("<3", "heart"),
    ("]:(", "imp"),
    ("]:-(", "imp"),
    ("o:)", "innocent"),
    ("O:)", "innocent"),
    ("o:-)", "innocent"),
    ("O:-)", "innocent"),
    ("0:)", "innocent"),
    ("0:-)", "innocent"),
    (":')", "joy"),
    (":'-)", "joy"),
    (":,)", "joy"),
    (":,-)", "joy"),
    (":'D", "joy"),
    (":'-D", "joy"),
    (":,D", "joy"),
    (":,-D", "joy"),
    (":*", "kissing"),
    (":-*", "kissing"),
    ("x-)", "laughing"),
    ("X-)", "laughing"),
    (":|", "neutral_face"),
    (":-|", "neutral_face"),
    (":o", "open_mouth"),
    (":-o", "open_mouth"),
    (":O", "open_mouth"),
    (":-O", "open_mouth"),
    (":@", "rage"),
    (":-@", "rage"),
    (":D", "smile"),
    (":-D", "smile"),
    (":)", "smiley"),
    (":-)", "smiley"),
    ("]:)", "smiling_imp"),
    ("]:-)", "smiling_imp"),
    (":,'(", "sob"),
    (":,'-(", "sob"),
    (";(", "sob"),
    (";-(", "sob"),
    (":P", "stuck_out_tongue"),
    (":-P", "stuck_out_tongue"),
    ("8-)", "sunglasses"),
    ("B-)", "sunglasses"),
    (",:(", "sweat"),
    (",:-(", "sweat"),
    (",:)", "sweat_smile"),
    (",:-)", "sweat_smile"),
    (":s", "unamused"),
    (":-S", "unamused"),
    (":z", "unamused"),
    (":-Z", "unamused"),
    (":$", "unamused"),
    (":-$", "unamused"),
    (";)", "wink"),
    (";-)", "wink"),
];

/// Shortcuts resolved to their emoji, longest first
static RESOLVED_SHORTCUTS: LazyLock<Vec<(&'static str, &'static str)>> = LazyLock::new(|| {
    let mut resolved: Vec<_> = SHORTCUTS
        .iter()
        .filter_map(|&(shortcut, code)| {
            emojis::get_by_shortcode(code).map(|emoji| (shortcut, emoji.as_str()))
        })
        .collect();
    resolved.sort_by_key(|(shortcut, _)| std::cmp::Reverse(shortcut.len()));
    resolved
});

/// Expand `:shortcode:` names and emoticon shortcuts
pub fn expand(text: &str) -> Cow<'_, str> {
    let with_codes = expand_shortcodes(text);
    let replaced = match expand_shortcuts(&with_codes) {
        Cow::Owned(replaced) => Some(replaced),
        Cow::Borrowed(_) => None,
    };
    match replaced {
        Some(replaced) => Cow::Owned(replaced),
        None => with_codes,
    }
}

fn expand_shortcodes(text: &str) -> Cow<'_, str> {
    if !text.contains(':') {
        return Cow::Borrowed(text);
    }
    SHORTCODE.replace_all(text, |caps: &Captures| match emojis::get_by_shortcode(&caps[1]) {
        Some(emoji) => emoji.as_str().to_string(),
        None => caps[0].to_string(),
    })
}

fn expand_shortcuts(text: &str) -> Cow<'_, str> {
    let mut out: Option<String> = None;
    let mut last = 0;
    let mut i = 0;

    while i < text.len() {
        if is_left_boundary(text, i) {
            let found = RESOLVED_SHORTCUTS.iter().find(|(shortcut, _)| {
                text[i..].starts_with(shortcut) && is_right_boundary(text, i + shortcut.len())
            });
            if let Some((shortcut, emoji)) = found {
                let buf = out.get_or_insert_with(|| String::with_capacity(text.len()));
                buf.push_str(&text[last..i]);
                buf.push_str(emoji);
                i += shortcut.len();
                last = i;
                continue;
            }
        }
        i += text[i..].chars().next().map_or(1, char::len_utf8);
    }

    match out {
        Some(mut buf) => {
            buf.push_str(&text[last..]);
            Cow::Owned(buf)
        }
        None => Cow::Borrowed(text),
    }
}

/// Shortcuts start a text run or follow whitespace or punctuation
fn is_left_boundary(text: &str, at: usize) -> bool {
    text[..at]
        .chars()
        .next_back()
        .map_or(true, |c| c.is_whitespace() || c.is_ascii_punctuation())
}

fn is_right_boundary(text: &str, at: usize) -> bool {
    text[at..]
        .chars()
        .next()
        .map_or(true, |c| c.is_whitespace() || c.is_ascii_punctuation())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_shortcodes() {
        assert_eq!(expand(":rocket: launch"), "\u{1f680} launch");
        assert_eq!(expand(":tada::tada:"), "\u{1f389}\u{1f389}");
        assert_eq!(expand("+1 :+1:"), "+1 \u{1f44d}");
    }

    #[test]
    fn test_unknown_shortcode_kept() {
        assert_eq!(expand("time 10:30:45"), "time 10:30:45");
        assert_eq!(expand(":nope_not_real:"), ":nope_not_real:");
    }

    #[test]
    fn test_shortcuts_need_boundaries() {
        assert_eq!(expand("hi :)"), "hi \u{1f603}");
        let hearts = expand("<3 <3");
        assert_eq!(hearts.matches('\u{2764}').count(), 2);
        assert!(!hearts.contains("<3"));
        assert_eq!(expand("f(x:)"), "f(x:)");
        assert_eq!(expand("http://example.com"), "http://example.com");
        assert_eq!(expand(":Data"), ":Data");
    }

    #[test]
    fn test_full_shortcut_set() {
        assert_eq!(expand("o:-) x-) :-o"), "\u{1f607} \u{1f606} \u{1f62e}");
        assert_eq!(expand(":'D ]:) ;("), "\u{1f602} \u{1f608} \u{1f62d}");
        assert_eq!(expand(",:) :@"), "\u{1f605} \u{1f621}");
        assert_eq!(expand(":-S"), "\u{1f612}");
    }

    #[test]
    fn test_shortcut_after_punctuation() {
        assert_eq!(expand("(:))"), "(\u{1f603})");
        assert_eq!(expand("ok,:)"), "ok,\u{1f603}");
    }

    #[test]
    fn test_plain_text_is_borrowed() {
        assert!(matches!(expand("plain words"), Cow::Borrowed(_)));
    }
}
