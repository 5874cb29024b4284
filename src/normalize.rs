//! Light text cleanup: lowercase, URL placeholder, whitespace collapse.
//! Digits, punctuation and emoji are kept as-is.

use regex::{NoExpand, Regex};
use std::sync::LazyLock;

/// Token substituted for every URL-like run.
pub const URL_TOKEN: &str = "URL";

static URL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"http\S+|www\S+|wap\S+").unwrap());

/// Normalize one raw message.
///
/// 1. lowercase everything except existing `URL` placeholders,
/// 2. replace `http…`, `www…` and `wap…` runs up to the next whitespace with `URL`,
/// 3. collapse whitespace runs into one space and trim both ends.
///
/// Total over all inputs and idempotent: `clean_text_light(&clean_text_light(s))`
/// equals `clean_text_light(s)`.
pub fn clean_text_light(text: &str) -> String {
    let lowered = lowercase_keeping_placeholder(text);
    let replaced = URL_REGEX.replace_all(&lowered, NoExpand(URL_TOKEN));
    collapse_whitespace(&replaced)
}

/// Lowercase `text`, leaving earlier placeholders untouched so a second pass
/// does not turn them into the word `url`.
///
/// A placeholder always ends a whitespace-delimited token and follows a
/// character that is not uppercase. Any other `URL` (`CURLY`, `HURL`) is
/// ordinary text and gets lowercased.
fn lowercase_keeping_placeholder(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for (start, _) in text.match_indices(URL_TOKEN) {
        let end = start + URL_TOKEN.len();
        let ends_token = text[end..].chars().next().map_or(true, char::is_whitespace);
        let after_lower = text[..start]
            .chars()
            .next_back()
            .map_or(true, |c| !c.is_uppercase());
        if ends_token && after_lower {
            out.push_str(&text[last..start].to_lowercase());
            out.push_str(URL_TOKEN);
            last = end;
        }
    }
    out.push_str(&text[last..].to_lowercase());
    out
}

fn collapse_whitespace(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for word in s.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_and_replaces_urls() {
        assert_eq!(
            clean_text_light("HELLO http://x.com World"),
            "hello URL world"
        );
    }

    #[test]
    fn collapses_whitespace() {
        assert_eq!(clean_text_light("a    b\tc"), "a b c");
        assert_eq!(clean_text_light("  line one\n\n line two \r\n"), "line one line two");
    }

    #[test]
    fn replaces_www_and_wap_prefixes() {
        assert_eq!(
            clean_text_light("Visit www.prize.co.uk/claim NOW"),
            "visit URL now"
        );
        assert_eq!(clean_text_light("reply to wap.link/123"), "reply to URL");
        // No word boundary on the pattern: an inner "wap" starts a URL run too.
        assert_eq!(clean_text_light("swapping"), "sURL");
    }

    #[test]
    fn keeps_digits_punctuation_and_emoji() {
        assert_eq!(
            clean_text_light("WIN £1000!!! Call 0800-123 😀"),
            "win £1000!!! call 0800-123 😀"
        );
    }

    #[test]
    fn empty_and_blank_inputs() {
        assert_eq!(clean_text_light(""), "");
        assert_eq!(clean_text_light(" \t\n "), "");
    }

    #[test]
    fn bare_scheme_without_tail_is_not_a_url() {
        assert_eq!(clean_text_light("http www wap"), "http www wap");
    }

    #[test]
    fn words_containing_url_letters_are_lowercased() {
        assert_eq!(clean_text_light("CURLY HAIR"), "curly hair");
        assert_eq!(clean_text_light("HURL IT"), "hurl it");
        assert_eq!(clean_text_light("BURLINGTON"), "burlington");
        assert_eq!(clean_text_light("CURL"), "curl");
        assert_eq!(clean_text_light("URLs"), "urls");
        // a bare placeholder-shaped word is kept as the placeholder
        assert_eq!(clean_text_light("see URL"), "see URL");
    }

    #[test]
    fn idempotent_on_own_output() {
        let samples = [
            "HELLO http://x.com World",
            "swapping",
            "URL and Url and url",
            "hthttp://a.b",
            "URLhttp://x",
            "CURLY HAIR",
            "HURL IT",
            "BURLINGTON",
            "hhttp://x.y and CURL",
            "Ünïcödé   TEXT\twith  ẞ",
            "FREE entry in 2 a wkly comp! Text WAP to 87121 www.win.com",
            "",
        ];
        for s in samples {
            let once = clean_text_light(s);
            assert_eq!(clean_text_light(&once), once, "input {:?}", s);
        }
    }
}
