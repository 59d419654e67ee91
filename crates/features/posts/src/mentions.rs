//! `@username` extraction.

const NAME_SYMBOLS: &[char] = &['.', '+', '-', '_'];

fn is_name_char(ch: char) -> bool {
    ch.is_alphanumeric() || NAME_SYMBOLS.contains(&ch)
}

/// Usernames mentioned in `text`, in order of first appearance, without duplicates.
///
/// A mention starts with `@` at the beginning of the text or after a character that cannot
/// be part of a username, so e-mail addresses are not mentions. Trailing dots are treated
/// as punctuation.
#[must_use]
pub fn extract_mentions(text: &str) -> Vec<String> {
    let mut found: Vec<String> = Vec::new();
    let mut previous: Option<char> = None;
    let mut chars = text.char_indices().peekable();

    while let Some((index, ch)) = chars.next() {
        let at_boundary = previous.is_none_or(|p| !is_name_char(p) && p != '@');
        if ch == '@' && at_boundary {
            let start = index + ch.len_utf8();
            let mut end = start;
            while let Some(&(next_index, next)) = chars.peek() {
                if !is_name_char(next) {
                    break;
                }
                end = next_index + next.len_utf8();
                previous = Some(next);
                chars.next();
            }

            let name = text[start..end].trim_end_matches('.');
            if !name.is_empty() && !found.iter().any(|f| f == name) {
                found.push(name.to_owned());
            }
            if end == start {
                previous = Some(ch);
            }
            continue;
        }
        previous = Some(ch);
    }

    found
}
