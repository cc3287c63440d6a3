//! Best-effort translation of ECMA 262 regular expressions into the syntax
//! understood by the Rust regex engine.
//!
//! The character classes `\d`, `\w` and `\s` are ASCII-oriented in ECMA 262
//! but Unicode-aware in Rust, and `\cX` control escapes are not recognized
//! at all. Both are rewritten here; everything else (including lookaround
//! and backreferences, which `fancy_regex` supports natively) passes
//! through untouched. Escapes that remain invalid after translation are
//! left for the regex compiler to reject.
use std::borrow::Cow;

const DIGIT: &str = "[0-9]";
const NOT_DIGIT: &str = "[^0-9]";
const WORD: &str = "[A-Za-z0-9_]";
const NOT_WORD: &str = "[^A-Za-z0-9_]";
const SPACE: &str = "[ \t\n\r\u{000b}\u{000c}\u{00a0}\u{feff}\u{2003}\u{2029}]";
const NOT_SPACE: &str = "[^ \t\n\r\u{000b}\u{000c}\u{00a0}\u{feff}\u{2003}\u{2029}]";

pub(crate) fn to_rust_regex(pattern: &str) -> Cow<'_, str> {
    let mut translated: Option<String> = None;
    let mut chars = pattern.char_indices();
    while let Some((index, ch)) = chars.next() {
        if ch != '\\' {
            if let Some(out) = translated.as_mut() {
                out.push(ch);
            }
            continue;
        }
        let Some((_, escaped)) = chars.next() else {
            // Trailing backslash; the regex compiler reports it.
            if let Some(out) = translated.as_mut() {
                out.push('\\');
            }
            break;
        };
        match escaped {
            'd' => replace(&mut translated, pattern, index, DIGIT),
            'D' => replace(&mut translated, pattern, index, NOT_DIGIT),
            'w' => replace(&mut translated, pattern, index, WORD),
            'W' => replace(&mut translated, pattern, index, NOT_WORD),
            's' => replace(&mut translated, pattern, index, SPACE),
            'S' => replace(&mut translated, pattern, index, NOT_SPACE),
            'c' => match chars.clone().next() {
                Some((_, letter)) if letter.is_ascii_alphabetic() => {
                    chars.next();
                    let control = (letter as u8 % 32) as char;
                    let mut buffer = [0; 4];
                    replace(&mut translated, pattern, index, control.encode_utf8(&mut buffer));
                }
                _ => {
                    if let Some(out) = translated.as_mut() {
                        out.push('\\');
                        out.push('c');
                    }
                }
            },
            other => {
                if let Some(out) = translated.as_mut() {
                    out.push('\\');
                    out.push(other);
                }
            }
        }
    }
    match translated {
        Some(out) => Cow::Owned(out),
        None => Cow::Borrowed(pattern),
    }
}

fn replace(translated: &mut Option<String>, pattern: &str, index: usize, replacement: &str) {
    translated
        .get_or_insert_with(|| pattern[..index].to_owned())
        .push_str(replacement);
}
