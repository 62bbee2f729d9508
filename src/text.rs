// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Text helpers: total coercion of loosely-typed JSON values and
//! Japanese script classification.
//!
//! The `safe_*` functions never fail. Callers pass an explicit fallback that
//! is used whenever the input cannot be turned into the requested type.

use serde_json::Value;

/// Fallback used by callers that display a learner's name in Japanese.
pub const DEFAULT_JAPANESE_FALLBACK: &str = "学生";

/// Maximum length (in characters) of a sanitized Japanese string.
pub const MAX_JAPANESE_LEN: usize = 20;

/// Long vowel mark, allowed alongside kana and kanji.
const CHOONPU: char = 'ー';
/// Middle dot, used between words in katakana names.
const NAKAGURO: char = '・';

/// Keep only Hiragana, Katakana and Han characters (plus `ー` and `・`),
/// truncated to [`MAX_JAPANESE_LEN`] characters.
pub fn safe_japanese_string(value: &Value, fallback: &str) -> String {
    let raw = match value {
        Value::String(s) => s.clone(),
        Value::Null => fallback.to_string(),
        Value::Object(_) => String::new(),
        other => other.to_string(),
    };

    raw.chars()
        .filter(|&c| is_hiragana(c) || is_katakana(c) || is_han(c) || c == CHOONPU || c == NAKAGURO)
        .take(MAX_JAPANESE_LEN)
        .collect()
}

/// Coerce a value to a string. Objects and arrays are not stringified.
pub fn safe_string(value: &Value, fallback: &str) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null | Value::Object(_) | Value::Array(_) => fallback.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
    }
}

/// Coerce a value to a finite number.
pub fn safe_number(value: &Value, fallback: f64) -> f64 {
    let coerced = match value {
        Value::Number(n) => n.as_f64(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                Some(0.0)
            } else {
                trimmed.parse::<f64>().ok()
            }
        }
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    };

    match coerced {
        Some(n) if n.is_finite() => n,
        _ => fallback,
    }
}

// ─── Script Classification ───────────────────────────────────

/// Characters of the Unicode Hiragana script.
pub fn is_hiragana(c: char) -> bool {
    matches!(c,
        '\u{3041}'..='\u{3096}'
        | '\u{309D}'..='\u{309F}'
        | '\u{1B001}'..='\u{1B11F}'
        | '\u{1B150}'..='\u{1B152}'
        | '\u{1F200}')
}

/// Characters of the Unicode Katakana script.
///
/// `ー` (U+30FC) and `・` (U+30FB) belong to the Common script and are
/// therefore not included.
pub fn is_katakana(c: char) -> bool {
    matches!(c,
        '\u{30A1}'..='\u{30FA}'
        | '\u{30FD}'..='\u{30FF}'
        | '\u{31F0}'..='\u{31FF}'
        | '\u{32D0}'..='\u{32FE}'
        | '\u{3300}'..='\u{3357}'
        | '\u{FF66}'..='\u{FF6F}'
        | '\u{FF71}'..='\u{FF9D}'
        | '\u{1B000}'
        | '\u{1B164}'..='\u{1B167}')
}

/// Characters of the Unicode Han script.
pub fn is_han(c: char) -> bool {
    matches!(c,
        '\u{2E80}'..='\u{2E99}'
        | '\u{2E9B}'..='\u{2EF3}'
        | '\u{2F00}'..='\u{2FD5}'
        | '\u{3005}'
        | '\u{3007}'
        | '\u{3021}'..='\u{3029}'
        | '\u{3038}'..='\u{303B}'
        | '\u{3400}'..='\u{4DBF}'
        | '\u{4E00}'..='\u{9FFF}'
        | '\u{F900}'..='\u{FA6D}'
        | '\u{FA70}'..='\u{FAD9}'
        | '\u{20000}'..='\u{2A6DF}'
        | '\u{2A700}'..='\u{2EBE0}'
        | '\u{2F800}'..='\u{2FA1D}'
        | '\u{30000}'..='\u{3134A}')
}

/// Characters counted as part of a Japanese word for vocabulary tracking.
fn is_word_char(c: char) -> bool {
    matches!(c, '\u{3040}'..='\u{309F}' | '\u{30A0}'..='\u{30FF}' | '\u{4E00}'..='\u{9FAF}')
}

/// Maximal runs of kana/kanji in `text`.
pub fn japanese_words(text: &str) -> Vec<&str> {
    let mut words = Vec::new();
    let mut start: Option<usize> = None;

    for (idx, c) in text.char_indices() {
        match (is_word_char(c), start) {
            (true, None) => start = Some(idx),
            (false, Some(s)) => {
                words.push(&text[s..idx]);
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        words.push(&text[s..]);
    }

    words
}

// ─── Segmentation ────────────────────────────────────────────

/// Kind of a text segment produced by [`segment`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    Kanji,
    Hiragana,
    Katakana,
    Latin,
    Other,
}

/// A contiguous run of one script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment<'a> {
    pub text: &'a str,
    pub kind: SegmentKind,
}

fn run_kind(c: char) -> Option<SegmentKind> {
    match c {
        '\u{4E00}'..='\u{9FAF}' => Some(SegmentKind::Kanji),
        '\u{3040}'..='\u{309F}' => Some(SegmentKind::Hiragana),
        '\u{30A0}'..='\u{30FF}' => Some(SegmentKind::Katakana),
        c if c.is_ascii_alphanumeric() => Some(SegmentKind::Latin),
        _ => None,
    }
}

/// Split text into script runs for furigana rendering.
///
/// Kanji, hiragana, katakana and ASCII alphanumerics form runs; any other
/// non-whitespace character is its own segment. Whitespace is dropped.
pub fn segment(text: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut current: Option<(usize, SegmentKind)> = None;

    for (idx, c) in text.char_indices() {
        let kind = run_kind(c);

        if let Some((start, run)) = current {
            if kind == Some(run) {
                continue;
            }
            segments.push(Segment {
                text: &text[start..idx],
                kind: run,
            });
            current = None;
        }

        match kind {
            Some(run) => current = Some((idx, run)),
            None if c.is_whitespace() => {}
            None => segments.push(Segment {
                text: &text[idx..idx + c.len_utf8()],
                kind: SegmentKind::Other,
            }),
        }
    }
    if let Some((start, run)) = current {
        segments.push(Segment {
            text: &text[start..],
            kind: run,
        });
    }

    segments
}
