//! Shared scanning helpers for preprocessing passes.

/// Skip over non-code regions: comments and strings (NOT template literals).
///
/// Template literals contain `${...}` interpolations with real code, so
/// callers track them separately with [`TemplateState`].
///
/// Returns `Some(new_position)` if `i` is at the start of a non-code region,
/// where `new_position` is the first character after the region.
/// Returns `None` if `i` is not at the start of a non-code region.
pub(super) fn skip_non_code(chars: &[char], i: usize) -> Option<usize> {
    if i >= chars.len() {
        return Some(chars.len());
    }

    // Single-line comment
    if chars[i] == '/' && chars.get(i + 1) == Some(&'/') {
        let mut j = i + 2;
        while j < chars.len() && chars[j] != '\n' {
            j += 1;
        }
        return Some(j);
    }

    // Multi-line comment
    if chars[i] == '/' && chars.get(i + 1) == Some(&'*') {
        let mut j = i + 2;
        while j + 1 < chars.len() {
            if chars[j] == '*' && chars[j + 1] == '/' {
                return Some(j + 2);
            }
            j += 1;
        }
        return Some(chars.len());
    }

    if is_quote(chars[i]) {
        let quote = chars[i];
        let mut j = i + 1;
        while j < chars.len() && chars[j] != quote {
            if chars[j] == '\\' {
                j += 1;
            }
            j += 1;
        }
        return Some((j + 1).min(chars.len()));
    }

    None
}

pub(super) fn is_quote(c: char) -> bool {
    c == '"' || c == '\''
}

/// Tracks template literal nesting.
///
/// Each stack entry is one open template literal; the value is the brace
/// depth inside its current `${...}` interpolation, `0` while in the literal
/// text itself.
#[derive(Default)]
pub(super) struct TemplateState {
    stack: Vec<i32>,
}

/// What the scanner should do with the current character.
pub(super) enum HandleResult {
    /// Template handling consumed this many characters.
    Skip(usize),
    /// Ordinary code.
    Process,
}

impl TemplateState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle_char(&mut self, chars: &[char], i: usize) -> HandleResult {
        let Some(depth) = self.stack.last_mut() else {
            if chars[i] == '`' {
                self.stack.push(0);
                return HandleResult::Skip(1);
            }
            return HandleResult::Process;
        };

        if *depth == 0 {
            return match chars[i] {
                '\\' if i + 1 < chars.len() => HandleResult::Skip(2),
                '$' if chars.get(i + 1) == Some(&'{') => {
                    *depth = 1;
                    HandleResult::Skip(2)
                }
                '`' => {
                    self.stack.pop();
                    HandleResult::Skip(1)
                }
                _ => HandleResult::Skip(1),
            };
        }

        // Inside an interpolation
        match chars[i] {
            '`' => {
                self.stack.push(0);
                HandleResult::Skip(1)
            }
            '{' => {
                *depth += 1;
                HandleResult::Process
            }
            '}' => {
                *depth -= 1;
                if *depth == 0 {
                    HandleResult::Skip(1)
                } else {
                    HandleResult::Process
                }
            }
            _ => HandleResult::Process,
        }
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

/// Whether an identifier starts at `i` (not in the middle of one).
pub(super) fn is_word_start(chars: &[char], i: usize) -> bool {
    let Some(&c) = chars.get(i) else {
        return false;
    };
    if !c.is_alphabetic() && c != '_' && c != '$' {
        return false;
    }
    i == 0 || !is_ident_char(chars[i - 1])
}

/// Index one past the identifier starting at `start`.
pub(super) fn scan_word(chars: &[char], start: usize) -> usize {
    let mut i = start;
    while i < chars.len() && is_ident_char(chars[i]) {
        i += 1;
    }
    i
}

pub(super) fn word_at(chars: &[char], start: usize) -> String {
    chars[start..scan_word(chars, start)].iter().collect()
}

/// Index of the first non-whitespace character at or after `start`.
pub(super) fn skip_whitespace(chars: &[char], start: usize) -> usize {
    let mut i = start;
    while i < chars.len() && chars[i].is_whitespace() {
        i += 1;
    }
    i
}

/// The last non-whitespace character before `i`, if any.
pub(super) fn previous_significant(chars: &[char], i: usize) -> Option<char> {
    chars[..i].iter().rev().copied().find(|c| !c.is_whitespace())
}

/// Convert a character index to a byte offset in UTF-8.
pub(super) fn char_offset_to_byte(chars: &[char], char_idx: usize) -> usize {
    chars[..char_idx].iter().map(|c| c.len_utf8()).sum()
}
