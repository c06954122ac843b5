//! Position-tracking output buffer.
//!
//! A [`Cursor`] splits the source into a finalized prefix (everything before
//! `position`, already written to the output, possibly rewritten) and the
//! untouched rest. Rules only ever advance it:
//!
//! - [`Cursor::catchup`] copies source text verbatim up to an offset,
//! - [`Cursor::skip_to`] drops source text up to an offset,
//! - [`Cursor::append`] writes generated text without consuming source.
//!
//! Any byte range never dropped with `skip_to` is reproduced exactly,
//! whitespace and comments included.

use tracing::trace;

use crate::error::RewriteError;

#[derive(Debug)]
pub struct Cursor<'src> {
    source: &'src str,
    position: usize,
    output: String,
}

impl<'src> Cursor<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            position: 0,
            output: String::with_capacity(source.len()),
        }
    }

    pub fn source(&self) -> &'src str {
        self.source
    }

    /// Byte offset of the first source byte not yet consumed.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Output accumulated so far.
    pub fn output(&self) -> &str {
        &self.output
    }

    /// Copy `source[position..pos]` verbatim and advance to `pos`.
    pub fn catchup(&mut self, pos: usize) -> Result<(), RewriteError> {
        self.check(pos)?;
        self.output.push_str(&self.source[self.position..pos]);
        self.position = pos;
        Ok(())
    }

    /// Advance to `pos` without copying, discarding the text in between.
    pub fn skip_to(&mut self, pos: usize) -> Result<(), RewriteError> {
        self.check(pos)?;
        if pos > self.position {
            trace!(from = self.position, to = pos, "dropping source text");
        }
        self.position = pos;
        Ok(())
    }

    /// Write generated text at the current write point.
    pub fn append(&mut self, text: &str) {
        self.output.push_str(text);
    }

    /// Copy the rest of the source and return the finished output.
    pub fn finalize(mut self) -> Result<String, RewriteError> {
        self.catchup(self.source.len())?;
        Ok(self.output)
    }

    fn check(&self, pos: usize) -> Result<(), RewriteError> {
        if pos > self.source.len() || !self.source.is_char_boundary(pos) {
            return Err(RewriteError::OffsetOutOfBounds {
                offset: pos,
                len: self.source.len(),
            });
        }
        if pos < self.position {
            return Err(RewriteError::CursorRegression {
                position: self.position,
                requested: pos,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn untouched_source_is_copied_verbatim() {
        let source = "var a = 1; // keep me\n\t/* and me */\n";
        let cursor = Cursor::new(source);
        assert_eq!(cursor.finalize().unwrap(), source);
    }

    #[test]
    fn skip_and_append_replace_a_range() {
        let mut cursor = Cursor::new("a OLD b");
        cursor.catchup(2).unwrap();
        cursor.append("NEW");
        cursor.append("!");
        cursor.skip_to(5).unwrap();
        assert_eq!(cursor.position(), 5);
        assert_eq!(cursor.finalize().unwrap(), "a NEW! b");
    }

    #[test]
    fn catchup_to_current_position_is_a_no_op() {
        let mut cursor = Cursor::new("abc");
        cursor.catchup(2).unwrap();
        cursor.catchup(2).unwrap();
        cursor.skip_to(2).unwrap();
        assert_eq!(cursor.output(), "ab");
    }

    #[test]
    fn moving_backwards_is_rejected() {
        let mut cursor = Cursor::new("abcdef");
        cursor.catchup(4).unwrap();
        assert_eq!(
            cursor.catchup(3),
            Err(RewriteError::CursorRegression {
                position: 4,
                requested: 3
            })
        );
        assert!(matches!(
            cursor.skip_to(1),
            Err(RewriteError::CursorRegression { .. })
        ));
        assert_eq!(cursor.position(), 4);
    }

    #[test]
    fn offsets_must_be_in_bounds_and_on_char_boundaries() {
        let mut cursor = Cursor::new("é=1");
        assert_eq!(
            cursor.catchup(1),
            Err(RewriteError::OffsetOutOfBounds { offset: 1, len: 4 })
        );
        assert!(matches!(
            cursor.skip_to(9),
            Err(RewriteError::OffsetOutOfBounds { offset: 9, .. })
        ));
        cursor.catchup(2).unwrap();
        assert_eq!(cursor.output(), "é");
    }
}
