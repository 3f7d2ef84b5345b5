//! Rewindable cursor over the argument text of a message.
//!
//! Positions and consumed lengths are byte offsets, so a token's `consumed`
//! value can always be handed back to [`Tokenizer::rewind`] to un-read it.

/// One token pulled from a [`Tokenizer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    /// Bytes read to produce this token, including skipped leading spaces,
    /// quote delimiters and the terminating space.
    pub consumed: usize,
}

impl Token {
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Tokenizer {
    text: String,
    pos: usize,
}

impl Tokenizer {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            pos: 0,
        }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn is_exhausted(&self) -> bool {
        self.pos >= self.text.len()
    }

    pub fn next_char(&mut self) -> Option<char> {
        let c = self.text[self.pos..].chars().next()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    /// Move the cursor back `n` bytes, stopping at the start of the text.
    pub fn rewind(&mut self, n: usize) {
        self.pos = self.pos.saturating_sub(n);
        while !self.text.is_char_boundary(self.pos) {
            self.pos -= 1;
        }
    }

    /// Skip `n` bytes forward, stopping at the end of the text.
    pub fn advance(&mut self, n: usize) {
        self.pos = (self.pos + n).min(self.text.len());
        while !self.text.is_char_boundary(self.pos) {
            self.pos += 1;
        }
    }

    /// Put the cursor at byte `pos`, clamped to the text.
    pub fn seek(&mut self, pos: usize) {
        self.pos = pos.min(self.text.len());
        while !self.text.is_char_boundary(self.pos) {
            self.pos -= 1;
        }
    }

    /// Everything not read yet, without moving the cursor.
    pub fn remainder(&self) -> &str {
        &self.text[self.pos..]
    }

    /// Everything not read yet; the cursor ends at the end of the text.
    pub fn take_remainder(&mut self) -> String {
        let rest = self.text[self.pos..].to_string();
        self.pos = self.text.len();
        rest
    }

    /// Read one argument token.
    ///
    /// Leading spaces are skipped. A token opening with `"` runs to the next
    /// `"` (spaces kept), anything else runs to the next space. A `"` inside
    /// an unquoted token is dropped. Returns an empty token once the input is
    /// used up.
    pub fn next_token(&mut self) -> Token {
        let mut text = String::new();
        let mut consumed = 0;
        let mut first = true;
        let mut quoted = false;

        while let Some(c) = self.next_char() {
            consumed += c.len_utf8();
            match c {
                '"' if first => quoted = true,
                '"' if quoted => break,
                '"' => {}
                ' ' if first => continue,
                ' ' if quoted => text.push(' '),
                ' ' => break,
                _ => text.push(c),
            }
            first = false;
        }

        Token { text, consumed }
    }

    /// Read up to (and consume) the next space, with no quote handling.
    ///
    /// Used for command names, where `"` has no special meaning.
    pub fn next_word(&mut self) -> String {
        let mut word = String::new();
        while let Some(c) = self.next_char() {
            if c == ' ' {
                break;
            }
            word.push(c);
        }
        word
    }
}
