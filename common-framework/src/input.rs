use std::ops::Range;

/// The input a parse runs over.
///
/// Exactly one form is present: either text, addressed by byte offset, or a
/// slice of pre-tokenized objects, addressed by element index. The view is
/// immutable for the whole parse.
#[derive(Debug)]
pub enum Input<'a, T> {
    /// Character input.
    Text(&'a str),
    /// Pre-tokenized input.
    Tokens(&'a [T]),
}

impl<T> Clone for Input<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Input<'_, T> {}

impl<'a, T> Input<'a, T> {
    /// Returns the length of the input (bytes for text, elements for tokens).
    pub fn len(&self) -> usize {
        match self {
            Input::Text(text) => text.len(),
            Input::Tokens(tokens) => tokens.len(),
        }
    }

    /// Returns `true` if the input is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the text if this is character input.
    pub fn text(&self) -> Option<&'a str> {
        match self {
            Input::Text(text) => Some(text),
            Input::Tokens(_) => None,
        }
    }

    /// Returns the tokens if this is object input.
    pub fn tokens(&self) -> Option<&'a [T]> {
        match self {
            Input::Text(_) => None,
            Input::Tokens(tokens) => Some(tokens),
        }
    }

    /// Returns the character starting at byte `index`.
    ///
    /// `None` is the end-of-input sentinel; it is also returned for token
    /// input and for indices that do not fall on a character boundary.
    pub fn char_at(&self, index: usize) -> Option<char> {
        self.text()?.get(index..)?.chars().next()
    }

    /// Returns the token at `index`, or `None` at the end of the input
    /// (and for character input).
    pub fn token_at(&self, index: usize) -> Option<&'a T> {
        self.tokens()?.get(index)
    }

    /// Returns `true` if `literal` appears in the text at byte `index`.
    ///
    /// Safe when the literal is longer than the remaining input. Never
    /// allocates. Always `false` for token input.
    pub fn matches_at(&self, index: usize, literal: &str) -> bool {
        match self {
            Input::Text(text) => text
                .as_bytes()
                .get(index..)
                .is_some_and(|rest| rest.starts_with(literal.as_bytes())),
            Input::Tokens(_) => false,
        }
    }

    /// Returns the text covered by `range`, or `None` for token input or an
    /// invalid range.
    pub fn text_span(&self, range: Range<usize>) -> Option<&'a str> {
        self.text()?.get(range)
    }

    /// Returns the tokens covered by `range`, or `None` for character input
    /// or an invalid range.
    pub fn token_span(&self, range: Range<usize>) -> Option<&'a [T]> {
        self.tokens()?.get(range)
    }
}
