//! Cursor over Mini-Program markup.

use source_span::Span;

/// A byte cursor over one markup source.
///
/// Every read returns a slice of the original source, so callers can keep
/// spans instead of copies.
pub struct MarkupLexer<'a> {
    source: &'a str,
    pos: usize,
}

impl<'a> MarkupLexer<'a> {
    /// Create a new lexer for the given source.
    pub fn new(source: &'a str) -> Self {
        Self { source, pos: 0 }
    }

    /// Get the current position.
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Get the full source.
    pub fn source(&self) -> &'a str {
        self.source
    }

    /// Get the remaining source.
    pub fn remaining(&self) -> &'a str {
        &self.source[self.pos..]
    }

    /// Peek at the next character.
    pub fn peek_char(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    /// Peek at the character after the next one.
    pub fn peek_second(&self) -> Option<char> {
        let mut chars = self.remaining().chars();
        chars.next();
        chars.next()
    }

    /// Consume and return the next character.
    pub fn next_char(&mut self) -> Option<char> {
        let c = self.peek_char()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    /// Skip whitespace and return the number of bytes skipped.
    pub fn skip_whitespace(&mut self) -> usize {
        let start = self.pos;
        self.consume_while(char::is_whitespace);
        self.pos - start
    }

    /// Check if the remaining source starts with the given string.
    pub fn starts_with(&self, s: &str) -> bool {
        self.remaining().starts_with(s)
    }

    /// Consume a string if the remaining source starts with it.
    pub fn consume(&mut self, s: &str) -> bool {
        if self.starts_with(s) {
            self.pos += s.len();
            true
        } else {
            false
        }
    }

    /// Consume characters while the predicate is true.
    pub fn consume_while<F>(&mut self, pred: F) -> &'a str
    where
        F: Fn(char) -> bool,
    {
        let start = self.pos;
        while let Some(c) = self.peek_char() {
            if pred(c) {
                self.pos += c.len_utf8();
            } else {
                break;
            }
        }
        &self.source[start..self.pos]
    }

    /// Consume until the given string is found, or to the end of input.
    pub fn consume_until(&mut self, s: &str) -> &'a str {
        let start = self.pos;
        match self.remaining().find(s) {
            Some(offset) => self.pos += offset,
            None => self.pos = self.source.len(),
        }
        &self.source[start..self.pos]
    }

    /// Consume plain text up to the next `<` or mustache opener.
    pub fn consume_text(&mut self) -> &'a str {
        let start = self.pos;
        let rest = self.remaining();
        let stop = rest
            .char_indices()
            .skip(1)
            .find(|(i, c)| *c == '<' || (*c == '{' && rest[*i..].starts_with("{{")))
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        self.pos += stop;
        &self.source[start..self.pos]
    }

    /// Read a tag name.
    pub fn read_tag_name(&mut self) -> Option<&'a str> {
        match self.peek_char() {
            Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
            _ => return None,
        }
        Some(self.consume_while(|c| {
            c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == ':' || c == '.'
        }))
    }

    /// Read an attribute name.
    ///
    /// Anything up to whitespace, `=`, `>`, a quote or `/` counts, so
    /// directive names such as `@tap.catch` or `bind:tap` are read whole.
    pub fn read_attr_name(&mut self) -> &'a str {
        self.consume_while(|c| {
            !c.is_whitespace() && !matches!(c, '=' | '>' | '/' | '"' | '\'' | '<')
        })
    }

    /// Read an attribute value, quoted or not, and return the span of the
    /// value without its quotes.
    pub fn read_attr_value(&mut self) -> Span {
        match self.peek_char() {
            Some(quote @ ('"' | '\'')) => {
                self.next_char();
                let start = self.pos;
                let mut buf = [0u8; 4];
                self.consume_until(quote.encode_utf8(&mut buf));
                let span = self.span_from(start);
                self.next_char();
                span
            }
            _ => {
                let start = self.pos;
                while let Some(c) = self.peek_char() {
                    if c.is_whitespace() || c == '>' || self.starts_with("/>") {
                        break;
                    }
                    self.pos += c.len_utf8();
                }
                self.span_from(start)
            }
        }
    }

    /// Read element content until the closing tag, leaving the cursor at
    /// the `</`. The match is case-insensitive.
    pub fn read_raw_content(&mut self, closing_tag: &str) -> Span {
        let start = self.pos;
        let pattern = format!("</{}", closing_tag);

        while !self.is_eof() {
            let rest = self.remaining();
            if rest.len() >= pattern.len()
                && rest.is_char_boundary(pattern.len())
                && rest[..pattern.len()].eq_ignore_ascii_case(&pattern)
            {
                let after = rest[pattern.len()..].chars().next();
                if matches!(after, Some('>') | None) || after.is_some_and(char::is_whitespace) {
                    break;
                }
            }
            self.next_char();
        }
        self.span_from(start)
    }

    /// Skip a closing tag `</name ...>` if the cursor is on one.
    pub fn skip_closing_tag(&mut self) -> bool {
        if !self.consume("</") {
            return false;
        }
        self.consume_until(">");
        self.consume(">");
        true
    }

    /// Check if at end of input.
    pub fn is_eof(&self) -> bool {
        self.pos >= self.source.len()
    }

    /// Get a span from start to current position.
    pub fn span_from(&self, start: usize) -> Span {
        Span::from_offsets(start, self.pos)
    }

    /// Get the source slice for a span.
    pub fn slice(&self, span: Span) -> &'a str {
        &self.source[span.to_range()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_tag_name() {
        let mut lexer = MarkupLexer::new("scroll-view class=\"a\">");
        assert_eq!(lexer.read_tag_name(), Some("scroll-view"));
        let mut lexer = MarkupLexer::new("1abc");
        assert_eq!(lexer.read_tag_name(), None);
    }

    #[test]
    fn test_read_attr_name_keeps_modifiers() {
        let mut lexer = MarkupLexer::new("@tap.capture.catch=\"onTap\"");
        assert_eq!(lexer.read_attr_name(), "@tap.capture.catch");
        assert!(lexer.consume("="));
        let span = lexer.read_attr_value();
        assert_eq!(lexer.slice(span), "onTap");
    }

    #[test]
    fn test_read_unquoted_value() {
        let mut lexer = MarkupLexer::new("a.wxml/>");
        let span = lexer.read_attr_value();
        assert_eq!(lexer.slice(span), "a.wxml");
        assert!(lexer.starts_with("/>"));
    }

    #[test]
    fn test_unterminated_quote_runs_to_end() {
        let mut lexer = MarkupLexer::new("'broken");
        let span = lexer.read_attr_value();
        assert_eq!(lexer.slice(span), "broken");
        assert!(lexer.is_eof());
    }

    #[test]
    fn test_read_raw_content() {
        let mut lexer = MarkupLexer::new("var a = 1 < 2;</WXS >");
        let span = lexer.read_raw_content("wxs");
        assert_eq!(lexer.slice(span), "var a = 1 < 2;");
        assert!(lexer.skip_closing_tag());
        assert!(lexer.is_eof());
    }

    #[test]
    fn test_consume_text_stops_at_markup() {
        let mut lexer = MarkupLexer::new("hello {{ a }} <view>");
        assert_eq!(lexer.consume_text(), "hello ");
        assert_eq!(lexer.consume_until("}}"), "{{ a ");
    }
}
