use std::collections::VecDeque;

use super::{
    token::{KEYWORDS, ONE_SYMBOL_TOKENS, THREE_SYMBOLS_TOKENS, TWO_SYMBOLS_TOKENS},
    Position, Token, TokenKind,
};

#[derive(Clone, Copy, Debug)]
struct Mark {
    index: usize,
    line: usize,
    column: usize,
    at_line_start: bool,
}

/// Turns source text into tokens on demand.
///
/// Errors never abort lexing by themselves: they come back as a
/// [`TokenKind::Error`] token and every later call yields [`TokenKind::Eof`].
#[derive(Debug)]
pub struct Lexer {
    chars: Vec<char>,
    index: usize,
    line: usize,
    column: usize,
    at_line_start: bool,
    pending: VecDeque<Token>,
    done: bool,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            index: 0,
            line: 1,
            column: 1,
            at_line_start: true,
            pending: VecDeque::new(),
            done: false,
        }
    }

    /// Lexes the whole input. The result always ends with an `Eof` token,
    /// preceded by the first `Error` token if there was one.
    pub fn tokenize(source: &str) -> Vec<Token> {
        let mut lexer = Lexer::new(source);
        let mut tokens = vec![];
        loop {
            let token = lexer.next_token();
            let eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if eof {
                break;
            }
        }
        log::trace!("lexed {} tokens", tokens.len());
        tokens
    }

    /// Next non-comment token.
    pub fn next_token(&mut self) -> Token {
        if let Some(token) = self.pending.pop_front() {
            return token;
        }
        loop {
            let token = self.next_raw();
            if !matches!(token.kind, TokenKind::Comment(_)) {
                return token;
            }
        }
    }

    /// Looks `n` tokens ahead without consuming; `peek(0)` is the next token.
    pub fn peek(&mut self, n: usize) -> &Token {
        while self.pending.len() <= n {
            let token = loop {
                let token = self.next_raw();
                if !matches!(token.kind, TokenKind::Comment(_)) {
                    break token;
                }
            };
            self.pending.push_back(token);
        }
        &self.pending[n]
    }

    /// Pushes a token back so the next call to [`Lexer::next_token`] returns it.
    pub fn unget(&mut self, token: Token) {
        self.pending.push_front(token);
    }

    fn current(&self) -> Option<char> {
        self.chars.get(self.index).copied()
    }

    fn lookahead(&self, n: usize) -> Option<char> {
        self.chars.get(self.index + n).copied()
    }

    fn position(&self) -> Position {
        Position::new(self.line, self.column)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.current()?;
        self.index += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn mark(&self) -> Mark {
        Mark {
            index: self.index,
            line: self.line,
            column: self.column,
            at_line_start: self.at_line_start,
        }
    }

    fn reset(&mut self, mark: Mark) {
        self.index = mark.index;
        self.line = mark.line;
        self.column = mark.column;
        self.at_line_start = mark.at_line_start;
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.current() {
            if !c.is_whitespace() {
                break;
            }
            if c == '\n' {
                self.at_line_start = true;
            }
            self.bump();
        }
    }

    fn error(&mut self, message: impl Into<String>, pos: Position) -> Token {
        self.done = true;
        Token::new(TokenKind::Error(message.into()), pos)
    }

    fn next_raw(&mut self) -> Token {
        if self.done {
            return Token::new(TokenKind::Eof, self.position());
        }
        self.skip_whitespace();
        let pos = self.position();
        let Some(c) = self.current() else {
            self.done = true;
            return Token::new(TokenKind::Eof, pos);
        };

        if c == '#' && self.at_line_start {
            return self.lex_macro_line(pos);
        }
        self.at_line_start = false;

        let c2 = self.chars[self.index..].iter().take(2).collect::<String>();
        let c3 = self.chars[self.index..].iter().take(3).collect::<String>();

        if c2 == "/*" {
            self.lex_block_comment(pos)
        } else if c2 == "//" {
            self.lex_line_comment(pos)
        } else if c.is_ascii_alphabetic() || c == '_' {
            self.lex_identifier(pos)
        } else if c.is_ascii_digit() || (c == '.' && self.lookahead(1).is_some_and(|d| d.is_ascii_digit())) {
            self.lex_number(pos)
        } else if c == '"' {
            self.lex_string(pos)
        } else if c == '\'' {
            self.lex_char(pos)
        } else if let Some(symbol) = THREE_SYMBOLS_TOKENS.get(c3.as_str()) {
            self.advance(3);
            Token::new(TokenKind::Symbol(*symbol), pos)
        } else if let Some(symbol) = TWO_SYMBOLS_TOKENS.get(c2.as_str()) {
            self.advance(2);
            Token::new(TokenKind::Symbol(*symbol), pos)
        } else if let Some(symbol) = ONE_SYMBOL_TOKENS.get(&c) {
            self.advance(1);
            Token::new(TokenKind::Symbol(*symbol), pos)
        } else {
            self.error(format!("unexpected character `{}`", c), pos)
        }
    }

    fn advance(&mut self, n: usize) {
        for _ in 0..n {
            self.bump();
        }
    }

    fn lex_macro_line(&mut self, pos: Position) -> Token {
        let mut line = String::new();
        while let Some(c) = self.current() {
            if c == '\n' {
                if line.ends_with('\\') {
                    line.push('\n');
                    self.bump();
                    continue;
                }
                break;
            }
            line.push(c);
            self.bump();
        }
        // the newline stays unconsumed so the next line also starts fresh
        Token::new(TokenKind::Macro(line.trim_end().to_string()), pos)
    }

    fn lex_block_comment(&mut self, pos: Position) -> Token {
        self.advance(2);
        let mut text = String::new();
        loop {
            match self.current() {
                None => return self.error("unterminated comment", pos),
                Some('*') if self.lookahead(1) == Some('/') => {
                    self.advance(2);
                    return Token::new(TokenKind::Comment(text), pos);
                }
                Some(c) => {
                    text.push(c);
                    self.bump();
                }
            }
        }
    }

    fn lex_line_comment(&mut self, pos: Position) -> Token {
        self.advance(2);
        let mut text = String::new();
        while let Some(c) = self.current() {
            if c == '\n' {
                break;
            }
            text.push(c);
            self.bump();
        }
        Token::new(TokenKind::Comment(text), pos)
    }

    fn lex_identifier(&mut self, pos: Position) -> Token {
        let s: String = self.chars[self.index..]
            .iter()
            .take_while(|&&c| c.is_ascii_alphanumeric() || c == '_')
            .collect();
        self.advance(s.chars().count());

        if let Some(keyword) = KEYWORDS.get(s.as_str()) {
            Token::new(TokenKind::Keyword(*keyword), pos)
        } else {
            Token::new(TokenKind::Word(s), pos)
        }
    }

    fn take_while(&mut self, text: &mut String, pred: impl Fn(char) -> bool) -> usize {
        let mut n = 0;
        while let Some(c) = self.current() {
            if !pred(c) {
                break;
            }
            text.push(c);
            self.bump();
            n += 1;
        }
        n
    }

    fn lex_number(&mut self, pos: Position) -> Token {
        let mut text = String::new();

        let hex = self.current() == Some('0') && matches!(self.lookahead(1), Some('x' | 'X'));
        if hex {
            text.extend([self.bump(), self.bump()].into_iter().flatten());
            if self.take_while(&mut text, |c| c.is_ascii_hexdigit()) == 0 {
                return self.error("malformed hexadecimal literal", pos);
            }
            self.integer_suffix(&mut text);
        } else {
            self.take_while(&mut text, |c| c.is_ascii_digit());
            let mut float = false;
            if self.current() == Some('.') {
                text.push('.');
                self.bump();
                self.take_while(&mut text, |c| c.is_ascii_digit());
                float = true;
            }
            if self.exponent_follows() {
                text.extend([self.bump(), self.bump()].into_iter().flatten());
                self.take_while(&mut text, |c| c.is_ascii_digit());
                float = true;
            }
            if float {
                if let Some(c @ ('f' | 'F' | 'l' | 'L')) = self.current() {
                    text.push(c);
                    self.bump();
                }
            } else {
                self.integer_suffix(&mut text);
            }
        }

        match self.current() {
            Some(c) if c.is_ascii_alphanumeric() || c == '_' => {
                self.error(format!("invalid suffix `{}` on numeric literal `{}`", c, text), pos)
            }
            _ => Token::new(TokenKind::Number(text), pos),
        }
    }

    fn exponent_follows(&self) -> bool {
        if !matches!(self.current(), Some('e' | 'E')) {
            return false;
        }
        match self.lookahead(1) {
            Some(d) if d.is_ascii_digit() => true,
            Some('+' | '-') => self.lookahead(2).is_some_and(|d| d.is_ascii_digit()),
            _ => false,
        }
    }

    fn integer_suffix(&mut self, text: &mut String) {
        let mut n = 0;
        while let Some(c @ ('u' | 'U' | 'l' | 'L')) = self.current() {
            if n == 3 {
                break;
            }
            text.push(c);
            self.bump();
            n += 1;
        }
    }

    /// Body of a quoted literal after its opening quote. Backslash pairs are
    /// kept as written.
    fn quoted(&mut self, quote: char) -> Option<String> {
        let mut text = String::new();
        loop {
            match self.bump() {
                None | Some('\n') => return None,
                Some('\\') => {
                    text.push('\\');
                    match self.bump() {
                        None => return None,
                        Some(c) => text.push(c),
                    }
                }
                Some(c) if c == quote => return Some(text),
                Some(c) => text.push(c),
            }
        }
    }

    fn lex_string(&mut self, pos: Position) -> Token {
        let mut text = String::new();
        loop {
            self.bump();
            match self.quoted('"') {
                Some(part) => text.push_str(&part),
                None => return self.error("unterminated string literal", pos),
            }

            // adjacent literals separated only by whitespace merge into one
            let mark = self.mark();
            self.skip_whitespace();
            if self.current() != Some('"') {
                self.reset(mark);
                break;
            }
            self.at_line_start = false;
        }
        Token::new(TokenKind::String(text), pos)
    }

    fn lex_char(&mut self, pos: Position) -> Token {
        self.bump();
        match self.quoted('\'') {
            Some(text) if text.is_empty() => self.error("empty character literal", pos),
            Some(text) => Token::new(TokenKind::Char(text), pos),
            None => self.error("unterminated character literal", pos),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::{Keyword, Symbol};
    use test_log::test;

    fn kinds(src: &str) -> Vec<TokenKind> {
        Lexer::tokenize(src).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn longest_symbol_wins() {
        assert_eq!(
            kinds("a <<= b->c ..."),
            vec![
                TokenKind::Word("a".into()),
                TokenKind::Symbol(Symbol::ShlAssign),
                TokenKind::Word("b".into()),
                TokenKind::Symbol(Symbol::Arrow),
                TokenKind::Word("c".into()),
                TokenKind::Symbol(Symbol::Ellipsis),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn keywords_and_words() {
        assert_eq!(
            kinds("pub defer deferred"),
            vec![
                TokenKind::Keyword(Keyword::Pub),
                TokenKind::Keyword(Keyword::Defer),
                TokenKind::Word("deferred".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn macro_lines_are_captured_whole() {
        let tokens = Lexer::tokenize("#include <stdio.h>\nint x;\n  #define A(b) (b + 1)\n");
        assert_eq!(tokens[0].kind, TokenKind::Macro("#include <stdio.h>".into()));
        assert_eq!(tokens[1].kind, TokenKind::Keyword(Keyword::Int));
        assert_eq!(tokens[4].kind, TokenKind::Macro("#define A(b) (b + 1)".into()));
        assert_eq!(tokens[4].pos, Position::new(3, 3));
    }

    #[test]
    fn hash_inside_a_line_is_not_a_macro() {
        let tokens = Lexer::tokenize("x # y");
        assert!(matches!(tokens[1].kind, TokenKind::Error(_)));
    }

    #[test]
    fn macro_line_continuation() {
        let tokens = Lexer::tokenize("#define TWO \\\n  2\nx");
        assert_eq!(tokens[0].kind, TokenKind::Macro("#define TWO \\\n  2".into()));
        assert_eq!(tokens[1].kind, TokenKind::Word("x".into()));
    }

    #[test]
    fn comments_are_skipped() {
        assert_eq!(
            kinds("a /* b * / c */ d // e\nf"),
            vec![
                TokenKind::Word("a".into()),
                TokenKind::Word("d".into()),
                TokenKind::Word("f".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn unterminated_comment_is_an_error_token() {
        let tokens = Lexer::tokenize("a /* never closed");
        assert_eq!(tokens[1].kind, TokenKind::Error("unterminated comment".into()));
        assert_eq!(tokens[1].pos, Position::new(1, 3));
        assert_eq!(tokens[2].kind, TokenKind::Eof);
    }

    #[test]
    fn numbers() {
        assert_eq!(
            kinds("0x1F 42UL 3.5f 1e9 .5 7"),
            vec![
                TokenKind::Number("0x1F".into()),
                TokenKind::Number("42UL".into()),
                TokenKind::Number("3.5f".into()),
                TokenKind::Number("1e9".into()),
                TokenKind::Number(".5".into()),
                TokenKind::Number("7".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn bad_number_suffix() {
        let tokens = Lexer::tokenize("12abc");
        assert!(matches!(&tokens[0].kind, TokenKind::Error(m) if m.contains("invalid suffix")));
        assert!(matches!(Lexer::tokenize("3.0u")[0].kind, TokenKind::Error(_)));
    }

    #[test]
    fn adjacent_strings_concatenate() {
        assert_eq!(
            kinds("\"ab\"  \n \"c\\\"d\" x"),
            vec![
                TokenKind::String("abc\\\"d".into()),
                TokenKind::Word("x".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn unterminated_string() {
        let tokens = Lexer::tokenize("\"abc\nx");
        assert_eq!(tokens[0].kind, TokenKind::Error("unterminated string literal".into()));
    }

    #[test]
    fn char_literals_keep_escapes() {
        assert_eq!(
            kinds("'\\n' 'a'"),
            vec![
                TokenKind::Char("\\n".into()),
                TokenKind::Char("a".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn peek_and_unget() {
        let mut lexer = Lexer::new("a b c");
        assert_eq!(lexer.peek(1).kind, TokenKind::Word("b".into()));
        let a = lexer.next_token();
        assert_eq!(a.kind, TokenKind::Word("a".into()));
        lexer.unget(a);
        assert_eq!(lexer.next_token().kind, TokenKind::Word("a".into()));
        assert_eq!(lexer.next_token().kind, TokenKind::Word("b".into()));
        assert_eq!(lexer.next_token().kind, TokenKind::Word("c".into()));
        assert_eq!(lexer.next_token().kind, TokenKind::Eof);
    }
}
