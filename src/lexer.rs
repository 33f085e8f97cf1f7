use std::fmt;
use tracing::trace;

/// Kinds of tokens in the language's vocabulary.
///
/// `Eq` and `StringLiteral` are reserved: the lexer never produces them.
/// `KeywordIf` and `KeywordElse` are produced, but no grammar rule consumes them.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Plus,
    Minus,
    Star,
    Slash,

    GE,
    GT,
    EQ,
    LE,
    LT,

    SemiColon,
    LeftParen,
    RightParen,

    Assignment,

    KeywordInt,
    KeywordIf,
    KeywordElse,

    Identifier,
    IntLiteral,
    StringLiteral,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A token: its kind plus the exact text it was matched from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    kind: TokenKind,
    text: String,
}

impl Token {
    pub fn new(kind: TokenKind, text: &str) -> Token {
        Token {
            kind,
            text: text.to_string(),
        }
    }

    pub fn kind(&self) -> TokenKind {
        self.kind
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

// Reserved words, matched by the keyword-prefix states of the DFA.
const KEYWORDS: &[(&str, TokenKind)] = &[
    ("int", TokenKind::KeywordInt),
    ("if", TokenKind::KeywordIf),
    ("else", TokenKind::KeywordElse),
];

fn keyword_kind(word: &str) -> Option<TokenKind> {
    KEYWORDS
        .iter()
        .find(|(spelling, _)| *spelling == word)
        .map(|(_, kind)| *kind)
}

fn is_keyword_prefix(word: &str) -> bool {
    KEYWORDS.iter().any(|(spelling, _)| spelling.starts_with(word))
}

fn is_alpha(c: char) -> bool {
    c.is_ascii_alphabetic()
}

fn is_digit(c: char) -> bool {
    c.is_ascii_digit()
}

fn is_alnum(c: char) -> bool {
    is_alpha(c) || is_digit(c)
}

/// States of the tokenizer's automaton.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum DfaState {
    Initial,
    // the text so far is a prefix of some keyword (and maybe a whole one)
    KeywordPrefix,
    Id,
    GT,
    LT,
    IntLiteral,
    // a complete token that the next character always closes
    Single,
}

/// The hand-written tokenizer. A single pass over the characters of its input,
/// driven by a deterministic finite automaton.
///
/// Characters the language has no use for (whitespace included) are skipped
/// without producing a token:
///
/// ```
/// # use simple_script::lexer::{Lexer, TokenKind};
/// let kinds: Vec<TokenKind> = Lexer::new()
///     .tokenize("age @ >= 45;")
///     .map(|t| t.kind())
///     .collect();
///
/// assert_eq!(kinds, vec![
///     TokenKind::Identifier, TokenKind::GE, TokenKind::IntLiteral, TokenKind::SemiColon,
/// ]);
/// ```
///
/// `int` is only a keyword at a word boundary; anything longer is an identifier:
///
/// ```
/// # use simple_script::lexer::{Lexer, TokenKind};
/// let mut tokens = Lexer::new().tokenize("inta int;");
/// assert_eq!(tokens.read().map(|t| t.kind()), Some(TokenKind::Identifier));
/// assert_eq!(tokens.read().map(|t| t.kind()), Some(TokenKind::KeywordInt));
/// ```
///
pub struct Lexer {
    kind: TokenKind,
    text: String,
    tokens: Vec<Token>,
}

impl Default for Lexer {
    fn default() -> Lexer {
        Lexer::new()
    }
}

impl Lexer {
    pub fn new() -> Lexer {
        Lexer {
            kind: TokenKind::Identifier,
            text: String::new(),
            tokens: Vec::new(),
        }
    }

    pub fn tokenize(mut self, code: &str) -> TokenStream {
        let mut state = DfaState::Initial;

        for c in code.chars() {
            state = match state {
                DfaState::Initial => self.init_token(c),
                DfaState::Id => {
                    if is_alnum(c) {
                        self.text.push(c);
                        DfaState::Id
                    } else {
                        self.init_token(c)
                    }
                },
                DfaState::KeywordPrefix => {
                    if is_alnum(c) {
                        self.text.push(c);
                        if is_keyword_prefix(&self.text) {
                            DfaState::KeywordPrefix
                        } else {
                            // over-match: plain identifier from now on.
                            DfaState::Id
                        }
                    } else {
                        self.commit_keyword();
                        self.init_token(c)
                    }
                },
                DfaState::GT => {
                    if c == '=' {
                        self.kind = TokenKind::GE;
                        self.text.push(c);
                        DfaState::Single
                    } else {
                        self.init_token(c)
                    }
                },
                DfaState::LT => {
                    if c == '=' {
                        self.kind = TokenKind::LE;
                        self.text.push(c);
                        DfaState::Single
                    } else {
                        self.init_token(c)
                    }
                },
                DfaState::IntLiteral => {
                    if is_digit(c) {
                        self.text.push(c);
                        DfaState::IntLiteral
                    } else {
                        self.init_token(c)
                    }
                },
                DfaState::Single => self.init_token(c),
            };
        }

        // flush whatever token was still being built.
        if state == DfaState::KeywordPrefix {
            self.commit_keyword();
        }
        self.close_token();

        TokenStream::new(self.tokens)
    }

    // Classifies the in-progress word as a keyword if it spells one exactly;
    // otherwise it stays an identifier.
    fn commit_keyword(&mut self) {
        if let Some(kind) = keyword_kind(&self.text) {
            self.kind = kind;
        }
    }

    fn close_token(&mut self) {
        if self.text.is_empty() {
            return;
        }
        let token = Token {
            kind: self.kind,
            text: std::mem::take(&mut self.text),
        };
        trace!(kind = %token.kind, text = %token.text, "token");
        self.tokens.push(token);
        self.kind = TokenKind::Identifier;
    }

    // The initial state does not hold: it saves the finished token (if any)
    // and dispatches on the character that starts the next one.
    fn init_token(&mut self, c: char) -> DfaState {
        self.close_token();

        let (kind, state) = if is_alpha(c) {
            if is_keyword_prefix(&c.to_string()) {
                (TokenKind::Identifier, DfaState::KeywordPrefix)
            } else {
                (TokenKind::Identifier, DfaState::Id)
            }
        } else if is_digit(c) {
            (TokenKind::IntLiteral, DfaState::IntLiteral)
        } else {
            match c {
                '>' => (TokenKind::GT, DfaState::GT),
                '<' => (TokenKind::LT, DfaState::LT),
                '+' => (TokenKind::Plus, DfaState::Single),
                '-' => (TokenKind::Minus, DfaState::Single),
                '*' => (TokenKind::Star, DfaState::Single),
                '/' => (TokenKind::Slash, DfaState::Single),
                ';' => (TokenKind::SemiColon, DfaState::Single),
                '(' => (TokenKind::LeftParen, DfaState::Single),
                ')' => (TokenKind::RightParen, DfaState::Single),
                '=' => (TokenKind::Assignment, DfaState::Single),
                // whitespace and anything unknown: skip it.
                _ => return DfaState::Initial,
            }
        };
        self.kind = kind;
        self.text.push(c);
        state
    }
}

/// Tokenizes `code`. Never fails.
pub fn tokenize(code: &str) -> TokenStream {
    Lexer::new().tokenize(code)
}

/// A cursor over the tokens produced by the lexer. Used by the parser.
///
/// The cursor only moves through `read`, `unread` and `set_position`, which is
/// all the parser needs to backtrack:
///
/// ```
/// # use simple_script::lexer::tokenize;
/// let mut tokens = tokenize("a = 1;");
/// let checkpoint = tokens.position();
/// tokens.read();
/// tokens.read();
/// tokens.set_position(checkpoint);
/// assert_eq!(tokens.peek().map(|t| t.text()), Some("a"));
/// ```
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenStream {
    tokens: Vec<Token>,
    pos: usize,
}

impl Iterator for TokenStream {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        self.read().cloned()
    }
}

impl TokenStream {
    pub fn new(tokens: Vec<Token>) -> TokenStream {
        TokenStream { tokens, pos: 0 }
    }

    /// Returns the token under the cursor and moves past it, or `None` at the
    /// end of the stream.
    pub fn read(&mut self) -> Option<&Token> {
        let token = self.tokens.get(self.pos)?;
        self.pos += 1;
        Some(token)
    }

    pub fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    pub fn peek_kind(&self) -> Option<TokenKind> {
        self.peek().map(Token::kind)
    }

    /// Steps back one token. Does nothing at the start of the stream.
    pub fn unread(&mut self) {
        if self.pos > 0 {
            self.pos -= 1;
        }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    /// Moves the cursor to `position`, which may be anywhere from the first
    /// token up to the end of the stream. Other values are ignored.
    pub fn set_position(&mut self, position: usize) {
        if position <= self.tokens.len() {
            self.pos = position;
        }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens_of(s: &str) -> Vec<(TokenKind, String)> {
        tokenize(s)
            .map(|t| (t.kind(), t.text().to_string()))
            .collect()
    }

    fn tok(kind: TokenKind, text: &str) -> (TokenKind, String) {
        (kind, text.to_string())
    }

    #[test]
    fn comparison_ge() {
        assert_eq!(
            tokens_of("age >= 45;"),
            vec![
                tok(TokenKind::Identifier, "age"),
                tok(TokenKind::GE, ">="),
                tok(TokenKind::IntLiteral, "45"),
                tok(TokenKind::SemiColon, ";"),
            ]
        );
    }

    #[test]
    fn comparison_gt() {
        assert_eq!(
            tokens_of("age > 45;"),
            vec![
                tok(TokenKind::Identifier, "age"),
                tok(TokenKind::GT, ">"),
                tok(TokenKind::IntLiteral, "45"),
                tok(TokenKind::SemiColon, ";"),
            ]
        );
    }

    #[test]
    fn gt_closed_by_next_token() {
        assert_eq!(
            tokens_of(">4"),
            vec![tok(TokenKind::GT, ">"), tok(TokenKind::IntLiteral, "4")]
        );
    }

    #[test]
    fn less_than_and_le() {
        assert_eq!(
            tokens_of("a<b<=c"),
            vec![
                tok(TokenKind::Identifier, "a"),
                tok(TokenKind::LT, "<"),
                tok(TokenKind::Identifier, "b"),
                tok(TokenKind::LE, "<="),
                tok(TokenKind::Identifier, "c"),
            ]
        );
    }

    #[test]
    fn int_keyword() {
        assert_eq!(
            tokens_of("int age = 45;"),
            vec![
                tok(TokenKind::KeywordInt, "int"),
                tok(TokenKind::Identifier, "age"),
                tok(TokenKind::Assignment, "="),
                tok(TokenKind::IntLiteral, "45"),
                tok(TokenKind::SemiColon, ";"),
            ]
        );
    }

    #[test]
    fn int_prefix_over_match() {
        let tokens = tokens_of("inta age = 45;");
        assert_eq!(tokens[0], tok(TokenKind::Identifier, "inta"));
        assert_eq!(tokens[1], tok(TokenKind::Identifier, "age"));
        assert_eq!(tokens.len(), 5);
    }

    #[test]
    fn int_prefix_under_match() {
        let tokens = tokens_of("in age = 45;");
        assert_eq!(tokens[0], tok(TokenKind::Identifier, "in"));
        assert_eq!(tokens[1], tok(TokenKind::Identifier, "age"));
    }

    #[test]
    fn identifier_sharing_first_letter_with_keyword() {
        assert_eq!(tokens_of("ix"), vec![tok(TokenKind::Identifier, "ix")]);
        assert_eq!(tokens_of("int2"), vec![tok(TokenKind::Identifier, "int2")]);
    }

    #[test]
    fn keyword_followed_by_punctuation() {
        assert_eq!(
            tokens_of("int;"),
            vec![tok(TokenKind::KeywordInt, "int"), tok(TokenKind::SemiColon, ";")]
        );
        assert_eq!(
            tokens_of("int(a)"),
            vec![
                tok(TokenKind::KeywordInt, "int"),
                tok(TokenKind::LeftParen, "("),
                tok(TokenKind::Identifier, "a"),
                tok(TokenKind::RightParen, ")"),
            ]
        );
    }

    #[test]
    fn keyword_at_end_of_input() {
        assert_eq!(tokens_of("int"), vec![tok(TokenKind::KeywordInt, "int")]);
    }

    #[test]
    fn reserved_if_else() {
        assert_eq!(
            tokens_of("if else elsewhere"),
            vec![
                tok(TokenKind::KeywordIf, "if"),
                tok(TokenKind::KeywordElse, "else"),
                tok(TokenKind::Identifier, "elsewhere"),
            ]
        );
    }

    #[test]
    fn single_char_operators() {
        let kinds: Vec<TokenKind> = tokens_of("+-*/;()=").into_iter().map(|(k, _)| k).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Plus,
                TokenKind::Minus,
                TokenKind::Star,
                TokenKind::Slash,
                TokenKind::SemiColon,
                TokenKind::LeftParen,
                TokenKind::RightParen,
                TokenKind::Assignment,
            ]
        );
    }

    #[test]
    fn assignment_is_never_two_chars() {
        assert_eq!(
            tokens_of("=="),
            vec![tok(TokenKind::Assignment, "="), tok(TokenKind::Assignment, "=")]
        );
    }

    #[test]
    fn multi_tokens_consecutive() {
        assert_eq!(
            tokens_of("b=10*2;"),
            vec![
                tok(TokenKind::Identifier, "b"),
                tok(TokenKind::Assignment, "="),
                tok(TokenKind::IntLiteral, "10"),
                tok(TokenKind::Star, "*"),
                tok(TokenKind::IntLiteral, "2"),
                tok(TokenKind::SemiColon, ";"),
            ]
        );
    }

    #[test]
    fn digits_then_letters_split() {
        assert_eq!(
            tokens_of("12ab"),
            vec![tok(TokenKind::IntLiteral, "12"), tok(TokenKind::Identifier, "ab")]
        );
    }

    #[test]
    fn identifier_with_digits() {
        assert_eq!(tokens_of("a1b2"), vec![tok(TokenKind::Identifier, "a1b2")]);
    }

    #[test]
    fn illegal_chars_skipped() {
        assert_eq!(
            tokens_of("\t@a #\n$ 1 é"),
            vec![tok(TokenKind::Identifier, "a"), tok(TokenKind::IntLiteral, "1")]
        );
    }

    #[test]
    fn empty_and_blank_input() {
        assert!(tokenize("").is_empty());
        assert!(tokenize(" \t\n ").is_empty());
    }

    #[test]
    fn stream_read_peek_unread() {
        let mut stream = tokenize("a;");
        assert_eq!(stream.peek().map(Token::text), Some("a"));
        assert_eq!(stream.read().map(Token::text), Some("a"));
        assert_eq!(stream.read().map(Token::text), Some(";"));
        assert_eq!(stream.read(), None);
        assert_eq!(stream.peek(), None);
        assert_eq!(stream.position(), 2);

        stream.unread();
        assert_eq!(stream.peek_kind(), Some(TokenKind::SemiColon));
        stream.unread();
        stream.unread();
        assert_eq!(stream.position(), 0);
    }

    #[test]
    fn stream_set_position_out_of_range() {
        let mut stream = tokenize("a b c");
        stream.set_position(2);
        assert_eq!(stream.position(), 2);
        stream.set_position(3);
        assert_eq!(stream.position(), 3);
        stream.set_position(4);
        assert_eq!(stream.position(), 3);
    }
}
