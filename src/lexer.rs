use std::borrow::Cow;
use std::{iter::Peekable, str::CharIndices};

use num_bigint::BigInt;

use crate::token::{Span, Token, TokenKind};

mod error;

pub use error::{LexError, LexResult};

/// Pull-based tokenizer. Produces one token per call and keeps no buffer.
#[derive(Clone)]
pub struct Lexer<'a> {
    input: &'a str,
    chars: Peekable<CharIndices<'a>>,
    line: usize,
    column: usize,
    finished: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.char_indices().peekable(),
            line: 1,
            column: 0,
            finished: false,
        }
    }

    /// Returns the next token. Once the input is exhausted every call returns `EOF`.
    pub fn next_token(&mut self) -> LexResult<Token<'a>> {
        self.skip_whitespace();

        let (start_idx, ch) = match self.chars.peek() {
            Some(&(idx, c)) => (idx, c),
            None => {
                let index = self.input.len();
                return Ok(Token::new(
                    TokenKind::EOF,
                    Span {
                        start: index,
                        end: index,
                        line: self.line,
                        column: self.column,
                    },
                ));
            }
        };

        let line = self.line;
        let column = self.column;
        match ch {
            '+' => Ok(self.single(TokenKind::Plus, start_idx, line, column)),
            '-' => Ok(self.single(TokenKind::Minus, start_idx, line, column)),
            '*' => Ok(self.single(TokenKind::Star, start_idx, line, column)),
            '/' => Ok(self.single(TokenKind::Slash, start_idx, line, column)),
            '(' => Ok(self.single(TokenKind::LParen, start_idx, line, column)),
            ')' => Ok(self.single(TokenKind::RParen, start_idx, line, column)),
            '{' => Ok(self.single(TokenKind::LBrace, start_idx, line, column)),
            '}' => Ok(self.single(TokenKind::RBrace, start_idx, line, column)),
            '[' => Ok(self.single(TokenKind::LBracket, start_idx, line, column)),
            ']' => Ok(self.single(TokenKind::RBracket, start_idx, line, column)),
            ',' => Ok(self.single(TokenKind::Comma, start_idx, line, column)),
            ':' => Ok(self.single(TokenKind::Colon, start_idx, line, column)),
            '=' => Ok(self.with_optional_equal(
                TokenKind::Assign,
                TokenKind::EqualEqual,
                start_idx,
                line,
                column,
            )),
            '<' => Ok(self.with_optional_equal(
                TokenKind::Less,
                TokenKind::LessEqual,
                start_idx,
                line,
                column,
            )),
            '>' => Ok(self.with_optional_equal(
                TokenKind::Greater,
                TokenKind::GreaterEqual,
                start_idx,
                line,
                column,
            )),
            '!' => {
                self.advance_char();
                if self.eat('=') {
                    Ok(self.token_from(TokenKind::NotEqual, start_idx, line, column))
                } else {
                    Err(LexError::ExpectedEqualAfterBang { line, column })
                }
            }
            '"' | '\'' => self.read_string(ch, start_idx, line, column),
            c if c.is_ascii_digit() => self.read_integer(start_idx, line, column),
            c if c.is_alphabetic() || c == '_' => Ok(self.read_identifier(start_idx, line, column)),
            _ => Err(LexError::UnexpectedCharacter {
                character: ch,
                line,
                column,
            }),
        }
    }

    fn single(&mut self, kind: TokenKind<'a>, start: usize, line: usize, column: usize) -> Token<'a> {
        self.advance_char();
        self.token_from(kind, start, line, column)
    }

    fn with_optional_equal(
        &mut self,
        plain: TokenKind<'a>,
        with_equal: TokenKind<'a>,
        start: usize,
        line: usize,
        column: usize,
    ) -> Token<'a> {
        self.advance_char();
        let kind = if self.eat('=') { with_equal } else { plain };
        self.token_from(kind, start, line, column)
    }

    fn token_from(&mut self, kind: TokenKind<'a>, start: usize, line: usize, column: usize) -> Token<'a> {
        Token::new(
            kind,
            Span {
                start,
                end: self.current_index(),
                line,
                column,
            },
        )
    }

    fn skip_whitespace(&mut self) {
        while let Some(&(_, c)) = self.chars.peek() {
            if c.is_whitespace() {
                self.advance_char();
            } else {
                break;
            }
        }
    }

    fn read_identifier(&mut self, start: usize, line: usize, column: usize) -> Token<'a> {
        self.advance_char(); // Consume first char
        while let Some(&(_, c)) = self.chars.peek() {
            if c.is_alphanumeric() || c == '_' {
                self.advance_char();
            } else {
                break;
            }
        }

        let end_idx = self.current_index();
        let ident = &self.input[start..end_idx];
        let kind = TokenKind::keyword(ident).unwrap_or(TokenKind::Identifier(ident));
        Token::new(
            kind,
            Span {
                start,
                end: end_idx,
                line,
                column,
            },
        )
    }

    fn read_integer(&mut self, start: usize, line: usize, column: usize) -> LexResult<Token<'a>> {
        self.advance_char(); // Consume first digit
        while let Some(&(_, c)) = self.chars.peek() {
            if c.is_ascii_digit() {
                self.advance_char();
            } else {
                break;
            }
        }

        let end_idx = self.current_index();
        let num_str = &self.input[start..end_idx];
        let num = num_str
            .parse::<BigInt>()
            .map_err(|_| LexError::InvalidIntegerLiteral {
                literal: num_str.to_string(),
                line,
                column,
            })?;
        Ok(Token::new(
            TokenKind::Integer(num),
            Span {
                start,
                end: end_idx,
                line,
                column,
            },
        ))
    }

    fn read_string(
        &mut self,
        quote: char,
        start: usize,
        line: usize,
        column: usize,
    ) -> LexResult<Token<'a>> {
        self.advance_char(); // Consume opening quote
        let content_start = start + quote.len_utf8();
        // Stays borrowed until the first escape forces a copy.
        let mut unescaped: Option<String> = None;
        let mut segment_start = content_start;

        while let Some((idx, c)) = self.advance_char() {
            if c == quote {
                let tail = &self.input[segment_start..idx];
                let value = match unescaped {
                    Some(mut owned) => {
                        owned.push_str(tail);
                        Cow::Owned(owned)
                    }
                    None => Cow::Borrowed(tail),
                };
                return Ok(Token::new(
                    TokenKind::String(value),
                    Span {
                        start,
                        end: idx + quote.len_utf8(),
                        line,
                        column,
                    },
                ));
            }
            if c != '\\' {
                continue;
            }

            let buffer = unescaped.get_or_insert_with(String::new);
            buffer.push_str(&self.input[segment_start..idx]);
            let Some((escaped_idx, escaped)) = self.advance_char() else {
                return Err(LexError::UnterminatedEscape { line, column });
            };
            if !matches!(escaped, '"' | '\'' | '\\') {
                buffer.push('\\');
            }
            buffer.push(escaped);
            segment_start = escaped_idx + escaped.len_utf8();
        }
        Err(LexError::UnterminatedString { line, column })
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = LexResult<Token<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let result = self.next_token();
        // Stop after the single EOF token or the first error.
        if matches!(&result, Ok(token) if token.kind == TokenKind::EOF) || result.is_err() {
            self.finished = true;
        }
        Some(result)
    }
}

impl<'a> Lexer<'a> {
    fn advance_char(&mut self) -> Option<(usize, char)> {
        let next = self.chars.next();
        if let Some((_, c)) = next {
            if c == '\n' {
                self.line += 1;
                self.column = 0;
            } else {
                self.column += 1;
            }
        }
        next
    }

    fn eat(&mut self, expected: char) -> bool {
        if matches!(self.chars.peek(), Some(&(_, c)) if c == expected) {
            self.advance_char();
            true
        } else {
            false
        }
    }

    fn current_index(&mut self) -> usize {
        self.chars
            .peek()
            .map(|(idx, _)| *idx)
            .unwrap_or(self.input.len())
    }
}

/// Collects the whole token stream, `EOF` included.
pub fn tokenize(input: &str) -> LexResult<Vec<Token<'_>>> {
    Lexer::new(input).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    fn kinds(input: &str) -> Vec<TokenKind<'_>> {
        tokenize(input)
            .expect("tokenize should succeed")
            .into_iter()
            .map(|token| token.kind)
            .collect()
    }

    #[test]
    fn test_simple_program() {
        let input = indoc! {r#"
            total = 4 + 4
            if total >= 8: {
                print("big", total)
            }
        "#};
        let expected_tokens = vec![
            TokenKind::Identifier("total"),
            TokenKind::Assign,
            TokenKind::Integer(4.into()),
            TokenKind::Plus,
            TokenKind::Integer(4.into()),
            TokenKind::If,
            TokenKind::Identifier("total"),
            TokenKind::GreaterEqual,
            TokenKind::Integer(8.into()),
            TokenKind::Colon,
            TokenKind::LBrace,
            TokenKind::Identifier("print"),
            TokenKind::LParen,
            TokenKind::String(Cow::Borrowed("big")),
            TokenKind::Comma,
            TokenKind::Identifier("total"),
            TokenKind::RParen,
            TokenKind::RBrace,
            TokenKind::EOF,
        ];
        assert_eq!(kinds(input), expected_tokens);
    }

    #[test]
    fn recognizes_every_operator() {
        assert_eq!(
            kinds("== != < > <= >= = + - * / [ ] { } ( ) , :"),
            vec![
                TokenKind::EqualEqual,
                TokenKind::NotEqual,
                TokenKind::Less,
                TokenKind::Greater,
                TokenKind::LessEqual,
                TokenKind::GreaterEqual,
                TokenKind::Assign,
                TokenKind::Plus,
                TokenKind::Minus,
                TokenKind::Star,
                TokenKind::Slash,
                TokenKind::LBracket,
                TokenKind::RBracket,
                TokenKind::LBrace,
                TokenKind::RBrace,
                TokenKind::LParen,
                TokenKind::RParen,
                TokenKind::Comma,
                TokenKind::Colon,
                TokenKind::EOF,
            ]
        );
    }

    #[test]
    fn keywords_ignore_case_but_identifiers_do_not() {
        assert_eq!(
            kinds("IF Elif eLsE AND Or NOT True FALSE Value value"),
            vec![
                TokenKind::If,
                TokenKind::Elif,
                TokenKind::Else,
                TokenKind::And,
                TokenKind::Or,
                TokenKind::Not,
                TokenKind::True,
                TokenKind::False,
                TokenKind::Identifier("Value"),
                TokenKind::Identifier("value"),
                TokenKind::EOF,
            ]
        );
    }

    #[test]
    fn unescapes_quotes_and_backslashes_only() {
        let tokens = kinds(r#"'it\'s' "say \"hi\"" "a\\b" "line\n""#);
        assert_eq!(
            tokens,
            vec![
                TokenKind::String(Cow::Borrowed("it's")),
                TokenKind::String(Cow::Borrowed("say \"hi\"")),
                TokenKind::String(Cow::Borrowed("a\\b")),
                TokenKind::String(Cow::Borrowed("line\\n")),
                TokenKind::EOF,
            ]
        );
    }

    #[test]
    fn spans_render_significant_characters() {
        let source = "x = {'a': [1]}\n  print(x['a'][0] != 2, not true)";
        let tokens = tokenize(source).expect("tokenize should succeed");
        let rendered: String = tokens.iter().map(|token| token.lexeme(source)).collect();
        let significant: String = source.chars().filter(|c| !c.is_whitespace()).collect();
        assert_eq!(rendered, significant);
        assert_eq!(tokens[tokens.len() - 2].span.line, 2);
    }

    #[test]
    fn yields_exactly_one_eof() {
        let mut lexer = Lexer::new("  ");
        assert_eq!(
            lexer.next().map(|token| token.map(|token| token.kind)),
            Some(Ok(TokenKind::EOF))
        );
        assert!(lexer.next().is_none());
    }

    #[test]
    fn errors_on_invalid_character() {
        let err = tokenize("x = 1 @ 2").expect_err("expected lexing failure");
        assert_eq!(
            err,
            LexError::UnexpectedCharacter {
                character: '@',
                line: 1,
                column: 6
            }
        );
        assert!(err.to_string().contains("Unexpected character '@'"));
    }

    #[test]
    fn errors_on_lone_bang() {
        let err = tokenize("!x").expect_err("expected lexing failure");
        assert_eq!(err, LexError::ExpectedEqualAfterBang { line: 1, column: 0 });
    }

    #[test]
    fn errors_on_unterminated_string() {
        let err = tokenize("print('open").expect_err("expected lexing failure");
        assert_eq!(err, LexError::UnterminatedString { line: 1, column: 6 });
        let err = tokenize("'trailing\\").expect_err("expected lexing failure");
        assert_eq!(err, LexError::UnterminatedEscape { line: 1, column: 0 });
    }

    #[test]
    fn integers_have_no_fixed_width() {
        let literal = "99999999999999999999999999";
        let tokens = kinds(literal);
        let expected: BigInt = literal.parse().expect("valid digits");
        assert_eq!(tokens, vec![TokenKind::Integer(expected), TokenKind::EOF]);
    }
}
