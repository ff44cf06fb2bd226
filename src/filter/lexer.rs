// Filter lexer - tokenizes filter expressions

use super::token::{Spanned, Token};
use crate::error::{QueryError, QueryResult};

pub struct Lexer {
    input: Vec<char>,
    position: usize,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Lexer {
            input: input.chars().collect(),
            position: 0,
        }
    }

    /// Get the next token from the input
    pub fn next_token(&mut self) -> QueryResult<Spanned> {
        self.skip_whitespace();

        let start = self.position;
        let Some(ch) = self.current_char() else {
            return Ok(Spanned {
                token: Token::Eof,
                position: start,
            });
        };

        let token = match ch {
            '-' => {
                self.advance();
                Token::Minus
            }
            '=' => {
                self.advance();
                // Accept `==` as well
                if self.current_char() == Some('=') {
                    self.advance();
                }
                Token::Equal
            }
            '<' => {
                self.advance();
                if self.current_char() == Some('=') {
                    self.advance();
                    Token::LessEqual
                } else if self.current_char() == Some('>') {
                    self.advance();
                    Token::NotEqual
                } else {
                    Token::Less
                }
            }
            '>' => {
                self.advance();
                if self.current_char() == Some('=') {
                    self.advance();
                    Token::GreaterEqual
                } else {
                    Token::Greater
                }
            }
            '!' => {
                self.advance();
                if self.current_char() == Some('=') {
                    self.advance();
                    Token::NotEqual
                } else {
                    return Err(self.error(start, "expected '=' after '!'"));
                }
            }
            '(' => {
                self.advance();
                Token::LeftParen
            }
            ')' => {
                self.advance();
                Token::RightParen
            }
            ',' => {
                self.advance();
                Token::Comma
            }
            '.' => {
                self.advance();
                Token::Dot
            }
            '\'' | '"' => self.read_string(ch)?,
            '`' => self.read_quoted_identifier()?,
            c if c.is_alphabetic() || c == '_' => self.read_identifier(),
            c if c.is_ascii_digit() => self.read_number(),
            c => return Err(self.error(start, format!("unexpected character '{}'", c))),
        };

        Ok(Spanned {
            token,
            position: start,
        })
    }

    fn current_char(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek(&self) -> Option<char> {
        self.input.get(self.position + 1).copied()
    }

    fn advance(&mut self) {
        self.position += 1;
    }

    fn error(&self, position: usize, message: impl Into<String>) -> QueryError {
        QueryError::Parse {
            position,
            message: message.into(),
        }
    }

    fn skip_whitespace(&mut self) {
        while self.current_char().is_some_and(char::is_whitespace) {
            self.advance();
        }
    }

    /// Read an identifier or keyword
    fn read_identifier(&mut self) -> Token {
        let mut identifier = String::new();

        while let Some(ch) = self.current_char() {
            if ch.is_alphanumeric() || ch == '_' {
                identifier.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        Token::keyword_from_str(&identifier).unwrap_or(Token::Identifier(identifier))
    }

    /// Read a backtick-quoted identifier, e.g. `` `order date` ``
    fn read_quoted_identifier(&mut self) -> QueryResult<Token> {
        let start = self.position;
        self.advance();
        let mut identifier = String::new();

        while let Some(ch) = self.current_char() {
            self.advance();
            if ch == '`' {
                return Ok(Token::Identifier(identifier));
            }
            identifier.push(ch);
        }

        Err(self.error(start, "unterminated quoted identifier"))
    }

    /// Read a string literal; a doubled quote escapes itself
    fn read_string(&mut self, quote: char) -> QueryResult<Token> {
        let start = self.position;
        self.advance();
        let mut string = String::new();

        while let Some(ch) = self.current_char() {
            if ch == quote {
                if self.peek() == Some(quote) {
                    string.push(quote);
                    self.advance();
                    self.advance();
                } else {
                    self.advance();
                    return Ok(Token::String(string));
                }
            } else {
                string.push(ch);
                self.advance();
            }
        }

        Err(self.error(start, "unterminated string literal"))
    }

    /// Read a number (integer or decimal)
    fn read_number(&mut self) -> Token {
        let mut number = String::new();
        let mut has_dot = false;

        while let Some(ch) = self.current_char() {
            if ch.is_ascii_digit() {
                number.push(ch);
                self.advance();
            } else if ch == '.' && !has_dot && self.peek().is_some_and(|c| c.is_ascii_digit()) {
                has_dot = true;
                number.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        Token::Number(number)
    }

    /// Tokenize the entire input, ending with `Eof`
    pub fn tokenize(&mut self) -> QueryResult<Vec<Spanned>> {
        let mut tokens = Vec::new();

        loop {
            let spanned = self.next_token()?;
            let done = spanned.token == Token::Eof;
            tokens.push(spanned);
            if done {
                return Ok(tokens);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(input: &str) -> Vec<Token> {
        Lexer::new(input)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|s| s.token)
            .collect()
    }

    #[test]
    fn test_basic_tokens() {
        assert_eq!(
            tokens("age > 30 and city = 'NY'"),
            vec![
                Token::Identifier("age".to_string()),
                Token::Greater,
                Token::Number("30".to_string()),
                Token::And,
                Token::Identifier("city".to_string()),
                Token::Equal,
                Token::String("NY".to_string()),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_operators() {
        assert_eq!(
            tokens("= == < > <= >= <> !="),
            vec![
                Token::Equal,
                Token::Equal,
                Token::Less,
                Token::Greater,
                Token::LessEqual,
                Token::GreaterEqual,
                Token::NotEqual,
                Token::NotEqual,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_string_literals() {
        assert_eq!(
            tokens(r#"'it''s' "say ""hi""""#),
            vec![
                Token::String("it's".to_string()),
                Token::String("say \"hi\"".to_string()),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_numbers_and_identifiers() {
        assert_eq!(
            tokens("-1.5 meta.created `first name`"),
            vec![
                Token::Minus,
                Token::Number("1.5".to_string()),
                Token::Meta,
                Token::Dot,
                Token::Identifier("created".to_string()),
                Token::Identifier("first name".to_string()),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_positions() {
        let spanned = Lexer::new("a  >= 1").tokenize().unwrap();
        let positions: Vec<usize> = spanned.iter().map(|s| s.position).collect();
        assert_eq!(positions, vec![0, 3, 6, 7]);
    }

    #[test]
    fn test_errors() {
        assert!(matches!(
            Lexer::new("city = 'NY").tokenize(),
            Err(QueryError::Parse { position: 7, .. })
        ));
        assert!(matches!(
            Lexer::new("a ! b").tokenize(),
            Err(QueryError::Parse { position: 2, .. })
        ));
        assert!(matches!(
            Lexer::new("a = #").tokenize(),
            Err(QueryError::Parse { position: 4, .. })
        ));
    }
}
