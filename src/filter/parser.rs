// Filter parser - converts filter text into predicate trees

use super::lexer::Lexer;
use super::token::{Spanned, Token};
use crate::error::{QueryError, QueryResult};
use crate::expression::{Comparison, Leaf, LogicalOperator, Mode, Node};
use crate::value::Value;

/// Parse filter text such as `age > 30 and (city = 'NY' or city = 'LA')`.
///
/// Grammar, lowest precedence first:
///
/// ```text
/// or         := and ("or" and)*
/// and        := not ("and" not)*
/// not        := "not" not | primary
/// primary    := "(" or ")" | "true" | "false" | comparison
/// comparison := target op literal
///             | target ["not"] "in" "(" [literal ("," literal)*] ")"
///             | target ["not"] "like" string
/// target     := "key" | "meta" "." ident | ident
/// ```
///
/// Chains of the same operator become one n-ary group.
pub fn parse_filter(text: &str) -> QueryResult<Node> {
    Parser::new(text)?.parse()
}

pub struct Parser {
    tokens: Vec<Spanned>,
    position: usize,
}

impl Parser {
    pub fn new(text: &str) -> QueryResult<Self> {
        let tokens = Lexer::new(text).tokenize()?;
        Ok(Parser {
            tokens,
            position: 0,
        })
    }

    /// Parse the whole input as one filter
    pub fn parse(&mut self) -> QueryResult<Node> {
        let node = self.parse_or()?;
        if !self.match_token(&Token::Eof) {
            return Err(self.error(format!(
                "unexpected {:?} after filter",
                self.current_token()
            )));
        }
        Ok(node)
    }

    fn parse_or(&mut self) -> QueryResult<Node> {
        self.parse_chain(Token::Or, LogicalOperator::Or, Self::parse_and)
    }

    fn parse_and(&mut self) -> QueryResult<Node> {
        self.parse_chain(Token::And, LogicalOperator::And, Self::parse_not)
    }

    fn parse_chain(
        &mut self,
        separator: Token,
        operator: LogicalOperator,
        operand: fn(&mut Self) -> QueryResult<Node>,
    ) -> QueryResult<Node> {
        let mut children = vec![operand(self)?];

        while self.match_token(&separator) {
            self.advance();
            children.push(operand(self)?);
        }

        Ok(if children.len() == 1 {
            children.remove(0)
        } else {
            Node::group(operator, children)
        })
    }

    fn parse_not(&mut self) -> QueryResult<Node> {
        if self.match_token(&Token::Not) {
            self.advance();
            Ok(self.parse_not()?.negate())
        } else {
            self.parse_primary()
        }
    }

    fn parse_primary(&mut self) -> QueryResult<Node> {
        match self.current_token() {
            Token::LeftParen => {
                self.advance();
                let node = self.parse_or()?;
                self.expect_token(Token::RightParen)?;
                Ok(node)
            }
            Token::True => {
                self.advance();
                Ok(Node::constant(true))
            }
            Token::False => {
                self.advance();
                Ok(Node::constant(false))
            }
            _ => self.parse_comparison(),
        }
    }

    fn parse_comparison(&mut self) -> QueryResult<Node> {
        let (mode, property) = self.parse_target()?;

        let negated = if self.match_token(&Token::Not) {
            self.advance();
            true
        } else {
            false
        };

        let leaf = match self.current_token() {
            Token::In => {
                self.advance();
                Leaf::with_values(mode, property, self.parse_literal_list()?)
            }
            Token::Like => {
                self.advance();
                let pattern = match self.current_token() {
                    Token::String(pattern) => pattern,
                    other => return Err(self.error(format!("expected pattern, found {:?}", other))),
                };
                self.advance();
                Leaf::new(mode, Comparison::Like, property, Value::String(pattern))
            }
            _ if negated => return Err(self.error("expected 'in' or 'like' after 'not'")),
            token => {
                let comparison = match token {
                    Token::Equal => Comparison::Equal,
                    Token::NotEqual => Comparison::NotEqual,
                    Token::Less => Comparison::LessThan,
                    Token::Greater => Comparison::GreaterThan,
                    Token::LessEqual => Comparison::LessThanOrEqualTo,
                    Token::GreaterEqual => Comparison::GreaterThanOrEqualTo,
                    other => {
                        return Err(
                            self.error(format!("expected comparison operator, found {:?}", other))
                        )
                    }
                };
                self.advance();
                Leaf::new(mode, comparison, property, self.parse_literal()?)
            }
        };

        Ok(Node::leaf(leaf).with_negation(negated))
    }

    fn parse_target(&mut self) -> QueryResult<(Mode, Option<String>)> {
        match self.current_token() {
            Token::Key => {
                self.advance();
                Ok((Mode::Key, None))
            }
            Token::Meta => {
                self.advance();
                self.expect_token(Token::Dot)?;
                Ok((Mode::Meta, Some(self.expect_identifier()?)))
            }
            Token::Identifier(name) => {
                self.advance();
                Ok((Mode::Value, Some(name)))
            }
            other => Err(self.error(format!("expected property, found {:?}", other))),
        }
    }

    fn parse_literal_list(&mut self) -> QueryResult<Vec<Value>> {
        self.expect_token(Token::LeftParen)?;
        let mut values = Vec::new();

        if !self.match_token(&Token::RightParen) {
            values.push(self.parse_literal()?);
            while self.match_token(&Token::Comma) {
                self.advance();
                values.push(self.parse_literal()?);
            }
        }

        self.expect_token(Token::RightParen)?;
        Ok(values)
    }

    fn parse_literal(&mut self) -> QueryResult<Value> {
        let value = match self.current_token() {
            Token::String(s) => Value::String(s),
            Token::True => Value::Boolean(true),
            Token::False => Value::Boolean(false),
            Token::Number(n) => self.parse_number(&n, false)?,
            Token::Minus => {
                self.advance();
                match self.current_token() {
                    Token::Number(n) => self.parse_number(&n, true)?,
                    other => {
                        return Err(self.error(format!("expected number after '-', found {:?}", other)))
                    }
                }
            }
            other => return Err(self.error(format!("expected literal, found {:?}", other))),
        };
        self.advance();
        Ok(value)
    }

    /// Integers become `Int64`, or `UInt64` when they only fit unsigned;
    /// decimals become `Float64`
    fn parse_number(&self, digits: &str, negative: bool) -> QueryResult<Value> {
        if digits.contains('.') {
            let value: f64 = digits
                .parse()
                .map_err(|_| self.error(format!("invalid number '{}'", digits)))?;
            return Ok(Value::Float64(if negative { -value } else { value }));
        }

        let text = if negative {
            format!("-{}", digits)
        } else {
            digits.to_string()
        };
        if let Ok(value) = text.parse::<i64>() {
            return Ok(Value::Int64(value));
        }
        match (negative, digits.parse::<u64>()) {
            (false, Ok(value)) => Ok(Value::UInt64(value)),
            _ => Err(self.error(format!("integer '{}' out of range", text))),
        }
    }

    // Helper methods

    fn current_token(&self) -> Token {
        self.tokens
            .get(self.position)
            .map(|s| s.token.clone())
            .unwrap_or(Token::Eof)
    }

    fn current_position(&self) -> usize {
        self.tokens
            .get(self.position)
            .or(self.tokens.last())
            .map_or(0, |s| s.position)
    }

    fn advance(&mut self) {
        if self.position + 1 < self.tokens.len() {
            self.position += 1;
        }
    }

    fn match_token(&self, token: &Token) -> bool {
        self.current_token() == *token
    }

    fn expect_token(&mut self, token: Token) -> QueryResult<()> {
        if self.current_token() == token {
            self.advance();
            Ok(())
        } else {
            Err(self.error(format!(
                "expected {:?}, found {:?}",
                token,
                self.current_token()
            )))
        }
    }

    fn expect_identifier(&mut self) -> QueryResult<String> {
        match self.current_token() {
            Token::Identifier(name) => {
                self.advance();
                Ok(name)
            }
            other => Err(self.error(format!("expected identifier, found {:?}", other))),
        }
    }

    fn error(&self, message: impl Into<String>) -> QueryError {
        QueryError::Parse {
            position: self.current_position(),
            message: message.into(),
        }
    }
}
