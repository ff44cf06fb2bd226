// Filter tokens for lexical analysis

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Literals
    Identifier(String),
    Number(String),
    String(String),

    // Keywords
    And,
    Or,
    Not,
    In,
    Like,
    True,
    False,
    Key,
    Meta,

    // Operators
    Minus,
    Equal,
    NotEqual,
    Less,
    Greater,
    LessEqual,
    GreaterEqual,

    // Delimiters
    LeftParen,
    RightParen,
    Comma,
    Dot,

    Eof,
}

impl Token {
    /// Convert a word to its keyword token, case-insensitively
    pub fn keyword_from_str(s: &str) -> Option<Token> {
        match s.to_uppercase().as_str() {
            "AND" => Some(Token::And),
            "OR" => Some(Token::Or),
            "NOT" => Some(Token::Not),
            "IN" => Some(Token::In),
            "LIKE" => Some(Token::Like),
            "TRUE" => Some(Token::True),
            "FALSE" => Some(Token::False),
            "KEY" => Some(Token::Key),
            "META" => Some(Token::Meta),
            _ => None,
        }
    }

    pub fn is_keyword(&self) -> bool {
        matches!(
            self,
            Token::And
                | Token::Or
                | Token::Not
                | Token::In
                | Token::Like
                | Token::True
                | Token::False
                | Token::Key
                | Token::Meta
        )
    }
}

/// A token and the character offset it starts at
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub position: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keywords_ignore_case() {
        assert_eq!(Token::keyword_from_str("and"), Some(Token::And));
        assert_eq!(Token::keyword_from_str("LiKe"), Some(Token::Like));
        assert_eq!(Token::keyword_from_str("city"), None);
        assert!(Token::Meta.is_keyword());
        assert!(!Token::Comma.is_keyword());
    }
}
