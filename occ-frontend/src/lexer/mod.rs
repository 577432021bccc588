//! C lexer
//!
//! Tokenizes C source fragments. Initializer bodies only need a small
//! slice of the language: literals, identifiers, punctuation and the
//! type keywords, so the scanner covers exactly that.

pub mod token;

pub use token::{Token, TokenType};

use occ_common::{CompilerError, SourceTracker};

/// Hand-written scanner over a source string
pub struct Lexer {
    chars: Vec<char>,
    pos: usize,
    tracker: SourceTracker,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
            tracker: SourceTracker::new("<input>"),
        }
    }

    /// Tokenize the whole input, ending with an EOF token
    pub fn tokenize(&mut self) -> Result<Vec<Token>, CompilerError> {
        let mut tokens = Vec::new();

        loop {
            self.skip_whitespace();
            if self.at_end() {
                tokens.push(Token::eof(self.tracker.location()));
                return Ok(tokens);
            }

            tokens.push(self.next_token()?);
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn current(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn lookahead(&self) -> Option<char> {
        self.chars.get(self.pos + 1).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.current()?;
        self.pos += 1;
        self.tracker.advance(ch);
        Some(ch)
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.current() {
            if ch.is_whitespace() {
                self.bump();
            } else if ch == '/' && self.lookahead() == Some('/') {
                while let Some(c) = self.current() {
                    if c == '\n' {
                        break;
                    }
                    self.bump();
                }
            } else if ch == '/' && self.lookahead() == Some('*') {
                self.bump();
                self.bump();
                while let Some(c) = self.bump() {
                    if c == '*' && self.current() == Some('/') {
                        self.bump();
                        break;
                    }
                }
            } else {
                break;
            }
        }
    }

    fn next_token(&mut self) -> Result<Token, CompilerError> {
        let start = self.tracker.location();
        let ch = match self.current() {
            Some(ch) => ch,
            None => return Ok(Token::eof(start)),
        };

        let token_type = if ch.is_ascii_digit() {
            self.scan_number()?
        } else if ch.is_alphabetic() || ch == '_' {
            self.scan_identifier()
        } else if ch == '\'' {
            self.scan_char_literal()?
        } else if ch == '"' {
            self.scan_string_literal()?
        } else {
            self.scan_punctuator()?
        };

        Ok(Token::new(token_type, self.tracker.span_from(start)))
    }

    fn scan_number(&mut self) -> Result<TokenType, CompilerError> {
        let start = self.tracker.location();
        let mut text = String::new();

        // Hex and octal prefixes
        let radix = if self.current() == Some('0')
            && matches!(self.lookahead(), Some('x') | Some('X'))
        {
            self.bump();
            self.bump();
            16
        } else if self.current() == Some('0') && matches!(self.lookahead(), Some('0'..='7')) {
            self.bump();
            8
        } else {
            10
        };

        while let Some(ch) = self.current() {
            if ch.is_ascii_hexdigit() && (radix == 16 || ch.is_ascii_digit()) {
                text.push(ch);
                self.bump();
            } else {
                break;
            }
        }

        // Integer suffixes are accepted and ignored
        while matches!(self.current(), Some('u') | Some('U') | Some('l') | Some('L')) {
            self.bump();
        }

        let value = i64::from_str_radix(&text, radix).map_err(|_| {
            CompilerError::lexer_error(format!("Invalid integer literal '{text}'"), start)
        })?;

        Ok(TokenType::IntLiteral(value))
    }

    fn scan_identifier(&mut self) -> TokenType {
        let mut text = String::new();
        while let Some(ch) = self.current() {
            if ch.is_alphanumeric() || ch == '_' {
                text.push(ch);
                self.bump();
            } else {
                break;
            }
        }

        match text.as_str() {
            "char" => TokenType::Char,
            "const" => TokenType::Const,
            "double" => TokenType::Double,
            "enum" => TokenType::Enum,
            "extern" => TokenType::Extern,
            "float" => TokenType::Float,
            "int" => TokenType::Int,
            "long" => TokenType::Long,
            "short" => TokenType::Short,
            "signed" => TokenType::Signed,
            "static" => TokenType::Static,
            "struct" => TokenType::Struct,
            "union" => TokenType::Union,
            "unsigned" => TokenType::Unsigned,
            "void" => TokenType::Void,
            "volatile" => TokenType::Volatile,
            _ => TokenType::Identifier(text),
        }
    }

    fn scan_escape(&mut self) -> Result<u8, CompilerError> {
        let start = self.tracker.location();
        match self.bump() {
            Some('n') => Ok(b'\n'),
            Some('t') => Ok(b'\t'),
            Some('r') => Ok(b'\r'),
            Some('0') => Ok(0),
            Some('\\') => Ok(b'\\'),
            Some('\'') => Ok(b'\''),
            Some('"') => Ok(b'"'),
            Some('x') => {
                let mut value: u32 = 0;
                while let Some(ch) = self.current() {
                    if let Some(d) = ch.to_digit(16) {
                        value = value * 16 + d;
                        self.bump();
                    } else {
                        break;
                    }
                }
                Ok(value as u8)
            }
            other => Err(CompilerError::lexer_error(
                format!("Unknown escape sequence '\\{}'", other.unwrap_or(' ')),
                start,
            )),
        }
    }

    fn scan_char_literal(&mut self) -> Result<TokenType, CompilerError> {
        let start = self.tracker.location();
        self.bump(); // opening quote

        let value = match self.bump() {
            Some('\\') => self.scan_escape()?,
            Some(ch) => ch as u8,
            None => {
                return Err(CompilerError::lexer_error(
                    "Unterminated character literal".to_string(),
                    start,
                ))
            }
        };

        if self.bump() != Some('\'') {
            return Err(CompilerError::lexer_error(
                "Unterminated character literal".to_string(),
                start,
            ));
        }

        Ok(TokenType::CharLiteral(value))
    }

    fn scan_string_literal(&mut self) -> Result<TokenType, CompilerError> {
        let start = self.tracker.location();
        self.bump(); // opening quote

        let mut text = String::new();
        loop {
            match self.bump() {
                Some('"') => break,
                Some('\\') => text.push(self.scan_escape()? as char),
                Some(ch) => text.push(ch),
                None => {
                    return Err(CompilerError::lexer_error(
                        "Unterminated string literal".to_string(),
                        start,
                    ))
                }
            }
        }

        Ok(TokenType::StringLiteral(text))
    }

    fn scan_punctuator(&mut self) -> Result<TokenType, CompilerError> {
        let start = self.tracker.location();
        let ch = self.bump().unwrap_or('\0');
        match ch {
            '+' => Ok(TokenType::Plus),
            '-' => Ok(TokenType::Minus),
            '*' => Ok(TokenType::Star),
            '/' => Ok(TokenType::Slash),
            '%' => Ok(TokenType::Percent),
            '&' => Ok(TokenType::Ampersand),
            '=' => Ok(TokenType::Equal),
            '(' => Ok(TokenType::LeftParen),
            ')' => Ok(TokenType::RightParen),
            '{' => Ok(TokenType::LeftBrace),
            '}' => Ok(TokenType::RightBrace),
            '[' => Ok(TokenType::LeftBracket),
            ']' => Ok(TokenType::RightBracket),
            ';' => Ok(TokenType::Semicolon),
            ',' => Ok(TokenType::Comma),
            '.' => Ok(TokenType::Dot),
            _ => Err(CompilerError::lexer_error(
                format!("Unexpected character '{ch}'"),
                start,
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token_types(source: &str) -> Vec<TokenType> {
        let mut lexer = Lexer::new(source);
        lexer
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.token_type)
            .collect()
    }

    #[test]
    fn test_tokenize_initializer_list() {
        let tokens = token_types("{1, 2, 3}");
        assert_eq!(
            tokens,
            vec![
                TokenType::LeftBrace,
                TokenType::IntLiteral(1),
                TokenType::Comma,
                TokenType::IntLiteral(2),
                TokenType::Comma,
                TokenType::IntLiteral(3),
                TokenType::RightBrace,
                TokenType::EndOfFile,
            ]
        );
    }

    #[test]
    fn test_tokenize_designators() {
        let tokens = token_types("{.x = 1, [2] = 3}");
        assert_eq!(
            tokens,
            vec![
                TokenType::LeftBrace,
                TokenType::Dot,
                TokenType::Identifier("x".to_string()),
                TokenType::Equal,
                TokenType::IntLiteral(1),
                TokenType::Comma,
                TokenType::LeftBracket,
                TokenType::IntLiteral(2),
                TokenType::RightBracket,
                TokenType::Equal,
                TokenType::IntLiteral(3),
                TokenType::RightBrace,
                TokenType::EndOfFile,
            ]
        );
    }

    #[test]
    fn test_tokenize_string_and_char() {
        let tokens = token_types(r#""Hi" 'a' '\n'"#);
        assert_eq!(
            tokens,
            vec![
                TokenType::StringLiteral("Hi".to_string()),
                TokenType::CharLiteral(b'a'),
                TokenType::CharLiteral(b'\n'),
                TokenType::EndOfFile,
            ]
        );
    }

    #[test]
    fn test_tokenize_hex_and_octal() {
        let tokens = token_types("0x10 010 0");
        assert_eq!(
            tokens,
            vec![
                TokenType::IntLiteral(16),
                TokenType::IntLiteral(8),
                TokenType::IntLiteral(0),
                TokenType::EndOfFile,
            ]
        );
    }

    #[test]
    fn test_comments_are_skipped() {
        let tokens = token_types("1 /* two */ , // three\n 3");
        assert_eq!(
            tokens,
            vec![
                TokenType::IntLiteral(1),
                TokenType::Comma,
                TokenType::IntLiteral(3),
                TokenType::EndOfFile,
            ]
        );
    }

    #[test]
    fn test_unterminated_string() {
        let mut lexer = Lexer::new("\"abc");
        assert!(lexer.tokenize().is_err());
    }
}
