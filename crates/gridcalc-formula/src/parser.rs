use crate::builder::ExprBuilder;
use crate::error::FormulaError;
use crate::lexer::Token;

/// Recursive-descent parser for the formula grammar.
///
/// The parser builds nothing itself: it drives an [`ExprBuilder`] with
/// value and operator events in postfix order, so the builder interface
/// stays the only contract between parsing and the expression model.
///
/// Grammar, loosest-binding first:
///
/// ```text
/// comparison     -> additive ((= | <> | < | <= | > | >=) additive)*
/// additive       -> multiplicative ((+ | -) multiplicative)*
/// multiplicative -> power ((* | /) power)*
/// power          -> unary (^ power)?          (right-associative)
/// unary          -> - unary | primary
/// primary        -> number | string | reference | ( comparison )
/// ```
pub struct Parser<'a, B: ExprBuilder> {
    tokens: Vec<Token>,
    position: usize,
    builder: &'a mut B,
}

impl<'a, B: ExprBuilder> Parser<'a, B> {
    pub fn new(tokens: Vec<Token>, builder: &'a mut B) -> Self {
        Self {
            tokens,
            position: 0,
            builder,
        }
    }

    /// Parse the whole token stream, emitting builder events.
    pub fn parse(mut self) -> Result<(), FormulaError> {
        self.parse_comparison()?;

        if !self.is_at_end() {
            return Err(self.unexpected());
        }
        Ok(())
    }

    fn peek(&self) -> &Token {
        self.tokens.get(self.position).unwrap_or(&Token::Eof)
    }

    fn advance(&mut self) {
        if !self.is_at_end() {
            self.position += 1;
        }
    }

    fn is_at_end(&self) -> bool {
        matches!(self.peek(), Token::Eof)
    }

    fn unexpected(&self) -> FormulaError {
        FormulaError::UnexpectedToken(format!("{:?}", self.peek()))
    }

    fn parse_comparison(&mut self) -> Result<(), FormulaError> {
        self.parse_additive()?;

        loop {
            match self.peek() {
                Token::Equal => {
                    self.advance();
                    self.parse_additive()?;
                    self.builder.op_eq()?;
                }
                Token::NotEqual => {
                    self.advance();
                    self.parse_additive()?;
                    self.builder.op_ne()?;
                }
                Token::LessThan => {
                    self.advance();
                    self.parse_additive()?;
                    self.builder.op_lt()?;
                }
                Token::LessEqual => {
                    self.advance();
                    self.parse_additive()?;
                    self.builder.op_le()?;
                }
                Token::GreaterThan => {
                    self.advance();
                    self.parse_additive()?;
                    self.builder.op_gt()?;
                }
                Token::GreaterEqual => {
                    self.advance();
                    self.parse_additive()?;
                    self.builder.op_ge()?;
                }
                _ => break,
            }
        }

        Ok(())
    }

    fn parse_additive(&mut self) -> Result<(), FormulaError> {
        self.parse_multiplicative()?;

        loop {
            match self.peek() {
                Token::Plus => {
                    self.advance();
                    self.parse_multiplicative()?;
                    self.builder.op_add()?;
                }
                Token::Minus => {
                    self.advance();
                    self.parse_multiplicative()?;
                    self.builder.op_sub()?;
                }
                _ => break,
            }
        }

        Ok(())
    }

    fn parse_multiplicative(&mut self) -> Result<(), FormulaError> {
        self.parse_power()?;

        loop {
            match self.peek() {
                Token::Multiply => {
                    self.advance();
                    self.parse_power()?;
                    self.builder.op_mul()?;
                }
                Token::Divide => {
                    self.advance();
                    self.parse_power()?;
                    self.builder.op_div()?;
                }
                _ => break,
            }
        }

        Ok(())
    }

    fn parse_power(&mut self) -> Result<(), FormulaError> {
        self.parse_unary()?;

        if matches!(self.peek(), Token::Power) {
            self.advance();
            // Right-associative: recurse instead of looping
            self.parse_power()?;
            self.builder.op_pow()?;
        }

        Ok(())
    }

    fn parse_unary(&mut self) -> Result<(), FormulaError> {
        if matches!(self.peek(), Token::Minus) {
            self.advance();
            self.parse_unary()?;
            self.builder.op_neg()?;
            Ok(())
        } else {
            self.parse_primary()
        }
    }

    fn parse_primary(&mut self) -> Result<(), FormulaError> {
        match self.peek().clone() {
            Token::Number(n) => {
                self.advance();
                self.builder.val_number(n);
                Ok(())
            }
            Token::String(s) => {
                self.advance();
                self.builder.val_string(s);
                Ok(())
            }
            Token::CellRef(text) => {
                self.advance();
                self.builder.val_reference(&text)
            }
            Token::LeftParen => {
                self.advance();
                self.parse_comparison()?;
                if !matches!(self.peek(), Token::RightParen) {
                    return Err(self.unexpected());
                }
                self.advance();
                Ok(())
            }
            _ => Err(self.unexpected()),
        }
    }
}
