use crate::symbolic::symbolic_engine::Expr;
use std::fmt;
/// a module turns a String expression into a symbolic expression
///# Example
/// ```
/// use RustedPurifier::symbolic::symbolic_engine::Expr;
/// let input = "3*y+2*sin(x)-3*x**2+2*x*y";
/// let parsed_expression = Expr::parse_expression(input).unwrap();
/// println!(" parsed_expression {}", parsed_expression);
/// ```
///
/// The grammar, lowest precedence first:
///
///   expression := term (('+'|'-') term)*
///   term       := factor (('*'|'/') factor)*
///   factor     := ('-'|'+') factor | power
///   power      := atom (('**'|'^') factor)?
///   atom       := number | ident | ident '(' expression ')' | '(' expression ')'
///
/// Power is right-associative and binds tighter than unary minus, so `-x**2`
/// parses as `-(x**2)` and `x**-2` as `x**(-2)`. Numbers accept decimal and
/// scientific notation. `^` is accepted as a synonym for `**`.

/// Errors produced while turning equation text into an expression tree.
/// Positions are character offsets into the input string.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseError {
    EmptyExpression,
    InvalidNumber { text: String, position: usize },
    UnexpectedCharacter { character: char, position: usize },
    UnexpectedToken { token: String, position: usize },
    UnexpectedEnd,
    UnknownFunction { name: String, position: usize },
    UnbalancedParenthesis { position: usize },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ParseError::EmptyExpression => write!(f, "Empty expression"),
            ParseError::InvalidNumber { text, position } => {
                write!(f, "Invalid number '{}' at position {}", text, position)
            }
            ParseError::UnexpectedCharacter {
                character,
                position,
            } => write!(
                f,
                "Unexpected character '{}' at position {}",
                character, position
            ),
            ParseError::UnexpectedToken { token, position } => {
                write!(f, "Unexpected token '{}' at position {}", token, position)
            }
            ParseError::UnexpectedEnd => write!(f, "Unexpected end of expression"),
            ParseError::UnknownFunction { name, position } => {
                write!(f, "Unknown function '{}' at position {}", name, position)
            }
            ParseError::UnbalancedParenthesis { position } => {
                write!(f, "Unbalanced parenthesis opened at position {}", position)
            }
        }
    }
}

impl std::error::Error for ParseError {}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Power,
    LParen,
    RParen,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Token::Number(val) => write!(f, "{}", val),
            Token::Ident(name) => write!(f, "{}", name),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::Star => write!(f, "*"),
            Token::Slash => write!(f, "/"),
            Token::Power => write!(f, "**"),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
        }
    }
}

fn tokenize(input: &str) -> Result<Vec<(Token, usize)>, ParseError> {
    let bytes: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i];
        match c {
            ' ' | '\t' | '\n' | '\r' => {
                i += 1;
            }
            '+' => {
                tokens.push((Token::Plus, i));
                i += 1;
            }
            '-' => {
                tokens.push((Token::Minus, i));
                i += 1;
            }
            '*' => {
                if i + 1 < bytes.len() && bytes[i + 1] == '*' {
                    tokens.push((Token::Power, i));
                    i += 2;
                } else {
                    tokens.push((Token::Star, i));
                    i += 1;
                }
            }
            '^' => {
                tokens.push((Token::Power, i));
                i += 1;
            }
            '/' => {
                tokens.push((Token::Slash, i));
                i += 1;
            }
            '(' => {
                tokens.push((Token::LParen, i));
                i += 1;
            }
            ')' => {
                tokens.push((Token::RParen, i));
                i += 1;
            }
            '0'..='9' | '.' => {
                let start = i;
                while i < bytes.len() && (bytes[i].is_ascii_digit() || bytes[i] == '.') {
                    i += 1;
                }
                // scientific notation: the exponent marker belongs to the number only
                // when followed by a digit or a signed digit
                if i < bytes.len() && (bytes[i] == 'e' || bytes[i] == 'E') {
                    let mut j = i + 1;
                    if j < bytes.len() && (bytes[j] == '+' || bytes[j] == '-') {
                        j += 1;
                    }
                    if j < bytes.len() && bytes[j].is_ascii_digit() {
                        i = j;
                        while i < bytes.len() && bytes[i].is_ascii_digit() {
                            i += 1;
                        }
                    }
                }
                let text: String = bytes[start..i].iter().collect();
                let value = text.parse::<f64>().map_err(|_| ParseError::InvalidNumber {
                    text: text.clone(),
                    position: start,
                })?;
                tokens.push((Token::Number(value), start));
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let start = i;
                while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == '_') {
                    i += 1;
                }
                let name: String = bytes[start..i].iter().collect();
                tokens.push((Token::Ident(name), start));
            }
            other => {
                return Err(ParseError::UnexpectedCharacter {
                    character: other,
                    position: i,
                });
            }
        }
    }
    Ok(tokens)
}

struct Parser {
    tokens: Vec<(Token, usize)>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(t, _)| t)
    }

    fn peek_position(&self) -> Option<usize> {
        self.tokens.get(self.pos).map(|(_, p)| *p)
    }

    fn advance(&mut self) -> Option<(Token, usize)> {
        let item = self.tokens.get(self.pos).cloned();
        if item.is_some() {
            self.pos += 1;
        }
        item
    }

    fn parse_expression(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_term()?;
        while let Some(op) = self.peek() {
            match op {
                Token::Plus => {
                    self.advance();
                    let rhs = self.parse_term()?;
                    expr = Expr::Add(expr.boxed(), rhs.boxed());
                }
                Token::Minus => {
                    self.advance();
                    let rhs = self.parse_term()?;
                    expr = Expr::Sub(expr.boxed(), rhs.boxed());
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    fn parse_term(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_factor()?;
        while let Some(op) = self.peek() {
            match op {
                Token::Star => {
                    self.advance();
                    let rhs = self.parse_factor()?;
                    expr = Expr::Mul(expr.boxed(), rhs.boxed());
                }
                Token::Slash => {
                    self.advance();
                    let rhs = self.parse_factor()?;
                    expr = Expr::Div(expr.boxed(), rhs.boxed());
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    fn parse_factor(&mut self) -> Result<Expr, ParseError> {
        match self.peek() {
            Some(Token::Minus) => {
                self.advance();
                let inner = self.parse_factor()?;
                // fold the sign into a literal so "-3*x" carries coefficient -3
                match inner {
                    Expr::Const(val) => Ok(Expr::Const(-val)),
                    other => Ok(Expr::Mul(Expr::Const(-1.0).boxed(), other.boxed())),
                }
            }
            Some(Token::Plus) => {
                self.advance();
                self.parse_factor()
            }
            _ => self.parse_power(),
        }
    }

    fn parse_power(&mut self) -> Result<Expr, ParseError> {
        let base = self.parse_atom()?;
        if let Some(Token::Power) = self.peek() {
            self.advance();
            let exp = self.parse_factor()?;
            return Ok(Expr::Pow(base.boxed(), exp.boxed()));
        }
        Ok(base)
    }

    fn parse_atom(&mut self) -> Result<Expr, ParseError> {
        let (token, position) = self.advance().ok_or(ParseError::UnexpectedEnd)?;
        match token {
            Token::Number(val) => Ok(Expr::Const(val)),
            Token::Ident(name) => {
                if let Some(Token::LParen) = self.peek() {
                    let paren_position = self.peek_position().unwrap_or(position);
                    self.advance();
                    let arg = self.parse_expression()?;
                    match self.advance() {
                        Some((Token::RParen, _)) => {}
                        _ => {
                            return Err(ParseError::UnbalancedParenthesis {
                                position: paren_position,
                            });
                        }
                    }
                    make_function(&name, position, arg)
                } else {
                    Ok(Expr::Var(name))
                }
            }
            Token::LParen => {
                let inner = self.parse_expression()?;
                match self.advance() {
                    Some((Token::RParen, _)) => Ok(inner),
                    _ => Err(ParseError::UnbalancedParenthesis { position }),
                }
            }
            other => Err(ParseError::UnexpectedToken {
                token: other.to_string(),
                position,
            }),
        }
    }
}

fn make_function(name: &str, position: usize, arg: Expr) -> Result<Expr, ParseError> {
    match name {
        "exp" => Ok(Expr::Exp(arg.boxed())),
        "ln" | "log" => Ok(Expr::Ln(arg.boxed())),
        "sin" => Ok(Expr::sin(arg.boxed())),
        "cos" => Ok(Expr::cos(arg.boxed())),
        "tg" | "tan" => Ok(Expr::tg(arg.boxed())),
        "ctg" | "cot" => Ok(Expr::ctg(arg.boxed())),
        _ => Err(ParseError::UnknownFunction {
            name: name.to_string(),
            position,
        }),
    }
}

pub fn parse_expression_func(input: &str) -> Result<Expr, ParseError> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Err(ParseError::EmptyExpression);
    }
    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.parse_expression()?;
    if let Some((token, position)) = parser.advance() {
        return Err(ParseError::UnexpectedToken {
            token: token.to_string(),
            position,
        });
    }
    Ok(expr)
}

impl Expr {
    /// Parses an infix equation string into a symbolic expression.
    ///
    /// # Examples
    /// ```rust, ignore
    /// let expr = Expr::parse_expression("x**2 + 2*x + 1").unwrap();
    /// ```
    pub fn parse_expression(input: &str) -> Result<Expr, ParseError> {
        parse_expression_func(input)
    }
}
