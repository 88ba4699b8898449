use crate::error::{OdeError, Result};
use crate::expression::{BinaryOp, Expr};

/// A parsed derivative equation `y^(order) = rhs`.
#[derive(Debug, Clone, PartialEq)]
pub struct Equation {
    pub order: usize,
    pub rhs: Expr,
}

/// Parses `y'''=...` into its order and right-hand side.
///
/// The left-hand side must be optional whitespace, `y`, any number of `'`
/// marks, optional whitespace, then `=`. Initial conditions share the same
/// grammar.
pub fn parse_equation(input: &str) -> Result<Equation> {
    let malformed = |reason: String| OdeError::MalformedEquation {
        input: input.to_string(),
        reason,
    };

    let (order, rhs_text) = split_lhs(input).map_err(malformed)?;
    let rhs = parse_expression(rhs_text).map_err(malformed)?;
    Ok(Equation { order, rhs })
}

fn split_lhs(input: &str) -> std::result::Result<(usize, &str), String> {
    let rest = input.trim_start();
    let rest = rest.strip_prefix('y').ok_or_else(|| {
        "left-hand side must be a derivative of y, e.g. y''=".to_string()
    })?;
    let order = rest.chars().take_while(|&c| c == '\'').count();
    let rest = rest[order..].trim_start();
    let rhs = rest
        .strip_prefix('=')
        .ok_or_else(|| "expected '=' after the left-hand side".to_string())?;
    Ok((order, rhs))
}

// --- Right-hand side parser ---

/// Deepest expression tree, or deepest grouping/negation nesting, the parser
/// accepts. Evaluation and drop both recurse once per tree level.
pub const MAX_DEPTH: usize = 256;

/// Parses a right-hand side into an expression tree.
pub fn parse_expression(input: &str) -> std::result::Result<Expr, String> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Err("right-hand side is empty".to_string());
    }
    let mut parser = Parser {
        tokens,
        pos: 0,
        nesting: 0,
    };
    let (expr, _) = parser.parse_expression()?;
    if let Some(token) = parser.peek() {
        return Err(format!("unexpected trailing {}", token.describe()));
    }
    Ok(expr)
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Time,
    /// `y` followed by this many `'` marks.
    State(usize),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Number(n) => format!("number {}", n),
            Token::Time => "'t'".to_string(),
            Token::State(k) => format!("'y{}'", "'".repeat(*k)),
            Token::Plus => "'+'".to_string(),
            Token::Minus => "'-'".to_string(),
            Token::Star => "'*'".to_string(),
            Token::Slash => "'/'".to_string(),
            Token::LParen => "'('".to_string(),
            Token::RParen => "')'".to_string(),
        }
    }
}

fn tokenize(input: &str) -> std::result::Result<Vec<Token>, String> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
        } else if c.is_ascii_digit() || c == '.' {
            let mut num_str = String::new();
            while let Some(&d) = chars.peek() {
                if d.is_ascii_digit() || d == '.' {
                    num_str.push(d);
                    chars.next();
                } else {
                    break;
                }
            }
            // Exponent suffix: 1e-3, 2.5E+4
            if let Some(&e) = chars.peek() {
                if e == 'e' || e == 'E' {
                    num_str.push(e);
                    chars.next();
                    if let Some(&sign) = chars.peek() {
                        if sign == '+' || sign == '-' {
                            num_str.push(sign);
                            chars.next();
                        }
                    }
                    while let Some(&d) = chars.peek() {
                        if d.is_ascii_digit() {
                            num_str.push(d);
                            chars.next();
                        } else {
                            break;
                        }
                    }
                }
            }
            let value = num_str
                .parse::<f64>()
                .map_err(|_| format!("invalid number '{}'", num_str))?;
            tokens.push(Token::Number(value));
        } else if c.is_alphabetic() {
            let mut ident = String::new();
            while let Some(&d) = chars.peek() {
                if d.is_alphanumeric() || d == '_' {
                    ident.push(d);
                    chars.next();
                } else {
                    break;
                }
            }
            match ident.as_str() {
                "t" => tokens.push(Token::Time),
                "y" => {
                    let mut order = 0;
                    while let Some('\'') = chars.peek() {
                        order += 1;
                        chars.next();
                    }
                    tokens.push(Token::State(order));
                }
                _ => return Err(format!("unknown symbol '{}'", ident)),
            }
        } else {
            let token = match c {
                '+' => Token::Plus,
                '-' => Token::Minus,
                '*' => Token::Star,
                '/' => Token::Slash,
                '(' => Token::LParen,
                ')' => Token::RParen,
                '\'' => return Err("derivative mark without a preceding 'y'".to_string()),
                _ => return Err(format!("unexpected character '{}'", c)),
            };
            tokens.push(token);
            chars.next();
        }
    }
    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    /// Open groupings and pending negations on the current descent.
    nesting: usize,
}

/// A parsed subtree paired with its depth.
type Node = (Expr, usize);

fn too_deep() -> String {
    format!("expression nested too deeply (limit {})", MAX_DEPTH)
}

fn join(left: Node, op: BinaryOp, right: Node) -> std::result::Result<Node, String> {
    let depth = 1 + left.1.max(right.1);
    if depth > MAX_DEPTH {
        return Err(too_deep());
    }
    Ok((Expr::binary(left.0, op, right.0), depth))
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn consume(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn enter(&mut self) -> std::result::Result<(), String> {
        self.nesting += 1;
        if self.nesting > MAX_DEPTH {
            return Err(too_deep());
        }
        Ok(())
    }

    fn parse_expression(&mut self) -> std::result::Result<Node, String> {
        let mut left = self.parse_term()?;

        while let Some(token) = self.peek() {
            let op = match token {
                Token::Plus => BinaryOp::Add,
                Token::Minus => BinaryOp::Sub,
                _ => break,
            };
            self.consume();
            let right = self.parse_term()?;
            left = join(left, op, right)?;
        }
        Ok(left)
    }

    fn parse_term(&mut self) -> std::result::Result<Node, String> {
        let mut left = self.parse_unary()?;

        while let Some(token) = self.peek() {
            let op = match token {
                Token::Star => BinaryOp::Mul,
                Token::Slash => BinaryOp::Div,
                _ => break,
            };
            self.consume();
            let right = self.parse_unary()?;
            left = join(left, op, right)?;
        }
        Ok(left)
    }

    /// Negation is lowered into the closed node set: `-c` folds into the
    /// constant and `-e` becomes `0 - e`.
    fn parse_unary(&mut self) -> std::result::Result<Node, String> {
        if let Some(Token::Minus) = self.peek() {
            self.consume();
            self.enter()?;
            let operand = self.parse_unary()?;
            self.nesting -= 1;
            return match operand {
                (Expr::Constant(value), depth) => Ok((Expr::Constant(-value), depth)),
                other => join((Expr::Constant(0.0), 1), BinaryOp::Sub, other),
            };
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> std::result::Result<Node, String> {
        match self.consume() {
            Some(Token::Number(n)) => Ok((Expr::Constant(n), 1)),
            Some(Token::Time) => Ok((Expr::Time, 1)),
            Some(Token::State(k)) => Ok((Expr::StateRef(k), 1)),
            Some(Token::LParen) => {
                self.enter()?;
                let node = self.parse_expression()?;
                self.nesting -= 1;
                match self.consume() {
                    Some(Token::RParen) => Ok(node),
                    _ => Err("expected ')'".to_string()),
                }
            }
            Some(token) => Err(format!("unexpected {}", token.describe())),
            None => Err("unexpected end of expression".to_string()),
        }
    }
}
