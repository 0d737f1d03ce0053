//! Restricted arithmetic evaluator
//!
//! Recognizes `2+2=` style expressions and questions such as
//! "what is 3 times 4". Only numbers, `+ - * / ** //` and parentheses are
//! accepted; anything else yields no result.

use regex::Regex;
use std::sync::LazyLock;

/// Bare expression terminated by `=`
static BARE_EXPRESSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*([\d.+\-*/()\s]+)=$").expect("valid regex"));

/// Characters surviving the strip of a cue question
static NON_EXPRESSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^0-9.+\-*/()\s]").expect("valid regex"));

/// Phrases that mark an utterance as an arithmetic question
const CUES: &[&str] = &["what is", "calculate", "answer to"];

/// Spoken operators rewritten before stripping
const SPOKEN_OPERATORS: &[(&str, &str)] = &[
    ("multiplied by", "*"),
    ("divided by", "/"),
    ("plus", "+"),
    ("minus", "-"),
    ("times", "*"),
];

/// Deepest nesting of parentheses and unary signs the parser accepts
const MAX_DEPTH: usize = 64;

/// Phrases asking for the previously computed result
const ANSWER_REQUESTS: &[&str] = &["what is the answer", "what's the answer", "the answer"];

/// Evaluate an arithmetic utterance
///
/// Returns the formatted result, or `None` when the text is not arithmetic
/// or cannot be evaluated.
#[must_use]
pub fn try_evaluate(text: &str) -> Option<String> {
    let trimmed = text.trim();

    if let Some(caps) = BARE_EXPRESSION.captures(trimmed) {
        return evaluate(&caps[1]).map(format_number);
    }

    let lower = trimmed.to_lowercase();
    let cue = CUES.iter().find(|cue| lower.contains(*cue))?;
    let remainder = lower.split_once(cue).map_or("", |(_, rest)| rest);

    let spoken = SPOKEN_OPERATORS
        .iter()
        .fold(remainder.to_string(), |acc, (word, op)| acc.replace(word, op));
    let expression = NON_EXPRESSION.replace_all(&spoken, "");

    if expression.trim().is_empty() {
        return None;
    }

    evaluate(&expression).map(format_number)
}

/// Whether the utterance asks for the last computed answer
#[must_use]
pub fn is_answer_request(text: &str) -> bool {
    let normalized = text
        .trim()
        .trim_end_matches(['?', '.', '!'])
        .trim()
        .to_lowercase();
    ANSWER_REQUESTS.contains(&normalized.as_str())
}

/// Evaluate an expression over the restricted grammar
///
/// ```text
/// expr    := term (('+' | '-') term)*
/// term    := unary (('*' | '/' | '//') unary)*
/// unary   := ('+' | '-') unary | power
/// power   := primary ('**' unary)?
/// primary := number | '(' expr ')'
/// ```
#[must_use]
pub fn evaluate(expression: &str) -> Option<f64> {
    let tokens = lex(expression)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };
    let value = parser.expr()?;

    if parser.pos != parser.tokens.len() || !value.is_finite() {
        return None;
    }

    Some(value)
}

/// Render a result: integral values without a fractional part
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        // -0 prints as 0
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Number(f64),
    Plus,
    Minus,
    Star,
    DoubleStar,
    Slash,
    DoubleSlash,
    Open,
    Close,
}

fn lex(input: &str) -> Option<Vec<Token>> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() => i += 1,
            '0'..='9' | '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                let literal: String = chars[start..i].iter().collect();
                tokens.push(Token::Number(literal.parse().ok()?));
            }
            '*' if chars.get(i + 1) == Some(&'*') => {
                tokens.push(Token::DoubleStar);
                i += 2;
            }
            '/' if chars.get(i + 1) == Some(&'/') => {
                tokens.push(Token::DoubleSlash);
                i += 2;
            }
            '+' | '-' | '*' | '/' | '(' | ')' => {
                tokens.push(match c {
                    '+' => Token::Plus,
                    '-' => Token::Minus,
                    '*' => Token::Star,
                    '/' => Token::Slash,
                    '(' => Token::Open,
                    _ => Token::Close,
                });
                i += 1;
            }
            _ => return None,
        }
    }

    Some(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.peek();
        self.pos += 1;
        token
    }

    fn expr(&mut self) -> Option<f64> {
        let mut value = self.term()?;
        while let Some(op @ (Token::Plus | Token::Minus)) = self.peek() {
            self.pos += 1;
            let rhs = self.term()?;
            value = if op == Token::Plus { value + rhs } else { value - rhs };
        }
        Some(value)
    }

    fn term(&mut self) -> Option<f64> {
        let mut value = self.unary()?;
        while let Some(op @ (Token::Star | Token::Slash | Token::DoubleSlash)) = self.peek() {
            self.pos += 1;
            let rhs = self.unary()?;
            value = match op {
                Token::Star => value * rhs,
                _ if rhs == 0.0 => return None,
                Token::Slash => value / rhs,
                _ => (value / rhs).floor(),
            };
        }
        Some(value)
    }

    fn unary(&mut self) -> Option<f64> {
        match self.peek()? {
            Token::Plus => {
                self.pos += 1;
                self.nested(Self::unary)
            }
            Token::Minus => {
                self.pos += 1;
                self.nested(Self::unary).map(|v| -v)
            }
            _ => self.power(),
        }
    }

    /// Run a sub-parser one level deeper, giving up past `MAX_DEPTH`
    fn nested(&mut self, parse: fn(&mut Self) -> Option<f64>) -> Option<f64> {
        if self.depth >= MAX_DEPTH {
            return None;
        }
        self.depth += 1;
        let value = parse(self);
        self.depth -= 1;
        value
    }

    fn power(&mut self) -> Option<f64> {
        let base = self.primary()?;
        if self.peek() == Some(Token::DoubleStar) {
            self.pos += 1;
            let exponent = self.nested(Self::unary)?;
            return Some(base.powf(exponent));
        }
        Some(base)
    }

    fn primary(&mut self) -> Option<f64> {
        match self.advance()? {
            Token::Number(n) => Some(n),
            Token::Open => {
                let value = self.nested(Self::expr)?;
                (self.advance()? == Token::Close).then_some(value)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_expressions() {
        assert_eq!(try_evaluate("2+2="), Some("4".to_string()));
        assert_eq!(try_evaluate(" 10 / 4 = "), Some("2.5".to_string()));
        assert_eq!(try_evaluate("10/2="), Some("5".to_string()));
        assert_eq!(try_evaluate("(1 + 2) * 3="), Some("9".to_string()));
    }

    #[test]
    fn test_cue_questions() {
        assert_eq!(try_evaluate("what is 3*3"), Some("9".to_string()));
        assert_eq!(try_evaluate("Calculate 7 - 10"), Some("-3".to_string()));
        assert_eq!(try_evaluate("what is 6 times 7?"), Some("42".to_string()));
        assert_eq!(try_evaluate("what is 9 divided by 3"), Some("3".to_string()));
        assert_eq!(try_evaluate("what is 2 multiplied by 2 plus 1"), Some("5".to_string()));
    }

    #[test]
    fn test_no_result() {
        assert_eq!(try_evaluate("hello there"), None);
        assert_eq!(try_evaluate("what is the weather"), None);
        assert_eq!(try_evaluate("what is the answer"), None);
        assert_eq!(try_evaluate("1/0="), None);
        assert_eq!(try_evaluate("2+="), None);
        assert_eq!(try_evaluate("(2+3="), None);
    }

    #[test]
    fn test_evaluate_rejects_foreign_characters() {
        assert_eq!(evaluate("__import__('os')"), None);
        assert_eq!(evaluate("2 + x"), None);
        assert_eq!(evaluate("1..2"), None);
    }

    #[test]
    fn test_operator_precedence() {
        assert_eq!(evaluate("2+3*4"), Some(14.0));
        assert_eq!(evaluate("-2**2"), Some(-4.0));
        assert_eq!(evaluate("2**3**2"), Some(512.0));
        assert_eq!(evaluate("7//2"), Some(3.0));
        assert_eq!(evaluate("--3"), Some(3.0));
    }

    #[test]
    fn test_deep_nesting_yields_no_result() {
        let parens = format!("{}1{}=", "(".repeat(100_000), ")".repeat(100_000));
        assert_eq!(try_evaluate(&parens), None);

        let signs = format!("{}1=", "-".repeat(100_000));
        assert_eq!(try_evaluate(&signs), None);

        let unclosed = format!("{}1=", "(".repeat(100_000));
        assert_eq!(try_evaluate(&unclosed), None);

        // ordinary nesting still evaluates
        assert_eq!(try_evaluate("((((2+3))))*-(-2)="), Some("10".to_string()));
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(5.0), "5");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(0.1 + 0.2), "0.30000000000000004");
    }

    #[test]
    fn test_answer_requests() {
        assert!(is_answer_request("what's the answer"));
        assert!(is_answer_request("What is the answer?"));
        assert!(is_answer_request("the answer"));
        assert!(!is_answer_request("the answer to everything"));
    }
}
