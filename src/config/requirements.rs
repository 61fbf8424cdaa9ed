//! The requirements DSL (spec §9 GLOSSARY / §4.5): a small boolean
//! expression language over named parameters, hand-parsed into an AST
//! instead of `eval`'d the way the original Python does it.

use indexmap::IndexMap;
use serde::Deserialize;

use crate::err::{MikadoError, Result};
use crate::metrics::{compute_numeric, Metric};
use crate::model::transcript::Transcript;

/// Comparison operator usable in both `requirements.parameters` and a
/// scoring rule's `filter`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operator {
    Gt,
    Ge,
    Lt,
    Le,
    Eq,
    In,
    Within,
}

/// The right-hand side of a comparison: a scalar, or a list (for `in`/`within`).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Number(f64),
    List(Vec<f64>),
}

impl Operator {
    pub fn evaluate(&self, actual: f64, value: &Value) -> Result<bool> {
        match (self, value) {
            (Operator::Gt, Value::Number(v)) => Ok(actual > *v),
            (Operator::Ge, Value::Number(v)) => Ok(actual >= *v),
            (Operator::Lt, Value::Number(v)) => Ok(actual < *v),
            (Operator::Le, Value::Number(v)) => Ok(actual <= *v),
            (Operator::Eq, Value::Number(v)) => Ok((actual - *v).abs() < f64::EPSILON),
            (Operator::In, Value::List(vs)) => Ok(vs.iter().any(|v| (actual - *v).abs() < f64::EPSILON)),
            (Operator::Within, Value::List(vs)) if vs.len() == 2 => {
                let (lo, hi) = (vs[0].min(vs[1]), vs[0].max(vs[1]));
                Ok(actual >= lo && actual <= hi)
            }
            _ => Err(MikadoError::InvalidRequirements(format!(
                "operator {self:?} is not compatible with value {value:?}"
            ))),
        }
    }
}

/// One named parameter: which metric it reads and how it is compared.
#[derive(Debug, Clone, Deserialize)]
pub struct Parameter {
    pub metric: String,
    pub operator: Operator,
    pub value: Value,
}

/// The `requirements` configuration section: a boolean expression over
/// named parameters.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct RequirementsConfig {
    #[serde(default)]
    pub expression: Option<String>,
    #[serde(default)]
    pub parameters: IndexMap<String, Parameter>,
}

/// Parsed requirements expression AST.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    And(Vec<Expr>),
    Or(Vec<Expr>),
    Not(Box<Expr>),
    Leaf(String),
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    And,
    Or,
    Not,
    LParen,
    RParen,
    Ident(String),
}

fn tokenize(src: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut word = String::new();
    let flush = |word: &mut String, tokens: &mut Vec<Token>| {
        if word.is_empty() {
            return;
        }
        let token = match word.to_lowercase().as_str() {
            "and" => Token::And,
            "or" => Token::Or,
            "not" => Token::Not,
            _ => Token::Ident(word.clone()),
        };
        tokens.push(token);
        word.clear();
    };
    for c in src.chars() {
        match c {
            '(' => {
                flush(&mut word, &mut tokens);
                tokens.push(Token::LParen);
            }
            ')' => {
                flush(&mut word, &mut tokens);
                tokens.push(Token::RParen);
            }
            c if c.is_whitespace() => flush(&mut word, &mut tokens),
            c => word.push(c),
        }
    }
    flush(&mut word, &mut tokens);
    tokens
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<&Token> {
        let t = self.tokens.get(self.pos);
        self.pos += 1;
        t
    }

    fn parse_or(&mut self) -> Result<Expr> {
        let mut parts = vec![self.parse_and()?];
        while matches!(self.peek(), Some(Token::Or)) {
            self.next();
            parts.push(self.parse_and()?);
        }
        Ok(if parts.len() == 1 { parts.pop().unwrap() } else { Expr::Or(parts) })
    }

    fn parse_and(&mut self) -> Result<Expr> {
        let mut parts = vec![self.parse_not()?];
        while matches!(self.peek(), Some(Token::And)) {
            self.next();
            parts.push(self.parse_not()?);
        }
        Ok(if parts.len() == 1 { parts.pop().unwrap() } else { Expr::And(parts) })
    }

    fn parse_not(&mut self) -> Result<Expr> {
        if matches!(self.peek(), Some(Token::Not)) {
            self.next();
            return Ok(Expr::Not(Box::new(self.parse_not()?)));
        }
        self.parse_atom()
    }

    fn parse_atom(&mut self) -> Result<Expr> {
        match self.next() {
            Some(Token::Ident(name)) => Ok(Expr::Leaf(name.clone())),
            Some(Token::LParen) => {
                let expr = self.parse_or()?;
                match self.next() {
                    Some(Token::RParen) => Ok(expr),
                    _ => Err(MikadoError::InvalidRequirements("missing closing parenthesis".to_string())),
                }
            }
            other => Err(MikadoError::InvalidRequirements(format!("unexpected token near {other:?}"))),
        }
    }
}

/// Parse a requirements expression such as `(a and b) or not c`.
pub fn parse_expression(src: &str) -> Result<Expr> {
    let tokens = tokenize(src);
    if tokens.is_empty() {
        return Err(MikadoError::InvalidRequirements("empty expression".to_string()));
    }
    let mut parser = Parser { tokens: &tokens, pos: 0 };
    let expr = parser.parse_or()?;
    if parser.pos != parser.tokens.len() {
        return Err(MikadoError::InvalidRequirements("trailing tokens after expression".to_string()));
    }
    Ok(expr)
}

/// Evaluate a parsed expression against a transcript's metric values.
pub fn evaluate(expr: &Expr, parameters: &IndexMap<String, Parameter>, transcript: &Transcript) -> Result<bool> {
    match expr {
        Expr::And(parts) => {
            for p in parts {
                if !evaluate(p, parameters, transcript)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        Expr::Or(parts) => {
            for p in parts {
                if evaluate(p, parameters, transcript)? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
        Expr::Not(inner) => Ok(!evaluate(inner, parameters, transcript)?),
        Expr::Leaf(name) => {
            let param = parameters
                .get(name)
                .ok_or_else(|| MikadoError::InvalidRequirements(format!("unknown parameter `{name}`")))?;
            let metric: Metric = param
                .metric
                .parse()
                .map_err(|_| MikadoError::InvalidRequirements(format!("unknown metric `{}`", param.metric)))?;
            let actual = compute_numeric(metric, transcript);
            param.operator.evaluate(actual, &param.value)
        }
    }
}

/// Convenience: parse `cfg.expression` (if any) and evaluate it; a missing
/// expression always passes (spec: requirements are opt-in).
pub fn passes(cfg: &RequirementsConfig, transcript: &Transcript) -> Result<bool> {
    match &cfg.expression {
        None => Ok(true),
        Some(expr_src) => {
            let expr = parse_expression(expr_src)?;
            evaluate(&expr, &cfg.parameters, transcript)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::interval::Strand;
    use crate::model::transcript::FeatureKind;

    fn transcript_with_cdna(len: i64) -> Transcript {
        let mut t = Transcript::new("t1", "chr1", "test", Strand::Plus);
        t.start = 1;
        t.end = len;
        t.add_exon(FeatureKind::Exon, 1, len).unwrap();
        t.finalize().unwrap();
        t
    }

    #[test]
    fn parses_and_or_not_with_parens() {
        let expr = parse_expression("(a and b) or not c").unwrap();
        assert_eq!(
            expr,
            Expr::Or(vec![
                Expr::And(vec![Expr::Leaf("a".to_string()), Expr::Leaf("b".to_string())]),
                Expr::Not(Box::new(Expr::Leaf("c".to_string()))),
            ])
        );
    }

    #[test]
    fn evaluates_gt_requirement() {
        let mut params = IndexMap::new();
        params.insert(
            "long_enough".to_string(),
            Parameter {
                metric: "cdna_length".to_string(),
                operator: Operator::Gt,
                value: Value::Number(50.0),
            },
        );
        let cfg = RequirementsConfig {
            expression: Some("long_enough".to_string()),
            parameters: params,
        };
        assert!(passes(&cfg, &transcript_with_cdna(100)).unwrap());
        assert!(!passes(&cfg, &transcript_with_cdna(10)).unwrap());
    }

    #[test]
    fn missing_expression_always_passes() {
        let cfg = RequirementsConfig::default();
        assert!(passes(&cfg, &transcript_with_cdna(10)).unwrap());
    }
}
