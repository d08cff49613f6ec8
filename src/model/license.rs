//! License expressions.
//!
//! Input is read with the `spdx` crate in lax mode, so common spellings such
//! as `mit` or `MIT/Apache-2.0` are understood, and then re-rendered from the
//! parsed tree with canonical ids and operators. Only a rendering that also
//! passes a strict parse is kept. Anything else becomes `NOASSERTION`, so
//! generation never fails on a license.

use serde::{Deserialize, Serialize};
use std::fmt;

pub const NOASSERTION: &str = "NOASSERTION";

/// License expression as supplied by hints or overrides.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LicenseExpression {
    /// Canonical SPDX expression when valid, the supplied text otherwise
    pub expression: String,
    /// Whether `expression` is a strictly valid SPDX expression
    pub is_valid_spdx: bool,
}

impl LicenseExpression {
    #[must_use]
    pub fn new(expression: impl Into<String>) -> Self {
        let raw = expression.into().trim().to_string();
        match Self::canonicalize(&raw) {
            Some(expression) => Self {
                expression,
                is_valid_spdx: true,
            },
            None => Self {
                expression: raw,
                is_valid_spdx: false,
            },
        }
    }

    #[must_use]
    pub fn noassertion() -> Self {
        Self {
            expression: NOASSERTION.to_string(),
            is_valid_spdx: false,
        }
    }

    /// Canonical rendering of `expr`, if it denotes a valid SPDX expression.
    fn canonicalize(expr: &str) -> Option<String> {
        if expr.is_empty() || expr.contains(NOASSERTION) || expr == "NONE" {
            return None;
        }
        let parsed = spdx::Expression::parse_mode(expr, spdx::ParseMode::LAX).ok()?;
        let rendered = render(&parsed)?;
        spdx::Expression::parse(&rendered).ok()?;
        Some(rendered)
    }

    /// The expression when valid, `NOASSERTION` otherwise.
    #[must_use]
    pub fn spdx_or_noassertion(&self) -> &str {
        if self.is_valid_spdx {
            &self.expression
        } else {
            NOASSERTION
        }
    }

    #[must_use]
    pub fn is_noassertion(&self) -> bool {
        !self.is_valid_spdx
    }

    /// True when the expression names a single license id (no operators),
    /// so CycloneDX can emit `license.id` instead of `expression`.
    #[must_use]
    pub fn is_single_id(&self) -> bool {
        self.is_valid_spdx && spdx::license_id(&self.expression).is_some()
    }
}

/// Infix rendering of a parsed expression. Nodes arrive in postfix order;
/// `AND` binds tighter than `OR`, so only `OR` operands of an `AND` need
/// parentheses.
fn render(expr: &spdx::Expression) -> Option<String> {
    use spdx::expression::{ExprNode, Operator};

    const ATOM: u8 = 0;
    const AND: u8 = 1;
    const OR: u8 = 2;

    let mut stack: Vec<(String, u8)> = Vec::new();
    for node in expr.iter() {
        match node {
            ExprNode::Req(req) => stack.push((req.req.to_string(), ATOM)),
            ExprNode::Op(op) => {
                let (rhs, rhs_level) = stack.pop()?;
                let (lhs, lhs_level) = stack.pop()?;
                let (word, level) = match op {
                    Operator::And => ("AND", AND),
                    Operator::Or => ("OR", OR),
                };
                let wrap = |text: String, operand: u8| {
                    if operand > level {
                        format!("({text})")
                    } else {
                        text
                    }
                };
                stack.push((
                    format!("{} {word} {}", wrap(lhs, lhs_level), wrap(rhs, rhs_level)),
                    level,
                ));
            }
        }
    }
    let (rendered, _) = stack.pop()?;
    stack.is_empty().then_some(rendered)
}

impl Default for LicenseExpression {
    fn default() -> Self {
        Self::noassertion()
    }
}

impl fmt::Display for LicenseExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.spdx_or_noassertion())
    }
}
