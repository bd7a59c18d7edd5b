//! `filter`: keep objects whose member satisfies a comparison

use super::unquote;
use crate::backend::{parse_int, Object, TypeDef};
use crate::pipeline::error::{PipelineError, PipelineResult};
use crate::pipeline::registry::Registry;
use crate::pipeline::session::Session;
use crate::pipeline::stage::{ObjectStream, Stage};

const HELP: &str = "syntax: filter <path> [<op> <integer>]

Keeps the input objects for which the member at <path> compares true
against <integer>. <op> is one of == != < <= > >=. Without a comparison,
keeps objects whose member is non-zero. 'obj' names the object itself:

    filter obj.spa_state == 0
    filter obj";

pub fn register(registry: &mut Registry) {
    registry.register_command(&["filter"], HELP, Filter::construct);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CmpOp {
    fn eval(self, lhs: i128, rhs: i128) -> bool {
        match self {
            CmpOp::Eq => lhs == rhs,
            CmpOp::Ne => lhs != rhs,
            CmpOp::Lt => lhs < rhs,
            CmpOp::Le => lhs <= rhs,
            CmpOp::Gt => lhs > rhs,
            CmpOp::Ge => lhs >= rhs,
        }
    }
}

const OPERATORS: [(&str, CmpOp); 6] = [
    ("==", CmpOp::Eq),
    ("!=", CmpOp::Ne),
    ("<=", CmpOp::Le),
    (">=", CmpOp::Ge),
    ("<", CmpOp::Lt),
    (">", CmpOp::Gt),
];

/// Split `path op value` at the first operator outside of `->`.
///
/// Matching is done on bytes; operators are ASCII, so a match always sits
/// on a char boundary.
fn split_comparison(expr: &str) -> Option<(&str, CmpOp, &str)> {
    let bytes = expr.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i..].starts_with(b"->") {
            i += 2;
            continue;
        }
        for (text, op) in OPERATORS {
            if bytes[i..].starts_with(text.as_bytes()) {
                return Some((&expr[..i], op, &expr[i + text.len()..]));
            }
        }
        i += 1;
    }
    None
}

fn parse_signed(text: &str) -> Option<i128> {
    match text.strip_prefix('-') {
        Some(rest) => parse_int(rest).map(|v| -(v as i128)),
        None => parse_int(text).map(i128::from),
    }
}

pub struct Filter {
    path: String,
    comparison: Option<(CmpOp, i128)>,
}

impl Filter {
    pub fn construct(_session: &Session, args: &str) -> PipelineResult<Box<dyn Stage>> {
        let expr: String = args.split_whitespace().map(unquote).collect();
        if expr.is_empty() {
            return Err(PipelineError::invalid_argument("filter", "expected an expression"));
        }
        let filter = match split_comparison(&expr) {
            Some((path, op, value)) => {
                let value = parse_signed(value).ok_or_else(|| {
                    PipelineError::invalid_argument(
                        "filter",
                        format!("'{}' is not an integer", value),
                    )
                })?;
                if path.is_empty() {
                    return Err(PipelineError::invalid_argument("filter", "missing member path"));
                }
                Self {
                    path: path.to_string(),
                    comparison: Some((op, value)),
                }
            }
            None => Self {
                path: expr,
                comparison: None,
            },
        };
        Ok(Box::new(filter))
    }

    fn target(&self, obj: &Object) -> PipelineResult<Object> {
        let path = self.path.as_str();
        if path == "obj" {
            return Ok(obj.clone());
        }
        let path = match path.strip_prefix("obj") {
            Some(rest) if rest.starts_with('.') || rest.starts_with("->") => rest,
            _ => path,
        };
        Ok(obj.member_path(path)?)
    }

    fn keep(&self, obj: &Object) -> PipelineResult<bool> {
        let target = self.target(obj)?;
        let signed = matches!(
            target.program().type_def(target.type_id()),
            Some(TypeDef::Primitive(p)) if p.is_signed()
        );
        let value = if signed {
            i128::from(target.value_i64()?)
        } else {
            i128::from(target.value_u64()?)
        };
        Ok(match self.comparison {
            Some((op, rhs)) => op.eval(value, rhs),
            None => value != 0,
        })
    }
}

impl Stage for Filter {
    fn name(&self) -> &str {
        "filter"
    }

    fn call<'a>(&'a self, input: ObjectStream<'a>) -> ObjectStream<'a> {
        Box::new(input.filter_map(move |res| match res {
            Ok(obj) => match self.keep(&obj) {
                Ok(true) => Some(Ok(obj)),
                Ok(false) => None,
                Err(e) => Some(Err(e)),
            },
            Err(e) => Some(Err(e)),
        }))
    }
}
