//! karst-expand - Macro Expander
//!
//! Lowers the surface forms to the primitive language the evaluator
//! understands (`if`, `begin`, `quote`, `define`, `set!`, `lambda` and
//! application):
//!
//! - `(define (f p...) body...)` becomes `(define f (lambda (p...) body...))`
//! - `(cond (p e)... (else e))` right-folds into nested `if`s
//! - `(and a...)` / `(or a...)` right-fold into `if`s yielding integer 1/0
//! - `(let ((v e)...) body...)` becomes an immediate lambda application
//! - a multi-expression lambda body is wrapped in one `begin`
//! - `(assert e)` becomes `(assert e' (quote e))`, preserving the written
//!   form for the failure diagnostic
//!
//! The expander rewrites and validates structure; it never evaluates.
//! Expansion is idempotent: running it over already-lowered code changes
//! nothing, which is what lets `read -> expand -> eval` pipelines re-expand
//! defensively.

use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;

use karst_util::{KarstError, Result};
use kgc::{Machine, Value};

/// Surface forms the expander rewrites. `if` and `begin` are absent on
/// purpose: they are already primitive and only get their children walked.
#[derive(Clone, Copy, Debug)]
enum Form {
    Quote,
    Define,
    Set,
    Cond,
    And,
    Or,
    Let,
    Lambda,
    Assert,
}

static FORMS: Lazy<FxHashMap<&'static str, Form>> = Lazy::new(|| {
    let mut map = FxHashMap::default();
    map.insert("QUOTE", Form::Quote);
    map.insert("DEFINE", Form::Define);
    map.insert("SET!", Form::Set);
    map.insert("COND", Form::Cond);
    map.insert("AND", Form::And);
    map.insert("OR", Form::Or);
    map.insert("LET", Form::Let);
    map.insert("LAMBDA", Form::Lambda);
    map.insert("ASSERT", Form::Assert);
    map
});

/// Expands `expr` to primitive form.
pub fn expand(m: &mut Machine, expr: Value) -> Result<Value> {
    if !expr.is_pair() {
        return Ok(expr);
    }
    let head = m.heap().car(expr);
    let form = if head.is_symbol() {
        FORMS.get(m.heap().symbol_name(head)).copied()
    } else {
        None
    };
    match form {
        Some(Form::Quote) => expand_quote(m, expr),
        Some(Form::Define) => expand_define(m, expr),
        Some(Form::Set) => expand_set(m, expr),
        Some(Form::Cond) => expand_cond(m, expr),
        Some(Form::And) => expand_and_or(m, expr, true),
        Some(Form::Or) => expand_and_or(m, expr, false),
        Some(Form::Let) => expand_let(m, expr),
        Some(Form::Lambda) => expand_lambda(m, expr),
        Some(Form::Assert) => expand_assert(m, expr),
        None => expand_each(m, expr),
    }
}

/// Recurses over the elements of a pair that is not a recognized form.
/// Dotted tails are expanded in place and kept dotted.
fn expand_each(m: &mut Machine, expr: Value) -> Result<Value> {
    let mut items = Vec::new();
    let mut cur = expr;
    let tail = loop {
        match cur {
            Value::Null => break Value::Null,
            Value::Pair(_) => {
                let item = m.heap().car(cur);
                items.push(expand(m, item)?);
                cur = m.heap().cdr(cur);
            }
            other => break expand(m, other)?,
        }
    };
    Ok(m.heap_mut().list_with_tail(&items, tail))
}

/// `(quote x)` is left untouched; its children are data, not code.
fn expand_quote(m: &mut Machine, expr: Value) -> Result<Value> {
    if m.heap().list_length(expr) != Some(2) {
        return Err(KarstError::BadQuote);
    }
    Ok(expr)
}

fn expand_define(m: &mut Machine, expr: Value) -> Result<Value> {
    let items = m.heap().list_items(expr).ok_or(KarstError::BadDefine)?;
    if items.len() < 3 {
        return Err(KarstError::BadDefine);
    }
    let target = items[1];

    if target.is_pair() {
        // (define (name p...) body...) -> (define name (lambda (p...) body...))
        let name = m.heap().car(target);
        if !name.is_symbol() {
            return Err(KarstError::BadDefine);
        }
        let params = m.heap().cdr(target);
        let lambda_sym = m.specials().lambda;
        let body: Vec<Value> = items[2..].to_vec();
        let mut lambda_items = vec![lambda_sym, params];
        lambda_items.extend(body);
        let lambda_form = m.heap_mut().list_from_slice(&lambda_items);
        let lambda_form = expand_lambda(m, lambda_form)?;
        let define_sym = m.specials().define;
        return Ok(m.heap_mut().list_from_slice(&[define_sym, name, lambda_form]));
    }

    if target.is_symbol() {
        if items.len() != 3 {
            return Err(KarstError::BadDefine);
        }
        let value = expand(m, items[2])?;
        let define_sym = m.specials().define;
        return Ok(m.heap_mut().list_from_slice(&[define_sym, target, value]));
    }

    Err(KarstError::BadDefine)
}

fn expand_set(m: &mut Machine, expr: Value) -> Result<Value> {
    let items = m.heap().list_items(expr).ok_or(KarstError::BadSet)?;
    if items.len() != 3 || !items[1].is_symbol() {
        return Err(KarstError::BadSet);
    }
    let value = expand(m, items[2])?;
    let set_sym = m.specials().set_bang;
    Ok(m.heap_mut().list_from_slice(&[set_sym, items[1], value]))
}

/// `(cond (p0 e0) ... (else en))` right-folds into nested `if`s; the else
/// branch, when present, becomes the innermost alternative, otherwise the
/// innermost alternative is Null.
fn expand_cond(m: &mut Machine, expr: Value) -> Result<Value> {
    let clauses = {
        let items = m.heap().list_items(expr).ok_or(KarstError::BadCond)?;
        items[1..].to_vec()
    };

    let mut acc = Value::Null;
    let mut rest: &[Value] = &clauses;

    if let Some((&last, front)) = clauses.split_last() {
        let parts = m.heap().list_items(last).ok_or(KarstError::BadCond)?;
        if parts.len() != 2 {
            return Err(KarstError::BadCond);
        }
        let is_else = parts[0].is_symbol() && m.heap().symbol_name(parts[0]) == "ELSE";
        if is_else {
            acc = expand(m, parts[1])?;
            rest = front;
        }
    }

    let if_sym = m.specials().if_;
    for &clause in rest.iter().rev() {
        let parts = m.heap().list_items(clause).ok_or(KarstError::BadCond)?;
        if parts.len() != 2 {
            return Err(KarstError::BadCond);
        }
        let pred = expand(m, parts[0])?;
        let then = expand(m, parts[1])?;
        acc = m.heap_mut().list_from_slice(&[if_sym, pred, then, acc]);
    }
    Ok(acc)
}

/// `(and a0 ... an)` => `(if a0 (if a1 ... (if an 1 0) 0) 0)`;
/// `(or a0 ... an)` => `(if a0 1 (if a1 1 ... (if an 1 0)))`.
fn expand_and_or(m: &mut Machine, expr: Value, is_and: bool) -> Result<Value> {
    let bad = if is_and {
        KarstError::BadAnd
    } else {
        KarstError::BadOr
    };
    let operands = {
        let items = m.heap().list_items(expr).ok_or(bad.clone())?;
        if items.len() < 2 {
            return Err(bad);
        }
        items[1..].to_vec()
    };

    let if_sym = m.specials().if_;
    let mut acc = if is_and { Value::Int(1) } else { Value::Int(0) };
    for &operand in operands.iter().rev() {
        let operand = expand(m, operand)?;
        acc = if is_and {
            m.heap_mut()
                .list_from_slice(&[if_sym, operand, acc, Value::Int(0)])
        } else {
            m.heap_mut()
                .list_from_slice(&[if_sym, operand, Value::Int(1), acc])
        };
    }
    Ok(acc)
}

/// `(let ((v0 e0) ...) body...)` => `((lambda (v0 ...) body...) e0 ...)`.
fn expand_let(m: &mut Machine, expr: Value) -> Result<Value> {
    let items = m.heap().list_items(expr).ok_or(KarstError::BadLet)?;
    if items.len() < 3 {
        return Err(KarstError::BadLet);
    }
    let bindings = m.heap().list_items(items[1]).ok_or(KarstError::BadLet)?;

    let mut vars = Vec::with_capacity(bindings.len());
    let mut inits = Vec::with_capacity(bindings.len());
    for &binding in &bindings {
        let parts = m.heap().list_items(binding).ok_or(KarstError::BadLet)?;
        if parts.len() != 2 || !parts[0].is_symbol() {
            return Err(KarstError::BadLet);
        }
        vars.push(parts[0]);
        inits.push(expand(m, parts[1])?);
    }

    let lambda_sym = m.specials().lambda;
    let params = m.heap_mut().list_from_slice(&vars);
    let mut lambda_items = vec![lambda_sym, params];
    lambda_items.extend_from_slice(&items[2..]);
    let lambda_form = m.heap_mut().list_from_slice(&lambda_items);
    let lambda_form = expand_lambda(m, lambda_form)?;

    let mut call = vec![lambda_form];
    call.extend(inits);
    Ok(m.heap_mut().list_from_slice(&call))
}

/// Validates the parameter list and wraps a multi-expression body in one
/// `begin`.
fn expand_lambda(m: &mut Machine, expr: Value) -> Result<Value> {
    let items = m.heap().list_items(expr).ok_or(KarstError::BadLambda)?;
    if items.len() < 3 {
        return Err(KarstError::BadLambda);
    }
    let params = m.heap().list_items(items[1]).ok_or(KarstError::BadLambda)?;
    if params.iter().any(|p| !p.is_symbol()) {
        return Err(KarstError::BadLambda);
    }

    let body = if items.len() == 3 {
        expand(m, items[2])?
    } else {
        let begin_sym = m.specials().begin;
        let mut body_items = vec![begin_sym];
        body_items.extend_from_slice(&items[2..]);
        let begin_form = m.heap_mut().list_from_slice(&body_items);
        expand_each(m, begin_form)?
    };

    let lambda_sym = m.specials().lambda;
    Ok(m.heap_mut().list_from_slice(&[lambda_sym, items[1], body]))
}

/// `(assert e)` => `(assert e' (quote e))`. The already-expanded shape
/// passes through untouched apart from child expansion, which keeps the
/// rewrite idempotent.
fn expand_assert(m: &mut Machine, expr: Value) -> Result<Value> {
    let items = m
        .heap()
        .list_items(expr)
        .ok_or_else(|| KarstError::BadArg("malformed assert".into()))?;
    match items.len() {
        2 => {
            let original = items[1];
            let expanded = expand(m, original)?;
            let quote_sym = m.specials().quote;
            let quoted = m.heap_mut().list_from_slice(&[quote_sym, original]);
            Ok(m.heap_mut().list_from_slice(&[items[0], expanded, quoted]))
        }
        3 => expand_each(m, expr),
        _ => Err(KarstError::BadArg("assert expects one form".into())),
    }
}
