//! karst-eval - The Evaluator
//!
//! A tree walker with an explicit trampoline: `if`, the final expression of
//! a `begin`, and lambda application re-enter the loop by replacing the
//! current expression and environment instead of recursing, so iterative
//! programs written with tail calls run in constant stack. Recursion is
//! reserved for genuine sub-evaluations (predicates, operators, arguments).
//!
//! The evaluator trusts the expander's shapes but does not crash on raw
//! input: malformed special forms fail with the unknown-evaluation error
//! rather than panicking.
//!
//! Truthiness is the integer rule: integer zero is the only false value;
//! every other value, Null and floats included, is true. The expander's
//! lowerings feed `if` integer 0/1, so the rule only becomes visible to
//! programs testing raw values.

pub mod prims;

use karst_util::{KarstError, Result};
use kgc::{env, table, Machine, Value};

/// Only integer zero is false.
pub fn truthy(v: Value) -> bool {
    !matches!(v, Value::Int(0))
}

/// Returns the `n`-th element of the form `x` (0 is the head symbol),
/// failing with the unknown-evaluation error on malformed shapes.
fn nth_form(m: &Machine, x: Value, n: usize) -> Result<Value> {
    let mut cur = x;
    for _ in 0..n {
        if !cur.is_pair() {
            return Err(KarstError::UnknownEval);
        }
        cur = m.heap().cdr(cur);
    }
    if !cur.is_pair() {
        return Err(KarstError::UnknownEval);
    }
    Ok(m.heap().car(cur))
}

/// Evaluates `expr` under `env`.
pub fn eval(m: &mut Machine, expr: Value, env: Value) -> Result<Value> {
    let mut x = expr;
    let mut env = env;
    loop {
        match x {
            Value::Symbol(_) => return env::lookup(m.heap(), env, x),
            Value::Pair(_) => {}
            // Ints, floats, strings, lambdas, primitives and Null evaluate
            // to themselves.
            _ => return Ok(x),
        }

        let head = m.heap().car(x);
        let sp = m.specials();

        if head == sp.if_ {
            let pred = nth_form(m, x, 1)?;
            let then = nth_form(m, x, 2)?;
            let alt = nth_form(m, x, 3).unwrap_or(Value::Null);
            let test = eval(m, pred, env)?;
            x = if truthy(test) { then } else { alt };
            continue;
        }

        if head == sp.begin {
            let mut cur = m.heap().cdr(x);
            if cur.is_null() {
                return Ok(Value::Null);
            }
            loop {
                if !cur.is_pair() {
                    return Err(KarstError::UnknownEval);
                }
                let e = m.heap().car(cur);
                let rest = m.heap().cdr(cur);
                if rest.is_null() {
                    x = e; // tail position
                    break;
                }
                eval(m, e, env)?;
                cur = rest;
            }
            continue;
        }

        if head == sp.quote {
            return nth_form(m, x, 1);
        }

        if head == sp.define {
            let sym = nth_form(m, x, 1)?;
            if !sym.is_symbol() {
                return Err(KarstError::UnknownEval);
            }
            let value = eval(m, nth_form(m, x, 2)?, env)?;
            env::define(m.heap_mut(), env, sym, value);
            return Ok(Value::Null);
        }

        if head == sp.set_bang {
            let sym = nth_form(m, x, 1)?;
            if !sym.is_symbol() {
                return Err(KarstError::UnknownEval);
            }
            let value = eval(m, nth_form(m, x, 2)?, env)?;
            if !env::set(m.heap_mut(), env, sym, value) {
                log::warn!(
                    "set! of unknown variable: {}",
                    m.heap().symbol_name(sym)
                );
            }
            return Ok(Value::Null);
        }

        if head == sp.lambda {
            let params = nth_form(m, x, 1)?;
            let body = nth_form(m, x, 2)?;
            let id = m.next_lambda_id();
            return Ok(m.heap_mut().alloc_lambda(id, params, body, env));
        }

        // Application: operator first, then arguments left to right into a
        // fresh list.
        let op = eval(m, head, env)?;
        let mut args = Vec::new();
        let mut cur = m.heap().cdr(x);
        loop {
            match cur {
                Value::Null => break,
                Value::Pair(_) => {
                    let a = m.heap().car(cur);
                    args.push(eval(m, a, env)?);
                    cur = m.heap().cdr(cur);
                }
                _ => return Err(KarstError::UnknownEval),
            }
        }

        match op {
            Value::Primitive(f) => {
                let arg_list = m.heap_mut().list_from_slice(&args);
                return f(m, arg_list);
            }
            Value::Lambda(_) => {
                let (_, params, body, captured) = m.heap().lambda_parts(op);
                env = bind_frame(m, params, &args, captured)?;
                x = body; // tail position
                continue;
            }
            _ => return Err(KarstError::BadOp),
        }
    }
}

/// Applies an operator to already-evaluated arguments. This is the entry
/// point primitives like `map` use to call back into user code.
pub fn apply(m: &mut Machine, op: Value, args: &[Value]) -> Result<Value> {
    match op {
        Value::Primitive(f) => {
            let arg_list = m.heap_mut().list_from_slice(args);
            f(m, arg_list)
        }
        Value::Lambda(_) => {
            let (_, params, body, captured) = m.heap().lambda_parts(op);
            let env = bind_frame(m, params, args, captured)?;
            eval(m, body, env)
        }
        _ => Err(KarstError::BadOp),
    }
}

/// Builds the application frame: a fresh small table binding each parameter
/// positionally, consed onto the lambda's captured environment.
fn bind_frame(m: &mut Machine, params: Value, args: &[Value], captured: Value) -> Result<Value> {
    let names = m
        .heap()
        .list_items(params)
        .ok_or_else(|| KarstError::BadArg("parameter list must be a proper list".into()))?;
    if names.len() != args.len() {
        return Err(KarstError::BadArg(format!(
            "procedure expects {} arguments, got {}",
            names.len(),
            args.len()
        )));
    }

    let capacity = m.config().lambda_frame_capacity;
    let env = env::extend(m.heap_mut(), captured, capacity);
    let frame = env::head_frame(m.heap(), env);
    for (&sym, &arg) in names.iter().zip(args) {
        if !sym.is_symbol() {
            return Err(KarstError::BadArg(
                "lambda parameter is not a symbol".into(),
            ));
        }
        table::set(m.heap_mut(), frame, sym, arg);
    }
    Ok(env)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval_global(m: &mut Machine, expr: Value) -> Result<Value> {
        let globals = m.globals();
        eval(m, expr, globals)
    }

    #[test]
    fn atoms_self_evaluate() {
        let mut m = Machine::with_defaults();
        assert_eq!(eval_global(&mut m, Value::Int(5)).unwrap(), Value::Int(5));
        assert_eq!(
            eval_global(&mut m, Value::Float(1.5)).unwrap(),
            Value::Float(1.5)
        );
        assert_eq!(eval_global(&mut m, Value::Null).unwrap(), Value::Null);
        let s = m.make_string("x");
        assert_eq!(eval_global(&mut m, s).unwrap(), s);
    }

    #[test]
    fn unbound_symbol_is_unknown_var() {
        let mut m = Machine::with_defaults();
        let sym = m.intern("nope");
        assert_eq!(
            eval_global(&mut m, sym).unwrap_err(),
            KarstError::UnknownVar("NOPE".into())
        );
    }

    #[test]
    fn truthiness_is_the_integer_rule() {
        assert!(!truthy(Value::Int(0)));
        assert!(truthy(Value::Int(1)));
        assert!(truthy(Value::Int(-1)));
        assert!(truthy(Value::Float(0.0)));
        assert!(truthy(Value::Null));
    }

    #[test]
    fn applying_a_non_procedure_is_bad_op() {
        let mut m = Machine::with_defaults();
        let call = m.make_list(&[Value::Int(1), Value::Int(2)]);
        assert_eq!(eval_global(&mut m, call).unwrap_err(), KarstError::BadOp);
    }

    #[test]
    fn quote_returns_datum_unevaluated() {
        let mut m = Machine::with_defaults();
        let quote = m.specials().quote;
        let datum = m.make_list(&[Value::Int(1), Value::Int(2)]);
        let form = m.make_list(&[quote, datum]);
        assert_eq!(eval_global(&mut m, form).unwrap(), datum);
    }

    #[test]
    fn empty_begin_returns_null() {
        let mut m = Machine::with_defaults();
        let begin = m.specials().begin;
        let form = m.make_list(&[begin]);
        assert_eq!(eval_global(&mut m, form).unwrap(), Value::Null);
    }
}
