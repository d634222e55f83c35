//! Value printing.
//!
//! Two renderings: [`print_value`] produces the readable form (strings are
//! quoted, so pure data round-trips through the reader), [`display_value`]
//! the display form (strings appear raw). Lists print with dotted notation
//! for improper tails. Lambdas, tables and primitives have no readable form
//! and print as `#<...>` markers, which the lexer deliberately rejects.

use std::fmt::Write as _;

use crate::heap::Heap;
use crate::value::Value;

/// Renders `v` in readable form.
pub fn print_value(heap: &Heap, v: Value) -> String {
    let mut out = String::new();
    write_value(heap, v, true, &mut out);
    out
}

/// Renders `v` in display form.
pub fn display_value(heap: &Heap, v: Value) -> String {
    let mut out = String::new();
    write_value(heap, v, false, &mut out);
    out
}

fn write_value(heap: &Heap, v: Value, readable: bool, out: &mut String) {
    match v {
        Value::Null => out.push_str("()"),
        Value::Int(i) => {
            let _ = write!(out, "{i}");
        }
        Value::Float(x) => out.push_str(&format_float(x)),
        Value::Symbol(_) => out.push_str(heap.symbol_name(v)),
        Value::Str(_) => {
            if readable {
                let _ = write!(out, "\"{}\"", heap.string_text(v));
            } else {
                out.push_str(heap.string_text(v));
            }
        }
        Value::Pair(_) => {
            out.push('(');
            let mut cur = v;
            loop {
                write_value(heap, heap.car(cur), readable, out);
                match heap.cdr(cur) {
                    Value::Null => break,
                    tail @ Value::Pair(_) => {
                        out.push(' ');
                        cur = tail;
                    }
                    tail => {
                        out.push_str(" . ");
                        write_value(heap, tail, readable, out);
                        break;
                    }
                }
            }
            out.push(')');
        }
        Value::Lambda(_) => {
            let (id, ..) = heap.lambda_parts(v);
            let _ = write!(out, "#<lambda:{id}>");
        }
        Value::Table(_) => {
            let _ = write!(
                out,
                "#<table:{}/{}>",
                heap.table_size(v),
                heap.table_capacity(v)
            );
        }
        Value::Primitive(_) => out.push_str("#<primitive>"),
    }
}

/// Formats a float so the reader sees a float again: the text always
/// carries a decimal point and never an exponent.
fn format_float(x: f64) -> String {
    let s = format!("{x:?}");
    if s.contains('e') || s.contains('E') {
        format!("{x:.1}")
    } else if s.contains('.') {
        s
    } else {
        format!("{s}.0")
    }
}
