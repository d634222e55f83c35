//! Builtin primitives.
//!
//! Each primitive is a host callback receiving the machine and its evaluated
//! argument list. [`install`] registers the whole set into the global
//! environment's head frame; an embedding host registers its own extras the
//! same way through [`Machine::define_primitive`].
//!
//! Arithmetic preserves the operand kind: the fold starts from the first
//! operand and keeps its kind, so `(+ 1 2.5)` is the integer 3 while
//! `(+ 2.5 1)` is the float 3.5. Comparisons chain pairwise and yield
//! integer 1/0.

use std::path::Path;

use indexmap::IndexMap;
use karst_util::{KarstError, Result};
use kgc::{print_value, Machine, PrimFn, Value};

use crate::{apply, truthy};

/// The primitive set in registration order.
pub fn registry() -> IndexMap<&'static str, PrimFn> {
    let mut map: IndexMap<&'static str, PrimFn> = IndexMap::new();
    map.insert("cons", prim_cons as PrimFn);
    map.insert("car", prim_car);
    map.insert("cdr", prim_cdr);
    map.insert("nav", prim_nav);
    map.insert("eq?", prim_eq);
    map.insert("null?", prim_null);
    map.insert("list", prim_list);
    map.insert("append", prim_append);
    map.insert("map", prim_map);
    map.insert("nth", prim_nth);
    map.insert("length", prim_length);
    map.insert("reverse!", prim_reverse);
    map.insert("assoc", prim_assoc);
    map.insert("display", prim_display);
    map.insert("newline", prim_newline);
    map.insert("assert", prim_assert);
    map.insert("read-path", prim_read_path);
    map.insert("expand", prim_expand);
    map.insert("=", prim_num_eq);
    map.insert("+", prim_add);
    map.insert("-", prim_sub);
    map.insert("*", prim_mul);
    map.insert("/", prim_div);
    map.insert("<", prim_lt);
    map.insert(">", prim_gt);
    map.insert("<=", prim_le);
    map.insert(">=", prim_ge);
    map.insert("even?", prim_even);
    map.insert("odd?", prim_odd);
    map
}

/// Installs the primitive set into the machine's global environment.
pub fn install(m: &mut Machine) {
    for (name, f) in registry() {
        m.define_primitive(name, f);
    }
}

// ----------------------------------------------------------------------
// Argument plumbing
// ----------------------------------------------------------------------

fn args_vec(m: &Machine, list: Value) -> Result<Vec<Value>> {
    m.heap()
        .list_items(list)
        .ok_or_else(|| KarstError::BadArg("argument list must be a proper list".into()))
}

fn args_exact<const N: usize>(m: &Machine, name: &str, list: Value) -> Result<[Value; N]> {
    let items = args_vec(m, list)?;
    items.try_into().map_err(|items: Vec<Value>| {
        KarstError::BadArg(format!(
            "{name} expects {N} argument(s), got {}",
            items.len()
        ))
    })
}

fn as_f64(name: &str, v: Value) -> Result<f64> {
    match v {
        Value::Int(i) => Ok(i as f64),
        Value::Float(x) => Ok(x),
        _ => Err(KarstError::BadArg(format!(
            "{name} expects numbers, got {}",
            v.type_name()
        ))),
    }
}

fn as_i64(name: &str, v: Value) -> Result<i64> {
    match v {
        Value::Int(i) => Ok(i),
        Value::Float(x) => Ok(x as i64),
        _ => Err(KarstError::BadArg(format!(
            "{name} expects numbers, got {}",
            v.type_name()
        ))),
    }
}

fn bool_int(b: bool) -> Value {
    Value::Int(i64::from(b))
}

// ----------------------------------------------------------------------
// Pairs and lists
// ----------------------------------------------------------------------

fn prim_cons(m: &mut Machine, args: Value) -> Result<Value> {
    let [car, cdr] = args_exact(m, "cons", args)?;
    Ok(m.cons(car, cdr))
}

fn prim_car(m: &mut Machine, args: Value) -> Result<Value> {
    let [p] = args_exact(m, "car", args)?;
    if !p.is_pair() {
        return Err(KarstError::BadArg(format!(
            "car expects a pair, got {}",
            p.type_name()
        )));
    }
    Ok(m.heap().car(p))
}

fn prim_cdr(m: &mut Machine, args: Value) -> Result<Value> {
    let [p] = args_exact(m, "cdr", args)?;
    if !p.is_pair() {
        return Err(KarstError::BadArg(format!(
            "cdr expects a pair, got {}",
            p.type_name()
        )));
    }
    Ok(m.heap().cdr(p))
}

/// `(nav "cadr" x)` decodes the path string into car/cdr steps applied
/// right to left, so `(nav "cadr" x)` is `(car (cdr x))`.
fn prim_nav(m: &mut Machine, args: Value) -> Result<Value> {
    let [path, start] = args_exact(m, "nav", args)?;
    if !matches!(path, Value::Str(_)) {
        return Err(KarstError::BadArg("nav expects a path string".into()));
    }
    let steps: Vec<char> = {
        let text = m.heap().string_text(path).to_ascii_lowercase();
        let chars: Vec<char> = text.chars().collect();
        if chars.len() < 3
            || chars[0] != 'c'
            || chars[chars.len() - 1] != 'r'
            || chars[1..chars.len() - 1]
                .iter()
                .any(|&c| c != 'a' && c != 'd')
        {
            return Err(KarstError::BadArg(format!("nav: bad path \"{text}\"")));
        }
        chars[1..chars.len() - 1].to_vec()
    };

    let mut v = start;
    for &step in steps.iter().rev() {
        if !v.is_pair() {
            return Err(KarstError::BadArg(format!(
                "nav: reached {} mid-path",
                v.type_name()
            )));
        }
        v = if step == 'a' {
            m.heap().car(v)
        } else {
            m.heap().cdr(v)
        };
    }
    Ok(v)
}

fn prim_eq(m: &mut Machine, args: Value) -> Result<Value> {
    let [a, b] = args_exact(m, "eq?", args)?;
    Ok(bool_int(a == b))
}

fn prim_null(m: &mut Machine, args: Value) -> Result<Value> {
    let [v] = args_exact(m, "null?", args)?;
    Ok(bool_int(v.is_null()))
}

/// `list` returns its argument list, which the evaluator builds fresh per
/// call.
fn prim_list(_m: &mut Machine, args: Value) -> Result<Value> {
    Ok(args)
}

fn prim_append(m: &mut Machine, args: Value) -> Result<Value> {
    let lists = args_vec(m, args)?;
    let Some((&last, front)) = lists.split_last() else {
        return Ok(Value::Null);
    };
    let mut items = Vec::new();
    for &list in front {
        let part = m.heap().list_items(list).ok_or_else(|| {
            KarstError::BadArg(format!("append expects lists, got {}", list.type_name()))
        })?;
        items.extend(part);
    }
    Ok(m.heap_mut().list_with_tail(&items, last))
}

fn prim_map(m: &mut Machine, args: Value) -> Result<Value> {
    let [f, list] = args_exact(m, "map", args)?;
    let items = m
        .heap()
        .list_items(list)
        .ok_or_else(|| KarstError::BadArg("map expects a proper list".into()))?;
    let mut out = Vec::with_capacity(items.len());
    for item in items {
        out.push(apply(m, f, &[item])?);
    }
    Ok(m.heap_mut().list_from_slice(&out))
}

fn prim_nth(m: &mut Machine, args: Value) -> Result<Value> {
    let [n, list] = args_exact(m, "nth", args)?;
    let Value::Int(n) = n else {
        return Err(KarstError::BadArg("nth expects an integer index".into()));
    };
    let items = m
        .heap()
        .list_items(list)
        .ok_or_else(|| KarstError::BadArg("nth expects a proper list".into()))?;
    let index = usize::try_from(n).map_err(|_| KarstError::OutOfBounds {
        index: 0,
        length: items.len(),
    })?;
    items
        .get(index)
        .copied()
        .ok_or(KarstError::OutOfBounds {
            index,
            length: items.len(),
        })
}

fn prim_length(m: &mut Machine, args: Value) -> Result<Value> {
    let [list] = args_exact(m, "length", args)?;
    let n = m
        .heap()
        .list_length(list)
        .ok_or_else(|| KarstError::BadArg("length expects a proper list".into()))?;
    Ok(Value::Int(n as i64))
}

/// In-place list reversal by cdr rewriting. The argument's own pairs are
/// rewired; the old head becomes the tail.
fn prim_reverse(m: &mut Machine, args: Value) -> Result<Value> {
    let [list] = args_exact(m, "reverse!", args)?;
    if !list.is_null() && !list.is_pair() {
        return Err(KarstError::BadArg(format!(
            "reverse! expects a list, got {}",
            list.type_name()
        )));
    }
    let mut prev = Value::Null;
    let mut cur = list;
    while cur.is_pair() {
        let next = m.heap().cdr(cur);
        m.heap_mut().set_cdr(cur, prev);
        prev = cur;
        cur = next;
    }
    Ok(prev)
}

fn prim_assoc(m: &mut Machine, args: Value) -> Result<Value> {
    let [key, alist] = args_exact(m, "assoc", args)?;
    let entries = m
        .heap()
        .list_items(alist)
        .ok_or_else(|| KarstError::BadArg("assoc expects a proper list".into()))?;
    for entry in entries {
        if !entry.is_pair() {
            return Err(KarstError::BadArg(
                "assoc expects a list of pairs".into(),
            ));
        }
        if m.heap().car(entry) == key {
            return Ok(entry);
        }
    }
    Ok(Value::Null)
}

// ----------------------------------------------------------------------
// Output
// ----------------------------------------------------------------------

fn prim_display(m: &mut Machine, args: Value) -> Result<Value> {
    let [v] = args_exact(m, "display", args)?;
    print!("{}", kgc::display_value(m.heap(), v));
    Ok(Value::Null)
}

fn prim_newline(m: &mut Machine, args: Value) -> Result<Value> {
    args_exact::<0>(m, "newline", args)?;
    println!();
    Ok(Value::Null)
}

/// `(assert v (quote form))` - the expander supplies the quoted original so
/// a failure can show what was written, not what it lowered to.
fn prim_assert(m: &mut Machine, args: Value) -> Result<Value> {
    let [v, form] = args_exact(m, "assert", args)?;
    if truthy(v) {
        return Ok(v);
    }
    // The quoted payload is the written form; fall back to the raw
    // argument when a host calls assert directly.
    let written = if form.is_pair() && m.heap().list_length(form) == Some(2) {
        let inner = m.heap().car(m.heap().cdr(form));
        print_value(m.heap(), inner)
    } else {
        print_value(m.heap(), form)
    };
    log::error!("assertion failed: {written}");
    Err(KarstError::BadArg(format!("assertion failed: {written}")))
}

// ----------------------------------------------------------------------
// Reading and expansion
// ----------------------------------------------------------------------

fn prim_read_path(m: &mut Machine, args: Value) -> Result<Value> {
    let [path] = args_exact(m, "read-path", args)?;
    if !matches!(path, Value::Str(_)) {
        return Err(KarstError::BadArg("read-path expects a path string".into()));
    }
    let path = m.heap().string_text(path).to_string();
    karst_read::read_path(m, Path::new(&path))
}

fn prim_expand(m: &mut Machine, args: Value) -> Result<Value> {
    let [v] = args_exact(m, "expand", args)?;
    karst_expand::expand(m, v)
}

// ----------------------------------------------------------------------
// Arithmetic and comparison
// ----------------------------------------------------------------------

/// Folds from the first operand, keeping its kind: an integer accumulator
/// truncates float operands, a float accumulator widens integer operands.
fn fold_arith(
    m: &Machine,
    name: &str,
    args: Value,
    int_op: fn(i64, i64) -> Result<i64>,
    float_op: fn(f64, f64) -> f64,
) -> Result<Value> {
    let items = args_vec(m, args)?;
    let Some((&first, rest)) = items.split_first() else {
        return Err(KarstError::BadArg(format!(
            "{name} expects at least 1 argument"
        )));
    };
    match first {
        Value::Int(mut acc) => {
            for &v in rest {
                acc = int_op(acc, as_i64(name, v)?)?;
            }
            Ok(Value::Int(acc))
        }
        Value::Float(mut acc) => {
            for &v in rest {
                acc = float_op(acc, as_f64(name, v)?);
            }
            Ok(Value::Float(acc))
        }
        v => Err(KarstError::BadArg(format!(
            "{name} expects numbers, got {}",
            v.type_name()
        ))),
    }
}

fn prim_add(m: &mut Machine, args: Value) -> Result<Value> {
    fold_arith(m, "+", args, |a, b| Ok(a.wrapping_add(b)), |a, b| a + b)
}

fn prim_sub(m: &mut Machine, args: Value) -> Result<Value> {
    let items = args_vec(m, args)?;
    if items.len() == 1 {
        return match items[0] {
            Value::Int(i) => Ok(Value::Int(i.wrapping_neg())),
            Value::Float(x) => Ok(Value::Float(-x)),
            v => Err(KarstError::BadArg(format!(
                "- expects numbers, got {}",
                v.type_name()
            ))),
        };
    }
    fold_arith(m, "-", args, |a, b| Ok(a.wrapping_sub(b)), |a, b| a - b)
}

fn prim_mul(m: &mut Machine, args: Value) -> Result<Value> {
    fold_arith(m, "*", args, |a, b| Ok(a.wrapping_mul(b)), |a, b| a * b)
}

fn prim_div(m: &mut Machine, args: Value) -> Result<Value> {
    let items = args_vec(m, args)?;
    if items.len() < 2 {
        return Err(KarstError::BadArg("/ expects at least 2 arguments".into()));
    }
    fold_arith(
        m,
        "/",
        args,
        |a, b| {
            if b == 0 {
                Err(KarstError::BadArg("division by zero".into()))
            } else {
                Ok(a.wrapping_div(b))
            }
        },
        |a, b| a / b,
    )
}

fn fold_compare(
    m: &Machine,
    name: &str,
    args: Value,
    cmp: fn(f64, f64) -> bool,
) -> Result<Value> {
    let items = args_vec(m, args)?;
    if items.len() < 2 {
        return Err(KarstError::BadArg(format!(
            "{name} expects at least 2 arguments"
        )));
    }
    for window in items.windows(2) {
        let a = as_f64(name, window[0])?;
        let b = as_f64(name, window[1])?;
        if !cmp(a, b) {
            return Ok(Value::Int(0));
        }
    }
    Ok(Value::Int(1))
}

fn prim_num_eq(m: &mut Machine, args: Value) -> Result<Value> {
    fold_compare(m, "=", args, |a, b| a == b)
}

fn prim_lt(m: &mut Machine, args: Value) -> Result<Value> {
    fold_compare(m, "<", args, |a, b| a < b)
}

fn prim_gt(m: &mut Machine, args: Value) -> Result<Value> {
    fold_compare(m, ">", args, |a, b| a > b)
}

fn prim_le(m: &mut Machine, args: Value) -> Result<Value> {
    fold_compare(m, "<=", args, |a, b| a <= b)
}

fn prim_ge(m: &mut Machine, args: Value) -> Result<Value> {
    fold_compare(m, ">=", args, |a, b| a >= b)
}

fn prim_even(m: &mut Machine, args: Value) -> Result<Value> {
    let [v] = args_exact(m, "even?", args)?;
    match v {
        Value::Int(i) => Ok(bool_int(i % 2 == 0)),
        _ => Err(KarstError::BadArg(format!(
            "even? expects an integer, got {}",
            v.type_name()
        ))),
    }
}

fn prim_odd(m: &mut Machine, args: Value) -> Result<Value> {
    let [v] = args_exact(m, "odd?", args)?;
    match v {
        Value::Int(i) => Ok(bool_int(i % 2 != 0)),
        _ => Err(KarstError::BadArg(format!(
            "odd? expects an integer, got {}",
            v.type_name()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn machine() -> Machine {
        let mut m = Machine::with_defaults();
        install(&mut m);
        m
    }

    fn call(m: &mut Machine, name: &str, args: &[Value]) -> Result<Value> {
        let f = m.global_lookup(name).expect("primitive installed");
        apply(m, f, args)
    }

    #[test]
    fn cons_car_cdr() {
        let mut m = machine();
        let p = call(&mut m, "cons", &[Value::Int(1), Value::Int(2)]).unwrap();
        assert_eq!(call(&mut m, "car", &[p]).unwrap(), Value::Int(1));
        assert_eq!(call(&mut m, "cdr", &[p]).unwrap(), Value::Int(2));
        assert!(call(&mut m, "car", &[Value::Int(1)]).is_err());
    }

    #[test]
    fn nav_decodes_paths_right_to_left() {
        let mut m = machine();
        let inner = m.make_list(&[Value::Int(10), Value::Int(20)]);
        let list = m.make_list(&[Value::Int(1), inner, Value::Int(3)]);
        let path = m.make_string("cadr");
        // (nav "cadr" list) = (car (cdr list)) = inner
        assert_eq!(call(&mut m, "nav", &[path, list]).unwrap(), inner);

        let path = m.make_string("caadr");
        assert_eq!(
            call(&mut m, "nav", &[path, list]).unwrap(),
            Value::Int(10)
        );

        let bad = m.make_string("cxr");
        assert!(call(&mut m, "nav", &[bad, list]).is_err());
    }

    #[test]
    fn identity_and_null_predicates() {
        let mut m = machine();
        let sym_a = m.intern("a");
        let sym_a2 = m.intern("A");
        assert_eq!(
            call(&mut m, "eq?", &[sym_a, sym_a2]).unwrap(),
            Value::Int(1)
        );
        let s1 = m.make_string("x");
        let s2 = m.make_string("x");
        assert_eq!(call(&mut m, "eq?", &[s1, s2]).unwrap(), Value::Int(0));
        assert_eq!(
            call(&mut m, "null?", &[Value::Null]).unwrap(),
            Value::Int(1)
        );
        assert_eq!(
            call(&mut m, "null?", &[Value::Int(0)]).unwrap(),
            Value::Int(0)
        );
    }

    #[test]
    fn list_building_primitives() {
        let mut m = machine();
        let l1 = m.make_list(&[Value::Int(1), Value::Int(2)]);
        let l2 = m.make_list(&[Value::Int(3)]);
        let joined = call(&mut m, "append", &[l1, l2]).unwrap();
        assert_eq!(
            m.heap().list_items(joined).unwrap(),
            vec![Value::Int(1), Value::Int(2), Value::Int(3)]
        );

        assert_eq!(
            call(&mut m, "length", &[joined]).unwrap(),
            Value::Int(3)
        );
        assert_eq!(
            call(&mut m, "nth", &[Value::Int(2), joined]).unwrap(),
            Value::Int(3)
        );
        assert_eq!(
            call(&mut m, "nth", &[Value::Int(9), joined]).unwrap_err(),
            KarstError::OutOfBounds { index: 9, length: 3 }
        );
    }

    #[test]
    fn reverse_rewires_in_place() {
        let mut m = machine();
        let l = m.make_list(&[Value::Int(1), Value::Int(2), Value::Int(3)]);
        let r = call(&mut m, "reverse!", &[l]).unwrap();
        assert_eq!(
            m.heap().list_items(r).unwrap(),
            vec![Value::Int(3), Value::Int(2), Value::Int(1)]
        );
        // The old head is now the last pair.
        assert_eq!(m.heap().cdr(l), Value::Null);
    }

    #[test]
    fn assoc_returns_the_entry_pair() {
        let mut m = machine();
        let ka = m.intern("a");
        let kb = m.intern("b");
        let ea = m.cons(ka, Value::Int(1));
        let eb = m.cons(kb, Value::Int(2));
        let alist = m.make_list(&[ea, eb]);
        assert_eq!(call(&mut m, "assoc", &[kb, alist]).unwrap(), eb);
        let kc = m.intern("c");
        assert_eq!(call(&mut m, "assoc", &[kc, alist]).unwrap(), Value::Null);
    }

    #[test]
    fn arithmetic_keeps_the_accumulator_kind() {
        let mut m = machine();
        assert_eq!(
            call(&mut m, "+", &[Value::Int(1), Value::Int(2), Value::Int(3)]).unwrap(),
            Value::Int(6)
        );
        assert_eq!(
            call(&mut m, "+", &[Value::Int(1), Value::Float(2.5)]).unwrap(),
            Value::Int(3)
        );
        assert_eq!(
            call(&mut m, "+", &[Value::Float(2.5), Value::Int(1)]).unwrap(),
            Value::Float(3.5)
        );
        assert_eq!(
            call(&mut m, "*", &[Value::Float(2.0), Value::Float(3.5)]).unwrap(),
            Value::Float(7.0)
        );
    }

    #[test]
    fn unary_minus_negates() {
        let mut m = machine();
        assert_eq!(call(&mut m, "-", &[Value::Int(5)]).unwrap(), Value::Int(-5));
        assert_eq!(
            call(&mut m, "-", &[Value::Float(1.5)]).unwrap(),
            Value::Float(-1.5)
        );
        assert_eq!(
            call(&mut m, "-", &[Value::Int(5), Value::Int(2)]).unwrap(),
            Value::Int(3)
        );
    }

    #[test]
    fn integer_division_by_zero_fails() {
        let mut m = machine();
        assert!(call(&mut m, "/", &[Value::Int(1), Value::Int(0)]).is_err());
        assert_eq!(
            call(&mut m, "/", &[Value::Int(7), Value::Int(2)]).unwrap(),
            Value::Int(3)
        );
    }

    #[test]
    fn comparisons_chain() {
        let mut m = machine();
        assert_eq!(
            call(
                &mut m,
                "<",
                &[Value::Int(1), Value::Int(2), Value::Int(3)]
            )
            .unwrap(),
            Value::Int(1)
        );
        assert_eq!(
            call(&mut m, "<", &[Value::Int(2), Value::Int(2)]).unwrap(),
            Value::Int(0)
        );
        assert_eq!(
            call(&mut m, "<=", &[Value::Int(2), Value::Int(2)]).unwrap(),
            Value::Int(1)
        );
        assert_eq!(
            call(&mut m, "=", &[Value::Int(2), Value::Float(2.0)]).unwrap(),
            Value::Int(1)
        );
    }

    #[test]
    fn parity_predicates_want_integers() {
        let mut m = machine();
        assert_eq!(
            call(&mut m, "even?", &[Value::Int(4)]).unwrap(),
            Value::Int(1)
        );
        assert_eq!(
            call(&mut m, "odd?", &[Value::Int(4)]).unwrap(),
            Value::Int(0)
        );
        assert_eq!(
            call(&mut m, "odd?", &[Value::Int(-3)]).unwrap(),
            Value::Int(1)
        );
        assert!(call(&mut m, "even?", &[Value::Float(4.0)]).is_err());
    }

    #[test]
    fn map_applies_primitives_and_lambdas() {
        let mut m = machine();
        let l = m.make_list(&[Value::Int(1), Value::Int(2)]);
        let f = m.global_lookup("even?").unwrap();
        let mapped = call(&mut m, "map", &[f, l]).unwrap();
        assert_eq!(
            m.heap().list_items(mapped).unwrap(),
            vec![Value::Int(0), Value::Int(1)]
        );
    }

    #[test]
    fn assert_passes_values_and_fails_on_zero() {
        let mut m = machine();
        let q = m.specials().quote;
        let form = m.make_list(&[q, Value::Int(0)]);
        assert_eq!(
            call(&mut m, "assert", &[Value::Int(7), form]).unwrap(),
            Value::Int(7)
        );
        let err = call(&mut m, "assert", &[Value::Int(0), form]).unwrap_err();
        assert!(err.to_string().contains("assertion failed"));
    }
}
