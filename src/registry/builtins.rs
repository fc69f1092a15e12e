//! Generic operators available in every registry created with
//! [`OperatorRegistry::with_builtins`].
//!
//! | name    | arity  | result                                         |
//! |---------|--------|------------------------------------------------|
//! | `max`   | 1..    | largest element over all arguments             |
//! | `min`   | 1..    | smallest element over all arguments            |
//! | `sum`   | 1..    | sum of all elements, `0` when empty            |
//! | `avg`   | 1..    | arithmetic mean of all elements                |
//! | `len`   | 1      | number of elements                             |
//! | `count` | 1      | number of truthy elements                      |
//! | `all`   | 1      | every element truthy, `true` when empty        |
//! | `any`   | 1      | some element truthy, `false` when empty        |
//! | `abs`   | 1      | absolute value, elementwise on sequences       |
//! | `round` | 1..=2  | round to N decimal digits (default 0)          |

use super::OperatorRegistry;
use crate::eval::evaluator::{EvalError, EvalResult};
use crate::value::Value;

pub fn register_builtins(registry: &OperatorRegistry) {
    registry.register("max", 1, None, max);
    registry.register("min", 1, None, min);
    registry.register("sum", 1, None, sum);
    registry.register("avg", 1, None, avg);
    registry.register("len", 1, Some(1), len);
    registry.register("count", 1, Some(1), count);
    registry.register("all", 1, Some(1), all);
    registry.register("any", 1, Some(1), any);
    registry.register("abs", 1, Some(1), abs);
    registry.register("round", 1, Some(2), round);
}

fn non_numeric(name: &str) -> EvalError {
    EvalError::Arithmetic(format!("{}() expects numeric arguments, found boolean", name))
}

/// All elements of all arguments, in order.
fn flatten(name: &str, args: &[Value]) -> EvalResult<Vec<f64>> {
    let mut numbers = Vec::new();
    for arg in args {
        numbers.extend(arg.to_numbers().map_err(|_| non_numeric(name))?);
    }
    Ok(numbers)
}

fn reduce(name: &str, args: &[Value], f: fn(f64, f64) -> f64) -> EvalResult<Value> {
    flatten(name, args)?
        .into_iter()
        .reduce(f)
        .map(Value::Scalar)
        .ok_or_else(|| EvalError::Arithmetic(format!("{}() of an empty sequence", name)))
}

fn max(args: &[Value]) -> EvalResult<Value> {
    reduce("max", args, f64::max)
}

fn min(args: &[Value]) -> EvalResult<Value> {
    reduce("min", args, f64::min)
}

fn sum(args: &[Value]) -> EvalResult<Value> {
    Ok(Value::Scalar(flatten("sum", args)?.iter().sum()))
}

fn avg(args: &[Value]) -> EvalResult<Value> {
    let numbers = flatten("avg", args)?;
    if numbers.is_empty() {
        return Err(EvalError::Arithmetic("avg() of an empty sequence".to_string()));
    }
    Ok(Value::Scalar(
        numbers.iter().sum::<f64>() / numbers.len() as f64,
    ))
}

fn len(args: &[Value]) -> EvalResult<Value> {
    match &args[0] {
        Value::Sequence(xs) => Ok(Value::Scalar(xs.len() as f64)),
        Value::Scalar(_) => Ok(Value::Scalar(1.0)),
        Value::Boolean(_) => Err(non_numeric("len")),
    }
}

fn count(args: &[Value]) -> EvalResult<Value> {
    let truthy = args[0].truth_elements().into_iter().filter(|b| *b).count();
    Ok(Value::Scalar(truthy as f64))
}

fn all(args: &[Value]) -> EvalResult<Value> {
    Ok(Value::Boolean(match &args[0] {
        Value::Sequence(xs) => xs.iter().all(|x| *x != 0.0),
        other => other.is_truthy(),
    }))
}

fn any(args: &[Value]) -> EvalResult<Value> {
    Ok(Value::Boolean(match &args[0] {
        Value::Sequence(xs) => xs.iter().any(|x| *x != 0.0),
        other => other.is_truthy(),
    }))
}

fn map_numeric(name: &str, value: &Value, f: impl Fn(f64) -> f64) -> EvalResult<Value> {
    match value {
        Value::Scalar(x) => Ok(Value::Scalar(f(*x))),
        Value::Sequence(xs) => Ok(Value::Sequence(xs.iter().map(|x| f(*x)).collect())),
        Value::Boolean(_) => Err(non_numeric(name)),
    }
}

fn abs(args: &[Value]) -> EvalResult<Value> {
    map_numeric("abs", &args[0], f64::abs)
}

fn round(args: &[Value]) -> EvalResult<Value> {
    let digits = match args.get(1) {
        None => 0,
        Some(Value::Scalar(d)) if d.fract() == 0.0 && d.abs() <= 15.0 => *d as i32,
        Some(other) => {
            return Err(EvalError::Arithmetic(format!(
                "round() digits must be a whole number between -15 and 15, found {}",
                other
            )))
        }
    };
    let factor = 10f64.powi(digits);
    map_numeric("round", &args[0], |x| (x * factor).round() / factor)
}
