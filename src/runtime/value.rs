use std::cmp::Ordering;

use num_bigint::BigInt;
use num_traits::{FromPrimitive, Signed, ToPrimitive, Zero};

use crate::ast::{BinaryOperator, UnaryOperator};
use crate::runtime::dict::Dict;
use crate::runtime::error::{IndexFault, OperationError};

pub type OpResult<T> = Result<T, OperationError>;

/// Longest string or list a repetition may build.
pub const MAX_REPEAT_LEN: usize = 1 << 30;

/// Dynamically typed runtime value.
#[derive(Debug, Clone)]
pub enum Value {
    None,
    Bool(bool),
    Int(BigInt),
    Real(f64),
    Str(String),
    List(Vec<Value>),
    Dict(Dict),
}

#[derive(Debug, Clone)]
enum Number {
    Int(BigInt),
    Real(f64),
}

impl Number {
    fn to_f64(&self) -> OpResult<f64> {
        match self {
            Number::Int(value) => value
                .to_f64()
                .filter(|value| value.is_finite())
                .ok_or(OperationError::IntTooLarge),
            Number::Real(value) => Ok(*value),
        }
    }

    fn is_zero(&self) -> bool {
        match self {
            Number::Int(value) => value.is_zero(),
            Number::Real(value) => *value == 0.0,
        }
    }

    /// Exact ordering; an int is never rounded to a float to compare it.
    fn partial_cmp(&self, other: &Number) -> Option<Ordering> {
        match (self, other) {
            (Number::Int(left), Number::Int(right)) => Some(left.cmp(right)),
            (Number::Int(left), Number::Real(right)) => compare_int_real(left, *right),
            (Number::Real(left), Number::Int(right)) => {
                compare_int_real(right, *left).map(Ordering::reverse)
            }
            (Number::Real(left), Number::Real(right)) => left.partial_cmp(right),
        }
    }
}

fn compare_int_real(int: &BigInt, real: f64) -> Option<Ordering> {
    if real.is_nan() {
        return None;
    }
    if real.is_infinite() {
        return Some(if real > 0.0 {
            Ordering::Less
        } else {
            Ordering::Greater
        });
    }
    let floor = BigInt::from_f64(real.floor())?;
    match int.cmp(&floor) {
        Ordering::Equal if real.fract() != 0.0 => Some(Ordering::Less),
        ordering => Some(ordering),
    }
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::None => "NoneType",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Real(_) => "float",
            Value::Str(_) => "str",
            Value::List(_) => "list",
            Value::Dict(_) => "dict",
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::None => false,
            Value::Bool(value) => *value,
            Value::Int(value) => !value.is_zero(),
            Value::Real(value) => *value != 0.0,
            Value::Str(value) => !value.is_empty(),
            Value::List(values) => !values.is_empty(),
            Value::Dict(dict) => !dict.is_empty(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(value) => Some(value),
            _ => None,
        }
    }

    /// Text form used by `print`: strings render bare, everything else as [`Value::repr`].
    pub fn to_output(&self) -> String {
        match self {
            Value::Str(value) => value.clone(),
            other => other.repr(),
        }
    }

    /// Python-style `repr`, used inside containers and in error messages.
    pub fn repr(&self) -> String {
        match self {
            Value::None => "None".to_string(),
            Value::Bool(true) => "True".to_string(),
            Value::Bool(false) => "False".to_string(),
            Value::Int(value) => value.to_string(),
            Value::Real(value) => format_real(*value),
            Value::Str(value) => quote(value),
            Value::List(values) => {
                let rendered = values.iter().map(Value::repr).collect::<Vec<_>>();
                format!("[{}]", rendered.join(", "))
            }
            Value::Dict(dict) => {
                let rendered = dict
                    .iter()
                    .map(|(key, value)| format!("{}: {}", key.repr(), value.repr()))
                    .collect::<Vec<_>>();
                format!("{{{}}}", rendered.join(", "))
            }
        }
    }

    fn as_number(&self) -> Option<Number> {
        match self {
            Value::Bool(value) => Some(Number::Int(BigInt::from(u8::from(*value)))),
            Value::Int(value) => Some(Number::Int(value.clone())),
            Value::Real(value) => Some(Number::Real(*value)),
            _ => None,
        }
    }

    /// Copies of a sequence of `unit_len` elements; `None` when `self` is not an integer.
    fn as_repeat_count(&self, unit_len: usize) -> Option<OpResult<usize>> {
        let Number::Int(count) = self.as_number()? else {
            return None;
        };
        if count.is_negative() || unit_len == 0 {
            return Some(Ok(0));
        }
        let count = count
            .to_usize()
            .filter(|count| unit_len.checked_mul(*count).is_some_and(|len| len <= MAX_REPEAT_LEN))
            .ok_or(OperationError::RepeatTooLarge {
                limit: MAX_REPEAT_LEN,
            });
        Some(count)
    }

    /// Applies an arithmetic, logical or comparison operator to two evaluated operands.
    pub fn binary(&self, op: BinaryOperator, rhs: &Value) -> OpResult<Value> {
        match op {
            BinaryOperator::Add => self.add(rhs),
            BinaryOperator::Sub => self.numeric(rhs, op, |a, b| a - b, |a, b| a - b),
            BinaryOperator::Mul => self.mul(rhs),
            BinaryOperator::Div => self.div(rhs),
            BinaryOperator::And => Ok(if self.is_truthy() {
                rhs.clone()
            } else {
                self.clone()
            }),
            BinaryOperator::Or => Ok(if self.is_truthy() {
                self.clone()
            } else {
                rhs.clone()
            }),
            BinaryOperator::Equal => Ok(Value::Bool(self == rhs)),
            BinaryOperator::NotEqual => Ok(Value::Bool(self != rhs)),
            BinaryOperator::Less
            | BinaryOperator::Greater
            | BinaryOperator::LessEqual
            | BinaryOperator::GreaterEqual => {
                let ordering = self
                    .compare(rhs)
                    .ok_or_else(|| unsupported(op, self, rhs))?;
                let result = match (op, ordering) {
                    (_, None) => false,
                    (BinaryOperator::Less, Some(ordering)) => ordering.is_lt(),
                    (BinaryOperator::Greater, Some(ordering)) => ordering.is_gt(),
                    (BinaryOperator::LessEqual, Some(ordering)) => ordering.is_le(),
                    (_, Some(ordering)) => ordering.is_ge(),
                };
                Ok(Value::Bool(result))
            }
        }
    }

    pub fn unary(&self, op: UnaryOperator) -> OpResult<Value> {
        let bad_operand = || OperationError::UnsupportedOperand {
            op: op.symbol(),
            operand: self.type_name(),
        };
        match op {
            UnaryOperator::Not => Ok(Value::Bool(!self.is_truthy())),
            UnaryOperator::Plus => match self.as_number().ok_or_else(bad_operand)? {
                Number::Int(value) => Ok(Value::Int(value)),
                Number::Real(value) => Ok(Value::Real(value)),
            },
            UnaryOperator::Minus => match self.as_number().ok_or_else(bad_operand)? {
                Number::Int(value) => Ok(Value::Int(-value)),
                Number::Real(value) => Ok(Value::Real(-value)),
            },
        }
    }

    fn add(&self, rhs: &Value) -> OpResult<Value> {
        match (self, rhs) {
            (Value::Str(left), Value::Str(right)) => Ok(Value::Str(format!("{left}{right}"))),
            (Value::List(left), Value::List(right)) => {
                Ok(Value::List(left.iter().chain(right).cloned().collect()))
            }
            _ => self.numeric(rhs, BinaryOperator::Add, |a, b| a + b, |a, b| a + b),
        }
    }

    fn mul(&self, rhs: &Value) -> OpResult<Value> {
        match (self, rhs) {
            (Value::Str(text), count) | (count, Value::Str(text)) => {
                let count = count
                    .as_repeat_count(text.len())
                    .ok_or_else(|| unsupported(BinaryOperator::Mul, self, rhs))??;
                Ok(Value::Str(text.repeat(count)))
            }
            (Value::List(values), count) | (count, Value::List(values)) => {
                let count = count
                    .as_repeat_count(values.len())
                    .ok_or_else(|| unsupported(BinaryOperator::Mul, self, rhs))??;
                Ok(Value::List(
                    std::iter::repeat_n(values.iter(), count)
                        .flatten()
                        .cloned()
                        .collect(),
                ))
            }
            _ => self.numeric(rhs, BinaryOperator::Mul, |a, b| a * b, |a, b| a * b),
        }
    }

    /// True division: the result is always a float.
    fn div(&self, rhs: &Value) -> OpResult<Value> {
        let (Some(left), Some(right)) = (self.as_number(), rhs.as_number()) else {
            return Err(unsupported(BinaryOperator::Div, self, rhs));
        };
        if right.is_zero() {
            return Err(OperationError::DivisionByZero);
        }
        Ok(Value::Real(left.to_f64()? / right.to_f64()?))
    }

    fn numeric(
        &self,
        rhs: &Value,
        op: BinaryOperator,
        int_op: fn(BigInt, BigInt) -> BigInt,
        real_op: fn(f64, f64) -> f64,
    ) -> OpResult<Value> {
        let (Some(left), Some(right)) = (self.as_number(), rhs.as_number()) else {
            return Err(unsupported(op, self, rhs));
        };
        match (left, right) {
            (Number::Int(left), Number::Int(right)) => Ok(Value::Int(int_op(left, right))),
            (left, right) => Ok(Value::Real(real_op(left.to_f64()?, right.to_f64()?))),
        }
    }

    /// Ordering between comparable values. `None` means the types cannot be
    /// ordered; `Some(None)` means comparable but unordered (NaN).
    fn compare(&self, rhs: &Value) -> Option<Option<Ordering>> {
        if let (Some(left), Some(right)) = (self.as_number(), rhs.as_number()) {
            return Some(left.partial_cmp(&right));
        }
        match (self, rhs) {
            (Value::Str(left), Value::Str(right)) => Some(Some(left.cmp(right))),
            (Value::List(left), Value::List(right)) => {
                for (left, right) in left.iter().zip(right) {
                    if left != right {
                        return left.compare(right);
                    }
                }
                Some(Some(left.len().cmp(&right.len())))
            }
            _ => None,
        }
    }

    /// Subscript lookup for dicts (by key), lists and strings (by position).
    pub fn index(&self, index: &Value) -> Result<Value, IndexFault> {
        match self {
            Value::Dict(dict) => match dict.get(index) {
                Ok(Some(value)) => Ok(value.clone()),
                Ok(None) => Err(IndexFault::MissingKey { key: index.repr() }),
                Err(_) => Err(IndexFault::InvalidIndexType {
                    container: "dict",
                    index: index.type_name(),
                }),
            },
            Value::List(values) => {
                let position = sequence_position("list", index, values.len())?;
                Ok(values[position].clone())
            }
            Value::Str(text) => {
                let position = sequence_position("str", index, text.chars().count())?;
                Ok(text
                    .chars()
                    .nth(position)
                    .map(|c| Value::Str(c.to_string()))
                    .unwrap_or(Value::None))
            }
            other => Err(IndexFault::NotSubscriptable {
                type_name: other.type_name(),
            }),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        if let (Some(left), Some(right)) = (self.as_number(), other.as_number()) {
            return left.partial_cmp(&right) == Some(Ordering::Equal);
        }
        match (self, other) {
            (Value::None, Value::None) => true,
            (Value::Str(left), Value::Str(right)) => left == right,
            (Value::List(left), Value::List(right)) => left == right,
            (Value::Dict(left), Value::Dict(right)) => left == right,
            _ => false,
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.to_string())
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(BigInt::from(value))
    }
}

impl From<BigInt> for Value {
    fn from(value: BigInt) -> Self {
        Value::Int(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

fn unsupported(op: BinaryOperator, left: &Value, right: &Value) -> OperationError {
    OperationError::UnsupportedOperands {
        op: op.symbol(),
        left: left.type_name(),
        right: right.type_name(),
    }
}

/// Resolves a possibly negative position against a sequence length.
fn sequence_position(container: &'static str, index: &Value, len: usize) -> Result<usize, IndexFault> {
    let raw = match index {
        Value::Int(value) => value.clone(),
        Value::Bool(value) => BigInt::from(u8::from(*value)),
        other => {
            return Err(IndexFault::InvalidIndexType {
                container,
                index: other.type_name(),
            });
        }
    };
    let resolved = if raw.is_negative() {
        &raw + BigInt::from(len)
    } else {
        raw.clone()
    };
    resolved
        .to_usize()
        .filter(|position| *position < len)
        .ok_or(IndexFault::OutOfRange {
            container,
            index: raw,
            len,
        })
}

fn format_real(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    let magnitude = value.abs();
    if magnitude != 0.0 && !(1e-4..1e16).contains(&magnitude) {
        // Rust renders `1e20`, Python `1e+20`.
        let rendered = format!("{value:e}");
        let (mantissa, exponent) = rendered.split_once('e').unwrap_or((&rendered, "0"));
        let exponent: i32 = exponent.parse().unwrap_or(0);
        let sign = if exponent < 0 { '-' } else { '+' };
        return format!("{mantissa}e{sign}{:02}", exponent.abs());
    }
    if value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        value.to_string()
    }
}

fn quote(text: &str) -> String {
    let delimiter = if text.contains('\'') && !text.contains('"') {
        '"'
    } else {
        '\''
    };
    let mut quoted = String::with_capacity(text.len() + 2);
    quoted.push(delimiter);
    for c in text.chars() {
        match c {
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            '\r' => quoted.push_str("\\r"),
            '\t' => quoted.push_str("\\t"),
            c if c == delimiter => {
                quoted.push('\\');
                quoted.push(c);
            }
            c => quoted.push(c),
        }
    }
    quoted.push(delimiter);
    quoted
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int(value: i64) -> Value {
        Value::from(value)
    }

    fn big(digits: &str) -> Value {
        Value::Int(digits.parse().expect("valid digits"))
    }

    fn eval(left: Value, op: BinaryOperator, right: Value) -> OpResult<Value> {
        left.binary(op, &right)
    }

    #[test]
    fn arithmetic_follows_numeric_promotion() {
        assert_eq!(
            eval(int(2), BinaryOperator::Add, int(3)),
            Ok(int(5))
        );
        assert_eq!(
            eval(int(2), BinaryOperator::Mul, Value::Real(1.5)),
            Ok(Value::Real(3.0))
        );
        assert_eq!(
            eval(Value::Bool(true), BinaryOperator::Add, int(1)),
            Ok(int(2))
        );
        assert_eq!(
            eval(int(7), BinaryOperator::Div, int(2)),
            Ok(Value::Real(3.5))
        );
        assert_eq!(
            eval(int(1), BinaryOperator::Div, int(0)),
            Err(OperationError::DivisionByZero)
        );
    }

    #[test]
    fn integers_grow_past_machine_width() {
        assert_eq!(
            eval(int(i64::MAX), BinaryOperator::Add, int(1)),
            Ok(big("9223372036854775808"))
        );
        assert_eq!(
            eval(int(10_000_000_000), BinaryOperator::Mul, int(10_000_000_000)),
            Ok(big("100000000000000000000"))
        );
        assert_eq!(
            int(i64::MIN).unary(UnaryOperator::Minus),
            Ok(big("9223372036854775808"))
        );
        assert_eq!(
            eval(big(&"9".repeat(400)), BinaryOperator::Add, Value::Real(1.0)),
            Err(OperationError::IntTooLarge)
        );
    }

    #[test]
    fn compares_ints_and_reals_exactly() {
        // 2**53 + 1 has no exact f64; rounding it would make these equal.
        let above = int(9_007_199_254_740_993);
        let real = Value::Real(9_007_199_254_740_992.0);
        assert_ne!(above, real);
        assert_eq!(eval(above, BinaryOperator::Greater, real), Ok(Value::Bool(true)));
        assert_eq!(int(3), Value::Real(3.0));
        assert_eq!(
            eval(int(2), BinaryOperator::Less, Value::Real(2.5)),
            Ok(Value::Bool(true))
        );
        assert_eq!(
            eval(big(&"9".repeat(400)), BinaryOperator::Less, Value::Real(f64::INFINITY)),
            Ok(Value::Bool(true))
        );
    }

    #[test]
    fn concatenates_and_repeats_sequences() {
        assert_eq!(
            eval("ab".into(), BinaryOperator::Add, "cd".into()),
            Ok("abcd".into())
        );
        assert_eq!(
            eval("ab".into(), BinaryOperator::Mul, int(3)),
            Ok("ababab".into())
        );
        assert_eq!(
            eval(
                int(2),
                BinaryOperator::Mul,
                Value::List(vec![int(1)])
            ),
            Ok(Value::List(vec![int(1), int(1)]))
        );
        assert_eq!(
            eval("ab".into(), BinaryOperator::Mul, int(-2)),
            Ok("".into())
        );
        assert_eq!(
            eval("ab".into(), BinaryOperator::Mul, int(i64::MAX)),
            Err(OperationError::RepeatTooLarge {
                limit: MAX_REPEAT_LEN
            })
        );
        assert_eq!(
            eval(
                Value::List(vec![int(1)]),
                BinaryOperator::Mul,
                big("99999999999999999999999")
            ),
            Err(OperationError::RepeatTooLarge {
                limit: MAX_REPEAT_LEN
            })
        );
        assert_eq!(
            eval("a".into(), BinaryOperator::Add, int(1)),
            Err(OperationError::UnsupportedOperands {
                op: "+",
                left: "str",
                right: "int"
            })
        );
    }

    #[test]
    fn logical_operators_return_operands() {
        assert_eq!(
            eval(int(0), BinaryOperator::And, "x".into()),
            Ok(int(0))
        );
        assert_eq!(
            eval(int(2), BinaryOperator::And, "x".into()),
            Ok("x".into())
        );
        assert_eq!(
            eval(Value::None, BinaryOperator::Or, Value::Bool(false)),
            Ok(Value::Bool(false))
        );
        assert_eq!(
            eval("a".into(), BinaryOperator::Or, Value::None),
            Ok("a".into())
        );
    }

    #[test]
    fn compares_numbers_strings_and_lists() {
        assert_eq!(
            eval(int(1), BinaryOperator::Equal, Value::Real(1.0)),
            Ok(Value::Bool(true))
        );
        assert_eq!(
            eval("apple".into(), BinaryOperator::Less, "banana".into()),
            Ok(Value::Bool(true))
        );
        assert_eq!(
            eval(
                Value::List(vec![int(1), int(2)]),
                BinaryOperator::GreaterEqual,
                Value::List(vec![int(1)])
            ),
            Ok(Value::Bool(true))
        );
        assert_eq!(
            eval(Value::Real(f64::NAN), BinaryOperator::LessEqual, int(1)),
            Ok(Value::Bool(false))
        );
        assert_eq!(
            eval("a".into(), BinaryOperator::Less, int(1)),
            Err(OperationError::UnsupportedOperands {
                op: "<",
                left: "str",
                right: "int"
            })
        );
        assert_eq!(
            eval(Value::None, BinaryOperator::NotEqual, int(0)),
            Ok(Value::Bool(true))
        );
    }

    #[test]
    fn unary_operators() {
        assert_eq!(Value::Bool(true).unary(UnaryOperator::Minus), Ok(int(-1)));
        assert_eq!(Value::Real(2.5).unary(UnaryOperator::Plus), Ok(Value::Real(2.5)));
        assert_eq!(Value::Str(String::new()).unary(UnaryOperator::Not), Ok(Value::Bool(true)));
        assert_eq!(
            Value::from("x").unary(UnaryOperator::Minus),
            Err(OperationError::UnsupportedOperand {
                op: "-",
                operand: "str"
            })
        );
    }

    #[test]
    fn indexes_lists_strings_and_dicts() {
        let list = Value::List(vec![int(10), int(20)]);
        assert_eq!(list.index(&int(-1)), Ok(int(20)));
        assert_eq!(
            list.index(&int(2)),
            Err(IndexFault::OutOfRange {
                container: "list",
                index: 2.into(),
                len: 2
            })
        );
        assert_eq!(
            list.index(&"0".into()),
            Err(IndexFault::InvalidIndexType {
                container: "list",
                index: "str"
            })
        );
        assert_eq!(Value::from("héllo").index(&int(1)), Ok("é".into()));

        let mut dict = Dict::new();
        dict.insert("k".into(), int(1)).expect("insert should work");
        let dict = Value::Dict(dict);
        assert_eq!(dict.index(&"k".into()), Ok(int(1)));
        assert_eq!(
            dict.index(&"missing".into()),
            Err(IndexFault::MissingKey {
                key: "'missing'".to_string()
            })
        );
        assert_eq!(
            int(3).index(&int(0)),
            Err(IndexFault::NotSubscriptable { type_name: "int" })
        );
    }

    #[test]
    fn renders_like_python() {
        assert_eq!(Value::Real(2.0).to_output(), "2.0");
        assert_eq!(Value::Real(0.1 + 0.2).to_output(), "0.30000000000000004");
        assert_eq!(Value::Real(1e20).to_output(), "1e+20");
        assert_eq!(Value::Real(0.00001).to_output(), "1e-05");
        assert_eq!(Value::Bool(false).to_output(), "False");
        assert_eq!(Value::None.to_output(), "None");
        assert_eq!(
            Value::List(vec!["it's".into(), int(1), Value::None]).to_output(),
            "[\"it's\", 1, None]"
        );
    }
}
