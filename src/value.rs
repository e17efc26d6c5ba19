//! Runtime values seen by assertions.
//!
//! A [`Value`] is either a scalar (`nil`, booleans, numbers, strings,
//! functions) or a [`Table`], the one composite kind. Tables carry two
//! facets that equality and the shape predicates inspect separately:
//!
//! - a **sequential facet**: a dense run of positional entries, addressed by
//!   integer keys `1..=len`
//! - an **associative facet**: any other key/value entries
//!
//! Tables are immutable once wrapped in a [`Value`] and shared through
//! [`Rc`], so a composite can never contain itself.

use std::any::Any;
use std::cell::Cell;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;
use std::sync::Once;

/// Maximum number of call delegations followed before giving up.
pub const MAX_DELEGATION_DEPTH: usize = 32;

/// Signature of every native function a [`Value`] can hold. `Err` carries the
/// raised payload.
pub type NativeFn = dyn Fn(&[Value]) -> Result<Value, Value>;

// ============================================================================
// VALUE
// ============================================================================

/// A dynamically typed value.
///
/// # Examples
///
/// ```rust
/// use tally::value::Value;
/// let n = Value::from(3);
/// assert_eq!(n.kind(), "number");
/// let nil = Value::default();
/// assert!(nil.is_nil());
/// assert!(!nil.is_truthy());
/// ```
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Nil,
    Boolean(bool),
    Number(f64),
    String(String),
    Table(Rc<Table>),
    Function(Function),
}

impl Value {
    /// Returns the kind tag of the value.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Boolean(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Table(_) => "table",
            Value::Function(_) => "function",
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    /// `nil` and `false` are the only falsy values; `0`, `""` and empty tables
    /// are truthy.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Nil | Value::Boolean(false))
    }

    pub fn as_table(&self) -> Option<&Table> {
        match self {
            Value::Table(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Builds a table whose sequential facet holds `items`.
    ///
    /// ```rust
    /// use tally::value::Value;
    /// let list = Value::list([1, 2, 3]);
    /// assert_eq!(list.as_table().map(|t| t.len()), Some(3));
    /// ```
    pub fn list<I, V>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Value::from(Table::from_seq(items.into_iter().map(Into::into)))
    }

    /// Builds a table from string-keyed entries.
    pub fn record<'a, I, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, V)>,
        V: Into<Value>,
    {
        let mut table = Table::new();
        for (key, value) in entries {
            table.insert(Key::from(key), value.into());
        }
        Value::from(table)
    }

    /// Wraps a closure as a function value.
    pub fn function<F>(f: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, Value> + 'static,
    {
        Value::Function(Function::new(f))
    }

    /// Invokes the value, following table call delegation.
    pub fn call(&self, args: &[Value]) -> Result<Value, Value> {
        self.call_at_depth(args, 0)
    }

    fn call_at_depth(&self, args: &[Value], depth: usize) -> Result<Value, Value> {
        match self {
            Value::Function(f) => f.invoke(args),
            Value::Table(t) => match t.call_target() {
                Some(target) if depth < MAX_DELEGATION_DEPTH => {
                    target.call_at_depth(args, depth + 1)
                }
                Some(_) => Err(Value::from("call delegation nested too deeply")),
                None => Err(Value::from("attempt to call a table value")),
            },
            other => Err(Value::from(format!(
                "attempt to call a {} value",
                other.kind()
            ))),
        }
    }

    /// Single-line rendering with strings quoted, as they appear inside a table.
    pub fn repr(&self) -> String {
        NestedDisplay(self).to_string()
    }

    /// Multi-line rendering used for failure diffs.
    pub fn pretty(&self) -> String {
        let mut out = String::new();
        self.write_pretty(&mut out, 0);
        out
    }

    fn write_pretty(&self, out: &mut String, indent: usize) {
        let Value::Table(table) = self else {
            out.push_str(&self.repr());
            return;
        };
        if table.is_empty() {
            out.push_str("{}");
            return;
        }
        let pad = "  ".repeat(indent + 1);
        out.push_str("{\n");
        for item in table.positional() {
            out.push_str(&pad);
            item.write_pretty(out, indent + 1);
            out.push_str(",\n");
        }
        for (key, item) in table.associative() {
            out.push_str(&pad);
            out.push_str(&format!("{key} = "));
            item.write_pretty(out, indent + 1);
            out.push_str(",\n");
        }
        out.push_str(&"  ".repeat(indent));
        out.push('}');
    }
}

thread_local! {
    /// How many [`capture`] calls are active on this thread.
    static CAPTURING: Cell<usize> = const { Cell::new(0) };
}

/// Installs, once per process, a panic hook that stays silent for panics
/// raised inside [`capture`] and defers to the previous hook otherwise.
fn install_quiet_hook() {
    static INSTALL: Once = Once::new();
    INSTALL.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if CAPTURING.with(Cell::get) == 0 {
                previous(info);
            }
        }));
    });
}

/// Runs `body`, turning a Rust panic into a raised payload.
///
/// The payload of a panic is its message when it has one. Captured panics
/// are not printed by the panic hook.
pub fn capture<T>(body: impl FnOnce() -> Result<T, Value>) -> Result<T, Value> {
    install_quiet_hook();
    CAPTURING.with(|depth| depth.set(depth.get() + 1));
    let outcome = panic::catch_unwind(AssertUnwindSafe(body));
    CAPTURING.with(|depth| depth.set(depth.get() - 1));
    match outcome {
        Ok(result) => result,
        Err(panic) => Err(panic_payload(panic.as_ref())),
    }
}

fn panic_payload(panic: &(dyn Any + Send)) -> Value {
    if let Some(message) = panic.downcast_ref::<&str>() {
        return Value::from(*message);
    }
    if let Some(message) = panic.downcast_ref::<String>() {
        return Value::from(message.clone());
    }
    Value::from("panic")
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        crate::equality::equal(self, other)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Table> for Value {
    fn from(t: Table) -> Self {
        Value::Table(Rc::new(t))
    }
}

impl From<Function> for Value {
    fn from(f: Function) -> Self {
        Value::Function(f)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Nil, Into::into)
    }
}

fn fmt_number(f: &mut fmt::Formatter<'_>, n: f64) -> fmt::Result {
    if n == 0.0 && n.is_sign_negative() {
        return write!(f, "-0");
    }
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        write!(f, "{}", n as i64)
    } else {
        write!(f, "{}", n)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Number(n) => fmt_number(f, *n),
            Value::String(s) => write!(f, "{}", s),
            Value::Table(t) => write!(f, "{}", t),
            Value::Function(func) => write!(f, "{}", func),
        }
    }
}

/// Displays strings quoted, for values nested inside a composite.
struct NestedDisplay<'a>(&'a Value);

impl fmt::Display for NestedDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Value::String(s) => write!(f, "{:?}", s),
            other => write!(f, "{}", other),
        }
    }
}

// ============================================================================
// KEYS AND TABLES
// ============================================================================

/// Numbers in `-2^63..2^63` convert to `i64` without saturating.
const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;

/// A table key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Key {
    Integer(i64),
    /// A number with a fraction, or one too large for [`Key::Integer`].
    Number(NumberKey),
    Boolean(bool),
    String(String),
}

impl Key {
    /// Converts a value into a key. Numbers (except NaN), booleans and
    /// strings can index a table; integral numbers in `i64` range become
    /// [`Key::Integer`].
    pub fn from_value(value: &Value) -> Option<Key> {
        match value {
            Value::Number(n) if n.is_nan() => None,
            Value::Number(n) if n.fract() == 0.0 && (-I64_BOUND..I64_BOUND).contains(n) => {
                Some(Key::Integer(*n as i64))
            }
            Value::Number(n) => Some(Key::Number(NumberKey(*n))),
            Value::Boolean(b) => Some(Key::Boolean(*b)),
            Value::String(s) => Some(Key::String(s.clone())),
            _ => None,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Key::Integer(n) => Value::from(*n),
            Key::Number(n) => Value::from(n.0),
            Key::Boolean(b) => Value::from(*b),
            Key::String(s) => Value::from(s.as_str()),
        }
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Key::String(s.to_string())
    }
}

impl From<i64> for Key {
    fn from(n: i64) -> Self {
        Key::Integer(n)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Integer(n) => write!(f, "[{}]", n),
            Key::Number(n) => {
                write!(f, "[")?;
                fmt_number(f, n.0)?;
                write!(f, "]")
            }
            Key::Boolean(b) => write!(f, "[{}]", b),
            Key::String(s) => write!(f, "{}", s),
        }
    }
}

/// A non-NaN numeric key, ordered with [`f64::total_cmp`].
#[derive(Debug, Clone, Copy)]
pub struct NumberKey(f64);

impl NumberKey {
    pub fn get(self) -> f64 {
        self.0
    }
}

impl PartialEq for NumberKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for NumberKey {}

impl PartialOrd for NumberKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for NumberKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl Hash for NumberKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

/// The composite value.
///
/// Positional entries always live in the sequential facet: inserting key
/// `len + 1` extends it and pulls any following integer keys out of the
/// associative facet, and inserting `nil` removes an entry.
#[derive(Debug, Clone, Default)]
pub struct Table {
    seq: Vec<Value>,
    map: BTreeMap<Key, Value>,
    call: Option<Value>,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_seq<I: IntoIterator<Item = Value>>(items: I) -> Self {
        let mut table = Self::new();
        for (index, item) in items.into_iter().enumerate() {
            table.insert(Key::Integer(index as i64 + 1), item);
        }
        table
    }

    /// Attaches a call capability: calling the table calls `target`.
    pub fn with_call(mut self, target: Value) -> Self {
        self.call = Some(target);
        self
    }

    pub fn call_target(&self) -> Option<&Value> {
        self.call.as_ref()
    }

    pub fn insert(&mut self, key: Key, value: Value) {
        if let Key::Integer(n) = key {
            let len = self.seq.len() as i64;
            if (1..=len).contains(&n) {
                let index = (n - 1) as usize;
                if value.is_nil() {
                    // The run ends before `n`; everything after it becomes associative.
                    let tail = self.seq.split_off(index);
                    for (offset, item) in tail.into_iter().enumerate().skip(1) {
                        self.map.insert(Key::Integer(n + offset as i64), item);
                    }
                } else {
                    self.seq[index] = value;
                }
                return;
            }
            if n == len + 1 && !value.is_nil() {
                self.seq.push(value);
                self.absorb_following();
                return;
            }
        }
        if value.is_nil() {
            self.map.remove(&key);
        } else {
            self.map.insert(key, value);
        }
    }

    fn absorb_following(&mut self) {
        while let Some(next) = self.map.remove(&Key::Integer(self.seq.len() as i64 + 1)) {
            self.seq.push(next);
        }
    }

    /// Looks up `key`, returning `nil` when absent.
    pub fn get(&self, key: &Key) -> Value {
        if let Key::Integer(n) = key {
            if let Some(item) = self.positional_at(*n) {
                return item.clone();
            }
        }
        self.map.get(key).cloned().unwrap_or_default()
    }

    /// Looks up the 1-based position `n` of the sequential facet.
    pub fn get_index(&self, n: i64) -> Value {
        self.positional_at(n).cloned().unwrap_or_default()
    }

    fn positional_at(&self, n: i64) -> Option<&Value> {
        usize::try_from(n)
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|index| self.seq.get(index))
    }

    /// Length of the sequential facet.
    pub fn len(&self) -> usize {
        self.seq.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seq.is_empty() && self.map.is_empty()
    }

    pub fn positional(&self) -> &[Value] {
        &self.seq
    }

    /// Entries outside the sequential facet.
    pub fn associative(&self) -> impl Iterator<Item = (&Key, &Value)> {
        self.map.iter()
    }

    /// Every entry: positional ones first, in order, then associative ones.
    pub fn entries(&self) -> impl Iterator<Item = (Key, &Value)> {
        self.seq
            .iter()
            .enumerate()
            .map(|(index, item)| (Key::Integer(index as i64 + 1), item))
            .chain(self.map.iter().map(|(key, item)| (key.clone(), item)))
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        let mut first = true;
        for item in &self.seq {
            if !first {
                write!(f, ", ")?;
            }
            write!(f, "{}", NestedDisplay(item))?;
            first = false;
        }
        for (key, item) in &self.map {
            if !first {
                write!(f, ", ")?;
            }
            write!(f, "{} = {}", key, NestedDisplay(item))?;
            first = false;
        }
        write!(f, "}}")
    }
}

// ============================================================================
// FUNCTIONS
// ============================================================================

/// A directly invocable native function. Compares by identity.
#[derive(Clone)]
pub struct Function {
    body: Rc<NativeFn>,
}

impl Function {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, Value> + 'static,
    {
        Self { body: Rc::new(f) }
    }

    pub fn invoke(&self, args: &[Value]) -> Result<Value, Value> {
        (self.body)(args)
    }

    pub fn ptr_eq(&self, other: &Function) -> bool {
        std::ptr::addr_eq(Rc::as_ptr(&self.body), Rc::as_ptr(&other.body))
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "function: {:p}", Rc::as_ptr(&self.body).cast::<()>())
    }
}
