//! JavaScript value representation
//!
//! The core JsValue type and the property/object storage shared by every
//! object-like value.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::error::JsError;
use crate::interpreter::function::JsFunction;
use crate::interpreter::tasks::TaskHandle;
use crate::prelude::math::to_uint32;
use crate::prelude::{FxHashSet, IndexMap, index_map_new};

/// Trait for types that have cheap (O(1), reference-counted) clones.
///
/// This trait makes it explicit when a clone is cheap (just incrementing a reference count)
/// vs when it might be expensive (copying data).
pub trait CheapClone: Clone {
    /// Create a cheap (reference-counted) clone of this value.
    fn cheap_clone(&self) -> Self {
        self.clone()
    }
}

impl<T: ?Sized> CheapClone for Rc<T> {}

/// A JavaScript value
#[derive(Clone, Default)]
pub enum JsValue {
    #[default]
    Undefined,
    Null,
    Boolean(bool),
    Number(f64),
    String(JsString),
    Symbol(JsSymbol),
    Object(JsObjectRef),
}

impl JsValue {
    /// Check if this value is null or undefined
    pub fn is_null_or_undefined(&self) -> bool {
        matches!(self, JsValue::Null | JsValue::Undefined)
    }

    pub fn is_object(&self) -> bool {
        matches!(self, JsValue::Object(_))
    }

    pub fn as_object(&self) -> Option<&JsObjectRef> {
        match self {
            JsValue::Object(obj) => Some(obj),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            JsValue::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            JsValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Check if this value is callable (a function)
    pub fn is_callable(&self) -> bool {
        match self {
            JsValue::Object(obj) => obj.borrow().is_callable(),
            _ => false,
        }
    }

    /// Check if this is a string value
    pub fn is_string(&self) -> bool {
        matches!(self, JsValue::String(_))
    }

    /// Get the typeof result for this value
    pub fn type_of(&self) -> &'static str {
        match self {
            JsValue::Undefined => "undefined",
            JsValue::Null => "object",
            JsValue::Boolean(_) => "boolean",
            JsValue::Number(_) => "number",
            JsValue::String(_) => "string",
            JsValue::Symbol(_) => "symbol",
            JsValue::Object(obj) => {
                if obj.borrow().is_callable() {
                    "function"
                } else {
                    "object"
                }
            }
        }
    }

    /// Convert to boolean (ToBoolean). Never calls user code.
    pub fn to_boolean(&self) -> bool {
        match self {
            JsValue::Undefined | JsValue::Null => false,
            JsValue::Boolean(b) => *b,
            JsValue::Number(n) => *n != 0.0 && !n.is_nan(),
            JsValue::String(s) => !s.is_empty(),
            JsValue::Symbol(_) => true,
            JsValue::Object(_) => true,
        }
    }

    /// Strict equality (===)
    pub fn strict_equals(&self, other: &JsValue) -> bool {
        match (self, other) {
            (JsValue::Undefined, JsValue::Undefined) => true,
            (JsValue::Null, JsValue::Null) => true,
            (JsValue::Boolean(a), JsValue::Boolean(b)) => a == b,
            // NaN !== NaN falls out of f64 comparison
            (JsValue::Number(a), JsValue::Number(b)) => a == b,
            (JsValue::String(a), JsValue::String(b)) => a == b,
            (JsValue::Symbol(a), JsValue::Symbol(b)) => a == b,
            (JsValue::Object(a), JsValue::Object(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for JsValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JsValue::Undefined => write!(f, "undefined"),
            JsValue::Null => write!(f, "null"),
            JsValue::Boolean(b) => write!(f, "{}", b),
            JsValue::Number(n) => write!(f, "{}", number_to_string(*n)),
            JsValue::String(s) => write!(f, "\"{}\"", s.as_str()),
            JsValue::Symbol(s) => write!(f, "{}", s),
            JsValue::Object(obj) => match obj.try_borrow() {
                Ok(obj) => match &obj.kind {
                    ObjectKind::Ordinary => write!(f, "{{...}}"),
                    ObjectKind::Array { length } => write!(f, "[{} items]", length),
                    ObjectKind::Function(func) => {
                        write!(f, "[Function: {}]", func.name().unwrap_or("anonymous"))
                    }
                    ObjectKind::Primitive(inner) => write!(f, "[Wrapper {:?}]", inner),
                    ObjectKind::Task(_) => write!(f, "[Task]"),
                    ObjectKind::Host(host) => write!(f, "[{}]", host.class_name()),
                },
                Err(_) => write!(f, "[object <borrowed>]"),
            },
        }
    }
}

impl PartialEq for JsValue {
    fn eq(&self, other: &Self) -> bool {
        self.strict_equals(other)
    }
}

// Conversions from Rust types

impl From<bool> for JsValue {
    fn from(b: bool) -> Self {
        JsValue::Boolean(b)
    }
}

impl From<f64> for JsValue {
    fn from(n: f64) -> Self {
        JsValue::Number(n)
    }
}

impl From<i32> for JsValue {
    fn from(n: i32) -> Self {
        JsValue::Number(n as f64)
    }
}

impl From<&str> for JsValue {
    fn from(s: &str) -> Self {
        JsValue::String(JsString::from(s))
    }
}

impl From<String> for JsValue {
    fn from(s: String) -> Self {
        JsValue::String(JsString::from(s))
    }
}

impl From<JsString> for JsValue {
    fn from(s: JsString) -> Self {
        JsValue::String(s)
    }
}

impl From<JsObjectRef> for JsValue {
    fn from(obj: JsObjectRef) -> Self {
        JsValue::Object(obj)
    }
}

/// Canonical Number::toString (radix 10)
pub fn number_to_string(n: f64) -> String {
    // ryu-js already produces "NaN", "Infinity" and "0" for -0
    let mut buffer = ryu_js::Buffer::new();
    buffer.format(n).to_string()
}

/// Reference-counted string for efficient string handling
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JsString(Rc<str>);

impl CheapClone for JsString {}

impl JsString {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Length in UTF-16 code units, as scripts observe it
    pub fn len(&self) -> usize {
        self.0.encode_utf16().count()
    }

    /// UTF-16 code unit at `index`, as a one-unit string
    pub fn unit_at(&self, index: usize) -> Option<JsString> {
        let unit = self.0.encode_utf16().nth(index)?;
        Some(JsString::from(String::from_utf16_lossy(&[unit])))
    }
}

impl AsRef<str> for JsString {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::borrow::Borrow<str> for JsString {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for JsString {
    fn eq(&self, other: &str) -> bool {
        self.0.as_ref() == other
    }
}

impl PartialEq<&str> for JsString {
    fn eq(&self, other: &&str) -> bool {
        self.0.as_ref() == *other
    }
}

impl From<&str> for JsString {
    fn from(s: &str) -> Self {
        JsString(s.into())
    }
}

impl From<String> for JsString {
    fn from(s: String) -> Self {
        JsString(s.into())
    }
}

impl fmt::Debug for JsString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\"", self.0)
    }
}

impl fmt::Display for JsString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::ops::Add<&JsString> for JsString {
    type Output = JsString;

    fn add(self, other: &JsString) -> JsString {
        let mut s = String::with_capacity(self.0.len() + other.0.len());
        s.push_str(&self.0);
        s.push_str(&other.0);
        JsString::from(s)
    }
}

/// JavaScript Symbol primitive
///
/// Symbols are unique identifiers, optionally with a description.
#[derive(Clone, Debug)]
pub struct JsSymbol {
    id: u64,
    pub description: Option<JsString>,
}

impl JsSymbol {
    pub fn new(id: u64, description: Option<JsString>) -> Self {
        Self { id, description }
    }

    pub fn id(&self) -> u64 {
        self.id
    }
}

impl PartialEq for JsSymbol {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for JsSymbol {}

impl std::hash::Hash for JsSymbol {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for JsSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.description {
            Some(desc) => write!(f, "Symbol({})", desc),
            None => write!(f, "Symbol()"),
        }
    }
}

/// Reference to a heap-allocated object
pub type JsObjectRef = Rc<RefCell<JsObject>>;

/// Property key (string, index, or symbol)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PropertyKey {
    String(JsString),
    Index(u32),
    Symbol(JsSymbol),
}

impl PropertyKey {
    /// Key for an already-primitive value (the tail of ToPropertyKey)
    pub fn from_primitive(value: &JsValue) -> Self {
        match value {
            JsValue::Number(n) => {
                let idx = *n as u32;
                if idx as f64 == *n && *n >= 0.0 && idx != u32::MAX {
                    PropertyKey::Index(idx)
                } else {
                    PropertyKey::from(number_to_string(*n))
                }
            }
            JsValue::String(s) => PropertyKey::from(s.cheap_clone()),
            JsValue::Symbol(s) => PropertyKey::Symbol(s.clone()),
            JsValue::Undefined => PropertyKey::from("undefined"),
            JsValue::Null => PropertyKey::from("null"),
            JsValue::Boolean(b) => PropertyKey::from(if *b { "true" } else { "false" }),
            JsValue::Object(_) => PropertyKey::from("[object Object]"),
        }
    }

    pub fn is_symbol(&self) -> bool {
        matches!(self, PropertyKey::Symbol(_))
    }

    /// Check if this key equals a string literal (avoids allocation)
    #[inline]
    pub fn eq_str(&self, s: &str) -> bool {
        match self {
            PropertyKey::String(js_str) => js_str.as_str() == s,
            PropertyKey::Index(_) | PropertyKey::Symbol(_) => false,
        }
    }

    /// The key as a script value (`for-in` variable, `Object.keys` entry)
    pub fn to_value(&self) -> JsValue {
        match self {
            PropertyKey::String(s) => JsValue::String(s.cheap_clone()),
            PropertyKey::Index(i) => JsValue::String(JsString::from(i.to_string())),
            PropertyKey::Symbol(s) => JsValue::Symbol(s.clone()),
        }
    }
}

fn canonical_index(s: &str) -> Option<u32> {
    let first = s.bytes().next()?;
    if !first.is_ascii_digit() {
        return None;
    }
    let idx = s.parse::<u32>().ok()?;
    // Verify it's canonical (no leading zeros except "0")
    (idx != u32::MAX && idx.to_string() == s).then_some(idx)
}

impl From<&str> for PropertyKey {
    #[inline]
    fn from(s: &str) -> Self {
        match canonical_index(s) {
            Some(idx) => PropertyKey::Index(idx),
            None => PropertyKey::String(JsString::from(s)),
        }
    }
}

impl From<String> for PropertyKey {
    fn from(s: String) -> Self {
        match canonical_index(&s) {
            Some(idx) => PropertyKey::Index(idx),
            None => PropertyKey::String(JsString::from(s)),
        }
    }
}

impl From<JsString> for PropertyKey {
    #[inline]
    fn from(s: JsString) -> Self {
        match canonical_index(s.as_str()) {
            Some(idx) => PropertyKey::Index(idx),
            None => PropertyKey::String(s),
        }
    }
}

impl From<u32> for PropertyKey {
    fn from(idx: u32) -> Self {
        PropertyKey::Index(idx)
    }
}

impl fmt::Display for PropertyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyKey::String(s) => write!(f, "{}", s),
            PropertyKey::Index(i) => write!(f, "{}", i),
            PropertyKey::Symbol(s) => write!(f, "{}", s),
        }
    }
}

/// ToUint32 round trip: the numbers an array `length` may take
pub fn valid_array_length(n: f64) -> Option<u32> {
    let length = to_uint32(n);
    (length as f64 == n).then_some(length)
}

/// Longest list built from an array in one go (spread, `apply`, JSON)
pub const MAX_LIST_LENGTH: usize = 1 << 22;

/// Attribute value used when a flag is left to inherit its default.
///
/// One default for every attribute keeps synthetic properties consistent:
/// anything not explicitly restricted is writable, enumerable and
/// configurable.
pub const DEFAULT_ATTRIBUTE: bool = true;

/// Storage of a property: a plain slot or an accessor pair
#[derive(Debug, Clone)]
pub enum PropertyValue {
    Value(JsValue),
    /// Getter/setter pair; either side may be absent
    BackedField {
        getter: Option<JsValue>,
        setter: Option<JsValue>,
    },
}

/// Object property descriptor
///
/// Each flag is tri-state: `Some(true)`, `Some(false)`, or `None` to inherit
/// [`DEFAULT_ATTRIBUTE`].
#[derive(Debug, Clone)]
pub struct Property {
    pub value: PropertyValue,
    pub writable: Option<bool>,
    pub enumerable: Option<bool>,
    pub configurable: Option<bool>,
}

impl Property {
    pub fn data(value: JsValue) -> Self {
        Self {
            value: PropertyValue::Value(value),
            writable: None,
            enumerable: None,
            configurable: None,
        }
    }

    /// Create a property with custom attributes
    pub fn with_attributes(
        value: JsValue,
        writable: bool,
        enumerable: bool,
        configurable: bool,
    ) -> Self {
        Self {
            value: PropertyValue::Value(value),
            writable: Some(writable),
            enumerable: Some(enumerable),
            configurable: Some(configurable),
        }
    }

    /// Non-enumerable data property used for intrinsic methods
    pub fn hidden(value: JsValue) -> Self {
        Self::with_attributes(value, true, false, true)
    }

    /// Create an accessor property with getter and/or setter
    pub fn accessor(getter: Option<JsValue>, setter: Option<JsValue>) -> Self {
        Self {
            value: PropertyValue::BackedField { getter, setter },
            writable: None,
            enumerable: None,
            configurable: None,
        }
    }

    pub fn is_accessor(&self) -> bool {
        matches!(self.value, PropertyValue::BackedField { .. })
    }

    /// The plain slot value, `Undefined` for accessors
    pub fn slot(&self) -> JsValue {
        match &self.value {
            PropertyValue::Value(v) => v.clone(),
            PropertyValue::BackedField { .. } => JsValue::Undefined,
        }
    }

    pub fn writable(&self) -> bool {
        self.writable.unwrap_or(DEFAULT_ATTRIBUTE)
    }

    pub fn enumerable(&self) -> bool {
        self.enumerable.unwrap_or(DEFAULT_ATTRIBUTE)
    }

    pub fn configurable(&self) -> bool {
        self.configurable.unwrap_or(DEFAULT_ATTRIBUTE)
    }
}

/// Capability interface for wrapped host values
pub trait HostObject: fmt::Debug {
    fn class_name(&self) -> &str {
        "Object"
    }

    /// Own property read; `None` when the host has no such property
    fn get(&self, key: &PropertyKey) -> Option<JsValue>;

    /// Own property write; `false` when the host rejects the key
    fn set(&self, _key: &PropertyKey, _value: JsValue) -> bool {
        false
    }

    fn keys(&self) -> Vec<PropertyKey> {
        Vec::new()
    }
}

/// Variant behavior of an object
#[derive(Debug)]
pub enum ObjectKind {
    Ordinary,
    /// Array exotic object; elements are index keys in the property map,
    /// so holes and far indices cost nothing
    Array { length: u32 },
    Function(JsFunction),
    /// Boolean/Number/String/Symbol wrapper created by ToObject
    Primitive(JsValue),
    /// Handle of a detached asynchronous unit
    Task(TaskHandle),
    Host(Rc<dyn HostObject>),
}

/// A JavaScript object
#[derive(Debug)]
pub struct JsObject {
    /// Prototype link (lookup fallback, never ownership of behavior)
    pub prototype: Option<JsObjectRef>,
    /// Whether the object can have properties added
    pub extensible: bool,
    /// Object properties, insertion ordered
    pub properties: IndexMap<PropertyKey, Property>,
    pub kind: ObjectKind,
}

impl JsObject {
    pub fn new(kind: ObjectKind) -> Self {
        Self {
            prototype: None,
            extensible: true,
            properties: index_map_new(),
            kind,
        }
    }

    pub fn with_prototype(prototype: Option<JsObjectRef>, kind: ObjectKind) -> Self {
        Self {
            prototype,
            ..Self::new(kind)
        }
    }

    pub fn into_ref(self) -> JsObjectRef {
        Rc::new(RefCell::new(self))
    }

    pub fn is_callable(&self) -> bool {
        matches!(self.kind, ObjectKind::Function(_))
    }

    pub fn as_function(&self) -> Option<&JsFunction> {
        match &self.kind {
            ObjectKind::Function(func) => Some(func),
            _ => None,
        }
    }

    pub fn array_length(&self) -> Option<u32> {
        match self.kind {
            ObjectKind::Array { length } => Some(length),
            _ => None,
        }
    }

    /// Own plain slot at `index`; holes and accessors read as `undefined`
    pub fn element(&self, index: u32) -> JsValue {
        self.properties
            .get(&PropertyKey::Index(index))
            .map(Property::slot)
            .unwrap_or(JsValue::Undefined)
    }

    /// Elements `0..length` as a list, holes read as `undefined`.
    ///
    /// A RangeError when the list is too long to build.
    pub fn collect_elements(&self, length: u32) -> Result<Vec<JsValue>, JsError> {
        if length as usize > MAX_LIST_LENGTH {
            return Err(JsError::range_error("Invalid array length"));
        }
        Ok((0..length).map(|i| self.element(i)).collect())
    }

    /// Shrink or grow an array; indices at or past `new_length` are removed
    pub fn set_array_length(&mut self, new_length: u32) {
        if let ObjectKind::Array { length } = &mut self.kind {
            if new_length < *length {
                self.properties
                    .retain(|key, _| !matches!(key, PropertyKey::Index(i) if *i >= new_length));
            }
            *length = new_length;
        }
    }

    /// Own property descriptor, including an array's `length` and string
    /// wrapper slots.
    ///
    /// Returns an owned descriptor because intrinsic slots have no stored
    /// `Property`.
    pub fn get_own_property(&self, key: &PropertyKey) -> Option<Property> {
        match (&self.kind, key) {
            (ObjectKind::Array { length }, key) if key.eq_str("length") => {
                return Some(Property::with_attributes(
                    JsValue::Number(*length as f64),
                    true,
                    false,
                    false,
                ));
            }
            (ObjectKind::Primitive(JsValue::String(s)), PropertyKey::Index(i)) => {
                return s
                    .unit_at(*i as usize)
                    .map(|c| Property::with_attributes(JsValue::String(c), false, true, false));
            }
            (ObjectKind::Primitive(JsValue::String(s)), key) if key.eq_str("length") => {
                return Some(Property::with_attributes(
                    JsValue::Number(s.len() as f64),
                    false,
                    false,
                    false,
                ));
            }
            (ObjectKind::Host(host), key) => {
                if let Some(value) = host.get(key) {
                    return Some(Property::data(value));
                }
            }
            _ => {}
        }
        self.properties.get(key).cloned()
    }

    /// Defined purely by descriptor presence, independent of enumerability
    pub fn has_own_property(&self, key: &PropertyKey) -> bool {
        self.get_own_property(key).is_some()
    }

    /// Own keys in enumeration order: integer indices first, then
    /// insertion order
    pub fn own_keys(&self) -> Vec<PropertyKey> {
        let mut keys = Vec::new();
        match &self.kind {
            ObjectKind::Primitive(JsValue::String(s)) => {
                keys.extend((0..s.len() as u32).map(PropertyKey::Index));
                keys.push(PropertyKey::from("length"));
            }
            ObjectKind::Host(host) => keys.extend(host.keys()),
            _ => {}
        }
        let (mut indices, named): (Vec<_>, Vec<_>) = self
            .properties
            .keys()
            .cloned()
            .partition(|k| matches!(k, PropertyKey::Index(_)));
        indices.sort_by_key(|k| match k {
            PropertyKey::Index(i) => *i,
            _ => 0,
        });
        keys.extend(indices);
        if let ObjectKind::Array { .. } = self.kind {
            keys.push(PropertyKey::from("length"));
        }
        keys.extend(named);
        keys
    }

    /// Write a plain slot on an own property, honoring array intrinsics.
    ///
    /// Assumes the caller already checked writability and extensibility.
    pub fn write_own_slot(&mut self, key: PropertyKey, value: JsValue) {
        if let ObjectKind::Array { .. } = self.kind {
            if key.eq_str("length") {
                if let Some(length) = value.as_number().and_then(valid_array_length) {
                    self.set_array_length(length);
                }
                return;
            }
            self.grow_to_fit(&key);
        }
        if let ObjectKind::Host(host) = &self.kind {
            if host.set(&key, value.clone()) {
                return;
            }
        }
        match self.properties.get_mut(&key) {
            Some(prop) => prop.value = PropertyValue::Value(value),
            None => {
                self.properties.insert(key, Property::data(value));
            }
        }
    }

    /// Define (or redefine) an own property.
    ///
    /// Returns `false` when an existing non-configurable property forbids
    /// the change or the object is not extensible.
    pub fn define_property(&mut self, key: PropertyKey, prop: Property) -> bool {
        let existing = self.get_own_property(&key);
        match existing {
            None => {
                if !self.extensible {
                    return false;
                }
            }
            Some(current) if !current.configurable() => {
                if prop.configurable == Some(true) {
                    return false;
                }
                if prop.enumerable.is_some_and(|e| e != current.enumerable()) {
                    return false;
                }
                if current.is_accessor() != prop.is_accessor() {
                    return false;
                }
                if !current.is_accessor() && !current.writable() {
                    if prop.writable == Some(true) {
                        return false;
                    }
                    if !prop.slot().strict_equals(&current.slot()) {
                        return false;
                    }
                }
            }
            Some(_) => {}
        }

        if let ObjectKind::Array { .. } = self.kind {
            if key.eq_str("length") {
                let length = match &prop.value {
                    PropertyValue::Value(value) => value.as_number().and_then(valid_array_length),
                    PropertyValue::BackedField { .. } => None,
                };
                let Some(length) = length else {
                    return false;
                };
                self.set_array_length(length);
                return true;
            }
            self.grow_to_fit(&key);
        }
        self.properties.insert(key, prop);
        true
    }

    /// Extend an array's length to cover a new index key
    fn grow_to_fit(&mut self, key: &PropertyKey) {
        if let (ObjectKind::Array { length }, PropertyKey::Index(i)) = (&mut self.kind, key) {
            if *i >= *length {
                *length = i.saturating_add(1);
            }
        }
    }

    /// Remove an own property.
    ///
    /// Non-configurable properties survive unless `force` is set.
    pub fn delete_property(&mut self, key: &PropertyKey, force: bool) -> bool {
        match self.get_own_property(key) {
            None => true,
            Some(prop) if !prop.configurable() && !force => false,
            Some(_) => {
                self.properties.shift_remove(key);
                true
            }
        }
    }
}

/// Iterative walk over an object and its prototypes with a cycle guard
pub struct PrototypeWalk {
    next: Option<JsObjectRef>,
    visited: FxHashSet<usize>,
}

impl PrototypeWalk {
    /// Walk starting at `start` itself
    pub fn new(start: JsObjectRef) -> Self {
        Self {
            next: Some(start),
            visited: FxHashSet::default(),
        }
    }

    /// Walk starting at the prototype of `start`
    pub fn prototypes_of(start: &JsObjectRef) -> Self {
        let mut walk = Self::new(start.cheap_clone());
        walk.visited.insert(Rc::as_ptr(start) as usize);
        walk.next = start.borrow().prototype.clone();
        walk
    }
}

impl Iterator for PrototypeWalk {
    type Item = JsObjectRef;

    fn next(&mut self) -> Option<JsObjectRef> {
        let current = self.next.take()?;
        if !self.visited.insert(Rc::as_ptr(&current) as usize) {
            return None;
        }
        self.next = current.borrow().prototype.clone();
        Some(current)
    }
}

/// Find a property on `obj` or its prototype chain
pub fn lookup_property(obj: &JsObjectRef, key: &PropertyKey) -> Option<Property> {
    PrototypeWalk::new(obj.cheap_clone()).find_map(|o| o.borrow().get_own_property(key))
}
