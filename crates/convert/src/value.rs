//! Typed values
//!
//! A [`Value`] is tied to exactly one [`Type`], available through
//! [`Value::ty`]. Besides concrete data a value may be:
//!
//! - [`Value::Null`]: typed absence of data;
//! - [`Value::Unknown`]: the type is known but the data is not yet.
//!
//! Concrete collections record their element type so that empty
//! collections still have a type. Set items are kept in first-seen order
//! with duplicates removed on construction; set equality and hashing ignore
//! that order.

use std::any::Any;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::Arc;

use bigdecimal::BigDecimal;

use crate::error::{ConvertError, ConvertResult};
use crate::path::PathStep;
use crate::types::{CapsuleType, Type};

/// A value of some structural [`Type`].
#[derive(Debug, Clone)]
pub enum Value {
    Null(Type),
    Unknown(Type),
    String(String),
    Number(BigDecimal),
    Bool(bool),
    List { element: Type, items: Vec<Value> },
    Set { element: Type, items: Vec<Value> },
    Map { element: Type, entries: BTreeMap<String, Value> },
    Tuple(Vec<Value>),
    Object(BTreeMap<String, Value>),
    Capsule(Capsule),
}

/// Opaque payload of a capsule value.
///
/// Equality and hashing are by payload identity: two capsules are equal
/// only if they share one allocation.
#[derive(Clone)]
pub struct Capsule {
    ty: CapsuleType,
    payload: Arc<dyn Any + Send + Sync>,
}

impl Capsule {
    pub fn new<T: Any + Send + Sync>(ty: CapsuleType, payload: T) -> Self {
        Self {
            ty,
            payload: Arc::new(payload),
        }
    }

    pub fn capsule_type(&self) -> &CapsuleType {
        &self.ty
    }

    /// Borrows the payload if it has type `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.payload.downcast_ref()
    }
}

impl PartialEq for Capsule {
    fn eq(&self, other: &Self) -> bool {
        self.ty == other.ty && Arc::ptr_eq(&self.payload, &other.payload)
    }
}

impl Eq for Capsule {}

impl Hash for Capsule {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.ty.hash(state);
        Arc::as_ptr(&self.payload).cast::<()>().hash(state);
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null(a), Self::Null(b)) | (Self::Unknown(a), Self::Unknown(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => a == b,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (
                Self::List { element: ea, items: a },
                Self::List { element: eb, items: b },
            ) => ea == eb && a == b,
            (
                Self::Set { element: ea, items: a },
                Self::Set { element: eb, items: b },
            ) => ea == eb && same_members(a, b),
            (
                Self::Map { element: ea, entries: a },
                Self::Map { element: eb, entries: b },
            ) => ea == eb && a == b,
            (Self::Tuple(a), Self::Tuple(b)) => a == b,
            (Self::Object(a), Self::Object(b)) => a == b,
            (Self::Capsule(a), Self::Capsule(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Self::Null(ty) | Self::Unknown(ty) => ty.hash(state),
            Self::String(s) => s.hash(state),
            Self::Number(n) => n.hash(state),
            Self::Bool(b) => b.hash(state),
            Self::List { element, items } => {
                element.hash(state);
                items.hash(state);
            }
            Self::Set { element, items } => {
                element.hash(state);
                items.len().hash(state);
                // Order-independent: equal sets may list items differently.
                items
                    .iter()
                    .map(standalone_hash)
                    .fold(0_u64, u64::wrapping_add)
                    .hash(state);
            }
            Self::Map { element, entries } => {
                element.hash(state);
                entries.hash(state);
            }
            Self::Tuple(items) => items.hash(state),
            Self::Object(attrs) => attrs.hash(state),
            Self::Capsule(cap) => cap.hash(state),
        }
    }
}

/// Set items match regardless of position. Apart from unknowns, which are
/// all `Unknown(element)`, items are distinct, so equal lengths plus mutual
/// containment means the same members.
fn same_members(a: &[Value], b: &[Value]) -> bool {
    a.len() == b.len() && a.iter().all(|x| b.contains(x)) && b.iter().all(|y| a.contains(y))
}

fn standalone_hash(value: &Value) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

impl fmt::Debug for Capsule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Capsule")
            .field("ty", &self.ty.name())
            .finish_non_exhaustive()
    }
}

impl Value {
    // ==================== Constructors ====================

    pub fn null(ty: Type) -> Self {
        Self::Null(ty)
    }

    pub fn unknown(ty: Type) -> Self {
        Self::Unknown(ty)
    }

    pub fn string(s: impl Into<String>) -> Self {
        Self::String(s.into())
    }

    /// Number in canonical (normalized) form.
    pub fn number(n: impl Into<BigDecimal>) -> Self {
        Self::Number(n.into().normalized())
    }

    pub fn bool(b: bool) -> Self {
        Self::Bool(b)
    }

    pub fn capsule<T: Any + Send + Sync>(ty: CapsuleType, payload: T) -> Self {
        Self::Capsule(Capsule::new(ty, payload))
    }

    /// List whose items must all have type `element`.
    pub fn list(element: Type, items: impl IntoIterator<Item = Value>) -> ConvertResult<Self> {
        let items: Vec<Value> = items.into_iter().collect();
        check_elements(&element, items.iter().enumerate().map(|(i, v)| (PathStep::Index(i), v)))?;
        Ok(Self::List { element, items })
    }

    /// Set whose items must all have type `element`; duplicates are dropped.
    pub fn set(element: Type, items: impl IntoIterator<Item = Value>) -> ConvertResult<Self> {
        let items: Vec<Value> = items.into_iter().collect();
        check_elements(&element, items.iter().enumerate().map(|(i, v)| (PathStep::Index(i), v)))?;
        Ok(Self::Set {
            element,
            items: dedup_set_items(items),
        })
    }

    /// Map whose entries must all have type `element`.
    pub fn map<K, I>(element: Type, entries: I) -> ConvertResult<Self>
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        let entries: BTreeMap<String, Value> =
            entries.into_iter().map(|(k, v)| (k.into(), v)).collect();
        check_elements(
            &element,
            entries.iter().map(|(k, v)| (PathStep::Key(k.clone()), v)),
        )?;
        Ok(Self::Map { element, entries })
    }

    pub fn tuple(items: impl IntoIterator<Item = Value>) -> Self {
        Self::Tuple(items.into_iter().collect())
    }

    pub fn object<K, I>(attributes: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Self::Object(attributes.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    // ==================== Inspection ====================

    /// The type of this value.
    pub fn ty(&self) -> Type {
        match self {
            Self::Null(ty) | Self::Unknown(ty) => ty.clone(),
            Self::String(_) => Type::String,
            Self::Number(_) => Type::Number,
            Self::Bool(_) => Type::Bool,
            Self::List { element, .. } => Type::list(element.clone()),
            Self::Set { element, .. } => Type::set(element.clone()),
            Self::Map { element, .. } => Type::map(element.clone()),
            Self::Tuple(items) => Type::tuple(items.iter().map(Value::ty)),
            Self::Object(attrs) => Type::object(attrs.iter().map(|(k, v)| (k.clone(), v.ty()))),
            Self::Capsule(cap) => Type::Capsule(cap.ty.clone()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null(_))
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown(_))
    }

    /// Neither null nor unknown.
    pub fn is_concrete(&self) -> bool {
        !self.is_null() && !self.is_unknown()
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<&BigDecimal> {
        match self {
            Self::Number(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Items of a list, set or tuple.
    pub fn items(&self) -> Option<&[Value]> {
        match self {
            Self::List { items, .. } | Self::Set { items, .. } | Self::Tuple(items) => Some(items),
            _ => None,
        }
    }

    /// Entries of a map or attributes of an object.
    pub fn entries(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Self::Map { entries, .. } => Some(entries),
            Self::Object(attrs) => Some(attrs),
            _ => None,
        }
    }

    pub fn get_attr(&self, name: &str) -> Option<&Value> {
        match self {
            Self::Object(attrs) => attrs.get(name),
            _ => None,
        }
    }

    pub fn get_index(&self, index: usize) -> Option<&Value> {
        self.items().and_then(|items| items.get(index))
    }
}

fn check_elements<'a>(
    element: &Type,
    items: impl Iterator<Item = (PathStep, &'a Value)>,
) -> ConvertResult<()> {
    if element.has_dynamic() {
        return Err(ConvertError::internal(format!(
            "collection element type {element} contains a dynamic placeholder"
        )));
    }
    for (step, item) in items {
        let ty = item.ty();
        if &ty != element {
            return Err(ConvertError::incompatible(&ty, element).within(step));
        }
    }
    Ok(())
}

/// Drops duplicates, keeping first-seen order. Unknown items are never
/// treated as duplicates of each other: their data may still differ.
pub(crate) fn dedup_set_items(items: Vec<Value>) -> Vec<Value> {
    let mut seen = HashSet::with_capacity(items.len());
    items
        .into_iter()
        .filter(|item| item.is_unknown() || seen.insert(item.clone()))
        .collect()
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::string(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::number(n)
    }
}

impl From<BigDecimal> for Value {
    fn from(n: BigDecimal) -> Self {
        Self::number(n)
    }
}
