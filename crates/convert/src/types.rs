//! The closed algebra of structural types.
//!
//! A [`Type`] is an immutable tree: primitives at the leaves, collections and
//! structures in the interior, plus the opaque [`CapsuleType`] and the
//! [`Type::Dynamic`] placeholder. Types are compared structurally, so two
//! independently built `object({a = number})` types are equal.
//!
//! Children are owned (`Box`/`Vec`/`BTreeMap`), which makes every type a
//! finite tree: a type can never contain itself.
//!
//! ```rust
//! use nebula_convert::Type;
//!
//! let ty = Type::list(Type::object([("name", Type::String)]));
//! assert!(ty.is_collection());
//! assert_eq!(ty.to_string(), "list(object({name = string}))");
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, de};

/// A structural type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Type {
    /// Unicode text.
    String,
    /// Arbitrary-precision decimal number.
    Number,
    /// `true` or `false`.
    Bool,
    /// Ordered, homogeneous sequence.
    List(Box<Type>),
    /// Unordered, homogeneous collection without duplicates.
    Set(Box<Type>),
    /// Homogeneous mapping from string keys to elements.
    Map(Box<Type>),
    /// Fixed-arity, positionally addressed sequence of heterogeneous types.
    Tuple(Vec<Type>),
    /// Fixed set of named, heterogeneous attributes.
    Object(ObjectType),
    /// Opaque type equal only to itself.
    Capsule(CapsuleType),
    /// "Unknown until a concrete value is produced".
    Dynamic,
}

/// The primitive subset of [`Type`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    String,
    Number,
    Bool,
}

impl PrimitiveType {
    /// The full [`Type`] for this primitive.
    pub const fn to_type(self) -> Type {
        match self {
            Self::String => Type::String,
            Self::Number => Type::Number,
            Self::Bool => Type::Bool,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Bool => "bool",
        }
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Attribute layout of an object type.
///
/// `optional` is always a subset of the attribute names. Optional markers
/// only influence conversion *into* the type; values never carry them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct ObjectType {
    attributes: BTreeMap<String, Type>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    optional: BTreeSet<String>,
}

impl ObjectType {
    /// Object type with every attribute required.
    pub fn new<K, I>(attributes: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Type)>,
    {
        Self {
            attributes: attributes.into_iter().map(|(k, t)| (k.into(), t)).collect(),
            optional: BTreeSet::new(),
        }
    }

    /// Marks `names` as optional. Names that are not attributes are ignored.
    pub fn with_optional<K, I>(mut self, names: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = K>,
    {
        for name in names {
            let name = name.into();
            if self.attributes.contains_key(&name) {
                self.optional.insert(name);
            }
        }
        self
    }

    pub fn attributes(&self) -> &BTreeMap<String, Type> {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&Type> {
        self.attributes.get(name)
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    pub fn is_optional(&self, name: &str) -> bool {
        self.optional.contains(name)
    }

    pub fn optional_attributes(&self) -> &BTreeSet<String> {
        &self.optional
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Same attribute names, regardless of their types.
    pub fn same_attribute_names(&self, other: &Self) -> bool {
        self.attributes.len() == other.attributes.len()
            && self.attributes.keys().all(|k| other.attributes.contains_key(k))
    }
}

impl<'de> Deserialize<'de> for ObjectType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct Layout {
            attributes: BTreeMap<String, Type>,
            #[serde(default)]
            optional: BTreeSet<String>,
        }

        let Layout {
            attributes,
            optional,
        } = Layout::deserialize(deserializer)?;
        if let Some(name) = optional.iter().find(|name| !attributes.contains_key(*name)) {
            return Err(de::Error::custom(format_args!(
                "optional attribute `{name}` is not an attribute of the object"
            )));
        }
        Ok(Self {
            attributes,
            optional,
        })
    }
}

/// Identity of an opaque capsule type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CapsuleType {
    name: Arc<str>,
}

impl CapsuleType {
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Type {
    // ==================== Constructors ====================

    pub fn list(element: Type) -> Self {
        Self::List(Box::new(element))
    }

    pub fn set(element: Type) -> Self {
        Self::Set(Box::new(element))
    }

    pub fn map(element: Type) -> Self {
        Self::Map(Box::new(element))
    }

    pub fn tuple(elements: impl IntoIterator<Item = Type>) -> Self {
        Self::Tuple(elements.into_iter().collect())
    }

    /// Object type with every attribute required.
    pub fn object<K, I>(attributes: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Type)>,
    {
        Self::Object(ObjectType::new(attributes))
    }

    /// Object type where the listed attributes are optional.
    pub fn object_with_optional<K, I, O, N>(attributes: I, optional: O) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Type)>,
        N: Into<String>,
        O: IntoIterator<Item = N>,
    {
        Self::Object(ObjectType::new(attributes).with_optional(optional))
    }

    pub fn capsule(name: impl Into<Arc<str>>) -> Self {
        Self::Capsule(CapsuleType::new(name))
    }

    // ==================== Classification ====================

    pub fn as_primitive(&self) -> Option<PrimitiveType> {
        match self {
            Self::String => Some(PrimitiveType::String),
            Self::Number => Some(PrimitiveType::Number),
            Self::Bool => Some(PrimitiveType::Bool),
            _ => None,
        }
    }

    pub fn is_primitive(&self) -> bool {
        self.as_primitive().is_some()
    }

    pub fn is_capsule(&self) -> bool {
        matches!(self, Self::Capsule(_))
    }

    pub fn is_dynamic(&self) -> bool {
        matches!(self, Self::Dynamic)
    }

    /// List, set or map: homogeneous with unbounded arity.
    pub fn is_collection(&self) -> bool {
        matches!(self, Self::List(_) | Self::Set(_) | Self::Map(_))
    }

    /// Tuple or object: heterogeneous with a fixed shape.
    pub fn is_structural(&self) -> bool {
        matches!(self, Self::Tuple(_) | Self::Object(_))
    }

    /// Element type of a list, set or map.
    pub fn element_type(&self) -> Option<&Type> {
        match self {
            Self::List(ety) | Self::Set(ety) | Self::Map(ety) => Some(ety),
            _ => None,
        }
    }

    pub fn tuple_elements(&self) -> Option<&[Type]> {
        match self {
            Self::Tuple(etys) => Some(etys),
            _ => None,
        }
    }

    pub fn object_type(&self) -> Option<&ObjectType> {
        match self {
            Self::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// True if [`Type::Dynamic`] appears anywhere in this type.
    pub fn has_dynamic(&self) -> bool {
        match self {
            Self::Dynamic => true,
            Self::String | Self::Number | Self::Bool | Self::Capsule(_) => false,
            Self::List(ety) | Self::Set(ety) | Self::Map(ety) => ety.has_dynamic(),
            Self::Tuple(etys) => etys.iter().any(Type::has_dynamic),
            Self::Object(obj) => obj.attributes.values().any(Type::has_dynamic),
        }
    }

    /// Nesting depth; leaves have depth 1.
    pub fn depth(&self) -> usize {
        match self {
            Self::String | Self::Number | Self::Bool | Self::Capsule(_) | Self::Dynamic => 1,
            Self::List(ety) | Self::Set(ety) | Self::Map(ety) => 1 + ety.depth(),
            Self::Tuple(etys) => 1 + etys.iter().map(Type::depth).max().unwrap_or(0),
            Self::Object(obj) => 1 + obj.attributes.values().map(Type::depth).max().unwrap_or(0),
        }
    }

    /// The same type with every optional attribute marker removed, at any depth.
    pub fn without_optional_attributes_deep(&self) -> Type {
        match self {
            Self::String | Self::Number | Self::Bool | Self::Capsule(_) | Self::Dynamic => {
                self.clone()
            }
            Self::List(ety) => Type::list(ety.without_optional_attributes_deep()),
            Self::Set(ety) => Type::set(ety.without_optional_attributes_deep()),
            Self::Map(ety) => Type::map(ety.without_optional_attributes_deep()),
            Self::Tuple(etys) => {
                Type::tuple(etys.iter().map(Type::without_optional_attributes_deep))
            }
            Self::Object(obj) => Type::object(
                obj.attributes
                    .iter()
                    .map(|(k, t)| (k.clone(), t.without_optional_attributes_deep())),
            ),
        }
    }

    /// Short human-readable name used in diagnostics.
    pub fn friendly_name(&self) -> String {
        match self {
            Self::String => "string".into(),
            Self::Number => "number".into(),
            Self::Bool => "bool".into(),
            Self::List(ety) => format!("list of {}", ety.friendly_name()),
            Self::Set(ety) => format!("set of {}", ety.friendly_name()),
            Self::Map(ety) => format!("map of {}", ety.friendly_name()),
            Self::Tuple(_) => "tuple".into(),
            Self::Object(_) => "object".into(),
            Self::Capsule(cap) => cap.name().to_string(),
            Self::Dynamic => "dynamic".into(),
        }
    }
}

impl From<PrimitiveType> for Type {
    fn from(p: PrimitiveType) -> Self {
        p.to_type()
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String => f.write_str("string"),
            Self::Number => f.write_str("number"),
            Self::Bool => f.write_str("bool"),
            Self::List(ety) => write!(f, "list({ety})"),
            Self::Set(ety) => write!(f, "set({ety})"),
            Self::Map(ety) => write!(f, "map({ety})"),
            Self::Tuple(etys) => {
                f.write_str("tuple([")?;
                for (i, ety) in etys.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{ety}")?;
                }
                f.write_str("])")
            }
            Self::Object(obj) => {
                f.write_str("object({")?;
                for (i, (name, aty)) in obj.attributes.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    if obj.is_optional(name) {
                        write!(f, "{name} = optional({aty})")?;
                    } else {
                        write!(f, "{name} = {aty}")?;
                    }
                }
                f.write_str("})")
            }
            Self::Capsule(cap) => write!(f, "capsule({})", cap.name()),
            Self::Dynamic => f.write_str("dynamic"),
        }
    }
}
