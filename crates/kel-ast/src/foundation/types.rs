//! Structural type model for KEL.
//!
//! The type system distinguishes:
//! - **Plain types** - named domain types (`Policy`, `Vehicle`) and the native
//!   primitives (`Number`, `Money`, `String`, ...)
//! - **Array types** - `Vehicle[]`
//! - **Generic types** - placeholders in function signatures, optionally
//!   bounded: `<T>`, `<T extends Number>`
//! - **Union types** - `Vehicle | Policy`
//! - **Sentinels** - [`Type::Any`] (fully dynamic) and [`Type::Unknown`]
//!   (assignability-opaque, the result of anything that failed to resolve)
//!
//! # Identity
//!
//! Type identity is by display name. Two plain types with the same name are
//! the same type regardless of where their values were materialised.
//!
//! # Members
//!
//! Members (references and functions visible "through" a type) are not stored
//! on nominal types: the domain model is a graph with cycles
//! (`Policy.riskItems → Vehicle`, `Vehicle.policy → Policy`), so members
//! live in the [`TypeRegistry`](super::TypeRegistry) keyed by name. Synthetic
//! types built while typing an expression (inline maps, iteration variables)
//! carry their members inline instead.
//!
//! Extended (super) types *are* stored inline. The registry rejects
//! inheritance cycles, so walking `extended_types` always terminates.
//!
//! # Examples
//!
//! ```
//! # use kel_ast::foundation::types::*;
//! let money = Type::money();
//! let number = Type::number();
//!
//! assert!(number.is_assignable_from(&money));
//! assert!(!money.is_assignable_from(&number));
//!
//! let amounts = money.wrap_array_type();
//! assert_eq!(amounts.to_string(), "Money[]");
//! assert_eq!(amounts.unwrap_array_type(), money);
//! ```

use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, LazyLock};

use super::symbols::SymbolTable;

/// Substitutions from generic parameter name to concrete type.
pub type GenericRewrites = HashMap<String, Type>;

/// A type in the KEL type system.
///
/// Types are immutable values; cloning is cheap (reference-counted names
/// and member tables).
#[derive(Debug, Clone)]
pub enum Type {
    /// Fully dynamic: assignable to and from everything.
    Any,

    /// Unresolvable: assignable to and from nothing but itself (and `Any`).
    Unknown,

    /// Named type (domain type or native primitive).
    Plain(PlainType),

    /// Collection of elements.
    Array(Box<Type>),

    /// Generic placeholder from a function signature.
    Generic(GenericType),

    /// Either of two types.
    Union(Box<Type>, Box<Type>),
}

/// A named type.
#[derive(Debug, Clone)]
pub struct PlainType {
    name: Arc<str>,
    extended: Arc<[Type]>,
    members: Option<Arc<SymbolTable>>,
}

/// A generic placeholder, e.g. `<T>` or `<T extends Number>`.
#[derive(Debug, Clone)]
pub struct GenericType {
    name: Arc<str>,
    bound: Option<Box<Type>>,
}

/// Native primitive names.
pub mod native {
    pub const BOOLEAN: &str = "Boolean";
    pub const STRING: &str = "String";
    pub const NUMBER: &str = "Number";
    pub const MONEY: &str = "Money";
    pub const DATE: &str = "Date";
    pub const DATETIME: &str = "DateTime";
    pub const TYPE: &str = "Type";
    pub const ANY: &str = "Any";
    pub const UNKNOWN: &str = "Unknown";
}

struct NativeTypes {
    boolean: Type,
    string: Type,
    number: Type,
    money: Type,
    date: Type,
    datetime: Type,
    type_of_type: Type,
}

static NATIVES: LazyLock<NativeTypes> = LazyLock::new(|| {
    let number = Type::plain(native::NUMBER, Vec::new());
    NativeTypes {
        boolean: Type::plain(native::BOOLEAN, Vec::new()),
        string: Type::plain(native::STRING, Vec::new()),
        money: Type::plain(native::MONEY, vec![number.clone()]),
        number,
        date: Type::plain(native::DATE, Vec::new()),
        datetime: Type::plain(native::DATETIME, Vec::new()),
        type_of_type: Type::plain(native::TYPE, Vec::new()),
    }
});

impl Type {
    /// Create a nominal plain type with the given supertypes.
    pub fn plain(name: impl Into<Arc<str>>, extended: Vec<Type>) -> Self {
        Type::Plain(PlainType {
            name: name.into(),
            extended: extended.into(),
            members: None,
        })
    }

    /// Create a synthetic plain type that carries its own members.
    pub fn synthetic(name: impl Into<Arc<str>>, members: SymbolTable) -> Self {
        Type::Plain(PlainType {
            name: name.into(),
            extended: Arc::from(Vec::new()),
            members: Some(Arc::new(members)),
        })
    }

    /// Create an array of `element`.
    pub fn array(element: Type) -> Self {
        Type::Array(Box::new(element))
    }

    /// Create a generic placeholder.
    pub fn generic(name: impl Into<Arc<str>>, bound: Option<Type>) -> Self {
        Type::Generic(GenericType {
            name: name.into(),
            bound: bound.map(Box::new),
        })
    }

    /// Create a union. Identical members collapse to one.
    pub fn union(left: Type, right: Type) -> Self {
        if left == right {
            left
        } else {
            Type::Union(Box::new(left), Box::new(right))
        }
    }

    pub fn boolean() -> Self {
        NATIVES.boolean.clone()
    }

    pub fn string() -> Self {
        NATIVES.string.clone()
    }

    pub fn number() -> Self {
        NATIVES.number.clone()
    }

    pub fn money() -> Self {
        NATIVES.money.clone()
    }

    pub fn date() -> Self {
        NATIVES.date.clone()
    }

    pub fn datetime() -> Self {
        NATIVES.datetime.clone()
    }

    pub fn type_of_type() -> Self {
        NATIVES.type_of_type.clone()
    }

    /// Look up a native primitive or sentinel by name.
    pub fn native(name: &str) -> Option<Type> {
        let ty = match name {
            native::BOOLEAN => Type::boolean(),
            native::STRING => Type::string(),
            native::NUMBER => Type::number(),
            native::MONEY => Type::money(),
            native::DATE => Type::date(),
            native::DATETIME => Type::datetime(),
            native::TYPE => Type::type_of_type(),
            native::ANY => Type::Any,
            native::UNKNOWN => Type::Unknown,
            _ => return None,
        };
        Some(ty)
    }

    /// All native primitives (sentinels excluded).
    pub fn natives() -> [Type; 7] {
        [
            Type::boolean(),
            Type::string(),
            Type::number(),
            Type::money(),
            Type::date(),
            Type::datetime(),
            Type::type_of_type(),
        ]
    }

    /// Display name; also the identity of the type.
    pub fn name(&self) -> String {
        self.to_string()
    }

    pub fn is_any(&self) -> bool {
        matches!(self, Type::Any)
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Type::Unknown)
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Type::Array(_))
    }

    pub fn is_union(&self) -> bool {
        matches!(self, Type::Union(..))
    }

    pub fn is_generic(&self) -> bool {
        matches!(self, Type::Generic(_))
    }

    /// Check if this is the named plain type.
    pub fn is_named(&self, name: &str) -> bool {
        matches!(self, Type::Plain(plain) if &*plain.name == name)
    }

    /// Check if this is one of the native primitives.
    pub fn is_primitive(&self) -> bool {
        matches!(self, Type::Plain(plain) if Type::native(&plain.name).is_some())
    }

    /// Check if a generic placeholder occurs anywhere in this type.
    pub fn contains_generic(&self) -> bool {
        match self {
            Type::Generic(_) => true,
            Type::Array(element) => element.contains_generic(),
            Type::Union(left, right) => left.contains_generic() || right.contains_generic(),
            _ => false,
        }
    }

    /// Whether values of this type can be iterated: arrays, `Any`, and unions
    /// where every member is a collection.
    pub fn is_collection(&self) -> bool {
        match self {
            Type::Any | Type::Array(_) => true,
            Type::Union(left, right) => left.is_collection() && right.is_collection(),
            Type::Generic(generic) => generic.bound().is_some_and(Type::is_collection),
            _ => false,
        }
    }

    /// Supertypes of a plain type; empty for everything else.
    pub fn extended_types(&self) -> &[Type] {
        match self {
            Type::Plain(plain) => &plain.extended,
            _ => &[],
        }
    }

    /// Inline members of a synthetic type.
    pub fn inline_members(&self) -> Option<&SymbolTable> {
        match self {
            Type::Plain(plain) => plain.members.as_deref(),
            _ => None,
        }
    }

    /// Subtyping check: can a value of `other` be used where `self` is expected?
    ///
    /// - reflexive; `Any` on either side is always assignable
    /// - `Unknown` is assignable only to/from itself
    /// - a union source must fit as a whole: every member is checked
    /// - a union target accepts anything either member accepts
    /// - a bounded generic delegates to its bound; an unbounded one only
    ///   matches `Any`
    /// - arrays are covariant in their element type
    /// - plain types match by name, falling back to the source's supertypes
    pub fn is_assignable_from(&self, other: &Type) -> bool {
        if self == other || self.is_any() || other.is_any() {
            return true;
        }
        if self.is_unknown() || other.is_unknown() {
            return false;
        }

        match (self, other) {
            (_, Type::Union(left, right)) => {
                self.is_assignable_from(left) && self.is_assignable_from(right)
            }
            (Type::Union(left, right), _) => {
                left.is_assignable_from(other) || right.is_assignable_from(other)
            }
            (Type::Generic(generic), _) => generic
                .bound()
                .is_some_and(|bound| bound.is_assignable_from(other)),
            (_, Type::Generic(generic)) => generic
                .bound()
                .is_some_and(|bound| self.is_assignable_from(bound)),
            (Type::Array(target), Type::Array(source)) => target.is_assignable_from(source),
            (Type::Array(_), _) | (_, Type::Array(_)) => false,
            (Type::Plain(target), Type::Plain(source)) => {
                target.name == source.name
                    || source
                        .extended
                        .iter()
                        .any(|supertype| self.is_assignable_from(supertype))
            }
            _ => false,
        }
    }

    /// Ordering-operator compatibility.
    ///
    /// True if either side is `Any`, if both sides are number-like
    /// (`Number`/`Money`), or if both sides are the same temporal type.
    pub fn is_comparable_with(&self, other: &Type) -> bool {
        if self.is_any() || other.is_any() {
            return true;
        }
        match (self.comparison_family(), other.comparison_family()) {
            (Some(left), Some(right)) => left == right,
            _ => false,
        }
    }

    fn comparison_family(&self) -> Option<&'static str> {
        match self {
            Type::Generic(generic) => generic.bound().and_then(Type::comparison_family),
            Type::Union(left, right) => {
                let family = left.comparison_family()?;
                (right.comparison_family() == Some(family)).then_some(family)
            }
            _ if self.is_unknown() => None,
            _ if Type::number().is_assignable_from(self) => Some(native::NUMBER),
            _ if self.is_named(native::DATE) => Some(native::DATE),
            _ if self.is_named(native::DATETIME) => Some(native::DATETIME),
            _ => None,
        }
    }

    /// Most specific type both sides can be widened to.
    ///
    /// Used to merge `if` branches and infer inline array elements. Returns
    /// `None` when there is no common type.
    pub fn resolve_common_type_of(&self, other: &Type) -> Option<Type> {
        if self.is_unknown() || other.is_unknown() {
            return Some(Type::Unknown);
        }
        if self.is_any() || other.is_any() {
            return Some(Type::Any);
        }
        if self.is_assignable_from(other) {
            return Some(self.clone());
        }
        if other.is_assignable_from(self) {
            return Some(other.clone());
        }
        if let (Type::Array(left), Type::Array(right)) = (self, other) {
            return left.resolve_common_type_of(right).map(Type::array);
        }
        self.supertypes()
            .into_iter()
            .find(|supertype| supertype.is_assignable_from(other))
            .or_else(|| {
                other
                    .supertypes()
                    .into_iter()
                    .find(|supertype| supertype.is_assignable_from(self))
            })
    }

    /// Transitive supertypes, nearest first.
    fn supertypes(&self) -> Vec<Type> {
        let mut result: Vec<Type> = Vec::new();
        let mut pending: Vec<Type> = self.extended_types().to_vec();
        while !pending.is_empty() {
            let current = pending.remove(0);
            if result.contains(&current) {
                continue;
            }
            pending.extend(current.extended_types().iter().cloned());
            result.push(current);
        }
        result
    }

    /// Box this type into an array.
    ///
    /// No-op on `Any`/`Unknown`; distributes over unions.
    pub fn wrap_array_type(&self) -> Type {
        match self {
            Type::Any | Type::Unknown => self.clone(),
            Type::Union(left, right) => {
                Type::union(left.wrap_array_type(), right.wrap_array_type())
            }
            _ => Type::array(self.clone()),
        }
    }

    /// Remove one array layer.
    ///
    /// Non-array types are returned as-is; distributes over unions.
    pub fn unwrap_array_type(&self) -> Type {
        match self {
            Type::Array(element) => (**element).clone(),
            Type::Union(left, right) => {
                Type::union(left.unwrap_array_type(), right.unwrap_array_type())
            }
            _ => self.clone(),
        }
    }

    /// Project `target` through the array layers of `self`.
    ///
    /// Used when a path continues through a collection: `Vehicle[]` mapped to
    /// `Coverage` yields `Coverage[]`.
    pub fn map_to(&self, target: &Type) -> Type {
        match self {
            Type::Array(element) => Type::array(element.map_to(target)),
            Type::Union(left, right) => Type::union(left.map_to(target), right.map_to(target)),
            _ => target.clone(),
        }
    }

    /// Apply generic substitutions, recursing through arrays and unions.
    pub fn rewrite_generic_types(&self, rewrites: &GenericRewrites) -> Type {
        match self {
            Type::Generic(generic) => rewrites
                .get(generic.name())
                .cloned()
                .unwrap_or_else(|| self.clone()),
            Type::Array(element) => Type::array(element.rewrite_generic_types(rewrites)),
            Type::Union(left, right) => Type::union(
                left.rewrite_generic_types(rewrites),
                right.rewrite_generic_types(rewrites),
            ),
            _ => self.clone(),
        }
    }

    /// Replace every remaining generic with its bound, or `Any` if unbounded.
    pub fn rewrite_generic_bounds(&self) -> Type {
        match self {
            Type::Generic(generic) => generic
                .bound()
                .map(Type::rewrite_generic_bounds)
                .unwrap_or(Type::Any),
            Type::Array(element) => Type::array(element.rewrite_generic_bounds()),
            Type::Union(left, right) => Type::union(
                left.rewrite_generic_bounds(),
                right.rewrite_generic_bounds(),
            ),
            _ => self.clone(),
        }
    }

    /// Compute substitutions that make this (declared, possibly generic)
    /// parameter type match the concrete `argument` type.
    pub fn resolve_generic_type_rewrites(&self, argument: &Type) -> GenericRewrites {
        let mut rewrites = GenericRewrites::new();
        self.collect_generic_rewrites(argument, &mut rewrites);
        rewrites
    }

    fn collect_generic_rewrites(&self, argument: &Type, rewrites: &mut GenericRewrites) {
        match self {
            Type::Generic(generic) => {
                merge_rewrite(rewrites, generic.name(), argument.clone());
            }
            Type::Array(element) => match argument {
                Type::Any | Type::Unknown => element.collect_generic_rewrites(argument, rewrites),
                Type::Array(_) | Type::Union(..) => {
                    element.collect_generic_rewrites(&argument.unwrap_array_type(), rewrites)
                }
                _ => {}
            },
            Type::Union(left, right) => {
                left.collect_generic_rewrites(argument, rewrites);
                right.collect_generic_rewrites(argument, rewrites);
            }
            _ => {}
        }
    }
}

/// Record `name -> ty`, widening to the common type when `name` is already bound.
pub fn merge_rewrite(rewrites: &mut GenericRewrites, name: &str, ty: Type) {
    match rewrites.get(name) {
        Some(existing) => {
            if let Some(common) = existing.resolve_common_type_of(&ty) {
                rewrites.insert(name.to_string(), common);
            }
        }
        None => {
            rewrites.insert(name.to_string(), ty);
        }
    }
}

impl PlainType {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn extended(&self) -> &[Type] {
        &self.extended
    }

    pub fn is_synthetic(&self) -> bool {
        self.members.is_some()
    }
}

impl GenericType {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bound(&self) -> Option<&Type> {
        self.bound.as_deref()
    }
}

impl PartialEq for Type {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Type::Any, Type::Any) | (Type::Unknown, Type::Unknown) => true,
            (Type::Plain(left), Type::Plain(right)) => left.name == right.name,
            (Type::Array(left), Type::Array(right)) => left == right,
            (Type::Generic(left), Type::Generic(right)) => {
                left.name == right.name && left.bound == right.bound
            }
            (Type::Union(l1, r1), Type::Union(l2, r2)) => l1 == l2 && r1 == r2,
            _ => false,
        }
    }
}

impl Eq for Type {}

impl Hash for Type {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Type::Any | Type::Unknown => {}
            Type::Plain(plain) => plain.name.hash(state),
            Type::Array(element) => element.hash(state),
            Type::Generic(generic) => {
                generic.name.hash(state);
                generic.bound.hash(state);
            }
            Type::Union(left, right) => {
                left.hash(state);
                right.hash(state);
            }
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Any => write!(f, "{}", native::ANY),
            Type::Unknown => write!(f, "{}", native::UNKNOWN),
            Type::Plain(plain) => write!(f, "{}", plain.name),
            Type::Array(element) if element.is_union() => write!(f, "({})[]", element),
            Type::Array(element) => write!(f, "{}[]", element),
            Type::Generic(generic) => match generic.bound() {
                Some(bound) => write!(f, "<{} extends {}>", generic.name, bound),
                None => write!(f, "<{}>", generic.name),
            },
            Type::Union(left, right) => write!(f, "{} | {}", left, right),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vehicle() -> Type {
        Type::plain("Vehicle", vec![Type::plain("RiskItem", Vec::new())])
    }

    fn sample_types() -> Vec<Type> {
        let mut types = Type::natives().to_vec();
        types.extend([
            Type::Any,
            Type::Unknown,
            vehicle(),
            Type::array(vehicle()),
            Type::generic("T", None),
            Type::generic("N", Some(Type::number())),
            Type::union(Type::string(), Type::number()),
        ]);
        types
    }

    #[test]
    fn test_reflexive_and_any() {
        for ty in sample_types() {
            assert!(ty.is_assignable_from(&ty), "{ty} not reflexive");
            assert!(Type::Any.is_assignable_from(&ty), "Any <- {ty}");
            assert!(ty.is_assignable_from(&Type::Any), "{ty} <- Any");
        }
    }

    #[test]
    fn test_unknown_is_opaque() {
        assert!(!Type::number().is_assignable_from(&Type::Unknown));
        assert!(!Type::Unknown.is_assignable_from(&Type::number()));
        assert!(Type::Unknown.is_assignable_from(&Type::Unknown));
    }

    #[test]
    fn test_number_money_asymmetry() {
        assert!(Type::number().is_assignable_from(&Type::money()));
        assert!(!Type::money().is_assignable_from(&Type::number()));
    }

    #[test]
    fn test_extended_types() {
        let risk_item = Type::plain("RiskItem", Vec::new());
        assert!(risk_item.is_assignable_from(&vehicle()));
        assert!(!vehicle().is_assignable_from(&risk_item));
    }

    #[test]
    fn test_array_covariance() {
        let numbers = Type::array(Type::number());
        let money = Type::array(Type::money());
        assert!(numbers.is_assignable_from(&money));
        assert!(!money.is_assignable_from(&numbers));
        assert!(!numbers.is_assignable_from(&Type::number()));
        assert!(!numbers.is_assignable_from(&Type::array(Type::Unknown)));
        assert!(Type::array(Type::Any).is_assignable_from(&Type::array(Type::Unknown)));
        assert!(Type::array(Type::Any).is_assignable_from(&Type::Any));
    }

    #[test]
    fn test_union_assignability() {
        let union = Type::union(Type::string(), Type::number());
        assert!(union.is_assignable_from(&Type::string()));
        assert!(union.is_assignable_from(&Type::money()));
        assert!(!union.is_assignable_from(&Type::boolean()));
        assert!(!Type::string().is_assignable_from(&union));

        let numeric = Type::union(Type::number(), Type::money());
        assert!(Type::number().is_assignable_from(&numeric));
    }

    #[test]
    fn test_generic_assignability() {
        let bounded = Type::generic("N", Some(Type::number()));
        assert!(bounded.is_assignable_from(&Type::money()));
        assert!(!bounded.is_assignable_from(&Type::string()));
        assert!(Type::number().is_assignable_from(&bounded));

        let unbounded = Type::generic("T", None);
        assert!(!unbounded.is_assignable_from(&Type::string()));
        assert!(!Type::string().is_assignable_from(&unbounded));
    }

    #[test]
    fn test_comparable() {
        assert!(Type::number().is_comparable_with(&Type::money()));
        assert!(Type::date().is_comparable_with(&Type::date()));
        assert!(!Type::date().is_comparable_with(&Type::datetime()));
        assert!(!Type::string().is_comparable_with(&Type::string()));
        assert!(Type::string().is_comparable_with(&Type::Any));
        assert!(!Type::number().is_comparable_with(&Type::Unknown));
    }

    #[test]
    fn test_common_type() {
        assert_eq!(
            Type::number().resolve_common_type_of(&Type::money()),
            Some(Type::number())
        );
        assert_eq!(
            Type::money().resolve_common_type_of(&Type::number()),
            Some(Type::number())
        );
        assert_eq!(
            Type::string().resolve_common_type_of(&Type::Any),
            Some(Type::Any)
        );
        assert_eq!(
            Type::string().resolve_common_type_of(&Type::Unknown),
            Some(Type::Unknown)
        );
        assert_eq!(Type::string().resolve_common_type_of(&Type::number()), None);

        let risk_item = Type::plain("RiskItem", Vec::new());
        let trailer = Type::plain("Trailer", vec![risk_item.clone()]);
        assert_eq!(vehicle().resolve_common_type_of(&trailer), Some(risk_item));
    }

    #[test]
    fn test_wrap_unwrap_round_trip() {
        for ty in sample_types() {
            if ty.is_any() || ty.is_unknown() {
                assert_eq!(ty.wrap_array_type(), ty);
                continue;
            }
            assert_eq!(ty.wrap_array_type().unwrap_array_type(), ty, "{ty}");
        }
    }

    #[test]
    fn test_map_to() {
        let coverage = Type::plain("Coverage", Vec::new());
        let vehicles = Type::array(vehicle());
        assert_eq!(vehicles.map_to(&coverage), Type::array(coverage.clone()));
        assert_eq!(vehicle().map_to(&coverage), coverage);
    }

    #[test]
    fn test_generic_rewrites() {
        let param = Type::array(Type::generic("T", None));
        let rewrites = param.resolve_generic_type_rewrites(&Type::array(vehicle()));
        assert_eq!(rewrites.get("T"), Some(&vehicle()));

        let returns = Type::generic("T", None);
        assert_eq!(returns.rewrite_generic_types(&rewrites), vehicle());

        let unresolved = Type::array(Type::generic("U", Some(Type::number())));
        assert_eq!(
            unresolved.rewrite_generic_types(&rewrites).rewrite_generic_bounds(),
            Type::array(Type::number())
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(Type::array(vehicle()).to_string(), "Vehicle[]");
        assert_eq!(
            Type::array(Type::union(Type::string(), Type::number())).to_string(),
            "(String | Number)[]"
        );
        assert_eq!(
            Type::generic("T", Some(Type::number())).to_string(),
            "<T extends Number>"
        );
    }
}
