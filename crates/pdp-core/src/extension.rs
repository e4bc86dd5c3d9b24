// crates/pdp-core/src/extension.rs
// ============================================================================
// Module: PDP Extension Model
// Description: Descriptors for the three extensibility points of the PDP.
// Purpose: Give registries a typed, comparable view of every extension instance.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! An extension instance is what an extension identifier resolves to: a
//! datatype factory, a function, or a combining algorithm. Instances are
//! compared structurally; two instances with the same logical identifier are
//! either equal (and deduplicated) or in conflict.
//!
//! Functions are modelled as a tagged variant (first-order vs higher-order) so
//! signature inspection is a pattern match rather than a runtime type test.
//! Generic function factories describe parametric function families; they
//! instantiate a concrete first-order function for a given datatype.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Serialize;

use crate::capability::Capability;
use crate::catalog::datatypes;
use crate::identifiers::CombiningAlgId;
use crate::identifiers::DatatypeId;
use crate::identifiers::FunctionId;

// ============================================================================
// SECTION: Extension Trait
// ============================================================================

/// Extensibility point an extension instance belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtensionKind {
    /// Attribute datatype factory.
    Datatype,
    /// Non-generic function.
    Function,
    /// Generic function factory.
    GenericFunctionFactory,
    /// Rule or policy combining algorithm.
    CombiningAlgorithm,
    /// Decision result filter.
    ResultFilter,
}

impl ExtensionKind {
    /// Returns a stable label for the kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Datatype => "datatype",
            Self::Function => "function",
            Self::GenericFunctionFactory => "generic_function_factory",
            Self::CombiningAlgorithm => "combining_algorithm",
            Self::ResultFilter => "result_filter",
        }
    }
}

impl fmt::Display for ExtensionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Common contract for instances stored in a registry.
///
/// # Invariants
/// - `id` is the logical identifier used for registry membership.
/// - Equality is structural: equal instances are interchangeable.
pub trait Extension: fmt::Debug + PartialEq + Serialize + Send + Sync + 'static {
    /// Extensibility point of this instance type.
    const KIND: ExtensionKind;

    /// Returns the logical identifier of the instance.
    fn id(&self) -> &str;

    /// Returns true when the instance cannot work without `capability`.
    ///
    /// Only functions inspect their signature; every other extension kind is
    /// never capability-dependent.
    fn requires_capability(&self, _capability: Capability) -> bool {
        false
    }
}

// ============================================================================
// SECTION: Datatypes
// ============================================================================

/// Attribute datatype factory descriptor.
///
/// # Invariants
/// - `function_prefix` is the stem used to name per-datatype functions
///   (`{prefix}-equal`, `{prefix}-bag`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatatypeFactory {
    /// Datatype identifier.
    pub id: DatatypeId,
    /// Stem of the identifiers of functions specialized for this datatype.
    pub function_prefix: String,
    /// Whether an equality function is defined for values of this datatype.
    pub equality: bool,
    /// Whether bag and set functions are defined for this datatype.
    pub bag_functions: bool,
}

impl DatatypeFactory {
    /// Creates a datatype supporting equality and bag functions.
    #[must_use]
    pub fn new(id: impl Into<DatatypeId>, function_prefix: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            function_prefix: function_prefix.into(),
            equality: true,
            bag_functions: true,
        }
    }

    /// Returns the identifier of the `{prefix}-{suffix}` function.
    #[must_use]
    pub fn function_id(&self, suffix: &str) -> FunctionId {
        FunctionId::new(format!("{}-{suffix}", self.function_prefix))
    }
}

impl Extension for DatatypeFactory {
    const KIND: ExtensionKind = ExtensionKind::Datatype;

    fn id(&self) -> &str {
        self.id.as_str()
    }
}

// ============================================================================
// SECTION: Functions
// ============================================================================

/// Declared type of a function parameter or return value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParameterType {
    /// Datatype of the value (or of the bag elements).
    pub datatype: DatatypeId,
    /// Whether the value is a bag.
    pub bag: bool,
}

impl ParameterType {
    /// Single value of the given datatype.
    #[must_use]
    pub fn primitive(datatype: impl Into<DatatypeId>) -> Self {
        Self {
            datatype: datatype.into(),
            bag: false,
        }
    }

    /// Bag of values of the given datatype.
    #[must_use]
    pub fn bag(datatype: impl Into<DatatypeId>) -> Self {
        Self {
            datatype: datatype.into(),
            bag: true,
        }
    }
}

/// Function with a fully concrete signature.
///
/// # Invariants
/// - When `variadic` is true the last parameter type may repeat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FirstOrderFunction {
    /// Function identifier.
    pub id: FunctionId,
    /// Return type.
    pub return_type: ParameterType,
    /// Declared parameter types, in order.
    pub parameter_types: Vec<ParameterType>,
    /// Whether the last parameter is variadic.
    pub variadic: bool,
}

impl FirstOrderFunction {
    /// Creates a fixed-arity function.
    #[must_use]
    pub fn new(
        id: impl Into<FunctionId>,
        return_type: ParameterType,
        parameter_types: Vec<ParameterType>,
    ) -> Self {
        Self {
            id: id.into(),
            return_type,
            parameter_types,
            variadic: false,
        }
    }

    /// Marks the last parameter as variadic.
    #[must_use]
    pub fn variadic(mut self) -> Self {
        self.variadic = true;
        self
    }
}

/// Function taking another function as its first argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HigherOrderFunction {
    /// Function identifier.
    pub id: FunctionId,
    /// Whether the function returns a bag (as `map` does) instead of a boolean.
    pub returns_bag: bool,
    /// Minimum number of bag arguments following the sub-function.
    pub min_bag_arguments: usize,
}

/// Non-generic function instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "order", rename_all = "snake_case")]
pub enum Function {
    /// Function over concrete values.
    FirstOrder(FirstOrderFunction),
    /// Function over a sub-function and bags.
    HigherOrder(HigherOrderFunction),
}

impl Function {
    /// Returns the function identifier.
    #[must_use]
    pub const fn function_id(&self) -> &FunctionId {
        match self {
            Self::FirstOrder(function) => &function.id,
            Self::HigherOrder(function) => &function.id,
        }
    }
}

impl From<FirstOrderFunction> for Function {
    fn from(value: FirstOrderFunction) -> Self {
        Self::FirstOrder(value)
    }
}

impl From<HigherOrderFunction> for Function {
    fn from(value: HigherOrderFunction) -> Self {
        Self::HigherOrder(value)
    }
}

impl Extension for Function {
    const KIND: ExtensionKind = ExtensionKind::Function;

    fn id(&self) -> &str {
        self.function_id().as_str()
    }

    fn requires_capability(&self, capability: Capability) -> bool {
        // Higher-order functions are closed-set and carry no path-query parameter
        // of their own; a path-query argument belongs to the first-order sub-function.
        match self {
            Self::FirstOrder(function) => function
                .parameter_types
                .iter()
                .any(|parameter| parameter.datatype.as_str() == capability.datatype_id()),
            Self::HigherOrder(_) => false,
        }
    }
}

// ============================================================================
// SECTION: Generic Function Factories
// ============================================================================

/// Function family a generic factory produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FunctionFamily {
    /// `T-equal(T, T) -> boolean`.
    Equal,
    /// `T-one-and-only(bag<T>) -> T`.
    OneAndOnly,
    /// `T-bag-size(bag<T>) -> integer`.
    BagSize,
    /// `T-is-in(T, bag<T>) -> boolean`.
    IsIn,
    /// `T-bag(T...) -> bag<T>`.
    Bag,
    /// `T-intersection(bag<T>, bag<T>) -> bag<T>`.
    Intersection,
    /// `T-at-least-one-member-of(bag<T>, bag<T>) -> boolean`.
    AtLeastOneMemberOf,
    /// `T-union(bag<T>, bag<T>...) -> bag<T>`.
    Union,
    /// `T-subset(bag<T>, bag<T>) -> boolean`.
    Subset,
    /// `T-set-equals(bag<T>, bag<T>) -> boolean`.
    SetEquals,
}

impl FunctionFamily {
    /// All families, in catalogue order.
    pub const ALL: [Self; 10] = [
        Self::Equal,
        Self::OneAndOnly,
        Self::BagSize,
        Self::IsIn,
        Self::Bag,
        Self::Intersection,
        Self::AtLeastOneMemberOf,
        Self::Union,
        Self::Subset,
        Self::SetEquals,
    ];

    /// Returns the suffix appended to the datatype function prefix.
    #[must_use]
    pub const fn suffix(self) -> &'static str {
        match self {
            Self::Equal => "equal",
            Self::OneAndOnly => "one-and-only",
            Self::BagSize => "bag-size",
            Self::IsIn => "is-in",
            Self::Bag => "bag",
            Self::Intersection => "intersection",
            Self::AtLeastOneMemberOf => "at-least-one-member-of",
            Self::Union => "union",
            Self::Subset => "subset",
            Self::SetEquals => "set-equals",
        }
    }

    /// Returns true when the family only applies to datatypes with equality.
    #[must_use]
    pub const fn requires_equality(self) -> bool {
        matches!(self, Self::Equal)
    }
}

/// Factory for a parametric function family.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenericFunctionFactory {
    /// Factory identifier.
    pub id: FunctionId,
    /// Family of functions produced.
    pub family: FunctionFamily,
}

impl GenericFunctionFactory {
    /// Creates a factory for `family` with its conventional identifier.
    #[must_use]
    pub fn for_family(family: FunctionFamily) -> Self {
        Self {
            id: FunctionId::new(format!("urn:pdp:function-family:{}", family.suffix())),
            family,
        }
    }

    /// Returns true when the family can be instantiated for `datatype`.
    #[must_use]
    pub const fn supports(&self, datatype: &DatatypeFactory) -> bool {
        if self.family.requires_equality() { datatype.equality } else { datatype.bag_functions }
    }

    /// Instantiates the concrete function of this family for `datatype`.
    ///
    /// Returns `None` when the datatype does not support the family.
    #[must_use]
    pub fn instantiate(&self, datatype: &DatatypeFactory) -> Option<FirstOrderFunction> {
        if !self.supports(datatype) {
            return None;
        }
        let id = datatype.function_id(self.family.suffix());
        let value = || ParameterType::primitive(datatype.id.clone());
        let bag = || ParameterType::bag(datatype.id.clone());
        let boolean = ParameterType::primitive(datatypes::BOOLEAN);
        let function = match self.family {
            FunctionFamily::Equal => FirstOrderFunction::new(id, boolean, vec![value(), value()]),
            FunctionFamily::OneAndOnly => FirstOrderFunction::new(id, value(), vec![bag()]),
            FunctionFamily::BagSize => FirstOrderFunction::new(
                id,
                ParameterType::primitive(datatypes::INTEGER),
                vec![bag()],
            ),
            FunctionFamily::IsIn => FirstOrderFunction::new(id, boolean, vec![value(), bag()]),
            FunctionFamily::Bag => FirstOrderFunction::new(id, bag(), vec![value()]).variadic(),
            FunctionFamily::Intersection => FirstOrderFunction::new(id, bag(), vec![bag(), bag()]),
            FunctionFamily::Union => {
                FirstOrderFunction::new(id, bag(), vec![bag(), bag()]).variadic()
            }
            FunctionFamily::AtLeastOneMemberOf
            | FunctionFamily::Subset
            | FunctionFamily::SetEquals => {
                FirstOrderFunction::new(id, boolean, vec![bag(), bag()])
            }
        };
        Some(function)
    }
}

impl Extension for GenericFunctionFactory {
    const KIND: ExtensionKind = ExtensionKind::GenericFunctionFactory;

    fn id(&self) -> &str {
        self.id.as_str()
    }
}

// ============================================================================
// SECTION: Combining Algorithms
// ============================================================================

/// Elements a combining algorithm combines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CombinableKind {
    /// Rules within a policy.
    Rule,
    /// Policies within a policy set.
    Policy,
}

/// Combining algorithm descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CombiningAlg {
    /// Algorithm identifier.
    pub id: CombiningAlgId,
    /// Elements combined by the algorithm.
    pub combines: CombinableKind,
    /// Whether the algorithm is a deprecated legacy variant.
    pub legacy: bool,
}

impl CombiningAlg {
    /// Creates a non-legacy algorithm descriptor.
    #[must_use]
    pub fn new(id: impl Into<CombiningAlgId>, combines: CombinableKind) -> Self {
        Self {
            id: id.into(),
            combines,
            legacy: false,
        }
    }

    /// Creates a legacy algorithm descriptor.
    #[must_use]
    pub fn legacy(id: impl Into<CombiningAlgId>, combines: CombinableKind) -> Self {
        Self {
            id: id.into(),
            combines,
            legacy: true,
        }
    }
}

impl Extension for CombiningAlg {
    const KIND: ExtensionKind = ExtensionKind::CombiningAlgorithm;

    fn id(&self) -> &str {
        self.id.as_str()
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test fixtures use explicit asserts and unwraps for clarity."
    )]

    use super::*;

    fn ip_address() -> DatatypeFactory {
        DatatypeFactory {
            id: DatatypeId::new(datatypes::IP_ADDRESS),
            function_prefix: "urn:oasis:names:tc:xacml:2.0:function:ipAddress".to_string(),
            equality: false,
            bag_functions: true,
        }
    }

    #[test]
    fn bag_family_instantiates_variadic_bag_function() {
        let string = DatatypeFactory::new(datatypes::STRING, "urn:example:function:string");
        let factory = GenericFunctionFactory::for_family(FunctionFamily::Bag);
        let Some(function) = factory.instantiate(&string) else {
            panic!("string supports bag functions");
        };
        assert_eq!(function.id.as_str(), "urn:example:function:string-bag");
        assert!(function.variadic);
        assert_eq!(function.return_type, ParameterType::bag(datatypes::STRING));
    }

    #[test]
    fn equal_family_skips_datatypes_without_equality() {
        let factory = GenericFunctionFactory::for_family(FunctionFamily::Equal);
        assert!(factory.instantiate(&ip_address()).is_none());
        let size = GenericFunctionFactory::for_family(FunctionFamily::BagSize);
        assert!(size.instantiate(&ip_address()).is_some());
    }

    #[test]
    fn non_function_extensions_never_require_capabilities() {
        let datatype = DatatypeFactory::new(datatypes::XPATH_EXPRESSION, "urn:example:xpath");
        assert!(!datatype.requires_capability(Capability::XPath));
        let alg = CombiningAlg::new("urn:example:alg", CombinableKind::Rule);
        assert!(!alg.requires_capability(Capability::XPath));
    }
}
