// crates/pdp-core/src/catalog.rs
// ============================================================================
// Module: Standard Catalogue
// Description: Built-in datatypes, functions, and combining algorithms.
// Purpose: Compute the standard registries once and share them immutably.
// Dependencies: crate::{extension, registry}
// ============================================================================

//! ## Overview
//! The standard catalogue holds the sealed built-in registries for every
//! extensibility point. It is computed once by [`StandardCatalog::new`] and
//! then shared through [`Arc`]s; callers keep one catalogue per process and
//! pass it to every assembly. The catalogue has no mutation API: a registry
//! that accepts additions is a [`crate::RegistryBuilder`], never a catalogue
//! entry.
//!
//! Datatype and function sets come in two variants: with and without the
//! `XPath` capability. The path-query datatype and the functions taking it are
//! only present in the capability-enabled variant.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use crate::capability::Capability;
use crate::extension::CombinableKind;
use crate::extension::CombiningAlg;
use crate::extension::DatatypeFactory;
use crate::extension::Extension;
use crate::extension::FirstOrderFunction;
use crate::extension::Function;
use crate::extension::FunctionFamily;
use crate::extension::GenericFunctionFactory;
use crate::extension::HigherOrderFunction;
use crate::extension::ParameterType;
use crate::identifiers::FunctionId;
use crate::registry::CombiningAlgRegistry;
use crate::registry::DatatypeRegistry;
use crate::registry::FunctionRegistry;
use crate::registry::Registry;
use crate::registry::RegistryBuilder;
use crate::registry::RegistryError;

// ============================================================================
// SECTION: Standard Identifiers
// ============================================================================

/// Standard datatype identifiers.
pub mod datatypes {
    /// `string`.
    pub const STRING: &str = "http://www.w3.org/2001/XMLSchema#string";
    /// `boolean`.
    pub const BOOLEAN: &str = "http://www.w3.org/2001/XMLSchema#boolean";
    /// `integer`.
    pub const INTEGER: &str = "http://www.w3.org/2001/XMLSchema#integer";
    /// `double`.
    pub const DOUBLE: &str = "http://www.w3.org/2001/XMLSchema#double";
    /// `time`.
    pub const TIME: &str = "http://www.w3.org/2001/XMLSchema#time";
    /// `date`.
    pub const DATE: &str = "http://www.w3.org/2001/XMLSchema#date";
    /// `dateTime`.
    pub const DATE_TIME: &str = "http://www.w3.org/2001/XMLSchema#dateTime";
    /// `anyURI`.
    pub const ANY_URI: &str = "http://www.w3.org/2001/XMLSchema#anyURI";
    /// `hexBinary`.
    pub const HEX_BINARY: &str = "http://www.w3.org/2001/XMLSchema#hexBinary";
    /// `base64Binary`.
    pub const BASE64_BINARY: &str = "http://www.w3.org/2001/XMLSchema#base64Binary";
    /// `dayTimeDuration`.
    pub const DAY_TIME_DURATION: &str = "http://www.w3.org/2001/XMLSchema#dayTimeDuration";
    /// `yearMonthDuration`.
    pub const YEAR_MONTH_DURATION: &str = "http://www.w3.org/2001/XMLSchema#yearMonthDuration";
    /// `x500Name`.
    pub const X500_NAME: &str = "urn:oasis:names:tc:xacml:1.0:data-type:x500Name";
    /// `rfc822Name`.
    pub const RFC822_NAME: &str = "urn:oasis:names:tc:xacml:1.0:data-type:rfc822Name";
    /// `ipAddress`.
    pub const IP_ADDRESS: &str = "urn:oasis:names:tc:xacml:2.0:data-type:ipAddress";
    /// `dnsName`.
    pub const DNS_NAME: &str = "urn:oasis:names:tc:xacml:2.0:data-type:dnsName";
    /// `xpathExpression`, tied to the `XPath` capability.
    pub const XPATH_EXPRESSION: &str = "urn:oasis:names:tc:xacml:3.0:data-type:xpathExpression";
}

/// Function identifier prefixes by standard version.
const FN_1_0: &str = "urn:oasis:names:tc:xacml:1.0:function";
/// XACML 2.0 function prefix.
const FN_2_0: &str = "urn:oasis:names:tc:xacml:2.0:function";
/// XACML 3.0 function prefix.
const FN_3_0: &str = "urn:oasis:names:tc:xacml:3.0:function";

/// Rule combining algorithm prefix (3.0).
const RULE_ALG_3_0: &str = "urn:oasis:names:tc:xacml:3.0:rule-combining-algorithm";
/// Policy combining algorithm prefix (3.0).
const POLICY_ALG_3_0: &str = "urn:oasis:names:tc:xacml:3.0:policy-combining-algorithm";
/// Rule combining algorithm prefix (1.0).
const RULE_ALG_1_0: &str = "urn:oasis:names:tc:xacml:1.0:rule-combining-algorithm";
/// Policy combining algorithm prefix (1.0).
const POLICY_ALG_1_0: &str = "urn:oasis:names:tc:xacml:1.0:policy-combining-algorithm";
/// Rule combining algorithm prefix (1.1).
const RULE_ALG_1_1: &str = "urn:oasis:names:tc:xacml:1.1:rule-combining-algorithm";
/// Policy combining algorithm prefix (1.1).
const POLICY_ALG_1_1: &str = "urn:oasis:names:tc:xacml:1.1:policy-combining-algorithm";

// ============================================================================
// SECTION: Catalogue
// ============================================================================

/// Process-scoped catalogue of standard registries.
///
/// # Invariants
/// - Built once by [`StandardCatalog::new`]; every accessor returns a shared
///   [`Arc`] to a sealed registry.
/// - The capability-disabled variants never contain path-query datatypes or
///   functions.
#[derive(Debug, Clone)]
pub struct StandardCatalog {
    /// Datatypes without the `XPath` datatype.
    datatypes: Arc<DatatypeRegistry>,
    /// Datatypes including the `XPath` datatype.
    datatypes_with_xpath: Arc<DatatypeRegistry>,
    /// Functions without `XPath`-based functions.
    functions: Arc<FunctionRegistry>,
    /// Functions including `XPath`-based functions.
    functions_with_xpath: Arc<FunctionRegistry>,
    /// Rule and policy combining algorithms.
    combining_algorithms: Arc<CombiningAlgRegistry>,
}

impl StandardCatalog {
    /// Builds every standard registry.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] when two standard definitions collide.
    pub fn new() -> Result<Self, RegistryError> {
        let all_datatypes = standard_datatypes();
        let generic_factories = standard_generic_factories()?;

        let mut without_xpath = RegistryBuilder::new();
        let mut with_xpath = RegistryBuilder::new();
        for datatype in &all_datatypes {
            if datatype.id.as_str() != Capability::XPath.datatype_id() {
                without_xpath.register(Arc::clone(datatype))?;
            }
            with_xpath.register(Arc::clone(datatype))?;
        }

        let all_functions = standard_functions(&all_datatypes, &generic_factories);
        let mut functions = RegistryBuilder::new();
        let mut functions_xpath = RegistryBuilder::new();
        for function in all_functions {
            if !function.requires_capability(Capability::XPath) {
                functions.register(Arc::clone(&function))?;
            }
            functions_xpath.register(function)?;
        }

        Ok(Self {
            datatypes: Arc::new(without_xpath.build()),
            datatypes_with_xpath: Arc::new(with_xpath.build()),
            functions: Arc::new(FunctionRegistry::new(
                functions.build(),
                generic_factories.clone(),
            )),
            functions_with_xpath: Arc::new(FunctionRegistry::new(
                functions_xpath.build(),
                generic_factories,
            )),
            combining_algorithms: Arc::new(standard_combining_algorithms()?),
        })
    }

    /// Returns the standard datatype registry for the capability setting.
    #[must_use]
    pub const fn datatypes(&self, xpath_enabled: bool) -> &Arc<DatatypeRegistry> {
        if xpath_enabled { &self.datatypes_with_xpath } else { &self.datatypes }
    }

    /// Returns the standard function registry for the capability setting.
    #[must_use]
    pub const fn functions(&self, xpath_enabled: bool) -> &Arc<FunctionRegistry> {
        if xpath_enabled { &self.functions_with_xpath } else { &self.functions }
    }

    /// Returns the standard combining algorithm registry.
    #[must_use]
    pub const fn combining_algorithms(&self) -> &Arc<CombiningAlgRegistry> {
        &self.combining_algorithms
    }
}

// ============================================================================
// SECTION: Datatypes
// ============================================================================

/// Builds the standard datatype factories.
fn standard_datatypes() -> Vec<Arc<DatatypeFactory>> {
    let regular = [
        (datatypes::STRING, FN_1_0, "string"),
        (datatypes::BOOLEAN, FN_1_0, "boolean"),
        (datatypes::INTEGER, FN_1_0, "integer"),
        (datatypes::DOUBLE, FN_1_0, "double"),
        (datatypes::TIME, FN_1_0, "time"),
        (datatypes::DATE, FN_1_0, "date"),
        (datatypes::DATE_TIME, FN_1_0, "dateTime"),
        (datatypes::ANY_URI, FN_1_0, "anyURI"),
        (datatypes::HEX_BINARY, FN_1_0, "hexBinary"),
        (datatypes::BASE64_BINARY, FN_1_0, "base64Binary"),
        (datatypes::DAY_TIME_DURATION, FN_3_0, "dayTimeDuration"),
        (datatypes::YEAR_MONTH_DURATION, FN_3_0, "yearMonthDuration"),
        (datatypes::X500_NAME, FN_1_0, "x500Name"),
        (datatypes::RFC822_NAME, FN_1_0, "rfc822Name"),
    ];
    let mut out: Vec<Arc<DatatypeFactory>> = regular
        .iter()
        .map(|(id, prefix, name)| Arc::new(DatatypeFactory::new(*id, format!("{prefix}:{name}"))))
        .collect();
    for (id, name) in [(datatypes::IP_ADDRESS, "ipAddress"), (datatypes::DNS_NAME, "dnsName")] {
        out.push(Arc::new(DatatypeFactory {
            equality: false,
            ..DatatypeFactory::new(id, format!("{FN_2_0}:{name}"))
        }));
    }
    out.push(Arc::new(DatatypeFactory {
        equality: false,
        bag_functions: false,
        ..DatatypeFactory::new(datatypes::XPATH_EXPRESSION, format!("{FN_3_0}:xpathExpression"))
    }));
    out
}

// ============================================================================
// SECTION: Functions
// ============================================================================

/// Builds the generic factories for every bag and set function family.
fn standard_generic_factories() -> Result<Registry<GenericFunctionFactory>, RegistryError> {
    let mut builder = RegistryBuilder::new();
    for family in FunctionFamily::ALL {
        builder.register(Arc::new(GenericFunctionFactory::for_family(family)))?;
    }
    Ok(builder.build())
}

/// Shorthand for a primitive parameter type.
fn p(datatype: &str) -> ParameterType {
    ParameterType::primitive(datatype)
}

/// Builds a fixed-arity first-order function.
fn first_order(
    id: String,
    return_type: ParameterType,
    parameter_types: Vec<ParameterType>,
) -> FirstOrderFunction {
    FirstOrderFunction::new(FunctionId::new(id), return_type, parameter_types)
}

/// Builds the standard non-generic functions.
fn standard_functions(
    all_datatypes: &[Arc<DatatypeFactory>],
    generic_factories: &Registry<GenericFunctionFactory>,
) -> Vec<Arc<Function>> {
    let mut out: Vec<FirstOrderFunction> = Vec::new();

    // Per-datatype equality, bag, and set functions.
    for datatype in all_datatypes {
        for factory in generic_factories.iter() {
            if let Some(function) = factory.instantiate(datatype) {
                out.push(function);
            }
        }
    }

    out.extend(arithmetic_functions());
    out.extend(comparison_functions());
    out.extend(logical_functions());
    out.extend(string_functions());
    out.extend(match_functions());
    out.extend(xpath_functions());

    let mut functions: Vec<Arc<Function>> =
        out.into_iter().map(|function| Arc::new(Function::from(function))).collect();
    functions.extend(higher_order_functions().into_iter().map(Arc::new));
    functions
}

/// Numeric arithmetic and conversion functions.
fn arithmetic_functions() -> Vec<FirstOrderFunction> {
    let mut out = Vec::new();
    for (name, datatype) in [("integer", datatypes::INTEGER), ("double", datatypes::DOUBLE)] {
        for op in ["add", "multiply"] {
            out.push(
                first_order(
                    format!("{FN_1_0}:{name}-{op}"),
                    p(datatype),
                    vec![p(datatype), p(datatype)],
                )
                .variadic(),
            );
        }
        for op in ["subtract", "divide"] {
            out.push(first_order(
                format!("{FN_1_0}:{name}-{op}"),
                p(datatype),
                vec![p(datatype), p(datatype)],
            ));
        }
        out.push(first_order(format!("{FN_1_0}:{name}-abs"), p(datatype), vec![p(datatype)]));
    }
    out.push(first_order(
        format!("{FN_1_0}:integer-mod"),
        p(datatypes::INTEGER),
        vec![p(datatypes::INTEGER), p(datatypes::INTEGER)],
    ));
    for op in ["round", "floor"] {
        out.push(first_order(
            format!("{FN_1_0}:{op}"),
            p(datatypes::DOUBLE),
            vec![p(datatypes::DOUBLE)],
        ));
    }
    out.push(first_order(
        format!("{FN_1_0}:integer-to-double"),
        p(datatypes::DOUBLE),
        vec![p(datatypes::INTEGER)],
    ));
    out.push(first_order(
        format!("{FN_1_0}:double-to-integer"),
        p(datatypes::INTEGER),
        vec![p(datatypes::DOUBLE)],
    ));
    out.push(first_order(
        format!("{FN_3_0}:dateTime-add-dayTimeDuration"),
        p(datatypes::DATE_TIME),
        vec![p(datatypes::DATE_TIME), p(datatypes::DAY_TIME_DURATION)],
    ));
    out.push(first_order(
        format!("{FN_3_0}:date-add-yearMonthDuration"),
        p(datatypes::DATE),
        vec![p(datatypes::DATE), p(datatypes::YEAR_MONTH_DURATION)],
    ));
    out
}

/// Ordering comparisons over totally ordered datatypes.
fn comparison_functions() -> Vec<FirstOrderFunction> {
    let ordered = [
        ("integer", datatypes::INTEGER),
        ("double", datatypes::DOUBLE),
        ("string", datatypes::STRING),
        ("time", datatypes::TIME),
        ("date", datatypes::DATE),
        ("dateTime", datatypes::DATE_TIME),
    ];
    let mut out = Vec::new();
    for (name, datatype) in ordered {
        for op in ["greater-than", "greater-than-or-equal", "less-than", "less-than-or-equal"] {
            out.push(first_order(
                format!("{FN_1_0}:{name}-{op}"),
                p(datatypes::BOOLEAN),
                vec![p(datatype), p(datatype)],
            ));
        }
    }
    out.push(first_order(
        format!("{FN_2_0}:time-in-range"),
        p(datatypes::BOOLEAN),
        vec![p(datatypes::TIME), p(datatypes::TIME), p(datatypes::TIME)],
    ));
    out
}

/// Boolean connectives.
fn logical_functions() -> Vec<FirstOrderFunction> {
    vec![
        first_order(format!("{FN_1_0}:not"), p(datatypes::BOOLEAN), vec![p(datatypes::BOOLEAN)]),
        first_order(format!("{FN_1_0}:and"), p(datatypes::BOOLEAN), vec![p(datatypes::BOOLEAN)])
            .variadic(),
        first_order(format!("{FN_1_0}:or"), p(datatypes::BOOLEAN), vec![p(datatypes::BOOLEAN)])
            .variadic(),
        first_order(
            format!("{FN_1_0}:n-of"),
            p(datatypes::BOOLEAN),
            vec![p(datatypes::INTEGER), p(datatypes::BOOLEAN)],
        )
        .variadic(),
    ]
}

/// String manipulation functions.
fn string_functions() -> Vec<FirstOrderFunction> {
    let mut out = vec![
        first_order(
            format!("{FN_2_0}:string-concatenate"),
            p(datatypes::STRING),
            vec![p(datatypes::STRING), p(datatypes::STRING)],
        )
        .variadic(),
        first_order(
            format!("{FN_1_0}:string-normalize-space"),
            p(datatypes::STRING),
            vec![p(datatypes::STRING)],
        ),
        first_order(
            format!("{FN_1_0}:string-normalize-to-lower-case"),
            p(datatypes::STRING),
            vec![p(datatypes::STRING)],
        ),
    ];
    for op in ["starts-with", "ends-with", "contains"] {
        out.push(first_order(
            format!("{FN_3_0}:string-{op}"),
            p(datatypes::BOOLEAN),
            vec![p(datatypes::STRING), p(datatypes::STRING)],
        ));
    }
    out
}

/// Regular-expression and special match functions.
fn match_functions() -> Vec<FirstOrderFunction> {
    let mut out = vec![
        first_order(
            format!("{FN_1_0}:string-regexp-match"),
            p(datatypes::BOOLEAN),
            vec![p(datatypes::STRING), p(datatypes::STRING)],
        ),
        first_order(
            format!("{FN_1_0}:x500Name-match"),
            p(datatypes::BOOLEAN),
            vec![p(datatypes::X500_NAME), p(datatypes::X500_NAME)],
        ),
        first_order(
            format!("{FN_1_0}:rfc822Name-match"),
            p(datatypes::BOOLEAN),
            vec![p(datatypes::STRING), p(datatypes::RFC822_NAME)],
        ),
    ];
    for (name, datatype) in [
        ("anyURI", datatypes::ANY_URI),
        ("ipAddress", datatypes::IP_ADDRESS),
        ("dnsName", datatypes::DNS_NAME),
        ("rfc822Name", datatypes::RFC822_NAME),
        ("x500Name", datatypes::X500_NAME),
    ] {
        out.push(first_order(
            format!("{FN_2_0}:{name}-regexp-match"),
            p(datatypes::BOOLEAN),
            vec![p(datatypes::STRING), p(datatype)],
        ));
    }
    out
}

/// Path-query functions, only present when the capability is enabled.
fn xpath_functions() -> Vec<FirstOrderFunction> {
    vec![
        first_order(
            format!("{FN_3_0}:xpath-node-count"),
            p(datatypes::INTEGER),
            vec![p(datatypes::XPATH_EXPRESSION)],
        ),
        first_order(
            format!("{FN_3_0}:xpath-node-equal"),
            p(datatypes::BOOLEAN),
            vec![p(datatypes::XPATH_EXPRESSION), p(datatypes::XPATH_EXPRESSION)],
        ),
        first_order(
            format!("{FN_3_0}:xpath-node-match"),
            p(datatypes::BOOLEAN),
            vec![p(datatypes::XPATH_EXPRESSION), p(datatypes::XPATH_EXPRESSION)],
        ),
    ]
}

/// Standard higher-order bag functions.
fn higher_order_functions() -> Vec<Function> {
    let boolean = [
        ("any-of", 1),
        ("all-of", 1),
        ("any-of-any", 1),
        ("all-of-any", 2),
        ("any-of-all", 2),
        ("all-of-all", 2),
    ];
    let mut out: Vec<Function> = boolean
        .iter()
        .map(|(name, min_bags)| {
            Function::from(HigherOrderFunction {
                id: FunctionId::new(format!("{FN_3_0}:{name}")),
                returns_bag: false,
                min_bag_arguments: *min_bags,
            })
        })
        .collect();
    out.push(Function::from(HigherOrderFunction {
        id: FunctionId::new(format!("{FN_3_0}:map")),
        returns_bag: true,
        min_bag_arguments: 1,
    }));
    out
}

// ============================================================================
// SECTION: Combining Algorithms
// ============================================================================

/// Builds the standard rule and policy combining algorithms.
fn standard_combining_algorithms() -> Result<CombiningAlgRegistry, RegistryError> {
    let mut builder = RegistryBuilder::new();
    let current = [
        "deny-overrides",
        "permit-overrides",
        "ordered-deny-overrides",
        "ordered-permit-overrides",
        "deny-unless-permit",
        "permit-unless-deny",
    ];
    for name in current {
        builder.register(Arc::new(CombiningAlg::new(
            format!("{RULE_ALG_3_0}:{name}"),
            CombinableKind::Rule,
        )))?;
        builder.register(Arc::new(CombiningAlg::new(
            format!("{POLICY_ALG_3_0}:{name}"),
            CombinableKind::Policy,
        )))?;
    }
    builder.register(Arc::new(CombiningAlg::new(
        format!("{RULE_ALG_1_0}:first-applicable"),
        CombinableKind::Rule,
    )))?;
    for name in ["first-applicable", "only-one-applicable-policy"] {
        builder.register(Arc::new(CombiningAlg::new(
            format!("{POLICY_ALG_1_0}:{name}"),
            CombinableKind::Policy,
        )))?;
    }
    for (rule_prefix, policy_prefix, name) in [
        (RULE_ALG_1_0, POLICY_ALG_1_0, "deny-overrides"),
        (RULE_ALG_1_0, POLICY_ALG_1_0, "permit-overrides"),
        (RULE_ALG_1_1, POLICY_ALG_1_1, "ordered-deny-overrides"),
        (RULE_ALG_1_1, POLICY_ALG_1_1, "ordered-permit-overrides"),
    ] {
        builder.register(Arc::new(CombiningAlg::legacy(
            format!("{rule_prefix}:{name}"),
            CombinableKind::Rule,
        )))?;
        builder.register(Arc::new(CombiningAlg::legacy(
            format!("{policy_prefix}:{name}"),
            CombinableKind::Policy,
        )))?;
    }
    Ok(builder.build())
}

// ============================================================================
// SECTION: Tests
// ============================================================================
