//! Built-in KEL function library.
//!
//! Functions are plain signatures; generic parameters (`<T>`,
//! `<T extends Number>`) are bound per call site from the argument types.
//!
//! The library is attached to a scope chain as an extra static root above the
//! outermost scope, so built-ins are found last and domain functions with the
//! same name and arity shadow them. A dynamic global scope with the library
//! installed can resolve functions.
//!
//! # Examples
//!
//! ```
//! # use std::sync::Arc;
//! # use kel_ast::{Scope, ScopeType, Type, TypeRegistry};
//! # use kel_resolve::library::FunctionLibrary;
//! let global = Scope::root("global", ScopeType::Global, Type::Any, Arc::new(TypeRegistry::new()));
//! assert!(global.resolve_function_symbol("Count", 1).is_err());
//!
//! let global = FunctionLibrary::standard().install(&global);
//! let count = global.resolve_function_symbol("Count", 1).unwrap().unwrap();
//! assert_eq!(count.resolve_return_type(&[Type::array(Type::string())]), Type::number());
//! ```

use std::sync::{Arc, OnceLock};

use kel_ast::{FunctionSymbol, Scope, ScopeType, SymbolTable, Type};

/// Name of the synthetic type carrying the built-in functions.
pub const LIBRARY_TYPE: &str = "KelLibrary";

/// A set of function signatures installable into a scope chain.
#[derive(Debug, Clone)]
pub struct FunctionLibrary {
    functions: SymbolTable,
}

/// Standard library instance
///
/// Lazily initialized on first access.
static STANDARD_LIBRARY: OnceLock<FunctionLibrary> = OnceLock::new();

impl FunctionLibrary {
    pub fn new(functions: SymbolTable) -> Self {
        Self { functions }
    }

    /// Get or initialize the standard library.
    pub fn standard() -> &'static FunctionLibrary {
        STANDARD_LIBRARY.get_or_init(Self::initialize)
    }

    fn initialize() -> FunctionLibrary {
        let t = || Type::generic("T", None);
        let n = || Type::generic("T", Some(Type::number()));
        let number = Type::number;
        let string = Type::string;
        let boolean = Type::boolean;
        let date = Type::date;

        let signatures = [
            // Collections
            ("Count", number(), vec![Type::array(t())]),
            ("Sum", number(), vec![Type::array(number())]),
            ("Avg", number(), vec![Type::array(number())]),
            ("Min", n(), vec![Type::array(n())]),
            ("Max", n(), vec![Type::array(n())]),
            ("First", t(), vec![Type::array(t())]),
            ("Last", t(), vec![Type::array(t())]),
            ("Distinct", Type::array(t()), vec![Type::array(t())]),
            ("Flat", Type::array(t()), vec![Type::array(Type::array(t()))]),
            ("Join", Type::array(t()), vec![Type::array(t()), Type::array(t())]),
            ("Any", boolean(), vec![Type::array(boolean())]),
            ("All", boolean(), vec![Type::array(boolean())]),
            ("Includes", boolean(), vec![Type::array(t()), t()]),
            // Dates
            ("Date", date(), vec![string()]),
            ("DateTime", Type::datetime(), vec![string()]),
            ("Today", date(), vec![]),
            ("Now", Type::datetime(), vec![]),
            ("Year", number(), vec![date()]),
            ("Month", number(), vec![date()]),
            ("Day", number(), vec![date()]),
            ("PlusDays", date(), vec![date(), number()]),
            // Numbers
            ("Abs", number(), vec![number()]),
            ("Round", number(), vec![number()]),
            ("Floor", number(), vec![number()]),
            ("Ceil", number(), vec![number()]),
            // Strings
            ("Upper", string(), vec![string()]),
            ("Lower", string(), vec![string()]),
            ("Trim", string(), vec![string()]),
            ("Length", number(), vec![string()]),
            ("Contains", boolean(), vec![string(), string()]),
            ("Concat", string(), vec![Type::array(string())]),
            // Misc
            ("IsEmpty", boolean(), vec![Type::Any]),
            ("GetType", Type::type_of_type(), vec![Type::Any]),
        ];

        let mut functions = SymbolTable::new();
        for (name, return_type, parameters) in signatures {
            functions.add_function(FunctionSymbol::new(name, return_type, parameters));
        }
        FunctionLibrary { functions }
    }

    pub fn functions(&self) -> &[FunctionSymbol] {
        self.functions.functions()
    }

    /// Attach this library above the outermost scope of `scope`'s chain.
    pub fn install(&self, scope: &Arc<Scope>) -> Arc<Scope> {
        let root = Scope::root(
            "library",
            ScopeType::Global,
            Type::synthetic(LIBRARY_TYPE, self.functions.clone()),
            Arc::clone(scope.all_types()),
        );
        scope.rebase(root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kel_ast::TypeRegistry;

    fn installed() -> Arc<Scope> {
        let global = Scope::root(
            "global",
            ScopeType::Global,
            Type::Any,
            Arc::new(TypeRegistry::new()),
        );
        FunctionLibrary::standard().install(&global)
    }

    #[test]
    fn test_generic_return_types() {
        let scope = installed();
        let first = scope.resolve_function_symbol("First", 1).unwrap().unwrap();
        assert_eq!(
            first.resolve_return_type(&[Type::array(Type::money())]),
            Type::money()
        );

        let flat = scope.resolve_function_symbol("Flat", 1).unwrap().unwrap();
        assert_eq!(
            flat.resolve_return_type(&[Type::array(Type::array(Type::date()))]),
            Type::array(Type::date())
        );

        let max = scope.resolve_function_symbol("Max", 1).unwrap().unwrap();
        assert_eq!(
            max.resolve_return_type(&[Type::array(Type::money())]),
            Type::money()
        );
    }

    #[test]
    fn test_library_is_outermost() {
        let scope = installed();
        assert_eq!(scope.chain().count(), 2);
        assert_eq!(scope.chain().last().unwrap().name(), "library");
        assert!(scope.resolve_function_symbol("Count", 2).unwrap().is_none());
    }

    #[test]
    fn test_standard_library_size() {
        let functions = FunctionLibrary::standard().functions();
        assert_eq!(functions.len(), 33);
    }
}
