//! Method descriptors and argument views.
//!
//! Every proxied method has one static [`MethodDescriptor`], generated by
//! `#[contract]`. Hooks receive it to tell calls apart, and
//! [`Interceptor::before_call`](crate::Interceptor::before_call) receives the
//! call's arguments as an [`Arguments`] view.

use core::fmt;

use variadics_please::all_tuples;

/// Whether a method completes synchronously or returns a future.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReturnShape {
    /// The method's result is available when it returns.
    Sync,
    /// The method returns a future settled later.
    Async,
}

/// Static description of one contract method.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct MethodDescriptor {
    contract: &'static str,
    name: &'static str,
    parameters: &'static [&'static str],
    shape: ReturnShape,
}

impl MethodDescriptor {
    /// Describes a method.
    #[must_use]
    pub const fn new(
        contract: &'static str,
        name: &'static str,
        parameters: &'static [&'static str],
        shape: ReturnShape,
    ) -> Self {
        Self {
            contract,
            name,
            parameters,
            shape,
        }
    }

    /// Name of the contract declaring the method.
    #[must_use]
    pub fn contract(&self) -> &'static str {
        self.contract
    }

    /// The method's name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Parameter names, excluding the receiver.
    #[must_use]
    pub fn parameters(&self) -> &'static [&'static str] {
        self.parameters
    }

    /// The declared return shape.
    #[must_use]
    pub fn shape(&self) -> ReturnShape {
        self.shape
    }

    /// Returns `true` if the method returns a future.
    #[must_use]
    pub fn is_async(&self) -> bool {
        self.shape == ReturnShape::Async
    }
}

impl fmt::Display for MethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.contract, self.name)
    }
}

/// Static description of a contract: its name and proxied methods.
#[derive(Debug)]
pub struct ContractDescriptor {
    name: &'static str,
    methods: &'static [&'static MethodDescriptor],
}

impl ContractDescriptor {
    /// Describes a contract.
    #[must_use]
    pub const fn new(name: &'static str, methods: &'static [&'static MethodDescriptor]) -> Self {
        Self { name, methods }
    }

    /// The contract's name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The proxied methods, in declaration order.
    #[must_use]
    pub fn methods(&self) -> &'static [&'static MethodDescriptor] {
        self.methods
    }

    /// Looks up a method by name.
    #[must_use]
    pub fn method(&self, name: &str) -> Option<&'static MethodDescriptor> {
        self.methods.iter().copied().find(|method| method.name == name)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Arguments
// ─────────────────────────────────────────────────────────────────────────────

/// One named argument.
#[derive(Clone, Copy)]
pub struct Argument<'a> {
    /// The parameter name.
    pub name: &'static str,
    /// The argument value.
    pub value: &'a dyn fmt::Debug,
}

impl fmt::Debug for Argument<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {:?}", self.name, self.value)
    }
}

/// A borrowed view of a call's arguments, in declaration order.
pub struct Arguments<'a> {
    names: &'static [&'static str],
    values: Vec<&'a dyn fmt::Debug>,
}

impl<'a> Arguments<'a> {
    /// Pairs parameter names with argument values.
    #[must_use]
    pub fn new(names: &'static [&'static str], values: Vec<&'a dyn fmt::Debug>) -> Self {
        Self { names, values }
    }

    /// Number of arguments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if the method takes no arguments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns the argument at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<Argument<'a>> {
        let value = *self.values.get(index)?;
        let name = self.names.get(index).copied().unwrap_or("_");
        Some(Argument { name, value })
    }

    /// Iterates the arguments in order.
    pub fn iter(&self) -> impl Iterator<Item = Argument<'a>> + '_ {
        (0..self.values.len()).filter_map(|index| self.get(index))
    }
}

impl fmt::Debug for Arguments<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl fmt::Display for Arguments<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (index, argument) in self.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{argument:?}")?;
        }
        f.write_str(")")
    }
}

/// A call's arguments, captured by value before the target runs.
///
/// Implemented for `()` and tuples of up to 16 `Debug` values.
pub trait ArgumentList: Send {
    /// Borrows each argument for display.
    fn values(&self) -> Vec<&dyn fmt::Debug>;
}

impl ArgumentList for () {
    fn values(&self) -> Vec<&dyn fmt::Debug> {
        Vec::new()
    }
}

macro_rules! impl_argument_list_tuple {
    ($(($param:ident, $value:ident)),*) => {
        impl<$($param: fmt::Debug + Send),*> ArgumentList for ($($param,)*) {
            fn values(&self) -> Vec<&dyn fmt::Debug> {
                let ($($value,)*) = self;
                vec![$($value as &dyn fmt::Debug),*]
            }
        }
    };
}

all_tuples!(impl_argument_list_tuple, 1, 16, P, p);
