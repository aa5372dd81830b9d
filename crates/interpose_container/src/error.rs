//! Container and construction errors.

use crate::key::TypeKey;

/// Boxed error used wherever a collaborator's failure is carried opaquely.
pub type BoxError = Box<dyn core::error::Error + Send + Sync + 'static>;

/// Errors raised while resolving from a container.
#[derive(Debug, thiserror::Error)]
pub enum ContainerError {
    /// A registered factory failed to produce an instance.
    #[error("factory for `{key}` failed")]
    Factory {
        /// The registration whose factory failed.
        key: TypeKey,
        /// The factory's error.
        #[source]
        source: BoxError,
    },

    /// A factory re-entered resolution of a key it is already resolving.
    #[error("cyclic resolution: {}", render_path(.path))]
    Cyclic {
        /// Keys on the resolution stack, ending with the repeated key.
        path: Vec<TypeKey>,
    },

    /// A registration produced an instance of an unexpected type.
    #[error("registration for `{key}` produced an instance of `{found}`")]
    UnexpectedInstance {
        /// The requested key.
        key: TypeKey,
        /// The type the stored instance was erased from.
        found: TypeKey,
    },
}

/// Errors raised while resolving constructor arguments or constructing.
#[derive(Debug, thiserror::Error)]
pub enum ConstructionError {
    /// The container has no instance and no constructor is known for the type.
    #[error("no constructor registered for `{type_name}`")]
    NoConstructor {
        /// The type that could not be produced.
        type_name: &'static str,
    },

    /// The type depends on itself, directly or transitively.
    #[error("cyclic dependency: {}", render_path(.path))]
    Cyclic {
        /// Types on the resolution path, ending with the repeated type.
        path: Vec<TypeKey>,
    },

    /// The number of supplied arguments does not match the constructor.
    #[error("`{type_name}` takes {expected} constructor argument(s), {found} supplied")]
    SignatureMismatch {
        /// The type being constructed.
        type_name: &'static str,
        /// Number of constructor parameters.
        expected: usize,
        /// Number of arguments supplied.
        found: usize,
    },

    /// A supplied or resolved argument has the wrong type.
    #[error("constructor argument expected `{expected}`, found `{found}`")]
    ArgumentType {
        /// The parameter type.
        expected: &'static str,
        /// The argument's type.
        found: &'static str,
    },

    /// Resolving an argument from the container failed.
    #[error(transparent)]
    Container(#[from] ContainerError),
}

fn render_path(path: &[TypeKey]) -> String {
    path.iter()
        .map(TypeKey::name)
        .collect::<Vec<_>>()
        .join(" -> ")
}
