//! Unit resolution and unit directory backends
//!
//! The resolver turns an application plus an optional unit id into exactly
//! one unit. Backends implement the [`UnitDirectory`] port; which one runs is
//! decided once from configuration through [`UnitBackend`].
//!
//! [`UnitDirectory`]: unitshell_domain::UnitDirectory

pub mod backends;
pub mod invocations;
pub mod registry;
pub mod resolver;

pub use backends::{LocalUnitDirectory, MemoryUnitDirectory, UnitBackend};
pub use invocations::InvocationLog;
pub use registry::InMemoryAppRegistry;
pub use resolver::TargetResolver;
