//! API endpoint implementations.

mod parameters;
mod systems;

pub use parameters::ParametersApi;
pub use systems::SystemsApi;
