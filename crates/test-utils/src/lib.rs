pub mod builders;
pub mod hooks;

pub use builders::ModuleBuilder;
pub use hooks::{ConcurrencyGauge, MockHook};
