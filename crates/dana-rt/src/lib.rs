//! Dana Runtime
//!
//! Everything that only exists once a program actually runs: the scoped
//! context (E), the function registry (F), the struct system (G), the
//! tree-walking interpreter (H, I), the module loader (J), and the sandbox
//! façade (K) that embedders drive.

pub mod context;
pub mod error;
pub mod interpreter;
pub mod module;
pub mod registry;
pub mod sandbox;
pub mod struct_system;
pub mod value;

pub use context::{Context, ExecutionStatus, ScopeName};
pub use error::{Breadcrumb, Error, ErrorChain};
pub use interpreter::{Flow, Interpreter};
pub use module::HostModuleBridge;
pub use registry::{Function, MockReasonProvider, ReasonProvider};
pub use sandbox::{ExecutionResult, Sandbox};
pub use struct_system::{StructInstance, StructType};
pub use value::{ForeignObject, Value};
