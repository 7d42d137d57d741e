//! Interpreter (§4.H Expression Executor + §4.I Statement Executor), driving
//! the AST against a [`Context`] and the function/struct registries it
//! carries.

pub mod expr;
pub mod stmt;

use crate::context::Context;
use crate::error::ErrorChain;
use crate::module::HostModuleBridge;
use crate::registry::ReasonProvider;
use crate::value::Value;
use dana_compiler::ast::Stmt;
use std::path::PathBuf;
use std::rc::Rc;

/// The non-local control transfers §4.I's `Return`/`Break`/`Continue`
/// statements raise. Every statement executor returns one of these instead
/// of unwinding through a panic or a dedicated error variant — `Normal`
/// means "fell through, keep executing the enclosing block".
pub enum Flow {
    Normal,
    Return(Value),
    Break,
    Continue,
}

/// The two host-provided seams (§4.F, §4.J) plus the module search path,
/// threaded through every statement/expression dispatch.
pub struct Interpreter {
    pub reason_provider: Option<Rc<dyn ReasonProvider>>,
    pub host_bridge: Option<Rc<dyn HostModuleBridge>>,
    pub search_paths: Vec<PathBuf>,
}

impl Interpreter {
    pub fn new(search_paths: Vec<PathBuf>) -> Self {
        Self {
            reason_provider: None,
            host_bridge: None,
            search_paths,
        }
    }

    pub fn with_reason_provider(mut self, provider: Rc<dyn ReasonProvider>) -> Self {
        self.reason_provider = Some(provider);
        self
    }

    pub fn with_host_bridge(mut self, bridge: Rc<dyn HostModuleBridge>) -> Self {
        self.host_bridge = Some(bridge);
        self
    }

    /// Execute a statement sequence in `ctx`, stopping early on the first
    /// non-`Normal` flow (a `return`/`break`/`continue` that the caller must
    /// handle).
    pub fn exec_block(&self, ctx: &Context, stmts: &[Stmt]) -> Result<Flow, ErrorChain> {
        for stmt in stmts {
            match self.exec_stmt(ctx, stmt)? {
                Flow::Normal => continue,
                other => return Ok(other),
            }
        }
        Ok(Flow::Normal)
    }
}
