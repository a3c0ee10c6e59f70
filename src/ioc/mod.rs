//! Inversion of control: lowering forms into resumable state machines.
//!
//! Pipeline: Syntax → lower (blocks of instructions) → analyze (slot
//! layout) → emit (block programs) → `create` / `step`.

pub mod analyze;
pub mod builder;
pub mod emit;
pub mod lower;
pub mod state;
pub mod types;

pub use analyze::{analyze, Layout};
pub use builder::{Builder, ScopedStack};
pub use emit::emit;
pub use lower::{lower, Lowered};
pub use state::{step, State, StateHandle, StateMachine, Status, Step};
pub use types::{
    AssignTarget, BlockId, CatchType, Inst, Instruction, Lambda, Machine, Member, Operand, ValueId,
};

use crate::error::CompileResult;
use crate::host::{Env, Host, Terminators};
use crate::syntax::{Expand, SugarExpander, Syntax, SyntaxKind};
use std::fmt;
use std::rc::Rc;

/// Inputs of one compilation besides the form itself.
#[derive(Clone)]
pub struct CompileOptions {
    /// Parameter names, installed in slots 6.. by `create_with`
    pub params: Vec<String>,
    pub env: Env,
    pub terminators: Terminators,
    pub name: Option<String>,
    pub expander: Rc<dyn Expand>,
}

impl Default for CompileOptions {
    fn default() -> Self {
        CompileOptions {
            params: Vec::new(),
            env: Env::new(),
            terminators: Terminators::new(),
            name: None,
            expander: Rc::new(SugarExpander::new()),
        }
    }
}

impl fmt::Debug for CompileOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompileOptions")
            .field("params", &self.params)
            .field("env", &self.env)
            .field("terminators", &self.terminators)
            .field("name", &self.name)
            .finish()
    }
}

impl CompileOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_param(mut self, name: &str) -> Self {
        self.params.push(name.to_string());
        self
    }

    /// Compile calls to `call_site` as suspensions through `handler`
    pub fn with_terminator(mut self, call_site: &str, handler: &str) -> Self {
        self.terminators.insert(call_site, handler);
        self
    }

    pub fn with_alias(mut self, from: &str, to: &str) -> Self {
        self.env.alias(from, to);
        self
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn with_expander(mut self, expander: Rc<dyn Expand>) -> Self {
        self.expander = expander;
        self
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("anonymous")
    }
}

/// Lower, analyze and emit `form`.
pub fn compile(form: &Syntax, options: &CompileOptions, host: &Rc<Host>) -> CompileResult<Rc<StateMachine>> {
    let machine = lower(form, options)?;
    let layout = analyze(&machine);
    emit(&machine, &layout, host, options.display_name())
}

/// Compile a closure body as its own machine. The body runs as a loop over
/// the declared parameters so a tail `recur` restarts the function.
pub(crate) fn compile_lambda(lambda: &Lambda, host: &Rc<Host>) -> CompileResult<Rc<StateMachine>> {
    let span = lambda.span.clone();
    let bindings = lambda
        .params
        .iter()
        .flat_map(|p| [Syntax::symbol(p.clone(), span.clone()), Syntax::symbol(p.clone(), span.clone())])
        .collect();
    let mut items = vec![
        Syntax::symbol("loop", span.clone()),
        Syntax::new(SyntaxKind::Vector(bindings), span.clone()),
    ];
    items.extend(lambda.body.iter().cloned());
    let body = Syntax::list(items, span);

    let options = CompileOptions {
        params: lambda.machine_params(),
        env: lambda.env.clone(),
        terminators: Terminators::new(),
        name: Some(lambda.name.clone().unwrap_or_else(|| "fn".to_string())),
        expander: lambda.expander.clone(),
    };
    compile(&body, &options, host)
}
