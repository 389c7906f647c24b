use std::net::SocketAddr;

use crate::ast::Program;
use crate::config::Config;
use crate::host::{ApiService, Console, ServiceError, SharedStorage};

mod environment;
mod error;
mod runtime;

pub use environment::Environment;
pub use error::EvalError;
use runtime::Evaluator;

/// Tree-walking interpreter that executes programs directly from the AST.
#[derive(Debug, Clone, Default)]
pub struct Interpreter {
    config: Config,
}

/// State of one program run: the global variables, the database slot and
/// the HTTP service started by `create_api`, if any.
#[derive(Debug, Default)]
pub struct Context {
    environment: Environment,
    storage: SharedStorage,
    service: Option<ApiService>,
}

impl Interpreter {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Runs `program` against a fresh context and hands the context back.
    pub fn run(&self, program: &Program, console: &mut dyn Console) -> Result<Context, EvalError> {
        let mut context = Context::new();
        self.run_in(program, &mut context, console)?;
        Ok(context)
    }

    /// Runs `program` against an existing context; earlier bindings stay visible.
    pub fn run_in(
        &self,
        program: &Program,
        context: &mut Context,
        console: &mut dyn Console,
    ) -> Result<(), EvalError> {
        log::debug!("evaluating {} statements", program.statements.len());
        let mut evaluator = Evaluator {
            config: &self.config,
            context,
            console,
        };
        evaluator.exec_block(&program.statements)
    }
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    pub fn storage(&self) -> &SharedStorage {
        &self.storage
    }

    /// Address of the running HTTP service.
    pub fn service_addr(&self) -> Option<SocketAddr> {
        self.service.as_ref().map(ApiService::addr)
    }

    /// Blocks until the HTTP service stops. Returns immediately when none was started.
    pub fn wait_for_service(&mut self) -> Result<(), ServiceError> {
        match self.service.take() {
            Some(service) => service.wait(),
            None => Ok(()),
        }
    }

    pub fn shutdown_service(&mut self) -> Result<(), ServiceError> {
        match self.service.take() {
            Some(service) => service.shutdown(),
            None => Ok(()),
        }
    }
}
