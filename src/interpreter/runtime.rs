use crate::ast::Node;
use crate::builtins::{Arity, Builtin};
use crate::config::Config;
use crate::host::storage::sql_value;
use crate::host::{ApiService, Console, Notice, Storage};
use crate::runtime::dict::Dict;
use crate::runtime::json::coerce_literal;
use crate::runtime::value::Value;

use super::{Context, EvalError};

type EvalResult<T> = Result<T, EvalError>;

/// Tree-walking executor for one run of a program.
pub(super) struct Evaluator<'a> {
    pub(super) config: &'a Config,
    pub(super) context: &'a mut Context,
    pub(super) console: &'a mut dyn Console,
}

impl Evaluator<'_> {
    pub(super) fn exec_block(&mut self, body: &[Node]) -> EvalResult<()> {
        for node in body {
            self.eval(node)?;
        }
        Ok(())
    }

    pub(super) fn eval(&mut self, node: &Node) -> EvalResult<Value> {
        match node {
            Node::IntLiteral(value) => Ok(Value::Int(value.clone())),
            Node::BoolLiteral(value) => Ok(Value::Bool(*value)),
            Node::StringLiteral(text) => Ok(coerce_literal(text)),
            Node::DictLiteral(pairs) => {
                let mut dict = Dict::new();
                for (key, value) in pairs {
                    let key = self.eval(key)?;
                    let value = self.eval(value)?;
                    dict.insert(key, value)?;
                }
                Ok(Value::Dict(dict))
            }
            Node::BinaryOp { left, op, right } => {
                // Both operands are evaluated even when `and`/`or` could stop early.
                let left = self.eval(left)?;
                let right = self.eval(right)?;
                Ok(left.binary(*op, &right)?)
            }
            Node::UnaryOp { op, operand } => Ok(self.eval(operand)?.unary(*op)?),
            Node::Variable(name) => self
                .context
                .environment
                .get(name)
                .cloned()
                .ok_or_else(|| EvalError::UndefinedVariable { name: name.clone() }),
            Node::Assignment { target, value } => {
                self.assign(target, value)?;
                Ok(Value::None)
            }
            Node::Call { name, args } => self.eval_call(name, args),
            Node::Conditional {
                condition,
                then_block,
                elif_blocks,
                else_block,
            } => {
                if self.eval(condition)?.is_truthy() {
                    self.exec_block(then_block)?;
                    return Ok(Value::None);
                }
                for (condition, block) in elif_blocks {
                    if self.eval(condition)?.is_truthy() {
                        self.exec_block(block)?;
                        return Ok(Value::None);
                    }
                }
                if let Some(block) = else_block {
                    self.exec_block(block)?;
                }
                Ok(Value::None)
            }
            Node::IndexAccess { container, index } => {
                let container = self.eval(container)?;
                let index = self.eval(index)?;
                Ok(container.index(&index)?)
            }
        }
    }

    /// Binds `target` and returns the bound value so chained assignments share it.
    fn assign(&mut self, target: &str, value: &Node) -> EvalResult<Value> {
        let value = match value {
            Node::Assignment {
                target: inner,
                value,
            } => self.assign(inner, value)?,
            other => self.eval(other)?,
        };
        self.context.environment.set(target, value.clone());
        Ok(value)
    }

    fn eval_call(&mut self, name: &str, args: &[Node]) -> EvalResult<Value> {
        let builtin = Builtin::from_name(name).ok_or_else(|| EvalError::UndefinedFunction {
            name: name.to_string(),
        })?;
        let args = args
            .iter()
            .map(|arg| self.eval(arg))
            .collect::<EvalResult<Vec<_>>>()?;
        let arity = builtin.arity();
        if !arity.accepts(args.len())
            && let Arity::Exactly(expected) = arity
        {
            return Err(EvalError::ArityMismatch {
                name: builtin.name(),
                expected,
                found: args.len(),
            });
        }

        match builtin {
            Builtin::Print => self.print(&args),
            Builtin::ConnectDb => self.connect_db(text_arg(builtin, "path", &args[0])?)?,
            Builtin::CreateApi => self.create_api(text_arg(builtin, "title", &args[0])?)?,
            Builtin::DbCreateTable => self.db_create_table(&args[0], &args[1])?,
            Builtin::DbInsert => self.db_insert(&args[0], &args[1])?,
            Builtin::DbQuery => self.db_query(&args[0])?,
        }
        Ok(Value::None)
    }

    fn print(&mut self, args: &[Value]) {
        let line = args.iter().map(Value::to_output).collect::<String>();
        self.console.print(&line);
    }

    fn connect_db(&mut self, path: &str) -> EvalResult<()> {
        self.console
            .notice(Notice::Step, "Step: Connecting to the database");
        let storage = Storage::open(path)?;
        self.context.storage.install(storage)?;
        self.console
            .notice(Notice::Done, &format!("Connected to database: {path}"));
        Ok(())
    }

    fn create_api(&mut self, title: &str) -> EvalResult<()> {
        self.console.notice(Notice::Step, "Step: Creating the API");
        let service = ApiService::start(title, self.config.api_addr, self.context.storage.clone())?;
        self.console.notice(
            Notice::Done,
            &format!("API running at http://{}", service.addr()),
        );
        // A second service replaces the handle; the first keeps serving until exit.
        self.context.service = Some(service);
        Ok(())
    }

    fn db_create_table(&mut self, table: &Value, columns: &Value) -> EvalResult<()> {
        let storage = self.storage(Builtin::DbCreateTable)?;
        let table = text_arg(Builtin::DbCreateTable, "table", table)?;
        let columns = dict_arg(Builtin::DbCreateTable, "columns", columns)?
            .iter()
            .map(|(name, column_type)| (name.to_output(), column_type.to_output()))
            .collect::<Vec<_>>();

        self.console.notice(Notice::Step, "Step: Creating table");
        storage.create_table(table, &columns)?;
        log::info!("created table {table} with {} columns", columns.len());
        self.console
            .notice(Notice::Done, &format!("Table '{table}' created"));
        Ok(())
    }

    fn db_insert(&mut self, table: &Value, row: &Value) -> EvalResult<()> {
        let storage = self.storage(Builtin::DbInsert)?;
        let table = text_arg(Builtin::DbInsert, "table", table)?;
        let row = dict_arg(Builtin::DbInsert, "row", row)?
            .iter()
            .map(|(column, value)| {
                let value = sql_value(value).ok_or(EvalError::InvalidArgumentType {
                    function: Builtin::DbInsert.name(),
                    argument: "row",
                    expected: "str, 64-bit int, float, bool or null values",
                    got: value.type_name(),
                })?;
                Ok((column.to_output(), value))
            })
            .collect::<EvalResult<Vec<_>>>()?;

        self.console.notice(Notice::Step, "Step: Inserting data");
        storage.insert(table, row)?;
        log::info!("inserted one row into {table}");
        self.console
            .notice(Notice::Done, &format!("Data inserted into {table}"));
        Ok(())
    }

    fn db_query(&mut self, table: &Value) -> EvalResult<()> {
        let storage = self.storage(Builtin::DbQuery)?;
        let table = text_arg(Builtin::DbQuery, "table", table)?;

        self.console.notice(Notice::Step, "Step: Fetching data");
        let rows = storage.select_all(table)?;
        log::info!("fetched {} rows from {table}", rows.rows.len());
        for row in rows.tuples() {
            self.console.row(&row);
        }
        Ok(())
    }

    fn storage(&self, builtin: Builtin) -> EvalResult<Storage> {
        self.context
            .storage
            .get()?
            .ok_or(EvalError::NoDatabase {
                function: builtin.name(),
            })
    }
}

fn text_arg<'v>(builtin: Builtin, argument: &'static str, value: &'v Value) -> EvalResult<&'v str> {
    value.as_str().ok_or(EvalError::InvalidArgumentType {
        function: builtin.name(),
        argument,
        expected: "str",
        got: value.type_name(),
    })
}

fn dict_arg<'v>(builtin: Builtin, argument: &'static str, value: &'v Value) -> EvalResult<&'v Dict> {
    match value {
        Value::Dict(dict) => Ok(dict),
        other => Err(EvalError::InvalidArgumentType {
            function: builtin.name(),
            argument,
            expected: "dict",
            got: other.type_name(),
        }),
    }
}
