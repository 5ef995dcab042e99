use std::io::{self, Write};
use std::rc::Rc;

use crate::Error;
use crate::ast::{Expr, FuncDef, Operator, Program};
use crate::builtins::{Arity, find_builtin};
use crate::config::Config;
use crate::environment::Environment;
use crate::value::Value;

/// Evaluate a program against `env`, printing to standard output
pub fn evaluate(program: &Program, env: &mut Environment<'_>) -> Result<Value, Error> {
    let mut stdout = io::stdout().lock();
    Evaluator::new(&mut stdout).eval_program(program, env)
}

/// Tree-walking evaluator writing `print` output to a caller-supplied sink
pub struct Evaluator<'out> {
    out: &'out mut dyn Write,
    max_depth: usize,
}

impl<'out> Evaluator<'out> {
    pub fn new(out: &'out mut dyn Write) -> Self {
        Self::with_config(out, &Config::default())
    }

    pub fn with_config(out: &'out mut dyn Write, config: &Config) -> Self {
        Evaluator {
            out,
            max_depth: config.max_eval_depth,
        }
    }

    /// Evaluate each top-level expression in order, yielding the last value
    pub fn eval_program(
        &mut self,
        program: &Program,
        env: &mut Environment<'_>,
    ) -> Result<Value, Error> {
        let mut last = None;
        for expr in &program.exprs {
            last = Some(self.eval(expr, env)?);
        }
        last.ok_or_else(|| Error::EvalError("cannot evaluate an empty program".into()))
    }

    /// Evaluate a single expression
    pub fn eval(&mut self, expr: &Expr, env: &mut Environment<'_>) -> Result<Value, Error> {
        self.eval_with_depth_tracking(expr, env, 0)
    }

    /// Evaluate an expression with depth tracking to prevent stack overflow
    fn eval_with_depth_tracking(
        &mut self,
        expr: &Expr,
        env: &mut Environment<'_>,
        depth: usize,
    ) -> Result<Value, Error> {
        if depth >= self.max_depth {
            return Err(Error::EvalError(format!(
                "Evaluation depth limit exceeded (max: {})",
                self.max_depth
            )));
        }

        match expr {
            Expr::Number(n) => Ok(Value::Number(*n)),
            Expr::Str(s) => Ok(Value::Str(s.clone())),

            Expr::Symbol(name) => env
                .get(name)
                .cloned()
                .ok_or_else(|| Error::SymbolNotFound(name.clone())),

            Expr::Assignment { name, value } => {
                let value = self.eval_with_depth_tracking(value, env, depth + 1)?;
                env.define(name.clone(), value.clone());
                Ok(value)
            }

            Expr::If {
                cond,
                then_branch,
                else_branch,
            } => {
                let branch = if self
                    .eval_with_depth_tracking(cond, env, depth + 1)?
                    .is_truthy()
                {
                    then_branch
                } else {
                    else_branch
                };
                self.eval_with_depth_tracking(branch, env, depth + 1)
            }

            Expr::Print(inner) => {
                let value = self.eval_with_depth_tracking(inner, env, depth + 1)?;
                writeln!(self.out, "{value}")
                    .map_err(|e| Error::EvalError(format!("failed to write output: {e}")))?;
                Ok(value)
            }

            Expr::FuncDef(def) => {
                tracing::debug!(function = %def.name, params = ?def.params, "defining function");
                env.define(def.name.clone(), Value::Function(Rc::clone(def)));
                Ok(Value::Str(def.name.clone()))
            }

            Expr::FuncCall { name, args } => self.eval_call(name, args, env, depth),

            Expr::PrimOp { op, args } => self.eval_prim_op(*op, args, env, depth),
        }
    }

    /// Evaluate argument expressions left to right in `env`
    fn eval_args(
        &mut self,
        args: &[Expr],
        env: &mut Environment<'_>,
        depth: usize,
    ) -> Result<Vec<Value>, Error> {
        args.iter()
            .map(|arg| self.eval_with_depth_tracking(arg, env, depth + 1))
            .collect()
    }

    /// Call a user function if `name` is bound, else a named builtin
    fn eval_call(
        &mut self,
        name: &str,
        args: &[Expr],
        env: &mut Environment<'_>,
        depth: usize,
    ) -> Result<Value, Error> {
        let function = match env.get(name) {
            Some(Value::Function(def)) => Some(Rc::clone(def)),
            Some(other) => {
                return Err(Error::TypeMismatch(format!(
                    "\"{name}\" is a {}, not a function",
                    other.type_name()
                )));
            }
            None => None,
        };

        if let Some(def) = function {
            return self.apply(&def, args, env, depth);
        }

        match find_builtin(name) {
            Some(op) => {
                let values = self.eval_args(args, env, depth)?;
                tracing::trace!(builtin = op.name, argc = values.len(), "calling builtin");
                op.call(&values)
            }
            None => Err(Error::SymbolNotFound(name.to_owned())),
        }
    }

    /// Apply a user function
    ///
    /// Arguments are evaluated in the caller's environment. The body runs in a
    /// fresh frame whose parent is that same calling environment, so free
    /// variables in the body resolve against the caller.
    fn apply(
        &mut self,
        def: &FuncDef,
        args: &[Expr],
        env: &mut Environment<'_>,
        depth: usize,
    ) -> Result<Value, Error> {
        Arity::Exact(def.params.len()).validate(&def.name, args.len())?;

        let values = self.eval_args(args, env, depth)?;
        tracing::debug!(function = %def.name, depth, "calling function");

        let mut frame = Environment::with_parent(&*env);
        for (param, value) in def.params.iter().zip(values) {
            frame.define(param.clone(), value);
        }
        self.eval_with_depth_tracking(&def.body, &mut frame, depth + 1)
    }

    fn eval_prim_op(
        &mut self,
        op: Operator,
        args: &[Expr],
        env: &mut Environment<'_>,
        depth: usize,
    ) -> Result<Value, Error> {
        tracing::trace!(%op, argc = args.len(), "primitive operator");

        if op.is_arithmetic() {
            let Some((first, rest)) = args.split_first() else {
                return Err(Error::arity_error(op.symbol(), Arity::AtLeast(1), 0));
            };
            let mut total = self.eval_with_depth_tracking(first, env, depth + 1)?;
            if !matches!(total, Value::Number(_)) {
                return Err(Error::TypeMismatch(format!(
                    "'{op}' expects numbers, got {}",
                    total.type_name()
                )));
            }
            for arg in rest {
                let value = self.eval_with_depth_tracking(arg, env, depth + 1)?;
                total = total.arithmetic(op, &value)?;
            }
            return Ok(total);
        }

        let [lhs, rhs] = args else {
            return Err(Error::arity_error(op.symbol(), Arity::Exact(2), args.len()));
        };
        let lhs = self.eval_with_depth_tracking(lhs, env, depth + 1)?;
        let rhs = self.eval_with_depth_tracking(rhs, env, depth + 1)?;
        let holds = lhs.compare(op, &rhs)?;
        Ok(Value::Number(i64::from(holds)))
    }
}
