use smallvec::SmallVec;

use crate::eval::context::{EvalContext, SharedData};
use crate::eval::diagnostics::Diagnostics;
use crate::eval::mix::Attributes;
use crate::expression::expr::{AttributeSet, Expression};
use crate::expression::opcodes::{OpArgs, OpcodeTable};
use crate::expression::value::Value;
use crate::foundation::error::{ShapeError, ShapeResult};

/// Inputs shared by every program evaluated during one render pass.
#[derive(Clone, Copy)]
pub struct EvalEnv<'a> {
    pub ctx: &'a EvalContext,
    pub shared: &'a SharedData,
    pub opcodes: &'a OpcodeTable,
    pub diagnostics: &'a dyn Diagnostics,
}

/// Evaluate every entry of an attribute set for the current frame.
pub fn evaluate(attrs: &AttributeSet, env: &EvalEnv<'_>) -> ShapeResult<Attributes> {
    let mut out = Attributes::new();
    for (name, expr) in attrs.iter() {
        let v = eval_expression(expr, env).map_err(|e| e.at(format!("attribute '{name}'")))?;
        out.insert(name, v);
    }
    Ok(out)
}

/// Evaluate a single program.
pub fn eval_expression(expr: &Expression, env: &EvalEnv<'_>) -> ShapeResult<Value> {
    match expr {
        Expression::Literal(v) => Ok(v.clone()),
        Expression::Call { op, constants } => {
            let opcode = env
                .opcodes
                .get(op)
                .ok_or_else(|| ShapeError::dsl(format!("unknown opcode '{op}'")))?;
            if opcode.pops > 0 {
                return Err(ShapeError::dsl(format!(
                    "stack underflow: '{op}' pops {} value(s) from an empty stack",
                    opcode.pops
                )));
            }
            if constants.len() < opcode.consumes {
                return Err(constant_underflow(op, opcode.consumes, constants.len()));
            }
            opcode.invoke(&OpArgs {
                popped: &[],
                constants,
                ctx: env.ctx,
                shared: env.shared,
                diagnostics: env.diagnostics,
            })
        }
        Expression::Group {
            lanes,
            ops,
            constants,
        } => run_group(lanes.unwrap_or(1), ops, constants, env),
    }
}

// One value stack is shared by all lanes; constants are consumed globally in declaration
// order, not restarted per lane.
fn run_group(
    lanes: usize,
    ops: &[String],
    constants: &[Value],
    env: &EvalEnv<'_>,
) -> ShapeResult<Value> {
    let mut stack: SmallVec<[Value; 8]> = SmallVec::new();
    let mut remaining = constants;
    let mut outputs: Vec<Value> = Vec::with_capacity(lanes);

    for lane in 0..lanes {
        for name in ops {
            let opcode = env
                .opcodes
                .get(name)
                .ok_or_else(|| ShapeError::dsl(format!("unknown opcode '{name}'")))?;

            if remaining.len() < opcode.consumes {
                return Err(constant_underflow(name, opcode.consumes, remaining.len()));
            }
            let (taken, rest) = remaining.split_at(opcode.consumes);
            remaining = rest;

            if stack.len() < opcode.pops {
                return Err(ShapeError::dsl(format!(
                    "stack underflow: '{name}' pops {} value(s), stack holds {}",
                    opcode.pops,
                    stack.len()
                )));
            }
            let popped: SmallVec<[Value; 4]> =
                (0..opcode.pops).filter_map(|_| stack.pop()).collect();

            let result = opcode.invoke(&OpArgs {
                popped: &popped,
                constants: taken,
                ctx: env.ctx,
                shared: env.shared,
                diagnostics: env.diagnostics,
            })?;

            match result {
                Value::List(mut items) if items.len() == lanes => {
                    stack.push(items.swap_remove(lane));
                }
                other => stack.push(other),
            }
        }

        let top = stack
            .last()
            .cloned()
            .ok_or_else(|| ShapeError::dsl("instruction group left the stack empty"))?;
        outputs.push(top);
    }

    if lanes > 1 {
        Ok(Value::List(outputs))
    } else {
        outputs
            .pop()
            .ok_or_else(|| ShapeError::dsl("instruction group produced no lanes"))
    }
}

fn constant_underflow(op: &str, wanted: usize, left: usize) -> ShapeError {
    ShapeError::dsl(format!(
        "'{op}' consumes {wanted} constant(s), only {left} left"
    ))
}

#[cfg(test)]
#[path = "../../tests/unit/expression/vm.rs"]
mod tests;
