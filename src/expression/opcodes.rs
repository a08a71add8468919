use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::eval::context::{EvalContext, SharedData};
use crate::eval::diagnostics::Diagnostics;
use crate::expression::value::Value;
use crate::foundation::error::{ShapeError, ShapeResult};

/// Everything an opcode may read.
///
/// `popped` is ordered top-of-stack first.
pub struct OpArgs<'a> {
    pub popped: &'a [Value],
    pub constants: &'a [Value],
    pub ctx: &'a EvalContext,
    pub shared: &'a SharedData,
    pub diagnostics: &'a dyn Diagnostics,
}

impl OpArgs<'_> {
    fn popped(&self, i: usize) -> ShapeResult<&Value> {
        self.popped
            .get(i)
            .ok_or_else(|| ShapeError::dsl("stack underflow"))
    }

    fn constant(&self, i: usize) -> ShapeResult<&Value> {
        self.constants
            .get(i)
            .ok_or_else(|| ShapeError::dsl(format!("missing constant #{i}")))
    }

    fn number(&self, i: usize) -> ShapeResult<f64> {
        self.constant(i)?.as_f64()
    }
}

type OpFn = dyn Fn(&OpArgs<'_>) -> ShapeResult<Value> + Send + Sync;

/// A named instruction: how many stack values it pops, how many constants it consumes, and
/// its evaluation function.
#[derive(Clone)]
pub struct Opcode {
    pub pops: usize,
    pub consumes: usize,
    func: Arc<OpFn>,
}

impl Opcode {
    pub fn new(
        pops: usize,
        consumes: usize,
        func: impl Fn(&OpArgs<'_>) -> ShapeResult<Value> + Send + Sync + 'static,
    ) -> Self {
        Self {
            pops,
            consumes,
            func: Arc::new(func),
        }
    }

    pub fn invoke(&self, args: &OpArgs<'_>) -> ShapeResult<Value> {
        (self.func)(args)
    }
}

impl fmt::Debug for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Opcode")
            .field("pops", &self.pops)
            .field("consumes", &self.consumes)
            .finish_non_exhaustive()
    }
}

/// Name → opcode. Assembled once at load time and passed down the render call chain.
#[derive(Clone, Debug)]
pub struct OpcodeTable {
    ops: BTreeMap<String, Opcode>,
}

impl Default for OpcodeTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl OpcodeTable {
    pub fn empty() -> Self {
        Self {
            ops: BTreeMap::new(),
        }
    }

    /// The built-in instruction set.
    pub fn builtin() -> Self {
        let mut t = Self::empty();

        t.insert("const", Opcode::new(0, 1, |a| a.constant(0).cloned()));
        t.insert(
            "add",
            Opcode::new(1, 1, |a| a.constant(0)?.add(a.popped(0)?)),
        );
        t.insert(
            "multiply",
            Opcode::new(1, 1, |a| a.constant(0)?.mul(a.popped(0)?)),
        );
        t.insert(
            "frame",
            Opcode::new(0, 0, |a| Ok(Value::Number(a.ctx.frame as f64))),
        );
        t.insert(
            "sine",
            Opcode::new(1, 0, |a| a.popped(0)?.map_numeric("sine", f64::sin)),
        );
        t.insert(
            "cosine",
            Opcode::new(1, 0, |a| a.popped(0)?.map_numeric("cosine", f64::cos)),
        );
        t.insert(
            "abs",
            Opcode::new(1, 0, |a| a.popped(0)?.map_numeric("abs", f64::abs)),
        );
        t.insert(
            "floor",
            Opcode::new(1, 1, |a| {
                let step = a.number(0)?;
                if step == 0.0 {
                    return Err(ShapeError::dsl("floor step must be non-zero"));
                }
                a.popped(0)?
                    .map_numeric("floor", move |v| step * (v / step).floor())
            }),
        );
        t.insert(
            "fsine",
            Opcode::new(0, 2, |a| {
                let freq = a.number(0)?;
                let amp = a.number(1)?;
                Ok(Value::Number(amp * (freq * a.ctx.frame as f64).sin()))
            }),
        );
        t.insert("aspect", Opcode::new(0, 0, |a| Ok(Value::Number(a.ctx.aspect))));
        t.insert(
            "inv_aspect",
            Opcode::new(0, 0, |a| Ok(Value::Number(1.0 / a.ctx.aspect))),
        );
        t.insert(
            "lookup",
            Opcode::new(0, 3, |a| {
                let table = a.constant(0)?.as_key()?;
                let key = a.constant(1)?.as_key()?;
                match a.shared.lookup(&table, &key) {
                    Some(v) => Ok(v.clone()),
                    None => a.constant(2).cloned(),
                }
            }),
        );
        t.insert("const_group", Opcode::new(1, 3, const_group));
        t.insert(
            "print",
            Opcode::new(1, 0, |a| {
                let v = a.popped(0)?;
                a.diagnostics.print(v);
                Ok(v.clone())
            }),
        );
        t.insert(
            "pointer_x",
            Opcode::new(0, 0, |a| {
                Ok(Value::Number(a.ctx.pointer.map_or(0.0, |p| p.x)))
            }),
        );
        t.insert(
            "pointer_y",
            Opcode::new(0, 0, |a| {
                Ok(Value::Number(a.ctx.pointer.map_or(0.0, |p| p.y)))
            }),
        );
        t.insert(
            "pointer_press",
            Opcode::new(0, 0, |a| {
                Ok(Value::Bool(a.ctx.pointer.is_some_and(|p| p.pressed[0])))
            }),
        );
        t.insert(
            "screen_x",
            Opcode::new(0, 0, |a| Ok(Value::Number(f64::from(a.ctx.viewport.width)))),
        );
        t.insert(
            "screen_y",
            Opcode::new(0, 0, |a| {
                Ok(Value::Number(f64::from(a.ctx.viewport.height)))
            }),
        );

        t
    }

    /// Insert or replace an opcode, returning the previous definition.
    pub fn insert(&mut self, name: impl Into<String>, op: Opcode) -> Option<Opcode> {
        self.ops.insert(name.into(), op)
    }

    /// Register `alias` as another name for the existing opcode `target`.
    pub fn alias(&mut self, alias: impl Into<String>, target: &str) -> ShapeResult<()> {
        let op = self
            .ops
            .get(target)
            .cloned()
            .ok_or_else(|| ShapeError::document(format!("unknown opcode '{target}' in alias")))?;
        self.ops.insert(alias.into(), op);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Opcode> {
        self.ops.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.ops.keys().map(String::as_str)
    }
}

// Given parallel `values` / ascending `thresholds` lists, pick the value paired with the
// greatest threshold <= driver, else the default.
fn const_group(a: &OpArgs<'_>) -> ShapeResult<Value> {
    let driver = a.popped(0)?.as_f64()?;
    let values = a.constant(0)?.as_list()?;
    let thresholds = a.constant(1)?.as_list()?;
    if values.len() != thresholds.len() {
        return Err(ShapeError::dsl(format!(
            "const_group: {} values for {} thresholds",
            values.len(),
            thresholds.len()
        )));
    }

    let mut picked = None;
    for (value, threshold) in values.iter().zip(thresholds) {
        if threshold.as_f64()? > driver {
            break;
        }
        picked = Some(value);
    }
    match picked {
        Some(v) => Ok(v.clone()),
        None => a.constant(2).cloned(),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/expression/opcodes.rs"]
mod tests;
