//! RPN function bodies.

use crate::key::Key;
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Index into the enclosing function's nested definitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FnId(pub u32);

#[derive(Debug, Clone)]
pub enum Instruction {
    Literal(Value),
    /// Push a nested definition as a closure over the current frame
    Closure(FnId),
    /// Read a binding; a zero-argument definition is evaluated
    Lookup(Key),
    /// Resolve a name and call it with operands from the stack
    Apply(Key),
}

/// Names whose application consumes an Error instead of ending the run.
const RECOVERY: [&str; 2] = ["??", "???"];

#[derive(Debug, Clone, Default)]
pub struct Program {
    instructions: Arc<[Instruction]>,
    /// Position of the last error-recovering application
    last_recovery: Option<usize>,
}

impl Program {
    pub fn new(instructions: Vec<Instruction>) -> Self {
        let last_recovery = instructions.iter().rposition(|instruction| {
            matches!(instruction, Instruction::Apply(name) if RECOVERY.contains(&name.as_str()))
        });
        Self {
            instructions: instructions.into(),
            last_recovery,
        }
    }

    pub fn builder() -> ProgramBuilder {
        ProgramBuilder::default()
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Whether an Error produced at `pc` may still be recovered later.
    pub fn recovers_after(&self, pc: usize) -> bool {
        self.last_recovery.is_some_and(|at| at > pc)
    }
}

#[derive(Debug, Default)]
pub struct ProgramBuilder {
    instructions: Vec<Instruction>,
}

impl ProgramBuilder {
    pub fn literal(mut self, value: Value) -> Self {
        self.instructions.push(Instruction::Literal(value));
        self
    }

    /// Keyword marker for the next operand.
    pub fn label(self, keyword: &str) -> Self {
        self.literal(Value::label(keyword))
    }

    pub fn closure(mut self, id: u32) -> Self {
        self.instructions.push(Instruction::Closure(FnId(id)));
        self
    }

    pub fn lookup(mut self, name: &str) -> Self {
        self.instructions.push(Instruction::Lookup(Key::new(name)));
        self
    }

    pub fn apply(mut self, name: &str) -> Self {
        self.instructions.push(Instruction::Apply(Key::new(name)));
        self
    }

    pub fn push(mut self, instruction: Instruction) -> Self {
        self.instructions.push(instruction);
        self
    }

    pub fn build(self) -> Program {
        Program::new(self.instructions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recovery_point_is_the_last_coalescing_apply() {
        let program = Program::builder()
            .lookup("x")
            .literal(Value::Int(1))
            .apply("/")
            .literal(Value::Int(0))
            .apply("???")
            .literal(Value::Int(2))
            .apply("+")
            .build();
        assert!(program.recovers_after(2));
        assert!(!program.recovers_after(4));
        assert!(!program.recovers_after(6));
        assert!(!Program::builder().literal(Value::Int(1)).build().recovers_after(0));
    }
}
