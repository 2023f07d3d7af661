//! RPN evaluation.
//!
//! An application goes through three steps. Binding matches the stack
//! operands to the declared arguments, checking keywords and constraints.
//! Evaluation then runs either the primitive table entry or the RPN body
//! in a fresh frame. The result, or the first Error, is returned.

use crate::builtin;
use crate::catalog::Catalog;
use crate::config::Limits;
use crate::error::Fault;
use crate::function::{Body, Closure, Function, Scope};
use crate::key::Key;
use crate::program::{Instruction, Program};
use crate::value::Value;
use smallvec::SmallVec;
use std::sync::Arc;

/// What a name resolves to in a frame.
enum Resolved {
    Value(Value),
    Definition(Closure),
}

pub struct Interpreter<'a> {
    catalog: &'a Catalog,
    limits: Limits,
    depth: usize,
}

impl<'a> Interpreter<'a> {
    pub fn new(catalog: &'a Catalog, limits: Limits) -> Self {
        Self {
            catalog,
            limits,
            depth: 0,
        }
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    pub fn catalog(&self) -> &Catalog {
        self.catalog
    }

    /// Run a zero-argument function.
    pub fn evaluate(&mut self, function: &Arc<Function>) -> Value {
        self.call(&Closure::new(function.clone()), Vec::new())
    }

    /// Call a zero-argument closure, or return any other value as is.
    pub fn force(&mut self, value: &Value) -> Value {
        match value {
            Value::Function(closure) if closure.is_thunk() => self.call(closure, Vec::new()),
            other => other.clone(),
        }
    }

    /// Apply `callee` to stack operands given left-then-right, with a
    /// label before each keyword argument.
    pub fn call(&mut self, callee: &Closure, operands: Vec<Value>) -> Value {
        let function = &callee.function;
        if !function.observes_errors() {
            if let Some(error) = operands.iter().find(|v| v.is_error()) {
                return error.clone();
            }
        }
        if self.depth >= self.limits.max_call_depth {
            return Fault::limit(format!(
                "call depth exceeded {} in {}",
                self.limits.max_call_depth,
                function.display_name()
            ))
            .into();
        }
        let bindings = match bind(function, operands) {
            Ok(bindings) => bindings,
            Err(fault) => return fault.into(),
        };
        self.depth += 1;
        log::debug!("call {} at depth {}", function.display_name(), self.depth);
        let result = match &function.body {
            Body::Primitive(op) => {
                let arguments = bindings.into_iter().map(|(_, value)| value).collect();
                builtin::apply(*op, arguments, self)
            }
            Body::Program(program) if program.is_empty() => {
                function.literal.clone().unwrap_or_else(Value::nil)
            }
            Body::Program(program) => {
                let frame = Arc::new(Scope {
                    bindings,
                    definitions: function.definitions.clone(),
                    parent: callee.scope.clone(),
                });
                self.run(program, &frame)
            }
        };
        self.depth -= 1;
        result
    }

    fn run(&mut self, program: &Program, frame: &Arc<Scope>) -> Value {
        let mut stack: SmallVec<[Value; 8]> = SmallVec::new();
        for (pc, instruction) in program.instructions().iter().enumerate() {
            log::trace!("{pc}: {instruction:?} with {} operands", stack.len());
            let produced = match instruction {
                Instruction::Literal(value) => value.clone(),
                Instruction::Closure(id) => match frame.definitions.get(id.0 as usize) {
                    Some(definition) => Value::Function(Arc::new(Closure::captured(
                        definition.function.clone(),
                        frame.clone(),
                    ))),
                    None => Fault::undefined(&format!("definition #{}", id.0), &[]).into(),
                },
                Instruction::Lookup(name) => self.lookup(name, frame),
                Instruction::Apply(name) => match self.callable(name, frame) {
                    Ok(callee) => {
                        let count = callee.function.slot_count();
                        if stack.len() < count {
                            return Fault::shape(format!(
                                "{name} needs {count} operands, found {}",
                                stack.len()
                            ))
                            .into();
                        }
                        let operands = stack.drain(stack.len() - count..).collect();
                        self.call(&callee, operands)
                    }
                    Err(fault) => fault.into(),
                },
            };
            if produced.is_error() && !program.recovers_after(pc) {
                return produced;
            }
            stack.push(produced);
        }
        match stack.as_slice() {
            [result] => result.clone(),
            [] => Fault::shape("program produced no value").into(),
            rest => Fault::shape(format!("program left {} values on the stack", rest.len())).into(),
        }
    }

    /// Innermost binding or definition named `name`.
    fn resolve(&self, name: &Key, frame: &Arc<Scope>) -> Option<Resolved> {
        let mut scope = Some(frame.clone());
        while let Some(current) = scope {
            if let Some((_, value)) = current.bindings.iter().rev().find(|(key, _)| key == name) {
                return Some(Resolved::Value(value.clone()));
            }
            if let Some(definition) = current
                .definitions
                .iter()
                .find(|d| d.name.as_ref() == Some(name))
            {
                return Some(Resolved::Definition(Closure::captured(
                    definition.function.clone(),
                    current.clone(),
                )));
            }
            scope = current.parent.clone();
        }
        None
    }

    fn lookup(&mut self, name: &Key, frame: &Arc<Scope>) -> Value {
        match self.resolve(name, frame) {
            Some(Resolved::Value(value)) => value,
            Some(Resolved::Definition(closure)) if closure.is_thunk() => {
                self.call(&closure, Vec::new())
            }
            Some(Resolved::Definition(closure)) => Value::Function(Arc::new(closure)),
            None => match self.catalog.get(name) {
                Some(function) => Value::Function(Arc::new(Closure::new(function.clone()))),
                None => Fault::undefined(name.as_str(), &[]).into(),
            },
        }
    }

    /// Closure applied by `Instruction::Apply`. A bound non-function value
    /// applies as a constant.
    fn callable(&self, name: &Key, frame: &Arc<Scope>) -> Result<Closure, Fault> {
        match self.resolve(name, frame) {
            Some(Resolved::Value(Value::Function(closure))) => Ok((*closure).clone()),
            Some(Resolved::Value(value)) => Ok(Closure::thunk(value)),
            Some(Resolved::Definition(closure)) => Ok(closure),
            None => self
                .catalog
                .get(name)
                .map(|function| Closure::new(function.clone()))
                .ok_or_else(|| Fault::undefined(name.as_str(), &[])),
        }
    }
}

/// Match operands to arguments. Short-circuit functions receive their
/// right operands wrapped as thunks.
fn bind(function: &Function, operands: Vec<Value>) -> Result<SmallVec<[(Key, Value); 4]>, Fault> {
    let mut operands = operands.into_iter();
    let mut bound = SmallVec::new();
    let left_count = function.left.len();
    for (index, argument) in function.arguments().enumerate() {
        if let Some(keyword) = &argument.keyword {
            match operands.next() {
                Some(Value::Label(label)) if &label == keyword => {}
                Some(Value::Label(label)) => {
                    return Err(Fault::undefined(
                        function.display_name(),
                        &[format!("keyword {label}: where {keyword}: was expected").as_str()],
                    ));
                }
                _ => {
                    return Err(Fault::undefined(
                        function.display_name(),
                        &[format!("a call without keyword {keyword}:").as_str()],
                    ));
                }
            }
        }
        let value = match operands.next() {
            Some(Value::Label(label)) => {
                return Err(Fault::undefined(
                    function.display_name(),
                    &[format!("unexpected keyword {label}:").as_str()],
                ));
            }
            Some(value) => value,
            None => {
                return Err(Fault::shape(format!(
                    "{} is missing argument {}",
                    function.display_name(),
                    argument.name
                )));
            }
        };
        if let Some(constraint) = &argument.constraint {
            if !constraint.satisfied_by(&value) {
                return Err(Fault::undefined(
                    function.display_name(),
                    &[format!("argument {} of type {}", argument.name, value.type_name()).as_str()],
                ));
            }
        }
        let value = match value {
            Value::Function(_) => value,
            value if function.short_circuit && index >= left_count => {
                Value::Function(Arc::new(Closure::thunk(value)))
            }
            value => value,
        };
        bound.push((argument.name.clone(), value));
    }
    if operands.next().is_some() {
        return Err(Fault::shape(format!(
            "too many operands for {}",
            function.display_name()
        )));
    }
    Ok(bound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::function::{Argument, Definition};
    use crate::types::{TypeConstraint, TypeTag};

    fn run(function: Function) -> Value {
        let catalog = Catalog::standard();
        Interpreter::new(&catalog, Limits::default()).evaluate(&Arc::new(function))
    }

    #[test]
    fn arithmetic_program() {
        let program = Program::builder()
            .literal(Value::Int(2))
            .literal(Value::Int(3))
            .literal(Value::Int(4))
            .apply("*")
            .apply("+")
            .build();
        assert_eq!(run(Function::program(program)), Value::Int(14));
    }

    #[test]
    fn keyword_arguments_need_their_label() {
        let shift = Function::program(
            Program::builder().lookup("x").lookup("amount").apply("+").build(),
        )
        .with_right(vec![
            Argument::new("x"),
            Argument::new("amount").with_keyword("by"),
        ]);
        let with_label = Program::builder()
            .literal(Value::Int(1))
            .label("by")
            .literal(Value::Int(5))
            .apply("shift")
            .build();
        let definitions = vec![Definition::named("shift", shift)];
        let main = Function::program(with_label).with_definitions(definitions.clone());
        assert_eq!(run(main), Value::Int(6));

        let missing = Program::builder()
            .literal(Value::Int(1))
            .literal(Value::Int(2))
            .literal(Value::Int(5))
            .apply("shift")
            .build();
        let result = run(Function::program(missing).with_definitions(definitions));
        assert_eq!(result.as_error().map(|f| f.kind), Some(ErrorKind::UndefinedOperator));
    }

    #[test]
    fn constraints_are_checked_when_binding() {
        let double = Function::program(Program::builder().lookup("x").lookup("x").apply("+").build())
            .with_right(vec![Argument::new("x").with_constraint(TypeConstraint::Tag(TypeTag::Number))]);
        let call = |operand: Value| {
            Function::program(Program::builder().literal(operand).apply("twice").build())
                .with_definitions(vec![Definition::named("twice", double.clone())])
        };
        assert_eq!(run(call(Value::Int(4))), Value::Int(8));
        assert!(run(call(Value::string("4"))).is_error());
    }

    #[test]
    fn recursion_hits_the_depth_limit() {
        let forever = Function::program(Program::builder().apply("forever").build());
        let main = Function::program(Program::builder().apply("forever").build())
            .with_definitions(vec![Definition::named("forever", forever)]);
        let result = run(main);
        assert_eq!(result.as_error().map(|f| f.kind), Some(ErrorKind::Limit));
    }

    #[test]
    fn stack_underflow_is_a_shape_error() {
        let program = Program::builder().literal(Value::Int(1)).apply("+").build();
        let result = run(Function::program(program));
        assert_eq!(result.as_error().map(|f| f.kind), Some(ErrorKind::Shape));
    }

    #[test]
    fn leftover_operands_are_a_shape_error() {
        let program = Program::builder().literal(Value::Int(1)).literal(Value::Int(2)).build();
        let result = run(Function::program(program));
        let fault = result.as_error().cloned().unwrap();
        assert_eq!(fault.kind, ErrorKind::Shape);
        assert!(fault.message.contains("left 2 values"), "{}", fault.message);
    }

    #[test]
    fn errors_stop_the_run_unless_recovered() {
        let failing = Program::builder()
            .literal(Value::Int(0))
            .literal(Value::Int(0))
            .apply("/")
            .literal(Value::Int(1))
            .apply("+")
            .build();
        let result = run(Function::program(failing));
        assert_eq!(result.as_error().map(|f| f.kind), Some(ErrorKind::Domain));

        let recovered = Program::builder()
            .literal(Value::Int(0))
            .literal(Value::Int(0))
            .apply("/")
            .literal(Value::Int(7))
            .apply("???")
            .build();
        assert_eq!(run(Function::program(recovered)), Value::Int(7));
    }
}
