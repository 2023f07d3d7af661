//! Evaluator benchmarks: higher-order builtins over growing arrays, deep
//! recursion and nested path edits.

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use inkling::{Definition, Function, Program, Runtime, Value};
use std::hint::black_box;
use std::sync::Arc;

fn ints(n: i64) -> Value {
    Value::array((0..n).map(Value::Int))
}

/// `xs map (x | x * x) reduce 0 (a b | a + b)`
fn sum_of_squares(n: i64) -> Arc<Function> {
    let square = Function::lambda(
        ["x"],
        Program::builder().lookup("x").lookup("x").apply("*").build(),
    );
    let add = Function::lambda(["a", "b"], Program::builder().lookup("a").lookup("b").apply("+").build());
    let program = Program::builder()
        .literal(ints(n))
        .closure(0)
        .apply("map")
        .literal(Value::Int(0))
        .closure(1)
        .apply("reduce")
        .build();
    Arc::new(Function::program(program).with_definitions(vec![
        Definition::anonymous(square),
        Definition::anonymous(add),
    ]))
}

/// `count n` counting down to zero through `?` / `??`.
fn countdown(n: i64) -> Arc<Function> {
    let recurse = Function::program(
        Program::builder()
            .lookup("n")
            .literal(Value::Int(1))
            .apply("-")
            .apply("count")
            .build(),
    );
    let body = Program::builder()
        .lookup("n")
        .literal(Value::Int(0))
        .apply("==")
        .closure(0)
        .apply("?")
        .closure(1)
        .apply("??")
        .build();
    let count = Function::lambda(["n"], body).with_definitions(vec![
        Definition::anonymous(Function::constant(Value::Int(0))),
        Definition::anonymous(recurse),
    ]);
    let program = Program::builder().literal(Value::Int(n)).apply("count").build();
    Arc::new(Function::program(program).with_definitions(vec![Definition::named("count", count)]))
}

fn bench_higher_order(c: &mut Criterion) {
    let mut group = c.benchmark_group("sum_of_squares");
    let runtime = Runtime::new();
    for n in [10, 100, 1000] {
        let function = sum_of_squares(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &function, |b, function| {
            b.iter(|| black_box(runtime.evaluate(function)));
        });
    }
    group.finish();
}

fn bench_recursion(c: &mut Criterion) {
    let mut group = c.benchmark_group("countdown");
    let runtime = Runtime::new();
    for n in [10, 50, 100] {
        let function = countdown(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &function, |b, function| {
            b.iter(|| black_box(runtime.evaluate(function)));
        });
    }
    group.finish();
}

fn bench_nested_set(c: &mut Criterion) {
    let runtime = Runtime::new();
    let row = ints(100);
    let grid = Value::array((0..100).map(|_| row.clone()));
    let selection = [Value::Int(50), Value::Int(50)]
        .into_iter()
        .fold(grid, |target, component| runtime.call("/.", vec![target, component]));
    c.bench_function("nested_set_100x100", |b| {
        b.iter(|| black_box(runtime.call("<-", vec![selection.clone(), Value::Int(-1)])));
    });
}

criterion_group!(benches, bench_higher_order, bench_recursion, bench_nested_set);
criterion_main!(benches);
