use criterion::{black_box, criterion_group, criterion_main, Criterion};
use openrosa_xpath_core::evaluator::{
    evaluate_expression, evaluate_expression_with_visitor, LoggingVisitor,
};
use openrosa_xpath_core::lexer::tokenize;
use openrosa_xpath_core::parser::parse;
use openrosa_xpath_core::{Argument, Extensions};

const SIMPLE: &str = "pow(2, 10)";
const DATES: &str = "format-date(date-time(decimal-date-time('2003-03-12') + 280), '%b %e, %Y')";
const CONDITIONS: &str =
    "if(selected('a b c', 'b') and date('2015-01-01') < today(), concat('x', round(2.15, 1)), 'y')";

fn bench_lexer(c: &mut Criterion) {
    let mut group = c.benchmark_group("Lexer");

    group.bench_function("simple_expression", |b| {
        b.iter(|| tokenize(black_box(SIMPLE)).unwrap())
    });

    group.bench_function("date_expression", |b| {
        b.iter(|| tokenize(black_box(DATES)).unwrap())
    });

    group.finish();
}

fn bench_parser(c: &mut Criterion) {
    let mut group = c.benchmark_group("Parser");

    group.bench_function("date_expression", |b| {
        let tokens = tokenize(DATES).unwrap();
        b.iter(|| parse(black_box(&tokens)).unwrap())
    });

    group.bench_function("conditional_expression", |b| {
        let tokens = tokenize(CONDITIONS).unwrap();
        b.iter(|| parse(black_box(&tokens)).unwrap())
    });

    group.finish();
}

fn bench_evaluator(c: &mut Criterion) {
    let mut group = c.benchmark_group("Evaluator");
    let engine = Extensions::new();

    group.bench_function("simple_expression", |b| {
        b.iter(|| evaluate_expression(black_box(SIMPLE), &engine).unwrap())
    });

    group.bench_function("date_expression", |b| {
        b.iter(|| evaluate_expression(black_box(DATES), &engine).unwrap())
    });

    group.bench_function("conditional_expression", |b| {
        b.iter(|| evaluate_expression(black_box(CONDITIONS), &engine).unwrap())
    });

    group.bench_function("date_expression_with_logging_visitor", |b| {
        let visitor = LoggingVisitor::new();
        b.iter(|| evaluate_expression_with_visitor(black_box(DATES), &engine, &visitor).unwrap())
    });

    group.finish();
}

fn bench_functions(c: &mut Criterion) {
    let mut group = c.benchmark_group("Functions");
    let engine = Extensions::new();

    group.bench_function("regex", |b| {
        let args = [Argument::from("abc123"), Argument::from("[0-9]+$")];
        b.iter(|| engine.call("regex", black_box(&args)).unwrap())
    });

    group.bench_function("uuid", |b| b.iter(|| engine.call("uuid", &[]).unwrap()));

    group.finish();
}

criterion_group!(
    benches,
    bench_lexer,
    bench_parser,
    bench_evaluator,
    bench_functions
);
criterion_main!(benches);
