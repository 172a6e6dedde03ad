use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use sqlmason::{ColumnSpec, DataType, Dialect, Op, Schema, Table, Value};

/// A schema with one wide table of `n` int columns.
fn wide_schema(n: usize) -> Schema {
    let mut schema = Schema::new(Dialect::MySql);
    let mut table = Table::new(Dialect::MySql, "t").unwrap();
    table
        .add_column("id", ColumnSpec::new(DataType::Int).primary())
        .unwrap();
    for i in 0..n {
        table
            .add_column(format!("col-{i}"), ColumnSpec::new(DataType::Int))
            .unwrap();
    }
    schema.add_table(table).unwrap();
    schema
}

fn bench_where_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("query_builder/where_chain");

    for n in [1, 5, 10, 50] {
        let schema = wide_schema(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &schema, |b, schema| {
            b.iter(|| {
                let mut qb = schema.query();
                qb.table("t").unwrap().select_all().unwrap();
                for i in 0..n {
                    qb.where_(&format!("col-{i}"), Op::Eq, i as i64).unwrap();
                }
                black_box(qb.sql().len());
            });
        });
    }

    group.finish();
}

fn bench_rerender(c: &mut Criterion) {
    let mut group = c.benchmark_group("query_builder/rerender");

    for n in [5, 20, 100] {
        let schema = wide_schema(n);
        let mut qb = schema.query();
        qb.table("t").unwrap().select_all().unwrap();
        for i in 0..n {
            qb.where_(&format!("col-{i}"), Op::Eq, i as i64).unwrap();
        }
        group.bench_with_input(BenchmarkId::from_parameter(n), &qb, |b, qb| {
            b.iter(|| black_box(qb.inline_sql()));
        });
    }

    group.finish();
}

fn bench_insert_rows(c: &mut Criterion) {
    let mut group = c.benchmark_group("query_builder/insert_rows");

    let schema = wide_schema(4);
    let cols: Vec<String> = (0..4).map(|i| format!("col-{i}")).collect();
    let col_refs: Vec<&str> = cols.iter().map(String::as_str).collect();
    for rows in [1, 10, 100] {
        let data: Vec<Vec<Value>> = (0..rows)
            .map(|r| (0..4).map(|i| Value::Int((r * 4 + i) as i64)).collect())
            .collect();
        group.bench_with_input(BenchmarkId::from_parameter(rows), &data, |b, data| {
            b.iter(|| {
                let mut qb = schema.query();
                qb.table("t")
                    .unwrap()
                    .insert_rows(&col_refs, data.clone())
                    .unwrap();
                black_box(qb.sql().len());
            });
        });
    }

    group.finish();
}

fn bench_join_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("query_builder/join_render");

    let mut schema = Schema::new(Dialect::MySql);
    let mut left = Table::new(Dialect::MySql, "orders").unwrap();
    left.add_columns([
        ("id", ColumnSpec::new(DataType::Int).primary()),
        ("user-id", ColumnSpec::new(DataType::Int)),
    ])
    .unwrap();
    schema.add_table(left).unwrap();
    let mut right = Table::new(Dialect::MySql, "users").unwrap();
    right
        .add_column("id", ColumnSpec::new(DataType::Int).primary())
        .unwrap();
    schema.add_table(right).unwrap();

    group.bench_function(BenchmarkId::from_parameter("inner"), |b| {
        b.iter(|| {
            let mut qb = schema.query();
            qb.table("orders")
                .unwrap()
                .select_all()
                .unwrap()
                .inner_join("users")
                .unwrap()
                .on("user-id", "id")
                .unwrap()
                .where_("id", Op::Gt, 100)
                .unwrap();
            black_box(qb.sql().len());
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_where_chain,
    bench_rerender,
    bench_insert_rows,
    bench_join_render
);
criterion_main!(benches);
