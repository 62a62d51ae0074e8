use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use engine::{ColumnSpec, EngineConfig, FilterCriteria, RawCell, Table};

const LABELS: [&str; 5] = ["alpha", "beta", "gamma", "delta", "epsilon"];

fn build_table(rows: usize) -> Table {
    let specs = vec![
        ColumnSpec::typed("number").with_formula("ROUND({{ avg }}, 2)"),
        ColumnSpec::typed("string"),
        ColumnSpec::typed("date"),
    ];
    let raw: Vec<Vec<RawCell>> = (0..rows)
        .map(|i| {
            vec![
                RawCell::new((i * 7919 % 10_007) as f64),
                RawCell::new(LABELS[i % LABELS.len()]),
                RawCell::new((i as i64) * 86_400_000),
            ]
        })
        .collect();
    Table::new(&EngineConfig::default(), &specs, &raw).unwrap()
}

fn bench_sort(c: &mut Criterion) {
    let mut group = c.benchmark_group("order_rows");
    for rows in [10_000usize, 100_000] {
        let table = build_table(rows);
        group.throughput(Throughput::Elements(rows as u64));
        group.bench_with_input(BenchmarkId::new("number_desc", rows), &rows, |b, _| {
            b.iter(|| {
                let mut t = table.clone();
                black_box(t.order_rows("1", "desc"));
            })
        });
        group.bench_with_input(BenchmarkId::new("string_asc", rows), &rows, |b, _| {
            b.iter(|| {
                let mut t = table.clone();
                black_box(t.order_rows("2", "asc"));
            })
        });
    }
    group.finish();
}

fn bench_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("filter_rows");
    let rows = 100_000usize;
    let mut table = build_table(rows);
    table.order_rows("1", "asc");
    let criteria = FilterCriteria::new().with("2", "*ta");

    group.throughput(Throughput::Elements(rows as u64));
    group.bench_function("wildcard_then_resort", |b| {
        b.iter(|| {
            table.filter_rows(black_box(&criteria)).unwrap();
            black_box(table.order().len())
        })
    });
    group.finish();
}

fn bench_page(c: &mut Criterion) {
    let table = build_table(100_000);
    c.bench_function("select_rows/page_of_50", |b| {
        b.iter(|| black_box(table.select_rows(Some(black_box(50_000)), Some(50))))
    });
    c.bench_function("count_cols", |b| b.iter(|| black_box(table.count_cols())));
}

criterion_group!(benches, bench_sort, bench_filter, bench_page);
criterion_main!(benches);
