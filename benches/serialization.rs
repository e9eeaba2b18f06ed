use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use odata_json::{
    entry_to_string, error_to_string, feed_to_string, to_value, AssociationLink, Dialect, Entry,
    Feed, InnerError, InstanceAnnotation, JsonWriter, ODataError, Operation, WriterOptions,
};
use serde::Serialize;
use url::Url;

#[derive(Serialize, Clone)]
struct Address {
    street: String,
    city: String,
    zip: u32,
}

fn verbose_options() -> WriterOptions {
    WriterOptions::new()
        .with_dialect(Dialect::Verbose)
        .with_base_uri(Url::parse("http://host/svc/").unwrap())
}

fn product(id: u32) -> Entry {
    let mut entry = Entry::new("NS.Product")
        .with_edit_link(format!("Products({})", id))
        .with_etag(format!("W/\"{}\"", id))
        .with_property("ID", i64::from(id))
        .with_property("Name", format!("Product {}", id))
        .with_property("Price", 9.99 + f64::from(id));
    entry.metadata.actions = vec![Operation::new("#NS.Discount", format!("Products({})/Discount", id))];
    entry.metadata.association_links = vec![AssociationLink::new(
        "Supplier",
        format!("Products({})/$links/Supplier", id),
    )];
    entry
}

fn benchmark_structural_writer(c: &mut Criterion) {
    let options = WriterOptions::new();

    c.bench_function("write_flat_object", |b| {
        b.iter(|| {
            let mut out = Vec::with_capacity(256);
            let mut writer = JsonWriter::new(&mut out, &options);
            writer.start_object().unwrap();
            for i in 0..16 {
                writer.write_name("member").unwrap();
                writer.write_i32(black_box(i)).unwrap();
            }
            writer.end_object().unwrap();
            drop(writer);
            out
        })
    });
}

fn benchmark_floats(c: &mut Criterion) {
    let mut group = c.benchmark_group("floats");
    let floats: Vec<f64> = (0..100).map(|i| i as f64 * 1.5).collect();

    for (label, force) in [("forced_marker", true), ("plain", false)] {
        let options = WriterOptions::new().with_decimal_marker(force);
        group.bench_function(label, |b| {
            b.iter(|| {
                let mut out = Vec::with_capacity(1024);
                let mut writer = JsonWriter::new(&mut out, &options);
                writer.start_array().unwrap();
                for f in &floats {
                    writer.write_f64(black_box(*f)).unwrap();
                }
                writer.end_array().unwrap();
                drop(writer);
                out
            })
        });
    }
    group.finish();
}

fn benchmark_entry(c: &mut Criterion) {
    let options = verbose_options();
    let entry = product(1);

    c.bench_function("verbose_entry", |b| {
        b.iter(|| entry_to_string(black_box(&entry), &options))
    });
}

fn benchmark_feed(c: &mut Criterion) {
    let mut group = c.benchmark_group("verbose_feed");
    let options = verbose_options();

    for size in [10, 100, 500].iter() {
        let feed = Feed::new((0..*size).map(product).collect()).with_count(i64::from(*size));

        group.bench_with_input(BenchmarkId::from_parameter(size), &feed, |b, feed| {
            b.iter(|| feed_to_string(black_box(feed), &options))
        });
    }
    group.finish();
}

fn benchmark_error(c: &mut Criterion) {
    let mut group = c.benchmark_group("error");
    let address = Address {
        street: "1 Main St".to_string(),
        city: "Redmond".to_string(),
        zip: 98052,
    };
    let annotation = InstanceAnnotation::new("NS.address", to_value(&address).unwrap()).unwrap();

    let mut inner = InnerError::new("root cause").with_stack_trace("at frame 0");
    for depth in 1..20 {
        inner = InnerError::new(format!("wrapped {}", depth)).caused_by(inner);
    }
    let error = ODataError::new("E500", "internal error")
        .with_inner_error(inner)
        .with_annotation(annotation);

    let light = WriterOptions::new().with_debug_information(true);
    let verbose = WriterOptions::new()
        .with_dialect(Dialect::Verbose)
        .with_debug_information(true);

    group.bench_function("light_with_annotations", |b| {
        b.iter(|| error_to_string(black_box(&error), &light))
    });
    group.bench_function("verbose", |b| {
        b.iter(|| error_to_string(black_box(&error), &verbose))
    });
    group.finish();
}

fn benchmark_comparison_with_json(c: &mut Criterion) {
    let address = Address {
        street: "1 Main St".to_string(),
        city: "Redmond".to_string(),
        zip: 98052,
    };
    let value = to_value(&address).unwrap();
    let entry = Entry::new("NS.Customer")
        .with_edit_link("Customers(1)")
        .with_property("Address", value);
    let options = verbose_options();

    let mut group = c.benchmark_group("comparison");

    group.bench_function("odata_entry", |b| {
        b.iter(|| entry_to_string(black_box(&entry), &options))
    });

    group.bench_function("json_struct", |b| {
        b.iter(|| serde_json::to_string(black_box(&address)))
    });

    group.finish();
}

criterion_group!(
    benches,
    benchmark_structural_writer,
    benchmark_floats,
    benchmark_entry,
    benchmark_feed,
    benchmark_error,
    benchmark_comparison_with_json
);
criterion_main!(benches);
