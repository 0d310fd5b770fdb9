use batch_update::{CollectionUpdater, Descriptor, ElementApplier, ElementHandle, Value};
use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use dom::{Document, ElementRef};

const SMALL_LIST: usize = 64;
const LARGE_LIST: usize = 10_000;

fn make_list(items: usize) -> Document {
    let doc = Document::new();
    let ul = doc.create_element("ul");
    doc.body().append(&ul).unwrap();
    for i in 0..items {
        let mut li = doc.create_element("li");
        li.add_class("row").unwrap();
        li.append_text(&format!("row {i}"));
        ul.append(&li).unwrap();
    }
    doc
}

fn bulk_descriptor() -> Descriptor {
    Descriptor::new()
        .with(
            "style",
            Descriptor::new()
                .with("backgroundColor", "white")
                .with("paddingLeft", "4px"),
        )
        .with("classList", Descriptor::new().with("toggle", "striped"))
        .with("dataset", Descriptor::new().with("rowState", "ready"))
        .with("title", "row")
}

fn indexed_descriptor(items: usize) -> Descriptor {
    let mut d = Descriptor::new();
    for i in (0..items).step_by(8) {
        d.set(
            i.to_string(),
            Descriptor::new().with("textContent", Value::from(i as f64)),
        );
    }
    d.set("-1", Descriptor::new().with("hidden", true));
    d
}

fn bench_single_element(c: &mut Criterion) {
    let descriptor = bulk_descriptor();
    let applier = ElementApplier::new();
    c.bench_function("bench_single_element", |b| {
        b.iter_batched(
            || Document::new().create_element("div"),
            |mut el: ElementRef| {
                applier.apply(&mut el, black_box(&descriptor));
                black_box(el);
            },
            BatchSize::SmallInput,
        );
    });
}

fn bench_bulk_small(c: &mut Criterion) {
    let doc = make_list(SMALL_LIST);
    let descriptor = bulk_descriptor();
    let updater = CollectionUpdater::new();
    c.bench_function("bench_bulk_small", |b| {
        b.iter(|| {
            let result = updater.update(&doc.by_class("row"), black_box(&descriptor));
            black_box(result.stats);
        });
    });
}

fn bench_bulk_large(c: &mut Criterion) {
    let doc = make_list(LARGE_LIST);
    let descriptor = bulk_descriptor();
    let updater = CollectionUpdater::new();
    c.bench_function("bench_bulk_large", |b| {
        b.iter(|| {
            let result = updater.update(&doc.by_class("row"), black_box(&descriptor));
            black_box(result.stats);
        });
    });
}

fn bench_indexed_large(c: &mut Criterion) {
    let doc = make_list(LARGE_LIST);
    let descriptor = indexed_descriptor(LARGE_LIST);
    let updater = CollectionUpdater::new();
    c.bench_function("bench_indexed_large", |b| {
        b.iter(|| {
            let result = updater.update(&doc.by_tag("li"), black_box(&descriptor));
            black_box(result.stats);
        });
    });
}

criterion_group!(
    benches,
    bench_single_element,
    bench_bulk_small,
    bench_bulk_large,
    bench_indexed_large
);
criterion_main!(benches);
