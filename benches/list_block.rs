use blockform::adapters::field_block::CharBlock;
use blockform::adapters::list_block::{ListBlock, ListBlockOptions};
use blockform::adapters::renderer::TeraRenderer;
use blockform::domain::{Block, FormData, FormFiles};
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};

fn submission(count: usize) -> FormData {
    let mut data = FormData::new();
    data.insert("items-count", count.to_string());
    for slot in 0..count {
        // Submit in reverse order so decoding has to sort
        data.insert(format!("items-{}-order", slot), (count - slot).to_string());
        data.insert(format!("items-{}-deleted", slot), if slot % 10 == 0 { "1" } else { "" });
        data.insert(format!("items-{}-value", slot), format!("item {}", slot));
    }
    data
}

fn list_block() -> ListBlock<CharBlock> {
    ListBlock::with_options(
        CharBlock::new().max_length(64),
        ListBlockOptions {
            max_length: Some(1000),
            ..Default::default()
        },
    )
}

fn benchmark_decode_and_clean(c: &mut Criterion) {
    let block = list_block();
    let files = FormFiles::new();
    let mut group = c.benchmark_group("decode_and_clean");

    for count in [10, 100, 500] {
        let data = submission(count);
        group.throughput(Throughput::Elements(count as u64));
        group.bench_function(format!("{}_slots", count), |b| {
            b.iter(|| {
                let value = block
                    .value_from_form(black_box(&data), &files, "items")
                    .unwrap();
                black_box(block.clean(&value).unwrap())
            })
        });
    }

    group.finish();
}

fn benchmark_render_form(c: &mut Criterion) {
    let block = list_block();
    let renderer = TeraRenderer::new().unwrap();
    let value: Vec<String> = (0..50).map(|i| format!("item {}", i)).collect();

    c.bench_function("render_form_50_items", |b| {
        b.iter(|| {
            black_box(
                block
                    .render_form(black_box(&value), "items", &[], &renderer)
                    .unwrap(),
            )
        })
    });
}

criterion_group!(benches, benchmark_decode_and_clean, benchmark_render_form);
criterion_main!(benches);
