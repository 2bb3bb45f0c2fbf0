use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use purrchat::core::message::Turn;
use purrchat::ui::markdown::render_markdown;
use purrchat::ui::renderer::build_transcript_lines;
use purrchat::ui::theme::ThemeColor;

const REPLY: &str = "## Answer\n\nHere is **some** text with `inline code`, a link to \
[the docs](https://example.com) and math $e^{i\\pi} + 1 = 0$.\n\n\
- first point\n- second point\n  - nested\n\n\
```rust\nfn main() {\n    println!(\"purr\");\n}\n```\n\n\
> quoted wisdom\n";

fn make_turns(pairs: usize) -> Vec<Turn> {
    let mut turns = Vec::with_capacity(pairs * 2);
    for i in 0..pairs {
        turns.push(Turn::user(format!("question {i}")));
        turns.push(Turn::assistant(REPLY, i % 3));
    }
    turns
}

fn bench_render_markdown(c: &mut Criterion) {
    let theme = ThemeColor::Yellow.style();

    c.bench_function("render_markdown_single_reply", |b| {
        b.iter(|| render_markdown(std::hint::black_box(REPLY), theme))
    });

    let mut group = c.benchmark_group("render_transcript");
    for &pairs in &[50usize, 200usize] {
        let turns = make_turns(pairs);
        group.throughput(Throughput::Elements(turns.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(pairs), &turns, |b, turns| {
            b.iter(|| build_transcript_lines(std::hint::black_box(turns), theme))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_render_markdown);
criterion_main!(benches);
