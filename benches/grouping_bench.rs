/*!
 * Benchmarks for the hot paths of a translation run.
 *
 * Measures performance of:
 * - Auto-tuning over a parsed file
 * - Grouping cues under tuned limits
 * - Markup protection and normalization
 */

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use cuebatch::subtitle_processor::Cue;
use cuebatch::translation::sanitize::{normalize, protect, restore};
use cuebatch::translation::{auto_tune, group_cues, GroupLimits};

/// Generate test cues with a long pause every twenty cues.
fn generate_cues(count: usize) -> Vec<Cue> {
    let texts = [
        "Hello, how are you today?",
        "<i>I'm doing well, thank you for asking.</i>",
        "The weather is quite nice.",
        "",
        "<font color=\"#ffff00\">Did you see the news?</font>",
        "No, I haven't had time to check.\nMaybe tonight.",
        "Something important happened at the meeting.",
    ];

    (0..count)
        .map(|i| {
            let pause = (i / 20) as u64 * 5000;
            let start = i as u64 * 3000 + pause;
            Cue::new(i, start, start + 2500, texts[i % texts.len()])
        })
        .collect()
}

fn bench_auto_tune(c: &mut Criterion) {
    let mut group = c.benchmark_group("auto_tune");

    for size in [100, 1000, 5000].iter() {
        let cues = generate_cues(*size);
        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &cues, |b, cues| {
            b.iter(|| auto_tune(black_box(cues), "en", 8))
        });
    }

    group.finish();
}

fn bench_group_cues(c: &mut Criterion) {
    let mut group = c.benchmark_group("group_cues");

    for size in [100, 1000, 5000].iter() {
        let cues = generate_cues(*size);
        let limits = GroupLimits::from(&auto_tune(&cues, "en", 8));
        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &cues, |b, cues| {
            b.iter(|| group_cues(black_box(cues), limits))
        });
    }

    group.finish();
}

fn bench_sanitize(c: &mut Criterion) {
    let marked = "<i>I'm doing well,</i> <font color=\"#ffff00\">thank you</font> for asking.";
    let messy = "\u{200e}Line one   with  gaps\r\n\r\n  Line two  \r\n";

    c.bench_function("protect_restore", |b| {
        b.iter(|| {
            let (cleaned, placeholders) = protect(black_box(marked));
            restore(&cleaned, &placeholders)
        })
    });

    c.bench_function("normalize", |b| b.iter(|| normalize(black_box(messy))));
}

criterion_group!(grouping_benches, bench_auto_tune, bench_group_cues);
criterion_group!(sanitize_benches, bench_sanitize);
criterion_main!(grouping_benches, sanitize_benches);
