//! Grid encoding and debounce throughput

use canvas::{Color, DebounceBuffer, PixelGrid, TimerHandle};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::time::Duration;

struct NoopTimer;

impl TimerHandle for NoopTimer {
    fn cancel(self: Box<Self>) {}
}

fn bench_serialize(c: &mut Criterion) {
    let grid = PixelGrid::new(1000, 1000, Color::DEFAULT_FILL).unwrap();

    c.bench_function("serialize_1000x1000", |b| {
        b.iter(|| black_box(grid.serialize()));
    });
}

fn bench_submit(c: &mut Criterion) {
    let mut grid = PixelGrid::new(256, 256, Color::DEFAULT_FILL).unwrap();
    let mut buffer = DebounceBuffer::new(256 * 256, Duration::from_millis(100));
    let cell = grid.cell(17, 42).unwrap();

    // First submit arms; the rest hit the coalescing path
    c.bench_function("submit_hot_cell", |b| {
        b.iter(|| {
            black_box(buffer.submit(&mut grid, cell, Color::new(1, 2, 3), |_, _| {
                Box::new(NoopTimer)
            }))
        });
    });

    c.bench_function("submit_immediate", |b| {
        let mut buffer = DebounceBuffer::new(256 * 256, Duration::ZERO);
        b.iter(|| {
            black_box(buffer.submit(&mut grid, cell, Color::new(3, 2, 1), |_, _| {
                Box::new(NoopTimer)
            }))
        });
    });
}

criterion_group!(benches, bench_serialize, bench_submit);
criterion_main!(benches);
