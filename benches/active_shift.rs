use active_shift::backend::{Rayon, Serial};
use active_shift::ops::dispatch::{backward_on, forward_on};
use active_shift::tensors::Tensor;
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};

criterion_group! {
    name = active_shift_benchmarks;
    config = Criterion::default().sample_size(20);
    targets = shift_benchmark,
}
criterion_main!(active_shift_benchmarks);

fn volume(shape: [usize; 4]) -> Tensor<f32> {
    let len: usize = shape.iter().product();
    let data = (0..len).map(|i| ((i % 97) as f32) * 0.01).collect();
    Tensor::new(shape.to_vec(), data)
}

fn shifts(channels: usize) -> Tensor<f32> {
    let data = (0..channels * 2)
        .map(|i| ((i % 7) as f32 - 3.0) * 0.37)
        .collect();
    Tensor::new(vec![channels, 2], data)
}

fn shift_benchmark(c: &mut Criterion) {
    let shapes = [([8, 64, 32, 32], "8x64x32x32"), ([32, 128, 16, 16], "32x128x16x16")];

    let mut group = c.benchmark_group("active_shift");
    for (shape, name) in shapes {
        let input = volume(shape);
        let theta = shifts(shape[1]);
        group.throughput(Throughput::Elements(input.len() as u64));

        group.bench_with_input(BenchmarkId::new("forward_serial", name), &input, |b, x| {
            b.iter(|| forward_on(x, &theta, &Serial).unwrap());
        });
        group.bench_with_input(BenchmarkId::new("forward_rayon", name), &input, |b, x| {
            b.iter(|| forward_on(x, &theta, &Rayon).unwrap());
        });
        group.bench_with_input(BenchmarkId::new("backward_rayon", name), &input, |b, x| {
            b.iter(|| backward_on(x, x, &theta, &Rayon).unwrap());
        });
    }
    group.finish();
}
