use criterion::{criterion_group, criterion_main, Criterion};
use mutant_zoo::NameAllocator;

fn bench_naming(c: &mut Criterion) {
    c.bench_function("allocator_new", |b| b.iter(|| NameAllocator::new(42)));

    c.bench_function("allocate_1000_names", |b| {
        b.iter(|| {
            let mut names = NameAllocator::new(42);
            for _ in 0..1000 {
                let _ = names.allocate();
            }
            names
        })
    });

    c.bench_function("restore_1000_allocated", |b| {
        let mut names = NameAllocator::new(7);
        for _ in 0..1000 {
            let _ = names.allocate();
        }
        let issued: Vec<String> = names.allocated().iter().cloned().collect();
        b.iter(|| NameAllocator::restore(7, issued.clone(), 0))
    });
}

criterion_group!(benches, bench_naming);
criterion_main!(benches);
