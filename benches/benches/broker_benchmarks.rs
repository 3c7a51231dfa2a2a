use std::hint::black_box;

use bytes::Bytes;
use courier::{Broker, QueueCapacity, SubscriptionHandle};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

fn bench_subscribe_unsubscribe(c: &mut Criterion) {
    let broker = Broker::<Bytes>::new();
    c.bench_function("broker_subscribe_unsubscribe", |b| {
        b.iter(|| {
            let sub = broker.subscribe().unwrap();
            broker.unsubscribe(black_box(sub.id())).unwrap();
        })
    });
}

fn bench_subscribe_drop(c: &mut Criterion) {
    let broker = Broker::<Bytes>::new();
    c.bench_function("broker_subscribe_drop", |b| {
        b.iter(|| {
            let _sub = black_box(broker.subscribe().unwrap());
        })
    });
}

/// Рассылка по N подписчикам, которые успевают читать: очередь
/// вычищается после каждой итерации.
fn bench_publish_fan_out(c: &mut Criterion) {
    let mut group = c.benchmark_group("publish_fan_out");
    let payload = Bytes::from_static(b"x");

    for n in [0usize, 1, 10, 100] {
        let broker = Broker::<Bytes>::with_capacity(QueueCapacity::Unbounded);
        let mut subs: Vec<SubscriptionHandle<Bytes>> =
            (0..n).map(|_| broker.subscribe().unwrap()).collect();

        group.throughput(Throughput::Elements(n.max(1) as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| {
                black_box(broker.publish(payload.clone()));
                for sub in subs.iter_mut() {
                    let _ = sub.try_recv();
                }
            })
        });
    }
    group.finish();
}

/// Рассылка по подписчикам с заполненными очередями: каждая попытка
/// доставки отбрасывается.
fn bench_publish_all_full(c: &mut Criterion) {
    let mut group = c.benchmark_group("publish_all_full");
    let payload = Bytes::from_static(b"x");

    for n in [1usize, 10, 100] {
        let broker = Broker::<Bytes>::with_capacity(QueueCapacity::Bounded(1));
        let _subs: Vec<_> = (0..n).map(|_| broker.subscribe().unwrap()).collect();
        broker.publish(payload.clone());

        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| black_box(broker.publish(payload.clone())))
        });
    }
    group.finish();
}

/// Издатель и асинхронный потребитель в одном рантайме.
fn bench_publish_recv_async(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let broker = Broker::<u64>::with_capacity(QueueCapacity::Bounded(1024));
    let mut sub = broker.subscribe().unwrap();

    c.bench_function("publish_recv_async", |b| {
        b.iter(|| {
            broker.publish(black_box(42));
            rt.block_on(sub.recv()).unwrap()
        })
    });
}

criterion_group!(
    benches,
    bench_subscribe_unsubscribe,
    bench_subscribe_drop,
    bench_publish_fan_out,
    bench_publish_all_full,
    bench_publish_recv_async,
);
criterion_main!(benches);
