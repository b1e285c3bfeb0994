use criterion::{criterion_group, criterion_main, Criterion, Throughput};

use sluice::{channel, Promise, QueueRef, WorkerQueue};

use std::sync::Arc;

const ITEMS: u64 = 1_000;

fn bench_send_then_drain(c: &mut Criterion) {
  let queue: QueueRef = Arc::new(WorkerQueue::new("bench-drain"));

  let mut group = c.benchmark_group("channel");
  group.throughput(Throughput::Elements(ITEMS));
  group.bench_function("send_then_drain_1k", |b| {
    b.iter(|| {
      let (readable, writable) = channel::<u64>(queue.clone(), ITEMS as usize);
      for i in 0..ITEMS {
        writable.send(i);
      }
      writable.close();
      for _ in 0..ITEMS {
        futures::executor::block_on(readable.receive()).unwrap();
      }
    })
  });
  group.finish();
}

fn bench_promise_chain(c: &mut Criterion) {
  let queue: QueueRef = Arc::new(WorkerQueue::new("bench-chain"));

  let mut group = c.benchmark_group("promise");
  group.bench_function("then_chain_depth_100", |b| {
    b.iter(|| {
      let mut promise = Promise::resolved(queue.clone(), 0u64);
      for _ in 0..100 {
        promise = promise.then(|n| n + 1);
      }
      assert_eq!(futures::executor::block_on(promise).unwrap(), 100);
    })
  });
  group.finish();
}

criterion_group!(benches, bench_send_then_drain, bench_promise_chain);
criterion_main!(benches);
