mod common;
use common::*;

use sluice::{channel, ChannelClosedError, ErasedError, TrySendError};

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::thread;

#[test]
fn single_type_drain() {
  let queue = worker_queue("single-type");
  let (readable, writable) = channel::<i32>(queue, 5);

  assert!(writable.send(17));
  assert!(writable.send(4711));
  writable.close();

  assert_eq!(wait(readable.receive()).unwrap(), 17);
  assert_eq!(wait(readable.receive()).unwrap(), 4711);
  let error = wait(readable.receive()).unwrap_err();
  assert!(error.is::<ChannelClosedError>());
}

#[test]
fn two_type_drain() {
  let queue = worker_queue("two-type");
  let (readable, writable) = channel::<(i32, String)>(queue, 5);

  assert!(writable.send((17, "hello".to_string())));
  assert!(writable.send((4711, "world".to_string())));
  writable.close();

  assert_eq!(wait(readable.receive()).unwrap(), (17, "hello".to_string()));
  assert_eq!(wait(readable.receive()).unwrap(), (4711, "world".to_string()));
  assert!(wait(readable.receive()).unwrap_err().is::<ChannelClosedError>());
}

#[test]
fn unit_channel_carries_unit_items() {
  let queue = worker_queue("unit");
  let (readable, writable) = channel::<()>(queue, 5);

  writable.send(());
  writable.send(());
  writable.close();

  wait(readable.receive()).unwrap();
  wait(readable.receive()).unwrap();
  assert!(wait(readable.receive()).unwrap_err().is::<ChannelClosedError>());
}

#[test]
fn drain_through_a_chained_consumer() {
  let queue = worker_queue("chained");
  let (readable, writable) = channel::<i32>(queue, 5);

  writable.send(17);
  writable.send(4711);
  writable.close();

  let third_value_calls = Calls::new();
  let closed_calls = Calls::new();
  let value_counter = third_value_calls.clone();
  let closed_counter = closed_calls.clone();
  let next = readable.clone();
  let tail = readable
    .receive()
    .and_then(move |first| {
      assert_eq!(first, 17);
      let after = next.clone();
      next.receive().and_then(move |second| {
        assert_eq!(second, 4711);
        after.receive()
      })
    })
    .then(move |_| {
      value_counter.bump();
    })
    .fail(move |_: &ChannelClosedError| {
      closed_counter.bump();
    });

  wait(tail).unwrap();
  assert_eq!(third_value_calls.count(), 0);
  assert_eq!(closed_calls.count(), 1);
}

#[test]
fn auto_close_when_the_writable_is_dropped() {
  let queue = worker_queue("auto-close-writable");

  // The helper returns only the readable; the writable dies with it.
  let readable = {
    let (readable, writable) = channel::<i32>(queue, 5);
    writable.send(17);
    writable.send(4711);
    readable
  };

  assert_eq!(wait(readable.receive()).unwrap(), 17);
  assert_eq!(wait(readable.receive()).unwrap(), 4711);
  assert!(wait(readable.receive()).unwrap_err().is::<ChannelClosedError>());
}

#[test]
fn auto_close_when_the_readable_is_dropped() {
  let queue = worker_queue("auto-close-readable");

  // The helper parks a receive, then drops the readable.
  let (parked, writable) = {
    let (readable, writable) = channel::<i32>(queue, 5);
    let parked = readable.receive();
    (parked, writable)
  };

  assert!(wait(parked).unwrap_err().is::<ChannelClosedError>());
  assert!(!writable.send(17));
  let error = writable.ensure_send(17).unwrap_err();
  assert!(error.reason().is_none());
}

#[test]
fn readable_drop_discards_buffered_items() {
  let queue = worker_queue("readable-drop-discards");
  let (readable, writable) = channel::<i32>(queue, 5);

  writable.send(1);
  writable.send(2);
  drop(readable);

  assert!(!writable.send(3));
  assert!(matches!(writable.try_send(4), Err(TrySendError::Closed(4))));
}

#[test]
fn multiple_endpoint_clones_close_only_on_the_last_drop() {
  let queue = worker_queue("clones");
  let (readable, writable) = channel::<i32>(queue, 5);

  let second_writable = writable.clone();
  drop(writable);
  assert!(second_writable.send(1));

  drop(second_writable);
  assert_eq!(wait(readable.receive()).unwrap(), 1);
  assert!(wait(readable.receive()).unwrap_err().is::<ChannelClosedError>());
}

#[test]
fn send_reports_room_until_capacity_then_overcommits() {
  let queue = worker_queue("backpressure");
  let (readable, writable) = channel::<i32>(queue, 2);

  assert!(writable.send(1));
  assert!(!writable.send(2)); // at capacity: accepted, no more room
  assert!(!writable.send(3)); // past capacity: still accepted

  // The strict variant refuses instead of overcommitting.
  match writable.try_send(4) {
    Err(TrySendError::Full(item)) => assert_eq!(item, 4),
    other => panic!("expected Full, got {other:?}"),
  }

  for expected in [1, 2, 3] {
    assert_eq!(wait(readable.receive()).unwrap(), expected);
  }
}

#[test]
fn delivery_to_a_parked_receive_reports_room() {
  let queue = worker_queue("parked-receive");
  let (readable, writable) = channel::<i32>(queue, 1);

  let parked = readable.receive();
  // Delivered straight to the waiter, so the buffer stays empty.
  assert!(writable.send(17));
  assert_eq!(wait(parked).unwrap(), 17);
}

#[test]
fn close_is_idempotent_and_the_first_error_wins() {
  let queue = worker_queue("close-idempotent");
  let (readable, writable) = channel::<i32>(queue, 5);

  writable.close_with(TestError("first"));
  writable.close_with(TestError("second"));
  writable.close();

  let error = wait(readable.receive()).unwrap_err();
  let closed = error.downcast_ref::<ChannelClosedError>().unwrap();
  let reason = closed.reason().unwrap();
  assert_eq!(reason.downcast_ref::<TestError>().unwrap().0, "first");
}

#[test]
fn ensure_send_carries_the_close_reason() {
  let queue = worker_queue("ensure-send-reason");
  let (_readable, writable) = channel::<i32>(queue, 5);

  writable.close_with(TestError("teardown"));
  let error = writable.ensure_send(1).unwrap_err();
  let reason = error.reason().unwrap();
  assert_eq!(reason.downcast_ref::<TestError>().unwrap().0, "teardown");
}

#[test]
fn is_closed_waits_for_the_drain() {
  let queue = worker_queue("is-closed");
  let (readable, writable) = channel::<i32>(queue, 5);

  writable.send(1);
  writable.close();
  assert!(!readable.is_closed());

  wait(readable.receive()).unwrap();
  assert!(readable.is_closed());
}

#[test]
fn fast_receive_drains_then_reports_close() {
  let queue = worker_queue("fast-receive");
  let (readable, writable) = channel::<i32>(queue, 5);

  writable.send(17);
  writable.send(4711);
  writable.close();

  let seen = Arc::new(Mutex::new(Vec::new()));
  let closed_calls = Calls::new();

  for _ in 0..2 {
    let sink = Arc::clone(&seen);
    let closed_counter = closed_calls.clone();
    let promise = readable.receive_with(
      move |value| {
        sink.lock().unwrap().push(value);
        Ok(())
      },
      move || {
        closed_counter.bump();
      },
    );
    wait(promise).unwrap();
  }
  assert_eq!(closed_calls.count(), 0);

  let value_calls = Calls::new();
  let value_counter = value_calls.clone();
  let closed_counter = closed_calls.clone();
  let promise = readable.receive_with(
    move |_| {
      value_counter.bump();
      Ok(())
    },
    move || {
      closed_counter.bump();
    },
  );
  wait(promise).unwrap();

  assert_eq!(*seen.lock().unwrap(), vec![17, 4711]);
  assert_eq!(value_calls.count(), 0);
  assert_eq!(closed_calls.count(), 1);
}

#[test]
fn fast_receive_surfaces_the_close_error_after_the_drain() {
  let queue = worker_queue("fast-receive-close-error");
  let (readable, writable) = channel::<i32>(queue, 5);

  writable.send(17);
  writable.send(4711);
  writable.close_with(TestError("teardown"));

  let seen = Arc::new(Mutex::new(Vec::new()));
  let closed_calls = Calls::new();

  for _ in 0..2 {
    let sink = Arc::clone(&seen);
    let closed_counter = closed_calls.clone();
    let promise = readable.receive_with(
      move |value| {
        sink.lock().unwrap().push(value);
        Ok(())
      },
      move || {
        closed_counter.bump();
      },
    );
    wait(promise).unwrap();
  }
  assert_eq!(*seen.lock().unwrap(), vec![17, 4711]);

  // Drained: the close error itself surfaces, not channel-closed, and the
  // closed callback never runs.
  let closed_counter = closed_calls.clone();
  let promise = readable.receive_with(
    |_| Ok(()),
    move || {
      closed_counter.bump();
    },
  );
  let error = wait(promise).unwrap_err();
  assert_eq!(error.downcast_ref::<TestError>().unwrap().0, "teardown");
  assert!(!error.is::<ChannelClosedError>());
  assert_eq!(closed_calls.count(), 0);
}

#[test]
fn fast_receive_failing_handler_closes_the_readable() {
  let queue = worker_queue("fast-receive-handler-error");
  let (readable, writable) = channel::<i32>(queue, 5);

  writable.send(17);
  writable.send(4711);
  writable.close();

  let closed_calls = Calls::new();
  let closed_counter = closed_calls.clone();
  let promise = readable.receive_with(
    |value| {
      assert_eq!(value, 17);
      Err(ErasedError::new(TestError("reader gave up")))
    },
    move || {
      closed_counter.bump();
    },
  );

  let error = wait(promise).unwrap_err();
  assert_eq!(error.downcast_ref::<TestError>().unwrap().0, "reader gave up");
  assert!(readable.is_closed());
  assert_eq!(closed_calls.count(), 0);
}

#[test]
fn parked_fast_receive_is_released_by_a_send() {
  let queue = worker_queue("fast-receive-parked");
  let (readable, writable) = channel::<i32>(queue, 5);

  let seen = Arc::new(Mutex::new(Vec::new()));
  let sink = Arc::clone(&seen);
  let promise = readable.receive_with(
    move |value| {
      sink.lock().unwrap().push(value);
      Ok(())
    },
    || {},
  );

  assert!(writable.send(99));
  wait(promise).unwrap();
  assert_eq!(*seen.lock().unwrap(), vec![99]);
}

#[test]
fn order_is_preserved_across_threads() {
  const ITEMS: usize = 1_000;

  let queue = worker_queue("order-stress");
  let (readable, writable) = channel::<usize>(queue, 16);

  let producer = thread::spawn(move || {
    for i in 0..ITEMS {
      // The room hint is advisory; ignoring it just overcommits.
      let _ = writable.send(i);
    }
    writable.close();
  });

  for expected in 0..ITEMS {
    assert_eq!(wait(readable.receive()).unwrap(), expected);
  }
  assert!(wait(readable.receive()).unwrap_err().is::<ChannelClosedError>());
  producer.join().unwrap();
}

#[test]
fn each_item_is_delivered_exactly_once() {
  const ITEMS: usize = 500;

  let queue = worker_queue("exactly-once");
  let (readable, writable) = channel::<usize>(queue, 8);
  let received = Arc::new(Mutex::new(Vec::new()));

  let mut consumers = Vec::new();
  for _ in 0..2 {
    let readable = readable.clone();
    let received = Arc::clone(&received);
    consumers.push(thread::spawn(move || loop {
      match wait(readable.receive()) {
        Ok(item) => received.lock().unwrap().push(item),
        Err(error) => {
          assert!(error.is::<ChannelClosedError>());
          break;
        }
      }
    }));
  }
  drop(readable);

  for i in 0..ITEMS {
    let _ = writable.send(i);
  }
  writable.close();

  for consumer in consumers {
    consumer.join().unwrap();
  }

  let received = received.lock().unwrap();
  assert_eq!(received.len(), ITEMS);
  let distinct: HashSet<_> = received.iter().copied().collect();
  assert_eq!(distinct.len(), ITEMS);
}
