use lazy_stream::{from_vec, ints, Deferred, NodePart, Stream, StreamError, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

fn delay<T: Send + Sync + Clone + 'static>(value: T) -> Value<T> {
    let (resolver, deferred) = Deferred::channel();
    tokio::spawn(async move {
        sleep(Duration::from_millis(5)).await;
        resolver.resolve(value);
    });
    Value::Pending(deferred)
}

#[tokio::test]
async fn test_single_and_cons() {
    let single = Stream::single(7);
    assert_eq!(single.first().await.unwrap(), 7);
    assert!(single.rest().await.unwrap().is_empty());

    let pair = Stream::cons(1, Stream::single(2));
    assert_eq!(pair.first().await.unwrap(), 1);
    assert_eq!(pair.rest().await.unwrap().first().await.unwrap(), 2);
}

#[tokio::test]
async fn test_empty_stream_access_fails() {
    let empty = Stream::<i32>::nil();

    assert!(empty.head().unwrap_err().is_empty_access());
    assert!(empty.tail().unwrap_err().is_empty_access());

    match empty.first().await {
        Err(StreamError::EmptyStreamAccess { part }) => assert_eq!(part, NodePart::Head),
        other => panic!("unexpected result: {:?}", other),
    }
    match empty.rest().await {
        Err(StreamError::EmptyStreamAccess { part }) => assert_eq!(part, NodePart::Tail),
        other => panic!("unexpected result: {:?}", other),
    }
}

#[tokio::test]
async fn test_sentinel_identity() {
    let empty = Stream::<i32>::nil();
    assert!(empty.ptr_eq(&Stream::default()));

    let tail = Stream::single(1).rest().await.unwrap();
    assert!(tail.is_empty());
    assert!(tail.ptr_eq(&empty));

    let a = Stream::single(1);
    let b = Stream::single(1);
    assert!(a.ptr_eq(&a.clone()));
    assert!(!a.ptr_eq(&b));
}

#[tokio::test]
async fn test_pending_head_and_tail() {
    let stream = Stream::node(
        delay(1),
        Value::pending(async {
            sleep(Duration::from_millis(5)).await;
            Ok(Stream::single(2))
        }),
    );

    assert!(!stream.head().unwrap().is_ready());
    assert_eq!(stream.first().await.unwrap(), 1);
    let rest = stream.rest().await.unwrap();
    assert_eq!(rest.first().await.unwrap(), 2);
    assert!(rest.rest().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_failed_head_propagates() {
    let stream = Stream::<i32>::node(
        Value::Pending(Deferred::failed(StreamError::Custom("boom".to_string()))),
        Value::Ready(Stream::nil()),
    );
    match stream.first().await {
        Err(StreamError::Custom(message)) => assert_eq!(message, "boom"),
        other => panic!("unexpected result: {:?}", other),
    }
    // The tail is unaffected by the head failing
    assert!(stream.rest().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_lazy_tail_runs_recipe_once() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let stream = Stream::lazy(Value::Ready(1), move || {
        counter.fetch_add(1, Ordering::SeqCst);
        Value::Ready(Stream::single(2))
    });

    assert_eq!(calls.load(Ordering::SeqCst), 0);
    let first = stream.rest().await.unwrap();
    let second = stream.rest().await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(first.ptr_eq(&second));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_lazy_tail_concurrent_forcing() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let stream = Stream::lazy(Value::Ready(0), move || {
        counter.fetch_add(1, Ordering::SeqCst);
        std::thread::sleep(Duration::from_millis(10));
        Value::Ready(from_vec(vec![1, 2, 3]))
    });

    let mut handles = Vec::new();
    for _ in 0..8 {
        let stream = stream.clone();
        handles.push(tokio::spawn(async move { stream.rest().await.unwrap() }));
    }
    let mut tails = Vec::new();
    for handle in handles {
        tails.push(handle.await.unwrap());
    }

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    for tail in &tails {
        assert!(tail.ptr_eq(&tails[0]));
    }
}

#[tokio::test]
async fn test_pending_tail_shared_between_readers() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let stream = Stream::node(
        Value::Ready(1),
        Value::pending(async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Stream::single(2))
        }),
    );

    let (a, b) = tokio::join!(stream.rest(), stream.rest());
    assert!(a.unwrap().ptr_eq(&b.unwrap()));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_value_of_stream_first_and_rest() {
    let value: Value<Stream<i32>> = Value::pending(async {
        sleep(Duration::from_millis(5)).await;
        Ok(from_vec(vec![1, 2]))
    });
    assert_eq!(value.first().await.unwrap(), 1);
    assert_eq!(value.rest().await.unwrap().first().await.unwrap(), 2);

    let empty: Value<Stream<i32>> = Value::Ready(Stream::nil());
    assert!(empty.first().await.unwrap_err().is_empty_access());
}

#[tokio::test]
async fn test_deferred_channel() {
    let (resolver, deferred) = Deferred::<i32>::channel();
    let other = deferred.clone();
    resolver.resolve(42);
    assert_eq!(deferred.await.unwrap(), 42);
    assert_eq!(other.await.unwrap(), 42);

    let (resolver, deferred) = Deferred::<i32>::channel();
    resolver.reject(StreamError::Custom("rejected".to_string()));
    assert!(matches!(deferred.await, Err(StreamError::Custom(_))));

    let (resolver, deferred) = Deferred::<i32>::channel();
    drop(resolver);
    assert!(matches!(deferred.await, Err(StreamError::Cancelled)));
}

#[tokio::test]
async fn test_deferred_chaining_skips_callbacks_on_failure() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let failed = Deferred::<i32>::failed(StreamError::NoInitialValue);
    let mapped = failed.map(move |x| {
        counter.fetch_add(1, Ordering::SeqCst);
        x + 1
    });
    assert!(matches!(mapped.await, Err(StreamError::NoInitialValue)));
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    let chained = Deferred::ready(2).then(|x| Value::pending(async move { Ok(x * 10) }));
    assert_eq!(chained.await.unwrap(), 20);
}

#[tokio::test]
async fn test_value_now() {
    let deferred = Deferred::ready(5);
    let value = Value::Pending(deferred.clone());
    assert_eq!(value.now(), None);
    deferred.await.unwrap();
    assert_eq!(value.now(), Some(5));
    assert_eq!(Value::Ready(3).now(), Some(3));
}

#[test]
fn test_dropping_long_chain() {
    let stream = from_vec((0..100_000).collect::<Vec<u32>>());
    drop(stream);
}

#[tokio::test]
async fn test_dropping_long_memoized_chain() {
    let stream = ints().take(100_000);
    assert_eq!(stream.len().await.unwrap(), 100_000);
    drop(stream);
}

#[test]
fn test_debug_output() {
    assert_eq!(format!("{:?}", Stream::<i32>::nil()), "Stream(nil)");
    assert!(format!("{:?}", Stream::single(3)).contains("Ready(3)"));
}
