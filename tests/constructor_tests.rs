use lazy_stream::{
    from_iter_lazy, from_vec, ints, make, ones, range, unfold, unfold_async, Deferred, Stream,
    Value,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

#[tokio::test]
async fn test_make_with_mixed_cells() {
    let (resolver, deferred) = Deferred::channel();
    let stream = make(vec![Value::Ready("a"), Value::Pending(deferred), Value::Ready("c")]);
    tokio::spawn(async move {
        sleep(Duration::from_millis(5)).await;
        resolver.resolve("b");
    });
    assert_eq!(stream.to_vec().await.unwrap(), vec!["a", "b", "c"]);
    assert!(make(Vec::<Value<i32>>::new()).is_empty());
}

#[tokio::test]
async fn test_from_vec_and_collect() {
    let stream = from_vec(vec![1, 2, 3]);
    assert_eq!(stream.to_vec().await.unwrap(), vec![1, 2, 3]);

    let collected: Stream<char> = "xyz".chars().collect();
    assert_eq!(collected.render().await.unwrap(), "[stream x,y,z]");

    assert!(from_vec(Vec::<u8>::new()).is_empty());
}

#[tokio::test]
async fn test_from_iter_lazy_pulls_on_demand() {
    let pulled = Arc::new(AtomicUsize::new(0));
    let counter = pulled.clone();
    let stream = from_iter_lazy((0u32..).inspect(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    }));
    assert_eq!(pulled.load(Ordering::SeqCst), 1);

    assert_eq!(stream.take(3).to_vec().await.unwrap(), vec![0, 1, 2]);
    assert_eq!(pulled.load(Ordering::SeqCst), 3);

    assert!(from_iter_lazy(std::iter::empty::<i32>()).is_empty());
}

#[tokio::test]
async fn test_ones_and_ints() {
    assert_eq!(ones().take(3).to_vec().await.unwrap(), vec![1, 1, 1]);
    assert_eq!(ints().take(5).to_vec().await.unwrap(), vec![1, 2, 3, 4, 5]);
    assert_eq!(ints().item(99).await.unwrap(), 100);
}

#[tokio::test]
async fn test_infinite_streams_build_fresh_nodes() {
    let stream = ones();
    let next = stream.rest().await.unwrap();
    assert!(!next.ptr_eq(&stream));
    assert!(next.rest().await.unwrap().ptr_eq(&next.rest().await.unwrap()));
}

#[tokio::test]
async fn test_range() {
    assert_eq!(range(3, 5).to_vec().await.unwrap(), vec![3, 4, 5]);
    assert_eq!(range(4, 4).to_vec().await.unwrap(), vec![4]);
    assert!(range(5, 3).is_empty());
    assert_eq!(range(None, 3).to_vec().await.unwrap(), vec![1, 2, 3]);
    assert_eq!(range(-2, 1).to_vec().await.unwrap(), vec![-2, -1, 0, 1]);
    assert_eq!(
        range(10, None).take(3).to_vec().await.unwrap(),
        vec![10, 11, 12]
    );
}

#[tokio::test]
async fn test_range_stops_at_integer_limit() {
    let top = range(i64::MAX - 1, None);
    assert_eq!(top.to_vec().await.unwrap(), vec![i64::MAX - 1, i64::MAX]);
}

#[tokio::test]
async fn test_unfold() {
    let fibonacci = unfold((0u64, 1u64), |(a, b)| Some((a, (b, a + b))));
    assert_eq!(
        fibonacci.take(10).to_vec().await.unwrap(),
        vec![0, 1, 1, 2, 3, 5, 8, 13, 21, 34]
    );

    let countdown = unfold(3, |n| (n > 0).then_some((n, n - 1)));
    assert_eq!(countdown.to_vec().await.unwrap(), vec![3, 2, 1]);

    let empty = unfold(0, |_: i32| None::<(i32, i32)>);
    assert!(empty.is_empty());
}

#[tokio::test]
async fn test_unfold_async() {
    let stream = unfold_async(0, |n| async move {
        sleep(Duration::from_millis(1)).await;
        (n < 3).then_some((n, n + 1))
    });
    assert!(!stream.is_ready());
    let stream = stream.await.unwrap();
    assert_eq!(stream.to_vec().await.unwrap(), vec![0, 1, 2]);
}
