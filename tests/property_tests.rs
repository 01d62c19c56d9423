use lazy_stream::{equals, from_vec, make, Stream, Value};
use quickcheck::{quickcheck, TestResult};

/// Same values, but every other cell is pending
fn interleaved(values: &[i32]) -> Stream<i32> {
    make(values.iter().enumerate().map(|(i, &x)| {
        if i % 2 == 0 {
            Value::pending(async move { Ok(x) })
        } else {
            Value::Ready(x)
        }
    }))
}

#[test]
fn equals_agrees_with_vec_equality() {
    fn prop(a: Vec<i32>, b: Vec<i32>) -> bool {
        tokio_test::block_on(async {
            let left = from_vec(a.clone());
            let right = interleaved(&b);
            let same = equals(&left, &right).await.unwrap();
            let flipped = equals(&right, &left).await.unwrap();
            same == (a == b) && same == flipped
        })
    }
    quickcheck(prop as fn(Vec<i32>, Vec<i32>) -> bool);
}

#[test]
fn equals_is_reflexive_across_representations() {
    fn prop(values: Vec<i32>) -> bool {
        tokio_test::block_on(async {
            equals(&from_vec(values.clone()), &interleaved(&values))
                .await
                .unwrap()
        })
    }
    quickcheck(prop as fn(Vec<i32>) -> bool);
}

#[test]
fn take_and_drop_split_the_stream() {
    fn prop(values: Vec<i32>, n: usize) -> TestResult {
        if n > values.len() + 5 {
            return TestResult::discard();
        }
        let outcome = tokio_test::block_on(async {
            let stream = interleaved(&values);
            let front = stream.take(n).to_vec().await.unwrap();
            let back = stream.drop_n(n).await.unwrap().to_vec().await.unwrap();
            let split = n.min(values.len());
            front == values[..split] && back == values[split..]
        });
        TestResult::from_bool(outcome)
    }
    quickcheck(prop as fn(Vec<i32>, usize) -> TestResult);
}

#[test]
fn filter_and_concat_map_match_iterators() {
    fn prop(values: Vec<i16>) -> bool {
        tokio_test::block_on(async {
            let stream = from_vec(values.clone());

            let kept = stream.filter(|x| x % 3 != 0).await.unwrap().to_vec().await.unwrap();
            let expected_kept: Vec<i16> = values.iter().copied().filter(|x| x % 3 != 0).collect();

            let expanded = stream
                .concat_map(|x| from_vec(vec![x; (x.unsigned_abs() % 3) as usize]))
                .await
                .unwrap()
                .to_vec()
                .await
                .unwrap();
            let expected_expanded: Vec<i16> = values
                .iter()
                .flat_map(|&x| vec![x; (x.unsigned_abs() % 3) as usize])
                .collect();

            kept == expected_kept && expanded == expected_expanded
        })
    }
    quickcheck(prop as fn(Vec<i16>) -> bool);
}

#[test]
fn append_concatenates() {
    fn prop(a: Vec<u8>, b: Vec<u8>) -> bool {
        tokio_test::block_on(async {
            let joined = from_vec(a.clone()).append(&from_vec(b.clone()));
            let mut expected = a;
            expected.extend(b);
            joined.to_vec().await.unwrap() == expected
        })
    }
    quickcheck(prop as fn(Vec<u8>, Vec<u8>) -> bool);
}
