//! Sequential short-circuiting combinators.
//!
//! Both combinators visit items strictly in order and never start the check
//! for item `i + 1` before the check for item `i` has completed. Work stops
//! as soon as the outcome is known, so the result is produced exactly once.
//!
//! An empty input is a malformed tree, never a vacuous pass.

use std::future::Future;

use tracing::trace;

use warden_core::EmptySequence;

/// Every item must pass (`AND`).
///
/// Returns the first failure; items after it are never checked.
pub async fn all_series<'a, T, E, F, Fut>(items: &'a [T], mut check: F) -> Result<(), E>
where
    F: FnMut(&'a T) -> Fut,
    Fut: Future<Output = Result<(), E>>,
    E: From<EmptySequence>,
{
    if items.is_empty() {
        return Err(EmptySequence.into());
    }

    for (index, item) in items.iter().enumerate() {
        if let Err(err) = check(item).await {
            trace!(index, total = items.len(), "all_series stopped on failure");
            return Err(err);
        }
    }
    Ok(())
}

/// At least one item must pass (`OR`).
///
/// Returns success at the first passing item. When every item fails, the
/// failure of the *last* item is reported.
pub async fn any_series<'a, T, E, F, Fut>(items: &'a [T], mut check: F) -> Result<(), E>
where
    F: FnMut(&'a T) -> Fut,
    Fut: Future<Output = Result<(), E>>,
    E: From<EmptySequence>,
{
    if items.is_empty() {
        return Err(EmptySequence.into());
    }

    let mut last = None;
    for (index, item) in items.iter().enumerate() {
        match check(item).await {
            Ok(()) => {
                trace!(index, total = items.len(), "any_series stopped on success");
                return Ok(());
            }
            Err(err) => last = Some(err),
        }
    }
    Err(last.unwrap_or_else(|| EmptySequence.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::time::Duration;

    use proptest::prelude::*;

    #[derive(Debug, PartialEq, Eq)]
    enum TestError {
        Empty,
        Failed(u32),
    }

    impl From<EmptySequence> for TestError {
        fn from(_: EmptySequence) -> Self {
            TestError::Empty
        }
    }

    fn block_on<F: Future>(fut: F) -> F::Output {
        futures::executor::block_on(fut)
    }

    #[tokio::test]
    async fn all_series_keeps_input_order_despite_delays() {
        // Longer sleeps for earlier items would reorder a concurrent fan-out.
        let seen = RefCell::new(Vec::new());
        let result: Result<(), TestError> = all_series(&[1u64, 3, 2], |x| {
            let seen = &seen;
            async move {
                tokio::time::sleep(Duration::from_millis(*x * 5)).await;
                seen.borrow_mut().push(*x);
                Ok(())
            }
        })
        .await;

        assert_eq!(result, Ok(()));
        assert_eq!(*seen.borrow(), vec![1, 3, 2]);
    }

    #[test]
    fn all_series_breaks_on_first_error() {
        let mut calls = 0;
        let result = block_on(all_series(&[1u32, 2], |x| {
            calls += 1;
            let x = *x;
            async move { Err::<(), _>(TestError::Failed(x)) }
        }));

        assert_eq!(calls, 1);
        assert_eq!(result, Err(TestError::Failed(1)));
    }

    #[test]
    fn any_series_stops_at_first_pass() {
        let mut calls = 0;
        let result = block_on(any_series(&[1u32, 2, 3], |x| {
            calls += 1;
            let x = *x;
            async move {
                if x < 2 { Err(TestError::Failed(x)) } else { Ok(()) }
            }
        }));

        assert_eq!(calls, 2);
        assert_eq!(result, Ok(()));
    }

    #[test]
    fn any_series_reports_last_error() {
        let mut calls = 0u32;
        let result = block_on(any_series(&[1u32, 2, 3], |_| {
            calls += 1;
            let n = calls;
            async move { Err::<(), _>(TestError::Failed(n)) }
        }));

        assert_eq!(calls, 3);
        assert_eq!(result, Err(TestError::Failed(3)));
    }

    #[test]
    fn empty_sequences_fail_without_checking() {
        let mut calls = 0;
        let items: [u32; 0] = [];

        let all = block_on(all_series(&items, |_| {
            calls += 1;
            async { Ok::<(), TestError>(()) }
        }));
        let any = block_on(any_series(&items, |_| {
            calls += 1;
            async { Ok::<(), TestError>(()) }
        }));

        assert_eq!(all, Err(TestError::Empty));
        assert_eq!(any, Err(TestError::Empty));
        assert_eq!(calls, 0);
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: AND visits items in order, up to and including the first
        /// failure, and reports that failure.
        #[test]
        fn all_series_matches_first_failure(
            outcomes in prop::collection::vec(any::<bool>(), 1..16)
        ) {
            let indexed: Vec<(u32, bool)> = outcomes.iter().copied().enumerate()
                .map(|(i, ok)| (i as u32, ok))
                .collect();
            let mut visited = Vec::new();
            let result = block_on(all_series(&indexed, |(i, ok)| {
                visited.push(*i);
                let (i, ok) = (*i, *ok);
                async move { if ok { Ok(()) } else { Err(TestError::Failed(i)) } }
            }));

            match outcomes.iter().position(|ok| !ok) {
                Some(first) => {
                    prop_assert_eq!(result, Err(TestError::Failed(first as u32)));
                    prop_assert_eq!(visited, (0..=first as u32).collect::<Vec<_>>());
                }
                None => {
                    prop_assert_eq!(result, Ok(()));
                    prop_assert_eq!(visited, (0..outcomes.len() as u32).collect::<Vec<_>>());
                }
            }
        }

        /// Property: OR stops at the first pass; if nothing passes it reports
        /// the last item's failure after visiting everything.
        #[test]
        fn any_series_matches_first_pass_or_last_failure(
            outcomes in prop::collection::vec(any::<bool>(), 1..16)
        ) {
            let indexed: Vec<(u32, bool)> = outcomes.iter().copied().enumerate()
                .map(|(i, ok)| (i as u32, ok))
                .collect();
            let mut visited = Vec::new();
            let result = block_on(any_series(&indexed, |(i, ok)| {
                visited.push(*i);
                let (i, ok) = (*i, *ok);
                async move { if ok { Ok(()) } else { Err(TestError::Failed(i)) } }
            }));

            match outcomes.iter().position(|ok| *ok) {
                Some(first) => {
                    prop_assert_eq!(result, Ok(()));
                    prop_assert_eq!(visited, (0..=first as u32).collect::<Vec<_>>());
                }
                None => {
                    let last = outcomes.len() as u32 - 1;
                    prop_assert_eq!(result, Err(TestError::Failed(last)));
                    prop_assert_eq!(visited, (0..=last).collect::<Vec<_>>());
                }
            }
        }
    }
}
