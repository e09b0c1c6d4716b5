use futures::future::try_join_all;
use std::future::Future;

/// Awaits every future concurrently, returning the results in input order.
///
/// The first error wins: the remaining futures are dropped and the error is
/// returned as is.
pub async fn parallel<I, Fut, T, E>(futures: I) -> Result<Vec<T>, E>
where
    I: IntoIterator<Item = Fut>,
    Fut: Future<Output = Result<T, E>>,
{
    try_join_all(futures).await
}

/// Maps `items` through an async `mapper`, one at a time or all at once.
pub async fn async_map<I, F, Fut, T, U, E>(
    items: I,
    mut mapper: F,
    run_in_parallel: bool,
) -> Result<Vec<U>, E>
where
    I: IntoIterator<Item = T>,
    F: FnMut(T) -> Fut,
    Fut: Future<Output = Result<U, E>>,
{
    if run_in_parallel {
        return parallel(items.into_iter().map(mapper)).await;
    }

    let items = items.into_iter();
    let mut mapped = Vec::with_capacity(items.size_hint().0);
    for item in items {
        mapped.push(mapper(item).await?);
    }
    Ok(mapped)
}

/// Keeps the items whose async `predicate` resolves to `true`, in input order.
///
/// The predicate borrows each item only long enough to build its future, so
/// the future must own whatever it needs from the item.
pub async fn async_filter<I, F, Fut, T, E>(
    items: I,
    mut predicate: F,
    run_in_parallel: bool,
) -> Result<Vec<T>, E>
where
    I: IntoIterator<Item = T>,
    F: FnMut(&T) -> Fut,
    Fut: Future<Output = Result<bool, E>>,
{
    let items: Vec<T> = items.into_iter().collect();

    if run_in_parallel {
        let keep = parallel(items.iter().map(&mut predicate)).await?;
        return Ok(items
            .into_iter()
            .zip(keep)
            .filter_map(|(item, keep)| keep.then_some(item))
            .collect());
    }

    let mut kept = Vec::new();
    for item in items {
        if predicate(&item).await? {
            kept.push(item);
        }
    }
    Ok(kept)
}
