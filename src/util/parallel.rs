use rayon::prelude::*;

/// Maps `func` over `items` on a thread pool bounded to `jobs` workers.
/// Runs on the current thread when `jobs` is not greater than one or the
/// pool cannot be built.
pub fn map_bounded<T, R, F>(items: Vec<T>, jobs: usize, func: F) -> Vec<R>
where
    T: Send,
    R: Send,
    F: Fn(T) -> R + Send + Sync,
{
    if jobs > 1 {
        if let Ok(pool) = rayon::ThreadPoolBuilder::new().num_threads(jobs).build() {
            return pool.install(|| items.into_par_iter().map(func).collect());
        }
    }
    items.into_iter().map(func).collect()
}

#[cfg(test)]
mod tests {
    use crate::util::parallel::map_bounded;

    #[test]
    fn preserves_item_order() {
        let doubled = map_bounded((0..64).collect(), 4, |n: i32| n * 2);
        assert_eq!(doubled, (0..64).map(|n| n * 2).collect::<Vec<_>>());
    }

    #[test]
    fn single_job_runs_inline() {
        let squared = map_bounded(vec![1, 2, 3], 1, |n: i32| n * n);
        assert_eq!(squared, vec![1, 4, 9]);
    }
}
