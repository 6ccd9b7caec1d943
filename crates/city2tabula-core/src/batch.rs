/// Splits `ids` into fixed-size chunks (spec §4.6). When `size > 0` and `ids` is
/// non-empty, the returned batches concatenate back to `ids` in order, with every
/// batch except possibly the last having exactly `size` elements. When `size <= 0`,
/// returns a single batch containing all of `ids`. An empty `ids` always returns no
/// batches at all.
pub fn create_batches(ids: &[i64], size: i64) -> Vec<Vec<i64>> {
    if ids.is_empty() {
        return Vec::new();
    }
    if size <= 0 {
        return vec![ids.to_vec()];
    }

    ids.chunks(size as usize).map(|chunk| chunk.to_vec()).collect()
}
