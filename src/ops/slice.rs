use core::cmp::Ordering;

/// Stable bottom-up merge sort over a comparator that may find no order
///
/// Stops at the first pair `cmp` returns [`None`] for and hands that pair back. `items` is left
/// in an unspecified permutation of itself on error.
pub fn try_merge_sort_by<T: Copy>(
    items: &mut Vec<T>,
    mut cmp: impl FnMut(&T, &T) -> Option<Ordering>,
) -> Result<(), (T, T)> {
    let len = items.len();
    let mut buf = items.clone();
    let mut width = 1;
    while width < len {
        let mut start = 0;
        while start < len {
            let mid = (start + width).min(len);
            let end = (start + 2 * width).min(len);
            let (mut i, mut j, mut k) = (start, mid, start);
            while i < mid && j < end {
                let (a, b) = (items[i], items[j]);
                let ordering = cmp(&a, &b).ok_or((a, b))?;
                if ordering == Ordering::Greater {
                    buf[k] = b;
                    j += 1;
                } else {
                    buf[k] = a;
                    i += 1;
                }
                k += 1;
            }
            // `k == j` once the left run is copied
            buf[k..k + (mid - i)].copy_from_slice(&items[i..mid]);
            buf[j..end].copy_from_slice(&items[j..end]);
            start = end;
        }
        core::mem::swap(items, &mut buf);
        width *= 2;
    }
    Ok(())
}
