//! Capped k-subset enumeration.

/// At most `cap` k-subsets of `items`, in lexicographic index order.
///
/// The cap is part of the contract: callers rely on the output never exceeding
/// it, and on the order being the plain generation order (first index varies
/// slowest). `k == 0` or `k > items.len()` yields nothing.
pub fn combinations<T: Copy>(items: &[T], k: usize, cap: usize) -> Vec<Vec<T>> {
    let n = items.len();
    let mut out = Vec::new();
    if k == 0 || k > n || cap == 0 {
        return out;
    }
    let mut idx: Vec<usize> = (0..k).collect();
    loop {
        out.push(idx.iter().map(|&i| items[i]).collect());
        if out.len() >= cap {
            break;
        }
        // Rightmost index that can still advance.
        let Some(pos) = (0..k).rev().find(|&p| idx[p] < n - k + p) else {
            break;
        };
        idx[pos] += 1;
        for j in pos + 1..k {
            idx[j] = idx[j - 1] + 1;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_subsets_when_uncapped() {
        let c = combinations(&[1, 2, 3, 4, 5], 3, 1000);
        assert_eq!(c.len(), 10);
        assert_eq!(c[0], vec![1, 2, 3]);
        assert_eq!(c[9], vec![3, 4, 5]);
    }

    #[test]
    fn cap_is_respected_in_generation_order() {
        let items: Vec<u32> = (0..30).collect();
        let c = combinations(&items, 5, 1000);
        assert_eq!(c.len(), 1000);
        assert_eq!(c[0], vec![0, 1, 2, 3, 4]);
        assert_eq!(c[1], vec![0, 1, 2, 3, 5]);
        let uncapped_prefix = &combinations(&items[..12], 5, usize::MAX)[..8];
        assert_eq!(&c[..8], uncapped_prefix);
    }

    #[test]
    fn degenerate_requests() {
        assert!(combinations(&[1, 2], 3, 10).is_empty());
        assert!(combinations(&[1, 2], 0, 10).is_empty());
        assert!(combinations::<u8>(&[], 1, 10).is_empty());
        assert_eq!(combinations(&[7], 1, 10), vec![vec![7]]);
    }
}
