//! Top-K candidate tracking for pre-suppression capping.

use crate::candidate::{ranked_cmp_desc, sort_ranked_desc, Ranked};
use std::cmp::Ordering;

/// Top-K container with O(k) insertion cost.
pub(crate) struct TopK<T> {
    k: usize,
    items: Vec<T>,
}

impl TopK<Ranked> {
    /// Creates a new Top-K collector.
    pub fn new(k: usize) -> Self {
        Self {
            k,
            items: Vec::with_capacity(k),
        }
    }

    /// Pushes a candidate, evicting the worst-ranked one if at capacity.
    pub fn push(&mut self, item: Ranked) {
        if self.k == 0 {
            return;
        }
        if self.items.len() < self.k {
            self.items.push(item);
            return;
        }

        let mut worst_idx = 0usize;
        for (idx, current) in self.items.iter().enumerate().skip(1) {
            if ranked_cmp_desc(current, &self.items[worst_idx]) == Ordering::Greater {
                worst_idx = idx;
            }
        }

        if ranked_cmp_desc(&item, &self.items[worst_idx]) == Ordering::Less {
            self.items[worst_idx] = item;
        }
    }

    /// Returns retained candidates sorted best-first.
    #[cfg(test)]
    pub fn into_sorted_desc(mut self) -> Vec<Ranked> {
        sort_ranked_desc(&mut self.items);
        self.items
    }

    /// Returns retained candidates in ascending source-index order.
    pub fn into_source_order(mut self) -> Vec<Ranked> {
        self.items.sort_by_key(|item| item.index);
        self.items
    }
}

/// Keeps the `k` best detections and restores their source order.
pub(crate) fn cap_in_source_order(items: Vec<Ranked>, k: usize) -> Vec<Ranked> {
    if items.len() <= k {
        return items;
    }
    if k.saturating_mul(8) >= items.len() {
        let mut items = items;
        sort_ranked_desc(&mut items);
        items.truncate(k);
        items.sort_by_key(|item| item.index);
        return items;
    }
    let mut topk = TopK::new(k);
    for item in items {
        topk.push(item);
    }
    topk.into_source_order()
}

#[cfg(test)]
mod tests {
    use super::{cap_in_source_order, TopK};
    use crate::candidate::{Detection, Ranked};
    use crate::geometry::CornerBox;

    fn ranked(index: usize, score: f32) -> Ranked {
        Ranked {
            index,
            detection: Detection {
                bbox: CornerBox {
                    x1: 0.0,
                    y1: 0.0,
                    x2: 1.0,
                    y2: 1.0,
                },
                score,
                class_id: 0,
            },
        }
    }

    #[test]
    fn topk_keeps_best_with_index_tiebreak() {
        let mut topk = TopK::new(2);
        for (i, s) in [0.3f32, 0.9, 0.5, 0.9].into_iter().enumerate() {
            topk.push(ranked(i, s));
        }
        let kept: Vec<usize> = topk.into_sorted_desc().iter().map(|r| r.index).collect();
        assert_eq!(kept, vec![1, 3]);
    }

    #[test]
    fn topk_zero_keeps_nothing() {
        let mut topk = TopK::new(0);
        topk.push(ranked(0, 1.0));
        assert!(topk.into_source_order().is_empty());
    }

    #[test]
    fn cap_restores_source_order_on_both_paths() {
        let scores = [0.1f32, 0.8, 0.2, 0.7, 0.6, 0.05, 0.3, 0.9, 0.4, 0.15];
        let items: Vec<Ranked> = scores.iter().enumerate().map(|(i, &s)| ranked(i, s)).collect();

        let small: Vec<usize> = cap_in_source_order(items.clone(), 1)
            .iter()
            .map(|r| r.index)
            .collect();
        assert_eq!(small, vec![7]);

        let large: Vec<usize> = cap_in_source_order(items, 3)
            .iter()
            .map(|r| r.index)
            .collect();
        assert_eq!(large, vec![1, 3, 7]);
    }
}
