//! Trending hashtag ranking

use crate::model::{HashtagAggregate, ScoredItem, TrendLabel, TrendingTag};
use crate::scoring::{TrendWeights, format_count};

/// Default number of trending tags shown
pub const DEFAULT_TREND_LIMIT: usize = 4;

/// Stateless hashtag trend ranker
#[derive(Debug, Clone)]
pub struct TrendRanker {
    weights: TrendWeights,
    limit: usize,
}

impl Default for TrendRanker {
    fn default() -> Self {
        Self::new(TrendWeights::default(), DEFAULT_TREND_LIMIT)
    }
}

impl TrendRanker {
    pub fn new(weights: TrendWeights, limit: usize) -> Self {
        Self { weights, limit }
    }

    pub fn score(&self, aggregate: &HashtagAggregate) -> f64 {
        aggregate.count as f64 * self.weights.count_multiplier
    }

    /// Label for a 1-based `rank`; the first matching rule wins
    pub fn label(&self, rank: usize, count: u64) -> TrendLabel {
        if rank == 1 {
            TrendLabel::Worldwide
        } else if count >= self.weights.high_volume_threshold {
            TrendLabel::Technology
        } else if count >= self.weights.network_threshold {
            TrendLabel::Network
        } else {
            TrendLabel::Trending
        }
    }

    /// Top tags by descending score, ties in input order
    pub fn rank(&self, aggregates: Vec<HashtagAggregate>) -> Vec<TrendingTag> {
        let mut scored: Vec<ScoredItem<HashtagAggregate>> = aggregates
            .into_iter()
            .map(|agg| {
                let score = self.score(&agg);
                ScoredItem { item: agg, score }
            })
            .collect();

        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(self.limit);

        scored
            .into_iter()
            .enumerate()
            .map(|(index, scored)| {
                let rank = index + 1;
                let count = scored.item.count;
                TrendingTag {
                    label: self.label(rank, count),
                    display_count: format_count(count),
                    tag: scored.item.tag,
                    count,
                    score: scored.score,
                    rank,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agg(tag: &str, count: u64) -> HashtagAggregate {
        HashtagAggregate {
            tag: tag.to_string(),
            count,
            post_ids: (0..count).map(|i| format!("{}-{}", tag, i)).collect(),
        }
    }

    #[test]
    fn test_top_four_by_count() {
        let ranked = TrendRanker::default().rank(vec![
            agg("python", 50),
            agg("rust", 200),
            agg("go", 10),
            agg("js", 5),
            agg("ts", 1),
        ]);

        let tags: Vec<_> = ranked.iter().map(|t| t.tag.as_str()).collect();
        assert_eq!(tags, vec!["rust", "python", "go", "js"]);
        assert_eq!(ranked[0].score, 300.0);
        assert_eq!(
            ranked.iter().map(|t| t.rank).collect::<Vec<_>>(),
            vec![1, 2, 3, 4]
        );
    }

    #[test]
    fn test_labels() {
        let ranked = TrendRanker::default().rank(vec![
            agg("a", 5_000),
            agg("b", 1_500),
            agg("c", 150),
            agg("d", 20),
        ]);

        assert_eq!(ranked[0].label, TrendLabel::Worldwide);
        assert_eq!(ranked[1].label, TrendLabel::Technology);
        assert_eq!(ranked[2].label, TrendLabel::Network);
        assert_eq!(ranked[3].label, TrendLabel::Trending);
        assert_eq!(ranked[0].display_count, "5.0K");
        assert_eq!(ranked[3].display_count, "20");
    }

    #[test]
    fn test_rank_one_wins_over_count_rules() {
        let ranked = TrendRanker::default().rank(vec![agg("tiny", 1)]);
        assert_eq!(ranked[0].label, TrendLabel::Worldwide);
        assert_eq!(ranked[0].label.as_str(), "Trending Worldwide");
    }

    #[test]
    fn test_ties_keep_input_order() {
        let ranked =
            TrendRanker::default().rank(vec![agg("x", 3), agg("y", 3), agg("z", 3)]);
        let tags: Vec<_> = ranked.iter().map(|t| t.tag.as_str()).collect();
        assert_eq!(tags, vec!["x", "y", "z"]);
    }

    #[test]
    fn test_never_more_than_limit_and_sorted() {
        let aggregates: Vec<_> = (0..20).map(|i| agg(&format!("t{}", i), i)).collect();
        let ranked = TrendRanker::default().rank(aggregates);
        assert_eq!(ranked.len(), 4);
        assert!(ranked.windows(2).all(|w| w[0].count >= w[1].count));
    }

    #[test]
    fn test_empty_input() {
        assert!(TrendRanker::default().rank(vec![]).is_empty());
    }
}
