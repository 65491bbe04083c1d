//! Application use cases / business logic

pub mod aggregates;
pub mod feed;
pub mod graph;
pub mod post_rank;
pub mod posts;
pub mod trend_rank;

pub use aggregates::{apply_delta, apply_plan, plan_create, plan_delete, plan_edit};
pub use feed::{FeedConfig, FeedService};
pub use graph::{GraphService, GraphView};
pub use post_rank::{DEFAULT_FEED_LIMIT, PostRanker};
pub use posts::PostService;
pub use trend_rank::{DEFAULT_TREND_LIMIT, TrendRanker};
