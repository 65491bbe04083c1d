//! CLI argument definitions

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// feedrank: rank social feeds and trending hashtags over a post snapshot
#[derive(Parser, Debug)]
#[command(name = "feedrank")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show a ranked or filtered feed for a viewer
    Feed(FeedArgs),

    /// Show trending hashtags
    Trending(TrendingArgs),

    /// Create, edit, delete and engage with posts
    Post(PostArgs),

    /// Follow, unfollow, block and inspect the social graph
    Graph(GraphArgs),

    /// Configuration management
    Config(ConfigArgs),

    /// Validate configuration and show status
    Doctor(DoctorArgs),
}

/// Which feed view to compute
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FeedKind {
    /// Personalized ranking
    Smart,
    /// Newest posts first
    Latest,
    /// Most liked posts
    Explore,
    /// Posts carrying --tag
    Hashtag,
    /// Posts written by --user (defaults to the viewer)
    Profile,
    /// The viewer's bookmarks
    Bookmarks,
}

#[derive(Args, Debug)]
pub struct FeedArgs {
    /// User the feed is computed for
    #[arg(long)]
    pub viewer: String,

    /// Feed view
    #[arg(long, value_enum, default_value_t = FeedKind::Smart)]
    pub kind: FeedKind,

    /// Hashtag for --kind hashtag (with or without #)
    #[arg(long)]
    pub tag: Option<String>,

    /// Author for --kind profile
    #[arg(long)]
    pub user: Option<String>,

    /// Include ranking scores (smart feed only)
    #[arg(long)]
    pub scores: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct TrendingArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct PostArgs {
    #[command(subcommand)]
    pub command: PostCommands,
}

#[derive(Subcommand, Debug)]
pub enum PostCommands {
    /// Create a post
    Create {
        /// Author user ID
        #[arg(long)]
        author: String,

        /// Author display name
        #[arg(long)]
        name: Option<String>,

        /// Post text
        #[arg(long)]
        text: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Replace the text of your post
    Edit {
        #[arg(long)]
        viewer: String,

        /// Post ID
        #[arg(long)]
        id: String,

        /// New post text
        #[arg(long)]
        text: String,
    },

    /// Delete your post
    Delete {
        #[arg(long)]
        viewer: String,

        /// Post ID
        #[arg(long)]
        id: String,
    },

    /// Toggle a like
    Like {
        #[arg(long)]
        viewer: String,

        /// Post ID
        #[arg(long)]
        id: String,
    },

    /// Toggle a retweet
    Retweet {
        #[arg(long)]
        viewer: String,

        /// Post ID
        #[arg(long)]
        id: String,
    },

    /// Toggle a bookmark
    Bookmark {
        #[arg(long)]
        viewer: String,

        /// Post ID
        #[arg(long)]
        id: String,
    },

    /// Comment on a post
    Comment {
        #[arg(long)]
        viewer: String,

        /// Post ID
        #[arg(long)]
        id: String,

        /// Comment text
        #[arg(long)]
        text: String,
    },
}

#[derive(Args, Debug)]
pub struct GraphArgs {
    #[command(subcommand)]
    pub command: GraphCommands,
}

#[derive(Subcommand, Debug)]
pub enum GraphCommands {
    /// Follow a user
    Follow {
        #[arg(long)]
        viewer: String,

        #[arg(long)]
        target: String,
    },

    /// Stop following a user
    Unfollow {
        #[arg(long)]
        viewer: String,

        #[arg(long)]
        target: String,
    },

    /// Block a user (also unfollows them)
    Block {
        #[arg(long)]
        viewer: String,

        #[arg(long)]
        target: String,
    },

    /// Unblock a user
    Unblock {
        #[arg(long)]
        viewer: String,

        #[arg(long)]
        target: String,
    },

    /// Show who a user follows and who follows them
    Show {
        #[arg(long)]
        user: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Generate example configuration file
    Init {
        /// Path to write config file
        #[arg(long, default_value = "./feedrank.toml")]
        path: PathBuf,

        /// Overwrite existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the effective configuration
    Show,
}

#[derive(Args, Debug)]
pub struct DoctorArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}
