//! Command line arguments.

use anyhow::{bail, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;
use sync_types::{Anchor, Narrow, UserId};

/// realm-sync: bootstrap a realm session and page through message history.
#[derive(Parser, Debug)]
#[command(name = "realm-sync")]
#[command(about = "Bootstrap a realm session and page through message history")]
pub struct Args {
    /// Realm base URL (overrides the config file).
    #[arg(long, env = "REALM_SYNC_REALM_URL")]
    pub realm: Option<String>,

    /// Login email.
    #[arg(long, env = "REALM_SYNC_EMAIL")]
    pub email: String,

    /// API key for the login email.
    #[arg(long, env = "REALM_SYNC_API_KEY", hide_env_values = true)]
    pub api_key: String,

    /// Directory holding config.json and logs (default ~/.realm-sync).
    #[arg(long, env = "REALM_SYNC_HOME")]
    pub base_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Register a session and print every emitted signal.
    Bootstrap,
    /// Bootstrap, then open a narrow around an anchor.
    Fetch {
        #[command(flatten)]
        narrow: NarrowArgs,
        /// Message id, or one of newest, oldest, first_unread.
        #[arg(long, default_value = "first_unread", value_parser = parse_anchor)]
        anchor: Anchor,
    },
    /// Bootstrap, open a narrow at the newest message, then page older once.
    Older {
        #[command(flatten)]
        narrow: NarrowArgs,
    },
    /// Upload a file and queue a message linking to it.
    Upload {
        #[command(flatten)]
        narrow: NarrowArgs,
        /// Local file to upload.
        path: PathBuf,
        /// Name shown in the message (defaults to the file name).
        #[arg(long)]
        name: Option<String>,
    },
}

/// Selects the narrow a command works on. Without flags, all messages.
#[derive(ClapArgs, Debug, Default, Clone)]
pub struct NarrowArgs {
    #[arg(long)]
    pub stream: Option<String>,
    /// Topic within --stream.
    #[arg(long, requires = "stream")]
    pub topic: Option<String>,
    /// Comma-separated user ids of a private conversation.
    #[arg(long, value_delimiter = ',', conflicts_with = "stream")]
    pub pm_with: Vec<UserId>,
    /// All private messages.
    #[arg(long, conflicts_with_all = ["stream", "pm_with"])]
    pub private: bool,
    #[arg(long)]
    pub starred: bool,
    #[arg(long)]
    pub mentioned: bool,
    #[arg(long)]
    pub search: Option<String>,
}

impl NarrowArgs {
    pub fn to_narrow(&self) -> Result<Narrow> {
        let flags = [
            self.stream.is_some(),
            !self.pm_with.is_empty(),
            self.private,
            self.starred,
            self.mentioned,
            self.search.is_some(),
        ];
        if flags.iter().filter(|set| **set).count() > 1 {
            bail!("choose at most one of --stream, --pm-with, --private, --starred, --mentioned, --search");
        }

        let narrow = match (&self.stream, &self.topic) {
            (Some(stream), Some(topic)) => Narrow::topic(stream.clone(), topic.clone()),
            (Some(stream), None) => Narrow::stream(stream.clone()),
            (None, Some(_)) => bail!("--topic requires --stream"),
            (None, None) if !self.pm_with.is_empty() => {
                Narrow::private_with(self.pm_with.iter().copied())
            }
            (None, None) if self.private => Narrow::AllPrivateMessages,
            (None, None) if self.starred => Narrow::Starred,
            (None, None) if self.mentioned => Narrow::Mentioned,
            (None, None) => match &self.search {
                Some(query) => Narrow::Search {
                    query: query.clone(),
                },
                None => Narrow::AllMessages,
            },
        };
        Ok(narrow)
    }
}

pub fn parse_anchor(raw: &str) -> Result<Anchor, String> {
    match raw {
        "newest" => Ok(Anchor::Newest),
        "oldest" => Ok(Anchor::Oldest),
        "first_unread" => Ok(Anchor::FirstUnread),
        other => other
            .parse()
            .map(Anchor::Message)
            .map_err(|_| format!("expected a message id or newest/oldest/first_unread, got {other:?}")),
    }
}
