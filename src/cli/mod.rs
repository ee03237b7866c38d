//! Command-line interface definitions for the `occi-storage` binary.
//!
//! This module only depends on clap so the build script can reuse it when
//! generating the manual page.

use clap::{Parser, Subcommand};

/// Top-level CLI for the `occi-storage` binary.
#[derive(Debug, Parser)]
#[command(
    name = "occi-storage",
    about = "Drive OCCI storage resources and storage links against OpenStack",
    arg_required_else_help = true
)]
pub(crate) enum Cli {
    /// Manage storage resources (volumes).
    #[command(subcommand)]
    Storage(StorageCommand),
    /// Manage storage links (volume attachments).
    #[command(subcommand)]
    Link(LinkCommand),
}

/// Storage resource operations.
#[derive(Debug, Subcommand)]
pub(crate) enum StorageCommand {
    /// Create a volume.
    Create {
        /// Size in GiB (`occi.storage.size`).
        #[arg(long)]
        size: String,
        /// Display name (`occi.core.title`); a random name is used when absent.
        #[arg(long)]
        title: Option<String>,
    },
    /// Show the current state of a volume.
    Show {
        /// Volume identifier (`occi.core.id`).
        id: String,
    },
    /// Apply a title or summary change to the rendered attributes.
    ///
    /// The change is local to the rendered resource; the platform is not
    /// modified.
    Update {
        /// Volume identifier (`occi.core.id`).
        id: String,
        /// New title.
        #[arg(long)]
        title: Option<String>,
        /// New summary (only applied together with --title).
        #[arg(long)]
        summary: Option<String>,
    },
    /// Delete a volume.
    Delete {
        /// Volume identifier (`occi.core.id`).
        id: String,
    },
    /// Run an action (online, offline, backup, snapshot, resize).
    Action {
        /// Volume identifier (`occi.core.id`).
        id: String,
        /// Action term or full action type identifier.
        action: String,
        /// Summary used as the snapshot description.
        #[arg(long)]
        summary: Option<String>,
    },
}

/// Storage link operations.
#[derive(Debug, Subcommand)]
pub(crate) enum LinkCommand {
    /// Attach a volume to a compute instance.
    Create {
        /// Compute instance identifier (link source).
        #[arg(long)]
        instance: String,
        /// Volume identifier (link target).
        #[arg(long)]
        volume: String,
        /// Requested device name (`occi.storagelink.deviceid`).
        #[arg(long)]
        device: Option<String>,
    },
    /// Detach a volume from a compute instance.
    Delete {
        /// Compute instance identifier (link source).
        #[arg(long)]
        instance: String,
        /// Volume identifier (link target).
        #[arg(long)]
        volume: String,
    },
}
