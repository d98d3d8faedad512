use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "stowage")]
#[command(about = "Pluggable file storage: local, S3, MinIO, SFTP and WebDAV", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(long, global = true, env = "STOWAGE_CONFIG", default_value = "stowage.toml")]
    pub config: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the configured backends
    Backends,

    /// List the entries directly under a prefix
    List {
        /// Backend name (LOCAL, S3, MINIO, SFTP, WEBDAV)
        backend: String,

        /// Folder to list; the root when omitted
        #[arg(default_value = "/")]
        prefix: String,

        /// Print the listing as JSON
        #[arg(long)]
        json: bool,
    },

    /// Store a local file under a folder
    Put {
        backend: String,

        /// Local file to send
        file: PathBuf,

        /// Destination folder; the root when omitted
        #[arg(default_value = "")]
        folder: String,
    },

    /// Download keys into a local directory
    Get {
        backend: String,

        /// Existing local directory
        destination: PathBuf,

        #[arg(required = true)]
        keys: Vec<String>,
    },

    /// Delete keys, stopping at the first failure
    Delete {
        backend: String,

        #[arg(required = true)]
        keys: Vec<String>,
    },
}

impl Commands {
    /// Commands whose stdout is meant for other programs
    pub fn is_machine_readable(&self) -> bool {
        matches!(self, Commands::List { json: true, .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parsing() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_list_defaults_to_root() {
        let cli = Cli::try_parse_from(["stowage", "list", "local"]).unwrap();

        match cli.command {
            Commands::List { backend, prefix, json } => {
                assert_eq!(backend, "local");
                assert_eq!(prefix, "/");
                assert!(!json);
            }
            _ => panic!("expected list"),
        }
    }

    #[test]
    fn test_json_listing_is_machine_readable() {
        let cli = Cli::try_parse_from(["stowage", "--config", "alt.toml", "list", "S3", "photos", "--json"]).unwrap();

        assert_eq!(cli.config, "alt.toml");
        assert!(cli.command.is_machine_readable());
    }

    #[test]
    fn test_delete_requires_keys() {
        assert!(Cli::try_parse_from(["stowage", "delete", "LOCAL"]).is_err());

        let cli = Cli::try_parse_from(["stowage", "delete", "LOCAL", "a.txt", "b.txt"]).unwrap();
        match cli.command {
            Commands::Delete { keys, .. } => assert_eq!(keys, vec!["a.txt", "b.txt"]),
            _ => panic!("expected delete"),
        }
    }
}
