// src/config.rs

//! Manages server configuration: the command-line flag surface and defaults.

use anyhow::{Result, anyhow, bail};
use std::path::PathBuf;

/// The address of the primary this instance replicates from, as given by
/// `--replicaof "HOST PORT"`. Accepted and reported, but replication itself
/// is not active.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplicaOf {
    pub host: String,
    pub port: u16,
}

/// The server's runtime configuration, fixed at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Directory holding the RDB snapshot file.
    pub dir: String,
    /// Filename of the RDB snapshot inside `dir`.
    pub dbfilename: String,
    /// TCP port to listen on.
    pub port: u16,
    pub replicaof: Option<ReplicaOf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dir: ".".to_string(),
            dbfilename: "dump.rdb".to_string(),
            port: 6379,
            replicaof: None,
        }
    }
}

impl Config {
    /// Parses the flag surface from an argument iterator (without argv[0]):
    /// `--dir PATH`, `--dbfilename NAME`, `--port N`, `--replicaof "HOST PORT"`.
    pub fn from_args<I>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = String>,
    {
        let mut config = Config::default();
        let mut args = args.into_iter();

        while let Some(flag) = args.next() {
            // A following token that is itself a flag does not count as a value.
            let mut value_for = |flag: &str| match args.next() {
                Some(value) if !value.starts_with("--") => Ok(value),
                _ => Err(anyhow!("{flag} flag requires a value")),
            };
            match flag.as_str() {
                "--dir" => config.dir = value_for("--dir")?,
                "--dbfilename" => config.dbfilename = value_for("--dbfilename")?,
                "--port" => {
                    let value = value_for("--port")?;
                    config.port = value
                        .parse()
                        .map_err(|_| anyhow!("invalid port number: {value}"))?;
                }
                "--replicaof" => {
                    let value = value_for("--replicaof")?;
                    let Some((host, port)) = value.split_once(' ') else {
                        bail!("--replicaof expects \"HOST PORT\"");
                    };
                    let port = port
                        .parse()
                        .map_err(|_| anyhow!("invalid replica port: {port}"))?;
                    config.replicaof = Some(ReplicaOf {
                        host: host.to_string(),
                        port,
                    });
                }
                other => bail!("unknown flag: {other}"),
            }
        }

        Ok(config)
    }

    /// The full path of the RDB snapshot file.
    pub fn rdb_path(&self) -> PathBuf {
        PathBuf::from(&self.dir).join(&self.dbfilename)
    }
}
