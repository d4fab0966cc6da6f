use anyhow::{Context, bail};
use clap::Parser;
use flurry_proto::{
    flurry::SnowflakeId as _,
    types::{DEFAULT_PORT, SnowflakeId, SnowflakeIdTy},
};
use serde::Deserialize;
use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    path::{Path, PathBuf},
};

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

/// Command-line arguments for the `flurryd` binary.
///
/// Every option can also be supplied through an environment variable (or a
/// `.env` file). Options that may come from the config file have no clap
/// default, so an explicit value can be told apart from an absent one.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "flurryd",
    version,
    about = "A TCP daemon issuing time-ordered 64-bit IDs"
)]
pub struct CliArgs {
    /// Machine ID stamped into every issued ID (0..=32767).
    ///
    /// Must be unique across every daemon sharing an ID namespace. Required,
    /// either here or in the config file.
    ///
    /// Environment variable: `MACHINE_ID`
    #[arg(short = 'm', long, env = "MACHINE_ID")]
    pub machine_id: Option<u32>,

    /// TCP port to listen on. Defaults to 23138.
    ///
    /// Environment variable: `PORT`
    #[arg(short, long, env = "PORT")]
    pub port: Option<u16>,

    /// Address to bind. Defaults to 0.0.0.0.
    ///
    /// Environment variable: `BIND_ADDR`
    #[arg(long, env = "BIND_ADDR")]
    pub bind: Option<IpAddr>,

    /// Path to a TOML config file with `machine_id`, `port` and `bind` keys.
    /// Values given on the command line take precedence.
    ///
    /// Environment variable: `CONFIG_FILE`
    #[arg(short = 'f', long = "config", env = "CONFIG_FILE")]
    pub config: Option<PathBuf>,

    /// Detach from the terminal and run in the background.
    #[arg(short, long, default_value_t = false)]
    pub daemonize: bool,

    /// PID file locked while running daemonized.
    ///
    /// Environment variable: `PID_FILE`
    #[arg(long, env = "PID_FILE", default_value = "/var/run/flurryd.pid")]
    pub pid_file: PathBuf,

    /// Log filter used when `RUST_LOG` is not set.
    ///
    /// Environment variable: `LOG_FILTER`
    #[arg(long, env = "LOG_FILTER", default_value = "info")]
    pub log_filter: String,

    /// Log output format.
    ///
    /// Environment variable: `LOG_FORMAT`
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

/// Settings read from the `--config` file. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(alias = "machine")]
    pub machine_id: Option<u32>,
    pub port: Option<u16>,
    pub bind: Option<IpAddr>,
}

impl FileConfig {
    /// Loads a TOML config file. A missing or unparsable file is an error.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        config::Config::builder()
            .add_source(
                config::File::from(path)
                    .format(config::FileFormat::Toml)
                    .required(true),
            )
            .build()
            .and_then(|config| config.try_deserialize())
            .with_context(|| format!("failed to load config file {}", path.display()))
    }
}

/// Validated, immutable daemon configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub machine_id: SnowflakeIdTy,
    pub addr: SocketAddr,
    pub daemonize: bool,
    pub pid_file: PathBuf,
    pub log_filter: String,
    pub log_format: LogFormat,
}

impl TryFrom<CliArgs> for ServerConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        let file = match &args.config {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::default(),
        };

        let Some(machine_id) = args.machine_id.or(file.machine_id) else {
            bail!("MACHINE_ID is required (pass --machine-id or set it in the config file)");
        };

        let max_machine_id = SnowflakeId::max_machine_id();
        if u64::from(machine_id) > max_machine_id {
            bail!("MACHINE_ID ({machine_id}) exceeds the machine ID space (max = {max_machine_id})");
        }

        let port = args.port.or(file.port).unwrap_or(DEFAULT_PORT);
        let bind = args
            .bind
            .or(file.bind)
            .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));

        Ok(Self {
            machine_id: SnowflakeIdTy::from(machine_id),
            addr: SocketAddr::new(bind, port),
            daemonize: args.daemonize,
            pid_file: args.pid_file,
            log_filter: args.log_filter,
            log_format: args.log_format,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn parse(argv: &[&str]) -> anyhow::Result<ServerConfig> {
        let args = CliArgs::try_parse_from(core::iter::once("flurryd").chain(argv.iter().copied()))?;
        ServerConfig::try_from(args)
    }

    fn config_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn defaults_apply_when_only_machine_id_given() {
        let config = parse(&["-m", "1"]).unwrap();
        assert_eq!(config.machine_id, 1);
        assert_eq!(config.addr, "0.0.0.0:23138".parse().unwrap());
        assert!(!config.daemonize);
        assert_eq!(config.pid_file, PathBuf::from("/var/run/flurryd.pid"));
        assert_eq!(config.log_format, LogFormat::Text);
    }

    #[test]
    fn machine_id_upper_bound() {
        assert_eq!(parse(&["-m", "32767"]).unwrap().machine_id, 32767);

        let err = parse(&["-m", "32768"]).unwrap_err();
        assert!(err.to_string().contains("32768"), "{err}");
    }

    #[test]
    fn missing_machine_id_is_fatal() {
        let err = parse(&["-p", "9000"]).unwrap_err();
        assert!(err.to_string().contains("MACHINE_ID is required"), "{err}");
    }

    #[test]
    fn file_values_fill_in_missing_flags() {
        let file = config_file("machine_id = 7\nport = 9000\nbind = \"127.0.0.1\"\n");
        let path = file.path().to_str().unwrap();

        let config = parse(&["-f", path]).unwrap();
        assert_eq!(config.machine_id, 7);
        assert_eq!(config.addr, "127.0.0.1:9000".parse().unwrap());
    }

    #[test]
    fn flags_override_file_values() {
        let file = config_file("machine = 7\nport = 9000\n");
        let path = file.path().to_str().unwrap();

        let config = parse(&["-f", path, "-m", "8", "--port", "9100"]).unwrap();
        assert_eq!(config.machine_id, 8);
        assert_eq!(config.addr.port(), 9100);
    }

    #[test]
    fn file_machine_id_is_validated() {
        let file = config_file("machine_id = 40000\n");
        let path = file.path().to_str().unwrap();

        assert!(parse(&["-f", path]).is_err());
    }

    #[test]
    fn unreadable_config_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.toml");

        let err = parse(&["-m", "1", "-f", missing.to_str().unwrap()]).unwrap_err();
        assert!(err.to_string().contains("failed to load config file"), "{err}");
    }

    #[test]
    fn malformed_config_file_is_fatal() {
        let file = config_file("port = \"not a port\"\n");
        let path = file.path().to_str().unwrap();

        assert!(parse(&["-m", "1", "-f", path]).is_err());
    }
}
