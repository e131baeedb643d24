use chrono::Weekday;
use chrono_tz::Tz;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Site Health Monitor: samples a site's health signals and mails a weekly digest.
#[derive(Parser, Debug, Clone)]
#[command(name = "site-health-monitor")]
pub struct CliArgs {
    /// Base URL of the monitored site (also the origin for the broken-link scan)
    #[arg(short = 'u', long = "site-url")]
    pub site_url: String,

    /// Display name used in email subjects
    #[arg(short = 'n', long = "site-name", default_value = "My Site")]
    pub site_name: String,

    /// Install directory of the monitored site
    #[arg(short = 'r', long = "site-root", default_value = ".")]
    pub site_root: PathBuf,

    /// Critical file to watch for drift (repeatable, relative to --site-root)
    #[arg(short = 'w', long = "watch")]
    pub watch: Vec<PathBuf>,

    /// JSON facts exported by the hosting platform
    #[arg(short = 'f', long = "facts-file")]
    pub facts_file: Option<PathBuf>,

    /// Report commerce signals from the facts file
    #[arg(long = "commerce")]
    pub commerce: bool,

    /// SQLite file holding persisted monitor state
    #[arg(long = "state-db")]
    pub state_db: Option<PathBuf>,

    /// Address used when the recipient list is empty
    #[arg(long = "default-recipient", default_value = DEFAULT_RECIPIENT)]
    pub default_recipient: String,

    /// HTTP mail relay endpoint; mail goes to the outbox directory when unset
    #[arg(long = "mail-relay")]
    pub mail_relay: Option<String>,

    /// Bearer token for the mail relay
    #[arg(long = "mail-relay-token")]
    pub mail_relay_token: Option<String>,

    /// Directory receiving .eml files when no relay is configured
    #[arg(long = "outbox-dir")]
    pub outbox_dir: Option<PathBuf>,

    /// IANA time zone for the weekly gate (defaults to the host zone)
    #[arg(long = "timezone")]
    pub timezone: Option<String>,

    /// First day of the reporting week
    #[arg(long = "week-start", default_value = "sunday", value_parser = parse_weekday)]
    pub week_start: Weekday,

    /// Timeout applied to each outbound probe
    #[arg(long = "probe-timeout-secs", default_value_t = DEFAULT_PROBE_TIMEOUT_SECS)]
    pub probe_timeout_secs: u64,

    /// How often the weekly delivery gate is evaluated
    #[arg(long = "trigger-interval-secs", default_value_t = DEFAULT_TRIGGER_INTERVAL_SECS)]
    pub trigger_interval_secs: u64,

    /// Monitor HTTP port
    #[arg(long = "port", default_value_t = DEFAULT_MONITOR_PORT)]
    pub port: u16,

    /// Directory for a daily rolling log file
    #[arg(short = 'l', long = "log-dir")]
    pub log_dir: Option<PathBuf>,
}

/// Where weekly boundaries are computed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScheduleZone {
    Local,
    Named(Tz),
}

#[derive(Debug, Clone)]
pub enum MailConfig {
    Relay { endpoint: Url, token: Option<String> },
    Outbox { dir: PathBuf },
}

#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub site_url: String,
    pub site_name: String,
    pub site_root: PathBuf,
    pub watched_files: Vec<PathBuf>,
    pub facts_file: Option<PathBuf>,
    pub commerce_enabled: bool,
    pub state_db: PathBuf,
    pub default_recipient: String,
    pub mail: MailConfig,
    pub zone: ScheduleZone,
    pub week_start: Weekday,
    pub probe_timeout: Duration,
    pub trigger_interval: Duration,
    pub port: u16,
    pub log_dir: Option<PathBuf>,
}

pub const DEFAULT_MONITOR_PORT: u16 = 9880;
pub const DEFAULT_RECIPIENT: &str = "admin@localhost";
pub const DEFAULT_PROBE_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_TRIGGER_INTERVAL_SECS: u64 = 60;

// Persisted bounded 404 log
pub const NOT_FOUND_LOG_CAPACITY: usize = 100;

// Commerce window for "recent" orders
pub const RECENT_ORDER_WINDOW_DAYS: i64 = 7;

pub const DEFAULT_WATCHED_FILES: &[&str] = &["wp-config.php", "wp-login.php", "wp-admin/index.php"];

pub const STATE_DIR_NAME: &str = "site-health-monitor";

fn parse_weekday(value: &str) -> Result<Weekday, String> {
    value
        .parse::<Weekday>()
        .map_err(|_| format!("unknown weekday: {value}"))
}

impl MonitorConfig {
    pub fn from_args(args: CliArgs) -> anyhow::Result<Self> {
        let site_url = Url::parse(&args.site_url)
            .map_err(|e| anyhow::anyhow!("invalid --site-url {:?}: {}", args.site_url, e))?;
        let site_url = site_url.as_str().trim_end_matches('/').to_string();

        let state_db = match args.state_db {
            Some(path) => path,
            None => default_state_dir().join("state.db"),
        };

        let mail = match args.mail_relay {
            Some(endpoint) => MailConfig::Relay {
                endpoint: Url::parse(&endpoint)
                    .map_err(|e| anyhow::anyhow!("invalid --mail-relay {:?}: {}", endpoint, e))?,
                token: args.mail_relay_token,
            },
            None => MailConfig::Outbox {
                dir: args.outbox_dir.unwrap_or_else(|| {
                    state_db
                        .parent()
                        .map(|p| p.join("outbox"))
                        .unwrap_or_else(|| PathBuf::from("outbox"))
                }),
            },
        };

        let zone = match args.timezone {
            Some(name) => ScheduleZone::Named(
                name.parse::<Tz>()
                    .map_err(|e| anyhow::anyhow!("invalid --timezone {:?}: {}", name, e))?,
            ),
            None => ScheduleZone::Local,
        };

        let watch = if args.watch.is_empty() {
            DEFAULT_WATCHED_FILES.iter().map(PathBuf::from).collect()
        } else {
            args.watch
        };
        let watched_files = watch
            .into_iter()
            .map(|p| if p.is_absolute() { p } else { args.site_root.join(p) })
            .collect();

        Ok(MonitorConfig {
            site_url,
            site_name: args.site_name,
            site_root: args.site_root,
            watched_files,
            facts_file: args.facts_file,
            commerce_enabled: args.commerce,
            state_db,
            default_recipient: args.default_recipient,
            mail,
            zone,
            week_start: args.week_start,
            probe_timeout: Duration::from_secs(args.probe_timeout_secs),
            trigger_interval: Duration::from_secs(args.trigger_interval_secs.max(1)),
            port: args.port,
            log_dir: args.log_dir,
        })
    }
}

/// Per-user data directory for monitor state, falling back to the working directory.
pub fn default_state_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(STATE_DIR_NAME)
}
