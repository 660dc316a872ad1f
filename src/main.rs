use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
use clap::Parser;
use indexmap::IndexMap;
use rustcall::config::{CallSpec, Config};
use rustcall::{version, Action, CallFile, CallTarget};
use std::fs::File;
use std::path::PathBuf;
use tracing::{info, level_filters::LevelFilter};
use tracing_appender::non_blocking::WorkerGuard;

#[derive(Parser, Debug)]
#[command(
    author,
    version = version::get_short_version(),
    about = "Create and spool Asterisk call files",
    long_about = version::get_version_info()
)]
struct Cli {
    /// Path to the configuration file (TOML format)
    #[clap(long)]
    conf: Option<String>,

    /// Call spec file (TOML) describing the whole call; overrides the
    /// per-field flags below
    #[clap(long)]
    call: Option<String>,

    /// Channel to dial, e.g. SIP/1234
    #[clap(long)]
    channel: Option<String>,

    /// Application to run when the call is answered
    #[clap(long, conflicts_with = "context")]
    application: Option<String>,

    /// Argument string for --application
    #[clap(long, requires = "application")]
    data: Option<String>,

    /// Dialplan context to jump to when the call is answered
    #[clap(long, requires = "extension", requires = "priority")]
    context: Option<String>,

    /// Dialplan extension, used with --context
    #[clap(long)]
    extension: Option<String>,

    /// Dialplan priority, used with --context
    #[clap(long)]
    priority: Option<String>,

    /// Channel variable as NAME=VALUE, repeatable
    #[clap(long, value_name = "NAME=VALUE")]
    set: Vec<String>,

    /// Caller ID to present
    #[clap(long)]
    callerid: Option<String>,

    /// Seconds to wait for an answer
    #[clap(long)]
    wait_time: Option<u32>,

    /// How many times to retry the call
    #[clap(long)]
    max_retries: Option<u32>,

    /// Seconds between retries
    #[clap(long)]
    retry_time: Option<u32>,

    /// Account code for billing
    #[clap(long)]
    account: Option<String>,

    /// Keep a copy of the call file after Asterisk processes it
    #[clap(long)]
    archive: bool,

    /// System user to spool the call file as
    #[clap(long)]
    user: Option<String>,

    /// Directory for the intermediate temporary file
    #[clap(long)]
    tmpdir: Option<PathBuf>,

    /// Base name for the spooled file
    #[clap(long)]
    file_name: Option<String>,

    /// Spool directory to publish into
    #[clap(long)]
    spool_dir: Option<PathBuf>,

    /// Earliest time to place the call, local "YYYY-MM-DD HH:MM:SS"
    #[clap(long)]
    schedule: Option<String>,

    /// Print the rendered call file instead of spooling it
    #[clap(long)]
    dry_run: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match cli.conf {
        Some(ref conf) => Config::load(conf)?,
        None => Config::default(),
    };
    let _log_guard = init_logging(&config)?;

    let spec = match cli.call {
        Some(ref path) => CallSpec::load(path)?,
        None => spec_from_flags(&cli)?,
    };

    let mut callfile = CallFile::new(&spec.call, &spec.action)
        .with_variables(spec.set_var.clone())
        .with_archive(spec.archive)
        .with_spool_dir(cli.spool_dir.clone().unwrap_or_else(|| config.spool_dir.clone()));

    if let Some(user) = cli.user.clone().or_else(|| config.user.clone()) {
        callfile = callfile.with_user(user);
    }
    if let Some(tmpdir) = cli.tmpdir.clone().or_else(|| config.tmpdir.clone()) {
        callfile = callfile.with_tmpdir(tmpdir);
    }
    if let Some(file_name) = cli.file_name.clone().or_else(|| spec.file_name.clone()) {
        callfile = callfile.with_file_name(file_name);
    }

    let schedule = cli
        .schedule
        .as_deref()
        .or(spec.schedule.as_deref())
        .map(parse_schedule)
        .transpose()?;

    if cli.dry_run {
        println!("{}", callfile.contents()?);
        return Ok(());
    }

    callfile.spool(schedule)?;
    info!(
        "call file for {} spooled to {}",
        spec.call.channel,
        callfile.spool_dir().display()
    );
    Ok(())
}

/// Assemble a call spec from the per-field flags.
fn spec_from_flags(cli: &Cli) -> Result<CallSpec> {
    let channel = cli
        .channel
        .clone()
        .ok_or_else(|| anyhow!("either --call or --channel is required"))?;

    let call = CallTarget {
        channel,
        callerid: cli.callerid.clone(),
        account: cli.account.clone(),
        wait_time: cli.wait_time,
        max_retries: cli.max_retries,
        retry_time: cli.retry_time,
    };

    let action = match (&cli.application, &cli.context) {
        (Some(name), None) => match &cli.data {
            Some(data) => Action::application_with_data(name.as_str(), data.as_str()),
            None => Action::application(name.as_str()),
        },
        (None, Some(context)) => {
            // clap's `requires` guarantees extension and priority are set
            let extension = cli.extension.clone().unwrap_or_default();
            let priority = cli.priority.clone().unwrap_or_default();
            Action::context(context.as_str(), extension, priority)
        }
        _ => bail!("exactly one of --application or --context is required"),
    };

    let mut set_var = IndexMap::new();
    for pair in &cli.set {
        let (name, value) = pair
            .split_once('=')
            .ok_or_else(|| anyhow!("invalid --set {:?}, expected NAME=VALUE", pair))?;
        set_var.insert(name.to_string(), value.to_string());
    }

    Ok(CallSpec {
        call,
        action,
        set_var,
        archive: cli.archive,
        schedule: None,
        file_name: None,
    })
}

fn parse_schedule(s: &str) -> Result<DateTime<Local>> {
    let naive = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .with_context(|| format!("invalid schedule time {:?}, expected YYYY-MM-DD HH:MM:SS", s))?;
    Local
        .from_local_datetime(&naive)
        .single()
        .ok_or_else(|| anyhow!("schedule time {:?} is not a valid local time", s))
}

fn init_logging(config: &Config) -> Result<Option<WorkerGuard>> {
    let mut log_fmt = tracing_subscriber::fmt();
    if let Some(ref level) = config.log_level {
        if let Ok(lv) = level.as_str().parse::<LevelFilter>() {
            log_fmt = log_fmt.with_max_level(lv);
        }
    }

    if let Some(ref log_file) = config.log_file {
        let file = File::create(log_file)
            .with_context(|| format!("failed to create log file {}", log_file))?;
        let (non_blocking, guard) = tracing_appender::non_blocking(file);
        log_fmt.with_writer(non_blocking).try_init().ok();
        Ok(Some(guard))
    } else {
        log_fmt.try_init().ok();
        Ok(None)
    }
}
