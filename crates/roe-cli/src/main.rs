//! roe: encrypt files into bitmap containers
//!
//! Commands:
//!   encrypt <input>...   - encrypt files (or one tree with --recursive) into .bmp containers
//!   decrypt <input>...   - rebuild original files from .bmp containers

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use secrecy::SecretString;
use std::num::NonZeroU64;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use roe_core::config::{KeySchedule, RoeConfig, SplitConfig};
use roe_engine::{BatchSummary, ProgressFn};

// ── CLI structure ──────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "roe",
    version,
    about = "Encrypt files into bitmap images",
    long_about = "roe: encrypt files into valid .bmp images and decrypt them back.\n\n\
                  Examples:\n  \
                  roe encrypt --outdir /tmp jazz.mp3\n  \
                  roe encrypt --recursive --outdir /tmp ~/Movies\n  \
                  roe decrypt invoice.pdf.bmp\n  \
                  roe decrypt --recursive --outdir /tmp ~/Cloud"
)]
struct Cli {
    /// Path to roe.toml configuration file
    #[arg(long, short = 'c', env = "ROE_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "ROE_LOG", global = true)]
    log_level: Option<String>,

    /// Log format
    #[arg(long, env = "ROE_LOG_FORMAT", global = true)]
    log_format: Option<LogFormat>,

    /// Passphrase stretching schedule (overrides config)
    #[arg(long, global = true)]
    key_schedule: Option<ScheduleArg>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Encrypt files into .bmp containers
    ///
    /// Files larger than --split bytes are stored as several containers
    /// named `name.K-N.bmp`.
    Encrypt {
        #[command(flatten)]
        common: CommonArgs,
        /// Split every N bytes (default: split.max_chunk_size from config)
        #[arg(long, short = 's')]
        split: Option<u64>,
    },

    /// Decrypt .bmp containers back into the original files
    ///
    /// Any one part of a split set rebuilds the whole file.
    Decrypt {
        #[command(flatten)]
        common: CommonArgs,
    },
}

#[derive(Args, Debug)]
struct CommonArgs {
    /// Output directory (must exist)
    #[arg(long, short = 'o', default_value = ".")]
    outdir: PathBuf,
    /// Traverse a directory input recursively
    #[arg(long, short = 'r')]
    recursive: bool,
    /// Password (prompted when absent)
    #[arg(long = "password", short = 'p', env = "ROE_PASSWORD", hide_env_values = true)]
    password: Option<String>,
    /// Input files, or a single directory with --recursive
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
}

#[derive(Clone, Copy, Debug, ValueEnum, PartialEq, Eq)]
enum LogFormat {
    Json,
    Text,
}

#[derive(Clone, Copy, Debug, ValueEnum, PartialEq, Eq)]
enum ScheduleArg {
    Rehash,
    Running,
}

impl From<ScheduleArg> for KeySchedule {
    fn from(arg: ScheduleArg) -> Self {
        match arg {
            ScheduleArg::Rehash => KeySchedule::Rehash,
            ScheduleArg::Running => KeySchedule::Running,
        }
    }
}

/// What the validated inputs resolve to
#[derive(Debug, PartialEq, Eq)]
enum Inputs {
    Files(Vec<PathBuf>),
    Tree(PathBuf),
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("ERROR: {e:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let file_config = cli.config.as_deref().map(load_config).transpose()?.flatten();
    let config = file_config.clone().unwrap_or_default();
    config.validate().context("invalid configuration")?;

    let level = cli.log_level.as_deref().unwrap_or(&config.log.level);
    let format = cli.log_format.unwrap_or(match config.log.format.as_str() {
        "json" => LogFormat::Json,
        _ => LogFormat::Text,
    });
    init_logging(level, format);

    if let (Some(path), None) = (&cli.config, &file_config) {
        warn!("config file not found: {}  (using defaults)", path.display());
    }

    let schedule = cli
        .key_schedule
        .map(KeySchedule::from)
        .unwrap_or(config.crypto.key_schedule);

    match cli.command {
        Commands::Encrypt { common, split } => cmd_encrypt(&config, schedule, common, split),
        Commands::Decrypt { common } => cmd_decrypt(schedule, common),
    }
}

// ── Config loading ────────────────────────────────────────────────────────────

/// Read `path` as TOML. A missing file yields `None`.
fn load_config(path: &Path) -> Result<Option<RoeConfig>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading config: {}", path.display()))?;
    toml::from_str(&content)
        .map(Some)
        .with_context(|| format!("parsing config: {}", path.display()))
}

fn init_logging(level: &str, format: LogFormat) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}

// ── Argument validation ───────────────────────────────────────────────────────

/// Resolve `outdir` to an absolute path; it must be an existing directory.
fn resolve_outdir(outdir: &Path) -> Result<PathBuf> {
    let abs = std::fs::canonicalize(outdir)
        .with_context(|| format!("--outdir is invalid: {}", outdir.display()))?;
    if !abs.is_dir() {
        bail!("--outdir is invalid: '{}' is not a directory", outdir.display());
    }
    Ok(abs)
}

/// Check the inputs against each other and the (absolute) output directory.
fn classify_inputs(inputs: &[PathBuf], recursive: bool, outdir: &Path) -> Result<Inputs> {
    if inputs.is_empty() {
        bail!("at least one input is required");
    }

    for item in inputs {
        let meta = std::fs::metadata(item)
            .with_context(|| format!("'{}' cannot be supplied as input", item.display()))?;
        if !meta.is_dir() {
            continue;
        }
        if !recursive {
            bail!(
                "'{}' cannot be supplied as input because it is a directory, use --recursive",
                item.display()
            );
        }
        if inputs.len() != 1 {
            bail!("only one input is allowed with --recursive");
        }

        let abs = std::fs::canonicalize(item)
            .with_context(|| format!("resolving input: {}", item.display()))?;
        if abs == outdir {
            bail!(
                "'{}' cannot be supplied both as input and to --outdir",
                item.display()
            );
        }
        if outdir.starts_with(&abs) {
            bail!(
                "--outdir is invalid because it is a sub-directory of the input '{}'",
                abs.display()
            );
        }
        return Ok(Inputs::Tree(item.clone()));
    }

    Ok(Inputs::Files(inputs.to_vec()))
}

/// The `--split` value, falling back to the configured maximum.
fn resolve_split(flag: Option<u64>, split: &SplitConfig) -> Result<NonZeroU64> {
    let value = flag.unwrap_or(split.max_chunk_size);
    if value < split.min_chunk_size {
        bail!(
            "--split is invalid: cannot be less than {} bytes",
            split.min_chunk_size
        );
    }
    NonZeroU64::new(value).context("--split must be positive")
}

// ── Password input ────────────────────────────────────────────────────────────

fn obtain_password(flag: Option<String>) -> Result<SecretString> {
    if let Some(p) = flag.filter(|p| !p.is_empty()) {
        return Ok(SecretString::from(p));
    }
    loop {
        let first = rpassword::prompt_password("Type the password: ")
            .context("reading password")?;
        if first.is_empty() {
            continue;
        }
        let second = rpassword::prompt_password("Confirm the password: ")
            .context("reading password")?;
        if first != second {
            eprintln!("Error: passwords don't match\n");
            continue;
        }
        return Ok(SecretString::from(first));
    }
}

// ── Progress bar helpers ──────────────────────────────────────────────────────

fn make_progress(show: bool, prefix: &str) -> (ProgressBar, ProgressFn) {
    let pb = if show {
        let pb = ProgressBar::new(0);
        if let Ok(style) =
            ProgressStyle::with_template("{prefix:.bold} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        {
            pb.set_style(style.progress_chars("=>-"));
        }
        pb.set_prefix(prefix.to_string());
        pb
    } else {
        ProgressBar::hidden()
    };

    let bar = pb.clone();
    let callback: ProgressFn = Box::new(move |done, total, msg| {
        bar.set_length(total);
        bar.set_position(done);
        bar.set_message(msg.to_string());
    });
    (pb, callback)
}

fn print_summary(verb: &str, summary: &BatchSummary) {
    println!(
        "{verb} {} file(s), {} container(s), {} bytes ({} skipped)",
        summary.processed, summary.containers, summary.bytes, summary.skipped
    );
}

// ── `roe encrypt` ─────────────────────────────────────────────────────────────

fn cmd_encrypt(
    config: &RoeConfig,
    schedule: KeySchedule,
    common: CommonArgs,
    split: Option<u64>,
) -> Result<()> {
    let outdir = resolve_outdir(&common.outdir)?;
    let inputs = classify_inputs(&common.inputs, common.recursive, &outdir)?;
    let max_chunk = resolve_split(split, &config.split)?;
    let password = obtain_password(common.password)?;
    let key = roe_crypto::derive_key(&password, schedule);
    let mut rng = rand::thread_rng();

    info!(outdir = %outdir.display(), split = max_chunk.get(), ?schedule, "encrypting");

    let show = !matches!(&inputs, Inputs::Files(f) if f.len() == 1);
    let (pb, progress) = make_progress(show, "encrypt");
    let summary = match &inputs {
        Inputs::Tree(dir) => {
            roe_engine::encrypt_tree(dir, &outdir, &key, max_chunk, &mut rng, Some(&progress))
        }
        Inputs::Files(files) => {
            roe_engine::encrypt_inputs(files, &outdir, &key, max_chunk, &mut rng, Some(&progress))
        }
    };
    pb.finish_and_clear();

    print_summary("encrypted", &summary?);
    Ok(())
}

// ── `roe decrypt` ─────────────────────────────────────────────────────────────

fn cmd_decrypt(schedule: KeySchedule, common: CommonArgs) -> Result<()> {
    let outdir = resolve_outdir(&common.outdir)?;
    let inputs = classify_inputs(&common.inputs, common.recursive, &outdir)?;
    let password = obtain_password(common.password)?;
    let key = roe_crypto::derive_key(&password, schedule);

    info!(outdir = %outdir.display(), ?schedule, "decrypting");

    let show = !matches!(&inputs, Inputs::Files(f) if f.len() == 1);
    let (pb, progress) = make_progress(show, "decrypt");
    let summary = match &inputs {
        Inputs::Tree(dir) => roe_engine::decrypt_tree(dir, &outdir, &key, Some(&progress)),
        Inputs::Files(files) => roe_engine::decrypt_inputs(files, &outdir, &key, Some(&progress)),
    };
    pb.finish_and_clear();

    print_summary("decrypted", &summary?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use tempfile::TempDir;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn encrypt_parses_split_and_globals() {
        let cli = Cli::try_parse_from([
            "roe",
            "--key-schedule",
            "running",
            "encrypt",
            "--split",
            "2000000",
            "-p",
            "pw",
            "a.txt",
            "b.txt",
        ])
        .unwrap();
        assert_eq!(cli.key_schedule, Some(ScheduleArg::Running));
        match cli.command {
            Commands::Encrypt { common, split } => {
                assert_eq!(split, Some(2_000_000));
                assert_eq!(common.password.as_deref(), Some("pw"));
                assert_eq!(common.inputs.len(), 2);
                assert_eq!(common.outdir, PathBuf::from("."));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn decrypt_rejects_split_flag() {
        assert!(Cli::try_parse_from(["roe", "decrypt", "--split", "2000000", "x.bmp"]).is_err());
    }

    #[test]
    fn inputs_are_required() {
        assert!(Cli::try_parse_from(["roe", "encrypt"]).is_err());
    }

    #[test]
    fn outdir_must_be_a_directory() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("f.txt");
        std::fs::write(&file, b"x").unwrap();

        assert!(resolve_outdir(tmp.path()).is_ok());
        assert!(resolve_outdir(&file).is_err());
        assert!(resolve_outdir(&tmp.path().join("absent")).is_err());
    }

    #[test]
    fn plain_files_are_accepted() {
        let tmp = TempDir::new().unwrap();
        let a = tmp.path().join("a.txt");
        std::fs::write(&a, b"x").unwrap();
        let out = TempDir::new().unwrap();
        let outdir = resolve_outdir(out.path()).unwrap();

        let inputs = classify_inputs(&[a.clone()], false, &outdir).unwrap();
        assert_eq!(inputs, Inputs::Files(vec![a]));
    }

    #[test]
    fn missing_input_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let outdir = resolve_outdir(tmp.path()).unwrap();
        let err = classify_inputs(&[tmp.path().join("nope")], false, &outdir).unwrap_err();
        assert!(err.to_string().contains("cannot be supplied as input"));
    }

    #[test]
    fn directory_needs_recursive_and_must_be_alone() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("tree");
        std::fs::create_dir(&dir).unwrap();
        let file = tmp.path().join("f.txt");
        std::fs::write(&file, b"x").unwrap();
        let out = TempDir::new().unwrap();
        let outdir = resolve_outdir(out.path()).unwrap();

        let err = classify_inputs(&[dir.clone()], false, &outdir).unwrap_err();
        assert!(err.to_string().contains("--recursive"));

        let err = classify_inputs(&[file, dir.clone()], true, &outdir).unwrap_err();
        assert!(err.to_string().contains("only one input"));

        assert_eq!(
            classify_inputs(&[dir.clone()], true, &outdir).unwrap(),
            Inputs::Tree(dir)
        );
    }

    #[test]
    fn outdir_cannot_be_input_or_inside_it() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("tree");
        std::fs::create_dir_all(dir.join("nested")).unwrap();

        let same = resolve_outdir(&dir).unwrap();
        let err = classify_inputs(&[dir.clone()], true, &same).unwrap_err();
        assert!(err.to_string().contains("both as input and to --outdir"));

        let inner = resolve_outdir(&dir.join("nested")).unwrap();
        let err = classify_inputs(&[dir.clone()], true, &inner).unwrap_err();
        assert!(err.to_string().contains("sub-directory"));

        let sibling = resolve_outdir(tmp.path()).unwrap();
        assert!(classify_inputs(&[dir], true, &sibling).is_ok());
    }

    #[test]
    fn split_defaults_to_config_and_respects_minimum() {
        let split = SplitConfig::default();
        assert_eq!(resolve_split(None, &split).unwrap().get(), 24_000_000);
        assert_eq!(resolve_split(Some(1_000_000), &split).unwrap().get(), 1_000_000);
        let err = resolve_split(Some(999_999), &split).unwrap_err();
        assert!(err.to_string().contains("cannot be less than 1000000"));
    }

    #[test]
    fn password_flag_skips_prompt() {
        use secrecy::ExposeSecret;
        let pw = obtain_password(Some("hunter2".into())).unwrap();
        assert_eq!(pw.expose_secret(), "hunter2");
    }

    #[test]
    fn missing_config_file_is_none() {
        let tmp = TempDir::new().unwrap();
        assert!(load_config(&tmp.path().join("roe.toml")).unwrap().is_none());

        let path = tmp.path().join("custom.toml");
        std::fs::write(&path, "[split]\nmax_chunk_size = 5000000\n").unwrap();
        let config = load_config(&path).unwrap().unwrap();
        assert_eq!(config.split.max_chunk_size, 5_000_000);
    }
}
