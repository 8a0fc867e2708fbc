//! pocket-align CLI: run detection profiles on images and manage the
//! profile store.

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use log::LevelFilter;
use nalgebra::Vector2;
use pocket_align::calib::{CalibrationParams, ParamsIoError};
use pocket_align::core::{DetectionProfile, ProfileStore, StoreError};
use pocket_align::detect::{detect_image, save_overlays, DetectError, DetectionReport};

#[derive(thiserror::Error, Debug)]
enum CliError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Detect(#[from] DetectError),
    #[error(transparent)]
    Params(#[from] ParamsIoError),
    #[error("cannot read profile file: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed profile file: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("unknown profile '{0}'")]
    UnknownProfile(String),
    #[error("no mapping for pattern '{0}'")]
    UnknownMapping(String),
    #[error("no --store given and no home directory to default to")]
    NoStorePath,
}

type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "pocket-align")]
#[command(about = "Detect feeder pockets in images and manage detection profiles")]
#[command(version)]
struct Cli {
    /// Profile store file (default: ~/.pocket_align/profiles.toml).
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// More log output; repeat for debug.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Emit structured JSON logs.
    #[cfg(feature = "tracing")]
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a detection profile on an image file.
    Detect(DetectArgs),

    /// Inspect and edit stored profiles.
    #[command(subcommand)]
    Profiles(ProfileCommands),

    /// Map a part id/name pattern to a profile.
    Map {
        pattern: String,
        profile: String,
    },

    /// Remove the mapping for a pattern.
    Unmap { pattern: String },

    /// Show which profile a part would use.
    Resolve {
        /// Part id, tried first.
        #[arg(long)]
        id: String,
        /// Part name, tried when the id has no mapping.
        #[arg(long, default_value = "")]
        name: String,
    },

    /// Write calibration parameters (defaults unless --from is given) as JSON.
    CalibParams {
        /// Existing params file to normalize.
        #[arg(long)]
        from: Option<PathBuf>,
        #[arg(long)]
        out: PathBuf,
    },
}

#[derive(Subcommand)]
enum ProfileCommands {
    /// List profile names and mappings.
    List,
    /// Print one profile as TOML.
    Show { name: String },
    /// Validate and save a profile read from a TOML file.
    Import { file: PathBuf },
    /// Delete a profile; mappings pointing at it stay.
    Delete { name: String },
}

#[derive(Debug, Args)]
struct DetectArgs {
    /// Input image.
    #[arg(long)]
    image: PathBuf,

    /// Profile name from the store.
    #[arg(long, default_value = pocket_align::core::DEFAULT_PROFILE_NAME)]
    profile: String,

    /// Directory for the overlays and the JSON report.
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    /// Camera scale in mm/pixel; adds a machine-space offset to the report.
    #[arg(long)]
    units_per_pixel: Option<f64>,
}

fn main() {
    let cli = Cli::parse();
    init_logging(&cli);

    if let Err(err) = run(cli) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn init_logging(cli: &Cli) {
    let level = match cli.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    #[cfg(feature = "tracing")]
    {
        let _ = level;
        let _ = tracing_log::LogTracer::init();
        pocket_align::core::init_tracing(cli.json_logs);
    }
    #[cfg(not(feature = "tracing"))]
    {
        let _ = pocket_align::core::init_from_env(level);
    }
}

fn run(cli: Cli) -> CliResult<()> {
    let store_path = match cli.store {
        Some(path) => path,
        None => ProfileStore::default_path().ok_or(CliError::NoStorePath)?,
    };
    match cli.command {
        Commands::Detect(args) => run_detect(&store_path, &args),
        Commands::Profiles(cmd) => run_profiles(&store_path, cmd),
        Commands::Map { pattern, profile } => {
            let mut store = ProfileStore::open(&store_path)?;
            if store.profile(&profile).is_none() {
                return Err(CliError::UnknownProfile(profile));
            }
            store.set_mapping(pattern.as_str(), profile.as_str())?;
            println!("{pattern} -> {profile}");
            Ok(())
        }
        Commands::Unmap { pattern } => {
            let mut store = ProfileStore::open(&store_path)?;
            if !store.remove_mapping(&pattern)? {
                return Err(CliError::UnknownMapping(pattern));
            }
            println!("removed mapping for {pattern}");
            Ok(())
        }
        Commands::Resolve { id, name } => {
            let store = ProfileStore::open(&store_path)?;
            match store.resolve_for_part(&id, &name) {
                Some(profile) => println!("{profile}"),
                None => println!("(no mapping)"),
            }
            Ok(())
        }
        Commands::CalibParams { from, out } => {
            let params = match from {
                Some(path) => CalibrationParams::load_json(path)?,
                None => CalibrationParams::default(),
            };
            params.write_json(&out)?;
            println!("wrote {}", out.display());
            Ok(())
        }
    }
}

fn run_detect(store_path: &Path, args: &DetectArgs) -> CliResult<()> {
    let store = ProfileStore::open(store_path)?;
    let profile = store
        .profile(&args.profile)
        .ok_or_else(|| CliError::UnknownProfile(args.profile.clone()))?;

    let result = detect_image(&args.image, profile)?;
    let stem = args
        .image
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("image");
    let overlays = save_overlays(&result, &args.out_dir, stem)?;

    let mut report = DetectionReport::new(args.image.display().to_string(), profile, &result);
    if let Some(upp) = args.units_per_pixel {
        report = report.with_units_per_pixel(Vector2::new(upp, upp));
    }
    let report_path = args.out_dir.join(format!("{stem}_report.json"));
    report.write_json(&report_path)?;

    match report.center {
        Some([x, y]) => println!(
            "found: center=({x:.1}, {y:.1}) px, {} of {} candidate(s) accepted",
            report.accepted,
            report.candidates.len()
        ),
        None => println!(
            "not found: 0 of {} candidate(s) accepted",
            report.candidates.len()
        ),
    }
    println!("overlay: {}", overlays.overlay.display());
    println!("binary: {}", overlays.binary.display());
    println!("report: {}", report_path.display());
    Ok(())
}

fn run_profiles(store_path: &Path, cmd: ProfileCommands) -> CliResult<()> {
    let mut store = ProfileStore::open(store_path)?;
    match cmd {
        ProfileCommands::List => {
            for p in store.profiles() {
                println!("{}", p.name);
            }
            for m in store.mappings() {
                println!("  {} -> {}", m.pattern, m.profile);
            }
        }
        ProfileCommands::Show { name } => {
            let profile = store
                .profile(&name)
                .ok_or_else(|| CliError::UnknownProfile(name.clone()))?;
            print!("{}", render_profile(profile));
        }
        ProfileCommands::Import { file } => {
            let raw = fs::read_to_string(&file)?;
            let profile: DetectionProfile = toml::from_str(&raw)?;
            let name = profile.name.clone();
            store.save_profile(profile)?;
            println!("saved profile '{name}'");
        }
        ProfileCommands::Delete { name } => {
            if !store.delete_profile(&name)? {
                return Err(CliError::UnknownProfile(name));
            }
            println!("deleted profile '{name}'");
        }
    }
    Ok(())
}

fn render_profile(profile: &DetectionProfile) -> String {
    toml::to_string_pretty(profile).unwrap_or_else(|err| format!("# cannot render: {err}\n"))
}
