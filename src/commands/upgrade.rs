//! Upgrade command implementation
//!
//! An upgrade run:
//! 1. Merges the command line with the settings file
//! 2. Loads the user's values document
//! 3. Fetches the defaults of the base and the target chart version
//! 4. Compares them and applies the result to the document
//! 5. Writes the document, or prints it for a dry run
//!
//! Nothing is written unless every step succeeds.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use log::{debug, info};

use valgrade::chart::{ChartManager, Repository};
use valgrade::config::{self, Settings};
use valgrade::defaults::default_cache_root;
use valgrade::diff::CompareOptions;
use valgrade::document::{Document, Format};
use valgrade::error::Error;
use valgrade::keep::KeepRules;
use valgrade::output::{render_summary, OutputConfig};
use valgrade::suggestions;

/// Arguments for the upgrade
#[derive(Args, Debug)]
pub struct UpgradeArgs {
    /// Chart version the values file was written against
    #[arg(short = 'b', long, value_name = "VERSION")]
    pub version_base: String,

    /// Chart version to upgrade to
    #[arg(short = 't', long, value_name = "VERSION")]
    pub version_target: String,

    /// Values file to upgrade (.yaml, .yml or .json)
    #[arg(short = 'f', long = "values", value_name = "PATH")]
    pub values: PathBuf,

    /// Write the upgraded values to this file
    #[arg(
        short = 'o',
        long,
        value_name = "PATH",
        conflicts_with = "in_place",
        required_unless_present = "in_place"
    )]
    pub output_file: Option<PathBuf>,

    /// Overwrite the values file
    #[arg(short = 'i', long)]
    pub in_place: bool,

    /// Chart repository: http(s) URL, oci:// reference or local directory
    #[arg(short = 'r', long, value_name = "URL", env = "VALGRADE_REPOSITORY")]
    pub repository: Option<String>,

    /// Chart name
    #[arg(short = 'c', long, value_name = "NAME", env = "VALGRADE_CHART")]
    pub chart: Option<String>,

    /// Keep these paths exactly as in the values file (comma separated, repeatable)
    #[arg(short = 'k', long, value_name = "PATHS", value_delimiter = ',')]
    pub keep: Vec<String>,

    /// Do not remove keys that the target version no longer has
    #[arg(long)]
    pub ignore_missing: bool,

    /// Print the upgraded values instead of writing them
    #[arg(short = 'd', long)]
    pub dry_run: bool,

    /// Path to the settings file (defaults to .valgrade.yaml when present)
    #[arg(long, value_name = "PATH", env = "VALGRADE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Cache root directory for fetched charts
    #[arg(long, value_name = "PATH", env = "VALGRADE_CACHE")]
    pub cache_root: Option<PathBuf>,

    /// Ignore cached charts and fetch them again
    #[arg(long)]
    pub no_cache: bool,
}

/// Everything a run needs, after merging the command line with the settings
/// file.
#[derive(Debug)]
struct Plan {
    repository: String,
    chart: String,
    base: String,
    target: String,
    values: PathBuf,
    output: PathBuf,
    dry_run: bool,
    options: CompareOptions,
    cache_root: PathBuf,
    refresh: bool,
}

impl Plan {
    fn resolve(args: UpgradeArgs, settings: Settings) -> Result<Self> {
        let repository = args
            .repository
            .or(settings.repository)
            .ok_or_else(suggestions::missing_repository)?;
        let chart = args
            .chart
            .or(settings.chart)
            .ok_or_else(suggestions::missing_chart)?;

        let mut keep = KeepRules::new(&settings.keep);
        keep.extend(&args.keep);

        let output = match args.output_file {
            Some(path) => path,
            None => args.values.clone(),
        };

        Ok(Self {
            repository,
            chart,
            base: args.version_base,
            target: args.version_target,
            values: args.values,
            output,
            dry_run: args.dry_run,
            options: CompareOptions {
                keep,
                ignore_missing: args.ignore_missing || settings.ignore_missing,
            },
            cache_root: args
                .cache_root
                .or(settings.cache_root)
                .unwrap_or_else(default_cache_root),
            refresh: args.no_cache,
        })
    }
}

/// Execute the upgrade
pub fn execute(args: UpgradeArgs, color: &str, silent: bool) -> Result<()> {
    let settings = load_settings(args.config.as_deref())?;
    let plan = Plan::resolve(args, settings)?;
    debug!("{:?}", plan);

    // Both formats are checked before anything is fetched
    let output_format = check_format(&plan.output)?;
    check_format(&plan.values)?;
    if !plan.values.is_file() {
        return Err(suggestions::values_file_not_found(&plan.values));
    }
    let mut document = Document::load(&plan.values)?;

    let repository = Repository::parse(&plan.repository)?;
    let manager = ChartManager::for_repository(&repository, plan.cache_root.clone(), plan.refresh);
    let base = manager
        .fetch(&plan.repository, &plan.chart, &plan.base)
        .with_context(|| format!("Could not get the defaults of base version {}", plan.base))?;
    let target = manager
        .fetch(&plan.repository, &plan.chart, &plan.target)
        .with_context(|| format!("Could not get the defaults of target version {}", plan.target))?;

    info!(
        "Upgrading {} from {} {} to {}",
        plan.values.display(),
        plan.chart,
        base.metadata.version,
        target.metadata.version
    );
    let result = valgrade::upgrade::upgrade(&base.values, &target.values, &mut document, &plan.options)?;

    if plan.dry_run {
        print!("{}", document.render_as(output_format)?);
    } else {
        document.save(&plan.output)?;
        info!("Wrote {}", plan.output.display());
    }

    if !silent {
        let output = OutputConfig::from_env_and_flag(color);
        eprint!("{}", render_summary(&result.delta, &output));
    }
    Ok(())
}

fn load_settings(explicit: Option<&Path>) -> Result<Settings> {
    let path = match explicit {
        Some(path) if !path.is_file() => return Err(suggestions::config_not_found(path)),
        Some(path) => Some(path.to_path_buf()),
        None => std::env::current_dir()
            .ok()
            .and_then(|dir| config::discover(&dir)),
    };

    match path {
        Some(path) => {
            debug!("Reading settings from {}", path.display());
            Ok(config::from_file(&path)?)
        }
        None => Ok(Settings::default()),
    }
}

fn check_format(path: &Path) -> Result<Format> {
    Format::from_path(path).map_err(|err| match err {
        Error::UnsupportedFormat { extension, .. } => suggestions::unsupported_extension(path, &extension),
        other => other.into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> UpgradeArgs {
        UpgradeArgs {
            version_base: "1.0.0".to_string(),
            version_target: "2.0.0".to_string(),
            values: PathBuf::from("values.yaml"),
            output_file: None,
            in_place: true,
            repository: None,
            chart: None,
            keep: vec!["b.c".to_string()],
            ignore_missing: false,
            dry_run: false,
            config: None,
            cache_root: None,
            no_cache: false,
        }
    }

    #[test]
    fn test_plan_merges_settings() {
        let settings = Settings {
            repository: Some("https://charts.example.com".to_string()),
            chart: Some("demo".to_string()),
            keep: vec!["a".to_string(), "b.c".to_string()],
            ignore_missing: true,
            cache_root: Some(PathBuf::from("/tmp/valgrade")),
        };
        let mut cli = args();
        cli.chart = Some("other".to_string());

        let plan = Plan::resolve(cli, settings).unwrap();
        assert_eq!(plan.repository, "https://charts.example.com");
        assert_eq!(plan.chart, "other");
        assert_eq!(plan.options.keep.iter().collect::<Vec<_>>(), vec!["a", "b.c"]);
        assert!(plan.options.ignore_missing);
        assert_eq!(plan.cache_root, PathBuf::from("/tmp/valgrade"));
        assert_eq!(plan.output, PathBuf::from("values.yaml"));
    }

    #[test]
    fn test_plan_requires_repository_and_chart() {
        let err = Plan::resolve(args(), Settings::default()).unwrap_err();
        assert!(err.to_string().contains("No chart repository given"));

        let mut cli = args();
        cli.repository = Some("./charts".to_string());
        let err = Plan::resolve(cli, Settings::default()).unwrap_err();
        assert!(err.to_string().contains("No chart name given"));
    }

    #[test]
    fn test_plan_output_file() {
        let mut cli = args();
        cli.repository = Some("./charts".to_string());
        cli.chart = Some("demo".to_string());
        cli.in_place = false;
        cli.output_file = Some(PathBuf::from("out.json"));

        let plan = Plan::resolve(cli, Settings::default()).unwrap();
        assert_eq!(plan.output, PathBuf::from("out.json"));
        assert_eq!(plan.values, PathBuf::from("values.yaml"));
    }

    #[test]
    fn test_check_format_suggests_extension() {
        let err = check_format(Path::new("values.ymal")).unwrap_err();
        assert!(err.to_string().contains("Did you mean"));
        assert_eq!(check_format(Path::new("values.JSON")).unwrap(), Format::Json);
    }

    #[test]
    fn test_load_settings_explicit_missing() {
        let err = load_settings(Some(Path::new("/nonexistent/.valgrade.yaml"))).unwrap_err();
        assert!(err.to_string().contains("Settings file not found"));
    }
}
