use clap::{Parser, Subcommand};
use folio_media::config::{self, MediaConfig};
use folio_media::featured;
use folio_media::imaging::{CropFocus, supported_input_extensions};
use folio_media::naming::{is_variant_name, is_variant_slug};
use folio_media::output::{self, ResolutionReport};
use folio_media::storage::FileSystemStorage;
use folio_media::variants::{Resolution, VariantResolver, VariantSpec, VariantStats};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Focus point flags shared by commands that crop.
#[derive(clap::Args, Clone, Copy)]
struct FocusArgs {
    /// Horizontal focus, percent from the left edge (0-100)
    #[arg(long, default_value_t = 50, value_parser = clap::value_parser!(u8).range(0..=100))]
    focus_x: u8,

    /// Vertical focus, percent from the top edge (0-100)
    #[arg(long, default_value_t = 50, value_parser = clap::value_parser!(u8).range(0..=100))]
    focus_y: u8,
}

impl FocusArgs {
    fn focus(self) -> CropFocus {
        CropFocus::new(self.focus_x, self.focus_y)
    }
}

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup, called exactly once
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "folio-media")]
#[command(about = "Cropped featured-image variants for a blog and portfolio site")]
#[command(long_about = "\
Cropped featured-image variants for a blog and portfolio site

Each uploaded image is served at fixed boxes (presets) cropped around a
focus point. Variants are built on first request and stored next to the
source in a reserved directory:

  media/
  └── blog/featured/
      ├── cover.png                               # Uploaded source
      └── _variants/
          ├── cover__card_800x450.jpg             # Centered focus
          └── cover__hero_1600x900_fx30_fy50.jpg  # Custom focus

A variant is rebuilt when its source is newer. If building fails, the
original image URL is used instead.

Run 'folio-media gen-config' to generate a documented folio.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Config file (optional; defaults are used when it is absent)
    #[arg(long, default_value = "folio.toml", global = true)]
    config: PathBuf,

    /// Media directory (overrides `media_root` from the config)
    #[arg(long, global = true)]
    media_root: Option<PathBuf>,

    /// Public URL prefix for the media directory (overrides `media_url`)
    #[arg(long, global = true)]
    media_url: Option<String>,

    /// Log cache decisions to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve one variant of one source image and print its URL
    Resolve {
        /// Source image, relative to the media directory
        source: String,

        /// Configured preset to resolve
        #[arg(long, conflicts_with = "variant")]
        preset: Option<String>,

        /// Ad-hoc variant name, a-z 0-9 and '-' (use with --size)
        #[arg(long, value_parser = parse_variant_name, requires = "size")]
        variant: Option<String>,

        /// Ad-hoc box size, e.g. 1200x630
        #[arg(long, value_parser = parse_size, requires = "variant")]
        size: Option<(u32, u32)>,

        #[command(flatten)]
        focus: FocusArgs,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Build every preset for every image under the media directory
    Warm {
        /// Only warm images under this subdirectory of the media directory
        subdir: Option<PathBuf>,

        #[command(flatten)]
        focus: FocusArgs,
    },
    /// Print a stock folio.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Resolve {
            source,
            preset,
            variant,
            size,
            focus,
            json,
        } => {
            let media = Media::open(&cli.config, cli.media_root, cli.media_url)?;
            let resolver =
                VariantResolver::new(&media.storage).with_options(media.config.variant_options());
            let spec = match (variant, size) {
                (Some(name), Some((width, height))) => {
                    VariantSpec::new(name, width, height).with_focus(focus.focus())
                }
                _ => {
                    let name = preset.as_deref().unwrap_or(featured::CARD.name);
                    media
                        .config
                        .preset(name, focus.focus())
                        .ok_or_else(|| format!("unknown preset {name:?}"))?
                }
            };
            let resolution = resolver.resolve_detailed(&source, &spec);
            if json {
                let report = ResolutionReport::new(&source, &spec, &resolution);
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                output::print_resolution(&source, &spec, &resolution);
            }
        }
        Command::Warm { subdir, focus } => {
            let media = Media::open(&cli.config, cli.media_root, cli.media_url)?;
            let resolver =
                VariantResolver::new(&media.storage).with_options(media.config.variant_options());
            let walk_root = match &subdir {
                Some(dir) => media.root.join(dir),
                None => media.root.clone(),
            };
            let sources =
                collect_sources(&media.root, &walk_root, &media.config.variants.directory)?;
            let specs = media.config.preset_specs(focus.focus());

            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(config::effective_threads(&media.config.processing))
                .build()?;
            let results: Vec<(String, Vec<(VariantSpec, Resolution)>)> = pool.install(|| {
                sources
                    .par_iter()
                    .map(|source| {
                        let per_preset = specs
                            .iter()
                            .map(|spec| (spec.clone(), resolver.resolve_detailed(source, spec)))
                            .collect();
                        (source.clone(), per_preset)
                    })
                    .collect()
            });

            let mut stats = VariantStats::default();
            for (source, per_preset) in &results {
                output::print_warm_image(source, per_preset);
                for (_, resolution) in per_preset {
                    stats.record(&resolution.outcome);
                }
            }
            output::print_warm_summary(results.len(), &stats);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Loaded config plus the storage it points at, with CLI overrides applied.
struct Media {
    config: MediaConfig,
    root: PathBuf,
    storage: FileSystemStorage,
}

impl Media {
    fn open(
        config_path: &Path,
        root_override: Option<PathBuf>,
        url_override: Option<String>,
    ) -> Result<Self, config::ConfigError> {
        let config = config::load_config(config_path)?;
        let root = root_override.unwrap_or_else(|| PathBuf::from(&config.media_root));
        let url = url_override.unwrap_or_else(|| config.media_url.clone());
        let storage = FileSystemStorage::new(&root, url);
        Ok(Self {
            config,
            root,
            storage,
        })
    }
}

/// Install the stderr log subscriber. `-v` shows cache decisions.
fn init_logging(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

/// Parse `WIDTHxHEIGHT` into a non-zero box size.
fn parse_size(s: &str) -> Result<(u32, u32), String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got {s:?}"))?;
    let width: u32 = w.trim().parse().map_err(|_| format!("invalid width {w:?}"))?;
    let height: u32 = h.trim().parse().map_err(|_| format!("invalid height {h:?}"))?;
    if width == 0 || height == 0 {
        return Err("width and height must be non-zero".into());
    }
    Ok((width, height))
}

fn parse_variant_name(s: &str) -> Result<String, String> {
    if is_variant_slug(s) {
        Ok(s.to_string())
    } else {
        Err(format!("{s:?} must use only a-z, 0-9 and '-'"))
    }
}

/// Storage names of every supported source image under `walk_root`,
/// skipping reserved variant directories. Sorted for stable output.
fn collect_sources(
    media_root: &Path,
    walk_root: &Path,
    variants_dir: &str,
) -> Result<Vec<String>, walkdir::Error> {
    let extensions = supported_input_extensions();
    let mut sources = Vec::new();
    for entry in WalkDir::new(walk_root)
        .into_iter()
        .filter_entry(|e| !(e.file_type().is_dir() && e.file_name() == variants_dir))
    {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let supported = entry
            .path()
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| extensions.contains(&e.to_ascii_lowercase().as_str()));
        if !supported {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(media_root) else {
            continue;
        };
        let name = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        if !is_variant_name(&name, variants_dir) {
            sources.push(name);
        }
    }
    sources.sort();
    Ok(sources)
}
