//! feedshot CLI
//!
//! Usage:
//!   feedshot [OPTIONS] <COMMAND>
//!
//! Commands:
//!   render      Substitute values into a template and export a background preview image
//!   substitute  Substitute values into a template and print the markup
//!   new         Create a template from an SVG file
//!   scan        List the placeholder tokens in an SVG file
//!   lint        Check a template's placeholder declarations
//!   defaults    Write the built-in templates as JSON

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use feedshot::substitution::scan_placeholders;
use feedshot::template::{default_template, default_templates, lint};
use feedshot::{
    FeedshotConfig, FlatRasterizer, ImageFormat, RasterBackend, RenderingBackend,
    SubstitutionError, Template, TemplateKind, TemplateManager, UnresolvedPolicy, Value,
};

#[derive(Parser)]
#[command(name = "feedshot")]
#[command(about = "Mock social-feed screenshots from SVG templates")]
struct Cli {
    /// Configuration file (TOML format)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace); FEEDSHOT_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Substitute values into a template and export a background preview image
    ///
    /// The built-in rasterizer is a preview: it fills the image with the
    /// template's background (the first <rect> fill) and does not draw text,
    /// shapes or images. Use `substitute` to get the full SVG.
    Render {
        #[command(flatten)]
        input: TemplateInput,

        /// Output image path
        #[arg(short, long)]
        output: PathBuf,

        /// Image format (png, jpeg, bmp); guessed from the output extension
        #[arg(short, long)]
        format: Option<ImageFormat>,

        /// Output width in pixels
        #[arg(long)]
        width: Option<u32>,

        /// Output height in pixels
        #[arg(long)]
        height: Option<u32>,
    },

    /// Substitute values into a template and print the markup
    Substitute {
        #[command(flatten)]
        input: TemplateInput,

        /// Write the markup here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Create a template from an SVG file
    New {
        /// SVG file
        svg: PathBuf,

        /// Template kind (moment, chat, profile, other)
        #[arg(short, long, default_value = "other")]
        kind: TemplateKind,

        /// Template name (defaults to the file stem)
        #[arg(short, long)]
        name: Option<String>,

        /// Output template JSON path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// List the placeholder tokens in an SVG file
    Scan {
        svg: PathBuf,
    },

    /// Check a template's placeholder declarations
    Lint {
        #[command(flatten)]
        input: TemplateSource,
    },

    /// Write the built-in templates as JSON
    Defaults {
        /// Directory to write into
        #[arg(short, long, default_value = ".")]
        out_dir: PathBuf,
    },
}

#[derive(Args)]
#[group(required = true, multiple = false)]
struct TemplateSource {
    /// Template JSON file
    #[arg(short, long)]
    template: Option<PathBuf>,

    /// Use the built-in template of this kind
    #[arg(short, long)]
    builtin: Option<TemplateKind>,
}

#[derive(Args)]
struct TemplateInput {
    #[command(flatten)]
    source: TemplateSource,

    /// Placeholder value as NAME=VALUE (repeatable; later values win)
    #[arg(short, long = "set", value_name = "NAME=VALUE")]
    set: Vec<String>,

    /// JSON object of placeholder values
    #[arg(long)]
    values: Option<PathBuf>,

    /// Fail on tokens that have no value instead of leaving them in place
    #[arg(long)]
    strict: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_env("FEEDSHOT_LOG").unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => FeedshotConfig::from_file(path)
            .with_context(|| format!("loading config '{}'", path.display()))?,
        None => FeedshotConfig::default(),
    };

    match cli.command {
        Command::Render {
            input,
            output,
            format,
            width,
            height,
        } => {
            let (template, values, substitution) = prepare(&input, &config)?;
            let markup = substitute_or_report(&template, values, &substitution)?;

            let mut params = config.render_parameters(template.presentation.device.output_size());
            if let Some(width) = width {
                params.width = width;
            }
            if let Some(height) = height {
                params.height = height;
            }
            let format = format
                .or_else(|| ImageFormat::from_path(&output))
                .unwrap_or(params.format);

            let mut backend = RasterBackend::new(FlatRasterizer::with_palette(
                substitution.palette.clone(),
            ))
            .with_jpeg_quality(params.jpeg_quality)
            .with_cache_capacity(config.render.cache_capacity);
            if !params.use_cache {
                backend = backend.without_cache();
            }
            backend
                .export_to_image(
                    &markup,
                    &output,
                    format,
                    params.width,
                    params.height,
                    &CancellationToken::new(),
                )
                .await
                .with_context(|| format!("exporting '{}'", output.display()))?;
            println!("{}", output.display());
        }
        Command::Substitute { input, output } => {
            let (template, values, substitution) = prepare(&input, &config)?;
            let markup = substitute_or_report(&template, values, &substitution)?;
            match output {
                Some(path) => fs::write(&path, markup)
                    .with_context(|| format!("writing '{}'", path.display()))?,
                None => print!("{}", markup),
            }
        }
        Command::New {
            svg,
            kind,
            name,
            output,
        } => {
            let markup = read_file(&svg)?;
            let name = name.unwrap_or_else(|| {
                svg.file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "untitled".to_string())
            });
            let mut manager = TemplateManager::new();
            let id = manager.create(kind, name, markup)?;
            let path = manager.export_file(id, &output)?;
            info!(path = %path.display(), "wrote template");
            println!("{}", path.display());
        }
        Command::Scan { svg } => {
            let markup = read_file(&svg)?;
            for name in scan_placeholders(&markup) {
                println!("{}", name);
            }
        }
        Command::Lint { input } => {
            let template = load_template(&input)?;
            let warnings = lint::check(&template);
            for warning in &warnings {
                println!("{}", warning);
            }
            if !warnings.is_empty() {
                bail!("{} lint warning(s) in '{}'", warnings.len(), template.name);
            }
            println!("{}: no issues", template.name);
        }
        Command::Defaults { out_dir } => {
            fs::create_dir_all(&out_dir)
                .with_context(|| format!("creating '{}'", out_dir.display()))?;
            let mut manager = TemplateManager::with_base_path(out_dir);
            for template in default_templates() {
                let file = format!("{}.json", template.kind);
                let id = manager.insert(template)?;
                let path = manager.export_file(id, file)?;
                println!("{}", path.display());
            }
        }
    }

    Ok(())
}

fn read_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("reading '{}'", path.display()))
}

fn load_template(source: &TemplateSource) -> Result<Template> {
    match (&source.template, source.builtin) {
        (Some(path), _) => {
            let mut manager = TemplateManager::new();
            let id = manager.import_file(path)?;
            manager
                .delete(id)
                .with_context(|| format!("loading '{}'", path.display()))
        }
        (None, Some(kind)) => match default_template(kind) {
            Some(template) => Ok(template),
            None => bail!("there is no built-in {} template", kind),
        },
        (None, None) => bail!("either --template or --builtin is required"),
    }
}

/// Load the template and collect values from `--values` then `--set`
fn prepare(
    input: &TemplateInput,
    config: &FeedshotConfig,
) -> Result<(Template, Vec<(String, Value)>, feedshot::SubstitutionConfig)> {
    let template = load_template(&input.source)?;
    let mut values = Vec::new();

    if let Some(path) = &input.values {
        let json: serde_json::Value = serde_json::from_str(&read_file(path)?)
            .with_context(|| format!("parsing '{}'", path.display()))?;
        let Some(object) = json.as_object() else {
            bail!("'{}' must contain a JSON object", path.display());
        };
        for (name, raw) in object {
            let value = match template.placeholder(name) {
                Some(def) => Value::from_json_typed(def.ty, raw)
                    .with_context(|| format!("value for '{}'", name))?,
                None => Some(Value::from_json(raw)),
            };
            if let Some(value) = value {
                values.push((name.clone(), value));
            }
        }
    }

    for assignment in &input.set {
        let Some((name, raw)) = assignment.split_once('=') else {
            bail!("expected NAME=VALUE, got '{}'", assignment);
        };
        let value = match template.placeholder(name) {
            Some(def) => Value::parse_typed(def.ty, raw)
                .with_context(|| format!("value for '{}'", name))?,
            None => Value::Text(raw.to_string()),
        };
        values.push((name.to_string(), value));
    }

    let mut substitution = config.substitution_config()?;
    if input.strict {
        substitution = substitution.with_unresolved(UnresolvedPolicy::Fail);
    }
    debug!(template = %template.name, values = values.len(), "prepared substitution");
    Ok((template, values, substitution))
}

/// Substitute, printing an annotated report against the markup on failure
fn substitute_or_report(
    template: &Template,
    values: Vec<(String, Value)>,
    config: &feedshot::SubstitutionConfig,
) -> Result<String> {
    feedshot::apply_variables(template, values, config).map_err(|e: SubstitutionError| {
        eprint!("{}", e.format(template.markup(), &template.name));
        e.into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_render_help_mentions_preview() {
        let cli = Cli::command();
        let render = cli.find_subcommand("render").unwrap();
        let about = render.get_about().unwrap().to_string();
        assert!(about.contains("preview"));
        let long = render.get_long_about().unwrap().to_string();
        assert!(long.contains("does not draw text"));
    }
}
