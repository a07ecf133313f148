//! devpack CLI
//!
//! Entry point for the `devpack` command-line tool.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process;

use devpack::compose::{
    compose, ComposeError, ComposeOptions, ComposedConfig, Environment, Platform,
};
use devpack::compose::{exclusion_set, vendor_bundles, CommonSource, JsonFileCommon, StaticCommon};
use devpack::pkg::PackageManifest;
use devpack::project::ProjectRoot;
use devpack::settings::Settings;

#[derive(Parser)]
#[command(name = "devpack")]
#[command(about = "Development-mode bundler configuration composer", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Inputs shared by every subcommand
#[derive(Args)]
struct InputArgs {
    /// Project root directory
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// Settings file, relative to the root
    #[arg(long, short = 's', default_value = "devpack.toml")]
    settings: PathBuf,

    /// Common-layer JSON file, relative to the root (default: empty layer)
    #[arg(long, short = 'c')]
    common: Option<PathBuf>,

    /// Target platform (anything other than "server" is browser)
    #[arg(long, short = 'p', default_value = "browser")]
    platform: String,

    /// Environment name passed to the common layer
    #[arg(long, default_value = "development")]
    env: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Compose the configuration and print it as JSON
    Compose {
        #[command(flatten)]
        input: InputArgs,

        /// Pretty-print the output
        #[arg(long)]
        pretty: bool,

        /// Write the output to a file instead of stdout
        #[arg(long, short = 'o')]
        out: Option<PathBuf>,
    },

    /// Explain the composition in human-readable form
    Explain {
        #[command(flatten)]
        input: InputArgs,
    },

    /// Verify the settings file and package manifest
    Verify {
        #[command(flatten)]
        input: InputArgs,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("devpack=warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Compose { input, pretty, out } => {
            run_compose(&input, pretty, out);
        }
        Commands::Explain { input } => {
            run_explain(&input);
        }
        Commands::Verify { input } => {
            run_verify(&input);
        }
    }
}

struct Inputs {
    root: ProjectRoot,
    settings: Settings,
    common: Box<dyn CommonSource>,
    options: ComposeOptions,
}

fn load_inputs(args: &InputArgs) -> Result<Inputs, ComposeError> {
    let root = ProjectRoot::new(&args.root);

    let (settings, _digest) = Settings::from_file(&root.resolve(&args.settings))?;

    let common: Box<dyn CommonSource> = match &args.common {
        Some(rel) => Box::new(JsonFileCommon::open(&root, rel)?),
        None => Box::new(StaticCommon::empty()),
    };

    let options = ComposeOptions {
        platform: Some(Platform::from_name(&args.platform)),
        env: Environment::from_name(&args.env),
    };

    Ok(Inputs {
        root,
        settings,
        common,
        options,
    })
}

fn compose_from(args: &InputArgs) -> Result<(Inputs, ComposedConfig), ComposeError> {
    let inputs = load_inputs(args)?;
    let composed = compose(
        &inputs.options,
        &inputs.root,
        &inputs.settings,
        inputs.common.as_ref(),
    )?;
    Ok((inputs, composed))
}

fn run_compose(args: &InputArgs, pretty: bool, out: Option<PathBuf>) {
    let (_, composed) = match compose_from(args) {
        Ok(result) => result,
        Err(e) => {
            eprintln!("Error composing configuration: {}", e);
            process::exit(e.exit_code());
        }
    };

    let json = if pretty {
        composed.to_json()
    } else {
        serde_json::to_string(&composed)
    };

    match json {
        Ok(json) => {
            if let Some(path) = out {
                if let Err(e) = std::fs::write(&path, json) {
                    eprintln!("Error writing {}: {}", path.display(), e);
                    process::exit(1);
                }
            } else {
                println!("{}", json);
            }
        }
        Err(e) => {
            eprintln!("Error serializing output: {}", e);
            process::exit(1);
        }
    }
}

fn run_explain(args: &InputArgs) {
    let (inputs, composed) = match compose_from(args) {
        Ok(result) => result,
        Err(e) => {
            eprintln!("Error composing configuration: {}", e);
            process::exit(e.exit_code());
        }
    };

    let platform = inputs.options.platform.unwrap_or(Platform::Browser);
    println!("Platform: {}", platform.as_str());
    println!("Environment: {}", inputs.options.env.as_str());
    println!();

    println!("Layers:");
    for source in &composed.sources {
        match (&source.path, &source.digest) {
            (Some(path), Some(digest)) => {
                println!("  {:?} ({}, sha256 {})", source.origin, path, &digest[..12]);
            }
            _ => println!("  {:?} (built-in)", source.origin),
        }
    }
    println!();

    if platform != Platform::Server {
        let exclusions = exclusion_set(&inputs.settings.bundles);
        println!("Excluded from vendor: {}", exclusions.join(", "));

        if let Ok((manifest, _)) = PackageManifest::from_file(&inputs.root.resolve("package.json"))
        {
            let vendor = vendor_bundles(&manifest, &exclusions);
            println!(
                "Vendor bundle ({} modules): {}",
                vendor.len(),
                vendor.join(", ")
            );
        }
        println!();
    }

    println!("Plugins ({}):", composed.plugins().len());
    for plugin in composed.plugins() {
        let kind = plugin
            .get("plugin")
            .and_then(|v| v.as_str())
            .unwrap_or("unknown");
        match plugin.get("name") {
            Some(name) => println!("  {} (name: {})", kind, name),
            None => println!("  {}", kind),
        }
    }

    match composed.digest() {
        Ok(digest) => {
            println!();
            println!("Config digest: sha256-{}", digest);
        }
        Err(e) => {
            eprintln!("Error computing digest: {}", e);
            process::exit(e.exit_code());
        }
    }
}

fn run_verify(args: &InputArgs) {
    let root = ProjectRoot::new(&args.root);

    let settings = match Settings::from_file(&root.resolve(&args.settings)) {
        Ok((settings, _)) => {
            println!("Settings valid: {}", args.settings.display());
            settings
        }
        Err(e) => {
            eprintln!("Settings error: {}", e);
            process::exit(10);
        }
    };

    println!("  Devtool (dev): {}", settings.devtool.dev);
    println!("  Polyfill bundles: {}", settings.bundles.polyfills.len());
    println!("  Server bundles: {}", settings.bundles.server.len());

    match PackageManifest::from_file(&root.resolve("package.json")) {
        Ok((manifest, _)) => {
            println!("Package manifest valid");
            println!("  Dependencies: {}", manifest.dependency_names().count());

            let exclusions = exclusion_set(&settings.bundles);
            let vendor = vendor_bundles(&manifest, &exclusions);
            println!("  Vendor bundle members: {}", vendor.len());
        }
        Err(e) => {
            eprintln!("Package manifest error: {}", e);
            process::exit(20);
        }
    }
}
