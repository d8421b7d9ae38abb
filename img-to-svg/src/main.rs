use clap::builder::PossibleValuesParser;
use clap::Parser;
use img_to_svg::{catch_panic, convert, ConvertError, ConvertOptions, QualityMode};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

/// Convert images to SVG vectors.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to input image file
    #[arg(required_unless_present = "print_profile", value_hint = clap::ValueHint::FilePath)]
    input: Option<PathBuf>,

    /// Path to output SVG file [default: input with .svg extension]
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    output: Option<PathBuf>,

    /// Quality mode
    #[arg(long, default_value = "maximum", value_parser = PossibleValuesParser::new(QualityMode::NAMES))]
    mode: String,

    /// Embed raster in SVG
    #[arg(long)]
    hybrid: bool,

    /// Print the tracing parameters for --mode as JSON and exit
    #[arg(long)]
    print_profile: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    if cli.print_profile {
        let profile = QualityMode::from_name(&cli.mode).profile();
        return match serde_json::to_string_pretty(&profile) {
            Ok(json) => {
                println!("{json}");
                ExitCode::SUCCESS
            }
            Err(e) => {
                println!("Error: {e}");
                ExitCode::FAILURE
            }
        };
    }

    let Some(input) = cli.input else {
        return ExitCode::FAILURE;
    };

    if !input.exists() {
        error!("{}", ConvertError::InputNotFound(input.clone()));
        println!("Error: Input file '{}' not found.", input.display());
        return ExitCode::FAILURE;
    }

    let options = ConvertOptions {
        input,
        output: cli.output,
        mode: cli.mode,
        hybrid: cli.hybrid,
        temp_dir: None,
    };

    match catch_panic(|| convert(&options)) {
        Ok(output) => {
            info!("Conversion complete: {}", output.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Conversion failed: {e:#}");
            println!("Error: {e:#}");
            eprintln!("{e:?}");
            ExitCode::FAILURE
        }
    }
}
