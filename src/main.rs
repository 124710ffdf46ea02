mod convert;
mod docjson;
mod guide;
mod parser;

use std::path::PathBuf;

use clap::Parser;

#[derive(Parser)]
#[command(
    name = "guide_converter",
    about = "Convert quest guide document exports into checklist JSON"
)]
struct Cli {
    /// Input document exports followed by the output path. With no paths,
    /// scans data/ for *.json and writes data/guide_data.json.
    paths: Vec<PathBuf>,

    /// Title stamped on the combined guide
    #[arg(long, default_value = "BRUHsailer")]
    title: String,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    let (inputs, output) = match cli.paths.split_last() {
        Some((output, inputs)) if !inputs.is_empty() => (inputs.to_vec(), output.clone()),
        Some((output, _)) => (convert::default_inputs()?, output.clone()),
        None => (convert::default_inputs()?, convert::default_output()),
    };

    convert::run(&inputs, &output, &cli.title)
}
