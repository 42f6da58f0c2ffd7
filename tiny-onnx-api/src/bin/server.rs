use std::{net::SocketAddr, path::PathBuf, sync::Arc};

use anyhow::Context;
use clap::Parser;
use tiny_onnx::{check_model, io, Evaluator};
use tiny_onnx_api::{service, setup_logging};
use tracing::{info, level_filters::LevelFilter};

#[derive(Parser)]
#[command(version, about)]
struct Args {
    /// The ONNX model to serve
    #[arg(short = 'm', long, env = "TINY_ONNX_MODEL", default_value = "model.onnx")]
    model: PathBuf,

    /// Address the prediction API listens on
    #[arg(long, env = "TINY_ONNX_ADDR", default_value = "127.0.0.1:8082")]
    addr: SocketAddr,

    /// Should the logs be printed in json format or not
    #[arg(long, env = "TINY_ONNX_JSON_LOGS")]
    json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    setup_logging(args.json, LevelFilter::INFO)?;

    let proto = io::load(&args.model)
        .with_context(|| format!("loading model from {}", args.model.display()))?;
    check_model(&proto).context("validating model")?;
    let evaluator = Evaluator::from_proto(&proto).context("preparing model")?;
    info!(
        "Starting prediction API for {} on http://{}",
        args.model.display(),
        args.addr
    );

    service::serve(args.addr, Arc::new(evaluator)).await
}
