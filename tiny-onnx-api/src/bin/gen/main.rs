use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tiny_onnx::{
    io,
    pb::{tensor_proto::DataType, ModelProto, TensorProto, ValueInfoProto},
    Evaluator, MulModelSpec,
};
use tiny_onnx_api::setup_logging;
use tracing::{debug, level_filters::LevelFilter};

#[derive(Parser)]
#[command(version, about)]
struct Args {
    /// Where the generated model is written
    #[arg(short, long, env = "TINY_ONNX_OUTPUT", default_value = "model.onnx")]
    output: PathBuf,

    /// JSON file overriding the model literals
    #[arg(long, env = "TINY_ONNX_SPEC")]
    spec: Option<PathBuf>,

    /// Multiplier stored in the constant initializer
    #[arg(long, allow_negative_numbers = true)]
    scale: Option<f32>,

    /// Should the logs be printed in json format or not
    #[arg(long, env = "TINY_ONNX_JSON_LOGS")]
    json: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Print a summary of a stored model.
    Inspect {
        /// The model to inspect
        #[arg(default_value = "model.onnx")]
        model: PathBuf,
    },

    /// Evaluate a stored model on a 1-D input.
    Eval {
        /// The model to evaluate
        #[arg(short = 'm', long, default_value = "model.onnx")]
        model: PathBuf,

        /// Input values
        #[arg(required = true, allow_negative_numbers = true)]
        values: Vec<f32>,
    },
}

fn generate(args: &Args) -> anyhow::Result<()> {
    let mut spec = match &args.spec {
        Some(path) => MulModelSpec::from_file(path)
            .with_context(|| format!("reading spec {}", path.display()))?,
        None => MulModelSpec::default(),
    };
    if let Some(scale) = args.scale {
        spec.scale = scale;
    }
    debug!("generating with {spec:?}");

    let model = spec.build().context("building model")?;
    io::save(&model, &args.output).context("saving model")?;

    println!("{} generated successfully!", args.output.display());
    Ok(())
}

fn names(values: &[ValueInfoProto]) -> String {
    values
        .iter()
        .map(|v| v.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Renders the payload of an initializer, whichever field it is stored in.
fn values(init: &TensorProto) -> String {
    if init.raw_data.is_empty() {
        return format!("{:?}", init.float_data);
    }
    if init.data_type == DataType::Float as i32 && init.raw_data.len() % 4 == 0 {
        let floats: Vec<f32> = init
            .raw_data
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect();
        format!("{floats:?}")
    } else {
        format!("<{} raw bytes>", init.raw_data.len())
    }
}

fn summary(model: &ModelProto) -> String {
    let mut lines = vec![format!(
        "producer: {} {} (ir {}, opset {})",
        model.producer_name,
        model.producer_version,
        model.ir_version,
        model
            .opset_import
            .iter()
            .map(|o| o.version.to_string())
            .collect::<Vec<_>>()
            .join(",")
    )];
    if let Some(graph) = &model.graph {
        lines.push(format!("graph: {}", graph.name));
        lines.push(format!("  inputs: {}", names(&graph.input)));
        lines.push(format!("  outputs: {}", names(&graph.output)));
        for init in &graph.initializer {
            lines.push(format!(
                "  initializer {} dims {:?} values {}",
                init.name,
                init.dims,
                values(init)
            ));
        }
        for node in &graph.node {
            lines.push(format!(
                "  node {}({}) -> {}",
                node.op_type,
                node.input.join(", "),
                node.output.join(", ")
            ));
        }
    }
    lines.join("\n")
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    setup_logging(args.json, LevelFilter::WARN)?;

    match &args.command {
        None => generate(&args),
        Some(Command::Inspect { model }) => {
            let proto = io::load(model)
                .with_context(|| format!("loading model from {}", model.display()))?;
            println!("{}", summary(&proto));
            Ok(())
        }
        Some(Command::Eval { model, values }) => {
            let output = Evaluator::from_path(model)?.run(values)?;
            println!("{output:?}");
            Ok(())
        }
    }
}
