use anyhow::{bail, Context, Result};
use log::info;
use serde_json::Value;

use pulsetab::engine::{EstimatorPool, FrameSource};
use pulsetab::ingest::DirectorySource;
use pulsetab::PulseConfig;

fn load_config(path: Option<&String>) -> Result<PulseConfig> {
    let Some(path) = path else {
        return PulseConfig::from_json(Value::Null);
    };
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path))?;
    let value: Value = serde_json::from_str(&text).with_context(|| format!("parsing {}", path))?;
    PulseConfig::from_json(value)
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 || args.len() > 3 {
        bail!("usage: {} <frames-dir> [config.json]", args[0]);
    }

    let config = load_config(args.get(2))?;
    let pool = EstimatorPool::from_config(&config)?;
    let mut source = DirectorySource::open(&args[1])?;
    info!("Replaying {} frames from {}", source.len(), args[1]);

    let mut session = pool.open_session()?;
    // Sequential replay: end of directory is not a disconnect, every frame is answered
    while let Some(frame) = source.next_frame().await {
        let estimate = session.process(frame).await?;
        println!("{}", serde_json::to_string(&estimate)?);
    }

    eprintln!("{}", pool.monitor().generate_report());
    Ok(())
}
