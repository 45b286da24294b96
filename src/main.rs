use anyhow::Result;
use log::{error, info, warn};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tremorlink::ble::drivers::BtleCentral;
use tremorlink::core::{ControlCommand, PipelineConfig};
use tremorlink::pipeline::{DisplayEvent, Pipeline};
use tremorlink::workers::{CsvSink, LinearModel};

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let config = match std::env::args().nth(1) {
        Some(path) => PipelineConfig::from_file(path)?,
        None => PipelineConfig::default(),
    };

    let central = Arc::new(BtleCentral::new().await?);
    let sink = CsvSink::create(&config.data_dir).await?;
    info!("logging samples to {}", sink.path().display());
    let model = Box::new(LinearModel::new(&config.model_path));

    let (display_tx, mut display_rx) = mpsc::channel(100);
    let pipeline = Pipeline::spawn(config, central, model, Box::new(sink), display_tx).await?;

    // Operator input: two kHz values per line, written to the stimulation
    // characteristics.
    let commands = pipeline.commands();
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            match parse_frequencies(&line) {
                Ok(command) => {
                    if commands.send(command).await.is_err() {
                        break;
                    }
                }
                Err(message) => warn!("invalid frequency entry: {message}"),
            }
        }
    });

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("shutting down");
                break;
            }
            event = display_rx.recv() => match event {
                Some(event) => show(event),
                None => break,
            },
        }
    }

    let state = pipeline.shutdown().await?;
    info!("session ended in state {}", state.name());
    Ok(())
}

fn parse_frequencies(line: &str) -> Result<ControlCommand, String> {
    let mut fields = line.split_whitespace();
    let freq1 = fields
        .next()
        .and_then(|f| f.parse::<f64>().ok())
        .ok_or_else(|| line.to_string())?;
    let freq2 = fields
        .next()
        .and_then(|f| f.parse::<f64>().ok())
        .ok_or_else(|| line.to_string())?;
    ControlCommand::from_khz(freq1, freq2).map_err(|e| e.to_string())
}

fn show(event: DisplayEvent) {
    match event {
        DisplayEvent::Sample(sample) => info!("sample {sample}"),
        DisplayEvent::Prediction(result) => info!("prediction {result}"),
        DisplayEvent::Status(message) => info!("{message}"),
        DisplayEvent::Error(message) => error!("{message}"),
        DisplayEvent::Ready => info!("Ready"),
    }
}
