use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::io::{self, BufReader};

use wmbus_ble_rs::bridge::{parse_session, strip, EnvelopeHeader, LineSink, SessionAnalysis, TelegramFormat};
use wmbus_ble_rs::util::hex::{encode_hex_upper, parse_hex_lenient};
use wmbus_ble_rs::{init_logger, log_info, ExtractorConfig, MeterAddress, Pipeline, RawNotification};

#[derive(Parser)]
#[command(name = "wmbus-ble")]
#[command(about = "Recover wM-Bus telegrams from BLE bridge notifications")]
struct Cli {
    /// JSON extractor configuration (defaults to the VW1871 / flowIQ 2101 rules)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Override the target meter serial (8 digits, as printed)
    #[arg(short, long, global = true)]
    meter: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Read notification lines from stdin, write telegram lines to stdout
    Extract {
        #[arg(short, long, value_enum, default_value_t = TelegramFormat::Pipe)]
        format: TelegramFormat,
    },
    /// Replay a captured session log
    Replay {
        file: PathBuf,
        #[arg(short, long, value_enum, default_value_t = TelegramFormat::Pipe)]
        format: TelegramFormat,
    },
    /// Show how a single notification is stripped, extracted and validated
    Inspect { hex: String },
    /// Summarize envelope headers, sequence bytes and frame lengths of a session log
    Analyze { session: PathBuf },
}

fn load_config(cli: &Cli) -> anyhow::Result<ExtractorConfig> {
    let mut config = match &cli.config {
        Some(path) => ExtractorConfig::from_file(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => ExtractorConfig::default(),
    };
    if let Some(serial) = &cli.meter {
        let meter = MeterAddress::from_serial_str(serial)?;
        config.meter = MeterAddress {
            serial: meter.serial,
            ..config.meter
        };
    }
    Ok(config)
}

fn inspect(pipeline: &mut Pipeline, hex: &str) -> anyhow::Result<()> {
    let payload = parse_hex_lenient(hex).context("parsing notification hex")?;
    let frame = strip(&payload);

    println!("Notification: {} bytes", payload.len());
    println!("Envelope:     {}", if frame.had_wrapper { "present" } else { "absent" });
    if frame.had_wrapper {
        match EnvelopeHeader::parse(frame.core) {
            Some(header) => println!(
                "Header:       {:?}, sequence 0x{:02X}{}",
                header.kind,
                header.sequence,
                header.extra.map(|b| format!(", extra 0x{b:02X}")).unwrap_or_default()
            ),
            None => println!("Header:       too short"),
        }
    }
    println!("Core:         {}", encode_hex_upper(frame.core));

    let outcome = pipeline.process(&RawNotification::new(payload, "inspect"))?;
    println!("Rule:         {}", outcome.rule_id);
    for telegram in &outcome.telegrams {
        println!(
            "Accepted:     {} @{} {}",
            telegram.frame_kind(),
            telegram.offset(),
            telegram.to_hex()
        );
        if let Some(fields) = telegram.fields() {
            println!("Fields:       {fields}");
        }
    }
    for rejection in &outcome.rejections {
        println!("Rejected:     {rejection}");
    }
    if outcome.incomplete_trailing {
        println!("Trailing:     incomplete frame dropped");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logger();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    let mut pipeline = Pipeline::new(&config)?;
    log_info(&format!("Target meter {}", config.meter));

    match cli.command {
        Commands::Extract { format } => {
            let mut sink = LineSink::new(io::stdout(), format);
            let stats = pipeline
                .run_lines(BufReader::new(io::stdin()), "stdin", &mut sink)
                .await?;
            log_info(&format!("Wrote {} telegrams ({})", sink.written(), stats.summary()));
        }
        Commands::Replay { file, format } => {
            let text = tokio::fs::read_to_string(&file)
                .await
                .with_context(|| format!("reading session log {}", file.display()))?;
            let notifications = parse_session(&text);
            log_info(&format!("Replaying {} notifications from {}", notifications.len(), file.display()));
            let mut sink = LineSink::new(io::stdout(), format);
            pipeline.run_notifications(notifications, &mut sink).await?;
        }
        Commands::Inspect { hex } => inspect(&mut pipeline, &hex)?,
        Commands::Analyze { session } => {
            let text = tokio::fs::read_to_string(&session)
                .await
                .with_context(|| format!("reading session log {}", session.display()))?;
            let notifications = parse_session(&text);
            let analysis = SessionAnalysis::from_notifications(&notifications);
            if let Some((pattern, count)) = analysis.dominant_header() {
                log_info(&format!("Dominant header {pattern} ({count} envelopes)"));
            }
            print!("{analysis}");
        }
    }

    Ok(())
}
