//
// Copyright (c) 2025 TRUSTEDGE LABS LLC
// This source code is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Project: stegowire — Payloads hidden in carrier images.
//

use std::path::{Path, PathBuf};
use std::process;
use std::time::Instant;

use anyhow::Result;
use clap::{ArgAction, Args, Parser, Subcommand};
use log::{info, warn};
use walkdir::WalkDir;
use zeroize::Zeroizing;

use stegowire_core::{
    compare_files, embed, extract, inspect, ArgError, ChannelPreset, EmbedMode, EmbedOptions,
    EmbedSummary, ExtractOptions, StegoError,
};

mod report;
use report::{append_row, open_report, BenchRow};

#[derive(Parser, Debug)]
#[command(
    name = "stegowire",
    author,
    version,
    about = "Hide payloads in carrier images and recover them bit-exactly",
    long_about = None
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Embed a payload file or directory into a cover image
    Embed(EmbedCmd),
    /// Recover a payload from a stego container
    Extract(ExtractCmd),
    /// Print a stego container's metadata without extracting
    Inspect(InspectCmd),
    /// Compare a cover and a stego image (PSNR / RMSE)
    Metrics(MetricsCmd),
    /// Embed a payload into every cover under a directory, appending a CSV row each
    Bench(BenchCmd),
}

#[derive(Args, Debug)]
struct EmbedCmd {
    #[arg(short = 'm', long = "mode", value_name = "MODE", help = "append | dct")]
    mode: String,
    #[arg(short = 'c', long = "cover", value_name = "PATH")]
    cover: PathBuf,
    #[arg(short = 'p', long = "payload", value_name = "PATH")]
    payload: PathBuf,
    #[arg(short = 'o', long = "out", value_name = "PATH")]
    out: PathBuf,
    #[arg(long, value_name = "F", default_value_t = 1.0, help = "Bits per eligible coefficient, (0, 1]")]
    rate: f64,
    #[arg(long, value_name = "NAME", default_value = "none", help = "none | whatsapp | telegram")]
    channel: String,
    #[arg(long, help = "Encrypt the payload with AES-256-GCM")]
    encrypt: bool,
    #[arg(long, value_name = "S", conflicts_with = "pass_env")]
    password: Option<String>,
    #[arg(long = "pass-env", value_name = "NAME", help = "Read the password from this environment variable")]
    pass_env: Option<String>,
}

#[derive(Args, Debug)]
struct ExtractCmd {
    #[arg(short = 's', long = "stego", value_name = "PATH")]
    stego: PathBuf,
    #[arg(short = 'o', long = "out-dir", value_name = "DIR")]
    out_dir: PathBuf,
    #[arg(long, value_name = "S", conflicts_with = "pass_env")]
    password: Option<String>,
    #[arg(long = "pass-env", value_name = "NAME")]
    pass_env: Option<String>,
}

#[derive(Args, Debug)]
struct InspectCmd {
    #[arg(short = 's', long = "stego", value_name = "PATH")]
    stego: PathBuf,
    #[arg(long, help = "Output metadata as JSON")]
    json: bool,
}

#[derive(Args, Debug)]
struct MetricsCmd {
    #[arg(long, value_name = "PATH")]
    cover: PathBuf,
    #[arg(long, value_name = "PATH")]
    stego: PathBuf,
}

#[derive(Args, Debug)]
struct BenchCmd {
    #[arg(long, value_name = "DIR")]
    covers: PathBuf,
    #[arg(long, value_name = "PATH")]
    payload: PathBuf,
    #[arg(short = 'm', long = "mode", value_name = "MODE")]
    mode: String,
    #[arg(long, value_name = "F", default_value_t = 1.0)]
    rate: f64,
    #[arg(long, value_name = "NAME", default_value = "none")]
    channel: String,
    #[arg(long, value_name = "CSV")]
    report: PathBuf,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(err) = run(cli) {
        eprintln!("error: {err:#}");
        let code = err
            .downcast_ref::<StegoError>()
            .map(StegoError::exit_code)
            .unwrap_or(3);
        process::exit(code);
    }
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Embed(args) => handle_embed(args),
        Commands::Extract(args) => handle_extract(args),
        Commands::Inspect(args) => handle_inspect(args),
        Commands::Metrics(args) => handle_metrics(args),
        Commands::Bench(args) => handle_bench(args),
    }
}

fn handle_embed(args: EmbedCmd) -> Result<()> {
    let opts = embed_options(
        &args.mode,
        args.rate,
        &args.channel,
        args.encrypt,
        args.password,
        args.pass_env,
    )?;

    let summary = embed(&args.cover, &args.payload, &args.out, &opts)?;
    print_embed_summary(&args.out, &summary);
    Ok(())
}

fn handle_extract(args: ExtractCmd) -> Result<()> {
    let opts = ExtractOptions {
        password: resolve_password(args.password, args.pass_env)?,
    };

    let summary = extract(&args.stego, &args.out_dir, &opts)?;
    println!("Recovered: {}", summary.written.display());
    println!(
        "Payload: {} ({} bytes, sha256 verified)",
        summary.meta.source_name, summary.meta.plain_size
    );
    Ok(())
}

fn handle_inspect(args: InspectCmd) -> Result<()> {
    let meta = inspect(&args.stego)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&meta)?);
        return Ok(());
    }

    println!("Mode: {}", meta.mode);
    println!("Format version: {}", meta.v);
    println!("Source: {} ({:?})", meta.source_name, meta.source_kind);
    println!("Plain size: {} bytes", meta.plain_size);
    println!("Blob size: {} bytes", meta.blob_size);
    println!("Encrypted: {}", meta.encrypted);
    println!(
        "Compression: {:?} ({:.1}% saved)",
        meta.comp,
        meta.comp_ratio * 100.0
    );
    println!("SHA-256: {}", meta.sha256);
    if let (Some(rate), Some(blocks), Some(used)) = (meta.rate, meta.block_count, meta.used_coefs)
    {
        println!("DCT: rate {rate:.4}, {blocks} blocks, {used} usable coefficients");
    }
    if let Some(preset) = meta.channel_preset {
        println!("Channel preset: {preset}");
    }
    Ok(())
}

fn handle_metrics(args: MetricsCmd) -> Result<()> {
    let fidelity = compare_files(&args.cover, &args.stego)?;
    println!("PSNR: {} dB", format_psnr(fidelity.psnr));
    println!("RMSE: {:.4}", fidelity.rmse);
    Ok(())
}

fn handle_bench(args: BenchCmd) -> Result<()> {
    let opts = embed_options(&args.mode, args.rate, &args.channel, false, None, None)?;

    let covers: Vec<PathBuf> = WalkDir::new(&args.covers)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file() && is_image(entry.path()))
        .map(|entry| entry.into_path())
        .collect();

    if covers.is_empty() {
        warn!("no covers found under {}", args.covers.display());
    }

    let mut writer = open_report(&args.report)?;
    let mut failures = 0usize;

    for (idx, cover) in covers.iter().enumerate() {
        let stego = std::env::temp_dir().join(format!(
            "stegowire-bench-{}-{idx}.stego",
            process::id()
        ));

        let start = Instant::now();
        let outcome = embed(cover, &args.payload, &stego, &opts);
        let latency_ms = start.elapsed().as_millis() as u64;

        let row = match outcome {
            Ok(summary) => {
                let fidelity = compare_files(cover, &stego);
                if let Err(ref err) = fidelity {
                    info!("metrics unavailable for {}: {err}", cover.display());
                }
                bench_row_ok(cover, &summary, latency_ms, fidelity.ok())
            }
            Err(err) => {
                failures += 1;
                BenchRow {
                    cover_path: cover.display().to_string(),
                    plain_size: None,
                    comp_method: None,
                    comp_ratio: None,
                    stego_size: None,
                    latency_ms,
                    psnr: None,
                    rmse: None,
                    status: err.to_string(),
                }
            }
        };

        append_row(&mut writer, &args.report, &row)?;
        let _ = std::fs::remove_file(&stego);
    }

    writer.flush().map_err(|e| StegoError::from(stegowire_core::IoError::Write {
        path: args.report.clone(),
        source: e,
    }))?;

    println!(
        "Bench: {} covers, {} failures, report {}",
        covers.len(),
        failures,
        args.report.display()
    );
    Ok(())
}

fn bench_row_ok(
    cover: &Path,
    summary: &EmbedSummary,
    latency_ms: u64,
    fidelity: Option<stegowire_core::Fidelity>,
) -> BenchRow {
    BenchRow {
        cover_path: cover.display().to_string(),
        plain_size: Some(summary.plain_size),
        comp_method: Some(format!("{:?}", summary.comp).to_lowercase()),
        comp_ratio: Some(summary.comp_ratio),
        stego_size: Some(summary.stego_size),
        latency_ms,
        psnr: fidelity.map(|f| f.psnr),
        rmse: fidelity.map(|f| f.rmse),
        status: "ok".to_string(),
    }
}

fn embed_options(
    mode: &str,
    rate: f64,
    channel: &str,
    encrypt: bool,
    password: Option<String>,
    pass_env: Option<String>,
) -> Result<EmbedOptions, StegoError> {
    let mode: EmbedMode = mode.parse().map_err(StegoError::from)?;
    let channel: ChannelPreset = channel.parse().map_err(StegoError::from)?;
    let password = resolve_password(password, pass_env)?;

    if encrypt && password.is_none() {
        return Err(ArgError::MissingPassword.into());
    }
    if !encrypt && password.is_some() {
        return Err(ArgError::PasswordWithoutEncrypt.into());
    }

    Ok(EmbedOptions {
        mode,
        rate,
        channel,
        password,
    })
}

fn resolve_password(
    password: Option<String>,
    pass_env: Option<String>,
) -> Result<Option<Zeroizing<String>>, StegoError> {
    if let Some(password) = password {
        return Ok(Some(Zeroizing::new(password)));
    }
    if let Some(name) = pass_env {
        return match std::env::var(&name) {
            Ok(value) => Ok(Some(Zeroizing::new(value))),
            Err(_) => Err(ArgError::MissingEnvVar(name).into()),
        };
    }
    Ok(None)
}

fn print_embed_summary(out: &Path, summary: &EmbedSummary) {
    println!("Mode: {}", summary.mode);
    println!(
        "Payload: {} bytes -> {} byte blob ({:?}, {:.1}% saved)",
        summary.plain_size,
        summary.blob_size,
        summary.comp,
        summary.comp_ratio * 100.0
    );
    if let Some(stats) = &summary.dct {
        println!(
            "Coefficients: {} usable of {} eligible (rate {:.4})",
            stats.used_coefs, stats.eligible, stats.rate
        );
    }
    println!("Stego: {} ({} bytes)", out.display(), summary.stego_size);
}

fn format_psnr(psnr: f64) -> String {
    if psnr.is_infinite() {
        "inf".to_string()
    } else {
        format!("{psnr:.2}")
    }
}

fn is_image(path: &Path) -> bool {
    matches!(
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref(),
        Some("jpg" | "jpeg" | "png")
    )
}
