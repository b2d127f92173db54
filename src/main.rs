use clap::Parser;
use glob::glob;
use log::LevelFilter;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use pushpng::{
    BenignErrors, DecoderConfig, Logger, PngInfo, PngWarning, ProgressiveHandler, PushDecoder, Transformations,
};

#[derive(Parser, Debug)]
#[clap(name = "pushpng")]
struct Cli {
    #[arg(required = true, help = "File or glob pattern")]
    path: String,

    #[arg(long, default_value_t = 4096, help = "Bytes fed to the decoder per call")]
    chunk_size: usize,

    #[arg(long, help = "Expand interlaced passes to full rows")]
    expand_interlace: bool,

    #[arg(long, help = "Treat benign errors as fatal")]
    strict: bool,

    #[arg(long, help = "Print image metadata")]
    info: bool,

    #[arg(short, long, help = "Enable debug logging")]
    verbose: bool,
}

#[derive(Default)]
struct Summary {
    info: Option<PngInfo>,
    rows: usize,
    placeholders: usize,
    warnings: Vec<PngWarning>,
    finished: bool,
}

impl ProgressiveHandler for Summary {
    fn on_info(&mut self, info: &PngInfo) {
        self.info = Some(info.clone());
    }

    fn on_row(&mut self, row: Option<&[u8]>, _row_index: u32, _pass: u8) {
        match row {
            Some(_) => self.rows += 1,
            None => self.placeholders += 1,
        }
    }

    fn on_end(&mut self, info: &PngInfo) {
        self.info = Some(info.clone());
        self.finished = true;
    }

    fn on_warning(&mut self, warning: &PngWarning) {
        self.warnings.push(warning.clone());
    }
}

fn get_files(path: &str) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>> {
    let mut files = Vec::new();
    let base_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let absolute_pattern = if Path::new(path).is_relative() {
        base_dir.join(path).to_string_lossy().into_owned()
    } else {
        path.to_string()
    };

    for entry in glob(&absolute_pattern)? {
        match entry {
            Ok(path) => {
                if !path.is_file() {
                    continue;
                }

                files.push(path);
            }
            Err(e) => eprintln!("{:?}", e),
        }
    }

    Ok(files)
}

fn config_for(cli: &Cli) -> DecoderConfig {
    let mut transformations = Transformations::empty();
    if cli.expand_interlace {
        transformations |= Transformations::EXPAND_INTERLACE;
    }

    let benign_errors = if cli.strict {
        BenignErrors::Error
    } else {
        BenignErrors::Warn
    };

    DecoderConfig::new()
        .with_transformations(transformations)
        .with_benign_errors(benign_errors)
}

fn process_file(file: &Path, cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    println!("File: {}", file.display());

    let data = fs::read(file)?;
    let start = Instant::now();
    let mut decoder = PushDecoder::with_config(Summary::default(), config_for(cli));

    for piece in data.chunks(cli.chunk_size.max(1)) {
        decoder.process(piece)?;
    }

    let elapsed = start.elapsed();
    let summary = decoder.into_handler();

    if cli.info {
        if let Some(info) = &summary.info {
            println!("{:#?}", info);
        }
    }

    if let Some(info) = &summary.info {
        println!(
            "{}x{} {:?} {} bit{}: {} rows, {} placeholder rows, {} warnings, {:.2?}",
            info.width(),
            info.height(),
            info.color_type(),
            info.bit_depth(),
            if info.is_interlaced() { " interlaced" } else { "" },
            summary.rows,
            summary.placeholders,
            summary.warnings.len(),
            elapsed
        );
    }

    for warning in &summary.warnings {
        println!("  warning ({:?}): {}", warning.kind, warning);
    }

    if !summary.finished {
        return Err("stream ended before IEND".into());
    }

    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };

    if let Err(e) = Logger::init(level) {
        eprintln!("Failed to initialize logger: {}", e);
    }

    let files = match get_files(&cli.path) {
        Ok(files) => files,
        Err(e) => {
            eprintln!("Invalid pattern {}: {}", cli.path, e);
            return ExitCode::FAILURE;
        }
    };

    if files.is_empty() {
        eprintln!("No files found matching pattern: {}", cli.path);
        return ExitCode::SUCCESS;
    }

    let mut failed = false;
    for file in files {
        if let Err(err) = process_file(&file, &cli) {
            eprintln!("Error processing file: {}", err);
            failed = true;
        }
    }

    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
