//! `pme`: command-line interface for the Pattern Matching Engine.
//!
//! ```text
//! USAGE:
//!   pme regs                                   Dump every register
//!   pme train --data <csv> --out <file>        Learn labelled rows, save knowledge
//!   pme classify --knowledge <file> --data <csv>
//!                                              Restore knowledge, classify rows
//!   pme dump --knowledge <file>                Print stored neuron records
//! ```
//!
//! Data rows are comma-separated bytes. Training rows start with the
//! category: `category,c0,c1,...`. Blank lines and lines starting with `#`
//! are skipped.

use anyhow::{bail, ensure, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use pme_driver::chip::network::{is_valid_category, MAX_VECTOR_SIZE, NO_MATCH};
use pme_driver::{
    BusType, ClassificationMode, DistanceMode, MmioBus, Pme, PmeConfig, Register, RegisterBus,
    SoftwarePme, VECTOR_OVERFLOW,
};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pme", about = "Pattern Matching Engine CLI", version)]
struct Cli {
    /// Register transport.
    #[arg(long, value_enum, global = true, default_value_t = Backend::Software)]
    backend: Backend,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Dump every register.
    Regs,
    /// Learn a labelled CSV file and save the resulting knowledge.
    Train {
        /// CSV rows: category,c0,c1,...
        #[arg(long)]
        data: PathBuf,
        /// Output knowledge file.
        #[arg(long)]
        out: PathBuf,
        #[command(flatten)]
        config: ConfigArgs,
    },
    /// Restore knowledge and classify each CSV row.
    Classify {
        /// Knowledge file written by `pme train`.
        #[arg(long)]
        knowledge: PathBuf,
        /// CSV rows: c0,c1,... (or category,c0,... with --labeled)
        #[arg(long)]
        data: PathBuf,
        /// First column of each row is the expected category.
        #[arg(long)]
        labeled: bool,
        #[command(flatten)]
        config: ConfigArgs,
    },
    /// Print the neuron records stored in a knowledge file.
    Dump {
        /// Knowledge file written by `pme train`.
        #[arg(long)]
        knowledge: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Backend {
    /// Behavioural model, no hardware required.
    Software,
    /// /dev/mem mapping of the register window (root).
    Mmio,
}

impl From<Backend> for BusType {
    fn from(b: Backend) -> Self {
        match b {
            Backend::Software => Self::Software,
            Backend::Mmio => Self::Mmio,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum Distance {
    /// Sum of absolute differences.
    L1,
    /// Largest absolute difference.
    Lsup,
}

#[derive(Clone, Copy, ValueEnum)]
enum Mode {
    /// Radial basis function: only neurons within their influence fire.
    Rbf,
    /// k-nearest neighbor: every neuron fires.
    Knn,
}

/// Network configuration flags shared by `train` and `classify`.
#[derive(Args)]
struct ConfigArgs {
    /// Global context (1-127).
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u16).range(1..=127))]
    context: u16,
    /// Distance norm.
    #[arg(long, value_enum, default_value_t = Distance::L1)]
    distance: Distance,
    /// Classifier mode.
    #[arg(long, value_enum, default_value_t = Mode::Rbf)]
    mode: Mode,
    /// Minimum influence field.
    #[arg(long, default_value_t = 2)]
    min_aif: u16,
    /// Maximum influence field.
    #[arg(long, default_value_t = 0x4000)]
    max_aif: u16,
}

impl ConfigArgs {
    fn to_config(&self) -> PmeConfig {
        let distance = match self.distance {
            Distance::L1 => DistanceMode::L1,
            Distance::Lsup => DistanceMode::LSup,
        };
        let mode = match self.mode {
            Mode::Rbf => ClassificationMode::Rbf,
            Mode::Knn => ClassificationMode::Knn,
        };
        PmeConfig::default()
            .with_context(self.context)
            .with_distance_mode(distance)
            .with_classification_mode(mode)
            .with_influence(self.min_aif, self.max_aif)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Cmd::Regs => cmd_regs(cli.backend)?,
        Cmd::Train { data, out, config } => cmd_train(cli.backend, &data, &out, &config)?,
        Cmd::Classify {
            knowledge,
            data,
            labeled,
            config,
        } => cmd_classify(cli.backend, &knowledge, &data, labeled, &config)?,
        Cmd::Dump { knowledge } => cmd_dump(&knowledge)?,
    }

    Ok(())
}

fn open(backend: Backend) -> Result<Pme<Box<dyn RegisterBus>>> {
    let bus: Box<dyn RegisterBus> = match backend {
        Backend::Software => Box::new(SoftwarePme::new()),
        Backend::Mmio => Box::new(
            MmioBus::open().context("mapping PME registers (needs root / CAP_SYS_RAWIO)")?,
        ),
    };
    tracing::info!("Using {} transport", BusType::from(backend));
    Ok(Pme::new(bus))
}

fn cmd_regs(backend: Backend) -> Result<()> {
    let mut pme = open(backend)?;

    println!("PME registers ({})", BusType::from(backend));
    println!();
    for reg in Register::ALL {
        let value = pme.bus_mut().read16(reg);
        println!("  {:#04x}  {reg:<13}  {value:#06x}", reg.offset());
    }
    println!();
    println!(
        "  context={}  distance={:?}  mode={:?}  committed={}",
        pme.global_context(),
        pme.distance_mode(),
        pme.classifier_mode(),
        pme.committed_count()
    );

    Ok(())
}

fn cmd_train(backend: Backend, data: &Path, out: &Path, config: &ConfigArgs) -> Result<()> {
    let rows = read_rows(data, true)?;
    let mut pme = open(backend)?;
    pme.begin_with(&config.to_config());

    for row in &rows {
        let category = row.category.unwrap_or_default();
        pme.learn(&row.pattern, category);
    }

    let records = pme.save_knowledge();
    let blob = pme_driver::pack_knowledge(&records)?;
    std::fs::write(out, &blob).with_context(|| format!("writing {}", out.display()))?;

    println!(
        "Learned {} rows -> {} neurons, saved {} bytes to {}",
        rows.len(),
        records.len(),
        blob.len(),
        out.display()
    );
    Ok(())
}

fn cmd_classify(
    backend: Backend,
    knowledge: &Path,
    data: &Path,
    labeled: bool,
    config: &ConfigArgs,
) -> Result<()> {
    let records = load_knowledge(knowledge)?;
    let rows = read_rows(data, labeled)?;

    let mut pme = open(backend)?;
    pme.begin_with(&config.to_config());
    pme.restore_knowledge(&records)?;

    let mut correct = 0usize;
    for (i, row) in rows.iter().enumerate() {
        let category = pme.classify(&row.pattern);
        let label = match category {
            VECTOR_OVERFLOW => "overflow".to_string(),
            NO_MATCH => "unknown".to_string(),
            c => c.to_string(),
        };
        match row.category {
            Some(expected) => {
                let hit = category == expected;
                correct += usize::from(hit);
                println!(
                    "{:>4}  {label:>8}  (expected {expected}){}",
                    i + 1,
                    if hit { "" } else { "  MISS" }
                );
            }
            None => println!("{:>4}  {label:>8}", i + 1),
        }
    }

    if labeled && !rows.is_empty() {
        #[allow(clippy::cast_precision_loss)]
        let pct = correct as f64 * 100.0 / rows.len() as f64;
        println!();
        println!("Accuracy: {correct}/{} ({pct:.1}%)", rows.len());
    }
    Ok(())
}

fn cmd_dump(knowledge: &Path) -> Result<()> {
    let records = load_knowledge(knowledge)?;

    println!("{} neurons in {}", records.len(), knowledge.display());
    println!();
    println!("  #    ctx  category  degen    aif  minif  vector");
    for (i, r) in records.iter().enumerate() {
        let used = r
            .vector
            .iter()
            .rposition(|&c| c != 0)
            .map_or(0, |p| p + 1);
        let preview: Vec<String> = r.vector[..used.min(8)]
            .iter()
            .map(ToString::to_string)
            .collect();
        println!(
            "  {:<4} {:>3}  {:>8}  {:>5}  {:>5}  {:>5}  [{}{}]",
            i + 1,
            r.context_id(),
            r.category_id(),
            if r.is_degenerate() { "yes" } else { "" },
            r.influence,
            r.min_influence,
            preview.join(","),
            if used > 8 { ",..." } else { "" }
        );
    }
    Ok(())
}

fn load_knowledge(path: &Path) -> Result<Vec<pme_driver::NeuronRecord>> {
    let blob = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    pme_driver::unpack_knowledge(&blob).with_context(|| format!("decoding {}", path.display()))
}

/// One parsed CSV row.
struct Row {
    category: Option<u16>,
    pattern: Vec<u8>,
}

fn read_rows(path: &Path, labeled: bool) -> Result<Vec<Row>> {
    let text =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;

    let mut rows = Vec::new();
    for (n, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let row = parse_row(line, labeled)
            .with_context(|| format!("{}:{}", path.display(), n + 1))?;
        rows.push(row);
    }

    tracing::debug!("Read {} rows from {}", rows.len(), path.display());
    Ok(rows)
}

fn parse_row(line: &str, labeled: bool) -> Result<Row> {
    let mut fields = line.split(',').map(str::trim);

    let category = if labeled {
        let raw = fields.next().unwrap_or_default();
        let c: u16 = raw
            .parse()
            .with_context(|| format!("invalid category {raw:?}"))?;
        ensure!(is_valid_category(c), "category {c} outside 1..=32766");
        Some(c)
    } else {
        None
    };

    let pattern = fields
        .map(|f| {
            f.parse::<u8>()
                .with_context(|| format!("invalid component {f:?}"))
        })
        .collect::<Result<Vec<u8>>>()?;

    if pattern.is_empty() {
        bail!("row has no components");
    }
    if pattern.len() > MAX_VECTOR_SIZE {
        tracing::warn!(
            "row has {} components, engine uses the first {MAX_VECTOR_SIZE}",
            pattern.len()
        );
    }

    Ok(Row { category, pattern })
}
