use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use itertools::Itertools;
use log::{error, info, LevelFilter};

use nclr_tool::{
    config::ToolConfig,
    persist::{load_json, save_json, save_palette_png, PaletteDocument},
    Nclr,
};

#[derive(Parser, Debug)]
#[command(version, about = "Inspect, export and rebuild Nintendo DS NCLR palettes")]
struct Args {
    /// Config file to use instead of the one in the user config directory
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the palettes and diagnostics of NCLR files (glob patterns accepted)
    Info {
        #[arg(required = true)]
        files: Vec<String>,
    },
    /// Write an NCLR file's palettes as JSON and a PNG swatch
    Export {
        file: PathBuf,
        #[arg(long)]
        out: PathBuf,
    },
    /// Build an NCLR file from exported JSON
    Import {
        json: PathBuf,
        #[arg(long)]
        out: PathBuf,
        /// Existing NCLR whose other blocks and metadata are kept
        #[arg(long)]
        template: Option<PathBuf>,
    },
}

fn expand_patterns(patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut paths = vec![];
    for pattern in patterns {
        let before = paths.len();
        for entry in glob::glob(pattern).with_context(|| format!("Bad pattern {pattern}"))? {
            paths.push(entry?);
        }
        if paths.len() == before {
            bail!("No files match {}", pattern);
        }
    }
    Ok(paths)
}

fn check_diagnostics(config: &ToolConfig, path: &Path, nclr: &Nclr) -> Result<()> {
    if config.fail_on_warnings && !nclr.diagnostics().is_empty() {
        bail!(
            "{}: {} warnings while reading",
            path.display(),
            nclr.diagnostics().len()
        );
    }
    Ok(())
}

fn print_info(config: &ToolConfig, files: &[String]) -> Result<()> {
    for path in expand_patterns(files)? {
        let nclr = Nclr::open(&path).with_context(|| format!("Unable to read {}", path.display()))?;
        println!("{}", path.display());
        println!("  depth: {:?} (code {})", nclr.depth(), nclr.depth().code());
        println!("  multi-palette flag: {}", nclr.multi_palette_flag());
        println!(
            "  palettes: {} [{}]",
            nclr.palettes().len(),
            nclr.palettes().iter().map(Vec::len).join(", ")
        );
        if let Some(table) = nclr.index_table() {
            println!("  index table: [{}]", table.indices.iter().join(", "));
        }
        for diagnostic in nclr.diagnostics().iter() {
            println!("  warning: {}", diagnostic);
        }
        check_diagnostics(config, &path, &nclr)?;
    }
    Ok(())
}

fn export(config: &ToolConfig, file: &Path, out: &Path) -> Result<()> {
    let nclr = Nclr::open(file).with_context(|| format!("Unable to read {}", file.display()))?;
    check_diagnostics(config, file, &nclr)?;
    let stem = file
        .file_stem()
        .context("input file has no name")?
        .to_string_lossy();
    save_json(
        &out.join(format!("{stem}.json")),
        &PaletteDocument::from_nclr(&nclr),
        config.pretty_json,
    )?;
    save_palette_png(
        &out.join(format!("{stem}.png")),
        nclr.palettes(),
        config.swatch_scale,
    )?;
    Ok(())
}

fn import(config: &ToolConfig, json: &Path, out: &Path, template: Option<&Path>) -> Result<()> {
    let doc: PaletteDocument = load_json(json)?;
    let template = match template {
        Some(path) => {
            let nclr =
                Nclr::open(path).with_context(|| format!("Unable to read {}", path.display()))?;
            check_diagnostics(config, path, &nclr)?;
            Some(nclr)
        }
        None => None,
    };
    let mut nclr = doc.apply(template)?;
    nclr.save(out)
        .with_context(|| format!("Unable to write {}", out.display()))?;
    info!("Wrote {} palettes", nclr.palettes().len());
    Ok(())
}

fn run(args: Args) -> Result<()> {
    let config = ToolConfig::load(args.config.as_deref())?;
    match &args.command {
        Command::Info { files } => print_info(&config, files),
        Command::Export { file, out } => export(&config, file, out),
        Command::Import {
            json,
            out,
            template,
        } => import(&config, json, out, template.as_deref()),
    }
}

pub fn main() {
    let args = Args::parse();
    let level = if args.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    if let Err(e) = run(args) {
        error!("{:#}", e);
        std::process::exit(1);
    }
}
