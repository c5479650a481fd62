mod simulate;

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use taiko_core::GameConfig;
use tja_compiler::{CompileOptions, Modifier};
use tja_schema::{CompiledCourse, Difficulty};

#[derive(Debug, Parser)]
#[command(name = "tja")]
#[command(about = "TJA chart compiler and autoplay simulator", long_about = None)]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Compile one course to JSON
    Compile {
        input: PathBuf,
        /// Course number (0-6) or name (easy, normal, hard, oni, edit, tower, dan)
        #[arg(short, long, default_value = "oni")]
        course: Difficulty,
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Fail on unknown commands instead of skipping them
        #[arg(long)]
        strict: bool,
        #[command(flatten)]
        modifier: ModifierArgs,
    },
    /// Print metadata and a summary of every course
    Info { input: PathBuf },
    /// Autoplay a course and print the result
    Simulate {
        input: PathBuf,
        #[arg(short, long, default_value = "oni")]
        course: Difficulty,
        /// Game config JSON (judge offset, layout, gauge table)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
        #[command(flatten)]
        modifier: ModifierArgs,
    },
}

#[derive(Debug, Args)]
#[group(multiple = false)]
struct ModifierArgs {
    /// Swap don and kat
    #[arg(long)]
    mirror: bool,
    /// Swap the types of consecutive note pairs
    #[arg(long)]
    shuffle: bool,
    /// Shuffle note types within each measure
    #[arg(long, value_name = "SEED")]
    random: Option<u64>,
}

impl ModifierArgs {
    fn modifier(&self) -> Option<Modifier> {
        if self.mirror {
            Some(Modifier::Mirror)
        } else if self.shuffle {
            Some(Modifier::Shuffle)
        } else {
            self.random.map(|seed| Modifier::RandomPerMeasure { seed })
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();

    match cli.command {
        Command::Compile {
            input,
            course,
            output,
            strict,
            modifier,
        } => {
            let options = CompileOptions {
                strict,
                ..CompileOptions::default()
            };
            let chart = compile(&input, course, options, modifier.modifier())?;

            let json =
                serde_json::to_string_pretty(&chart).context("failed to serialize course")?;
            let out_path = output.unwrap_or_else(|| default_output_path(&input, course));
            fs::write(&out_path, json)
                .with_context(|| format!("failed to write: {}", out_path.display()))?;
            log::info!("wrote {}", out_path.display());
        }
        Command::Info { input } => print_info(&input)?,
        Command::Simulate {
            input,
            course,
            config,
            json,
            modifier,
        } => {
            let config = match config {
                Some(path) => GameConfig::load(path)?,
                None => GameConfig::default(),
            };
            let options = CompileOptions {
                distance: config.layout.travel_distance(),
                ..CompileOptions::default()
            };
            let chart = compile(&input, course, options, modifier.modifier())?;
            let result = simulate::run_simulation(chart, &config)?;

            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&result).context("failed to serialize result")?
                );
            } else {
                simulate::print_result(&result);
            }
        }
    }

    Ok(())
}

fn compile(
    input: &Path,
    course: Difficulty,
    options: CompileOptions,
    modifier: Option<Modifier>,
) -> anyhow::Result<CompiledCourse> {
    let mut chart = tja_compiler::compile_file_with_options(input, course, options)
        .with_context(|| format!("compile failed: {}", input.display()))?;
    if let Some(modifier) = modifier {
        modifier.apply(&mut chart.streams);
    }
    Ok(chart)
}

fn print_info(input: &Path) -> anyhow::Result<()> {
    let src = tja_compiler::read_chart_file(input)
        .with_context(|| format!("info failed: {}", input.display()))?;
    let meta = tja_compiler::read_metadata_str(&src)
        .with_context(|| format!("info failed: {}", input.display()))?;

    println!("title:     {}", meta.title.default);
    for (lang, title) in &meta.title.by_language {
        println!("  [{lang}]    {title}");
    }
    if !meta.subtitle.default.is_empty() {
        println!("subtitle:  {}", meta.subtitle.default);
    }
    println!("bpm:       {}", meta.bpm);
    println!("offset:    {} ms", meta.offset_ms);
    if let Some(wave) = &meta.wave {
        println!("wave:      {wave}");
    }

    let options = CompileOptions {
        base_dir: input.parent().map(Path::to_path_buf),
        ..CompileOptions::default()
    };
    println!("courses:");
    for course in tja_compiler::available_courses(&src) {
        match tja_compiler::compile_str_with_options(&src, course, options.clone()) {
            Ok(chart) => println!(
                "  {:<7} level {:<2} notes {:<4} base score {:<7} id {}",
                course.name(),
                chart.level,
                chart.streams.single_note_count(),
                chart.base_score,
                chart.chart_id
            ),
            Err(e) => println!("  {:<7} error: {e}", course.name()),
        }
    }
    Ok(())
}

fn default_output_path(input: &Path, course: Difficulty) -> PathBuf {
    let mut out = input.to_path_buf();
    out.set_extension(format!("{}.json", course.name()));
    out
}
