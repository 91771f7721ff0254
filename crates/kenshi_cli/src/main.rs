use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use kenshi_core::core_api::{ContextConfig, ModContext, diff_files};
use kenshi_core::{ModFile, RecordType};
use kenshi_render::{
    RecordSelection, render_dependencies, render_diff, render_file_summary, render_findings,
    render_evolution, render_merged, render_records,
};
use serde_json::{Map as JsonMap, Value as JsonValue};

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(short, long, global = true)]
    verbose: bool,
    /// JSON file holding the merge context configuration.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the header summary of a mod file.
    Info {
        #[arg(value_name = "FILE")]
        path: PathBuf,
    },
    /// Report recovered anomalies. Findings do not change the exit status.
    Validate {
        #[arg(value_name = "FILE")]
        path: PathBuf,
    },
    /// Parse a file and write it back out.
    Resave {
        #[arg(value_name = "FILE")]
        path: PathBuf,
        #[arg(long, value_name = "PATH")]
        output: Option<PathBuf>,
        /// Report whether the rebuilt bytes equal the input.
        #[arg(long)]
        check: bool,
    },
    /// List the records of one type.
    Records {
        #[arg(value_name = "FILE")]
        path: PathBuf,
        #[arg(long = "type", value_name = "TYPE", value_parser = parse_record_type)]
        record_type: RecordType,
        #[arg(long = "field", value_name = "FIELD")]
        fields: Vec<String>,
        #[arg(long = "extra-data")]
        extra_data: bool,
        #[arg(long)]
        instances: bool,
    },
    /// Merge one record type across files, in the order given.
    Merge {
        #[arg(value_name = "FILE", required = true)]
        paths: Vec<PathBuf>,
        #[arg(long = "type", value_name = "TYPE", value_parser = parse_record_type)]
        record_type: RecordType,
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long = "field", value_name = "FIELD")]
        fields: Vec<String>,
        #[arg(long = "extra-data")]
        extra_data: bool,
    },
    /// Show each file's copy of one record, in the order given.
    Evolution {
        #[arg(value_name = "FILE", required = true)]
        paths: Vec<PathBuf>,
        #[arg(long = "id", value_name = "STRINGID")]
        string_id: String,
        #[arg(long = "field", value_name = "FIELD")]
        fields: Vec<String>,
        #[arg(long = "extra-data")]
        extra_data: bool,
    },
    /// Compare the records two files share by name.
    Diff {
        #[arg(value_name = "A")]
        a: PathBuf,
        #[arg(value_name = "B")]
        b: PathBuf,
        #[arg(long = "type", value_name = "TYPE", value_parser = parse_record_type)]
        record_type: Option<RecordType>,
        #[arg(long = "field", value_name = "FIELD")]
        fields: Vec<String>,
    },
    /// Show or extend the dependency and reference lists.
    Deps {
        #[arg(value_name = "FILE")]
        path: PathBuf,
        #[arg(long = "add", value_name = "MOD")]
        add: Vec<String>,
        #[arg(long = "add-reference", value_name = "MOD")]
        add_reference: Vec<String>,
        #[arg(long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match &cli.config {
        Some(path) => load_config(path),
        None => ContextConfig::default(),
    };

    let json = match cli.command {
        Command::Info { path } => render_file_summary(&open(&path)),
        Command::Validate { path } => render_findings(&open(&path).validate()),
        Command::Resave {
            path,
            output,
            check,
        } => resave(&path, output.as_deref(), check),
        Command::Records {
            path,
            record_type,
            fields,
            extra_data,
            instances,
        } => {
            let file = open(&path);
            let selection = RecordSelection {
                fields,
                extra_data,
                instances,
            };
            render_records(file.records_of_type(record_type), &selection)
        }
        Command::Merge {
            paths,
            record_type,
            limit,
            fields,
            extra_data,
        } => {
            let ctx = load_context(config, &paths);
            let merged = ctx.merge::<&str>(None, record_type, None, limit);
            let selection = RecordSelection {
                fields,
                extra_data,
                instances: false,
            };
            render_merged(&merged, &selection)
        }
        Command::Evolution {
            paths,
            string_id,
            fields,
            extra_data,
        } => {
            let ctx = load_context(config, &paths);
            let layers = ctx.record_evolution(&string_id).unwrap_or_else(|e| {
                eprintln!("Error: {e}");
                process::exit(1);
            });
            let selection = RecordSelection {
                fields,
                extra_data,
                instances: false,
            };
            render_evolution(&layers, &selection)
        }
        Command::Diff {
            a,
            b,
            record_type,
            fields,
        } => render_diff(&diff_files(&open(&a), &open(&b), record_type, &fields)),
        Command::Deps {
            path,
            add,
            add_reference,
            output,
        } => deps(&path, &add, &add_reference, output.as_deref()),
    };

    let rendered = serde_json::to_string_pretty(&json).unwrap_or_else(|e| {
        eprintln!("Error rendering JSON output: {e}");
        process::exit(1);
    });
    println!("{rendered}");
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn load_config(path: &Path) -> ContextConfig {
    let text = fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("Error reading {}: {e}", path.display());
        process::exit(1);
    });
    serde_json::from_str(&text).unwrap_or_else(|e| {
        eprintln!("Error parsing config file: {}", path.display());
        eprintln!("  {e}");
        process::exit(2);
    })
}

fn open(path: &Path) -> ModFile {
    ModFile::load(path).unwrap_or_else(|e| {
        eprintln!("Error parsing mod file: {}", path.display());
        eprintln!("  {e}");
        process::exit(1);
    })
}

fn load_context(config: ContextConfig, paths: &[PathBuf]) -> ModContext {
    let mut ctx = ModContext::with_config(config);
    for path in paths {
        match ctx.load(path) {
            Ok(Some(_)) => {}
            Ok(None) => log::warn!("skipping ignored mod file: {}", path.display()),
            Err(e) => {
                eprintln!("Error loading {}: {e}", path.display());
                process::exit(1);
            }
        }
    }
    ctx
}

fn resave(path: &Path, output: Option<&Path>, check: bool) -> JsonValue {
    if output.is_none() && !check {
        eprintln!("resave requires --output <PATH> or --check");
        process::exit(2);
    }

    let original = fs::read(path).unwrap_or_else(|e| {
        eprintln!("Error reading {}: {e}", path.display());
        process::exit(1);
    });
    let file = open(path);
    let rebuilt = file.to_bytes().unwrap_or_else(|e| {
        eprintln!("Error creating rebuilt mod bytes: {e}");
        process::exit(1);
    });

    let mut out = JsonMap::new();
    out.insert("name".to_string(), JsonValue::from(file.name.as_str()));
    out.insert("input_bytes".to_string(), JsonValue::from(original.len()));
    out.insert("output_bytes".to_string(), JsonValue::from(rebuilt.len()));
    if check {
        out.insert("identical".to_string(), JsonValue::from(original == rebuilt));
    }
    if let Some(out_path) = output {
        fs::write(out_path, &rebuilt).unwrap_or_else(|e| {
            eprintln!("Error writing {}: {e}", out_path.display());
            process::exit(1);
        });
        out.insert(
            "output".to_string(),
            JsonValue::from(out_path.display().to_string()),
        );
    }
    JsonValue::Object(out)
}

fn deps(
    path: &Path,
    add: &[String],
    add_reference: &[String],
    output: Option<&Path>,
) -> JsonValue {
    let has_edits = !add.is_empty() || !add_reference.is_empty();
    if has_edits && output.is_none() {
        eprintln!("--add and --add-reference require --output <PATH>");
        process::exit(2);
    }
    if !has_edits && output.is_some() {
        eprintln!("--output requires at least one --add or --add-reference");
        process::exit(2);
    }

    let mut file = open(path);
    if has_edits {
        file.add_dependencies(add);
        file.add_references(add_reference);
    }
    if let Some(out_path) = output {
        file.save(out_path).unwrap_or_else(|e| {
            eprintln!("Error writing {}: {e}", out_path.display());
            process::exit(1);
        });
    }
    render_dependencies(&file)
}

fn parse_record_type(value: &str) -> Result<RecordType, String> {
    value.parse::<RecordType>().map_err(|e| e.to_string())
}
