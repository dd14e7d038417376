use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use ildc_decompiler::{MethodBody, MethodListing, decode_listing, emit_body};
use ildc_ir::name::NameTable;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[cfg(target_env = "msvc")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser)]
#[command(name = "ildc", about = "Stack-machine IL to statement decompiler")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Re-print a listing in canonical form with resolved offsets
    Disasm {
        /// Path to the IL listing
        input: PathBuf,
    },
    /// Decompile every method of a listing to C#-like source
    Decompile {
        /// Path to the IL listing
        input: PathBuf,
        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Only decompile the method with this name
        #[arg(long)]
        method: Option<String>,
    },
    /// Show the statement groups built for each method
    Groups {
        /// Path to the IL listing
        input: PathBuf,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Disasm { input } => cmd_disasm(&input),
        Commands::Decompile {
            input,
            output,
            method,
        } => cmd_decompile(&input, output.as_deref(), method.as_deref()),
        Commands::Groups { input } => cmd_groups(&input),
    }
}

fn load_listing(path: &Path) -> Vec<MethodListing> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("Error reading {}: {e}", path.display());
            std::process::exit(1);
        }
    };
    match decode_listing(&text) {
        Ok(methods) => methods,
        Err(e) => {
            eprintln!("Error: {}: {e}", path.display());
            std::process::exit(1);
        }
    }
}

fn load_bodies(path: &Path) -> Vec<MethodBody> {
    let names = Arc::new(NameTable::new());
    load_listing(path)
        .into_iter()
        .map(|listing| MethodBody::new(listing.name, listing.instructions, Arc::clone(&names)))
        .collect()
}

fn cmd_disasm(path: &Path) {
    for method in load_listing(path) {
        println!(".method {}", method.name);
        for insn in &method.instructions {
            println!("    {insn}");
        }
        println!();
    }
}

fn cmd_decompile(path: &Path, output: Option<&Path>, only: Option<&str>) {
    let bodies = load_bodies(path);
    let mut out = String::new();
    let mut matched = false;

    for body in bodies.iter().filter(|b| only.is_none_or(|name| b.name() == name)) {
        matched = true;
        out.push_str(&decompile_method_to_string(body));
        out.push('\n');
    }

    if let Some(name) = only.filter(|_| !matched) {
        eprintln!("Error: no method named `{name}` in {}", path.display());
        std::process::exit(1);
    }

    match output {
        Some(out_path) => {
            if let Err(e) = fs::write(out_path, &out) {
                eprintln!("Error writing {}: {e}", out_path.display());
                std::process::exit(1);
            }
            log::info!("wrote {} method(s) to {}", bodies.len(), out_path.display());
        }
        None => print!("{out}"),
    }
}

fn decompile_method_to_string(body: &MethodBody) -> String {
    let decompiled = body.decompiled();
    let mut text = String::new();
    for diagnostic in &decompiled.diagnostics {
        text.push_str(&format!("// warning: {diagnostic}\n"));
    }
    text.push_str(&format!("void {}()\n{{\n", body.name()));
    for line in emit_body(decompiled).lines() {
        text.push_str("    ");
        text.push_str(line);
        text.push('\n');
    }
    text.push_str("}\n");
    text
}

fn cmd_groups(path: &Path) {
    for body in load_bodies(path) {
        let decompiled = body.decompiled();
        println!("{}: {} group(s)", body.name(), decompiled.groups.len());
        for group in &decompiled.groups {
            let label = group
                .label
                .as_ref()
                .map_or_else(|| "-".to_string(), |l| l.to_string());
            println!(
                "  IL_{:04x}  {label:<8}  {} statement(s)",
                group.offset,
                group.statements.len()
            );
        }
        for diagnostic in &decompiled.diagnostics {
            println!("  // warning: {diagnostic}");
        }
    }
}
