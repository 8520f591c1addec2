//! Command-line driver: type-checks one or more module AST files, in
//! dependency order, against the modules already processed earlier on
//! the command line.
//!
//! Lexing and parsing happen upstream of this crate; each input file is
//! the JSON serialization of a single module's already-parsed body.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use colored::Colorize;
use log::{error, info};

use ember_lang::ast::Node;
use ember_lang::checker::{self, ImportedModules};
use ember_lang::database::TypeDatabase;
use ember_lang::module::Module;

#[derive(Parser, Debug)]
#[command(author, version, about = "Type-checks Ember module ASTs")]
struct Cli {
    /// Module AST files, in dependency order: a later file may import
    /// symbols from any earlier one.
    #[arg(required = true)]
    modules: Vec<PathBuf>,

    /// Write each module's fully typed AST, as JSON, next to its input
    /// file with a `.typed.json` extension.
    #[arg(long)]
    emit_typed: bool,
}

fn default_true() -> bool {
    true
}

#[derive(serde::Deserialize)]
struct ModuleSource {
    name: String,
    #[serde(default = "default_true")]
    defines_module_type: bool,
    body: Vec<Node>,
}

fn main() -> ExitCode {
    simple_logger::SimpleLogger::new().env().init().ok();

    let cli = Cli::parse();
    let db = TypeDatabase::new();
    let mut compiled: HashMap<String, Module> = HashMap::new();
    let mut had_errors = false;

    for path in &cli.modules {
        info!("checking {}", path.display());

        let source = match fs::read_to_string(path) {
            Ok(source) => source,
            Err(err) => {
                error!("{}: {err}", path.display());
                return ExitCode::FAILURE;
            }
        };
        let parsed: ModuleSource = match serde_json::from_str(&source) {
            Ok(parsed) => parsed,
            Err(err) => {
                error!("{}: invalid module AST: {err}", path.display());
                return ExitCode::FAILURE;
            }
        };

        let mut module = if parsed.defines_module_type {
            let module_type = db.types.new_object(&parsed.name, Some(db.module_prototype));
            Module::new(&parsed.name, module_type)
        } else {
            Module::without_module_type(&parsed.name, db.top_level)
        }
        .with_body(parsed.body);

        let imports: ImportedModules = compiled.iter().map(|(name, m)| (name.clone(), m)).collect();
        let diagnostics = checker::run(&mut module, &db, &imports);

        for diagnostic in diagnostics.iter() {
            had_errors = true;
            eprintln!("{}", diagnostic.render().red());
        }

        if cli.emit_typed {
            let out_path = path.with_extension("typed.json");
            match serde_json::to_string_pretty(&module.body) {
                Ok(json) => {
                    if let Err(err) = fs::write(&out_path, json) {
                        error!("{}: {err}", out_path.display());
                    }
                }
                Err(err) => error!("failed to serialize typed AST for {}: {err}", path.display()),
            }
        }

        compiled.insert(parsed.name, module);
    }

    if had_errors {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
