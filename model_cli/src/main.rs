//! Code Model - diagnostic command line entry point.
//!
//! Usage: code-model FILE
//!
//! Prints the scope outline, fold ranges, and per-line indent decisions
//! for a source file, as an editor embedding the model would see them.

use code_model_core::{CodeModel, Document, Language, ModelConfig, ScopeNode};
use std::env;
use std::process::ExitCode;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = env::args().collect();
    let path = match args.get(1) {
        Some(p) => p.clone(),
        None => {
            eprintln!("usage: code-model FILE");
            return ExitCode::FAILURE;
        }
    };

    let language = match Language::from_path(std::path::Path::new(&path)) {
        Some(l) => l,
        None => {
            log::error!("unsupported file type: {}", path);
            return ExitCode::FAILURE;
        }
    };

    let doc = match Document::from_file(&path) {
        Ok(d) => d,
        Err(e) => {
            log::error!("failed to open '{}': {}", path, e);
            return ExitCode::FAILURE;
        }
    };

    log::info!("{}: {} lines, language {}", path, doc.len_lines(), language.name());
    let mut model = CodeModel::new(language, ModelConfig::default(), &doc);

    println!("== scope outline ==");
    let root = model.scope_tree(&doc).clone();
    for child in root.children() {
        print_scope(child, 0);
    }

    println!();
    println!("== fold ranges ==");
    for region in model.fold_ranges(&doc) {
        println!(
            "  lines {}-{} ({} lines)",
            region.start_line + 1,
            region.end_line + 1,
            region.line_count()
        );
    }

    println!();
    println!("== next-line indents ==");
    for row in 0..doc.len_lines().saturating_sub(1) {
        let indent = model.next_line_indent(&doc, row);
        println!("  after line {:>4}: {:?}", row + 1, indent);
    }

    ExitCode::SUCCESS
}

fn print_scope(node: &ScopeNode, depth: usize) {
    let end = node
        .end
        .map(|e| (e.row + 1).to_string())
        .unwrap_or_else(|| "open".to_string());
    println!(
        "  {}{} [{:?}] lines {}-{}",
        "  ".repeat(depth),
        node.display_label(),
        node.kind,
        node.preamble.row + 1,
        end
    );
    for child in node.children() {
        print_scope(child, depth + 1);
    }
}
