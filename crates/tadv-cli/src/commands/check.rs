use std::path::Path;

use colored::Colorize;
use tadv_dsl::{Severity, load_story_file, render_diagnostics, validate};
use tadv_engine::EngineConfig;

use super::plural;

pub fn run(file: &Path) -> Result<(), String> {
    let loaded = load_story_file(file).map_err(|e| e.to_string())?;

    let mut errors = 0;
    let mut warnings = 0;
    for source in &loaded.files {
        if source.diagnostics.is_empty() {
            continue;
        }
        let filename = source.path.display().to_string();
        eprint!(
            "{}",
            render_diagnostics(&source.source, &filename, &source.diagnostics)
        );
        for diagnostic in &source.diagnostics {
            match diagnostic.severity {
                Severity::Error => errors += 1,
                Severity::Warning => warnings += 1,
            }
        }
    }

    let doc = &loaded.document;
    let default_start = EngineConfig::default().default_start_scene;
    let start = doc.start_scene().unwrap_or(&default_start);
    for issue in validate(doc, start) {
        if issue.is_error() {
            errors += 1;
            eprintln!("  {} {}", "error:".red().bold(), issue.message);
        } else {
            warnings += 1;
            eprintln!("  {} {}", "warning:".yellow().bold(), issue.message);
        }
    }

    println!(
        "  {} scene{}, {} choice{}",
        doc.scenes.len(),
        plural(doc.scenes.len()),
        doc.scenes.choice_count(),
        plural(doc.scenes.choice_count()),
    );

    if errors > 0 {
        eprintln!(
            "  {} error{}, {} warning{}",
            errors,
            plural(errors),
            warnings,
            plural(warnings)
        );
        return Err("story has errors".into());
    }

    let title = doc
        .title()
        .map(str::to_string)
        .unwrap_or_else(|| file.display().to_string());
    if warnings > 0 {
        println!("  Checks passed for '{title}' with {warnings} warning{}.", plural(warnings));
    } else {
        println!("  All checks passed for '{title}'.");
    }
    Ok(())
}
