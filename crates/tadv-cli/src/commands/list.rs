use comfy_table::{ContentArrangement, Table};
use tadv_engine::{Engine, EngineConfig};

pub fn run(config: EngineConfig) -> Result<(), String> {
    let dir = config.stories_dir.clone();
    let engine = Engine::new(config);
    let stories = engine.stories().map_err(|e| e.to_string())?;

    if stories.is_empty() {
        println!("  No stories found in '{}'.", dir.display());
        return Ok(());
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Id", "Title"]);
    for story in &stories {
        table.add_row(vec![&story.id, &story.title]);
    }

    println!("{table}");
    println!();
    println!("  {} stor{}", stories.len(), if stories.len() == 1 { "y" } else { "ies" });

    Ok(())
}
