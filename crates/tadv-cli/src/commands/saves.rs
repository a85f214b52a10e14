use comfy_table::{ContentArrangement, Table};
use tadv_engine::{Engine, EngineConfig};

use super::plural;

pub fn run(config: EngineConfig) -> Result<(), String> {
    let engine = Engine::new(config);
    let saves = engine.list_saves().map_err(|e| e.to_string())?;

    if saves.is_empty() {
        println!("  No saved games found.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Name", "Story", "Day", "Time", "Saved"]);
    for save in &saves {
        let story = if save.title.is_empty() {
            save.story_id.clone()
        } else {
            format!("{} ({})", save.title, save.story_id)
        };
        table.add_row(vec![
            save.name.clone(),
            story,
            save.day.to_string(),
            save.time_of_day.as_str().to_string(),
            save.timestamp.format("%Y-%m-%d %H:%M").to_string(),
        ]);
    }

    println!("{table}");
    println!();
    println!("  {} save{}", saves.len(), plural(saves.len()));

    Ok(())
}
