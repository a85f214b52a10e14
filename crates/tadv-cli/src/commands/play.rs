use std::io::{self, BufRead, Write};

use colored::Colorize;
use tadv_engine::{Engine, EngineConfig, EngineError, TextCommand, parse_text_command};

/// Print the current scene, following `@goto`s first.
///
/// Returns `false` when the scene ends the story.
fn show_scene(engine: &mut Engine, max_hops: usize) -> Result<bool, EngineError> {
    let mut hops = 0;
    loop {
        let view = engine.current_scene_view()?.clone();
        println!("{}", view.title.bold().underline());
        if !view.text.is_empty() {
            println!("{}", view.text);
        }
        println!();

        if view.auto_transition.is_some() {
            if hops < max_hops {
                match engine.follow_auto_transition() {
                    Ok(Some(auto)) => {
                        if let Some(text) = auto.text {
                            println!("{}\n", text.italic());
                        }
                        hops += 1;
                        continue;
                    }
                    Ok(None) => {}
                    Err(error) => {
                        tracing::warn!(scene = %view.scene_id, %error, "auto transition failed");
                    }
                }
            } else {
                tracing::warn!(scene = %view.scene_id, hops, "too many auto transitions in a row");
            }
        }

        if view.choices.is_empty() {
            return Ok(false);
        }
        for (i, choice) in view.choices.iter().enumerate() {
            println!("  {}. {}", (i + 1).to_string().cyan(), choice.text);
        }
        println!();
        return Ok(true);
    }
}

pub fn run(
    config: EngineConfig,
    story: &str,
    player: Option<&str>,
    scene: Option<&str>,
    load: Option<&str>,
) -> Result<(), String> {
    let max_hops = config.max_auto_transitions;
    let mut engine = Engine::new(config);
    engine.load_story(story).map_err(|e| e.to_string())?;
    engine
        .initialize_game(player, scene, false)
        .map_err(|e| e.to_string())?;
    if let Some(save) = load {
        let message = engine.load(save).map_err(|e| e.to_string())?;
        println!("  {message}");
    }

    let title = engine
        .story()
        .map(|s| s.title().to_string())
        .unwrap_or_default();
    println!("  {} {title}", "Playing".bold());
    println!("  Type a choice number, 'help' for commands, 'quit' to exit.\n");

    let stdin = io::stdin();
    let mut reader = stdin.lock();
    let mut line = String::new();
    let mut refresh = true;

    loop {
        if refresh {
            if !show_scene(&mut engine, max_hops).map_err(|e| e.to_string())? {
                println!("{}", "The End.".bold());
                break;
            }
            refresh = false;
        }

        print!("> ");
        io::stdout().flush().map_err(|e| e.to_string())?;

        line.clear();
        match reader.read_line(&mut line) {
            Ok(0) => break, // EOF
            Err(e) => return Err(e.to_string()),
            _ => {}
        }

        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        if let Ok(number) = input.parse::<usize>() {
            let Some(index) = number.checked_sub(1) else {
                println!("{}\n", "Choices start at 1.".yellow());
                continue;
            };
            match engine.handle_choice(index) {
                Ok(result) => {
                    println!("\n{result}\n");
                    refresh = true;
                }
                Err(e) => println!("{}\n", e.to_string().yellow()),
            }
            continue;
        }

        let command = parse_text_command(input);
        let quit = command.is_quit();
        let changes_scene = matches!(
            command,
            TextCommand::Undo | TextCommand::Load(Some(_)) | TextCommand::Restart
        );
        match engine.execute_command(command) {
            Ok(output) => {
                println!("{output}\n");
                refresh = changes_scene;
            }
            Err(e) => println!("{}\n", e.to_string().yellow()),
        }
        if quit {
            break;
        }
    }

    Ok(())
}
