use strategist_core::recommend::CATALOGUE;

use super::CommandResult;

pub fn run(json_output: bool) -> CommandResult {
    if json_output {
        return CommandResult::json("catalogue", &CATALOGUE);
    }

    let lines: Vec<String> = CATALOGUE
        .iter()
        .map(|entry| format!("- {} ({}): {}", entry.name, entry.label, entry.best_for.join(", ")))
        .collect();
    CommandResult::text(lines.join("\n"))
}
