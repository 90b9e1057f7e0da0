use anyhow::Result;
use symcheck_core::services::extract::{backend_statuses, ToolLocator};

/// List the extraction backends in probe order and where their tools were found.
pub fn list_backends_command(locator: &ToolLocator, json: bool) -> Result<()> {
    let entries = backend_statuses(locator);

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    println!("Backends:");
    for entry in entries {
        match &entry.path {
            Some(path) => println!("- {}: {} ({})", entry.name, entry.description, path.display()),
            None => println!("- {}: {} (not found)", entry.name, entry.description),
        }
    }

    Ok(())
}
