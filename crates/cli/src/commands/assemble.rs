//! `armory assemble`: build components and show what got registered.

use super::CommandResult;
use armory_agent::{AgentService, ArmoryCommand};
use armory_core::registry::ComponentKind;

pub async fn run(service: &AgentService, kind: ComponentKind, ids: Vec<String>) -> CommandResult {
    let outcome = service.assemble(&ArmoryCommand::new(kind, ids)).await?;

    println!("Assembled {} component(s) of kind {}:", outcome.components.len(), outcome.kind);
    for id in &outcome.components {
        println!("  {id}");
    }

    let registry = service.armory().registry();
    println!();
    println!("Registry ({} total):", registry.len());
    for id in registry.ids() {
        println!("  {id}");
    }
    Ok(())
}
