//! `armory preheat`: assemble every enabled agent on a channel.

use super::CommandResult;
use armory_agent::AgentService;

pub async fn run(service: &AgentService, channel: &str) -> CommandResult {
    let ready = service.preheat(channel).await?;
    if ready.is_empty() {
        println!("No enabled agents on channel '{channel}'.");
    } else {
        println!("Preheated {} agent(s) on '{channel}': {}", ready.len(), ready.join(", "));
        println!("Registry holds {} component(s).", service.armory().registry().len());
    }
    Ok(())
}
