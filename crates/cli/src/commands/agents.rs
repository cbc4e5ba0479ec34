//! `armory agents`: list configured agents.

use super::CommandResult;
use armory_config::{AppConfig, ConfigStore};
use armory_core::store::AgentConfigStore;

pub async fn run(config: &AppConfig, channel: Option<String>) -> CommandResult {
    let store = ConfigStore::new(config);
    let agents = match channel {
        Some(channel) => store.agents_by_channel(&channel).await?,
        None => store.agents().to_vec(),
    };

    if agents.is_empty() {
        println!("No agents configured.");
        return Ok(());
    }

    println!("{:<8} {:<24} {:<10} {:<8} CLIENTS", "ID", "NAME", "CHANNEL", "ENABLED");
    for agent in agents {
        println!(
            "{:<8} {:<24} {:<10} {:<8} {}",
            agent.agent_id,
            agent.agent_name,
            agent.channel,
            if agent.enabled { "yes" } else { "no" },
            agent.client_ids.join(",")
        );
    }
    Ok(())
}
