//! `armory run`: execute an agent on one task and stream its progress.

use super::CommandResult;
use armory_agent::{AgentService, AgentStreamEvent, ExecuteCommand};

pub struct RunArgs {
    pub agent: String,
    pub message: String,
    pub session: Option<String>,
    pub max_step: u32,
    pub json: bool,
}

pub async fn run(service: &AgentService, args: RunArgs) -> CommandResult {
    let mut command = ExecuteCommand::new(args.agent, args.message).with_max_step(args.max_step);
    if let Some(session) = args.session {
        command = command.with_session(session);
    }

    let mut rx = service.execute_stream(command);
    let mut failure = None;

    loop {
        let event = tokio::select! {
            event = rx.recv() => event,
            _ = tokio::signal::ctrl_c() => {
                eprintln!("\nInterrupted, cancelling run.");
                break;
            }
        };
        let Some(event) = event else {
            break;
        };

        if args.json {
            println!("{}", serde_json::to_string(&event)?);
        } else {
            render(&event);
        }
        if let AgentStreamEvent::Error { message } = event {
            failure = Some(message);
        }
    }

    match failure {
        Some(message) => Err(message.into()),
        None => Ok(()),
    }
}

fn render(event: &AgentStreamEvent) {
    match event {
        AgentStreamEvent::Step { step, max_step } => eprintln!("── step {step}/{max_step}"),
        AgentStreamEvent::Chunk { content, .. } => println!("{content}"),
        AgentStreamEvent::ToolCall { name, input, .. } => eprintln!("  → {name} {input}"),
        AgentStreamEvent::ToolResult {
            name,
            output,
            success,
            ..
        } => {
            let mark = if *success { "✓" } else { "✗" };
            eprintln!("  {mark} {name}: {}", preview(output, 120));
        }
        AgentStreamEvent::Done {
            session_id,
            status,
            steps,
            tool_calls_made,
            usage,
            ..
        } => {
            eprintln!();
            eprint!("[{status}] session {session_id}, {steps} step(s), {tool_calls_made} tool call(s)");
            if let Some(usage) = usage {
                eprint!(", {} tokens", usage.total_tokens);
            }
            eprintln!();
        }
        AgentStreamEvent::Error { message } => eprintln!("[error] {message}"),
    }
}

/// First `max` characters of `text` on one line.
fn preview(text: &str, max: usize) -> String {
    let line = text.replace('\n', " ");
    match line.char_indices().nth(max) {
        Some((cut, _)) => format!("{}…", &line[..cut]),
        None => line,
    }
}
