pub mod controller;
pub mod conversation_state;
pub mod indicator;
pub mod prompt;

#[cfg(test)]
mod proptests;

use std::io::Write;
use std::process::ExitCode;
use std::time::Duration;

use color_print::cformat;
use controller::{ChatController, Settlement};
use conversation_state::{ConversationState, Message, Sender};
use eyre::Result;
use indicator::ThinkingIndicator;
use prompt::generate_prompt;
use rustyline::error::ReadlineError;
use tracing::{debug, error, info};

use crate::config::ChatConfig;
use crate::response_gateway::ResponseGateway;

const WELCOME_TEXT: &str = "
Chatting with {agent}. Ask about directions, places, or anything on your trip.

/help         Show the help dialogue
/quit         Quit the application (or /exit)
";

const HELP_TEXT: &str = "
Commands

/status       Check whether the chat service is up
/transcript   Print the whole conversation so far
/help         Show this help dialogue
/quit         Quit the application (or /exit)
";

const INDICATOR_TICK: Duration = Duration::from_millis(120);

pub struct ChatContext<G> {
    output: Box<dyn Write>,
    input: Option<String>,
    interactive: bool,
    agent_name: String,
    controller: ChatController<G>,
}

impl<G> ChatContext<G>
where
    G: ResponseGateway + 'static,
{
    pub fn new(
        output: Box<dyn Write>,
        input: Option<String>,
        interactive: bool,
        config: &ChatConfig,
        gateway: G,
    ) -> Self {
        Self {
            output,
            input,
            interactive,
            agent_name: config.agent_name.clone(),
            controller: ChatController::new(gateway, config.greeting.clone()),
        }
    }

    pub fn state(&self) -> &ConversationState {
        self.controller.state()
    }

    pub async fn run(&mut self) -> Result<ExitCode> {
        if self.interactive {
            self.print_welcome()?;
        }

        // One-shot mode: send a single message and report how it went
        if let Some(input) = self.input.take() {
            let failed = self.send(&input).await?;
            return Ok(if failed {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            });
        }

        if self.interactive {
            self.run_interactive().await?;
        }

        Ok(ExitCode::SUCCESS)
    }

    fn print_welcome(&mut self) -> Result<()> {
        writeln!(
            self.output,
            "{}",
            WELCOME_TEXT.replace("{agent}", &self.agent_name)
        )?;
        self.print_transcript()
    }

    fn print_transcript(&mut self) -> Result<()> {
        for message in self.controller.state().messages() {
            render_message(&mut self.output, &self.agent_name, message)?;
        }
        Ok(())
    }

    async fn run_interactive(&mut self) -> Result<()> {
        let mut rl = prompt::rl()?;

        loop {
            let prompt_text = generate_prompt(None);
            match rl.readline(&prompt_text) {
                Ok(line) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }

                    rl.add_history_entry(trimmed);

                    if trimmed == "/quit" || trimmed == "/exit" {
                        break;
                    }

                    if let Err(e) = self.handle_input(&line).await {
                        error!("Failed to handle input: {}", e);
                        writeln!(self.output, "Error: {}", e)?;
                    }
                }
                Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
                Err(e) => {
                    writeln!(self.output, "Error: {}", e)?;
                    break;
                }
            }
        }

        info!("Leaving chat after {} messages", self.state().messages().len());
        Ok(())
    }

    async fn handle_input(&mut self, input: &str) -> Result<()> {
        match input.trim() {
            "/help" => {
                writeln!(self.output, "{}", HELP_TEXT)?;
            }
            "/status" => {
                self.print_status().await?;
            }
            "/transcript" => {
                self.print_transcript()?;
            }
            _ => {
                self.send(input).await?;
            }
        }

        Ok(())
    }

    async fn print_status(&mut self) -> Result<()> {
        match self.controller.gateway().health().await {
            Ok(health) if health.is_ok() => {
                let message = health.message.unwrap_or_else(|| "ok".to_string());
                writeln!(self.output, "Service is up: {}", message)?;
            }
            Ok(health) => {
                writeln!(self.output, "Service reported status '{}'", health.status)?;
            }
            Err(e) => {
                writeln!(self.output, "Service is unreachable: {}", e)?;
            }
        }
        Ok(())
    }

    /// Submits one message and prints the reply. Returns whether the exchange failed.
    async fn send(&mut self, text: &str) -> Result<bool> {
        self.controller.update_draft(text);
        if !self.controller.submit(text) {
            debug!(
                "Submission not accepted, draft kept: {:?}",
                self.controller.state().draft()
            );
            return Ok(false);
        }

        let indicator = self
            .interactive
            .then(|| ThinkingIndicator::new(&self.agent_name));
        let Some(settlement) = wait_for_settlement(&mut self.controller, indicator).await else {
            return Ok(false);
        };

        if let Some(kind) = settlement.failure {
            debug!("Exchange settled with {:?} failure", kind);
        }

        if self.interactive {
            render_message(&mut self.output, &self.agent_name, settlement.reply)?;
        } else {
            writeln!(self.output, "{}", settlement.reply.text())?;
        }

        Ok(settlement.failure.is_some())
    }
}

async fn wait_for_settlement<G>(
    controller: &mut ChatController<G>,
    mut indicator: Option<ThinkingIndicator>,
) -> Option<Settlement<'_>>
where
    G: ResponseGateway + 'static,
{
    let settle = controller.settle_pending();
    tokio::pin!(settle);
    let mut ticker = tokio::time::interval(INDICATOR_TICK);

    loop {
        tokio::select! {
            settlement = &mut settle => return settlement,
            _ = ticker.tick() => {
                // A broken terminal must not keep the exchange from settling
                if let Some(Err(e)) = indicator.as_mut().map(ThinkingIndicator::tick) {
                    debug!("Dropping thinking indicator: {}", e);
                    indicator = None;
                }
            }
        }
    }
}

fn render_message(output: &mut dyn Write, agent_name: &str, message: &Message) -> Result<()> {
    let line = match message.sender() {
        Sender::User => cformat!("<green,bold>You:</> {}", message.text()),
        Sender::Agent => cformat!("<cyan,bold>{}:</> {}", agent_name, message.text()),
    };
    writeln!(output, "{}\n", line)?;
    Ok(())
}
