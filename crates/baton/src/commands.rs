//! Baton command implementations

use anyhow::{Context, Result};
use std::io::Write;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use baton_agent::{
    Agent, CancellationToken, ModelRef, Provider, RunConfig, RunResult, Runner, Transcript,
};
use baton_config::{self, Config};
use baton_provider::OpenAiCompatProvider;
use baton_shop::{customer_support_agent, shopping_assistant, RandomPrice, UserProfile};

const GOODBYE: &str = "Goodbye!, Come back next time for more shopping assistance.";

/// One shopper talking to the shop agents
///
/// Every turn starts from the shopping assistant; the transcript and the
/// profile carry over between turns for as long as the process runs.
pub struct Session {
    runner: Runner,
    entry: Arc<Agent<UserProfile>>,
    transcript: Transcript,
    profile: UserProfile,
}

impl Session {
    pub fn new(runner: Runner, entry: Arc<Agent<UserProfile>>, profile: UserProfile) -> Self {
        Self {
            runner,
            entry,
            transcript: Transcript::new(),
            profile,
        }
    }

    /// Build the shop agents from config
    pub fn from_config(config: &Config, provider: Arc<dyn Provider>) -> Self {
        let mut model = ModelRef::new(provider)
            .with_temperature(config.runner.temperature)
            .with_max_tokens(config.runner.max_tokens);
        if let Some(name) = config.model() {
            model = model.with_model(name);
        }

        let support = customer_support_agent(model.clone());
        let entry = shopping_assistant(model, support, Arc::new(RandomPrice));
        let runner = Runner::new(RunConfig {
            max_turns: config.max_turns(),
        });
        let profile = UserProfile::new(&config.profile.id, &config.profile.name);

        Self::new(runner, entry, profile)
    }

    /// Run one turn; a fired `cancel` stops it and keeps what was recorded so far
    pub async fn send(
        &mut self,
        message: &str,
        cancel: &CancellationToken,
    ) -> Result<RunResult<UserProfile>> {
        self.transcript.push_user(message);

        let result = self
            .runner
            .run_with_cancel(&self.entry, &mut self.transcript, &mut self.profile, cancel)
            .await?;
        debug!(
            "Turn used {} model rounds, {} tokens",
            result.iterations, result.usage.total_tokens
        );
        Ok(result)
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn profile(&self) -> &UserProfile {
        &self.profile
    }
}

/// Ctrl-C routing for a chat session
///
/// One listener lives for the whole session. While a turn runs, Ctrl-C
/// cancels that turn; at the prompt it ends the session.
#[derive(Clone, Default)]
pub struct Interrupts {
    running: Arc<Mutex<Option<CancellationToken>>>,
}

impl Interrupts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the process-wide Ctrl-C listener
    pub fn listen(&self) -> JoinHandle<()> {
        let interrupts = self.clone();
        tokio::spawn(async move {
            while tokio::signal::ctrl_c().await.is_ok() {
                if !interrupts.interrupt() {
                    println!();
                    println!("{}", GOODBYE);
                    std::process::exit(0);
                }
            }
        })
    }

    /// Mark a turn as running and hand out its token
    pub fn begin(&self) -> CancellationToken {
        let cancel = CancellationToken::new();
        *self.slot() = Some(cancel.clone());
        cancel
    }

    pub fn end(&self) {
        self.slot().take();
    }

    /// Cancel the running turn; `false` when idle
    pub fn interrupt(&self) -> bool {
        match self.slot().as_ref() {
            Some(cancel) => {
                debug!("Interrupt: cancelling running turn");
                cancel.cancel();
                true
            }
            None => false,
        }
    }

    fn slot(&self) -> MutexGuard<'_, Option<CancellationToken>> {
        self.running.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Initialize config
pub async fn init_command() -> Result<()> {
    println!("◆ Initializing Baton...");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let config = baton_config::init().await?;
    info!(
        "Default model: {}",
        config.model().as_deref().unwrap_or("(endpoint default)")
    );

    println!("\n◆ Baton initialized");
    println!("\nNext steps:");
    println!(
        "  1. Add your API key to {} or set GEMINI_API_KEY",
        baton_config::config_path().display()
    );
    println!("     Get one at: https://aistudio.google.com/apikey");
    println!("  2. Start chatting: baton chat");

    Ok(())
}

/// Chat with the shopping assistant
pub async fn chat_command(message: Option<String>) -> Result<()> {
    let config = Config::load().await?;

    let api_key = config.api_key().with_context(|| {
        format!(
            "No API key configured. Set GEMINI_API_KEY or add one to {}",
            baton_config::config_path().display()
        )
    })?;
    let provider = OpenAiCompatProvider::new(api_key, config.api_base(), None);
    info!("Using endpoint {}", provider.api_base());

    let mut session = Session::from_config(&config, Arc::new(provider));
    let interrupts = Interrupts::new();
    let listener = interrupts.listen();

    if let Some(msg) = message {
        let cancel = interrupts.begin();
        let outcome = session.send(&msg, &cancel).await;
        interrupts.end();
        listener.abort();
        let result = outcome?;
        println!("\n◆ {}: {}", result.last_agent.name(), result.final_output);
        return Ok(());
    }

    println!(
        "You are now chatting with the shopping assistant. Type 'exit' to end the conversation."
    );
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    loop {
        print!("You: ");
        std::io::stdout().flush()?;

        let mut input = String::new();
        if std::io::stdin().read_line(&mut input)? == 0 {
            println!();
            println!("{}", GOODBYE);
            break;
        }

        let input = input.trim();
        if input.is_empty() {
            continue;
        }
        if input == "exit" || input == "quit" {
            println!("{}", GOODBYE);
            break;
        }

        let cancel = interrupts.begin();
        let outcome = session.send(input, &cancel).await;
        interrupts.end();
        match outcome {
            Ok(result) => println!("{}: {}\n", result.last_agent.name(), result.final_output),
            Err(e) => println!("◆ Error: {}\n", e),
        }
    }

    listener.abort();
    Ok(())
}

/// Show config and API key status
pub async fn status_command() -> Result<()> {
    let config_path = baton_config::config_path();

    println!("◆ Baton Status");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    println!(
        "Config:    {} {}",
        config_path.display(),
        if config_path.exists() {
            "[OK]"
        } else {
            "[Missing]"
        }
    );

    let config = Config::load().await?;
    println!(
        "Model:     {}",
        config.model().as_deref().unwrap_or("(endpoint default)")
    );
    println!(
        "API Key:   {}",
        if config.has_api_key() {
            "[Set]"
        } else {
            "[Missing]"
        }
    );
    match config.max_turns() {
        Some(n) => println!("Max turns: {}", n),
        None => println!("Max turns: unlimited"),
    }
    println!(
        "Profile:   {} ({})",
        config.profile.name, config.profile.id
    );

    println!("\n◆ Ready");

    Ok(())
}
