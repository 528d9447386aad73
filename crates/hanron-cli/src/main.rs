mod commands;
mod config;

use anyhow::{Context, Result};
use std::io::{self, Write};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use hanron_debate::{
    ConversationSession, DebateError, IdentityProvider, LlmGateway, LocalIdentityProvider,
    SessionPhase, SessionState, TopicBinder,
};
use hanron_llm::ClientFactory;
use hanron_persist::{InMemoryThreadStore, Message, MessageRole, ThreadStore};

use commands::{Command, ThreadRef, HELP};
use config::{Config, StoreBackend};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let config = Config::load()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

    init_logging(&config);

    tracing::info!(
        provider = ?config.llm.provider,
        model = %config.llm.model,
        backend = ?config.store.backend,
        "starting hanron"
    );

    let client = ClientFactory::create_chat_client(&config.provider_config())
        .context("Failed to create chat client")?;
    let gateway = Arc::new(LlmGateway::new(client, config.llm.model.clone()));
    let store = build_store(&config).await?;

    let mut session = ConversationSession::new(store, gateway, config.debate_config());
    if let Some(path) = &config.session.system_template {
        session = session.with_binder(TopicBinder::from_template_file(path)?);
    }

    let mut app = App {
        session,
        identity: Arc::new(LocalIdentityProvider::new()),
        state: SessionState::new(),
    };

    print_banner();
    app.run().await
}

async fn build_store(config: &Config) -> Result<Arc<dyn ThreadStore>> {
    match config.store.backend {
        StoreBackend::Memory => Ok(Arc::new(InMemoryThreadStore::with_sweep_batch_size(
            config.store.sweep_batch_size,
        ))),
        StoreBackend::Mongodb => connect_mongo(config).await,
    }
}

#[cfg(feature = "mongodb")]
async fn connect_mongo(config: &Config) -> Result<Arc<dyn ThreadStore>> {
    let uri = config
        .mongodb_uri
        .as_deref()
        .context("MONGODB_URI is not set")?;

    tracing::info!(database = %config.mongodb.database, "connecting to MongoDB");
    let store = hanron_persist::MongoThreadStore::connect(uri, &config.mongodb.database)
        .await
        .context("Failed to connect to MongoDB")?
        .with_sweep_batch_size(config.store.sweep_batch_size);
    tracing::info!("MongoDB connected");

    Ok(Arc::new(store))
}

#[cfg(not(feature = "mongodb"))]
async fn connect_mongo(_config: &Config) -> Result<Arc<dyn ThreadStore>> {
    anyhow::bail!("the mongodb backend needs a build with `--features mongodb`")
}

struct App {
    session: ConversationSession,
    identity: Arc<dyn IdentityProvider>,
    state: SessionState,
}

impl App {
    async fn run(&mut self) -> Result<()> {
        loop {
            print!("\n\x1b[1;36m{}:\x1b[0m ", self.prompt_label());
            io::stdout().flush()?;

            let mut input = String::new();
            if io::stdin().read_line(&mut input)? == 0 {
                break;
            }
            let input = input.trim();
            if input.is_empty() {
                continue;
            }

            let command = match commands::parse(input) {
                Ok(command) => command,
                Err(usage) => {
                    println!("\x1b[1;33m{}\x1b[0m", usage);
                    continue;
                }
            };
            if command == Command::Quit {
                break;
            }

            if let Err(e) = self.handle(command).await {
                print_error(&e);
            }
        }

        println!("\nGoodbye!");
        Ok(())
    }

    fn prompt_label(&self) -> String {
        match self.state.user() {
            Some(user) => user.email.clone(),
            None => "You".to_string(),
        }
    }

    async fn handle(&mut self, command: Command) -> Result<(), DebateError> {
        match command {
            Command::Say(text) => {
                let first_turn = self.state.phase() != SessionPhase::Active;
                let turn = self.session.submit(&mut self.state, &text).await?;
                if first_turn {
                    println!("\x1b[2m[Topic: {}]\x1b[0m", text.trim());
                }
                println!("\n\x1b[1;32mOpponent:\x1b[0m {}", turn.content);
            }
            Command::Register { email, password } => {
                let identity = self.identity.register_and_sign_in(&email, &password).await?;
                self.session.login(&mut self.state, identity).await?;
                println!("Account created. Signed in as {}.", email.trim());
            }
            Command::Login { email, password } => {
                let identity = self.identity.sign_in(&email, &password).await?;
                self.session.login(&mut self.state, identity).await?;
                println!("Signed in as {}.", email.trim());
                self.print_history().await?;
            }
            Command::Logout => {
                self.session.logout(&mut self.state);
                println!("Signed out. Your threads are kept.");
            }
            Command::Threads => {
                let threads = self.session.list_threads(&self.state).await?;
                if threads.is_empty() {
                    println!("No threads yet.");
                }
                let active = self.state.active_thread().and_then(|t| t.thread_id());
                for (n, thread) in threads.iter().enumerate() {
                    let marker = if active == Some(thread.id.as_str()) { "*" } else { " " };
                    println!("{} {:>2}. {}  \x1b[2m{}\x1b[0m", marker, n + 1, thread.display_title(), thread.id);
                }
            }
            Command::Switch(target) => {
                let thread_id = self.resolve(target).await?;
                let thread = self.session.switch_thread(&mut self.state, &thread_id).await?;
                println!("Switched to: {}", thread.title().unwrap_or("untitled"));
                self.print_history().await?;
            }
            Command::New => {
                self.session.new_thread(&mut self.state);
                println!("New thread. Your next message sets its topic.");
            }
            Command::Delete(target) => {
                let thread_id = self.resolve(target).await?;
                self.session.delete_thread(&mut self.state, &thread_id).await?;
                println!("Thread deleted.");
            }
            Command::History => self.print_history().await?,
            Command::Reset => {
                self.session.reset(&mut self.state).await?;
                println!("Conversation reset. Your next message sets a new topic.");
            }
            Command::Help => println!("{}", HELP),
            Command::Quit => {}
        }
        Ok(())
    }

    async fn resolve(&self, target: ThreadRef) -> Result<String, DebateError> {
        match target {
            ThreadRef::Id(id) => Ok(id),
            ThreadRef::Index(n) => {
                let threads = self.session.list_threads(&self.state).await?;
                threads
                    .get(n - 1)
                    .map(|t| t.id.clone())
                    .ok_or_else(|| DebateError::Validation(format!("no thread number {}", n)))
            }
        }
    }

    async fn print_history(&self) -> Result<(), DebateError> {
        let messages = self.session.history(&self.state).await?;
        if messages.is_empty() {
            return Ok(());
        }

        println!("\n\x1b[2m--- Past conversation ---\x1b[0m");
        for message in &messages {
            print_message(message);
        }
        println!("\x1b[2m-------------------------\x1b[0m");
        Ok(())
    }
}

fn print_message(message: &Message) {
    match message.role {
        MessageRole::User => println!("\x1b[1;36mYou:\x1b[0m {}", message.content),
        MessageRole::Assistant => println!("\x1b[1;32mOpponent:\x1b[0m {}", message.content),
        MessageRole::System => {}
    }
}

fn print_error(error: &DebateError) {
    println!("\n\x1b[1;31mError: {}\x1b[0m", error);
    if error.is_retryable() {
        println!("\x1b[2mThe service is unavailable right now. Please try again.\x1b[0m");
    }
}

fn print_banner() {
    println!("╔════════════════════════════════════════════════════════════╗");
    println!("║                 Hanron - Debate Partner                   ║");
    println!("╚════════════════════════════════════════════════════════════╝");
    println!();
    println!("State a claim and the assistant will argue against it.");
    println!("Guest conversations are not saved; /register or /login to keep threads.");
    println!("Type /help for commands, /quit to exit.");
}

fn init_logging(config: &Config) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let registry = tracing_subscriber::registry().with(env_filter);

    // Logs go to stderr so they never interleave with the conversation.
    match config.logging.format.as_str() {
        "json" => {
            registry
                .with(tracing_subscriber::fmt::layer().json().with_writer(io::stderr))
                .init();
        }
        _ => {
            registry
                .with(tracing_subscriber::fmt::layer().pretty().with_writer(io::stderr))
                .init();
        }
    }
}
