//! The bot: one gateway, one dispatcher, one worker pool.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use herald_runtime::Bot;
//!
//! // Loads herald.toml from the current directory, HERALD_* env on top
//! let bot = Bot::builder(Arc::new(MyGateway::new()))
//!     .gate(PermissionGate::new(role_cache))
//!     .build()?;
//!
//! bot.register_command(ping);
//! bot.listen(Listener::builder("greeter").on(greet))?;
//!
//! // Run until Ctrl+C
//! bot.run().await?;
//! ```

use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use herald_core::{BoxedEvent, BoxedGateway, Channel};
use herald_framework::{
    Command, DispatchOutcome, Dispatcher, Listener, ListenerBuilder, PermissionGate, WorkerPool,
};
use parking_lot::Mutex;
use tokio::signal;
use tracing::{error, info, warn};

use crate::config::{ConfigLoader, HeraldConfig, validate_config};
use crate::error::{RuntimeError, RuntimeResult};
use crate::files::FileManager;
use crate::logging;

/// A bot wired to a gateway.
///
/// Listeners and commands may be registered or removed at any time, including
/// while the bot is running.
pub struct Bot {
    config: HeraldConfig,
    gateway: BoxedGateway,
    dispatcher: Arc<Dispatcher>,
    files: FileManager,
    /// `Some` while running.
    pool: Mutex<Option<Arc<WorkerPool>>>,
}

impl Bot {
    /// Creates a bot builder for `gateway`.
    pub fn builder(gateway: BoxedGateway) -> BotBuilder {
        BotBuilder::new(gateway)
    }

    /// Creates a bot from an already loaded configuration.
    ///
    /// The configuration is validated and every configured file is opened.
    /// Logging is left alone.
    pub fn from_config(
        gateway: BoxedGateway,
        config: HeraldConfig,
        gate: PermissionGate,
    ) -> RuntimeResult<Self> {
        Self::assemble(gateway, config, gate)
    }

    fn assemble(
        gateway: BoxedGateway,
        config: HeraldConfig,
        gate: PermissionGate,
    ) -> RuntimeResult<Self> {
        validate_config(&config)?;

        let dispatcher = Dispatcher::new()
            .with_prefix(config.bot.prefix.clone())
            .with_fan_out(config.dispatch.fan_out)
            .with_gate(gate);

        let files = FileManager::new();
        files.open_all(&config.files)?;

        info!(
            gateway = gateway.name(),
            prefix = %config.bot.prefix,
            workers = config.dispatch.workers,
            files = files.len(),
            "Bot initialized"
        );

        Ok(Self {
            config,
            gateway,
            dispatcher: Arc::new(dispatcher),
            files,
            pool: Mutex::new(None),
        })
    }

    pub fn config(&self) -> &HeraldConfig {
        &self.config
    }

    pub fn gateway(&self) -> &BoxedGateway {
        &self.gateway
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    /// Files opened from the `files` configuration section.
    pub fn files(&self) -> &FileManager {
        &self.files
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Builds a listener and registers it.
    ///
    /// Returns the listener so it can be unregistered later.
    pub fn listen(&self, builder: ListenerBuilder) -> RuntimeResult<Arc<Listener>> {
        let listener = builder.build()?;
        self.register_listener(Arc::clone(&listener));
        Ok(listener)
    }

    /// Returns `false` if the listener was already registered.
    pub fn register_listener(&self, listener: Arc<Listener>) -> bool {
        self.dispatcher.register_listener(listener)
    }

    pub fn unregister_listener(&self, listener: &Arc<Listener>) -> bool {
        self.dispatcher.unregister_listener(listener)
    }

    /// Returns `false` if the command was already registered.
    pub fn register_command(&self, command: Arc<Command>) -> bool {
        self.dispatcher.register_command(command)
    }

    pub fn unregister_command(&self, command: &Arc<Command>) -> bool {
        self.dispatcher.unregister_command(command)
    }

    pub fn set_prefix(&self, prefix: impl Into<String>) {
        self.dispatcher.set_prefix(prefix);
    }

    pub fn prefix(&self) -> String {
        self.dispatcher.prefix()
    }

    // =========================================================================
    // Events
    // =========================================================================

    /// Dispatches an event on the calling task, bypassing the queue.
    pub async fn dispatch(&self, event: impl Into<BoxedEvent>) -> DispatchOutcome {
        self.dispatcher.dispatch(event).await
    }

    /// Queues an event for the worker pool, as a gateway would.
    pub async fn submit(&self, event: impl Into<BoxedEvent>) -> RuntimeResult<()> {
        let sink = match self.pool.lock().as_ref() {
            Some(pool) => pool.sink(),
            None => return Err(RuntimeError::NotRunning),
        };
        sink.send(event).await?;
        Ok(())
    }

    /// Posts a message through the gateway.
    pub async fn send_message(&self, channel: &Channel, content: &str) -> RuntimeResult<()> {
        self.gateway.send_message(channel, content).await?;
        Ok(())
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    pub fn is_running(&self) -> bool {
        self.pool.lock().is_some()
    }

    /// Spawns the worker pool and starts the gateway.
    ///
    /// The pool is installed before the gateway starts, so handlers may
    /// already `submit` or `stop` while `start` is in progress. If the
    /// gateway fails to start, the pool is shut down again and the gateway's
    /// error is returned.
    pub async fn start(&self) -> RuntimeResult<()> {
        let pool = {
            let mut slot = self.pool.lock();
            if slot.is_some() {
                return Err(RuntimeError::AlreadyRunning);
            }

            info!(gateway = self.gateway.name(), "Starting bot");

            let pool = Arc::new(WorkerPool::spawn(
                Arc::clone(&self.dispatcher),
                self.config.dispatch.pool_config(),
            ));
            *slot = Some(Arc::clone(&pool));
            pool
        };

        if let Err(e) = self.gateway.start(pool.sink()).await {
            error!(gateway = self.gateway.name(), error = %e, "Failed to start gateway");
            {
                let mut slot = self.pool.lock();
                if slot.as_ref().is_some_and(|p| Arc::ptr_eq(p, &pool)) {
                    *slot = None;
                }
            }
            pool.shutdown().await;
            return Err(e.into());
        }

        info!(gateway = self.gateway.name(), "Bot started");
        Ok(())
    }

    /// Stops the gateway, then drains and stops the worker pool.
    ///
    /// The pool is shut down even if the gateway reports an error. Handlers
    /// may call this; queued events are still dispatched before it returns.
    pub async fn stop(&self) -> RuntimeResult<()> {
        let Some(pool) = self.pool.lock().take() else {
            return Err(RuntimeError::NotRunning);
        };

        info!(gateway = self.gateway.name(), "Stopping bot");

        let stopped = self.gateway.stop().await;
        if let Err(e) = &stopped {
            error!(gateway = self.gateway.name(), error = %e, "Error during gateway shutdown");
        }

        pool.shutdown().await;
        info!(processed = pool.processed(), "Bot stopped");

        stopped.map_err(Into::into)
    }

    /// Runs the bot until Ctrl+C or SIGTERM.
    pub async fn run(&self) -> RuntimeResult<()> {
        self.start().await?;

        info!("Herald is now running. Press Ctrl+C to stop.");
        wait_for_shutdown().await;

        self.stop().await
    }

    /// Runs the bot until `shutdown` completes.
    pub async fn run_until<F>(&self, shutdown: F) -> RuntimeResult<()>
    where
        F: Future<Output = ()>,
    {
        self.start().await?;
        shutdown.await;
        self.stop().await
    }
}

impl std::fmt::Debug for Bot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bot")
            .field("gateway", &self.gateway.name())
            .field("prefix", &self.prefix())
            .field("files", &self.files.keys())
            .finish_non_exhaustive()
    }
}

/// Waits for Ctrl+C, or SIGTERM on unix.
async fn wait_for_shutdown() {
    #[cfg(unix)]
    {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = signal::ctrl_c() => {
                        info!("Received Ctrl+C, shutting down");
                    }
                    _ = sigterm.recv() => {
                        info!("Received SIGTERM, shutting down");
                    }
                }
                return;
            }
            Err(e) => warn!(error = %e, "Failed to register SIGTERM handler"),
        }
    }

    match signal::ctrl_c().await {
        Ok(()) => info!("Received Ctrl+C, shutting down"),
        Err(e) => error!(error = %e, "Failed to listen for Ctrl+C, shutting down"),
    }
}

// =============================================================================
// BotBuilder
// =============================================================================

/// Builder for a [`Bot`].
///
/// Without a [`gate`](Self::gate), commands with a permission are denied
/// inside guilds. Pass [`PermissionGate::allow_all`] to opt out.
///
/// # Example
///
/// ```rust,ignore
/// let bot = Bot::builder(gateway)
///     .config_file("config/production.toml")
///     .gate(PermissionGate::new(role_cache))
///     .build()?;
/// ```
pub struct BotBuilder {
    gateway: BoxedGateway,
    config_loader: ConfigLoader,
    config: Option<HeraldConfig>,
    gate: Option<PermissionGate>,
    init_logging: bool,
}

impl BotBuilder {
    pub fn new(gateway: BoxedGateway) -> Self {
        Self {
            gateway,
            config_loader: ConfigLoader::new().with_current_dir(),
            config: None,
            gate: None,
            init_logging: true,
        }
    }

    /// Uses this configuration as is, skipping files and environment.
    pub fn config(mut self, config: HeraldConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Sets a specific configuration file to load.
    pub fn config_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.file(path);
        self
    }

    /// Sets the configuration profile (e.g., "development", "production").
    pub fn profile(mut self, profile: impl AsRef<str>) -> Self {
        self.config_loader = self.config_loader.profile(profile);
        self
    }

    /// Adds a search path for configuration files.
    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.search_path(path);
        self
    }

    /// Disables loading `HERALD_*` environment variables.
    pub fn without_env(mut self) -> Self {
        self.config_loader = self.config_loader.without_env();
        self
    }

    /// Merges configuration programmatically, above files and environment.
    pub fn merge(mut self, config: HeraldConfig) -> Self {
        self.config_loader = self.config_loader.merge(config);
        self
    }

    /// Overrides one dotted configuration key, above files and environment.
    pub fn set<T: serde::Serialize>(mut self, key: &str, value: T) -> Self {
        self.config_loader = self.config_loader.set(key, value);
        self
    }

    /// Sets the permission gate used for commands.
    pub fn gate(mut self, gate: PermissionGate) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Whether `build` installs the global log subscriber (default `true`).
    pub fn init_logging(mut self, enabled: bool) -> Self {
        self.init_logging = enabled;
        self
    }

    /// Loads and validates the configuration, then builds the bot.
    pub fn build(self) -> RuntimeResult<Bot> {
        let config = match self.config {
            Some(config) => config,
            None => self.config_loader.load()?,
        };

        if self.init_logging {
            logging::init_from_config(&config.logging);
        }

        let gate = self.gate.unwrap_or_else(|| {
            warn!("No permission gate set, guild commands will be denied");
            PermissionGate::deny_all()
        });

        Bot::assemble(self.gateway, config, gate)
    }
}
