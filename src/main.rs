use color_eyre::Result;
use clap::Parser;
use moodscribe::{
    Config, Profile,
    api::ApiClient,
    auth::AuthContext,
    cli::{self, Cli, Commands},
    logging,
    router::Route,
    session::SessionStore,
    tui::{self, dispatch::Dispatcher},
};

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    let profile = if cli.dev {
        Profile::Dev
    } else {
        Profile::Prod
    };

    let mut config = match cli.config.as_deref() {
        Some(path) => Config::load_from_path(path, profile)?,
        None => Config::load_with_profile(profile)?,
    };
    config.apply_api_url_override(cli.api_url);

    let command = cli.command.unwrap_or(Commands::Tui { route: "/".to_string() });

    // The TUI owns the terminal, so only one-shot commands log to stderr
    match command {
        Commands::Tui { .. } => logging::init_file_logging(&config.get_log_path(), &config.log_level)?,
        _ => logging::init_stderr_logging(&config.log_level)?,
    }
    tracing::info!(api = %config.api_base_url, ?profile, "starting moodscribe");

    let store = SessionStore::open(&config.get_session_path())?;
    let mut auth = AuthContext::restore(store)?;
    let client = ApiClient::new(config.api_base_url.clone());

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    match command {
        Commands::Tui { route } => {
            let dispatcher = Dispatcher::new(runtime.handle().clone());
            let app = tui::App::new(config, auth, Route::from_path(&route));
            tui::run_event_loop(app, client, dispatcher)?;
        }
        Commands::Login { username, password } => {
            runtime.block_on(cli::handle_login(username, password, &client, &mut auth))?;
        }
        Commands::Logout => {
            cli::handle_logout(&mut auth)?;
        }
        Commands::Write { content } => {
            runtime.block_on(cli::handle_write(content, &client, &auth))?;
        }
        Commands::History => {
            runtime.block_on(cli::handle_history(&client, &auth))?;
        }
        Commands::Preferences => {
            runtime.block_on(cli::handle_preferences(&client, &auth))?;
        }
    }

    Ok(())
}
