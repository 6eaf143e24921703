use std::sync::Arc;

use clap::{Parser, Subcommand};
use inline_colorization::*;

use authguard::auth::{roles_from_token, Claims};
use authguard::client::ApiError;
use authguard::config::{load_config, load_config_from, print_schema, ConfigError, ConfigV1};
use authguard::guard::{Decision, TracingNavigator};
use authguard::startup::build_state;
use authguard::state::AppState;
use authguard::utils::logger::{init_logging, LoggingError};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),
    #[error("{0}")]
    Logging(#[from] LoggingError),
    #[error("{0}")]
    Api(#[from] ApiError),
    #[error("failed to render JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "authguard", about = "Session, route guard and auth API client")]
struct Cli {
    /// YAML configuration file; defaults to ./config.yaml.
    #[arg(long, env = "AUTHGUARD_CONFIG")]
    config: Option<String>,

    /// Overrides `api.base_url` from the configuration.
    #[arg(long, env = "AUTHGUARD_BASE_URL")]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Command {
    /// Print the configuration JSON schema.
    Schema,
    /// Sign in and store the session.
    Signin { email: String, password: String },
    Signup {
        username: String,
        email: String,
        password: String,
    },
    /// End the session.
    Logout,
    /// Show the stored session.
    Whoami,
    /// Fetch the current user from the backend.
    Me,
    /// Run the navigation guard for each path.
    Check {
        #[arg(required = true)]
        paths: Vec<String>,
    },
    ForgotPassword { email: String },
    ResetPassword { token: String, new_password: String },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("{color_red}error{color_reset}: {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    if cli.command == Command::Schema {
        print_schema()?;
        return Ok(());
    }

    let config = load(&cli)?;
    init_logging(&config.logging)?;
    let state = build_state(Arc::new(config), Arc::new(TracingNavigator))?;

    match cli.command {
        Command::Schema => {}
        Command::Signin { email, password } => {
            let user = state.auth.signin(&email, &password).await?;
            println!("Signed in as {style_bold}{}{style_reset} ({})", user.email, user.role);
        }
        Command::Signup {
            username,
            email,
            password,
        } => {
            let user = state.auth.signup(&username, &email, &password).await?;
            println!("Registered {style_bold}{}{style_reset}", user.email);
        }
        Command::Logout => {
            state.auth.logout(state.navigator.as_ref()).await;
            println!("Signed out");
        }
        Command::Whoami => whoami(&state),
        Command::Me => {
            let user = state.auth.current_user().await?;
            println!("{}", serde_json::to_string_pretty(&user)?);
        }
        Command::Check { paths } => {
            for path in &paths {
                match state.guard.check(path) {
                    Decision::Allow => println!("{color_green}allow{color_reset}    {}", path),
                    Decision::Redirect(to) => {
                        println!("{color_yellow}redirect{color_reset} {} -> {}", path, to)
                    }
                }
            }
        }
        Command::ForgotPassword { email } => {
            state.auth.forgot_password(&email).await?;
            println!("Password reset requested for {}", email);
        }
        Command::ResetPassword {
            token,
            new_password,
        } => {
            state.auth.reset_password(&token, &new_password).await?;
            println!("Password updated");
        }
    }
    Ok(())
}

fn load(cli: &Cli) -> Result<ConfigV1, ConfigError> {
    let mut config = match &cli.config {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };
    if let Some(base_url) = &cli.base_url {
        config.api.base_url = base_url.clone();
    }
    Ok(config)
}

fn whoami(state: &AppState) {
    let Some(token) = state.session.get_token() else {
        println!("Not signed in");
        return;
    };
    match state.session.user() {
        Some(user) => println!(
            "{style_bold}{}{style_reset} <{}> role={}",
            user.full_name(),
            user.email,
            user.role
        ),
        None => println!("Token present but no stored profile"),
    }
    let subject = Claims::from_token(token.as_str())
        .and_then(|claims| claims.sub().map(str::to_string))
        .unwrap_or_else(|| "-".to_string());
    println!("token subject: {}", subject);
    println!("token roles:   {:?}", roles_from_token(token.as_str()));
}
