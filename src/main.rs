use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use colored::*;
use copywriter_core::{
    export, ChatClient, CompletionBackend, Config, CopyLog, Copywriter, Format, LogStatus,
    Provider, Session, Tone,
};

mod app;
mod handler;
mod logging;
mod tui;
mod ui;

use app::App;

#[derive(Parser)]
#[command(name = "copywriter")]
#[command(version)]
#[command(about = "Generate marketing copy in your own voice with DeepSeek or OpenAI")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Do not append generated copy to the copy log
    #[arg(long, global = true)]
    no_log: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate one piece of copy and print it
    Generate {
        /// What the copy is about
        #[arg(short, long)]
        topic: String,
        /// Tone of voice (see `copywriter tones`)
        #[arg(long, default_value = "professional")]
        tone: Tone,
        /// Kind of copy (see `copywriter formats`)
        #[arg(short, long, default_value = "email")]
        format: Format,
        /// Your voice, brand or audience
        #[arg(long)]
        personal_context: Option<String>,
        /// What this particular piece is for
        #[arg(long)]
        content_context: Option<String>,
        /// Writing sample (.txt, .docx, .pdf); repeat for more
        #[arg(short, long = "example")]
        examples: Vec<PathBuf>,
        /// Provider to use (deepseek, openai)
        #[arg(long)]
        provider: Option<String>,
        /// Model name, defaults to the provider's default
        #[arg(short, long)]
        model: Option<String>,
        /// Completion token limit
        #[arg(long)]
        max_tokens: Option<u32>,
        /// Also write the copy to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List the available tones
    Tones,
    /// List the available formats
    Formats,
    /// Show or change saved settings
    Config {
        /// Default provider (deepseek, openai)
        #[arg(long)]
        provider: Option<String>,
        /// Default model
        #[arg(long)]
        model: Option<String>,
        /// API key for the selected provider
        #[arg(long)]
        api_key: Option<String>,
        /// File generated copy is appended to
        #[arg(long)]
        log_path: Option<PathBuf>,
        /// Completion token limit
        #[arg(long)]
        max_tokens: Option<u32>,
        /// Request timeout in seconds
        #[arg(long)]
        timeout_secs: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        run_tui(!cli.no_log).await?;
        return Ok(ExitCode::SUCCESS);
    };

    logging::init_stderr();

    match command {
        Commands::Generate {
            topic,
            tone,
            format,
            personal_context,
            content_context,
            examples,
            provider,
            model,
            max_tokens,
            output,
        } => {
            let mut config = Config::load()?;
            if let Some(provider) = provider {
                config.provider = Some(parse_provider(&provider)?.as_str().to_string());
            }
            if model.is_some() {
                config.model = model;
            }
            if max_tokens.is_some() {
                config.max_tokens = max_tokens;
            }

            let request = GenerateArgs {
                topic,
                tone,
                format,
                personal_context,
                content_context,
                examples,
                output,
            };
            generate_once(&config, request, !cli.no_log).await
        }
        Commands::Tones => {
            println!("\n{}", "Tones".bold().blue());
            for tone in Tone::ALL {
                println!("  • {}", tone.label().green());
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Formats => {
            println!("\n{}", "Formats".bold().blue());
            for format in Format::ALL {
                println!("  • {}", format.label().green());
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Config {
            provider,
            model,
            api_key,
            log_path,
            max_tokens,
            timeout_secs,
        } => {
            update_config(provider, model, api_key, log_path, max_tokens, timeout_secs)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn run_tui(log_enabled: bool) -> Result<()> {
    let config = Config::load()?;
    let _guard = logging::init_file(&Config::config_dir()?)?;

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = tui::EventHandler::new();
    let mut app = App::new(&config, log_enabled);

    let result = async {
        while !app.should_quit {
            terminal.draw(|frame| ui::render(&mut app, frame))?;
            match events.next().await {
                Some(event) => handler::handle_event(&mut app, event).await?,
                None => break,
            }
        }
        Ok::<_, anyhow::Error>(())
    }
    .await;

    app.shutdown();
    tui::restore()?;
    result
}

struct GenerateArgs {
    topic: String,
    tone: Tone,
    format: Format,
    personal_context: Option<String>,
    content_context: Option<String>,
    examples: Vec<PathBuf>,
    output: Option<PathBuf>,
}

async fn generate_once(config: &Config, args: GenerateArgs, log_enabled: bool) -> Result<ExitCode> {
    let client = match ChatClient::from_config(config) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            return Ok(ExitCode::FAILURE);
        }
    };

    let mut session = Session::new();
    for path in &args.examples {
        match session.add_example_file(path) {
            Ok(doc) => eprintln!(
                "{} {} ({} characters)",
                "Loaded".green(),
                doc.filename,
                doc.text.chars().count()
            ),
            Err(reason) => eprintln!(
                "{} {}: {}",
                "Skipped".yellow(),
                path.display(),
                reason
            ),
        }
    }

    let request = match session.request(&args.topic, args.tone, args.format) {
        Ok(request) => request
            .with_personal_context(args.personal_context.as_deref())
            .with_content_context(args.content_context.as_deref()),
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            return Ok(ExitCode::FAILURE);
        }
    };

    let mut copywriter = Copywriter::new(client);
    if log_enabled {
        copywriter = copywriter.with_log(CopyLog::new(config.log_path()));
    }

    eprintln!(
        "Writing {} {} with {}...\n",
        args.tone.label().to_lowercase().bold(),
        args.format.label().to_lowercase().bold(),
        copywriter.backend().model().magenta()
    );

    let generation = copywriter.generate(&request).await;
    let text = match generation.result.into_result() {
        Ok(text) => text,
        Err(failure) => {
            eprintln!("{} {}", "Error:".red().bold(), failure);
            return Ok(ExitCode::FAILURE);
        }
    };

    println!("{}", text);

    match generation.log_status {
        LogStatus::Saved(path) => {
            eprintln!("\n{} {}", "Copy saved to".dimmed(), path.display())
        }
        LogStatus::Failed(e) => eprintln!("\n{} {}", "Warning:".yellow().bold(), e),
        LogStatus::NotRequested => {}
    }

    if let Some(output) = &args.output {
        match export(output, &text) {
            Ok(()) => eprintln!("{} {}", "Exported to".dimmed(), output.display()),
            Err(e) => {
                eprintln!("{} {}", "Error:".red().bold(), e);
                return Ok(ExitCode::FAILURE);
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn parse_provider(name: &str) -> Result<Provider> {
    Provider::from_str(name).ok_or_else(|| {
        let choices: Vec<&str> = Provider::all().iter().map(|p| p.as_str()).collect();
        anyhow!("Unknown provider '{}'. Choose one of: {}", name, choices.join(", "))
    })
}

fn update_config(
    provider: Option<String>,
    model: Option<String>,
    api_key: Option<String>,
    log_path: Option<PathBuf>,
    max_tokens: Option<u32>,
    timeout_secs: Option<u64>,
) -> Result<()> {
    let mut config = Config::load()?;
    let mut changed = false;

    if let Some(provider) = provider {
        let provider = parse_provider(&provider)?;
        config.provider = Some(provider.as_str().to_string());
        changed = true;
    }
    if model.is_some() {
        config.model = model;
        changed = true;
    }
    if let Some(key) = api_key {
        config.set_api_key(config.provider(), &key);
        changed = true;
    }
    if log_path.is_some() {
        config.log_path = log_path;
        changed = true;
    }
    if max_tokens.is_some() {
        config.max_tokens = max_tokens;
        changed = true;
    }
    if timeout_secs.is_some() {
        config.timeout_secs = timeout_secs;
        changed = true;
    }

    if changed {
        config.save()?;
        println!("{} {}", "Saved".green(), Config::get_config_path()?.display());
    }

    println!("\n{}", "Settings".bold().blue());
    println!("{}", "=".repeat(30).dimmed());
    println!("  provider     {}", config.provider().display_name());
    println!("  model        {}", config.model());
    println!(
        "  {}",
        format!("known models: {}", config.provider().list_models().join(", ")).dimmed()
    );
    println!("  endpoint     {}", config.base_url());
    println!("  max tokens   {}", config.max_tokens());
    println!("  timeout      {}s", config.timeout_secs());
    println!("  copy log     {}", config.log_path().display());

    println!("\n{}", "API keys".bold().blue());
    for provider in Provider::all() {
        let status = match (config.api_key(provider), config.api_key_source(provider)) {
            (Some(key), Some(source)) => format!("{} ({})", mask_key(&key), source).green(),
            _ => format!("not set ({})", provider.api_key_env()).yellow(),
        };
        println!("  {:<12} {}", provider.display_name(), status);
    }

    Ok(())
}

/// Show only the last four characters of a key.
fn mask_key(key: &str) -> String {
    let count = key.chars().count();
    if count <= 4 {
        return "*".repeat(count);
    }
    let tail: String = key.chars().skip(count - 4).collect();
    format!("{}{}", "*".repeat(8), tail)
}
