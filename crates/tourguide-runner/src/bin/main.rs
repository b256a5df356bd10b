use clap::Parser;
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "tourguide-runner")]
#[command(about = "Play guided tours against a real browser page")]
#[command(version)]
struct Cli {
    /// Tour file to run
    #[arg(required_unless_present = "schema")]
    config: Option<PathBuf>,

    /// Run in headless mode (overrides config)
    #[arg(long)]
    headless: bool,

    /// Set a parameter (can be used multiple times)
    #[arg(short = 'P', long = "param", value_name = "KEY=VALUE")]
    params: Vec<String>,

    /// Verbose output (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Validate the tour file without running it
    #[arg(long)]
    check: bool,

    /// Quiet mode (only errors)
    #[arg(short, long)]
    quiet: bool,

    /// Print the JSON Schema for tour files and exit
    #[arg(long)]
    schema: bool,
}

#[tokio::main]
async fn main() -> tourguide_runner::Result<()> {
    let cli = Cli::parse();

    let level = if cli.quiet {
        Level::ERROR
    } else {
        match cli.verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            _ => Level::DEBUG,
        }
    };

    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();

    if cli.schema {
        let schema = schemars::schema_for!(tourguide_runner::TourConfig);
        println!("{}", serde_json::to_string_pretty(&schema)?);
        return Ok(());
    }

    let Some(path) = cli.config else {
        return Err(tourguide_runner::Error::Config("no tour file given".into()));
    };

    let params = tourguide_runner::Params::from_args(&cli.params)?;
    let mut config = tourguide_runner::TourConfig::load_with_params(&path, &params)?;

    if cli.check {
        println!("Tour valid: {}", config.name);
        println!("  Target: {}", config.target.url);
        println!("  Steps: {}", config.steps.len());
        for (i, step) in config.steps.iter().enumerate() {
            let id = step.id.as_deref().unwrap_or("-");
            let route = step.route.as_deref().unwrap_or("");
            let target = step
                .attach_to
                .as_ref()
                .map(|a| a.element.as_str())
                .unwrap_or("(floating)");
            println!("    {}. {} {} {}", i + 1, id, route, target);
        }
        if !config.params.is_empty() {
            println!("  Parameters: {}", config.params.len());
            for (name, def) in &config.params {
                let req = if def.required { " (required)" } else { "" };
                let desc = def.description.as_deref().unwrap_or("");
                println!("    - {}{}: {}", name, req, desc);
            }
        }
        return Ok(());
    }

    if cli.headless {
        config.browser.headless = true;
    }

    println!("Running: {}", config.name);

    let mut runner = tourguide_runner::Runner::new(&config.browser).await?;
    let result = runner.run(&config).await?;

    println!();
    if result.success {
        println!("✓ Success");
    } else {
        println!("✗ Failed");
        if let Some(ref error) = result.error {
            println!("  Error: {}", error);
        }
    }
    println!("  Steps: {}/{}", result.steps_shown, config.steps.len());
    println!("  Duration: {}ms", result.duration_ms);

    runner.close().await?;

    if !result.success {
        std::process::exit(1);
    }

    Ok(())
}
